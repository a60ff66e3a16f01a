// Device Bridge Rust Source Code File
//
// Licensed under the BSD 3-Clause license. See LICENSE file in the project root
// for full license information.

//! The public entry point: builds the registry/scan-coordinator/manager-set trio and dispatches
//! every inbound [ClientMessage] to the right one.

use crate::{
  contract::SubtypeManagerBuilder, manager_set::ManagerSet, registry::DeviceRegistry,
  scan_coordinator::ScanCoordinator,
};
use devbridge_core::{
  errors::{BridgeResult, DeviceError},
  message::{
    ClientMessage, DeviceCommand, DeviceList, GlobalMessage, Ok as OkMsg, OutboundMessage,
  },
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info_span;
use tracing_futures::Instrument;

pub struct DeviceManagerBuilder {
  spec_version: u32,
}

impl Default for DeviceManagerBuilder {
  fn default() -> Self {
    Self { spec_version: u32::MAX }
  }
}

impl DeviceManagerBuilder {
  pub fn new() -> Self {
    Self::default()
  }

  /// Sets the client spec version used to filter `AllowedMessages` in `DeviceAdded`/`DeviceList`
  /// replies.
  pub fn spec_version(mut self, version: u32) -> Self {
    self.spec_version = version;
    self
  }

  pub fn finish(self) -> DeviceManager {
    let (output, _) = tokio::sync::broadcast::channel(256);
    let registry = Arc::new(DeviceRegistry::new(output.clone(), self.spec_version));
    let scan = Arc::new(ScanCoordinator::new(output.clone()));
    let managers = Arc::new(ManagerSet::new(registry.clone(), scan.clone()));
    DeviceManager {
      registry,
      scan,
      managers,
      output,
      shutdown_token: CancellationToken::new(),
    }
  }
}

/// Owns every device the process currently knows about and every subtype manager discovering
/// more of them. There is exactly one of these per running server.
pub struct DeviceManager {
  registry: Arc<DeviceRegistry>,
  scan: Arc<ScanCoordinator>,
  managers: Arc<ManagerSet>,
  output: tokio::sync::broadcast::Sender<OutboundMessage>,
  shutdown_token: CancellationToken,
}

impl DeviceManager {
  /// Registers a subtype manager directly, bypassing auto-load. Used by tests and by hosts that
  /// want explicit control over which backends run.
  pub fn add_manager(&self, builder: Box<dyn SubtypeManagerBuilder>) -> BridgeResult<()> {
    self.managers.add_manager(builder)
  }

  /// Instantiates every subtype manager registered for auto-load.
  pub fn auto_load(&self) -> BridgeResult<()> {
    self.managers.add_all()
  }

  /// Subscribe to every unsolicited message this device manager emits: `DeviceAdded`,
  /// `DeviceRemoved`, `ScanningFinished`, and forwarded device messages.
  pub fn event_stream(&self) -> tokio::sync::broadcast::Receiver<OutboundMessage> {
    self.output.subscribe()
  }

  /// Dispatches one inbound message and returns the reply to send back on the same id.
  /// Cancellation of `cancel` aborts a device-addressed call in flight.
  pub async fn send_message(
    &self,
    msg: ClientMessage,
    cancel: CancellationToken,
  ) -> OutboundMessage {
    let id = {
      use devbridge_core::message::BridgeMessage;
      msg.id()
    };
    let result = self
      .dispatch(msg, cancel)
      .instrument(info_span!("device manager message", id))
      .await;
    match result {
      Ok(reply) => reply,
      Err(e) => OutboundMessage::Error(
        devbridge_core::message::ErrorMsg::new(id, e.kind(), &e.to_string()),
      ),
    }
  }

  async fn dispatch(
    &self,
    msg: ClientMessage,
    cancel: CancellationToken,
  ) -> BridgeResult<OutboundMessage> {
    let id = {
      use devbridge_core::message::BridgeMessage;
      msg.id()
    };
    match msg {
      ClientMessage::Global(GlobalMessage::StartScanning(_)) => {
        self.managers.start_scanning_all().await?;
        Ok(OutboundMessage::Ok(OkMsg::new(id)))
      }
      ClientMessage::Global(GlobalMessage::StopScanning(_)) => {
        self.managers.stop_scanning_all().await?;
        Ok(OutboundMessage::Ok(OkMsg::new(id)))
      }
      ClientMessage::Global(GlobalMessage::RequestDeviceList(_)) => {
        let devices = self.registry.snapshot_connected();
        Ok(OutboundMessage::DeviceList(DeviceList::new(id, devices)))
      }
      ClientMessage::Global(GlobalMessage::StopAllDevices(_)) => {
        self.stop_all_devices(id, cancel).await?;
        Ok(OutboundMessage::Ok(OkMsg::new(id)))
      }
      ClientMessage::Device(cmd) => self.dispatch_device_command(cmd, cancel).await,
    }
  }

  /// Dispatches a `StopDeviceCmd` carrying the `StopAllDevices` message's own `Id` to every
  /// connected device, one at a time, so one device's slow hardware transport never stalls the
  /// others indefinitely. Per-device failures are joined into one error string, with each
  /// success contributing an empty segment so the failing device's position stays identifiable.
  async fn stop_all_devices(&self, id: u32, cancel: CancellationToken) -> BridgeResult<()> {
    use devbridge_core::message::StopDeviceCmd;

    let mut segments = Vec::new();
    let mut any_failed = false;
    for idx in self.registry.connected_indices() {
      let Some(device) = self.registry.get(idx) else {
        continue;
      };
      let cmd = DeviceCommand::StopDevice(StopDeviceCmd::new(id, idx));
      match device.parse_message(cmd, cancel.clone()).await {
        Ok(_) => segments.push(String::new()),
        Err(e) => {
          any_failed = true;
          segments.push(e.to_string());
        }
      }
    }
    if any_failed {
      Err(DeviceError::CommandFailed(segments.join("; ")).into())
    } else {
      Ok(())
    }
  }

  async fn dispatch_device_command(
    &self,
    cmd: DeviceCommand,
    cancel: CancellationToken,
  ) -> BridgeResult<OutboundMessage> {
    use devbridge_core::message::DeviceMessage as _;

    let idx = cmd.device_index();
    let device = self
      .registry
      .get(idx)
      .ok_or(DeviceError::UnknownDevice(idx))?;
    device.parse_message(cmd, cancel).await
  }

  /// Stops every subtype manager from scanning, disconnects every device, and releases the
  /// event-forwarding tasks. Safe to call more than once.
  pub async fn shutdown(&self) -> BridgeResult<()> {
    info!("Shutting down device manager.");
    self.managers.stop_scanning_all().await?;
    self.registry.remove_all().await;
    self.shutdown_token.cancel();
    Ok(())
  }
}

impl Drop for DeviceManager {
  /// Cancels the shutdown token as a last resort so any task still waiting on it does not leak;
  /// this is not a substitute for calling `shutdown()`, which also disconnects devices.
  fn drop(&mut self) {
    self.shutdown_token.cancel();
  }
}

#[cfg(test)]
mod test {
  use super::*;

  #[tokio::test]
  async fn request_device_list_on_empty_manager_returns_empty_list() {
    use devbridge_core::message::{ClientMessage, GlobalMessage, RequestDeviceList};

    let dm = DeviceManagerBuilder::new().finish();
    let reply = dm
      .send_message(
        ClientMessage::Global(GlobalMessage::RequestDeviceList(RequestDeviceList::new(1))),
        CancellationToken::new(),
      )
      .await;
    match reply {
      OutboundMessage::DeviceList(list) => assert!(list.devices().is_empty()),
      other => panic!("unexpected reply: {:?}", other),
    }
  }

  #[tokio::test]
  async fn start_scanning_with_no_backends_errors() {
    use devbridge_core::message::{ClientMessage, GlobalMessage, StartScanning};

    let dm = DeviceManagerBuilder::new().finish();
    let reply = dm
      .send_message(
        ClientMessage::Global(GlobalMessage::StartScanning(StartScanning::new(1))),
        CancellationToken::new(),
      )
      .await;
    match reply {
      OutboundMessage::Error(e) => assert_eq!(e.error_kind(), "DeviceError"),
      other => panic!("unexpected reply: {:?}", other),
    }
  }

  #[tokio::test]
  async fn unknown_device_index_errors() {
    use devbridge_core::message::{ClientMessage, DeviceCommand, StopDeviceCmd};

    let dm = DeviceManagerBuilder::new().finish();
    let reply = dm
      .send_message(
        ClientMessage::Device(DeviceCommand::StopDevice(StopDeviceCmd::new(7, 999))),
        CancellationToken::new(),
      )
      .await;
    match reply {
      OutboundMessage::Error(e) => {
        assert_eq!(e.error_kind(), "DeviceError");
        assert!(e.error_message().contains("999"));
      }
      other => panic!("unexpected reply: {:?}", other),
    }
  }
}
