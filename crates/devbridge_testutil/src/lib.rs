// Device Bridge Rust Source Code File
//
// Licensed under the BSD 3-Clause license. See LICENSE file in the project root
// for full license information.

//! In-memory `Device`/`SubtypeManager` test doubles, used by `devbridge_server`'s own
//! integration tests and available to any downstream crate that wants to exercise the device
//! manager without real hardware.

use async_trait::async_trait;
use devbridge_core::{
  errors::{BridgeResult, DeviceError},
  message::{AllowedMessageType, DeviceCommand, DeviceEmittedMessage, MessageTypeAttributes, OutboundMessage},
};
use devbridge_server::{Device, DeviceEvent, SubtypeManager, SubtypeManagerBuilder, SubtypeManagerEvent};
use std::{
  collections::BTreeMap,
  sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
  },
};
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;

/// A device that exists only in memory, with its connected state and commands-received log
/// visible to the test that created it.
#[derive(Debug)]
pub struct MockDevice {
  identifier: String,
  name: String,
  connected: Arc<AtomicBool>,
  events: broadcast::Sender<DeviceEvent>,
  commands_received: Arc<Mutex<Vec<DeviceCommand>>>,
  fail_next_command: Arc<AtomicBool>,
}

impl MockDevice {
  pub fn new(identifier: &str, name: &str) -> Arc<Self> {
    let (events, _) = broadcast::channel(16);
    Arc::new(Self {
      identifier: identifier.to_owned(),
      name: name.to_owned(),
      connected: Arc::new(AtomicBool::new(true)),
      events,
      commands_received: Arc::new(Mutex::new(Vec::new())),
      fail_next_command: Arc::new(AtomicBool::new(false)),
    })
  }

  /// Simulates the device dropping off the transport, e.g. a Bluetooth disconnect that the
  /// device manager did not ask for.
  pub fn simulate_disconnect(&self) {
    self.connected.store(false, Ordering::SeqCst);
    let _ = self.events.send(DeviceEvent::Removed);
  }

  /// Simulates the device emitting an unsolicited message, e.g. a sensor reading.
  pub fn simulate_emit(&self, device_index: u32, kind: &str, payload: serde_json::Value) {
    let _ = self.events.send(DeviceEvent::MessageEmitted(DeviceEmittedMessage {
      device_index,
      kind: kind.to_owned(),
      payload,
    }));
  }

  /// Makes the next `parse_message` call fail, to test `StopAllDevices` partial-failure
  /// reporting.
  pub fn fail_next_command(&self) {
    self.fail_next_command.store(true, Ordering::SeqCst);
  }

  pub fn commands_received(&self) -> Vec<DeviceCommand> {
    self.commands_received.lock().expect("not poisoned").clone()
  }
}

#[async_trait]
impl Device for MockDevice {
  fn identifier(&self) -> &str {
    &self.identifier
  }

  fn name(&self) -> String {
    self.name.clone()
  }

  fn connected(&self) -> bool {
    self.connected.load(Ordering::SeqCst)
  }

  fn allowed_message_types(&self) -> BTreeMap<AllowedMessageType, MessageTypeAttributes> {
    let mut map = BTreeMap::new();
    map.insert(
      AllowedMessageType::VibrateCmd,
      MessageTypeAttributes {
        feature_count: Some(1),
        step_counts: Some(vec![20]),
      },
    );
    map.insert(AllowedMessageType::StopDeviceCmd, MessageTypeAttributes::default());
    map
  }

  fn event_stream(&self) -> broadcast::Receiver<DeviceEvent> {
    self.events.subscribe()
  }

  async fn parse_message(
    &self,
    msg: DeviceCommand,
    _cancel: CancellationToken,
  ) -> BridgeResult<OutboundMessage> {
    use devbridge_core::message::{BridgeMessage, Ok as OkMsg};

    self.commands_received.lock().expect("not poisoned").push(msg.clone());
    if self.fail_next_command.swap(false, Ordering::SeqCst) {
      return Err(DeviceError::CommandFailed("simulated transport failure".to_owned()).into());
    }
    Ok(OutboundMessage::Ok(OkMsg::new(msg.id())))
  }

  async fn disconnect(&self) -> BridgeResult<()> {
    self.connected.store(false, Ordering::SeqCst);
    Ok(())
  }
}

type WaitingDeviceList = Arc<Mutex<Vec<Arc<MockDevice>>>>;

/// Test-side handle into a [MockSubtypeManager] not yet started, used to queue devices for it
/// to report once scanning begins.
#[derive(Default, Clone)]
pub struct MockSubtypeManagerHelper {
  devices: WaitingDeviceList,
}

impl MockSubtypeManagerHelper {
  pub fn queue_device(&self, device: Arc<MockDevice>) {
    self.devices.lock().expect("not poisoned").push(device);
  }
}

/// Builds a [MockSubtypeManager] that reports every queued device and then `ScanningFinished`
/// as soon as `start_scanning` runs, modeling a backend whose discovery is effectively
/// synchronous.
#[derive(Default, Clone)]
pub struct MockSubtypeManagerBuilder {
  name: &'static str,
  devices: WaitingDeviceList,
}

impl MockSubtypeManagerBuilder {
  pub fn new(name: &'static str) -> Self {
    Self {
      name,
      devices: WaitingDeviceList::default(),
    }
  }

  pub fn helper(&self) -> MockSubtypeManagerHelper {
    MockSubtypeManagerHelper {
      devices: self.devices.clone(),
    }
  }
}

impl SubtypeManagerBuilder for MockSubtypeManagerBuilder {
  fn finish(&self, sender: mpsc::Sender<SubtypeManagerEvent>) -> Box<dyn SubtypeManager> {
    Box::new(MockSubtypeManager {
      name: self.name,
      sender,
      devices: self.devices.clone(),
      is_scanning: Arc::new(AtomicBool::new(false)),
    })
  }
}

pub struct MockSubtypeManager {
  name: &'static str,
  sender: mpsc::Sender<SubtypeManagerEvent>,
  devices: WaitingDeviceList,
  is_scanning: Arc<AtomicBool>,
}

#[async_trait]
impl SubtypeManager for MockSubtypeManager {
  fn name(&self) -> &'static str {
    self.name
  }

  async fn start_scanning(&self) -> BridgeResult<()> {
    self.is_scanning.store(true, Ordering::SeqCst);
    let devices: Vec<Arc<MockDevice>> = self.devices.lock().expect("not poisoned").drain(..).collect();
    for device in devices {
      if self
        .sender
        .send(SubtypeManagerEvent::DeviceAdded(device))
        .await
        .is_err()
      {
        break;
      }
    }
    self.is_scanning.store(false, Ordering::SeqCst);
    let _ = self.sender.send(SubtypeManagerEvent::ScanningFinished).await;
    Ok(())
  }

  async fn stop_scanning(&self) -> BridgeResult<()> {
    self.is_scanning.store(false, Ordering::SeqCst);
    Ok(())
  }

  fn is_scanning(&self) -> bool {
    self.is_scanning.load(Ordering::SeqCst)
  }
}
