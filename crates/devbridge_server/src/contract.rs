// Device Bridge Rust Source Code File
//
// Licensed under the BSD 3-Clause license. See LICENSE file in the project root
// for full license information.

//! External contracts the device manager depends on: the subtype manager (discovery backend)
//! and the device (a connected piece of hardware). Concrete implementations live outside this
//! crate; `devbridge_testutil` supplies a pair used by this crate's own integration tests.

use async_trait::async_trait;
use devbridge_core::{
  errors::BridgeResult,
  message::{AllowedMessageType, DeviceCommand, DeviceEmittedMessage, MessageTypeAttributes, OutboundMessage},
};
use std::{collections::BTreeMap, fmt::Debug};
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;

/// Events a device raises over its lifetime, other than the replies to commands it is sent
/// directly.
#[derive(Debug, Clone)]
pub enum DeviceEvent {
  /// The device has disconnected and should be dropped from the registry.
  Removed,
  /// The device emitted a message on its own (e.g. a sensor reading).
  MessageEmitted(DeviceEmittedMessage),
}

/// A connected piece of hardware, as seen by the device manager.
#[async_trait]
pub trait Device: Send + Sync + Debug {
  /// Opaque, stable-per-session identifier supplied by the owning subtype manager.
  fn identifier(&self) -> &str;

  fn name(&self) -> String;

  fn connected(&self) -> bool;

  /// Message types this device accepts, with per-type attributes, unfiltered by spec version.
  fn allowed_message_types(&self) -> BTreeMap<AllowedMessageType, MessageTypeAttributes>;

  /// Subscribe to this device's removal and self-emitted message events.
  fn event_stream(&self) -> broadcast::Receiver<DeviceEvent>;

  /// Route a device-addressed command into this device, honoring cancellation.
  async fn parse_message(
    &self,
    msg: DeviceCommand,
    cancel: CancellationToken,
  ) -> BridgeResult<OutboundMessage>;

  async fn disconnect(&self) -> BridgeResult<()>;
}

/// Events a subtype manager raises while discovering devices.
#[derive(Debug)]
pub enum SubtypeManagerEvent {
  DeviceAdded(std::sync::Arc<dyn Device>),
  ScanningFinished,
}

/// A discovery backend for one class of physical devices.
#[async_trait]
pub trait SubtypeManager: Send + Sync {
  /// Concrete kind name, used for duplicate-registration detection.
  fn name(&self) -> &'static str;

  async fn start_scanning(&self) -> BridgeResult<()>;

  async fn stop_scanning(&self) -> BridgeResult<()>;

  fn is_scanning(&self) -> bool;
}

/// Builds a [SubtypeManager], handing it the channel it should use to report discovery events.
pub trait SubtypeManagerBuilder: Send {
  fn finish(&self, sender: mpsc::Sender<SubtypeManagerEvent>) -> Box<dyn SubtypeManager>;
}

/// A zero-argument factory publishing a subtype manager builder for auto-load. Plugin units
/// register one of these instead of being discovered through reflection.
pub type SubtypeManagerFactory = fn() -> Box<dyn SubtypeManagerBuilder>;
