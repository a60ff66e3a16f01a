// Device Bridge Rust Source Code File
//
// Licensed under the BSD 3-Clause license. See LICENSE file in the project root
// for full license information.

//! Wire message types exchanged between the device manager and its client.

mod attributes;
mod device_added;
mod device_list;
mod device_removed;
mod error;
mod ok;
mod request_device_list;
mod scanning_finished;
mod start_scanning;
mod stop_all_devices;
mod stop_device_cmd;
mod stop_scanning;
mod vibrate_cmd;

pub use attributes::{AllowedMessageType, MessageTypeAttributes};
pub use device_added::DeviceAdded;
pub use device_list::{DeviceList, DeviceListEntry};
pub use device_removed::DeviceRemoved;
pub use error::ErrorMsg;
pub use ok::Ok;
pub use request_device_list::RequestDeviceList;
pub use scanning_finished::ScanningFinished;
pub use start_scanning::StartScanning;
pub use stop_all_devices::StopAllDevices;
pub use stop_device_cmd::StopDeviceCmd;
pub use stop_scanning::StopScanning;
pub use vibrate_cmd::VibrateCmd;

use crate::errors::{BridgeError, MessageError};

/// Message id reserved for unsolicited server-to-client messages.
pub const SYSTEM_ID: u32 = 0;

/// Every message on the wire, in either direction, carries an id used to match replies to
/// requests. Unsolicited messages use [SYSTEM_ID].
pub trait BridgeMessage {
  fn id(&self) -> u32;
  fn set_id(&mut self, id: u32);
}

/// A message addressed to a specific device, as opposed to the global control messages.
pub trait DeviceMessage: BridgeMessage {
  fn device_index(&self) -> u32;
}

/// Global control messages recognized by the dispatcher.
#[derive(Debug, Clone, PartialEq)]
pub enum GlobalMessage {
  StartScanning(StartScanning),
  StopScanning(StopScanning),
  StopAllDevices(StopAllDevices),
  RequestDeviceList(RequestDeviceList),
}

impl BridgeMessage for GlobalMessage {
  fn id(&self) -> u32 {
    match self {
      GlobalMessage::StartScanning(m) => m.id(),
      GlobalMessage::StopScanning(m) => m.id(),
      GlobalMessage::StopAllDevices(m) => m.id(),
      GlobalMessage::RequestDeviceList(m) => m.id(),
    }
  }

  fn set_id(&mut self, id: u32) {
    match self {
      GlobalMessage::StartScanning(m) => m.set_id(id),
      GlobalMessage::StopScanning(m) => m.set_id(id),
      GlobalMessage::StopAllDevices(m) => m.set_id(id),
      GlobalMessage::RequestDeviceList(m) => m.set_id(id),
    }
  }
}

/// Built-in device-addressed command union. Concrete `Device` implementations may accept any of
/// these; the dispatcher only needs to read the shared `id`/`device_index` fields to route them.
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceCommand {
  Vibrate(VibrateCmd),
  StopDevice(StopDeviceCmd),
}

impl BridgeMessage for DeviceCommand {
  fn id(&self) -> u32 {
    match self {
      DeviceCommand::Vibrate(m) => m.id(),
      DeviceCommand::StopDevice(m) => m.id(),
    }
  }

  fn set_id(&mut self, id: u32) {
    match self {
      DeviceCommand::Vibrate(m) => m.set_id(id),
      DeviceCommand::StopDevice(m) => m.set_id(id),
    }
  }
}

impl DeviceMessage for DeviceCommand {
  fn device_index(&self) -> u32 {
    match self {
      DeviceCommand::Vibrate(m) => m.device_index(),
      DeviceCommand::StopDevice(m) => m.device_index(),
    }
  }
}

/// Every message a client may send into the device manager.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientMessage {
  Global(GlobalMessage),
  Device(DeviceCommand),
}

impl BridgeMessage for ClientMessage {
  fn id(&self) -> u32 {
    match self {
      ClientMessage::Global(m) => m.id(),
      ClientMessage::Device(m) => m.id(),
    }
  }

  fn set_id(&mut self, id: u32) {
    match self {
      ClientMessage::Global(m) => m.set_id(id),
      ClientMessage::Device(m) => m.set_id(id),
    }
  }
}

/// Every message the device manager may emit, solicited or not.
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundMessage {
  Ok(Ok),
  Error(ErrorMsg),
  DeviceList(DeviceList),
  DeviceAdded(DeviceAdded),
  DeviceRemoved(DeviceRemoved),
  ScanningFinished(ScanningFinished),
  /// A message emitted by a device itself (e.g. a sensor reading), forwarded verbatim.
  DeviceMessage(DeviceEmittedMessage),
}

/// Payload of a device-initiated message, forwarded to the client without interpretation.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DeviceEmittedMessage {
  #[serde(rename = "DeviceIndex")]
  pub device_index: u32,
  #[serde(rename = "Kind")]
  pub kind: String,
  #[serde(rename = "Payload")]
  pub payload: serde_json::Value,
}

impl From<BridgeError> for ErrorMsg {
  fn from(err: BridgeError) -> Self {
    ErrorMsg::new(SYSTEM_ID, err.kind(), &err.to_string())
  }
}

impl From<MessageError> for OutboundMessage {
  fn from(err: MessageError) -> Self {
    OutboundMessage::Error(BridgeError::from(err).into())
  }
}
