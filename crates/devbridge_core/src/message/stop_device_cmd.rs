// Device Bridge Rust Source Code File
//
// Licensed under the BSD 3-Clause license. See LICENSE file in the project root
// for full license information.

use super::{BridgeMessage, DeviceMessage};
use serde::{Deserialize, Serialize};

/// Requests a device return to its stopped/neutral state. Used both as a direct client command
/// and internally by `StopAllDevices`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopDeviceCmd {
  #[serde(rename = "Id")]
  id: u32,
  #[serde(rename = "DeviceIndex")]
  device_index: u32,
}

impl StopDeviceCmd {
  pub fn new(id: u32, device_index: u32) -> Self {
    Self { id, device_index }
  }
}

impl BridgeMessage for StopDeviceCmd {
  fn id(&self) -> u32 {
    self.id
  }
  fn set_id(&mut self, id: u32) {
    self.id = id;
  }
}

impl DeviceMessage for StopDeviceCmd {
  fn device_index(&self) -> u32 {
    self.device_index
  }
}
