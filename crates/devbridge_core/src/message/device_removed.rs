// Device Bridge Rust Source Code File
//
// Licensed under the BSD 3-Clause license. See LICENSE file in the project root
// for full license information.

use super::{BridgeMessage, SYSTEM_ID};
use getset::CopyGetters;
use serde::{Deserialize, Serialize};

/// Unsolicited notification that a device has dropped out of the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, CopyGetters)]
pub struct DeviceRemoved {
  #[serde(rename = "Id")]
  id: u32,
  #[serde(rename = "DeviceIndex")]
  #[getset(get_copy = "pub")]
  device_index: u32,
}

impl DeviceRemoved {
  pub fn new(device_index: u32) -> Self {
    Self {
      id: SYSTEM_ID,
      device_index,
    }
  }
}

impl BridgeMessage for DeviceRemoved {
  fn id(&self) -> u32 {
    self.id
  }
  fn set_id(&mut self, id: u32) {
    self.id = id;
  }
}
