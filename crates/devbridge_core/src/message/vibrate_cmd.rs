// Device Bridge Rust Source Code File
//
// Licensed under the BSD 3-Clause license. See LICENSE file in the project root
// for full license information.

use super::{BridgeMessage, DeviceMessage};
use getset::Getters;
use serde::{Deserialize, Serialize};

/// Requests a device vibrate at the given per-motor speeds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters)]
pub struct VibrateCmd {
  #[serde(rename = "Id")]
  id: u32,
  #[serde(rename = "DeviceIndex")]
  device_index: u32,
  #[serde(rename = "Speeds")]
  #[getset(get = "pub")]
  speeds: Vec<f64>,
}

impl VibrateCmd {
  pub fn new(id: u32, device_index: u32, speeds: Vec<f64>) -> Self {
    Self {
      id,
      device_index,
      speeds,
    }
  }
}

impl BridgeMessage for VibrateCmd {
  fn id(&self) -> u32 {
    self.id
  }
  fn set_id(&mut self, id: u32) {
    self.id = id;
  }
}

impl DeviceMessage for VibrateCmd {
  fn device_index(&self) -> u32 {
    self.device_index
  }
}
