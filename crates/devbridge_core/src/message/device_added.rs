// Device Bridge Rust Source Code File
//
// Licensed under the BSD 3-Clause license. See LICENSE file in the project root
// for full license information.

use super::{attributes::MessageTypeAttributes, BridgeMessage, SYSTEM_ID};
use getset::{CopyGetters, Getters};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Unsolicited notification that a device has been added to the registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, CopyGetters, Getters)]
pub struct DeviceAdded {
  #[serde(rename = "Id")]
  id: u32,
  #[serde(rename = "DeviceIndex")]
  #[getset(get_copy = "pub")]
  device_index: u32,
  #[serde(rename = "DeviceName")]
  #[getset(get = "pub")]
  device_name: String,
  #[serde(rename = "AllowedMessages")]
  #[getset(get = "pub")]
  allowed_messages: BTreeMap<String, MessageTypeAttributes>,
}

impl DeviceAdded {
  pub fn new(
    device_index: u32,
    device_name: &str,
    allowed_messages: BTreeMap<String, MessageTypeAttributes>,
  ) -> Self {
    Self {
      id: SYSTEM_ID,
      device_index,
      device_name: device_name.to_owned(),
      allowed_messages,
    }
  }
}

impl BridgeMessage for DeviceAdded {
  fn id(&self) -> u32 {
    self.id
  }
  fn set_id(&mut self, id: u32) {
    self.id = id;
  }
}
