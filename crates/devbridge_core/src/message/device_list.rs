// Device Bridge Rust Source Code File
//
// Licensed under the BSD 3-Clause license. See LICENSE file in the project root
// for full license information.

use super::{attributes::MessageTypeAttributes, BridgeMessage};
use getset::Getters;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One entry of a `DeviceList` reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceListEntry {
  #[serde(rename = "DeviceIndex")]
  pub device_index: u32,
  #[serde(rename = "DeviceName")]
  pub device_name: String,
  #[serde(rename = "AllowedMessages")]
  pub allowed_messages: BTreeMap<String, MessageTypeAttributes>,
}

/// Reply to `RequestDeviceList`, carrying only currently-connected devices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters)]
pub struct DeviceList {
  #[serde(rename = "Id")]
  id: u32,
  #[serde(rename = "Devices")]
  #[getset(get = "pub")]
  devices: Vec<DeviceListEntry>,
}

impl DeviceList {
  pub fn new(id: u32, devices: Vec<DeviceListEntry>) -> Self {
    Self { id, devices }
  }
}

impl BridgeMessage for DeviceList {
  fn id(&self) -> u32 {
    self.id
  }
  fn set_id(&mut self, id: u32) {
    self.id = id;
  }
}
