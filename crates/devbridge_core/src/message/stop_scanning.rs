// Device Bridge Rust Source Code File
//
// Licensed under the BSD 3-Clause license. See LICENSE file in the project root
// for full license information.

use super::BridgeMessage;
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopScanning {
  #[serde(rename = "Id")]
  id: u32,
}

impl StopScanning {
  pub fn new(id: u32) -> Self {
    Self { id }
  }
}

impl BridgeMessage for StopScanning {
  fn id(&self) -> u32 {
    self.id
  }
  fn set_id(&mut self, id: u32) {
    self.id = id;
  }
}
