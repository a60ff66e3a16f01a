// Device Bridge Rust Source Code File
//
// Licensed under the BSD 3-Clause license. See LICENSE file in the project root
// for full license information.

use super::{BridgeMessage, SYSTEM_ID};
use serde::{Deserialize, Serialize};

/// Unsolicited notification that a global scan has finished. Emitted at most once per
/// `StartScanning`.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanningFinished {
  #[serde(rename = "Id")]
  id: u32,
}

impl ScanningFinished {
  pub fn new() -> Self {
    Self { id: SYSTEM_ID }
  }
}

impl BridgeMessage for ScanningFinished {
  fn id(&self) -> u32 {
    self.id
  }
  fn set_id(&mut self, id: u32) {
    self.id = id;
  }
}
