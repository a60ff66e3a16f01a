// Device Bridge Rust Source Code File
//
// Licensed under the BSD 3-Clause license. See LICENSE file in the project root
// for full license information.

use super::BridgeMessage;
use getset::Getters;
use serde::{Deserialize, Serialize};

/// Failure reply, carrying the error-kind taxonomy as a string tag plus a human-readable
/// message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters)]
pub struct ErrorMsg {
  #[serde(rename = "Id")]
  id: u32,
  #[serde(rename = "ErrorKind")]
  #[getset(get = "pub")]
  error_kind: String,
  #[serde(rename = "ErrorMessage")]
  #[getset(get = "pub")]
  error_message: String,
}

impl ErrorMsg {
  pub fn new(id: u32, error_kind: &'static str, error_message: &str) -> Self {
    Self {
      id,
      error_kind: error_kind.to_owned(),
      error_message: error_message.to_owned(),
    }
  }
}

impl BridgeMessage for ErrorMsg {
  fn id(&self) -> u32 {
    self.id
  }
  fn set_id(&mut self, id: u32) {
    self.id = id;
  }
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn test_error_serialize() {
    let err = ErrorMsg::new(5, "DeviceError", "unknown device index 999");
    let js = serde_json::to_string(&err).expect("infallible serialization");
    assert_eq!(
      js,
      r#"{"Id":5,"ErrorKind":"DeviceError","ErrorMessage":"unknown device index 999"}"#
    );
  }
}
