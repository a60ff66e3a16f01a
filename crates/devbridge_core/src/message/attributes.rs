// Device Bridge Rust Source Code File
//
// Licensed under the BSD 3-Clause license. See LICENSE file in the project root
// for full license information.

use serde::{Deserialize, Serialize};

/// The device-command message kinds this core recognizes. A device's `AllowedMessageTypes` set
/// is keyed by this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AllowedMessageType {
  VibrateCmd,
  StopDeviceCmd,
}

impl AllowedMessageType {
  /// Protocol version in which this message type was introduced; used to filter
  /// `AllowedMessageTypes` down to what the negotiated client version supports.
  pub fn introduced_in_spec_version(&self) -> u32 {
    match self {
      AllowedMessageType::VibrateCmd => 1,
      AllowedMessageType::StopDeviceCmd => 1,
    }
  }

  pub fn wire_name(&self) -> &'static str {
    match self {
      AllowedMessageType::VibrateCmd => "VibrateCmd",
      AllowedMessageType::StopDeviceCmd => "StopDeviceCmd",
    }
  }
}

/// Per-type attributes advertised alongside an allowed message type (e.g. feature/step counts).
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageTypeAttributes {
  #[serde(rename = "FeatureCount", skip_serializing_if = "Option::is_none")]
  pub feature_count: Option<u32>,
  #[serde(rename = "StepCounts", skip_serializing_if = "Option::is_none")]
  pub step_counts: Option<Vec<u32>>,
}
