// Device Bridge Rust Source Code File
//
// Licensed under the BSD 3-Clause license. See LICENSE file in the project root
// for full license information.

//! Error structs/enums shared by the message protocol and the device manager.

use displaydoc::Display;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type BridgeResult<T = ()> = Result<T, BridgeError>;

/// Errors raised while validating or routing an inbound message.
#[derive(Debug, Error, Display, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageError {
  /// Unhandled message type: {0}
  UnhandledMessage(String),
  /// Invalid message contents: {0}
  InvalidMessageContents(String),
}

/// Errors raised while starting/stopping scans or running device commands.
#[derive(Debug, Error, Display, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviceError {
  /// No scan backends available
  NoScanBackends,
  /// A scan is already in progress
  AlreadyScanning,
  /// unknown device index {0}
  UnknownDevice(u32),
  /// {0}
  CommandFailed(String),
}

/// A device-directed call was cancelled before it completed.
#[derive(Debug, Error, Display, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CancelledError {
  /// device call was cancelled
  Cancelled,
}

/// Aggregate error type returned by the device manager's public API.
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BridgeError {
  #[error(transparent)]
  Message(#[from] MessageError),
  #[error(transparent)]
  Device(#[from] DeviceError),
  #[error(transparent)]
  Cancelled(#[from] CancelledError),
}

impl BridgeError {
  /// The error-kind tag used when converting into the wire-level `Error` message.
  pub fn kind(&self) -> &'static str {
    match self {
      BridgeError::Message(_) => "MessageError",
      BridgeError::Device(_) => "DeviceError",
      BridgeError::Cancelled(_) => "Cancelled",
    }
  }
}
