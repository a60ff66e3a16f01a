// Device Bridge Rust Source Code File
//
// Licensed under the BSD 3-Clause license. See LICENSE file in the project root
// for full license information.

//! Device manager: registry, scan coordination, message dispatch, and event fanout for a single
//! running bridge process.

#[macro_use]
extern crate log;

pub mod contract;
pub mod device_manager;
pub mod manager_set;
pub mod registry;
pub mod scan_coordinator;

pub use contract::{Device, DeviceEvent, SubtypeManager, SubtypeManagerBuilder, SubtypeManagerEvent, SubtypeManagerFactory};
pub use device_manager::{DeviceManager, DeviceManagerBuilder};
pub use manager_set::register_factory;
