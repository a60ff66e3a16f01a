// Device Bridge Rust Source Code File
//
// Licensed under the BSD 3-Clause license. See LICENSE file in the project root
// for full license information.

//! Device Registry: owns the index <-> device mapping and the identifier <-> index memory that
//! survives disconnects within a session.

use crate::contract::{Device, DeviceEvent};
use dashmap::DashMap;
use devbridge_core::message::{
  AllowedMessageType, DeviceAdded, DeviceListEntry, DeviceRemoved, MessageTypeAttributes,
  OutboundMessage,
};
use devbridge_core::util::async_manager;
use std::{
  collections::BTreeMap,
  sync::{
    atomic::{AtomicU32, Ordering},
    Arc,
  },
};
use tokio::sync::{broadcast, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::info_span;
use tracing_futures::Instrument;

struct DeviceEntry {
  identifier: String,
  device: Arc<dyn Device>,
  /// Cancelled when this entry is dropped from `devices`, to stop the forwarding task below.
  unsubscribe: CancellationToken,
}

/// Filters a device's full `AllowedMessageTypes` set down to what a given client spec version
/// advertises.
pub fn filter_allowed_messages(
  allowed: &BTreeMap<AllowedMessageType, MessageTypeAttributes>,
  spec_version: u32,
) -> BTreeMap<String, MessageTypeAttributes> {
  allowed
    .iter()
    .filter(|(msg_type, _)| msg_type.introduced_in_spec_version() <= spec_version)
    .map(|(msg_type, attrs)| (msg_type.wire_name().to_owned(), attrs.clone()))
    .collect()
}

pub struct DeviceRegistry {
  devices: Arc<DashMap<u32, DeviceEntry>>,
  index_of_identifier: DashMap<String, u32>,
  next_index: AtomicU32,
  /// Serializes the check-then-install sequence in `on_device_added` across concurrent callers.
  install_lock: Mutex<()>,
  output: broadcast::Sender<OutboundMessage>,
  /// The negotiated client spec version, used to filter `AllowedMessages` the same way on both
  /// `DeviceAdded` and `RequestDeviceList`.
  spec_version: u32,
}

impl DeviceRegistry {
  pub fn new(output: broadcast::Sender<OutboundMessage>, spec_version: u32) -> Self {
    Self {
      devices: Arc::new(DashMap::new()),
      index_of_identifier: DashMap::new(),
      next_index: AtomicU32::new(1),
      install_lock: Mutex::new(()),
      output,
      spec_version,
    }
  }

  pub fn get(&self, index: u32) -> Option<Arc<dyn Device>> {
    self.devices.get(&index).map(|e| e.device.clone())
  }

  /// Handles a `DeviceAdded` event from a subtype manager.
  pub async fn on_device_added(&self, device: Arc<dyn Device>) {
    let span = info_span!(
      "device added",
      identifier = tracing::field::debug(device.identifier()),
      name = tracing::field::display(device.name())
    );
    self.on_device_added_inner(device).instrument(span).await
  }

  async fn on_device_added_inner(&self, device: Arc<dyn Device>) {
    let _guard = self.install_lock.lock().await;
    let identifier = device.identifier().to_owned();

    // Deduplication rule: a live entry already registered for this identifier means this is a
    // duplicate discovery racing in from the subtype manager; drop it.
    if let Some(existing_idx) = self.index_of_identifier.get(&identifier).map(|e| *e) {
      if let Some(existing) = self.devices.get(&existing_idx) {
        if existing.device.connected() {
          debug!("Duplicate live discovery for identifier {}, ignoring.", identifier);
          return;
        }
      }
    }

    let idx = if let Some(existing_idx) = self.index_of_identifier.get(&identifier).map(|e| *e) {
      existing_idx
    } else {
      self.next_index.fetch_add(1, Ordering::SeqCst)
    };

    let unsubscribe = CancellationToken::new();
    self.spawn_device_event_forwarder(idx, device.clone(), unsubscribe.clone());

    self.index_of_identifier.insert(identifier.clone(), idx);
    self.devices.insert(
      idx,
      DeviceEntry {
        identifier,
        device: device.clone(),
        unsubscribe,
      },
    );

    let allowed = filter_allowed_messages(&device.allowed_message_types(), self.spec_version);
    info!("Assigning index {} to {}", idx, device.name());
    let _ = self
      .output
      .send(OutboundMessage::DeviceAdded(DeviceAdded::new(idx, &device.name(), allowed)));
  }

  fn spawn_device_event_forwarder(
    &self,
    idx: u32,
    device: Arc<dyn Device>,
    unsubscribe: CancellationToken,
  ) {
    let output = self.output.clone();
    let devices = self.devices.clone();
    async_manager::spawn(async move {
      let mut events = device.event_stream();
      loop {
        tokio::select! {
          _ = unsubscribe.cancelled() => break,
          event = events.recv() => {
            match event {
              Ok(DeviceEvent::Removed) => {
                if devices.remove(&idx).is_some() {
                  let _ = output.send(OutboundMessage::DeviceRemoved(DeviceRemoved::new(idx)));
                }
                break;
              }
              Ok(DeviceEvent::MessageEmitted(msg)) => {
                let _ = output.send(OutboundMessage::DeviceMessage(msg));
              }
              Err(_) => break,
            }
          }
        }
      }
    });
  }

  /// Stops any active scan, snapshots the registry, clears it, and disconnects every entry. No
  /// `DeviceRemoved` is emitted for this path.
  pub async fn remove_all(&self) {
    let snapshot: Vec<(u32, Arc<dyn Device>, CancellationToken)> = self
      .devices
      .iter()
      .map(|e| (*e.key(), e.value().device.clone(), e.value().unsubscribe.clone()))
      .collect();
    self.devices.clear();
    for (_, device, unsubscribe) in snapshot {
      unsubscribe.cancel();
      if let Err(e) = device.disconnect().await {
        warn!("Error disconnecting device during remove_all: {}", e);
      }
    }
  }

  /// Returns only currently-connected entries, with message types filtered down to what the
  /// registry's negotiated spec version advertises.
  pub fn snapshot_connected(&self) -> Vec<DeviceListEntry> {
    let mut entries: Vec<DeviceListEntry> = self
      .devices
      .iter()
      .filter(|e| e.value().device.connected())
      .map(|e| DeviceListEntry {
        device_index: *e.key(),
        device_name: e.value().device.name(),
        allowed_messages: filter_allowed_messages(
          &e.value().device.allowed_message_types(),
          self.spec_version,
        ),
      })
      .collect();
    entries.sort_by_key(|e| e.device_index);
    entries
  }

  /// Sorted ascending so `StopAllDevices` dispatches in a deterministic, reproducible order.
  pub fn connected_indices(&self) -> Vec<u32> {
    let mut indices: Vec<u32> = self
      .devices
      .iter()
      .filter(|e| e.value().device.connected())
      .map(|e| *e.key())
      .collect();
    indices.sort_unstable();
    indices
  }

  #[cfg(test)]
  pub fn index_for_identifier(&self, identifier: &str) -> Option<u32> {
    self.index_of_identifier.get(identifier).map(|e| *e)
  }
}
