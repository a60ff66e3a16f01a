// Device Bridge Rust Source Code File
//
// Licensed under the BSD 3-Clause license. See LICENSE file in the project root
// for full license information.

//! Owns the set of registered subtype managers and the factory table used for auto-load.

use crate::{
  contract::{SubtypeManager, SubtypeManagerEvent, SubtypeManagerFactory},
  registry::DeviceRegistry,
  scan_coordinator::ScanCoordinator,
};
use dashmap::DashMap;
use devbridge_core::{errors::BridgeResult, util::async_manager};
use once_cell::sync::Lazy;
use std::sync::{
  atomic::{AtomicBool, Ordering},
  Arc,
};
use tokio::sync::mpsc;

/// Subtype manager implementations register themselves here at link time (e.g. via `inventory`
/// or an explicit call from a binary's `main`); `add_all` walks the table at startup.
static FACTORIES: Lazy<DashMap<&'static str, SubtypeManagerFactory>> = Lazy::new(DashMap::new);

pub fn register_factory(name: &'static str, factory: SubtypeManagerFactory) {
  FACTORIES.insert(name, factory);
}

pub struct ManagerSet {
  managers: DashMap<String, Arc<dyn SubtypeManager>>,
  registry: Arc<DeviceRegistry>,
  scan: Arc<ScanCoordinator>,
  /// Set once `add_all` has run, so `start_scanning_all` only triggers auto-load the first time
  /// the manager set is found empty.
  auto_loaded: AtomicBool,
}

impl ManagerSet {
  pub fn new(registry: Arc<DeviceRegistry>, scan: Arc<ScanCoordinator>) -> Self {
    Self {
      managers: DashMap::new(),
      registry,
      scan,
      auto_loaded: AtomicBool::new(false),
    }
  }

  pub fn len(&self) -> usize {
    self.managers.len()
  }

  /// Builds and registers one subtype manager. A second manager of the same kind is logged and
  /// ignored rather than replacing the one already present.
  pub fn add_manager(
    &self,
    builder: Box<dyn crate::contract::SubtypeManagerBuilder>,
  ) -> BridgeResult<()> {
    let (tx, rx) = mpsc::channel(256);
    let manager: Arc<dyn SubtypeManager> = Arc::from(builder.finish(tx));
    let name = manager.name();
    if self.managers.contains_key(name) {
      warn!("Subtype manager {} already added, ignoring.", name);
      return Ok(());
    }
    self.managers.insert(name.to_owned(), manager);
    self.spawn_event_forwarder(rx);
    Ok(())
  }

  /// Instantiates every auto-load factory registered via [register_factory]. A factory that
  /// fails to build or register is logged and skipped; the rest still load.
  pub fn add_all(&self) -> BridgeResult<()> {
    for entry in FACTORIES.iter() {
      if let Err(e) = self.add_manager(entry.value()()) {
        warn!("Auto-load of subtype manager {} failed: {}", entry.key(), e);
      }
    }
    self.auto_loaded.store(true, Ordering::SeqCst);
    Ok(())
  }

  fn spawn_event_forwarder(&self, mut rx: mpsc::Receiver<SubtypeManagerEvent>) {
    let registry = self.registry.clone();
    let scan = self.scan.clone();
    async_manager::spawn(async move {
      while let Some(event) = rx.recv().await {
        match event {
          SubtypeManagerEvent::DeviceAdded(device) => registry.on_device_added(device).await,
          SubtypeManagerEvent::ScanningFinished => scan.on_manager_finished().await,
        }
      }
    });
  }

  pub async fn start_scanning_all(&self) -> BridgeResult<()> {
    if self.managers.is_empty() && !self.auto_loaded.load(Ordering::SeqCst) {
      self.add_all()?;
    }
    self.scan.start(self.managers.len()).await?;
    for entry in self.managers.iter() {
      if let Err(e) = entry.value().start_scanning().await {
        warn!("Subtype manager {} failed to start scanning: {}", entry.key(), e);
      }
    }
    self.scan.bring_up_complete().await;
    Ok(())
  }

  pub async fn stop_scanning_all(&self) -> BridgeResult<()> {
    for entry in self.managers.iter() {
      if entry.value().is_scanning() {
        if let Err(e) = entry.value().stop_scanning().await {
          warn!("Subtype manager {} failed to stop scanning: {}", entry.key(), e);
        }
      }
    }
    self.scan.force_idle().await;
    Ok(())
  }
}
