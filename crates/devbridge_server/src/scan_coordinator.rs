// Device Bridge Rust Source Code File
//
// Licensed under the BSD 3-Clause license. See LICENSE file in the project root
// for full license information.

//! Aggregates per-subtype-manager scanning status into a single logical scan for the whole
//! device manager. Grounded directly in the legacy device manager's
//! `scanning_in_progress`/`comm_manager_scanning_statuses` bookkeeping, which exists to avoid
//! emitting `ScanningFinished` before every backend has actually had a chance to start.

use devbridge_core::{
  errors::{BridgeResult, DeviceError},
  message::{OutboundMessage, ScanningFinished},
};
use tokio::sync::{broadcast, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
  Idle,
  /// `start()` has called every manager's `start_scanning()` but at least one manager that
  /// reported finished synchronously during bring-up has not yet been recorded, so a finished
  /// check run during this phase is deferred rather than emitted immediately.
  Starting,
  Scanning,
}

struct ScanState {
  phase: Phase,
  /// Set when a manager finishes while we're still in `Starting`, so the deferred check runs as
  /// soon as `start()` flips the phase to `Scanning`.
  finished_during_starting: bool,
  outstanding: usize,
}

pub struct ScanCoordinator {
  state: Mutex<ScanState>,
  output: broadcast::Sender<OutboundMessage>,
}

impl ScanCoordinator {
  pub fn new(output: broadcast::Sender<OutboundMessage>) -> Self {
    Self {
      state: Mutex::new(ScanState {
        phase: Phase::Idle,
        finished_during_starting: false,
        outstanding: 0,
      }),
      output,
    }
  }

  pub async fn is_scanning(&self) -> bool {
    !matches!(self.state.lock().await.phase, Phase::Idle)
  }

  /// Enters `Starting`, recording how many managers we expect a finished-report from.
  /// Returns an error if there are no managers to scan with.
  pub async fn start(&self, manager_count: usize) -> BridgeResult<()> {
    let mut state = self.state.lock().await;
    if !matches!(state.phase, Phase::Idle) {
      return Err(DeviceError::AlreadyScanning.into());
    }
    if manager_count == 0 {
      return Err(DeviceError::NoScanBackends.into());
    }
    state.phase = Phase::Starting;
    state.finished_during_starting = false;
    state.outstanding = manager_count;
    Ok(())
  }

  /// Called once every manager's `start_scanning()` call has returned. Promotes `Starting` to
  /// `Scanning` and, if a finished report already arrived during bring-up, resolves it now
  /// instead of losing it — this is the fix for the race the legacy "HACK" comment papered over
  /// with a synthetic event.
  pub async fn bring_up_complete(&self) {
    let mut state = self.state.lock().await;
    if !matches!(state.phase, Phase::Starting) {
      return;
    }
    state.phase = Phase::Scanning;
    if state.finished_during_starting && state.outstanding == 0 {
      state.phase = Phase::Idle;
      let _ = self.output.send(OutboundMessage::ScanningFinished(ScanningFinished::new()));
    }
  }

  /// Called for every manager-reported `ScanningFinished`. Emits the aggregate
  /// `ScanningFinished` only once every outstanding manager has reported in, and only once
  /// bring-up has completed.
  pub async fn on_manager_finished(&self) {
    let mut state = self.state.lock().await;
    match state.phase {
      Phase::Idle => return,
      Phase::Starting => {
        state.finished_during_starting = true;
        state.outstanding = state.outstanding.saturating_sub(1);
        return;
      }
      Phase::Scanning => {
        state.outstanding = state.outstanding.saturating_sub(1);
      }
    }
    if state.outstanding == 0 {
      state.phase = Phase::Idle;
      let _ = self.output.send(OutboundMessage::ScanningFinished(ScanningFinished::new()));
    }
  }

  /// Forces the coordinator back to `Idle` without waiting for every manager to report, used
  /// when `stop_scanning()` is dispatched explicitly.
  pub async fn force_idle(&self) {
    let mut state = self.state.lock().await;
    state.phase = Phase::Idle;
    state.finished_during_starting = false;
    state.outstanding = 0;
  }
}

#[cfg(test)]
mod test {
  use super::*;

  #[tokio::test]
  async fn finishes_once_all_managers_report() {
    let (tx, mut rx) = broadcast::channel(4);
    let coordinator = ScanCoordinator::new(tx);
    coordinator.start(2).await.unwrap();
    coordinator.bring_up_complete().await;
    assert!(coordinator.is_scanning().await);
    coordinator.on_manager_finished().await;
    assert!(coordinator.is_scanning().await);
    coordinator.on_manager_finished().await;
    assert!(!coordinator.is_scanning().await);
    assert!(matches!(rx.try_recv(), Ok(OutboundMessage::ScanningFinished(_))));
  }

  #[tokio::test]
  async fn fast_finisher_during_starting_is_not_lost() {
    let (tx, mut rx) = broadcast::channel(4);
    let coordinator = ScanCoordinator::new(tx);
    coordinator.start(1).await.unwrap();
    // Manager reports finished before `bring_up_complete` runs.
    coordinator.on_manager_finished().await;
    assert!(rx.try_recv().is_err());
    coordinator.bring_up_complete().await;
    assert!(!coordinator.is_scanning().await);
    assert!(matches!(rx.try_recv(), Ok(OutboundMessage::ScanningFinished(_))));
  }

  #[tokio::test]
  async fn no_backends_is_an_error() {
    let (tx, _rx) = broadcast::channel(4);
    let coordinator = ScanCoordinator::new(tx);
    let err = coordinator.start(0).await.unwrap_err();
    assert!(matches!(err, devbridge_core::errors::BridgeError::Device(DeviceError::NoScanBackends)));
  }
}
