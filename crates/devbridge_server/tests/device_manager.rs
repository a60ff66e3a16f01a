// Device Bridge Rust Source Code File
//
// Licensed under the BSD 3-Clause license. See LICENSE file in the project root
// for full license information.

use devbridge_core::message::{
  ClientMessage, DeviceCommand, GlobalMessage, OutboundMessage, RequestDeviceList, StartScanning,
  StopAllDevices, StopScanning, VibrateCmd,
};
use devbridge_server::DeviceManagerBuilder;
use devbridge_testutil::{MockDevice, MockSubtypeManagerBuilder};
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn start_scanning_with_no_backends_returns_device_error() {
  let dm = DeviceManagerBuilder::new().finish();
  let reply = dm
    .send_message(
      ClientMessage::Global(GlobalMessage::StartScanning(StartScanning::new(1))),
      CancellationToken::new(),
    )
    .await;
  match reply {
    OutboundMessage::Error(e) => assert_eq!(e.error_kind(), "DeviceError"),
    other => panic!("expected an error reply, got {:?}", other),
  }
}

#[tokio::test]
async fn scanning_with_a_fast_returning_backend_still_reports_added_device_then_finished() {
  let dm = DeviceManagerBuilder::new().finish();
  let mut events = dm.event_stream();

  let builder = MockSubtypeManagerBuilder::new("mock");
  let helper = builder.helper();
  dm.add_manager(Box::new(builder)).expect("single registration");
  helper.queue_device(MockDevice::new("addr-1", "Test Vibrator"));

  let reply = dm
    .send_message(
      ClientMessage::Global(GlobalMessage::StartScanning(StartScanning::new(1))),
      CancellationToken::new(),
    )
    .await;
  assert!(matches!(reply, OutboundMessage::Ok(_)));

  let mut saw_added = false;
  let mut saw_finished = false;
  for _ in 0..4 {
    match events.recv().await.expect("event channel open") {
      OutboundMessage::DeviceAdded(da) => {
        assert_eq!(da.device_name(), "Test Vibrator");
        saw_added = true;
      }
      OutboundMessage::ScanningFinished(_) => {
        saw_finished = true;
        break;
      }
      _ => {}
    }
  }
  assert!(saw_added, "expected a DeviceAdded event");
  assert!(saw_finished, "expected a ScanningFinished event");
}

#[tokio::test]
async fn stop_scanning_is_idempotent_when_nothing_is_scanning() {
  let dm = DeviceManagerBuilder::new().finish();
  let builder = MockSubtypeManagerBuilder::new("mock");
  dm.add_manager(Box::new(builder)).expect("single registration");

  let reply = dm
    .send_message(
      ClientMessage::Global(GlobalMessage::StopScanning(StopScanning::new(1))),
      CancellationToken::new(),
    )
    .await;
  assert!(matches!(reply, OutboundMessage::Ok(_)));
}

#[tokio::test]
async fn request_device_list_reflects_only_connected_devices() {
  let dm = DeviceManagerBuilder::new().finish();
  let mut events = dm.event_stream();
  let builder = MockSubtypeManagerBuilder::new("mock");
  let helper = builder.helper();
  dm.add_manager(Box::new(builder)).expect("single registration");
  let device = MockDevice::new("addr-1", "Test Vibrator");
  helper.queue_device(device.clone());

  dm.send_message(
    ClientMessage::Global(GlobalMessage::StartScanning(StartScanning::new(1))),
    CancellationToken::new(),
  )
  .await;

  let mut device_index = None;
  while let Ok(msg) = events.recv().await {
    if let OutboundMessage::DeviceAdded(da) = msg {
      device_index = Some(da.device_index());
      break;
    }
  }
  let device_index = device_index.expect("device should have been added");

  let reply = dm
    .send_message(
      ClientMessage::Global(GlobalMessage::RequestDeviceList(RequestDeviceList::new(2))),
      CancellationToken::new(),
    )
    .await;
  match reply {
    OutboundMessage::DeviceList(list) => {
      assert_eq!(list.devices().len(), 1);
      assert_eq!(list.devices()[0].device_index, device_index);
    }
    other => panic!("expected a device list, got {:?}", other),
  }

  device.simulate_disconnect();
  // Give the forwarding task a chance to process the disconnect.
  tokio::task::yield_now().await;
  for _ in 0..4 {
    if let Ok(OutboundMessage::DeviceRemoved(dr)) = events.try_recv() {
      assert_eq!(dr.device_index(), device_index);
      break;
    }
    tokio::task::yield_now().await;
  }

  let reply = dm
    .send_message(
      ClientMessage::Global(GlobalMessage::RequestDeviceList(RequestDeviceList::new(3))),
      CancellationToken::new(),
    )
    .await;
  match reply {
    OutboundMessage::DeviceList(list) => assert!(list.devices().is_empty()),
    other => panic!("expected a device list, got {:?}", other),
  }
}

#[tokio::test]
async fn reconnecting_the_same_identifier_reuses_its_index() {
  let dm = DeviceManagerBuilder::new().finish();
  let mut events = dm.event_stream();
  let builder = MockSubtypeManagerBuilder::new("mock");
  let helper = builder.helper();
  dm.add_manager(Box::new(builder)).expect("single registration");
  let device = MockDevice::new("addr-1", "Test Vibrator");
  helper.queue_device(device.clone());

  dm.send_message(
    ClientMessage::Global(GlobalMessage::StartScanning(StartScanning::new(1))),
    CancellationToken::new(),
  )
  .await;

  let mut first_index = None;
  while let Ok(msg) = events.recv().await {
    if let OutboundMessage::DeviceAdded(da) = msg {
      first_index = Some(da.device_index());
      break;
    }
  }
  let first_index = first_index.expect("device should have been added");

  // Drain the ScanningFinished that follows the first DeviceAdded before re-scanning.
  while let Ok(msg) = events.recv().await {
    if let OutboundMessage::ScanningFinished(_) = msg {
      break;
    }
  }

  // Simulate the transport dropping the device so the registry treats the next discovery of
  // the same identifier as a reconnect rather than a duplicate live entry.
  device.simulate_disconnect();
  for _ in 0..4 {
    if let Ok(OutboundMessage::DeviceRemoved(dr)) = events.try_recv() {
      assert_eq!(dr.device_index(), first_index);
      break;
    }
    tokio::task::yield_now().await;
  }

  helper.queue_device(MockDevice::new("addr-1", "Test Vibrator"));
  dm.send_message(
    ClientMessage::Global(GlobalMessage::StartScanning(StartScanning::new(2))),
    CancellationToken::new(),
  )
  .await;

  let mut second_index = None;
  while let Ok(msg) = events.recv().await {
    if let OutboundMessage::DeviceAdded(da) = msg {
      second_index = Some(da.device_index());
      break;
    }
  }
  let second_index = second_index.expect("reconnected device should have been re-added");

  assert_eq!(first_index, second_index);
}

#[tokio::test]
async fn unknown_device_index_returns_device_error_naming_the_index() {
  let dm = DeviceManagerBuilder::new().finish();
  let reply = dm
    .send_message(
      ClientMessage::Device(DeviceCommand::Vibrate(VibrateCmd::new(9, 999, vec![0.5]))),
      CancellationToken::new(),
    )
    .await;
  match reply {
    OutboundMessage::Error(e) => {
      assert_eq!(e.error_kind(), "DeviceError");
      assert!(e.error_message().contains("999"));
    }
    other => panic!("expected an error reply, got {:?}", other),
  }
}

#[tokio::test]
async fn stop_all_devices_collects_every_failure_instead_of_aborting_on_the_first() {
  let dm = DeviceManagerBuilder::new().finish();
  let mut events = dm.event_stream();
  let builder = MockSubtypeManagerBuilder::new("mock");
  let helper = builder.helper();
  dm.add_manager(Box::new(builder)).expect("single registration");

  let good = MockDevice::new("addr-1", "Good Vibrator");
  let bad = MockDevice::new("addr-2", "Bad Vibrator");
  bad.fail_next_command();
  helper.queue_device(good.clone());
  helper.queue_device(bad.clone());

  dm.send_message(
    ClientMessage::Global(GlobalMessage::StartScanning(StartScanning::new(1))),
    CancellationToken::new(),
  )
  .await;

  let mut added = 0;
  while added < 2 {
    if let OutboundMessage::DeviceAdded(_) = events.recv().await.expect("event channel open") {
      added += 1;
    }
  }

  let reply = dm
    .send_message(
      ClientMessage::Global(GlobalMessage::StopAllDevices(StopAllDevices::new(5))),
      CancellationToken::new(),
    )
    .await;
  match reply {
    OutboundMessage::Error(e) => {
      assert_eq!(e.error_kind(), "DeviceError");
      // Good device (index 1) succeeds, contributing an empty segment; bad device (index 2)
      // fails, contributing its error text.
      assert_eq!(e.error_message(), "; simulated transport failure");
    }
    other => panic!("expected an error reply reporting the partial failure, got {:?}", other),
  }
  assert_eq!(good.commands_received().len(), 1);
  assert_eq!(bad.commands_received().len(), 1);
}

#[tokio::test]
async fn shutdown_disconnects_every_device_and_is_idempotent() {
  let dm = DeviceManagerBuilder::new().finish();
  let mut events = dm.event_stream();
  let builder = MockSubtypeManagerBuilder::new("mock");
  let helper = builder.helper();
  dm.add_manager(Box::new(builder)).expect("single registration");
  let device = MockDevice::new("addr-1", "Test Vibrator");
  helper.queue_device(device.clone());

  dm.send_message(
    ClientMessage::Global(GlobalMessage::StartScanning(StartScanning::new(1))),
    CancellationToken::new(),
  )
  .await;
  while let Ok(msg) = events.recv().await {
    if let OutboundMessage::DeviceAdded(_) = msg {
      break;
    }
  }

  dm.shutdown().await.expect("first shutdown succeeds");
  assert!(!device.connected());
  dm.shutdown().await.expect("shutdown is idempotent");
}
