//! Protocol tests for halo-core.
//!
//! These drive the public API against `MockTransport` and `MockCipher`, so
//! they need no hardware:
//! `cargo test --package halo-core --test protocol`

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use halo_core::mock::{MockCipher, MockTransport, TransportCall};
use halo_core::uuids::{MASTER_AUTHENTICATION, RX_COMMAND, SESSION_KEY};
use halo_core::{
    AuthStage, Capability, CapabilityRegistry, CommandFrame, ControllerConfig, Error,
    HaloController, RelayAction, RelayCommand, RelayControl, RelaySelect, StateRefresher,
    Transport,
};

const ACCESS_CODE: &str = "2468";

fn controller(transport: &MockTransport) -> HaloController<MockTransport, MockCipher> {
    HaloController::new(
        transport.clone(),
        MockCipher::new(),
        ControllerConfig::new(transport.device_id(), ACCESS_CODE),
    )
    .unwrap()
}

fn auth_payload(session_key: &[u8]) -> Vec<u8> {
    let mut payload = session_key.to_vec();
    payload.extend_from_slice(ACCESS_CODE.as_bytes());
    payload
}

fn expected_frame(action: RelayAction, output: u8) -> Vec<u8> {
    CommandFrame::encode(&RelayCommand { action, output })
        .unwrap()
        .into()
}

// =============================================================================
// Request path
// =============================================================================

#[tokio::test]
async fn test_request_action_out_of_range_makes_no_transport_calls() {
    let transport = MockTransport::new("HCHLOR-TEST");
    let controller = controller(&transport);

    let err = controller
        .request_action(5, RelayAction::On)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidOutputIndex { output: 5 }));

    let err = controller
        .request_action(0, RelayAction::Off)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidOutputIndex { output: 0 }));

    assert!(transport.calls().is_empty());
}

#[tokio::test]
async fn test_request_action_writes_encrypted_frame() {
    let transport = MockTransport::new("HCHLOR-TEST");
    transport.queue_session_keys([vec![0x3C, 0xA5, 0x0F]]);
    let controller = controller(&transport);

    controller
        .request_action(2, RelayAction::Auto)
        .await
        .unwrap();

    let auth = transport.writes_to(MASTER_AUTHENTICATION);
    assert_eq!(auth, vec![auth_payload(&[0x3C, 0xA5, 0x0F])]);

    let commands = transport.writes_to(RX_COMMAND);
    assert_eq!(commands.len(), 1);
    assert_eq!(commands[0].len(), 20);
    assert_ne!(commands[0], expected_frame(RelayAction::Auto, 2));
    assert_eq!(
        MockCipher::decrypt(&commands[0], &[0x3C, 0xA5, 0x0F]),
        expected_frame(RelayAction::Auto, 2)
    );
}

#[tokio::test]
async fn test_authentication_write_failure_closes_connection_once() {
    let transport = MockTransport::new("HCHLOR-TEST");
    transport.fail_writes_to(MASTER_AUTHENTICATION);
    let controller = controller(&transport);

    let err = controller
        .request_action(3, RelayAction::On)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::AuthenticationFailed {
            stage: AuthStage::AuthenticationWrite,
            ..
        }
    ));
    assert_eq!(
        transport.calls(),
        vec![
            TransportCall::Connect,
            TransportCall::Read(SESSION_KEY),
            TransportCall::Write {
                uuid: MASTER_AUTHENTICATION,
                data: auth_payload(&[1u8; 16]),
            },
            TransportCall::Disconnect,
        ]
    );
    assert!(transport.writes_to(RX_COMMAND).is_empty());
    assert_eq!(transport.active_connections(), 0);
}

#[tokio::test]
async fn test_session_key_read_failure_closes_connection() {
    let transport = MockTransport::new("HCHLOR-TEST");
    transport.fail_reads_of(SESSION_KEY);
    let controller = controller(&transport);

    let err = controller
        .request_action(1, RelayAction::Off)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::AuthenticationFailed {
            stage: AuthStage::SessionKeyRead,
            ..
        }
    ));
    assert_eq!(transport.write_count(), 0);
    assert_eq!(transport.disconnect_count(), 1);
}

#[tokio::test]
async fn test_connection_failure_is_not_retried() {
    let transport = MockTransport::new("HCHLOR-TEST");
    transport.set_connect_failure(Some("no route to device"));
    let controller = controller(&transport);

    let err = controller
        .request_action(4, RelayAction::Auto)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::ConnectionFailed { .. }));
    assert_eq!(transport.calls(), vec![TransportCall::Connect]);
}

// =============================================================================
// Session keys
// =============================================================================

#[tokio::test]
async fn test_each_session_uses_its_own_key() {
    let transport = MockTransport::new("HCHLOR-TEST");
    transport.queue_session_keys([vec![0x10; 8], vec![0x20; 8], vec![0x30; 8]]);
    let controller = controller(&transport);

    let requests = [
        (1, RelayAction::On),
        (2, RelayAction::Off),
        (1, RelayAction::Auto),
    ];
    for (output, action) in requests {
        controller.request_action(output, action).await.unwrap();
    }

    let keys = transport.issued_session_keys();
    let commands = transport.writes_to(RX_COMMAND);
    assert_eq!(keys.len(), 3);
    assert_eq!(commands.len(), 3);

    for ((key, written), (output, action)) in keys.iter().zip(&commands).zip(requests) {
        assert_eq!(
            MockCipher::decrypt(written, key),
            expected_frame(action, output)
        );
    }
    assert_eq!(transport.connect_count(), 3);
    assert_eq!(transport.disconnect_count(), 3);
}

// =============================================================================
// Session gate
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_concurrent_requests_do_not_overlap() {
    let transport = MockTransport::new("HCHLOR-TEST");
    transport.set_write_latency(Duration::from_millis(400));
    let controller = Arc::new(controller(&transport));

    let tasks: Vec<_> = (1..=4)
        .map(|output| {
            let controller = Arc::clone(&controller);
            tokio::spawn(async move { controller.request_action(output, RelayAction::On).await })
        })
        .collect();

    for task in tasks {
        task.await.unwrap().unwrap();
    }

    assert_eq!(transport.connect_count(), 4);
    assert_eq!(transport.max_concurrent_connections(), 1);

    // Every connect is preceded by the previous session's disconnect.
    let calls = transport.calls();
    let mut open = false;
    for call in &calls {
        match call {
            TransportCall::Connect => {
                assert!(!open, "second connection opened while one was live");
                open = true;
            }
            TransportCall::Disconnect => open = false,
            _ => assert!(open),
        }
    }
    assert!(!controller.gate().is_in_session());
}

#[tokio::test(start_paused = true)]
async fn test_controllers_sharing_a_gate_are_serialized() {
    let transport = MockTransport::new("HCHLOR-TEST");
    transport.set_write_latency(Duration::from_millis(250));
    let gate = Arc::new(halo_core::SessionGate::new());
    let a = Arc::new(controller(&transport).with_gate(Arc::clone(&gate)));
    let b = Arc::new(controller(&transport).with_gate(Arc::clone(&gate)));

    let first = tokio::spawn({
        let a = Arc::clone(&a);
        async move { a.request_action(1, RelayAction::On).await }
    });
    let second = tokio::spawn({
        let b = Arc::clone(&b);
        async move { b.request_action(2, RelayAction::Off).await }
    });

    first.await.unwrap().unwrap();
    second.await.unwrap().unwrap();
    assert_eq!(transport.max_concurrent_connections(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_failed_session_releases_gate_for_next_request() {
    let transport = MockTransport::new("HCHLOR-TEST");
    transport.fail_writes_to(RX_COMMAND);
    let controller = controller(&transport);

    assert!(matches!(
        controller.request_action(1, RelayAction::On).await,
        Err(Error::CommandWriteFailed { .. })
    ));

    transport.clear_failures();
    tokio::time::timeout(
        Duration::from_millis(10),
        controller.request_action(1, RelayAction::On),
    )
    .await
    .expect("gate should be free immediately after a failure")
    .unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_request_holds_gate_until_disconnected() {
    let transport = MockTransport::new("HCHLOR-TEST");
    transport.set_write_latency(Duration::from_millis(400));
    transport.set_disconnect_latency(Duration::from_millis(300));
    let controller = controller(&transport);

    let cancelled = tokio::time::timeout(
        Duration::from_millis(100),
        controller.request_action(1, RelayAction::On),
    )
    .await;
    assert!(cancelled.is_err());
    assert!(controller.gate().is_in_session());

    controller.request_action(2, RelayAction::Off).await.unwrap();

    assert_eq!(transport.max_concurrent_connections(), 1);
    assert_eq!(transport.active_connections(), 0);
    let calls = transport.calls();
    assert_eq!(
        &calls[..4],
        &[
            TransportCall::Connect,
            TransportCall::Read(SESSION_KEY),
            TransportCall::Disconnect,
            TransportCall::Connect,
        ]
    );
    assert_eq!(calls.len(), 8);
    assert_eq!(calls[7], TransportCall::Disconnect);
    assert_eq!(transport.writes_to(RX_COMMAND).len(), 1);
    assert!(!controller.gate().is_in_session());
}

// =============================================================================
// Select workflow
// =============================================================================

#[derive(Default)]
struct Coordinator {
    resets: AtomicU32,
    refreshes: AtomicU32,
}

#[async_trait]
impl StateRefresher for Coordinator {
    fn reset_data_age(&self) {
        self.resets.fetch_add(1, Ordering::SeqCst);
    }

    async fn request_refresh(&self) {
        self.refreshes.fetch_add(1, Ordering::SeqCst);
    }
}

#[tokio::test(start_paused = true)]
async fn test_select_drives_controller_and_refresh() {
    let transport = MockTransport::new("HCHLOR-TEST");
    let controller = Arc::new(controller(&transport));
    let coordinator = Arc::new(Coordinator::default());

    let mut registry = CapabilityRegistry::new();
    let added = registry.register_flags(["GPO1Enabled", "GPO3Enabled", "HeaterEnabled"]);
    assert!(added.contains(&Capability::RelayOutput(3)));

    let selects: Vec<_> = registry
        .relay_outputs()
        .map(|output| {
            RelaySelect::from_config(
                output,
                Arc::clone(&controller),
                Arc::clone(&coordinator),
                controller.config(),
            )
            .unwrap()
        })
        .collect();
    assert_eq!(
        selects.iter().map(|s| s.name()).collect::<Vec<_>>(),
        vec!["GPO1", "GPO3"]
    );

    let started = tokio::time::Instant::now();
    selects[1].select_option("Auto").await.unwrap();
    assert_eq!(started.elapsed(), controller.config().settle_delay());

    let commands = transport.writes_to(RX_COMMAND);
    assert_eq!(
        MockCipher::decrypt(&commands[0], &transport.issued_session_keys()[0]),
        expected_frame(RelayAction::Auto, 3)
    );
    assert_eq!(coordinator.resets.load(Ordering::SeqCst), 1);
    assert_eq!(coordinator.refreshes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_select_failure_requests_no_refresh() {
    let transport = MockTransport::new("HCHLOR-TEST");
    transport.fail_writes_to(RX_COMMAND);
    let coordinator = Arc::new(Coordinator::default());
    let select = RelaySelect::new(2, controller(&transport), Arc::clone(&coordinator)).unwrap();

    let err = select.select_option("On").await.unwrap_err();
    assert!(matches!(err, Error::CommandWriteFailed { .. }));
    assert_eq!(transport.disconnect_count(), 1);
    assert_eq!(coordinator.resets.load(Ordering::SeqCst), 0);
    assert_eq!(coordinator.refreshes.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_select_unknown_option_touches_nothing() {
    let transport = MockTransport::new("HCHLOR-TEST");
    let select = RelaySelect::new(2, controller(&transport), Coordinator::default()).unwrap();

    select.select_option("Turbo").await.unwrap();
    assert!(transport.calls().is_empty());
}
