//! Full attestor session against the mock enclave.

use edge_call::{EdgeError, StringProvider};
use edge_enclave::{
    create_default_enclave, mock_host_services, nonce_digest, AttestorApp, EnclaveError,
    EnclaveImage, EnclaveParams, EnclavePhase, EnclaveRuntime, MockEnclave, NonceStringProvider,
    ReportVerifier, StaticStringProvider, TracingConsole,
};
use edge_monitor::{MemRegion, PluginMultiplexer};
use std::sync::Arc;

const IMAGE: &[u8] = b"\x7fELF attestor enclave image";

struct Session {
    monitor: Arc<PluginMultiplexer>,
    enclave: MockEnclave,
    console: Arc<TracingConsole>,
}

fn session(strings: Arc<dyn StringProvider>, untrusted_size: usize) -> Session {
    let monitor = Arc::new(PluginMultiplexer::default());
    let mut enclave = create_default_enclave(monitor.clone());
    enclave
        .load(
            EnclaveImage::from_bytes("attestor.eapp", IMAGE.to_vec()).unwrap(),
            EnclaveParams::default().with_untrusted_size(untrusted_size),
        )
        .unwrap();

    let console = Arc::new(TracingConsole::new());
    let services = mock_host_services(
        enclave.enclave_id(),
        enclave.measure().unwrap(),
        console.clone(),
        strings,
    );
    enclave
        .register_dispatch(services.dispatch_table().unwrap())
        .unwrap();
    enclave.start().unwrap();

    Session {
        monitor,
        enclave,
        console,
    }
}

#[test]
fn attestor_round_trip() {
    let mut s = session(Arc::new(NonceStringProvider::default()), 64 * 1024);
    let app = AttestorApp::default();

    assert_eq!(s.enclave.run(&app).unwrap(), 0);
    assert_eq!(s.enclave.phase(), EnclavePhase::Exited);

    let report = app.last_report().unwrap();
    assert_eq!(report.enclave_id, s.enclave.enclave_id());
    assert_eq!(report.measurement, s.enclave.measure().unwrap());

    let transcript = s.console.transcript();
    assert_eq!(transcript.len(), 2);
    assert_eq!(transcript[0], "value: 6");
    assert_eq!(
        transcript[1],
        format!("attested {}", &report.measurement_hex()[..16])
    );

    s.enclave.destroy().unwrap();
    assert_eq!(s.monitor.multimem().region(s.enclave.monitor_id()), None);
}

#[test]
fn report_binds_host_nonce() {
    let nonce = b"host-chosen-nonce".to_vec();
    let mut s = session(
        Arc::new(StaticStringProvider::new([nonce.clone()])),
        64 * 1024,
    );
    let app = AttestorApp::default();

    s.enclave.run(&app).unwrap();
    assert_eq!(app.last_report().unwrap().nonce_digest, nonce_digest(&nonce));
}

#[test]
fn verifier_rejects_other_measurement() {
    let mut s = session(Arc::new(NonceStringProvider::default()), 64 * 1024);
    let app = AttestorApp::with_verifier(ReportVerifier::allow_mock().with_measurement([0u8; 32]));

    assert!(matches!(
        s.enclave.run(&app),
        Err(EnclaveError::Attestation(_))
    ));
    assert!(app.last_report().is_none());
    // Nothing past CopyReport reached the console.
    assert_eq!(s.console.transcript(), vec!["value: 6"]);
}

#[test]
fn missing_host_string_fails_the_app() {
    let mut s = session(Arc::new(StaticStringProvider::default()), 64 * 1024);

    assert!(matches!(
        s.enclave.run(&AttestorApp::default()),
        Err(EnclaveError::Edge(EdgeError::CallFailed { .. }))
    ));
    assert_eq!(s.enclave.phase(), EnclavePhase::Exited);
}

#[test]
fn oversized_nonce_is_rejected() {
    let mut s = session(
        Arc::new(StaticStringProvider::new([vec![b'n'; 3000]])),
        64 * 1024,
    );

    assert!(matches!(
        s.enclave.run(&AttestorApp::default()),
        Err(EnclaveError::Edge(EdgeError::NonceTooLarge { len: 3000, .. }))
    ));
}

#[test]
fn load_rejects_undersized_buffer() {
    let mut enclave = create_default_enclave(Arc::new(PluginMultiplexer::default()));
    let result = enclave.load(
        EnclaveImage::from_bytes("attestor.eapp", IMAGE.to_vec()).unwrap(),
        EnclaveParams::default().with_untrusted_size(1024),
    );
    assert!(matches!(result, Err(EnclaveError::InvalidParams(_))));
    assert_eq!(enclave.phase(), EnclavePhase::Created);
}

#[test]
fn region_size_mismatch_fails_the_app() {
    let mut s = session(Arc::new(NonceStringProvider::default()), 64 * 1024);
    let registered = s.monitor.multimem().region(s.enclave.monitor_id()).unwrap();
    assert_eq!(registered.size, 64 * 1024);
    s.monitor.multimem().register_region(
        s.enclave.monitor_id(),
        MemRegion {
            base: registered.base,
            size: 32 * 1024,
        },
    );

    let app = AttestorApp::default();
    match s.enclave.run(&app) {
        Err(EnclaveError::App { app, reason }) => {
            assert_eq!(app, "attestor");
            assert!(reason.contains("32768"), "{}", reason);
        }
        other => panic!("expected an app failure, got {:?}", other),
    }
    assert!(app.last_report().is_none());
}

#[test]
fn missing_region_fails_the_app() {
    let mut s = session(Arc::new(NonceStringProvider::default()), 64 * 1024);
    s.monitor.multimem().release(s.enclave.monitor_id());

    match s.enclave.run(&AttestorApp::default()) {
        Err(EnclaveError::App { reason, .. }) => assert!(reason.contains("100003"), "{}", reason),
        other => panic!("expected an app failure, got {:?}", other),
    }
}
