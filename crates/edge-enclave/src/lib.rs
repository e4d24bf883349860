//! # Edge Enclave
//!
//! Enclave lifecycle and attestation on top of the edge-call substrate.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                              Host                                       │
//! │                                                                         │
//! │  EnclaveRuntime: load → measure → register_dispatch → start → run      │
//! │        │                              │                  │              │
//! │        │                   HostServices (Console,        │ registers    │
//! │        │                   StringProvider, MockAttestor) │ shared region│
//! │        ▼                              │                  ▼              │
//! │  ┌───────────────────────┐            │        ┌───────────────────┐    │
//! │  │     MockEnclave       │◀── edge calls ──────│  PluginMultiplexer │   │
//! │  │   (feature: mock)     │                     │  (multimem)        │   │
//! │  │                       │──── monitor calls ─▶│                    │   │
//! │  │  EnclaveApp runs      │                     └───────────────────┘    │
//! │  │  with EnclaveEnv      │                                              │
//! │  └───────────────────────┘                                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use edge_enclave::{create_default_enclave, mock_host_services, AttestorApp, EnclaveImage, EnclaveParams, EnclaveRuntime};
//!
//! let mut enclave = create_default_enclave(monitor);
//! enclave.load(EnclaveImage::from_path("attestor.eapp")?, EnclaveParams::default())?;
//! let services = mock_host_services(enclave.enclave_id(), enclave.measure()?, console, strings);
//! enclave.register_dispatch(services.dispatch_table()?)?;
//! enclave.start()?;
//! let exit_code = enclave.run(&AttestorApp::default())?;
//! ```

pub mod apps;
pub mod attestation;
pub mod config;
pub mod env;
pub mod error;
pub mod services;
pub mod traits;

#[cfg(feature = "mock")]
pub mod mock;

pub use apps::AttestorApp;
pub use attestation::{
    nonce_digest, AttestationError, AttestationReport, AttestationResult, AttestationType,
    MockAttestor, ReportVerifier,
};
pub use config::{EnclaveParams, DEFAULT_FREE_MEM_SIZE, DEFAULT_UNTRUSTED_SIZE, MIN_UNTRUSTED_SIZE};
pub use env::EnclaveEnv;
pub use error::{EnclaveError, EnclaveResult};
pub use services::{NonceStringProvider, StaticStringProvider, TracingConsole};
pub use traits::{
    EnclaveApp, EnclaveImage, EnclaveInfo, EnclavePhase, EnclavePlatform, EnclaveRuntime,
};

#[cfg(feature = "mock")]
pub use mock::{MockEnclave, MockEnclaveBuilder};

use edge_call::{Console, EnclaveIdentity, HostServices, StringProvider};
use std::sync::Arc;

/// Create the default enclave based on enabled features
#[cfg(feature = "mock")]
pub fn create_default_enclave(monitor: Arc<edge_monitor::PluginMultiplexer>) -> MockEnclave {
    MockEnclave::new(monitor)
}

/// Host services for `enclave_id`, attesting with the mock attestor.
pub fn mock_host_services(
    enclave_id: &str,
    measurement: [u8; 32],
    console: Arc<dyn Console>,
    strings: Arc<dyn StringProvider>,
) -> HostServices {
    HostServices {
        console,
        strings,
        attestor: Arc::new(MockAttestor::new(enclave_id)),
        identity: EnclaveIdentity::new(measurement),
    }
}
