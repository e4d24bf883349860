//! One enclave run from load to destroy.

use crate::config::HostConfig;
use anyhow::{Context, Result};
use edge_call::StringProvider;
use edge_enclave::{
    create_default_enclave, mock_host_services, AttestationReport, AttestorApp, EnclaveImage,
    EnclaveInfo, EnclaveRuntime, NonceStringProvider, StaticStringProvider, TracingConsole,
};
use edge_monitor::PluginMultiplexer;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

/// Attestation report in printable form.
#[derive(Debug, Clone, Serialize)]
pub struct ReportSummary {
    pub attestation_type: String,
    pub enclave_id: String,
    pub measurement: String,
    pub nonce_digest: String,
}

impl From<&AttestationReport> for ReportSummary {
    fn from(report: &AttestationReport) -> Self {
        Self {
            attestation_type: report.attestation_type.to_string(),
            enclave_id: report.enclave_id.clone(),
            measurement: report.measurement_hex(),
            nonce_digest: hex::encode(report.nonce_digest),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    /// Enclave state right after the application exited
    pub enclave: EnclaveInfo,
    pub exit_code: i32,
    /// Lines the enclave printed through the host console
    pub transcript: Vec<String>,
    pub report: Option<ReportSummary>,
}

/// Loads `image`, runs the attestor application and tears the enclave down.
pub fn run_session(image: EnclaveImage, config: &HostConfig) -> Result<SessionReport> {
    config.validate()?;

    let monitor = Arc::new(PluginMultiplexer::default());
    let mut enclave = create_default_enclave(monitor);
    enclave
        .load(image, config.params())
        .context("Failed to load enclave")?;
    let measurement = enclave.measure()?;

    let strings: Arc<dyn StringProvider> = match &config.nonce {
        Some(nonce) => Arc::new(StaticStringProvider::new([nonce.clone().into_bytes()])),
        None => Arc::new(NonceStringProvider::new(config.nonce_len)),
    };
    let console = Arc::new(TracingConsole::new());
    let services = mock_host_services(enclave.enclave_id(), measurement, console.clone(), strings);

    enclave.register_dispatch(services.dispatch_table()?)?;
    enclave.start().context("Failed to start enclave")?;

    let app = AttestorApp::default();
    let run = enclave.run(&app);
    let info = enclave.info();
    enclave.destroy()?;
    let exit_code = run.context("Enclave application failed")?;

    info!(
        enclave_id = %info.enclave_id,
        exit_code,
        "Session finished"
    );

    Ok(SessionReport {
        enclave: info,
        exit_code,
        transcript: console.transcript(),
        report: app.last_report().as_ref().map(ReportSummary::from),
    })
}
