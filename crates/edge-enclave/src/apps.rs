//! Enclave applications.

use crate::attestation::{AttestationReport, ReportVerifier};
use crate::env::EnclaveEnv;
use crate::error::{EnclaveError, EnclaveResult};
use crate::traits::EnclaveApp;
use edge_monitor::{MULTIMEM_GET_OTHER_REGION_SIZE, PLUGIN_ID_MULTIMEM, SBI_SUCCESS};
use parking_lot::Mutex;
use tracing::debug;

/// Fetches a nonce from the host, has it attested and checks the report.
///
/// Call sequence: GetHostString, PrintValue (2 * 3), CopyReport, PrintBuffer.
#[derive(Debug, Default)]
pub struct AttestorApp {
    verifier: Option<ReportVerifier>,
    last_report: Mutex<Option<AttestationReport>>,
}

impl AttestorApp {
    /// Verifies with `verifier` instead of trusting the enclave's own measurement.
    pub fn with_verifier(verifier: ReportVerifier) -> Self {
        Self {
            verifier: Some(verifier),
            last_report: Mutex::new(None),
        }
    }

    pub fn last_report(&self) -> Option<AttestationReport> {
        self.last_report.lock().clone()
    }

    fn failure(&self, reason: String) -> EnclaveError {
        EnclaveError::App {
            app: self.name().to_string(),
            reason,
        }
    }
}

impl EnclaveApp for AttestorApp {
    fn name(&self) -> &str {
        "attestor"
    }

    fn run(&self, env: &mut EnclaveEnv<'_>) -> EnclaveResult<i32> {
        let verifier = self
            .verifier
            .clone()
            .unwrap_or_else(|| ReportVerifier::allow_mock().with_measurement(env.measurement()));

        let nonce = env.caller().host_string()?;
        debug!(nonce_len = nonce.len(), "Received nonce");

        let product: u64 = 2 * 3;
        env.caller().print_value(product)?;

        let region = env.caller().copy_report(&nonce)?;
        let report = verifier.verify(&region, &nonce)?;

        // The monitor must agree on the size of the region shared with the host.
        let region_size =
            env.monitor_call(PLUGIN_ID_MULTIMEM, MULTIMEM_GET_OTHER_REGION_SIZE, 0, 0);
        if region_size.error != SBI_SUCCESS {
            return Err(self.failure(format!(
                "multimem size query failed with code {}",
                region_size.error
            )));
        }
        let buffer_len = env.caller().buffer_len() as u64;
        if region_size.value != buffer_len {
            return Err(self.failure(format!(
                "monitor reports a {}-byte shared region, buffer is {} bytes",
                region_size.value, buffer_len
            )));
        }

        let status = format!("attested {}", &report.measurement_hex()[..16]);
        let ack = env.caller().print_buffer(&status)?;
        if ack != status.len() as u64 {
            return Err(self.failure(format!(
                "host acknowledged {} of {} bytes",
                ack,
                status.len()
            )));
        }

        *self.last_report.lock() = Some(report);
        Ok(0)
    }
}
