//! Enclave lifecycle errors

use crate::attestation::AttestationError;
use crate::traits::EnclavePhase;
use edge_call::EdgeError;
use edge_monitor::MonitorError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EnclaveError {
    #[error("Edge call failed: {0}")]
    Edge(#[from] EdgeError),

    #[error("Monitor call failed: {0}")]
    Monitor(#[from] MonitorError),

    #[error("Attestation failed: {0}")]
    Attestation(#[from] AttestationError),

    #[error("Cannot {operation} an enclave that is {phase}")]
    InvalidPhase {
        phase: EnclavePhase,
        operation: &'static str,
    },

    #[error("Failed to read enclave image {path}: {source}")]
    ImageRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Enclave image is empty")]
    EmptyImage,

    #[error("Invalid enclave parameters: {0}")]
    InvalidParams(String),

    #[error("No dispatch table registered")]
    NoDispatchTable,

    #[error("Enclave application {app} failed: {reason}")]
    App { app: String, reason: String },
}

pub type EnclaveResult<T> = Result<T, EnclaveError>;
