//! Monitor result codes

use thiserror::Error;

pub const SBI_SUCCESS: u64 = 0;
pub const SBI_ERR_SM_ENCLAVE_INVALID_ID: u64 = 100003;
pub const SBI_ERR_SM_NOT_IMPLEMENTED: u64 = 100100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MonitorError {
    /// Unknown plugin, or a plugin that does not know the inner call id.
    #[error("Plugin {plugin_id} call {call_id} is not implemented")]
    NotImplemented { plugin_id: u64, call_id: u64 },

    #[error("Enclave {0} is not known to the monitor")]
    InvalidId(u64),
}

impl MonitorError {
    /// Stable numeric code returned across the monitor boundary.
    pub fn code(&self) -> u64 {
        match self {
            MonitorError::NotImplemented { .. } => SBI_ERR_SM_NOT_IMPLEMENTED,
            MonitorError::InvalidId(_) => SBI_ERR_SM_ENCLAVE_INVALID_ID,
        }
    }
}

pub type MonitorResult<T> = Result<T, MonitorError>;
