//! Enclave creation parameters.

use crate::error::{EnclaveError, EnclaveResult};
use edge_call::{ENVELOPE_SIZE, REPORT_REGION_LEN};
use serde::{Deserialize, Serialize};

pub const DEFAULT_FREE_MEM_SIZE: u64 = 200 * 1024 * 1024;
pub const DEFAULT_UNTRUSTED_SIZE: usize = 4 * 1024 * 1024;

/// Smallest shared buffer that still carries a full CopyReport round trip.
pub const MIN_UNTRUSTED_SIZE: usize = ENVELOPE_SIZE + REPORT_REGION_LEN;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnclaveParams {
    /// Private memory handed to the enclave
    pub free_mem_size: u64,
    /// Length of the shared buffer
    pub untrusted_size: usize,
}

impl Default for EnclaveParams {
    fn default() -> Self {
        Self {
            free_mem_size: DEFAULT_FREE_MEM_SIZE,
            untrusted_size: DEFAULT_UNTRUSTED_SIZE,
        }
    }
}

impl EnclaveParams {
    pub fn with_free_mem_size(mut self, bytes: u64) -> Self {
        self.free_mem_size = bytes;
        self
    }

    pub fn with_untrusted_size(mut self, bytes: usize) -> Self {
        self.untrusted_size = bytes;
        self
    }

    pub fn validate(&self) -> EnclaveResult<()> {
        if self.free_mem_size == 0 {
            return Err(EnclaveError::InvalidParams(
                "free_mem_size must be non-zero".to_string(),
            ));
        }
        if self.untrusted_size < MIN_UNTRUSTED_SIZE {
            return Err(EnclaveError::InvalidParams(format!(
                "untrusted_size {} is below the minimum of {} bytes",
                self.untrusted_size, MIN_UNTRUSTED_SIZE
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let params = EnclaveParams::default();
        assert_eq!(params.untrusted_size, 4 * 1024 * 1024);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_rejects_small_untrusted_size() {
        let params = EnclaveParams::default().with_untrusted_size(MIN_UNTRUSTED_SIZE - 1);
        assert!(matches!(
            params.validate(),
            Err(EnclaveError::InvalidParams(_))
        ));
        assert!(params
            .with_untrusted_size(MIN_UNTRUSTED_SIZE)
            .validate()
            .is_ok());
    }

    #[test]
    fn test_rejects_zero_free_mem() {
        assert!(EnclaveParams::default()
            .with_free_mem_size(0)
            .validate()
            .is_err());
    }
}
