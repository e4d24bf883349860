//! Collaborators the handlers delegate to.
//!
//! Only the calling contract lives here; implementations belong to whoever
//! integrates the substrate.

use crate::error::EdgeResult;

/// Identity of the enclave on the other side of the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct EnclaveIdentity {
    /// Measurement taken by the lifecycle manager at load time
    pub measurement: [u8; 32],
}

impl EnclaveIdentity {
    pub fn new(measurement: [u8; 32]) -> Self {
        Self { measurement }
    }
}

/// Console / print service.
pub trait Console: Send + Sync {
    /// Renders raw bytes and returns a numeric acknowledgement.
    fn render_bytes(&self, bytes: &[u8]) -> u64;

    fn render_value(&self, value: u64);
}

/// Source of host strings handed to the enclave.
pub trait StringProvider: Send + Sync {
    fn next_string(&self) -> EdgeResult<Vec<u8>>;
}

/// Attestation service.
pub trait Attestor: Send + Sync {
    /// Overwrites `out` with a report for `identity`, keyed by `nonce`.
    fn sign(&self, identity: &EnclaveIdentity, nonce: &[u8], out: &mut [u8]) -> EdgeResult<()>;
}
