//! Attestation reports and their verification.
//!
//! A report travels through the CopyReport region of the shared buffer. The
//! enclave sends its nonce there, the host attestor overwrites the region with
//! the encoded report, and the enclave checks what came back:
//!
//! ```text
//! region (2048 bytes): [ len: u32 LE ][ bincode(AttestationReport) ][ 0 .. 0 ]
//!
//! Enclave receives the region
//!        │
//!        ▼
//! ┌──────────────────────────────────────────┐
//! │  1. Decode the report                    │
//! │  2. Check attestation_type               │
//! │  3. Check measurement against allowlist  │
//! │  4. Check nonce digest                   │
//! │  5. Check signature                      │
//! └──────────────────────────────────────────┘
//!        │
//!        ▼
//!   Accept or reject
//! ```

use edge_call::{Attestor, EdgeError, EdgeResult, EnclaveIdentity};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use thiserror::Error;
use tracing::debug;

/// Size of the length prefix in front of an encoded report.
pub const REPORT_LEN_PREFIX: usize = 4;

/// Key tag mixed into mock signatures.
const MOCK_KEY_TAG: [u8; 16] = *b"MOCK_ENCLAVE_V1\0";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttestationError {
    #[error("Signature verification failed")]
    InvalidSignature,

    #[error("Enclave measurement not in allowlist: {measurement}")]
    UnknownMeasurement { measurement: String },

    #[error("Nonce mismatch: expected {expected}, got {actual}")]
    NonceMismatch { expected: String, actual: String },

    #[error("Unsupported attestation type: {0}")]
    UnsupportedType(String),

    #[error("Report needs {needed} bytes but the region holds {len}")]
    RegionTooSmall { needed: usize, len: usize },

    #[error("Report encoding failed: {0}")]
    Encode(String),

    #[error("Report parsing failed: {0}")]
    Decode(String),
}

pub type AttestationResult<T> = Result<T, AttestationError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttestationType {
    /// Signed by the in-process mock attestor
    Mock,
}

impl std::fmt::Display for AttestationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttestationType::Mock => write!(f, "mock"),
        }
    }
}

/// SHA-256 of the exact nonce bytes.
pub fn nonce_digest(nonce: &[u8]) -> [u8; 32] {
    Sha256::digest(nonce).into()
}

/// Attestation report bound to one enclave measurement and one nonce.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttestationReport {
    pub attestation_type: AttestationType,

    /// Enclave measurement taken at load time
    pub measurement: [u8; 32],

    /// See [`nonce_digest`]
    pub nonce_digest: [u8; 32],

    pub signature: [u8; 32],

    pub enclave_id: String,
}

impl AttestationReport {
    /// Builds a mock report signed with the mock key.
    pub fn mock(enclave_id: impl Into<String>, measurement: [u8; 32], nonce: &[u8]) -> Self {
        let nonce_digest = nonce_digest(nonce);
        Self {
            attestation_type: AttestationType::Mock,
            measurement,
            nonce_digest,
            signature: mock_signature(&measurement, &nonce_digest),
            enclave_id: enclave_id.into(),
        }
    }

    pub fn measurement_hex(&self) -> String {
        hex::encode(self.measurement)
    }

    pub fn is_mock(&self) -> bool {
        self.attestation_type == AttestationType::Mock
    }

    /// Writes the report into `region` and zeroes the remainder.
    pub fn encode_into(&self, region: &mut [u8]) -> AttestationResult<()> {
        let bytes = bincode::serialize(self).map_err(|e| AttestationError::Encode(e.to_string()))?;
        let needed = REPORT_LEN_PREFIX + bytes.len();
        if region.len() < needed {
            return Err(AttestationError::RegionTooSmall {
                needed,
                len: region.len(),
            });
        }
        let len = u32::try_from(bytes.len())
            .map_err(|_| AttestationError::Encode("report length exceeds u32".to_string()))?;

        region.fill(0);
        region[..REPORT_LEN_PREFIX].copy_from_slice(&len.to_le_bytes());
        region[REPORT_LEN_PREFIX..needed].copy_from_slice(&bytes);
        Ok(())
    }

    pub fn decode(region: &[u8]) -> AttestationResult<Self> {
        let prefix: [u8; REPORT_LEN_PREFIX] = region
            .get(..REPORT_LEN_PREFIX)
            .and_then(|p| p.try_into().ok())
            .ok_or(AttestationError::RegionTooSmall {
                needed: REPORT_LEN_PREFIX,
                len: region.len(),
            })?;
        let len = u32::from_le_bytes(prefix) as usize;
        let body = region
            .get(REPORT_LEN_PREFIX..)
            .and_then(|rest| rest.get(..len))
            .ok_or_else(|| {
                AttestationError::Decode(format!(
                    "length prefix {} runs past the {}-byte region",
                    len,
                    region.len()
                ))
            })?;
        bincode::deserialize(body).map_err(|e| AttestationError::Decode(e.to_string()))
    }
}

fn mock_signature(measurement: &[u8; 32], nonce_digest: &[u8; 32]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(measurement);
    hasher.update(nonce_digest);
    hasher.update(MOCK_KEY_TAG);
    hasher.finalize().into()
}

/// Host-side attestor signing with the mock key.
#[derive(Debug, Clone)]
pub struct MockAttestor {
    enclave_id: String,
}

impl MockAttestor {
    pub fn new(enclave_id: impl Into<String>) -> Self {
        Self {
            enclave_id: enclave_id.into(),
        }
    }
}

impl Attestor for MockAttestor {
    fn sign(&self, identity: &EnclaveIdentity, nonce: &[u8], out: &mut [u8]) -> EdgeResult<()> {
        let report = AttestationReport::mock(self.enclave_id.clone(), identity.measurement, nonce);
        report
            .encode_into(out)
            .map_err(|e| EdgeError::Collaborator(e.to_string()))?;
        debug!(
            enclave_id = %self.enclave_id,
            measurement = %report.measurement_hex(),
            "Signed mock report"
        );
        Ok(())
    }
}

/// Allowlist-based report verifier.
#[derive(Debug, Clone, Default)]
pub struct ReportVerifier {
    allowed_measurements: HashSet<[u8; 32]>,
    /// Whether to accept mock reports
    allow_mock: bool,
}

impl ReportVerifier {
    pub fn new(allow_mock: bool) -> Self {
        Self {
            allowed_measurements: HashSet::new(),
            allow_mock,
        }
    }

    pub fn allow_mock() -> Self {
        Self::new(true)
    }

    pub fn add_measurement(&mut self, measurement: [u8; 32]) {
        self.allowed_measurements.insert(measurement);
    }

    pub fn with_measurement(mut self, measurement: [u8; 32]) -> Self {
        self.add_measurement(measurement);
        self
    }

    pub fn is_measurement_allowed(&self, measurement: &[u8; 32]) -> bool {
        self.allowed_measurements.contains(measurement)
    }

    /// Decodes the report in `region` and checks it against `nonce`.
    pub fn verify(&self, region: &[u8], nonce: &[u8]) -> AttestationResult<AttestationReport> {
        let report = AttestationReport::decode(region)?;

        if report.is_mock() && !self.allow_mock {
            return Err(AttestationError::UnsupportedType(
                report.attestation_type.to_string(),
            ));
        }
        if !self.is_measurement_allowed(&report.measurement) {
            return Err(AttestationError::UnknownMeasurement {
                measurement: report.measurement_hex(),
            });
        }

        let expected = nonce_digest(nonce);
        if report.nonce_digest != expected {
            return Err(AttestationError::NonceMismatch {
                expected: hex::encode(expected),
                actual: hex::encode(report.nonce_digest),
            });
        }

        match report.attestation_type {
            AttestationType::Mock => {
                if report.signature != mock_signature(&report.measurement, &report.nonce_digest) {
                    return Err(AttestationError::InvalidSignature);
                }
            }
        }
        Ok(report)
    }
}
