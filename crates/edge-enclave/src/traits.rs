//! Enclave runtime abstractions.

use crate::config::EnclaveParams;
use crate::error::{EnclaveError, EnclaveResult};
use crate::env::EnclaveEnv;
use edge_call::DispatchTable;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::Path;

/// Lifecycle phase of an enclave.
///
/// ```text
/// Created ─load─▶ Loaded ─start─▶ Started ─run─▶ Running ─▶ Exited
///    └──────────────┴───────────────┴─────────────────────────┴──destroy──▶ Destroyed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EnclavePhase {
    Created,
    Loaded,
    Started,
    Running,
    Exited,
    Destroyed,
}

impl fmt::Display for EnclavePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EnclavePhase::Created => "created",
            EnclavePhase::Loaded => "loaded",
            EnclavePhase::Started => "started",
            EnclavePhase::Running => "running",
            EnclavePhase::Exited => "exited",
            EnclavePhase::Destroyed => "destroyed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EnclavePlatform {
    /// In-process simulation, no isolation
    Mock,
}

/// Enclave binary as loaded by the host.
#[derive(Debug, Clone)]
pub struct EnclaveImage {
    name: String,
    bytes: Vec<u8>,
}

impl EnclaveImage {
    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> EnclaveResult<Self> {
        if bytes.is_empty() {
            return Err(EnclaveError::EmptyImage);
        }
        Ok(Self {
            name: name.into(),
            bytes,
        })
    }

    pub fn from_path(path: impl AsRef<Path>) -> EnclaveResult<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| EnclaveError::ImageRead {
            path: path.to_path_buf(),
            source,
        })?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self::from_bytes(name, bytes)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// SHA-256 over the image bytes.
    pub fn measure(&self) -> [u8; 32] {
        Sha256::digest(&self.bytes).into()
    }
}

/// Information about an enclave instance
#[derive(Debug, Clone, Serialize)]
pub struct EnclaveInfo {
    pub enclave_id: String,
    /// Id the monitor knows this enclave by
    pub monitor_id: u64,
    pub platform: EnclavePlatform,
    pub phase: EnclavePhase,
    pub image: Option<String>,
    /// Hex-encoded measurement, once loaded
    pub measurement: Option<String>,
    pub params: EnclaveParams,
    pub is_simulated: bool,
}

/// Code running inside the enclave.
pub trait EnclaveApp {
    fn name(&self) -> &str;

    /// Runs to completion and returns the exit code.
    fn run(&self, env: &mut EnclaveEnv<'_>) -> EnclaveResult<i32>;
}

/// Host-side control of one enclave.
///
/// Every operation checks the current [`EnclavePhase`] and fails with
/// [`EnclaveError::InvalidPhase`] when called out of order.
pub trait EnclaveRuntime {
    fn load(&mut self, image: EnclaveImage, params: EnclaveParams) -> EnclaveResult<()>;

    fn measure(&self) -> EnclaveResult<[u8; 32]>;

    /// Allocates the shared buffer and announces it to the monitor.
    fn start(&mut self) -> EnclaveResult<()>;

    /// Installs the table serving this enclave's edge calls. Allowed once
    /// loaded and until the enclave runs.
    fn register_dispatch(&mut self, table: DispatchTable) -> EnclaveResult<()>;

    fn run(&mut self, app: &dyn EnclaveApp) -> EnclaveResult<i32>;

    fn destroy(&mut self) -> EnclaveResult<()>;

    fn phase(&self) -> EnclavePhase;

    fn info(&self) -> EnclaveInfo;
}
