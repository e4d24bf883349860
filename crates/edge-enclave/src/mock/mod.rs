//! Mock enclave implementation for development and testing.
//!
//! The MockEnclave runs the enclave application in-process. It provides:
//! - The full lifecycle with phase checks
//! - Image measurement (SHA-256 of the image bytes)
//! - A real shared buffer announced to the monitor's multimem plugin

use crate::{
    config::EnclaveParams,
    env::EnclaveEnv,
    error::{EnclaveError, EnclaveResult},
    traits::{EnclaveApp, EnclaveImage, EnclaveInfo, EnclavePhase, EnclavePlatform, EnclaveRuntime},
};
use edge_call::{DispatchTable, EdgeCaller, EdgeChannel, SharedBuffer};
use edge_monitor::{MemRegion, PluginMultiplexer};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct MockEnclave {
    enclave_id: String,
    monitor_id: u64,
    monitor: Arc<PluginMultiplexer>,
    phase: EnclavePhase,
    params: EnclaveParams,
    image: Option<EnclaveImage>,
    measurement: Option<[u8; 32]>,
    channel: Option<EdgeChannel>,
    table: Option<DispatchTable>,
    exit_code: Option<i32>,
}

impl MockEnclave {
    /// Create a mock enclave attached to `monitor`
    pub fn new(monitor: Arc<PluginMultiplexer>) -> Self {
        MockEnclaveBuilder::new(monitor).build()
    }

    pub fn enclave_id(&self) -> &str {
        &self.enclave_id
    }

    pub fn monitor_id(&self) -> u64 {
        self.monitor_id
    }

    pub fn exit_code(&self) -> Option<i32> {
        self.exit_code
    }

    /// Shared buffer length, once started.
    pub fn shared_buffer_size(&self) -> Option<usize> {
        self.channel.as_ref().map(|c| c.buffer().len())
    }

    fn expect_phase(&self, allowed: &[EnclavePhase], operation: &'static str) -> EnclaveResult<()> {
        if allowed.contains(&self.phase) {
            Ok(())
        } else {
            Err(EnclaveError::InvalidPhase {
                phase: self.phase,
                operation,
            })
        }
    }
}

impl EnclaveRuntime for MockEnclave {
    fn load(&mut self, image: EnclaveImage, params: EnclaveParams) -> EnclaveResult<()> {
        self.expect_phase(&[EnclavePhase::Created], "load")?;
        params.validate()?;

        let measurement = image.measure();
        info!(
            enclave_id = %self.enclave_id,
            image = image.name(),
            measurement = %hex::encode(measurement),
            "Enclave image loaded"
        );
        self.params = params;
        self.measurement = Some(measurement);
        self.image = Some(image);
        self.phase = EnclavePhase::Loaded;
        Ok(())
    }

    fn measure(&self) -> EnclaveResult<[u8; 32]> {
        self.measurement.ok_or(EnclaveError::InvalidPhase {
            phase: self.phase,
            operation: "measure",
        })
    }

    fn start(&mut self) -> EnclaveResult<()> {
        self.expect_phase(&[EnclavePhase::Loaded], "start")?;

        let buffer = SharedBuffer::new(self.params.untrusted_size)?;
        let region = MemRegion {
            base: buffer.base().raw() as u64,
            size: buffer.len() as u64,
        };
        self.monitor.multimem().register_region(self.monitor_id, region);
        self.channel = Some(EdgeChannel::new(buffer));
        self.phase = EnclavePhase::Started;

        debug!(
            enclave_id = %self.enclave_id,
            untrusted_size = region.size,
            "Enclave started"
        );
        Ok(())
    }

    fn register_dispatch(&mut self, table: DispatchTable) -> EnclaveResult<()> {
        self.expect_phase(
            &[EnclavePhase::Loaded, EnclavePhase::Started],
            "register dispatch for",
        )?;
        debug!(
            enclave_id = %self.enclave_id,
            call_ids = ?table.call_ids(),
            "Dispatch table registered"
        );
        self.table = Some(table);
        Ok(())
    }

    fn run(&mut self, app: &dyn EnclaveApp) -> EnclaveResult<i32> {
        self.expect_phase(&[EnclavePhase::Started], "run")?;
        let measurement = self.measure()?;
        let (Some(channel), Some(table)) = (self.channel.as_mut(), self.table.as_ref()) else {
            return Err(EnclaveError::NoDispatchTable);
        };

        self.phase = EnclavePhase::Running;
        info!(enclave_id = %self.enclave_id, app = app.name(), "Running enclave application");

        let mut env = EnclaveEnv::new(
            EdgeCaller::new(channel, table),
            &self.monitor,
            self.monitor_id,
            &self.enclave_id,
            measurement,
        );
        let result = app.run(&mut env);
        self.phase = EnclavePhase::Exited;

        match &result {
            Ok(code) => {
                self.exit_code = Some(*code);
                info!(enclave_id = %self.enclave_id, exit_code = code, "Enclave exited");
            }
            Err(e) => warn!(
                enclave_id = %self.enclave_id,
                error = %e,
                "Enclave application failed"
            ),
        }
        result
    }

    fn destroy(&mut self) -> EnclaveResult<()> {
        if self.phase == EnclavePhase::Destroyed {
            return Err(EnclaveError::InvalidPhase {
                phase: self.phase,
                operation: "destroy",
            });
        }
        self.monitor.multimem().release(self.monitor_id);
        self.channel = None;
        self.table = None;
        self.phase = EnclavePhase::Destroyed;
        debug!(enclave_id = %self.enclave_id, "Enclave destroyed");
        Ok(())
    }

    fn phase(&self) -> EnclavePhase {
        self.phase
    }

    fn info(&self) -> EnclaveInfo {
        EnclaveInfo {
            enclave_id: self.enclave_id.clone(),
            monitor_id: self.monitor_id,
            platform: EnclavePlatform::Mock,
            phase: self.phase,
            image: self.image.as_ref().map(|i| i.name().to_string()),
            measurement: self.measurement.map(hex::encode),
            params: self.params,
            is_simulated: true,
        }
    }
}

/// Builder for MockEnclave
pub struct MockEnclaveBuilder {
    monitor: Arc<PluginMultiplexer>,
    monitor_id: Option<u64>,
}

impl MockEnclaveBuilder {
    pub fn new(monitor: Arc<PluginMultiplexer>) -> Self {
        Self {
            monitor,
            monitor_id: None,
        }
    }

    /// Fixes the id the monitor sees, instead of deriving one from the enclave id.
    pub fn monitor_id(mut self, id: u64) -> Self {
        self.monitor_id = Some(id);
        self
    }

    pub fn build(self) -> MockEnclave {
        let uuid = uuid::Uuid::new_v4();
        MockEnclave {
            enclave_id: format!("mock-{}", uuid),
            monitor_id: self.monitor_id.unwrap_or_else(|| uuid.as_u64_pair().0),
            monitor: self.monitor,
            phase: EnclavePhase::Created,
            params: EnclaveParams::default(),
            image: None,
            measurement: None,
            channel: None,
            table: None,
            exit_code: None,
        }
    }
}
