//! Multimem plugin: lets an enclave learn where its second memory region is.

use crate::error::{MonitorError, MonitorResult};
use crate::plugin::{EnclaveId, Plugin, PLUGIN_ID_MULTIMEM};
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::debug;

pub const MULTIMEM_GET_OTHER_REGION_SIZE: u64 = 1;
pub const MULTIMEM_GET_OTHER_REGION_ADDR: u64 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemRegion {
    pub base: u64,
    pub size: u64,
}

/// Region table keyed by enclave id.
#[derive(Debug, Default)]
pub struct Multimem {
    regions: RwLock<HashMap<EnclaveId, MemRegion>>,
}

impl Multimem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `region` as the other region of `enclave`, replacing any previous one.
    pub fn register_region(&self, enclave: EnclaveId, region: MemRegion) {
        debug!(enclave, base = region.base, size = region.size, "Multimem region registered");
        self.regions.write().insert(enclave, region);
    }

    pub fn release(&self, enclave: EnclaveId) -> Option<MemRegion> {
        self.regions.write().remove(&enclave)
    }

    pub fn region(&self, enclave: EnclaveId) -> Option<MemRegion> {
        self.regions.read().get(&enclave).copied()
    }
}

impl Plugin for Multimem {
    fn id(&self) -> u64 {
        PLUGIN_ID_MULTIMEM
    }

    fn name(&self) -> &'static str {
        "multimem"
    }

    // Both calls ignore arg0/arg1; the answer is the return value.
    fn call(&self, caller: EnclaveId, call_id: u64, _arg0: u64, _arg1: u64) -> MonitorResult<u64> {
        let region = || self.region(caller).ok_or(MonitorError::InvalidId(caller));
        match call_id {
            MULTIMEM_GET_OTHER_REGION_SIZE => Ok(region()?.size),
            MULTIMEM_GET_OTHER_REGION_ADDR => Ok(region()?.base),
            _ => Err(MonitorError::NotImplemented {
                plugin_id: PLUGIN_ID_MULTIMEM,
                call_id,
            }),
        }
    }
}
