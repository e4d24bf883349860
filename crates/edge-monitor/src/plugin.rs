//! Plugin trait and the multiplexer in front of the compiled-in plugins.

use crate::error::{MonitorError, MonitorResult, SBI_SUCCESS};
use crate::multimem::Multimem;
use tracing::{debug, warn};

pub type EnclaveId = u64;

pub const PLUGIN_ID_MULTIMEM: u64 = 1;

/// A monitor service reachable through the multiplexer.
pub trait Plugin: Send + Sync {
    fn id(&self) -> u64;

    fn name(&self) -> &'static str;

    fn call(&self, caller: EnclaveId, call_id: u64, arg0: u64, arg1: u64) -> MonitorResult<u64>;
}

/// Register pair returned to the calling enclave.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SbiRet {
    pub error: u64,
    pub value: u64,
}

impl From<MonitorResult<u64>> for SbiRet {
    fn from(result: MonitorResult<u64>) -> Self {
        match result {
            Ok(value) => SbiRet {
                error: SBI_SUCCESS,
                value,
            },
            Err(e) => SbiRet {
                error: e.code(),
                value: 0,
            },
        }
    }
}

/// Routes `(plugin_id, call_id)` to one of a fixed set of plugins.
#[derive(Debug, Default)]
pub struct PluginMultiplexer {
    multimem: Multimem,
}

impl PluginMultiplexer {
    pub fn new(multimem: Multimem) -> Self {
        Self { multimem }
    }

    pub fn multimem(&self) -> &Multimem {
        &self.multimem
    }

    fn plugin(&self, plugin_id: u64) -> Option<&dyn Plugin> {
        match plugin_id {
            PLUGIN_ID_MULTIMEM => Some(&self.multimem),
            _ => None,
        }
    }

    /// Forwards the call to `plugin_id`.
    ///
    /// An unknown plugin yields [`MonitorError::NotImplemented`] so the
    /// caller can spot a configuration mismatch.
    pub fn dispatch(
        &self,
        caller: EnclaveId,
        plugin_id: u64,
        call_id: u64,
        arg0: u64,
        arg1: u64,
    ) -> MonitorResult<u64> {
        let Some(plugin) = self.plugin(plugin_id) else {
            warn!(caller, plugin_id, call_id, "Unknown monitor plugin");
            return Err(MonitorError::NotImplemented { plugin_id, call_id });
        };

        let result = plugin.call(caller, call_id, arg0, arg1);
        debug!(
            caller,
            plugin = plugin.name(),
            call_id,
            ok = result.is_ok(),
            "Monitor plugin call"
        );
        result
    }

    /// [`PluginMultiplexer::dispatch`] in register form.
    pub fn dispatch_raw(
        &self,
        caller: EnclaveId,
        plugin_id: u64,
        call_id: u64,
        arg0: u64,
        arg1: u64,
    ) -> SbiRet {
        self.dispatch(caller, plugin_id, call_id, arg0, arg1).into()
    }
}
