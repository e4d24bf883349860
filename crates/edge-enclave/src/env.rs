//! What an enclave application sees while it runs.

use edge_call::EdgeCaller;
use edge_monitor::{PluginMultiplexer, SbiRet};

pub struct EnclaveEnv<'a> {
    caller: EdgeCaller<'a>,
    monitor: &'a PluginMultiplexer,
    monitor_id: u64,
    enclave_id: &'a str,
    measurement: [u8; 32],
}

impl<'a> EnclaveEnv<'a> {
    pub fn new(
        caller: EdgeCaller<'a>,
        monitor: &'a PluginMultiplexer,
        monitor_id: u64,
        enclave_id: &'a str,
        measurement: [u8; 32],
    ) -> Self {
        Self {
            caller,
            monitor,
            monitor_id,
            enclave_id,
            measurement,
        }
    }

    /// Edge calls to the host.
    pub fn caller(&mut self) -> &mut EdgeCaller<'a> {
        &mut self.caller
    }

    /// Monitor call in register form, made as this enclave.
    pub fn monitor_call(&self, plugin_id: u64, call_id: u64, arg0: u64, arg1: u64) -> SbiRet {
        self.monitor
            .dispatch_raw(self.monitor_id, plugin_id, call_id, arg0, arg1)
    }

    pub fn enclave_id(&self) -> &str {
        self.enclave_id
    }

    pub fn measurement(&self) -> [u8; 32] {
        self.measurement
    }
}
