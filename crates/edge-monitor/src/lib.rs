//! # Edge Monitor
//!
//! Coarse dispatch layer living in the security monitor. Calls carry small
//! scalar arguments instead of shared-buffer offsets and are keyed by a
//! plugin id plus an inner call id:
//!
//! ```text
//! dispatch(caller, plugin_id, call_id, arg0, arg1)
//!        │
//!        ├── PLUGIN_ID_MULTIMEM ──▶ Multimem::call(caller, call_id, arg0, arg1)
//!        │
//!        └── anything else ───────▶ NotImplemented (a result code, not a fault)
//! ```
//!
//! The plugin set is fixed at build time.

pub mod error;
pub mod multimem;
pub mod plugin;

pub use error::{
    MonitorError, MonitorResult, SBI_ERR_SM_ENCLAVE_INVALID_ID, SBI_ERR_SM_NOT_IMPLEMENTED,
    SBI_SUCCESS,
};
pub use multimem::{
    MemRegion, Multimem, MULTIMEM_GET_OTHER_REGION_ADDR, MULTIMEM_GET_OTHER_REGION_SIZE,
};
pub use plugin::{EnclaveId, Plugin, PluginMultiplexer, SbiRet, PLUGIN_ID_MULTIMEM};
