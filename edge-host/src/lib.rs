//! # Edge Host
//!
//! Host side of an edge-call session: configuration and the session runner
//! used by the `edge-host` binary.

pub mod config;
pub mod session;

pub use config::HostConfig;
pub use session::{run_session, ReportSummary, SessionReport};
