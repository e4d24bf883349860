//! Host collaborators backing the edge-call handlers.

use edge_call::{Console, EdgeError, EdgeResult, StringProvider};
use parking_lot::Mutex;
use rand::RngCore;
use std::collections::VecDeque;
use tracing::info;

/// Console that logs through `tracing` and keeps a transcript.
#[derive(Debug, Default)]
pub struct TracingConsole {
    transcript: Mutex<Vec<String>>,
}

impl TracingConsole {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything printed so far, one entry per call.
    pub fn transcript(&self) -> Vec<String> {
        self.transcript.lock().clone()
    }
}

impl Console for TracingConsole {
    fn render_bytes(&self, bytes: &[u8]) -> u64 {
        let text = String::from_utf8_lossy(bytes).into_owned();
        info!(target: "enclave", "{}", text);
        self.transcript.lock().push(text);
        bytes.len() as u64
    }

    fn render_value(&self, value: u64) {
        info!(target: "enclave", "value: {}", value);
        self.transcript.lock().push(format!("value: {}", value));
    }
}

/// Hands out a fresh random nonce on every request, hex encoded.
#[derive(Debug, Clone, Copy)]
pub struct NonceStringProvider {
    nonce_len: usize,
}

impl NonceStringProvider {
    pub fn new(nonce_len: usize) -> Self {
        Self { nonce_len }
    }
}

impl Default for NonceStringProvider {
    fn default() -> Self {
        Self::new(32)
    }
}

impl StringProvider for NonceStringProvider {
    fn next_string(&self) -> EdgeResult<Vec<u8>> {
        let mut nonce = vec![0u8; self.nonce_len];
        rand::thread_rng().fill_bytes(&mut nonce);
        Ok(hex::encode(nonce).into_bytes())
    }
}

/// Serves a fixed queue of strings, then fails.
#[derive(Debug, Default)]
pub struct StaticStringProvider {
    strings: Mutex<VecDeque<Vec<u8>>>,
}

impl StaticStringProvider {
    pub fn new(strings: impl IntoIterator<Item = Vec<u8>>) -> Self {
        Self {
            strings: Mutex::new(strings.into_iter().collect()),
        }
    }
}

impl StringProvider for StaticStringProvider {
    fn next_string(&self) -> EdgeResult<Vec<u8>> {
        self.strings
            .lock()
            .pop_front()
            .ok_or_else(|| EdgeError::Collaborator("no host strings left".to_string()))
    }
}
