//! Host configuration
//!
//! Sources, later ones winning: built-in defaults, a TOML file, `EDGE_*`
//! environment variables, command-line flags.

use anyhow::{bail, Context, Result};
use edge_call::{ENVELOPE_SIZE, MAX_NONCE_LEN, PACKAGED_HEADER_SIZE};
use edge_enclave::{EnclaveParams, DEFAULT_FREE_MEM_SIZE, DEFAULT_UNTRUSTED_SIZE};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const ENV_UNTRUSTED_SIZE: &str = "EDGE_UNTRUSTED_SIZE";
pub const ENV_FREE_MEM_SIZE: &str = "EDGE_FREE_MEM_SIZE";
pub const ENV_NONCE: &str = "EDGE_NONCE";
pub const ENV_NONCE_LEN: &str = "EDGE_NONCE_LEN";
pub const ENV_LOG: &str = "EDGE_LOG";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HostConfig {
    /// Shared buffer length in bytes
    pub untrusted_size: usize,

    /// Enclave private memory in bytes
    pub free_mem_size: u64,

    /// Fixed nonce handed to the enclave. A random one is drawn when unset.
    pub nonce: Option<String>,

    /// Random nonce length in bytes, before hex encoding
    pub nonce_len: usize,

    /// Default log filter when RUST_LOG is unset
    pub log_level: String,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            untrusted_size: DEFAULT_UNTRUSTED_SIZE,
            free_mem_size: DEFAULT_FREE_MEM_SIZE,
            nonce: None,
            nonce_len: 32,
            log_level: "info".to_string(),
        }
    }
}

impl HostConfig {
    /// `<config dir>/edge-host/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("edge-host").join("config.toml"))
    }

    /// Loads the configuration file and applies environment overrides.
    ///
    /// An explicit `path` must exist. Without one, the default path is read
    /// if present.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path().filter(|p| p.exists()) {
                Some(path) => Self::from_file(&path)?,
                None => Self::default(),
            },
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Applies `EDGE_*` overrides looked up through `var`.
    pub fn apply_env<F>(&mut self, var: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(size) = parse_var(&var, ENV_UNTRUSTED_SIZE)? {
            self.untrusted_size = size;
        }
        if let Some(size) = parse_var(&var, ENV_FREE_MEM_SIZE)? {
            self.free_mem_size = size;
        }
        if let Some(len) = parse_var(&var, ENV_NONCE_LEN)? {
            self.nonce_len = len;
        }
        if let Some(nonce) = var(ENV_NONCE) {
            self.nonce = Some(nonce);
        }
        if let Some(level) = var(ENV_LOG) {
            self.log_level = level;
        }
        Ok(())
    }

    /// Applies command-line overrides.
    pub fn apply_cli(&mut self, untrusted_size: Option<usize>, nonce: Option<String>) {
        if let Some(size) = untrusted_size {
            self.untrusted_size = size;
        }
        if nonce.is_some() {
            self.nonce = nonce;
        }
    }

    pub fn params(&self) -> EnclaveParams {
        EnclaveParams::default()
            .with_untrusted_size(self.untrusted_size)
            .with_free_mem_size(self.free_mem_size)
    }

    /// Largest nonce this configuration may hand to the enclave.
    fn nonce_bytes(&self) -> Result<usize> {
        match &self.nonce {
            Some(nonce) => Ok(nonce.len()),
            None => match self.nonce_len.checked_mul(2) {
                Some(len) => Ok(len),
                None => bail!("nonce_len {} is out of range", self.nonce_len),
            },
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.params().validate()?;

        if self.nonce_len == 0 {
            bail!("nonce_len must be non-zero");
        }
        let nonce_bytes = self.nonce_bytes()?;
        if nonce_bytes > MAX_NONCE_LEN {
            bail!(
                "nonce of {} bytes exceeds the {}-byte limit of the report region",
                nonce_bytes,
                MAX_NONCE_LEN
            );
        }
        let needed = ENVELOPE_SIZE + PACKAGED_HEADER_SIZE + nonce_bytes;
        if self.untrusted_size < needed {
            bail!(
                "untrusted_size {} cannot carry a {}-byte nonce (needs {})",
                self.untrusted_size,
                nonce_bytes,
                needed
            );
        }
        Ok(())
    }
}

fn parse_var<F, T>(var: &F, key: &str) -> Result<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    var(key)
        .map(|raw| {
            raw.trim()
                .parse()
                .with_context(|| format!("Invalid {}={}", key, raw))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use edge_call::REPORT_REGION_LEN;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_validate() {
        let config = HostConfig::default();
        assert_eq!(config.untrusted_size, 4 * 1024 * 1024);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = HostConfig::default();
        config
            .apply_env(env(&[
                (ENV_UNTRUSTED_SIZE, "65536"),
                (ENV_NONCE, "abc"),
                (ENV_LOG, "debug"),
            ]))
            .unwrap();

        assert_eq!(config.untrusted_size, 65536);
        assert_eq!(config.nonce.as_deref(), Some("abc"));
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.free_mem_size, DEFAULT_FREE_MEM_SIZE);
    }

    #[test]
    fn test_env_parse_error() {
        let mut config = HostConfig::default();
        let err = config
            .apply_env(env(&[(ENV_UNTRUSTED_SIZE, "lots")]))
            .unwrap_err();
        assert!(err.to_string().contains(ENV_UNTRUSTED_SIZE));
    }

    #[test]
    fn test_cli_wins() {
        let mut config = HostConfig::default();
        config.apply_env(env(&[(ENV_NONCE, "from-env")])).unwrap();
        config.apply_cli(Some(8192), Some("from-cli".to_string()));
        assert_eq!(config.untrusted_size, 8192);
        assert_eq!(config.nonce.as_deref(), Some("from-cli"));

        config.apply_cli(None, None);
        assert_eq!(config.nonce.as_deref(), Some("from-cli"));
    }

    #[test]
    fn test_validate_rejects_large_nonce() {
        let config = HostConfig {
            nonce: Some("n".repeat(MAX_NONCE_LEN + 1)),
            ..HostConfig::default()
        };
        assert!(config.validate().is_err());

        let config = HostConfig {
            nonce_len: REPORT_REGION_LEN,
            ..HostConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_overflowing_nonce_len() {
        let mut config = HostConfig::default();
        config
            .apply_env(env(&[(ENV_NONCE_LEN, &usize::MAX.to_string())]))
            .unwrap();
        assert_eq!(config.nonce_len, usize::MAX);

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("out of range"));
    }

    #[test]
    fn test_validate_buffer_fits_nonce() {
        let config = HostConfig {
            untrusted_size: ENVELOPE_SIZE + REPORT_REGION_LEN,
            nonce: Some("n".repeat(MAX_NONCE_LEN)),
            ..HostConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("cannot carry"));
    }
}
