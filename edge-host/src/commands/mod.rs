//! Command handlers

pub mod inspect;
pub mod run;

use anyhow::Result;
use colored::Colorize;
use edge_host::HostConfig;

pub fn show_config(config: &HostConfig) -> Result<()> {
    config.validate()?;
    println!("{} Effective configuration", "→".cyan().bold());
    println!();
    print!("{}", toml::to_string_pretty(config)?);
    Ok(())
}
