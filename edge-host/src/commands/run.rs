//! Run command handler

use anyhow::Result;
use colored::Colorize;
use edge_enclave::EnclaveImage;
use edge_host::{run_session, HostConfig};
use std::path::Path;
use tracing::info;

pub fn handle(path: &Path, config: &HostConfig, json: bool) -> Result<()> {
    let image = EnclaveImage::from_path(path)?;

    info!("╔════════════════════════════════════════════════════════════╗");
    info!("║                 Edge Host Session Starting                 ║");
    info!("╠════════════════════════════════════════════════════════════╣");
    info!("║  Image:        {:^42}  ║", image.name());
    info!("║  Shared size:  {:^42}  ║", config.untrusted_size);
    info!("║  Free memory:  {:^42}  ║", config.free_mem_size);
    info!("╚════════════════════════════════════════════════════════════╝");

    let session = run_session(image, config)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&session)?);
        return Ok(());
    }

    println!(
        "{} Enclave exited with code {}",
        "✓".green().bold(),
        session.exit_code.to_string().cyan()
    );
    println!("  Enclave ID:   {}", session.enclave.enclave_id.cyan());
    if let Some(measurement) = &session.enclave.measurement {
        println!("  Measurement:  {}", measurement.cyan());
    }
    if !session.transcript.is_empty() {
        println!();
        println!("{} Enclave output", "→".cyan().bold());
        for line in &session.transcript {
            println!("  {}", line);
        }
    }
    match &session.report {
        Some(report) => {
            println!();
            println!(
                "{} Attestation verified ({})",
                "✓".green().bold(),
                report.attestation_type
            );
            println!("  Nonce digest: {}", report.nonce_digest.dimmed());
        }
        None => println!("{} No attestation report", "!".yellow().bold()),
    }
    Ok(())
}
