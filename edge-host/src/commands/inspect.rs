//! Inspect command handler

use anyhow::Result;
use colored::Colorize;
use edge_enclave::EnclaveImage;
use serde_json::json;
use std::path::Path;

pub fn handle(path: &Path, json: bool) -> Result<()> {
    let image = EnclaveImage::from_path(path)?;
    let measurement = hex::encode(image.measure());

    if json {
        let out = json!({
            "image": image.name(),
            "size": image.len(),
            "measurement": measurement,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("{} Enclave image", "→".cyan().bold());
    println!("  Image:        {}", image.name().cyan());
    println!("  Size:         {} bytes", image.len().to_string().cyan());
    println!("  Measurement:  {}", measurement.cyan());
    Ok(())
}
