//! Init command implementation

use anyhow::{bail, Result};
use std::path::Path;
use tracing::info;

use ancient_monad::Config;

/// Write a default config file
pub async fn init_command(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!(
            "Config file already exists: {}\nUse --force to overwrite.",
            path.display()
        );
    }

    Config::default().save_to_file(path)?;
    info!("Created {}", path.display());

    println!("Wrote default configuration to {}", path.display());
    println!("Point [api].base_url at your XP service before running other commands.");
    Ok(())
}
