//! Configuration view and validation commands: `corkboard config`.

use anyhow::{Context, Result, bail};
use std::path::Path;

use corkboard::config::BoardConfig;

use super::super::ConfigCommands;

pub fn cmd_config(project_dir: &Path, command: Option<ConfigCommands>) -> Result<()> {
    let config_path = BoardConfig::config_path(project_dir);

    match command {
        None | Some(ConfigCommands::Show) => {
            if config_path.exists() {
                println!("# Config file: {}", config_path.display());
            } else {
                println!("# No board.toml at {}; using defaults", config_path.display());
            }
            let config = BoardConfig::load(project_dir)?;
            print!("{}", config.redacted().to_toml_string()?);
        }
        Some(ConfigCommands::Validate) => {
            if !config_path.exists() {
                println!("No board.toml found at {}", config_path.display());
                println!("Default configuration is valid.");
                return Ok(());
            }
            let config = BoardConfig::from_file(&config_path)?;
            config.validate()?;
            println!("Configuration is valid: {}", config_path.display());
        }
        Some(ConfigCommands::Init) => {
            if config_path.exists() {
                bail!("{} already exists", config_path.display());
            }
            if let Some(parent) = config_path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            std::fs::write(&config_path, BoardConfig::default().to_toml_string()?)
                .with_context(|| format!("Failed to write {}", config_path.display()))?;
            println!("Created {}", config_path.display());
        }
    }
    Ok(())
}
