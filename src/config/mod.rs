pub mod init;
mod schema;

pub use schema::Config;

use anyhow::{Context, Result};
use log::debug;
use std::fs;
use std::path::PathBuf;

use crate::credentials::is_password_hash;
use crate::ingest::ColumnAliases;
use crate::scoring::validate_scoring;

/// Get the config directory path (~/.config/marks-calc/)
pub fn get_config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".config").join("marks-calc"))
}

/// Get the default config file path (~/.config/marks-calc/config.yaml)
pub fn get_config_path() -> Result<PathBuf> {
    Ok(get_config_dir()?.join("config.yaml"))
}

/// Load configuration from a YAML file
///
/// # Arguments
///
/// * `path` - Optional path to config file. If None, uses the default path
///   and falls back to `Config::default()` when nothing is there yet.
///
/// # Errors
///
/// Returns an error if:
/// - An explicitly given config file does not exist
/// - The config file cannot be read
/// - The YAML cannot be parsed
pub fn load_config(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                anyhow::bail!("Config file not found at {}", p.display());
            }
            p
        }
        None => {
            let default_path = get_config_path()?;
            if !default_path.exists() {
                debug!(
                    "No config at {}, using defaults",
                    default_path.display()
                );
                return Ok(Config::default());
            }
            default_path
        }
    };

    let config_content = fs::read_to_string(&config_path)
        .with_context(|| format!("Failed to read config file at {}", config_path.display()))?;

    let config: Config = serde_saphyr::from_str(&config_content).with_context(|| {
        format!(
            "Failed to parse config: invalid YAML in {}",
            config_path.display()
        )
    })?;

    debug!("Loaded config from {}", config_path.display());
    Ok(config)
}

/// Validate the whole config. Returns every problem found, not just the first.
pub fn validate_config(config: &Config) -> Result<(), Vec<String>> {
    let mut errors = match validate_scoring(&config.scoring) {
        Ok(()) => Vec::new(),
        Err(errors) => errors,
    };

    match config.admin_password_hash.as_deref() {
        Some(hash) if !is_password_hash(hash) => errors.push(
            "admin_password_hash: must be an Argon2 hash from `marks-calc hash-password`"
                .to_string(),
        ),
        None if config.admin_enabled => errors.push(
            "admin_password_hash: required when admin_enabled is true (see `marks-calc hash-password`)"
                .to_string(),
        ),
        _ => {}
    }

    if let Err(e) = ColumnAliases::from_config(&config.columns) {
        errors.push(format!("columns: {}", e));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
