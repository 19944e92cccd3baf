use anyhow::{Context, Result};
use std::io::{BufRead, Write};
use std::path::PathBuf;

use crate::config::{get_config_path, Config};
use crate::credentials::{hash_password, prompt_new_password};
use crate::scoring::{Anchor, DegeneratePolicy, NormalizationConfig, ScoringConfig};

/// Prompt user with a message and return their trimmed input.
fn prompt(message: &str) -> Result<String> {
    print!("{}", message);
    std::io::stdout()
        .flush()
        .context("Failed to flush stdout")?;
    let mut input = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut input)
        .context("Failed to read input")?;
    Ok(input.trim().to_string())
}

/// Prompt user with a message and a default value. Returns default if input is empty.
fn prompt_with_default(message: &str, default: &str) -> Result<String> {
    let input = prompt(&format!("{} [{}]: ", message, default))?;
    if input.is_empty() {
        Ok(default.to_string())
    } else {
        Ok(input)
    }
}

/// Prompt user with a yes/no question. Returns bool based on input and default.
fn prompt_yes_no(message: &str, default_yes: bool) -> Result<bool> {
    let hint = if default_yes { "Y/n" } else { "y/N" };
    let input = prompt(&format!("{} [{}]: ", message, hint))?;
    let input = input.to_lowercase();
    if input.is_empty() {
        Ok(default_yes)
    } else {
        Ok(input == "y" || input == "yes")
    }
}

fn parse_anchor(input: &str) -> Option<Anchor> {
    match input.trim().to_lowercase().as_str() {
        "highest_mean_group" | "highest" | "group" => Some(Anchor::HighestMeanGroup),
        "overall" | "all" => Some(Anchor::Overall),
        _ => None,
    }
}

fn parse_degenerate(input: &str) -> Option<DegeneratePolicy> {
    match input.trim().to_lowercase().as_str() {
        "fail" => Some(DegeneratePolicy::Fail),
        "unscaled" | "raw" => Some(DegeneratePolicy::Unscaled),
        _ => None,
    }
}

/// Run the interactive init wizard to create a config file.
///
/// If `default_path` is Some, uses that as the config file path.
/// Otherwise, prompts the user with the default config path.
pub fn run_init_wizard(default_path: Option<PathBuf>) -> Result<()> {
    println!();
    println!("Marks Calculator Configuration");
    println!("==============================");
    println!();

    println!("Shift normalization rescales every shift onto a common distribution.");
    println!("  highest_mean_group -- the shift with the highest average (default)");
    println!("  overall            -- all candidates taken together");
    let anchor = loop {
        let input = prompt_with_default("Normalization anchor", "highest_mean_group")?;
        match parse_anchor(&input) {
            Some(a) => break a,
            None => println!("  Invalid: expected 'highest_mean_group' or 'overall'. Try again."),
        }
    };

    println!();
    println!("A shift where every candidate scored the same cannot be rescaled.");
    println!("  fail     -- stop and report the shift (default)");
    println!("  unscaled -- keep those candidates at their raw score");
    let degenerate_groups = loop {
        let input = prompt_with_default("Zero-spread shifts", "fail")?;
        match parse_degenerate(&input) {
            Some(p) => break p,
            None => println!("  Invalid: expected 'fail' or 'unscaled'. Try again."),
        }
    };

    println!();
    let admin_enabled = prompt_yes_no("Enable admin mode (cutoffs and exports)?", false)?;
    let admin_password_hash = if admin_enabled {
        Some(hash_password(&prompt_new_password()?)?)
    } else {
        None
    };

    let default_config_path = match default_path {
        Some(p) => p,
        None => get_config_path()?,
    };
    println!();
    let path_str = prompt_with_default(
        "Where should the config be saved?",
        &default_config_path.display().to_string(),
    )?;
    let config_path = PathBuf::from(&path_str);

    if config_path.exists() {
        let overwrite = prompt_yes_no(
            &format!(
                "Config already exists at {}. Overwrite?",
                config_path.display()
            ),
            false,
        )?;
        if !overwrite {
            println!("Aborted.");
            return Ok(());
        }
    }

    let config = Config {
        admin_enabled,
        admin_password_hash,
        scoring: ScoringConfig {
            normalization: NormalizationConfig {
                anchor,
                degenerate_groups,
            },
            ..Default::default()
        },
        ..Default::default()
    };

    let yaml = serde_saphyr::to_string(&config)
        .map_err(|e| anyhow::anyhow!("Failed to serialize config: {}", e))?;

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    std::fs::write(&config_path, &yaml)
        .with_context(|| format!("Failed to write config to {}", config_path.display()))?;

    println!();
    println!("Config written to {}", config_path.display());
    println!("Cutoff rules and column aliases can be edited in that file.");

    Ok(())
}
