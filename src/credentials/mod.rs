pub mod prompt;

use anyhow::{anyhow, Result};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use std::fmt;

use crate::config::Config;

/// Environment variable holding the admin password for non-interactive runs
pub const ENV_PASSWORD_VAR: &str = "MARKS_CALC_ADMIN_PASSWORD";

pub use prompt::{prompt_for_password, prompt_new_password};

/// Check for the admin password in the MARKS_CALC_ADMIN_PASSWORD environment variable.
/// Returns Some(password) if the env var is set and non-empty, None otherwise.
pub fn get_password_from_env() -> Option<String> {
    match std::env::var(ENV_PASSWORD_VAR) {
        Ok(val) => {
            let trimmed = val.trim().to_string();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed)
            }
        }
        Err(_) => None,
    }
}

/// Salted Argon2id hash of `password` as a PHC string (`$argon2id$v=19$...`).
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow!("Failed to hash password: {}", e))?;
    Ok(hash.to_string())
}

/// Whether `hash` parses as an Argon2 PHC string.
pub fn is_password_hash(hash: &str) -> bool {
    PasswordHash::new(hash.trim())
        .is_ok_and(|parsed| parsed.algorithm.as_str().starts_with("argon2"))
}

/// Check `password` against a stored PHC hash.
///
/// The hash lives in a local config file readable by whoever runs the tool,
/// so this gates admin output rather than protecting a secret store. Argon2
/// salts and stretches the password and compares digests in constant time.
/// An unparseable hash never matches.
pub fn verify_password(password: &str, expected_hash: &str) -> bool {
    match PasswordHash::new(expected_hash.trim()) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminGateError {
    Disabled,
    NoPasswordHash,
    Rejected,
}

impl fmt::Display for AdminGateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdminGateError::Disabled => write!(
                f,
                "Admin mode is disabled. Set admin_enabled: true in the config file"
            ),
            AdminGateError::NoPasswordHash => write!(
                f,
                "Admin mode has no password configured. Run `marks-calc hash-password` and set admin_password_hash"
            ),
            AdminGateError::Rejected => write!(f, "Incorrect admin password"),
        }
    }
}

impl std::error::Error for AdminGateError {}

/// Check that admin mode is enabled and `password` matches the configured hash.
pub fn authorize_admin(config: &Config, password: &str) -> Result<(), AdminGateError> {
    if !config.admin_enabled {
        return Err(AdminGateError::Disabled);
    }
    let hash = config
        .admin_password_hash
        .as_deref()
        .ok_or(AdminGateError::NoPasswordHash)?;
    if verify_password(password, hash) {
        Ok(())
    } else {
        Err(AdminGateError::Rejected)
    }
}
