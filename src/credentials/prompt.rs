use anyhow::{Context, Result};

use super::get_password_from_env;

/// Get the admin password from MARKS_CALC_ADMIN_PASSWORD, or prompt for it
/// without echo.
pub fn prompt_for_password() -> Result<String> {
    if let Some(password) = get_password_from_env() {
        return Ok(password);
    }

    let password = rpassword::prompt_password("Admin password: ")
        .context("Failed to read password from terminal")?;

    let password = password.trim();
    if password.is_empty() {
        anyhow::bail!("Password cannot be empty");
    }

    Ok(password.to_string())
}

/// Prompt for a new password twice and require both entries to match.
pub fn prompt_new_password() -> Result<String> {
    let first = rpassword::prompt_password("New admin password: ")
        .context("Failed to read password from terminal")?;
    let first = first.trim().to_string();
    if first.is_empty() {
        anyhow::bail!("Password cannot be empty");
    }

    let second = rpassword::prompt_password("Repeat password: ")
        .context("Failed to read password from terminal")?;
    if first != second.trim() {
        anyhow::bail!("Passwords do not match");
    }

    Ok(first)
}
