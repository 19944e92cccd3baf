use anyhow::{bail, Context, Result};
use log::debug;
use reqwest::Url;
use std::time::Duration;

const FETCH_TIMEOUT: Duration = Duration::from_secs(10);
const USER_AGENT: &str = concat!("marks-calc/", env!("CARGO_PKG_VERSION"));

/// Parse a response sheet link, accepting only `https://` URLs.
pub fn validate_link(link: &str) -> Result<Url> {
    let url = Url::parse(link.trim()).with_context(|| format!("Invalid link: {}", link))?;
    if url.scheme() != "https" {
        bail!("Only secure (https) links are allowed: {}", link);
    }
    if url.host_str().is_none() {
        bail!("Link has no host: {}", link);
    }
    Ok(url)
}

/// Whether a source argument names a remote document rather than a file.
pub fn is_remote(source: &str) -> bool {
    let lower = source.trim_start().to_ascii_lowercase();
    lower.starts_with("https://") || lower.starts_with("http://")
}

/// Download a response sheet. One attempt, ten second timeout.
pub async fn fetch_text(link: &str) -> Result<String> {
    let url = validate_link(link)?;
    debug!("Fetching {}", url);

    let client = reqwest::Client::builder()
        .timeout(FETCH_TIMEOUT)
        .user_agent(USER_AGENT)
        .build()
        .context("Failed to create HTTP client")?;

    let response = client
        .get(url.clone())
        .send()
        .await
        .with_context(|| format!("Failed to fetch {}", url))?;

    let status = response.status();
    if !status.is_success() {
        bail!("Could not fetch the response sheet ({}). Check the link.", status);
    }

    let body = response
        .text()
        .await
        .context("Failed to read response sheet body")?;
    debug!("Fetched {} bytes", body.len());
    Ok(body)
}
