//! `chp config show` and `chp config set-url`

use std::path::Path;

use serde_json::{json, Value};
use url::Url;

use crate::auth::{now_epoch, CredentialStore, Credentials};
use crate::config::Config;
use crate::error::{ChpError, Result};
use crate::output;

/// Print the effective configuration as JSON.
pub fn run_config_show(config: &Config) -> Result<()> {
    let store = CredentialStore::from_config(config);
    let summary = config_summary(&store.load(), store.path(), now_epoch());
    output::print_json(&summary);
    Ok(())
}

/// Validate and store a new API base URL.
pub fn run_config_set_url(config: &Config, raw_url: &str) -> Result<()> {
    let base_url = normalize_base_url(raw_url)?;

    let store = CredentialStore::from_config(config);
    let mut creds = store.load();
    creds.base_url = Some(base_url.clone());
    store.save(&creds)?;

    output::success(&format!("Base URL set to {}", output::bold(&base_url)));
    Ok(())
}

/// Build the `config show` document
///
/// Tokens themselves are never included, only whether they are present.
pub fn config_summary(creds: &Credentials, credentials_file: &Path, now: i64) -> Value {
    let mut summary = json!({
        "base_url": creds.base_url(),
        "credentials_file": credentials_file.display().to_string(),
        "has_jwt": creds.has_jwt(),
        "has_oauth_token": creds.oauth_access_token().is_some(),
        "oauth_client_id": creds.oauth_client_id(),
    });

    if let Some(expires_at) = creds.oauth_expires_at.filter(|t| *t > 0) {
        let remaining = expires_at - now;
        if remaining > 0 {
            summary["oauth_token_expires_in"] = json!(format!("{remaining}s"));
        } else {
            summary["oauth_token_expired"] = json!(true);
        }
    }

    summary
}

/// Strip trailing slashes and require an http(s) URL with a host.
pub fn normalize_base_url(raw_url: &str) -> Result<String> {
    let trimmed = raw_url.trim_end_matches('/');

    let parsed = match Url::parse(trimmed) {
        Ok(parsed) => parsed,
        Err(url::ParseError::EmptyHost) => return Err(missing_host()),
        Err(e) => return Err(ChpError::InvalidInput(format!("Invalid URL: {e}")).into()),
    };

    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(
            ChpError::InvalidInput("Base URL must use http or https scheme.".to_string()).into(),
        );
    }
    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(missing_host());
    }

    Ok(trimmed.to_string())
}

fn missing_host() -> anyhow::Error {
    ChpError::InvalidInput("Base URL must include a hostname.".to_string()).into()
}
