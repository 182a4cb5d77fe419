//! `chp login`

use crate::auth::{login, CredentialStore, LoginContext, SystemBrowser};
use crate::config::Config;
use crate::error::Result;
use crate::http::HttpClient;
use crate::output;

/// Run the browser-based OAuth login and report where credentials went.
pub async fn run_login(config: &Config) -> Result<()> {
    let http = HttpClient::new(config)?;
    let store = CredentialStore::from_config(config);
    let ctx = LoginContext {
        http: &http,
        store: &store,
        browser: &SystemBrowser,
        callback_timeout: config.callback_timeout,
    };

    let outcome = login(&ctx).await?;
    tracing::info!(base_url = %outcome.base_url, registered = outcome.registered, "login complete");

    output::success("OAuth login successful!");
    output::info(&format!(
        "Credentials saved to {}",
        outcome.credentials_file.display()
    ));
    Ok(())
}
