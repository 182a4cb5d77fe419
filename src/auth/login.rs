//! Interactive login
//!
//! Runs discovery, registers the CLI on first use, opens the browser on the
//! authorization URL, waits for the redirect (racing a timeout), verifies
//! the CSRF state and exchanges the code for tokens.
//!
//! The client ID is saved as soon as registration succeeds, so a login that
//! fails later does not register again next time.

use std::path::PathBuf;
use std::time::Duration;

use crate::auth::callback::{CallbackReceiver, CallbackResult, CallbackServer};
use crate::auth::credentials::CredentialStore;
use crate::auth::discovery::{build_authorization_url, discover};
use crate::auth::now_epoch;
use crate::auth::pkce::PkceTriple;
use crate::auth::registration::register_client;
use crate::auth::token::exchange_code;
use crate::error::{ChpError, Result};
use crate::http::HttpClient;
use crate::output;

/// Launches the user's browser on a URL.
pub trait Browser: Send + Sync {
    /// Open `url`. Failure is reported but never aborts the login.
    fn open(&self, url: &str) -> std::io::Result<()>;
}

/// Opens URLs with the platform's default handler.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemBrowser;

impl Browser for SystemBrowser {
    fn open(&self, url: &str) -> std::io::Result<()> {
        open::that(url)
    }
}

/// Collaborators for one login attempt.
pub struct LoginContext<'a> {
    /// Transport for discovery, registration and the code exchange
    pub http: &'a HttpClient,
    /// Where the client ID and tokens are saved
    pub store: &'a CredentialStore,
    /// Opens the authorization URL
    pub browser: &'a dyn Browser,
    /// How long to wait for the redirect
    pub callback_timeout: Duration,
}

/// Summary of a completed login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginOutcome {
    /// API base URL the tokens belong to
    pub base_url: String,
    /// Registered OAuth client ID
    pub client_id: String,
    /// Whether a new client was registered during this login
    pub registered: bool,
    /// File the credentials were written to
    pub credentials_file: PathBuf,
}

/// Run the full authorization code flow and persist the tokens
///
/// # Errors
///
/// Any failure aborts the login: discovery, registration, listener bind,
/// timeout, an error reported on the redirect, a state mismatch, the code
/// exchange, or writing the credentials file.
pub async fn login(ctx: &LoginContext<'_>) -> Result<LoginOutcome> {
    let mut creds = ctx.store.load();
    let base_url = creds.base_url().to_string();

    output::info(&format!("Starting OAuth login for {base_url}..."));
    let config = discover(ctx.http, &base_url).await?;

    let (client_id, registered) = match creds.oauth_client_id() {
        Some(id) => (id.to_string(), false),
        None => {
            output::info("Registering CLI client...");
            let id = register_client(ctx.http, &config.registration_endpoint).await?;
            creds.oauth_client_id = Some(id.clone());
            ctx.store.save(&creds)?;
            output::success(&format!("Client registered: {id}"));
            (id, true)
        }
    };

    let pkce = PkceTriple::generate();
    let auth_url = build_authorization_url(&config, &client_id, &pkce.challenge, &pkce.state)?;

    let (receiver, server) = CallbackServer::start().await?;
    let received = await_redirect(ctx, &auth_url, receiver).await;
    server.shutdown().await;
    let result = received?;

    let code = verify_callback(&result, &pkce.state)?;

    output::info("Exchanging authorization code for tokens...");
    let tokens = exchange_code(
        ctx.http,
        &config.token_endpoint,
        code,
        &pkce.verifier,
        &client_id,
    )
    .await?;

    creds.apply_token_response(&tokens, now_epoch());
    creds.base_url = Some(base_url.clone());
    ctx.store.save(&creds)?;

    Ok(LoginOutcome {
        base_url,
        client_id,
        registered,
        credentials_file: ctx.store.path().to_path_buf(),
    })
}

async fn await_redirect(
    ctx: &LoginContext<'_>,
    auth_url: &str,
    receiver: CallbackReceiver,
) -> Result<CallbackResult> {
    output::info("Opening browser for authorization...");
    println!(
        "\n  {}\n  {}\n",
        output::dim("If the browser doesn't open, visit:"),
        auth_url
    );
    if let Err(e) = ctx.browser.open(auth_url) {
        tracing::warn!(error = %e, "could not launch browser");
    }

    output::info("Waiting for authorization callback...");
    tokio::select! {
        result = receiver.recv() => result,
        _ = tokio::time::sleep(ctx.callback_timeout) => Err(ChpError::Timeout(
            "Timed out waiting for OAuth callback.".to_string(),
        )
        .into()),
    }
}

/// Check the redirect for a server error and a matching state, returning
/// the authorization code.
fn verify_callback<'r>(result: &'r CallbackResult, expected_state: &str) -> Result<&'r str> {
    if result.code.is_empty() {
        return Err(ChpError::Authorization(result.failure_message().to_string()).into());
    }

    if result.state != expected_state {
        tracing::warn!("state parameter on redirect does not match this login");
        return Err(ChpError::StateMismatch.into());
    }

    Ok(result.code.as_str())
}
