//! Token endpoint grants: authorization code exchange and refresh
//!
//! Both grants POST form-encoded bodies as a public client (the client ID is
//! sent, no secret). Responses are decoded into [`TokenResponse`], where
//! `access_token` is required and every other field is optional.

use serde::Deserialize;

use crate::auth::credentials::{CredentialStore, Credentials};
use crate::auth::discovery::AuthorizationServerMetadata;
use crate::auth::{now_epoch, REDIRECT_URI};
use crate::error::{ChpError, Result};
use crate::http::HttpClient;

// ---------------------------------------------------------------------------
// TokenResponse
// ---------------------------------------------------------------------------

/// Successful token endpoint response (RFC 6749 section 5.1).
#[derive(Clone, Deserialize)]
pub struct TokenResponse {
    /// New access token
    pub access_token: String,

    /// Rotated refresh token, when the server issued one
    #[serde(default)]
    pub refresh_token: Option<String>,

    /// Lifetime of the access token in seconds
    #[serde(default)]
    pub expires_in: Option<f64>,

    /// Token type, normally `Bearer`
    #[serde(default)]
    pub token_type: Option<String>,

    /// Granted scopes
    #[serde(default)]
    pub scope: Option<String>,
}

impl std::fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenResponse")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .field("expires_in", &self.expires_in)
            .field("token_type", &self.token_type)
            .field("scope", &self.scope)
            .finish()
    }
}

impl Credentials {
    /// Merge a token response into the stored credentials
    ///
    /// The access token is always replaced. The refresh token and expiry are
    /// only replaced when the response carries them, so a server that does
    /// not rotate refresh tokens leaves the previous one in place.
    pub fn apply_token_response(&mut self, resp: &TokenResponse, now: i64) {
        self.oauth_access_token = Some(resp.access_token.clone());

        if let Some(refresh) = resp.refresh_token.as_ref().filter(|t| !t.is_empty()) {
            self.oauth_refresh_token = Some(refresh.clone());
        }

        if let Some(expires_in) = resp.expires_in {
            // `as` saturates; negative and NaN lifetimes count as zero.
            self.oauth_expires_at = Some(now.saturating_add(expires_in.max(0.0) as i64));
        }
    }
}

// ---------------------------------------------------------------------------
// Grants
// ---------------------------------------------------------------------------

/// Exchange an authorization code for tokens
///
/// # Errors
///
/// Returns [`ChpError::TokenExchange`] when the request fails or the
/// response has no `access_token`.
pub async fn exchange_code(
    http: &HttpClient,
    token_endpoint: &str,
    code: &str,
    verifier: &str,
    client_id: &str,
) -> Result<TokenResponse> {
    let params = [
        ("grant_type", "authorization_code"),
        ("code", code),
        ("redirect_uri", REDIRECT_URI),
        ("client_id", client_id),
        ("code_verifier", verifier),
    ];

    tracing::debug!(%token_endpoint, "exchanging authorization code");
    let body = http
        .post_form(token_endpoint, &params, &[])
        .await
        .map_err(|e| ChpError::TokenExchange(format!("token exchange failed: {e}")))?;

    serde_json::from_slice(&body)
        .map_err(|e| ChpError::TokenExchange(format!("invalid token response: {e}")).into())
}

/// Refresh the OAuth access token and persist the result
///
/// On a successful grant `creds` is updated in place and written to
/// `store`. If only the save fails, `creds` still holds the new tokens so
/// the current process can keep using them. Any earlier failure leaves
/// `creds` untouched.
///
/// # Errors
///
/// Returns [`ChpError::Precondition`] without touching the network when no
/// refresh token or client ID is stored, and [`ChpError::Refresh`] when the
/// grant or the save fails.
///
/// # Examples
///
/// ```no_run
/// use chp::auth::credentials::CredentialStore;
/// use chp::auth::token::refresh;
/// use chp::config::Config;
/// use chp::http::HttpClient;
///
/// # async fn example() -> chp::error::Result<()> {
/// let config = Config::with_config_dir("/tmp/chp");
/// let http = HttpClient::new(&config)?;
/// let store = CredentialStore::from_config(&config);
/// let mut creds = store.load();
/// refresh(&http, &store, &mut creds).await?;
/// # Ok(())
/// # }
/// ```
pub async fn refresh(
    http: &HttpClient,
    store: &CredentialStore,
    creds: &mut Credentials,
) -> Result<()> {
    let (refresh_token, client_id) = match (creds.oauth_refresh_token(), creds.oauth_client_id()) {
        (Some(refresh_token), Some(client_id)) => (refresh_token.to_string(), client_id.to_string()),
        _ => {
            return Err(
                ChpError::Precondition("no refresh token or client ID".to_string()).into(),
            )
        }
    };

    let token_endpoint = discover_token_endpoint(http, creds.base_url()).await;
    let params = [
        ("grant_type", "refresh_token"),
        ("refresh_token", refresh_token.as_str()),
        ("client_id", client_id.as_str()),
    ];

    tracing::debug!(%token_endpoint, "refreshing access token");
    let body = http
        .post_form(&token_endpoint, &params, &[])
        .await
        .map_err(|e| ChpError::Refresh(format!("token refresh failed: {e}")))?;

    let resp: TokenResponse = serde_json::from_slice(&body)
        .map_err(|e| ChpError::Refresh(format!("invalid refresh response: {e}")))?;

    creds.apply_token_response(&resp, now_epoch());
    store
        .save(creds)
        .map_err(|e| ChpError::Refresh(format!("failed to save refreshed credentials: {e:#}")))?;

    tracing::info!("OAuth token refreshed.");
    Ok(())
}

/// Best-effort lookup of the token endpoint for `base_url`.
async fn discover_token_endpoint(http: &HttpClient, base_url: &str) -> String {
    let base_url = base_url.trim_end_matches('/');
    let fallback = format!("{base_url}/oauth/token");
    let url = format!("{base_url}/.well-known/oauth-authorization-server");

    let Ok(body) = http.get_json(&url, &[]).await else {
        return fallback;
    };

    serde_json::from_slice::<AuthorizationServerMetadata>(&body)
        .ok()
        .and_then(|meta| meta.token_endpoint)
        .filter(|endpoint| !endpoint.is_empty())
        .unwrap_or(fallback)
}
