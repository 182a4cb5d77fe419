//! OAuth endpoint discovery
//!
//! Resolution happens in two steps:
//!
//! 1. `{base}/.well-known/oauth-protected-resource` (RFC 9728) may name the
//!    authorization server in `authorization_servers`. This document is
//!    optional: any failure logs a warning and the base URL is used as the
//!    authorization server.
//! 2. `{auth_server}/.well-known/oauth-authorization-server` (RFC 8414) is
//!    required. Any failure aborts discovery with an error naming this step.
//!
//! Endpoints missing from the second document fall back to
//! `{auth_server}/oauth/{authorize,token,register}`, and an absent or empty
//! scope list falls back to `read write`.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::auth::REDIRECT_URI;
use crate::error::{ChpError, Result};
use crate::http::{self, HttpClient};

/// Scopes requested when the server does not advertise any.
pub const DEFAULT_SCOPES: [&str; 2] = ["read", "write"];

const PROTECTED_RESOURCE_PATH: &str = "/.well-known/oauth-protected-resource";
const AUTHORIZATION_SERVER_PATH: &str = "/.well-known/oauth-authorization-server";

// ---------------------------------------------------------------------------
// Metadata documents
// ---------------------------------------------------------------------------

/// Protected resource metadata (RFC 9728), reduced to what login needs.
///
/// # Examples
///
/// ```
/// use chp::auth::discovery::ProtectedResourceMetadata;
///
/// let meta: ProtectedResourceMetadata =
///     serde_json::from_str(r#"{"authorization_servers":["https://auth.example.com"]}"#).unwrap();
/// assert_eq!(meta.authorization_servers[0], "https://auth.example.com");
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProtectedResourceMetadata {
    /// Identifier of the protected resource
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,

    /// Issuer URLs of the authorization servers protecting the resource
    #[serde(default)]
    pub authorization_servers: Vec<String>,
}

/// Authorization server metadata (RFC 8414)
///
/// Every field is optional; [`discover`] substitutes defaults for what is
/// missing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthorizationServerMetadata {
    /// Issuer identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,

    /// Authorization endpoint URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authorization_endpoint: Option<String>,

    /// Token endpoint URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_endpoint: Option<String>,

    /// Dynamic client registration endpoint URL (RFC 7591)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration_endpoint: Option<String>,

    /// Scopes the server supports
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scopes_supported: Option<Vec<String>>,
}

// ---------------------------------------------------------------------------
// OAuthConfig
// ---------------------------------------------------------------------------

/// Resolved endpoints for one login attempt. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthConfig {
    /// Where the browser is sent to grant access
    pub authorization_endpoint: String,
    /// Where codes and refresh tokens are exchanged
    pub token_endpoint: String,
    /// Where the CLI registers itself as a public client
    pub registration_endpoint: String,
    /// Scopes to request; never empty
    pub scopes_supported: Vec<String>,
}

impl OAuthConfig {
    /// Build a config from server metadata, filling in defaults relative to
    /// `auth_server`.
    pub fn from_metadata(auth_server: &str, meta: AuthorizationServerMetadata) -> Self {
        let endpoint = |value: Option<String>, suffix: &str| {
            value
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| format!("{auth_server}/oauth/{suffix}"))
        };

        let scopes: Vec<String> = meta
            .scopes_supported
            .unwrap_or_default()
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect();

        Self {
            authorization_endpoint: endpoint(meta.authorization_endpoint, "authorize"),
            token_endpoint: endpoint(meta.token_endpoint, "token"),
            registration_endpoint: endpoint(meta.registration_endpoint, "register"),
            scopes_supported: if scopes.is_empty() {
                DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect()
            } else {
                scopes
            },
        }
    }

    /// Space-separated scope string for the authorization request.
    pub fn scope(&self) -> String {
        self.scopes_supported.join(" ")
    }
}

// ---------------------------------------------------------------------------
// Public functions
// ---------------------------------------------------------------------------

/// Resolve the OAuth endpoints protecting `base_url`
///
/// # Errors
///
/// Returns [`ChpError::Discovery`] when the authorization server metadata
/// cannot be fetched or parsed. Failures of the protected resource step are
/// logged and tolerated.
///
/// # Examples
///
/// ```no_run
/// use chp::auth::discovery::discover;
/// use chp::config::Config;
/// use chp::http::HttpClient;
///
/// # async fn example() -> chp::error::Result<()> {
/// let http = HttpClient::new(&Config::with_config_dir("/tmp/chp"))?;
/// let config = discover(&http, "https://alpha.lollipopai.com").await?;
/// println!("{}", config.authorization_endpoint);
/// # Ok(())
/// # }
/// ```
pub async fn discover(http: &HttpClient, base_url: &str) -> Result<OAuthConfig> {
    let base_url = base_url.trim_end_matches('/');
    let auth_server = resolve_authorization_server(http, base_url).await;

    let url = format!("{auth_server}{AUTHORIZATION_SERVER_PATH}");
    tracing::debug!(%url, "fetching authorization server metadata");

    let body = http.get_json(&url, &[]).await.map_err(|e| {
        ChpError::Discovery(format!(
            "could not fetch authorization server metadata: {e}"
        ))
    })?;

    let meta: AuthorizationServerMetadata = serde_json::from_slice(&body).map_err(|e| {
        ChpError::Discovery(format!("invalid authorization server metadata: {e}"))
    })?;

    Ok(OAuthConfig::from_metadata(&auth_server, meta))
}

/// Build the browser URL for the authorization request
///
/// Adds `client_id`, `redirect_uri`, `response_type=code`, `scope`,
/// `state`, `code_challenge` and `code_challenge_method=S256` to the
/// discovered authorization endpoint, keeping any query it already has.
///
/// # Errors
///
/// Returns [`ChpError::Url`] if the authorization endpoint is not a valid
/// absolute URL.
pub fn build_authorization_url(
    config: &OAuthConfig,
    client_id: &str,
    challenge: &str,
    state: &str,
) -> Result<String> {
    let mut url = Url::parse(&config.authorization_endpoint).map_err(ChpError::Url)?;

    url.query_pairs_mut()
        .append_pair("client_id", client_id)
        .append_pair("redirect_uri", REDIRECT_URI)
        .append_pair("response_type", "code")
        .append_pair("scope", &config.scope())
        .append_pair("state", state)
        .append_pair("code_challenge", challenge)
        .append_pair("code_challenge_method", "S256");

    Ok(url.to_string())
}

async fn resolve_authorization_server(http: &HttpClient, base_url: &str) -> String {
    let url = format!("{base_url}{PROTECTED_RESOURCE_PATH}");
    tracing::debug!(%url, "fetching protected resource metadata");

    let meta = match http.get_json(&url, &[]).await {
        Ok(body) => http::decode::<ProtectedResourceMetadata>(&body, "protected resource metadata"),
        Err(e) => Err(e),
    };

    match meta {
        Ok(meta) => match meta.authorization_servers.into_iter().find(|s| !s.is_empty()) {
            Some(server) => server.trim_end_matches('/').to_string(),
            None => base_url.to_string(),
        },
        Err(e) => {
            tracing::warn!(
                error = %e,
                "Could not fetch protected resource metadata, using base URL as auth server."
            );
            base_url.to_string()
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
