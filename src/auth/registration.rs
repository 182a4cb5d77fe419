//! Dynamic client registration (RFC 7591)
//!
//! The CLI registers itself once as a public client (no secret, since the
//! binary cannot keep one confidential). Callers persist the returned
//! client ID so later logins skip this step.

use serde::Deserialize;

use crate::auth::REDIRECT_URI;
use crate::error::{ChpError, Result};
use crate::http::HttpClient;

/// Human-readable client name shown on the consent screen.
pub const CLIENT_NAME: &str = "Cherrypick CLI";

#[derive(Debug, Deserialize)]
struct RegistrationResponse {
    #[serde(default)]
    client_id: Option<String>,
}

/// Register the CLI at `endpoint` and return the issued client ID
///
/// # Errors
///
/// Returns [`ChpError::Registration`] when the request fails, the response
/// is not JSON, or it carries no `client_id`.
pub async fn register_client(http: &HttpClient, endpoint: &str) -> Result<String> {
    let payload = serde_json::json!({
        "client_name": CLIENT_NAME,
        "redirect_uris": [REDIRECT_URI],
        "token_endpoint_auth_method": "none",
    });

    tracing::debug!(%endpoint, "registering client");
    let body = http
        .post_json(endpoint, &payload, &[])
        .await
        .map_err(|e| ChpError::Registration(format!("dynamic client registration failed: {e}")))?;

    let resp: RegistrationResponse = serde_json::from_slice(&body)
        .map_err(|e| ChpError::Registration(format!("invalid registration response: {e}")))?;

    match resp.client_id.filter(|id| !id.is_empty()) {
        Some(client_id) => Ok(client_id),
        None => Err(ChpError::Registration("no client_id in registration response".to_string()).into()),
    }
}
