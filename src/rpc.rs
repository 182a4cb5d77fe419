//! Authenticated Twirp calls
//!
//! Every call goes through [`RpcClient::call`], which refreshes an expiring
//! OAuth token first, attaches the bearer token and turns a 401 into a hint
//! to log in again. Refresh failures are only warned about; the server's own
//! response decides the outcome.

use serde_json::Value;

use crate::auth::credentials::{CredentialStore, Credentials};
use crate::auth::{now_epoch, token};
use crate::error::{ChpError, Result};
use crate::http::{self, HttpClient};
use crate::output;

/// Package prefix shared by every Cherrypick service.
pub const SERVICE_PREFIX: &str = "lollipop.proto.";

/// Returns `service` with [`SERVICE_PREFIX`] prepended when missing.
///
/// # Examples
///
/// ```
/// use chp::rpc::qualify_service;
///
/// assert_eq!(qualify_service("user.v1.UserV1"), "lollipop.proto.user.v1.UserV1");
/// assert_eq!(qualify_service("lollipop.proto.user.v1.UserV1"), "lollipop.proto.user.v1.UserV1");
/// ```
pub fn qualify_service(service: &str) -> String {
    if service.starts_with(SERVICE_PREFIX) {
        service.to_string()
    } else {
        format!("{SERVICE_PREFIX}{service}")
    }
}

/// Caller bound to the stored credentials of the local user.
#[derive(Debug)]
pub struct RpcClient {
    http: HttpClient,
    store: CredentialStore,
    creds: Credentials,
}

impl RpcClient {
    /// Create a client using the credentials currently in `store`.
    pub fn new(http: HttpClient, store: CredentialStore) -> Self {
        let creds = store.load();
        Self { http, store, creds }
    }

    /// Credentials as last loaded or refreshed.
    pub fn credentials(&self) -> &Credentials {
        &self.creds
    }

    /// Invoke `service/method` with a JSON payload
    ///
    /// `None` sends an empty object.
    ///
    /// # Errors
    ///
    /// - [`ChpError::NotAuthenticated`] when no token is stored (no request
    ///   is made)
    /// - [`ChpError::SessionExpired`] when the server answers 401
    /// - [`ChpError::Api`] for any other transport failure
    pub async fn call(&mut self, service: &str, method: &str, payload: Option<&Value>) -> Result<Value> {
        if self.creds.is_oauth_token_expiring(now_epoch()) {
            if let Err(e) = token::refresh(&self.http, &self.store, &mut self.creds).await {
                tracing::debug!(error = %e, "token refresh failed");
                output::warn("OAuth token expired and refresh failed. Try: chp login");
            }
        }

        let bearer = format!("Bearer {}", self.creds.token()?);
        let url = format!(
            "{}/api/twirp/{service}/{method}",
            self.creds.base_url().trim_end_matches('/')
        );
        let empty = Value::Object(serde_json::Map::new());
        let payload = payload.unwrap_or(&empty);

        tracing::debug!(%url, "calling rpc");
        let body = self
            .http
            .post_json(&url, payload, &[("Authorization", bearer.as_str())])
            .await
            .map_err(session_expired_hint)?;

        http::decode(&body, "invalid JSON response")
    }
}

fn session_expired_hint(err: anyhow::Error) -> anyhow::Error {
    match err.downcast_ref::<ChpError>() {
        Some(api) if api.status() == Some(401) => ChpError::SessionExpired(api.to_string()).into(),
        _ => err,
    }
}
