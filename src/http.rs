//! HTTP transport used by the auth subsystem and the RPC caller
//!
//! [`HttpClient`] wraps two `reqwest` clients: a standard one, and one that
//! skips TLS verification which is only ever selected for `localhost` and
//! `127.0.0.1` so a development server with a self-signed certificate works.
//!
//! Every failure is reported as [`ChpError::Api`]. Connection failures carry
//! no status; non-2xx responses carry the status and a message taken from
//! the JSON body's `error` or `msg` field, falling back to the raw body.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use url::Url;

use crate::config::Config;
use crate::error::{ChpError, Result};

/// Extra request headers as `(name, value)` pairs.
pub type Headers<'a> = &'a [(&'a str, &'a str)];

/// JSON/form HTTP client with localhost TLS relaxation
///
/// # Examples
///
/// ```
/// use chp::config::Config;
/// use chp::http::HttpClient;
///
/// let config = Config::with_config_dir("/tmp/chp-doc");
/// let http = HttpClient::new(&config).unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct HttpClient {
    standard: reqwest::Client,
    insecure: reqwest::Client,
}

impl HttpClient {
    /// Build both underlying clients from the runtime configuration
    ///
    /// # Errors
    ///
    /// Returns [`ChpError::Http`] if the TLS backend cannot be initialised.
    pub fn new(config: &Config) -> Result<Self> {
        let standard = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(ChpError::Http)?;

        let insecure = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .user_agent(config.user_agent.as_str())
            .danger_accept_invalid_certs(true)
            .build()
            .map_err(ChpError::Http)?;

        Ok(Self { standard, insecure })
    }

    /// Perform a GET request and return the raw response body
    ///
    /// # Errors
    ///
    /// Returns [`ChpError::Api`] on connection failure or non-2xx status.
    pub async fn get_json(&self, url: &str, headers: Headers<'_>) -> Result<Vec<u8>> {
        let request = with_headers(self.client_for(url).get(url), headers)
            .header(reqwest::header::ACCEPT, "application/json");
        self.execute(request, url).await
    }

    /// POST a JSON-encoded payload and return the raw response body
    ///
    /// # Errors
    ///
    /// Returns [`ChpError::Api`] on connection failure or non-2xx status.
    pub async fn post_json<T: serde::Serialize + ?Sized>(
        &self,
        url: &str,
        payload: &T,
        headers: Headers<'_>,
    ) -> Result<Vec<u8>> {
        let request = with_headers(self.client_for(url).post(url).json(payload), headers);
        self.execute(request, url).await
    }

    /// POST a form-urlencoded body and return the raw response body
    ///
    /// # Errors
    ///
    /// Returns [`ChpError::Api`] on connection failure or non-2xx status.
    pub async fn post_form(
        &self,
        url: &str,
        params: &[(&str, &str)],
        headers: Headers<'_>,
    ) -> Result<Vec<u8>> {
        let request = with_headers(self.client_for(url).post(url).form(params), headers);
        self.execute(request, url).await
    }

    fn client_for(&self, raw_url: &str) -> &reqwest::Client {
        if is_local(raw_url) {
            &self.insecure
        } else {
            &self.standard
        }
    }

    async fn execute(&self, request: reqwest::RequestBuilder, url: &str) -> Result<Vec<u8>> {
        let resp = request.send().await.map_err(|e| ChpError::Api {
            status: None,
            message: format!(
                "Connection failed: {e}\nCheck your network and base URL: {url}"
            ),
        })?;

        let status = resp.status();
        let body = resp.bytes().await.map_err(|e| ChpError::Api {
            status: Some(status.as_u16()),
            message: format!("Failed to read response: {e}"),
        })?;

        if !status.is_success() {
            let code = status.as_u16();
            tracing::debug!(status = code, url, "request failed");
            return Err(ChpError::Api {
                status: Some(code),
                message: format!("HTTP {code}: {}", parse_error_body(&body)),
            }
            .into());
        }

        Ok(body.to_vec())
    }
}

/// Decode a JSON body into `T`, framing failures with `context`.
///
/// Unknown fields are ignored by the target types; missing required fields
/// surface as an error naming the context.
pub fn decode<T: DeserializeOwned>(body: &[u8], context: &str) -> Result<T> {
    serde_json::from_slice(body).map_err(|e| anyhow::anyhow!("{context}: {e}"))
}

fn with_headers(
    mut request: reqwest::RequestBuilder,
    headers: Headers<'_>,
) -> reqwest::RequestBuilder {
    for (name, value) in headers {
        request = request.header(*name, *value);
    }
    request
}

/// Returns `true` for URLs that point at the local machine.
pub fn is_local(raw_url: &str) -> bool {
    Url::parse(raw_url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h == "localhost" || h == "127.0.0.1"))
        .unwrap_or(false)
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<serde_json::Value>,
    #[serde(default)]
    msg: Option<serde_json::Value>,
}

/// Extract a human-readable message from an error response body.
fn parse_error_body(body: &[u8]) -> String {
    if let Ok(parsed) = serde_json::from_slice::<ErrorBody>(body) {
        if let Some(error) = parsed.error.as_ref().and_then(|v| v.as_str()) {
            return error.to_string();
        }
        if let Some(msg) = parsed.msg.as_ref().and_then(|v| v.as_str()) {
            return msg.to_string();
        }
    }
    String::from_utf8_lossy(body).into_owned()
}
