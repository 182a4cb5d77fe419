//! Local redirect listener for the authorization code
//!
//! [`CallbackServer::start`] binds `127.0.0.1:9876` and serves
//! `GET /callback` on a background task. The first request's query is read
//! into a [`CallbackResult`] and handed over through a one-slot channel;
//! later requests still get an HTML page but their results are dropped.
//!
//! The listener stays bound until [`CallbackServer::shutdown`] is called or
//! the guard is dropped, whichever comes first.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::get;
use axum::Router;
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;

use crate::auth::{CALLBACK_PATH, REDIRECT_PORT};
use crate::error::{ChpError, Result};

/// Query parameters delivered on the redirect
///
/// `code` and `state` are set on success, `error` and
/// `error_description` on failure. Missing parameters are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallbackResult {
    /// Authorization code
    pub code: String,
    /// Echoed CSRF state
    pub state: String,
    /// OAuth error code
    pub error: String,
    /// Human-readable error detail
    pub error_description: String,
}

impl CallbackResult {
    /// Build a result from decoded query pairs
    ///
    /// The first occurrence of each parameter wins; repeats and unknown keys
    /// are ignored.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut result = Self::default();
        let mut seen = [false; 4];
        for (key, value) in pairs {
            let (idx, field) = match key.as_str() {
                "code" => (0, &mut result.code),
                "state" => (1, &mut result.state),
                "error" => (2, &mut result.error),
                "error_description" => (3, &mut result.error_description),
                _ => continue,
            };
            if !seen[idx] {
                seen[idx] = true;
                *field = value;
            }
        }
        result
    }

    /// Best available failure message for a result without a code.
    pub fn failure_message(&self) -> &str {
        [self.error_description.as_str(), self.error.as_str()]
            .into_iter()
            .find(|s| !s.is_empty())
            .unwrap_or("Unknown error")
    }
}

type ResultSlot = Arc<Mutex<Option<oneshot::Sender<CallbackResult>>>>;

/// Receiving half of the handoff; yields at most one result.
#[derive(Debug)]
pub struct CallbackReceiver {
    rx: oneshot::Receiver<CallbackResult>,
}

impl CallbackReceiver {
    /// Wait for the first callback
    ///
    /// # Errors
    ///
    /// Returns [`ChpError::Callback`] if the listener stopped before any
    /// request arrived.
    pub async fn recv(self) -> Result<CallbackResult> {
        self.rx.await.map_err(|_| {
            ChpError::Callback("callback server stopped before a redirect arrived".to_string())
                .into()
        })
    }
}

/// Handle to the running listener
///
/// Dropping the handle aborts the accept loop, so the port is released on
/// every exit path.
#[derive(Debug)]
pub struct CallbackServer {
    addr: SocketAddr,
    task: JoinHandle<()>,
}

impl CallbackServer {
    /// Bind the fixed redirect port and start serving
    ///
    /// # Errors
    ///
    /// Returns [`ChpError::Callback`] naming the port when it cannot be
    /// bound, for example because another login is in progress.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use chp::auth::callback::CallbackServer;
    ///
    /// # async fn example() -> chp::error::Result<()> {
    /// let (receiver, server) = CallbackServer::start().await?;
    /// let result = receiver.recv().await?;
    /// server.shutdown().await;
    /// println!("code: {}", result.code);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn start() -> Result<(CallbackReceiver, CallbackServer)> {
        Self::start_on(SocketAddr::from(([127, 0, 0, 1], REDIRECT_PORT))).await
    }

    /// Start the listener on an explicit address.
    ///
    /// Port `0` picks a free port; see [`CallbackServer::local_addr`].
    pub async fn start_on(addr: SocketAddr) -> Result<(CallbackReceiver, CallbackServer)> {
        let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
            ChpError::Callback(format!(
                "failed to start callback server on port {}: {e}",
                addr.port()
            ))
        })?;
        let addr = listener.local_addr()?;

        let (tx, rx) = oneshot::channel();
        let slot: ResultSlot = Arc::new(Mutex::new(Some(tx)));
        let app = Router::new()
            .route(CALLBACK_PATH, get(handle_callback))
            .with_state(slot);

        let task = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::warn!(error = %e, "callback server stopped");
            }
        });
        tracing::debug!(%addr, "callback server listening");

        Ok((CallbackReceiver { rx }, CallbackServer { addr, task }))
    }

    /// Address the listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Close the listener and wait until the port is released.
    pub async fn shutdown(mut self) {
        self.task.abort();
        let _ = (&mut self.task).await;
        tracing::debug!(addr = %self.addr, "callback server closed");
    }
}

impl Drop for CallbackServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn handle_callback(
    State(slot): State<ResultSlot>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> (StatusCode, Html<String>) {
    let result = CallbackResult::from_pairs(pairs);
    let page = render_page(&result);

    match slot.lock().await.take() {
        Some(tx) => {
            let _ = tx.send(result);
        }
        None => tracing::debug!("ignoring repeated callback"),
    }

    page
}

fn render_page(result: &CallbackResult) -> (StatusCode, Html<String>) {
    if !result.code.is_empty() {
        return (
            StatusCode::OK,
            Html(
                r#"<html><body style="font-family:system-ui;text-align:center;padding:60px">
<h1>Logged in!</h1>
<p>You can close this tab and return to the terminal.</p>
</body></html>"#
                    .to_string(),
            ),
        );
    }

    let message = if result.error_description.is_empty() {
        "Unknown error"
    } else {
        result.error_description.as_str()
    };

    (
        StatusCode::BAD_REQUEST,
        Html(format!(
            r#"<html><body style="font-family:system-ui;text-align:center;padding:60px">
<h1>Login failed</h1>
<p>{}</p>
</body></html>"#,
            escape_html(message)
        )),
    )
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&#34;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn start_ephemeral() -> (CallbackReceiver, CallbackServer) {
        CallbackServer::start_on(SocketAddr::from(([127, 0, 0, 1], 0)))
            .await
            .expect("bind ephemeral port")
    }

    fn callback_url(server: &CallbackServer, query: &str) -> String {
        format!("http://{}/callback?{}", server.local_addr(), query)
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<script>alert("x")</script> & 'y'"#),
            "&lt;script&gt;alert(&#34;x&#34;)&lt;/script&gt; &amp; &#39;y&#39;"
        );
    }

    #[test]
    fn test_failure_message_preference() {
        let mut result = CallbackResult {
            error: "access_denied".to_string(),
            error_description: "User denied".to_string(),
            ..Default::default()
        };
        assert_eq!(result.failure_message(), "User denied");

        result.error_description.clear();
        assert_eq!(result.failure_message(), "access_denied");

        result.error.clear();
        assert_eq!(result.failure_message(), "Unknown error");
    }

    #[tokio::test]
    async fn test_success_redirect_delivers_code_and_state() {
        let (rx, server) = start_ephemeral().await;

        let resp = reqwest::get(callback_url(&server, "code=abc&state=xyz"))
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        assert!(resp.text().await.unwrap().contains("Logged in!"));

        let result = rx.recv().await.unwrap();
        assert_eq!(result.code, "abc");
        assert_eq!(result.state, "xyz");
        assert!(result.error.is_empty());

        server.shutdown().await;
    }

    #[tokio::test]
    async fn test_error_redirect_renders_escaped_description() {
        let (rx, server) = start_ephemeral().await;

        let resp = reqwest::get(callback_url(
            &server,
            "error=access_denied&error_description=%3Cb%3EUser%20denied%3C%2Fb%3E",
        ))
        .await
        .unwrap();
        assert_eq!(resp.status(), 400);
        let body = resp.text().await.unwrap();
        assert!(body.contains("Login failed"));
        assert!(body.contains("&lt;b&gt;User denied&lt;/b&gt;"), "{body}");

        let result = rx.recv().await.unwrap();
        assert!(result.code.is_empty());
        assert_eq!(result.error, "access_denied");
        assert_eq!(result.error_description, "<b>User denied</b>");

        server.shutdown().await;
    }

    #[tokio::test]
    async fn test_missing_description_shows_unknown_error() {
        let (_rx, server) = start_ephemeral().await;

        let resp = reqwest::get(callback_url(&server, "error=server_error"))
            .await
            .unwrap();
        assert_eq!(resp.status(), 400);
        assert!(resp.text().await.unwrap().contains("Unknown error"));

        server.shutdown().await;
    }

    #[test]
    fn test_from_pairs_takes_first_value() {
        let result = CallbackResult::from_pairs(vec![
            ("code".to_string(), "a".to_string()),
            ("state".to_string(), "s1".to_string()),
            ("state".to_string(), "s2".to_string()),
            ("extra".to_string(), "x".to_string()),
        ]);
        assert_eq!(result.code, "a");
        assert_eq!(result.state, "s1");
        assert!(result.error.is_empty());
        assert!(result.error_description.is_empty());
    }

    #[tokio::test]
    async fn test_repeated_parameter_still_delivers_result() {
        let (rx, server) = start_ephemeral().await;

        let resp = reqwest::get(callback_url(&server, "code=a&state=s&state=other"))
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        assert!(resp.text().await.unwrap().contains("Logged in!"));

        let result = rx.recv().await.unwrap();
        assert_eq!(result.code, "a");
        assert_eq!(result.state, "s");

        server.shutdown().await;
    }

    #[tokio::test]
    async fn test_first_callback_wins() {
        let (rx, server) = start_ephemeral().await;

        for query in ["code=first&state=s1", "code=second&state=s2"] {
            let resp = reqwest::get(callback_url(&server, query)).await.unwrap();
            assert_eq!(resp.status(), 200, "later hits are still answered");
        }

        let result = rx.recv().await.unwrap();
        assert_eq!(result.code, "first");

        server.shutdown().await;
    }

    #[tokio::test]
    async fn test_unknown_path_is_not_found() {
        let (_rx, server) = start_ephemeral().await;

        let resp = reqwest::get(format!("http://{}/other", server.local_addr()))
            .await
            .unwrap();
        assert_eq!(resp.status(), 404);

        server.shutdown().await;
    }

    #[tokio::test]
    async fn test_shutdown_releases_port() {
        let (_rx, server) = start_ephemeral().await;
        let addr = server.local_addr();
        server.shutdown().await;

        let (_rx, again) = CallbackServer::start_on(addr)
            .await
            .expect("port should be free after shutdown");
        again.shutdown().await;
    }

    #[tokio::test]
    async fn test_receiver_errors_when_server_stops_first() {
        let (rx, server) = start_ephemeral().await;
        server.shutdown().await;

        let err = rx.recv().await.unwrap_err();
        assert!(err.to_string().contains("stopped"));
    }

    #[tokio::test]
    async fn test_bind_failure_names_port() {
        let blocker = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = blocker.local_addr().unwrap();

        let err = CallbackServer::start_on(addr).await.unwrap_err();
        assert!(
            err.to_string().contains(&format!("port {}", addr.port())),
            "unexpected error: {err}"
        );
    }
}
