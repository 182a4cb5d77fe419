//! OAuth 2.0 authorization code flow with PKCE for the CLI
//!
//! - [`credentials`]: persisted tokens and the file-backed store
//! - [`pkce`]: verifier, challenge and CSRF state generation
//! - [`discovery`]: endpoint resolution from `.well-known` metadata
//! - [`registration`]: one-time dynamic client registration
//! - [`callback`]: the short-lived local redirect listener
//! - [`token`]: code exchange and refresh
//! - [`login`]: the interactive login sequence tying the above together

pub mod callback;
pub mod credentials;
pub mod discovery;
pub mod login;
pub mod pkce;
pub mod registration;
pub mod token;

pub use callback::{CallbackResult, CallbackServer};
pub use credentials::{CredentialStore, Credentials};
pub use discovery::OAuthConfig;
pub use login::{login, Browser, LoginContext, LoginOutcome, SystemBrowser};
pub use token::TokenResponse;

/// Local port the authorization server redirects to.
///
/// Must match the redirect URI registered for the client.
pub const REDIRECT_PORT: u16 = 9876;

/// Path of the redirect handler.
pub const CALLBACK_PATH: &str = "/callback";

/// Redirect URI sent during registration, authorization and code exchange.
pub const REDIRECT_URI: &str = "http://127.0.0.1:9876/callback";

/// Current time in epoch seconds.
pub fn now_epoch() -> i64 {
    chrono::Utc::now().timestamp()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redirect_uri_matches_port_and_path() {
        assert_eq!(
            REDIRECT_URI,
            format!("http://127.0.0.1:{REDIRECT_PORT}{CALLBACK_PATH}")
        );
    }
}
