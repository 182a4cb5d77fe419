//! chp - Cherrypick command-line client library
//!
//! Authenticates the local user against the Cherrypick API with OAuth 2.0
//! (authorization code + PKCE) and relays authenticated Twirp calls.
//!
//! # Architecture
//!
//! - `auth`: credential storage, PKCE, discovery, registration, the local
//!   redirect listener, token grants and the login sequence
//! - `rpc`: authenticated calls with transparent token refresh
//! - `http`: JSON/form transport with API error mapping
//! - `config`: runtime configuration resolved once at startup
//! - `commands`: handlers behind each CLI subcommand
//! - `cli`: command-line interface definition
//! - `output`: colored terminal output
//! - `error`: error types and result alias
//!
//! # Example
//!
//! ```no_run
//! use chp::{Config, CredentialStore, HttpClient, RpcClient};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::with_config_dir("/home/me/.cpk");
//!     let http = HttpClient::new(&config)?;
//!     let mut rpc = RpcClient::new(http, CredentialStore::from_config(&config));
//!     let me = rpc.call("lollipop.proto.user.v1.UserV1", "Current", None).await?;
//!     println!("{me}");
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod http;
pub mod output;
pub mod rpc;

// Re-export commonly used types
pub use auth::{CredentialStore, Credentials};
pub use config::Config;
pub use error::{ChpError, Result};
pub use http::HttpClient;
pub use rpc::RpcClient;
