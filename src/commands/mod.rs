//! Command handlers for the CLI
//!
//! Each handler takes the resolved [`Config`](crate::config::Config), builds
//! the collaborators it needs and reports progress through
//! [`output`](crate::output). Errors are returned to `main`, which prints
//! them and sets the exit code.
//!
//! - `login`: interactive OAuth login
//! - `logout`: remove stored credentials
//! - `config`: show configuration and change the base URL
//! - `call`: raw RPC calls, and `whoami` on top of them

pub mod call;
pub mod config;
pub mod login;
pub mod logout;

pub use call::{run_call, run_whoami};
pub use config::{run_config_show, run_config_set_url};
pub use login::run_login;
pub use logout::run_logout;
