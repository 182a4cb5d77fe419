//! Runtime configuration for chp
//!
//! A single [`Config`] value is built at process start from defaults,
//! environment variables and CLI flags, then passed to the credential
//! store and the HTTP client. Nothing in the crate reads paths or the
//! user agent from global state.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{ChpError, Result};

/// Name of the per-user configuration directory under `$HOME`.
///
/// Shared with earlier clients so an existing login keeps working.
pub const CONFIG_DIR_NAME: &str = ".cpk";

/// File name of the persisted credentials inside the config directory.
pub const CREDENTIALS_FILE_NAME: &str = "credentials.json";

/// Default per-request HTTP timeout in seconds.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// How long `chp login` waits for the browser redirect.
pub const CALLBACK_TIMEOUT_SECS: u64 = 120;

/// Process-wide configuration
///
/// # Examples
///
/// ```
/// use chp::config::Config;
///
/// let config = Config::with_config_dir("/tmp/chp-test");
/// assert!(config.credentials_file.ends_with("credentials.json"));
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the credentials file
    pub config_dir: PathBuf,
    /// Full path of the credentials file
    pub credentials_file: PathBuf,
    /// `User-Agent` header sent on every request
    pub user_agent: String,
    /// Per-request HTTP timeout
    pub http_timeout: Duration,
    /// Deadline for the OAuth redirect during login
    pub callback_timeout: Duration,
}

impl Config {
    /// Load configuration from defaults, environment and CLI flags
    ///
    /// Precedence is CLI flag, then environment variable, then default.
    ///
    /// # Errors
    ///
    /// Returns error if no home directory can be determined and no
    /// override was given.
    pub fn load(cli: &crate::cli::Cli) -> Result<Self> {
        let dir = match (&cli.config_dir, std::env::var_os("CHP_CONFIG_DIR")) {
            (Some(dir), _) => dir.clone(),
            (None, Some(dir)) => PathBuf::from(dir),
            (None, None) => default_config_dir()?,
        };

        let mut config = Self::with_config_dir(dir);
        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    /// Build a configuration rooted at an explicit directory
    ///
    /// Used by tests and by [`Config::load`] once the directory is resolved.
    pub fn with_config_dir<P: Into<PathBuf>>(dir: P) -> Self {
        let config_dir = dir.into();
        let credentials_file = config_dir.join(CREDENTIALS_FILE_NAME);
        Self {
            config_dir,
            credentials_file,
            user_agent: default_user_agent(),
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            callback_timeout: Duration::from_secs(CALLBACK_TIMEOUT_SECS),
        }
    }

    fn apply_env_vars(&mut self) {
        if let Ok(timeout) = std::env::var("CHP_HTTP_TIMEOUT_SECS") {
            match timeout.parse::<u64>() {
                Ok(v) => {
                    self.http_timeout = Duration::from_secs(v);
                    tracing::debug!(http_timeout_secs = v, "Env override: CHP_HTTP_TIMEOUT_SECS");
                }
                Err(_) => {
                    tracing::warn!("Invalid value for CHP_HTTP_TIMEOUT_SECS: {}", timeout);
                }
            }
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if cli.verbose {
            tracing::debug!(config_dir = %self.config_dir.display(), "Verbose mode enabled");
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns error if a timeout is zero or the config directory is empty.
    pub fn validate(&self) -> Result<()> {
        if self.config_dir.as_os_str().is_empty() {
            return Err(ChpError::Config("config directory cannot be empty".to_string()).into());
        }

        if self.http_timeout.is_zero() {
            return Err(
                ChpError::Config("http timeout must be greater than 0".to_string()).into(),
            );
        }

        if self.callback_timeout.is_zero() {
            return Err(
                ChpError::Config("callback timeout must be greater than 0".to_string()).into(),
            );
        }

        Ok(())
    }
}

fn default_user_agent() -> String {
    format!("chp-cli/{}", env!("CARGO_PKG_VERSION"))
}

fn default_config_dir() -> Result<PathBuf> {
    if let Some(base) = directories::BaseDirs::new() {
        return Ok(base.home_dir().join(CONFIG_DIR_NAME));
    }

    std::env::var_os("HOME")
        .map(|home| PathBuf::from(home).join(CONFIG_DIR_NAME))
        .ok_or_else(|| {
            ChpError::Config("Could not determine home directory".to_string()).into()
        })
}
