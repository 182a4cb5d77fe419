//! Persisted credentials for the single local user
//!
//! The credentials file is a flat JSON object whose field names are shared
//! with earlier clients, so switching implementations never forces a new
//! login. Every field is optional and omitted from the file when empty.
//!
//! Loading never fails: a missing, unreadable or malformed file yields an
//! empty [`Credentials`], which callers treat as "not logged in".

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::{ChpError, Result};

/// API base URL used when no override is stored.
pub const DEFAULT_BASE_URL: &str = "https://alpha.lollipopai.com";

/// Seconds before the recorded expiry at which a token counts as expiring.
pub const EXPIRY_MARGIN_SECS: i64 = 60;

/// Stored authentication state
///
/// At most one of `oauth_access_token` and `jwt` is used for a request;
/// the OAuth token always wins when both are present.
///
/// # Examples
///
/// ```
/// use chp::auth::credentials::Credentials;
///
/// let creds = Credentials {
///     jwt: Some("legacy".to_string()),
///     oauth_access_token: Some("oauth".to_string()),
///     ..Default::default()
/// };
/// assert_eq!(creds.token().unwrap(), "oauth");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Override of the API base URL
    #[serde(default, skip_serializing_if = "is_blank")]
    pub base_url: Option<String>,

    /// Legacy static bearer token
    #[serde(default, skip_serializing_if = "is_blank")]
    pub jwt: Option<String>,

    /// OAuth access token
    #[serde(default, skip_serializing_if = "is_blank")]
    pub oauth_access_token: Option<String>,

    /// OAuth refresh token
    #[serde(default, skip_serializing_if = "is_blank")]
    pub oauth_refresh_token: Option<String>,

    /// Absolute expiry of the access token, in epoch seconds
    #[serde(default, skip_serializing_if = "is_unset")]
    pub oauth_expires_at: Option<i64>,

    /// Client identifier obtained through dynamic registration
    #[serde(default, skip_serializing_if = "is_blank")]
    pub oauth_client_id: Option<String>,
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, str::is_empty)
}

fn is_unset(value: &Option<i64>) -> bool {
    value.map_or(true, |v| v == 0)
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

impl Credentials {
    /// Returns the stored base URL, or [`DEFAULT_BASE_URL`].
    pub fn base_url(&self) -> &str {
        non_empty(&self.base_url).unwrap_or(DEFAULT_BASE_URL)
    }

    /// Returns the best available bearer token
    ///
    /// # Errors
    ///
    /// Returns [`ChpError::NotAuthenticated`] when neither an OAuth access
    /// token nor a legacy token is stored.
    pub fn token(&self) -> Result<&str> {
        non_empty(&self.oauth_access_token)
            .or_else(|| non_empty(&self.jwt))
            .ok_or_else(|| ChpError::NotAuthenticated.into())
    }

    /// Non-empty OAuth access token, if any.
    pub fn oauth_access_token(&self) -> Option<&str> {
        non_empty(&self.oauth_access_token)
    }

    /// Non-empty OAuth refresh token, if any.
    pub fn oauth_refresh_token(&self) -> Option<&str> {
        non_empty(&self.oauth_refresh_token)
    }

    /// Non-empty OAuth client identifier, if any.
    pub fn oauth_client_id(&self) -> Option<&str> {
        non_empty(&self.oauth_client_id)
    }

    /// Whether a legacy token is stored.
    pub fn has_jwt(&self) -> bool {
        non_empty(&self.jwt).is_some()
    }

    /// Returns `true` when the OAuth token is expired or about to expire
    ///
    /// Requires both an access token and a recorded expiry; the check uses a
    /// [`EXPIRY_MARGIN_SECS`] margin so a token does not lapse mid-request.
    ///
    /// # Examples
    ///
    /// ```
    /// use chp::auth::credentials::Credentials;
    ///
    /// let creds = Credentials {
    ///     oauth_access_token: Some("tok".to_string()),
    ///     oauth_expires_at: Some(1_000),
    ///     ..Default::default()
    /// };
    /// assert!(creds.is_oauth_token_expiring(950));
    /// assert!(!creds.is_oauth_token_expiring(900));
    /// ```
    pub fn is_oauth_token_expiring(&self, now: i64) -> bool {
        match (self.oauth_access_token(), self.oauth_expires_at) {
            (Some(_), Some(expires_at)) if expires_at > 0 => {
                now > expires_at - EXPIRY_MARGIN_SECS
            }
            _ => false,
        }
    }
}

/// File-backed store for [`Credentials`]
///
/// Assumes a single writer process; there is no file locking.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    /// Create a store for an explicit file path.
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    /// Create a store for the credentials file named by the configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.credentials_file.clone())
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored credentials
    ///
    /// Any failure (missing file, permission denied, malformed JSON) yields
    /// empty credentials.
    pub fn load(&self) -> Credentials {
        let data = match fs::read(&self.path) {
            Ok(data) => data,
            Err(e) => {
                tracing::debug!(path = %self.path.display(), error = %e, "no readable credentials");
                return Credentials::default();
            }
        };

        match serde_json::from_slice(&data) {
            Ok(creds) => creds,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "ignoring malformed credentials file");
                Credentials::default()
            }
        }
    }

    /// Persist credentials as indented JSON readable only by the owner
    ///
    /// The containing directory is created when missing.
    ///
    /// # Errors
    ///
    /// Returns error if the directory cannot be created or the file cannot
    /// be written.
    pub fn save(&self, creds: &Credentials) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            create_private_dir(parent).with_context(|| {
                format!("Failed to create config directory {}", parent.display())
            })?;
        }

        let data = serde_json::to_vec_pretty(creds).map_err(ChpError::Serialization)?;
        write_private(&self.path, &data)
            .with_context(|| format!("Failed to write credentials to {}", self.path.display()))?;

        tracing::debug!(path = %self.path.display(), "credentials saved");
        Ok(())
    }

    /// Remove the credentials file
    ///
    /// Returns `Ok(false)` when there was nothing to remove.
    ///
    /// # Errors
    ///
    /// Returns error for any failure other than the file being absent.
    pub fn delete(&self) -> Result<bool> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(ChpError::Io(e).into()),
        }
    }
}

#[cfg(unix)]
fn create_private_dir(dir: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;
    fs::DirBuilder::new().recursive(true).mode(0o700).create(dir)
}

#[cfg(not(unix))]
fn create_private_dir(dir: &Path) -> std::io::Result<()> {
    fs::create_dir_all(dir)
}

#[cfg(unix)]
fn write_private(path: &Path, data: &[u8]) -> std::io::Result<()> {
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    let mut file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    // mode() only applies on creation; tighten a pre-existing file too.
    file.set_permissions(fs::Permissions::from_mode(0o600))?;
    file.write_all(data)
}

#[cfg(not(unix))]
fn write_private(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let mut file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)?;
    file.write_all(data)
}
