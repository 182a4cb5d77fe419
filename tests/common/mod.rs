use tempfile::TempDir;

use chp::auth::{CredentialStore, Credentials};
use chp::config::Config;
use chp::http::HttpClient;

/// Config rooted in a fresh temporary directory.
#[allow(dead_code)]
pub fn temp_config() -> (Config, TempDir) {
    let tmp = TempDir::new().expect("failed to create tempdir");
    let config = Config::with_config_dir(tmp.path().join(".cpk"));
    (config, tmp)
}

#[allow(dead_code)]
pub fn http_client(config: &Config) -> HttpClient {
    HttpClient::new(config).expect("failed to build http client")
}

/// Store with `creds` already written to disk.
#[allow(dead_code)]
pub fn seeded_store(config: &Config, creds: &Credentials) -> CredentialStore {
    let store = CredentialStore::from_config(config);
    store.save(creds).expect("failed to seed credentials");
    store
}

/// Successful token endpoint body.
#[allow(dead_code)]
pub fn token_body(access: &str, refresh: &str, expires_in: u64) -> serde_json::Value {
    serde_json::json!({
        "access_token": access,
        "refresh_token": refresh,
        "expires_in": expires_in,
        "token_type": "Bearer"
    })
}

/// Authorization server metadata with every endpoint under `base`.
#[allow(dead_code)]
pub fn server_metadata(base: &str) -> serde_json::Value {
    serde_json::json!({
        "issuer": base,
        "authorization_endpoint": format!("{base}/oauth/authorize"),
        "token_endpoint": format!("{base}/oauth/token"),
        "registration_endpoint": format!("{base}/oauth/register"),
        "scopes_supported": ["read", "write", "admin"],
        "response_types_supported": ["code"]
    })
}

/// Current time in epoch seconds.
#[allow(dead_code)]
pub fn now() -> i64 {
    chrono::Utc::now().timestamp()
}
