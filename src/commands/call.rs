//! `chp call` and `chp whoami`

use serde_json::Value;

use crate::auth::CredentialStore;
use crate::config::Config;
use crate::error::{ChpError, Result};
use crate::http::HttpClient;
use crate::output;
use crate::rpc::{qualify_service, RpcClient};

const USER_SERVICE: &str = "lollipop.proto.user.v1.UserV1";

/// Make a raw RPC call and print the JSON result
///
/// `payload`, when given, must be valid JSON.
pub async fn run_call(
    config: &Config,
    service: &str,
    method: &str,
    payload: Option<&str>,
) -> Result<()> {
    let payload = parse_payload(payload)?;
    let result = invoke(config, &qualify_service(service), method, payload.as_ref()).await?;
    output::print_json(&result);
    Ok(())
}

/// Print the profile of the logged-in user.
pub async fn run_whoami(config: &Config) -> Result<()> {
    let result = invoke(config, USER_SERVICE, "Current", None).await?;
    output::print_json(&result);
    Ok(())
}

async fn invoke(
    config: &Config,
    service: &str,
    method: &str,
    payload: Option<&Value>,
) -> Result<Value> {
    let http = HttpClient::new(config)?;
    let mut client = RpcClient::new(http, CredentialStore::from_config(config));
    client.call(service, method, payload).await
}

/// A literal `null` counts as no payload and is sent as `{}`.
fn parse_payload(raw: Option<&str>) -> Result<Option<Value>> {
    let parsed = raw
        .map(|text| {
            serde_json::from_str::<Value>(text).map_err(|e| {
                anyhow::Error::from(ChpError::InvalidInput(format!("Invalid JSON payload: {e}")))
            })
        })
        .transpose()?;
    Ok(parsed.filter(|value| !value.is_null()))
}
