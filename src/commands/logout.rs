//! `chp logout`

use crate::auth::CredentialStore;
use crate::config::Config;
use crate::error::Result;
use crate::output;

/// Delete the credentials file. Succeeds when it is already gone.
pub fn run_logout(config: &Config) -> Result<()> {
    let store = CredentialStore::from_config(config);

    if store.delete()? {
        output::success("Logged out. Credentials removed.");
    } else {
        output::info("No credentials found. Already logged out.");
    }
    Ok(())
}
