//! Command-line interface definition for chp
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for login, logout, configuration and raw RPC calls.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// chp - Cherrypick CLI
///
/// Sign in via OAuth in the browser and interact with the Cherrypick API.
#[derive(Parser, Debug, Clone)]
#[command(name = "chp")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Directory holding credentials.json (defaults to ~/.cpk)
    #[arg(long, global = true)]
    pub config_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for chp
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Sign in to Cherrypick via OAuth
    Login,

    /// Clear saved credentials
    Logout,

    /// Show current user profile
    Whoami,

    /// Configuration commands
    Config {
        /// Configuration subcommand
        #[command(subcommand)]
        command: ConfigCommand,
    },

    /// Make a raw Twirp RPC call
    ///
    /// The `lollipop.proto.` prefix is added to the service automatically.
    Call {
        /// Service path, e.g. `recipe.v1.RecipeV1`
        service: String,

        /// Method name, e.g. `Search`
        method: String,

        /// JSON payload, e.g. '{"query":"curry"}'
        payload: Option<String>,
    },
}

/// Configuration subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommand {
    /// Show current configuration
    Show,

    /// Set the base API URL
    SetUrl {
        /// New base URL (http or https)
        url: String,
    },
}

impl Cli {
    /// Parse command line arguments
    ///
    /// # Returns
    ///
    /// Returns the parsed CLI structure
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_login() {
        let cli = Cli::try_parse_from(["chp", "login"]).unwrap();
        assert!(matches!(cli.command, Commands::Login));
        assert!(!cli.verbose);
        assert!(cli.config_dir.is_none());
    }

    #[test]
    fn test_cli_parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["chp", "logout", "--verbose", "--config-dir", "/tmp/c"])
            .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.config_dir, Some(PathBuf::from("/tmp/c")));
    }

    #[test]
    fn test_cli_parse_config_set_url() {
        let cli = Cli::try_parse_from(["chp", "config", "set-url", "http://localhost:3000"])
            .unwrap();
        if let Commands::Config {
            command: ConfigCommand::SetUrl { url },
        } = cli.command
        {
            assert_eq!(url, "http://localhost:3000");
        } else {
            panic!("Expected config set-url command");
        }
    }

    #[test]
    fn test_cli_parse_call_with_payload() {
        let cli = Cli::try_parse_from([
            "chp",
            "call",
            "recipe.v1.RecipeV1",
            "Search",
            r#"{"query":"curry"}"#,
        ])
        .unwrap();
        if let Commands::Call {
            service,
            method,
            payload,
        } = cli.command
        {
            assert_eq!(service, "recipe.v1.RecipeV1");
            assert_eq!(method, "Search");
            assert_eq!(payload.as_deref(), Some(r#"{"query":"curry"}"#));
        } else {
            panic!("Expected Call command");
        }
    }

    #[test]
    fn test_cli_parse_call_without_payload() {
        let cli = Cli::try_parse_from(["chp", "call", "user.v1.UserV1", "Current"]).unwrap();
        assert!(matches!(cli.command, Commands::Call { payload: None, .. }));
    }

    #[test]
    fn test_cli_call_requires_method() {
        assert!(Cli::try_parse_from(["chp", "call", "user.v1.UserV1"]).is_err());
    }

    #[test]
    fn test_cli_requires_subcommand() {
        assert!(Cli::try_parse_from(["chp"]).is_err());
    }
}
