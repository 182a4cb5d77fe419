//! chp - Cherrypick CLI
//!
//! Main entry point: logging, interrupt handling and command dispatch.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use chp::cli::{Cli, Commands, ConfigCommand};
use chp::commands;
use chp::config::Config;
use chp::output;

#[tokio::main]
async fn main() {
    let cli = Cli::parse_args();
    init_tracing(cli.verbose);

    // An interrupt ends the process at once; the callback listener holds no
    // state worth shutting down cleanly.
    tokio::spawn(async {
        if tokio::signal::ctrl_c().await.is_ok() {
            println!();
            std::process::exit(130);
        }
    });

    if let Err(e) = run(cli).await {
        tracing::debug!(error = ?e, "command failed");
        output::error(&format!("Error: {e:#}"));
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load(&cli)?;
    config.validate()?;

    match cli.command {
        Commands::Login => {
            tracing::info!("Starting OAuth login");
            commands::run_login(&config).await
        }
        Commands::Logout => commands::run_logout(&config),
        Commands::Whoami => commands::run_whoami(&config).await,
        Commands::Config { command } => match command {
            ConfigCommand::Show => commands::run_config_show(&config),
            ConfigCommand::SetUrl { url } => commands::run_config_set_url(&config, &url),
        },
        Commands::Call {
            service,
            method,
            payload,
        } => commands::run_call(&config, &service, &method, payload.as_deref()).await,
    }
}

/// Initialize tracing/logging
///
/// Logs go to stderr so JSON on stdout stays machine-readable. `RUST_LOG`
/// wins over `--verbose`.
fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "chp=debug" } else { "chp=warn" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}
