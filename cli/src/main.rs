//! `stayhub-service` binary.
//!
//! ```sh
//! stayhub-service                                  # ~/.config/stayhub/config.toml
//! stayhub-service --config /etc/stayhub/config.toml
//! stayhub-service --check                          # validate and exit
//! ```

use std::path::{Path, PathBuf};

use clap::Parser;
use tracing::{info, warn};

use stayhub::config::{AppConfig, ConfigError};
use stayhub::server::{init_tracing, ServerHandle, ServerOptions};

#[derive(Parser, Debug)]
#[command(
    name = "stayhub-service",
    version,
    about = "Reservation and payment service for the StayHub rental marketplace"
)]
struct Cli {
    /// Configuration file (TOML). Missing files fall back to defaults.
    #[arg(short, long, env = "STAYHUB_CONFIG")]
    config: Option<PathBuf>,

    /// REST API port, overriding the file.
    #[arg(long)]
    api_port: Option<u16>,

    /// trace, debug, info, warn or error
    #[arg(short, long)]
    log_level: Option<String>,

    /// Validate the configuration, print a summary and exit.
    #[arg(long)]
    check: bool,

    /// Do not run database migrations on startup.
    #[arg(long)]
    no_migrate: bool,
}

impl Cli {
    fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
        if let Some(port) = self.api_port {
            config.server.api_port = port;
        }
    }
}

fn print_summary(path: &Path, config: &AppConfig) {
    let email = config.email.smtp_host.as_deref().unwrap_or("log only");
    println!("Configuration OK ({})", path.display());
    println!("  listen    {}", config.server.address());
    println!("  database  {}", config.database.url);
    println!("  currency  {}", config.payments.currency);
    println!("  email     {email}");
    println!("  log level {}", config.logging.level);
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let path = cli.config.clone().unwrap_or_else(stayhub::default_config_path);

    let loaded: Result<AppConfig, ConfigError> = AppConfig::load(&path);
    let mut config = loaded.as_ref().cloned().unwrap_or_default();
    cli.apply_overrides(&mut config);
    init_tracing(&config);

    match &loaded {
        Ok(_) => info!(path = %path.display(), "configuration loaded"),
        Err(err) => warn!(path = %path.display(), error = %err, "using default configuration"),
    }

    if cli.check {
        config.validate()?;
        print_summary(&path, &config);
        return Ok(());
    }

    let handle = ServerHandle::start(ServerOptions {
        config,
        auto_migrate: !cli.no_migrate,
    })
    .await?;
    handle.install_signal_handler();
    handle.wait().await;

    info!("stayhub-service stopped");
    Ok(())
}
