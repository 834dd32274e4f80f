//! # Netpad Server
//!
//! Receives gamepad events over TCP and injects them into per-client
//! virtual gamepads through uinput.
//!
//! # Exit Codes
//!
//! | Code | Meaning |
//! |------|---------|
//! | 0 | Stopped by SIGINT, SIGTERM or SIGABRT |
//! | 1 | uinput unavailable, or a device could not be created |
//! | 2 | Socket could not be opened |
//! | 3 | Bind failed |
//! | 4 | Listen failed |
//! | 5 | Listener failed while waiting for connections |
//! | 6 | Invalid configuration |

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use netpad::config::Config;
use netpad::device::UinputBackend;
use netpad::error::NetpadError;
use netpad::lifecycle::ShutdownSignals;
use netpad::protocol::TranslationTable;
use netpad::server::Server;

/// Remote gamepad server.
///
/// Every client connection gets its own virtual gamepad, which disappears
/// again when the client disconnects.
#[derive(Debug, Parser)]
#[command(name = "netpad-server", version)]
struct Cli {
    /// TCP port to listen on (0 keeps the configured port)
    port: Option<u16>,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// IP address to bind to
    #[arg(long)]
    bind: Option<String>,
}

impl Cli {
    fn into_config(self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)
                .with_context(|| format!("failed to load configuration from {}", path.display()))?,
            None => Config::default(),
        };

        if let Some(port) = self.port.filter(|&port| port != 0) {
            config.server.port = port;
        }
        if let Some(bind) = self.bind {
            config.server.bind_address = bind;
        }

        config.validate()?;
        Ok(config)
    }
}

async fn serve(config: Config) -> Result<()> {
    let mut signals = ShutdownSignals::register().context("failed to install signal handlers")?;

    let table = TranslationTable::new();
    let backend = UinputBackend::new(config.device.clone(), &table);

    let mut server = match Server::bind(&config, backend, table) {
        Ok(server) => server,
        Err(e @ NetpadError::Device(_)) => {
            return Err(e).context("failed to open the uinput device, is the module loaded?");
        }
        Err(e) => return Err(e.into()),
    };

    info!("Server running on port {}", server.local_addr().port());

    let result = server.run(signals.recv()).await;
    server.shutdown();
    result?;
    Ok(())
}

/// Exit code for a failure, looking through any added context
fn exit_code(err: &anyhow::Error) -> i32 {
    err.downcast_ref::<NetpadError>()
        .map_or(1, NetpadError::exit_code)
}

/// Filter from `RUST_LOG` directives, or `info` when unset or unparsable
fn log_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .filter(|d| !d.trim().is_empty())
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Initialize logging
    let directives = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(directives.as_deref()))
        .init();

    info!("Netpad v{} starting...", env!("CARGO_PKG_VERSION"));

    let cli = Cli::parse();
    let outcome = match cli.into_config() {
        Ok(config) => serve(config).await,
        Err(e) => Err(e),
    };

    let code = match outcome {
        Ok(()) => 0,
        Err(e) => {
            error!("{:#}", e);
            exit_code(&e)
        }
    };
    std::process::exit(code);
}
