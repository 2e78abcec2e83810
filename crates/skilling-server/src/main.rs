//! Skilling server binary.
//!
//! Wires the tick clock to the gathering engines and runs until Ctrl-C.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `skilling-config.yaml` (or defaults)
//! 2. Initialize structured logging (tracing)
//! 3. Load activity catalogs (configured directory or built-in tables)
//! 4. Create the player store and one engine per family
//! 5. Spawn configured bots
//! 6. Register the engines with the tick clock and start it
//! 7. Run the persist loop until shutdown

mod bots;
mod error;
mod persist;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;
use skilling_core::catalog::Catalogs;
use skilling_core::clock::TickClock;
use skilling_core::config::{LogFormat, LoggingConfig, SkillingConfig};
use skilling_core::services::Collaborators;
use skilling_core::system::{self, SkillingSystem};
use skilling_players::{PlayerDefaults, PlayerStore};
use tokio::sync::watch;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::error::ServerError;

/// Default configuration file, relative to the working directory.
const CONFIG_PATH: &str = "skilling-config.yaml";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = load_config().context("loading configuration")?;
    init_logging(&config.logging).context("initializing logging")?;

    info!(
        tick_interval_ms = config.server.tick_interval_ms,
        seed = config.server.seed,
        persist_interval_ms = config.server.persist_interval_ms,
        "skilling-server starting"
    );

    let catalogs = load_catalogs(&config).context("loading activity catalogs")?;

    let store = Arc::new(PlayerStore::new(PlayerDefaults {
        starting_level: config.players.starting_level,
        inventory_capacity: config.players.inventory_capacity,
    }));
    let mut engines = SkillingSystem::new(
        &catalogs,
        &Collaborators::from_store(&store),
        config.server.seed,
    );

    let bots = bots::spawn_bots(&config.bots, &store, &mut engines).context("spawning bots")?;
    info!(bots = bots.len(), "Engines ready");

    let shared = engines.into_shared();
    let clock = TickClock::new(config.server.tick_interval_ms)?;
    clock.register(system::tick_callback(Arc::clone(&shared)));
    clock.start()?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let persist_handle = tokio::spawn(persist::run(
        Arc::clone(&store),
        Duration::from_millis(config.server.persist_interval_ms),
        shutdown_rx,
    ));

    tokio::signal::ctrl_c()
        .await
        .context("waiting for shutdown signal")?;
    info!(tick = clock.tick(), "Shutdown requested");

    clock.stop();
    if shutdown_tx.send(true).is_err() {
        debug!("Persist loop already stopped");
    }
    persist_handle.await.context("joining persist loop")?;

    info!(
        tick = clock.tick(),
        players = store.len(),
        "skilling-server shutdown complete"
    );
    Ok(())
}

/// Load `skilling-config.yaml`, falling back to defaults (plus environment
/// overrides) when the file is absent.
fn load_config() -> Result<SkillingConfig, ServerError> {
    let path = Path::new(CONFIG_PATH);
    let config = if path.exists() {
        SkillingConfig::from_file(path)?
    } else {
        SkillingConfig::parse("")?
    };
    Ok(config)
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over the configured level when set.
fn init_logging(logging: &LoggingConfig) -> Result<(), ServerError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&logging.level).map_err(|e| ServerError::LogFilter {
            directive: logging.level.clone(),
            message: e.to_string(),
        })?,
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    match logging.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
    Ok(())
}

/// Load catalogs from the configured directory, or the built-in tables.
fn load_catalogs(config: &SkillingConfig) -> Result<Catalogs, ServerError> {
    let catalogs = match &config.catalogs.dir {
        Some(dir) => Catalogs::load_dir(dir)?,
        None => {
            info!("No catalog directory configured, using built-in tables");
            Catalogs::builtin()?
        }
    };
    Ok(catalogs)
}
