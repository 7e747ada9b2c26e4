//! Engine binary for the Hollowreach simulation.
//!
//! Wires the configuration, the catalog, the world bootstrap and the
//! operator controls together, then drives the tick loop until a bound is
//! reached or the process is interrupted.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `hollowreach-config.yaml`
//! 2. Initialize structured logging (tracing)
//! 3. Load the built-in catalog
//! 4. Restore the last snapshot, or build and populate a fresh world
//! 5. Create operator state from the simulation bounds
//! 6. Stop on Ctrl-C
//! 7. Run the simulation loop
//! 8. Log the result

mod error;
mod spawner;

use std::path::Path;
use std::sync::Arc;

use hollowreach_core::catalog::Catalog;
use hollowreach_core::config::{HollowreachConfig, LoggingConfig};
use hollowreach_core::operator::OperatorState;
use hollowreach_core::persistence::{Snapshot, SnapshotCallback};
use hollowreach_core::runner::{self, NoOpCallback, TickCallback};
use hollowreach_core::simulation::{SimulationSettings, WorldSimulation};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;

/// Config file looked up in the working directory.
const CONFIG_PATH: &str = "hollowreach-config.yaml";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Load configuration.
    let (config, from_file) = load_config()?;

    // 2. Initialize structured logging.
    init_tracing(&config.logging);
    info!("hollowreach-engine starting");
    if !from_file {
        info!(path = CONFIG_PATH, "config file not found, using defaults");
    }
    info!(
        seed = config.world.seed,
        tick_interval_ms = config.simulation.tick_interval_ms,
        max_ticks = config.simulation.max_ticks,
        extra_spots = config.world.extra_spots.len(),
        "configuration loaded"
    );

    // 3. Load reference data.
    let catalog = Catalog::builtin().map_err(EngineError::from)?;
    info!(
        monster_templates = catalog.monsters.len(),
        "catalog loaded"
    );

    // 4. Restore or build the world.
    let mut simulation = load_or_build(&config, catalog)?;
    info!(
        tick = simulation.tick(),
        spots = simulation.repositories().maps.len(),
        players = simulation.repositories().statuses.len(),
        monsters = simulation.repositories().monsters.len(),
        "world ready"
    );

    // 5. Create operator state.
    let operator = Arc::new(OperatorState::new(&config.simulation));

    // 6. Stop cleanly on Ctrl-C.
    {
        let operator = Arc::clone(&operator);
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("interrupt received, stopping after the current tick");
                    operator.request_stop();
                }
                Err(e) => warn!(error = %e, "failed to listen for interrupts"),
            }
        });
    }

    // 7. Run the simulation.
    let mut callback: Box<dyn TickCallback> = match &config.persistence.snapshot_path {
        Some(path) => Box::new(SnapshotCallback::new(
            path.into(),
            config.persistence.snapshot_interval_ticks,
        )),
        None => Box::new(NoOpCallback),
    };
    let result = runner::run_simulation(&mut simulation, &operator, callback.as_mut())
        .await
        .map_err(EngineError::from)?;

    // 8. Log results.
    runner::log_simulation_end(&result);
    let repos = simulation.repositories();
    let status = operator
        .status(simulation.tick(), repos.statuses.len(), repos.monsters.len())
        .await;
    info!(
        tick = status.tick,
        elapsed_seconds = status.elapsed_seconds,
        players = status.players,
        monsters = status.monsters,
        "hollowreach-engine shutdown complete"
    );

    Ok(())
}

/// Load `hollowreach-config.yaml` from the working directory, falling back
/// to defaults when it does not exist. The flag tells whether the file was
/// read.
fn load_config() -> Result<(HollowreachConfig, bool), EngineError> {
    let path = Path::new(CONFIG_PATH);
    if path.exists() {
        Ok((HollowreachConfig::from_file(path)?, true))
    } else {
        Ok((HollowreachConfig::default(), false))
    }
}

/// `RUST_LOG` wins over the configured level.
fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(logging.level.as_str()));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Resume from the configured snapshot when one exists on disk.
fn load_or_build(
    config: &HollowreachConfig,
    catalog: Catalog,
) -> Result<WorldSimulation, EngineError> {
    let saved = config
        .persistence
        .snapshot_path
        .as_deref()
        .map(Path::new)
        .filter(|path| path.exists());
    if let Some(path) = saved {
        let snapshot = Snapshot::load(path)?;
        info!(path = %path.display(), tick = snapshot.tick, "resuming from snapshot");
        return Ok(snapshot.restore(catalog, SimulationSettings::from_config(config)));
    }
    let (simulation, report) = spawner::build_world(config, catalog)?;
    for (name, player) in &report.players {
        info!(name = name.as_str(), player = %player, "player registered");
    }
    Ok(simulation)
}
