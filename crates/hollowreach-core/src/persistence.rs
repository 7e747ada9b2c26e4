//! JSON snapshots of the committed world state.
//!
//! A [`Snapshot`] captures the committed repositories, the clock and the
//! seed between ticks. Reference data is not part of it; a restored world
//! is rebuilt against the current catalog. Files are written to a sibling
//! temporary path and renamed into place so a crash never leaves a torn
//! snapshot behind.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::catalog::Catalog;
use crate::repository::Repositories;
use crate::runner::TickCallback;
use crate::simulation::{SimulationSettings, TickSummary, WorldSimulation};

/// Current snapshot layout version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Errors raised while saving or loading snapshots.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    /// Reading or writing the file failed.
    #[error("snapshot I/O error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// The snapshot could not be encoded or decoded.
    #[error("snapshot JSON error: {source}")]
    Json {
        /// The underlying serde error.
        #[from]
        source: serde_json::Error,
    },

    /// The file was written by an incompatible version.
    #[error("snapshot version {found} is not supported (expected {expected})")]
    UnsupportedVersion {
        /// Version in the file.
        found: u32,
        /// Version this build reads.
        expected: u32,
    },
}

/// The committed world at the end of a tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Layout version.
    pub version: u32,
    /// Last completed tick.
    pub tick: u64,
    /// Seed the world's randomness derives from.
    pub seed: u64,
    /// Wall-clock time of capture.
    pub saved_at: DateTime<Utc>,
    /// Committed state.
    pub repositories: Repositories,
}

impl Snapshot {
    /// Capture `simulation`'s committed state.
    pub fn capture(simulation: &WorldSimulation) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            tick: simulation.tick(),
            seed: simulation.seed(),
            saved_at: Utc::now(),
            repositories: simulation.repositories().clone(),
        }
    }

    /// Encode as JSON.
    pub fn to_json(&self) -> Result<String, PersistenceError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode from JSON, rejecting other layout versions.
    pub fn from_json(json: &str) -> Result<Self, PersistenceError> {
        let snapshot: Self = serde_json::from_str(json)?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(PersistenceError::UnsupportedVersion {
                found: snapshot.version,
                expected: SNAPSHOT_VERSION,
            });
        }
        Ok(snapshot)
    }

    /// Write to `path` atomically.
    pub fn save(&self, path: &Path) -> Result<(), PersistenceError> {
        let json = self.to_json()?;
        let staging = path.with_extension("json.tmp");
        fs::write(&staging, json)?;
        fs::rename(&staging, path)?;
        debug!(path = %path.display(), tick = self.tick, "snapshot saved");
        Ok(())
    }

    /// Read from `path`.
    pub fn load(path: &Path) -> Result<Self, PersistenceError> {
        let json = fs::read_to_string(path)?;
        let snapshot = Self::from_json(&json)?;
        info!(path = %path.display(), tick = snapshot.tick, "snapshot loaded");
        Ok(snapshot)
    }

    /// Rebuild a simulation from this snapshot.
    pub fn restore(self, catalog: Catalog, settings: SimulationSettings) -> WorldSimulation {
        WorldSimulation::restore(catalog, settings, self.seed, self.tick, self.repositories)
    }
}

/// Saves a snapshot every `interval` ticks.
#[derive(Debug, Clone)]
pub struct SnapshotCallback {
    path: PathBuf,
    interval: u64,
    saved: u64,
}

impl SnapshotCallback {
    /// Save to `path` every `interval` ticks. Zero disables saving.
    pub const fn new(path: PathBuf, interval: u64) -> Self {
        Self {
            path,
            interval,
            saved: 0,
        }
    }

    /// Snapshots written so far.
    pub const fn saved(&self) -> u64 {
        self.saved
    }
}

impl TickCallback for SnapshotCallback {
    fn on_tick(&mut self, summary: &TickSummary, simulation: &WorldSimulation) {
        if self.interval == 0 || summary.tick.checked_rem(self.interval) != Some(0) {
            return;
        }
        match Snapshot::capture(simulation).save(&self.path) {
            Ok(()) => self.saved = self.saved.saturating_add(1),
            Err(e) => warn!(path = %self.path.display(), error = %e, "snapshot failed"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use hollowreach_types::{Climate, Coordinate, SpotId, TerrainType};
    use hollowreach_world::PhysicalMap;

    use super::*;

    fn simulation() -> (WorldSimulation, SpotId) {
        let mut sim =
            WorldSimulation::new(Catalog::builtin().unwrap(), SimulationSettings::default(), 11);
        let spot = SpotId::new();
        let mut map = PhysicalMap::new(spot, "camp", Climate::Temperate, 11);
        map.fill(5, 5, 0, TerrainType::Grass);
        sim.add_map(map);
        sim.register_player("Ada", spot, Coordinate::new(1, 1, 0))
            .unwrap();
        (sim, spot)
    }

    #[test]
    fn json_preserves_the_committed_state() {
        let (mut sim, _) = simulation();
        sim.run_tick().unwrap();
        let snapshot = Snapshot::capture(&sim);
        let decoded = Snapshot::from_json(&snapshot.to_json().unwrap()).unwrap();
        assert_eq!(decoded, snapshot);

        let restored = decoded.restore(Catalog::builtin().unwrap(), SimulationSettings::default());
        assert_eq!(restored.tick(), 1);
        assert_eq!(restored.repositories(), sim.repositories());
    }

    #[test]
    fn other_versions_are_rejected() {
        let (sim, _) = simulation();
        let mut snapshot = Snapshot::capture(&sim);
        snapshot.version = 99;
        let json = serde_json::to_string(&snapshot).unwrap();
        assert!(matches!(
            Snapshot::from_json(&json),
            Err(PersistenceError::UnsupportedVersion { found: 99, .. })
        ));
    }

    #[test]
    fn callback_saves_on_its_interval() {
        let (mut sim, _) = simulation();
        let path = std::env::temp_dir().join(format!("hollowreach-{}.json", SpotId::new()));
        let mut callback = SnapshotCallback::new(path.clone(), 2);
        for _ in 0..4 {
            let summary = sim.run_tick().unwrap();
            callback.on_tick(&summary, &sim);
        }
        assert_eq!(callback.saved(), 2);
        let loaded = Snapshot::load(&path).unwrap();
        assert_eq!(loaded.tick, 4);
        fs::remove_file(&path).unwrap();
    }
}
