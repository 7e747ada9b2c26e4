//! Error types for the engine binary.
//!
//! [`EngineError`] covers everything that can fail while bootstrapping a
//! world and running it, so `main` can propagate with `?`.

/// Top-level error for the engine binary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: hollowreach_core::config::ConfigError,
    },

    /// A simulation command or catalog load failed.
    #[error("core error: {source}")]
    Core {
        /// The underlying core error.
        #[from]
        source: hollowreach_core::error::CoreError,
    },

    /// Map construction failed.
    #[error("world error: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: hollowreach_world::WorldError,
    },

    /// The run loop ended on a failed tick.
    #[error("runner error: {source}")]
    Runner {
        /// The underlying runner error.
        #[from]
        source: hollowreach_core::runner::RunnerError,
    },

    /// A snapshot could not be loaded.
    #[error("persistence error: {source}")]
    Persistence {
        /// The underlying persistence error.
        #[from]
        source: hollowreach_core::persistence::PersistenceError,
    },

    /// The initial population could not be placed.
    #[error("spawner error: {message}")]
    Spawner {
        /// Description of the spawner failure.
        message: String,
    },
}
