//! Error types for the `hollowreach-core` crate.
//!
//! [`CoreError`] wraps every lower layer's error with `#[from]` so the
//! originating error survives, and classifies failures into transient
//! races, rejected preconditions and data-integrity faults.

use hollowreach_agents::AgentError;
use hollowreach_combat::CombatError;
use hollowreach_types::{ItemId, ObjectId, SpotId, ToolCategory};
use hollowreach_world::WorldError;

use crate::clock::ClockError;
use crate::config::ConfigError;

/// Errors raised by the simulation core.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Map or object operation failed.
    #[error(transparent)]
    World(#[from] WorldError),

    /// Skill, loadout or hitbox operation failed.
    #[error(transparent)]
    Combat(#[from] CombatError),

    /// Monster, status, loot or aggro operation failed.
    #[error(transparent)]
    Agent(#[from] AgentError),

    /// The world clock could not advance.
    #[error(transparent)]
    Clock(#[from] ClockError),

    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// No map is loaded for the spot.
    #[error("spot not loaded: {0}")]
    SpotNotLoaded(SpotId),

    /// The actor has no skill loadout.
    #[error("object {0} has no skill loadout")]
    NoLoadout(ObjectId),

    /// The actor does not belong to a player.
    #[error("object {0} is not a player character")]
    NotAPlayer(ObjectId),

    /// An interaction target is not next to the actor.
    #[error("object {target} is not adjacent to {actor}")]
    NotAdjacent {
        /// The acting object.
        actor: ObjectId,
        /// The out-of-reach target.
        target: ObjectId,
    },

    /// The actor offered an item it does not carry.
    #[error("object {actor} does not carry {item}")]
    ItemNotHeld {
        /// The acting object.
        actor: ObjectId,
        /// The missing item.
        item: ItemId,
    },

    /// Harvesting needs a tool the actor does not carry.
    #[error("object {actor} needs a {tool:?} tool")]
    MissingTool {
        /// The harvesting actor.
        actor: ObjectId,
        /// The required tool category.
        tool: ToolCategory,
    },

    /// Reference data is inconsistent.
    #[error("invalid catalog: {reason}")]
    InvalidCatalog {
        /// What is wrong.
        reason: String,
    },

    /// A collaborator is missing data that must exist. Aborts the unit of
    /// work.
    #[error("data integrity violation in {context}: {source}")]
    DataIntegrity {
        /// Where the violation was found.
        context: String,
        /// The underlying failure.
        source: Box<CoreError>,
    },

    /// A critical event handler failed.
    #[error("handler {handler} failed: {source}")]
    Handler {
        /// Handler name.
        handler: &'static str,
        /// The handler's error.
        source: Box<CoreError>,
    },

    /// A simulation tick failed and was rolled back.
    #[error("tick {tick} failed: {source}")]
    TickFailed {
        /// The tick that failed.
        tick: u64,
        /// What went wrong.
        source: Box<CoreError>,
    },

    /// Handlers kept emitting events past the per-tick limit.
    #[error("event budget of {limit} exceeded")]
    EventBudgetExceeded {
        /// The configured limit.
        limit: usize,
    },

    /// Arithmetic overflow during a checked operation.
    #[error("arithmetic overflow: {context}")]
    ArithmeticOverflow {
        /// Which calculation overflowed.
        context: String,
    },
}

impl CoreError {
    /// Wrap `source` as a data-integrity violation found in `context`.
    pub fn data_integrity(context: impl Into<String>, source: impl Into<Self>) -> Self {
        Self::DataIntegrity {
            context: context.into(),
            source: Box::new(source.into()),
        }
    }

    /// The innermost error behind handler and tick wrappers.
    pub fn root(&self) -> &Self {
        match self {
            Self::Handler { source, .. } | Self::TickFailed { source, .. } => source.root(),
            other => other,
        }
    }

    /// Whether the failure means something vanished between emission and
    /// handling. Such failures are logged and skipped.
    pub fn is_transient(&self) -> bool {
        matches!(
            self.root(),
            Self::SpotNotLoaded(_)
                | Self::World(WorldError::ObjectNotFound(_))
                | Self::Agent(AgentError::MonsterNotFound(_) | AgentError::NoMonsterForObject(_))
        )
    }

    /// Whether the failure is a rejected precondition: busy, cooldown,
    /// insufficient resources or an exceeded capacity.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self.root(),
            Self::World(WorldError::ActorBusy { .. })
                | Self::Combat(
                    CombatError::OnCooldown { .. }
                        | CombatError::InsufficientResource { .. }
                        | CombatError::CapacityExceeded { .. }
                        | CombatError::World(WorldError::ActorBusy { .. })
                )
                | Self::Agent(AgentError::InsufficientResource { .. } | AgentError::PlayerDowned(_))
        )
    }

    /// Whether the failure indicates corrupted data rather than a race.
    pub fn is_data_integrity(&self) -> bool {
        matches!(self.root(), Self::DataIntegrity { .. })
    }
}

#[cfg(test)]
mod tests {
    use hollowreach_types::{MonsterId, PlayerId, SkillId};

    use super::*;

    #[test]
    fn missing_objects_are_transient() {
        let err = CoreError::from(WorldError::ObjectNotFound(ObjectId::new()));
        assert!(err.is_transient());
        assert!(!err.is_data_integrity());
        let err = CoreError::from(AgentError::MonsterNotFound(MonsterId::new()));
        assert!(err.is_transient());
    }

    #[test]
    fn wrapped_integrity_faults_are_classified_through_wrappers() {
        let inner = CoreError::data_integrity(
            "death reward",
            AgentError::PlayerNotFound(PlayerId::new()),
        );
        let err = CoreError::TickFailed {
            tick: 4,
            source: Box::new(CoreError::Handler {
                handler: "death_reward",
                source: Box::new(inner),
            }),
        };
        assert!(err.is_data_integrity());
        assert!(!err.is_transient());
    }

    #[test]
    fn cooldowns_are_preconditions() {
        let err = CoreError::from(CombatError::OnCooldown {
            skill: SkillId::new("slash"),
            ready_at: 15,
        });
        assert!(err.is_precondition());
        assert!(!err.is_transient());
    }
}
