//! Error types for the `hollowreach-world` crate.
//!
//! All fallible operations in this crate return [`WorldError`] through the
//! standard [`Result`] type alias.

use hollowreach_types::{Coordinate, ObjectId, SpotId};
use rust_decimal::Decimal;

/// Errors that can occur during map and object operations.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// An object was not found on the map.
    #[error("object not found: {0}")]
    ObjectNotFound(ObjectId),

    /// An object with the same id is already on the map.
    #[error("duplicate object id: {0}")]
    DuplicateObject(ObjectId),

    /// No tile exists at the coordinate.
    #[error("tile not found at {0}")]
    TileNotFound(Coordinate),

    /// The requested step is not allowed.
    #[error("object {object} cannot move to {to}: {reason}")]
    InvalidMovement {
        /// The moving object.
        object: ObjectId,
        /// The rejected destination.
        to: Coordinate,
        /// Why the move was rejected.
        reason: String,
    },

    /// An object cannot be placed at the coordinate.
    #[error("cannot place object at {coordinate}: {reason}")]
    InvalidPlacement {
        /// The rejected cell.
        coordinate: Coordinate,
        /// Why the placement was rejected.
        reason: String,
    },

    /// The object is still busy from a previous action.
    #[error("object {object} is busy until tick {busy_until}")]
    ActorBusy {
        /// The busy object.
        object: ObjectId,
        /// First tick at which it may act again.
        busy_until: u64,
    },

    /// The object has no actor capabilities.
    #[error("object {0} is not an actor")]
    NotAnActor(ObjectId),

    /// The object is not the kind of thing the interaction expects.
    #[error("object {object} does not support {interaction}")]
    UnsupportedInteraction {
        /// The target object.
        object: ObjectId,
        /// The attempted interaction.
        interaction: &'static str,
    },

    /// The door is locked.
    #[error("door {0} is locked")]
    DoorLocked(ObjectId),

    /// The offered key does not fit.
    #[error("wrong key for door {0}")]
    WrongKey(ObjectId),

    /// The chest was already emptied.
    #[error("chest {0} was already opened")]
    ChestAlreadyOpened(ObjectId),

    /// Another actor is already harvesting the resource.
    #[error("resource {resource} is already being harvested by {harvester}")]
    HarvestInProgress {
        /// The resource node.
        resource: ObjectId,
        /// The actor currently harvesting.
        harvester: ObjectId,
    },

    /// Nothing left to harvest right now.
    #[error("resource {0} is depleted")]
    ResourceDepleted(ObjectId),

    /// The harvest cannot be completed yet.
    #[error("harvest of {resource} completes at tick {ready_at}")]
    HarvestNotReady {
        /// The resource node.
        resource: ObjectId,
        /// Tick at which the harvest may complete.
        ready_at: u64,
    },

    /// No harvest is running on the resource.
    #[error("no harvest in progress on {0}")]
    NoHarvestInProgress(ObjectId),

    /// A movement speed modifier must be strictly positive.
    #[error("invalid speed modifier {0}")]
    InvalidSpeedModifier(Decimal),

    /// A gateway points at a spot that is not loaded.
    #[error("gateway target spot not loaded: {0}")]
    SpotNotLoaded(SpotId),

    /// Arithmetic overflow during a checked operation.
    #[error("arithmetic overflow in world calculation")]
    ArithmeticOverflow,
}
