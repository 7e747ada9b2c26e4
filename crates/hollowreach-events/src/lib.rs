//! Domain events and the in-process event queue for the Hollowreach
//! simulation.
//!
//! Every consequence of a tick or a player command is expressed as a
//! [`DomainEvent`]. Events are pushed onto an [`EventQueue`] owned by the
//! unit of work and drained synchronously by the dispatcher before the
//! triggering operation returns.
//!
//! # Modules
//!
//! - [`event`] -- The event enum and its kind discriminant
//! - [`queue`] -- Envelopes and the FIFO queue

pub mod event;
pub mod queue;

pub use event::{DomainEvent, EventKind};
pub use queue::{EventEnvelope, EventQueue};
