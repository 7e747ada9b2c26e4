//! Event-kind handler registry and the synchronous drain loop.
//!
//! Handlers are plain function pointers registered against an
//! [`EventKind`]. [`Dispatcher::drain`] pops events from a unit of work's
//! queue in FIFO order and runs every handler registered for the event's
//! kind, in registration order. Events emitted by handlers join the back of
//! the same queue and are drained in the same call.
//!
//! A critical handler's failure aborts the drain and, with it, the unit of
//! work. A best-effort handler's failure is logged and ignored.

use std::collections::BTreeMap;

use hollowreach_agents::MemoryPolicy;
use hollowreach_events::{EventEnvelope, EventKind};
use rand::rngs::StdRng;
use tracing::{debug, trace, warn};

use crate::catalog::Catalog;
use crate::error::CoreError;
use crate::unit_of_work::UnitOfWork;

/// Read-only reference data and shared randomness available to handlers.
pub struct HandlerContext<'a> {
    /// Reference data.
    pub catalog: &'a Catalog,
    /// Seeded generator for loot rolls.
    pub rng: &'a mut StdRng,
    /// Aggro memory window.
    pub memory: MemoryPolicy,
}

/// Signature every handler has.
pub type Handler =
    for<'c> fn(&EventEnvelope, &mut UnitOfWork, &mut HandlerContext<'c>) -> Result<(), CoreError>;

/// Whether a handler's failure may abort the unit of work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Criticality {
    /// Failure aborts the drain and rolls the unit of work back.
    Critical,
    /// Failure is logged and the drain continues.
    BestEffort,
}

#[derive(Clone, Copy)]
struct Registration {
    name: &'static str,
    criticality: Criticality,
    handler: Handler,
}

/// Handlers keyed by event kind.
#[derive(Clone)]
pub struct Dispatcher {
    handlers: BTreeMap<EventKind, Vec<Registration>>,
    max_events: usize,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: BTreeMap<EventKind, Vec<&str>> = self
            .handlers
            .iter()
            .map(|(kind, regs)| (*kind, regs.iter().map(|r| r.name).collect()))
            .collect();
        f.debug_struct("Dispatcher")
            .field("handlers", &names)
            .field("max_events", &self.max_events)
            .finish()
    }
}

impl Dispatcher {
    /// An empty dispatcher that processes at most `max_events` events per
    /// drain.
    pub const fn new(max_events: usize) -> Self {
        Self {
            handlers: BTreeMap::new(),
            max_events,
        }
    }

    /// Register `handler` for `kind`. Handlers for the same kind run in
    /// registration order.
    pub fn register(
        &mut self,
        kind: EventKind,
        name: &'static str,
        criticality: Criticality,
        handler: Handler,
    ) {
        self.handlers.entry(kind).or_default().push(Registration {
            name,
            criticality,
            handler,
        });
    }

    /// Names of the handlers registered for `kind`, in run order.
    pub fn handler_names(&self, kind: EventKind) -> Vec<&'static str> {
        self.handlers
            .get(&kind)
            .map(|regs| regs.iter().map(|r| r.name).collect())
            .unwrap_or_default()
    }

    /// Drain `uow`'s queue, returning every processed envelope in order.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Handler`] when a critical handler fails with a
    /// non-transient error, and [`CoreError::EventBudgetExceeded`] when the
    /// queue does not empty within the event limit.
    pub fn drain(
        &self,
        uow: &mut UnitOfWork,
        ctx: &mut HandlerContext<'_>,
    ) -> Result<Vec<EventEnvelope>, CoreError> {
        let mut processed = Vec::new();
        while let Some(envelope) = uow.events_mut().pop() {
            if processed.len() >= self.max_events {
                return Err(CoreError::EventBudgetExceeded {
                    limit: self.max_events,
                });
            }
            let kind = envelope.event.kind();
            trace!(tick = envelope.tick, ?kind, "dispatching event");
            for registration in self.handlers.get(&kind).into_iter().flatten() {
                let Err(err) = (registration.handler)(&envelope, uow, ctx) else {
                    continue;
                };
                match registration.criticality {
                    Criticality::BestEffort => {
                        warn!(handler = registration.name, error = %err, "best-effort handler failed");
                    }
                    Criticality::Critical if err.is_transient() => {
                        debug!(handler = registration.name, error = %err, "target vanished, skipping");
                    }
                    Criticality::Critical => {
                        return Err(CoreError::Handler {
                            handler: registration.name,
                            source: Box::new(err),
                        });
                    }
                }
            }
            processed.push(envelope);
        }
        Ok(processed)
    }
}
