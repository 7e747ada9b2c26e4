//! Transactional write scope over the repositories.
//!
//! A [`UnitOfWork`] starts from a clone of the committed
//! [`Repositories`]. Ticks and commands mutate the clone, emit domain events
//! into its queue and stage notifications in its outbox. [`commit`]
//! replaces the committed value wholesale; dropping the unit of work
//! without committing discards everything it did.
//!
//! [`commit`]: UnitOfWork::commit

use hollowreach_events::{DomainEvent, EventQueue};
use hollowreach_types::EventId;
use tracing::debug;

use crate::notification::Notification;
use crate::repository::Repositories;

/// A working copy of the repositories plus the events and notifications
/// produced against it.
#[derive(Debug)]
pub struct UnitOfWork {
    tick: u64,
    working: Repositories,
    events: EventQueue,
    outbox: Vec<Notification>,
}

impl UnitOfWork {
    /// Open a unit of work on a copy of `committed` for `tick`.
    pub fn begin(committed: &Repositories, tick: u64) -> Self {
        Self {
            tick,
            working: committed.clone(),
            events: EventQueue::new(),
            outbox: Vec::new(),
        }
    }

    /// The tick this unit of work runs on.
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// The working copy.
    pub const fn repos(&self) -> &Repositories {
        &self.working
    }

    /// The working copy, mutably.
    pub const fn repos_mut(&mut self) -> &mut Repositories {
        &mut self.working
    }

    /// Queue a domain event stamped with this unit's tick.
    pub fn emit(&mut self, event: DomainEvent) -> EventId {
        self.events.push(self.tick, event)
    }

    /// The pending event queue.
    pub const fn events_mut(&mut self) -> &mut EventQueue {
        &mut self.events
    }

    /// Number of events still waiting to be dispatched.
    pub fn pending_events(&self) -> usize {
        self.events.len()
    }

    /// Stage a notification for delivery after commit.
    pub fn notify(&mut self, notification: Notification) {
        self.outbox.push(notification);
    }

    /// Notifications staged so far.
    pub fn outbox(&self) -> &[Notification] {
        &self.outbox
    }

    /// Replace `committed` with the working copy and hand back the outbox.
    ///
    /// Undispatched events are discarded; callers drain the queue first.
    pub fn commit(self, committed: &mut Repositories) -> Vec<Notification> {
        let dropped = self.events.len();
        if dropped > 0 {
            debug!(tick = self.tick, dropped, "committing with undispatched events");
        }
        *committed = self.working;
        self.outbox
    }

    /// Discard the working copy. Equivalent to dropping it, with a log line.
    pub fn rollback(self) {
        debug!(
            tick = self.tick,
            events = self.events.emitted_total(),
            "unit of work rolled back"
        );
    }
}

#[cfg(test)]
mod tests {
    use hollowreach_types::{Coordinate, MonsterTemplateId, SpotId, Weather};

    use super::*;
    use crate::repository::PendingRespawn;

    fn respawn() -> PendingRespawn {
        PendingRespawn {
            template: MonsterTemplateId::new("slime"),
            spot: SpotId::new(),
            home: Coordinate::new(0, 0, 0),
            due_tick: 3,
        }
    }

    #[test]
    fn commit_replaces_committed_state() {
        let mut committed = Repositories::new();
        let mut uow = UnitOfWork::begin(&committed, 1);
        uow.repos_mut().respawns.push(respawn());
        assert!(committed.respawns.is_empty());
        uow.commit(&mut committed);
        assert_eq!(committed.respawns.len(), 1);
    }

    #[test]
    fn rollback_leaves_committed_state_alone() {
        let committed = Repositories::new();
        let mut uow = UnitOfWork::begin(&committed, 1);
        uow.repos_mut().respawns.push(respawn());
        uow.emit(DomainEvent::WeatherChanged {
            spot: SpotId::new(),
            from: Weather::Clear,
            to: Weather::Rain,
        });
        assert_eq!(uow.pending_events(), 1);
        uow.rollback();
        assert!(committed.respawns.is_empty());
    }
}
