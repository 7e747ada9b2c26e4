//! Event envelopes and the FIFO queue drained by the dispatcher.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use hollowreach_types::EventId;
use serde::{Deserialize, Serialize};

use crate::event::DomainEvent;

/// A domain event stamped with its id, tick and wall-clock time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// Unique event id.
    pub id: EventId,
    /// Simulation tick the event was emitted on.
    pub tick: u64,
    /// Wall-clock emission time.
    pub emitted_at: DateTime<Utc>,
    /// The event itself.
    pub event: DomainEvent,
}

impl EventEnvelope {
    /// Wrap an event emitted at `tick`.
    pub fn new(tick: u64, event: DomainEvent) -> Self {
        Self {
            id: EventId::new(),
            tick,
            emitted_at: Utc::now(),
            event,
        }
    }
}

/// First-in first-out queue of pending events.
#[derive(Debug, Clone, Default)]
pub struct EventQueue {
    pending: VecDeque<EventEnvelope>,
    emitted_total: u64,
}

impl EventQueue {
    /// Create an empty queue.
    pub const fn new() -> Self {
        Self {
            pending: VecDeque::new(),
            emitted_total: 0,
        }
    }

    /// Enqueue an event emitted at `tick` and return its id.
    pub fn push(&mut self, tick: u64, event: DomainEvent) -> EventId {
        let envelope = EventEnvelope::new(tick, event);
        let id = envelope.id;
        self.pending.push_back(envelope);
        self.emitted_total = self.emitted_total.saturating_add(1);
        id
    }

    /// Take the oldest pending event.
    pub fn pop(&mut self) -> Option<EventEnvelope> {
        self.pending.pop_front()
    }

    /// Number of events waiting.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether no events are waiting.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Total number of events ever pushed onto this queue.
    pub const fn emitted_total(&self) -> u64 {
        self.emitted_total
    }

    /// Drop every pending event, returning how many were discarded.
    pub fn clear(&mut self) -> usize {
        let dropped = self.pending.len();
        self.pending.clear();
        dropped
    }
}

#[cfg(test)]
mod tests {
    use hollowreach_types::{SpotId, Weather};

    use super::*;

    fn weather_event() -> DomainEvent {
        DomainEvent::WeatherChanged {
            spot: SpotId::new(),
            from: Weather::Clear,
            to: Weather::Rain,
        }
    }

    #[test]
    fn queue_is_fifo() {
        let mut queue = EventQueue::new();
        let first = queue.push(1, weather_event());
        let second = queue.push(2, weather_event());
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.pop().map(|e| e.id), Some(first));
        assert_eq!(queue.pop().map(|e| e.id), Some(second));
        assert!(queue.is_empty());
        assert_eq!(queue.emitted_total(), 2);
    }

    #[test]
    fn clear_reports_dropped_events() {
        let mut queue = EventQueue::new();
        queue.push(1, weather_event());
        assert_eq!(queue.clear(), 1);
        assert!(queue.pop().is_none());
    }
}
