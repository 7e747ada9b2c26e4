//! World clock for the Hollowreach simulation.
//!
//! The tick counter is the single source of truth for simulation time.
//! Weather rolls, cooldowns, busy windows, hitbox activation and aggro
//! memory are all expressed in ticks read from here.

/// Errors that can occur during clock operations.
#[derive(Debug, thiserror::Error)]
pub enum ClockError {
    /// Tick counter would overflow.
    #[error("tick counter overflow: cannot advance beyond u64::MAX")]
    TickOverflow,
}

/// Monotonic tick counter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorldClock {
    tick: u64,
}

impl WorldClock {
    /// A clock at tick 0.
    pub const fn new() -> Self {
        Self { tick: 0 }
    }

    /// A clock resumed at `tick` (used when restoring a snapshot).
    pub const fn from_tick(tick: u64) -> Self {
        Self { tick }
    }

    /// The last completed tick.
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// The tick that would run next, without advancing.
    pub fn peek_next(&self) -> Result<u64, ClockError> {
        self.tick.checked_add(1).ok_or(ClockError::TickOverflow)
    }

    /// Advance by one tick. Returns the new tick number.
    pub fn advance(&mut self) -> Result<u64, ClockError> {
        self.tick = self.peek_next()?;
        Ok(self.tick)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_increments_by_one() {
        let mut clock = WorldClock::new();
        assert!(matches!(clock.advance(), Ok(1)));
        assert!(matches!(clock.advance(), Ok(2)));
        assert_eq!(clock.tick(), 2);
    }

    #[test]
    fn peek_does_not_advance() {
        let clock = WorldClock::from_tick(9);
        assert!(matches!(clock.peek_next(), Ok(10)));
        assert_eq!(clock.tick(), 9);
    }

    #[test]
    fn overflow_is_an_error() {
        let mut clock = WorldClock::from_tick(u64::MAX);
        assert!(matches!(clock.advance(), Err(ClockError::TickOverflow)));
        assert_eq!(clock.tick(), u64::MAX);
    }
}
