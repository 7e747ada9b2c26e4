//! Operator control state for runtime simulation management.
//!
//! Shared between the run loop and whatever drives it (the engine binary,
//! a signal handler, tests). The operator can pause and resume, change the
//! tick interval and request a clean stop without tearing the process
//! down.
//!
//! Control flags are atomics so the run loop reads them lock-free every
//! tick.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, Notify};

use crate::config::SimulationConfig;

/// Smallest tick interval an operator may set at runtime.
pub const MIN_TICK_INTERVAL_MS: u64 = 10;

/// Why the run loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimulationEndReason {
    /// Reached the configured `max_ticks`.
    MaxTicksReached,
    /// Reached the configured `max_real_time_seconds`.
    MaxRealTimeReached,
    /// An operator asked to stop.
    OperatorStop,
}

/// Shared operator control state.
#[derive(Debug)]
pub struct OperatorState {
    paused: AtomicBool,
    resume_notify: Notify,
    stop_requested: AtomicBool,
    stop_notify: Notify,
    tick_interval_ms: AtomicU64,
    started_at: DateTime<Utc>,
    max_ticks: u64,
    max_real_time_seconds: u64,
    end_reason: Mutex<Option<SimulationEndReason>>,
}

impl OperatorState {
    /// Control state seeded from the simulation section of the config.
    pub fn new(config: &SimulationConfig) -> Self {
        Self {
            paused: AtomicBool::new(false),
            resume_notify: Notify::new(),
            stop_requested: AtomicBool::new(false),
            stop_notify: Notify::new(),
            tick_interval_ms: AtomicU64::new(config.tick_interval_ms),
            started_at: Utc::now(),
            max_ticks: config.max_ticks,
            max_real_time_seconds: config.max_real_time_seconds,
            end_reason: Mutex::new(None),
        }
    }

    // -----------------------------------------------------------------------
    // Pause / Resume
    // -----------------------------------------------------------------------

    /// Whether the loop is paused.
    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }

    /// Pause after the current tick.
    pub fn pause(&self) {
        self.paused.store(true, Ordering::Release);
    }

    /// Resume and wake the loop.
    pub fn resume(&self) {
        self.paused.store(false, Ordering::Release);
        self.resume_notify.notify_one();
    }

    /// Wait until the loop is no longer paused or a stop was requested.
    pub async fn wait_if_paused(&self) {
        while self.is_paused() && !self.is_stop_requested() {
            self.resume_notify.notified().await;
        }
    }

    // -----------------------------------------------------------------------
    // Stop
    // -----------------------------------------------------------------------

    /// Ask the loop to stop before its next tick.
    pub fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::Release);
        self.resume_notify.notify_one();
        self.stop_notify.notify_one();
    }

    /// Whether a stop was requested.
    pub fn is_stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::Acquire)
    }

    /// Resolves once a stop is requested. Used to cut the inter-tick sleep
    /// short.
    pub async fn stopped(&self) {
        while !self.is_stop_requested() {
            self.stop_notify.notified().await;
        }
    }

    /// Record why the loop ended.
    pub async fn set_end_reason(&self, reason: SimulationEndReason) {
        *self.end_reason.lock().await = Some(reason);
    }

    /// Why the loop ended, if it has.
    pub async fn end_reason(&self) -> Option<SimulationEndReason> {
        *self.end_reason.lock().await
    }

    // -----------------------------------------------------------------------
    // Tick speed
    // -----------------------------------------------------------------------

    /// Current pause between ticks in milliseconds.
    pub fn tick_interval_ms(&self) -> u64 {
        self.tick_interval_ms.load(Ordering::Acquire)
    }

    /// Change the pause between ticks. Returns the previous interval, or
    /// `None` if `ms` is below [`MIN_TICK_INTERVAL_MS`].
    pub fn set_tick_interval_ms(&self, ms: u64) -> Option<u64> {
        if ms < MIN_TICK_INTERVAL_MS {
            return None;
        }
        Some(self.tick_interval_ms.swap(ms, Ordering::AcqRel))
    }

    // -----------------------------------------------------------------------
    // Boundaries
    // -----------------------------------------------------------------------

    /// Whether `current_tick` reached a non-zero `max_ticks`.
    pub const fn tick_limit_reached(&self, current_tick: u64) -> bool {
        self.max_ticks > 0 && current_tick >= self.max_ticks
    }

    /// Whether a non-zero wall-clock limit has passed.
    pub fn time_limit_reached(&self) -> bool {
        self.max_real_time_seconds > 0 && self.elapsed_seconds() >= self.max_real_time_seconds
    }

    /// When the loop was created.
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Whole seconds since start.
    pub fn elapsed_seconds(&self) -> u64 {
        let elapsed = Utc::now()
            .signed_duration_since(self.started_at)
            .num_seconds();
        u64::try_from(elapsed.max(0)).unwrap_or(u64::MAX)
    }

    /// Configured tick limit (0 = unlimited).
    pub const fn max_ticks(&self) -> u64 {
        self.max_ticks
    }

    /// Configured wall-clock limit (0 = unlimited).
    pub const fn max_real_time_seconds(&self) -> u64 {
        self.max_real_time_seconds
    }

    /// A serializable view of the control state.
    pub async fn status(&self, tick: u64, players: usize, monsters: usize) -> SimulationStatus {
        SimulationStatus {
            tick,
            paused: self.is_paused(),
            stop_requested: self.is_stop_requested(),
            tick_interval_ms: self.tick_interval_ms(),
            elapsed_seconds: self.elapsed_seconds(),
            max_ticks: self.max_ticks,
            max_real_time_seconds: self.max_real_time_seconds,
            players,
            monsters,
            end_reason: self.end_reason().await,
            started_at: self.started_at.to_rfc3339(),
        }
    }
}

/// Serializable status of the run loop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationStatus {
    /// Last completed tick.
    pub tick: u64,
    /// Whether the loop is paused.
    pub paused: bool,
    /// Whether a stop was requested.
    pub stop_requested: bool,
    /// Pause between ticks in milliseconds.
    pub tick_interval_ms: u64,
    /// Seconds since start.
    pub elapsed_seconds: u64,
    /// Tick limit (0 = unlimited).
    pub max_ticks: u64,
    /// Wall-clock limit (0 = unlimited).
    pub max_real_time_seconds: u64,
    /// Registered players.
    pub players: usize,
    /// Live monsters.
    pub monsters: usize,
    /// Why the loop ended, if it has.
    pub end_reason: Option<SimulationEndReason>,
    /// RFC 3339 start time.
    pub started_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds(max_ticks: u64) -> SimulationConfig {
        SimulationConfig {
            tick_interval_ms: 500,
            max_ticks,
            max_real_time_seconds: 0,
        }
    }

    #[test]
    fn initial_state_is_running() {
        let state = OperatorState::new(&bounds(0));
        assert!(!state.is_paused());
        assert!(!state.is_stop_requested());
        assert_eq!(state.tick_interval_ms(), 500);
    }

    #[test]
    fn pause_and_resume() {
        let state = OperatorState::new(&bounds(0));
        state.pause();
        assert!(state.is_paused());
        state.resume();
        assert!(!state.is_paused());
    }

    #[test]
    fn interval_below_minimum_is_rejected() {
        let state = OperatorState::new(&bounds(0));
        assert_eq!(state.set_tick_interval_ms(2), None);
        assert_eq!(state.set_tick_interval_ms(250), Some(500));
        assert_eq!(state.tick_interval_ms(), 250);
    }

    #[test]
    fn zero_limits_mean_unlimited() {
        let state = OperatorState::new(&bounds(0));
        assert!(!state.tick_limit_reached(999_999));
        assert!(!state.time_limit_reached());
    }

    #[test]
    fn tick_limit_is_inclusive() {
        let state = OperatorState::new(&bounds(100));
        assert!(!state.tick_limit_reached(99));
        assert!(state.tick_limit_reached(100));
    }

    #[tokio::test]
    async fn stop_wakes_a_paused_loop() {
        let state = std::sync::Arc::new(OperatorState::new(&bounds(0)));
        state.pause();
        let waiter = {
            let state = std::sync::Arc::clone(&state);
            tokio::spawn(async move { state.wait_if_paused().await })
        };
        state.request_stop();
        assert!(waiter.await.is_ok());
        state.stopped().await;
    }

    #[tokio::test]
    async fn status_reports_end_reason() {
        let state = OperatorState::new(&bounds(0));
        state.set_end_reason(SimulationEndReason::OperatorStop).await;
        let status = state.status(12, 2, 3).await;
        assert_eq!(status.tick, 12);
        assert_eq!(status.end_reason, Some(SimulationEndReason::OperatorStop));
        assert_eq!(status.monsters, 3);
    }
}
