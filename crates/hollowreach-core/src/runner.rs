//! Simulation run loop with operator controls.
//!
//! [`run_simulation`] drives [`WorldSimulation::run_tick`] until a limit
//! is hit or an operator stops it, with support for:
//!
//! - **Bounded runs**: stop after `max_ticks` or `max_real_time_seconds`
//! - **Pause/resume**: the loop parks between ticks while paused
//! - **Variable tick speed**: the interval is re-read every tick
//! - **Operator stop**: the inter-tick sleep is cut short

use std::sync::Arc;

use tokio::time::{Duration, sleep};
use tracing::{info, warn};

use crate::error::CoreError;
use crate::operator::{OperatorState, SimulationEndReason};
use crate::simulation::{TickSummary, WorldSimulation};

/// Errors that end a run abnormally.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// A tick failed and was rolled back.
    #[error("tick error: {source}")]
    Tick {
        /// The underlying failure.
        #[from]
        source: CoreError,
    },
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationResult {
    /// Why the loop stopped.
    pub end_reason: SimulationEndReason,
    /// Summary of the last tick that ran, if any did.
    pub final_summary: Option<TickSummary>,
    /// Ticks executed by this run.
    pub total_ticks: u64,
}

/// Called after every committed tick.
pub trait TickCallback: Send {
    /// Observe the tick that just committed.
    fn on_tick(&mut self, summary: &TickSummary, simulation: &WorldSimulation);
}

/// A callback that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpCallback;

impl TickCallback for NoOpCallback {
    fn on_tick(&mut self, _summary: &TickSummary, _simulation: &WorldSimulation) {}
}

/// Run ticks until a limit is reached or the operator stops the loop.
///
/// # Errors
///
/// Returns [`RunnerError::Tick`] when a tick fails. The failed tick was
/// rolled back, so the simulation still holds the last committed state.
pub async fn run_simulation(
    simulation: &mut WorldSimulation,
    operator: &Arc<OperatorState>,
    callback: &mut dyn TickCallback,
) -> Result<SimulationResult, RunnerError> {
    let mut last_summary: Option<TickSummary> = None;
    let mut total_ticks: u64 = 0;

    info!(
        start_tick = simulation.tick(),
        max_ticks = operator.max_ticks(),
        max_real_time_seconds = operator.max_real_time_seconds(),
        tick_interval_ms = operator.tick_interval_ms(),
        "simulation starting"
    );

    let end_reason = loop {
        if operator.is_paused() {
            info!("simulation paused, waiting for resume");
            operator.wait_if_paused().await;
            info!("simulation resumed");
        }

        if operator.is_stop_requested() {
            info!("operator stop requested");
            break SimulationEndReason::OperatorStop;
        }

        if operator.time_limit_reached() {
            info!(
                max_seconds = operator.max_real_time_seconds(),
                elapsed = operator.elapsed_seconds(),
                "real-time limit reached"
            );
            break SimulationEndReason::MaxRealTimeReached;
        }

        let summary = simulation.run_tick()?;
        total_ticks = total_ticks.saturating_add(1);
        callback.on_tick(&summary, simulation);
        last_summary = Some(summary);

        if operator.tick_limit_reached(summary.tick) {
            info!(
                tick = summary.tick,
                max_ticks = operator.max_ticks(),
                "tick limit reached"
            );
            break SimulationEndReason::MaxTicksReached;
        }

        let interval_ms = operator.tick_interval_ms();
        if interval_ms > 0 {
            tokio::select! {
                () = sleep(Duration::from_millis(interval_ms)) => {}
                () = operator.stopped() => {}
            }
        }
    };

    operator.set_end_reason(end_reason).await;
    Ok(SimulationResult {
        end_reason,
        final_summary: last_summary,
        total_ticks,
    })
}

/// Log how a run ended.
pub fn log_simulation_end(result: &SimulationResult) {
    info!(
        reason = ?result.end_reason,
        total_ticks = result.total_ticks,
        final_tick = result.final_summary.as_ref().map(|s| s.tick),
        "simulation ended"
    );
    if result.final_summary.is_none() {
        warn!("simulation ended with no ticks executed");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use hollowreach_types::{Climate, SpotId, TerrainType};
    use hollowreach_world::PhysicalMap;

    use super::*;
    use crate::catalog::Catalog;
    use crate::config::SimulationConfig;
    use crate::simulation::SimulationSettings;

    fn simulation() -> WorldSimulation {
        let mut sim =
            WorldSimulation::new(Catalog::builtin().unwrap(), SimulationSettings::default(), 3);
        let mut map = PhysicalMap::new(SpotId::new(), "field", Climate::Arid, 3);
        map.fill(4, 4, 0, TerrainType::Grass);
        sim.add_map(map);
        sim
    }

    fn operator(max_ticks: u64) -> Arc<OperatorState> {
        Arc::new(OperatorState::new(&SimulationConfig {
            tick_interval_ms: 0,
            max_ticks,
            max_real_time_seconds: 0,
        }))
    }

    #[tokio::test]
    async fn bounded_by_max_ticks() {
        let mut sim = simulation();
        let operator = operator(5);
        let result = run_simulation(&mut sim, &operator, &mut NoOpCallback)
            .await
            .unwrap();
        assert_eq!(result.end_reason, SimulationEndReason::MaxTicksReached);
        assert_eq!(result.total_ticks, 5);
        assert_eq!(sim.tick(), 5);
        assert_eq!(
            operator.end_reason().await,
            Some(SimulationEndReason::MaxTicksReached)
        );
    }

    #[tokio::test]
    async fn operator_stop_before_first_tick() {
        let mut sim = simulation();
        let operator = operator(0);
        operator.request_stop();
        let result = run_simulation(&mut sim, &operator, &mut NoOpCallback)
            .await
            .unwrap();
        assert_eq!(result.end_reason, SimulationEndReason::OperatorStop);
        assert_eq!(result.total_ticks, 0);
        assert!(result.final_summary.is_none());
    }

    #[tokio::test]
    async fn callback_sees_every_tick() {
        struct Counter {
            ticks: Vec<u64>,
        }
        impl TickCallback for Counter {
            fn on_tick(&mut self, summary: &TickSummary, simulation: &WorldSimulation) {
                assert_eq!(summary.tick, simulation.tick());
                self.ticks.push(summary.tick);
            }
        }

        let mut sim = simulation();
        let mut counter = Counter { ticks: Vec::new() };
        run_simulation(&mut sim, &operator(3), &mut counter)
            .await
            .unwrap();
        assert_eq!(counter.ticks, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn stop_cuts_the_sleep_short() {
        let mut sim = simulation();
        let operator = Arc::new(OperatorState::new(&SimulationConfig {
            tick_interval_ms: 60_000,
            max_ticks: 0,
            max_real_time_seconds: 0,
        }));
        let stopper = {
            let operator = Arc::clone(&operator);
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                operator.request_stop();
            })
        };
        let result = tokio::time::timeout(
            Duration::from_secs(5),
            run_simulation(&mut sim, &operator, &mut NoOpCallback),
        )
        .await
        .unwrap()
        .unwrap();
        stopper.await.unwrap();
        assert_eq!(result.end_reason, SimulationEndReason::OperatorStop);
        assert_eq!(result.total_ticks, 1);
    }
}
