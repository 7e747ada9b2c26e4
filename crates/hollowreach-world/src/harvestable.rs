//! Harvestable resource nodes with lazy quantity recovery.
//!
//! A node stores the quantity it had at `base_tick` and recovers one unit
//! every `respawn_interval_ticks`. The current quantity is recomputed on
//! read from elapsed ticks, capped at `max_quantity`. Nothing runs in the
//! background; the stored fields change only when a harvest completes.

use hollowreach_types::{LootTableId, ObjectId, ToolCategory};
use serde::{Deserialize, Serialize};

use crate::error::WorldError;

/// A resource node that actors can harvest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarvestableComponent {
    /// Loot table rolled for every completed harvest.
    pub loot_table: LootTableId,
    /// Recovery ceiling.
    pub max_quantity: u32,
    /// Quantity at `base_tick`.
    pub quantity_at_base: u32,
    /// Tick the stored quantity was last persisted.
    pub base_tick: u64,
    /// Ticks per recovered unit. Zero disables recovery.
    pub respawn_interval_ticks: u64,
    /// Tool category needed to harvest, if any.
    pub required_tool: Option<ToolCategory>,
    /// Ticks a harvest takes.
    pub harvest_duration_ticks: u64,
    /// Actor currently harvesting.
    pub harvester: Option<ObjectId>,
    /// Tick the running harvest started.
    pub harvest_started_at: Option<u64>,
}

impl HarvestableComponent {
    /// A full node.
    pub const fn new(
        loot_table: LootTableId,
        max_quantity: u32,
        respawn_interval_ticks: u64,
        required_tool: Option<ToolCategory>,
        harvest_duration_ticks: u64,
    ) -> Self {
        Self {
            loot_table,
            max_quantity,
            quantity_at_base: max_quantity,
            base_tick: 0,
            respawn_interval_ticks,
            required_tool,
            harvest_duration_ticks,
            harvester: None,
            harvest_started_at: None,
        }
    }

    fn recovered_units(&self, tick: u64) -> u64 {
        if self.respawn_interval_ticks == 0 {
            return 0;
        }
        tick.saturating_sub(self.base_tick)
            .checked_div(self.respawn_interval_ticks)
            .unwrap_or(0)
    }

    /// Quantity available at `tick`.
    pub fn current_quantity(&self, tick: u64) -> u32 {
        let recovered = u32::try_from(self.recovered_units(tick)).unwrap_or(u32::MAX);
        self.quantity_at_base
            .saturating_add(recovered)
            .min(self.max_quantity)
    }

    /// Tick at which the running harvest completes.
    pub fn ready_at(&self) -> Option<u64> {
        self.harvest_started_at
            .map(|start| start.saturating_add(self.harvest_duration_ticks))
    }

    /// Begin a harvest by `harvester` at `tick`. Returns the completion
    /// tick.
    pub fn start_harvest(
        &mut self,
        resource: ObjectId,
        harvester: ObjectId,
        tick: u64,
    ) -> Result<u64, WorldError> {
        if let Some(current) = self.harvester {
            return Err(WorldError::HarvestInProgress {
                resource,
                harvester: current,
            });
        }
        if self.current_quantity(tick) == 0 {
            return Err(WorldError::ResourceDepleted(resource));
        }
        self.harvester = Some(harvester);
        self.harvest_started_at = Some(tick);
        tick.checked_add(self.harvest_duration_ticks)
            .ok_or(WorldError::ArithmeticOverflow)
    }

    /// Finish the running harvest at `tick`, persisting the decremented
    /// quantity. Returns the harvester.
    pub fn complete_harvest(
        &mut self,
        resource: ObjectId,
        tick: u64,
    ) -> Result<ObjectId, WorldError> {
        let harvester = self
            .harvester
            .ok_or(WorldError::NoHarvestInProgress(resource))?;
        let ready_at = self.ready_at().unwrap_or(tick);
        if tick < ready_at {
            return Err(WorldError::HarvestNotReady { resource, ready_at });
        }
        let available = self.current_quantity(tick);
        if available == 0 {
            self.cancel_harvest();
            return Err(WorldError::ResourceDepleted(resource));
        }

        // Keep partial recovery progress unless the node was already full.
        if available >= self.max_quantity {
            self.base_tick = tick;
        } else {
            let consumed = self
                .recovered_units(tick)
                .checked_mul(self.respawn_interval_ticks)
                .ok_or(WorldError::ArithmeticOverflow)?;
            self.base_tick = self
                .base_tick
                .checked_add(consumed)
                .ok_or(WorldError::ArithmeticOverflow)?;
        }
        self.quantity_at_base = available.saturating_sub(1);
        self.cancel_harvest();
        Ok(harvester)
    }

    /// Abort the running harvest without changing the quantity.
    pub const fn cancel_harvest(&mut self) {
        self.harvester = None;
        self.harvest_started_at = None;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]
mod tests {
    use super::*;

    fn node() -> HarvestableComponent {
        HarvestableComponent::new(LootTableId::new("oak"), 2, 10, None, 3)
    }

    #[test]
    fn harvest_takes_duration_and_decrements() {
        let mut oak = node();
        let id = ObjectId::new();
        let worker = ObjectId::new();
        assert_eq!(oak.start_harvest(id, worker, 5).unwrap(), 8);
        assert!(matches!(
            oak.complete_harvest(id, 7),
            Err(WorldError::HarvestNotReady { ready_at: 8, .. })
        ));
        assert_eq!(oak.complete_harvest(id, 8).unwrap(), worker);
        assert_eq!(oak.current_quantity(8), 1);
        assert!(oak.harvester.is_none());
    }

    #[test]
    fn second_harvester_is_rejected() {
        let mut oak = node();
        let id = ObjectId::new();
        oak.start_harvest(id, ObjectId::new(), 0).unwrap();
        assert!(matches!(
            oak.start_harvest(id, ObjectId::new(), 0),
            Err(WorldError::HarvestInProgress { .. })
        ));
    }

    #[test]
    fn quantity_recovers_lazily_and_caps() {
        let mut oak = node();
        let id = ObjectId::new();
        let worker = ObjectId::new();
        for tick in [0_u64, 3] {
            oak.start_harvest(id, worker, tick).unwrap();
            oak.complete_harvest(id, tick + 3).unwrap();
        }
        assert_eq!(oak.current_quantity(6), 0);
        assert!(matches!(
            oak.start_harvest(id, worker, 6),
            Err(WorldError::ResourceDepleted(_))
        ));
        // base_tick stays at 3 after the first completion from full.
        assert_eq!(oak.current_quantity(13), 1);
        assert_eq!(oak.current_quantity(23), 2);
        assert_eq!(oak.current_quantity(1_000), 2);
    }

    #[test]
    fn partial_recovery_progress_survives_a_harvest() {
        let mut oak = node();
        oak.quantity_at_base = 0;
        oak.base_tick = 0;
        let id = ObjectId::new();
        oak.start_harvest(id, ObjectId::new(), 12).unwrap();
        oak.complete_harvest(id, 15).unwrap();
        // One unit recovered at tick 10 and was consumed; the next arrives at 20.
        assert_eq!(oak.current_quantity(19), 0);
        assert_eq!(oak.current_quantity(20), 1);
    }
}
