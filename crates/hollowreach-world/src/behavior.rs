//! The autonomous behavior state machine.
//!
//! An [`AutonomousComponent`] wraps an [`ActorComponent`] with the state
//! the behavior layer needs between ticks: the current
//! [`BehaviorState`], vision range, patrol route, current target and its
//! last known position, a search countdown, an HP mirror, the flee
//! threshold and a movement failure counter.
//!
//! Transitions:
//!
//! | From           | Trigger                          | To                      |
//! |----------------|----------------------------------|-------------------------|
//! | Idle / Patrol  | target spotted, HP > threshold   | Chase                   |
//! | Idle / Patrol  | target spotted, HP <= threshold  | Flee                    |
//! | Search         | target spotted again             | Chase                   |
//! | Chase          | HP drops to threshold            | Flee                    |
//! | Chase          | sight lost                       | Search                  |
//! | Search         | countdown expires                | Patrol (route) / Return |
//! | Flee           | sight lost                       | Return                  |
//! | Return         | home reached                     | Patrol (route) / Idle   |
//! | any            | `max_failures` failed moves      | Return                  |
//!
//! Every transition resets the failure counter. Only Chase and Search keep
//! the search countdown. Entering anything but Chase or Flee drops the
//! current target.

use hollowreach_types::{BehaviorState, Coordinate, ObjectId};
use serde::{Deserialize, Serialize};

use crate::object::ActorComponent;

/// A state change reported back to the caller so it can emit an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    /// State before.
    pub from: BehaviorState,
    /// State after.
    pub to: BehaviorState,
}

/// Actor capabilities plus behavior-machine state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutonomousComponent {
    /// Embedded actor capabilities.
    pub actor: ActorComponent,
    state: BehaviorState,
    /// Vision range in cells.
    pub vision_range: u32,
    /// Waypoints walked in order while patrolling.
    pub patrol_route: Vec<Coordinate>,
    patrol_index: usize,
    target: Option<ObjectId>,
    last_known_position: Option<Coordinate>,
    search_timer: u32,
    hp_percentage: u32,
    /// HP percentage at or below which the object flees.
    pub flee_threshold: u32,
    failure_count: u32,
    /// Failed moves tolerated before giving up and returning home.
    pub max_failures: u32,
    /// Spawn position the object returns to.
    pub home: Coordinate,
}

impl AutonomousComponent {
    /// Create a component at full HP. Starts in Patrol when a route is
    /// given, otherwise Idle.
    pub fn new(
        actor: ActorComponent,
        home: Coordinate,
        vision_range: u32,
        patrol_route: Vec<Coordinate>,
        flee_threshold: u32,
        max_failures: u32,
    ) -> Self {
        let state = if patrol_route.is_empty() {
            BehaviorState::Idle
        } else {
            BehaviorState::Patrol
        };
        Self {
            actor,
            state,
            vision_range,
            patrol_route,
            patrol_index: 0,
            target: None,
            last_known_position: None,
            search_timer: 0,
            hp_percentage: 100,
            flee_threshold,
            failure_count: 0,
            max_failures,
            home,
        }
    }

    /// Current state.
    pub const fn state(&self) -> BehaviorState {
        self.state
    }

    /// Current target, if chasing or fleeing.
    pub const fn target(&self) -> Option<ObjectId> {
        self.target
    }

    /// Where the target was last seen.
    pub const fn last_known_position(&self) -> Option<Coordinate> {
        self.last_known_position
    }

    /// Remaining search ticks.
    pub const fn search_timer(&self) -> u32 {
        self.search_timer
    }

    /// Mirrored HP percentage of the authoritative aggregate.
    pub const fn hp_percentage(&self) -> u32 {
        self.hp_percentage
    }

    /// Consecutive failed moves.
    pub const fn failure_count(&self) -> u32 {
        self.failure_count
    }

    fn should_flee(&self) -> bool {
        self.hp_percentage <= self.flee_threshold
    }

    fn has_route(&self) -> bool {
        !self.patrol_route.is_empty()
    }

    fn transition(&mut self, to: BehaviorState) -> Option<Transition> {
        let from = self.state;
        self.failure_count = 0;
        if !matches!(to, BehaviorState::Chase | BehaviorState::Search) {
            self.search_timer = 0;
        }
        if !matches!(to, BehaviorState::Chase | BehaviorState::Flee) {
            self.target = None;
        }
        self.state = to;
        (from != to).then_some(Transition { from, to })
    }

    /// A target came into view at `position`.
    pub fn spot_target(&mut self, target: ObjectId, position: Coordinate) -> Option<Transition> {
        match self.state {
            BehaviorState::Idle | BehaviorState::Patrol => {
                let next = if self.should_flee() {
                    BehaviorState::Flee
                } else {
                    BehaviorState::Chase
                };
                let transition = self.transition(next);
                self.target = Some(target);
                self.last_known_position = Some(position);
                transition
            }
            BehaviorState::Search => {
                let transition = self.transition(BehaviorState::Chase);
                self.target = Some(target);
                self.last_known_position = Some(position);
                transition
            }
            BehaviorState::Chase | BehaviorState::Flee => {
                self.target = Some(target);
                self.last_known_position = Some(position);
                None
            }
            // Leashed: ignores targets until home.
            BehaviorState::Return => None,
        }
    }

    /// The current target is no longer visible.
    pub fn lose_sight(&mut self, search_ticks: u32) -> Option<Transition> {
        match self.state {
            BehaviorState::Chase => {
                let transition = self.transition(BehaviorState::Search);
                self.search_timer = search_ticks;
                transition
            }
            BehaviorState::Flee => self.transition(BehaviorState::Return),
            _ => None,
        }
    }

    /// Count one tick of searching down.
    pub fn tick_search(&mut self) -> Option<Transition> {
        if self.state != BehaviorState::Search {
            return None;
        }
        self.search_timer = self.search_timer.saturating_sub(1);
        if self.search_timer > 0 {
            return None;
        }
        if self.has_route() {
            self.transition(BehaviorState::Patrol)
        } else {
            self.transition(BehaviorState::Return)
        }
    }

    /// A move attempt failed.
    pub fn on_move_failed(&mut self) -> Option<Transition> {
        self.failure_count = self.failure_count.saturating_add(1);
        if self.failure_count >= self.max_failures {
            return self.transition(BehaviorState::Return);
        }
        None
    }

    /// A move attempt succeeded.
    pub const fn on_move_succeeded(&mut self) {
        self.failure_count = 0;
    }

    /// Reached home while returning.
    pub fn arrive_home(&mut self) -> Option<Transition> {
        if self.state != BehaviorState::Return {
            return None;
        }
        self.last_known_position = None;
        if self.has_route() {
            self.patrol_index = 0;
            self.transition(BehaviorState::Patrol)
        } else {
            self.transition(BehaviorState::Idle)
        }
    }

    /// Re-sync the HP mirror from the authoritative aggregate. A chasing
    /// object whose HP falls to the flee threshold starts fleeing from the
    /// same target.
    pub fn sync_hp(&mut self, hp_percentage: u32) -> Option<Transition> {
        self.hp_percentage = hp_percentage.min(100);
        if self.state == BehaviorState::Chase && self.should_flee() {
            return self.transition(BehaviorState::Flee);
        }
        None
    }

    /// The waypoint to head for from `position`, advancing past waypoints
    /// already reached.
    pub fn next_waypoint(&mut self, position: Coordinate) -> Option<Coordinate> {
        let len = self.patrol_route.len();
        if len == 0 {
            return None;
        }
        let current = *self.patrol_route.get(self.patrol_index.checked_rem(len)?)?;
        if current == position {
            self.patrol_index = self.patrol_index.checked_add(1)?.checked_rem(len)?;
        }
        self.patrol_route.get(self.patrol_index.checked_rem(len)?).copied()
    }
}

#[cfg(test)]
mod tests {
    use hollowreach_types::{MonsterId, Race};

    use super::*;

    fn component(route: Vec<Coordinate>) -> AutonomousComponent {
        AutonomousComponent::new(
            ActorComponent::monster(MonsterId::new(), Race::Goblin, 120),
            Coordinate::new(0, 0, 0),
            5,
            route,
            25,
            3,
        )
    }

    fn patrolling() -> AutonomousComponent {
        component(vec![Coordinate::new(0, 0, 0), Coordinate::new(3, 0, 0)])
    }

    #[test]
    fn initial_state_depends_on_route() {
        assert_eq!(component(Vec::new()).state(), BehaviorState::Idle);
        assert_eq!(patrolling().state(), BehaviorState::Patrol);
    }

    #[test]
    fn healthy_spotter_chases() {
        let mut fsm = component(Vec::new());
        let target = ObjectId::new();
        let t = fsm.spot_target(target, Coordinate::new(2, 0, 0));
        assert_eq!(
            t,
            Some(Transition {
                from: BehaviorState::Idle,
                to: BehaviorState::Chase
            })
        );
        assert_eq!(fsm.target(), Some(target));
    }

    #[test]
    fn wounded_spotter_flees_only_after_spotting() {
        let mut fsm = component(Vec::new());
        assert_eq!(fsm.sync_hp(10), None);
        assert_eq!(fsm.state(), BehaviorState::Idle);
        fsm.spot_target(ObjectId::new(), Coordinate::new(1, 0, 0));
        assert_eq!(fsm.state(), BehaviorState::Flee);
        assert!(fsm.target().is_some());
    }

    #[test]
    fn chase_turns_to_flee_when_hp_drops() {
        let mut fsm = component(Vec::new());
        let target = ObjectId::new();
        fsm.spot_target(target, Coordinate::new(1, 0, 0));
        let t = fsm.sync_hp(25);
        assert_eq!(t.map(|t| t.to), Some(BehaviorState::Flee));
        assert_eq!(fsm.target(), Some(target));
    }

    #[test]
    fn lost_chase_searches_then_patrols() {
        let mut fsm = patrolling();
        fsm.spot_target(ObjectId::new(), Coordinate::new(1, 0, 0));
        assert_eq!(fsm.lose_sight(2).map(|t| t.to), Some(BehaviorState::Search));
        assert_eq!(fsm.target(), None);
        assert_eq!(fsm.search_timer(), 2);
        assert_eq!(fsm.last_known_position(), Some(Coordinate::new(1, 0, 0)));
        assert_eq!(fsm.tick_search(), None);
        assert_eq!(fsm.tick_search().map(|t| t.to), Some(BehaviorState::Patrol));
        assert_eq!(fsm.search_timer(), 0);
    }

    #[test]
    fn lost_chase_without_route_returns() {
        let mut fsm = component(Vec::new());
        fsm.spot_target(ObjectId::new(), Coordinate::new(1, 0, 0));
        fsm.lose_sight(1);
        assert_eq!(fsm.tick_search().map(|t| t.to), Some(BehaviorState::Return));
    }

    #[test]
    fn search_resumes_chase_on_sighting() {
        let mut fsm = component(Vec::new());
        fsm.spot_target(ObjectId::new(), Coordinate::new(1, 0, 0));
        fsm.lose_sight(5);
        let t = fsm.spot_target(ObjectId::new(), Coordinate::new(2, 0, 0));
        assert_eq!(t.map(|t| t.to), Some(BehaviorState::Chase));
        assert_eq!(fsm.search_timer(), 5);
    }

    #[test]
    fn flee_losing_sight_returns() {
        let mut fsm = component(Vec::new());
        fsm.sync_hp(5);
        fsm.spot_target(ObjectId::new(), Coordinate::new(1, 0, 0));
        assert_eq!(fsm.lose_sight(3).map(|t| t.to), Some(BehaviorState::Return));
        assert_eq!(fsm.target(), None);
    }

    #[test]
    fn repeated_failures_force_return_and_reset_counter() {
        let mut fsm = component(Vec::new());
        fsm.spot_target(ObjectId::new(), Coordinate::new(1, 0, 0));
        assert_eq!(fsm.on_move_failed(), None);
        assert_eq!(fsm.on_move_failed(), None);
        assert_eq!(fsm.failure_count(), 2);
        assert_eq!(fsm.on_move_failed().map(|t| t.to), Some(BehaviorState::Return));
        assert_eq!(fsm.failure_count(), 0);
    }

    #[test]
    fn success_resets_failures() {
        let mut fsm = component(Vec::new());
        fsm.on_move_failed();
        fsm.on_move_succeeded();
        assert_eq!(fsm.failure_count(), 0);
    }

    #[test]
    fn every_transition_resets_failures() {
        let mut fsm = component(Vec::new());
        fsm.on_move_failed();
        fsm.spot_target(ObjectId::new(), Coordinate::new(1, 0, 0));
        assert_eq!(fsm.failure_count(), 0);
        fsm.on_move_failed();
        fsm.lose_sight(1);
        assert_eq!(fsm.failure_count(), 0);
    }

    #[test]
    fn returning_ignores_targets_until_home() {
        let mut fsm = patrolling();
        fsm.spot_target(ObjectId::new(), Coordinate::new(1, 0, 0));
        fsm.lose_sight(1);
        fsm.on_move_failed();
        fsm.on_move_failed();
        fsm.on_move_failed();
        assert_eq!(fsm.state(), BehaviorState::Return);
        assert_eq!(fsm.spot_target(ObjectId::new(), Coordinate::new(1, 0, 0)), None);
        assert_eq!(fsm.arrive_home().map(|t| t.to), Some(BehaviorState::Patrol));
    }

    #[test]
    fn waypoints_advance_when_reached() {
        let mut fsm = patrolling();
        assert_eq!(
            fsm.next_waypoint(Coordinate::new(0, 0, 0)),
            Some(Coordinate::new(3, 0, 0))
        );
        assert_eq!(
            fsm.next_waypoint(Coordinate::new(1, 0, 0)),
            Some(Coordinate::new(3, 0, 0))
        );
        assert_eq!(
            fsm.next_waypoint(Coordinate::new(3, 0, 0)),
            Some(Coordinate::new(0, 0, 0))
        );
    }
}
