//! Climate-weighted deterministic weather.
//!
//! Each spot re-rolls its weather every `change_interval` ticks. The
//! probability distribution depends on the spot's climate:
//!
//! | Weather  | Temperate | Arid | Tundra | Marsh |
//! |----------|-----------|------|--------|-------|
//! | Clear    | 40%       | 70%  | 20%    | 15%   |
//! | Rain     | 25%       |  5%  |  5%    | 30%   |
//! | Storm    | 10%       | 10%  | 10%    | 10%   |
//! | Fog      | 10%       |  0%  | 10%    | 35%   |
//! | Snow     |  0%       |  0%  | 40%    |  0%   |
//! | (repeat) | 15%       | 15%  | 15%    | 10%   |
//!
//! The "repeat" weight keeps the previous weather, giving natural streaks.
//!
//! # Determinism
//!
//! The roll uses an `xorshift64` generator seeded from `(seed, tick)`, so
//! the same seed and tick always produce the same weather.

use hollowreach_types::{Climate, Weather};
use serde::{Deserialize, Serialize};

/// Weighted weather entries for one climate. `None` means "repeat".
#[derive(Debug, Clone)]
struct ClimateWeights {
    entries: Vec<(Option<Weather>, u32)>,
}

impl ClimateWeights {
    fn for_climate(climate: Climate) -> Self {
        let entries = match climate {
            Climate::Temperate => vec![
                (Some(Weather::Clear), 40),
                (Some(Weather::Rain), 25),
                (Some(Weather::Storm), 10),
                (Some(Weather::Fog), 10),
                (Some(Weather::Snow), 0),
                (None, 15),
            ],
            Climate::Arid => vec![
                (Some(Weather::Clear), 70),
                (Some(Weather::Rain), 5),
                (Some(Weather::Storm), 10),
                (Some(Weather::Fog), 0),
                (Some(Weather::Snow), 0),
                (None, 15),
            ],
            Climate::Tundra => vec![
                (Some(Weather::Clear), 20),
                (Some(Weather::Rain), 5),
                (Some(Weather::Storm), 10),
                (Some(Weather::Fog), 10),
                (Some(Weather::Snow), 40),
                (None, 15),
            ],
            Climate::Marsh => vec![
                (Some(Weather::Clear), 15),
                (Some(Weather::Rain), 30),
                (Some(Weather::Storm), 10),
                (Some(Weather::Fog), 35),
                (Some(Weather::Snow), 0),
                (None, 10),
            ],
        };
        Self { entries }
    }

    fn select(&self, random_value: u32) -> Option<Weather> {
        let mut cumulative: u32 = 0;
        for &(weather, weight) in &self.entries {
            cumulative = cumulative.saturating_add(weight);
            if random_value < cumulative {
                return weather;
            }
        }
        Some(Weather::Clear)
    }

    fn total_weight(&self) -> u32 {
        self.entries
            .iter()
            .fold(0_u32, |acc, &(_, weight)| acc.saturating_add(weight))
    }
}

/// Deterministic per-spot weather generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeatherSystem {
    seed: u64,
    current: Weather,
}

impl WeatherSystem {
    /// Create a generator starting in clear weather.
    pub const fn new(seed: u64) -> Self {
        Self {
            seed,
            current: Weather::Clear,
        }
    }

    /// The weather right now.
    pub const fn current(&self) -> Weather {
        self.current
    }

    /// Force the current weather.
    pub const fn set_current(&mut self, weather: Weather) {
        self.current = weather;
    }

    /// The seed.
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Roll the weather for `tick`. Returns `(previous, new)` when it
    /// changed.
    pub fn generate(&mut self, tick: u64, climate: Climate) -> Option<(Weather, Weather)> {
        let weights = ClimateWeights::for_climate(climate);
        let total = weights.total_weight();
        if total == 0 {
            return None;
        }
        let random = deterministic_random(self.seed, tick);
        let remainder = random.checked_rem(u64::from(total)).unwrap_or(0);
        let roll = u32::try_from(remainder).unwrap_or(0);
        let next = weights.select(roll).unwrap_or(self.current);
        let previous = self.current;
        self.current = next;
        (previous != next).then_some((previous, next))
    }
}

/// `xorshift64` over a mix of seed and tick.
const fn deterministic_random(seed: u64, tick: u64) -> u64 {
    let mut state = seed.wrapping_add(tick.wrapping_mul(0x517c_c1b7_2722_0a95));
    if state == 0 {
        state = 0xdead_beef_cafe_babe;
    }
    state ^= state << 13;
    state ^= state >> 7;
    state ^= state << 17;
    state
}
