//! Biological needs that drive worker behaviour

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::core::config::SimulationConfig;
use crate::entity::tasks::TaskKind;

pub const NEED_MIN: f32 = 0.0;
pub const NEED_MAX: f32 = 100.0;

/// Need levels on a 0..=100 scale
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Needs {
    /// 0 = fed, 100 = starving
    pub hunger: f32,
    /// 0 = exhausted, 100 = fully rested
    pub energy: f32,
    /// 0 = miserable, 100 = content
    pub happiness: f32,
}

impl Default for Needs {
    fn default() -> Self {
        Self {
            hunger: 20.0,
            energy: 100.0,
            happiness: 80.0,
        }
    }
}

/// What a worker is doing, as far as need drift is concerned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NeedActivity {
    Idle,
    Active,
    Sleeping,
    Socializing,
}

/// A need past its critical threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CriticalNeed {
    Hunger,
    Energy,
    Happiness,
}

impl CriticalNeed {
    /// Task forced on a worker when this need turns critical
    pub fn override_task(&self) -> TaskKind {
        match self {
            CriticalNeed::Hunger => TaskKind::Eating,
            CriticalNeed::Energy => TaskKind::Sleeping,
            CriticalNeed::Happiness => TaskKind::Socializing,
        }
    }
}

impl Needs {
    pub fn from_config(config: &SimulationConfig) -> Self {
        Self {
            hunger: config.initial_hunger,
            energy: config.initial_energy,
            happiness: config.initial_happiness,
        }
        .clamped()
    }

    pub fn clamped(mut self) -> Self {
        self.clamp();
        self
    }

    /// Force every need into [0, 100]; NaN collapses to the minimum
    pub fn clamp(&mut self) {
        for value in [&mut self.hunger, &mut self.energy, &mut self.happiness] {
            *value = if value.is_nan() {
                NEED_MIN
            } else {
                value.clamp(NEED_MIN, NEED_MAX)
            };
        }
    }

    /// One scheduler step of need drift
    pub fn update<R: Rng + ?Sized>(
        &mut self,
        activity: NeedActivity,
        config: &SimulationConfig,
        rng: &mut R,
    ) {
        self.hunger += rng.gen_range(config.hunger_rise_min..config.hunger_rise_max);

        match activity {
            NeedActivity::Idle => {
                self.energy -= rng.gen_range(0.0..config.idle_energy_drain_max);
            }
            NeedActivity::Active | NeedActivity::Socializing => {
                self.energy -= rng
                    .gen_range(config.active_energy_drain_min..config.active_energy_drain_max);
            }
            NeedActivity::Sleeping => {
                self.energy +=
                    rng.gen_range(config.sleep_energy_gain_min..config.sleep_energy_gain_max);
            }
        }

        if self.hunger > config.unhappy_hunger_above {
            self.happiness -= config.unhappiness_step;
        }
        if self.energy < config.unhappy_energy_below {
            self.happiness -= config.unhappiness_step;
        }
        if activity == NeedActivity::Socializing {
            self.happiness += config.social_happiness_gain;
        }

        self.clamp();
    }

    /// First critical need in fixed priority: hunger, energy, happiness
    pub fn critical(&self, config: &SimulationConfig) -> Option<CriticalNeed> {
        if self.hunger > config.critical_hunger {
            return Some(CriticalNeed::Hunger);
        }
        if self.energy < config.critical_energy {
            return Some(CriticalNeed::Energy);
        }
        if self.happiness < config.critical_happiness {
            return Some(CriticalNeed::Happiness);
        }
        None
    }
}
