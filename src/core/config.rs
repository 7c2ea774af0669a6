//! Simulation configuration with documented constants
//!
//! All tuning numbers live here. A config is owned by the `World` it drives;
//! there is no process-wide instance, so isolated simulations can run side by
//! side with different settings.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::error::{Result, SimError};

/// Configuration for the simulation systems
///
/// Needs are expressed on a 0..=100 scale. Hunger grows toward 100 (starving),
/// energy and happiness fall toward 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    // === NEED SYSTEM ===
    /// Needs are updated on ticks divisible by this interval
    ///
    /// At 1 the scheduler runs every tick. Larger values model a slower
    /// biological clock relative to movement.
    pub need_interval_ticks: u64,

    /// Hunger added per need update, drawn uniformly from [min, max)
    pub hunger_rise_min: f32,
    pub hunger_rise_max: f32,

    /// Energy lost per update while Idle, drawn from [0, max)
    pub idle_energy_drain_max: f32,

    /// Energy lost per update while moving or working, drawn from [min, max)
    pub active_energy_drain_min: f32,
    pub active_energy_drain_max: f32,

    /// Energy regained per update while sleeping, drawn from [min, max)
    pub sleep_energy_gain_min: f32,
    pub sleep_energy_gain_max: f32,

    /// Happiness drops when hunger is above this level
    pub unhappy_hunger_above: f32,

    /// Happiness drops when energy is below this level
    pub unhappy_energy_below: f32,

    /// Happiness lost per triggering condition
    pub unhappiness_step: f32,

    /// Happiness gained per update while socializing
    pub social_happiness_gain: f32,

    // === CRITICAL THRESHOLDS ===
    /// Hunger above this forces an Eating override
    ///
    /// Checked first: a starving worker eats before anything else.
    pub critical_hunger: f32,

    /// Energy below this forces a Sleeping override (checked second)
    pub critical_energy: f32,

    /// Happiness below this forces a Socializing override (checked last)
    pub critical_happiness: f32,

    // === TASK EXECUTION ===
    /// Quantity removed from a resource per harvest tick
    pub harvest_per_tick: u32,

    /// Construction progress added per build tick (progress is 0..=100)
    pub build_per_tick: f32,

    /// Hunger removed per eating tick
    pub eat_restore_per_tick: f32,

    /// Eating finishes once hunger is at or below this
    pub sated_hunger: f32,

    /// Sleeping finishes once energy is at or above this
    pub rested_energy: f32,

    /// Socializing finishes once happiness is at or above this
    pub content_happiness: f32,

    /// Socializing also finishes after this many ticks on site
    pub max_socialize_ticks: u32,

    /// Maximum Manhattan distance to a socializing partner
    pub social_radius: u32,

    /// Quantity regained per tick by regenerating resources
    pub resource_regen_per_tick: u32,

    // === MOVEMENT ===
    /// Ticks to wait after a failed path request before retrying
    pub path_retry_cooldown_ticks: u64,

    /// Failed path requests tolerated before the target is abandoned
    pub max_path_retries: u32,

    /// Ticks an abandoning worker stays out of planning
    pub abandon_cooldown_ticks: u64,

    // === DECISION ORACLE ===
    /// Ticks between oracle consultations for the same idle worker
    pub decision_cooldown_ticks: u64,

    /// Hard limit on a single oracle call
    pub oracle_timeout_ms: u64,

    // === WORKER DEFAULTS ===
    pub initial_hunger: f32,
    pub initial_energy: f32,
    pub initial_happiness: f32,

    /// Recent activity lines kept per worker for oracle prompts
    pub memory_capacity: usize,

    // === LOGGING ===
    /// Events retained by the in-memory activity log
    pub activity_log_capacity: usize,

    // === PARALLELIZATION ===
    /// Minimum number of path requests in a tick before using rayon
    pub parallel_threshold: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            need_interval_ticks: 1,
            hunger_rise_min: 1.0,
            hunger_rise_max: 3.0,
            idle_energy_drain_max: 0.5,
            active_energy_drain_min: 1.0,
            active_energy_drain_max: 3.0,
            sleep_energy_gain_min: 5.0,
            sleep_energy_gain_max: 10.0,
            unhappy_hunger_above: 70.0,
            unhappy_energy_below: 30.0,
            unhappiness_step: 2.0,
            social_happiness_gain: 3.0,

            critical_hunger: 80.0,
            critical_energy: 20.0,
            critical_happiness: 30.0,

            harvest_per_tick: 5,
            build_per_tick: 5.0,
            eat_restore_per_tick: 15.0,
            sated_hunger: 10.0,
            rested_energy: 90.0,
            content_happiness: 70.0,
            max_socialize_ticks: 20,
            social_radius: 5,
            resource_regen_per_tick: 1,

            path_retry_cooldown_ticks: 3,
            max_path_retries: 3,
            abandon_cooldown_ticks: 5,

            decision_cooldown_ticks: 10,
            oracle_timeout_ms: 5_000,

            initial_hunger: 20.0,
            initial_energy: 100.0,
            initial_happiness: 80.0,
            memory_capacity: 5,

            activity_log_capacity: 256,

            parallel_threshold: 64,
        }
    }
}

impl SimulationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a TOML document; absent keys keep their defaults
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: SimulationConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(SimError::InvalidConfig(msg));

        if self.need_interval_ticks == 0 {
            return invalid("need_interval_ticks must be at least 1".into());
        }

        let ranges = [
            ("hunger_rise", self.hunger_rise_min, self.hunger_rise_max),
            ("idle_energy_drain", 0.0, self.idle_energy_drain_max),
            (
                "active_energy_drain",
                self.active_energy_drain_min,
                self.active_energy_drain_max,
            ),
            (
                "sleep_energy_gain",
                self.sleep_energy_gain_min,
                self.sleep_energy_gain_max,
            ),
        ];
        for (name, min, max) in ranges {
            if min < 0.0 || max <= min {
                return invalid(format!("{name} range [{min}, {max}) is empty or negative"));
            }
        }

        let thresholds = [
            ("critical_hunger", self.critical_hunger),
            ("critical_energy", self.critical_energy),
            ("critical_happiness", self.critical_happiness),
            ("sated_hunger", self.sated_hunger),
            ("rested_energy", self.rested_energy),
            ("content_happiness", self.content_happiness),
            ("initial_hunger", self.initial_hunger),
            ("initial_energy", self.initial_energy),
            ("initial_happiness", self.initial_happiness),
        ];
        for (name, value) in thresholds {
            if !(0.0..=100.0).contains(&value) {
                return invalid(format!("{name} ({value}) must lie within [0, 100]"));
            }
        }

        // Recovery must end on the safe side of the threshold that started it
        if self.sated_hunger >= self.critical_hunger {
            return invalid(format!(
                "sated_hunger ({}) should be < critical_hunger ({})",
                self.sated_hunger, self.critical_hunger
            ));
        }
        if self.rested_energy <= self.critical_energy {
            return invalid(format!(
                "rested_energy ({}) should be > critical_energy ({})",
                self.rested_energy, self.critical_energy
            ));
        }
        if self.content_happiness <= self.critical_happiness {
            return invalid(format!(
                "content_happiness ({}) should be > critical_happiness ({})",
                self.content_happiness, self.critical_happiness
            ));
        }

        if self.harvest_per_tick == 0 || self.build_per_tick <= 0.0 || self.eat_restore_per_tick <= 0.0 {
            return invalid("work rates must be positive".into());
        }

        if self.max_path_retries == 0 {
            return invalid("max_path_retries must be at least 1".into());
        }

        Ok(())
    }
}
