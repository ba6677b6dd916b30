use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::{
    CHASE_UNITS, FRIGHTENED_SPEED, FRIGHTENED_UNITS, PELLET_SCORE, POWER_PELLETS_PER_ROUND,
    POWER_PELLET_SCORE, PURSUER_AWARD, SCATTER_UNITS, STARTING_LIVES, TICKS_PER_UNIT, TICK_MS,
};
use crate::error::ConfigError;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SimulationConfig {
    pub tick_ms: u64,
    pub ticks_per_unit: u32,
    pub scatter_units: u32,
    pub chase_units: u32,
    pub frightened_units: u32,
    pub frightened_speed: f32,
    pub starting_lives: u32,
    pub pellet_score: u32,
    pub power_pellet_score: u32,
    pub pursuer_award: u32,
    pub power_pellets_per_round: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_ms: TICK_MS,
            ticks_per_unit: TICKS_PER_UNIT,
            scatter_units: SCATTER_UNITS,
            chase_units: CHASE_UNITS,
            frightened_units: FRIGHTENED_UNITS,
            frightened_speed: FRIGHTENED_SPEED,
            starting_lives: STARTING_LIVES,
            pellet_score: PELLET_SCORE,
            power_pellet_score: POWER_PELLET_SCORE,
            pursuer_award: PURSUER_AWARD,
            power_pellets_per_round: POWER_PELLETS_PER_ROUND,
        }
    }
}

impl SimulationConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        Ok(config.sanitized())
    }

    /// Zero-length clocks would never advance; floor them at one.
    pub fn sanitized(mut self) -> Self {
        self.tick_ms = self.tick_ms.max(1);
        self.ticks_per_unit = self.ticks_per_unit.max(1);
        self.scatter_units = self.scatter_units.max(1);
        self.chase_units = self.chase_units.max(1);
        self.frightened_units = self.frightened_units.max(1);
        if !self.frightened_speed.is_finite() || self.frightened_speed <= 0.0 {
            self.frightened_speed = FRIGHTENED_SPEED;
        }
        self.frightened_speed = self.frightened_speed.min(1.0);
        self.starting_lives = self.starting_lives.max(1);
        self
    }
}
