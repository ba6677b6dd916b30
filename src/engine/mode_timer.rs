use crate::config::SimulationConfig;
use crate::types::PursuerMode;

use super::pursuer::Pursuer;

/// Global Scatter/Chase clock. Counts ticks, switches on whole units.
#[derive(Clone, Debug)]
pub struct ModeTimer {
    current: PursuerMode,
    elapsed_units: u32,
    tick_count: u32,
    ticks_per_unit: u32,
    scatter_units: u32,
    chase_units: u32,
}

impl ModeTimer {
    pub fn new(config: &SimulationConfig) -> Self {
        Self {
            current: PursuerMode::Scatter,
            elapsed_units: 0,
            tick_count: 0,
            ticks_per_unit: config.ticks_per_unit.max(1),
            scatter_units: config.scatter_units,
            chase_units: config.chase_units,
        }
    }

    pub fn current(&self) -> PursuerMode {
        self.current
    }

    pub fn elapsed_units(&self) -> u32 {
        self.elapsed_units
    }

    /// Returns the new mode when this tick crossed a boundary.
    pub fn tick(&mut self) -> Option<PursuerMode> {
        self.tick_count += 1;
        if self.tick_count < self.ticks_per_unit {
            return None;
        }
        self.tick_count = 0;
        self.elapsed_units += 1;

        let (limit, next) = match self.current {
            PursuerMode::Chase => (self.chase_units, PursuerMode::Scatter),
            _ => (self.scatter_units, PursuerMode::Chase),
        };
        if self.elapsed_units < limit {
            return None;
        }
        self.elapsed_units = 0;
        self.current = next;
        Some(next)
    }
}

/// Countdown that overrides every pursuer's mode while it runs.
#[derive(Clone, Debug)]
pub struct FrightenedTimer {
    remaining: u32,
    tick_count: u32,
    ticks_per_unit: u32,
    duration: u32,
}

impl FrightenedTimer {
    pub fn new(config: &SimulationConfig) -> Self {
        Self {
            remaining: 0,
            tick_count: 0,
            ticks_per_unit: config.ticks_per_unit.max(1),
            duration: config.frightened_units,
        }
    }

    pub fn is_active(&self) -> bool {
        self.remaining > 0
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn duration(&self) -> u32 {
        self.duration
    }

    /// Restarts the countdown. The sub-unit tick counter keeps running if
    /// the timer was already active.
    pub fn activate(&mut self) {
        self.remaining = self.duration;
    }

    /// Returns true on the tick the countdown reaches zero.
    pub fn tick(&mut self) -> bool {
        if self.remaining == 0 {
            self.tick_count = 0;
            return false;
        }
        self.tick_count += 1;
        if self.tick_count < self.ticks_per_unit {
            return false;
        }
        self.tick_count = 0;
        self.remaining -= 1;
        self.remaining == 0
    }
}

/// Boundary broadcast: Frightened pursuers keep their mode.
pub fn broadcast_global_mode(pursuers: &mut [Pursuer], mode: PursuerMode) {
    for pursuer in pursuers.iter_mut().filter(|p| !p.is_frightened()) {
        pursuer.mode = mode;
    }
}

pub fn frighten_all(pursuers: &mut [Pursuer]) {
    for pursuer in pursuers.iter_mut() {
        pursuer.mode = PursuerMode::Frightened;
    }
}

/// Expiry hands every pursuer back to the global clock's current mode.
pub fn release_frightened(pursuers: &mut [Pursuer], mode: PursuerMode) {
    for pursuer in pursuers.iter_mut() {
        pursuer.mode = mode;
    }
}
