pub const TICK_MS: u64 = 200;
pub const TICKS_PER_UNIT: u32 = (1000 / TICK_MS) as u32;

pub const SCATTER_UNITS: u32 = 7;
pub const CHASE_UNITS: u32 = 20;
pub const FRIGHTENED_UNITS: u32 = 10;

pub const NORMAL_SPEED: f32 = 1.0;
pub const FRIGHTENED_SPEED: f32 = 0.5;

pub const STARTING_LIVES: u32 = 3;
pub const PELLET_SCORE: u32 = 10;
pub const POWER_PELLET_SCORE: u32 = 50;
pub const PURSUER_AWARD: u32 = 200;
pub const POWER_PELLETS_PER_ROUND: usize = 2;

pub const AMBUSH_LOOKAHEAD: i32 = 4;
pub const FLANKER_PIVOT_LOOKAHEAD: i32 = 2;
pub const CAUTIOUS_FLEE_RADIUS: f64 = 8.0;

/// Spawn used when a map has no pellet tile left to drop the player on.
pub const FALLBACK_SPAWN: (i32, i32) = (1, 1);
