use rand::Rng;

use super::*;
use crate::constants::FALLBACK_SPAWN;

/// Spawn slots relative to the middle house tile, in creation order.
const HOUSE_SLOTS: [(Personality, isize); 4] = [
    (Personality::Direct, 0),
    (Personality::Ambush, -1),
    (Personality::Cautious, 1),
    (Personality::Flanker, 2),
];

impl GameEngine {
    /// Creates a pursuer for every slot that lands on an existing house tile.
    pub(super) fn spawn_pursuers(&mut self) {
        self.pursuers.clear();
        let house = self.map.house_tiles();
        let mid = (house.len() / 2) as isize;
        let mode = self.mode_timer.current();
        for (personality, offset) in HOUSE_SLOTS {
            let Some(&spawn) = usize::try_from(mid + offset)
                .ok()
                .and_then(|index| house.get(index))
            else {
                debug!(personality = personality.label(), "no house tile for pursuer");
                continue;
            };
            let id = self.make_id(personality.label());
            self.pursuers
                .push(Pursuer::new(id, personality, spawn, mode));
        }
    }

    /// Where captured pursuers are sent.
    pub(super) fn capture_house_tile(&self) -> Option<Vec2> {
        let house = self.map.house_tiles();
        house.get(house.len() / 2).copied()
    }

    /// Random pellet tile, cleared without scoring. Falls back to a fixed
    /// tile when the map has no pellets left.
    pub(super) fn pick_player_spawn(&mut self) -> Vec2 {
        let candidates = self.map.cells_matching(|tile| tile == Tile::Pellet);
        if candidates.is_empty() {
            let (x, y) = FALLBACK_SPAWN;
            return Vec2::new(x, y);
        }
        let spawn = candidates[self.rng.random_range(0..candidates.len())];
        self.map.set_tile(spawn, Tile::Empty);
        spawn
    }

    pub(super) fn place_power_pellets(&mut self) {
        let mut candidates = self
            .map
            .cells_matching(|tile| matches!(tile, Tile::Pellet | Tile::Empty));
        for _ in 0..self.config.power_pellets_per_round {
            if candidates.is_empty() {
                break;
            }
            let pick = self.rng.random_range(0..candidates.len());
            let pos = candidates.swap_remove(pick);
            self.map.set_tile(pos, Tile::PowerPellet);
        }
    }

    /// A life lost with lives to spare: new spawn, fresh pursuers, both
    /// clocks restarted. Score and the map are kept.
    pub(super) fn reset_after_life_lost(&mut self) {
        let spawn = self.pick_player_spawn();
        self.player.respawn(spawn);
        self.mode_timer = ModeTimer::new(&self.config);
        self.frightened_timer = FrightenedTimer::new(&self.config);
        self.spawn_pursuers();
        debug!(
            tick = self.tick_counter,
            lives = self.player.lives,
            "player respawned"
        );
    }
}
