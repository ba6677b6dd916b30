use super::*;

impl GameEngine {
    /// Handles the first pursuer sharing the player's tile. Returns true
    /// when the collision ended the round.
    pub(super) fn resolve_pursuer_collisions(&mut self) -> bool {
        let player_pos = self.player.position;
        let Some(idx) = self
            .pursuers
            .iter()
            .position(|pursuer| pursuer.position == player_pos)
        else {
            return false;
        };

        if self.pursuers[idx].is_frightened() {
            let award = self.config.pursuer_award;
            self.player.score += award;
            self.stats.pursuers_eaten += 1;
            let house = self.capture_house_tile().unwrap_or(player_pos);
            let pursuer = &mut self.pursuers[idx];
            pursuer.send_home(house);
            debug!(pursuer = %pursuer.id, award, "pursuer eaten");
            self.events.push(RuntimeEvent::PursuerEaten {
                pursuer_id: pursuer.id.clone(),
                award,
            });
            return false;
        }

        let pursuer_id = self.pursuers[idx].id.clone();
        self.player.lives = self.player.lives.saturating_sub(1);
        self.events.push(RuntimeEvent::PlayerCaught {
            pursuer_id,
            lives_left: self.player.lives,
        });
        if self.player.lives == 0 {
            self.finish(GameOverReason::Caught);
            return true;
        }
        self.reset_after_life_lost();
        false
    }
}
