use crate::types::{Direction, PlayerView, Vec2};
use crate::world::TileMap;

/// The player-controlled agent. Input only ever sets `intended`; the turn is
/// taken on the first tick the tile that way is open.
#[derive(Clone, Debug)]
pub struct Player {
    pub position: Vec2,
    pub direction: Direction,
    pub intended: Direction,
    pub lives: u32,
    pub score: u32,
}

impl Player {
    pub fn new(spawn: Vec2, lives: u32) -> Self {
        Self {
            position: spawn,
            direction: Direction::None,
            intended: Direction::None,
            lives,
            score: 0,
        }
    }

    pub fn set_intended(&mut self, dir: Direction) {
        self.intended = dir;
    }

    pub fn respawn(&mut self, spawn: Vec2) {
        self.position = spawn;
        self.direction = Direction::None;
        self.intended = Direction::None;
    }

    /// Moves one tile. Returns the tile entered, if any. Running into a wall
    /// leaves the player stationary.
    pub fn step(&mut self, map: &TileMap) -> Option<Vec2> {
        if !self.intended.is_none() && map.step(self.position, self.intended).is_some() {
            self.direction = self.intended;
        }
        match map.step(self.position, self.direction) {
            Some(next) if next != self.position => {
                self.position = next;
                Some(next)
            }
            _ => {
                self.direction = Direction::None;
                None
            }
        }
    }

    pub fn to_view(&self) -> PlayerView {
        PlayerView {
            x: self.position.x,
            y: self.position.y,
            dir: self.direction,
            intended: self.intended,
            lives: self.lives,
            score: self.score,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::parse_test_map;

    fn maze() -> TileMap {
        parse_test_map(&[
            "1111111",
            "0000000",
            "1101011",
            "1100011",
            "1111111",
        ])
    }

    #[test]
    fn buffered_turn_waits_for_an_opening() {
        let map = maze();
        let mut player = Player::new(Vec2::new(0, 1), 3);
        player.set_intended(Direction::Right);
        assert_eq!(player.step(&map), Some(Vec2::new(1, 1)));
        player.set_intended(Direction::Down);
        assert_eq!(player.step(&map), Some(Vec2::new(2, 1)));
        assert_eq!(player.direction, Direction::Right);
        assert_eq!(player.step(&map), Some(Vec2::new(2, 2)));
        assert_eq!(player.direction, Direction::Down);
    }

    #[test]
    fn hitting_a_wall_stops_the_player() {
        let map = maze();
        let mut player = Player::new(Vec2::new(2, 2), 3);
        player.set_intended(Direction::Down);
        assert_eq!(player.step(&map), Some(Vec2::new(2, 3)));
        assert_eq!(player.step(&map), None);
        assert_eq!(player.direction, Direction::None);
        assert_eq!(player.position, Vec2::new(2, 3));
    }

    #[test]
    fn player_tunnels_off_the_left_edge() {
        let map = maze();
        let mut player = Player::new(Vec2::new(0, 1), 3);
        player.set_intended(Direction::Left);
        assert_eq!(player.step(&map), Some(Vec2::new(6, 1)));
        assert_eq!(player.step(&map), Some(Vec2::new(5, 1)));
    }

    #[test]
    fn respawn_clears_both_directions() {
        let mut player = Player::new(Vec2::new(0, 1), 3);
        player.direction = Direction::Left;
        player.intended = Direction::Up;
        player.respawn(Vec2::new(4, 4));
        assert_eq!(player.position, Vec2::new(4, 4));
        assert!(player.direction.is_none() && player.intended.is_none());
    }
}
