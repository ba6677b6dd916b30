use rand::Rng;

use crate::constants::NORMAL_SPEED;
use crate::types::{Direction, Personality, PursuerMode, PursuerView, Vec2};
use crate::world::{distance, TileMap};

use super::personality::TargetContext;

#[derive(Clone, Debug)]
pub struct Pursuer {
    pub id: String,
    pub personality: Personality,
    pub position: Vec2,
    pub previous: Vec2,
    pub direction: Direction,
    pub mode: PursuerMode,
    pub target: Vec2,
    scatter_anchor: Option<Vec2>,
    move_counter: f32,
}

impl Pursuer {
    pub fn new(id: String, personality: Personality, position: Vec2, mode: PursuerMode) -> Self {
        Self {
            id,
            personality,
            position,
            previous: position,
            direction: Direction::None,
            mode,
            target: position,
            scatter_anchor: None,
            move_counter: 0.0,
        }
    }

    pub fn is_frightened(&self) -> bool {
        self.mode == PursuerMode::Frightened
    }

    pub fn scatter_anchor(&self) -> Option<Vec2> {
        self.scatter_anchor
    }

    /// Resolves this tick's target from the current mode.
    pub fn update(&mut self, ctx: &TargetContext<'_>) {
        self.target = match self.mode {
            PursuerMode::Scatter => {
                self.scatter_anchor = self.personality.scatter_anchor(ctx.map);
                match self.scatter_anchor {
                    Some(anchor) => anchor,
                    None => self.personality.chase_target(ctx),
                }
            }
            PursuerMode::Frightened => self.position,
            PursuerMode::Chase => self.personality.chase_target(ctx),
        };
    }

    /// Target-tile step: the open neighbor closest to the target, first one
    /// wins on ties. Frightened pursuers pick any open neighbor at random,
    /// reversal included.
    pub fn calculate_next_move<R: Rng>(
        &self,
        map: &TileMap,
        rng: &mut R,
    ) -> Option<Direction> {
        let frightened = self.is_frightened();
        let neighbors = map.valid_neighbors(self.position, Some(self.previous), frightened);
        if neighbors.is_empty() {
            return None;
        }
        if frightened {
            let index = rng.random_range(0..neighbors.len());
            return Some(neighbors[index].direction);
        }

        let mut best: Option<(f64, Direction)> = None;
        for neighbor in &neighbors {
            let d = distance(neighbor.position, self.target);
            if best.is_none_or(|(min, _)| d < min) {
                best = Some((d, neighbor.direction));
            }
        }
        best.map(|(_, direction)| direction)
    }

    /// Keeps the old direction when boxed in.
    pub fn update_direction<R: Rng>(&mut self, map: &TileMap, rng: &mut R) {
        if let Some(direction) = self.calculate_next_move(map, rng) {
            self.direction = direction;
        }
    }

    pub fn speed(&self, frightened_speed: f32) -> f32 {
        if self.is_frightened() {
            frightened_speed
        } else {
            NORMAL_SPEED
        }
    }

    /// Speed-gated single step. Returns true when the position changed.
    pub fn advance(&mut self, map: &TileMap, frightened_speed: f32) -> bool {
        let speed = self.speed(frightened_speed);
        if speed < NORMAL_SPEED {
            self.move_counter += speed;
            if self.move_counter < 1.0 {
                return false;
            }
            self.move_counter = 0.0;
        }

        self.previous = self.position;
        match map.step(self.position, self.direction) {
            Some(next) if next != self.position => {
                self.position = next;
                true
            }
            _ => false,
        }
    }

    /// Eaten while Frightened: back to the house, straight into Chase.
    pub fn send_home(&mut self, house: Vec2) {
        self.position = house;
        self.previous = house;
        self.direction = Direction::None;
        self.target = house;
        self.mode = PursuerMode::Chase;
        self.move_counter = 0.0;
    }

    pub fn to_view(&self) -> PursuerView {
        PursuerView {
            id: self.id.clone(),
            personality: self.personality,
            x: self.position.x,
            y: self.position.y,
            dir: self.direction,
            mode: self.mode,
            target: self.target,
        }
    }
}
