use crate::constants::{AMBUSH_LOOKAHEAD, CAUTIOUS_FLEE_RADIUS, FLANKER_PIVOT_LOOKAHEAD};
use crate::types::{Direction, Personality, Vec2};
use crate::world::{distance, TileMap};

/// What a target function may look at during one pursuer update.
#[derive(Clone, Copy, Debug)]
pub struct TargetContext<'a> {
    pub map: &'a TileMap,
    pub player_position: Vec2,
    pub player_direction: Direction,
    pub player_intended: Direction,
    pub pursuer_position: Vec2,
    /// Live position of the Direct pursuer, looked up by tag.
    pub direct_position: Option<Vec2>,
}

impl TargetContext<'_> {
    /// Player heading, or the queued turn when standing still.
    pub fn player_heading(&self) -> Direction {
        if self.player_direction.is_none() {
            self.player_intended
        } else {
            self.player_direction
        }
    }

    fn ahead_of_player(&self, steps: i32) -> Vec2 {
        self.map
            .clamp(self.player_position.offset(self.player_heading(), steps))
    }
}

impl Personality {
    /// Home corner, inset one tile. None while the map is unset.
    pub fn scatter_anchor(self, map: &TileMap) -> Option<Vec2> {
        if map.is_empty() {
            return None;
        }
        let (right, bottom) = (map.width() - 2, map.height() - 2);
        Some(match self {
            Self::Direct => Vec2::new(right, 1),
            Self::Ambush => Vec2::new(1, 1),
            Self::Cautious => Vec2::new(1, bottom),
            Self::Flanker => Vec2::new(right, bottom),
        })
    }

    pub fn chase_target(self, ctx: &TargetContext<'_>) -> Vec2 {
        match self {
            Self::Direct => ctx.player_position,
            Self::Ambush => ctx.ahead_of_player(AMBUSH_LOOKAHEAD),
            Self::Cautious => {
                if distance(ctx.pursuer_position, ctx.player_position) > CAUTIOUS_FLEE_RADIUS {
                    ctx.player_position
                } else {
                    self.scatter_anchor(ctx.map)
                        .unwrap_or(ctx.player_position)
                }
            }
            Self::Flanker => {
                let Some(direct) = ctx.direct_position else {
                    return ctx.player_position;
                };
                let pivot = ctx.ahead_of_player(FLANKER_PIVOT_LOOKAHEAD);
                let reflected = Vec2::new(2 * pivot.x - direct.x, 2 * pivot.y - direct.y);
                ctx.map.clamp(reflected)
            }
        }
    }
}
