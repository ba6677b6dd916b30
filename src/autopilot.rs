use std::collections::{HashSet, VecDeque};

use crate::engine::pursuer::Pursuer;
use crate::types::{Direction, Vec2};
use crate::world::TileMap;

/// Frightened pursuers closer than this are hunted instead of pellets.
pub const HUNT_RADIUS: i32 = 6;

fn manhattan(a: Vec2, b: Vec2) -> i32 {
    (a.x - b.x).abs() + (a.y - b.y).abs()
}

/// Picks the player's next input for headless runs.
pub fn choose_direction(map: &TileMap, player: Vec2, pursuers: &[Pursuer]) -> Direction {
    let danger: HashSet<Vec2> = pursuers
        .iter()
        .filter(|p| !p.is_frightened())
        .flat_map(|p| {
            let mut tiles = vec![p.position];
            tiles.extend(
                map.valid_neighbors(p.position, None, true)
                    .into_iter()
                    .map(|n| n.position),
            );
            tiles
        })
        .collect();

    let prey: HashSet<Vec2> = pursuers
        .iter()
        .filter(|p| p.is_frightened() && manhattan(p.position, player) <= HUNT_RADIUS)
        .map(|p| p.position)
        .collect();
    if !prey.is_empty() {
        if let Some(dir) = first_step_toward(map, player, &danger, |pos| prey.contains(&pos)) {
            return dir;
        }
    }

    let collectible = |pos: Vec2| map.tile_value(pos).is_some_and(|tile| tile.is_collectible());
    if let Some(dir) = first_step_toward(map, player, &danger, collectible) {
        return dir;
    }
    escape_direction(map, player, pursuers)
}

/// Breadth-first search that never enters `blocked`. Returns the first
/// step of a shortest path to a tile satisfying `goal`.
fn first_step_toward(
    map: &TileMap,
    start: Vec2,
    blocked: &HashSet<Vec2>,
    goal: impl Fn(Vec2) -> bool,
) -> Option<Direction> {
    let mut visited = HashSet::from([start]);
    let mut queue = VecDeque::new();
    for neighbor in map.valid_neighbors(start, None, true) {
        if blocked.contains(&neighbor.position) || !visited.insert(neighbor.position) {
            continue;
        }
        queue.push_back((neighbor.position, neighbor.direction));
    }

    while let Some((pos, first)) = queue.pop_front() {
        if goal(pos) {
            return Some(first);
        }
        for neighbor in map.valid_neighbors(pos, None, true) {
            if blocked.contains(&neighbor.position) || !visited.insert(neighbor.position) {
                continue;
            }
            queue.push_back((neighbor.position, first));
        }
    }
    None
}

fn escape_direction(map: &TileMap, player: Vec2, pursuers: &[Pursuer]) -> Direction {
    let nearest_threat = |pos: Vec2| {
        pursuers
            .iter()
            .filter(|p| !p.is_frightened())
            .map(|p| manhattan(p.position, pos))
            .min()
            .unwrap_or(99)
    };
    map.valid_neighbors(player, None, true)
        .into_iter()
        .max_by_key(|n| nearest_threat(n.position))
        .map_or(Direction::None, |n| n.direction)
}
