use crate::error::MapError;
use crate::types::{Direction, MapView, Vec2};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Tile {
    Pellet = 0,
    Wall = 1,
    House = 2,
    Empty = 3,
    PowerPellet = 4,
}

impl Tile {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Pellet),
            1 => Some(Self::Wall),
            2 => Some(Self::House),
            3 => Some(Self::Empty),
            4 => Some(Self::PowerPellet),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn is_collectible(self) -> bool {
        matches!(self, Self::Pellet | Self::PowerPellet)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Neighbor {
    pub position: Vec2,
    pub direction: Direction,
}

/// Euclidean distance, only ever compared against other distances.
pub fn distance(a: Vec2, b: Vec2) -> f64 {
    let dx = f64::from(b.x - a.x);
    let dy = f64::from(b.y - a.y);
    (dx * dx + dy * dy).sqrt()
}

/// Row-major grid of cell codes. Topology (walls, house) is fixed once built;
/// only collectibles change during a round.
#[derive(Clone, Debug)]
pub struct TileMap {
    name: String,
    width: i32,
    height: i32,
    cells: Vec<Tile>,
    wall_color: String,
}

impl TileMap {
    pub fn from_codes(name: &str, rows: &[Vec<u8>], wall_color: &str) -> Result<Self, MapError> {
        if rows.iter().all(|row| row.is_empty()) {
            return Ok(Self::empty(name));
        }
        let width = rows.first().map(|row| row.len()).unwrap_or(0);
        let mut cells = Vec::with_capacity(width * rows.len());
        for (y, row) in rows.iter().enumerate() {
            if row.len() != width {
                return Err(MapError::Ragged {
                    row: y,
                    expected: width,
                    found: row.len(),
                });
            }
            for (x, &code) in row.iter().enumerate() {
                let tile = Tile::from_code(code).ok_or(MapError::UnknownCode { code, x, y })?;
                cells.push(tile);
            }
        }
        Ok(Self {
            name: name.to_string(),
            width: width as i32,
            height: rows.len() as i32,
            cells,
            wall_color: wall_color.to_string(),
        })
    }

    pub fn empty(name: &str) -> Self {
        Self {
            name: name.to_string(),
            width: 0,
            height: 0,
            cells: Vec::new(),
            wall_color: String::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Applies the x-axis tunnel and rejects out-of-range y.
    pub fn resolve(&self, pos: Vec2) -> Option<Vec2> {
        if self.is_empty() || pos.y < 0 || pos.y >= self.height {
            return None;
        }
        Some(Vec2 {
            x: pos.x.rem_euclid(self.width),
            y: pos.y,
        })
    }

    pub fn tile_value(&self, pos: Vec2) -> Option<Tile> {
        let resolved = self.resolve(pos)?;
        self.cells
            .get((resolved.y * self.width + resolved.x) as usize)
            .copied()
    }

    pub fn is_valid_tile(&self, pos: Vec2) -> bool {
        matches!(self.tile_value(pos), Some(tile) if tile != Tile::Wall)
    }

    pub fn set_tile(&mut self, pos: Vec2, tile: Tile) -> bool {
        let Some(resolved) = self.resolve(pos) else {
            return false;
        };
        let index = (resolved.y * self.width + resolved.x) as usize;
        match self.cells.get_mut(index) {
            Some(cell) => {
                *cell = tile;
                true
            }
            None => false,
        }
    }

    /// Destination of a single step, if it is in bounds on y and not a wall.
    pub fn step(&self, from: Vec2, dir: Direction) -> Option<Vec2> {
        let next = self.resolve(from.offset(dir, 1))?;
        self.is_valid_tile(next).then_some(next)
    }

    /// Open neighbors in right, down, left, up order. The tile equal to
    /// `previous` is skipped unless `allow_reversal` is set.
    pub fn valid_neighbors(
        &self,
        current: Vec2,
        previous: Option<Vec2>,
        allow_reversal: bool,
    ) -> Vec<Neighbor> {
        if self.is_empty() {
            return Vec::new();
        }
        Direction::NEIGHBOR_ORDER
            .iter()
            .filter_map(|&direction| {
                let position = self.step(current, direction)?;
                if !allow_reversal && previous == Some(position) {
                    return None;
                }
                Some(Neighbor {
                    position,
                    direction,
                })
            })
            .collect()
    }

    /// Clamps both axes into the grid. Abstract targets use this instead of
    /// the tunnel wrap.
    pub fn clamp(&self, pos: Vec2) -> Vec2 {
        Vec2 {
            x: pos.x.clamp(0, (self.width - 1).max(0)),
            y: pos.y.clamp(0, (self.height - 1).max(0)),
        }
    }

    pub fn cells_matching(&self, predicate: impl Fn(Tile) -> bool) -> Vec<Vec2> {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, &tile)| predicate(tile))
            .map(|(index, _)| Vec2 {
                x: index as i32 % self.width,
                y: index as i32 / self.width,
            })
            .collect()
    }

    pub fn house_tiles(&self) -> Vec<Vec2> {
        self.cells_matching(|tile| tile == Tile::House)
    }

    pub fn remaining_collectibles(&self) -> usize {
        self.cells.iter().filter(|tile| tile.is_collectible()).count()
    }

    pub fn has_collectibles(&self) -> bool {
        self.cells.iter().any(|tile| tile.is_collectible())
    }

    pub fn to_map_view(&self) -> MapView {
        let rows = if self.is_empty() {
            Vec::new()
        } else {
            self.cells
                .chunks(self.width as usize)
                .map(|row| row.iter().map(|tile| tile.code()).collect())
                .collect()
        };
        MapView {
            name: self.name.clone(),
            width: self.width,
            height: self.height,
            rows,
            wall_color: self.wall_color.clone(),
        }
    }
}

#[cfg(test)]
pub(crate) fn parse_test_map(rows: &[&str]) -> TileMap {
    let codes: Vec<Vec<u8>> = rows
        .iter()
        .map(|row| row.bytes().map(|b| b - b'0').collect())
        .collect();
    TileMap::from_codes("test", &codes, "#09f").expect("test map should parse")
}
