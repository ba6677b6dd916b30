use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::MapError;
use crate::world::TileMap;

const DEFAULT_WALL_COLOR: &str = "#09f";

const CLASSIC_ROWS: [&str; 15] = [
    "1111111111111111111",
    "1000000001000000001",
    "1011011101011101101",
    "1000000000000000001",
    "1011010111110101101",
    "1000010001000100001",
    "1111011101011101111",
    "0000010000000100000",
    "1111010222220101111",
    "1111010111110101111",
    "1000000001000000001",
    "1011011101011101101",
    "1001000000000001001",
    "1000000001000000001",
    "1111111111111111111",
];

const MINI_ROWS: [&str; 7] = [
    "11111111111",
    "10000000001",
    "10111011101",
    "00022222000",
    "10111011101",
    "10000000001",
    "11111111111",
];

/// One entry of a map table, in the same JSON shape map files use.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MapDefinition {
    pub name: String,
    pub map: Vec<Vec<u8>>,
    #[serde(default = "default_wall_color")]
    pub wall_color: String,
}

fn default_wall_color() -> String {
    DEFAULT_WALL_COLOR.to_string()
}

impl MapDefinition {
    /// Parses rows of single-digit cell codes.
    pub fn from_digit_rows(name: &str, wall_color: &str, rows: &[&str]) -> Result<Self, MapError> {
        let mut map = Vec::with_capacity(rows.len());
        for (y, row) in rows.iter().enumerate() {
            let mut cells = Vec::with_capacity(row.len());
            for (x, ch) in row.chars().enumerate() {
                let code = ch.to_digit(10).ok_or(MapError::UnknownCode {
                    code: u8::try_from(u32::from(ch)).unwrap_or(u8::MAX),
                    x,
                    y,
                })?;
                cells.push(code as u8);
            }
            map.push(cells);
        }
        Ok(Self {
            name: name.to_string(),
            map,
            wall_color: wall_color.to_string(),
        })
    }

    pub fn build(&self) -> Result<TileMap, MapError> {
        TileMap::from_codes(&self.name, &self.map, &self.wall_color)
    }
}

pub fn builtin_maps() -> Vec<MapDefinition> {
    [
        ("classic", "#09f", &CLASSIC_ROWS[..]),
        ("mini", "#e36", &MINI_ROWS[..]),
    ]
    .iter()
    .filter_map(|(name, color, rows)| MapDefinition::from_digit_rows(name, color, rows).ok())
    .collect()
}

pub fn load_maps(path: &Path) -> Result<Vec<MapDefinition>, MapError> {
    let raw = fs::read_to_string(path)?;
    let maps: Vec<MapDefinition> = serde_json::from_str(&raw)?;
    for definition in &maps {
        definition.build()?;
    }
    Ok(maps)
}

/// Rotation is the caller's concern; this only wraps the index.
pub fn pick_map(maps: &[MapDefinition], index: usize) -> Option<&MapDefinition> {
    if maps.is_empty() {
        return None;
    }
    maps.get(index % maps.len())
}
