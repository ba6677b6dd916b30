use thiserror::Error;

#[derive(Debug, Error)]
pub enum MapError {
    #[error("row {row} has {found} cells, expected {expected}")]
    Ragged {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("unknown cell code {code} at ({x}, {y})")]
    UnknownCode { code: u8, x: usize, y: usize },
    #[error("map io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("map json error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config json error: {0}")]
    Json(#[from] serde_json::Error),
}
