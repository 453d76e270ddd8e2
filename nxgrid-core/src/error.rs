//! Error types for nxgrid-core.

use thiserror::Error;

/// Result type alias for nxgrid operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for nxgrid operations.
#[derive(Error, Debug)]
pub enum Error {
    /// A grid dimension (width, height or depth) was not strictly positive.
    #[error("invalid {name}: {value} (must be > 0)")]
    InvalidDimension { name: &'static str, value: f64 },

    /// Orientation vectors were zero or parallel.
    #[error("degenerate orientation: x and y vectors must be non-zero and not parallel")]
    DegenerateOrientation,

    /// Row or column count was zero.
    #[error("invalid grid size: {rows} rows x {cols} cols")]
    InvalidGridSize { rows: usize, cols: usize },

    /// No grid registered under this id.
    #[error("unknown grid id: {0}")]
    UnknownGrid(i32),

    /// A grid with this id is already registered.
    #[error("duplicate grid id: {0}")]
    DuplicateGrid(i32),

    /// Pixel lookup outside the grid.
    #[error("pixel ({row}, {col}) outside grid {grid}")]
    PixelOutOfRange { grid: i32, row: i64, col: i64 },

    /// Inconsistent data set contents.
    #[error("invalid data set: {0}")]
    InvalidDataSet(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// Configuration file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file could not be parsed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
