use thiserror::Error;

use crate::core::types::{EntityRef, GridPos};

#[derive(Error, Debug)]
pub enum SimError {
    #[error("Cell ({x}, {y}) is outside the grid")]
    OutOfBounds { x: i32, y: i32 },

    #[error("Entity not found: {0}")]
    NotFound(EntityRef),

    #[error("No walkable route from {from} to {to}")]
    Unreachable { from: GridPos, to: GridPos },

    #[error("Invalid world dimensions {width}x{height} (each side must be within 10..=100)")]
    InvalidDimensions { width: i32, height: i32 },

    #[error("Decision oracle failed: {0}")]
    OracleFailure(String),

    #[error("Cell ({x}, {y}) is already occupied")]
    Occupied { x: i32, y: i32 },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, SimError>;
