//! Common utilities and data structures shared by the navigation tile builder

mod bounds;
mod math;

pub use bounds::BoundingBox;
pub use math::*;

/// Represents a 3D position
pub type Vec3 = glam::Vec3;

/// Error types for the library
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid build settings: {0}")]
    InvalidSettings(String),

    #[error("invalid input mesh: {0}")]
    InvalidMesh(String),

    #[error("geometry processing failed: {0}")]
    Geometry(String),

    #[error("tile data creation failed: {0}")]
    TileData(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Result type for navigation tile operations
pub type Result<T> = std::result::Result<T, Error>;
