//! Build settings for a single navigation mesh tile

use glam::IVec2;
use navtile_common::{BoundingBox, Error, Result};

/// Smallest cell size or cell height the builder will work with
pub const MIN_CELL_DIMENSION: f32 = 0.01;

/// Parameters controlling how a navigation tile is generated
///
/// Agent dimensions and tolerances are given in world units. They are
/// converted to voxel units by [`TileConfig`](crate::TileConfig) once the
/// settings have been validated.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct BuildSettings {
    /// Bounding box of the input geometry to voxelize
    pub bounding_box: BoundingBox,
    /// The width/depth resolution of the voxel grid
    pub cell_size: f32,
    /// The height resolution of the voxel grid
    pub cell_height: f32,
    /// Number of cells along each side of a tile
    pub tile_size: i32,
    /// Coordinate of the tile being built
    pub tile_position: IVec2,
    /// Height of the agent
    pub agent_height: f32,
    /// Radius of the agent
    pub agent_radius: f32,
    /// Maximum vertical step the agent can climb
    pub agent_max_climb: f32,
    /// Maximum walkable slope in degrees
    pub agent_max_slope: f32,
    /// Minimum region size in cells, smaller isolated regions are removed
    pub region_min_area: f32,
    /// Regions smaller than this are merged into neighbours when possible
    pub region_merge_area: f32,
    /// Maximum contour edge length in world units (0 disables splitting)
    pub edge_max_length: f32,
    /// Maximum deviation of simplified contours from the raw contour, in cells
    pub edge_max_error: f32,
    /// Detail mesh sample spacing, as a multiple of the cell size
    pub detail_sample_distance: f32,
    /// Maximum detail mesh surface deviation, as a multiple of the cell height
    pub detail_sample_max_error: f32,
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            bounding_box: BoundingBox::default(),
            cell_size: 0.3,
            cell_height: 0.2,
            tile_size: 32,
            tile_position: IVec2::ZERO,
            agent_height: 1.0,
            agent_radius: 0.5,
            agent_max_climb: 0.25,
            agent_max_slope: 45.0,
            region_min_area: 2.0,
            region_merge_area: 20.0,
            edge_max_length: 12.0,
            edge_max_error: 1.3,
            detail_sample_distance: 6.0,
            detail_sample_max_error: 1.0,
        }
    }
}

impl BuildSettings {
    /// Creates settings with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates the settings parameters
    ///
    /// Comparisons are written so that NaN fails them.
    pub fn validate(&self) -> Result<()> {
        if self.bounding_box.is_degenerate() {
            return Err(invalid("bounding box must have a positive extent on every axis"));
        }

        if !(self.detail_sample_distance >= 1.0) {
            return Err(invalid("detail sample distance must be at least 1.0"));
        }

        if !(self.detail_sample_max_error > 0.0) {
            return Err(invalid("detail sample max error must be positive"));
        }

        if !(self.edge_max_error >= 0.1) {
            return Err(invalid("edge max error must be at least 0.1"));
        }

        if !(self.edge_max_length >= 0.0) {
            return Err(invalid("edge max length must not be negative"));
        }

        if !(self.region_min_area >= 0.0) {
            return Err(invalid("region min area must not be negative"));
        }

        if !(self.region_merge_area >= 0.0) {
            return Err(invalid("region merge area must not be negative"));
        }

        if self.tile_size <= 0 {
            return Err(invalid("tile size must be positive"));
        }

        Ok(())
    }

    /// Raises cell size and cell height to [`MIN_CELL_DIMENSION`]
    ///
    /// Keeps tiny cells from producing an unbounded grid.
    pub fn clamp_cell_dimensions(&mut self) {
        if !(self.cell_size >= MIN_CELL_DIMENSION) {
            self.cell_size = MIN_CELL_DIMENSION;
        }
        if !(self.cell_height >= MIN_CELL_DIMENSION) {
            self.cell_height = MIN_CELL_DIMENSION;
        }
    }

    /// World-space length of one side of a tile
    pub fn tile_world_size(&self) -> f32 {
        self.tile_size as f32 * self.cell_size
    }

    /// Returns a copy targeting `coord`, with the bounding box clamped to that tile
    pub fn for_tile(&self, coord: IVec2) -> Self {
        let mut settings = self.clone();
        settings.tile_position = coord;
        settings.bounding_box = crate::tiling::clamp_bounds_to_tile(
            self.tile_size,
            self.cell_size,
            self.cell_height,
            self.bounding_box,
            coord,
        );
        settings
    }

    /// Saves the settings to a file in JSON format
    #[cfg(feature = "serialization")]
    pub fn save_to_json<P: AsRef<std::path::Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| Error::Serialization(e.to_string()))?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Loads settings from a JSON file
    #[cfg(feature = "serialization")]
    pub fn load_from_json<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json).map_err(|e| Error::Serialization(e.to_string()))
    }
}

fn invalid(message: &str) -> Error {
    Error::InvalidSettings(message.to_string())
}
