//! Voxel grid configuration derived from the build settings

use glam::Vec3;
use navtile_common::{Error, Result};

use crate::settings::BuildSettings;

/// Maximum number of vertices per polygon in the generated mesh
pub const MAX_VERTS_PER_POLY: usize = 6;

/// Number of cells added to the walkable radius to form the tile border
pub const BORDER_PADDING: i32 = 3;

/// Configuration parameters for generating one tile, in voxel units
#[derive(Debug, Clone, PartialEq)]
pub struct TileConfig {
    /// The width of the field along the x-axis, border included
    pub width: i32,
    /// The height of the field along the z-axis, border included
    pub height: i32,

    /// The width/depth resolution of the field (cell size)
    pub cs: f32,
    /// The height resolution of the field (cell height)
    pub ch: f32,

    /// The minimum bounds of the field's AABB, expanded by the border
    pub bmin: Vec3,
    /// The maximum bounds of the field's AABB, expanded by the border
    pub bmax: Vec3,

    /// The maximum slope in degrees that is considered walkable
    pub walkable_slope_angle: f32,
    /// Minimum floor to 'ceiling' height that will still allow the floor area to be considered walkable
    pub walkable_height: i32,
    /// The maximum ledge height that is considered traversable. May be negative for
    /// invalid agents, in which case the pipeline refuses to run
    pub walkable_climb: i32,
    /// The distance to erode/shrink the walkable area from obstacles
    pub walkable_radius: i32,

    /// The maximum allowed length for contour edges along the border of the mesh
    pub max_edge_len: i32,
    /// The maximum distance a simplified contour's border edges should deviate from the original raw contour
    pub max_simplification_error: f32,
    /// The minimum number of cells allowed to form isolated island areas
    pub min_region_area: i32,
    /// Any regions with an area smaller than this value will be merged with larger regions if possible
    pub merge_region_area: i32,

    /// The maximum number of vertices allowed for polygons generated during the contour to polygon conversion process
    pub max_vertices_per_polygon: usize,

    /// Sets the sampling distance to use when generating the detail mesh
    pub detail_sample_dist: f32,
    /// The maximum distance the detail mesh surface should deviate from the heightfield data
    pub detail_sample_max_error: f32,

    /// The size of the border around the tile, in cells
    pub border_size: i32,
}

impl TileConfig {
    /// Derives the grid configuration for the tile described by `settings`
    ///
    /// Expects settings that passed validation and had their cell dimensions clamped.
    /// Fails when the border or grid size does not fit in an `i32`.
    pub fn from_settings(settings: &BuildSettings) -> Result<Self> {
        let cs = settings.cell_size;
        let ch = settings.cell_height;

        let walkable_height = (settings.agent_height / ch).ceil() as i32;
        let walkable_climb = (settings.agent_max_climb / ch).floor() as i32;
        let walkable_radius = (settings.agent_radius / cs).ceil() as i32;

        let border_size = walkable_radius.checked_add(BORDER_PADDING).ok_or_else(|| {
            Error::InvalidSettings(format!(
                "agent radius {} is too large for cell size {}",
                settings.agent_radius, cs
            ))
        })?;
        let grid_size = border_size
            .checked_mul(2)
            .and_then(|border| border.checked_add(settings.tile_size))
            .ok_or_else(|| {
                Error::InvalidSettings(format!(
                    "tile size {} with a border of {} cells exceeds the grid limit",
                    settings.tile_size, border_size
                ))
            })?;

        // Pad the horizontal extents so geometry just outside the tile still
        // influences erosion and region building near the tile edge
        let padding = border_size as f32 * cs;
        let bounds = settings
            .bounding_box
            .extended(Vec3::new(padding, 0.0, padding));

        Ok(Self {
            width: grid_size,
            height: grid_size,
            cs,
            ch,
            bmin: bounds.minimum,
            bmax: bounds.maximum,
            walkable_slope_angle: settings.agent_max_slope,
            walkable_height,
            walkable_climb,
            walkable_radius,
            max_edge_len: (settings.edge_max_length / cs) as i32,
            max_simplification_error: settings.edge_max_error,
            min_region_area: settings.region_min_area as i32,
            merge_region_area: settings.region_merge_area as i32,
            max_vertices_per_polygon: MAX_VERTS_PER_POLY,
            detail_sample_dist: cs * settings.detail_sample_distance,
            detail_sample_max_error: ch * settings.detail_sample_max_error,
            border_size,
        })
    }
}
