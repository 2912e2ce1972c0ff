//! Single-tile navigation mesh builder
//!
//! Takes a triangle soup plus build settings and produces the world-space
//! walkable surface of one tile together with a serialized Detour tile. The
//! voxel and meshing algorithms are supplied by a [`GeometryProcessing`]
//! backend; this crate plans the grid, sequences the stages and owns every
//! intermediate structure in between.

mod binary_format;
mod builder;
mod config;
mod context;
mod geometry;
mod pipeline;
mod polymesh;
mod projection;
mod settings;
mod tile_data;
mod tiling;

#[cfg(test)]
mod test_geometry;

pub use binary_format::{
    create_nav_mesh_data, read_mesh_header, BVNode, MeshHeader, BV_NODE_SIZE, DT_EXT_LINK,
    DT_NAVMESH_MAGIC, DT_NAVMESH_VERSION, DT_VERTS_PER_POLYGON, LINK_SIZE, MESH_HEADER_SIZE,
    POLY_DETAIL_SIZE, POLY_SIZE,
};
pub use builder::{GeneratedData, NavigationBuilder};
pub use config::{TileConfig, BORDER_PADDING, MAX_VERTS_PER_POLY};
pub use context::{BuildContext, LogEntry, LogLevel, ProgressInfo, TimerCategory, TimerEntry};
pub use geometry::{mark_walkable_triangles, GeometryProcessing};
pub use pipeline::{BuildStage, Pipeline, PipelineOutput, StageFailure};
pub use polymesh::{
    PolyMesh, PolyMeshDetail, MESH_NULL_IDX, POLY_FLAG_WALK, RC_NULL_AREA, RC_WALKABLE_AREA,
};
pub use projection::project_poly_mesh;
pub use settings::{BuildSettings, MIN_CELL_DIMENSION};
pub use tile_data::{create_tile_data, NavMeshCreateParams};
pub use tiling::{clamp_bounds_to_tile, overlapping_tiles};

pub use navtile_common::{BoundingBox, Error, Result};
