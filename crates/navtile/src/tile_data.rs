//! Assembly of the tile creation parameters and tile serialization

use navtile_common::{Error, Result};

use crate::context::BuildContext;
use crate::geometry::GeometryProcessing;
use crate::polymesh::{PolyMesh, PolyMeshDetail};
use crate::settings::BuildSettings;

/// Parameters describing one navigation tile, borrowed from the built meshes
///
/// Mirrors dtNavMeshCreateParams. Off-mesh connections are not supported by
/// the builder, so those fields are always empty.
#[derive(Debug, Clone)]
pub struct NavMeshCreateParams<'a> {
    /// Polygon mesh vertices in grid coordinates
    pub verts: &'a [u16],
    /// Number of polygon mesh vertices
    pub vert_count: usize,
    /// Polygon data, `nvp * 2` entries per polygon
    pub polys: &'a [u16],
    /// Per-polygon flags
    pub poly_flags: &'a [u16],
    /// Per-polygon area ids
    pub poly_areas: &'a [u8],
    /// Number of polygons
    pub poly_count: usize,
    /// Maximum vertices per polygon
    pub nvp: usize,

    /// Detail sub-mesh table, 4 entries per polygon
    pub detail_meshes: &'a [u32],
    /// Detail vertices in world space
    pub detail_verts: &'a [f32],
    /// Number of detail vertices
    pub detail_vert_count: usize,
    /// Detail triangles, 4 bytes each
    pub detail_tris: &'a [u8],
    /// Number of detail triangles
    pub detail_tri_count: usize,

    /// Off-mesh connection endpoints `[ax,ay,az,bx,by,bz]` * count
    pub off_mesh_con_verts: &'a [f32],
    /// Off-mesh connection radii
    pub off_mesh_con_rad: &'a [f32],
    /// Off-mesh connection flags
    pub off_mesh_con_flags: &'a [u16],
    /// Off-mesh connection area ids
    pub off_mesh_con_areas: &'a [u8],
    /// Off-mesh connection directions
    pub off_mesh_con_dir: &'a [u8],
    /// Off-mesh connection user ids
    pub off_mesh_con_user_id: &'a [u32],
    /// Number of off-mesh connections
    pub off_mesh_con_count: usize,

    /// Agent height in world units
    pub walkable_height: f32,
    /// Agent radius in world units
    pub walkable_radius: f32,
    /// Agent climb in world units
    pub walkable_climb: f32,
    /// Tile bounds minimum
    pub bmin: [f32; 3],
    /// Tile bounds maximum
    pub bmax: [f32; 3],
    /// Cell size
    pub cs: f32,
    /// Cell height
    pub ch: f32,
    /// Whether to build a bounding volume tree for the tile
    pub build_bv_tree: bool,

    /// Tile x coordinate
    pub tile_x: i32,
    /// Tile y coordinate
    pub tile_y: i32,
}

impl<'a> NavMeshCreateParams<'a> {
    /// Collects the tile parameters for the given meshes and settings
    ///
    /// Agent dimensions are taken as supplied in the settings, in world units.
    pub fn new(mesh: &'a PolyMesh, detail: &'a PolyMeshDetail, settings: &BuildSettings) -> Self {
        Self {
            verts: &mesh.verts,
            vert_count: mesh.nverts,
            polys: &mesh.polys,
            poly_flags: &mesh.flags,
            poly_areas: &mesh.areas,
            poly_count: mesh.npolys,
            nvp: mesh.nvp,
            detail_meshes: &detail.meshes,
            detail_verts: &detail.verts,
            detail_vert_count: detail.nverts,
            detail_tris: &detail.tris,
            detail_tri_count: detail.ntris,
            off_mesh_con_verts: &[],
            off_mesh_con_rad: &[],
            off_mesh_con_flags: &[],
            off_mesh_con_areas: &[],
            off_mesh_con_dir: &[],
            off_mesh_con_user_id: &[],
            off_mesh_con_count: 0,
            walkable_height: settings.agent_height,
            walkable_radius: settings.agent_radius,
            walkable_climb: settings.agent_max_climb,
            bmin: mesh.bmin.to_array(),
            bmax: mesh.bmax.to_array(),
            cs: settings.cell_size,
            ch: settings.cell_height,
            build_bv_tree: true,
            tile_x: settings.tile_position.x,
            tile_y: settings.tile_position.y,
        }
    }
}

/// Serializes the tile through the geometry backend
///
/// An empty blob counts as a failure even if the backend reported success.
pub fn create_tile_data<G: GeometryProcessing>(
    geometry: &mut G,
    ctx: &mut BuildContext,
    mesh: &PolyMesh,
    detail: &PolyMeshDetail,
    settings: &BuildSettings,
) -> Result<Vec<u8>> {
    let params = NavMeshCreateParams::new(mesh, detail, settings);
    let data = geometry.create_nav_mesh_data(ctx, &params)?;

    if data.is_empty() {
        return Err(Error::TileData("serializer produced an empty tile".to_string()));
    }

    Ok(data)
}
