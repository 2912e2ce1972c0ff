//! Polygon and detail mesh structures produced by the geometry backend
//!
//! The layouts follow rcPolyMesh / rcPolyMeshDetail so that a native backend
//! can hand its buffers over without re-packing.

use glam::Vec3;

/// Null index for polygon vertices and neighbours (matches C++ RC_MESH_NULL_IDX)
pub const MESH_NULL_IDX: u16 = 0xffff;

/// Walkable area ID (matches C++ RC_WALKABLE_AREA)
pub const RC_WALKABLE_AREA: u8 = 63;

/// Null area ID (matches C++ RC_NULL_AREA)
pub const RC_NULL_AREA: u8 = 0;

/// Polygon flag marking a polygon as traversable
pub const POLY_FLAG_WALK: u16 = 0x01;

/// A polygon mesh in grid coordinates
#[derive(Debug, Clone, Default)]
pub struct PolyMesh {
    /// Mesh vertices `[x,y,z]` * nverts, in cells relative to `bmin`
    pub verts: Vec<u16>,
    /// Polygon and neighbor data, `nvp * 2` entries per polygon
    pub polys: Vec<u16>,
    /// Region IDs for each polygon
    pub regs: Vec<u16>,
    /// Area IDs for each polygon
    pub areas: Vec<u8>,
    /// User defined flags for each polygon
    pub flags: Vec<u16>,
    /// Number of vertices
    pub nverts: usize,
    /// Number of polygons
    pub npolys: usize,
    /// Max vertices per polygon
    pub nvp: usize,
    /// Bounds of the mesh
    pub bmin: Vec3,
    pub bmax: Vec3,
    /// Cell size and height
    pub cs: f32,
    pub ch: f32,
    /// Border size the mesh was built with
    pub border_size: i32,
    /// Max edge error the contours were simplified with
    pub max_edge_error: f32,
}

impl PolyMesh {
    /// Creates a new empty polygon mesh
    pub fn new(nvp: usize, border_size: i32) -> Self {
        Self {
            nvp,
            border_size,
            ..Default::default()
        }
    }

    /// Vertex indices of polygon `i`, padded with [`MESH_NULL_IDX`]
    pub fn poly_verts(&self, i: usize) -> &[u16] {
        let start = i * self.nvp * 2;
        &self.polys[start..start + self.nvp]
    }

    /// Neighbour entries of polygon `i`
    pub fn poly_neighbors(&self, i: usize) -> &[u16] {
        let start = i * self.nvp * 2 + self.nvp;
        &self.polys[start..start + self.nvp]
    }

    /// Grid coordinates of vertex `i`
    pub fn vert(&self, i: usize) -> [u16; 3] {
        let v = &self.verts[i * 3..i * 3 + 3];
        [v[0], v[1], v[2]]
    }

    /// Renumbers generic walkable polygons to area 0 and marks area 0 as walkable
    ///
    /// Only a single default area class is produced; polygons in other areas
    /// keep their area and flags.
    pub fn finalize_areas(&mut self) {
        for (area, flags) in self
            .areas
            .iter_mut()
            .zip(self.flags.iter_mut())
            .take(self.npolys)
        {
            if *area == RC_WALKABLE_AREA {
                *area = 0;
            }
            if *area == 0 {
                *flags = POLY_FLAG_WALK;
            }
        }
    }
}

/// A detail mesh refining each polygon with height-accurate triangles
#[derive(Debug, Clone, Default)]
pub struct PolyMeshDetail {
    /// Sub-mesh table `[vert_base, vert_count, tri_base, tri_count]` * nmeshes
    pub meshes: Vec<u32>,
    /// World-space vertices `[x,y,z]` * nverts
    pub verts: Vec<f32>,
    /// Triangles `[a,b,c,flags]` * ntris, indices relative to the sub-mesh vertex base
    pub tris: Vec<u8>,
    /// Number of sub-meshes
    pub nmeshes: usize,
    /// Number of vertices
    pub nverts: usize,
    /// Number of triangles
    pub ntris: usize,
}

impl PolyMeshDetail {
    /// Creates a new empty detail mesh
    pub fn new() -> Self {
        Self::default()
    }

    /// Sub-mesh entry `[vert_base, vert_count, tri_base, tri_count]` for polygon `i`
    pub fn sub_mesh(&self, i: usize) -> [u32; 4] {
        let m = &self.meshes[i * 4..i * 4 + 4];
        [m[0], m[1], m[2], m[3]]
    }
}
