//! Binary tile data in the Detour navigation mesh layout
//!
//! This module writes the same byte layout as dtCreateNavMeshData so tiles can
//! be loaded by any Detour-compatible runtime: a mesh header followed by the
//! vertex, polygon, link, detail and BV-tree sections, all little-endian.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Cursor, Read, Write};

use navtile_common::{align4, Error, Result};

use crate::polymesh::MESH_NULL_IDX;
use crate::tile_data::NavMeshCreateParams;

/// Magic number for navigation mesh tiles ('DNAV')
pub const DT_NAVMESH_MAGIC: u32 =
    (b'D' as u32) << 24 | (b'N' as u32) << 16 | (b'A' as u32) << 8 | b'V' as u32;

/// Current navigation mesh tile version
pub const DT_NAVMESH_VERSION: u32 = 7;

/// Maximum vertices per polygon (must match Detour)
pub const DT_VERTS_PER_POLYGON: usize = 6;

/// Neighbour marker for edges that connect to another tile
pub const DT_EXT_LINK: u16 = 0x8000;

/// Null link value
const DT_NULL_LINK: u32 = 0xffff_ffff;

/// Serialized sizes of the fixed-layout records
pub const MESH_HEADER_SIZE: usize = 100;
pub const POLY_SIZE: usize = 32;
pub const LINK_SIZE: usize = 12;
pub const POLY_DETAIL_SIZE: usize = 12;
pub const BV_NODE_SIZE: usize = 16;

/// Mesh header structure matching C++ dtMeshHeader
#[derive(Debug, Clone, PartialEq)]
pub struct MeshHeader {
    pub magic: u32,
    pub version: u32,
    pub x: i32,
    pub y: i32,
    pub layer: i32,
    pub user_id: u32,
    pub poly_count: i32,
    pub vert_count: i32,
    pub max_link_count: i32,
    pub detail_mesh_count: i32,
    pub detail_vert_count: i32,
    pub detail_tri_count: i32,
    pub bv_node_count: i32,
    pub off_mesh_con_count: i32,
    pub off_mesh_base: i32,
    pub walkable_height: f32,
    pub walkable_radius: f32,
    pub walkable_climb: f32,
    pub bmin: [f32; 3],
    pub bmax: [f32; 3],
    pub bv_quant_factor: f32,
}

impl MeshHeader {
    /// Reads a mesh header from a reader
    fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        Ok(Self {
            magic: reader.read_u32::<LittleEndian>()?,
            version: reader.read_u32::<LittleEndian>()?,
            x: reader.read_i32::<LittleEndian>()?,
            y: reader.read_i32::<LittleEndian>()?,
            layer: reader.read_i32::<LittleEndian>()?,
            user_id: reader.read_u32::<LittleEndian>()?,
            poly_count: reader.read_i32::<LittleEndian>()?,
            vert_count: reader.read_i32::<LittleEndian>()?,
            max_link_count: reader.read_i32::<LittleEndian>()?,
            detail_mesh_count: reader.read_i32::<LittleEndian>()?,
            detail_vert_count: reader.read_i32::<LittleEndian>()?,
            detail_tri_count: reader.read_i32::<LittleEndian>()?,
            bv_node_count: reader.read_i32::<LittleEndian>()?,
            off_mesh_con_count: reader.read_i32::<LittleEndian>()?,
            off_mesh_base: reader.read_i32::<LittleEndian>()?,
            walkable_height: reader.read_f32::<LittleEndian>()?,
            walkable_radius: reader.read_f32::<LittleEndian>()?,
            walkable_climb: reader.read_f32::<LittleEndian>()?,
            bmin: [
                reader.read_f32::<LittleEndian>()?,
                reader.read_f32::<LittleEndian>()?,
                reader.read_f32::<LittleEndian>()?,
            ],
            bmax: [
                reader.read_f32::<LittleEndian>()?,
                reader.read_f32::<LittleEndian>()?,
                reader.read_f32::<LittleEndian>()?,
            ],
            bv_quant_factor: reader.read_f32::<LittleEndian>()?,
        })
    }

    /// Writes a mesh header to a writer
    fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_u32::<LittleEndian>(self.magic)?;
        writer.write_u32::<LittleEndian>(self.version)?;
        writer.write_i32::<LittleEndian>(self.x)?;
        writer.write_i32::<LittleEndian>(self.y)?;
        writer.write_i32::<LittleEndian>(self.layer)?;
        writer.write_u32::<LittleEndian>(self.user_id)?;
        writer.write_i32::<LittleEndian>(self.poly_count)?;
        writer.write_i32::<LittleEndian>(self.vert_count)?;
        writer.write_i32::<LittleEndian>(self.max_link_count)?;
        writer.write_i32::<LittleEndian>(self.detail_mesh_count)?;
        writer.write_i32::<LittleEndian>(self.detail_vert_count)?;
        writer.write_i32::<LittleEndian>(self.detail_tri_count)?;
        writer.write_i32::<LittleEndian>(self.bv_node_count)?;
        writer.write_i32::<LittleEndian>(self.off_mesh_con_count)?;
        writer.write_i32::<LittleEndian>(self.off_mesh_base)?;
        writer.write_f32::<LittleEndian>(self.walkable_height)?;
        writer.write_f32::<LittleEndian>(self.walkable_radius)?;
        writer.write_f32::<LittleEndian>(self.walkable_climb)?;
        for &v in self.bmin.iter().chain(self.bmax.iter()) {
            writer.write_f32::<LittleEndian>(v)?;
        }
        writer.write_f32::<LittleEndian>(self.bv_quant_factor)?;
        Ok(())
    }
}

/// Bounding volume node matching C++ dtBVNode
///
/// Leaves store the polygon index in `i`, internal nodes store the negated
/// escape index (number of nodes in the subtree).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BVNode {
    pub bmin: [u16; 3],
    pub bmax: [u16; 3],
    pub i: i32,
}

impl BVNode {
    fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        for &v in self.bmin.iter().chain(self.bmax.iter()) {
            writer.write_u16::<LittleEndian>(v)?;
        }
        writer.write_i32::<LittleEndian>(self.i)?;
        Ok(())
    }
}

/// Reads and checks the header of a serialized tile
pub fn read_mesh_header(data: &[u8]) -> Result<MeshHeader> {
    let header = MeshHeader::read_from(&mut Cursor::new(data))?;

    if header.magic != DT_NAVMESH_MAGIC {
        return Err(Error::TileData("wrong magic number".to_string()));
    }
    if header.version != DT_NAVMESH_VERSION {
        return Err(Error::TileData("wrong version".to_string()));
    }

    Ok(header)
}

/// Creates binary tile data from the provided parameters
pub fn create_nav_mesh_data(params: &NavMeshCreateParams<'_>) -> Result<Vec<u8>> {
    validate_params(params)?;

    let nvp = params.nvp;
    let poly_count = params.poly_count;

    // Count edges and tile portals to size the link pool
    let mut edge_count = 0;
    let mut portal_count = 0;
    let mut poly_vert_counts = Vec::with_capacity(poly_count);
    for i in 0..poly_count {
        let p = poly_slice(params, i);
        let mut nv = 0;
        for j in 0..nvp {
            if p[j] == MESH_NULL_IDX {
                break;
            }
            if p[j] as usize >= params.vert_count {
                return Err(tile_error(format!("polygon {} references missing vertex", i)));
            }
            nv += 1;
            edge_count += 1;
            let nei = p[nvp + j];
            if nei & 0x8000 != 0 && nei & 0xf != 0xf {
                portal_count += 1;
            }
        }
        if nv < 3 {
            return Err(tile_error(format!("polygon {} has fewer than 3 vertices", i)));
        }
        poly_vert_counts.push(nv);
    }
    let max_link_count = edge_count + portal_count * 2;

    // Detail vertices shared with the polygon are not stored again
    let mut unique_detail_vert_count = 0;
    for (i, &nv) in poly_vert_counts.iter().enumerate() {
        let vb = params.detail_meshes[i * 4] as usize;
        let ndv = params.detail_meshes[i * 4 + 1] as usize;
        if ndv < nv || vb + ndv > params.detail_vert_count {
            return Err(tile_error(format!("invalid detail sub-mesh for polygon {}", i)));
        }
        unique_detail_vert_count += ndv - nv;
    }

    let bv_nodes = if params.build_bv_tree {
        create_bv_tree(params)
    } else {
        Vec::new()
    };
    let bv_slot_count = if params.build_bv_tree { poly_count * 2 } else { 0 };

    let data_size = align4(MESH_HEADER_SIZE)
        + align4(params.vert_count * 12)
        + align4(poly_count * POLY_SIZE)
        + align4(max_link_count * LINK_SIZE)
        + align4(poly_count * POLY_DETAIL_SIZE)
        + align4(unique_detail_vert_count * 12)
        + align4(params.detail_tri_count * 4)
        + align4(bv_slot_count * BV_NODE_SIZE);

    let header = MeshHeader {
        magic: DT_NAVMESH_MAGIC,
        version: DT_NAVMESH_VERSION,
        x: params.tile_x,
        y: params.tile_y,
        layer: 0,
        user_id: 0,
        poly_count: poly_count as i32,
        vert_count: params.vert_count as i32,
        max_link_count: max_link_count as i32,
        detail_mesh_count: poly_count as i32,
        detail_vert_count: unique_detail_vert_count as i32,
        detail_tri_count: params.detail_tri_count as i32,
        bv_node_count: bv_nodes.len() as i32,
        off_mesh_con_count: 0,
        off_mesh_base: poly_count as i32,
        walkable_height: params.walkable_height,
        walkable_radius: params.walkable_radius,
        walkable_climb: params.walkable_climb,
        bmin: params.bmin,
        bmax: params.bmax,
        bv_quant_factor: 1.0 / params.cs,
    };

    let mut buffer = Vec::with_capacity(data_size);
    header.write_to(&mut buffer)?;

    // Vertices, converted from grid to world space
    for v in params.verts[..params.vert_count * 3].chunks_exact(3) {
        buffer.write_f32::<LittleEndian>(params.bmin[0] + v[0] as f32 * params.cs)?;
        buffer.write_f32::<LittleEndian>(params.bmin[1] + v[1] as f32 * params.ch)?;
        buffer.write_f32::<LittleEndian>(params.bmin[2] + v[2] as f32 * params.cs)?;
    }

    // Polygons
    for (i, &nv) in poly_vert_counts.iter().enumerate() {
        let p = poly_slice(params, i);
        buffer.write_u32::<LittleEndian>(DT_NULL_LINK)?;
        for j in 0..DT_VERTS_PER_POLYGON {
            buffer.write_u16::<LittleEndian>(if j < nv { p[j] } else { 0 })?;
        }
        for j in 0..DT_VERTS_PER_POLYGON {
            let nei = if j < nv { convert_neighbor(p[nvp + j]) } else { 0 };
            buffer.write_u16::<LittleEndian>(nei)?;
        }
        buffer.write_u16::<LittleEndian>(params.poly_flags[i])?;
        buffer.write_u8(nv as u8)?;
        // Ground polygon type lives in the top two bits
        buffer.write_u8(params.poly_areas[i] & 0x3f)?;
    }

    // Links are created when the tile is added to a navigation mesh
    buffer.write_all(&vec![0u8; max_link_count * LINK_SIZE])?;

    // Detail sub-meshes
    let mut vbase = 0u32;
    for (i, &nv) in poly_vert_counts.iter().enumerate() {
        let ndv = params.detail_meshes[i * 4 + 1] as usize;
        buffer.write_u32::<LittleEndian>(vbase)?;
        buffer.write_u32::<LittleEndian>(params.detail_meshes[i * 4 + 2])?;
        buffer.write_u8((ndv - nv) as u8)?;
        buffer.write_u8(params.detail_meshes[i * 4 + 3] as u8)?;
        buffer.write_u16::<LittleEndian>(0)?;
        vbase += (ndv - nv) as u32;
    }

    // Detail vertices, skipping the ones equal to the polygon vertices
    for (i, &nv) in poly_vert_counts.iter().enumerate() {
        let vb = params.detail_meshes[i * 4] as usize;
        let ndv = params.detail_meshes[i * 4 + 1] as usize;
        for &v in &params.detail_verts[(vb + nv) * 3..(vb + ndv) * 3] {
            buffer.write_f32::<LittleEndian>(v)?;
        }
    }

    buffer.write_all(&params.detail_tris[..params.detail_tri_count * 4])?;

    for node in &bv_nodes {
        node.write_to(&mut buffer)?;
    }
    for _ in bv_nodes.len()..bv_slot_count {
        BVNode::default().write_to(&mut buffer)?;
    }

    debug_assert_eq!(buffer.len(), data_size);
    Ok(buffer)
}

/// Validates input parameters
fn validate_params(params: &NavMeshCreateParams<'_>) -> Result<()> {
    if params.nvp < 3 || params.nvp > DT_VERTS_PER_POLYGON {
        return Err(tile_error(format!("unsupported vertices per polygon {}", params.nvp)));
    }

    if params.vert_count == 0 || params.vert_count >= 0xffff {
        return Err(tile_error(format!("invalid vertex count {}", params.vert_count)));
    }

    if params.poly_count == 0 {
        return Err(tile_error("tile has no polygons".to_string()));
    }

    if params.off_mesh_con_count > 0 {
        return Err(tile_error("off-mesh connections are not supported".to_string()));
    }

    if params.verts.len() < params.vert_count * 3
        || params.polys.len() < params.poly_count * params.nvp * 2
        || params.poly_areas.len() < params.poly_count
        || params.poly_flags.len() < params.poly_count
    {
        return Err(tile_error("polygon mesh buffers are too short".to_string()));
    }

    if params.detail_meshes.len() < params.poly_count * 4
        || params.detail_verts.len() < params.detail_vert_count * 3
        || params.detail_tris.len() < params.detail_tri_count * 4
    {
        return Err(tile_error("detail mesh buffers are too short".to_string()));
    }

    if !(params.cs > 0.0 && params.ch > 0.0) {
        return Err(tile_error("cell dimensions must be positive".to_string()));
    }

    Ok(())
}

fn tile_error(message: String) -> Error {
    Error::TileData(message)
}

fn poly_slice<'a>(params: &NavMeshCreateParams<'a>, i: usize) -> &'a [u16] {
    let stride = params.nvp * 2;
    &params.polys[i * stride..(i + 1) * stride]
}

/// Converts a poly mesh neighbour entry to the tile representation
///
/// Internal neighbours become 1-based indices; tile-border portals become
/// external link markers with the Detour side encoding.
fn convert_neighbor(nei: u16) -> u16 {
    if nei & 0x8000 != 0 {
        match nei & 0xf {
            0 => DT_EXT_LINK | 4,
            1 => DT_EXT_LINK | 2,
            2 => DT_EXT_LINK,
            3 => DT_EXT_LINK | 6,
            _ => 0,
        }
    } else {
        nei.wrapping_add(1)
    }
}

#[derive(Debug, Clone, Copy)]
struct BVItem {
    bmin: [u16; 3],
    bmax: [u16; 3],
    i: i32,
}

/// Builds the quantized bounding volume tree over the tile polygons
fn create_bv_tree(params: &NavMeshCreateParams<'_>) -> Vec<BVNode> {
    let nvp = params.nvp;
    let y_scale = params.ch / params.cs;

    let mut items: Vec<BVItem> = (0..params.poly_count)
        .map(|i| {
            let p = poly_slice(params, i);
            let mut bmin = [u16::MAX; 3];
            let mut bmax = [0u16; 3];
            for &vi in p[..nvp].iter().take_while(|&&vi| vi != MESH_NULL_IDX) {
                let v = &params.verts[vi as usize * 3..vi as usize * 3 + 3];
                for k in 0..3 {
                    bmin[k] = bmin[k].min(v[k]);
                    bmax[k] = bmax[k].max(v[k]);
                }
            }
            // The tree uses cs for all axes, remap y
            bmin[1] = (bmin[1] as f32 * y_scale).floor() as u16;
            bmax[1] = (bmax[1] as f32 * y_scale).ceil() as u16;
            BVItem {
                bmin,
                bmax,
                i: i as i32,
            }
        })
        .collect();

    let mut nodes = Vec::with_capacity(params.poly_count * 2);
    let count = items.len();
    subdivide(&mut items, 0, count, &mut nodes);
    nodes
}

fn subdivide(items: &mut [BVItem], imin: usize, imax: usize, nodes: &mut Vec<BVNode>) {
    let inum = imax - imin;
    let icur = nodes.len();
    nodes.push(BVNode::default());

    if inum == 1 {
        nodes[icur] = BVNode {
            bmin: items[imin].bmin,
            bmax: items[imin].bmax,
            i: items[imin].i,
        };
        return;
    }

    let mut bmin = items[imin].bmin;
    let mut bmax = items[imin].bmax;
    for item in &items[imin + 1..imax] {
        for k in 0..3 {
            bmin[k] = bmin[k].min(item.bmin[k]);
            bmax[k] = bmax[k].max(item.bmax[k]);
        }
    }

    let axis = longest_axis(bmax[0] - bmin[0], bmax[1] - bmin[1], bmax[2] - bmin[2]);
    items[imin..imax].sort_by_key(|item| item.bmin[axis]);

    let isplit = imin + inum / 2;
    subdivide(items, imin, isplit, nodes);
    subdivide(items, isplit, imax, nodes);

    let iescape = (nodes.len() - icur) as i32;
    nodes[icur] = BVNode {
        bmin,
        bmax,
        i: -iescape,
    };
}

fn longest_axis(x: u16, y: u16, z: u16) -> usize {
    let mut axis = 0;
    let mut max_val = x;
    if y > max_val {
        axis = 1;
        max_val = y;
    }
    if z > max_val {
        axis = 2;
    }
    axis
}
