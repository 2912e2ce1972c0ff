//! World-space triangulation of the final polygon mesh

use glam::Vec3;

use crate::polymesh::{PolyMesh, MESH_NULL_IDX};

/// Fan-triangulates every polygon and returns the corners in world space
///
/// `origin` is the minimum of the tile's bounding box before border padding.
/// Each grid vertex sits on top of its voxel, hence the extra cell on Y. The
/// result holds three points per triangle in polygon order, without sharing.
pub fn project_poly_mesh(
    mesh: &PolyMesh,
    origin: Vec3,
    cell_size: f32,
    cell_height: f32,
) -> Vec<Vec3> {
    let to_world = |index: u16| {
        let [x, y, z] = mesh.vert(index as usize);
        Vec3::new(
            origin.x + x as f32 * cell_size,
            origin.y + (y as f32 + 1.0) * cell_height,
            origin.z + z as f32 * cell_size,
        )
    };

    let mut vertices = Vec::new();
    for i in 0..mesh.npolys {
        let p = mesh.poly_verts(i);
        for j in 2..mesh.nvp {
            if p[j] == MESH_NULL_IDX {
                break;
            }
            vertices.push(to_world(p[0]));
            vertices.push(to_world(p[j - 1]));
            vertices.push(to_world(p[j]));
        }
    }

    vertices
}
