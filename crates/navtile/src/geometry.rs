//! Geometry processing backend interface
//!
//! The voxelization, region and meshing algorithms live behind
//! [`GeometryProcessing`]. The pipeline only sequences the calls and owns the
//! intermediate structures; it never looks inside a heightfield, compact
//! heightfield or contour set. Dropping one of those handles must release
//! everything it holds.

use glam::Vec3;
use navtile_common::{calc_tri_normal, walkable_threshold, Result};

use crate::context::BuildContext;
use crate::polymesh::{PolyMesh, PolyMeshDetail, RC_WALKABLE_AREA};
use crate::tile_data::NavMeshCreateParams;

/// The geometry processing capability the tile pipeline is built on
pub trait GeometryProcessing {
    /// Voxel heightfield of solid spans
    type Heightfield;
    /// Open-span representation with neighbour connectivity
    type CompactHeightfield;
    /// Simplified region outlines
    type ContourSet;

    /// Allocates a heightfield covering `width` x `height` cells between `bmin` and `bmax`
    #[allow(clippy::too_many_arguments)]
    fn create_heightfield(
        &mut self,
        ctx: &mut BuildContext,
        width: i32,
        height: i32,
        bmin: Vec3,
        bmax: Vec3,
        cs: f32,
        ch: f32,
    ) -> Result<Self::Heightfield>;

    /// Sets the area of every triangle flatter than `walkable_slope_angle` to
    /// [`RC_WALKABLE_AREA`]; other entries are left untouched
    fn mark_walkable_triangles(
        &mut self,
        _ctx: &mut BuildContext,
        walkable_slope_angle: f32,
        verts: &[Vec3],
        tris: &[i32],
        areas: &mut [u8],
    ) {
        mark_walkable_triangles(walkable_slope_angle, verts, tris, areas);
    }

    /// Rasterizes the triangles into the heightfield using the per-triangle areas
    fn rasterize_triangles(
        &mut self,
        ctx: &mut BuildContext,
        verts: &[Vec3],
        tris: &[i32],
        areas: &[u8],
        heightfield: &mut Self::Heightfield,
        flag_merge_threshold: i32,
    ) -> Result<()>;

    /// Marks non-walkable spans as walkable when their maximum is within
    /// `walkable_climb` of a walkable span below
    fn filter_low_hanging_walkable_obstacles(
        &mut self,
        ctx: &mut BuildContext,
        walkable_climb: i32,
        heightfield: &mut Self::Heightfield,
    );

    /// Removes walkable spans next to drops the agent cannot climb
    fn filter_ledge_spans(
        &mut self,
        ctx: &mut BuildContext,
        walkable_height: i32,
        walkable_climb: i32,
        heightfield: &mut Self::Heightfield,
    );

    /// Removes walkable spans with less than `walkable_height` clearance
    fn filter_walkable_low_height_spans(
        &mut self,
        ctx: &mut BuildContext,
        walkable_height: i32,
        heightfield: &mut Self::Heightfield,
    );

    /// Builds the compact representation of the heightfield's open spans
    fn build_compact_heightfield(
        &mut self,
        ctx: &mut BuildContext,
        walkable_height: i32,
        walkable_climb: i32,
        heightfield: &Self::Heightfield,
    ) -> Result<Self::CompactHeightfield>;

    /// Erodes the walkable area by `radius` cells
    fn erode_walkable_area(
        &mut self,
        ctx: &mut BuildContext,
        radius: i32,
        chf: &mut Self::CompactHeightfield,
    ) -> Result<()>;

    /// Builds the distance field used by region partitioning
    fn build_distance_field(
        &mut self,
        ctx: &mut BuildContext,
        chf: &mut Self::CompactHeightfield,
    ) -> Result<()>;

    /// Partitions the walkable surface into regions without holes
    fn build_regions(
        &mut self,
        ctx: &mut BuildContext,
        chf: &mut Self::CompactHeightfield,
        border_size: i32,
        min_region_area: i32,
        merge_region_area: i32,
    ) -> Result<()>;

    /// Traces and simplifies the region outlines
    fn build_contours(
        &mut self,
        ctx: &mut BuildContext,
        chf: &Self::CompactHeightfield,
        max_error: f32,
        max_edge_len: i32,
    ) -> Result<Self::ContourSet>;

    /// Builds convex polygons with at most `nvp` vertices from the contours
    fn build_poly_mesh(
        &mut self,
        ctx: &mut BuildContext,
        cset: &Self::ContourSet,
        nvp: usize,
    ) -> Result<PolyMesh>;

    /// Builds the height detail mesh for `mesh`
    fn build_poly_mesh_detail(
        &mut self,
        ctx: &mut BuildContext,
        mesh: &PolyMesh,
        chf: &Self::CompactHeightfield,
        sample_dist: f32,
        sample_max_error: f32,
    ) -> Result<PolyMeshDetail>;

    /// Serializes a tile; defaults to the Detour tile layout
    fn create_nav_mesh_data(
        &mut self,
        _ctx: &mut BuildContext,
        params: &NavMeshCreateParams<'_>,
    ) -> Result<Vec<u8>> {
        crate::binary_format::create_nav_mesh_data(params)
    }
}

/// Marks triangles as walkable based on slope angle
///
/// Matches rcMarkWalkableTriangles. Indices must already be validated against
/// `verts`.
pub fn mark_walkable_triangles(
    walkable_slope_angle: f32,
    verts: &[Vec3],
    tris: &[i32],
    areas: &mut [u8],
) {
    let walkable_thr = walkable_threshold(walkable_slope_angle);

    for (tri, area) in tris.chunks_exact(3).zip(areas.iter_mut()) {
        let norm = calc_tri_normal(
            verts[tri[0] as usize],
            verts[tri[1] as usize],
            verts[tri[2] as usize],
        );
        if norm.y > walkable_thr {
            *area = RC_WALKABLE_AREA;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::polymesh::RC_NULL_AREA;

    #[test]
    fn test_mark_walkable_triangles_by_slope() {
        let verts = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(0.0, 0.0, 1.0),
            Vec3::new(1.0, 0.0, 0.0),
            // steep wall
            Vec3::new(0.0, 1.0, 0.0),
            // 30 degree ramp rising along +X
            Vec3::new(1.0, 0.577_35, 0.0),
        ];
        let tris = vec![
            0, 1, 2, // flat floor
            0, 3, 1, // vertical wall
            0, 1, 4, // ramp
            0, 2, 1, // flat but facing down
        ];
        let mut areas = vec![RC_NULL_AREA; 4];

        mark_walkable_triangles(45.0, &verts, &tris, &mut areas);
        assert_eq!(areas, vec![RC_WALKABLE_AREA, RC_NULL_AREA, RC_WALKABLE_AREA, RC_NULL_AREA]);

        let mut areas = vec![RC_NULL_AREA; 4];
        mark_walkable_triangles(20.0, &verts, &tris, &mut areas);
        assert_eq!(areas, vec![RC_WALKABLE_AREA, RC_NULL_AREA, RC_NULL_AREA, RC_NULL_AREA]);
    }

    #[test]
    fn test_mark_walkable_preserves_existing_areas() {
        let verts = vec![Vec3::ZERO, Vec3::Y, Vec3::Z];
        let tris = vec![0, 1, 2];
        let mut areas = vec![7u8];
        mark_walkable_triangles(45.0, &verts, &tris, &mut areas);
        assert_eq!(areas, vec![7]);
    }
}
