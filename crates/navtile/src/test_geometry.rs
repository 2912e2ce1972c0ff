//! Deterministic geometry backend for pipeline tests
//!
//! Every heightfield, compact heightfield and contour set handed out carries a
//! drop guard, so tests can check how many are alive at any call. The voxel
//! model is deliberately crude: a walkable triangle marks every cell under its
//! XZ bounds at the cell containing its highest vertex, and the contours and
//! polygon mesh are a single quad over the rectangle of walkable cells.

use std::cell::RefCell;
use std::rc::Rc;

use glam::Vec3;
use navtile_common::{Error, Result};

use crate::context::BuildContext;
use crate::geometry::{mark_walkable_triangles, GeometryProcessing};
use crate::polymesh::{PolyMesh, PolyMeshDetail, MESH_NULL_IDX, RC_NULL_AREA, RC_WALKABLE_AREA};
use crate::tile_data::NavMeshCreateParams;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockOp {
    CreateHeightfield,
    MarkWalkable,
    Rasterize,
    FilterLowHanging,
    FilterLedges,
    FilterLowHeight,
    CompactHeightfield,
    Erode,
    DistanceField,
    Regions,
    Contours,
    PolyMesh,
    DetailMesh,
    NavMeshData,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HandleKind {
    Heightfield,
    CompactHeightfield,
    ContourSet,
}

/// Number of handles alive per kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LiveCounts {
    pub heightfields: usize,
    pub compact_heightfields: usize,
    pub contour_sets: usize,
}

impl LiveCounts {
    pub fn total(&self) -> usize {
        self.heightfields + self.compact_heightfields + self.contour_sets
    }
}

#[derive(Debug, Default)]
pub struct Ledger {
    live: LiveCounts,
    created: LiveCounts,
    /// Every backend call with the handles alive when it was made
    pub calls: Vec<(MockOp, LiveCounts)>,
}

impl Ledger {
    pub fn live(&self) -> LiveCounts {
        self.live
    }

    pub fn created(&self) -> LiveCounts {
        self.created
    }

    pub fn ops(&self) -> Vec<MockOp> {
        self.calls.iter().map(|(op, _)| *op).collect()
    }

    pub fn count(&self, op: MockOp) -> usize {
        self.calls.iter().filter(|(o, _)| *o == op).count()
    }

    /// Live handles at the most recent call of `op`
    pub fn live_at(&self, op: MockOp) -> Option<LiveCounts> {
        self.calls
            .iter()
            .rev()
            .find(|(o, _)| *o == op)
            .map(|(_, live)| *live)
    }

    fn counter(counts: &mut LiveCounts, kind: HandleKind) -> &mut usize {
        match kind {
            HandleKind::Heightfield => &mut counts.heightfields,
            HandleKind::CompactHeightfield => &mut counts.compact_heightfields,
            HandleKind::ContourSet => &mut counts.contour_sets,
        }
    }
}

struct Tracked {
    kind: HandleKind,
    ledger: Rc<RefCell<Ledger>>,
}

impl Tracked {
    fn new(kind: HandleKind, ledger: &Rc<RefCell<Ledger>>) -> Self {
        {
            let mut ledger = ledger.borrow_mut();
            *Ledger::counter(&mut ledger.live, kind) += 1;
            *Ledger::counter(&mut ledger.created, kind) += 1;
        }
        Self {
            kind,
            ledger: Rc::clone(ledger),
        }
    }
}

impl Drop for Tracked {
    fn drop(&mut self) {
        let mut ledger = self.ledger.borrow_mut();
        *Ledger::counter(&mut ledger.live, self.kind) -= 1;
    }
}

/// Cell grid shared by the mock heightfields, `None` for cells without a
/// walkable span
#[derive(Clone)]
struct CellGrid {
    width: i32,
    height: i32,
    bmin: Vec3,
    cs: f32,
    ch: f32,
    cells: Vec<Option<i32>>,
}

impl CellGrid {
    fn walkable_rect(&self) -> Option<(i32, i32, i32, i32, i32)> {
        let mut rect: Option<(i32, i32, i32, i32, i32)> = None;
        for z in 0..self.height {
            for x in 0..self.width {
                if let Some(y) = self.cells[(x + z * self.width) as usize] {
                    rect = Some(match rect {
                        None => (x, z, x + 1, z + 1, y),
                        Some((x0, z0, x1, z1, top)) => {
                            (x0.min(x), z0.min(z), x1.max(x + 1), z1.max(z + 1), top.max(y))
                        }
                    });
                }
            }
        }
        rect
    }
}

pub struct MockHeightfield {
    grid: CellGrid,
    _tracked: Tracked,
}

pub struct MockCompactHeightfield {
    grid: CellGrid,
    _tracked: Tracked,
}

pub struct MockContourSet {
    /// Walkable rectangle `(x0, z0, x1, z1, y)` in border-padded cells
    rect: (i32, i32, i32, i32, i32),
    grid_width: i32,
    bmin: Vec3,
    bmax: Vec3,
    cs: f32,
    ch: f32,
    border_size: i32,
    max_error: f32,
    _tracked: Tracked,
}

/// Geometry backend with failure injection
pub struct MockGeometry {
    ledger: Rc<RefCell<Ledger>>,
    /// Operation that returns an error instead of running
    pub fail_at: Option<MockOp>,
    /// Makes the tile serializer report success with an empty blob
    pub empty_tile: bool,
    border_size: i32,
}

impl MockGeometry {
    pub fn new() -> Self {
        Self {
            ledger: Rc::new(RefCell::new(Ledger::default())),
            fail_at: None,
            empty_tile: false,
            border_size: 0,
        }
    }

    pub fn failing_at(op: MockOp) -> Self {
        Self {
            fail_at: Some(op),
            ..Self::new()
        }
    }

    pub fn with_empty_tile() -> Self {
        Self {
            empty_tile: true,
            ..Self::new()
        }
    }

    pub fn ledger(&self) -> std::cell::Ref<'_, Ledger> {
        self.ledger.borrow()
    }

    fn enter(&self, op: MockOp) -> Result<()> {
        let mut ledger = self.ledger.borrow_mut();
        let live = ledger.live;
        ledger.calls.push((op, live));

        if self.fail_at == Some(op) {
            return Err(Error::Geometry(format!("injected failure in {:?}", op)));
        }
        Ok(())
    }
}

impl GeometryProcessing for MockGeometry {
    type Heightfield = MockHeightfield;
    type CompactHeightfield = MockCompactHeightfield;
    type ContourSet = MockContourSet;

    fn create_heightfield(
        &mut self,
        _ctx: &mut BuildContext,
        width: i32,
        height: i32,
        bmin: Vec3,
        _bmax: Vec3,
        cs: f32,
        ch: f32,
    ) -> Result<MockHeightfield> {
        self.enter(MockOp::CreateHeightfield)?;
        Ok(MockHeightfield {
            grid: CellGrid {
                width,
                height,
                bmin,
                cs,
                ch,
                cells: vec![None; (width * height) as usize],
            },
            _tracked: Tracked::new(HandleKind::Heightfield, &self.ledger),
        })
    }

    fn mark_walkable_triangles(
        &mut self,
        _ctx: &mut BuildContext,
        walkable_slope_angle: f32,
        verts: &[Vec3],
        tris: &[i32],
        areas: &mut [u8],
    ) {
        let _ = self.enter(MockOp::MarkWalkable);
        mark_walkable_triangles(walkable_slope_angle, verts, tris, areas);
    }

    fn rasterize_triangles(
        &mut self,
        _ctx: &mut BuildContext,
        verts: &[Vec3],
        tris: &[i32],
        areas: &[u8],
        heightfield: &mut MockHeightfield,
        _flag_merge_threshold: i32,
    ) -> Result<()> {
        self.enter(MockOp::Rasterize)?;
        let grid = &mut heightfield.grid;

        for (tri, &area) in tris.chunks_exact(3).zip(areas) {
            if area == RC_NULL_AREA {
                continue;
            }
            let corners = [
                verts[tri[0] as usize],
                verts[tri[1] as usize],
                verts[tri[2] as usize],
            ];
            let lo = corners[0].min(corners[1]).min(corners[2]);
            let hi = corners[0].max(corners[1]).max(corners[2]);

            let x0 = (((lo.x - grid.bmin.x) / grid.cs).floor() as i32).max(0);
            let z0 = (((lo.z - grid.bmin.z) / grid.cs).floor() as i32).max(0);
            let x1 = (((hi.x - grid.bmin.x) / grid.cs).ceil() as i32).min(grid.width);
            let z1 = (((hi.z - grid.bmin.z) / grid.cs).ceil() as i32).min(grid.height);
            let y = (((hi.y - grid.bmin.y) / grid.ch).floor() as i32).max(0);

            for z in z0..z1 {
                for x in x0..x1 {
                    let cell = &mut grid.cells[(x + z * grid.width) as usize];
                    *cell = Some(cell.map_or(y, |top| top.max(y)));
                }
            }
        }
        Ok(())
    }

    fn filter_low_hanging_walkable_obstacles(
        &mut self,
        _ctx: &mut BuildContext,
        _walkable_climb: i32,
        _heightfield: &mut MockHeightfield,
    ) {
        let _ = self.enter(MockOp::FilterLowHanging);
    }

    fn filter_ledge_spans(
        &mut self,
        _ctx: &mut BuildContext,
        _walkable_height: i32,
        _walkable_climb: i32,
        _heightfield: &mut MockHeightfield,
    ) {
        let _ = self.enter(MockOp::FilterLedges);
    }

    fn filter_walkable_low_height_spans(
        &mut self,
        _ctx: &mut BuildContext,
        _walkable_height: i32,
        _heightfield: &mut MockHeightfield,
    ) {
        let _ = self.enter(MockOp::FilterLowHeight);
    }

    fn build_compact_heightfield(
        &mut self,
        _ctx: &mut BuildContext,
        _walkable_height: i32,
        _walkable_climb: i32,
        heightfield: &MockHeightfield,
    ) -> Result<MockCompactHeightfield> {
        self.enter(MockOp::CompactHeightfield)?;
        Ok(MockCompactHeightfield {
            grid: heightfield.grid.clone(),
            _tracked: Tracked::new(HandleKind::CompactHeightfield, &self.ledger),
        })
    }

    fn erode_walkable_area(
        &mut self,
        _ctx: &mut BuildContext,
        _radius: i32,
        _chf: &mut MockCompactHeightfield,
    ) -> Result<()> {
        self.enter(MockOp::Erode)
    }

    fn build_distance_field(
        &mut self,
        _ctx: &mut BuildContext,
        _chf: &mut MockCompactHeightfield,
    ) -> Result<()> {
        self.enter(MockOp::DistanceField)
    }

    fn build_regions(
        &mut self,
        _ctx: &mut BuildContext,
        chf: &mut MockCompactHeightfield,
        border_size: i32,
        _min_region_area: i32,
        _merge_region_area: i32,
    ) -> Result<()> {
        self.enter(MockOp::Regions)?;
        if chf.grid.cells.iter().all(Option::is_none) {
            return Err(Error::Geometry("no walkable cells to partition".to_string()));
        }
        self.border_size = border_size;
        Ok(())
    }

    fn build_contours(
        &mut self,
        _ctx: &mut BuildContext,
        chf: &MockCompactHeightfield,
        max_error: f32,
        _max_edge_len: i32,
    ) -> Result<MockContourSet> {
        self.enter(MockOp::Contours)?;
        let grid = &chf.grid;
        let rect = grid
            .walkable_rect()
            .ok_or_else(|| Error::Geometry("no regions to trace".to_string()))?;

        // Contours are expressed without the border, like rcBuildContours
        let pad = self.border_size as f32 * grid.cs;
        let bmin = grid.bmin + Vec3::new(pad, 0.0, pad);
        let size = (grid.width - self.border_size * 2) as f32 * grid.cs;
        let bmax = Vec3::new(bmin.x + size, bmin.y + 64.0 * grid.ch, bmin.z + size);

        Ok(MockContourSet {
            rect,
            grid_width: grid.width,
            bmin,
            bmax,
            cs: grid.cs,
            ch: grid.ch,
            border_size: self.border_size,
            max_error,
            _tracked: Tracked::new(HandleKind::ContourSet, &self.ledger),
        })
    }

    fn build_poly_mesh(
        &mut self,
        _ctx: &mut BuildContext,
        cset: &MockContourSet,
        nvp: usize,
    ) -> Result<PolyMesh> {
        self.enter(MockOp::PolyMesh)?;

        let tile = cset.grid_width - cset.border_size * 2;
        let (x0, z0, x1, z1, y) = cset.rect;
        let clip = |v: i32| (v - cset.border_size).clamp(0, tile) as u16;
        let (x0, z0, x1, z1) = (clip(x0), clip(z0), clip(x1), clip(z1));
        if x0 == x1 || z0 == z1 {
            return Err(Error::Geometry("walkable area lies in the border".to_string()));
        }
        let y = y as u16;

        let mut mesh = PolyMesh::new(nvp, cset.border_size);
        mesh.verts = vec![x0, y, z0, x0, y, z1, x1, y, z1, x1, y, z0];
        mesh.nverts = 4;
        mesh.polys = vec![MESH_NULL_IDX; nvp * 2];
        mesh.polys[..4].copy_from_slice(&[0, 1, 2, 3]);
        mesh.npolys = 1;
        mesh.regs = vec![1];
        mesh.areas = vec![RC_WALKABLE_AREA];
        mesh.flags = vec![0];
        mesh.bmin = cset.bmin;
        mesh.bmax = cset.bmax;
        mesh.cs = cset.cs;
        mesh.ch = cset.ch;
        mesh.max_edge_error = cset.max_error;
        Ok(mesh)
    }

    fn build_poly_mesh_detail(
        &mut self,
        _ctx: &mut BuildContext,
        mesh: &PolyMesh,
        _chf: &MockCompactHeightfield,
        _sample_dist: f32,
        _sample_max_error: f32,
    ) -> Result<PolyMeshDetail> {
        self.enter(MockOp::DetailMesh)?;

        let mut detail = PolyMeshDetail::new();
        for i in 0..mesh.nverts {
            let [x, y, z] = mesh.vert(i);
            detail.verts.extend_from_slice(&[
                mesh.bmin.x + x as f32 * mesh.cs,
                mesh.bmin.y + (y as f32 + 1.0) * mesh.ch,
                mesh.bmin.z + z as f32 * mesh.cs,
            ]);
        }
        detail.nverts = mesh.nverts;
        detail.meshes = vec![0, mesh.nverts as u32, 0, 2];
        detail.nmeshes = 1;
        detail.tris = vec![0, 1, 2, 0, 0, 2, 3, 0];
        detail.ntris = 2;
        Ok(detail)
    }

    fn create_nav_mesh_data(
        &mut self,
        _ctx: &mut BuildContext,
        params: &NavMeshCreateParams<'_>,
    ) -> Result<Vec<u8>> {
        self.enter(MockOp::NavMeshData)?;
        if self.empty_tile {
            return Ok(Vec::new());
        }
        crate::binary_format::create_nav_mesh_data(params)
    }
}

/// Two triangles covering `[min, max]` on XZ at height `y`, facing up
pub fn flat_quad(min: [f32; 2], max: [f32; 2], y: f32) -> (Vec<Vec3>, Vec<i32>) {
    let verts = vec![
        Vec3::new(min[0], y, min[1]),
        Vec3::new(min[0], y, max[1]),
        Vec3::new(max[0], y, max[1]),
        Vec3::new(max[0], y, min[1]),
    ];
    (verts, vec![0, 1, 2, 0, 2, 3])
}

/// A vertical wall along X, too steep to walk on
pub fn wall(min_x: f32, max_x: f32, z: f32, height: f32) -> (Vec<Vec3>, Vec<i32>) {
    let verts = vec![
        Vec3::new(min_x, 0.0, z),
        Vec3::new(min_x, height, z),
        Vec3::new(max_x, height, z),
        Vec3::new(max_x, 0.0, z),
    ];
    (verts, vec![0, 1, 2, 0, 2, 3])
}
