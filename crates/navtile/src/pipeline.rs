//! Ordered tile build pipeline
//!
//! A [`Pipeline`] is created for a single build call and consumed by
//! [`Pipeline::run`]. Intermediate structures are plain owned values: each one
//! is dropped as soon as the next stage no longer needs it, and an early
//! return drops whatever is still alive, so no stage ever sees state left
//! over from a previous build.

use std::fmt;

use glam::Vec3;
use navtile_common::{Error, Result};

use crate::config::TileConfig;
use crate::context::{BuildContext, TimerCategory};
use crate::geometry::GeometryProcessing;
use crate::polymesh::{PolyMesh, PolyMeshDetail, RC_NULL_AREA};

/// Stages of a tile build, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuildStage {
    /// Settings validation, before anything is allocated
    Settings,
    /// Degenerate geometry and agent parameter rejection
    Input,
    Heightfield,
    Rasterization,
    Filtering,
    CompactHeightfield,
    Erosion,
    DistanceField,
    Regions,
    Contours,
    PolyMesh,
    DetailMesh,
    AreaFinalization,
    /// Tile serialization, after the pipeline finished
    TileData,
}

impl BuildStage {
    /// Stages run by the pipeline itself
    pub const PIPELINE: [BuildStage; 12] = [
        BuildStage::Input,
        BuildStage::Heightfield,
        BuildStage::Rasterization,
        BuildStage::Filtering,
        BuildStage::CompactHeightfield,
        BuildStage::Erosion,
        BuildStage::DistanceField,
        BuildStage::Regions,
        BuildStage::Contours,
        BuildStage::PolyMesh,
        BuildStage::DetailMesh,
        BuildStage::AreaFinalization,
    ];

    /// Human readable stage name
    pub fn name(self) -> &'static str {
        match self {
            BuildStage::Settings => "settings",
            BuildStage::Input => "input",
            BuildStage::Heightfield => "heightfield",
            BuildStage::Rasterization => "rasterization",
            BuildStage::Filtering => "filtering",
            BuildStage::CompactHeightfield => "compact heightfield",
            BuildStage::Erosion => "erosion",
            BuildStage::DistanceField => "distance field",
            BuildStage::Regions => "regions",
            BuildStage::Contours => "contours",
            BuildStage::PolyMesh => "poly mesh",
            BuildStage::DetailMesh => "detail mesh",
            BuildStage::AreaFinalization => "area finalization",
            BuildStage::TileData => "tile data",
        }
    }
}

impl fmt::Display for BuildStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A build that stopped at `stage`
#[derive(thiserror::Error, Debug)]
#[error("tile build failed at {stage}: {source}")]
pub struct StageFailure {
    /// Stage that reported the error
    pub stage: BuildStage,
    /// Error returned by the stage
    #[source]
    pub source: Error,
}

impl StageFailure {
    /// Tags `source` with the stage it came from
    pub fn new(stage: BuildStage, source: Error) -> Self {
        Self { stage, source }
    }
}

/// Final meshes of a successful pipeline run
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Polygon mesh with finalized areas and flags
    pub poly_mesh: PolyMesh,
    /// Height detail for `poly_mesh`
    pub detail_mesh: PolyMeshDetail,
}

/// Single-use driver for the geometry stages of one tile
pub struct Pipeline<'a, G: GeometryProcessing> {
    geometry: &'a mut G,
    ctx: &'a mut BuildContext,
    config: &'a TileConfig,
}

impl<'a, G: GeometryProcessing> Pipeline<'a, G> {
    /// Creates a pipeline for one build with the planned `config`
    pub fn new(geometry: &'a mut G, ctx: &'a mut BuildContext, config: &'a TileConfig) -> Self {
        Self {
            geometry,
            ctx,
            config,
        }
    }

    /// Runs every stage in order, stopping at the first failure
    pub fn run(
        mut self,
        verts: &[Vec3],
        tris: &[i32],
    ) -> std::result::Result<PipelineOutput, StageFailure> {
        let cfg = self.config;

        self.begin(BuildStage::Input);
        validate_input(verts, tris, cfg).map_err(|e| StageFailure::new(BuildStage::Input, e))?;

        self.begin(BuildStage::Heightfield);
        let mut heightfield = self.stage(BuildStage::Heightfield, |g, ctx| {
            g.create_heightfield(ctx, cfg.width, cfg.height, cfg.bmin, cfg.bmax, cfg.cs, cfg.ch)
        })?;

        self.begin(BuildStage::Rasterization);
        self.ctx.start_timer(TimerCategory::Rasterization);
        let mut areas = vec![RC_NULL_AREA; tris.len() / 3];
        self.geometry
            .mark_walkable_triangles(self.ctx, cfg.walkable_slope_angle, verts, tris, &mut areas);
        let rasterized = self.geometry.rasterize_triangles(
            self.ctx,
            verts,
            tris,
            &areas,
            &mut heightfield,
            cfg.walkable_climb,
        );
        drop(areas);
        self.ctx.stop_timer(TimerCategory::Rasterization);
        rasterized.map_err(|e| StageFailure::new(BuildStage::Rasterization, e))?;

        self.begin(BuildStage::Filtering);
        self.ctx.start_timer(TimerCategory::Filtering);
        self.geometry
            .filter_low_hanging_walkable_obstacles(self.ctx, cfg.walkable_climb, &mut heightfield);
        self.geometry.filter_ledge_spans(
            self.ctx,
            cfg.walkable_height,
            cfg.walkable_climb,
            &mut heightfield,
        );
        self.geometry
            .filter_walkable_low_height_spans(self.ctx, cfg.walkable_height, &mut heightfield);
        self.ctx.stop_timer(TimerCategory::Filtering);

        self.begin(BuildStage::CompactHeightfield);
        let mut chf = self.stage(BuildStage::CompactHeightfield, |g, ctx| {
            g.build_compact_heightfield(ctx, cfg.walkable_height, cfg.walkable_climb, &heightfield)
        })?;
        drop(heightfield);

        self.begin(BuildStage::Erosion);
        self.stage(BuildStage::Erosion, |g, ctx| {
            g.erode_walkable_area(ctx, cfg.walkable_radius, &mut chf)
        })?;

        self.begin(BuildStage::DistanceField);
        self.stage(BuildStage::DistanceField, |g, ctx| g.build_distance_field(ctx, &mut chf))?;

        self.begin(BuildStage::Regions);
        self.stage(BuildStage::Regions, |g, ctx| {
            g.build_regions(
                ctx,
                &mut chf,
                cfg.border_size,
                cfg.min_region_area,
                cfg.merge_region_area,
            )
        })?;

        self.begin(BuildStage::Contours);
        let cset = self.stage(BuildStage::Contours, |g, ctx| {
            g.build_contours(ctx, &chf, cfg.max_simplification_error, cfg.max_edge_len)
        })?;

        self.begin(BuildStage::PolyMesh);
        let mut poly_mesh = self.stage(BuildStage::PolyMesh, |g, ctx| {
            g.build_poly_mesh(ctx, &cset, cfg.max_vertices_per_polygon)
        })?;
        drop(cset);

        self.begin(BuildStage::DetailMesh);
        let detail_mesh = self.stage(BuildStage::DetailMesh, |g, ctx| {
            g.build_poly_mesh_detail(
                ctx,
                &poly_mesh,
                &chf,
                cfg.detail_sample_dist,
                cfg.detail_sample_max_error,
            )
        })?;
        drop(chf);

        self.begin(BuildStage::AreaFinalization);
        poly_mesh.finalize_areas();

        log::debug!(
            "Tile pipeline finished: {} polygons, {} vertices, {} detail triangles",
            poly_mesh.npolys,
            poly_mesh.nverts,
            detail_mesh.ntris
        );

        Ok(PipelineOutput {
            poly_mesh,
            detail_mesh,
        })
    }

    fn begin(&mut self, stage: BuildStage) {
        if let Some(index) = BuildStage::PIPELINE.iter().position(|&s| s == stage) {
            self.ctx
                .set_progress(index + 1, BuildStage::PIPELINE.len(), stage.name());
        }
        log::trace!("Tile pipeline stage: {}", stage);
    }

    /// Runs a fallible stage under its timer and tags any error with the stage
    fn stage<T>(
        &mut self,
        stage: BuildStage,
        f: impl FnOnce(&mut G, &mut BuildContext) -> Result<T>,
    ) -> std::result::Result<T, StageFailure> {
        let timer = timer_for(stage);
        if let Some(category) = timer {
            self.ctx.start_timer(category);
        }
        let result = f(&mut *self.geometry, &mut *self.ctx);
        if let Some(category) = timer {
            self.ctx.stop_timer(category);
        }
        result.map_err(|e| StageFailure::new(stage, e))
    }
}

fn timer_for(stage: BuildStage) -> Option<TimerCategory> {
    match stage {
        BuildStage::Rasterization => Some(TimerCategory::Rasterization),
        BuildStage::Filtering => Some(TimerCategory::Filtering),
        BuildStage::CompactHeightfield => Some(TimerCategory::CompactHeightfield),
        BuildStage::Erosion => Some(TimerCategory::Erosion),
        BuildStage::DistanceField | BuildStage::Regions => Some(TimerCategory::Regions),
        BuildStage::Contours => Some(TimerCategory::Contours),
        BuildStage::PolyMesh => Some(TimerCategory::PolyMesh),
        BuildStage::DetailMesh => Some(TimerCategory::DetailMesh),
        BuildStage::TileData => Some(TimerCategory::TileData),
        _ => None,
    }
}

/// Rejects geometry the pipeline cannot process
fn validate_input(verts: &[Vec3], tris: &[i32], config: &TileConfig) -> Result<()> {
    if verts.is_empty() || tris.is_empty() {
        return Err(Error::InvalidMesh("no vertices or no indices".to_string()));
    }

    if tris.len() % 3 != 0 {
        return Err(Error::InvalidMesh(format!(
            "index count {} is not a multiple of 3",
            tris.len()
        )));
    }

    if let Some(&index) = tris
        .iter()
        .find(|&&index| index < 0 || index as usize >= verts.len())
    {
        return Err(Error::InvalidMesh(format!(
            "index {} out of range for {} vertices",
            index,
            verts.len()
        )));
    }

    if config.walkable_climb < 0 {
        return Err(Error::InvalidMesh(format!(
            "walkable climb {} is negative",
            config.walkable_climb
        )));
    }

    Ok(())
}
