//! Public tile builder
//!
//! [`NavigationBuilder`] stores the build settings and a geometry backend and
//! turns raw level geometry into a [`GeneratedData`] for one tile.

use glam::Vec3;

use crate::config::TileConfig;
use crate::context::{BuildContext, TimerCategory};
use crate::geometry::GeometryProcessing;
use crate::pipeline::{BuildStage, Pipeline, StageFailure};
use crate::projection::project_poly_mesh;
use crate::settings::BuildSettings;
use crate::tile_data::create_tile_data;

/// Result of a tile build, owned by the caller
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize, serde::Deserialize))]
pub struct GeneratedData {
    /// Whether the build produced a tile
    pub success: bool,
    /// World-space triangles of the walkable surface, three points each
    pub navmesh_vertices: Vec<Vec3>,
    /// Serialized tile
    pub navmesh_data: Vec<u8>,
}

impl GeneratedData {
    /// A failed build; both buffers are empty
    pub fn failed() -> Self {
        Self::default()
    }

    /// Size of the serialized tile in bytes
    pub fn navmesh_data_length(&self) -> usize {
        self.navmesh_data.len()
    }
}

/// Builds single navigation mesh tiles with a geometry backend
///
/// Each call to [`build_navmesh`](Self::build_navmesh) starts from a clean
/// context. The builder is not meant to be shared between threads; use one per
/// concurrent build.
pub struct NavigationBuilder<G: GeometryProcessing> {
    geometry: G,
    settings: BuildSettings,
    context: BuildContext,
    last_failed_stage: Option<BuildStage>,
}

impl<G: GeometryProcessing> NavigationBuilder<G> {
    /// Creates a builder with default settings
    pub fn new(geometry: G) -> Self {
        Self {
            geometry,
            settings: BuildSettings::default(),
            context: BuildContext::new(),
            last_failed_stage: None,
        }
    }

    /// Replaces the settings used by subsequent builds
    pub fn set_settings(&mut self, settings: BuildSettings) {
        self.settings = settings;
    }

    /// Settings as stored by the builder, including any cell clamping applied
    /// by the last build
    pub fn settings(&self) -> &BuildSettings {
        &self.settings
    }

    /// Log, timer and progress ledger of the last build
    pub fn context(&self) -> &BuildContext {
        &self.context
    }

    /// Mutable access to the context, e.g. to change its log level
    pub fn context_mut(&mut self) -> &mut BuildContext {
        &mut self.context
    }

    /// The geometry backend the builder drives
    pub fn geometry(&self) -> &G {
        &self.geometry
    }

    /// Stage at which the last build stopped, if it failed
    pub fn last_failed_stage(&self) -> Option<BuildStage> {
        self.last_failed_stage
    }

    /// Builds the tile described by the current settings from `vertices` and
    /// triangle `indices`
    ///
    /// Returns `None` when the settings' bounding box is empty on any axis.
    /// Every other problem yields a result with `success == false`.
    pub fn build_navmesh(&mut self, vertices: &[Vec3], indices: &[i32]) -> Option<GeneratedData> {
        self.context.reset();
        self.last_failed_stage = None;

        if self.settings.bounding_box.is_degenerate() {
            self.context.log_warning(format!(
                "Bounding box {:?} is empty, nothing to build",
                self.settings.bounding_box
            ));
            return None;
        }

        self.context.start_timer(TimerCategory::Total);
        let result = self.build_tile(vertices, indices);
        self.context.stop_timer(TimerCategory::Total);

        match result {
            Ok(data) => {
                self.context.log_info(format!(
                    "Built tile ({}, {}): {} triangles, {} bytes",
                    self.settings.tile_position.x,
                    self.settings.tile_position.y,
                    data.navmesh_vertices.len() / 3,
                    data.navmesh_data_length()
                ));
                Some(data)
            }
            Err(failure) => {
                self.context
                    .log_error_with_category(failure.to_string(), failure.stage.name());
                self.last_failed_stage = Some(failure.stage);
                Some(GeneratedData::failed())
            }
        }
    }

    fn build_tile(
        &mut self,
        vertices: &[Vec3],
        indices: &[i32],
    ) -> Result<GeneratedData, StageFailure> {
        self.settings
            .validate()
            .map_err(|e| StageFailure::new(BuildStage::Settings, e))?;
        self.settings.clamp_cell_dimensions();

        let config = TileConfig::from_settings(&self.settings)
            .map_err(|e| StageFailure::new(BuildStage::Settings, e))?;
        log::debug!(
            "Tile grid {}x{} cells, border {}, walkable height/climb/radius {}/{}/{}",
            config.width,
            config.height,
            config.border_size,
            config.walkable_height,
            config.walkable_climb,
            config.walkable_radius
        );

        let output =
            Pipeline::new(&mut self.geometry, &mut self.context, &config).run(vertices, indices)?;

        let navmesh_vertices = project_poly_mesh(
            &output.poly_mesh,
            self.settings.bounding_box.minimum,
            self.settings.cell_size,
            self.settings.cell_height,
        );

        self.context.start_timer(TimerCategory::TileData);
        let navmesh_data = create_tile_data(
            &mut self.geometry,
            &mut self.context,
            &output.poly_mesh,
            &output.detail_mesh,
            &self.settings,
        );
        self.context.stop_timer(TimerCategory::TileData);
        let navmesh_data = navmesh_data.map_err(|e| StageFailure::new(BuildStage::TileData, e))?;

        Ok(GeneratedData {
            success: true,
            navmesh_vertices,
            navmesh_data,
        })
    }
}
