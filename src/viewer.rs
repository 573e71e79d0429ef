use std::time::Instant;

use crate::error::{GenerationError, LoadError, ViewerError};
use crate::mesh::{self, ModelAsset, SourceMesh};
use crate::occluder::{
    GenerationConfig, GenerationParams, GenerationStats, OccluderGenerator, Parameter,
    ParameterLimits,
};
use crate::renderer::buffers::{MeshBuffer, OccluderBuffer};
use crate::renderer::camera::{OrbitCamera, model_matrix};
use crate::renderer::device::RenderDevice;
use crate::renderer::pipelines::PipelineKey;

/// Per-draw uniform block, mirrored by `DrawUniforms` in `shaders.wgsl`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct DrawUniforms {
    pub mvp: [[f32; 4]; 4],
    pub color: [f32; 4],
}

#[derive(Debug)]
pub struct DrawCommand<'a, B> {
    pub pipeline: PipelineKey,
    pub vertex_buffer: &'a B,
    pub index_buffer: Option<&'a B>,
    /// Vertices for unindexed draws, indices for indexed ones.
    pub element_count: u32,
    pub uniforms: DrawUniforms,
}

/// Everything the GPU needs to draw one frame, in submission order.
#[derive(Debug)]
pub struct FramePlan<'a, B> {
    pub clear_color: [f32; 4],
    pub draws: Vec<DrawCommand<'a, B>>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneSettings {
    pub camera: OrbitCamera,
    pub tint: [f32; 3],
    pub mesh_alpha: f32,
    pub occluder_color: [f32; 4],
    pub clear_color: [f32; 4],
}

impl Default for SceneSettings {
    fn default() -> Self {
        Self {
            camera: OrbitCamera::default(),
            tint: [1.0, 0.5, 0.5],
            mesh_alpha: 0.5,
            occluder_color: [0.92, 0.18, 0.29, 0.6],
            clear_color: [0.64, 0.76, 0.91, 1.0],
        }
    }
}

#[derive(Debug, Clone)]
pub struct ViewerOptions {
    pub initial_model: String,
    pub scene: SceneSettings,
    pub limits: ParameterLimits,
    /// Box types and debug settings. Voxel size and fill come from the
    /// model placement on every switch.
    pub generation: GenerationConfig,
}

impl Default for ViewerOptions {
    fn default() -> Self {
        Self {
            initial_model: mesh::MODELS[0].id.to_string(),
            scene: SceneSettings::default(),
            limits: ParameterLimits::default(),
            generation: GenerationConfig::default(),
        }
    }
}

struct ViewerState<B> {
    active_model: &'static ModelAsset,
    mesh: MeshBuffer<B>,
    occluder: OccluderBuffer<B>,
    angle: f32,
}

/// Owns the GPU buffers and generation parameters and keeps them in step
/// with model switches and regenerations.
pub struct ViewerController<D: RenderDevice, G> {
    device: D,
    generator: G,
    state: ViewerState<D::Buffer>,
    params: GenerationParams,
    limits: ParameterLimits,
    scene: SceneSettings,
    last_stats: Option<GenerationStats>,
}

impl<D, G> ViewerController<D, G>
where
    D: RenderDevice,
    G: OccluderGenerator,
{
    /// Loads the initial model and runs the first generation.
    pub fn new(device: D, generator: G, options: ViewerOptions) -> Result<Self, ViewerError> {
        let first = mesh::find_model(&options.initial_model)
            .ok_or_else(|| LoadError::UnknownModel(options.initial_model.clone()))?;

        let mut controller = Self {
            device,
            generator,
            state: ViewerState {
                active_model: first,
                mesh: MeshBuffer::default(),
                occluder: OccluderBuffer::default(),
                angle: 0.0,
            },
            params: GenerationParams {
                mesh: SourceMesh::default(),
                config: options.generation,
            },
            limits: options.limits,
            scene: options.scene,
            last_stats: None,
        };

        controller.select_model(first.id)?;
        Ok(controller)
    }

    pub fn select_model(&mut self, id: &str) -> Result<(), LoadError> {
        let model = mesh::find_model(id).ok_or_else(|| LoadError::UnknownModel(id.to_string()))?;

        let shapes = mesh::parse_shapes(model.source)?;
        let source = SourceMesh::from_shapes(&shapes)?;
        let vertices = mesh::render_vertices(&shapes, self.scene.tint);

        self.state.mesh.upload(&self.device, &vertices)?;
        self.state.active_model = model;

        self.params.mesh = source;
        let placement = model.placement;
        self.set_parameter(Parameter::VoxelSize(placement.voxel_size));
        self.set_parameter(Parameter::FillPercentage(placement.fill_percentage));

        log::info!(
            "Loaded '{}': {} shapes, {} render vertices",
            model.id,
            shapes.len(),
            vertices.len()
        );

        match self.regenerate_occluder() {
            Ok(()) => {}
            Err(GenerationError::Device(err)) => return Err(err.into()),
            Err(err) => log::warn!("Keeping previous occluder for '{}': {}", model.id, err),
        }

        Ok(())
    }

    /// Runs the generator with the current parameters. An empty or malformed
    /// result leaves the bound occluder in place.
    pub fn regenerate_occluder(&mut self) -> Result<(), GenerationError> {
        if self.params.config.box_types.is_empty() {
            log::warn!("Generation skipped: no box types selected");
            return Err(GenerationError::InvalidConfig("no box types selected"));
        }
        if self.params.mesh.vertices.is_empty() {
            return Err(GenerationError::InvalidConfig("no source mesh loaded"));
        }

        let start = Instant::now();
        let result = self.generator.generate(&self.params);
        self.last_stats = Some(result.stats);

        if result.debug_mesh.is_empty() {
            log::info!(
                "Generator returned no occluder for '{}' (voxel {:.3}, fill {:.2})",
                self.state.active_model.id,
                self.params.config.voxel_size,
                self.params.config.fill_percentage
            );
            return Err(GenerationError::EmptyResult);
        }
        if let Err(reason) = result.debug_mesh.check() {
            log::warn!(
                "Rejected occluder for '{}': {}",
                self.state.active_model.id,
                reason
            );
            return Err(GenerationError::InvalidResult(reason));
        }

        self.state.occluder.upload(&self.device, &result.debug_mesh)?;

        log::info!(
            "Generated occluder for '{}': {} vertices, {} indices, {} boxes in {:.1?}",
            self.state.active_model.id,
            result.debug_mesh.vertices.len(),
            result.debug_mesh.indices.len(),
            result.stats.boxes_used,
            start.elapsed()
        );
        Ok(())
    }

    /// Edits one generation field. Regeneration stays explicit.
    pub fn set_parameter(&mut self, parameter: Parameter) {
        self.params.config.apply(parameter, &self.limits);
    }

    /// Advances the rotation and builds this frame's draws. Nothing is drawn
    /// until both the mesh and an occluder are resident.
    pub fn render_frame(
        &mut self,
        width: u32,
        height: u32,
        depth_test: bool,
        angle_delta: f32,
    ) -> FramePlan<'_, D::Buffer> {
        let state = &mut self.state;
        state.angle = (state.angle + angle_delta) % std::f32::consts::TAU;

        let mut plan = FramePlan {
            clear_color: self.scene.clear_color,
            draws: Vec::with_capacity(2),
        };

        let (Some(mesh), Some(occluder)) = (state.mesh.get(), state.occluder.get()) else {
            return plan;
        };

        let mvp = self.scene.camera.view_projection(width, height)
            * model_matrix(state.angle, &state.active_model.placement);
        let mvp = mvp.to_cols_array_2d();
        let (mesh_pipeline, occluder_pipeline) = PipelineKey::select(depth_test);

        plan.draws.push(DrawCommand {
            pipeline: mesh_pipeline,
            vertex_buffer: &mesh.vertices,
            index_buffer: None,
            element_count: mesh.vertex_count,
            uniforms: DrawUniforms {
                mvp,
                color: [1.0, 1.0, 1.0, self.scene.mesh_alpha],
            },
        });
        plan.draws.push(DrawCommand {
            pipeline: occluder_pipeline,
            vertex_buffer: &occluder.vertices,
            index_buffer: Some(&occluder.indices),
            element_count: occluder.index_count,
            uniforms: DrawUniforms {
                mvp,
                color: self.scene.occluder_color,
            },
        });

        plan
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.params.config
    }

    pub fn limits(&self) -> &ParameterLimits {
        &self.limits
    }

    pub fn active_model(&self) -> &'static ModelAsset {
        self.state.active_model
    }

    pub fn vertex_count(&self) -> u32 {
        self.state.mesh.vertex_count()
    }

    pub fn index_count(&self) -> u32 {
        self.state.occluder.index_count()
    }

    pub fn last_stats(&self) -> Option<&GenerationStats> {
        self.last_stats.as_ref()
    }

    /// Releases every GPU buffer. Frames rendered afterwards are empty.
    pub fn shutdown(&mut self) {
        let mesh = self.state.mesh.release();
        let occluder = self.state.occluder.release();
        log::info!(
            "Viewer shut down (released mesh: {}, occluder: {})",
            mesh,
            occluder
        );
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use glam::Vec3;

    use super::*;
    use crate::error::DeviceError;
    use crate::mesh::{MODELS, parse_shapes};
    use crate::occluder::{BoxTypeFlags, DebugMesh, OccluderResult, VoxelOccluderGenerator};
    use crate::renderer::device::testing::{RecordedBuffer, RecordingDevice};
    use crate::renderer::pipelines::{DepthMode, GeometryStream};

    type TestController<G> = ViewerController<RecordingDevice, G>;

    fn voxel_controller() -> TestController<VoxelOccluderGenerator> {
        ViewerController::new(
            RecordingDevice::default(),
            VoxelOccluderGenerator::default(),
            ViewerOptions::default(),
        )
        .unwrap()
    }

    fn quad() -> DebugMesh {
        DebugMesh {
            vertices: vec![Vec3::ZERO, Vec3::X, Vec3::Y, Vec3::ONE],
            indices: vec![0, 1, 2, 2, 1, 3],
        }
    }

    /// Generator returning `quad()` until `empty` is set.
    fn switchable(
        empty: Rc<Cell<bool>>,
        calls: Rc<Cell<u32>>,
    ) -> impl FnMut(&GenerationParams) -> OccluderResult {
        move |_params: &GenerationParams| {
            calls.set(calls.get() + 1);
            if empty.get() {
                OccluderResult::default()
            } else {
                OccluderResult {
                    debug_mesh: quad(),
                    ..Default::default()
                }
            }
        }
    }

    fn occluder_ids<D: RenderDevice<Buffer = RecordedBuffer>, G>(
        controller: &ViewerController<D, G>,
    ) -> Option<(u64, u64)> {
        controller
            .state
            .occluder
            .get()
            .map(|o| (o.vertices.id, o.indices.id))
    }

    #[test]
    fn every_model_loads_with_one_vertex_per_index() {
        let mut controller = voxel_controller();

        for model in MODELS {
            controller.select_model(model.id).unwrap();

            let shapes = parse_shapes(model.source).unwrap();
            let expected: usize = shapes.iter().map(|s| s.indices.len()).sum();
            assert_eq!(controller.vertex_count() as usize, expected, "{}", model.id);
            assert_eq!(controller.active_model().id, model.id);
        }
    }

    #[test]
    fn select_applies_model_defaults() {
        let mut controller = voxel_controller();
        controller.select_model("sphere").unwrap();

        let placement = controller.active_model().placement;
        assert_eq!(controller.config().voxel_size, placement.voxel_size);
        assert_eq!(controller.config().fill_percentage, placement.fill_percentage);
    }

    #[test]
    fn cube_with_regular_boxes_draws_twice() {
        let mut controller = voxel_controller();
        controller.select_model("cube").unwrap();
        controller.set_parameter(Parameter::VoxelSize(0.15));
        controller.set_parameter(Parameter::FillPercentage(1.0));
        controller.set_parameter(Parameter::BoxTypes(BoxTypeFlags::REGULAR));
        controller.regenerate_occluder().unwrap();

        let plan = controller.render_frame(800, 600, false, 0.01);
        assert_eq!(plan.draws.len(), 2);

        let mesh = &plan.draws[0];
        assert_eq!(mesh.pipeline.stream, GeometryStream::Mesh);
        assert!(mesh.index_buffer.is_none());
        assert!(mesh.element_count > 0);

        let occluder = &plan.draws[1];
        assert_eq!(occluder.pipeline.stream, GeometryStream::Occluder);
        assert!(occluder.index_buffer.is_some());
        assert!(occluder.element_count > 0);
    }

    #[test]
    fn no_box_types_never_reaches_the_generator() {
        let calls = Rc::new(Cell::new(0));
        let mut controller = ViewerController::new(
            RecordingDevice::default(),
            switchable(Rc::new(Cell::new(false)), Rc::clone(&calls)),
            ViewerOptions::default(),
        )
        .unwrap();
        let before = occluder_ids(&controller);
        assert_eq!(calls.get(), 1);

        let none = BoxTypeFlags::from_selection(false, false, false, false, false);
        controller.set_parameter(Parameter::BoxTypes(none));

        assert_eq!(
            controller.regenerate_occluder(),
            Err(GenerationError::InvalidConfig("no box types selected"))
        );
        assert_eq!(calls.get(), 1);
        assert_eq!(occluder_ids(&controller), before);
    }

    #[test]
    fn empty_result_keeps_previous_occluder() {
        let empty = Rc::new(Cell::new(false));
        let mut controller = ViewerController::new(
            RecordingDevice::default(),
            switchable(Rc::clone(&empty), Rc::new(Cell::new(0))),
            ViewerOptions::default(),
        )
        .unwrap();
        let before = occluder_ids(&controller);
        let count = controller.index_count();
        assert!(before.is_some());

        empty.set(true);
        assert_eq!(
            controller.regenerate_occluder(),
            Err(GenerationError::EmptyResult)
        );

        assert_eq!(occluder_ids(&controller), before);
        assert_eq!(controller.index_count(), count);
        assert!(controller.device.is_live(before.unwrap().0));
    }

    #[test]
    fn malformed_result_is_never_bound() {
        let broken = Rc::new(Cell::new(true));
        let flag = Rc::clone(&broken);
        let mut controller = ViewerController::new(
            RecordingDevice::default(),
            move |_params: &GenerationParams| OccluderResult {
                debug_mesh: if flag.get() {
                    DebugMesh {
                        vertices: vec![Vec3::ZERO, Vec3::X, Vec3::Y],
                        indices: vec![0, 1, 500],
                    }
                } else {
                    quad()
                },
                ..Default::default()
            },
            ViewerOptions::default(),
        )
        .unwrap();

        assert_eq!(occluder_ids(&controller), None);
        assert_eq!(controller.index_count(), 0);
        assert!(controller.render_frame(800, 600, false, 0.0).draws.is_empty());

        broken.set(false);
        controller.regenerate_occluder().unwrap();
        let before = occluder_ids(&controller);
        assert_eq!(controller.index_count(), 6);

        broken.set(true);
        assert!(matches!(
            controller.regenerate_occluder(),
            Err(GenerationError::InvalidResult(_))
        ));
        assert_eq!(occluder_ids(&controller), before);
        assert_eq!(controller.index_count(), 6);
        assert_eq!(controller.device.live_buffers().len(), 3);
    }

    #[test]
    fn regeneration_is_idempotent() {
        let mut controller = voxel_controller();
        controller.select_model("sphere").unwrap();

        controller.regenerate_occluder().unwrap();
        let first = (controller.index_count(), controller.last_stats().copied());
        controller.regenerate_occluder().unwrap();
        let second = (controller.index_count(), controller.last_stats().copied());

        assert_eq!(first, second);
    }

    #[test]
    fn switching_models_frees_the_old_mesh_buffer() {
        let mut controller = voxel_controller();
        controller.select_model("cube").unwrap();
        let old = controller.state.mesh.get().unwrap().vertices.id;

        controller.select_model("torus").unwrap();
        let shapes = parse_shapes(mesh::find_model("torus").unwrap().source).unwrap();
        let expected: usize = shapes.iter().map(|s| s.indices.len()).sum();
        assert_eq!(controller.vertex_count() as usize, expected);
        assert!(!controller.device.is_live(old));

        let plan = controller.render_frame(640, 480, true, 0.0);
        assert!(plan.draws.iter().all(|d| d.vertex_buffer.id != old));
    }

    #[test]
    fn unknown_model_keeps_current_state() {
        let mut controller = voxel_controller();
        let vertices = controller.vertex_count();

        assert_eq!(
            controller.select_model("teapot"),
            Err(LoadError::UnknownModel("teapot".into()))
        );
        assert_eq!(controller.active_model().id, MODELS[0].id);
        assert_eq!(controller.vertex_count(), vertices);
    }

    #[test]
    fn unknown_initial_model_fails_startup() {
        let options = ViewerOptions {
            initial_model: "teapot".into(),
            ..Default::default()
        };
        let result = ViewerController::new(
            RecordingDevice::default(),
            VoxelOccluderGenerator::default(),
            options,
        );
        assert!(matches!(
            result,
            Err(ViewerError::Load(LoadError::UnknownModel(_)))
        ));
    }

    #[test]
    fn nothing_is_drawn_without_an_occluder() {
        let mut controller = ViewerController::new(
            RecordingDevice::default(),
            switchable(Rc::new(Cell::new(true)), Rc::new(Cell::new(0))),
            ViewerOptions::default(),
        )
        .unwrap();

        assert!(controller.vertex_count() > 0);
        assert_eq!(controller.index_count(), 0);
        let plan = controller.render_frame(800, 600, true, 0.01);
        assert!(plan.draws.is_empty());
        assert_eq!(plan.clear_color, SceneSettings::default().clear_color);
    }

    #[test]
    fn depth_toggle_selects_pipeline_pair() {
        let mut controller = voxel_controller();

        let plan = controller.render_frame(800, 600, true, 0.0);
        assert!(plan.draws.iter().all(|d| d.pipeline.depth == DepthMode::Tested));

        let plan = controller.render_frame(800, 600, false, 0.0);
        assert!(plan.draws.iter().all(|d| d.pipeline.depth == DepthMode::Overlay));
    }

    #[test]
    fn device_failure_while_loading_is_fatal() {
        let mut controller = voxel_controller();
        let before = controller.vertex_count();

        controller.device.fail_next_creation();
        let err = controller.select_model("sphere").unwrap_err();

        assert_eq!(err, LoadError::Device(DeviceError::OutOfMemory));
        assert!(err.is_fatal());
        assert_eq!(controller.active_model().id, MODELS[0].id);
        assert_eq!(controller.vertex_count(), before);
    }

    #[test]
    fn shutdown_releases_all_buffers() {
        let mut controller = voxel_controller();
        assert_eq!(controller.device.live_buffers().len(), 3);

        controller.shutdown();
        assert!(controller.device.live_buffers().is_empty());
        assert!(controller.render_frame(800, 600, false, 0.0).draws.is_empty());
    }
}
