//! Feature Renderer
//!
//! Entry point for hosts: owns the configured [`RendererFeature`]s and drives
//! one camera at a time through the per-frame pass lifecycle.
//!
//! # Frame Flow
//!
//! ```text
//! pipeline.begin_frame()            clear global slots
//! for each camera:
//!     oracle.cull(camera)           frame-local visible set
//!     FrameBuilder → RenderGraph    sort by (event, registration)
//!     RenderGraph::execute          setup → execute → inspect → cleanup
//!     pool.end_frame()              leak check
//! ```

pub mod backend;
pub mod feature;
pub mod filtering;
pub mod graph;
pub mod settings;
pub mod shader_tags;

use crate::renderer::backend::CommandExecutor;
use crate::renderer::feature::RendererFeature;
use crate::renderer::graph::{CameraReport, FrameBuilder, PipelineContext, RenderGraph};
use crate::renderer::settings::PassInput;
use crate::scene::camera::CameraData;
use crate::scene::culling::CullingOracle;

#[derive(Default)]
pub struct FeatureRenderer {
    features: Vec<Box<dyn RendererFeature>>,
}

impl FeatureRenderer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_feature(mut self, feature: Box<dyn RendererFeature>) -> Self {
        self.features.push(feature);
        self
    }

    pub fn add_feature(&mut self, feature: Box<dyn RendererFeature>) {
        self.features.push(feature);
    }

    #[must_use]
    pub fn features(&self) -> &[Box<dyn RendererFeature>] {
        &self.features
    }

    /// Collects the passes of every active feature, in execution order.
    #[must_use]
    pub fn build_graph<'a>(&'a self, camera: &CameraData) -> RenderGraph<'a> {
        let mut builder = FrameBuilder::new();
        for feature in self.features.iter().filter(|f| f.is_active()) {
            feature.add_render_passes(camera, &mut builder);
        }
        builder.build()
    }

    /// Inputs the host must produce for `camera` before the passes run.
    #[must_use]
    pub fn required_inputs(&self, camera: &CameraData) -> PassInput {
        self.build_graph(camera).required_inputs()
    }

    pub fn render_camera<E>(
        &self,
        pipeline: &mut PipelineContext,
        camera: &CameraData,
        oracle: &dyn CullingOracle,
        executor: &mut E,
    ) -> CameraReport
    where
        E: CommandExecutor + ?Sized,
    {
        self.render_camera_with(pipeline, camera, oracle, executor, |_| {})
    }

    /// Like [`render_camera`](Self::render_camera), calling `inspect` after
    /// every pass executed and before any buffer is released.
    pub fn render_camera_with<E>(
        &self,
        pipeline: &mut PipelineContext,
        camera: &CameraData,
        oracle: &dyn CullingOracle,
        executor: &mut E,
        inspect: impl FnMut(&PipelineContext),
    ) -> CameraReport
    where
        E: CommandExecutor + ?Sized,
    {
        let culling = oracle.cull(camera);
        let graph = self.build_graph(camera);
        log::debug!(
            "camera `{}`: {} visible renderer(s), passes [{}]",
            camera.name,
            culling.len(),
            graph.node_names().collect::<Vec<_>>().join(", ")
        );
        graph.execute(pipeline, camera, &culling, executor, inspect)
    }

    /// Starts a frame and renders every camera in order.
    pub fn render_frame<E>(
        &self,
        pipeline: &mut PipelineContext,
        cameras: &[CameraData],
        oracle: &dyn CullingOracle,
        executor: &mut E,
    ) -> Vec<CameraReport>
    where
        E: CommandExecutor + ?Sized,
    {
        self.render_frame_with(pipeline, cameras, oracle, executor, |_| {})
    }

    /// Like [`render_frame`](Self::render_frame), with `inspect` called once
    /// per camera.
    pub fn render_frame_with<E>(
        &self,
        pipeline: &mut PipelineContext,
        cameras: &[CameraData],
        oracle: &dyn CullingOracle,
        executor: &mut E,
        mut inspect: impl FnMut(&PipelineContext),
    ) -> Vec<CameraReport>
    where
        E: CommandExecutor + ?Sized,
    {
        pipeline.begin_frame();
        cameras
            .iter()
            .map(|camera| self.render_camera_with(pipeline, camera, oracle, executor, &mut inspect))
            .collect()
    }
}
