//! Masked and filtered render-target passes.
//!
//! Renders a filtered subset of scene geometry into isolated buffers,
//! optionally flattens it into a binary mask with override materials, and
//! publishes the result as a named global texture. A composite pass blends
//! the mask back into the camera color through an injected strategy.
//!
//! See [`renderer::FeatureRenderer`] for the host entry point.

pub mod config;
pub mod errors;
pub mod renderer;
pub mod scene;

pub use config::{CompositorConfig, FeatureConfig, MaskableConfig};
pub use errors::{MaskError, Result};
pub use renderer::FeatureRenderer;
pub use renderer::backend::{CommandExecutor, ExecuteTarget, RenderBuffer, SoftwareExecutor};
pub use renderer::feature::{MaskRendererFeature, MaskableRendererFeature, RendererFeature};
pub use renderer::filtering::{
    DrawingSettings, FilteringResult, FilteringSettings, LayerMask, RenderQueueRange,
    SortingCriteria,
};
pub use renderer::graph::{
    CameraReport, CommandBuffer, DepthWritePass, MaskCompositor, MaskPass, MaskableCompositePass,
    PipelineContext, RenderCommand, RenderNode, RenderPassEvent, TransientBufferPool,
};
pub use renderer::settings::{ColorFormat, MaskableSettings, PassInput, PassSettings};
pub use renderer::shader_tags::{LightModeTags, ShaderTagId};
pub use scene::{CameraData, CullingOracle, CullingResults, StaticScene, VisibleRenderer};
