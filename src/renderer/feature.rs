//! Renderer Features
//!
//! A feature owns configured passes and contributes them to each camera's
//! frame. Features are created once at pipeline-configuration time; the
//! passes they own are stateless and reused by every camera.

use crate::renderer::graph::FrameBuilder;
use crate::renderer::graph::passes::{
    DepthWritePass, MaskCompositor, MaskPass, MaskableCompositePass,
};
use crate::renderer::settings::{MaskableSettings, PassSettings};
use crate::scene::camera::CameraData;

pub trait RendererFeature {
    fn name(&self) -> &str;

    /// Inactive features contribute no passes.
    fn is_active(&self) -> bool {
        true
    }

    fn add_render_passes<'a>(&'a self, camera: &CameraData, builder: &mut FrameBuilder<'a>);
}

/// One [`MaskPass`] per configured [`PassSettings`].
pub struct MaskRendererFeature {
    name: String,
    active: bool,
    passes: Vec<MaskPass>,
}

impl MaskRendererFeature {
    #[must_use]
    pub fn new(name: impl Into<String>, settings: &[PassSettings]) -> Self {
        Self {
            name: name.into(),
            active: true,
            passes: settings.iter().map(MaskPass::new).collect(),
        }
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    #[must_use]
    pub fn passes(&self) -> &[MaskPass] {
        &self.passes
    }
}

impl RendererFeature for MaskRendererFeature {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn add_render_passes<'a>(&'a self, _camera: &CameraData, builder: &mut FrameBuilder<'a>) {
        for pass in &self.passes {
            builder.add_node(pass);
        }
    }
}

/// Depth-write pass plus a composite pass with an injected recombination
/// strategy, both configured from one [`MaskableSettings`].
pub struct MaskableRendererFeature {
    name: String,
    active: bool,
    depth_pass: DepthWritePass,
    composite_pass: MaskableCompositePass,
}

impl MaskableRendererFeature {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        settings: MaskableSettings,
        compositor: Box<dyn MaskCompositor>,
    ) -> Self {
        Self {
            name: name.into(),
            active: true,
            depth_pass: DepthWritePass::new(settings.clone()),
            composite_pass: MaskableCompositePass::new(settings, compositor),
        }
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    #[must_use]
    pub fn settings(&self) -> &MaskableSettings {
        self.composite_pass.settings()
    }
}

impl RendererFeature for MaskableRendererFeature {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn add_render_passes<'a>(&'a self, _camera: &CameraData, builder: &mut FrameBuilder<'a>) {
        builder.add_node(&self.depth_pass);
        builder.add_node(&self.composite_pass);
    }
}
