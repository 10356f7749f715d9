//! Depth Write Pass
//!
//! 使用仅写深度的覆盖材质把过滤后的几何体绘制到独立的全精度深度缓冲区，
//! 并以 `_ObjectsDepthBuffer`（命名实例加后缀）发布，供只需要深度遮挡掩码的消费者使用。
//!
//! 仅绘制几何体，不绘制天空盒与 UI。

use crate::errors::{MaskError, Result};
use crate::renderer::filtering::DrawingSettings;
use crate::renderer::graph::command::{ClearConfig, OverrideShader};
use crate::renderer::graph::context::{BufferRole, ExecuteContext, PassFrame, SetupContext};
use crate::renderer::graph::node::RenderNode;
use crate::renderer::graph::stage::RenderPassEvent;
use crate::renderer::settings::{ColorFormat, MaskableSettings, PassInput};
use crate::renderer::shader_tags::default_shader_tags;

pub const OBJECTS_DEPTH_BUFFER_NAME: &str = "_objectsDepthBuffer";
/// Global texture name of the published depth mask.
pub const OBJECTS_DEPTH_TEXTURE_NAME: &str = "_ObjectsDepthBuffer";

const PROFILER_TAG: &str = "RenderObjectsDepthPass";

pub struct DepthWritePass {
    settings: MaskableSettings,
    profiler_tag: String,
    buffer_name: String,
    texture_name: String,
}

impl DepthWritePass {
    #[must_use]
    pub fn new(settings: MaskableSettings) -> Self {
        Self {
            profiler_tag: settings.profiler_tag(PROFILER_TAG),
            buffer_name: settings.scoped_name(OBJECTS_DEPTH_BUFFER_NAME),
            texture_name: settings.scoped_name(OBJECTS_DEPTH_TEXTURE_NAME),
            settings,
        }
    }

    /// 发布的全局纹理名，未命名时为 `_ObjectsDepthBuffer`
    #[inline]
    #[must_use]
    pub fn texture_name(&self) -> &str {
        &self.texture_name
    }
}

impl RenderNode for DepthWritePass {
    fn name(&self) -> &str {
        &self.profiler_tag
    }

    fn event(&self) -> RenderPassEvent {
        self.settings.render_pass_event
    }

    fn inputs(&self) -> PassInput {
        PassInput::DEPTH
    }

    fn setup(&self, ctx: &mut SetupContext) -> Result<PassFrame> {
        ctx.materials.resolve(OverrideShader::WriteDepth)?;

        let desc = ctx
            .camera
            .target
            .with_color_format(ColorFormat::Depth)
            .with_depth_bits(32)
            .with_msaa_samples(1)
            .with_filter(wgpu::FilterMode::Nearest);
        let depth = ctx.acquire(&self.buffer_name, &desc)?;

        let mut frame = PassFrame::new();
        frame.add_buffer(BufferRole::Depth, depth);
        frame.configure_target(depth);
        frame.configure_clear(ClearConfig::ALL);
        Ok(frame)
    }

    fn execute(&self, frame: &PassFrame, ctx: &mut ExecuteContext) -> Result<()> {
        let depth = frame
            .buffer(BufferRole::Depth)
            .ok_or_else(|| MaskError::InvalidTarget("no depth buffer".to_owned()))?;
        let drawing = DrawingSettings::new(default_shader_tags(), ctx.camera.default_opaque_sort)
            .with_override(OverrideShader::WriteDepth);

        let cmd = &mut *ctx.cmd;
        cmd.push_debug_group(self.profiler_tag.clone());
        cmd.draw_renderers(drawing, self.settings.filtering_settings());
        cmd.submit();
        cmd.set_global_texture(self.texture_name.clone(), depth);
        cmd.pop_debug_group();
        Ok(())
    }
}
