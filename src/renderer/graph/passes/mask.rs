//! Mask Render Pass
//!
//! 将经过过滤的场景几何体绘制到独立的颜色缓冲区，并以全局纹理名发布，
//! 供后处理或合成阶段采样。
//!
//! # 数据流
//! ```text
//! Camera Depth ──BlitToDepth──▶ Mask Buffer ◀── Skybox? / Renderers? / UI?
//!                                   │
//!                                   ▼
//!                        Global Texture (texture_name)
//! ```
//!
//! # 注意
//! - 掩码缓冲区固定为 32 位深度、单采样，下游需要已解析的图像
//! - 缓冲区名称取自 `texture_name`，同一相机可以存在多个 MaskPass
//! - `draw_renderers` 为 false 时不录制绘制命令，过滤列表不会被求值

use crate::errors::{MaskError, Result};
use crate::renderer::filtering::DrawingSettings;
use crate::renderer::graph::command::{BlitMaterial, ClearConfig, OverrideShader};
use crate::renderer::graph::context::{BufferRole, ExecuteContext, PassFrame, SetupContext};
use crate::renderer::graph::node::RenderNode;
use crate::renderer::graph::stage::RenderPassEvent;
use crate::renderer::settings::{PassInput, PassSettings};

/// Mask Render Pass
///
/// 单阶段掩码 Pass：清屏 → 写入相机深度 → 按固定顺序绘制 → 发布。
pub struct MaskPass {
    /// 已钳制的配置
    settings: PassSettings,
    /// 调试分组名称：`MaskRenderPass: <texture_name>`
    profiler_tag: String,
}

impl MaskPass {
    #[must_use]
    pub fn new(settings: &PassSettings) -> Self {
        let settings = settings.clamped();
        let profiler_tag = format!("MaskRenderPass: {}", settings.texture_name);
        Self {
            settings,
            profiler_tag,
        }
    }

    #[inline]
    #[must_use]
    pub fn settings(&self) -> &PassSettings {
        &self.settings
    }
}

impl RenderNode for MaskPass {
    fn name(&self) -> &str {
        &self.profiler_tag
    }

    fn event(&self) -> RenderPassEvent {
        self.settings.render_pass_event
    }

    fn inputs(&self) -> PassInput {
        // 需要宿主生成相机深度纹理
        self.settings.render_pass_input | PassInput::DEPTH
    }

    fn setup(&self, ctx: &mut SetupContext) -> Result<PassFrame> {
        ctx.materials.resolve(OverrideShader::BlitToDepth)?;

        let desc = ctx
            .camera
            .target
            .with_color_format(self.settings.color_format)
            .with_depth_bits(32)
            .with_msaa_samples(1)
            .with_filter(wgpu::FilterMode::Nearest);
        let color = ctx.acquire(&self.settings.texture_name, &desc)?;

        let mut frame = PassFrame::new();
        frame.add_buffer(BufferRole::Color, color);
        frame.configure_target(color);
        frame.configure_clear(ClearConfig::ALL);
        Ok(frame)
    }

    fn execute(&self, frame: &PassFrame, ctx: &mut ExecuteContext) -> Result<()> {
        let color = frame
            .buffer(BufferRole::Color)
            .ok_or_else(|| MaskError::InvalidTarget(format!("{}: no mask buffer", self.name())))?;
        let cmd = &mut *ctx.cmd;

        cmd.push_debug_group(self.profiler_tag.clone());

        cmd.blit(
            ctx.camera.depth_texture,
            color,
            Some(BlitMaterial::Override(OverrideShader::BlitToDepth)),
        );

        if self.settings.draw_skybox {
            cmd.draw_skybox();
        }

        if self.settings.draw_renderers {
            let drawing =
                DrawingSettings::new(self.settings.shader_tags(), self.settings.sorting_criteria);
            cmd.draw_renderers(drawing, self.settings.filtering_settings());
        }

        if self.settings.draw_ui_overlay {
            cmd.draw_ui_overlay();
        }

        cmd.submit();
        cmd.set_global_texture(self.settings.texture_name.clone(), color);
        cmd.pop_debug_group();
        Ok(())
    }
}
