//! Maskable Composite Pass
//!
//! 两阶段掩码合成：先用白色覆盖材质把过滤后的几何体绘制到独立的
//! 过滤缓冲区，再交给注入的 [`MaskCompositor`] 与相机颜色缓冲合成。
//!
//! # 状态机（每相机每帧）
//! ```text
//! Idle → Setup → Cleared → DepthSeeded → (SkyboxSeeded?) → GeometryDrawn → Composited → Idle
//! ```
//!
//! # 天空盒预填充
//! 启用 `draw_skybox` 时，天空盒先绘制到过滤缓冲区，复制到 scratch，
//! 再经 StepThreshold 程序写回，连续的 alpha 被转换为二值掩码。
//!
//! # 失败处理
//! 合成策略返回错误时，其已录制的命令被丢弃，掩码本身保持完整；
//! 两个缓冲区仍在 cleanup 中释放。

use crate::errors::{MaskError, Result};
use crate::renderer::filtering::DrawingSettings;
use crate::renderer::graph::command::{BlitMaterial, ClearConfig, OverrideShader};
use crate::renderer::graph::context::{BufferRole, ExecuteContext, PassFrame, SetupContext};
use crate::renderer::graph::node::RenderNode;
use crate::renderer::graph::stage::RenderPassEvent;
use crate::renderer::settings::{ColorFormat, MaskableSettings, PassInput};
use crate::renderer::shader_tags::default_shader_tags;
use crate::scene::camera::CameraData;

use super::compositor::{CompositeInputs, MaskCompositor};

pub const FILTERING_BUFFER_NAME: &str = "_filteringBuffer";
pub const SCRATCH_BUFFER_NAME: &str = "_scratchBuffer";

const PROFILER_TAG: &str = "MaskableRenderPass";

/// Maskable Composite Pass
///
/// 合成行为由构造时注入的策略决定。
/// 缓冲区名与 profiler 标签按 `settings.name` 加后缀，多个实例可共存于同一相机。
pub struct MaskableCompositePass {
    settings: MaskableSettings,
    compositor: Box<dyn MaskCompositor>,
    profiler_tag: String,
    filtering_name: String,
    scratch_name: String,
}

impl MaskableCompositePass {
    #[must_use]
    pub fn new(settings: MaskableSettings, compositor: Box<dyn MaskCompositor>) -> Self {
        Self {
            profiler_tag: settings.profiler_tag(PROFILER_TAG),
            filtering_name: settings.scoped_name(FILTERING_BUFFER_NAME),
            scratch_name: settings.scoped_name(SCRATCH_BUFFER_NAME),
            settings,
            compositor,
        }
    }

    #[inline]
    #[must_use]
    pub fn settings(&self) -> &MaskableSettings {
        &self.settings
    }

    /// 白色覆盖材质 + 相机默认不透明排序
    #[must_use]
    pub fn drawing_settings(camera: &CameraData) -> DrawingSettings {
        DrawingSettings::new(default_shader_tags(), camera.default_opaque_sort)
            .with_override(OverrideShader::WhiteOverride)
    }
}

impl RenderNode for MaskableCompositePass {
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
        ctx.materials.resolve(OverrideShader::BlitToDepth)?;
        ctx.materials.resolve(OverrideShader::WhiteOverride)?;
        if self.settings.draw_skybox {
            ctx.materials.resolve(OverrideShader::StepThreshold)?;
        }

        // 双线性过滤：后续混合时掩码边缘更柔和
        let desc = ctx
            .camera
            .target
            .with_color_format(ColorFormat::Argb32)
            .with_depth_bits(32)
            .with_msaa_samples(1)
            .with_filter(wgpu::FilterMode::Linear);

        let mut frame = PassFrame::new();
        let filtering = ctx.acquire(&self.filtering_name, &desc)?;
        frame.add_buffer(BufferRole::Filtering, filtering);

        if self.settings.draw_skybox {
            let scratch = ctx.acquire(&self.scratch_name, &desc.with_depth_bits(0))?;
            frame.add_buffer(BufferRole::Scratch, scratch);
        }

        frame.capture_camera_color(ctx.camera.color_target);
        frame.configure_target(filtering);
        frame.configure_clear(ClearConfig::ALL);
        Ok(frame)
    }

    fn execute(&self, frame: &PassFrame, ctx: &mut ExecuteContext) -> Result<()> {
        let filtering = frame
            .buffer(BufferRole::Filtering)
            .ok_or_else(|| MaskError::InvalidTarget("no filtering buffer".to_owned()))?;
        let destination = frame
            .camera_color()
            .ok_or_else(|| MaskError::InvalidTarget("no composite destination".to_owned()))?;
        let camera = ctx.camera;
        let cmd = &mut *ctx.cmd;

        cmd.push_debug_group(self.profiler_tag.clone());

        // DepthSeeded
        cmd.blit(
            camera.depth_texture,
            filtering,
            Some(BlitMaterial::Override(OverrideShader::BlitToDepth)),
        );

        // SkyboxSeeded
        if self.settings.draw_skybox {
            let scratch = frame
                .buffer(BufferRole::Scratch)
                .ok_or_else(|| MaskError::InvalidTarget("no scratch buffer".to_owned()))?;
            cmd.draw_skybox();
            cmd.blit(filtering, scratch, None);
            cmd.blit(
                scratch,
                filtering,
                Some(BlitMaterial::Override(OverrideShader::StepThreshold)),
            );
        }

        // GeometryDrawn
        let drawing = Self::drawing_settings(camera);
        cmd.draw_renderers(drawing.clone(), self.settings.filtering_settings());
        cmd.submit();

        // Composited
        let mark = cmd.len();
        let inputs = CompositeInputs {
            mask: filtering,
            destination,
            drawing: &drawing,
            camera,
        };
        match self.compositor.composite(&inputs, cmd) {
            Ok(()) => cmd.submit(),
            Err(e) => {
                cmd.truncate(mark);
                log::warn!(
                    "{}: compositing skipped for camera `{}`: {e}",
                    self.profiler_tag,
                    camera.name
                );
            }
        }

        cmd.pop_debug_group();
        Ok(())
    }
}
