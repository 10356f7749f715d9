//! Render Commands
//!
//! Passes never touch buffers directly during execute. They record a strictly
//! ordered list of [`RenderCommand`]s into a [`CommandBuffer`], which the host
//! submits to its [`CommandExecutor`](crate::renderer::backend::CommandExecutor).
//! Recording is synchronous; the recorded order is the execution order.

use std::borrow::Cow;

use glam::Vec4;

use crate::renderer::filtering::{DrawingSettings, FilteringSettings};
use crate::renderer::graph::transient_pool::BufferHandle;

/// The external shader programs the passes depend on.
///
/// Their numeric behavior (for example the step threshold) is a contract
/// owned by the program, not by the pass that uses it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OverrideShader {
    /// Copies source depth into the destination depth attachment; color is untouched.
    BlitToDepth,
    /// Flat white, writes depth.
    WhiteOverride,
    /// Binary step on source alpha: covered → white, otherwise transparent.
    StepThreshold,
    /// Writes depth only.
    WriteDepth,
}

impl OverrideShader {
    pub const ALL: [Self; 4] = [
        Self::BlitToDepth,
        Self::WhiteOverride,
        Self::StepThreshold,
        Self::WriteDepth,
    ];

    /// Shader asset path of the program.
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::BlitToDepth => "Hidden/BlitToDepth",
            Self::WhiteOverride => "Shader Graphs/White Override",
            Self::StepThreshold => "Hidden/StepThreshold",
            Self::WriteDepth => "Shader Graphs/WriteToDepth",
        }
    }
}

/// Material bound to a blit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BlitMaterial {
    Override(OverrideShader),
    /// `dst.rgb = mix(dst.rgb, tint.rgb, src.a * tint.a)`.
    MaskTint(Vec4),
    /// `dst *= 1 - src.a`.
    MaskCutout,
}

/// Which planes a clear touches.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClearConfig {
    pub color: Option<wgpu::Color>,
    pub depth: Option<f32>,
}

impl ClearConfig {
    /// Color to transparent and depth to the far plane.
    pub const ALL: Self = Self {
        color: Some(wgpu::Color::TRANSPARENT),
        depth: Some(1.0),
    };
}

#[derive(Debug, Clone, PartialEq)]
pub enum RenderCommand {
    PushDebugGroup(Cow<'static, str>),
    PopDebugGroup,
    SetRenderTarget(BufferHandle),
    ClearRenderTarget(ClearConfig),
    /// Copies `source` into `dest` through `material` (plain color copy when
    /// `None`). The render target is `dest` afterwards.
    Blit {
        source: BufferHandle,
        dest: BufferHandle,
        material: Option<BlitMaterial>,
    },
    DrawSkybox,
    /// Filters the camera's culling results and draws the selection.
    DrawRenderers {
        drawing: DrawingSettings,
        filtering: FilteringSettings,
    },
    DrawUiOverlay,
    SetGlobalTexture {
        name: Cow<'static, str>,
        buffer: BufferHandle,
    },
    ReleaseTemporary(BufferHandle),
    Submit,
}

impl RenderCommand {
    /// Whether the command rasterizes scene content.
    #[inline]
    #[must_use]
    pub fn is_draw(&self) -> bool {
        matches!(
            self,
            Self::DrawSkybox | Self::DrawRenderers { .. } | Self::DrawUiOverlay
        )
    }
}

/// Ordered command list for one pass phase.
#[derive(Debug, Clone, Default)]
pub struct CommandBuffer {
    label: Cow<'static, str>,
    commands: Vec<RenderCommand>,
}

impl CommandBuffer {
    #[must_use]
    pub fn new(label: impl Into<Cow<'static, str>>) -> Self {
        Self {
            label: label.into(),
            commands: Vec::with_capacity(16),
        }
    }

    #[inline]
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[inline]
    #[must_use]
    pub fn commands(&self) -> &[RenderCommand] {
        &self.commands
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Drops every command recorded after `len`.
    pub fn truncate(&mut self, len: usize) {
        self.commands.truncate(len);
    }

    /// Removes and returns the recorded commands.
    pub fn take(&mut self) -> Vec<RenderCommand> {
        std::mem::take(&mut self.commands)
    }

    #[inline]
    pub fn push(&mut self, command: RenderCommand) {
        self.commands.push(command);
    }

    pub fn push_debug_group(&mut self, label: impl Into<Cow<'static, str>>) {
        self.push(RenderCommand::PushDebugGroup(label.into()));
    }

    pub fn pop_debug_group(&mut self) {
        self.push(RenderCommand::PopDebugGroup);
    }

    pub fn set_render_target(&mut self, target: BufferHandle) {
        self.push(RenderCommand::SetRenderTarget(target));
    }

    pub fn clear_render_target(&mut self, clear: ClearConfig) {
        self.push(RenderCommand::ClearRenderTarget(clear));
    }

    pub fn blit(&mut self, source: BufferHandle, dest: BufferHandle, material: Option<BlitMaterial>) {
        self.push(RenderCommand::Blit {
            source,
            dest,
            material,
        });
    }

    pub fn draw_skybox(&mut self) {
        self.push(RenderCommand::DrawSkybox);
    }

    pub fn draw_renderers(&mut self, drawing: DrawingSettings, filtering: FilteringSettings) {
        self.push(RenderCommand::DrawRenderers { drawing, filtering });
    }

    pub fn draw_ui_overlay(&mut self) {
        self.push(RenderCommand::DrawUiOverlay);
    }

    pub fn set_global_texture(&mut self, name: impl Into<Cow<'static, str>>, buffer: BufferHandle) {
        self.push(RenderCommand::SetGlobalTexture {
            name: name.into(),
            buffer,
        });
    }

    pub fn release_temporary(&mut self, buffer: BufferHandle) {
        self.push(RenderCommand::ReleaseTemporary(buffer));
    }

    pub fn submit(&mut self) {
        self.push(RenderCommand::Submit);
    }
}
