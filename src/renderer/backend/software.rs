//! Software Command Executor
//!
//! A deterministic CPU interpreter for recorded [`RenderCommand`]s. It owns no
//! buffers; every command resolves its handles through the transient pool of
//! the [`PipelineContext`](crate::renderer::graph::context::PipelineContext),
//! so a stale handle fails exactly like it would on a GPU backend.
//!
//! # Programs
//!
//! | Program | Effect |
//! |---------|--------|
//! | `BlitToDepth` | source depth (or source red channel) → destination depth |
//! | `StepThreshold` | source alpha ≥ threshold → white, otherwise transparent |
//! | `WhiteOverride` | draws write white and depth |
//! | `WriteDepth` | draws write depth only |
//! | `MaskTint` | tints destination rgb by source alpha |
//! | `MaskCutout` | scales destination by `1 - source alpha` |
//!
//! Draws rasterize each renderer's screen rect with a less-or-equal depth
//! test whenever the render target has a depth plane.

use std::borrow::Cow;

use glam::Vec4;
use serde::{Deserialize, Serialize};

use super::buffer::{FAR_DEPTH, RenderBuffer};
use super::{CommandExecutor, ExecuteTarget};
use crate::errors::{MaskError, Result};
use crate::renderer::filtering::{DrawingSettings, FilteringResult, FilteringSettings};
use crate::renderer::graph::command::{
    BlitMaterial, ClearConfig, CommandBuffer, OverrideShader, RenderCommand,
};
use crate::renderer::graph::transient_pool::{BufferHandle, TransientBufferPool};

/// Numeric contract of the step-threshold program.
///
/// The threshold belongs to the program, not to the passes using it. Bump
/// `version` whenever `threshold` or the step curve changes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StepThresholdContract {
    pub version: u32,
    pub threshold: f32,
}

impl Default for StepThresholdContract {
    fn default() -> Self {
        Self {
            version: 1,
            threshold: 0.5,
        }
    }
}

impl StepThresholdContract {
    #[inline]
    #[must_use]
    pub fn step(&self, alpha: f32) -> Vec4 {
        if alpha >= self.threshold {
            Vec4::ONE
        } else {
            Vec4::ZERO
        }
    }
}

/// Counters collected across every executed command buffer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecutorStats {
    /// Times a filter spec was evaluated against culling results.
    pub filter_evaluations: u64,
    /// Renderers, skyboxes and overlay elements drawn.
    pub draw_calls: u64,
    pub blits: u64,
    pub clears: u64,
    pub submits: u64,
}

enum Shading {
    Material,
    Flat(Vec4),
    DepthOnly,
}

#[derive(Debug, Default)]
pub struct SoftwareExecutor {
    contract: StepThresholdContract,
    stats: ExecutorStats,
    current: Option<BufferHandle>,
    debug_groups: Vec<Cow<'static, str>>,
}

impl SoftwareExecutor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_contract(contract: StepThresholdContract) -> Self {
        Self {
            contract,
            ..Self::default()
        }
    }

    #[inline]
    #[must_use]
    pub fn contract(&self) -> StepThresholdContract {
        self.contract
    }

    #[inline]
    #[must_use]
    pub fn stats(&self) -> ExecutorStats {
        self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = ExecutorStats::default();
    }

    fn target_buffer<'p>(&self, pool: &'p mut TransientBufferPool) -> Result<&'p mut RenderBuffer> {
        let handle = self
            .current
            .ok_or_else(|| MaskError::InvalidTarget("no render target bound".to_owned()))?;
        pool.buffer_mut(handle)
    }

    fn run(&mut self, command: &RenderCommand, target: &mut ExecuteTarget<'_>) -> Result<()> {
        log::trace!("{}: {command:?}", target.camera.name);
        let pool = &mut target.pipeline.pool;

        match command {
            RenderCommand::PushDebugGroup(label) => self.debug_groups.push(label.clone()),
            RenderCommand::PopDebugGroup => {
                if self.debug_groups.pop().is_none() {
                    log::warn!("debug group popped without a matching push");
                }
            }
            RenderCommand::SetRenderTarget(handle) => {
                pool.buffer(*handle)?;
                self.current = Some(*handle);
            }
            RenderCommand::ClearRenderTarget(clear) => {
                clear_buffer(self.target_buffer(pool)?, *clear);
                self.stats.clears += 1;
            }
            RenderCommand::Blit {
                source,
                dest,
                material,
            } => {
                self.blit(pool, *source, *dest, *material)?;
                self.current = Some(*dest);
                self.stats.blits += 1;
            }
            RenderCommand::DrawSkybox => {
                let Some(skybox) = target.camera.skybox else {
                    log::trace!("camera `{}` has no skybox", target.camera.name);
                    return Ok(());
                };
                let buffer = self.target_buffer(pool)?;
                let (width, height) = buffer.size();
                for y in 0..height {
                    let color = skybox.sample(y, height);
                    for x in 0..width {
                        if buffer.depth_at(x, y).is_none_or(|d| d >= FAR_DEPTH) {
                            buffer.set_color(x, y, color);
                        }
                    }
                }
                self.stats.draw_calls += 1;
            }
            RenderCommand::DrawRenderers { drawing, filtering } => {
                self.draw_renderers(pool, target.culling, drawing, filtering)?;
            }
            RenderCommand::DrawUiOverlay => {
                let buffer = self.target_buffer(pool)?;
                for element in &target.camera.ui_overlay {
                    let rect = element.rect.clipped(buffer.width(), buffer.height());
                    for y in rect.y..rect.y + rect.height {
                        for x in rect.x..rect.x + rect.width {
                            buffer.set_color(x, y, element.color);
                        }
                    }
                }
                self.stats.draw_calls += target.camera.ui_overlay.len() as u64;
            }
            RenderCommand::SetGlobalTexture { name, buffer } => {
                pool.buffer(*buffer)?;
                target.pipeline.globals.publish(name, *buffer);
            }
            RenderCommand::ReleaseTemporary(handle) => {
                pool.release(*handle)?;
                if self.current == Some(*handle) {
                    self.current = None;
                }
            }
            RenderCommand::Submit => self.stats.submits += 1,
        }
        Ok(())
    }

    fn blit(
        &self,
        pool: &mut TransientBufferPool,
        source: BufferHandle,
        dest: BufferHandle,
        material: Option<BlitMaterial>,
    ) -> Result<()> {
        let src = pool.buffer(source)?.clone();
        let dst = pool.buffer_mut(dest)?;
        if src.size() != dst.size() {
            return Err(MaskError::SizeMismatch {
                src_size: src.size(),
                dst_size: dst.size(),
            });
        }

        match material {
            None => {
                let (s, d) = color_planes(&src, dst)?;
                d.copy_from_slice(s);
            }
            Some(BlitMaterial::Override(OverrideShader::BlitToDepth)) => {
                let values: Vec<f32> = match (src.depth_plane(), src.color_plane()) {
                    (Some(depth), _) => depth.to_vec(),
                    (None, Some(color)) => color.iter().map(|c| c.x).collect(),
                    (None, None) => {
                        return Err(MaskError::InvalidTarget("blit source has no planes".to_owned()));
                    }
                };
                let depth = dst.depth_plane_mut().ok_or_else(|| {
                    MaskError::InvalidTarget("depth blit into a buffer without depth".to_owned())
                })?;
                depth.copy_from_slice(&values);
            }
            Some(BlitMaterial::Override(OverrideShader::StepThreshold)) => {
                let (s, d) = color_planes(&src, dst)?;
                for (out, texel) in d.iter_mut().zip(s) {
                    *out = self.contract.step(texel.w);
                }
            }
            Some(BlitMaterial::Override(other)) => {
                return Err(MaskError::InvalidTarget(format!(
                    "`{}` is not a blit program",
                    other.path()
                )));
            }
            Some(BlitMaterial::MaskTint(tint)) => {
                let (s, d) = color_planes(&src, dst)?;
                for (out, mask) in d.iter_mut().zip(s) {
                    let rgb = out.truncate().lerp(tint.truncate(), mask.w * tint.w);
                    *out = rgb.extend(out.w);
                }
            }
            Some(BlitMaterial::MaskCutout) => {
                let (s, d) = color_planes(&src, dst)?;
                for (out, mask) in d.iter_mut().zip(s) {
                    *out *= 1.0 - mask.w;
                }
            }
        }
        Ok(())
    }

    fn draw_renderers(
        &mut self,
        pool: &mut TransientBufferPool,
        culling: &crate::scene::culling::CullingResults,
        drawing: &DrawingSettings,
        filtering: &FilteringSettings,
    ) -> Result<()> {
        self.stats.filter_evaluations += 1;
        let shading = match drawing.override_material {
            None => Shading::Material,
            Some(OverrideShader::WhiteOverride) => Shading::Flat(Vec4::ONE),
            Some(OverrideShader::WriteDepth) => Shading::DepthOnly,
            Some(other) => {
                return Err(MaskError::InvalidTarget(format!(
                    "`{}` is not a draw override",
                    other.path()
                )));
            }
        };

        let result = FilteringResult::evaluate(culling, drawing, filtering);
        let buffer = self.target_buffer(pool)?;
        for draw in &result.draws {
            let renderer = draw.renderer;
            let color = match shading {
                Shading::Material => Some(renderer.color),
                Shading::Flat(c) => Some(c),
                Shading::DepthOnly => None,
            };
            let rect = renderer.rect.clipped(buffer.width(), buffer.height());
            for y in rect.y..rect.y + rect.height {
                for x in rect.x..rect.x + rect.width {
                    if let Some(existing) = buffer.depth_at(x, y) {
                        if renderer.depth > existing {
                            continue;
                        }
                        buffer.set_depth(x, y, renderer.depth);
                    }
                    if let Some(c) = color {
                        buffer.set_color(x, y, c);
                    }
                }
            }
        }
        self.stats.draw_calls += result.len() as u64;
        Ok(())
    }
}

impl CommandExecutor for SoftwareExecutor {
    fn execute(&mut self, cmd: &CommandBuffer, target: &mut ExecuteTarget<'_>) -> Result<()> {
        self.current = None;
        let result = cmd
            .commands()
            .iter()
            .try_for_each(|command| self.run(command, target));

        if !self.debug_groups.is_empty() {
            if result.is_ok() {
                log::warn!(
                    "`{}` left {} debug group(s) open",
                    cmd.label(),
                    self.debug_groups.len()
                );
            }
            self.debug_groups.clear();
        }
        result
    }
}

fn clear_buffer(buffer: &mut RenderBuffer, clear: ClearConfig) {
    if let (Some(c), Some(plane)) = (clear.color, buffer.color_plane_mut()) {
        plane.fill(Vec4::new(c.r as f32, c.g as f32, c.b as f32, c.a as f32));
    }
    if let (Some(d), Some(plane)) = (clear.depth, buffer.depth_plane_mut()) {
        plane.fill(d);
    }
}

fn color_planes<'s, 'd>(
    src: &'s RenderBuffer,
    dst: &'d mut RenderBuffer,
) -> Result<(&'s [Vec4], &'d mut [Vec4])> {
    match (src.color_plane(), dst.color_plane_mut()) {
        (Some(s), Some(d)) => Ok((s, d)),
        _ => Err(MaskError::InvalidTarget(
            "color blit between buffers without color planes".to_owned(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::graph::context::PipelineContext;
    use crate::renderer::graph::transient_pool::BufferDesc;
    use crate::renderer::settings::ColorFormat;
    use crate::scene::camera::{CameraData, PixelRect};
    use crate::scene::culling::{CullingResults, VisibleRenderer};

    fn setup(width: u32, height: u32) -> (PipelineContext, CameraData) {
        let mut ctx = PipelineContext::default();
        let color = ctx
            .pool
            .import("_CameraColor", RenderBuffer::color_filled(width, height, Vec4::ZERO));
        let depth = ctx
            .pool
            .import("_CameraDepthTexture", RenderBuffer::depth_filled(width, height, FAR_DEPTH));
        let camera = CameraData::new(
            "test",
            BufferDesc::new(width, height, ColorFormat::Argb32),
            color,
            depth,
        );
        (ctx, camera)
    }

    #[test]
    fn test_step_threshold_contract() {
        let contract = StepThresholdContract::default();
        assert_eq!(contract.version, 1);
        assert_eq!(contract.step(0.49), Vec4::ZERO);
        assert_eq!(contract.step(0.5), Vec4::ONE);
    }

    #[test]
    fn test_blit_size_mismatch() {
        let (mut ctx, camera) = setup(4, 4);
        let small = ctx
            .pool
            .acquire("small", &BufferDesc::new(2, 2, ColorFormat::Argb32))
            .unwrap();
        let mut cmd = CommandBuffer::new("mismatch");
        cmd.blit(camera.color_target, small, None);

        let culling = CullingResults::default();
        let mut target = ExecuteTarget {
            pipeline: &mut ctx,
            camera: &camera,
            culling: &culling,
        };
        let err = SoftwareExecutor::new().execute(&cmd, &mut target).unwrap_err();
        assert!(matches!(err, MaskError::SizeMismatch { .. }));
    }

    #[test]
    fn test_draw_uses_less_equal_depth_test() {
        let (mut ctx, camera) = setup(4, 1);
        let mask = ctx
            .pool
            .acquire(
                "mask",
                &BufferDesc::new(4, 1, ColorFormat::Argb32).with_depth_bits(32),
            )
            .unwrap();
        let culling = CullingResults::new(vec![
            VisibleRenderer::new(1, PixelRect::new(0, 0, 2, 1), 0.3).with_color(Vec4::X),
            VisibleRenderer::new(2, PixelRect::new(1, 0, 2, 1), 0.6).with_color(Vec4::Y),
        ]);

        let mut cmd = CommandBuffer::new("depth test");
        cmd.set_render_target(mask);
        cmd.clear_render_target(ClearConfig::ALL);
        cmd.draw_renderers(
            DrawingSettings::new(
                crate::renderer::shader_tags::default_shader_tags(),
                crate::renderer::filtering::SortingCriteria::empty(),
            ),
            FilteringSettings::default(),
        );

        let mut exec = SoftwareExecutor::new();
        let mut target = ExecuteTarget {
            pipeline: &mut ctx,
            camera: &camera,
            culling: &culling,
        };
        exec.execute(&cmd, &mut target).unwrap();

        let buffer = ctx.pool.buffer(mask).unwrap();
        assert_eq!(buffer.color_at(1, 0), Some(Vec4::X));
        assert_eq!(buffer.color_at(2, 0), Some(Vec4::Y));
        assert_eq!(buffer.depth_at(3, 0), Some(FAR_DEPTH));
        assert_eq!(exec.stats().filter_evaluations, 1);
        assert_eq!(exec.stats().draw_calls, 2);
    }
}
