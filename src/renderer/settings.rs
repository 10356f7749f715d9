//! Pass Settings
//!
//! Immutable, serializable configuration records for the mask passes.
//!
//! - [`PassSettings`] configures a [`MaskPass`](crate::renderer::graph::passes::MaskPass):
//!   draw flags, insertion event, queue bounds, output format and name, layer
//!   masks and shader-pass tags.
//! - [`MaskableSettings`] configures the composite pass and its depth-write
//!   companion.
//!
//! Settings are created at pipeline-configuration time and shared read-only
//! by every camera. Out-of-range queue bounds are never rejected; they are
//! clamped into `[0, 5000]` by [`PassSettings::clamped`].
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use mask_passes::renderer::settings::PassSettings;
//!
//! let settings = PassSettings {
//!     texture_name: "_SelectionMask".into(),
//!     ..PassSettings::default_opaque()
//! };
//! ```

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::renderer::filtering::{
    FilteringSettings, LayerMask, MAX_RENDER_QUEUE, RenderQueueRange, SortingCriteria,
    clamp_render_queue,
};
use crate::renderer::graph::stage::RenderPassEvent;
use crate::renderer::shader_tags::{LightModeTags, ShaderTagList};

/// Output name used by the presets.
pub const DEFAULT_TEXTURE_NAME: &str = "_MyTexture";

// ---------------------------------------------------------------------------
// ColorFormat
// ---------------------------------------------------------------------------

/// Color format of a render buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ColorFormat {
    /// 8-bit RGBA.
    #[default]
    Argb32,
    /// 16-bit float RGBA.
    ArgbHalf,
    /// 32-bit float RGBA.
    ArgbFloat,
    /// 8-bit single channel.
    R8,
    /// 32-bit float single channel.
    RFloat,
    /// Depth-only buffer; no color plane.
    Depth,
}

impl ColorFormat {
    /// The matching GPU texture format.
    #[must_use]
    pub const fn wgpu_format(self) -> wgpu::TextureFormat {
        match self {
            Self::Argb32 => wgpu::TextureFormat::Rgba8Unorm,
            Self::ArgbHalf => wgpu::TextureFormat::Rgba16Float,
            Self::ArgbFloat => wgpu::TextureFormat::Rgba32Float,
            Self::R8 => wgpu::TextureFormat::R8Unorm,
            Self::RFloat => wgpu::TextureFormat::R32Float,
            Self::Depth => wgpu::TextureFormat::Depth32Float,
        }
    }

    #[inline]
    #[must_use]
    pub const fn has_color(self) -> bool {
        !matches!(self, Self::Depth)
    }

    /// Bytes per pixel of the color plane.
    #[must_use]
    pub const fn bytes_per_pixel(self) -> u32 {
        match self {
            Self::Argb32 | Self::RFloat => 4,
            Self::ArgbHalf => 8,
            Self::ArgbFloat => 16,
            Self::R8 => 1,
            Self::Depth => 0,
        }
    }
}

// ---------------------------------------------------------------------------
// PassInput
// ---------------------------------------------------------------------------

bitflags! {
    /// Upstream inputs a pass requires the host to produce.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct PassInput: u32 {
        const DEPTH = 1 << 0;
        const NORMAL = 1 << 1;
        const COLOR = 1 << 2;
        const MOTION = 1 << 3;
    }
}

// ---------------------------------------------------------------------------
// PassSettings
// ---------------------------------------------------------------------------

/// Configuration of a single-stage mask pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PassSettings {
    pub draw_skybox: bool,
    pub draw_renderers: bool,
    pub draw_ui_overlay: bool,

    pub render_pass_event: RenderPassEvent,
    pub render_pass_input: PassInput,

    /// Lower render queue bound, clamped to `[0, 5000]`.
    pub render_queue_lower_bound: i32,
    /// Upper render queue bound, clamped to `[0, 5000]`.
    pub render_queue_upper_bound: i32,

    pub color_format: ColorFormat,
    pub sorting_criteria: SortingCriteria,
    pub layer_mask: LayerMask,
    pub rendering_layer_mask: u32,
    /// Global texture name the result is published under.
    pub texture_name: String,

    pub light_mode: LightModeTags,
}

impl Default for PassSettings {
    #[inline]
    fn default() -> Self {
        Self::default_opaque()
    }
}

impl PassSettings {
    /// Renderers only, after opaques, opaque queues.
    #[must_use]
    pub fn default_opaque() -> Self {
        Self {
            draw_skybox: false,
            draw_renderers: true,
            draw_ui_overlay: false,
            render_pass_event: RenderPassEvent::AfterRenderingOpaques,
            render_pass_input: PassInput::empty(),
            render_queue_lower_bound: 0,
            render_queue_upper_bound: 2499,
            color_format: ColorFormat::Argb32,
            sorting_criteria: SortingCriteria::COMMON_OPAQUE,
            layer_mask: LayerMask::EVERYTHING,
            rendering_layer_mask: u32::MAX,
            texture_name: DEFAULT_TEXTURE_NAME.to_owned(),
            light_mode: LightModeTags::STANDARD,
        }
    }

    /// Skybox and renderers, after transparents, every queue.
    #[must_use]
    pub fn default_transparent() -> Self {
        Self {
            draw_skybox: true,
            render_pass_event: RenderPassEvent::AfterRenderingTransparents,
            render_queue_upper_bound: MAX_RENDER_QUEUE,
            sorting_criteria: SortingCriteria::COMMON_TRANSPARENT,
            ..Self::default_opaque()
        }
    }

    /// Skybox, renderers and UI overlay, before post-processing, every queue.
    #[must_use]
    pub fn default_post_processing() -> Self {
        Self {
            draw_skybox: true,
            draw_ui_overlay: true,
            render_pass_event: RenderPassEvent::BeforeRenderingPostProcessing,
            render_queue_upper_bound: MAX_RENDER_QUEUE,
            ..Self::default_opaque()
        }
    }

    /// Returns a copy with both queue bounds clamped into `[0, 5000]` and the
    /// upper bound raised to the lower one when it is smaller.
    ///
    /// Idempotent: `s.clamped().clamped() == s.clamped()`.
    #[must_use]
    pub fn clamped(&self) -> Self {
        let lower = clamp_render_queue(self.render_queue_lower_bound);
        let upper = clamp_render_queue(self.render_queue_upper_bound).max(lower);
        if lower != self.render_queue_lower_bound || upper != self.render_queue_upper_bound {
            log::debug!(
                "PassSettings `{}`: queue bounds [{}, {}] clamped to [{lower}, {upper}]",
                self.texture_name,
                self.render_queue_lower_bound,
                self.render_queue_upper_bound,
            );
        }
        Self {
            render_queue_lower_bound: lower,
            render_queue_upper_bound: upper,
            ..self.clone()
        }
    }

    #[inline]
    #[must_use]
    pub fn render_queue_range(&self) -> RenderQueueRange {
        RenderQueueRange::new(self.render_queue_lower_bound, self.render_queue_upper_bound)
    }

    /// Ordered shader tags derived from [`light_mode`](Self::light_mode).
    #[inline]
    #[must_use]
    pub fn shader_tags(&self) -> ShaderTagList {
        self.light_mode.shader_tags()
    }

    #[must_use]
    pub fn filtering_settings(&self) -> FilteringSettings {
        FilteringSettings::new(self.render_queue_range(), self.layer_mask)
            .with_rendering_layer_mask(self.rendering_layer_mask)
    }
}

// ---------------------------------------------------------------------------
// MaskableSettings
// ---------------------------------------------------------------------------

/// Configuration shared by the composite pass and the depth-write pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaskableSettings {
    /// Instance name. Several maskable features in one pipeline need distinct
    /// names; it suffixes their buffer names, published texture and profiler
    /// tags. Empty keeps the unsuffixed names.
    pub name: String,
    pub layer_mask: LayerMask,
    pub render_pass_event: RenderPassEvent,
    /// Pre-seed the mask with a thresholded skybox contribution.
    pub draw_skybox: bool,
}

impl Default for MaskableSettings {
    fn default() -> Self {
        Self {
            name: String::new(),
            layer_mask: LayerMask::EVERYTHING,
            render_pass_event: RenderPassEvent::AfterRenderingOpaques,
            draw_skybox: false,
        }
    }
}

impl MaskableSettings {
    /// `base` suffixed with the instance name, for buffer and texture names.
    #[must_use]
    pub fn scoped_name(&self, base: &str) -> String {
        if self.name.is_empty() {
            base.to_owned()
        } else {
            format!("{base}_{}", self.name)
        }
    }

    /// `base` qualified with the instance name, for profiler tags.
    #[must_use]
    pub fn profiler_tag(&self, base: &str) -> String {
        if self.name.is_empty() {
            base.to_owned()
        } else {
            format!("{base}: {}", self.name)
        }
    }

    /// Every queue, the configured layers, every rendering layer.
    #[must_use]
    pub fn filtering_settings(&self) -> FilteringSettings {
        FilteringSettings::new(RenderQueueRange::ALL, self.layer_mask)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        let opaque = PassSettings::default_opaque();
        assert!(opaque.draw_renderers && !opaque.draw_skybox && !opaque.draw_ui_overlay);
        assert_eq!(opaque.render_queue_range(), RenderQueueRange { lower: 0, upper: 2499 });

        let transparent = PassSettings::default_transparent();
        assert!(transparent.draw_skybox);
        assert_eq!(transparent.render_pass_event, RenderPassEvent::AfterRenderingTransparents);
        assert_eq!(transparent.sorting_criteria, SortingCriteria::COMMON_TRANSPARENT);

        let post = PassSettings::default_post_processing();
        assert!(post.draw_ui_overlay);
        assert_eq!(post.render_pass_event, RenderPassEvent::BeforeRenderingPostProcessing);
        assert_eq!(post.texture_name, DEFAULT_TEXTURE_NAME);
    }

    #[test]
    fn test_maskable_names_are_scoped() {
        let unnamed = MaskableSettings::default();
        assert_eq!(unnamed.scoped_name("_filteringBuffer"), "_filteringBuffer");
        assert_eq!(unnamed.profiler_tag("MaskableRenderPass"), "MaskableRenderPass");

        let outline = MaskableSettings {
            name: "Outline".into(),
            ..MaskableSettings::default()
        };
        assert_eq!(outline.scoped_name("_filteringBuffer"), "_filteringBuffer_Outline");
        assert_eq!(outline.profiler_tag("MaskableRenderPass"), "MaskableRenderPass: Outline");
    }

    #[test]
    fn test_clamping_is_idempotent() {
        let bounds = [-100, -1, 0, 1, 2499, 5000, 5001, i32::MIN, i32::MAX];
        for &lower in &bounds {
            for &upper in &bounds {
                let s = PassSettings {
                    render_queue_lower_bound: lower,
                    render_queue_upper_bound: upper,
                    ..PassSettings::default_opaque()
                };
                let once = s.clamped();
                assert!(once.render_queue_lower_bound <= once.render_queue_upper_bound);
                assert!((0..=5000).contains(&once.render_queue_lower_bound));
                assert!((0..=5000).contains(&once.render_queue_upper_bound));
                assert_eq!(once.clamped(), once);
            }
        }
    }

    #[test]
    fn test_color_format_mapping() {
        assert_eq!(ColorFormat::Argb32.wgpu_format(), wgpu::TextureFormat::Rgba8Unorm);
        assert_eq!(ColorFormat::Depth.wgpu_format(), wgpu::TextureFormat::Depth32Float);
        assert!(!ColorFormat::Depth.has_color());
    }
}
