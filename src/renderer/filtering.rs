//! Geometry Filtering
//!
//! A filter spec is the pair ([`FilteringSettings`], [`DrawingSettings`]):
//! render-queue range, layer masks, shader-pass tags, sort criteria and an
//! optional override material. [`FilteringResult::evaluate`] applies it to
//! one camera's [`CullingResults`].
//!
//! Results are frame-local. Nothing in this module caches a result; the
//! backend evaluates the filter each time it executes a draw-renderers
//! command.

use std::cmp::Ordering;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::renderer::graph::command::OverrideShader;
use crate::renderer::shader_tags::{ShaderTagId, ShaderTagList};
use crate::scene::culling::{CullingResults, VisibleRenderer};

/// Lowest render queue value accepted by filters.
pub const MIN_RENDER_QUEUE: i32 = 0;
/// Highest render queue value accepted by filters.
pub const MAX_RENDER_QUEUE: i32 = 5000;

/// Clamps a single queue bound into `[MIN_RENDER_QUEUE, MAX_RENDER_QUEUE]`.
#[inline]
#[must_use]
pub fn clamp_render_queue(value: i32) -> i32 {
    value.clamp(MIN_RENDER_QUEUE, MAX_RENDER_QUEUE)
}

/// Inclusive render queue range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RenderQueueRange {
    pub lower: i32,
    pub upper: i32,
}

impl RenderQueueRange {
    pub const ALL: Self = Self { lower: 0, upper: 5000 };
    pub const OPAQUE: Self = Self { lower: 0, upper: 2500 };
    pub const TRANSPARENT: Self = Self { lower: 2501, upper: 5000 };

    /// Builds a range, clamping both bounds and keeping `lower <= upper`.
    #[must_use]
    pub fn new(lower: i32, upper: i32) -> Self {
        let lower = clamp_render_queue(lower);
        let upper = clamp_render_queue(upper).max(lower);
        Self { lower, upper }
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, queue: i32) -> bool {
        (self.lower..=self.upper).contains(&queue)
    }
}

impl Default for RenderQueueRange {
    fn default() -> Self {
        Self::ALL
    }
}

/// Object layer bitmask (`u32::MAX` selects every layer).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerMask(pub u32);

impl LayerMask {
    pub const EVERYTHING: Self = Self(u32::MAX);
    pub const NOTHING: Self = Self(0);

    #[must_use]
    pub const fn from_layers(layers: &[u8]) -> Self {
        let mut bits = 0u32;
        let mut i = 0;
        while i < layers.len() {
            bits |= 1u32 << (layers[i] as u32);
            i += 1;
        }
        Self(bits)
    }

    #[inline]
    #[must_use]
    pub const fn includes(self, layer: u8) -> bool {
        layer < 32 && self.0 & (1u32 << (layer as u32)) != 0
    }
}

impl Default for LayerMask {
    fn default() -> Self {
        Self::EVERYTHING
    }
}

bitflags! {
    /// Draw ordering criteria. Flags are applied in the order listed.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct SortingCriteria: u32 {
        const SORTING_LAYER = 1 << 0;
        const RENDER_QUEUE = 1 << 1;
        const BACK_TO_FRONT = 1 << 2;
        const QUANTIZED_FRONT_TO_BACK = 1 << 3;
        const OPTIMIZE_STATE_CHANGES = 1 << 4;
        const CANVAS_ORDER = 1 << 5;

        const COMMON_OPAQUE = Self::SORTING_LAYER.bits()
            | Self::RENDER_QUEUE.bits()
            | Self::QUANTIZED_FRONT_TO_BACK.bits()
            | Self::OPTIMIZE_STATE_CHANGES.bits()
            | Self::CANVAS_ORDER.bits();
        const COMMON_TRANSPARENT = Self::SORTING_LAYER.bits()
            | Self::RENDER_QUEUE.bits()
            | Self::BACK_TO_FRONT.bits()
            | Self::OPTIMIZE_STATE_CHANGES.bits();
    }
}

impl Default for SortingCriteria {
    fn default() -> Self {
        Self::COMMON_OPAQUE
    }
}

/// Depth quantization steps used by `QUANTIZED_FRONT_TO_BACK`.
const DEPTH_QUANTIZATION: f32 = 1024.0;

impl SortingCriteria {
    /// Orders two renderers according to these criteria; ties fall back to
    /// renderer id so the draw order is deterministic.
    #[must_use]
    pub fn compare(self, a: &VisibleRenderer, b: &VisibleRenderer) -> Ordering {
        let mut ord = Ordering::Equal;
        if self.contains(Self::RENDER_QUEUE) {
            ord = ord.then(a.render_queue.cmp(&b.render_queue));
        }
        if self.contains(Self::BACK_TO_FRONT) {
            ord = ord.then(b.depth.total_cmp(&a.depth));
        } else if self.contains(Self::QUANTIZED_FRONT_TO_BACK) {
            let qa = (a.depth * DEPTH_QUANTIZATION) as u32;
            let qb = (b.depth * DEPTH_QUANTIZATION) as u32;
            ord = ord.then(qa.cmp(&qb));
        }
        ord.then(a.id.cmp(&b.id))
    }
}

/// Which renderers may be drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilteringSettings {
    pub render_queue_range: RenderQueueRange,
    pub layer_mask: LayerMask,
    pub rendering_layer_mask: u32,
}

impl FilteringSettings {
    #[must_use]
    pub fn new(render_queue_range: RenderQueueRange, layer_mask: LayerMask) -> Self {
        Self {
            render_queue_range,
            layer_mask,
            rendering_layer_mask: u32::MAX,
        }
    }

    #[must_use]
    pub fn with_rendering_layer_mask(mut self, mask: u32) -> Self {
        self.rendering_layer_mask = mask;
        self
    }

    #[inline]
    #[must_use]
    pub fn accepts(&self, renderer: &VisibleRenderer) -> bool {
        self.render_queue_range.contains(renderer.render_queue)
            && self.layer_mask.includes(renderer.layer)
            && self.rendering_layer_mask & renderer.rendering_layers != 0
    }
}

impl Default for FilteringSettings {
    fn default() -> Self {
        Self::new(RenderQueueRange::ALL, LayerMask::EVERYTHING)
    }
}

/// How selected renderers are drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawingSettings {
    /// Accepted shader pass tags, in first-match order.
    pub shader_tags: ShaderTagList,
    pub sorting: SortingCriteria,
    /// Replaces every renderer's authored material when set.
    pub override_material: Option<OverrideShader>,
}

impl DrawingSettings {
    #[must_use]
    pub fn new(shader_tags: ShaderTagList, sorting: SortingCriteria) -> Self {
        Self {
            shader_tags,
            sorting,
            override_material: None,
        }
    }

    #[must_use]
    pub fn with_override(mut self, material: OverrideShader) -> Self {
        self.override_material = Some(material);
        self
    }

    /// First accepted tag the renderer offers, if any.
    #[must_use]
    pub fn matching_pass(&self, renderer: &VisibleRenderer) -> Option<&ShaderTagId> {
        self.shader_tags
            .iter()
            .find(|tag| renderer.shader_passes.contains(*tag))
    }
}

/// One draw selected by a filter spec.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCall<'a> {
    pub renderer: &'a VisibleRenderer,
    pub pass: ShaderTagId,
}

/// Draw calls selected from one camera's culling output, in draw order.
#[derive(Debug, Clone, Default)]
pub struct FilteringResult<'a> {
    pub draws: Vec<DrawCall<'a>>,
}

impl<'a> FilteringResult<'a> {
    #[must_use]
    pub fn evaluate(
        culling: &'a CullingResults,
        drawing: &DrawingSettings,
        filtering: &FilteringSettings,
    ) -> Self {
        let mut draws: Vec<DrawCall<'a>> = culling
            .renderers
            .iter()
            .filter(|r| filtering.accepts(r))
            .filter_map(|r| {
                drawing.matching_pass(r).map(|pass| DrawCall {
                    renderer: r,
                    pass: pass.clone(),
                })
            })
            .collect();

        draws.sort_by(|a, b| drawing.sorting.compare(a.renderer, b.renderer));
        Self { draws }
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.draws.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.draws.is_empty()
    }

    pub fn renderer_ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.draws.iter().map(|d| d.renderer.id)
    }
}
