//! Culling Results
//!
//! Visibility determination belongs to the host. This module only defines the
//! shape of its output ([`CullingResults`]) and the oracle interface
//! ([`CullingOracle`]) the scheduler calls once per camera per frame.
//! [`StaticScene`] is a minimal oracle that culls against the viewport only.

use glam::Vec4;
use smallvec::{SmallVec, smallvec};

use crate::renderer::shader_tags::ShaderTagId;
use crate::scene::camera::{CameraData, PixelRect};

/// Render queue assigned to renderers that don't specify one ("Geometry").
pub const DEFAULT_RENDER_QUEUE: i32 = 2000;

/// One visible renderable object as reported by the host's culling.
#[derive(Debug, Clone, PartialEq)]
pub struct VisibleRenderer {
    pub id: u32,
    pub render_queue: i32,
    /// Object layer, `0..32`.
    pub layer: u8,
    /// Rendering-layer bits.
    pub rendering_layers: u32,
    /// Shader pass tags offered by the renderer's material.
    pub shader_passes: SmallVec<[ShaderTagId; 2]>,
    /// Screen-space coverage.
    pub rect: PixelRect,
    /// Normalized depth (0 = near, 1 = far).
    pub depth: f32,
    /// Authored material color.
    pub color: Vec4,
}

impl VisibleRenderer {
    #[must_use]
    pub fn new(id: u32, rect: PixelRect, depth: f32) -> Self {
        Self {
            id,
            render_queue: DEFAULT_RENDER_QUEUE,
            layer: 0,
            rendering_layers: 1,
            shader_passes: smallvec![ShaderTagId::from_static("UniversalForward")],
            rect,
            depth,
            color: Vec4::new(0.5, 0.5, 0.5, 1.0),
        }
    }

    #[must_use]
    pub fn with_queue(mut self, render_queue: i32) -> Self {
        self.render_queue = render_queue;
        self
    }

    #[must_use]
    pub fn with_layer(mut self, layer: u8) -> Self {
        debug_assert!(layer < 32, "layer index out of range: {layer}");
        self.layer = layer;
        self
    }

    #[must_use]
    pub fn with_rendering_layers(mut self, rendering_layers: u32) -> Self {
        self.rendering_layers = rendering_layers;
        self
    }

    #[must_use]
    pub fn with_shader_passes<I, T>(mut self, passes: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<ShaderTagId>,
    {
        self.shader_passes = passes.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_color(mut self, color: Vec4) -> Self {
        self.color = color;
        self
    }
}

/// Frame-local set of visible renderers for one camera.
#[derive(Debug, Clone, Default)]
pub struct CullingResults {
    pub renderers: Vec<VisibleRenderer>,
}

impl CullingResults {
    #[must_use]
    pub fn new(renderers: Vec<VisibleRenderer>) -> Self {
        Self { renderers }
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.renderers.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.renderers.is_empty()
    }
}

/// Host visibility capability.
pub trait CullingOracle {
    fn cull(&self, camera: &CameraData) -> CullingResults;
}

/// Flat list of renderers culled against the camera viewport.
#[derive(Debug, Clone, Default)]
pub struct StaticScene {
    pub renderers: Vec<VisibleRenderer>,
}

impl StaticScene {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, renderer: VisibleRenderer) -> &mut Self {
        self.renderers.push(renderer);
        self
    }
}

impl CullingOracle for StaticScene {
    fn cull(&self, camera: &CameraData) -> CullingResults {
        let visible = self
            .renderers
            .iter()
            .filter(|r| {
                !r.rect.clipped(camera.width(), camera.height()).is_empty()
                    && (0.0..=1.0).contains(&r.depth)
            })
            .cloned()
            .collect();
        CullingResults::new(visible)
    }
}
