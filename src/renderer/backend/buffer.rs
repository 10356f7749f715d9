//! CPU Render Buffer
//!
//! Backing storage for the reference backend: an RGBA color plane and an
//! optional `f32` depth plane. Depth follows the standard convention
//! (0 = near, 1 = far); a freshly created depth plane starts at the far value.

use glam::Vec4;

use crate::renderer::graph::transient_pool::BufferDesc;

/// Depth value of the far plane.
pub const FAR_DEPTH: f32 = 1.0;

#[derive(Debug, Clone, PartialEq)]
pub struct RenderBuffer {
    width: u32,
    height: u32,
    color: Option<Vec<Vec4>>,
    depth: Option<Vec<f32>>,
}

impl RenderBuffer {
    /// Allocates planes according to the descriptor.
    #[must_use]
    pub fn new(desc: &BufferDesc) -> Self {
        let extent = desc.extent();
        let len = (extent.width * extent.height) as usize;
        Self {
            width: extent.width,
            height: extent.height,
            color: desc
                .color_format
                .has_color()
                .then(|| vec![Vec4::ZERO; len]),
            depth: desc.has_depth().then(|| vec![FAR_DEPTH; len]),
        }
    }

    /// Depth-only buffer filled with `depth`.
    #[must_use]
    pub fn depth_filled(width: u32, height: u32, depth: f32) -> Self {
        Self {
            width,
            height,
            color: None,
            depth: Some(vec![depth; (width * height) as usize]),
        }
    }

    /// Color-only buffer filled with `color`.
    #[must_use]
    pub fn color_filled(width: u32, height: u32, color: Vec4) -> Self {
        Self {
            width,
            height,
            color: Some(vec![color; (width * height) as usize]),
            depth: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    #[must_use]
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        debug_assert!(x < self.width && y < self.height);
        (y * self.width + x) as usize
    }

    #[inline]
    #[must_use]
    pub fn has_color(&self) -> bool {
        self.color.is_some()
    }

    #[inline]
    #[must_use]
    pub fn has_depth(&self) -> bool {
        self.depth.is_some()
    }

    #[must_use]
    pub fn color_at(&self, x: u32, y: u32) -> Option<Vec4> {
        let i = self.index(x, y);
        self.color.as_ref().map(|c| c[i])
    }

    #[must_use]
    pub fn depth_at(&self, x: u32, y: u32) -> Option<f32> {
        let i = self.index(x, y);
        self.depth.as_ref().map(|d| d[i])
    }

    #[must_use]
    pub fn color_plane(&self) -> Option<&[Vec4]> {
        self.color.as_deref()
    }

    #[must_use]
    pub fn depth_plane(&self) -> Option<&[f32]> {
        self.depth.as_deref()
    }

    pub fn color_plane_mut(&mut self) -> Option<&mut [Vec4]> {
        self.color.as_deref_mut()
    }

    pub fn depth_plane_mut(&mut self) -> Option<&mut [f32]> {
        self.depth.as_deref_mut()
    }

    pub fn set_depth(&mut self, x: u32, y: u32, value: f32) {
        let i = self.index(x, y);
        if let Some(depth) = self.depth.as_mut() {
            depth[i] = value;
        }
    }

    pub fn set_color(&mut self, x: u32, y: u32, value: Vec4) {
        let i = self.index(x, y);
        if let Some(color) = self.color.as_mut() {
            color[i] = value;
        }
    }

    /// Number of pixels whose color satisfies `pred`.
    pub fn count_color(&self, pred: impl Fn(Vec4) -> bool) -> usize {
        self.color
            .as_ref()
            .map_or(0, |c| c.iter().filter(|&&v| pred(v)).count())
    }
}
