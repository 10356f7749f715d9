use std::borrow::Cow;

use glam::Vec4;

use crate::renderer::graph::transient_pool::{BufferDesc, BufferHandle};
use crate::renderer::filtering::SortingCriteria;

/// Axis-aligned pixel rectangle in render-target space (origin top-left).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    #[must_use]
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Intersection with a `width` × `height` viewport anchored at the origin.
    /// Extents past `u32::MAX` saturate.
    #[must_use]
    pub fn clipped(&self, width: u32, height: u32) -> Self {
        let x0 = self.x.min(width);
        let y0 = self.y.min(height);
        let x1 = self.x.saturating_add(self.width).min(width);
        let y1 = self.y.saturating_add(self.height).min(height);
        Self::new(x0, y0, x1 - x0, y1 - y0)
    }
}

/// Vertical two-color sky gradient.
///
/// The alpha channel is part of the gradient, which is what the
/// composite pass thresholds into a binary mask contribution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Skybox {
    pub zenith: Vec4,
    pub horizon: Vec4,
}

impl Skybox {
    #[must_use]
    pub const fn new(zenith: Vec4, horizon: Vec4) -> Self {
        Self { zenith, horizon }
    }

    /// Sky color at row `y` of a target `height` rows tall.
    #[must_use]
    pub fn sample(&self, y: u32, height: u32) -> Vec4 {
        if height <= 1 {
            return self.zenith;
        }
        let t = y as f32 / (height - 1) as f32;
        self.zenith.lerp(self.horizon, t)
    }
}

/// A screen-space UI overlay element, drawn on top of everything.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UiElement {
    pub rect: PixelRect,
    pub color: Vec4,
}

/// Per-camera data handed to passes by the host.
///
/// `color_target` and `depth_texture` are host-owned buffers imported into
/// the transient pool; passes only read from the depth texture and treat
/// the color target as a composite destination.
#[derive(Debug, Clone)]
pub struct CameraData {
    pub name: Cow<'static, str>,
    /// Descriptor of the camera's render target (size, format, depth, MSAA).
    pub target: BufferDesc,
    /// Main camera color buffer.
    pub color_target: BufferHandle,
    /// Camera depth texture (`_CameraDepthTexture`).
    pub depth_texture: BufferHandle,
    /// Sort flags the camera uses for opaque geometry.
    pub default_opaque_sort: SortingCriteria,
    pub skybox: Option<Skybox>,
    pub ui_overlay: Vec<UiElement>,
}

impl CameraData {
    #[must_use]
    pub fn new(
        name: impl Into<Cow<'static, str>>,
        target: BufferDesc,
        color_target: BufferHandle,
        depth_texture: BufferHandle,
    ) -> Self {
        Self {
            name: name.into(),
            target,
            color_target,
            depth_texture,
            default_opaque_sort: SortingCriteria::COMMON_OPAQUE,
            skybox: None,
            ui_overlay: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_skybox(mut self, skybox: Skybox) -> Self {
        self.skybox = Some(skybox);
        self
    }

    #[must_use]
    pub fn with_ui_element(mut self, rect: PixelRect, color: Vec4) -> Self {
        self.ui_overlay.push(UiElement { rect, color });
        self
    }

    #[inline]
    #[must_use]
    pub fn width(&self) -> u32 {
        self.target.width
    }

    #[inline]
    #[must_use]
    pub fn height(&self) -> u32 {
        self.target.height
    }
}
