//! Mask recombination strategies.
//!
//! A [`MaskCompositor`] is injected into
//! [`MaskableCompositePass`](super::MaskableCompositePass) at construction and
//! records the commands that blend the finished mask into the camera color
//! buffer. Any closure with the matching signature is a compositor.

use glam::Vec4;

use crate::errors::Result;
use crate::renderer::filtering::DrawingSettings;
use crate::renderer::graph::command::{BlitMaterial, CommandBuffer};
use crate::renderer::graph::transient_pool::BufferHandle;
use crate::scene::camera::CameraData;

/// What the recombination step receives.
#[derive(Debug, Clone, Copy)]
pub struct CompositeInputs<'a> {
    /// The filtering buffer holding the finished mask.
    pub mask: BufferHandle,
    /// Main camera color buffer. Borrowed from the host, never released.
    pub destination: BufferHandle,
    /// Settings the mask geometry was drawn with.
    pub drawing: &'a DrawingSettings,
    pub camera: &'a CameraData,
}

pub trait MaskCompositor {
    fn composite(&self, inputs: &CompositeInputs<'_>, cmd: &mut CommandBuffer) -> Result<()>;
}

impl<F> MaskCompositor for F
where
    F: Fn(&CompositeInputs<'_>, &mut CommandBuffer) -> Result<()>,
{
    fn composite(&self, inputs: &CompositeInputs<'_>, cmd: &mut CommandBuffer) -> Result<()> {
        self(inputs, cmd)
    }
}

/// Blends a tint color over the camera color where the mask is set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TintCompositor {
    pub color: Vec4,
}

impl TintCompositor {
    #[must_use]
    pub const fn new(color: Vec4) -> Self {
        Self { color }
    }
}

impl MaskCompositor for TintCompositor {
    fn composite(&self, inputs: &CompositeInputs<'_>, cmd: &mut CommandBuffer) -> Result<()> {
        cmd.blit(
            inputs.mask,
            inputs.destination,
            Some(BlitMaterial::MaskTint(self.color)),
        );
        Ok(())
    }
}

/// Clears the camera color where the mask is set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CutoutCompositor;

impl MaskCompositor for CutoutCompositor {
    fn composite(&self, inputs: &CompositeInputs<'_>, cmd: &mut CommandBuffer) -> Result<()> {
        cmd.blit(inputs.mask, inputs.destination, Some(BlitMaterial::MaskCutout));
        Ok(())
    }
}
