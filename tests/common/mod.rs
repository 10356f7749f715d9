//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use glam::Vec4;
use mask_passes::renderer::backend::{FAR_DEPTH, RenderBuffer};
use mask_passes::renderer::graph::{BufferDesc, PipelineContext, PoolConfig};
use mask_passes::renderer::settings::ColorFormat;
use mask_passes::scene::{CameraData, PixelRect, VisibleRenderer};

/// Camera color before any pass runs.
pub const CAMERA_CLEAR: Vec4 = Vec4::new(0.0, 0.0, 1.0, 1.0);

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Pipeline with a camera whose color is [`CAMERA_CLEAR`] and whose depth
/// texture is at the far plane. The first frame is already started.
pub fn setup(width: u32, height: u32) -> (PipelineContext, CameraData) {
    setup_with(width, height, PoolConfig::default())
}

pub fn setup_with(width: u32, height: u32, pool: PoolConfig) -> (PipelineContext, CameraData) {
    init_logger();
    let mut pipeline = PipelineContext::new(pool);
    let camera = import_camera(&mut pipeline, "main", width, height);
    pipeline.begin_frame();
    (pipeline, camera)
}

pub fn import_camera(
    pipeline: &mut PipelineContext,
    name: &'static str,
    width: u32,
    height: u32,
) -> CameraData {
    let color = pipeline.pool.import(
        &format!("{name}_CameraColor"),
        RenderBuffer::color_filled(width, height, CAMERA_CLEAR),
    );
    let depth = pipeline.pool.import(
        &format!("{name}_CameraDepthTexture"),
        RenderBuffer::depth_filled(width, height, FAR_DEPTH),
    );
    CameraData::new(
        name,
        BufferDesc::new(width, height, ColorFormat::Argb32).with_depth_bits(32),
        color,
        depth,
    )
}

/// A 2x2 opaque renderer at `(x, y)`.
pub fn quad(id: u32, x: u32, y: u32, depth: f32) -> VisibleRenderer {
    VisibleRenderer::new(id, PixelRect::new(x, y, 2, 2), depth)
}

/// Pixels with non-zero alpha.
pub fn covered(buffer: &RenderBuffer) -> usize {
    buffer.count_color(|c| c.w > 0.0)
}
