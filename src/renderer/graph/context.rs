//! Pass Context System
//!
//! Provides the pipeline-wide context and the phase-separated contexts that
//! the scheduler hands to each pass:
//!
//! - [`PipelineContext`]: owned by the host for the lifetime of the pipeline.
//!   Holds the transient buffer pool, the named global texture slots and the
//!   override material library. It is passed explicitly everywhere; there is
//!   no hidden global state.
//!
//! - [`SetupContext`]: mutable access to the pool for one pass and one camera.
//!   Every acquire goes through [`SetupContext::acquire`] so the scheduler can
//!   roll back partial allocations when setup fails.
//!
//! - [`ExecuteContext`]: read-only camera data plus the command buffer the
//!   pass records into.
//!
//! - [`PassFrame`]: what a pass's setup produced for one camera (buffers,
//!   render target, clear). It is consumed by cleanup, so a handle cannot
//!   outlive its frame through the pass.

use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

use crate::errors::{MaskError, Result};
use crate::renderer::backend::buffer::RenderBuffer;
use crate::renderer::graph::command::{ClearConfig, CommandBuffer, OverrideShader};
use crate::renderer::graph::transient_pool::{
    BufferDesc, BufferHandle, PoolConfig, TransientBufferPool,
};
use crate::scene::camera::CameraData;

// ─── Global Texture Slots ─────────────────────────────────────────────────────

/// String-keyed texture slots read by downstream pipeline stages.
///
/// Slots are cleared at frame start and overwritten by later publishes. A slot
/// may point at a buffer that has since been released; reading it through
/// [`PipelineContext::read_global`] then fails with a stale-handle error.
#[derive(Debug, Default)]
pub struct GlobalTextureSlots {
    slots: FxHashMap<String, BufferHandle>,
    frame_index: u64,
}

impl GlobalTextureSlots {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears every slot and records the new frame index.
    pub fn begin_frame(&mut self, frame_index: u64) {
        self.slots.clear();
        self.frame_index = frame_index;
    }

    pub fn publish(&mut self, name: &str, buffer: BufferHandle) {
        if let Some(slot) = self.slots.get_mut(name) {
            *slot = buffer;
        } else {
            self.slots.insert(name.to_owned(), buffer);
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<BufferHandle> {
        self.slots.get(name).copied()
    }

    pub fn unbind(&mut self, name: &str) -> Option<BufferHandle> {
        self.slots.remove(name)
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }
}

// ─── Material Library ─────────────────────────────────────────────────────────

/// The override shader programs the host can provide.
#[derive(Debug, Clone)]
pub struct MaterialLibrary {
    available: FxHashSet<OverrideShader>,
}

impl MaterialLibrary {
    /// Library offering every override program.
    #[must_use]
    pub fn with_all() -> Self {
        Self {
            available: OverrideShader::ALL.into_iter().collect(),
        }
    }

    #[must_use]
    pub fn empty() -> Self {
        Self {
            available: FxHashSet::default(),
        }
    }

    #[must_use]
    pub fn without(mut self, shader: OverrideShader) -> Self {
        self.available.remove(&shader);
        self
    }

    pub fn insert(&mut self, shader: OverrideShader) {
        self.available.insert(shader);
    }

    /// Resolves a program, failing when the host doesn't provide it.
    pub fn resolve(&self, shader: OverrideShader) -> Result<OverrideShader> {
        if self.available.contains(&shader) {
            Ok(shader)
        } else {
            Err(MaskError::MissingShader(shader.path()))
        }
    }
}

impl Default for MaterialLibrary {
    fn default() -> Self {
        Self::with_all()
    }
}

// ─── Pipeline Context ─────────────────────────────────────────────────────────

/// Pipeline-wide state shared by every pass and camera.
#[derive(Default)]
pub struct PipelineContext {
    pub pool: TransientBufferPool,
    pub globals: GlobalTextureSlots,
    pub materials: MaterialLibrary,
    frame_index: u64,
}

impl PipelineContext {
    #[must_use]
    pub fn new(pool_config: PoolConfig) -> Self {
        Self {
            pool: TransientBufferPool::with_config(pool_config),
            globals: GlobalTextureSlots::new(),
            materials: MaterialLibrary::with_all(),
            frame_index: 0,
        }
    }

    #[must_use]
    pub fn with_materials(mut self, materials: MaterialLibrary) -> Self {
        self.materials = materials;
        self
    }

    /// Starts a new frame: bumps the frame index and clears global slots.
    pub fn begin_frame(&mut self) {
        self.frame_index += 1;
        self.globals.begin_frame(self.frame_index);
    }

    #[inline]
    #[must_use]
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    /// Resolves a published global texture to its current contents.
    pub fn read_global(&self, name: &str) -> Result<&RenderBuffer> {
        let handle = self
            .globals
            .get(name)
            .ok_or_else(|| MaskError::StaleHandle(format!("global texture `{name}` is not bound")))?;
        self.pool.buffer(handle)
    }
}

// ─── Setup Context ────────────────────────────────────────────────────────────

/// Mutable context for one pass's setup for one camera.
pub struct SetupContext<'a> {
    pub camera: &'a CameraData,
    pub materials: &'a MaterialLibrary,
    pool: &'a mut TransientBufferPool,
    acquired: SmallVec<[BufferHandle; 4]>,
}

impl<'a> SetupContext<'a> {
    #[must_use]
    pub fn new(
        camera: &'a CameraData,
        materials: &'a MaterialLibrary,
        pool: &'a mut TransientBufferPool,
    ) -> Self {
        Self {
            camera,
            materials,
            pool,
            acquired: SmallVec::new(),
        }
    }

    /// Acquires a temporary buffer and remembers it for rollback.
    pub fn acquire(&mut self, name: &str, desc: &BufferDesc) -> Result<BufferHandle> {
        let handle = self.pool.acquire(name, desc)?;
        self.acquired.push(handle);
        Ok(handle)
    }

    /// Releases everything acquired through this context.
    ///
    /// Used by the scheduler when setup fails part-way, so no cleanup runs
    /// for a pass that never became ready.
    pub fn rollback(&mut self) {
        for handle in self.acquired.drain(..) {
            if let Err(e) = self.pool.release(handle) {
                log::error!("rollback failed to release buffer: {e}");
            }
        }
    }

    #[must_use]
    pub fn acquired(&self) -> &[BufferHandle] {
        &self.acquired
    }
}

// ─── Execute Context ──────────────────────────────────────────────────────────

/// Read-only camera data plus the command buffer for one pass's execute.
pub struct ExecuteContext<'a> {
    pub camera: &'a CameraData,
    pub cmd: &'a mut CommandBuffer,
}

// ─── Pass Frame ───────────────────────────────────────────────────────────────

/// Semantic role of a buffer a pass acquired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferRole {
    /// Isolated mask color buffer.
    Color,
    /// Composite pass mask buffer.
    Filtering,
    /// Composite pass scratch copy for skybox thresholding.
    Scratch,
    /// Standalone depth mask buffer.
    Depth,
}

/// Per-camera state produced by a pass's setup.
#[derive(Debug, Default)]
pub struct PassFrame {
    buffers: SmallVec<[(BufferRole, BufferHandle); 2]>,
    target: Option<BufferHandle>,
    clear: Option<ClearConfig>,
    camera_color: Option<BufferHandle>,
}

impl PassFrame {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an acquired temporary buffer under `role`.
    pub fn add_buffer(&mut self, role: BufferRole, handle: BufferHandle) {
        self.buffers.push((role, handle));
    }

    #[must_use]
    pub fn buffer(&self, role: BufferRole) -> Option<BufferHandle> {
        self.buffers
            .iter()
            .find(|(r, _)| *r == role)
            .map(|(_, h)| *h)
    }

    /// Temporary buffers owned by this frame, in acquire order.
    pub fn temporaries(&self) -> impl Iterator<Item = BufferHandle> + '_ {
        self.buffers.iter().map(|(_, h)| *h)
    }

    /// Render target bound before execute.
    pub fn configure_target(&mut self, target: BufferHandle) {
        self.target = Some(target);
    }

    /// Clear applied to the configured target before execute.
    pub fn configure_clear(&mut self, clear: ClearConfig) {
        self.clear = Some(clear);
    }

    /// Captures the camera color buffer as a composite destination.
    pub fn capture_camera_color(&mut self, color: BufferHandle) {
        self.camera_color = Some(color);
    }

    #[inline]
    #[must_use]
    pub fn target(&self) -> Option<BufferHandle> {
        self.target
    }

    #[inline]
    #[must_use]
    pub fn clear(&self) -> Option<ClearConfig> {
        self.clear
    }

    #[inline]
    #[must_use]
    pub fn camera_color(&self) -> Option<BufferHandle> {
        self.camera_color
    }

    /// Records one release per owned temporary buffer.
    pub fn record_release(&self, cmd: &mut CommandBuffer) {
        for handle in self.temporaries() {
            cmd.release_temporary(handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::settings::ColorFormat;

    #[test]
    fn test_global_slots_cleared_at_frame_start() {
        let mut ctx = PipelineContext::default();
        let h = ctx.pool.import("cam", RenderBuffer::depth_filled(1, 1, 1.0));
        ctx.begin_frame();
        ctx.globals.publish("_Mask", h);
        assert!(ctx.read_global("_Mask").is_ok());
        ctx.begin_frame();
        assert!(ctx.globals.get("_Mask").is_none());
        assert_eq!(ctx.globals.frame_index(), 2);
    }

    #[test]
    fn test_released_global_reads_fail() {
        let mut ctx = PipelineContext::default();
        let h = ctx
            .pool
            .acquire("_Mask", &BufferDesc::new(2, 2, ColorFormat::Argb32))
            .unwrap();
        ctx.globals.publish("_Mask", h);
        ctx.pool.release(h).unwrap();
        assert!(matches!(ctx.read_global("_Mask"), Err(MaskError::StaleHandle(_))));
    }

    #[test]
    fn test_setup_rollback_releases_partial_allocations() {
        let mut pool = TransientBufferPool::new();
        let camera_buffers = (
            pool.import("color", RenderBuffer::color_filled(2, 2, glam::Vec4::ZERO)),
            pool.import("depth", RenderBuffer::depth_filled(2, 2, 1.0)),
        );
        let camera = CameraData::new(
            "cam",
            BufferDesc::new(2, 2, ColorFormat::Argb32),
            camera_buffers.0,
            camera_buffers.1,
        );
        let materials = MaterialLibrary::with_all();
        let mut ctx = SetupContext::new(&camera, &materials, &mut pool);
        ctx.acquire("a", &camera.target).unwrap();
        ctx.acquire("b", &camera.target).unwrap();
        ctx.rollback();
        assert!(pool.outstanding().is_empty());
    }

    #[test]
    fn test_missing_material() {
        let lib = MaterialLibrary::with_all().without(OverrideShader::StepThreshold);
        assert!(lib.resolve(OverrideShader::WhiteOverride).is_ok());
        assert!(matches!(
            lib.resolve(OverrideShader::StepThreshold),
            Err(MaskError::MissingShader("Hidden/StepThreshold"))
        ));
    }
}
