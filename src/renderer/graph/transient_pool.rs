//! Transient Buffer Pool
//!
//! The resource allocator for per-frame temporary render buffers. Passes
//! acquire buffers during **setup**, reference them during **execute** and
//! release them during **cleanup**. Host-owned camera buffers are imported
//! once and never released through the pool.
//!
//! # Design
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │              TransientBufferPool                     │
//! │                                                     │
//! │  entries: FxHashMap<BufferId, PoolEntry>            │
//! │  free:    FxHashMap<PoolKey, Vec<RenderBuffer>>     │
//! │                                                     │
//! │  acquire(name, desc) → BufferHandle   (setup)       │
//! │  buffer(handle)                        (execute)    │
//! │  release(handle)                       (cleanup)    │
//! │  end_frame()   leak check + force release           │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! # Handle Validity
//!
//! A [`BufferHandle`] is the name-derived [`BufferId`] plus a generation
//! counter. Every acquire bumps the generation, so a handle kept past its
//! release (or past the end of the frame) fails with
//! [`MaskError::StaleHandle`] instead of aliasing a later allocation.
//!
//! # Memory Strategy
//!
//! Released storage is kept in a free list keyed by size and format and
//! reused by later acquires. No cross-frame content guarantee is made.
//! Call [`TransientBufferPool::trim`] after resolution changes.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use xxhash_rust::xxh3::xxh3_64;

use crate::errors::{MaskError, Result};
use crate::renderer::backend::buffer::RenderBuffer;
use crate::renderer::settings::ColorFormat;

// ─── Public Types ─────────────────────────────────────────────────────────────

/// Stable buffer identifier derived from a logical name.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub struct BufferId(u64);

impl BufferId {
    /// Hashes `name` into an id. Equal names always map to equal ids.
    #[inline]
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        Self(xxh3_64(name.as_bytes()))
    }

    #[inline]
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// Handle to a buffer for the current frame.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct BufferHandle {
    id: BufferId,
    generation: u32,
}

impl BufferHandle {
    #[inline]
    #[must_use]
    pub const fn id(self) -> BufferId {
        self.id
    }

    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

/// Descriptor for requesting a buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BufferDesc {
    pub width: u32,
    pub height: u32,
    pub color_format: ColorFormat,
    /// 0, 16, 24 or 32. Depth formats always carry a depth plane.
    pub depth_bits: u8,
    pub msaa_samples: u8,
    pub filter: wgpu::FilterMode,
}

impl BufferDesc {
    #[must_use]
    pub const fn new(width: u32, height: u32, color_format: ColorFormat) -> Self {
        Self {
            width,
            height,
            color_format,
            depth_bits: 0,
            msaa_samples: 1,
            filter: wgpu::FilterMode::Nearest,
        }
    }

    #[must_use]
    pub const fn with_depth_bits(mut self, depth_bits: u8) -> Self {
        self.depth_bits = depth_bits;
        self
    }

    #[must_use]
    pub const fn with_msaa_samples(mut self, msaa_samples: u8) -> Self {
        self.msaa_samples = msaa_samples;
        self
    }

    #[must_use]
    pub const fn with_filter(mut self, filter: wgpu::FilterMode) -> Self {
        self.filter = filter;
        self
    }

    #[must_use]
    pub const fn with_color_format(mut self, color_format: ColorFormat) -> Self {
        self.color_format = color_format;
        self
    }

    #[inline]
    #[must_use]
    pub const fn has_depth(&self) -> bool {
        self.depth_bits > 0 || matches!(self.color_format, ColorFormat::Depth)
    }

    #[inline]
    #[must_use]
    pub const fn extent(&self) -> wgpu::Extent3d {
        wgpu::Extent3d {
            width: self.width,
            height: self.height,
            depth_or_array_layers: 1,
        }
    }

    /// Approximate memory footprint in bytes.
    #[must_use]
    pub fn size_bytes(&self) -> u64 {
        let depth_bytes = match (self.has_depth(), self.depth_bits) {
            (false, _) => 0,
            (true, 0) => 4,
            (true, bits) => u32::from(bits) / 8,
        };
        let per_pixel = u64::from(self.color_format.bytes_per_pixel() + depth_bytes);
        u64::from(self.width) * u64::from(self.height) * per_pixel * u64::from(self.msaa_samples.max(1))
    }
}

/// Pool configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Upper bound on the bytes held by active temporary buffers.
    pub budget_bytes: Option<u64>,
}

/// Cumulative acquire/release counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PoolStats {
    pub acquired: u64,
    pub released: u64,
    pub failed: u64,
}

impl PoolStats {
    #[inline]
    #[must_use]
    pub fn outstanding(&self) -> u64 {
        self.acquired - self.released
    }
}

// ─── Internal Types ───────────────────────────────────────────────────────────

#[derive(Clone, PartialEq, Eq, Hash)]
struct PoolKey {
    width: u32,
    height: u32,
    color_format: ColorFormat,
    has_depth: bool,
}

impl PoolKey {
    fn from_desc(desc: &BufferDesc) -> Self {
        Self {
            width: desc.width,
            height: desc.height,
            color_format: desc.color_format,
            has_depth: desc.has_depth(),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Residency {
    Temporary,
    Imported,
}

struct PoolEntry {
    name: String,
    desc: BufferDesc,
    generation: u32,
    active: bool,
    residency: Residency,
    buffer: Option<RenderBuffer>,
}

// ─── Pool Implementation ──────────────────────────────────────────────────────

/// Allocator for frame-scoped render buffers.
///
/// # Borrowing
///
/// Acquire and release need `&mut self`; reads during execute only `&self`.
/// A pool belongs to one pipeline context and serves one camera at a time.
pub struct TransientBufferPool {
    entries: FxHashMap<BufferId, PoolEntry>,
    free: FxHashMap<PoolKey, Vec<RenderBuffer>>,
    config: PoolConfig,
    stats: PoolStats,
    active_bytes: u64,
}

impl TransientBufferPool {
    /// Creates an empty pool without a memory budget.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(PoolConfig::default())
    }

    #[must_use]
    pub fn with_config(config: PoolConfig) -> Self {
        Self {
            entries: FxHashMap::default(),
            free: FxHashMap::default(),
            config,
            stats: PoolStats::default(),
            active_bytes: 0,
        }
    }

    // ── Host-owned buffers ─────────────────────────────────────────────────

    /// Registers a persistent, host-owned buffer under `name`.
    ///
    /// Re-importing the same name replaces the storage and invalidates
    /// earlier handles.
    pub fn import(&mut self, name: &str, buffer: RenderBuffer) -> BufferHandle {
        let id = BufferId::from_name(name);
        let desc = BufferDesc {
            width: buffer.width(),
            height: buffer.height(),
            color_format: if buffer.has_color() {
                ColorFormat::ArgbFloat
            } else {
                ColorFormat::Depth
            },
            depth_bits: if buffer.has_depth() { 32 } else { 0 },
            msaa_samples: 1,
            filter: wgpu::FilterMode::Nearest,
        };
        let generation = self.entries.get(&id).map_or(0, |e| e.generation + 1);
        self.entries.insert(
            id,
            PoolEntry {
                name: name.to_owned(),
                desc,
                generation,
                active: true,
                residency: Residency::Imported,
                buffer: Some(buffer),
            },
        );
        BufferHandle { id, generation }
    }

    // ── Setup phase ────────────────────────────────────────────────────────

    /// Acquires a temporary buffer for the logical `name`.
    ///
    /// Fails when the descriptor has no extent, when the memory budget would
    /// be exceeded, or when `name` is still held from an earlier acquire.
    pub fn acquire(&mut self, name: &str, desc: &BufferDesc) -> Result<BufferHandle> {
        let id = BufferId::from_name(name);

        if let Some(entry) = self.entries.get(&id)
            && entry.active
        {
            self.stats.failed += 1;
            return Err(if entry.residency == Residency::Imported {
                MaskError::NotTemporary(name.to_owned())
            } else {
                MaskError::DoubleAcquire(name.to_owned())
            });
        }

        if desc.width == 0 || desc.height == 0 {
            self.stats.failed += 1;
            return Err(MaskError::AllocationFailed {
                name: name.to_owned(),
                reason: format!("empty extent {}x{}", desc.width, desc.height),
            });
        }

        let size = desc.size_bytes();
        if let Some(budget) = self.config.budget_bytes
            && self.active_bytes + size > budget
        {
            self.stats.failed += 1;
            return Err(MaskError::AllocationFailed {
                name: name.to_owned(),
                reason: format!(
                    "{size} bytes exceeds budget ({} of {budget} in use)",
                    self.active_bytes
                ),
            });
        }

        let key = PoolKey::from_desc(desc);
        let buffer = self
            .free
            .get_mut(&key)
            .and_then(Vec::pop)
            .unwrap_or_else(|| RenderBuffer::new(desc));

        let generation = self.entries.get(&id).map_or(0, |e| e.generation + 1);
        self.entries.insert(
            id,
            PoolEntry {
                name: name.to_owned(),
                desc: *desc,
                generation,
                active: true,
                residency: Residency::Temporary,
                buffer: Some(buffer),
            },
        );
        self.active_bytes += size;
        self.stats.acquired += 1;
        log::trace!("acquire `{name}` gen {generation} ({}x{})", desc.width, desc.height);

        Ok(BufferHandle { id, generation })
    }

    // ── Execute phase ──────────────────────────────────────────────────────

    fn live_entry(&self, handle: BufferHandle) -> Result<&PoolEntry> {
        match self.entries.get(&handle.id) {
            Some(e) if e.active && e.generation == handle.generation => Ok(e),
            Some(e) => Err(MaskError::StaleHandle(format!(
                "`{}` gen {} (current gen {}, active: {})",
                e.name, handle.generation, e.generation, e.active
            ))),
            None => Err(MaskError::StaleHandle(format!("unknown id {:#x}", handle.id.raw()))),
        }
    }

    /// Returns `true` while `handle` may be read.
    #[must_use]
    pub fn is_live(&self, handle: BufferHandle) -> bool {
        self.live_entry(handle).is_ok()
    }

    pub fn buffer(&self, handle: BufferHandle) -> Result<&RenderBuffer> {
        self.live_entry(handle)?
            .buffer
            .as_ref()
            .ok_or_else(|| MaskError::StaleHandle(format!("{:#x} has no storage", handle.id.raw())))
    }

    pub fn buffer_mut(&mut self, handle: BufferHandle) -> Result<&mut RenderBuffer> {
        self.live_entry(handle)?;
        self.entries
            .get_mut(&handle.id)
            .and_then(|e| e.buffer.as_mut())
            .ok_or_else(|| MaskError::StaleHandle(format!("{:#x} has no storage", handle.id.raw())))
    }

    pub fn descriptor(&self, handle: BufferHandle) -> Result<BufferDesc> {
        self.live_entry(handle).map(|e| e.desc)
    }

    pub fn name(&self, handle: BufferHandle) -> Result<&str> {
        self.live_entry(handle).map(|e| e.name.as_str())
    }

    // ── Cleanup phase ──────────────────────────────────────────────────────

    /// Releases a temporary buffer. The handle is stale afterwards.
    pub fn release(&mut self, handle: BufferHandle) -> Result<()> {
        let entry = self.live_entry(handle)?;
        if entry.residency == Residency::Imported {
            return Err(MaskError::NotTemporary(entry.name.clone()));
        }
        self.release_entry(handle.id);
        Ok(())
    }

    fn release_entry(&mut self, id: BufferId) {
        let Some(entry) = self.entries.get_mut(&id) else {
            return;
        };
        entry.active = false;
        self.active_bytes = self.active_bytes.saturating_sub(entry.desc.size_bytes());
        self.stats.released += 1;
        log::trace!("release `{}` gen {}", entry.name, entry.generation);
        if let Some(buffer) = entry.buffer.take() {
            self.free
                .entry(PoolKey::from_desc(&entry.desc))
                .or_default()
                .push(buffer);
        }
    }

    // ── Frame boundary ─────────────────────────────────────────────────────

    /// Names of temporary buffers currently held.
    #[must_use]
    pub fn outstanding(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .entries
            .values()
            .filter(|e| e.active && e.residency == Residency::Temporary)
            .map(|e| e.name.clone())
            .collect();
        names.sort();
        names
    }

    /// Verifies that every temporary buffer was released.
    ///
    /// Leaked buffers are reported as [`MaskError::ResourceLeak`] and then
    /// force-released so the next frame starts clean.
    pub fn end_frame(&mut self) -> Result<()> {
        let leaked: Vec<BufferId> = self
            .entries
            .iter()
            .filter(|(_, e)| e.active && e.residency == Residency::Temporary)
            .map(|(id, _)| *id)
            .collect();

        if leaked.is_empty() {
            return Ok(());
        }

        let names = self.outstanding();
        log::error!("temporary buffers leaked past frame end: {}", names.join(", "));
        for id in leaked {
            self.release_entry(id);
        }
        Err(MaskError::ResourceLeak(names))
    }

    /// Drops pooled storage that is not currently in use.
    pub fn trim(&mut self) {
        self.free.clear();
    }

    #[inline]
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        self.stats
    }

    #[inline]
    #[must_use]
    pub fn active_bytes(&self) -> u64 {
        self.active_bytes
    }

    /// Number of storage blocks owned by the pool (active and free).
    #[must_use]
    pub fn total_buffer_count(&self) -> usize {
        self.entries.values().filter(|e| e.buffer.is_some()).count()
            + self.free.values().map(Vec::len).sum::<usize>()
    }
}

impl Default for TransientBufferPool {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn desc() -> BufferDesc {
        BufferDesc::new(8, 4, ColorFormat::Argb32).with_depth_bits(32)
    }

    #[test]
    fn test_handles_are_name_derived() {
        let mut pool = TransientBufferPool::new();
        let a = pool.acquire("_filteringBuffer", &desc()).unwrap();
        assert_eq!(a.id(), BufferId::from_name("_filteringBuffer"));
        pool.release(a).unwrap();
        let b = pool.acquire("_filteringBuffer", &desc()).unwrap();
        assert_eq!(a.id(), b.id());
        assert_ne!(a.generation(), b.generation());
    }

    #[test]
    fn test_released_handle_is_stale() {
        let mut pool = TransientBufferPool::new();
        let h = pool.acquire("mask", &desc()).unwrap();
        pool.release(h).unwrap();
        assert!(matches!(pool.buffer(h), Err(MaskError::StaleHandle(_))));
        assert!(matches!(pool.release(h), Err(MaskError::StaleHandle(_))));
    }

    #[test]
    fn test_double_acquire_rejected() {
        let mut pool = TransientBufferPool::new();
        let _h = pool.acquire("mask", &desc()).unwrap();
        assert!(matches!(pool.acquire("mask", &desc()), Err(MaskError::DoubleAcquire(_))));
    }

    #[test]
    fn test_budget_and_empty_extent() {
        let mut pool = TransientBufferPool::with_config(PoolConfig {
            budget_bytes: Some(desc().size_bytes()),
        });
        let _a = pool.acquire("a", &desc()).unwrap();
        assert!(matches!(pool.acquire("b", &desc()), Err(MaskError::AllocationFailed { .. })));
        assert!(matches!(
            pool.acquire("c", &BufferDesc::new(0, 4, ColorFormat::Argb32)),
            Err(MaskError::AllocationFailed { .. })
        ));
        assert_eq!(pool.stats().failed, 2);
    }

    #[test]
    fn test_end_frame_reports_and_clears_leaks() {
        let mut pool = TransientBufferPool::new();
        let _h = pool.acquire("leaky", &desc()).unwrap();
        match pool.end_frame() {
            Err(MaskError::ResourceLeak(names)) => assert_eq!(names, ["leaky"]),
            other => panic!("expected leak, got {other:?}"),
        }
        assert!(pool.outstanding().is_empty());
        assert!(pool.end_frame().is_ok());
    }

    #[test]
    fn test_storage_is_recycled() {
        let mut pool = TransientBufferPool::new();
        let a = pool.acquire("a", &desc()).unwrap();
        pool.release(a).unwrap();
        let _b = pool.acquire("b", &desc()).unwrap();
        assert_eq!(pool.total_buffer_count(), 1);
    }

    #[test]
    fn test_descriptor_and_name_follow_liveness() {
        let mut pool = TransientBufferPool::new();
        let h = pool.acquire("_scratchBuffer_Outline", &desc()).unwrap();
        assert_eq!(pool.descriptor(h).unwrap(), desc());
        assert_eq!(pool.name(h).unwrap(), "_scratchBuffer_Outline");
        pool.release(h).unwrap();
        assert!(matches!(pool.descriptor(h), Err(MaskError::StaleHandle(_))));
        assert!(matches!(pool.name(h), Err(MaskError::StaleHandle(_))));
    }

    #[test]
    fn test_trim_drops_free_storage_only() {
        let mut pool = TransientBufferPool::new();
        let a = pool.acquire("a", &desc()).unwrap();
        let b = pool.acquire("b", &desc()).unwrap();
        pool.release(a).unwrap();
        assert_eq!(pool.total_buffer_count(), 2);

        pool.trim();
        assert_eq!(pool.total_buffer_count(), 1);
        assert!(pool.buffer(b).is_ok());
    }

    #[test]
    fn test_buffer_storage_matches_extent() {
        let extent = desc().extent();
        assert_eq!((extent.width, extent.height, extent.depth_or_array_layers), (8, 4, 1));
        let buffer = RenderBuffer::new(&desc());
        assert_eq!((buffer.width(), buffer.height()), (extent.width, extent.height));
    }

    #[test]
    fn test_imported_buffers_cannot_be_released() {
        let mut pool = TransientBufferPool::new();
        let h = pool.import("_CameraDepthTexture", RenderBuffer::depth_filled(2, 2, 1.0));
        assert!(matches!(pool.release(h), Err(MaskError::NotTemporary(_))));
        assert!(pool.is_live(h));
    }
}
