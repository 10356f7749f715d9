//! Error Types
//!
//! This module defines the error type shared by every pass, the transient
//! buffer pool and the reference backend.
//!
//! # Overview
//!
//! [`MaskError`] follows the three failure classes of the pass pipeline:
//! - **Configuration** problems (malformed JSON, unreadable files). Out-of-range
//!   queue bounds are *not* errors; they are clamped silently.
//! - **Resource** failures (allocation, missing override shader, stale handle).
//!   These are fatal to one pass for one frame and never retried.
//! - **Precondition violations** (cleanup without a command context). These are
//!   scheduling contract violations by the host and are reported loudly.
//!
//! # Usage
//!
//! All fallible APIs return [`Result<T>`], an alias for
//! `std::result::Result<T, MaskError>`.

use thiserror::Error;

/// The main error type for mask passes.
#[derive(Error, Debug)]
pub enum MaskError {
    // ========================================================================
    // Resource Errors
    // ========================================================================
    /// A temporary buffer could not be allocated.
    #[error("Failed to allocate temporary buffer `{name}`: {reason}")]
    AllocationFailed {
        /// Logical buffer name
        name: String,
        /// Human readable cause
        reason: String,
    },

    /// The same logical buffer was acquired twice before being released.
    #[error("Temporary buffer `{0}` is already acquired for this frame")]
    DoubleAcquire(String),

    /// A handle was used outside of its setup/cleanup window.
    #[error("Stale buffer handle: {0}")]
    StaleHandle(String),

    /// Imported (persistent) buffers are owned by the host and cannot be released.
    #[error("Buffer `{0}` is not a temporary buffer")]
    NotTemporary(String),

    /// A required override shader program is unavailable.
    #[error("Override shader not available: {0}")]
    MissingShader(&'static str),

    /// Temporary buffers were still held when the frame ended.
    #[error("Temporary buffers leaked past frame end: {}", .0.join(", "))]
    ResourceLeak(Vec<String>),

    // ========================================================================
    // Command Errors
    // ========================================================================
    /// Cleanup was invoked without a command buffer to record into.
    #[error("Pass `{0}` cleanup invoked without a command context")]
    MissingCommandContext(String),

    /// The injected recombination strategy failed.
    #[error("Mask composite failed: {0}")]
    CompositeFailed(String),

    /// A command referenced a render target it cannot operate on.
    #[error("Invalid render target: {0}")]
    InvalidTarget(String),

    /// Source and destination of a blit differ in size.
    #[error("Buffer size mismatch: {src_size:?} vs {dst_size:?}")]
    SizeMismatch {
        /// Source extent (width, height)
        src_size: (u32, u32),
        /// Destination extent (width, height)
        dst_size: (u32, u32),
    },

    // ========================================================================
    // Configuration & I/O Errors
    // ========================================================================
    /// JSON parsing error while loading settings.
    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// File I/O error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Alias for `Result<T, MaskError>`.
pub type Result<T> = std::result::Result<T, MaskError>;
