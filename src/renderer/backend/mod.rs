//! Command Backends
//!
//! A backend interprets the [`CommandBuffer`]s recorded by passes against the
//! pipeline's buffers. The host supplies one; [`SoftwareExecutor`] is a
//! deterministic CPU implementation used for tests and headless validation.

pub mod buffer;
pub mod software;

pub use buffer::{FAR_DEPTH, RenderBuffer};
pub use software::{ExecutorStats, SoftwareExecutor, StepThresholdContract};

use crate::errors::Result;
use crate::renderer::graph::command::CommandBuffer;
use crate::renderer::graph::context::PipelineContext;
use crate::scene::camera::CameraData;
use crate::scene::culling::CullingResults;

/// Everything a backend touches while running one command buffer.
pub struct ExecuteTarget<'a> {
    pub pipeline: &'a mut PipelineContext,
    pub camera: &'a CameraData,
    pub culling: &'a CullingResults,
}

/// Host-side interpreter of recorded commands.
pub trait CommandExecutor {
    /// Runs every command of `cmd` in recorded order.
    ///
    /// Stops at the first failing command and returns its error.
    fn execute(&mut self, cmd: &CommandBuffer, target: &mut ExecuteTarget<'_>) -> Result<()>;
}
