//! 渲染 Pass 实现
//!
//! 包含三种掩码 Pass 及合成策略。

mod compositor;
mod depth_write;
mod mask;
mod maskable;

pub use compositor::{CompositeInputs, CutoutCompositor, MaskCompositor, TintCompositor};
pub use depth_write::{DepthWritePass, OBJECTS_DEPTH_BUFFER_NAME, OBJECTS_DEPTH_TEXTURE_NAME};
pub use mask::MaskPass;
pub use maskable::{FILTERING_BUFFER_NAME, MaskableCompositePass, SCRATCH_BUFFER_NAME};
