//! 渲染管线组织
//!
//! 提供：
//! - RenderPassEvent: 管线插入时机
//! - TransientBufferPool: 每帧临时缓冲区分配器
//! - RenderCommand/CommandBuffer: 录制的渲染命令
//! - PipelineContext/SetupContext/ExecuteContext/PassFrame: 各阶段上下文
//! - RenderNode: 渲染节点 Trait
//! - FrameBuilder: 按时机排序节点
//! - RenderGraph: 渲染图执行器
//! - passes: 掩码 Pass 实现

pub mod builder;
pub mod command;
pub mod context;
pub mod graph;
pub mod node;
pub mod passes;
pub mod stage;
pub mod transient_pool;

pub use builder::FrameBuilder;
pub use command::{BlitMaterial, ClearConfig, CommandBuffer, OverrideShader, RenderCommand};
pub use context::{
    BufferRole, ExecuteContext, GlobalTextureSlots, MaterialLibrary, PassFrame, PipelineContext,
    SetupContext,
};
pub use graph::{CameraReport, RenderGraph};
pub use node::RenderNode;
pub use passes::{
    CompositeInputs, CutoutCompositor, DepthWritePass, MaskCompositor, MaskPass,
    MaskableCompositePass, TintCompositor,
};
pub use stage::RenderPassEvent;
pub use transient_pool::{BufferDesc, BufferHandle, BufferId, PoolConfig, PoolStats, TransientBufferPool};
