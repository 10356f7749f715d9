//! 渲染节点 Trait
//!
//! 定义插入宿主管线的渲染 Pass 的抽象接口。
//! 每个节点在每个相机上经历 setup → execute → cleanup 三个阶段。

use super::command::CommandBuffer;
use super::context::{ExecuteContext, PassFrame, SetupContext};
use super::stage::RenderPassEvent;
use crate::errors::Result;
use crate::renderer::settings::PassInput;

/// 渲染节点 Trait
///
/// 所有 Mask Pass 必须实现此接口。
///
/// # 设计原则
/// - 节点本身无状态：`setup` 返回的 [`PassFrame`] 保存该相机的全部临时资源，
///   同一个节点可以被多个相机复用
/// - `setup` 接收 `SetupContext`（可变），用于申请临时缓冲区
/// - `execute` 只录制命令，不直接读写缓冲区
/// - `cleanup` 按值消费 `PassFrame`，释放后句柄无法再被使用
///
/// # 错误处理
/// - `setup` 失败：调度器回滚已申请的缓冲区，跳过 `execute` 与 `cleanup`
/// - `execute` 失败：本节点录制的命令被丢弃，`cleanup` 仍然执行
pub trait RenderNode {
    /// 返回节点名称，用于调试和日志
    fn name(&self) -> &str;

    /// 节点插入宿主管线的时机
    fn event(&self) -> RenderPassEvent;

    /// 节点要求宿主生成的上游输入
    fn inputs(&self) -> PassInput {
        PassInput::empty()
    }

    /// 准备阶段：按相机描述申请临时缓冲区，配置渲染目标与清屏
    fn setup(&self, ctx: &mut SetupContext) -> Result<PassFrame>;

    /// 执行阶段：按固定顺序录制渲染命令
    fn execute(&self, frame: &PassFrame, ctx: &mut ExecuteContext) -> Result<()>;

    /// 清理阶段：录制 setup 中申请的每个缓冲区的释放命令
    ///
    /// 宿主未提供命令缓冲区时无法释放，返回
    /// [`MaskError::MissingCommandContext`](crate::errors::MaskError::MissingCommandContext)，
    /// 泄漏由帧结束时的检查报告。
    fn cleanup(&self, frame: PassFrame, cmd: Option<&mut CommandBuffer>) -> Result<()> {
        let Some(cmd) = cmd else {
            log::error!("{}: cleanup called without a command buffer", self.name());
            return Err(crate::errors::MaskError::MissingCommandContext(
                self.name().to_owned(),
            ));
        };
        frame.record_release(cmd);
        Ok(())
    }
}
