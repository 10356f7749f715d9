//! 渲染图执行器
//!
//! `RenderGraph` 按排序后的顺序驱动一个相机一帧内所有节点的三个阶段：
//!
//! ```text
//! setup(全部) → execute(已就绪) → inspect → cleanup(已就绪) → end_frame
//! ```
//!
//! 所有节点执行完毕后才开始 cleanup，因此本帧发布的全局纹理在
//! inspect 回调（下游消费者）中仍然有效。

use std::borrow::Cow;

use super::command::{CommandBuffer, RenderCommand};
use super::context::{ExecuteContext, PassFrame, PipelineContext, SetupContext};
use super::node::RenderNode;
use crate::errors::MaskError;
use crate::renderer::backend::{CommandExecutor, ExecuteTarget};
use crate::renderer::settings::PassInput;
use crate::scene::camera::CameraData;
use crate::scene::culling::CullingResults;

/// 一个相机一帧的执行结果
#[derive(Debug, Clone, Default)]
pub struct CameraReport {
    pub camera: Cow<'static, str>,
    /// 提交给后端的全部命令（按执行顺序）
    ///
    /// 包含后端拒绝的提交（对应节点记入 `skipped`），不区分后端实际执行到哪一条；
    /// `execute` 返回错误时丢弃的命令不在其中。
    pub commands: Vec<RenderCommand>,
    /// 成功执行的节点名称
    pub executed: Vec<String>,
    /// 本帧被跳过的节点名称
    pub skipped: Vec<String>,
    /// 帧结束时仍未释放的临时缓冲区
    pub leaked: Vec<String>,
}

impl CameraReport {
    /// 命令序列中第一个满足条件的命令的位置
    #[must_use]
    pub fn position(&self, pred: impl Fn(&RenderCommand) -> bool) -> Option<usize> {
        self.commands.iter().position(pred)
    }
}

/// 渲染图
///
/// 线性顺序执行节点列表。节点由 `FrameBuilder` 排序后加入。
pub struct RenderGraph<'a> {
    nodes: Vec<&'a dyn RenderNode>,
}

impl Default for RenderGraph<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> RenderGraph<'a> {
    /// 创建空的渲染图
    #[must_use]
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    /// 预分配节点容量
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
        }
    }

    /// 添加渲染节点，按添加顺序执行
    #[inline]
    pub fn add_node(&mut self, node: &'a dyn RenderNode) {
        self.nodes.push(node);
    }

    /// 获取节点数量
    #[inline]
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// 节点名称（按执行顺序）
    pub fn node_names(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(|n| n.name())
    }

    /// 所有节点要求的上游输入的并集
    #[must_use]
    pub fn required_inputs(&self) -> PassInput {
        self.nodes
            .iter()
            .fold(PassInput::empty(), |acc, n| acc | n.inputs())
    }

    /// 为一个相机执行整张图
    ///
    /// 单个节点的失败不会越过该节点的边界：
    /// - setup 失败：回滚已申请的缓冲区，跳过该节点
    /// - execute 失败：丢弃该节点录制的命令，cleanup 照常执行
    pub fn execute<E>(
        &self,
        pipeline: &mut PipelineContext,
        camera: &CameraData,
        culling: &CullingResults,
        executor: &mut E,
        mut inspect: impl FnMut(&PipelineContext),
    ) -> CameraReport
    where
        E: CommandExecutor + ?Sized,
    {
        let mut report = CameraReport {
            camera: camera.name.clone(),
            ..CameraReport::default()
        };

        // 1. Setup
        let mut ready: Vec<(&dyn RenderNode, PassFrame)> = Vec::with_capacity(self.nodes.len());
        for &node in &self.nodes {
            let mut ctx = SetupContext::new(camera, &pipeline.materials, &mut pipeline.pool);
            match node.setup(&mut ctx) {
                Ok(frame) => ready.push((node, frame)),
                Err(e) => {
                    ctx.rollback();
                    log::warn!("{}: skipped for camera `{}`: {e}", node.name(), camera.name);
                    report.skipped.push(node.name().to_owned());
                }
            }
        }

        // 2. Execute
        for (node, frame) in &ready {
            let mut cmd = CommandBuffer::new(node.name().to_owned());
            if let Some(target) = frame.target() {
                cmd.set_render_target(target);
                if let Some(clear) = frame.clear() {
                    cmd.clear_render_target(clear);
                }
            }

            let recorded = node.execute(
                frame,
                &mut ExecuteContext {
                    camera,
                    cmd: &mut cmd,
                },
            );
            if let Err(e) = recorded {
                log::warn!("{}: execute failed for camera `{}`: {e}", node.name(), camera.name);
                report.skipped.push(node.name().to_owned());
                continue;
            }

            log::debug!("{}: {} command(s) for camera `{}`", node.name(), cmd.len(), camera.name);
            let mut target = ExecuteTarget {
                pipeline: &mut *pipeline,
                camera,
                culling,
            };
            match executor.execute(&cmd, &mut target) {
                Ok(()) => report.executed.push(node.name().to_owned()),
                Err(e) => {
                    log::warn!("{}: backend rejected commands: {e}", node.name());
                    report.skipped.push(node.name().to_owned());
                }
            }
            report.commands.extend(cmd.take());
        }

        // 3. 下游消费者
        inspect(pipeline);

        // 4. Cleanup
        for (node, frame) in ready {
            let mut cmd = CommandBuffer::new(format!("{} cleanup", node.name()));
            if let Err(e) = node.cleanup(frame, Some(&mut cmd)) {
                log::error!("{}: cleanup failed: {e}", node.name());
                continue;
            }
            let mut target = ExecuteTarget {
                pipeline: &mut *pipeline,
                camera,
                culling,
            };
            if let Err(e) = executor.execute(&cmd, &mut target) {
                log::error!("{}: release failed: {e}", node.name());
            }
            report.commands.extend(cmd.take());
        }

        // 5. 泄漏检查
        if let Err(MaskError::ResourceLeak(names)) = pipeline.pool.end_frame() {
            report.leaked = names;
        }

        report
    }
}
