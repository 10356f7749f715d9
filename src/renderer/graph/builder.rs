//! 帧构建器
//!
//! `FrameBuilder` 收集每个相机本帧要执行的渲染节点，
//! 并按 `RenderPassEvent` 排序生成 `RenderGraph`。

use smallvec::SmallVec;

use super::graph::RenderGraph;
use super::node::RenderNode;
use super::stage::RenderPassEvent;

/// 渲染节点条目
///
/// 存储节点引用及其插入时机，用于排序。
struct NodeEntry<'a> {
    /// 插入时机
    event: RenderPassEvent,
    /// 同一时机内的注册顺序（用于稳定排序）
    order: u16,
    /// 节点引用
    node: &'a dyn RenderNode,
}

/// 帧构建器
///
/// # 设计原则
///
/// - **时机排序**：节点按 `(event.order(), 注册顺序)` 排序，同一时机内保持注册顺序
/// - **不持有节点**：仅存储共享引用，节点无状态，可被多个相机复用
///
/// # 用法
///
/// ```ignore
/// let mut builder = FrameBuilder::new();
/// builder.add_node(&depth_pass);
/// builder.add_node_at(RenderPassEvent::AfterRenderingTransparents, &mask_pass);
/// let graph = builder.build();
/// ```
pub struct FrameBuilder<'a> {
    /// 节点列表（未排序）
    nodes: SmallVec<[NodeEntry<'a>; 16]>,
    /// 下一个注册顺序号
    next_order: u16,
}

impl Default for FrameBuilder<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> FrameBuilder<'a> {
    /// 创建新的帧构建器
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: SmallVec::new(),
            next_order: 0,
        }
    }

    /// 在节点自身声明的时机添加节点
    #[inline]
    pub fn add_node(&mut self, node: &'a dyn RenderNode) -> &mut Self {
        self.add_node_at(node.event(), node)
    }

    /// 在指定时机添加节点
    #[inline]
    pub fn add_node_at(&mut self, event: RenderPassEvent, node: &'a dyn RenderNode) -> &mut Self {
        self.nodes.push(NodeEntry {
            event,
            order: self.next_order,
            node,
        });
        self.next_order = self.next_order.wrapping_add(1);
        self
    }

    /// 获取当前节点数量
    #[inline]
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// 检查指定时机是否有节点
    #[inline]
    #[must_use]
    pub fn has_event(&self, event: RenderPassEvent) -> bool {
        self.nodes.iter().any(|e| e.event == event)
    }

    /// 清空所有节点（保留容量）
    #[inline]
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.next_order = 0;
    }

    /// 排序并构建 `RenderGraph`
    #[must_use]
    pub fn build(mut self) -> RenderGraph<'a> {
        self.nodes
            .sort_unstable_by_key(|e| (e.event.order(), e.order));

        let mut graph = RenderGraph::with_capacity(self.nodes.len());
        for entry in self.nodes {
            graph.add_node(entry.node);
        }
        graph
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::graph::passes::MaskPass;
    use crate::renderer::settings::PassSettings;

    #[test]
    fn test_events_and_ordering() {
        let opaque = MaskPass::new(&PassSettings::default_opaque());
        let post = MaskPass::new(&PassSettings {
            texture_name: "_PostMask".to_owned(),
            ..PassSettings::default_post_processing()
        });

        let mut builder = FrameBuilder::new();
        builder
            .add_node(&post)
            .add_node_at(RenderPassEvent::BeforeRendering, &opaque);
        assert!(builder.has_event(RenderPassEvent::BeforeRendering));
        assert!(!builder.has_event(RenderPassEvent::AfterRenderingOpaques));
        assert_eq!(builder.node_count(), 2);

        let graph = builder.build();
        let names: Vec<_> = graph.node_names().collect();
        assert_eq!(names, ["MaskRenderPass: _MyTexture", "MaskRenderPass: _PostMask"]);
    }

    #[test]
    fn test_clear_forgets_events() {
        let opaque = MaskPass::new(&PassSettings::default_opaque());
        let mut builder = FrameBuilder::new();
        builder.add_node(&opaque);
        assert!(builder.has_event(RenderPassEvent::AfterRenderingOpaques));
        builder.clear();
        assert!(!builder.has_event(RenderPassEvent::AfterRenderingOpaques));
        assert_eq!(builder.node_count(), 0);
    }
}
