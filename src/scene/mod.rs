//! 场景数据模块
//!
//! 宿主提供给 Pass 的每相机数据：
//! - CameraData: 相机目标描述、颜色/深度缓冲、天空盒、UI 覆盖层
//! - CullingOracle: 宿主的可见性剔除能力
//! - VisibleRenderer/CullingResults: 本帧可见物体

pub mod camera;
pub mod culling;

// 重新导出常用类型
pub use camera::{CameraData, PixelRect, Skybox, UiElement};
pub use culling::{CullingOracle, CullingResults, StaticScene, VisibleRenderer};
