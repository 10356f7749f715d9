//! Feature Configuration
//!
//! A serializable description of a whole feature set, as authored by host
//! tooling. Every field has a default, so partial documents are valid:
//!
//! ```json
//! {
//!   "pool": { "budget_bytes": 67108864 },
//!   "mask_passes": [ { "texture_name": "_SelectionMask", "draw_skybox": true } ],
//!   "maskable": { "layer_mask": 4, "compositor": { "kind": "tint", "color": [1, 0, 0, 1] } }
//! }
//! ```

use std::path::Path;

use glam::Vec4;
use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::renderer::FeatureRenderer;
use crate::renderer::backend::{SoftwareExecutor, StepThresholdContract};
use crate::renderer::feature::{MaskRendererFeature, MaskableRendererFeature};
use crate::renderer::graph::passes::{CutoutCompositor, MaskCompositor, TintCompositor};
use crate::renderer::graph::PipelineContext;
use crate::renderer::graph::transient_pool::PoolConfig;
use crate::renderer::settings::{MaskableSettings, PassSettings};

/// Built-in recombination strategy selection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CompositorConfig {
    Tint { color: [f32; 4] },
    Cutout,
}

impl Default for CompositorConfig {
    fn default() -> Self {
        Self::Tint {
            color: [1.0, 1.0, 1.0, 0.5],
        }
    }
}

impl CompositorConfig {
    #[must_use]
    pub fn build(self) -> Box<dyn MaskCompositor> {
        match self {
            Self::Tint { color } => Box::new(TintCompositor::new(Vec4::from_array(color))),
            Self::Cutout => Box::new(CutoutCompositor),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaskableConfig {
    #[serde(flatten)]
    pub settings: MaskableSettings,
    pub compositor: CompositorConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    pub pool: PoolConfig,
    pub mask_passes: Vec<PassSettings>,
    pub maskable: Option<MaskableConfig>,
    pub step_threshold: StepThresholdContract,
}

impl FeatureConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        log::debug!("loading feature config from {}", path.as_ref().display());
        Self::from_json_str(&text)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Builds the configured features. Empty sections add no feature.
    #[must_use]
    pub fn build_renderer(&self) -> FeatureRenderer {
        let mut renderer = FeatureRenderer::new();
        if !self.mask_passes.is_empty() {
            renderer.add_feature(Box::new(MaskRendererFeature::new(
                "MaskRendererFeature",
                &self.mask_passes,
            )));
        }
        if let Some(maskable) = &self.maskable {
            renderer.add_feature(Box::new(MaskableRendererFeature::new(
                "MaskableRendererFeature",
                maskable.settings.clone(),
                maskable.compositor.build(),
            )));
        }
        renderer
    }

    #[must_use]
    pub fn build_pipeline(&self) -> PipelineContext {
        PipelineContext::new(self.pool)
    }

    /// Reference backend honoring the configured threshold contract.
    #[must_use]
    pub fn build_executor(&self) -> SoftwareExecutor {
        SoftwareExecutor::with_contract(self.step_threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::graph::stage::RenderPassEvent;

    #[test]
    fn test_partial_document_uses_defaults() {
        let config = FeatureConfig::from_json_str(
            r#"{ "mask_passes": [ { "texture_name": "_Sel", "render_queue_upper_bound": 9000 } ] }"#,
        )
        .unwrap();
        assert_eq!(config.mask_passes.len(), 1);
        let pass = &config.mask_passes[0];
        assert_eq!(pass.texture_name, "_Sel");
        assert!(pass.draw_renderers);
        assert_eq!(pass.render_pass_event, RenderPassEvent::AfterRenderingOpaques);
        assert_eq!(pass.clamped().render_queue_upper_bound, 5000);
        assert!(config.maskable.is_none());
        assert_eq!(config.step_threshold, StepThresholdContract::default());
    }

    #[test]
    fn test_maskable_section() {
        let config = FeatureConfig::from_json_str(
            r#"{ "maskable": { "name": "Outline", "draw_skybox": true, "compositor": { "kind": "cutout" } } }"#,
        )
        .unwrap();
        let maskable = config.maskable.as_ref().unwrap();
        assert!(maskable.settings.draw_skybox);
        assert_eq!(maskable.settings.name, "Outline");
        assert_eq!(maskable.compositor, CompositorConfig::Cutout);
        assert_eq!(config.build_renderer().features().len(), 1);
    }

    #[test]
    fn test_malformed_json_is_config_error() {
        let err = FeatureConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, crate::errors::MaskError::JsonError(_)));
    }
}
