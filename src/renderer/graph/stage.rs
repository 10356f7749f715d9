//! Pipeline Insertion Events
//!
//! `RenderPassEvent` names the fixed points of the host's per-frame rendering
//! sequence at which a pass's commands are scheduled. Passes only select a
//! point; the scheduler enforces the ordering.

use serde::{Deserialize, Serialize};

/// Pipeline insertion point.
///
/// Variants carry sparse numeric values so that ordering is explicit and
/// stable across releases.
///
/// | Event | Value | Typical Content |
/// |-------|-------|-----------------|
/// | `BeforeRendering` | 0 | Per-camera resource preparation |
/// | `BeforeRenderingShadows` / `AfterRenderingShadows` | 50 / 100 | Shadow casters |
/// | `BeforeRenderingPrePasses` / `AfterRenderingPrePasses` | 150 / 200 | Depth prepass |
/// | `BeforeRenderingOpaques` / `AfterRenderingOpaques` | 250 / 300 | Opaque geometry |
/// | `BeforeRenderingSkybox` / `AfterRenderingSkybox` | 350 / 400 | Sky |
/// | `BeforeRenderingTransparents` / `AfterRenderingTransparents` | 450 / 500 | Blended geometry |
/// | `BeforeRenderingPostProcessing` / `AfterRenderingPostProcessing` | 550 / 600 | Post effects |
/// | `AfterRendering` | 1000 | Final blits, overlays |
#[derive(
    Debug, Hash, PartialEq, Eq, Clone, Copy, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[repr(u16)]
pub enum RenderPassEvent {
    BeforeRendering = 0,
    BeforeRenderingShadows = 50,
    AfterRenderingShadows = 100,
    BeforeRenderingPrePasses = 150,
    AfterRenderingPrePasses = 200,
    BeforeRenderingOpaques = 250,
    #[default]
    AfterRenderingOpaques = 300,
    BeforeRenderingSkybox = 350,
    AfterRenderingSkybox = 400,
    BeforeRenderingTransparents = 450,
    AfterRenderingTransparents = 500,
    BeforeRenderingPostProcessing = 550,
    AfterRenderingPostProcessing = 600,
    AfterRendering = 1000,
}

impl RenderPassEvent {
    /// Returns the numeric value of the event (used for sorting).
    #[inline]
    #[must_use]
    pub const fn order(self) -> u16 {
        self as u16
    }

    /// Event name (for debugging).
    #[inline]
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::BeforeRendering => "BeforeRendering",
            Self::BeforeRenderingShadows => "BeforeRenderingShadows",
            Self::AfterRenderingShadows => "AfterRenderingShadows",
            Self::BeforeRenderingPrePasses => "BeforeRenderingPrePasses",
            Self::AfterRenderingPrePasses => "AfterRenderingPrePasses",
            Self::BeforeRenderingOpaques => "BeforeRenderingOpaques",
            Self::AfterRenderingOpaques => "AfterRenderingOpaques",
            Self::BeforeRenderingSkybox => "BeforeRenderingSkybox",
            Self::AfterRenderingSkybox => "AfterRenderingSkybox",
            Self::BeforeRenderingTransparents => "BeforeRenderingTransparents",
            Self::AfterRenderingTransparents => "AfterRenderingTransparents",
            Self::BeforeRenderingPostProcessing => "BeforeRenderingPostProcessing",
            Self::AfterRenderingPostProcessing => "AfterRenderingPostProcessing",
            Self::AfterRendering => "AfterRendering",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_ordering() {
        assert!(RenderPassEvent::BeforeRendering < RenderPassEvent::AfterRenderingShadows);
        assert!(RenderPassEvent::AfterRenderingPrePasses < RenderPassEvent::AfterRenderingOpaques);
        assert!(RenderPassEvent::AfterRenderingOpaques < RenderPassEvent::BeforeRenderingSkybox);
        assert!(
            RenderPassEvent::AfterRenderingTransparents
                < RenderPassEvent::BeforeRenderingPostProcessing
        );
        assert!(RenderPassEvent::AfterRenderingPostProcessing < RenderPassEvent::AfterRendering);
    }

    #[test]
    fn test_order_matches_derive() {
        let a = RenderPassEvent::AfterRenderingSkybox;
        let b = RenderPassEvent::BeforeRenderingTransparents;
        assert_eq!(a < b, a.order() < b.order());
    }
}
