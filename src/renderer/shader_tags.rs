//! Shader Pass Tags
//!
//! A renderer only participates in a draw when one of its shader passes
//! carries a tag listed in the drawing settings. Pass settings store the
//! requested tags as a compact [`LightModeTags`] bitset; the ordered tag
//! list is derived on demand through a static lookup table.
//!
//! # Ordering Contract
//!
//! The derived list always follows [`LIGHT_MODE_TAG_TABLE`] order. The draw
//! API uses first-match semantics per renderer, so the order is part of the
//! observable behavior and must not depend on flag declaration order.

use std::borrow::Cow;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Identifier of a shader pass tag (the `LightMode` value of a shader pass).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShaderTagId(Cow<'static, str>);

impl ShaderTagId {
    #[must_use]
    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(Cow::Owned(name.into()))
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl From<&'static str> for ShaderTagId {
    fn from(name: &'static str) -> Self {
        Self::from_static(name)
    }
}

bitflags! {
    /// Requested shader pass tags.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct LightModeTags: u32 {
        const SRP_DEFAULT_UNLIT = 1 << 0;
        const UNIVERSAL_FORWARD = 1 << 1;
        const UNIVERSAL_FORWARD_ONLY = 1 << 2;
        const LIGHTWEIGHT_FORWARD = 1 << 3;
        const DEPTH_NORMALS = 1 << 4;
        const DEPTH_ONLY = 1 << 5;

        /// The forward tags every stock shader answers to.
        const STANDARD = Self::SRP_DEFAULT_UNLIT.bits()
            | Self::UNIVERSAL_FORWARD.bits()
            | Self::UNIVERSAL_FORWARD_ONLY.bits()
            | Self::LIGHTWEIGHT_FORWARD.bits();
    }
}

impl Default for LightModeTags {
    fn default() -> Self {
        Self::STANDARD
    }
}

/// Flag → tag string lookup, iterated in this exact order.
pub const LIGHT_MODE_TAG_TABLE: [(LightModeTags, &str); 6] = [
    (LightModeTags::SRP_DEFAULT_UNLIT, "SRPDefaultUnlit"),
    (LightModeTags::UNIVERSAL_FORWARD, "UniversalForward"),
    (LightModeTags::UNIVERSAL_FORWARD_ONLY, "UniversalForwardOnly"),
    (LightModeTags::LIGHTWEIGHT_FORWARD, "LightweightForward"),
    (LightModeTags::DEPTH_NORMALS, "DepthNormals"),
    (LightModeTags::DEPTH_ONLY, "DepthOnly"),
];

/// Ordered tag list. Six entries at most, so it never spills to the heap.
pub type ShaderTagList = SmallVec<[ShaderTagId; 6]>;

impl LightModeTags {
    /// Derives the ordered tag list for this bitset.
    #[must_use]
    pub fn shader_tags(self) -> ShaderTagList {
        LIGHT_MODE_TAG_TABLE
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| ShaderTagId::from_static(name))
            .collect()
    }
}

/// Tag list used by passes that draw with an override material.
#[must_use]
pub fn default_shader_tags() -> ShaderTagList {
    LightModeTags::STANDARD.shader_tags()
}
