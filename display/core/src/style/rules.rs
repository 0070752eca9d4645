//! Style Rules and Shadow Stacking
//!
//! Text outline and drop shadow are not drawn with a native stroke primitive.
//! They are expanded into a grid of one-pixel text shadows so every renderer
//! produces the same hard edge.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Upper bound on outline width and shadow spread, in pixels.
///
/// Larger theme values are clamped. The layer count is `(2 × extent + 1)²`, so
/// this also bounds the size of the generated `text-shadow` value.
pub const MAX_SHADOW_EXTENT: u32 = 64;

/// Upper bound on the drop-shadow offset magnitude, in pixels; larger offsets
/// in either direction are clamped
pub const MAX_SHADOW_OFFSET: i32 = 4096;

/// Property → value map handed to the render surface
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StyleRules(BTreeMap<String, String>);

impl StyleRules {
    /// Empty rule set
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a property, replacing any previous value
    pub fn set(&mut self, property: &str, value: impl Into<String>) -> &mut Self {
        self.0.insert(property.to_string(), value.into());
        self
    }

    /// Read a property
    #[must_use]
    pub fn get(&self, property: &str) -> Option<&str> {
        self.0.get(property).map(String::as_str)
    }

    /// Number of properties
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no property is set
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Render as a declaration block body: `a: 1; b: 2`
    #[must_use]
    pub fn to_css(&self) -> String {
        self.0
            .iter()
            .map(|(property, value)| format!("{property}: {value}"))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// One stacked text-shadow
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShadowLayer {
    /// Horizontal offset in pixels
    pub x: i32,
    /// Vertical offset in pixels
    pub y: i32,
    /// Shadow color
    pub color: String,
}

impl std::fmt::Display for ShadowLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}px {}px", self.color, self.x, self.y)
    }
}

fn square(from: i32, to: i32, color: &str) -> Vec<ShadowLayer> {
    let mut layers = Vec::new();
    for x in from..=to {
        for y in from..=to {
            layers.push(ShadowLayer {
                x,
                y,
                color: color.to_string(),
            });
        }
    }
    layers
}

fn extent(size: u32) -> i32 {
    // Bounded by MAX_SHADOW_EXTENT, so the conversion cannot fail
    i32::try_from(size.min(MAX_SHADOW_EXTENT)).unwrap_or(0)
}

/// Outline of width `size`: every offset in `[-size, size]²`
#[must_use]
pub fn compile_outline(size: u32, color: &str) -> Vec<ShadowLayer> {
    let w = extent(size);
    square(-w, w, color)
}

/// Drop shadow of spread `size` shifted by `offset`: every offset in `[offset-size, offset+size]²`
///
/// `offset` is clamped to `±MAX_SHADOW_OFFSET`.
#[must_use]
pub fn compile_shadow(size: u32, offset: i32, color: &str) -> Vec<ShadowLayer> {
    let s = extent(size);
    let offset = offset.clamp(-MAX_SHADOW_OFFSET, MAX_SHADOW_OFFSET);
    square(offset.saturating_sub(s), offset.saturating_add(s), color)
}

/// Join layers into a `text-shadow` value
#[must_use]
pub fn shadow_css(layers: &[ShadowLayer]) -> String {
    layers
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
