//! Theme Styling
//!
//! - [`theme`]: what the host sends (background, text regions, transition)
//! - [`rules`]: the property maps the surface receives, and shadow stacking
//! - [`compiler`]: the pure theme → rules step

pub mod compiler;
pub mod rules;
pub mod theme;

pub use compiler::{
    Canvas, CompiledBackground, CompiledTheme, CompiledTransition, StyleCompiler,
    LINE_HEIGHT_RATIO, PT_TO_PX,
};
pub use rules::{compile_outline, compile_shadow, shadow_css, ShadowLayer, StyleRules};
pub use theme::{
    Area, BackgroundSpec, CodedEnum, GradientDirection, HorizontalAlign, OutlineSpec, ShadowSpec,
    TextAreaStyle, Theme, TransitionDirection, TransitionKind, TransitionSpec, TransitionSpeed,
    VerticalAlign,
};
