//! Style Compiler
//!
//! Turns a [`Theme`] into concrete rules. Compilation is pure: it reads the
//! theme and the canvas geometry and returns values. Applying them to the
//! surface is the transition controller's job.

use serde::{Deserialize, Serialize};

use super::rules::{compile_outline, compile_shadow, shadow_css, StyleRules};
use super::theme::{
    Area, BackgroundSpec, GradientDirection, HorizontalAlign, TextAreaStyle, Theme,
    TransitionDirection, TransitionKind, TransitionSpec, TransitionSpeed, VerticalAlign,
};
use crate::alerts::AlertSettings;

/// Points to CSS pixels
pub const PT_TO_PX: f32 = 4.0 / 3.0;

/// Line box height relative to font size
pub const LINE_HEIGHT_RATIO: f32 = 1.2;

/// Share of the canvas height given to the main region when no area is set
const MAIN_AREA_SHARE: f32 = 0.9;

/// Output size of the render surface in pixels
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Canvas {
    /// Width
    pub width: u32,
    /// Height
    pub height: u32,
}

impl Default for Canvas {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
        }
    }
}

/// Compiled transition settings
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompiledTransition {
    /// Effect
    #[serde(rename = "type")]
    pub kind: TransitionKind,
    /// Speed class name understood by the surface
    pub speed_class: String,
    /// Axis
    pub direction: TransitionDirection,
    /// Play backwards
    pub reversed: bool,
}

/// Compiled background
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum CompiledBackground {
    /// Draw nothing
    Transparent,
    /// Plain CSS background rules (solid, gradients, image)
    Css {
        /// Background properties
        rules: StyleRules,
    },
    /// Same-origin looping media element, always muted
    LoopingVideo {
        /// Normalized video location
        src: String,
        /// Fill color behind the video
        fill_color: String,
    },
}

/// Everything a generation needs to look right
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompiledTheme {
    /// Slide transition
    pub transition: CompiledTransition,
    /// Background
    pub background: CompiledBackground,
    /// Main region rules
    pub main_style: StyleRules,
    /// Footer region rules
    pub footer_style: StyleRules,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Region {
    Main,
    Footer,
}

impl Region {
    fn default_horizontal(self) -> HorizontalAlign {
        match self {
            Self::Main | Self::Footer => HorizontalAlign::Center,
        }
    }

    fn default_vertical(self) -> VerticalAlign {
        match self {
            Self::Main => VerticalAlign::Middle,
            Self::Footer => VerticalAlign::Top,
        }
    }
}

fn text_align(align: HorizontalAlign) -> &'static str {
    match align {
        HorizontalAlign::Left => "left",
        HorizontalAlign::Right => "right",
        HorizontalAlign::Center => "center",
        HorizontalAlign::Justify => "justify",
    }
}

fn justify_content(align: VerticalAlign) -> &'static str {
    match align {
        VerticalAlign::Top => "flex-start",
        VerticalAlign::Middle => "center",
        VerticalAlign::Bottom => "flex-end",
    }
}

fn speed_class(speed: TransitionSpeed) -> &'static str {
    match speed {
        TransitionSpeed::Normal => "default",
        TransitionSpeed::Fast => "fast",
        TransitionSpeed::Slow => "slow",
    }
}

fn gradient_css(direction: GradientDirection, start: &str, end: &str) -> String {
    match direction {
        GradientDirection::Horizontal => format!("linear-gradient(to bottom, {start}, {end})"),
        GradientDirection::Vertical => format!("linear-gradient(to right, {start}, {end})"),
        GradientDirection::LeftTop => format!("linear-gradient(to bottom right, {start}, {end})"),
        GradientDirection::LeftBottom => format!("linear-gradient(to top right, {start}, {end})"),
        GradientDirection::Circular => format!("radial-gradient(circle, {start}, {end})"),
    }
}

/// Theme → rules, for one canvas
#[derive(Clone, Debug)]
pub struct StyleCompiler {
    canvas: Canvas,
    resource_scheme: String,
}

impl StyleCompiler {
    /// Create a compiler for `canvas`, rewriting `file://` media onto `resource_scheme`
    pub fn new(canvas: Canvas, resource_scheme: impl Into<String>) -> Self {
        Self {
            canvas,
            resource_scheme: resource_scheme.into(),
        }
    }

    /// Canvas this compiler lays out against
    #[must_use]
    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    /// Compile a whole theme
    #[must_use]
    pub fn compile(&self, theme: &Theme) -> CompiledTheme {
        CompiledTheme {
            transition: Self::compile_transition(&theme.transition),
            background: self.compile_background(&theme.background),
            main_style: self.compile_main(&theme.main),
            footer_style: self.compile_footer(&theme.footer),
        }
    }

    /// Compile transition settings; a disabled transition compiles to `none`
    #[must_use]
    pub fn compile_transition(spec: &TransitionSpec) -> CompiledTransition {
        let kind = if spec.enabled {
            spec.kind.unwrap_or(TransitionKind::Fade)
        } else {
            TransitionKind::None
        };
        CompiledTransition {
            kind,
            speed_class: speed_class(spec.speed.unwrap_or_default()).to_string(),
            direction: spec.direction.unwrap_or_default(),
            reversed: spec.reverse,
        }
    }

    /// Compile a background description
    #[must_use]
    pub fn compile_background(&self, spec: &BackgroundSpec) -> CompiledBackground {
        match spec {
            BackgroundSpec::Transparent => CompiledBackground::Transparent,
            BackgroundSpec::Solid { color } => {
                let mut rules = StyleRules::new();
                rules.set("background-color", color.as_str());
                CompiledBackground::Css { rules }
            }
            BackgroundSpec::Gradient {
                start,
                end,
                direction,
            } => {
                let mut rules = StyleRules::new();
                rules.set(
                    "background-image",
                    gradient_css(direction.unwrap_or_default(), start, end),
                );
                CompiledBackground::Css { rules }
            }
            BackgroundSpec::Image { path, border_color } => {
                let src = path.normalized(&self.resource_scheme);
                let mut rules = StyleRules::new();
                rules
                    .set("background-color", border_color.as_str())
                    .set("background-image", format!("url('{src}')"))
                    .set("background-position", "center")
                    .set("background-repeat", "no-repeat")
                    .set("background-size", "contain");
                CompiledBackground::Css { rules }
            }
            BackgroundSpec::Video { path, border_color } => CompiledBackground::LoopingVideo {
                src: path.normalized(&self.resource_scheme).as_str().to_string(),
                fill_color: border_color.clone(),
            },
        }
    }

    /// Rules for the main region
    #[must_use]
    pub fn compile_main(&self, style: &TextAreaStyle) -> StyleRules {
        self.compile_text(style, Region::Main)
    }

    /// Rules for the footer region
    #[must_use]
    pub fn compile_footer(&self, style: &TextAreaStyle) -> StyleRules {
        self.compile_text(style, Region::Footer)
    }

    /// Rules for the alert banner
    #[must_use]
    pub fn compile_alert(&self, settings: &AlertSettings) -> StyleRules {
        let mut rules = StyleRules::new();
        rules
            .set("font-family", settings.font_face.as_str())
            .set("font-size", format!("{}pt", settings.font_size))
            .set("color", settings.font_color.as_str())
            .set("background-color", settings.background_color.as_str());
        rules
    }

    /// Main region rectangle; explicit area wins over the canvas-derived one
    #[must_use]
    pub fn main_area(&self, style: &TextAreaStyle) -> Area {
        style.area.unwrap_or_else(|| {
            let (width, height) = self.canvas_size();
            Area {
                x: 0.0,
                y: 0.0,
                width,
                height: height * MAIN_AREA_SHARE,
            }
        })
    }

    /// Footer region rectangle; explicit area wins over the canvas-derived one
    #[must_use]
    pub fn footer_area(&self, style: &TextAreaStyle) -> Area {
        style.area.unwrap_or_else(|| {
            let (width, height) = self.canvas_size();
            Area {
                x: 0.0,
                y: height * MAIN_AREA_SHARE,
                width,
                height: height * (1.0 - MAIN_AREA_SHARE),
            }
        })
    }

    /// Whole lines of `font_size` pt text that fit in the main region
    #[must_use]
    pub fn line_count(&self, theme: &Theme, font_size: f32) -> u32 {
        let area = self.main_area(&theme.main);
        let line_height = font_size * PT_TO_PX * LINE_HEIGHT_RATIO + theme.main.line_adjustment;
        if !line_height.is_finite() || line_height <= 0.0 || area.height <= 0.0 {
            return 0;
        }
        let lines = (area.height / line_height).floor();
        if lines >= u32::MAX as f32 {
            u32::MAX
        } else {
            lines as u32
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn canvas_size(&self) -> (f32, f32) {
        (self.canvas.width as f32, self.canvas.height as f32)
    }

    fn compile_text(&self, style: &TextAreaStyle, region: Region) -> StyleRules {
        let area = match region {
            Region::Main => self.main_area(style),
            Region::Footer => self.footer_area(style),
        };
        let horizontal = style
            .horizontal_align
            .unwrap_or_else(|| region.default_horizontal());
        let vertical = style
            .vertical_align
            .unwrap_or_else(|| region.default_vertical());

        let mut rules = StyleRules::new();
        rules
            .set("position", "absolute")
            .set("left", format!("{}px", area.x))
            .set("top", format!("{}px", area.y))
            .set("width", format!("{}px", area.width))
            .set("height", format!("{}px", area.height))
            .set("display", "flex")
            .set("flex-direction", "column")
            .set("font-family", style.font_family.as_str())
            .set("font-size", format!("{}pt", style.font_size))
            .set("color", style.color.as_str())
            .set("font-weight", if style.bold { "bold" } else { "normal" })
            .set("font-style", if style.italic { "italic" } else { "normal" })
            .set(
                "line-height",
                format!("calc({LINE_HEIGHT_RATIO}em + {}px)", style.line_adjustment),
            )
            .set("text-align", text_align(horizontal))
            .set("justify-content", justify_content(vertical));

        let mut layers = Vec::new();
        if let Some(outline) = &style.outline {
            layers.extend(compile_outline(outline.size, &outline.color));
        }
        if let Some(shadow) = &style.shadow {
            layers.extend(compile_shadow(shadow.size, shadow.offset, &shadow.color));
        }
        if !layers.is_empty() {
            rules.set("text-shadow", shadow_css(&layers));
        }
        rules
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::ResourceRef;
    use crate::style::theme::{OutlineSpec, ShadowSpec};
    use pretty_assertions::assert_eq;

    fn compiler() -> StyleCompiler {
        StyleCompiler::new(Canvas::default(), "display-res")
    }

    #[test]
    fn test_default_alignment_per_region() {
        let compiled = compiler().compile(&Theme::default());

        assert_eq!(compiled.main_style.get("text-align"), Some("center"));
        assert_eq!(compiled.main_style.get("justify-content"), Some("center"));
        assert_eq!(compiled.footer_style.get("text-align"), Some("center"));
        assert_eq!(compiled.footer_style.get("justify-content"), Some("flex-start"));
    }

    #[test]
    fn test_explicit_alignment() {
        let mut theme = Theme::default();
        theme.main.horizontal_align = Some(HorizontalAlign::Justify);
        theme.main.vertical_align = Some(VerticalAlign::Bottom);
        theme.footer.horizontal_align = Some(HorizontalAlign::Left);

        let compiled = compiler().compile(&theme);
        assert_eq!(compiled.main_style.get("text-align"), Some("justify"));
        assert_eq!(compiled.main_style.get("justify-content"), Some("flex-end"));
        assert_eq!(compiled.footer_style.get("text-align"), Some("left"));
    }

    #[test]
    fn test_outline_and_shadow_concatenate() {
        let mut theme = Theme::default();
        theme.main.outline = Some(OutlineSpec {
            size: 0,
            color: "#000".to_string(),
        });
        theme.main.shadow = Some(ShadowSpec {
            size: 0,
            offset: 5,
            color: "#333".to_string(),
        });

        let compiled = compiler().compile(&theme);
        assert_eq!(
            compiled.main_style.get("text-shadow"),
            Some("#000 0px 0px, #333 5px 5px")
        );
        assert_eq!(compiled.footer_style.get("text-shadow"), None);
    }

    #[test]
    fn test_host_shadow_offset_is_clamped() {
        let mut theme = Theme::default();
        theme.main.shadow = Some(ShadowSpec {
            size: 0,
            offset: i32::MAX,
            color: "#333".to_string(),
        });
        theme.footer.shadow = Some(ShadowSpec {
            size: 0,
            offset: i32::MIN,
            color: "#333".to_string(),
        });

        let compiled = compiler().compile(&theme);
        assert_eq!(
            compiled.main_style.get("text-shadow"),
            Some("#333 4096px 4096px")
        );
        assert_eq!(
            compiled.footer_style.get("text-shadow"),
            Some("#333 -4096px -4096px")
        );
    }

    #[test]
    fn test_backgrounds() {
        let c = compiler();

        assert_eq!(
            c.compile_background(&BackgroundSpec::Transparent),
            CompiledBackground::Transparent
        );

        let gradient = c.compile_background(&BackgroundSpec::Gradient {
            start: "red".to_string(),
            end: "blue".to_string(),
            direction: Some(GradientDirection::Circular),
        });
        let CompiledBackground::Css { rules } = gradient else {
            panic!("expected css background");
        };
        assert_eq!(
            rules.get("background-image"),
            Some("radial-gradient(circle, red, blue)")
        );

        let image = c.compile_background(&BackgroundSpec::Image {
            path: ResourceRef::new("file:///bg.png"),
            border_color: "#123".to_string(),
        });
        let CompiledBackground::Css { rules } = image else {
            panic!("expected css background");
        };
        assert_eq!(
            rules.get("background-image"),
            Some("url('display-res:///bg.png')")
        );
        assert_eq!(rules.get("background-color"), Some("#123"));

        let video = c.compile_background(&BackgroundSpec::Video {
            path: ResourceRef::new("file:///loop.mp4"),
            border_color: "#000".to_string(),
        });
        assert_eq!(
            video,
            CompiledBackground::LoopingVideo {
                src: "display-res:///loop.mp4".to_string(),
                fill_color: "#000".to_string(),
            }
        );
    }

    #[test]
    fn test_linear_gradient_directions() {
        let c = compiler();
        let expected = [
            (GradientDirection::Horizontal, "linear-gradient(to bottom, a, b)"),
            (GradientDirection::Vertical, "linear-gradient(to right, a, b)"),
            (GradientDirection::LeftTop, "linear-gradient(to bottom right, a, b)"),
            (GradientDirection::LeftBottom, "linear-gradient(to top right, a, b)"),
        ];
        for (direction, css) in expected {
            let compiled = c.compile_background(&BackgroundSpec::Gradient {
                start: "a".to_string(),
                end: "b".to_string(),
                direction: Some(direction),
            });
            let CompiledBackground::Css { rules } = compiled else {
                panic!("expected css background");
            };
            assert_eq!(rules.get("background-image"), Some(css), "{direction:?}");
        }
    }

    #[test]
    fn test_transition_compile() {
        let disabled = StyleCompiler::compile_transition(&TransitionSpec {
            kind: Some(TransitionKind::Zoom),
            ..TransitionSpec::default()
        });
        assert_eq!(disabled.kind, TransitionKind::None);
        assert_eq!(disabled.speed_class, "default");

        let enabled = StyleCompiler::compile_transition(&TransitionSpec {
            enabled: true,
            kind: None,
            speed: Some(TransitionSpeed::Fast),
            direction: Some(TransitionDirection::Vertical),
            reverse: true,
        });
        assert_eq!(
            enabled,
            CompiledTransition {
                kind: TransitionKind::Fade,
                speed_class: "fast".to_string(),
                direction: TransitionDirection::Vertical,
                reversed: true,
            }
        );
    }

    #[test]
    fn test_default_areas_split_canvas() {
        let c = StyleCompiler::new(
            Canvas {
                width: 1000,
                height: 1000,
            },
            "x",
        );
        let theme = Theme::default();
        let main = c.main_area(&theme.main);
        let footer = c.footer_area(&theme.footer);
        assert!((main.height - 900.0).abs() < 0.01);
        assert!((footer.y - 900.0).abs() < 0.01);
        assert!((footer.height - 100.0).abs() < 0.01);
    }

    #[test]
    fn test_line_count() {
        let c = StyleCompiler::new(
            Canvas {
                width: 1000,
                height: 1000,
            },
            "x",
        );
        let mut theme = Theme::default();
        // 30pt -> 40px -> 48px line box; 900 / 48 = 18.75
        assert_eq!(c.line_count(&theme, 30.0), 18);

        theme.main.line_adjustment = 10.0;
        // 58px line box; 900 / 58 = 15.5
        assert_eq!(c.line_count(&theme, 30.0), 15);

        theme.main.line_adjustment = 12.0;
        assert_eq!(c.line_count(&theme, 0.0), 75);
        theme.main.line_adjustment = 0.0;
        assert_eq!(c.line_count(&theme, 0.0), 0);
        assert_eq!(c.line_count(&theme, -4.0), 0);
    }
}
