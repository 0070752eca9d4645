//! Theme Description
//!
//! What the host sends with `setTheme`. Every field has a default so a partial
//! theme is always usable. Enumerated settings accept either the host's integer
//! code or the lowercase name; anything else is read as "not set" and resolved
//! to the region default at compile time.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::resource::ResourceRef;

/// Complete theme: background, two text regions, slide transition
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Theme {
    /// What sits behind the slides
    pub background: BackgroundSpec,
    /// Main (lyrics/verse) text region
    pub main: TextAreaStyle,
    /// Footer/caption region
    pub footer: TextAreaStyle,
    /// Transition used between slides and generations
    pub transition: TransitionSpec,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            background: BackgroundSpec::default(),
            main: TextAreaStyle::main_default(),
            footer: TextAreaStyle::footer_default(),
            transition: TransitionSpec::default(),
        }
    }
}

/// Background description
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum BackgroundSpec {
    /// Nothing drawn; the host window shows through
    Transparent,
    /// Flat color
    Solid {
        /// CSS color
        color: String,
    },
    /// Two-stop gradient
    Gradient {
        /// First stop
        start: String,
        /// Second stop
        end: String,
        /// Gradient geometry
        #[serde(default, deserialize_with = "lenient")]
        direction: Option<GradientDirection>,
    },
    /// Static image
    Image {
        /// Image location
        path: ResourceRef,
        /// Fill color around a letterboxed image
        #[serde(default = "default_border_color", rename = "borderColor")]
        border_color: String,
    },
    /// Looping, muted video
    Video {
        /// Video location
        path: ResourceRef,
        /// Fill color around a letterboxed video
        #[serde(default = "default_border_color", rename = "borderColor")]
        border_color: String,
    },
}

impl Default for BackgroundSpec {
    fn default() -> Self {
        Self::Solid {
            color: default_border_color(),
        }
    }
}

fn default_border_color() -> String {
    "#000000".to_string()
}

/// Styling for one text region
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TextAreaStyle {
    /// Font family name
    pub font_family: String,
    /// Font size in points
    pub font_size: f32,
    /// Text color
    pub color: String,
    /// Bold weight
    pub bold: bool,
    /// Italic style
    pub italic: bool,
    /// Extra pixels added to each line's height
    pub line_adjustment: f32,
    /// Horizontal alignment; `None` takes the region default
    #[serde(deserialize_with = "lenient")]
    pub horizontal_align: Option<HorizontalAlign>,
    /// Vertical alignment; `None` takes the region default
    #[serde(deserialize_with = "lenient")]
    pub vertical_align: Option<VerticalAlign>,
    /// Hard outline drawn as stacked shadows
    pub outline: Option<OutlineSpec>,
    /// Drop shadow drawn as stacked shadows
    pub shadow: Option<ShadowSpec>,
    /// Explicit region rectangle; `None` derives it from the canvas
    pub area: Option<Area>,
}

impl TextAreaStyle {
    /// Defaults for the main region
    #[must_use]
    pub fn main_default() -> Self {
        Self {
            font_family: "Sans".to_string(),
            font_size: 40.0,
            color: "#FFFFFF".to_string(),
            bold: false,
            italic: false,
            line_adjustment: 0.0,
            horizontal_align: None,
            vertical_align: None,
            outline: None,
            shadow: None,
            area: None,
        }
    }

    /// Defaults for the footer region
    #[must_use]
    pub fn footer_default() -> Self {
        Self {
            font_size: 12.0,
            ..Self::main_default()
        }
    }
}

impl Default for TextAreaStyle {
    fn default() -> Self {
        Self::main_default()
    }
}

/// Outline settings
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutlineSpec {
    /// Outline width in pixels
    pub size: u32,
    /// Outline color
    pub color: String,
}

/// Drop-shadow settings
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShadowSpec {
    /// Shadow spread in pixels
    pub size: u32,
    /// Offset applied to both axes, in pixels
    #[serde(default)]
    pub offset: i32,
    /// Shadow color
    pub color: String,
}

/// Region rectangle in canvas pixels
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Area {
    /// Left edge
    pub x: f32,
    /// Top edge
    pub y: f32,
    /// Width
    pub width: f32,
    /// Height
    pub height: f32,
}

/// Slide transition settings
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TransitionSpec {
    /// Whether slides animate at all
    pub enabled: bool,
    /// Effect; `None` means fade
    #[serde(rename = "type", deserialize_with = "lenient")]
    pub kind: Option<TransitionKind>,
    /// Speed; `None` means normal
    #[serde(deserialize_with = "lenient")]
    pub speed: Option<TransitionSpeed>,
    /// Axis; `None` means horizontal
    #[serde(deserialize_with = "lenient")]
    pub direction: Option<TransitionDirection>,
    /// Play the effect backwards
    pub reverse: bool,
}

/// Enumerations the host may send as integer code or name
pub trait CodedEnum: Sized {
    /// Map the host's integer code
    fn from_code(code: i64) -> Option<Self>;
    /// Map the lowercase name
    fn from_name(name: &str) -> Option<Self>;

    /// Map an arbitrary JSON value; unknown shapes map to `None`
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_i64().and_then(Self::from_code),
            Value::String(s) => {
                let s = s.trim();
                match s.parse::<i64>() {
                    Ok(code) => Self::from_code(code),
                    Err(_) => Self::from_name(&s.to_ascii_lowercase()),
                }
            }
            _ => None,
        }
    }
}

pub(crate) fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: CodedEnum,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(T::from_value))
}

/// Horizontal text alignment
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HorizontalAlign {
    /// Flush left
    Left,
    /// Flush right
    Right,
    /// Centered
    Center,
    /// Justified
    Justify,
}

impl CodedEnum for HorizontalAlign {
    fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::Left),
            1 => Some(Self::Right),
            2 => Some(Self::Center),
            3 => Some(Self::Justify),
            _ => None,
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            "center" | "centre" => Some(Self::Center),
            "justify" => Some(Self::Justify),
            _ => None,
        }
    }
}

/// Vertical text alignment
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerticalAlign {
    /// Top of region
    Top,
    /// Middle of region
    Middle,
    /// Bottom of region
    Bottom,
}

impl CodedEnum for VerticalAlign {
    fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::Top),
            1 => Some(Self::Middle),
            2 => Some(Self::Bottom),
            _ => None,
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "top" => Some(Self::Top),
            "middle" | "center" => Some(Self::Middle),
            "bottom" => Some(Self::Bottom),
            _ => None,
        }
    }
}

/// Gradient geometry
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GradientDirection {
    /// Horizontal bands, top to bottom
    #[default]
    Horizontal,
    /// Vertical bands, left to right
    Vertical,
    /// Radial from the center
    Circular,
    /// Diagonal from the top-left corner
    LeftTop,
    /// Diagonal from the bottom-left corner
    LeftBottom,
}

impl CodedEnum for GradientDirection {
    fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::Horizontal),
            1 => Some(Self::Vertical),
            2 => Some(Self::Circular),
            3 => Some(Self::LeftTop),
            4 => Some(Self::LeftBottom),
            _ => None,
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "horizontal" => Some(Self::Horizontal),
            "vertical" => Some(Self::Vertical),
            "circular" | "radial" => Some(Self::Circular),
            "lefttop" | "left_top" => Some(Self::LeftTop),
            "leftbottom" | "left_bottom" => Some(Self::LeftBottom),
            _ => None,
        }
    }
}

/// Slide transition effect
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitionKind {
    /// No animation
    None,
    /// Cross-fade
    Fade,
    /// Slide in/out
    Slide,
    /// Convex 3D turn
    Convex,
    /// Concave 3D turn
    Concave,
    /// Zoom
    Zoom,
}

impl CodedEnum for TransitionKind {
    fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::Fade),
            1 => Some(Self::Slide),
            2 => Some(Self::Convex),
            3 => Some(Self::Concave),
            4 => Some(Self::Zoom),
            _ => None,
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "none" => Some(Self::None),
            "fade" => Some(Self::Fade),
            "slide" => Some(Self::Slide),
            "convex" => Some(Self::Convex),
            "concave" => Some(Self::Concave),
            "zoom" => Some(Self::Zoom),
            _ => None,
        }
    }
}

/// Transition speed
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitionSpeed {
    /// Regular speed
    #[default]
    Normal,
    /// Quicker
    Fast,
    /// Slower
    Slow,
}

impl CodedEnum for TransitionSpeed {
    fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::Normal),
            1 => Some(Self::Fast),
            2 => Some(Self::Slow),
            _ => None,
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "normal" | "default" => Some(Self::Normal),
            "fast" => Some(Self::Fast),
            "slow" => Some(Self::Slow),
            _ => None,
        }
    }
}

/// Transition axis
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitionDirection {
    /// Left/right
    #[default]
    Horizontal,
    /// Up/down
    Vertical,
}

impl CodedEnum for TransitionDirection {
    fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::Horizontal),
            1 => Some(Self::Vertical),
            _ => None,
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "horizontal" => Some(Self::Horizontal),
            "vertical" => Some(Self::Vertical),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_theme_uses_defaults() {
        let theme: Theme = serde_json::from_value(json!({})).unwrap();
        assert_eq!(theme, Theme::default());
        assert!((theme.footer.font_size - 12.0).abs() < f32::EPSILON);
        assert!(!theme.transition.enabled);
    }

    #[test]
    fn test_alignment_accepts_codes_and_names() {
        let style: TextAreaStyle = serde_json::from_value(json!({
            "horizontalAlign": 3,
            "verticalAlign": "Bottom",
        }))
        .unwrap();
        assert_eq!(style.horizontal_align, Some(HorizontalAlign::Justify));
        assert_eq!(style.vertical_align, Some(VerticalAlign::Bottom));

        let style: TextAreaStyle = serde_json::from_value(json!({
            "horizontalAlign": "1",
        }))
        .unwrap();
        assert_eq!(style.horizontal_align, Some(HorizontalAlign::Right));
    }

    #[test]
    fn test_unknown_alignment_reads_as_unset() {
        let style: TextAreaStyle = serde_json::from_value(json!({
            "horizontalAlign": 17,
            "verticalAlign": "sideways",
        }))
        .unwrap();
        assert_eq!(style.horizontal_align, None);
        assert_eq!(style.vertical_align, None);

        let style: TextAreaStyle =
            serde_json::from_value(json!({ "verticalAlign": null })).unwrap();
        assert_eq!(style.vertical_align, None);
    }

    #[test]
    fn test_background_variants_parse() {
        let bg: BackgroundSpec = serde_json::from_value(json!({
            "type": "gradient",
            "start": "#000",
            "end": "#fff",
            "direction": 4,
        }))
        .unwrap();
        assert_eq!(
            bg,
            BackgroundSpec::Gradient {
                start: "#000".to_string(),
                end: "#fff".to_string(),
                direction: Some(GradientDirection::LeftBottom),
            }
        );

        let bg: BackgroundSpec = serde_json::from_value(json!({
            "type": "image",
            "path": "file:///bg.png",
        }))
        .unwrap();
        assert!(matches!(bg, BackgroundSpec::Image { ref border_color, .. } if border_color == "#000000"));
    }

    #[test]
    fn test_transition_spec_parse() {
        let spec: TransitionSpec = serde_json::from_value(json!({
            "enabled": true,
            "type": 4,
            "speed": "slow",
            "direction": 1,
            "reverse": true,
        }))
        .unwrap();
        assert_eq!(spec.kind, Some(TransitionKind::Zoom));
        assert_eq!(spec.speed, Some(TransitionSpeed::Slow));
        assert_eq!(spec.direction, Some(TransitionDirection::Vertical));
        assert!(spec.reverse);
    }
}
