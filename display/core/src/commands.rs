//! Host Commands
//!
//! Everything the host can ask of the engine, as serde records. On the wire a
//! command is `{"command": "<name>", "args": <value>}`; commands without
//! arguments may omit `args`.
//!
//! Hosts talk through [`RawCommand`] so an unknown name can be ignored
//! instead of failing to parse. A known name with the wrong argument shape is
//! a routing failure.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::alerts::{AlertLocation, AlertSettings};
use crate::error::EngineError;
use crate::resource::ResourceRef;
use crate::scheduler::Completion;
use crate::screen::ScreenVisibility;
use crate::slides::{ImageSlideInput, SlideTarget, TextSlideInput};
use crate::style::Theme;

/// Options sent with `loadContent`
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InitOptions {
    /// This engine drives the live output (not a preview)
    pub is_display: bool,
    /// Animate content handovers
    pub do_item_transitions: bool,
    /// Hide the pointer over the surface
    pub hide_mouse: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SlideBatchWire {
    slides: Value,
    #[serde(default)]
    is_text: bool,
}

/// `replaceSlides` payload: text or image slides
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(try_from = "SlideBatchWire")]
pub enum SlideBatch {
    /// Text slides
    Text(Vec<TextSlideInput>),
    /// Image slides
    Images(Vec<ImageSlideInput>),
}

impl TryFrom<SlideBatchWire> for SlideBatch {
    type Error = serde_json::Error;

    fn try_from(wire: SlideBatchWire) -> Result<Self, Self::Error> {
        if wire.is_text {
            serde_json::from_value(wire.slides).map(Self::Text)
        } else {
            serde_json::from_value(wire.slides).map(Self::Images)
        }
    }
}

/// Host → engine commands
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(
    tag = "command",
    content = "args",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum Command {
    /// Initialize; must precede every state-mutating command
    LoadContent(InitOptions),
    /// Enable or disable animated handovers
    SetContentTransition {
        /// Whether handovers animate
        enabled: bool,
    },
    /// Remove every slide and caption
    ClearSlides,
    /// Replace the content with a text or image batch
    ReplaceSlides(SlideBatch),
    /// Show one anonymous text slide, editing in place when possible
    LoadSingleTextSlide {
        /// Slide text
        text: String,
    },
    /// Replace the content with text slides
    LoadTextSlides {
        /// Slides in order
        slides: Vec<TextSlideInput>,
    },
    /// Replace the content with image slides
    LoadImageSlides {
        /// Slides in order
        slides: Vec<ImageSlideInput>,
    },
    /// Replace the content with a video
    LoadVideo {
        /// Video location
        path: ResourceRef,
    },
    /// Start/resume the video
    Play,
    /// Pause the video
    Pause,
    /// Stop and rewind the video
    Stop,
    /// Jump within the video
    Seek {
        /// Position in seconds
        seconds: f64,
    },
    /// Change the video's playback rate
    SetRate {
        /// Positive, finite multiplier
        rate: f64,
    },
    /// Change the video's volume
    SetVolume {
        /// Level, clamped to `[0, 1]`
        level: f64,
    },
    /// Flip the video's mute state
    ToggleMute,
    /// Show a slide by key or position
    GoToSlide {
        /// Key or ordinal
        target: SlideTarget,
    },
    /// Show or queue an alert banner
    Alert {
        /// Banner text
        text: String,
        /// Presentation settings
        #[serde(default)]
        settings: AlertSettings,
    },
    /// Move the alert banner
    SetAlertLocation {
        /// New location
        location: AlertLocation,
    },
    /// Blank to black
    ToBlack,
    /// Blank to the theme background
    ToTheme,
    /// Become transparent so the host can hide its window
    ToTransparent,
    /// Show content
    Show,
    /// Replace the theme
    SetTheme {
        /// New theme
        theme: Theme,
    },
    /// Replace the background with an image
    SetBackgroundImage {
        /// Image location
        path: ResourceRef,
    },
    /// Reapply the current theme to what is on screen
    ResetTheme,
    /// Skip the next handover animation
    FinishWithCurrentItem,
    /// How many lines of text fit in the main region
    CalculateLineCount {
        /// Font size in points
        font_size: f32,
    },
    /// Which video containers the surface can play
    GetSupportedVideoFormats,
    /// Scale the whole surface
    SetScale {
        /// Percentage, clamped to `[1, 1000]`
        percent: f32,
    },
}

/// Every command name the engine routes
pub const KNOWN_COMMANDS: &[&str] = &[
    "loadContent",
    "setContentTransition",
    "clearSlides",
    "replaceSlides",
    "loadSingleTextSlide",
    "loadTextSlides",
    "loadImageSlides",
    "loadVideo",
    "play",
    "pause",
    "stop",
    "seek",
    "setRate",
    "setVolume",
    "toggleMute",
    "goToSlide",
    "alert",
    "setAlertLocation",
    "toBlack",
    "toTheme",
    "toTransparent",
    "show",
    "setTheme",
    "setBackgroundImage",
    "resetTheme",
    "finishWithCurrentItem",
    "calculateLineCount",
    "getSupportedVideoFormats",
    "setScale",
];

/// Whether `name` is a routed command
#[must_use]
pub fn is_known(name: &str) -> bool {
    KNOWN_COMMANDS.contains(&name)
}

impl Command {
    /// Wire name
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::LoadContent(_) => "loadContent",
            Self::SetContentTransition { .. } => "setContentTransition",
            Self::ClearSlides => "clearSlides",
            Self::ReplaceSlides(_) => "replaceSlides",
            Self::LoadSingleTextSlide { .. } => "loadSingleTextSlide",
            Self::LoadTextSlides { .. } => "loadTextSlides",
            Self::LoadImageSlides { .. } => "loadImageSlides",
            Self::LoadVideo { .. } => "loadVideo",
            Self::Play => "play",
            Self::Pause => "pause",
            Self::Stop => "stop",
            Self::Seek { .. } => "seek",
            Self::SetRate { .. } => "setRate",
            Self::SetVolume { .. } => "setVolume",
            Self::ToggleMute => "toggleMute",
            Self::GoToSlide { .. } => "goToSlide",
            Self::Alert { .. } => "alert",
            Self::SetAlertLocation { .. } => "setAlertLocation",
            Self::ToBlack => "toBlack",
            Self::ToTheme => "toTheme",
            Self::ToTransparent => "toTransparent",
            Self::Show => "show",
            Self::SetTheme { .. } => "setTheme",
            Self::SetBackgroundImage { .. } => "setBackgroundImage",
            Self::ResetTheme => "resetTheme",
            Self::FinishWithCurrentItem => "finishWithCurrentItem",
            Self::CalculateLineCount { .. } => "calculateLineCount",
            Self::GetSupportedVideoFormats => "getSupportedVideoFormats",
            Self::SetScale { .. } => "setScale",
        }
    }

    /// Read-only queries, answered even before `loadContent`
    #[must_use]
    pub fn is_getter(&self) -> bool {
        matches!(
            self,
            Self::CalculateLineCount { .. } | Self::GetSupportedVideoFormats
        )
    }
}

/// Command as received from the host, before routing
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawCommand {
    /// Command name
    pub command: String,
    /// Arguments; `null` when absent
    #[serde(default)]
    pub args: Value,
}

impl RawCommand {
    /// Build a raw command
    pub fn new(command: impl Into<String>, args: Value) -> Self {
        Self {
            command: command.into(),
            args,
        }
    }

    /// Parse into a typed command
    ///
    /// Returns `Ok(None)` for an unknown name.
    ///
    /// # Errors
    ///
    /// [`EngineError::MalformedCommand`] when the name is known but the
    /// arguments do not fit it.
    pub fn parse(&self) -> Result<Option<Command>, EngineError> {
        if !is_known(&self.command) {
            return Ok(None);
        }

        let attempt = |args: &Value| {
            let mut record = serde_json::Map::new();
            record.insert("command".to_string(), Value::String(self.command.clone()));
            if !args.is_null() {
                record.insert("args".to_string(), args.clone());
            }
            serde_json::from_value::<Command>(Value::Object(record))
        };

        match attempt(&self.args) {
            Ok(command) => Ok(Some(command)),
            // Commands whose arguments are all optional may arrive bare
            Err(first) if self.args.is_null() => attempt(&Value::Object(serde_json::Map::new()))
                .map(Some)
                .map_err(|_| EngineError::MalformedCommand {
                    command: self.command.clone(),
                    source: first,
                }),
            Err(source) => Err(EngineError::MalformedCommand {
                command: self.command.clone(),
                source,
            }),
        }
    }
}

/// Dispatcher answer to one command
#[derive(Debug)]
pub enum Reply {
    /// Applied (or a silent no-op)
    Done,
    /// Unknown command name
    Ignored,
    /// Screen change started; resolves when it settles or is superseded
    Pending(Completion<ScreenVisibility>),
    /// `calculateLineCount` answer
    LineCount(u32),
    /// `getSupportedVideoFormats` answer
    VideoFormats(Vec<String>),
}

impl Reply {
    /// Whether the command was routed
    #[must_use]
    pub fn is_handled(&self) -> bool {
        !matches!(self, Self::Ignored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(command: &str, args: Value) -> Result<Option<Command>, EngineError> {
        RawCommand::new(command, args).parse()
    }

    #[test]
    fn test_known_list_matches_names() {
        let samples = [
            Command::LoadContent(InitOptions::default()),
            Command::ClearSlides,
            Command::Seek { seconds: 1.0 },
            Command::CalculateLineCount { font_size: 12.0 },
            Command::SetScale { percent: 100.0 },
        ];
        for command in samples {
            assert!(is_known(command.name()), "{}", command.name());
        }
        assert_eq!(KNOWN_COMMANDS.len(), 29);
    }

    #[test]
    fn test_unknown_command_is_none() {
        assert!(parse("launchRockets", json!({})).unwrap().is_none());
    }

    #[test]
    fn test_bare_commands() {
        assert_eq!(parse("toBlack", Value::Null).unwrap(), Some(Command::ToBlack));
        assert_eq!(
            parse("loadContent", Value::Null).unwrap(),
            Some(Command::LoadContent(InitOptions::default()))
        );
    }

    #[test]
    fn test_arguments_parse() {
        assert_eq!(
            parse(
                "loadContent",
                json!({ "isDisplay": true, "doItemTransitions": true })
            )
            .unwrap(),
            Some(Command::LoadContent(InitOptions {
                is_display: true,
                do_item_transitions: true,
                hide_mouse: false,
            }))
        );

        assert_eq!(
            parse("goToSlide", json!({ "target": "v2" })).unwrap(),
            Some(Command::GoToSlide {
                target: SlideTarget::Key("v2".to_string())
            })
        );

        assert_eq!(
            parse("setAlertLocation", json!({ "location": 1 })).unwrap(),
            Some(Command::SetAlertLocation {
                location: AlertLocation::Middle
            })
        );

        let Some(Command::Alert { text, settings }) =
            parse("alert", json!({ "text": "hi" })).unwrap()
        else {
            panic!("expected alert");
        };
        assert_eq!(text, "hi");
        assert_eq!(settings, AlertSettings::default());

        assert_eq!(
            parse("calculateLineCount", json!({ "fontSize": 24 })).unwrap(),
            Some(Command::CalculateLineCount { font_size: 24.0 })
        );
    }

    #[test]
    fn test_replace_slides_batch_kind() {
        let Some(Command::ReplaceSlides(SlideBatch::Text(slides))) = parse(
            "replaceSlides",
            json!({ "slides": [{ "verse": "v1", "text": "a" }], "isText": true }),
        )
        .unwrap() else {
            panic!("expected text batch");
        };
        assert_eq!(slides[0].key.as_deref(), Some("v1"));

        let Some(Command::ReplaceSlides(SlideBatch::Images(slides))) = parse(
            "replaceSlides",
            json!({ "slides": [{ "path": "file:///a.png" }] }),
        )
        .unwrap() else {
            panic!("expected image batch");
        };
        assert_eq!(slides[0].path.as_str(), "file:///a.png");
    }

    #[test]
    fn test_known_command_with_bad_args_is_malformed() {
        let err = parse("seek", json!({ "seconds": "soon" })).unwrap_err();
        assert!(matches!(err, EngineError::MalformedCommand { ref command, .. } if command == "seek"));

        let err = parse("loadTextSlides", Value::Null).unwrap_err();
        assert!(matches!(err, EngineError::MalformedCommand { .. }));

        let err = parse("setAlertLocation", json!({ "location": "sideways" })).unwrap_err();
        assert_eq!(err.command(), "setAlertLocation");
    }

    #[test]
    fn test_raw_command_wire_format() {
        let raw: RawCommand = serde_json::from_value(json!({ "command": "show" })).unwrap();
        assert_eq!(raw.args, Value::Null);
        assert!(raw.parse().unwrap().is_some_and(|c| c.name() == "show"));
    }
}
