//! Render Surface Boundary
//!
//! The engine never touches a visual tree directly. Every visible change is a
//! declarative [`SurfaceOp`] handed to a [`RenderSurface`]; every completion
//! the surface observes (a fade finishing, a scroll animation ending, media
//! progress) comes back as a [`SurfaceEvent`].
//!
//! ```text
//!   Engine ──SurfaceOp──▶ RenderSurface (webview, GPU canvas, recorder…)
//!     ▲                          │
//!     └────────SurfaceEvent──────┘   (delivered by the host)
//! ```

use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::alerts::AlertLocation;
use crate::slides::{FooterCaption, GenerationId, Slide};
use crate::style::{CompiledBackground, CompiledTransition, StyleRules};

/// Media types playable by a typical embedded web surface
pub const DEFAULT_MEDIA_TYPES: &[&str] = &["video/mp4", "video/webm", "video/ogg"];

/// Anything the engine can draw into
pub trait RenderSurface {
    /// Apply one presentation change
    fn apply(&mut self, op: SurfaceOp);

    /// Whether the surface's native decoder can play `mime`
    fn supports_media_type(&self, mime: &str) -> bool {
        DEFAULT_MEDIA_TYPES.contains(&mime)
    }
}

/// Independently faded layers of the output
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Layer {
    /// The whole surface (macro visibility)
    Surface,
    /// Slide deck content
    Slides,
    /// Footer/caption region
    Footer,
    /// Theme background
    Background,
}

/// Elements that emit transition/animation completion signals
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SurfaceTarget {
    /// The whole surface
    Surface,
    /// The alert banner
    Alert,
    /// The slide deck
    Slides,
}

/// Visual phase of the alert banner
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum AlertVisual {
    /// Banner expanding into view
    Entering,
    /// Banner fully visible, text static
    Steady,
    /// Banner fully visible, text scrolling for `duration_ms`
    Scrolling {
        /// Total scroll run time
        duration_ms: u64,
    },
    /// Banner collapsing
    Exiting,
    /// Banner gone
    Hidden,
}

/// Commands for the active video element
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum VideoOp {
    /// Attach a source
    Load {
        /// Normalized location
        src: String,
        /// Restart at the end
        looping: bool,
        /// Start muted
        muted: bool,
    },
    /// Start/resume playback
    Play,
    /// Pause playback
    Pause,
    /// Pause and rewind to the start
    Stop,
    /// Jump to a position
    Seek {
        /// Position in seconds
        seconds: f64,
    },
    /// Change playback rate
    SetRate {
        /// Rate multiplier
        rate: f64,
    },
    /// Change volume
    SetVolume {
        /// Level in `[0, 1]`
        level: f64,
    },
    /// Mute or unmute
    SetMuted {
        /// Whether muted
        muted: bool,
    },
    /// Detach the source
    Unload,
}

/// Declarative presentation changes
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum SurfaceOp {
    /// Show or hide the pointer over the surface
    SetCursorHidden {
        /// Whether hidden
        hidden: bool,
    },
    /// Pre-render a generation behind the active one
    InsertGeneration {
        /// Generation being inserted
        generation: GenerationId,
        /// Its slides, in order
        slides: Vec<Slide>,
        /// Transition it enters with
        transition: CompiledTransition,
        /// Main region rules
        main_style: StyleRules,
    },
    /// Step the deck forward onto `to`
    Advance {
        /// Generation that becomes visible
        to: GenerationId,
        /// Whether the step animates
        animate: bool,
    },
    /// Drop a generation's elements
    RemoveGeneration {
        /// Generation to remove
        generation: GenerationId,
    },
    /// Drop every generation and caption
    ClearAll,
    /// Replace one text slide's text in place
    UpdateSlideText {
        /// Owning generation
        generation: GenerationId,
        /// Slide key
        key: String,
        /// New text
        text: String,
    },
    /// Show a slide of the active generation
    GoToSlide {
        /// Owning generation
        generation: GenerationId,
        /// Slide position
        ordinal: usize,
    },
    /// Restyle a generation's main region
    SetMainStyle {
        /// Target generation
        generation: GenerationId,
        /// Main region rules
        style: StyleRules,
    },
    /// Restyle the footer region
    SetFooterStyle {
        /// Footer rules
        style: StyleRules,
    },
    /// Replace the footer captions
    SetFooter {
        /// Captions in slide order
        captions: Vec<FooterCaption>,
    },
    /// Replace the background
    SetBackground {
        /// Compiled background
        background: CompiledBackground,
    },
    /// Fade a layer
    SetLayerOpacity {
        /// Target layer
        layer: Layer,
        /// Opacity in `[0, 1]`
        opacity: f32,
    },
    /// Pause or resume the deck renderer
    SetDeckPaused {
        /// Whether paused
        paused: bool,
    },
    /// Write alert content (still collapsed)
    ShowAlert {
        /// Alert text
        text: String,
        /// Banner rules
        style: StyleRules,
        /// Where the banner sits
        location: AlertLocation,
    },
    /// Move the alert banner to a visual phase
    SetAlertPhase {
        /// New phase
        phase: AlertVisual,
    },
    /// Move the alert banner
    SetAlertLocation {
        /// New location
        location: AlertLocation,
    },
    /// Drive the video element
    Video {
        /// Video command
        command: VideoOp,
    },
    /// Scale the whole surface
    SetScale {
        /// Scale factor (1.0 = 100 %)
        factor: f32,
    },
}

/// Media element progress and errors
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum MediaEvent {
    /// Duration became known or changed
    DurationChanged {
        /// Seconds
        seconds: f64,
    },
    /// Playback position moved
    PositionChanged {
        /// Seconds
        seconds: f64,
    },
    /// Volume changed
    VolumeChanged {
        /// Level in `[0, 1]`
        level: f64,
    },
    /// Rate changed
    RateChanged {
        /// Rate multiplier
        rate: f64,
    },
    /// Playback reached the end
    Ended,
    /// Mute toggled
    MuteChanged {
        /// Whether muted
        muted: bool,
    },
    /// Decoder or load failure
    Error {
        /// Platform message
        message: String,
    },
}

/// Signals from the render surface
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum SurfaceEvent {
    /// A CSS-style transition on `target` finished
    TransitionFinished {
        /// Element that finished
        target: SurfaceTarget,
    },
    /// A keyframe animation on `target` finished
    AnimationFinished {
        /// Element that finished
        target: SurfaceTarget,
    },
    /// Media element event
    Media {
        /// The event
        event: MediaEvent,
    },
}

/// In-process surface that records every op
///
/// Clones share the same log, so a test can keep one handle while the engine
/// owns another.
#[derive(Clone, Debug, Default)]
pub struct RecordingSurface {
    ops: Arc<Mutex<Vec<SurfaceOp>>>,
    media_types: Option<Arc<Vec<String>>>,
}

impl RecordingSurface {
    /// Create an empty recorder with the default playable media types
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the set of playable media types
    #[must_use]
    pub fn with_media_types<I, T>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.media_types = Some(Arc::new(types.into_iter().map(Into::into).collect()));
        self
    }

    /// Snapshot of every recorded op
    #[must_use]
    pub fn ops(&self) -> Vec<SurfaceOp> {
        self.ops.lock().clone()
    }

    /// Remove and return every recorded op
    pub fn take(&self) -> Vec<SurfaceOp> {
        std::mem::take(&mut *self.ops.lock())
    }

    /// Number of recorded ops
    #[must_use]
    pub fn len(&self) -> usize {
        self.ops.lock().len()
    }

    /// Whether nothing was recorded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.lock().is_empty()
    }

    /// Most recent op
    #[must_use]
    pub fn last(&self) -> Option<SurfaceOp> {
        self.ops.lock().last().cloned()
    }

    /// Count recorded ops matching `predicate`
    pub fn count(&self, predicate: impl Fn(&SurfaceOp) -> bool) -> usize {
        self.ops.lock().iter().filter(|op| predicate(op)).count()
    }
}

impl RenderSurface for RecordingSurface {
    fn apply(&mut self, op: SurfaceOp) {
        tracing::trace!(?op, "Surface op");
        self.ops.lock().push(op);
    }

    fn supports_media_type(&self, mime: &str) -> bool {
        match &self.media_types {
            Some(types) => types.iter().any(|t| t == mime),
            None => DEFAULT_MEDIA_TYPES.contains(&mime),
        }
    }
}
