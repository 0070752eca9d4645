//! Alert Banner Queue
//!
//! Alerts are short banners ("Parents of child 42, please come to the nursery")
//! shown over whatever is on screen. Only one banner is ever on the surface;
//! the rest wait in a FIFO.
//!
//! # Per-alert lifecycle
//!
//! ```text
//! NotDisplaying ─alert()─▶ Entrance ─transitionFinished─▶ Steady
//!       ▲                                                    │
//!       │                          steady timer / animationFinished
//!       │                                                    ▼
//!       └─────────────────transitionFinished──────────────  Exit
//! ```
//!
//! Entrance is two-step: the banner content is written first, then after one
//! redraw frame the expand starts, so the surface never animates an empty box.
//! Every phase change is driven by a scheduler slot or a surface signal; a
//! signal that arrives in a phase that does not expect it is dropped.

use std::collections::VecDeque;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::scheduler::{Scheduler, TimerSlot};
use crate::style::theme::lenient;
use crate::style::{CodedEnum, StyleCompiler};
use crate::surface::{AlertVisual, RenderSurface, SurfaceOp};

/// Longest steady duration a single alert may ask for; larger timeouts are clamped
pub const MAX_ALERT_TIMEOUT: Duration = Duration::from_secs(60 * 60);

/// Where the banner sits on the surface
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLocation {
    /// Top edge
    Top,
    /// Vertically centered
    Middle,
    /// Bottom edge
    #[default]
    Bottom,
}

impl CodedEnum for AlertLocation {
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
            "middle" => Some(Self::Middle),
            "bottom" => Some(Self::Bottom),
            _ => None,
        }
    }
}

impl<'de> Deserialize<'de> for AlertLocation {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(&value)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown alert location {value}")))
    }
}

impl std::fmt::Display for AlertLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Top => write!(f, "top"),
            Self::Middle => write!(f, "middle"),
            Self::Bottom => write!(f, "bottom"),
        }
    }
}

/// Per-alert presentation settings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AlertSettings {
    /// Banner location; `None` uses the engine's current location
    #[serde(deserialize_with = "lenient")]
    pub location: Option<AlertLocation>,
    /// Font family
    pub font_face: String,
    /// Font size in points
    pub font_size: f32,
    /// Text color
    pub font_color: String,
    /// Banner color
    pub background_color: String,
    /// Steady duration in seconds; `0` uses the configured default
    pub timeout: f32,
    /// Scroll passes; `0` is read as one
    pub repeat: u32,
    /// Scroll the text instead of holding it still
    pub scroll: bool,
}

impl Default for AlertSettings {
    fn default() -> Self {
        Self {
            location: None,
            font_face: "Sans".to_string(),
            font_size: 40.0,
            font_color: "#ffffff".to_string(),
            background_color: "#660000".to_string(),
            timeout: 0.0,
            repeat: 1,
            scroll: true,
        }
    }
}

impl AlertSettings {
    /// Steady duration, falling back to `default` for a zero or invalid timeout
    /// and capped at [`MAX_ALERT_TIMEOUT`]
    #[must_use]
    pub fn steady_duration(&self, default: Duration) -> Duration {
        let duration = if self.timeout > 0.0 {
            Duration::try_from_secs_f32(self.timeout).unwrap_or(default)
        } else {
            default
        };
        duration.min(MAX_ALERT_TIMEOUT)
    }

    /// Total scroll run time: one steady duration per repeat
    #[must_use]
    pub fn scroll_duration(&self, default: Duration) -> Duration {
        self.steady_duration(default)
            .checked_mul(self.repeat.max(1))
            .unwrap_or(Duration::MAX)
    }
}

/// One alert waiting for, or occupying, the banner
#[derive(Clone, Debug, PartialEq)]
pub struct AlertRequest {
    /// Banner text
    pub text: String,
    /// Presentation settings
    pub settings: AlertSettings,
}

/// Phase of the active alert
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AlertPhase {
    /// No banner on the surface
    NotDisplaying,
    /// Banner content written; expanding once `revealed`
    Entrance {
        /// Whether the expand has started
        revealed: bool,
    },
    /// Fully visible
    Steady,
    /// Collapsing
    Exit,
}

/// Result of an `alert()` call
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AlertOutcome {
    /// Empty text; nothing happened
    Rejected,
    /// Banner started immediately
    Shown,
    /// Another alert is active; waiting at `position` (1-based)
    Queued {
        /// Place in the queue
        position: usize,
    },
}

#[derive(Debug)]
struct ActiveAlert {
    seq: u64,
    request: AlertRequest,
    phase: AlertPhase,
}

/// FIFO of alerts serialized against one active banner
#[derive(Debug)]
pub struct AlertQueue {
    queue: VecDeque<AlertRequest>,
    active: Option<ActiveAlert>,
    next_seq: u64,
    location: AlertLocation,
    default_timeout: Duration,
}

impl AlertQueue {
    /// Create an idle queue; `default_timeout` backs alerts with `timeout = 0`
    #[must_use]
    pub fn new(default_timeout: Duration) -> Self {
        Self {
            queue: VecDeque::new(),
            active: None,
            next_seq: 0,
            location: AlertLocation::default(),
            default_timeout,
        }
    }

    /// Phase of the active alert
    #[must_use]
    pub fn phase(&self) -> AlertPhase {
        self.active
            .as_ref()
            .map_or(AlertPhase::NotDisplaying, |active| active.phase)
    }

    /// Text of the active alert
    #[must_use]
    pub fn active_text(&self) -> Option<&str> {
        self.active.as_ref().map(|active| active.request.text.as_str())
    }

    /// Alerts waiting behind the active one
    #[must_use]
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Location used by alerts that do not name their own
    #[must_use]
    pub fn location(&self) -> AlertLocation {
        self.location
    }

    /// Show `text` now, or queue it behind the active alert
    pub fn alert(
        &mut self,
        text: String,
        settings: AlertSettings,
        compiler: &StyleCompiler,
        surface: &mut dyn RenderSurface,
        scheduler: &mut Scheduler,
    ) -> AlertOutcome {
        if text.trim().is_empty() {
            tracing::debug!("Ignoring alert with empty text");
            return AlertOutcome::Rejected;
        }

        let request = AlertRequest { text, settings };
        if self.active.is_some() {
            self.queue.push_back(request);
            tracing::debug!(queued = self.queue.len(), "Alert queued");
            return AlertOutcome::Queued {
                position: self.queue.len(),
            };
        }

        self.start(request, compiler, surface, scheduler);
        AlertOutcome::Shown
    }

    /// Move the banner; later alerts without their own location follow it
    pub fn set_location(&mut self, location: AlertLocation, surface: &mut dyn RenderSurface) {
        self.location = location;
        surface.apply(SurfaceOp::SetAlertLocation { location });
    }

    /// Redraw frame after the content was written: start the expand
    pub fn on_reveal_frame(&mut self, surface: &mut dyn RenderSurface) {
        let Some(active) = self.active.as_mut() else {
            return;
        };
        if active.phase != (AlertPhase::Entrance { revealed: false }) {
            return;
        }
        active.phase = AlertPhase::Entrance { revealed: true };
        surface.apply(SurfaceOp::SetAlertPhase {
            phase: AlertVisual::Entering,
        });
    }

    /// The banner's expand or collapse finished
    pub fn on_transition_finished(
        &mut self,
        compiler: &StyleCompiler,
        surface: &mut dyn RenderSurface,
        scheduler: &mut Scheduler,
    ) {
        let Some(active) = self.active.as_mut() else {
            tracing::debug!("Alert transition signal with no active alert");
            return;
        };

        match active.phase {
            AlertPhase::Entrance { revealed: true } => {
                active.phase = AlertPhase::Steady;
                let settings = &active.request.settings;
                if settings.scroll {
                    let duration = settings.scroll_duration(self.default_timeout);
                    surface.apply(SurfaceOp::SetAlertPhase {
                        phase: AlertVisual::Scrolling {
                            duration_ms: u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
                        },
                    });
                } else {
                    surface.apply(SurfaceOp::SetAlertPhase {
                        phase: AlertVisual::Steady,
                    });
                    scheduler.schedule(
                        TimerSlot::AlertSteady(active.seq),
                        settings.steady_duration(self.default_timeout),
                    );
                }
            }
            AlertPhase::Exit => {
                surface.apply(SurfaceOp::SetAlertPhase {
                    phase: AlertVisual::Hidden,
                });
                self.active = None;
                if let Some(next) = self.queue.pop_front() {
                    self.start(next, compiler, surface, scheduler);
                }
            }
            phase => tracing::debug!(?phase, "Ignoring alert transition signal"),
        }
    }

    /// The scrolling animation ran its course
    pub fn on_animation_finished(&mut self, surface: &mut dyn RenderSurface) {
        let scrolling = self
            .active
            .as_ref()
            .is_some_and(|a| a.phase == AlertPhase::Steady && a.request.settings.scroll);
        if scrolling {
            self.begin_exit(surface);
        } else {
            tracing::debug!("Ignoring alert animation signal");
        }
    }

    /// Steady timer for alert `seq` fired
    pub fn on_steady_timeout(&mut self, seq: u64, surface: &mut dyn RenderSurface) {
        let current = self
            .active
            .as_ref()
            .is_some_and(|a| a.seq == seq && a.phase == AlertPhase::Steady);
        if current {
            self.begin_exit(surface);
        } else {
            tracing::debug!(seq, "Stale alert timer");
        }
    }

    fn begin_exit(&mut self, surface: &mut dyn RenderSurface) {
        if let Some(active) = self.active.as_mut() {
            active.phase = AlertPhase::Exit;
            surface.apply(SurfaceOp::SetAlertPhase {
                phase: AlertVisual::Exiting,
            });
        }
    }

    fn start(
        &mut self,
        request: AlertRequest,
        compiler: &StyleCompiler,
        surface: &mut dyn RenderSurface,
        scheduler: &mut Scheduler,
    ) {
        let seq = self.next_seq;
        self.next_seq += 1;

        let location = request.settings.location.unwrap_or(self.location);
        surface.apply(SurfaceOp::ShowAlert {
            text: request.text.clone(),
            style: compiler.compile_alert(&request.settings),
            location,
        });
        scheduler.schedule_frame(TimerSlot::AlertReveal);
        tracing::debug!(seq, %location, "Alert entering");

        self.active = Some(ActiveAlert {
            seq,
            request,
            phase: AlertPhase::Entrance { revealed: false },
        });
    }

    /// Sequence number of the active alert
    #[must_use]
    pub fn active_seq(&self) -> Option<u64> {
        self.active.as_ref().map(|a| a.seq)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::Canvas;
    use crate::surface::RecordingSurface;
    use serde_json::json;

    const TIMEOUT: Duration = Duration::from_secs(10);

    struct Rig {
        queue: AlertQueue,
        compiler: StyleCompiler,
        surface: RecordingSurface,
        scheduler: Scheduler,
    }

    impl Rig {
        fn new() -> Self {
            Self {
                queue: AlertQueue::new(TIMEOUT),
                compiler: StyleCompiler::new(Canvas::default(), "display-res"),
                surface: RecordingSurface::new(),
                scheduler: Scheduler::new(Duration::from_millis(16)),
            }
        }

        fn alert(&mut self, text: &str, settings: AlertSettings) -> AlertOutcome {
            self.queue.alert(
                text.to_string(),
                settings,
                &self.compiler,
                &mut self.surface,
                &mut self.scheduler,
            )
        }

        fn transition_finished(&mut self) {
            self.queue
                .on_transition_finished(&self.compiler, &mut self.surface, &mut self.scheduler);
        }
    }

    fn still() -> AlertSettings {
        AlertSettings {
            scroll: false,
            ..AlertSettings::default()
        }
    }

    #[test]
    fn test_settings_parse_leniently() {
        let settings: AlertSettings = serde_json::from_value(json!({
            "location": 0,
            "fontSize": 20,
            "timeout": 3,
            "repeat": 2,
            "scroll": false,
        }))
        .unwrap();
        assert_eq!(settings.location, Some(AlertLocation::Top));
        assert_eq!(settings.steady_duration(TIMEOUT), Duration::from_secs(3));
        assert_eq!(settings.scroll_duration(TIMEOUT), Duration::from_secs(6));

        let settings: AlertSettings =
            serde_json::from_value(json!({ "location": "sideways", "repeat": 0 })).unwrap();
        assert_eq!(settings.location, None);
        assert_eq!(settings.steady_duration(TIMEOUT), TIMEOUT);
        assert_eq!(settings.scroll_duration(TIMEOUT), TIMEOUT);

        assert!(serde_json::from_value::<AlertLocation>(json!("sideways")).is_err());
        assert_eq!(
            serde_json::from_value::<AlertLocation>(json!("Middle")).unwrap(),
            AlertLocation::Middle
        );
    }

    #[test]
    fn test_huge_timeout_is_capped() {
        let settings = AlertSettings {
            timeout: 1e19,
            repeat: u32::MAX,
            ..still()
        };
        assert_eq!(settings.steady_duration(TIMEOUT), MAX_ALERT_TIMEOUT);
        assert_eq!(
            settings.scroll_duration(TIMEOUT),
            MAX_ALERT_TIMEOUT * u32::MAX
        );

        let mut rig = Rig::new();
        rig.alert("forever", settings);
        rig.queue.on_reveal_frame(&mut rig.surface);
        rig.transition_finished();
        assert_eq!(rig.queue.phase(), AlertPhase::Steady);
        assert!(rig.scheduler.is_scheduled(TimerSlot::AlertSteady(0)));
    }

    #[test]
    fn test_empty_text_is_rejected() {
        let mut rig = Rig::new();
        assert_eq!(rig.alert("", still()), AlertOutcome::Rejected);
        assert_eq!(rig.alert("   ", still()), AlertOutcome::Rejected);
        assert_eq!(rig.queue.phase(), AlertPhase::NotDisplaying);
        assert!(rig.surface.is_empty());
    }

    #[test]
    fn test_entrance_waits_for_frame_then_signal() {
        let mut rig = Rig::new();
        assert_eq!(rig.alert("hello", still()), AlertOutcome::Shown);
        assert!(matches!(
            rig.surface.last(),
            Some(SurfaceOp::ShowAlert { ref text, location: AlertLocation::Bottom, .. }) if text == "hello"
        ));
        assert!(rig.scheduler.is_scheduled(TimerSlot::AlertReveal));

        // Signal before the expand started is ignored
        rig.transition_finished();
        assert_eq!(rig.queue.phase(), AlertPhase::Entrance { revealed: false });

        rig.queue.on_reveal_frame(&mut rig.surface);
        assert_eq!(rig.queue.phase(), AlertPhase::Entrance { revealed: true });

        rig.transition_finished();
        assert_eq!(rig.queue.phase(), AlertPhase::Steady);
        assert_eq!(
            rig.surface.last(),
            Some(SurfaceOp::SetAlertPhase {
                phase: AlertVisual::Steady
            })
        );
        assert!(rig.scheduler.is_scheduled(TimerSlot::AlertSteady(0)));
    }

    #[test]
    fn test_fifo_order_and_single_active() {
        let mut rig = Rig::new();
        assert_eq!(rig.alert("one", still()), AlertOutcome::Shown);
        assert_eq!(rig.alert("two", still()), AlertOutcome::Queued { position: 1 });
        assert_eq!(rig.alert("three", still()), AlertOutcome::Queued { position: 2 });

        let mut shown = Vec::new();
        while let Some(text) = rig.queue.active_text().map(str::to_string) {
            shown.push(text);
            let seq = rig.queue.active_seq().unwrap();
            rig.queue.on_reveal_frame(&mut rig.surface);
            rig.transition_finished();
            rig.queue.on_steady_timeout(seq, &mut rig.surface);
            assert_eq!(rig.queue.phase(), AlertPhase::Exit);
            rig.transition_finished();
        }

        assert_eq!(shown, vec!["one", "two", "three"]);
        assert_eq!(rig.queue.phase(), AlertPhase::NotDisplaying);
        assert_eq!(rig.queue.queued(), 0);
    }

    #[test]
    fn test_stale_steady_timer_is_ignored() {
        let mut rig = Rig::new();
        rig.alert("one", still());
        rig.queue.on_reveal_frame(&mut rig.surface);
        rig.transition_finished();

        rig.queue.on_steady_timeout(99, &mut rig.surface);
        assert_eq!(rig.queue.phase(), AlertPhase::Steady);
    }

    #[test]
    fn test_scrolling_alert_exits_on_animation_finished() {
        let mut rig = Rig::new();
        let settings = AlertSettings {
            timeout: 2.0,
            repeat: 3,
            ..AlertSettings::default()
        };
        rig.alert("scroll", settings);
        rig.queue.on_reveal_frame(&mut rig.surface);
        rig.transition_finished();

        assert_eq!(
            rig.surface.last(),
            Some(SurfaceOp::SetAlertPhase {
                phase: AlertVisual::Scrolling { duration_ms: 6000 }
            })
        );
        assert!(!rig.scheduler.is_scheduled(TimerSlot::AlertSteady(0)));

        rig.queue.on_animation_finished(&mut rig.surface);
        assert_eq!(rig.queue.phase(), AlertPhase::Exit);
    }

    #[test]
    fn test_location_applies_to_later_alerts() {
        let mut rig = Rig::new();
        rig.queue.set_location(AlertLocation::Top, &mut rig.surface);
        assert_eq!(
            rig.surface.last(),
            Some(SurfaceOp::SetAlertLocation {
                location: AlertLocation::Top
            })
        );

        rig.alert("hi", still());
        assert!(matches!(
            rig.surface.last(),
            Some(SurfaceOp::ShowAlert {
                location: AlertLocation::Top,
                ..
            })
        ));
    }
}
