//! Screen Visibility
//!
//! Macro visibility of the whole surface: shown, blanked to black, blanked to
//! the theme background, or transparent so the host can hide its window.
//!
//! Every change is asynchronous and returns a [`Completion`]. A new request
//! always cancels the one in flight first: its completion resolves as
//! [`Outcome::Superseded`](crate::scheduler::Outcome::Superseded) and its redraw
//! frame is unscheduled, so nothing from the old request can land after the new
//! one started.
//!
//! ```text
//! Shown / Black / ThemeOnly:  set layers ─▶ wait one frame ─▶ Completed
//! Transparent:                fade surface ─▶ transitionFinished(surface)
//!                             ─▶ zero content, requestRepaint ─▶ wait one frame ─▶ Completed
//! ```
//!
//! A surface that already finished fading out fires no further
//! `transitionFinished`, so a repeated transparent request skips the fade and
//! settles on the next frame.

use serde::{Deserialize, Serialize};

use crate::notifications::{HostNotification, Notifier};
use crate::scheduler::{completion, Completion, Resolver, Scheduler, TimerSlot};
use crate::surface::{Layer, RenderSurface, SurfaceOp};

/// Macro visibility state
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScreenVisibility {
    /// Content visible
    #[default]
    Shown,
    /// Everything black
    Black,
    /// Theme background only
    ThemeOnly,
    /// Nothing drawn
    Transparent,
}

impl std::fmt::Display for ScreenVisibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Shown => write!(f, "shown"),
            Self::Black => write!(f, "black"),
            Self::ThemeOnly => write!(f, "theme"),
            Self::Transparent => write!(f, "transparent"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Step {
    AwaitingFade,
    AwaitingFrame,
}

#[derive(Debug)]
struct InFlight {
    target: ScreenVisibility,
    step: Step,
    resolver: Resolver<ScreenVisibility>,
}

/// Race-free visibility transitions
#[derive(Debug, Default)]
pub struct ScreenStateMachine {
    visibility: ScreenVisibility,
    in_flight: Option<InFlight>,
    // Surface layer is at opacity 0 and its fade has finished
    surface_hidden: bool,
}

impl ScreenStateMachine {
    /// Start in [`ScreenVisibility::Shown`]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Last settled visibility
    #[must_use]
    pub fn visibility(&self) -> ScreenVisibility {
        self.visibility
    }

    /// Target of the transition in flight
    #[must_use]
    pub fn pending(&self) -> Option<ScreenVisibility> {
        self.in_flight.as_ref().map(|f| f.target)
    }

    /// Cancel whatever is in flight and move toward `target`
    pub fn request(
        &mut self,
        target: ScreenVisibility,
        surface: &mut dyn RenderSurface,
        scheduler: &mut Scheduler,
    ) -> Completion<ScreenVisibility> {
        self.cancel(scheduler);

        let (resolver, handle) = completion();
        let step = match target {
            ScreenVisibility::Shown => {
                self.surface_hidden = false;
                set_layers(surface, [1.0, 1.0, 1.0, 1.0]);
                surface.apply(SurfaceOp::SetDeckPaused { paused: false });
                scheduler.schedule_frame(TimerSlot::ScreenFrame);
                Step::AwaitingFrame
            }
            ScreenVisibility::Black => {
                self.surface_hidden = false;
                set_layers(surface, [1.0, 0.0, 0.0, 0.0]);
                surface.apply(SurfaceOp::SetDeckPaused { paused: true });
                scheduler.schedule_frame(TimerSlot::ScreenFrame);
                Step::AwaitingFrame
            }
            ScreenVisibility::ThemeOnly => {
                self.surface_hidden = false;
                set_layers(surface, [1.0, 0.0, 0.0, 1.0]);
                surface.apply(SurfaceOp::SetDeckPaused { paused: true });
                scheduler.schedule_frame(TimerSlot::ScreenFrame);
                Step::AwaitingFrame
            }
            ScreenVisibility::Transparent if self.surface_hidden => {
                hide_content(surface);
                scheduler.schedule_frame(TimerSlot::ScreenFrame);
                Step::AwaitingFrame
            }
            ScreenVisibility::Transparent => {
                surface.apply(SurfaceOp::SetLayerOpacity {
                    layer: Layer::Surface,
                    opacity: 0.0,
                });
                Step::AwaitingFade
            }
        };

        tracing::debug!(%target, from = %self.visibility, "Screen transition started");
        self.in_flight = Some(InFlight {
            target,
            step,
            resolver,
        });
        handle
    }

    /// The surface finished its macro-visibility fade
    pub fn on_surface_faded(
        &mut self,
        surface: &mut dyn RenderSurface,
        scheduler: &mut Scheduler,
        notifier: &Notifier,
    ) {
        let Some(flight) = self.in_flight.as_mut() else {
            tracing::debug!("Surface fade signal with no screen transition in flight");
            return;
        };
        if flight.step != Step::AwaitingFade {
            tracing::debug!(target = %flight.target, "Ignoring surface fade signal");
            return;
        }

        self.surface_hidden = true;
        hide_content(surface);
        notifier.notify(HostNotification::RequestRepaint);
        scheduler.schedule_frame(TimerSlot::ScreenFrame);
        flight.step = Step::AwaitingFrame;
    }

    /// The settle frame elapsed
    pub fn on_frame(&mut self) {
        let Some(flight) = self.in_flight.take() else {
            return;
        };
        if flight.step != Step::AwaitingFrame {
            self.in_flight = Some(flight);
            return;
        }
        self.visibility = flight.target;
        tracing::debug!(visibility = %self.visibility, "Screen transition settled");
        flight.resolver.complete(flight.target);
    }

    fn cancel(&mut self, scheduler: &mut Scheduler) {
        scheduler.cancel(TimerSlot::ScreenFrame);
        if let Some(flight) = self.in_flight.take() {
            tracing::debug!(target = %flight.target, "Screen transition superseded");
            flight.resolver.supersede();
        }
    }
}

fn hide_content(surface: &mut dyn RenderSurface) {
    surface.apply(SurfaceOp::SetLayerOpacity {
        layer: Layer::Slides,
        opacity: 0.0,
    });
    surface.apply(SurfaceOp::SetLayerOpacity {
        layer: Layer::Footer,
        opacity: 0.0,
    });
    surface.apply(SurfaceOp::SetDeckPaused { paused: true });
}

/// Opacities in `[surface, slides, footer, background]` order
fn set_layers(surface: &mut dyn RenderSurface, opacities: [f32; 4]) {
    let layers = [Layer::Surface, Layer::Slides, Layer::Footer, Layer::Background];
    for (layer, opacity) in layers.into_iter().zip(opacities) {
        surface.apply(SurfaceOp::SetLayerOpacity { layer, opacity });
    }
}
