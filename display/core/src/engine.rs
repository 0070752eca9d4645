//! Engine - One Display, All Its State
//!
//! The engine owns every component for one render surface: slides, theme,
//! handover, screen visibility, alerts and video. It is a plain struct. It
//! never spawns, never sleeps and never blocks; work that has to happen later
//! is parked in its [`Scheduler`] and picked up by [`Engine::fire_due`].
//!
//! # Design Philosophy
//!
//! There is no global instance. Each surface gets its own engine, so tests can
//! run as many independent engines as they like. The engine talks to the
//! outside world through exactly three seams:
//! - [`RenderSurface`]: declarative presentation changes
//! - [`Notifier`]: fire-and-forget host notifications
//! - [`SurfaceEvent`]: completion signals coming back from the surface

use tokio::time::Instant;

use crate::alerts::{AlertLocation, AlertOutcome, AlertQueue, AlertSettings};
use crate::commands::{InitOptions, SlideBatch};
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::notifications::{HostNotification, Notifier};
use crate::resource::ResourceRef;
use crate::scheduler::{Completion, Scheduler, TimerSlot};
use crate::screen::{ScreenStateMachine, ScreenVisibility};
use crate::slides::{
    ContentGeneration, GenerationKind, ImageSlideInput, SlideContent, SlideStore, SlideTarget,
    TextSlideInput,
};
use crate::style::{BackgroundSpec, CompiledTheme, StyleCompiler, Theme};
use crate::surface::{RenderSurface, SurfaceEvent, SurfaceOp, SurfaceTarget};
use crate::transition::TransitionController;
use crate::video::{self, VideoState};

/// Surface scale bounds, in percent
const MIN_SCALE_PERCENT: f32 = 1.0;
const MAX_SCALE_PERCENT: f32 = 1000.0;

/// Display engine for one render surface
pub struct Engine<S: RenderSurface> {
    config: EngineConfig,
    surface: S,
    scheduler: Scheduler,
    notifier: Notifier,
    compiler: StyleCompiler,
    theme: Theme,
    compiled: CompiledTheme,
    slides: SlideStore,
    transitions: TransitionController,
    alerts: AlertQueue,
    screen: ScreenStateMachine,
    video: VideoState,
    options: Option<InitOptions>,
    scale_percent: f32,
}

impl<S: RenderSurface> Engine<S> {
    /// Create an engine drawing into `surface`
    pub fn new(config: EngineConfig, surface: S, notifier: Notifier) -> Self {
        let compiler = StyleCompiler::new(config.canvas, config.resource_scheme.clone());
        let theme = Theme::default();
        let compiled = compiler.compile(&theme);
        Self {
            scheduler: Scheduler::new(config.frame_interval),
            transitions: TransitionController::new(config.settle_delay),
            alerts: AlertQueue::new(config.alert_timeout),
            compiler,
            theme,
            compiled,
            config,
            surface,
            notifier,
            slides: SlideStore::new(),
            screen: ScreenStateMachine::new(),
            video: VideoState::new(),
            options: None,
            scale_percent: 100.0,
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Settings this engine runs with
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Whether `loadContent` has run
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.options.is_some()
    }

    /// Options from the last `loadContent`
    #[must_use]
    pub fn options(&self) -> Option<InitOptions> {
        self.options
    }

    /// The render surface
    #[must_use]
    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Loaded slides
    #[must_use]
    pub fn slides(&self) -> &SlideStore {
        &self.slides
    }

    /// Handover state
    #[must_use]
    pub fn transitions(&self) -> &TransitionController {
        &self.transitions
    }

    /// Alert queue
    #[must_use]
    pub fn alerts(&self) -> &AlertQueue {
        &self.alerts
    }

    /// Active video
    #[must_use]
    pub fn video(&self) -> &VideoState {
        &self.video
    }

    /// Current theme
    #[must_use]
    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    /// Settled screen visibility
    #[must_use]
    pub fn visibility(&self) -> ScreenVisibility {
        self.screen.visibility()
    }

    /// Screen transition in flight
    #[must_use]
    pub fn pending_visibility(&self) -> Option<ScreenVisibility> {
        self.screen.pending()
    }

    /// Surface scale in percent
    #[must_use]
    pub fn scale_percent(&self) -> f32 {
        self.scale_percent
    }

    /// Earliest scheduled deadline
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.scheduler.next_deadline()
    }

    /// Whether `slot` has a pending deadline
    #[must_use]
    pub fn is_scheduled(&self, slot: TimerSlot) -> bool {
        self.scheduler.is_scheduled(slot)
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Initialize the engine and announce it to the host
    pub fn load_content(&mut self, options: InitOptions) {
        self.options = Some(options);
        self.transitions
            .set_item_transitions(options.do_item_transitions);
        if options.hide_mouse {
            self.surface
                .apply(SurfaceOp::SetCursorHidden { hidden: true });
        }
        self.transitions.apply_theme(&self.compiled, &mut self.surface);
        tracing::info!(
            is_display = options.is_display,
            item_transitions = options.do_item_transitions,
            "Display engine initialized"
        );
        self.notifier
            .notify(HostNotification::EngineInitialized { ready: true });
    }

    /// Enable or disable animated handovers
    pub fn set_content_transition(&mut self, enabled: bool) {
        self.transitions.set_item_transitions(enabled);
    }

    /// Suppress the next handover animation
    pub fn finish_with_current_item(&mut self) {
        self.transitions.skip_next_transition();
    }

    // =========================================================================
    // Content
    // =========================================================================

    /// Remove every slide, caption and video
    pub fn clear_slides(&mut self) {
        self.video.unload(&mut self.surface);
        self.transitions
            .clear(&mut self.surface, &mut self.scheduler);
        self.slides.clear();
        self.surface.apply(SurfaceOp::SetFooter {
            captions: Vec::new(),
        });
    }

    /// Replace the content with text slides
    pub fn load_text_slides(&mut self, slides: &[TextSlideInput]) {
        let generation = self.slides.prepare_text(slides);
        self.present(generation);
    }

    /// Replace the content with image slides
    pub fn load_image_slides(&mut self, slides: &[ImageSlideInput]) {
        let generation = self
            .slides
            .prepare_images(slides, &self.config.resource_scheme);
        self.present(generation);
    }

    /// Replace the content with a video
    pub fn load_video(&mut self, path: &ResourceRef) {
        let generation = self
            .slides
            .prepare_video(path, &self.config.resource_scheme);
        self.present(generation);
    }

    /// Replace the content with a text or image batch
    pub fn replace_slides(&mut self, batch: &SlideBatch) {
        match batch {
            SlideBatch::Text(slides) => self.load_text_slides(slides),
            SlideBatch::Images(slides) => self.load_image_slides(slides),
        }
    }

    /// Show one anonymous text slide, editing in place when the active
    /// generation came from an earlier call
    pub fn load_single_text_slide(&mut self, text: &str) {
        if let Some((generation, key)) = self.slides.set_single_text(text) {
            self.surface.apply(SurfaceOp::UpdateSlideText {
                generation,
                key,
                text: text.to_string(),
            });
            return;
        }
        let generation = self.slides.prepare_single_text(text);
        self.present(generation);
    }

    /// Show a slide by key or position; unknown targets are ignored
    pub fn go_to_slide(&mut self, target: &SlideTarget) {
        let Some(ordinal) = self.slides.go_to(target) else {
            tracing::debug!(?target, "goToSlide target does not resolve; ignoring");
            return;
        };
        let Some(generation) = self.slides.active().map(ContentGeneration::id) else {
            return;
        };
        self.surface
            .apply(SurfaceOp::GoToSlide { generation, ordinal });
        self.surface.apply(SurfaceOp::SetFooter {
            captions: self.slides.captions(),
        });
    }

    fn present(&mut self, generation: ContentGeneration) {
        self.video.unload(&mut self.surface);

        let report = self.transitions.handover(
            &generation,
            &self.compiled,
            &mut self.surface,
            &mut self.scheduler,
        );
        tracing::debug!(
            generation = %report.active,
            animated = report.animated,
            discarded = ?report.discarded,
            "Handover"
        );

        let video_src = match (generation.kind(), generation.slides().first()) {
            (GenerationKind::Video, Some(slide)) => match &slide.content {
                SlideContent::Video { src } => Some(src.clone()),
                _ => None,
            },
            _ => None,
        };

        self.slides.commit(generation);
        self.surface.apply(SurfaceOp::SetFooter {
            captions: self.slides.captions(),
        });
        if let Some(src) = video_src {
            self.video.load(&src, &mut self.surface);
        }
    }

    // =========================================================================
    // Video
    // =========================================================================

    /// Start/resume the video
    pub fn play(&mut self) {
        self.video.play(&mut self.surface);
    }

    /// Pause the video
    pub fn pause(&mut self) {
        self.video.pause(&mut self.surface);
    }

    /// Stop and rewind the video
    pub fn stop(&mut self) {
        self.video.stop(&mut self.surface);
    }

    /// Jump within the video
    pub fn seek(&mut self, seconds: f64) {
        self.video.seek(seconds, &mut self.surface);
    }

    /// Change the playback rate
    ///
    /// # Errors
    ///
    /// [`EngineError::InvalidArgument`] unless `rate` is positive and finite.
    pub fn set_rate(&mut self, rate: f64) -> Result<(), EngineError> {
        if !rate.is_finite() || rate <= 0.0 {
            return Err(EngineError::InvalidArgument {
                command: "setRate",
                reason: format!("rate must be positive and finite, got {rate}"),
            });
        }
        self.video.set_rate(rate, &mut self.surface);
        Ok(())
    }

    /// Change the volume (clamped to `[0, 1]`)
    pub fn set_volume(&mut self, level: f64) {
        self.video.set_volume(level, &mut self.surface);
    }

    /// Flip the mute state
    pub fn toggle_mute(&mut self) {
        self.video.toggle_mute(&mut self.surface);
    }

    /// Container extensions the surface can play
    #[must_use]
    pub fn supported_video_formats(&self) -> Vec<String> {
        video::supported_formats(&self.surface)
    }

    // =========================================================================
    // Alerts
    // =========================================================================

    /// Show or queue an alert banner
    pub fn alert(&mut self, text: String, settings: AlertSettings) -> AlertOutcome {
        self.alerts.alert(
            text,
            settings,
            &self.compiler,
            &mut self.surface,
            &mut self.scheduler,
        )
    }

    /// Move the alert banner
    pub fn set_alert_location(&mut self, location: AlertLocation) {
        self.alerts.set_location(location, &mut self.surface);
    }

    // =========================================================================
    // Screen
    // =========================================================================

    /// Blank to black
    pub fn to_black(&mut self) -> Completion<ScreenVisibility> {
        self.set_visibility(ScreenVisibility::Black)
    }

    /// Blank to the theme background
    pub fn to_theme(&mut self) -> Completion<ScreenVisibility> {
        self.set_visibility(ScreenVisibility::ThemeOnly)
    }

    /// Become transparent
    pub fn to_transparent(&mut self) -> Completion<ScreenVisibility> {
        self.set_visibility(ScreenVisibility::Transparent)
    }

    /// Show content
    pub fn show(&mut self) -> Completion<ScreenVisibility> {
        self.set_visibility(ScreenVisibility::Shown)
    }

    /// Move toward `target`, superseding any transition in flight
    pub fn set_visibility(&mut self, target: ScreenVisibility) -> Completion<ScreenVisibility> {
        self.screen
            .request(target, &mut self.surface, &mut self.scheduler)
    }

    /// Scale the whole surface (percent, clamped to `[1, 1000]`)
    pub fn set_scale(&mut self, percent: f32) {
        let percent = if percent.is_nan() {
            100.0
        } else {
            percent.clamp(MIN_SCALE_PERCENT, MAX_SCALE_PERCENT)
        };
        self.scale_percent = percent;
        self.surface.apply(SurfaceOp::SetScale {
            factor: percent / 100.0,
        });
    }

    // =========================================================================
    // Theme
    // =========================================================================

    /// Replace the theme; it applies from the next handover on
    pub fn set_theme(&mut self, theme: Theme) {
        self.compiled = self.compiler.compile(&theme);
        self.theme = theme;
        tracing::debug!(
            transition = ?self.compiled.transition.kind,
            "Theme set"
        );
    }

    /// Replace the background with an image, immediately
    pub fn set_background_image(&mut self, path: ResourceRef) {
        let border_color = match &self.theme.background {
            BackgroundSpec::Image { border_color, .. } | BackgroundSpec::Video { border_color, .. } => {
                border_color.clone()
            }
            _ => "#000000".to_string(),
        };
        self.theme.background = BackgroundSpec::Image { path, border_color };
        self.compiled.background = self.compiler.compile_background(&self.theme.background);
        self.surface.apply(SurfaceOp::SetBackground {
            background: self.compiled.background.clone(),
        });
    }

    /// Reapply the current theme to what is on screen
    pub fn reset_theme(&mut self) {
        if self.slides.is_empty() {
            tracing::warn!("resetTheme with no slides loaded");
            return;
        }
        self.transitions
            .apply_theme(&self.compiled, &mut self.surface);
    }

    /// Whole lines of `font_size` pt text that fit in the main region
    #[must_use]
    pub fn calculate_line_count(&self, font_size: f32) -> u32 {
        self.compiler.line_count(&self.theme, font_size)
    }

    // =========================================================================
    // Signals and timers
    // =========================================================================

    /// Route a signal from the render surface
    pub fn handle_event(&mut self, event: SurfaceEvent) {
        match event {
            SurfaceEvent::TransitionFinished {
                target: SurfaceTarget::Surface,
            } => self
                .screen
                .on_surface_faded(&mut self.surface, &mut self.scheduler, &self.notifier),
            SurfaceEvent::TransitionFinished {
                target: SurfaceTarget::Alert,
            } => self.alerts.on_transition_finished(
                &self.compiler,
                &mut self.surface,
                &mut self.scheduler,
            ),
            SurfaceEvent::AnimationFinished {
                target: SurfaceTarget::Alert,
            } => self.alerts.on_animation_finished(&mut self.surface),
            SurfaceEvent::Media { event } => self.video.on_media_event(event, &self.notifier),
            SurfaceEvent::TransitionFinished { target }
            | SurfaceEvent::AnimationFinished { target } => {
                tracing::trace!(?target, "Unobserved surface signal");
            }
        }
    }

    /// Fire every slot due at `now`, including slots that become due while firing
    pub fn fire_due(&mut self, now: Instant) {
        loop {
            let due = self.scheduler.take_due(now);
            if due.is_empty() {
                break;
            }
            for slot in due {
                self.fire(slot);
            }
        }
    }

    fn fire(&mut self, slot: TimerSlot) {
        tracing::trace!(?slot, "Timer fired");
        match slot {
            TimerSlot::ScreenFrame => self.screen.on_frame(),
            TimerSlot::AlertReveal => self.alerts.on_reveal_frame(&mut self.surface),
            TimerSlot::AlertSteady(seq) => self.alerts.on_steady_timeout(seq, &mut self.surface),
            TimerSlot::Settle(seq) => {
                self.transitions.on_settle(seq, &mut self.surface);
            }
        }
    }
}

impl<S: RenderSurface + std::fmt::Debug> std::fmt::Debug for Engine<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("initialized", &self.is_initialized())
            .field("slides", &self.slides.len())
            .field("visibility", &self.screen.visibility())
            .field("alert", &self.alerts.phase())
            .field("surface", &self.surface)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifications;
    use crate::scheduler::Outcome;
    use crate::surface::RecordingSurface;
    use std::time::Duration;

    fn engine() -> (Engine<RecordingSurface>, RecordingSurface) {
        let surface = RecordingSurface::new();
        let engine = Engine::new(
            EngineConfig::default(),
            surface.clone(),
            Notifier::disconnected(),
        );
        (engine, surface)
    }

    fn later(ms: u64) -> Instant {
        Instant::now() + Duration::from_millis(ms)
    }

    #[test]
    fn test_load_content_notifies_host() {
        let surface = RecordingSurface::new();
        let (notifier, mut rx) = notifications::channel(4);
        let mut engine = Engine::new(EngineConfig::default(), surface.clone(), notifier);

        engine.load_content(InitOptions {
            hide_mouse: true,
            ..InitOptions::default()
        });

        assert!(engine.is_initialized());
        assert_eq!(
            rx.try_recv().unwrap(),
            HostNotification::EngineInitialized { ready: true }
        );
        assert_eq!(
            surface.ops().first(),
            Some(&SurfaceOp::SetCursorHidden { hidden: true })
        );
    }

    #[test]
    fn test_single_text_updates_in_place() {
        let (mut engine, surface) = engine();
        engine.load_single_text_slide("a");
        let inserts = |s: &RecordingSurface| {
            s.count(|op| matches!(op, SurfaceOp::InsertGeneration { .. }))
        };
        assert_eq!(inserts(&surface), 1);

        engine.load_single_text_slide("b");
        assert_eq!(inserts(&surface), 1);
        assert!(matches!(
            surface.last(),
            Some(SurfaceOp::UpdateSlideText { ref text, .. }) if text == "b"
        ));
    }

    #[test]
    fn test_video_generation_loads_player() {
        let (mut engine, surface) = engine();
        engine.load_video(&ResourceRef::new("file:///clip.mp4"));
        assert_eq!(engine.video().src(), Some("display-res:///clip.mp4"));

        engine.play();
        assert!(engine.video().is_playing());

        engine.load_text_slides(&[TextSlideInput::new("after")]);
        assert!(!engine.video().is_loaded());
        assert!(surface.count(|op| matches!(
            op,
            SurfaceOp::Video {
                command: crate::surface::VideoOp::Unload
            }
        )) == 1);
    }

    #[test]
    fn test_set_rate_validates() {
        let (mut engine, _surface) = engine();
        assert!(engine.set_rate(0.0).is_err());
        assert!(engine.set_rate(f64::NAN).is_err());
        assert!(engine.set_rate(-1.0).is_err());
        assert!(engine.set_rate(1.5).is_ok());
    }

    #[test]
    fn test_scale_is_clamped() {
        let (mut engine, surface) = engine();
        engine.set_scale(5000.0);
        assert!((engine.scale_percent() - 1000.0).abs() < f32::EPSILON);
        engine.set_scale(0.0);
        assert_eq!(surface.last(), Some(SurfaceOp::SetScale { factor: 0.01 }));
    }

    #[test]
    fn test_reset_theme_without_slides_is_noop() {
        let (mut engine, surface) = engine();
        engine.reset_theme();
        assert!(surface.is_empty());

        engine.load_text_slides(&[TextSlideInput::new("x")]);
        surface.take();
        engine.reset_theme();
        assert!(surface.count(|op| matches!(op, SurfaceOp::SetMainStyle { .. })) == 1);
    }

    #[test]
    fn test_background_image_applies_immediately() {
        let (mut engine, surface) = engine();
        engine.set_background_image(ResourceRef::new("file:///bg.jpg"));
        assert!(matches!(surface.last(), Some(SurfaceOp::SetBackground { .. })));
        assert!(matches!(
            engine.theme().background,
            BackgroundSpec::Image { ref border_color, .. } if border_color == "#000000"
        ));
    }

    #[test]
    fn test_fire_due_settles_screen() {
        let (mut engine, _surface) = engine();
        let mut done = engine.to_black();
        engine.fire_due(later(1000));
        assert_eq!(
            done.try_outcome(),
            Some(Outcome::Completed(ScreenVisibility::Black))
        );
        assert_eq!(engine.visibility(), ScreenVisibility::Black);
    }

    #[test]
    fn test_alert_signals_route_through_engine() {
        let (mut engine, _surface) = engine();
        let settings = AlertSettings {
            scroll: false,
            timeout: 1.0,
            ..AlertSettings::default()
        };
        engine.alert("hello".to_string(), settings);
        engine.fire_due(later(100));
        engine.handle_event(SurfaceEvent::TransitionFinished {
            target: SurfaceTarget::Alert,
        });
        assert_eq!(engine.alerts().phase(), crate::alerts::AlertPhase::Steady);

        engine.fire_due(later(5000));
        assert_eq!(engine.alerts().phase(), crate::alerts::AlertPhase::Exit);
    }
}
