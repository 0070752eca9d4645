//! Command Dispatcher
//!
//! The single entry point for host commands. Routing only: each command maps
//! to one engine operation, and the dispatcher decides nothing beyond
//! - unknown names are ignored,
//! - state-mutating commands wait for `loadContent`,
//! - getters are always answered.

use tokio::time::Instant;

use crate::commands::{Command, RawCommand, Reply};
use crate::engine::Engine;
use crate::error::EngineError;
use crate::surface::{RenderSurface, SurfaceEvent};

/// Routes host commands and surface signals into one engine
pub struct CommandDispatcher<S: RenderSurface> {
    engine: Engine<S>,
}

impl<S: RenderSurface> CommandDispatcher<S> {
    /// Take ownership of `engine`
    pub fn new(engine: Engine<S>) -> Self {
        Self { engine }
    }

    /// The engine being driven
    #[must_use]
    pub fn engine(&self) -> &Engine<S> {
        &self.engine
    }

    /// Mutable access for embedders that call engine operations directly
    pub fn engine_mut(&mut self) -> &mut Engine<S> {
        &mut self.engine
    }

    /// Give the engine back
    pub fn into_engine(self) -> Engine<S> {
        self.engine
    }

    /// Route a command record as received from the host
    ///
    /// # Errors
    ///
    /// [`EngineError::MalformedCommand`] for a known name with bad arguments,
    /// plus everything [`dispatch`](Self::dispatch) returns.
    pub fn dispatch_raw(&mut self, raw: &RawCommand) -> Result<Reply, EngineError> {
        match raw.parse()? {
            Some(command) => self.dispatch(command),
            None => {
                tracing::debug!(command = %raw.command, "Ignoring unknown command");
                Ok(Reply::Ignored)
            }
        }
    }

    /// Route a typed command
    ///
    /// # Errors
    ///
    /// - [`EngineError::NotInitialized`] for a state-mutating command before `loadContent`
    /// - [`EngineError::InvalidArgument`] for a value the engine cannot act on
    pub fn dispatch(&mut self, command: Command) -> Result<Reply, EngineError> {
        let name = command.name();
        if !self.engine.is_initialized()
            && !command.is_getter()
            && !matches!(command, Command::LoadContent(_))
        {
            tracing::warn!(command = name, "Rejecting command before loadContent");
            return Err(EngineError::NotInitialized { command: name });
        }
        tracing::debug!(command = name, "Dispatching");

        let engine = &mut self.engine;
        let reply = match command {
            Command::LoadContent(options) => {
                engine.load_content(options);
                Reply::Done
            }
            Command::SetContentTransition { enabled } => {
                engine.set_content_transition(enabled);
                Reply::Done
            }
            Command::ClearSlides => {
                engine.clear_slides();
                Reply::Done
            }
            Command::ReplaceSlides(batch) => {
                engine.replace_slides(&batch);
                Reply::Done
            }
            Command::LoadSingleTextSlide { text } => {
                engine.load_single_text_slide(&text);
                Reply::Done
            }
            Command::LoadTextSlides { slides } => {
                engine.load_text_slides(&slides);
                Reply::Done
            }
            Command::LoadImageSlides { slides } => {
                engine.load_image_slides(&slides);
                Reply::Done
            }
            Command::LoadVideo { path } => {
                engine.load_video(&path);
                Reply::Done
            }
            Command::Play => {
                engine.play();
                Reply::Done
            }
            Command::Pause => {
                engine.pause();
                Reply::Done
            }
            Command::Stop => {
                engine.stop();
                Reply::Done
            }
            Command::Seek { seconds } => {
                engine.seek(seconds);
                Reply::Done
            }
            Command::SetRate { rate } => {
                engine.set_rate(rate)?;
                Reply::Done
            }
            Command::SetVolume { level } => {
                engine.set_volume(level);
                Reply::Done
            }
            Command::ToggleMute => {
                engine.toggle_mute();
                Reply::Done
            }
            Command::GoToSlide { target } => {
                engine.go_to_slide(&target);
                Reply::Done
            }
            Command::Alert { text, settings } => {
                let outcome = engine.alert(text, settings);
                tracing::debug!(?outcome, "Alert");
                Reply::Done
            }
            Command::SetAlertLocation { location } => {
                engine.set_alert_location(location);
                Reply::Done
            }
            Command::ToBlack => Reply::Pending(engine.to_black()),
            Command::ToTheme => Reply::Pending(engine.to_theme()),
            Command::ToTransparent => Reply::Pending(engine.to_transparent()),
            Command::Show => Reply::Pending(engine.show()),
            Command::SetTheme { theme } => {
                engine.set_theme(theme);
                Reply::Done
            }
            Command::SetBackgroundImage { path } => {
                engine.set_background_image(path);
                Reply::Done
            }
            Command::ResetTheme => {
                engine.reset_theme();
                Reply::Done
            }
            Command::FinishWithCurrentItem => {
                engine.finish_with_current_item();
                Reply::Done
            }
            Command::CalculateLineCount { font_size } => {
                Reply::LineCount(engine.calculate_line_count(font_size))
            }
            Command::GetSupportedVideoFormats => {
                Reply::VideoFormats(engine.supported_video_formats())
            }
            Command::SetScale { percent } => {
                engine.set_scale(percent);
                Reply::Done
            }
        };
        Ok(reply)
    }

    /// Route a signal from the render surface
    pub fn handle_event(&mut self, event: SurfaceEvent) {
        self.engine.handle_event(event);
    }

    /// Earliest scheduled deadline
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.engine.next_deadline()
    }

    /// Fire every slot due at `now`
    pub fn fire_due(&mut self, now: Instant) {
        self.engine.fire_due(now);
    }
}
