//! Display Core - Headless Presentation Display Engine
//!
//! This crate is the engine behind a live presentation output: it keeps the
//! loaded slides, compiles themes into style rules, hands content over from one
//! item to the next, blanks and restores the screen, runs the alert banner and
//! mirrors the video player. It draws nothing itself. Every visible change is a
//! declarative [`SurfaceOp`] sent to a [`RenderSurface`], which may be a web
//! view, a native compositor or a recording in a test.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                            Host                               │
//! │        RawCommand (down)          HostNotification (up)       │
//! └───────────────┬──────────────────────────────▲───────────────┘
//!                 │                              │
//! ┌───────────────┼──────────────────────────────┼───────────────┐
//! │               ▼        DISPLAY CORE          │               │
//! │  ┌──────────────────────┐          ┌─────────┴────────┐      │
//! │  │  CommandDispatcher   │          │     Notifier     │      │
//! │  └──────────┬───────────┘          └─────────▲────────┘      │
//! │  ┌──────────┴─────────────────────────────────┴──────────┐   │
//! │  │                        Engine                          │   │
//! │  │  ┌────────┐ ┌──────────┐ ┌────────┐ ┌──────┐ ┌───────┐ │   │
//! │  │  │ Slides │ │ Handover │ │ Screen │ │Alerts│ │ Video │ │   │
//! │  │  └────────┘ └──────────┘ └────────┘ └──────┘ └───────┘ │   │
//! │  │        StyleCompiler            Scheduler              │   │
//! │  └──────────┬─────────────────────────────▲───────────────┘   │
//! └─────────────┼─────────────────────────────┼───────────────────┘
//!               ▼ SurfaceOp       SurfaceEvent│
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       RenderSurface                          │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Key Types
//!
//! - [`Engine`]: all display state for one surface
//! - [`CommandDispatcher`]: routes host commands into the engine
//! - [`RenderSurface`]: where presentation changes go
//! - [`Theme`]: what the host sends to style the output
//! - [`DisplayConfig`]: runtime settings, from TOML and the environment
//!
//! # Quick Start
//!
//! ```ignore
//! use display_core::{
//!     notifications, runtime, CommandDispatcher, Engine, EngineConfig, EngineInput,
//!     RawCommand, RecordingSurface,
//! };
//! use serde_json::json;
//! use tokio::sync::mpsc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let (notifier, mut notifications) = notifications::channel(64);
//!     let engine = Engine::new(EngineConfig::default(), RecordingSurface::new(), notifier);
//!
//!     let (tx, rx) = mpsc::channel(64);
//!     let task = tokio::spawn(runtime::run(CommandDispatcher::new(engine), rx, |reply| {
//!         println!("{} -> {:?}", reply.command, reply.result);
//!     }));
//!
//!     tx.send(EngineInput::command(RawCommand::new("loadContent", json!({"isDisplay": true}))))
//!         .await
//!         .unwrap();
//!     let _ready = notifications.recv().await;
//!
//!     drop(tx);
//!     task.await.unwrap();
//! }
//! ```
//!
//! # Module Overview
//!
//! - [`alerts`]: alert banner queue and its reveal/steady/exit cycle
//! - [`commands`]: host command records
//! - [`config`]: TOML and environment configuration
//! - [`dispatcher`]: command routing and the `loadContent` gate
//! - [`engine`]: the engine
//! - [`error`]: command failures
//! - [`notifications`]: engine → host messages
//! - [`resource`]: resource URLs
//! - [`runtime`]: async driver for a dispatcher
//! - [`scheduler`]: deadlines and single-resolution completions
//! - [`screen`]: black/theme/transparent/shown state machine
//! - [`slides`]: slide generations and the current slide
//! - [`style`]: theme model and style compilation
//! - [`surface`]: the render surface seam
//! - [`transition`]: content handover between generations
//! - [`video`]: video playback mirror

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod alerts;
pub mod commands;
pub mod config;
pub mod dispatcher;
pub mod engine;
pub mod error;
pub mod notifications;
pub mod resource;
pub mod runtime;
pub mod scheduler;
pub mod screen;
pub mod slides;
pub mod style;
pub mod surface;
pub mod transition;
pub mod video;

// Re-exports for convenience
pub use alerts::{AlertLocation, AlertOutcome, AlertPhase, AlertQueue, AlertSettings};
pub use commands::{Command, InitOptions, RawCommand, Reply, SlideBatch};
pub use dispatcher::CommandDispatcher;
pub use engine::Engine;
pub use error::EngineError;
pub use notifications::{HostNotification, Notifier};
pub use resource::{ResourceRef, DEFAULT_RESOURCE_SCHEME};
pub use runtime::{Dispatched, EngineInput, InputSender};
pub use scheduler::{Completion, Outcome, TimerSlot};
pub use screen::ScreenVisibility;
pub use slides::{
    FooterCaption, GenerationId, GenerationKind, ImageSlideInput, Slide, SlideContent,
    SlideTarget, TextSlideInput,
};
pub use style::{Canvas, StyleCompiler, Theme};
pub use surface::{
    AlertVisual, Layer, MediaEvent, RecordingSurface, RenderSurface, SurfaceEvent, SurfaceOp,
    SurfaceTarget, VideoOp, DEFAULT_MEDIA_TYPES,
};

// Config exports
pub use config::{
    default_config_path, load_config, load_config_from_path, ConfigError, ConfigOverrides,
    ConfigSource, DisplayConfig, DisplayToml, EngineConfig,
};
