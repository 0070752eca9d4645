//! Host Notifications
//!
//! Fire-and-forget messages from the engine to the host application: the
//! one-time initialization signal, media progress, and the repaint request
//! issued before the surface turns transparent.
//!
//! # Design Philosophy
//!
//! The engine must never wait on its host. Notifications go out through a
//! bounded channel with `try_send`; a full or closed channel costs one log line
//! and the notification, never a stall of the render loop.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Messages from the engine to its host
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "notification",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum HostNotification {
    /// Sent once after `loadContent`
    EngineInitialized {
        /// Always `true`
        ready: bool,
    },
    /// Active video's duration is known
    DurationChanged {
        /// Seconds
        seconds: f64,
    },
    /// Active video's position moved
    PositionChanged {
        /// Seconds
        seconds: f64,
    },
    /// Active video's volume changed
    VolumeChanged {
        /// Level in `[0, 1]`
        level: f64,
    },
    /// Active video's rate changed
    RateChanged {
        /// Rate multiplier
        rate: f64,
    },
    /// Active video reached its end
    PlaybackEnded,
    /// Active video was muted or unmuted
    MuteChanged {
        /// Whether muted
        muted: bool,
    },
    /// Force a repaint before the host hides its window
    RequestRepaint,
    /// Media element failed to load or decode
    MediaError {
        /// Platform message, verbatim
        message: String,
    },
}

/// Sending half of the notification channel
#[derive(Clone, Debug, Default)]
pub struct Notifier {
    tx: Option<mpsc::Sender<HostNotification>>,
}

impl Notifier {
    /// Wrap an existing sender
    #[must_use]
    pub fn new(tx: mpsc::Sender<HostNotification>) -> Self {
        Self { tx: Some(tx) }
    }

    /// Notifier that drops everything (embedders that do not listen)
    #[must_use]
    pub fn disconnected() -> Self {
        Self { tx: None }
    }

    /// Send without waiting; returns whether the host will see it
    pub fn notify(&self, notification: HostNotification) -> bool {
        let Some(tx) = &self.tx else {
            return false;
        };
        match tx.try_send(notification) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(dropped)) => {
                tracing::warn!(notification = ?dropped, "Notification channel full, dropping");
                false
            }
            Err(mpsc::error::TrySendError::Closed(dropped)) => {
                tracing::debug!(notification = ?dropped, "Host stopped listening");
                false
            }
        }
    }
}

/// Create a bounded notification channel
#[must_use]
pub fn channel(capacity: usize) -> (Notifier, mpsc::Receiver<HostNotification>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (Notifier::new(tx), rx)
}
