//! Active Video
//!
//! Playback state of the video slide (if any) and the forwarding of media
//! element events to the host. Decoding is the surface's business; the engine
//! only issues [`VideoOp`]s and mirrors what the media element reports.
//!
//! Controls issued while no video is loaded are silent no-ops.

use crate::notifications::{HostNotification, Notifier};
use crate::surface::{MediaEvent, RenderSurface, SurfaceOp, VideoOp};

/// Container formats probed by `getSupportedVideoFormats`: extension → media type
pub const VIDEO_FORMAT_CANDIDATES: &[(&str, &str)] = &[
    ("mp4", "video/mp4"),
    ("webm", "video/webm"),
    ("ogg", "video/ogg"),
    ("ogv", "video/ogg"),
    ("mov", "video/quicktime"),
    ("mkv", "video/x-matroska"),
];

/// Extensions of the candidate formats the surface can play
#[must_use]
pub fn supported_formats(surface: &dyn RenderSurface) -> Vec<String> {
    VIDEO_FORMAT_CANDIDATES
        .iter()
        .filter(|(_, mime)| surface.supports_media_type(mime))
        .map(|(ext, _)| (*ext).to_string())
        .collect()
}

/// Mirror of the media element
#[derive(Clone, Debug, PartialEq)]
pub struct VideoState {
    src: Option<String>,
    playing: bool,
    muted: bool,
    volume: f64,
    rate: f64,
    duration: Option<f64>,
    position: f64,
}

impl Default for VideoState {
    fn default() -> Self {
        Self {
            src: None,
            playing: false,
            muted: false,
            volume: 1.0,
            rate: 1.0,
            duration: None,
            position: 0.0,
        }
    }
}

impl VideoState {
    /// Nothing loaded, full volume, normal rate
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loaded source
    #[must_use]
    pub fn src(&self) -> Option<&str> {
        self.src.as_deref()
    }

    /// Whether a video is loaded
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.src.is_some()
    }

    /// Whether playback is running
    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Whether muted
    #[must_use]
    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// Volume in `[0, 1]`
    #[must_use]
    pub fn volume(&self) -> f64 {
        self.volume
    }

    /// Playback rate
    #[must_use]
    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Duration reported by the media element
    #[must_use]
    pub fn duration(&self) -> Option<f64> {
        self.duration
    }

    /// Last reported position
    #[must_use]
    pub fn position(&self) -> f64 {
        self.position
    }

    /// Attach `src`, keeping the mute/volume/rate preferences
    pub fn load(&mut self, src: &str, surface: &mut dyn RenderSurface) {
        self.src = Some(src.to_string());
        self.playing = false;
        self.duration = None;
        self.position = 0.0;
        surface.apply(SurfaceOp::Video {
            command: VideoOp::Load {
                src: src.to_string(),
                looping: false,
                muted: self.muted,
            },
        });
        surface.apply(SurfaceOp::Video {
            command: VideoOp::SetVolume { level: self.volume },
        });
        tracing::debug!(src, "Video loaded");
    }

    /// Detach the current source, if any
    pub fn unload(&mut self, surface: &mut dyn RenderSurface) {
        if self.src.take().is_some() {
            self.playing = false;
            self.duration = None;
            self.position = 0.0;
            surface.apply(SurfaceOp::Video {
                command: VideoOp::Unload,
            });
        }
    }

    /// Start or resume playback
    pub fn play(&mut self, surface: &mut dyn RenderSurface) {
        if self.issue("play", VideoOp::Play, surface) {
            self.playing = true;
        }
    }

    /// Pause playback
    pub fn pause(&mut self, surface: &mut dyn RenderSurface) {
        if self.issue("pause", VideoOp::Pause, surface) {
            self.playing = false;
        }
    }

    /// Pause and rewind
    pub fn stop(&mut self, surface: &mut dyn RenderSurface) {
        if self.issue("stop", VideoOp::Stop, surface) {
            self.playing = false;
            self.position = 0.0;
        }
    }

    /// Jump to `seconds` (negative values clamp to the start)
    pub fn seek(&mut self, seconds: f64, surface: &mut dyn RenderSurface) {
        let seconds = if seconds.is_finite() { seconds.max(0.0) } else { 0.0 };
        if self.issue("seek", VideoOp::Seek { seconds }, surface) {
            self.position = seconds;
        }
    }

    /// Change the playback rate; the caller validates `rate`
    pub fn set_rate(&mut self, rate: f64, surface: &mut dyn RenderSurface) {
        if self.issue("setRate", VideoOp::SetRate { rate }, surface) {
            self.rate = rate;
        }
    }

    /// Change the volume, clamped to `[0, 1]`
    pub fn set_volume(&mut self, level: f64, surface: &mut dyn RenderSurface) {
        let level = if level.is_nan() { 0.0 } else { level.clamp(0.0, 1.0) };
        if self.issue("setVolume", VideoOp::SetVolume { level }, surface) {
            self.volume = level;
        }
    }

    /// Flip the mute state
    pub fn toggle_mute(&mut self, surface: &mut dyn RenderSurface) {
        let muted = !self.muted;
        if self.issue("toggleMute", VideoOp::SetMuted { muted }, surface) {
            self.muted = muted;
        }
    }

    /// Mirror a media element event and forward it to the host
    pub fn on_media_event(&mut self, event: MediaEvent, notifier: &Notifier) {
        let notification = match event {
            MediaEvent::DurationChanged { seconds } => {
                self.duration = Some(seconds);
                HostNotification::DurationChanged { seconds }
            }
            MediaEvent::PositionChanged { seconds } => {
                self.position = seconds;
                HostNotification::PositionChanged { seconds }
            }
            MediaEvent::VolumeChanged { level } => {
                self.volume = level;
                HostNotification::VolumeChanged { level }
            }
            MediaEvent::RateChanged { rate } => {
                self.rate = rate;
                HostNotification::RateChanged { rate }
            }
            MediaEvent::Ended => {
                self.playing = false;
                HostNotification::PlaybackEnded
            }
            MediaEvent::MuteChanged { muted } => {
                self.muted = muted;
                HostNotification::MuteChanged { muted }
            }
            MediaEvent::Error { message } => {
                tracing::warn!(%message, src = ?self.src, "Media error");
                self.playing = false;
                HostNotification::MediaError { message }
            }
        };
        notifier.notify(notification);
    }

    fn issue(&self, command: &str, op: VideoOp, surface: &mut dyn RenderSurface) -> bool {
        if self.src.is_none() {
            tracing::debug!(command, "No video loaded; ignoring");
            return false;
        }
        surface.apply(SurfaceOp::Video { command: op });
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifications;
    use crate::surface::RecordingSurface;

    #[test]
    fn test_controls_without_video_are_noops() {
        let mut video = VideoState::new();
        let mut surface = RecordingSurface::new();

        video.play(&mut surface);
        video.seek(10.0, &mut surface);
        video.set_volume(0.5, &mut surface);
        video.toggle_mute(&mut surface);
        video.unload(&mut surface);

        assert!(surface.is_empty());
        assert!(!video.is_playing());
        assert!(!video.is_muted());
    }

    #[test]
    fn test_controls_with_video() {
        let mut video = VideoState::new();
        let mut surface = RecordingSurface::new();
        video.load("display-res:///clip.mp4", &mut surface);
        surface.take();

        video.play(&mut surface);
        assert!(video.is_playing());

        video.set_volume(3.0, &mut surface);
        assert!((video.volume() - 1.0).abs() < f64::EPSILON);
        video.set_volume(-1.0, &mut surface);
        assert!(video.volume().abs() < f64::EPSILON);

        video.toggle_mute(&mut surface);
        assert!(video.is_muted());

        video.seek(-4.0, &mut surface);
        assert_eq!(
            surface.last(),
            Some(SurfaceOp::Video {
                command: VideoOp::Seek { seconds: 0.0 }
            })
        );

        video.stop(&mut surface);
        assert!(!video.is_playing());

        video.unload(&mut surface);
        assert!(!video.is_loaded());
        assert_eq!(
            surface.last(),
            Some(SurfaceOp::Video {
                command: VideoOp::Unload
            })
        );
    }

    #[test]
    fn test_media_events_are_forwarded() {
        let mut video = VideoState::new();
        let (notifier, mut rx) = notifications::channel(8);

        video.on_media_event(MediaEvent::DurationChanged { seconds: 90.0 }, &notifier);
        video.on_media_event(MediaEvent::Ended, &notifier);
        video.on_media_event(
            MediaEvent::Error {
                message: "decode failed".to_string(),
            },
            &notifier,
        );

        assert_eq!(video.duration(), Some(90.0));
        assert_eq!(
            rx.try_recv().unwrap(),
            HostNotification::DurationChanged { seconds: 90.0 }
        );
        assert_eq!(rx.try_recv().unwrap(), HostNotification::PlaybackEnded);
        assert_eq!(
            rx.try_recv().unwrap(),
            HostNotification::MediaError {
                message: "decode failed".to_string()
            }
        );
    }

    #[test]
    fn test_supported_formats_probe_surface() {
        let surface = RecordingSurface::new().with_media_types(["video/mp4", "video/ogg"]);
        assert_eq!(supported_formats(&surface), vec!["mp4", "ogg", "ogv"]);
    }
}
