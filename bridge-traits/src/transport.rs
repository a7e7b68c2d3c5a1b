//! Transport-Control Surface
//!
//! The platform's "now playing" integration: lock-screen widgets, media keys,
//! MPRIS on Linux, SMTC on Windows, `MPNowPlayingInfoCenter` on Apple targets.
//! The core pushes metadata and status into it and receives button presses and
//! seek requests back as [`TransportRequest`] values.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::{
    error::{BridgeError, Result},
    platform::PlatformSendSync,
};

/// Buttons the core knows how to act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransportButton {
    Play,
    Pause,
    Stop,
    Next,
    Previous,
}

impl TransportButton {
    pub const ALL: [TransportButton; 5] = [
        TransportButton::Play,
        TransportButton::Pause,
        TransportButton::Stop,
        TransportButton::Next,
        TransportButton::Previous,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TransportButton::Play => "play",
            TransportButton::Pause => "pause",
            TransportButton::Stop => "stop",
            TransportButton::Next => "next",
            TransportButton::Previous => "previous",
        }
    }
}

impl fmt::Display for TransportButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransportButton {
    type Err = BridgeError;

    /// Parses the platform's button name. Anything the core does not model
    /// (record, fast-forward, channel up...) is rejected.
    fn from_str(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "play" => Ok(TransportButton::Play),
            "pause" => Ok(TransportButton::Pause),
            "stop" => Ok(TransportButton::Stop),
            "next" => Ok(TransportButton::Next),
            "previous" => Ok(TransportButton::Previous),
            _ => Err(BridgeError::UnknownButton(raw.to_string())),
        }
    }
}

/// A request raised by the platform surface.
///
/// Button names are carried raw so that an unmodeled platform signal reaches
/// the adapter instead of being dropped at the bridge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransportRequest {
    Button(String),
    /// Absolute position to seek to.
    Seek(Duration),
}

impl TransportRequest {
    pub fn button(button: TransportButton) -> Self {
        TransportRequest::Button(button.as_str().to_string())
    }
}

/// Playback status flag mirrored on the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransportStatus {
    Playing,
    Paused,
    Stopped,
}

/// Metadata shown for the current item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NowPlayingMetadata {
    pub title: String,
    /// Artist names, already joined for display.
    pub artist: String,
    pub album_title: String,
    pub duration: Duration,
}

/// Seekable range and position shown on the surface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineProperties {
    pub start: Duration,
    pub end: Duration,
    pub min_seek: Duration,
    pub max_seek: Duration,
    pub position: Duration,
}

impl TimelineProperties {
    /// A fresh timeline spanning `duration`, positioned at the start.
    pub fn spanning(duration: Duration) -> Self {
        Self {
            start: Duration::ZERO,
            end: duration,
            min_seek: Duration::ZERO,
            max_seek: duration,
            position: Duration::ZERO,
        }
    }

    pub fn with_position(mut self, position: Duration) -> Self {
        self.position = position.min(self.end);
        self
    }
}

/// Platform "now playing" surface.
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
pub trait TransportControlSurface: PlatformSendSync {
    /// Enable the listed buttons; buttons not listed are disabled.
    async fn set_enabled_buttons(&self, buttons: Vec<TransportButton>) -> Result<()>;

    async fn update_metadata(&self, metadata: NowPlayingMetadata) -> Result<()>;

    /// Replace the thumbnail with encoded image bytes.
    async fn update_thumbnail(&self, image: Bytes) -> Result<()>;

    async fn update_timeline(&self, timeline: TimelineProperties) -> Result<()>;

    async fn set_playback_status(&self, status: TransportStatus) -> Result<()>;
}
