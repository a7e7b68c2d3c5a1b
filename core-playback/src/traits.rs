//! # Playback Backend Contract
//!
//! The interface every rendering backend implements. The playback core only
//! ever talks to a `dyn PlaybackBackend` handed to it at construction; the
//! audio-graph backend and the null backend are two variants of it.
//!
//! ## State Machine
//!
//! ```text
//!            load ok                play
//!   None ──────────────> Loaded ─────────> Playing <──┐
//!    ^        ┌───────────> ^                │ pause   │ play
//!    │ stop   │ load ok     │                v         │
//!   any    Loading ─────> Failed           Paused ─────┘
//!           ^  load err
//!           └── load (from any state)
//! ```
//!
//! Status is observable through a `tokio::sync::watch` channel, so UI layers
//! can bind to it without polling.

use async_trait::async_trait;
use bridge_traits::device::OutputDevice;
use core_library::models::MediaSource;
use core_runtime::config::{UNITY_PLAYBACK_RATE, UNITY_VOLUME};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tokio::sync::watch;

use crate::error::{PlaybackError, Result};

// ============================================================================
// Capabilities
// ============================================================================

/// One operation a backend may or may not support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Capability {
    Load,
    Play,
    Pause,
    Stop,
    Seek,
    Volume,
    PlaybackRate,
    BackgroundPlay,
    DeviceSwitch,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// What a backend advertises.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendCapabilities {
    pub load: bool,
    pub play: bool,
    pub pause: bool,
    pub stop: bool,
    pub seek: bool,
    pub volume: bool,
    pub playback_rate: bool,
    pub background_play: bool,
    pub device_switch: bool,
}

impl BackendCapabilities {
    pub fn all() -> Self {
        Self {
            load: true,
            play: true,
            pause: true,
            stop: true,
            seek: true,
            volume: true,
            playback_rate: true,
            background_play: true,
            device_switch: true,
        }
    }

    pub fn supports(&self, capability: Capability) -> bool {
        match capability {
            Capability::Load => self.load,
            Capability::Play => self.play,
            Capability::Pause => self.pause,
            Capability::Stop => self.stop,
            Capability::Seek => self.seek,
            Capability::Volume => self.volume,
            Capability::PlaybackRate => self.playback_rate,
            Capability::BackgroundPlay => self.background_play,
            Capability::DeviceSwitch => self.device_switch,
        }
    }

    /// `Err(Unsupported)` unless the capability is advertised.
    pub fn require(&self, capability: Capability) -> Result<()> {
        if self.supports(capability) {
            Ok(())
        } else {
            Err(PlaybackError::Unsupported(capability))
        }
    }
}

// ============================================================================
// Status
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayState {
    /// Nothing loaded.
    #[default]
    None,
    Loading,
    Loaded,
    Paused,
    Playing,
    Failed,
}

impl PlayState {
    /// Whether the backend state machine has an edge from `self` to `next`.
    pub fn can_transition_to(self, next: PlayState) -> bool {
        use PlayState::*;
        match (self, next) {
            (_, None) | (_, Loading) => true,
            (Loading, Loaded) | (Loading, Failed) | (None, Loaded) => true,
            (Loaded, Playing) | (Loaded, Paused) => true,
            (Playing, Paused) | (Paused, Playing) => true,
            (a, b) => a == b,
        }
    }

    pub fn has_media(self) -> bool {
        matches!(self, PlayState::Loaded | PlayState::Paused | PlayState::Playing)
    }
}

/// Observable backend status.
///
/// `volume` and `playback_rate` are the values the user asked for; the
/// backend propagates them into the live nodes as `gain()` and `speed()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendStatus {
    pub play_state: PlayState,
    pub position: Duration,
    pub duration: Duration,
    pub buffering: bool,
    /// 0-100, 50 is unity gain.
    pub volume: u32,
    /// 1-40, 10 is 1.0x.
    pub playback_rate: u32,
}

impl Default for BackendStatus {
    fn default() -> Self {
        Self {
            play_state: PlayState::None,
            position: Duration::ZERO,
            duration: Duration::ZERO,
            buffering: false,
            volume: UNITY_VOLUME,
            playback_rate: UNITY_PLAYBACK_RATE,
        }
    }
}

impl BackendStatus {
    pub fn with_levels(volume: u32, playback_rate: u32) -> Self {
        Self {
            volume,
            playback_rate,
            ..Self::default()
        }
    }

    pub fn gain(&self) -> f64 {
        f64::from(self.volume) / f64::from(UNITY_VOLUME)
    }

    pub fn speed(&self) -> f64 {
        f64::from(self.playback_rate) / f64::from(UNITY_PLAYBACK_RATE)
    }
}

/// Result of a successful `load`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// New media is loaded and paused at the start.
    Loaded,
    /// `load(None)` released the current media.
    Unloaded,
}

// ============================================================================
// Backend Trait
// ============================================================================

/// A playback backend.
///
/// Failures of resource construction are also recorded as
/// [`last_error`](Self::last_error), move the state to `Failed` and emit a
/// failed event before the error is returned. Calls that arrive with nothing
/// loaded (play, pause, seek) are benign no-ops.
#[async_trait]
pub trait PlaybackBackend: Send + Sync {
    /// Stable identifier, for logs and settings.
    fn id(&self) -> &str;

    fn capabilities(&self) -> BackendCapabilities;

    /// Snapshot of the current status.
    fn status(&self) -> BackendStatus;

    fn watch_status(&self) -> watch::Receiver<BackendStatus>;

    /// `false` once initialization or a device switch has failed.
    fn is_available(&self) -> bool;

    fn last_error(&self) -> Option<String>;

    /// Devices found by the last [`refresh_output_devices`](Self::refresh_output_devices).
    fn output_devices(&self) -> Vec<OutputDevice>;

    async fn initialize(&self) -> Result<()>;

    /// Load media, or release the current media with `None`.
    async fn load(&self, media: Option<MediaSource>) -> Result<LoadOutcome>;

    async fn play(&self) -> Result<()>;

    async fn pause(&self) -> Result<()>;

    async fn stop(&self) -> Result<()>;

    async fn seek(&self, position: Duration) -> Result<()>;

    /// 0-100.
    async fn set_volume(&self, volume: u32) -> Result<()>;

    /// 1-40.
    async fn set_playback_rate(&self, rate: u32) -> Result<()>;

    /// Rebuild against another output device and reload the current media.
    async fn change_output_device(&self, device: OutputDevice) -> Result<()>;

    async fn refresh_output_devices(&self) -> Result<Vec<OutputDevice>>;

    async fn switch_background(&self) -> Result<()>;
}

/// Check a requested volume against the 0-100 range.
pub fn validate_volume(volume: u32) -> Result<()> {
    if volume > core_runtime::config::MAX_VOLUME {
        return Err(PlaybackError::InvalidVolume(volume));
    }
    Ok(())
}

/// Check a requested rate against the 1-40 range.
pub fn validate_playback_rate(rate: u32) -> Result<()> {
    if !(1..=core_runtime::config::MAX_PLAYBACK_RATE).contains(&rate) {
        return Err(PlaybackError::InvalidPlaybackRate(rate));
    }
    Ok(())
}
