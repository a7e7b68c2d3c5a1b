//! # Player Configuration
//!
//! Tunables for the playback core, its reference backend and the
//! transport-control adapter.
//!
//! Every field has a serde default, so a host can persist only what the user
//! changed:
//!
//! ```rust
//! use core_runtime::config::PlayerConfig;
//!
//! let config = PlayerConfig::from_json_str(r#"{ "sync_transport_position": true }"#).unwrap();
//! assert!(config.sync_transport_position);
//! assert_eq!(config.default_volume, 50);
//! ```
//!
//! Validation is fail-fast: an out-of-range value is rejected when the
//! configuration is built, not when the backend first trips over it.

use core_library::models::RollMode;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::events::DEFAULT_EVENT_BUFFER_SIZE;

/// Volume that maps to unity gain.
pub const UNITY_VOLUME: u32 = 50;
/// Playback rate that maps to 1.0x speed.
pub const UNITY_PLAYBACK_RATE: u32 = 10;
pub const MAX_VOLUME: u32 = 100;
pub const MAX_PLAYBACK_RATE: u32 = 40;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerConfig {
    /// Broadcast buffer of the event bus.
    ///
    /// Default: 256 events.
    #[serde(default = "default_event_buffer_size")]
    pub event_buffer_size: usize,

    /// Interval of the backend's position poll while playing.
    ///
    /// Default: 500 ms.
    #[serde(default = "default_position_poll_interval")]
    pub position_poll_interval: Duration,

    /// Superseded render nodes are swept every this many poll ticks.
    ///
    /// Default: 4.
    #[serde(default = "default_sweep_every_ticks")]
    pub sweep_every_ticks: u32,

    /// Minimum movement between two polls before a position change is
    /// published.
    ///
    /// Default: 10 ms.
    #[serde(default = "default_position_epsilon")]
    pub position_epsilon: Duration,

    /// Initial volume, 0-100. Gain is `volume / 50`.
    ///
    /// Default: 50.
    #[serde(default = "default_volume")]
    pub default_volume: u32,

    /// Initial playback rate, 1-40. Speed is `rate / 10`.
    ///
    /// Default: 10.
    #[serde(default = "default_playback_rate")]
    pub default_playback_rate: u32,

    #[serde(default)]
    pub default_roll_mode: RollMode,

    /// Mirror playback state onto the platform transport surface.
    ///
    /// Default: true.
    #[serde(default = "default_true")]
    pub sync_transport: bool,

    /// Also push the position timeline to the transport surface.
    ///
    /// Default: false.
    #[serde(default)]
    pub sync_transport_position: bool,

    /// Advance to the next song and play it when media ends.
    ///
    /// Default: true.
    #[serde(default = "default_true")]
    pub auto_advance: bool,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            event_buffer_size: default_event_buffer_size(),
            position_poll_interval: default_position_poll_interval(),
            sweep_every_ticks: default_sweep_every_ticks(),
            position_epsilon: default_position_epsilon(),
            default_volume: default_volume(),
            default_playback_rate: default_playback_rate(),
            default_roll_mode: RollMode::default(),
            sync_transport: true,
            sync_transport_position: false,
            auto_advance: true,
        }
    }
}

impl PlayerConfig {
    /// Parse a JSON document and validate it.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| Error::Config(format!("Invalid player configuration: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_event_buffer_size(mut self, size: usize) -> Self {
        self.event_buffer_size = size;
        self
    }

    pub fn with_position_poll_interval(mut self, interval: Duration) -> Self {
        self.position_poll_interval = interval;
        self
    }

    pub fn with_sweep_every_ticks(mut self, ticks: u32) -> Self {
        self.sweep_every_ticks = ticks;
        self
    }

    pub fn with_position_epsilon(mut self, epsilon: Duration) -> Self {
        self.position_epsilon = epsilon;
        self
    }

    pub fn with_default_volume(mut self, volume: u32) -> Self {
        self.default_volume = volume;
        self
    }

    pub fn with_default_playback_rate(mut self, rate: u32) -> Self {
        self.default_playback_rate = rate;
        self
    }

    pub fn with_default_roll_mode(mut self, mode: RollMode) -> Self {
        self.default_roll_mode = mode;
        self
    }

    pub fn with_sync_transport(mut self, enabled: bool) -> Self {
        self.sync_transport = enabled;
        self
    }

    pub fn with_sync_transport_position(mut self, enabled: bool) -> Self {
        self.sync_transport_position = enabled;
        self
    }

    pub fn with_auto_advance(mut self, enabled: bool) -> Self {
        self.auto_advance = enabled;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.event_buffer_size == 0 {
            return Err(Error::Config("event_buffer_size must be > 0".to_string()));
        }

        if self.position_poll_interval < Duration::from_millis(10) {
            return Err(Error::Config(
                "position_poll_interval must be at least 10ms".to_string(),
            ));
        }

        if self.sweep_every_ticks == 0 {
            return Err(Error::Config("sweep_every_ticks must be >= 1".to_string()));
        }

        if self.default_volume > MAX_VOLUME {
            return Err(Error::Config(format!(
                "default_volume {} exceeds {MAX_VOLUME}",
                self.default_volume
            )));
        }

        if !(1..=MAX_PLAYBACK_RATE).contains(&self.default_playback_rate) {
            return Err(Error::Config(format!(
                "default_playback_rate {} must be between 1 and {MAX_PLAYBACK_RATE}",
                self.default_playback_rate
            )));
        }

        Ok(())
    }
}

fn default_event_buffer_size() -> usize {
    DEFAULT_EVENT_BUFFER_SIZE
}

fn default_position_poll_interval() -> Duration {
    Duration::from_millis(500)
}

fn default_sweep_every_ticks() -> u32 {
    4
}

fn default_position_epsilon() -> Duration {
    Duration::from_millis(10)
}

fn default_volume() -> u32 {
    UNITY_VOLUME
}

fn default_playback_rate() -> u32 {
    UNITY_PLAYBACK_RATE
}

fn default_true() -> bool {
    true
}
