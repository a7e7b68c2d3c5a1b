//! # Playback Backends
//!
//! The rendering side of the player.
//!
//! ## Overview
//!
//! - [`traits::PlaybackBackend`]: the contract the playback core drives
//! - [`graph::AudioGraphBackend`]: renders through a host audio-graph engine,
//!   with an effect chain on the output node and a position poll task
//! - [`null::NullBackend`]: renders nothing, for headless hosts
//!
//! Backends publish their lifecycle as [`PlaybackEvent`](core_runtime::PlaybackEvent)s
//! on the shared event bus and expose status through a watch channel.

pub mod error;
pub mod graph;
pub mod null;
pub mod traits;

pub use error::{PlaybackError, Result};
pub use graph::AudioGraphBackend;
pub use null::{BackendCall, NullBackend};
pub use traits::{
    BackendCapabilities, BackendStatus, Capability, LoadOutcome, PlayState, PlaybackBackend,
};
