//! # Core Runtime Module
//!
//! Runtime infrastructure shared by the playback crates:
//! - Event bus carrying playback and playlist events
//! - Player configuration with fail-fast validation
//! - Logging and tracing bootstrap
//!
//! ## Overview
//!
//! Nothing here knows about audio. The backend and the playback core publish
//! into the [`events::EventBus`]; adapters and UI layers subscribe to it.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use config::PlayerConfig;
pub use error::{Error, Result};
pub use events::{CoreEvent, EventBus, EventStream, PlaybackEvent, PlaylistEvent};
