//! # Host Bridge Traits
//!
//! Contracts between the playback core and the host platform.
//!
//! ## Traits
//!
//! - [`TransportControlSurface`](transport::TransportControlSurface) - the platform
//!   "now playing" surface (media keys, lock screen)
//! - [`OutputDeviceEnumerator`](device::OutputDeviceEnumerator) - lists audio
//!   output devices a backend can render to
//! - [`LoggerSink`](log::LoggerSink) - forwards structured logs to host logging
//!
//! ## Error Handling
//!
//! All bridge traits use [`BridgeError`](error::BridgeError). Platform
//! implementations convert their native errors into it and keep messages
//! actionable.
//!
//! ## Thread Safety
//!
//! Bridge traits require `Send + Sync` on native targets (via
//! [`PlatformSendSync`](platform::PlatformSendSync)) so the core can hold them
//! behind `Arc` and call them from spawned tasks.

pub mod device;
pub mod error;
pub mod log;
pub mod platform;
pub mod transport;

pub use error::BridgeError;

pub use device::{NativeDeviceHandle, OutputDevice, OutputDeviceEnumerator};
pub use log::{ConsoleLogger, LogEntry, LogLevel, LoggerSink};
pub use transport::{
    NowPlayingMetadata, TimelineProperties, TransportButton, TransportControlSurface,
    TransportRequest, TransportStatus,
};
