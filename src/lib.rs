//! Workspace facade crate.
//!
//! Re-exports the playback core so a host can depend on
//! `playcore-workspace` alone. The `service` feature (on by default) pulls in
//! `core-service` and `core-playback`.

#[cfg(feature = "service")]
pub use core_playback as playback;
#[cfg(feature = "service")]
pub use core_service as service;
