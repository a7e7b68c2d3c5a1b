//! # Playback Error Types

use bridge_traits::error::BridgeError;
use thiserror::Error;

use crate::graph::engine::{DeviceNodeCreationStatus, GraphCreationStatus, InputNodeCreationStatus};
use crate::traits::Capability;

/// Errors that can occur during playback operations.
#[derive(Error, Debug)]
pub enum PlaybackError {
    // ========================================================================
    // Backend State
    // ========================================================================
    /// The backend could not allocate its resources; carries the last error.
    #[error("Playback backend unavailable: {0}")]
    BackendUnavailable(String),

    /// The backend does not advertise the capability.
    #[error("Operation not supported by this backend: {0}")]
    Unsupported(Capability),

    // ========================================================================
    // Graph Construction
    // ========================================================================
    #[error("Audio graph creation failed: {0}")]
    GraphCreation(GraphCreationStatus),

    #[error("Output node creation failed: {0}")]
    OutputNodeCreation(DeviceNodeCreationStatus),

    #[error("Media input node creation failed: {0}")]
    InputNodeCreation(InputNodeCreationStatus),

    // ========================================================================
    // Devices
    // ========================================================================
    #[error("Output device enumeration failed: {0}")]
    DeviceEnumeration(#[from] BridgeError),

    // ========================================================================
    // Control Values
    // ========================================================================
    #[error("Invalid volume: {0} (must be between 0 and 100)")]
    InvalidVolume(u32),

    #[error("Invalid playback rate: {0} (must be between 1 and 40)")]
    InvalidPlaybackRate(u32),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl PlaybackError {
    /// Returns `true` if retrying the same call may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            PlaybackError::InputNodeCreation(InputNodeCreationStatus::NetworkError)
                | PlaybackError::GraphCreation(GraphCreationStatus::DeviceNotAvailable)
                | PlaybackError::OutputNodeCreation(DeviceNodeCreationStatus::DeviceNotAvailable)
        )
    }

    /// Returns `true` if the media itself cannot be rendered.
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            PlaybackError::GraphCreation(GraphCreationStatus::FormatNotSupported)
                | PlaybackError::OutputNodeCreation(DeviceNodeCreationStatus::FormatNotSupported)
                | PlaybackError::InputNodeCreation(InputNodeCreationStatus::FormatNotSupported)
        )
    }
}

/// Result type for playback operations.
pub type Result<T> = std::result::Result<T, PlaybackError>;
