use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    // ========================================================================
    // Contract Violations
    // ========================================================================
    /// A platform surface raised a button the core does not model.
    #[error("Unrecognized transport button: {0}")]
    UnrecognizedButton(String),

    #[error("Playlist index {index} out of range (len {len})")]
    IndexOutOfRange { index: usize, len: usize },

    // ========================================================================
    // State Preconditions
    // ========================================================================
    #[error("No song selected")]
    NothingSelected,

    #[error("No playlist source bound")]
    NoSourceBound,

    // ========================================================================
    // Lower Layers
    // ========================================================================
    #[error("Library error: {0}")]
    Library(#[from] core_library::LibraryError),

    #[error("Playback error: {0}")]
    Playback(#[from] core_playback::PlaybackError),

    #[error("Runtime error: {0}")]
    Runtime(#[from] core_runtime::Error),

    #[error("Bridge error: {0}")]
    Bridge(#[from] bridge_traits::BridgeError),
}

impl CoreError {
    /// Unmodeled input: unknown roll mode, unknown source kind, unknown
    /// transport button, or an index the caller had no business passing.
    pub fn is_contract_violation(&self) -> bool {
        match self {
            CoreError::UnrecognizedButton(_) | CoreError::IndexOutOfRange { .. } => true,
            CoreError::Library(err) => err.is_contract_violation(),
            CoreError::Bridge(bridge_traits::BridgeError::UnknownButton(_)) => true,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
