//! Error types for playback sequencing

use thiserror::Error;

/// Playback errors
///
/// Renderer failures never reach callers through this type: the sequencer
/// absorbs them and reports them as callback events. These variants cover
/// contract violations by the caller.
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// No track list has been assigned yet
    #[error("No track list assigned")]
    NoTrackList,

    /// The assigned track list is empty
    #[error("Track list is empty")]
    EmptyTrackList,

    /// Index out of bounds
    #[error("Index out of bounds: {index} (track count {len})")]
    IndexOutOfBounds { index: usize, len: usize },

    /// No track has been prepared by the renderer
    #[error("Player is not ready")]
    NotReady,

    /// A track load is in flight
    #[error("A track is currently loading")]
    LoadInProgress,

    /// The operation needs playback to be stopped first
    #[error("Playback is active")]
    PlaybackActive,

    /// Seek percentage outside 0-100
    #[error("Invalid seek percentage: {0}")]
    InvalidSeekPercent(u8),

    /// Initial state can only be applied before the first track is prepared
    #[error("Session already started")]
    AlreadyStarted,

    /// Renderer rejected a command
    #[error("Renderer error: {0}")]
    Renderer(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PlaybackError {
    /// Create a renderer error
    pub fn renderer(msg: impl Into<String>) -> Self {
        Self::Renderer(msg.into())
    }
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;
