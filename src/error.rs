//! Error handling for Nebula
//!
//! Every failure in the audio subsystem is one of two kinds: the platform
//! cannot give us an audio context at all, or a single operation on a live
//! context went wrong. Components catch both at their public surface.

use thiserror::Error;

/// Result type alias for Nebula operations
pub type Result<T> = std::result::Result<T, NebulaError>;

/// Main error type for Nebula operations
#[derive(Error, Debug)]
pub enum NebulaError {
    // Platform Errors
    #[error("Audio unavailable: {reason}")]
    Unavailable { reason: String },

    // Context Errors
    #[error("Audio context is closed")]
    ContextClosed,

    #[error("Invalid state for {operation}: {state}")]
    InvalidState { operation: String, state: String },

    #[error("Source {index} is already stopped")]
    SourceAlreadyStopped { index: usize },

    #[error("Unknown source handle: {index}")]
    UnknownSource { index: usize },

    #[error("Unknown gain bus: {index}")]
    UnknownBus { index: usize },

    #[error("Invalid parameter: {param} = {value} (valid range: {min}..{max})")]
    InvalidParameter {
        param: String,
        value: f64,
        min: f64,
        max: f64,
    },

    // Output Errors
    #[error("Unsupported audio format: {format}")]
    UnsupportedFormat { format: String },

    #[error("Failed to write audio file: {path}")]
    AudioWriteError {
        path: String,
        #[source]
        source: hound::Error,
    },

    #[error("Nothing to render: {reason}")]
    NothingToRender { reason: String },

    // I/O Errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization Errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl NebulaError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            NebulaError::Unavailable { .. } => "AUDIO_UNAVAILABLE",
            NebulaError::ContextClosed => "CONTEXT_CLOSED",
            NebulaError::InvalidState { .. } => "INVALID_STATE",
            NebulaError::SourceAlreadyStopped { .. } => "SOURCE_ALREADY_STOPPED",
            NebulaError::UnknownSource { .. } => "UNKNOWN_SOURCE",
            NebulaError::UnknownBus { .. } => "UNKNOWN_BUS",
            NebulaError::InvalidParameter { .. } => "INVALID_PARAMETER",
            NebulaError::UnsupportedFormat { .. } => "UNSUPPORTED_FORMAT",
            NebulaError::AudioWriteError { .. } => "AUDIO_WRITE_ERROR",
            NebulaError::NothingToRender { .. } => "NOTHING_TO_RENDER",
            NebulaError::Io(_) => "IO_ERROR",
            NebulaError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Check if this error leaves the session usable
    ///
    /// Unavailability is permanent for a session; everything else only
    /// affects the one operation that raised it.
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            NebulaError::Unavailable { .. } | NebulaError::ContextClosed
        )
    }

    /// Returns a suggested recovery action for this error
    pub fn recovery_hint(&self) -> &'static str {
        match self {
            Self::Unavailable { .. } => "Audio stays off for this session; the page works without it",
            Self::ContextClosed => "Mount the component again to get a fresh audio context",
            Self::InvalidState { .. } => "Stop the source before starting it again",
            Self::SourceAlreadyStopped { .. } => "Nothing to do, the source is already silent",
            Self::InvalidParameter { .. } => "Adjust the parameter to be within valid range",
            Self::UnsupportedFormat { .. } => "Use 16, 24 or 32-bit WAV output",
            Self::AudioWriteError { .. } => "Check that the output directory exists and is writable",
            Self::NothingToRender { .. } => "Enable the component or use a platform with audio",
            _ => "Check the error details and try again",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = NebulaError::Unavailable {
            reason: "blocked".to_string(),
        };
        assert_eq!(err.error_code(), "AUDIO_UNAVAILABLE");
        assert_eq!(NebulaError::ContextClosed.error_code(), "CONTEXT_CLOSED");
    }

    #[test]
    fn test_recoverability() {
        assert!(NebulaError::SourceAlreadyStopped { index: 3 }.is_recoverable());
        assert!(!NebulaError::ContextClosed.is_recoverable());
        assert!(!NebulaError::Unavailable {
            reason: "no device".to_string()
        }
        .is_recoverable());
    }

    #[test]
    fn test_display_includes_range() {
        let err = NebulaError::InvalidParameter {
            param: "volume".to_string(),
            value: 1.5,
            min: 0.0,
            max: 1.0,
        };
        let msg = err.to_string();
        assert!(msg.contains("volume"));
        assert!(msg.contains("1.5"));
        assert!(!err.recovery_hint().is_empty());
    }
}
