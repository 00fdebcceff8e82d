//! Error types shared across StoryReel crates.

/// Top-level error type for StoryReel operations.
#[derive(Debug, thiserror::Error)]
pub enum StoryError {
    /// Caller-controlled input was unusable (empty narration, empty frame
    /// sequence, out-of-order frames). Never retried.
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    /// A frame was requested at a size that is not one of the presets.
    #[error("Unsupported resolution: {width}x{height}")]
    UnsupportedResolution { width: u32, height: u32 },

    /// An encoding strategy failed. `strategy` names the strategy that ran.
    #[error("Encoding error ({strategy}): {message}")]
    Encoding { strategy: String, message: String },

    #[error("Export cancelled")]
    Cancelled,

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using StoryError.
pub type StoryResult<T> = Result<T, StoryError>;

impl StoryError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: msg.into(),
        }
    }

    pub fn unsupported_resolution(width: u32, height: u32) -> Self {
        Self::UnsupportedResolution { width, height }
    }

    pub fn encoding(strategy: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Encoding {
            strategy: strategy.into(),
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Whether this is a strategy-level encoding failure (the only kind the
    /// encoder pipeline recovers from).
    pub fn is_encoding(&self) -> bool {
        matches!(self, Self::Encoding { .. })
    }

    /// Name of the strategy that failed, for encoding errors.
    pub fn strategy(&self) -> Option<&str> {
        match self {
            Self::Encoding { strategy, .. } => Some(strategy),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoding_error_carries_strategy() {
        let err = StoryError::encoding("streaming-container", "recorder refused bitrate");
        assert!(err.is_encoding());
        assert_eq!(err.strategy(), Some("streaming-container"));
        assert_eq!(
            err.to_string(),
            "Encoding error (streaming-container): recorder refused bitrate"
        );
    }

    #[test]
    fn test_non_encoding_errors_have_no_strategy() {
        let err = StoryError::invalid_input("narration is empty");
        assert!(!err.is_encoding());
        assert_eq!(err.strategy(), None);
        assert!(!StoryError::Cancelled.is_encoding());
    }

    #[test]
    fn test_unsupported_resolution_message() {
        let err = StoryError::unsupported_resolution(640, 480);
        assert_eq!(err.to_string(), "Unsupported resolution: 640x480");
    }
}
