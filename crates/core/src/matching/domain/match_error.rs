use thiserror::Error;

use crate::transcript::domain::transcript_segment::TranscriptError;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MatchError {
    #[error("window size must be at least 1")]
    InvalidWindowSize,
    #[error("minimum score must be in [0, 1), got {0}")]
    InvalidMinScore(f64),
    #[error("script is empty")]
    EmptyScript,
    #[error("transcript has {available} segments but a window needs {required}")]
    InsufficientSegments { available: usize, required: usize },
    #[error("no transcript window is similar to the script")]
    NoSimilarity,
    #[error("invalid transcript: {0}")]
    InvalidTranscript(#[from] TranscriptError),
}

impl MatchError {
    /// True when the inputs were well-formed but nothing matched, as opposed
    /// to a caller or data error.
    pub fn is_no_match(&self) -> bool {
        matches!(
            self,
            MatchError::InsufficientSegments { .. } | MatchError::NoSimilarity
        )
    }
}
