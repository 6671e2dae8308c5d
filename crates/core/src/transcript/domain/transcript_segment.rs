use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A time-stamped chunk of recognized speech.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

impl TranscriptSegment {
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TranscriptError {
    #[error("segment {index} has a non-finite timestamp")]
    NonFiniteTimestamp { index: usize },
    #[error("segment {index} spans {start:.3}s..{end:.3}s; start must precede end")]
    EmptySpan { index: usize, start: f64, end: f64 },
    #[error("segment {index} starts at {start:.3}s before the previous segment ends at {previous_end:.3}s")]
    OutOfOrder {
        index: usize,
        start: f64,
        previous_end: f64,
    },
}

/// Checks that segments are finite, non-empty in time, chronological and
/// non-overlapping. Touching boundaries (`start == previous end`) are allowed.
pub fn validate_transcript(segments: &[TranscriptSegment]) -> Result<(), TranscriptError> {
    let mut previous_end: Option<f64> = None;

    for (index, seg) in segments.iter().enumerate() {
        if !seg.start.is_finite() || !seg.end.is_finite() {
            return Err(TranscriptError::NonFiniteTimestamp { index });
        }
        if seg.start >= seg.end {
            return Err(TranscriptError::EmptySpan {
                index,
                start: seg.start,
                end: seg.end,
            });
        }
        if let Some(previous_end) = previous_end.filter(|&prev| seg.start < prev) {
            return Err(TranscriptError::OutOfOrder {
                index,
                start: seg.start,
                previous_end,
            });
        }
        previous_end = Some(seg.end);
    }

    Ok(())
}
