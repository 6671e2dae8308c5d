use std::fmt;

use crate::shared::time_range::{InvalidRangeError, TimeRange};
use crate::transcript::domain::transcript_segment::TranscriptSegment;

/// The best-scoring window: its span and similarity to the script.
#[derive(Clone, Debug, PartialEq)]
pub struct MatchResult {
    pub start: f64,
    pub end: f64,
    pub score: f64,
    pub window_index: usize,
}

impl MatchResult {
    /// Span runs from the first segment's start to the last segment's end.
    ///
    /// `window` must not be empty.
    pub(crate) fn from_window(window_index: usize, window: &[TranscriptSegment], score: f64) -> Self {
        Self {
            start: window[0].start,
            end: window[window.len() - 1].end,
            score,
            window_index,
        }
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Range to hand to a clip extractor; fails for a zero-length span.
    pub fn time_range(&self) -> Result<TimeRange, InvalidRangeError> {
        TimeRange::new(self.start, self.end)
    }
}

impl fmt::Display for MatchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.2}s - {:.2}s (score {:.3})",
            self.start, self.end, self.score
        )
    }
}

/// Score of a single window, as reported by `WindowMatcher::score_windows`.
#[derive(Clone, Debug, PartialEq)]
pub struct WindowScore {
    pub window_index: usize,
    pub start: f64,
    pub end: f64,
    pub score: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_from_window_uses_outer_boundaries() {
        let window = vec![
            TranscriptSegment::new(2.0, 3.5, "a"),
            TranscriptSegment::new(3.5, 4.0, "b"),
            TranscriptSegment::new(4.2, 6.0, "c"),
        ];
        let result = MatchResult::from_window(4, &window, 0.8);
        assert_eq!(result.start, 2.0);
        assert_eq!(result.end, 6.0);
        assert_eq!(result.window_index, 4);
        assert_relative_eq!(result.duration(), 4.0);
    }

    #[test]
    fn test_time_range_of_valid_match() {
        let result = MatchResult {
            start: 0.0,
            end: 4.0,
            score: 0.5,
            window_index: 0,
        };
        let range = result.time_range().unwrap();
        assert_eq!(range.start(), 0.0);
        assert_eq!(range.end(), 4.0);
    }

    #[test]
    fn test_time_range_of_degenerate_match_is_rejected() {
        let result = MatchResult {
            start: 0.0,
            end: 0.0,
            score: 0.0,
            window_index: 0,
        };
        assert!(result.time_range().is_err());
    }

    #[test]
    fn test_display() {
        let result = MatchResult {
            start: 2.0,
            end: 6.0,
            score: 0.7,
            window_index: 1,
        };
        assert_eq!(result.to_string(), "2.00s - 6.00s (score 0.700)");
    }
}
