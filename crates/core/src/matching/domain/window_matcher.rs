use crate::shared::constants::DEFAULT_WINDOW_SIZE;
use crate::transcript::domain::transcript_segment::{validate_transcript, TranscriptSegment};

use super::match_error::MatchError;
use super::match_result::{MatchResult, WindowScore};
use super::similarity::{quick_ratio, real_quick_ratio, SequenceMatcher};

/// Slides a fixed-count window over a transcript and picks the run of
/// segments whose text is most similar to a script.
///
/// Windows advance one segment at a time, so each segment takes part in up to
/// `window_size` windows. Only a strictly better score replaces the current
/// best, which makes the earliest window win ties.
#[derive(Clone, Debug, PartialEq)]
pub struct WindowMatcher {
    window_size: usize,
    min_score: f64,
    autojunk: bool,
}

impl WindowMatcher {
    pub fn new(window_size: usize) -> Result<Self, MatchError> {
        if window_size == 0 {
            return Err(MatchError::InvalidWindowSize);
        }
        Ok(Self {
            window_size,
            min_score: 0.0,
            autojunk: false,
        })
    }

    /// A match must score strictly above this value, which must lie in
    /// `[0, 1)`. Defaults to 0.0, so a window with no similarity at all is
    /// never a match.
    pub fn with_min_score(mut self, min_score: f64) -> Result<Self, MatchError> {
        if !(0.0..1.0).contains(&min_score) {
            return Err(MatchError::InvalidMinScore(min_score));
        }
        self.min_score = min_score;
        Ok(self)
    }

    /// Ignore very frequent characters of long windows when seeding blocks.
    ///
    /// Off by default, which scores every shared character. Turning it on
    /// gives the same scores as Python's `difflib.SequenceMatcher` with its
    /// default arguments. On windows of 200 or more characters the two modes
    /// can pick different windows.
    pub fn with_autojunk(mut self, autojunk: bool) -> Self {
        self.autojunk = autojunk;
        self
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    pub fn min_score(&self) -> f64 {
        self.min_score
    }

    pub fn autojunk(&self) -> bool {
        self.autojunk
    }

    /// Finds the best window for `script`.
    ///
    /// Windows whose cheap upper bounds cannot beat the current best are not
    /// aligned at all; the outcome is the same as scoring every window.
    pub fn find_best(
        &self,
        script: &str,
        segments: &[TranscriptSegment],
    ) -> Result<MatchResult, MatchError> {
        let script = self.prepare(script, segments)?;

        let mut best: Option<MatchResult> = None;
        let mut best_score = self.min_score;
        let mut aligned = 0usize;

        for (index, window) in segments.windows(self.window_size).enumerate() {
            let text = window_text(window);
            if real_quick_ratio(&script, &text) <= best_score
                || quick_ratio(&script, &text) <= best_score
            {
                continue;
            }

            aligned += 1;
            let score = self.score(&script, &text);
            if score > best_score {
                log::trace!("Window {index} improves best score to {score:.4}");
                best_score = score;
                best = Some(MatchResult::from_window(index, window, score));
            }
        }

        let total = segments.len() - self.window_size + 1;
        log::debug!("Aligned {aligned} of {total} windows");

        best.ok_or(MatchError::NoSimilarity)
    }

    /// Scores every window in transcript order.
    pub fn score_windows(
        &self,
        script: &str,
        segments: &[TranscriptSegment],
    ) -> Result<Vec<WindowScore>, MatchError> {
        let script = self.prepare(script, segments)?;

        Ok(segments
            .windows(self.window_size)
            .enumerate()
            .map(|(window_index, window)| WindowScore {
                window_index,
                start: window[0].start,
                end: window[window.len() - 1].end,
                score: self.score(&script, &window_text(window)),
            })
            .collect())
    }

    /// Validates inputs and returns the normalized script.
    fn prepare(
        &self,
        script: &str,
        segments: &[TranscriptSegment],
    ) -> Result<Vec<char>, MatchError> {
        let script = normalize(script);
        if script.is_empty() {
            return Err(MatchError::EmptyScript);
        }
        validate_transcript(segments)?;
        if segments.len() < self.window_size {
            return Err(MatchError::InsufficientSegments {
                available: segments.len(),
                required: self.window_size,
            });
        }
        Ok(script)
    }

    fn score(&self, script: &[char], text: &[char]) -> f64 {
        if self.autojunk {
            SequenceMatcher::with_autojunk(script, text).ratio()
        } else {
            SequenceMatcher::new(script, text).ratio()
        }
    }
}

impl Default for WindowMatcher {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            min_score: 0.0,
            autojunk: false,
        }
    }
}

/// Matches `script` against `segments` with default settings and the given
/// window size.
pub fn match_script(
    script: &str,
    segments: &[TranscriptSegment],
    window_size: usize,
) -> Result<MatchResult, MatchError> {
    WindowMatcher::new(window_size)?.find_best(script, segments)
}

fn normalize(text: &str) -> Vec<char> {
    text.trim().to_lowercase().chars().collect()
}

/// Case-folded segment texts joined by single spaces; empty texts are skipped.
fn window_text(window: &[TranscriptSegment]) -> Vec<char> {
    let mut text = String::new();
    for seg in window.iter().filter(|s| !s.text.is_empty()) {
        if !text.is_empty() {
            text.push(' ');
        }
        text.push_str(&seg.text);
    }
    text.to_lowercase().chars().collect()
}
