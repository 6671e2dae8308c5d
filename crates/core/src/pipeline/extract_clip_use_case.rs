use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::matching::domain::match_error::MatchError;
use crate::matching::domain::match_result::MatchResult;
use crate::matching::domain::window_matcher::WindowMatcher;
use crate::transcript::domain::transcript_source::TranscriptSource;
use crate::video::domain::clip_extractor::ClipExtractor;

use super::pipeline_logger::PipelineLogger;

/// What a run produced.
#[derive(Debug, Clone, PartialEq)]
pub enum ClipOutcome {
    /// `output` is `None` for a dry run.
    Matched {
        matched: MatchResult,
        output: Option<PathBuf>,
    },
    /// The inputs were valid but no window resembled the script.
    NoMatch { reason: MatchError },
}

/// Finds the passage of a video that best matches a script and cuts it out.
pub struct ExtractClipUseCase {
    transcripts: Box<dyn TranscriptSource>,
    extractor: Box<dyn ClipExtractor>,
    matcher: WindowMatcher,
    logger: Box<dyn PipelineLogger>,
}

impl ExtractClipUseCase {
    pub fn new(
        transcripts: Box<dyn TranscriptSource>,
        extractor: Box<dyn ClipExtractor>,
        matcher: WindowMatcher,
        logger: Box<dyn PipelineLogger>,
    ) -> Self {
        Self {
            transcripts,
            extractor,
            matcher,
            logger,
        }
    }

    /// Transcribes `source`, matches `script` and writes the clip to `output`.
    ///
    /// Passing `None` as `output` stops after matching. Malformed input
    /// (empty script, bad transcript) is an error, not a `NoMatch`.
    pub fn execute(
        &mut self,
        source: &Path,
        script: &str,
        output: Option<&Path>,
    ) -> Result<ClipOutcome, Box<dyn std::error::Error>> {
        let started = Instant::now();
        let segments = self.transcripts.load(source)?;
        self.logger.timing("transcribe", elapsed_ms(started));
        self.logger.metric("segments", segments.len() as f64);
        self.logger
            .info(&format!("Transcript has {} segments", segments.len()));

        let started = Instant::now();
        let found = self.matcher.find_best(script, &segments);
        self.logger.timing("match", elapsed_ms(started));

        let matched = match found {
            Ok(matched) => matched,
            Err(reason) if reason.is_no_match() => {
                self.logger.info(&format!("No match: {reason}"));
                self.logger.summary();
                return Ok(ClipOutcome::NoMatch { reason });
            }
            Err(e) => return Err(e.into()),
        };
        self.logger.metric("best_score", matched.score);
        self.logger.info(&format!(
            "Best match is window {}: {matched}",
            matched.window_index
        ));

        let range = matched.time_range()?;
        let written = match output {
            Some(path) => {
                let started = Instant::now();
                self.extractor.extract(source, range, path)?;
                self.logger.timing("extract", elapsed_ms(started));
                self.logger
                    .info(&format!("Clip saved to {}", path.display()));
                Some(path.to_path_buf())
            }
            None => None,
        };

        self.logger.summary();
        Ok(ClipOutcome::Matched {
            matched,
            output: written,
        })
    }
}

fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::time_range::TimeRange;
    use crate::transcript::domain::transcript_segment::{TranscriptError, TranscriptSegment};
    use approx::assert_relative_eq;
    use std::sync::{Arc, Mutex};

    // ─── Stubs ───

    struct StubTranscriptSource {
        segments: Vec<TranscriptSegment>,
    }

    impl TranscriptSource for StubTranscriptSource {
        fn load(&self, _: &Path) -> Result<Vec<TranscriptSegment>, Box<dyn std::error::Error>> {
            Ok(self.segments.clone())
        }
    }

    struct FailingTranscriptSource;

    impl TranscriptSource for FailingTranscriptSource {
        fn load(&self, _: &Path) -> Result<Vec<TranscriptSegment>, Box<dyn std::error::Error>> {
            Err("decoder exploded".into())
        }
    }

    type Extracted = Arc<Mutex<Vec<(PathBuf, TimeRange, PathBuf)>>>;

    struct StubExtractor {
        calls: Extracted,
    }

    impl ClipExtractor for StubExtractor {
        fn extract(
            &self,
            source: &Path,
            range: TimeRange,
            output: &Path,
        ) -> Result<(), Box<dyn std::error::Error>> {
            self.calls
                .lock()
                .unwrap()
                .push((source.to_path_buf(), range, output.to_path_buf()));
            Ok(())
        }
    }

    #[derive(Default)]
    struct Recorded {
        stages: Vec<String>,
        metrics: Vec<(String, f64)>,
        summaries: usize,
    }

    struct RecordingLogger {
        recorded: Arc<Mutex<Recorded>>,
    }

    impl PipelineLogger for RecordingLogger {
        fn timing(&mut self, stage: &str, _: f64) {
            self.recorded.lock().unwrap().stages.push(stage.to_string());
        }
        fn metric(&mut self, name: &str, value: f64) {
            self.recorded
                .lock()
                .unwrap()
                .metrics
                .push((name.to_string(), value));
        }
        fn info(&mut self, _: &str) {}
        fn summary(&self) {
            self.recorded.lock().unwrap().summaries += 1;
        }
    }

    fn greeting() -> Vec<TranscriptSegment> {
        vec![
            TranscriptSegment::new(0.0, 2.0, "hello world"),
            TranscriptSegment::new(2.0, 4.0, "this is a test"),
            TranscriptSegment::new(4.0, 6.0, "goodbye now"),
        ]
    }

    fn use_case(
        segments: Vec<TranscriptSegment>,
        window_size: usize,
    ) -> (ExtractClipUseCase, Extracted, Arc<Mutex<Recorded>>) {
        let calls: Extracted = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::new(Mutex::new(Recorded::default()));
        let uc = ExtractClipUseCase::new(
            Box::new(StubTranscriptSource { segments }),
            Box::new(StubExtractor {
                calls: calls.clone(),
            }),
            WindowMatcher::new(window_size).unwrap(),
            Box::new(RecordingLogger {
                recorded: recorded.clone(),
            }),
        );
        (uc, calls, recorded)
    }

    #[test]
    fn test_match_is_extracted_to_output() {
        let (mut uc, calls, _) = use_case(greeting(), 2);
        let outcome = uc
            .execute(
                Path::new("talk.mp4"),
                "this is a test goodbye",
                Some(Path::new("clip.mp4")),
            )
            .unwrap();

        let (matched, output) = match outcome {
            ClipOutcome::Matched { matched, output } => (matched, output),
            other => panic!("expected a match, got {other:?}"),
        };
        assert_relative_eq!(matched.start, 2.0);
        assert_relative_eq!(matched.end, 6.0);
        assert_eq!(output, Some(PathBuf::from("clip.mp4")));

        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        let (source, range, out) = &calls[0];
        assert_eq!(source, Path::new("talk.mp4"));
        assert_eq!(*range, TimeRange::new(2.0, 6.0).unwrap());
        assert_eq!(out, Path::new("clip.mp4"));
    }

    #[test]
    fn test_match_at_time_zero_is_still_a_match() {
        let (mut uc, calls, _) = use_case(greeting(), 1);
        let outcome = uc
            .execute(Path::new("talk.mp4"), "Hello World", Some(Path::new("clip.mp4")))
            .unwrap();

        match outcome {
            ClipOutcome::Matched { matched, .. } => {
                assert_relative_eq!(matched.start, 0.0);
                assert_relative_eq!(matched.end, 2.0);
                assert_relative_eq!(matched.score, 1.0);
            }
            other => panic!("expected a match, got {other:?}"),
        }
        assert_eq!(calls.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_dry_run_skips_extraction() {
        let (mut uc, calls, recorded) = use_case(greeting(), 2);
        let outcome = uc
            .execute(Path::new("talk.mp4"), "goodbye now", None)
            .unwrap();

        assert!(matches!(outcome, ClipOutcome::Matched { output: None, .. }));
        assert!(calls.lock().unwrap().is_empty());
        assert_eq!(recorded.lock().unwrap().stages, ["transcribe", "match"]);
    }

    #[test]
    fn test_too_short_transcript_is_no_match() {
        let (mut uc, calls, _) = use_case(greeting(), 5);
        let outcome = uc
            .execute(Path::new("talk.mp4"), "hello", Some(Path::new("clip.mp4")))
            .unwrap();

        assert_eq!(
            outcome,
            ClipOutcome::NoMatch {
                reason: MatchError::InsufficientSegments {
                    available: 3,
                    required: 5
                }
            }
        );
        assert!(calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_silent_video_is_no_match() {
        let (mut uc, calls, _) = use_case(Vec::new(), 3);
        let outcome = uc
            .execute(Path::new("silent.mp4"), "hello", Some(Path::new("clip.mp4")))
            .unwrap();

        assert!(matches!(outcome, ClipOutcome::NoMatch { .. }));
        assert!(calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_unrelated_script_is_no_match() {
        let (mut uc, _, recorded) = use_case(greeting(), 2);
        let outcome = uc
            .execute(Path::new("talk.mp4"), "ZZZ", Some(Path::new("clip.mp4")))
            .unwrap();

        assert_eq!(
            outcome,
            ClipOutcome::NoMatch {
                reason: MatchError::NoSimilarity
            }
        );
        assert_eq!(recorded.lock().unwrap().summaries, 1);
    }

    #[test]
    fn test_empty_script_is_an_error() {
        let (mut uc, _, _) = use_case(greeting(), 2);
        let err = uc
            .execute(Path::new("talk.mp4"), "   ", Some(Path::new("clip.mp4")))
            .unwrap_err();
        assert_eq!(err.to_string(), MatchError::EmptyScript.to_string());
    }

    #[test]
    fn test_malformed_transcript_is_an_error() {
        let segments = vec![
            TranscriptSegment::new(0.0, 2.0, "a"),
            TranscriptSegment::new(1.0, 3.0, "b"),
        ];
        let (mut uc, calls, _) = use_case(segments, 1);
        let err = uc
            .execute(Path::new("talk.mp4"), "a", Some(Path::new("clip.mp4")))
            .unwrap_err();

        let err = err.downcast::<MatchError>().unwrap();
        assert!(matches!(
            *err,
            MatchError::InvalidTranscript(TranscriptError::OutOfOrder { index: 1, .. })
        ));
        assert!(calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_transcript_failure_propagates() {
        let mut uc = ExtractClipUseCase::new(
            Box::new(FailingTranscriptSource),
            Box::new(StubExtractor {
                calls: Arc::new(Mutex::new(Vec::new())),
            }),
            WindowMatcher::default(),
            Box::new(crate::pipeline::pipeline_logger::NullPipelineLogger),
        );
        let err = uc.execute(Path::new("talk.mp4"), "hello", None).unwrap_err();
        assert_eq!(err.to_string(), "decoder exploded");
    }

    #[test]
    fn test_logger_receives_stages_and_metrics() {
        let (mut uc, _, recorded) = use_case(greeting(), 2);
        uc.execute(
            Path::new("talk.mp4"),
            "this is a test goodbye",
            Some(Path::new("clip.mp4")),
        )
        .unwrap();

        let recorded = recorded.lock().unwrap();
        assert_eq!(recorded.stages, ["transcribe", "match", "extract"]);
        assert_eq!(recorded.metrics[0], ("segments".to_string(), 3.0));
        assert_eq!(recorded.metrics[1].0, "best_score");
        assert_relative_eq!(recorded.metrics[1].1, 11.0 / 12.0, epsilon = 1e-12);
        assert_eq!(recorded.summaries, 1);
    }
}
