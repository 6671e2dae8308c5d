use std::path::{Path, PathBuf};

use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

use crate::audio::domain::audio_track::AudioTrack;
use crate::audio::domain::speech_recognizer::SpeechRecognizer;
use crate::shared::constants::{DEFAULT_LANGUAGE, WHISPER_SAMPLE_RATE};
use crate::transcript::domain::transcript_segment::TranscriptSegment;

/// Speech recognizer using whisper.cpp via whisper-rs.
///
/// Emits one [`TranscriptSegment`] per Whisper segment. Text is trimmed and
/// a segment overlapping its predecessor is clamped to start where that one
/// ends. Segments left without a positive duration are dropped.
#[derive(Debug)]
pub struct WhisperRecognizer {
    model_path: PathBuf,
    language: String,
}

impl WhisperRecognizer {
    pub fn new(model_path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        if !model_path.exists() {
            return Err(format!("Whisper model not found at: {}", model_path.display()).into());
        }
        Ok(Self {
            model_path: model_path.to_path_buf(),
            language: DEFAULT_LANGUAGE.to_string(),
        })
    }

    /// ISO 639-1 code, or `auto` to let Whisper detect the language.
    pub fn with_language(mut self, language: &str) -> Self {
        self.language = language.trim().to_lowercase();
        self
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    pub fn language(&self) -> &str {
        &self.language
    }
}

impl SpeechRecognizer for WhisperRecognizer {
    fn transcribe(
        &self,
        audio: &AudioTrack,
    ) -> Result<Vec<TranscriptSegment>, Box<dyn std::error::Error>> {
        if audio.sample_rate() != WHISPER_SAMPLE_RATE {
            return Err(format!(
                "Whisper needs {WHISPER_SAMPLE_RATE} Hz audio, got {} Hz",
                audio.sample_rate()
            )
            .into());
        }

        let ctx = WhisperContext::new_with_params(
            self.model_path.to_str().ok_or("Invalid model path")?,
            WhisperContextParameters::default(),
        )
        .map_err(|e| format!("Failed to load Whisper model: {e}"))?;

        let mut state = ctx
            .create_state()
            .map_err(|e| format!("Failed to create Whisper state: {e}"))?;

        let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
        params.set_language(Some(self.language.as_str()));
        params.set_translate(false);
        params.set_print_special(false);
        params.set_print_progress(false);
        params.set_print_realtime(false);
        params.set_print_timestamps(false);
        params.set_n_threads(num_cpus().min(4) as i32);

        log::info!(
            "Transcribing {:.1}s of audio (language: {})",
            audio.duration(),
            self.language
        );
        state
            .full(params, audio.samples())
            .map_err(|e| format!("Whisper inference failed: {e}"))?;

        let mut segments: Vec<TranscriptSegment> = Vec::new();
        for seg_idx in 0..state.full_n_segments() {
            let Some(segment) = state.get_segment(seg_idx) else {
                continue;
            };
            let Ok(text) = segment.to_str() else {
                log::warn!("Skipping Whisper segment {seg_idx}: text is not valid UTF-8");
                continue;
            };

            // Whisper timestamps are in centiseconds
            let mut start = segment.start_timestamp() as f64 / 100.0;
            let end = segment.end_timestamp() as f64 / 100.0;
            if let Some(previous) = segments.last().map(|s| s.end) {
                if start < previous {
                    log::debug!("Clamping overlapping Whisper segment {seg_idx} to {previous:.2}s");
                    start = previous;
                }
            }
            if end <= start {
                log::debug!("Dropping zero-length Whisper segment at {start:.2}s");
                continue;
            }

            segments.push(TranscriptSegment::new(start, end, text.trim()));
        }

        log::info!("Whisper produced {} segments", segments.len());
        Ok(segments)
    }
}

fn num_cpus() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}
