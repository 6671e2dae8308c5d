use std::path::Path;

use crate::audio::domain::speech_recognizer::SpeechRecognizer;
use crate::shared::constants::WHISPER_SAMPLE_RATE;
use crate::transcript::domain::transcript_segment::TranscriptSegment;
use crate::transcript::domain::transcript_source::TranscriptSource;
use crate::video::domain::audio_reader::AudioReader;

/// Transcribes the soundtrack of a media file with a speech recognizer.
pub struct RecognizedTranscriptSource {
    reader: Box<dyn AudioReader>,
    recognizer: Box<dyn SpeechRecognizer>,
}

impl RecognizedTranscriptSource {
    pub fn new(reader: Box<dyn AudioReader>, recognizer: Box<dyn SpeechRecognizer>) -> Self {
        Self { reader, recognizer }
    }
}

impl TranscriptSource for RecognizedTranscriptSource {
    fn load(&self, media_path: &Path) -> Result<Vec<TranscriptSegment>, Box<dyn std::error::Error>> {
        let Some(audio) = self.reader.read_audio(media_path, WHISPER_SAMPLE_RATE)? else {
            log::warn!("No audio track in {}; transcript is empty", media_path.display());
            return Ok(Vec::new());
        };
        if audio.is_empty() {
            log::warn!("Audio track of {} is empty", media_path.display());
            return Ok(Vec::new());
        }
        self.recognizer.transcribe(&audio)
    }
}
