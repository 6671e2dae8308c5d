use super::audio_track::AudioTrack;
use crate::transcript::domain::transcript_segment::TranscriptSegment;

/// Domain interface for speech-to-text transcription.
///
/// Implementations return segment-level timestamps in chronological order.
pub trait SpeechRecognizer: Send {
    fn transcribe(
        &self,
        audio: &AudioTrack,
    ) -> Result<Vec<TranscriptSegment>, Box<dyn std::error::Error>>;
}
