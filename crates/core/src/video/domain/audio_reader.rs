use std::path::Path;

use crate::audio::domain::audio_track::AudioTrack;

/// Domain interface for decoding the soundtrack of a media file.
pub trait AudioReader: Send {
    /// Decode the best audio stream to mono PCM at `target_sample_rate`.
    /// Returns `None` if the file has no audio stream.
    fn read_audio(
        &self,
        path: &Path,
        target_sample_rate: u32,
    ) -> Result<Option<AudioTrack>, Box<dyn std::error::Error>>;
}
