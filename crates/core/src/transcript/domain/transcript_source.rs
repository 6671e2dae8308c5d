use std::path::Path;

use super::transcript_segment::TranscriptSegment;

/// Produces the ordered speech transcript of a media file.
///
/// Implementations may run speech recognition or load a transcript that was
/// computed earlier; callers only rely on chronological order.
pub trait TranscriptSource: Send {
    fn load(&self, media_path: &Path) -> Result<Vec<TranscriptSegment>, Box<dyn std::error::Error>>;
}
