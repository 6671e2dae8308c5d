use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::transcript::domain::transcript_segment::TranscriptSegment;
use crate::transcript::domain::transcript_source::TranscriptSource;

/// Accepted layouts: a bare segment array, or Whisper's JSON output where the
/// segments sit under a `segments` key next to other fields.
#[derive(Deserialize)]
#[serde(untagged)]
enum TranscriptFile {
    Segments(Vec<TranscriptSegment>),
    Whisper { segments: Vec<TranscriptSegment> },
}

pub fn read_transcript(path: &Path) -> Result<Vec<TranscriptSegment>, Box<dyn std::error::Error>> {
    let json = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read transcript {}: {e}", path.display()))?;
    let file: TranscriptFile = serde_json::from_str(&json)
        .map_err(|e| format!("Invalid transcript JSON in {}: {e}", path.display()))?;
    Ok(match file {
        TranscriptFile::Segments(segments) | TranscriptFile::Whisper { segments } => segments,
    })
}

pub fn write_transcript(
    path: &Path,
    segments: &[TranscriptSegment],
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(segments)?;
    fs::write(path, json)?;
    Ok(())
}

/// Serves a transcript computed earlier instead of running recognition.
/// The media path passed to [`TranscriptSource::load`] is ignored.
pub struct JsonTranscriptSource {
    path: PathBuf,
}

impl JsonTranscriptSource {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }
}

impl TranscriptSource for JsonTranscriptSource {
    fn load(&self, _media_path: &Path) -> Result<Vec<TranscriptSegment>, Box<dyn std::error::Error>> {
        let segments = read_transcript(&self.path)?;
        log::info!(
            "Loaded {} segments from {}",
            segments.len(),
            self.path.display()
        );
        Ok(segments)
    }
}

/// Passes another source through and saves what it produced as JSON.
pub struct RecordingTranscriptSource {
    inner: Box<dyn TranscriptSource>,
    path: PathBuf,
}

impl RecordingTranscriptSource {
    pub fn new(inner: Box<dyn TranscriptSource>, path: &Path) -> Self {
        Self {
            inner,
            path: path.to_path_buf(),
        }
    }
}

impl TranscriptSource for RecordingTranscriptSource {
    fn load(&self, media_path: &Path) -> Result<Vec<TranscriptSegment>, Box<dyn std::error::Error>> {
        let segments = self.inner.load(media_path)?;
        write_transcript(&self.path, &segments)?;
        log::info!("Saved transcript to {}", self.path.display());
        Ok(segments)
    }
}
