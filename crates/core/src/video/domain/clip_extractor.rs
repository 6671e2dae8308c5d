use std::path::Path;

use crate::shared::time_range::TimeRange;

/// Writes the part of a source video that falls inside a time range.
///
/// Precision is bounded by the container and codec (e.g. keyframe spacing
/// when streams are copied rather than re-encoded).
pub trait ClipExtractor: Send {
    fn extract(
        &self,
        source: &Path,
        range: TimeRange,
        output: &Path,
    ) -> Result<(), Box<dyn std::error::Error>>;
}
