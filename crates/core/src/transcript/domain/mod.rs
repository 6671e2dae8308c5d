pub mod transcript_segment;
pub mod transcript_source;
