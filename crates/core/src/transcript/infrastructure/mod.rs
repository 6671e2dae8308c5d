pub mod json_transcript;
pub mod recognized_transcript_source;
