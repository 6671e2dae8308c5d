pub mod audio_reader;
pub mod clip_extractor;
