pub mod ffmpeg_audio_reader;
pub mod ffmpeg_clip_extractor;

#[cfg(test)]
pub(crate) mod test_media;
