pub mod audio_track;
pub mod speech_recognizer;
