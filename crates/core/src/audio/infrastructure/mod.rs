pub mod whisper_model;
pub mod whisper_recognizer;
