/// Consecutive transcript segments grouped into one scoring window.
pub const DEFAULT_WINDOW_SIZE: usize = 3;

/// Whisper expects 16 kHz mono input.
pub const WHISPER_SAMPLE_RATE: u32 = 16000;

pub const WHISPER_MODEL_BASE_URL: &str = "https://huggingface.co/ggerganov/whisper.cpp/resolve/main";

pub const DEFAULT_LANGUAGE: &str = "auto";

/// File name used when no output path is given; written to the temp dir.
pub const DEFAULT_CLIP_FILENAME: &str = "summary_segment.mp4";

/// Name of the per-user directory holding settings and cached models.
pub const APP_DIR_NAME: &str = "ClipMatch";
