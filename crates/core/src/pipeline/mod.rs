pub mod extract_clip_use_case;
pub mod pipeline_logger;
