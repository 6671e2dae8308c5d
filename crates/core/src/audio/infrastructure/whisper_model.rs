use std::fmt;
use std::str::FromStr;

use crate::shared::constants::WHISPER_MODEL_BASE_URL;

/// ggml Whisper checkpoints published for whisper.cpp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WhisperModel {
    Tiny,
    TinyEn,
    #[default]
    Base,
    BaseEn,
    Small,
    SmallEn,
    Medium,
    MediumEn,
    LargeV3,
}

impl WhisperModel {
    pub const ALL: &[WhisperModel] = &[
        WhisperModel::Tiny,
        WhisperModel::TinyEn,
        WhisperModel::Base,
        WhisperModel::BaseEn,
        WhisperModel::Small,
        WhisperModel::SmallEn,
        WhisperModel::Medium,
        WhisperModel::MediumEn,
        WhisperModel::LargeV3,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            WhisperModel::Tiny => "tiny",
            WhisperModel::TinyEn => "tiny.en",
            WhisperModel::Base => "base",
            WhisperModel::BaseEn => "base.en",
            WhisperModel::Small => "small",
            WhisperModel::SmallEn => "small.en",
            WhisperModel::Medium => "medium",
            WhisperModel::MediumEn => "medium.en",
            WhisperModel::LargeV3 => "large-v3",
        }
    }

    pub fn file_name(&self) -> String {
        format!("ggml-{}.bin", self.name())
    }

    pub fn download_url(&self) -> String {
        format!("{WHISPER_MODEL_BASE_URL}/{}", self.file_name())
    }

    /// English-only checkpoints ignore the language setting.
    pub fn is_english_only(&self) -> bool {
        self.name().ends_with(".en")
    }
}

impl fmt::Display for WhisperModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for WhisperModel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        WhisperModel::ALL
            .iter()
            .copied()
            .find(|m| m.name() == wanted)
            .ok_or_else(|| {
                let names: Vec<&str> = WhisperModel::ALL.iter().map(|m| m.name()).collect();
                format!(
                    "Unknown Whisper model '{s}', expected one of: {}",
                    names.join(", ")
                )
            })
    }
}
