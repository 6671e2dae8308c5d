mod settings;

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;

use clipmatch_core::audio::infrastructure::whisper_model::WhisperModel;
use clipmatch_core::audio::infrastructure::whisper_recognizer::WhisperRecognizer;
use clipmatch_core::matching::domain::match_error::MatchError;
use clipmatch_core::matching::domain::window_matcher::WindowMatcher;
use clipmatch_core::pipeline::extract_clip_use_case::{ClipOutcome, ExtractClipUseCase};
use clipmatch_core::pipeline::pipeline_logger::StdoutPipelineLogger;
use clipmatch_core::shared::constants::DEFAULT_CLIP_FILENAME;
use clipmatch_core::shared::model_resolver;
use clipmatch_core::transcript::domain::transcript_source::TranscriptSource;
use clipmatch_core::transcript::infrastructure::json_transcript::{
    JsonTranscriptSource, RecordingTranscriptSource,
};
use clipmatch_core::transcript::infrastructure::recognized_transcript_source::RecognizedTranscriptSource;
use clipmatch_core::video::infrastructure::ffmpeg_audio_reader::FfmpegAudioReader;
use clipmatch_core::video::infrastructure::ffmpeg_clip_extractor::FfmpegClipExtractor;

use settings::Settings;

const EXIT_NO_MATCH: i32 = 2;

/// Cut the part of a video that best matches a summary script.
#[derive(Parser)]
#[command(name = "clipmatch")]
struct Cli {
    /// Input video file.
    input: PathBuf,

    /// Output clip (default: summary_segment.mp4 in the temp directory).
    output: Option<PathBuf>,

    /// Script text to look for.
    #[arg(long, conflicts_with = "script_file")]
    script: Option<String>,

    /// Read the script from a file ("-" or omitted with no --script: stdin).
    #[arg(long)]
    script_file: Option<PathBuf>,

    /// Consecutive transcript segments per window.
    #[arg(long)]
    window_size: Option<usize>,

    /// Best score must exceed this to count as a match (0.0-1.0).
    #[arg(long)]
    min_score: Option<f64>,

    /// Whisper model: tiny, tiny.en, base, base.en, small, small.en, medium, medium.en, large-v3.
    #[arg(long)]
    model: Option<String>,

    /// Spoken language code, or "auto" to detect.
    #[arg(long)]
    language: Option<String>,

    /// Ignore very frequent characters when aligning long windows
    /// (`--autojunk=false` turns it off when the settings file enables it).
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    autojunk: Option<bool>,

    /// Use a saved JSON transcript instead of running Whisper.
    #[arg(long)]
    transcript: Option<PathBuf>,

    /// Write the transcript that was used to this JSON file.
    #[arg(long)]
    save_transcript: Option<PathBuf>,

    /// Print the match without writing a clip.
    #[arg(long)]
    dry_run: bool,

    /// Settings file (default: ClipMatch/settings.json in the config directory).
    #[arg(long)]
    config: Option<PathBuf>,
}

/// Flags merged over the settings file.
#[derive(Debug, PartialEq)]
struct Options {
    window_size: usize,
    min_score: f64,
    model: WhisperModel,
    language: String,
    autojunk: bool,
}

impl Options {
    fn resolve(cli: &Cli, settings: &Settings) -> Result<Self, Box<dyn std::error::Error>> {
        let model = cli.model.as_deref().unwrap_or(&settings.model);
        Ok(Self {
            window_size: cli.window_size.unwrap_or(settings.window_size),
            min_score: cli.min_score.unwrap_or(settings.min_score),
            model: model.parse::<WhisperModel>()?,
            language: cli
                .language
                .clone()
                .unwrap_or_else(|| settings.language.clone())
                .trim()
                .to_lowercase(),
            autojunk: cli.autojunk.unwrap_or(settings.autojunk),
        })
    }
}

fn main() {
    env_logger::init();

    match run() {
        Ok(ClipOutcome::Matched { .. }) => {}
        Ok(ClipOutcome::NoMatch { reason }) => {
            eprintln!("No meaningful match found: {reason}");
            process::exit(EXIT_NO_MATCH);
        }
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}

fn run() -> Result<ClipOutcome, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref())?;
    let options = Options::resolve(&cli, &settings)?;
    let output = output_path(&cli);
    validate(&cli, &options, output.as_deref())?;

    let script = read_script(&cli)?;
    let matcher = build_matcher(&options)?;

    let mut transcripts = build_transcript_source(&cli, &options)?;
    if let Some(path) = &cli.save_transcript {
        transcripts = Box::new(RecordingTranscriptSource::new(transcripts, path));
    }

    let mut use_case = ExtractClipUseCase::new(
        transcripts,
        Box::new(FfmpegClipExtractor),
        matcher,
        Box::new(StdoutPipelineLogger::new()),
    );
    let outcome = use_case.execute(&cli.input, &script, output.as_deref())?;

    if let ClipOutcome::Matched { matched, output } = &outcome {
        println!("Matched {matched}, {:.2}s long", matched.duration());
        match output {
            Some(path) => println!("Clip saved to {}", path.display()),
            None => println!("Dry run: no clip written"),
        }
    }
    Ok(outcome)
}

fn build_matcher(options: &Options) -> Result<WindowMatcher, MatchError> {
    Ok(WindowMatcher::new(options.window_size)?
        .with_min_score(options.min_score)?
        .with_autojunk(options.autojunk))
}

fn output_path(cli: &Cli) -> Option<PathBuf> {
    if cli.dry_run {
        return None;
    }
    Some(
        cli.output
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_CLIP_FILENAME)),
    )
}

fn build_transcript_source(
    cli: &Cli,
    options: &Options,
) -> Result<Box<dyn TranscriptSource>, Box<dyn std::error::Error>> {
    if let Some(path) = &cli.transcript {
        return Ok(Box::new(JsonTranscriptSource::new(path)));
    }

    log::info!("Resolving Whisper model: {}", options.model);
    let model_path = model_resolver::resolve(
        &options.model.file_name(),
        &options.model.download_url(),
        None,
        Some(Box::new(download_progress)),
    )?;
    eprintln!();

    let recognizer = WhisperRecognizer::new(&model_path)?.with_language(&options.language);
    Ok(Box::new(RecognizedTranscriptSource::new(
        Box::new(FfmpegAudioReader),
        Box::new(recognizer),
    )))
}

fn read_script(cli: &Cli) -> Result<String, Box<dyn std::error::Error>> {
    let script = match (&cli.script, &cli.script_file) {
        (Some(text), _) => text.clone(),
        (None, Some(path)) if path != Path::new("-") => fs::read_to_string(path)
            .map_err(|e| format!("Failed to read script {}: {e}", path.display()))?,
        _ => {
            let mut text = String::new();
            io::stdin().read_to_string(&mut text)?;
            text
        }
    };
    let script = script.trim().to_string();
    if script.is_empty() {
        return Err("Script is empty".into());
    }
    Ok(script)
}

fn validate(
    cli: &Cli,
    options: &Options,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    if !cli.input.exists() {
        return Err(format!("Input file not found: {}", cli.input.display()).into());
    }
    if options.model.is_english_only() && !matches!(options.language.as_str(), "auto" | "en") {
        return Err(format!(
            "Model {} only transcribes English, got language '{}'",
            options.model, options.language
        )
        .into());
    }
    if let Some(path) = &cli.transcript {
        if !path.exists() {
            return Err(format!("Transcript file not found: {}", path.display()).into());
        }
    }
    if output == Some(cli.input.as_path()) {
        return Err("Output file must differ from the input file".into());
    }
    Ok(())
}

fn download_progress(downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprint!("\rDownloading Whisper model... {pct}%");
    } else {
        eprint!("\rDownloading Whisper model... {downloaded} bytes");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("clipmatch").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_settings_fill_in_missing_flags() {
        let cli = parse(&["talk.mp4"]);
        let settings = Settings {
            window_size: 5,
            min_score: 0.2,
            model: "small".to_string(),
            language: "VI".to_string(),
            autojunk: true,
        };

        let options = Options::resolve(&cli, &settings).unwrap();
        assert_eq!(
            options,
            Options {
                window_size: 5,
                min_score: 0.2,
                model: WhisperModel::Small,
                language: "vi".to_string(),
                autojunk: true,
            }
        );
    }

    #[test]
    fn test_flags_override_settings() {
        let cli = parse(&[
            "talk.mp4",
            "--window-size",
            "2",
            "--min-score",
            "0.5",
            "--model",
            "tiny.en",
            "--language",
            "en",
        ]);
        let options = Options::resolve(&cli, &Settings::default()).unwrap();
        assert_eq!(options.window_size, 2);
        assert_eq!(options.min_score, 0.5);
        assert_eq!(options.model, WhisperModel::TinyEn);
        assert_eq!(options.language, "en");
    }

    #[test]
    fn test_unknown_model_is_rejected() {
        let cli = parse(&["talk.mp4", "--model", "huge"]);
        let err = Options::resolve(&cli, &Settings::default()).unwrap_err();
        assert!(err.to_string().contains("huge"));
    }

    #[test]
    fn test_script_and_script_file_conflict() {
        let result = Cli::try_parse_from([
            "clipmatch",
            "talk.mp4",
            "--script",
            "hi",
            "--script-file",
            "s.txt",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_script_is_trimmed() {
        let cli = parse(&["talk.mp4", "--script", "  hello there \n"]);
        assert_eq!(read_script(&cli).unwrap(), "hello there");
    }

    #[test]
    fn test_blank_script_is_rejected() {
        let cli = parse(&["talk.mp4", "--script", "   "]);
        assert!(read_script(&cli).is_err());
    }

    #[test]
    fn test_script_file_is_read() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("script.txt");
        fs::write(&path, "goodbye now\n").unwrap();

        let cli = parse(&["talk.mp4", "--script-file", path.to_str().unwrap()]);
        assert_eq!(read_script(&cli).unwrap(), "goodbye now");
    }

    #[test]
    fn test_default_output_is_in_temp_dir() {
        let cli = parse(&["talk.mp4"]);
        assert_eq!(
            output_path(&cli),
            Some(std::env::temp_dir().join("summary_segment.mp4"))
        );
    }

    #[test]
    fn test_dry_run_has_no_output() {
        let cli = parse(&["talk.mp4", "out.mp4", "--dry-run"]);
        assert_eq!(output_path(&cli), None);
    }

    #[test]
    fn test_out_of_range_min_score_is_rejected() {
        let cli = parse(&["talk.mp4", "--min-score", "1.0"]);
        let options = Options::resolve(&cli, &Settings::default()).unwrap();
        assert_eq!(
            build_matcher(&options).unwrap_err(),
            MatchError::InvalidMinScore(1.0)
        );
    }

    #[test]
    fn test_zero_window_size_is_rejected() {
        let cli = parse(&["talk.mp4", "--window-size", "0"]);
        let options = Options::resolve(&cli, &Settings::default()).unwrap();
        assert_eq!(
            build_matcher(&options).unwrap_err(),
            MatchError::InvalidWindowSize
        );
    }

    #[test]
    fn test_autojunk_flag_overrides_settings_both_ways() {
        let on = Settings {
            autojunk: true,
            ..Settings::default()
        };
        let off = Settings::default();

        let cli = parse(&["talk.mp4", "--autojunk=false"]);
        assert!(!Options::resolve(&cli, &on).unwrap().autojunk);

        let cli = parse(&["talk.mp4", "--autojunk"]);
        assert!(Options::resolve(&cli, &off).unwrap().autojunk);

        let cli = parse(&["talk.mp4"]);
        assert!(Options::resolve(&cli, &on).unwrap().autojunk);
    }

    #[test]
    fn test_bare_autojunk_does_not_swallow_output_path() {
        let cli = parse(&["talk.mp4", "--autojunk", "clip.mp4"]);
        assert_eq!(cli.autojunk, Some(true));
        assert_eq!(cli.output, Some(PathBuf::from("clip.mp4")));
    }

    #[test]
    fn test_validate_rejects_language_for_english_only_model() {
        let tmp = tempfile::TempDir::new().unwrap();
        let input = tmp.path().join("talk.mp4");
        fs::write(&input, b"").unwrap();

        let cli = parse(&[input.to_str().unwrap(), "--model", "base.en", "--language", "vi"]);
        let options = Options::resolve(&cli, &Settings::default()).unwrap();
        assert!(validate(&cli, &options, None).is_err());
    }

    #[test]
    fn test_validate_rejects_output_equal_to_input() {
        let tmp = tempfile::TempDir::new().unwrap();
        let input = tmp.path().join("talk.mp4");
        fs::write(&input, b"").unwrap();

        let cli = parse(&[input.to_str().unwrap()]);
        let options = Options::resolve(&cli, &Settings::default()).unwrap();
        assert!(validate(&cli, &options, Some(&input)).is_err());
    }

    #[test]
    fn test_validate_rejects_missing_input() {
        let cli = parse(&["/no/such/talk.mp4"]);
        let options = Options::resolve(&cli, &Settings::default()).unwrap();
        let err = validate(&cli, &options, None).unwrap_err();
        assert!(err.to_string().contains("Input file not found"));
    }
}
