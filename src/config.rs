//! Pipeline configuration.
//!
//! Every field has a default, so a JSON file only needs the keys it changes:
//!
//! ```json
//! {
//!   "results_dir": "/srv/tts/results",
//!   "persian": {
//!     "working_dir": "/opt/Persian-MultiSpeaker-Tacotron2",
//!     "reference_wav": "/opt/voices/sample.wav"
//!   }
//! }
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::TtsError;

/// Sample rate used for the output file when no segment was synthesized and
/// no explicit rate is configured. Matches the Tacotron2 vocoder output.
pub const FALLBACK_SAMPLE_RATE: u32 = 22050;

/// Settings for the espeak-ng English engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
#[builder(setter(into), default)]
#[serde(default)]
pub struct EnglishVoiceConfig {
    /// espeak-ng binary, looked up in PATH when relative.
    pub program: PathBuf,
    /// Case-insensitive substring a voice name must contain to be selected.
    pub voice_hint: String,
    /// Speaking rate in words per minute.
    pub rate: u32,
    /// Directory for per-call intermediate WAV files.
    pub scratch_dir: PathBuf,
}

impl Default for EnglishVoiceConfig {
    fn default() -> Self {
        Self {
            program: PathBuf::from("espeak-ng"),
            voice_hint: "english".to_string(),
            rate: 100,
            scratch_dir: std::env::temp_dir(),
        }
    }
}

/// Settings for the external Persian inference process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
#[builder(setter(into), default)]
#[serde(default)]
pub struct PersianVoiceConfig {
    /// Interpreter used to launch the inference script.
    pub interpreter: PathBuf,
    /// Inference script, relative to `working_dir`.
    pub script: PathBuf,
    /// Working directory the process is started in.
    pub working_dir: PathBuf,
    /// Reference voice sample passed as `--ref_wav_path`.
    pub reference_wav: PathBuf,
    /// Vocoder passed as `--vocoder`.
    pub vocoder: String,
    /// Directory under `working_dir` the process writes `<test_name>.wav` to.
    pub results_subdir: PathBuf,
}

impl Default for PersianVoiceConfig {
    fn default() -> Self {
        Self {
            interpreter: PathBuf::from("python"),
            script: PathBuf::from("inference.py"),
            working_dir: PathBuf::from("Persian-MultiSpeaker-Tacotron2"),
            reference_wav: PathBuf::from("sample.wav"),
            vocoder: "HiFiGAN".to_string(),
            results_subdir: PathBuf::from("results"),
        }
    }
}

/// Top-level configuration for [`crate::Pipeline`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
#[builder(setter(into), default)]
#[serde(default)]
pub struct PipelineConfig {
    pub english: EnglishVoiceConfig,
    pub persian: PersianVoiceConfig,
    /// Directory the final `final_<id>.wav` files are written to.
    pub results_dir: PathBuf,
    /// Output sample rate. `None` keeps the rate of the first synthesized segment.
    #[builder(setter(into, strip_option))]
    pub output_sample_rate: Option<u32>,
    /// Kill an engine process that runs longer than this. `None` waits forever.
    #[builder(setter(into, strip_option))]
    pub engine_timeout_secs: Option<u64>,
    /// Leave Persian engine outputs in its results directory after merging.
    pub keep_persian_outputs: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            english: EnglishVoiceConfig::default(),
            persian: PersianVoiceConfig::default(),
            results_dir: PathBuf::from("results"),
            output_sample_rate: None,
            engine_timeout_secs: None,
            keep_persian_outputs: true,
        }
    }
}

impl PipelineConfig {
    /// Load a configuration from a JSON file. Missing keys keep their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self, TtsError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| TtsError::Config(format!("Failed to parse {}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), TtsError> {
        if self.english.rate == 0 {
            return Err(TtsError::Config("english.rate must be positive".to_string()));
        }
        if self.output_sample_rate == Some(0) {
            return Err(TtsError::Config(
                "output_sample_rate must be positive".to_string(),
            ));
        }
        if self.engine_timeout_secs == Some(0) {
            return Err(TtsError::Config(
                "engine_timeout_secs must be positive".to_string(),
            ));
        }
        if self.persian.vocoder.trim().is_empty() {
            return Err(TtsError::Config("persian.vocoder must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn engine_timeout(&self) -> Option<Duration> {
        self.engine_timeout_secs.map(Duration::from_secs)
    }
}
