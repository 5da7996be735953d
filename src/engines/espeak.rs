//! English synthesis through the espeak-ng command line.
//!
//! Each call is a fresh espeak-ng process writing to its own uniquely named
//! WAV file, so concurrent calls never share an output path. The voice is
//! resolved once per synthesizer by listing the installed English voices.
//!
//! # System Requirements
//!
//! - **Linux**: `sudo apt-get install espeak-ng`
//! - **macOS**: `brew install espeak-ng`
//! - **Windows**: Download installer from <https://espeak-ng.org/download>

use std::path::PathBuf;
use std::process::Command;
use std::sync::OnceLock;
use std::time::Duration;

use uuid::Uuid;

use crate::config::EnglishVoiceConfig;
use crate::process::run_captured;
use crate::text::strip_unspeakable;
use crate::{SynthesisResult, Synthesizer, TtsError};

/// One row of `espeak-ng --voices` output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceEntry {
    /// Language code usable with `-v`, e.g. `en-us`.
    pub language: String,
    /// Human readable name, e.g. `English_(America)`.
    pub name: String,
}

/// Parse the table printed by `espeak-ng --voices[=lang]`.
///
/// Columns are `Pty Language Age/Gender VoiceName File Other Languages`; the
/// header line and malformed rows are skipped.
pub fn parse_voice_list(output: &str) -> Vec<VoiceEntry> {
    output
        .lines()
        .filter_map(|line| {
            let cols: Vec<&str> = line.split_whitespace().collect();
            if cols.len() < 4 || cols[0].parse::<u32>().is_err() {
                return None;
            }
            Some(VoiceEntry {
                language: cols[1].to_string(),
                name: cols[3].to_string(),
            })
        })
        .collect()
}

/// First voice whose name contains `hint`, ignoring case.
pub fn select_voice<'a>(voices: &'a [VoiceEntry], hint: &str) -> Option<&'a VoiceEntry> {
    let hint = hint.to_lowercase();
    voices
        .iter()
        .find(|v| v.name.to_lowercase().contains(&hint))
}

/// English synthesizer backed by espeak-ng.
#[derive(Debug)]
pub struct EspeakSynthesizer {
    config: EnglishVoiceConfig,
    timeout: Option<Duration>,
    /// `Some(None)` once resolved with no match: use the engine default.
    voice: OnceLock<Option<String>>,
}

impl EspeakSynthesizer {
    pub fn new(config: EnglishVoiceConfig, timeout: Option<Duration>) -> Self {
        Self {
            config,
            timeout,
            voice: OnceLock::new(),
        }
    }

    /// The `-v` argument in use, or `None` for the engine default.
    pub fn voice(&self) -> Option<&str> {
        self.voice.get_or_init(|| self.resolve_voice()).as_deref()
    }

    fn resolve_voice(&self) -> Option<String> {
        let mut cmd = Command::new(&self.config.program);
        cmd.arg("--voices=en");

        let listed = match run_captured(cmd, None, self.timeout) {
            Ok(out) if out.status.success() => parse_voice_list(&out.stdout),
            Ok(out) => {
                log::warn!("Listing espeak-ng voices failed: {}", out.stderr_tail());
                Vec::new()
            }
            Err(e) => {
                log::warn!("Listing espeak-ng voices failed: {e}");
                Vec::new()
            }
        };

        match select_voice(&listed, &self.config.voice_hint) {
            Some(voice) => {
                log::info!("Using espeak-ng voice {} ({})", voice.name, voice.language);
                Some(voice.language.clone())
            }
            None => {
                log::warn!(
                    "No voice matching {:?} found, using the espeak-ng default voice",
                    self.config.voice_hint
                );
                None
            }
        }
    }

    fn output_path(&self) -> PathBuf {
        self.config
            .scratch_dir
            .join(format!("en_{}.wav", Uuid::new_v4().simple()))
    }
}

impl Synthesizer for EspeakSynthesizer {
    fn synthesize(&self, text: &str) -> Result<SynthesisResult, TtsError> {
        let cleaned = strip_unspeakable(text);
        let cleaned = cleaned.trim();
        if cleaned.is_empty() {
            return Err(TtsError::Validation(
                "no English text after cleaning".to_string(),
            ));
        }

        let path = self.output_path();
        if path.exists() {
            std::fs::remove_file(&path)?;
        }

        let mut cmd = Command::new(&self.config.program);
        if let Some(voice) = self.voice() {
            cmd.args(["-v", voice]);
        }
        cmd.arg("-s")
            .arg(self.config.rate.to_string())
            .arg("-w")
            .arg(&path)
            .arg("--stdin");

        // espeak-ng reads stdin line by line; terminate the last line.
        let payload = format!("{cleaned}\n");
        let output = match run_captured(cmd, Some(&payload), self.timeout) {
            Ok(output) if output.status.success() => output,
            Ok(output) => {
                let _ = std::fs::remove_file(&path);
                return Err(TtsError::Synthesis(format!(
                    "espeak-ng exited with code {:?}: {}",
                    output.status.code(),
                    output.stderr_tail()
                )));
            }
            // A killed engine may already have started writing its file.
            Err(e) => {
                let _ = std::fs::remove_file(&path);
                return Err(e);
            }
        };
        log::debug!("espeak-ng wrote {}", path.display());

        if !path.exists() {
            return Err(TtsError::Synthesis(format!(
                "English audio missing at {}",
                path.display()
            )));
        }

        Ok(SynthesisResult {
            waveform_path: path,
            temporary: true,
        })
    }
}
