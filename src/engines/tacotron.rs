//! Persian synthesis through an external Tacotron2 inference process.
//!
//! The process is launched as
//! `<interpreter> <script> --vocoder <name> --text <text> --ref_wav_path <wav> --test_name <id>`
//! from the configured working directory and must write
//! `<working_dir>/<results_subdir>/<id>.wav`. Every call gets a fresh `id`,
//! so concurrent calls write to distinct files.

use std::path::PathBuf;
use std::process::Command;
use std::time::Duration;

use uuid::Uuid;

use crate::config::PersianVoiceConfig;
use crate::process::run_captured;
use crate::text::clean_persian;
use crate::{SynthesisResult, Synthesizer, TtsError};

/// Persian synthesizer that shells out to the inference script.
#[derive(Debug, Clone)]
pub struct TacotronSynthesizer {
    config: PersianVoiceConfig,
    timeout: Option<Duration>,
    /// Mark results as temporary so the pipeline deletes them after merging.
    discard_outputs: bool,
}

impl TacotronSynthesizer {
    pub fn new(config: PersianVoiceConfig, timeout: Option<Duration>) -> Self {
        Self {
            config,
            timeout,
            discard_outputs: false,
        }
    }

    /// Have the pipeline delete each output after it has been merged.
    pub fn discard_outputs(mut self, discard: bool) -> Self {
        self.discard_outputs = discard;
        self
    }

    fn result_path(&self, test_name: &str) -> PathBuf {
        self.config
            .working_dir
            .join(&self.config.results_subdir)
            .join(format!("{test_name}.wav"))
    }

    fn command(&self, text: &str, test_name: &str) -> Command {
        let mut cmd = Command::new(&self.config.interpreter);
        cmd.arg(&self.config.script)
            .arg("--vocoder")
            .arg(&self.config.vocoder)
            .arg("--text")
            .arg(text)
            .arg("--ref_wav_path")
            .arg(&self.config.reference_wav)
            .arg("--test_name")
            .arg(test_name)
            .current_dir(&self.config.working_dir);
        cmd
    }
}

impl Synthesizer for TacotronSynthesizer {
    fn synthesize(&self, text: &str) -> Result<SynthesisResult, TtsError> {
        let cleaned = clean_persian(text);
        if cleaned.is_empty() {
            return Err(TtsError::Validation(
                "no Persian text after cleaning".to_string(),
            ));
        }

        let test_name = format!("tts_output_{}", Uuid::new_v4().simple());
        log::debug!("Persian inference {test_name} for {} chars", cleaned.chars().count());

        let output = run_captured(self.command(&cleaned, &test_name), None, self.timeout)?;
        if !output.status.success() {
            log::error!("Persian inference failed: {}", output.stderr);
            return Err(TtsError::Synthesis(format!(
                "Persian inference exited with code {:?}: {}",
                output.status.code(),
                output.stderr_tail()
            )));
        }

        let path = self.result_path(&test_name);
        if !path.exists() {
            return Err(TtsError::Synthesis(format!(
                "Missing Persian wav file: {}",
                path.display()
            )));
        }

        Ok(SynthesisResult {
            waveform_path: path,
            temporary: self.discard_outputs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::Waveform;
    use std::path::Path;

    /// Stand-in for `inference.py`: copies the reference wav to the result path.
    /// Arguments arrive as `--vocoder V --text T --ref_wav_path R --test_name N`.
    const COPY_SCRIPT: &str = "mkdir -p results\necho \"$4\" > last_text.txt\ncp \"$6\" \"results/$8.wav\"\n";

    fn setup(script: &str) -> (tempfile::TempDir, PersianVoiceConfig) {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("fake_inference.sh"), script).unwrap();

        let reference = dir.path().join("sample.wav");
        Waveform {
            samples: vec![0.1; 2205],
            sample_rate: 22050,
            channels: 1,
        }
        .write_wav(&reference)
        .unwrap();

        let config = PersianVoiceConfig {
            interpreter: PathBuf::from("sh"),
            script: PathBuf::from("fake_inference.sh"),
            working_dir: dir.path().to_path_buf(),
            reference_wav: reference,
            ..Default::default()
        };
        (dir, config)
    }

    #[test]
    fn builds_inference_command_line() {
        let synth = TacotronSynthesizer::new(PersianVoiceConfig::default(), None);
        let cmd = synth.command("سلام", "tts_output_x");
        let args: Vec<_> = cmd.get_args().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(cmd.get_program(), "python");
        assert_eq!(
            args,
            [
                "inference.py",
                "--vocoder",
                "HiFiGAN",
                "--text",
                "سلام",
                "--ref_wav_path",
                "sample.wav",
                "--test_name",
                "tts_output_x",
            ]
        );
        assert_eq!(cmd.get_current_dir(), Some(Path::new("Persian-MultiSpeaker-Tacotron2")));
    }

    #[test]
    fn empty_or_emoji_only_text_is_rejected() {
        let synth = TacotronSynthesizer::new(PersianVoiceConfig::default(), None);
        assert!(matches!(synth.synthesize(""), Err(TtsError::Validation(_))));
        assert!(matches!(synth.synthesize("😀🎉"), Err(TtsError::Validation(_))));
    }

    #[cfg(unix)]
    #[test]
    fn passes_cleaned_text_and_finds_result() {
        let (dir, config) = setup(COPY_SCRIPT);
        let synth = TacotronSynthesizer::new(config, None);

        let result = synth.synthesize("«سلام» دنیا 😀").unwrap();
        assert!(!result.temporary);
        assert!(result.waveform_path.starts_with(dir.path().join("results")));
        let name = result.waveform_path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("tts_output_") && name.ends_with(".wav"));

        let text = std::fs::read_to_string(dir.path().join("last_text.txt")).unwrap();
        assert_eq!(text.trim_end(), "سلام  دنیا");
        assert_eq!(Waveform::read_wav(&result.waveform_path).unwrap().frames(), 2205);
    }

    #[cfg(unix)]
    #[test]
    fn each_call_gets_its_own_output() {
        let (_dir, config) = setup(COPY_SCRIPT);
        let synth = TacotronSynthesizer::new(config, None).discard_outputs(true);
        let a = synth.synthesize("سلام").unwrap();
        let b = synth.synthesize("سلام").unwrap();
        assert_ne!(a.waveform_path, b.waveform_path);
        assert!(a.temporary);
    }

    #[cfg(unix)]
    #[test]
    fn non_zero_exit_is_synthesis_error() {
        let (_dir, config) = setup("echo 'CUDA out of memory' >&2\nexit 1\n");
        let synth = TacotronSynthesizer::new(config, None);
        match synth.synthesize("سلام") {
            Err(TtsError::Synthesis(msg)) => assert!(msg.contains("CUDA out of memory"), "{msg}"),
            other => panic!("expected synthesis error, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn missing_output_is_synthesis_error() {
        let (_dir, config) = setup("exit 0\n");
        let synth = TacotronSynthesizer::new(config, None);
        match synth.synthesize("سلام") {
            Err(TtsError::Synthesis(msg)) => assert!(msg.contains("Missing Persian wav"), "{msg}"),
            other => panic!("expected synthesis error, got {other:?}"),
        }
    }
}
