use std::time::Duration;

/// Errors produced by the segmentation and synthesis pipeline.
#[derive(thiserror::Error, Debug)]
pub enum TtsError {
    /// Text had nothing speakable left after cleaning.
    #[error("Invalid text: {0}")]
    Validation(String),
    /// An engine process failed or did not produce its output file.
    #[error("Synthesis failed: {0}")]
    Synthesis(String),
    #[error("Empty text: nothing to synthesize")]
    EmptyInput,
    #[error("Speech engine '{0}' not found. Check the configured program path.")]
    EngineNotFound(String),
    #[error("Speech engine '{program}' did not finish within {elapsed:?}")]
    Timeout { program: String, elapsed: Duration },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),
    #[error("Resampler setup failed: {0}")]
    ResamplerSetup(#[from] rubato::ResamplerConstructionError),
    #[error("Resampling failed: {0}")]
    Resample(#[from] rubato::ResampleError),
    #[error("Invalid configuration: {0}")]
    Config(String),
}

#[cfg(test)]
mod tests {
    use super::TtsError;
    use std::time::Duration;

    #[test]
    fn validation_error_message() {
        let err = TtsError::Validation("no Persian text after cleaning".to_string());
        assert_eq!(err.to_string(), "Invalid text: no Persian text after cleaning");
    }

    #[test]
    fn timeout_error_names_program() {
        let err = TtsError::Timeout {
            program: "espeak-ng".to_string(),
            elapsed: Duration::from_secs(5),
        };
        assert_eq!(
            err.to_string(),
            "Speech engine 'espeak-ng' did not finish within 5s"
        );
    }

    #[test]
    fn io_errors_convert() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: TtsError = io.into();
        assert!(matches!(err, TtsError::Io(_)));
    }
}
