//! # bilingual-tts
//!
//! Speaks mixed Persian/English text and backs a small chat assistant with a
//! self-growing FAQ cache.
//!
//! ## Features
//!
//! - **Segmentation**: splits a sentence into runs of English and Persian words
//! - **Two engines**: espeak-ng for English, an external Tacotron2 process for Persian
//! - **Assembly**: stitches the per-run audio into one WAV, in order
//! - **Chat**: history buffer, prompt building and FAQ deduplication around an
//!   external reply generator
//!
//! ## Quick Start
//!
//! ```ignore
//! use bilingual_tts::{Pipeline, PipelineConfig};
//!
//! let pipeline = Pipeline::new(PipelineConfig::default())?;
//! let path = pipeline.generate_audio("The word کتاب means book")?;
//! println!("Saved to {}", path.display());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod audio;
pub mod chat;
pub mod config;
pub mod engines;
pub mod error;
pub mod faq;
pub mod language;
pub mod pipeline;
pub mod process;
pub mod segmenter;
pub mod text;

use std::path::PathBuf;

pub use audio::Waveform;
pub use config::{EnglishVoiceConfig, PersianVoiceConfig, PipelineConfig};
pub use error::TtsError;
pub use language::{classify, Language};
pub use pipeline::{AudioReport, Pipeline, SegmentFailure};
pub use segmenter::{segment, Segment};

/// Error type at the seams to external collaborators (reply model, FAQ storage).
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The result of a synthesis (text-to-speech) call.
///
/// The audio itself stays on disk; its format is whatever the engine wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesisResult {
    /// WAV file produced by the engine.
    pub waveform_path: PathBuf,
    /// Whether the file should be deleted once it has been merged.
    pub temporary: bool,
}

/// Common interface for the per-language speech engines.
///
/// Implementations render one same-language run of text to a WAV file.
pub trait Synthesizer {
    /// Synthesize `text` and return where the audio was written.
    fn synthesize(&self, text: &str) -> Result<SynthesisResult, TtsError>;
}
