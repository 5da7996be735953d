use std::path::{Path, PathBuf};

use serde::Serialize;
use uuid::Uuid;

use crate::audio::Waveform;
use crate::config::{PipelineConfig, FALLBACK_SAMPLE_RATE};
use crate::engines::{EspeakSynthesizer, TacotronSynthesizer};
use crate::language::Language;
use crate::segmenter::{segment, Segment};
use crate::{Synthesizer, TtsError};

type Engine = Box<dyn Synthesizer + Send + Sync>;

/// A segment that could not be spoken and was left out of the output.
#[derive(Debug, Clone, Serialize)]
pub struct SegmentFailure {
    /// Position of the segment in the input.
    pub index: usize,
    pub segment: Segment,
    pub error: String,
}

/// Outcome of one [`Pipeline::generate_audio_report`] call.
#[derive(Debug, Clone, Serialize)]
pub struct AudioReport {
    pub path: PathBuf,
    /// Number of segments the input was split into.
    pub segments: usize,
    /// Number of segments present in the output.
    pub synthesized: usize,
    pub failures: Vec<SegmentFailure>,
    pub duration_secs: f64,
}

impl AudioReport {
    /// Whether every segment made it into the output.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Segments text, routes each run to its engine and stitches the results.
pub struct Pipeline {
    english: Engine,
    persian: Engine,
    results_dir: PathBuf,
    output_sample_rate: Option<u32>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("results_dir", &self.results_dir)
            .field("output_sample_rate", &self.output_sample_rate)
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    /// Build a pipeline using espeak-ng and the Tacotron2 process.
    pub fn new(config: PipelineConfig) -> Result<Self, TtsError> {
        config.validate()?;
        let timeout = config.engine_timeout();
        let english = EspeakSynthesizer::new(config.english, timeout);
        let persian = TacotronSynthesizer::new(config.persian, timeout)
            .discard_outputs(!config.keep_persian_outputs);
        Ok(Self::with_synthesizers(
            Box::new(english),
            Box::new(persian),
            config.results_dir,
            config.output_sample_rate,
        ))
    }

    /// Build a pipeline around arbitrary engines.
    pub fn with_synthesizers(
        english: Engine,
        persian: Engine,
        results_dir: PathBuf,
        output_sample_rate: Option<u32>,
    ) -> Self {
        Self {
            english,
            persian,
            results_dir,
            output_sample_rate,
        }
    }

    pub fn results_dir(&self) -> &Path {
        &self.results_dir
    }

    /// Speak `text` and return the path of the assembled WAV file.
    ///
    /// Segments that fail to synthesize are logged and left out; the path is
    /// returned even if none succeeded. Use [`Self::generate_audio_report`]
    /// to find out what was dropped.
    pub fn generate_audio(&self, text: &str) -> Result<PathBuf, TtsError> {
        self.generate_audio_report(text).map(|report| report.path)
    }

    /// Like [`Self::generate_audio`], but also reports which segments failed.
    pub fn generate_audio_report(&self, text: &str) -> Result<AudioReport, TtsError> {
        let segments = segment(text);
        if segments.is_empty() {
            return Err(TtsError::EmptyInput);
        }

        let mut combined: Option<Waveform> = None;
        let mut failures = Vec::new();

        for (index, seg) in segments.iter().enumerate() {
            let appended = self.synthesize_segment(seg).and_then(|wave| {
                combined
                    .get_or_insert_with(|| {
                        Waveform::empty(self.output_sample_rate.unwrap_or(wave.sample_rate))
                    })
                    .append(wave)
            });
            match appended {
                Ok(()) => {}
                Err(e) => {
                    log::warn!("Segment error ({} {:?}): {e}", seg.language, seg.text);
                    failures.push(SegmentFailure {
                        index,
                        segment: seg.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        let combined = combined.unwrap_or_else(|| {
            Waveform::empty(self.output_sample_rate.unwrap_or(FALLBACK_SAMPLE_RATE))
        });

        std::fs::create_dir_all(&self.results_dir)?;
        let path = self
            .results_dir
            .join(format!("final_{}.wav", Uuid::new_v4().simple()));
        combined.write_wav(&path)?;

        let synthesized = segments.len() - failures.len();
        log::info!(
            "Wrote {:.2}s of audio to {} ({synthesized}/{} segments)",
            combined.duration_secs(),
            path.display(),
            segments.len()
        );

        Ok(AudioReport {
            path,
            segments: segments.len(),
            synthesized,
            failures,
            duration_secs: combined.duration_secs(),
        })
    }

    fn synthesize_segment(&self, seg: &Segment) -> Result<Waveform, TtsError> {
        let engine = match seg.language {
            Language::En => &self.english,
            Language::Fa => &self.persian,
        };
        let result = engine.synthesize(&seg.text)?;
        let wave = Waveform::read_wav(&result.waveform_path);

        if result.temporary {
            if let Err(e) = std::fs::remove_file(&result.waveform_path) {
                log::warn!(
                    "Failed to remove {}: {e}",
                    result.waveform_path.display()
                );
            }
        }
        wave
    }
}
