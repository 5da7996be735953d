use std::path::Path;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use rubato::{FftFixedIn, Resampler};

use crate::TtsError;

/// Input frames per FFT resampler block.
const RESAMPLE_CHUNK: usize = 1024;
const RESAMPLE_SUB_CHUNKS: usize = 2;

/// Decoded PCM audio with interleaved `f32` samples in `[-1, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub channels: u16,
}

impl Waveform {
    /// An empty mono waveform at `sample_rate`.
    pub fn empty(sample_rate: u32) -> Self {
        Self {
            samples: Vec::new(),
            sample_rate,
            channels: 1,
        }
    }

    /// Read a WAV file of any integer bit depth or 32-bit float.
    pub fn read_wav(path: &Path) -> Result<Self, TtsError> {
        let mut reader = WavReader::open(path)?;
        let spec = reader.spec();
        let samples = match spec.sample_format {
            SampleFormat::Float => reader.samples::<f32>().collect::<Result<Vec<_>, _>>()?,
            SampleFormat::Int => {
                let scale = (1i64 << (spec.bits_per_sample - 1)) as f32;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|v| v as f32 / scale))
                    .collect::<Result<Vec<_>, _>>()?
            }
        };

        Ok(Self {
            samples,
            sample_rate: spec.sample_rate,
            channels: spec.channels,
        })
    }

    /// Write as 16-bit PCM, clamping out-of-range samples.
    pub fn write_wav(&self, path: &Path) -> Result<(), TtsError> {
        let spec = WavSpec {
            channels: self.channels,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(path, spec)?;
        for &sample in &self.samples {
            writer.write_sample((sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)?;
        }
        writer.finalize()?;
        Ok(())
    }

    /// Number of frames (samples per channel).
    pub fn frames(&self) -> usize {
        self.samples.len() / usize::from(self.channels.max(1))
    }

    /// Duration of the audio in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.frames() as f64 / self.sample_rate as f64
    }

    /// Average all channels into one.
    pub fn to_mono(self) -> Self {
        if self.channels <= 1 {
            return self;
        }
        let channels = usize::from(self.channels);
        let samples = self
            .samples
            .chunks_exact(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect();
        Self {
            samples,
            sample_rate: self.sample_rate,
            channels: 1,
        }
    }

    /// Resample to `target_rate` with rubato's FFT resampler.
    ///
    /// Multi-channel input is downmixed first. The output has exactly
    /// `frames * target_rate / sample_rate` frames (rounded), with the
    /// resampler's delay trimmed off the front.
    pub fn resample(self, target_rate: u32) -> Result<Self, TtsError> {
        let mono = self.to_mono();
        if mono.sample_rate == target_rate || mono.samples.is_empty() {
            return Ok(Self {
                sample_rate: target_rate,
                ..mono
            });
        }

        let mut resampler = FftFixedIn::<f32>::new(
            mono.sample_rate as usize,
            target_rate as usize,
            RESAMPLE_CHUNK,
            RESAMPLE_SUB_CHUNKS,
            1,
        )?;
        let delay = resampler.output_delay();
        let expected = (mono.samples.len() as f64 * target_rate as f64
            / mono.sample_rate as f64)
            .round() as usize;
        let mut out = Vec::with_capacity(delay + expected + RESAMPLE_CHUNK);

        let mut pos = 0;
        loop {
            let need = resampler.input_frames_next();
            if pos + need > mono.samples.len() {
                break;
            }
            let block: [&[f32]; 1] = [&mono.samples[pos..pos + need]];
            let frames = resampler.process(&block[..], None)?;
            out.extend_from_slice(&frames[0]);
            pos += need;
        }
        if pos < mono.samples.len() {
            let tail: [&[f32]; 1] = [&mono.samples[pos..]];
            let frames = resampler.process_partial(Some(&tail[..]), None)?;
            out.extend_from_slice(&frames[0]);
        }
        // Flush the filter tail until the delayed output covers the whole input.
        while out.len() < delay + expected {
            let frames = resampler.process_partial::<&[f32]>(None, None)?;
            if frames[0].is_empty() {
                break;
            }
            out.extend_from_slice(&frames[0]);
        }

        let mut samples = out.split_off(delay.min(out.len()));
        samples.resize(expected, 0.0);

        Ok(Self {
            samples,
            sample_rate: target_rate,
            channels: 1,
        })
    }

    /// Append `other` after converting it to this waveform's rate.
    ///
    /// The accumulator is expected to be mono; `other` is downmixed to match.
    pub fn append(&mut self, other: Waveform) -> Result<(), TtsError> {
        let other = if other.sample_rate == self.sample_rate {
            other.to_mono()
        } else {
            log::debug!(
                "Resampling segment from {} Hz to {} Hz",
                other.sample_rate,
                self.sample_rate
            );
            other.resample(self.sample_rate)?
        };
        self.samples.extend_from_slice(&other.samples);
        Ok(())
    }
}
