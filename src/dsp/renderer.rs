//! Offline rendering and WAV export.
//!
//! Sounds always synthesize at 44100 Hz. Export applies a gain, clamps,
//! block-averages down to the requested rate and quantizes to the requested
//! bit depth before handing the samples to `hound`.

use std::io::{Cursor, Seek, Write};
use std::path::Path;

use hound::{SampleFormat, WavSpec, WavWriter};
use log::debug;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::engine::{Engine, I16_SCALE};
use super::model::Model;
use crate::convert::SAMPLE_RATE;
use crate::error::SfxrError;

/// Default cap on whole-sound renders.
pub const DEFAULT_MAX_SECONDS: f32 = 60.0;

/// `seconds` at 44100 Hz, treating negative and NaN as zero.
pub fn max_samples(seconds: f32) -> usize {
    (seconds.max(0.0) as f64 * SAMPLE_RATE as f64) as usize
}

/// Output sample format of an exported WAV.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub enum BitDepth {
    /// Unsigned 8-bit PCM.
    Eight,
    /// Signed 16-bit PCM.
    #[default]
    Sixteen,
    /// 32-bit IEEE float.
    ThirtyTwo,
}

impl BitDepth {
    pub fn bits(self) -> u16 {
        match self {
            BitDepth::Eight => 8,
            BitDepth::Sixteen => 16,
            BitDepth::ThirtyTwo => 32,
        }
    }
}

impl TryFrom<u16> for BitDepth {
    type Error = SfxrError;

    fn try_from(bits: u16) -> Result<Self, Self::Error> {
        match bits {
            8 => Ok(BitDepth::Eight),
            16 => Ok(BitDepth::Sixteen),
            32 => Ok(BitDepth::ThirtyTwo),
            other => Err(SfxrError::UnsupportedBitDepth(other)),
        }
    }
}

impl From<BitDepth> for u16 {
    fn from(depth: BitDepth) -> Self {
        depth.bits()
    }
}

/// Settings for WAV export.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExportConfig {
    pub bit_depth: BitDepth,
    /// Output rate in Hz, at most 44100.
    pub sample_rate: u32,
    /// Applied before clamping to `[-1, 1]`.
    pub gain: f32,
    /// Longest sound rendered for export. Anything past it is cut.
    pub max_seconds: f32,
}

impl Default for ExportConfig {
    fn default() -> Self {
        ExportConfig {
            bit_depth: BitDepth::Sixteen,
            sample_rate: SAMPLE_RATE,
            gain: 4.0,
            max_seconds: DEFAULT_MAX_SECONDS,
        }
    }
}

impl ExportConfig {
    /// Build a config from raw numbers, rejecting unsupported values.
    pub fn new(sample_rate: u32, bits: u16) -> Result<Self, SfxrError> {
        let config = ExportConfig {
            bit_depth: BitDepth::try_from(bits)?,
            sample_rate,
            ..Default::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// [`ExportConfig::max_seconds`] in 44100 Hz samples.
    pub fn max_samples(&self) -> usize {
        max_samples(self.max_seconds)
    }

    pub fn validate(&self) -> Result<(), SfxrError> {
        if self.sample_rate == 0 || self.sample_rate > SAMPLE_RATE {
            return Err(SfxrError::UnsupportedSampleRate(self.sample_rate));
        }
        Ok(())
    }

    fn wav_spec(&self) -> WavSpec {
        WavSpec {
            channels: 1,
            sample_rate: self.sample_rate,
            bits_per_sample: self.bit_depth.bits(),
            sample_format: match self.bit_depth {
                BitDepth::ThirtyTwo => SampleFormat::Float,
                _ => SampleFormat::Int,
            },
        }
    }
}

/// Render a sound from the start at 44100 Hz, stopping after
/// `max_samples` if it has not ended by then.
pub fn render(model: &Model, max_samples: usize) -> Vec<f32> {
    render_engine(&mut Engine::new(model), max_samples)
}

/// Render whatever is left of a voice, up to `max_samples`. The buffer is
/// sized up front from the sample-count estimate.
pub fn render_engine<R: Rng>(engine: &mut Engine<'_, R>, max_samples: usize) -> Vec<f32> {
    let mut samples = vec![0.0f32; engine.estimate_remaining().min(max_samples)];
    let written = engine.synthesize(&mut samples);
    samples.truncate(written);
    debug!("rendered {written} samples");
    samples
}

/// Scale by `gain` and clamp to `[-1, 1]`.
pub fn apply_gain(samples: &[f32], gain: f32) -> Vec<f32> {
    samples.iter().map(|&s| (s * gain).clamp(-1.0, 1.0)).collect()
}

/// Resample 44100 Hz audio down to `sample_rate` by averaging consecutive
/// blocks. Block boundaries fall at `i * 44100 / sample_rate`, so rates
/// that do not divide 44100 get blocks of alternating length. The last
/// block may be partial.
pub fn decimate(samples: &[f32], sample_rate: u32) -> Vec<f32> {
    if sample_rate == 0 || sample_rate >= SAMPLE_RATE {
        return samples.to_vec();
    }
    let src = SAMPLE_RATE as u64;
    let dst = sample_rate as u64;
    let len = samples.len() as u64;
    let out_len = (len * dst).div_ceil(src);

    (0..out_len)
        .map(|i| {
            let start = (i * src / dst) as usize;
            let end = (((i + 1) * src / dst).min(len)) as usize;
            let block = &samples[start..end];
            block.iter().sum::<f32>() / block.len() as f32
        })
        .collect()
}

/// Unsigned 8-bit PCM: `s · 127 + 128`.
pub fn quantize_u8(samples: &[f32]) -> Vec<u8> {
    samples.iter().map(|&s| (s * 127.0 + 128.0) as u8).collect()
}

/// Signed 16-bit PCM: `s · 32000`, the same scale as [`Engine::synthesize_i16`].
pub fn quantize_i16(samples: &[f32]) -> Vec<i16> {
    samples.iter().map(|&s| (s * I16_SCALE) as i16).collect()
}

/// Export pipeline up to quantization: gain, clamp, decimate.
pub fn prepare_export(samples: &[f32], config: &ExportConfig) -> Result<Vec<f32>, SfxrError> {
    config.validate()?;
    Ok(decimate(&apply_gain(samples, config.gain), config.sample_rate))
}

fn write_samples<W: Write + Seek>(
    writer: W,
    samples: &[f32],
    config: &ExportConfig,
) -> Result<usize, SfxrError> {
    let prepared = prepare_export(samples, config)?;
    let mut wav = WavWriter::new(writer, config.wav_spec())?;
    match config.bit_depth {
        BitDepth::Eight => {
            for v in quantize_u8(&prepared) {
                // hound stores 8-bit samples offset by 128
                wav.write_sample((v as i16 - 128) as i8)?;
            }
        }
        BitDepth::Sixteen => {
            for v in quantize_i16(&prepared) {
                wav.write_sample(v)?;
            }
        }
        BitDepth::ThirtyTwo => {
            for &v in &prepared {
                wav.write_sample(v)?;
            }
        }
    }
    wav.finalize()?;
    Ok(prepared.len())
}

/// Encode 44100 Hz samples as a mono WAV file in memory.
pub fn encode_wav(samples: &[f32], config: &ExportConfig) -> Result<Vec<u8>, SfxrError> {
    let mut cursor = Cursor::new(Vec::new());
    let frames = write_samples(&mut cursor, samples, config)?;
    debug!(
        "encoded {frames} frames at {} Hz, {} bit",
        config.sample_rate,
        config.bit_depth.bits()
    );
    Ok(cursor.into_inner())
}

/// Encode 44100 Hz samples as a mono WAV file on disk.
pub fn write_wav(path: impl AsRef<Path>, samples: &[f32], config: &ExportConfig) -> Result<(), SfxrError> {
    let path = path.as_ref();
    let file = std::io::BufWriter::new(std::fs::File::create(path)?);
    let frames = write_samples(file, samples, config)?;
    debug!("wrote {frames} frames to {}", path.display());
    Ok(())
}
