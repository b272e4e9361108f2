//! WAV export for offline renders

use crate::engine::buffer::AudioBuffer;
use crate::error::{NebulaError, Result};
use hound::{SampleFormat, WavSpec, WavWriter};
use std::path::Path;

/// Output sample format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavFormat {
    /// Bit depth (16, 24 or 32)
    pub bit_depth: u16,
}

impl WavFormat {
    pub fn new(bit_depth: u16) -> Self {
        Self { bit_depth }
    }
}

impl Default for WavFormat {
    fn default() -> Self {
        Self { bit_depth: 16 }
    }
}

/// Write `buffer` to `path` as a WAV file
///
/// 32-bit output is written as float; 16 and 24-bit as integers, clamped.
pub fn export_wav(buffer: &AudioBuffer, path: &Path, format: WavFormat) -> Result<()> {
    let sample_format = match format.bit_depth {
        16 | 24 => SampleFormat::Int,
        32 => SampleFormat::Float,
        other => {
            return Err(NebulaError::UnsupportedFormat {
                format: format!("{}-bit audio (only 16, 24, 32 supported)", other),
            })
        }
    };

    let spec = WavSpec {
        channels: buffer.num_channels() as u16,
        sample_rate: buffer.sample_rate(),
        bits_per_sample: format.bit_depth,
        sample_format,
    };

    let write_err = |source: hound::Error| NebulaError::AudioWriteError {
        path: path.display().to_string(),
        source,
    };

    let mut writer = WavWriter::create(path, spec).map_err(write_err)?;

    for sample in buffer.interleaved() {
        match format.bit_depth {
            16 => {
                let scaled = (sample * 32767.0).clamp(-32768.0, 32767.0) as i16;
                writer.write_sample(scaled).map_err(write_err)?;
            }
            24 => {
                // 24-bit stored as i32 in hound
                let scaled = (sample * 8388607.0).clamp(-8388608.0, 8388607.0) as i32;
                writer.write_sample(scaled).map_err(write_err)?;
            }
            _ => writer.write_sample(sample).map_err(write_err)?,
        }
    }

    writer.finalize().map_err(write_err)?;
    Ok(())
}
