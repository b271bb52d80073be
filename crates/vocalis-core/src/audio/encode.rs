//! WAV encoding of refined audio
//!
//! Output is always uncompressed integer PCM, mono, at the configured bit
//! depth. Resampling to the output rate happens here, after every
//! enhancement stage, so processing always runs at the source rate.

use std::fs;
use std::path::{Path, PathBuf};

use hound::{SampleFormat, WavSpec, WavWriter};
use tracing::info;

use crate::audio::{resample, SampleBuffer};
use crate::error::{Error, Result};

/// Metadata about a file written by [`encode_wav`]
#[derive(Debug, Clone)]
pub struct FileInfo {
    pub path: PathBuf,
    pub size_bytes: u64,
    /// Duration in seconds, measured at the output rate
    pub duration: f64,
    pub sample_rate: u32,
}

const I16_MAX: f32 = 32767.0;
const I24_MAX: f32 = 8_388_607.0;
const I32_MAX: f64 = 2_147_483_647.0;

/// Resample to `target_rate` if needed, then write a PCM WAV file.
///
/// Creates intermediate directories. Fails with [`Error::EncodeError`] on an
/// unwritable destination or an unsupported bit depth.
pub fn encode_wav(
    buffer: &SampleBuffer,
    path: &Path,
    target_rate: u32,
    bit_depth: u16,
) -> Result<FileInfo> {
    let buffer = if buffer.sample_rate != target_rate {
        info!(
            "Resampling from {} Hz to {} Hz",
            buffer.sample_rate, target_rate
        );
        resample::resample(buffer, target_rate)?
    } else {
        buffer.clone()
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let spec = WavSpec {
        channels: 1,
        sample_rate: buffer.sample_rate,
        bits_per_sample: bit_depth,
        sample_format: SampleFormat::Int,
    };

    let mut writer = WavWriter::create(path, spec)
        .map_err(|e| Error::EncodeError(format!("failed to create {}: {}", path.display(), e)))?;

    match bit_depth {
        16 => {
            for &sample in &buffer.samples {
                writer.write_sample((sample.clamp(-1.0, 1.0) * I16_MAX) as i16)?;
            }
        }
        24 => {
            for &sample in &buffer.samples {
                writer.write_sample((sample.clamp(-1.0, 1.0) * I24_MAX) as i32)?;
            }
        }
        32 => {
            for &sample in &buffer.samples {
                writer.write_sample((sample.clamp(-1.0, 1.0) as f64 * I32_MAX) as i32)?;
            }
        }
        other => {
            return Err(Error::EncodeError(format!(
                "unsupported bit depth: {other}"
            )));
        }
    }

    writer.finalize()?;

    let size_bytes = fs::metadata(path)?.len();
    let info = FileInfo {
        path: path.to_path_buf(),
        size_bytes,
        duration: buffer.duration(),
        sample_rate: buffer.sample_rate,
    };
    info!(
        "Saved {} ({:.2} MB, {:.2}s at {} Hz, {}-bit)",
        path.display(),
        size_bytes as f64 / (1024.0 * 1024.0),
        info.duration,
        info.sample_rate,
        bit_depth
    );
    Ok(info)
}
