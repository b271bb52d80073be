//! Compressed/container audio decoding via symphonia
//!
//! Accepts anything the enabled symphonia readers understand (MP3, WAV,
//! FLAC, OGG, ...) and produces a mono [`SampleBuffer`]. Multi-channel
//! streams are downmixed by channel averaging.

use std::fs::File;
use std::path::Path;

use symphonia::core::audio::SampleBuffer as SymphoniaSampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, info};

use crate::audio::SampleBuffer;
use crate::error::{Error, Result};

/// Decode an audio file into a mono sample buffer.
///
/// Fails with [`Error::DecodeError`] if the file is missing, unreadable, or
/// in a container/codec the probe does not recognize.
pub fn decode<P: AsRef<Path>>(path: P) -> Result<SampleBuffer> {
    let path = path.as_ref();

    let src = File::open(path)
        .map_err(|e| Error::DecodeError(format!("failed to open {}: {}", path.display(), e)))?;
    let mss = MediaSourceStream::new(Box::new(src), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| Error::DecodeError(format!("unsupported format {}: {}", path.display(), e)))?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| Error::DecodeError("no decodable audio track".to_string()))?;
    let track_id = track.id;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| Error::DecodeError(format!("no decoder for track: {}", e)))?;

    let mut sample_rate = track.codec_params.sample_rate.unwrap_or(0);
    let mut samples: Vec<f32> = Vec::new();
    let mut conversion_buf: Option<SymphoniaSampleBuffer<f32>> = None;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(Error::DecodeError(e.to_string())),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            // A corrupt packet is recoverable; resynchronize on the next one.
            Err(SymphoniaError::DecodeError(e)) => {
                debug!("skipping undecodable packet: {e}");
                continue;
            }
            Err(e) => return Err(Error::DecodeError(e.to_string())),
        };

        let spec = *decoded.spec();
        sample_rate = spec.rate;
        let channels = spec.channels.count();

        let buf = conversion_buf.get_or_insert_with(|| {
            SymphoniaSampleBuffer::<f32>::new(decoded.capacity() as u64, spec)
        });
        buf.copy_interleaved_ref(decoded);

        if channels > 1 {
            samples.extend(
                buf.samples()
                    .chunks(channels)
                    .map(|frame| frame.iter().sum::<f32>() / channels as f32),
            );
        } else {
            samples.extend_from_slice(buf.samples());
        }
    }

    if samples.is_empty() || sample_rate == 0 {
        return Err(Error::DecodeError(format!(
            "no audio samples decoded from {}",
            path.display()
        )));
    }

    let buffer = SampleBuffer::new(samples, sample_rate);
    info!(
        "Decoded {} ({:.2}s at {} Hz)",
        path.display(),
        buffer.duration(),
        buffer.sample_rate
    );
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hound::{SampleFormat, WavSpec, WavWriter};

    fn write_wav(path: &Path, channels: u16, sample_rate: u32, frames: &[Vec<f32>]) {
        let spec = WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(path, spec).unwrap();
        for frame in frames {
            for &sample in frame {
                writer.write_sample((sample * 32767.0) as i16).unwrap();
            }
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn decodes_mono_wav() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mono.wav");
        let frames: Vec<Vec<f32>> = (0..1600).map(|i| vec![(i % 100) as f32 / 200.0]).collect();
        write_wav(&path, 1, 16000, &frames);

        let buffer = decode(&path).unwrap();
        assert_eq!(buffer.sample_rate, 16000);
        assert_eq!(buffer.len(), 1600);
    }

    #[test]
    fn downmixes_stereo_by_averaging() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stereo.wav");
        // L = 0.5, R = -0.5 averages to silence
        let frames: Vec<Vec<f32>> = (0..800).map(|_| vec![0.5, -0.5]).collect();
        write_wav(&path, 2, 44100, &frames);

        let buffer = decode(&path).unwrap();
        assert_eq!(buffer.sample_rate, 44100);
        assert_eq!(buffer.len(), 800);
        assert!(buffer.peak() < 1e-3);
    }

    #[test]
    fn missing_file_is_a_decode_error() {
        let result = decode("/nonexistent/path/audio.mp3");
        assert!(matches!(result, Err(Error::DecodeError(_))));
    }

    #[test]
    fn garbage_bytes_are_a_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("noise.mp3");
        std::fs::write(&path, b"this is not audio data at all").unwrap();
        assert!(matches!(decode(&path), Err(Error::DecodeError(_))));
    }
}
