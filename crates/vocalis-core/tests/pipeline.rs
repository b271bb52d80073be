//! End-to-end pipeline tests against a stub synthesis backend
//!
//! The stub speaks just enough HTTP/1.1 for reqwest and returns WAV bytes;
//! the decoder probes by content, so the pipeline happily treats them as
//! the raw synthesis output.

use std::f32::consts::PI;
use std::io::{BufRead, BufReader, Cursor, Read, Write};
use std::net::TcpListener;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use hound::{SampleFormat, WavSpec, WavWriter};

use vocalis_core::{AppConfig, SpeechPipeline, SpeechSynthesizer};

/// Serve `responses` in order, one connection each, counting requests.
fn spawn_stub(responses: Vec<(u16, Vec<u8>)>) -> (String, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();

    std::thread::spawn(move || {
        for (status, body) in responses {
            let (stream, _) = match listener.accept() {
                Ok(conn) => conn,
                Err(_) => return,
            };
            counter.fetch_add(1, Ordering::SeqCst);

            let mut reader = BufReader::new(stream);
            let mut content_length = 0usize;
            loop {
                let mut line = String::new();
                if reader.read_line(&mut line).unwrap_or(0) == 0 {
                    break;
                }
                if line.trim_end().is_empty() {
                    break;
                }
                if let Some(value) = line
                    .to_ascii_lowercase()
                    .strip_prefix("content-length:")
                    .map(|v| v.trim().to_string())
                {
                    content_length = value.parse().unwrap_or(0);
                }
            }
            if content_length > 0 {
                let mut body_buf = vec![0u8; content_length];
                let _ = reader.read_exact(&mut body_buf);
            }

            let mut stream = reader.into_inner();
            let header = format!(
                "HTTP/1.1 {status} X\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            );
            let _ = stream.write_all(header.as_bytes());
            let _ = stream.write_all(&body);
        }
    });

    (format!("http://{addr}"), hits)
}

/// A short spoken-audio stand-in: a sine burst encoded as 16-bit WAV bytes.
fn synthetic_speech_bytes(sample_rate: u32, secs: f32) -> Vec<u8> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = WavWriter::new(&mut cursor, spec).unwrap();
        let n = (sample_rate as f32 * secs) as usize;
        for i in 0..n {
            let t = i as f32 / sample_rate as f32;
            let sample = (2.0 * PI * 180.0 * t).sin() * 0.3 * (2.0 * PI * 3.0 * t).sin().abs();
            writer.write_sample((sample * 32767.0) as i16).unwrap();
        }
        writer.finalize().unwrap();
    }
    cursor.into_inner()
}

fn test_config(base_url: &str, dir: &std::path::Path) -> AppConfig {
    let mut config = AppConfig::default();
    config.tts.base_url = base_url.to_string();
    config.paths.raw_audio = dir.join("raw");
    config.paths.refined_audio = dir.join("refined");
    config.paths.logs = dir.join("logs");
    config
}

fn build_pipeline(base_url: &str, dir: &std::path::Path) -> SpeechPipeline {
    let config = test_config(base_url, dir);
    let synthesizer = SpeechSynthesizer::new("test-key", &config.tts);
    SpeechPipeline::with_synthesizer(config, synthesizer)
}

#[test]
fn generates_both_output_files() {
    let dir = tempfile::tempdir().unwrap();
    let (url, hits) = spawn_stub(vec![(200, synthetic_speech_bytes(44100, 1.0))]);
    let pipeline = build_pipeline(&url, dir.path());

    let outcome = pipeline.generate("Hello from the pipeline test", None, Some("clip"));

    assert!(outcome.success, "error: {:?}", outcome.error);
    assert_eq!(hits.load(Ordering::SeqCst), 1);

    let raw = outcome.raw_audio_path.unwrap();
    let refined = outcome.refined_audio_path.unwrap();
    assert!(raw.ends_with("raw/clip.mp3"));
    assert!(refined.ends_with("refined/clip.wav"));
    assert!(raw.exists());
    assert!(refined.exists());

    let metadata = outcome.metadata.unwrap();
    assert_eq!(metadata.text_length, "Hello from the pipeline test".len());
    assert_eq!(metadata.sample_rate, 16000);
    assert!(metadata.duration > 0.9 && metadata.duration < 1.1);
    assert!(metadata.total_time >= 0.0);

    let spec = hound::WavReader::open(&refined).unwrap().spec();
    assert_eq!(spec.sample_rate, 16000);
    assert_eq!(spec.bits_per_sample, 16);
}

#[test]
fn empty_text_fails_without_network_call() {
    let dir = tempfile::tempdir().unwrap();
    let (url, hits) = spawn_stub(vec![(200, synthetic_speech_bytes(44100, 0.2))]);
    let pipeline = build_pipeline(&url, dir.path());

    let outcome = pipeline.generate("   ", None, None);

    assert!(!outcome.success);
    assert!(outcome.error.unwrap().contains("text"));
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[test]
fn oversized_text_fails_without_network_call() {
    let dir = tempfile::tempdir().unwrap();
    let (url, hits) = spawn_stub(vec![(200, synthetic_speech_bytes(44100, 0.2))]);
    let pipeline = build_pipeline(&url, dir.path());

    let outcome = pipeline.generate(&"x".repeat(5001), None, None);

    assert!(!outcome.success);
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[test]
fn backend_failure_becomes_result_record() {
    let dir = tempfile::tempdir().unwrap();
    let (url, _) = spawn_stub(vec![(500, b"upstream exploded".to_vec())]);
    let pipeline = build_pipeline(&url, dir.path());

    let outcome = pipeline.generate("Hello", None, None);

    assert!(!outcome.success);
    let error = outcome.error.unwrap();
    assert!(error.contains("500"), "error was: {error}");
    assert!(outcome.refined_audio_path.is_none());
}

#[test]
fn undecodable_synthesis_output_fails_cleanly() {
    let dir = tempfile::tempdir().unwrap();
    let (url, _) = spawn_stub(vec![(200, b"not really audio".to_vec())]);
    let pipeline = build_pipeline(&url, dir.path());

    let outcome = pipeline.generate("Hello", None, None);

    assert!(!outcome.success);
    assert!(outcome.error.is_some());
}
