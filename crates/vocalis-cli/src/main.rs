//! Vocalis CLI - generate refined speech audio from text

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vocalis_core::{AppConfig, PipelineOutcome, SpeechPipeline};

/// Text → refined speech WAV, ready for lip-sync video generation
#[derive(Parser, Debug)]
#[command(name = "vocalis", author, version, about, long_about = None)]
struct Args {
    /// Text to convert to speech
    text: String,

    /// Voice ID to use (defaults to the configured voice)
    #[arg(short, long)]
    voice: Option<String>,

    /// Output file stem, without extension (defaults to a timestamped name)
    #[arg(short, long)]
    output_name: Option<String>,

    /// Path to the configuration file
    #[arg(short, long, default_value = vocalis_core::pipeline::DEFAULT_CONFIG_PATH)]
    config: String,

    /// Print the result record as JSON instead of a summary
    #[arg(long)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = AppConfig::load(&args.config)
        .with_context(|| format!("failed to load configuration from {}", args.config))?;

    let default_filter = format!(
        "vocalis={level},vocalis_core={level}",
        level = config.logging.level
    );
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let pipeline = SpeechPipeline::new(config)?;
    let outcome = pipeline.generate(
        &args.text,
        args.voice.as_deref(),
        args.output_name.as_deref(),
    );

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print_summary(&outcome);
    }

    if !outcome.success {
        std::process::exit(1);
    }
    Ok(())
}

fn print_summary(outcome: &PipelineOutcome) {
    if outcome.success {
        println!("Speech generation succeeded");
        if let Some(path) = &outcome.raw_audio_path {
            println!("  raw audio:     {}", path.display());
        }
        if let Some(path) = &outcome.refined_audio_path {
            println!("  refined audio: {}", path.display());
        }
        if let Some(meta) = &outcome.metadata {
            println!("  duration:      {:.2}s at {} Hz", meta.duration, meta.sample_rate);
            println!("  voice:         {}", meta.voice_id);
            println!(
                "  timing:        tts {:.2}s, refinement {:.2}s, total {:.2}s",
                meta.generation_time, meta.refinement_time, meta.total_time
            );
            println!(
                "  sizes:         raw {:.2} MB, refined {:.2} MB",
                meta.raw_size_mb, meta.refined_size_mb
            );
        }
    } else {
        eprintln!(
            "Speech generation failed: {}",
            outcome.error.as_deref().unwrap_or("unknown error")
        );
    }
}
