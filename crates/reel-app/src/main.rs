//! Reel - render any audio file to 16-bit PCM WAV.
//!
//! Decodes the source through the offline render queue and writes the
//! rendered frames at the source's sample rate and channel count.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use reel_audio::{OfflineRenderer, RenderConfig, RenderReport};
use reel_core::Error;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for reel.
#[derive(Parser, Debug)]
#[command(name = "reel")]
#[command(about = "Render an audio file to 16-bit PCM WAV")]
#[command(version)]
struct Args {
    /// Audio file to render
    source: PathBuf,

    /// WAV file to write; an existing file is replaced
    destination: PathBuf,

    /// Seconds of audio each ingest buffer should hold
    #[arg(long, default_value_t = 1.0, env = "REEL_BUFFER_SECONDS")]
    buffer_seconds: f64,

    /// Smallest ingest buffer, in bytes
    #[arg(long, default_value_t = reel_audio::sizing::MIN_BUFFER_BYTES, env = "REEL_MIN_BUFFER_BYTES")]
    min_buffer_bytes: u32,

    /// Largest ingest buffer, in bytes
    #[arg(long, default_value_t = reel_audio::sizing::MAX_BUFFER_BYTES, env = "REEL_MAX_BUFFER_BYTES")]
    max_buffer_bytes: u32,

    /// Print the render report as JSON
    #[arg(long, env = "REEL_JSON")]
    json: bool,
}

impl Args {
    const fn config(&self) -> RenderConfig {
        RenderConfig {
            buffer_seconds: self.buffer_seconds,
            min_buffer_bytes: self.min_buffer_bytes,
            max_buffer_bytes: self.max_buffer_bytes,
        }
    }
}

fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "reel=info,reel_audio=info".into()),
        )
        .init();

    let args = Args::parse();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match err.downcast_ref::<Error>() {
                Some(Error::Configuration { operation, status } | Error::Engine { operation, status }) => {
                    eprintln!("Error: {operation} {status}");
                }
                _ => eprintln!("Error: {err:#}"),
            }
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> anyhow::Result<()> {
    info!(
        "Rendering {} -> {}",
        args.source.display(),
        args.destination.display()
    );

    let renderer = OfflineRenderer::new(args.config());
    let report = renderer
        .render(&args.source, &args.destination)
        .inspect_err(|e| error!("Render failed: {e}"))?;

    if args.json {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
        println!("{json}");
    } else {
        print_summary(&args.destination, &report);
    }
    Ok(())
}

fn print_summary(destination: &std::path::Path, report: &RenderReport) {
    println!("Source:      {}", report.source_format);
    println!("Destination: {}", report.destination_format);
    println!(
        "Buffers:     {} bytes ingest ({} packets per read), {} bytes capture",
        report.buffer_byte_size, report.packets_per_read, report.capture_byte_size
    );
    #[allow(clippy::cast_precision_loss)]
    let seconds = report.frames_written as f64 / report.source_format.sample_rate;
    println!(
        "Wrote {} frames ({seconds:.2} s) to {}",
        report.frames_written,
        destination.display()
    );
}
