//! End-to-end renders of generated WAV fixtures.

#![allow(clippy::unwrap_used)] // Tests use unwrap for brevity

use std::path::Path;
use std::sync::Arc;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use reel_audio::{MemorySource, OfflineRenderer, RecordingDiagnostics, RenderConfig};
use reel_core::{FormatId, Status, StreamDescription};

/// Deterministic 16-bit test signal covering the full sample range.
fn test_signal(frames: usize) -> Vec<i16> {
    (0..frames)
        .map(|i| ((i as i64 * 7919) % 65536 - 32768) as i16)
        .collect()
}

fn write_wav_i16(path: &Path, sample_rate: u32, channels: u16, samples: &[i16]) {
    let spec = WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(path, spec).unwrap();
    for &sample in samples {
        writer.write_sample(sample).unwrap();
    }
    writer.finalize().unwrap();
}

fn read_wav_i16(path: &Path) -> (WavSpec, Vec<i16>) {
    let mut reader = WavReader::open(path).unwrap();
    let spec = reader.spec();
    let samples = reader.samples::<i16>().map(|s| s.unwrap()).collect();
    (spec, samples)
}

#[test]
fn test_one_second_mono_renders_exact_frames() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("source.wav");
    let destination = dir.path().join("rendered.wav");
    let signal = test_signal(44100);
    write_wav_i16(&source, 44100, 1, &signal);

    let report = OfflineRenderer::default()
        .render(&source, &destination)
        .unwrap();

    assert_eq!(report.frames_written, 44100);
    assert_eq!(report.buffer_byte_size, 65536);
    assert_eq!(report.packets_per_read, 32768);
    assert_eq!(report.capture_byte_size, 32768);
    assert!(!report.vbr);
    assert_eq!(report.packet_descriptions, None);

    let (spec, samples) = read_wav_i16(&destination);
    assert_eq!(spec.sample_rate, 44100);
    assert_eq!(spec.channels, 1);
    assert_eq!(spec.bits_per_sample, 16);
    assert_eq!(spec.sample_format, SampleFormat::Int);
    assert_eq!(samples, signal);
}

#[test]
fn test_stereo_render_preserves_interleaving() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("stereo.wav");
    let destination = dir.path().join("stereo-out.wav");
    let signal = test_signal(2 * 48000 / 3);
    write_wav_i16(&source, 48000, 2, &signal);

    let report = OfflineRenderer::default()
        .render(&source, &destination)
        .unwrap();
    assert_eq!(report.frames_written, 16000);

    let (spec, samples) = read_wav_i16(&destination);
    assert_eq!(spec.channels, 2);
    assert_eq!(spec.sample_rate, 48000);
    assert_eq!(samples, signal);
}

#[test]
fn test_render_twice_is_byte_identical() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("source.wav");
    let first = dir.path().join("first.wav");
    let second = dir.path().join("second.wav");
    write_wav_i16(&source, 22050, 2, &test_signal(30_000));

    let renderer = OfflineRenderer::default();
    renderer.render(&source, &first).unwrap();
    renderer.render(&source, &second).unwrap();

    assert_eq!(std::fs::read(&first).unwrap(), std::fs::read(&second).unwrap());
}

#[test]
fn test_missing_source_is_configuration_error() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("does-not-exist.wav");
    let destination = dir.path().join("out.wav");

    let err = OfflineRenderer::default()
        .render(&source, &destination)
        .unwrap_err();

    assert!(err.is_configuration());
    assert_eq!(err.operation(), Some("open source file"));
    assert_eq!(err.status(), Some(Status::FILE_NOT_FOUND));
    assert_eq!(err.to_string(), "open source file: -43");
    assert!(!destination.exists());
}

#[test]
fn test_unrecognized_source_is_configuration_error() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("notes.txt");
    let destination = dir.path().join("out.wav");
    std::fs::write(&source, "this is not audio, just some words in a file").unwrap();

    let err = OfflineRenderer::default()
        .render(&source, &destination)
        .unwrap_err();

    assert!(err.is_configuration());
    assert_eq!(err.operation(), Some("read source data format"));
    assert!(!destination.exists());
}

#[test]
fn test_existing_destination_is_replaced() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("source.wav");
    let destination = dir.path().join("out.wav");
    write_wav_i16(&source, 8000, 1, &test_signal(800));
    std::fs::write(&destination, vec![0xAB; 200_000]).unwrap();

    OfflineRenderer::default()
        .render(&source, &destination)
        .unwrap();

    let (_, samples) = read_wav_i16(&destination);
    assert_eq!(samples.len(), 800);
    assert!(std::fs::metadata(&destination).unwrap().len() < 200_000);
}

#[test]
fn test_24_bit_source_converts_to_16_bit() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("source24.wav");
    let destination = dir.path().join("out.wav");
    let signal = test_signal(4410);

    let spec = WavSpec {
        channels: 1,
        sample_rate: 44100,
        bits_per_sample: 24,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(&source, spec).unwrap();
    for &sample in &signal {
        writer.write_sample(i32::from(sample) * 256).unwrap();
    }
    writer.finalize().unwrap();

    let report = OfflineRenderer::default()
        .render(&source, &destination)
        .unwrap();
    assert_eq!(report.source_format.bits_per_channel, 24);
    assert_eq!(report.destination_format.bits_per_channel, 16);

    let (_, samples) = read_wav_i16(&destination);
    assert_eq!(samples, signal);
}

#[test]
fn test_empty_source_renders_empty_file() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("empty.wav");
    let destination = dir.path().join("out.wav");
    write_wav_i16(&source, 44100, 2, &[]);

    let report = OfflineRenderer::default()
        .render(&source, &destination)
        .unwrap();

    assert_eq!(report.frames_written, 0);
    assert_eq!(report.packets_read, 0);
    let (spec, samples) = read_wav_i16(&destination);
    assert_eq!(spec.channels, 2);
    assert!(samples.is_empty());
}

#[test]
fn test_flush_drains_everything_once() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("source.wav");
    let destination = dir.path().join("out.wav");
    // Not a multiple of the 8192-frame capture request.
    write_wav_i16(&source, 44100, 1, &test_signal(50_001));

    let diagnostics = Arc::new(RecordingDiagnostics::new());
    let report = OfflineRenderer::default()
        .with_diagnostics(diagnostics.clone())
        .render(&source, &destination)
        .unwrap();

    assert_eq!(report.frames_written, 50_001);
    assert_eq!(report.frames_written, report.frames_decoded);

    let progress = diagnostics.progress_reports();
    let short: Vec<_> = progress
        .iter()
        .filter(|p| p.rendered_frames < p.requested_frames)
        .collect();
    // Only the pull that follows the flush comes back short.
    assert_eq!(short.len(), 1);
    assert_eq!(short[0].rendered_frames, 50_001 % 8192);
    assert!(std::ptr::eq(short[0], progress.last().unwrap()));
}

#[test]
fn test_small_buffers_from_config() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("source.wav");
    let destination = dir.path().join("out.wav");
    let signal = test_signal(10_000);
    write_wav_i16(&source, 44100, 1, &signal);

    let config = RenderConfig {
        buffer_seconds: 0.05,
        min_buffer_bytes: 1024,
        max_buffer_bytes: 4096,
    };
    let report = OfflineRenderer::new(config)
        .render(&source, &destination)
        .unwrap();

    // 44100 * 0.05 * 2 = 4410 bytes, clamped to 4096.
    assert_eq!(report.buffer_byte_size, 4096);
    assert_eq!(report.packets_per_read, 2048);
    assert_eq!(report.refills, 5 + 1);

    let (_, samples) = read_wav_i16(&destination);
    assert_eq!(samples, signal);
}

#[test]
fn test_vbr_source_uses_packet_descriptions() {
    let dir = tempfile::tempdir().unwrap();
    let destination = dir.path().join("out.wav");

    // Linear PCM carried in packets of varying size.
    let description = StreamDescription {
        bytes_per_packet: 0,
        frames_per_packet: 0,
        ..StreamDescription::pcm_i16_le(16000.0, 1)
    };
    let signal = test_signal(12_000);
    let mut packets = Vec::new();
    let mut offset = 0;
    let mut size = 1;
    while offset < signal.len() {
        let end = (offset + size).min(signal.len());
        packets.push(
            signal[offset..end]
                .iter()
                .flat_map(|s| s.to_le_bytes())
                .collect::<Vec<u8>>(),
        );
        offset = end;
        size = size % 700 + 37;
    }
    let source = MemorySource::new(description, packets);

    let report = OfflineRenderer::default()
        .render_source(source, &destination)
        .unwrap();

    assert!(report.vbr);
    assert_eq!(
        report.packet_descriptions,
        Some(report.packets_per_read as usize)
    );
    assert_eq!(report.frames_written, 12_000);

    let (_, samples) = read_wav_i16(&destination);
    assert_eq!(samples, signal);
}

#[test]
fn test_vbr_source_without_decoder_fails_cleanly() {
    let dir = tempfile::tempdir().unwrap();
    let destination = dir.path().join("out.wav");
    let description = StreamDescription::compressed(FormatId::Aac, 44100.0, 2, 1024);
    let source = MemorySource::new(description, vec![vec![0xFF; 300]; 10]);

    let err = OfflineRenderer::default()
        .render_source(source, &destination)
        .unwrap_err();

    assert!(err.is_engine());
    assert!(!destination.exists());
}

#[test]
fn test_spawn_render_on_worker() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("source.wav");
    let destination = dir.path().join("out.wav");
    let signal = test_signal(5000);
    write_wav_i16(&source, 32000, 1, &signal);

    let handle = OfflineRenderer::default()
        .spawn_render(&source, &destination)
        .unwrap();
    let report = handle.wait().unwrap();

    assert_eq!(report.frames_written, 5000);
    let (_, samples) = read_wav_i16(&destination);
    assert_eq!(samples, signal);
}

#[test]
fn test_spawn_render_reports_errors() {
    let dir = tempfile::tempdir().unwrap();
    let handle = OfflineRenderer::default()
        .spawn_render(dir.path().join("missing.wav"), dir.path().join("out.wav"))
        .unwrap();
    let err = handle.wait().unwrap_err();
    assert_eq!(err.operation(), Some("open source file"));
}
