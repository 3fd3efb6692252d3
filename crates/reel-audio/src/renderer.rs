//! Offline render orchestration.
//!
//! Setup, drive and teardown of one render session: the source is read
//! through the render queue and every rendered chunk is appended to the
//! destination file.

use std::path::Path;
use std::sync::Arc;

use reel_core::{ChannelLayout, Error, Result, Status, StreamDescription};
use serde::Serialize;
use tracing::{debug, error, info};

use crate::buffer::CaptureBuffer;
use crate::capture::CaptureSink;
use crate::config::RenderConfig;
use crate::diagnostics::{DiagnosticSink, RenderProgress, TracingDiagnostics};
use crate::queue::RenderQueue;
use crate::session::RenderSession;
use crate::sizing::BufferSizing;
use crate::source::{ContainerSource, PacketSource};

/// Summary of a completed render.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderReport {
    pub source_format: StreamDescription,
    pub capture_format: StreamDescription,
    pub destination_format: StreamDescription,
    pub buffer_byte_size: u32,
    pub capture_byte_size: u32,
    pub packets_per_read: u32,
    pub packets_read: u64,
    pub frames_decoded: u64,
    pub frames_written: u64,
    /// Refill callback invocations that read from the source.
    pub refills: u64,
    /// Render pulls in the capture loop, not counting the priming pull.
    pub render_calls: u64,
    pub vbr: bool,
    /// Length of the packet-description array, present for VBR sources.
    pub packet_descriptions: Option<usize>,
    pub channel_layout: Option<ChannelLayout>,
}

/// Renders audio files to 16-bit PCM WAV files.
#[derive(Clone)]
pub struct OfflineRenderer {
    config: RenderConfig,
    diagnostics: Arc<dyn DiagnosticSink>,
}

impl Default for OfflineRenderer {
    fn default() -> Self {
        Self::new(RenderConfig::default())
    }
}

impl OfflineRenderer {
    pub fn new(config: RenderConfig) -> Self {
        Self {
            config,
            diagnostics: Arc::new(TracingDiagnostics),
        }
    }

    /// Route warnings and progress to `sink` instead of the log.
    #[must_use]
    pub fn with_diagnostics(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.diagnostics = sink;
        self
    }

    pub const fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Render the audio file at `source` to a WAV file at `destination`,
    /// replacing any existing file.
    ///
    /// On error no destination file is left behind.
    pub fn render(
        &self,
        source: impl AsRef<Path>,
        destination: impl AsRef<Path>,
    ) -> Result<RenderReport> {
        self.config.validate()?;
        let source = source.as_ref();
        info!("Rendering {}", source.display());
        let source = ContainerSource::open(source)?;
        self.render_source(source, destination)
    }

    /// Render packets from any source to a WAV file at `destination`.
    pub fn render_source<S: PacketSource>(
        &self,
        source: S,
        destination: impl AsRef<Path>,
    ) -> Result<RenderReport> {
        self.config.validate()?;
        let destination = destination.as_ref();

        let mut pipeline = Pipeline::new(self.diagnostics.as_ref());
        let outcome = pipeline
            .setup(source, destination, &self.config)
            .and_then(|()| pipeline.drive());
        let closed = pipeline.teardown(outcome.is_ok());

        let stats = outcome?;
        let frames_written = closed?.unwrap_or(0);

        let report = RenderReport {
            source_format: stats.source_format,
            capture_format: stats.capture_format,
            destination_format: stats.destination_format,
            buffer_byte_size: stats.sizing.buffer_byte_size,
            capture_byte_size: stats.sizing.capture_byte_size(),
            packets_per_read: stats.sizing.packets_to_read,
            packets_read: stats.packets_read,
            frames_decoded: stats.frames_decoded,
            frames_written,
            refills: stats.refills,
            render_calls: stats.render_calls,
            vbr: stats.source_format.is_vbr(),
            packet_descriptions: stats.packet_descriptions,
            channel_layout: stats.channel_layout,
        };

        info!(
            "Rendered {} frames to {} ({} packets, {} refills, {} pulls)",
            report.frames_written,
            destination.display(),
            report.packets_read,
            report.refills,
            report.render_calls
        );
        Ok(report)
    }
}

/// What the drive phase learned, collected before teardown.
struct DriveStats {
    source_format: StreamDescription,
    capture_format: StreamDescription,
    destination_format: StreamDescription,
    sizing: BufferSizing,
    packets_read: u64,
    frames_decoded: u64,
    refills: u64,
    render_calls: u64,
    packet_descriptions: Option<usize>,
    channel_layout: Option<ChannelLayout>,
}

/// Resources of one render session. Every field is released by
/// [`Pipeline::teardown`].
struct Pipeline<'a, S> {
    diagnostics: &'a dyn DiagnosticSink,
    queue: Option<RenderQueue>,
    session: Option<RenderSession<S>>,
    sink: Option<CaptureSink>,
    capture: Option<CaptureBuffer>,
    channel_layout: Option<ChannelLayout>,
    source_format: Option<StreamDescription>,
}

impl<'a, S: PacketSource> Pipeline<'a, S> {
    fn new(diagnostics: &'a dyn DiagnosticSink) -> Self {
        Self {
            diagnostics,
            queue: None,
            session: None,
            sink: None,
            capture: None,
            channel_layout: None,
            source_format: None,
        }
    }

    fn setup(&mut self, source: S, destination: &Path, config: &RenderConfig) -> Result<()> {
        let desc = source.description();
        info!("Source format: {desc}");
        self.source_format = Some(desc);

        let max_packet_size = source.max_packet_size()?;
        let sizing = BufferSizing::from_config(&desc, max_packet_size, config)?;
        let magic_cookie = source.magic_cookie();
        let channel_layout = source.channel_layout();
        let decoder_spec = source.decoder_spec();
        self.session = Some(RenderSession::new(source, sizing));

        let queue = self.queue.insert(RenderQueue::new(desc, decoder_spec)?);

        if let Some(cookie) = magic_cookie {
            debug!("Magic cookie: {} bytes", cookie.len());
            queue.set_magic_cookie(cookie)?;
        }
        if let Some(layout) = channel_layout {
            debug!("Channel layout: {} channels", layout.channel_count());
            queue.set_channel_layout(layout)?;
            self.channel_layout = Some(layout);
        }

        queue.allocate_buffer(sizing.buffer_byte_size)?;

        let capture_format =
            StreamDescription::canonical_capture(desc.sample_rate, desc.channels_per_frame);
        queue.set_offline_render_format(capture_format, self.channel_layout)?;
        debug!("Capture format: {capture_format}");

        let destination_format =
            StreamDescription::pcm_i16_le(desc.sample_rate, desc.channels_per_frame);
        let sink = self
            .sink
            .insert(CaptureSink::create(destination, &destination_format)?);
        sink.set_client_format(capture_format)?;

        self.capture = Some(CaptureBuffer::new(
            sizing.capture_byte_size(),
            &capture_format,
        )?);

        debug!(
            "Ingest buffer {} bytes ({} packets per read), capture buffer {} bytes",
            sizing.buffer_byte_size,
            sizing.packets_to_read,
            sizing.capture_byte_size()
        );
        Ok(())
    }

    fn drive(&mut self) -> Result<DriveStats> {
        let (Some(queue), Some(session), Some(sink), Some(capture), Some(source_format)) = (
            self.queue.as_mut(),
            self.session.as_mut(),
            self.sink.as_mut(),
            self.capture.as_mut(),
            self.source_format,
        ) else {
            return Err(Error::engine("offline render", Status::INVALID_QUEUE_STATE));
        };

        queue.start()?;
        queue.render(session, 0, 0, capture)?;
        queue.refill_with(session)?;

        let capture_format = queue
            .capture_format()
            .copied()
            .ok_or_else(|| Error::engine("offline render", Status::INVALID_QUEUE_STATE))?;
        let request = capture.frame_capacity();
        let mut sample_time = 0u64;
        let mut render_calls = 0u64;

        loop {
            let frames = queue.render(session, sample_time, request, capture)?;
            render_calls += 1;
            self.diagnostics.progress(&RenderProgress {
                sample_time,
                requested_frames: request,
                rendered_frames: frames,
                requested_bytes: capture_format.frames_to_bytes(request),
                rendered_bytes: capture.byte_size(),
            });

            if frames == 0 && !session.is_flushed() {
                error!("Render stalled at sample time {sample_time}");
                return Err(Error::engine("offline render", Status::BUFFER_EMPTY));
            }

            sink.write(frames, capture)?;
            sample_time += u64::from(frames);

            if session.is_flushed() {
                break;
            }
        }

        if sample_time != queue.frames_decoded() {
            error!(
                "Wrote {} frames but decoded {}",
                sample_time,
                queue.frames_decoded()
            );
            return Err(Error::engine("offline render", Status::INVALID_TIMESTAMP));
        }

        Ok(DriveStats {
            source_format,
            capture_format,
            destination_format: StreamDescription::pcm_i16_le(
                source_format.sample_rate,
                source_format.channels_per_frame,
            ),
            sizing: *session.sizing(),
            packets_read: session.packets_read(),
            frames_decoded: queue.frames_decoded(),
            refills: session.refills(),
            render_calls,
            packet_descriptions: session.packet_description_count(),
            channel_layout: self.channel_layout,
        })
    }

    /// Release everything in order: queue, source, destination, descriptors.
    ///
    /// The destination is finalized when `keep` is set and discarded
    /// otherwise; a discard that cannot remove the file is only reported to
    /// the diagnostics sink, since the session has already failed. Returns
    /// the frames in the finalized file.
    fn teardown(&mut self, keep: bool) -> Result<Option<u64>> {
        if let Some(mut queue) = self.queue.take() {
            queue.dispose();
        }

        let descriptions = self.session.take().and_then(|session| {
            let (source, descriptions) = session.into_parts();
            drop(source);
            descriptions
        });

        let closed = match self.sink.take() {
            Some(sink) if keep => sink.finalize().map(Some),
            Some(sink) => {
                if let Err(e) = sink.discard() {
                    self.diagnostics.warning(
                        e.operation().unwrap_or("remove destination file"),
                        e.status().unwrap_or(Status::IO_ERROR),
                    );
                }
                Ok(None)
            }
            None => Ok(None),
        };

        drop(descriptions);
        self.channel_layout = None;
        self.capture = None;
        debug!("Render session torn down");
        closed
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::diagnostics::RecordingDiagnostics;
    use crate::source::MemorySource;
    use reel_core::FormatId;

    fn pcm_source(frames: usize, channels: u32) -> MemorySource {
        let desc = StreamDescription::pcm_i16_le(22050.0, channels);
        let data: Vec<u8> = (0..frames * channels as usize)
            .flat_map(|i| ((i % 2000) as i16 - 1000).to_le_bytes())
            .collect();
        MemorySource::from_pcm(desc, data)
    }

    #[test]
    fn test_render_memory_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.wav");
        let report = OfflineRenderer::default()
            .render_source(pcm_source(30_000, 2), &path)
            .unwrap();

        assert_eq!(report.frames_written, 30_000);
        assert_eq!(report.frames_decoded, 30_000);
        assert_eq!(report.packets_read, 30_000);
        assert!(!report.vbr);
        assert_eq!(report.packet_descriptions, None);
        assert_eq!(report.capture_byte_size, report.buffer_byte_size / 2);

        let reader = hound::WavReader::open(&path).unwrap();
        assert_eq!(reader.duration(), 30_000);
        assert_eq!(reader.spec().channels, 2);
        assert_eq!(reader.spec().sample_rate, 22050);
    }

    #[test]
    fn test_report_serializes_to_json() {
        let dir = tempfile::tempdir().unwrap();
        let report = OfflineRenderer::default()
            .render_source(pcm_source(1000, 1), dir.path().join("out.wav"))
            .unwrap();

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["frames_written"], 1000);
        assert_eq!(json["vbr"], false);
        assert!(json["packet_descriptions"].is_null());
        assert_eq!(json["destination_format"]["bits_per_channel"], 16);
    }

    #[test]
    fn test_progress_reported_per_pull() {
        let dir = tempfile::tempdir().unwrap();
        let diagnostics = Arc::new(RecordingDiagnostics::new());
        let renderer = OfflineRenderer::default().with_diagnostics(diagnostics.clone());
        let report = renderer
            .render_source(pcm_source(5000, 1), dir.path().join("out.wav"))
            .unwrap();

        let progress = diagnostics.progress_reports();
        assert_eq!(progress.len() as u64, report.render_calls);
        let total: u64 = progress.iter().map(|p| u64::from(p.rendered_frames)).sum();
        assert_eq!(total, 5000);
        let last = progress.last().unwrap();
        assert!(last.rendered_frames < last.requested_frames);
    }

    #[test]
    fn test_mismatched_layout_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.wav");
        let diagnostics = Arc::new(RecordingDiagnostics::new());
        let source = pcm_source(100, 2).with_channel_layout(ChannelLayout::default_for(6));
        let err = OfflineRenderer::default()
            .with_diagnostics(diagnostics.clone())
            .render_source(source, &path)
            .unwrap_err();

        assert!(err.is_engine());
        assert_eq!(err.operation(), Some("set channel layout"));
        assert_eq!(err.status(), Some(Status::INVALID_CHANNEL_LAYOUT));
        assert!(!path.exists());
        assert!(diagnostics.warnings().is_empty());
    }

    #[test]
    fn test_matching_layout_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let source = pcm_source(100, 2).with_channel_layout(ChannelLayout::default_for(2));
        let report = OfflineRenderer::default()
            .render_source(source, dir.path().join("out.wav"))
            .unwrap();
        assert_eq!(report.channel_layout, Some(ChannelLayout::default_for(2)));
    }

    /// Replaces the destination with a directory, then fails the read.
    struct HijackingSource {
        inner: MemorySource,
        destination: std::path::PathBuf,
    }

    impl PacketSource for HijackingSource {
        fn description(&self) -> StreamDescription {
            self.inner.description()
        }

        fn max_packet_size(&self) -> Result<u32> {
            self.inner.max_packet_size()
        }

        fn decoder_spec(&self) -> crate::decode::DecoderSpec {
            self.inner.decoder_spec()
        }

        fn read_packets(
            &mut self,
            _start_packet: u64,
            _max_packets: u32,
            _buffer: &mut [u8],
            _descriptions: Option<&mut [reel_core::PacketDescription]>,
        ) -> Result<crate::source::PacketRead> {
            std::fs::remove_file(&self.destination).unwrap();
            std::fs::create_dir(&self.destination).unwrap();
            std::fs::write(self.destination.join("keep"), b"keep").unwrap();
            Err(Error::engine("read packets", Status::IO_ERROR))
        }
    }

    #[test]
    fn test_failed_discard_is_a_warning() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.wav");
        let diagnostics = Arc::new(RecordingDiagnostics::new());
        let source = HijackingSource {
            inner: pcm_source(100, 1),
            destination: path.clone(),
        };

        let err = OfflineRenderer::default()
            .with_diagnostics(diagnostics.clone())
            .render_source(source, &path)
            .unwrap_err();

        // The render error wins; the cleanup problem is only reported.
        assert_eq!(err.operation(), Some("read packets"));
        let warnings = diagnostics.warnings();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].0, "remove destination file");
    }

    #[test]
    fn test_decode_failure_removes_destination() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.wav");
        // Compressed description with raw PCM decoding cannot be decoded.
        let desc = StreamDescription::compressed(FormatId::Flac, 44100.0, 1, 4096);
        let source = MemorySource::new(desc, vec![vec![0; 64]; 8]);

        let err = OfflineRenderer::default()
            .render_source(source, &path)
            .unwrap_err();
        assert!(err.is_engine());
        assert_eq!(err.operation(), Some("create decoder"));
        assert!(!path.exists());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.wav");
        let config = RenderConfig {
            buffer_seconds: 0.0,
            ..RenderConfig::default()
        };
        let err = OfflineRenderer::new(config)
            .render_source(pcm_source(10, 1), &path)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
        assert!(!path.exists());
    }
}
