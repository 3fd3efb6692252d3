//! Packet sources: sequential readers of encoded packets.

use std::fs::File;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use reel_core::{
    ChannelLayout, Error, FormatFlags, FormatId, PacketDescription, Result, Status,
    StreamDescription,
};
use symphonia::core::{
    codecs::{self, CodecParameters, CodecType, CODEC_TYPE_NULL},
    errors::Error as SymphoniaError,
    formats::{FormatOptions, FormatReader},
    io::{MediaSourceStream, MediaSourceStreamOptions},
    meta::MetadataOptions,
    probe::Hint,
};
use tracing::{debug, trace, warn};

use crate::decode::{symphonia_status, DecoderSpec};

/// Result of a packet read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PacketRead {
    /// Packets copied into the buffer. Zero means end of stream.
    pub packets: u32,
    /// Bytes copied into the buffer.
    pub bytes: u32,
}

/// Sequential reader of encoded packets.
pub trait PacketSource {
    /// Format of the packets this source yields.
    fn description(&self) -> StreamDescription;

    /// Upper bound on the size of any single packet, in bytes.
    fn max_packet_size(&self) -> Result<u32>;

    /// Codec initialization data, if the stream carries any.
    fn magic_cookie(&self) -> Option<Bytes> {
        None
    }

    /// Speaker layout, if the container declares one.
    fn channel_layout(&self) -> Option<ChannelLayout> {
        None
    }

    /// How the render queue should decode the packets.
    fn decoder_spec(&self) -> DecoderSpec;

    /// Read up to `max_packets` packets starting at `start_packet` into
    /// `buffer`.
    ///
    /// VBR streams fill one entry of `descriptions` per packet read and
    /// require the slice; CBR streams ignore it. Returns zero packets at the
    /// end of the stream.
    fn read_packets(
        &mut self,
        start_packet: u64,
        max_packets: u32,
        buffer: &mut [u8],
        descriptions: Option<&mut [PacketDescription]>,
    ) -> Result<PacketRead>;
}

/// Copies packets into a caller buffer, recording descriptors for VBR reads.
struct PacketFill<'a> {
    buffer: &'a mut [u8],
    descriptions: Option<&'a mut [PacketDescription]>,
    limit: u32,
    packets: u32,
    bytes: usize,
}

impl<'a> PacketFill<'a> {
    fn new(
        vbr: bool,
        max_packets: u32,
        buffer: &'a mut [u8],
        descriptions: Option<&'a mut [PacketDescription]>,
    ) -> Result<Self> {
        let (limit, descriptions) = match descriptions {
            Some(descs) if vbr => {
                let limit = max_packets.min(u32::try_from(descs.len()).unwrap_or(u32::MAX));
                (limit, Some(descs))
            }
            None if vbr => {
                return Err(Error::engine("read packets", Status::INVALID_PACKET_SIZE));
            }
            _ => (max_packets, None),
        };

        Ok(Self {
            buffer,
            descriptions,
            limit,
            packets: 0,
            bytes: 0,
        })
    }

    fn capacity(&self) -> usize {
        self.buffer.len()
    }

    fn remaining(&self) -> usize {
        self.buffer.len() - self.bytes
    }

    /// Packets that may still be added.
    const fn packets_left(&self) -> u32 {
        self.limit - self.packets
    }

    /// Whether a packet of `len` bytes fits; a packet larger than the whole
    /// buffer can never fit and is an error.
    fn fits(&self, len: usize) -> Result<bool> {
        if len > self.capacity() {
            warn!(
                "Packet of {} bytes exceeds read buffer of {} bytes",
                len,
                self.capacity()
            );
            return Err(Error::engine("read packets", Status::BUFFER_TOO_SMALL));
        }
        Ok(len <= self.remaining())
    }

    /// Append one packet.
    fn push(&mut self, data: &[u8], variable_frames: u32) {
        let start = self.bytes;
        self.buffer[start..start + data.len()].copy_from_slice(data);
        if let Some(descs) = self.descriptions.as_deref_mut() {
            descs[self.packets as usize] = PacketDescription {
                start_offset: start as u64,
                variable_frames,
                data_byte_size: data.len() as u32,
            };
        }
        self.bytes += data.len();
        self.packets += 1;
    }

    /// Append `count` fixed-size packets stored back to back in `data`.
    fn push_run(&mut self, data: &[u8], count: u32) {
        let start = self.bytes;
        self.buffer[start..start + data.len()].copy_from_slice(data);
        self.bytes += data.len();
        self.packets += count;
    }

    #[allow(clippy::cast_possible_truncation)]
    fn finish(self) -> PacketRead {
        PacketRead {
            packets: self.packets,
            bytes: self.bytes as u32,
        }
    }
}

/// How a container track maps onto packets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TrackKind {
    /// Raw PCM; each frame is one packet.
    Pcm { bytes_per_frame: usize },
    /// Compressed; each container packet is one packet.
    Compressed,
}

/// Packet source backed by a symphonia container reader.
pub struct ContainerSource {
    path: PathBuf,
    format: Box<dyn FormatReader>,
    track_id: u32,
    kind: TrackKind,
    description: StreamDescription,
    codec_params: CodecParameters,
    magic_cookie: Option<Bytes>,
    channel_layout: Option<ChannelLayout>,
    max_packet_size: u32,
    /// Next packet index.
    position: u64,
    /// Container data read but not yet handed out.
    pending: Vec<u8>,
    pending_pos: usize,
    pending_frames: u32,
    exhausted: bool,
}

impl ContainerSource {
    /// Open a container file and select its first decodable audio track.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let (format, track_id, codec_params) = probe(path)?;

        let sample_rate = codec_params.sample_rate.ok_or_else(|| {
            warn!("Source track has no sample rate");
            Error::configuration("read source data format", Status::UNSUPPORTED_FORMAT)
        })?;
        let channels = codec_params.channels.ok_or_else(|| {
            warn!("Source track has no channel map");
            Error::configuration("read source data format", Status::UNSUPPORTED_FORMAT)
        })?;
        #[allow(clippy::cast_possible_truncation)]
        let channel_count = channels.count() as u32;

        let (kind, description) = match pcm_description(codec_params.codec, sample_rate, channel_count)
        {
            Some(desc) => (
                TrackKind::Pcm {
                    bytes_per_frame: desc.bytes_per_frame as usize,
                },
                desc,
            ),
            None => {
                let format_id = format_id(codec_params.codec);
                let frames_per_packet = if matches!(format_id, FormatId::Vorbis | FormatId::Opus) {
                    0
                } else {
                    codec_params
                        .max_frames_per_packet
                        .and_then(|frames| u32::try_from(frames).ok())
                        .unwrap_or(0)
                };
                (
                    TrackKind::Compressed,
                    StreamDescription::compressed(
                        format_id,
                        f64::from(sample_rate),
                        channel_count,
                        frames_per_packet,
                    ),
                )
            }
        };

        let mut codec_params = codec_params;
        let magic_cookie = codec_params.extra_data.take().map(Bytes::from);
        let channel_layout = Some(ChannelLayout::from_mask(channels.bits()));

        let (format, max_packet_size) = match kind {
            TrackKind::Pcm { bytes_per_frame } => (format, bytes_per_frame as u32),
            TrackKind::Compressed => {
                // Packet sizes are only known by walking the container, after
                // which it is opened again at the first packet.
                let max = scan_max_packet_size(format, track_id)?;
                let (format, _, _) = probe(path)?;
                (format, max)
            }
        };

        debug!(
            "Opened {}: {} (max packet {} bytes, cookie {} bytes)",
            path.display(),
            description,
            max_packet_size,
            magic_cookie.as_ref().map_or(0, Bytes::len)
        );

        Ok(Self {
            path: path.to_path_buf(),
            format,
            track_id,
            kind,
            description,
            codec_params,
            magic_cookie,
            channel_layout,
            max_packet_size,
            position: 0,
            pending: Vec::new(),
            pending_pos: 0,
            pending_frames: 0,
            exhausted: false,
        })
    }

    /// Path the source was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the next container packet of the selected track into `pending`.
    ///
    /// Returns false at the end of the stream.
    fn next_container_packet(&mut self) -> Result<bool> {
        if self.exhausted {
            return Ok(false);
        }

        loop {
            match self.format.next_packet() {
                Ok(packet) => {
                    if packet.track_id() != self.track_id {
                        continue;
                    }
                    self.pending.clear();
                    self.pending.extend_from_slice(packet.buf());
                    self.pending_pos = 0;
                    self.pending_frames = u32::try_from(packet.dur()).unwrap_or(0);
                    return Ok(true);
                }
                Err(SymphoniaError::IoError(e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    trace!("End of stream at packet {}", self.position);
                    self.exhausted = true;
                    return Ok(false);
                }
                Err(e) => {
                    warn!("Failed to read packet {}: {e}", self.position);
                    return Err(Error::engine("read packets", symphonia_status(&e)));
                }
            }
        }
    }

    fn pending_len(&self) -> usize {
        self.pending.len() - self.pending_pos
    }

    fn read_frames(&mut self, fill: &mut PacketFill<'_>, bytes_per_frame: usize) -> Result<()> {
        loop {
            let wanted = (fill.remaining() / bytes_per_frame).min(fill.packets_left() as usize);
            if wanted == 0 {
                return Ok(());
            }

            if self.pending_len() < bytes_per_frame {
                let leftover = self.pending_len();
                if !self.next_container_packet()? {
                    if leftover > 0 {
                        warn!("Dropping {leftover} trailing bytes that do not form a frame");
                    }
                    return Ok(());
                }
                if leftover > 0 {
                    warn!("Dropping {leftover} bytes of a partial frame");
                }
                continue;
            }

            let frames = (self.pending_len() / bytes_per_frame).min(wanted);
            let end = self.pending_pos + frames * bytes_per_frame;
            #[allow(clippy::cast_possible_truncation)]
            fill.push_run(&self.pending[self.pending_pos..end], frames as u32);
            self.pending_pos = end;
        }
    }

    fn read_compressed(&mut self, fill: &mut PacketFill<'_>) -> Result<()> {
        let variable_frames = if self.description.frames_per_packet == 0 {
            None
        } else {
            Some(0)
        };

        while fill.packets_left() > 0 {
            if self.pending_len() == 0 && !self.next_container_packet()? {
                break;
            }

            let len = self.pending_len();
            if !fill.fits(len)? {
                // Held over to the next read.
                break;
            }

            let frames = variable_frames.unwrap_or(self.pending_frames);
            fill.push(&self.pending[self.pending_pos..], frames);
            self.pending_pos = self.pending.len();
        }
        Ok(())
    }
}

impl PacketSource for ContainerSource {
    fn description(&self) -> StreamDescription {
        self.description
    }

    fn max_packet_size(&self) -> Result<u32> {
        Ok(self.max_packet_size)
    }

    fn magic_cookie(&self) -> Option<Bytes> {
        self.magic_cookie.clone()
    }

    fn channel_layout(&self) -> Option<ChannelLayout> {
        self.channel_layout
    }

    fn decoder_spec(&self) -> DecoderSpec {
        match self.kind {
            TrackKind::Pcm { .. } => DecoderSpec::LinearPcm,
            TrackKind::Compressed => DecoderSpec::Codec(Box::new(self.codec_params.clone())),
        }
    }

    fn read_packets(
        &mut self,
        start_packet: u64,
        max_packets: u32,
        buffer: &mut [u8],
        descriptions: Option<&mut [PacketDescription]>,
    ) -> Result<PacketRead> {
        if start_packet != self.position {
            warn!(
                "Read at packet {} but source is at packet {}",
                start_packet, self.position
            );
            return Err(Error::engine("read packets", Status::INVALID_PACKET_OFFSET));
        }

        let mut fill = PacketFill::new(self.description.is_vbr(), max_packets, buffer, descriptions)?;
        match self.kind {
            TrackKind::Pcm { bytes_per_frame } => self.read_frames(&mut fill, bytes_per_frame)?,
            TrackKind::Compressed => self.read_compressed(&mut fill)?,
        }

        let read = fill.finish();
        self.position += u64::from(read.packets);
        trace!(
            "Read {} packets ({} bytes) from packet {}",
            read.packets,
            read.bytes,
            start_packet
        );
        Ok(read)
    }
}

fn probe(path: &Path) -> Result<(Box<dyn FormatReader>, u32, CodecParameters)> {
    let file = File::open(path).map_err(|e| {
        warn!("Failed to open {}: {e}", path.display());
        Error::configuration_io("open source file", &e)
    })?;
    let mss = MediaSourceStream::new(Box::new(file), MediaSourceStreamOptions::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|ext| ext.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| {
            warn!("Failed to probe {}: {e}", path.display());
            let status = match e {
                SymphoniaError::Unsupported(_) => Status::UNSUPPORTED_FILE_TYPE,
                ref other => symphonia_status(other),
            };
            Error::configuration("read source data format", status)
        })?;

    let format = probed.format;
    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| Error::configuration("read source data format", Status::NO_AUDIO_TRACK))?;

    let track_id = track.id;
    let codec_params = track.codec_params.clone();
    Ok((format, track_id, codec_params))
}

fn scan_max_packet_size(mut format: Box<dyn FormatReader>, track_id: u32) -> Result<u32> {
    let mut max = 0usize;
    let mut count = 0u64;
    loop {
        match format.next_packet() {
            Ok(packet) => {
                if packet.track_id() == track_id {
                    max = max.max(packet.buf().len());
                    count += 1;
                }
            }
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(e) => {
                warn!("Failed to scan packets: {e}");
                return Err(Error::configuration(
                    "get max packet size",
                    symphonia_status(&e),
                ));
            }
        }
    }
    debug!("Scanned {count} packets, largest {max} bytes");
    u32::try_from(max)
        .map_err(|_| Error::configuration("get max packet size", Status::INVALID_PACKET_SIZE))
}

/// Description of a raw PCM codec, or `None` for compressed codecs.
fn pcm_description(codec: CodecType, sample_rate: u32, channels: u32) -> Option<StreamDescription> {
    let signed = FormatFlags::IS_SIGNED_INTEGER;
    let big = FormatFlags::IS_BIG_ENDIAN;
    let float = FormatFlags::IS_FLOAT;

    let (bits, flags) = if codec == codecs::CODEC_TYPE_PCM_U8 {
        (8, FormatFlags::NONE)
    } else if codec == codecs::CODEC_TYPE_PCM_S8 {
        (8, signed)
    } else if codec == codecs::CODEC_TYPE_PCM_S16LE {
        (16, signed)
    } else if codec == codecs::CODEC_TYPE_PCM_S16BE {
        (16, signed | big)
    } else if codec == codecs::CODEC_TYPE_PCM_S24LE {
        (24, signed)
    } else if codec == codecs::CODEC_TYPE_PCM_S24BE {
        (24, signed | big)
    } else if codec == codecs::CODEC_TYPE_PCM_S32LE {
        (32, signed)
    } else if codec == codecs::CODEC_TYPE_PCM_S32BE {
        (32, signed | big)
    } else if codec == codecs::CODEC_TYPE_PCM_F32LE {
        (32, float)
    } else if codec == codecs::CODEC_TYPE_PCM_F32BE {
        (32, float | big)
    } else if codec == codecs::CODEC_TYPE_PCM_F64LE {
        (64, float)
    } else if codec == codecs::CODEC_TYPE_PCM_F64BE {
        (64, float | big)
    } else {
        return None;
    };

    Some(StreamDescription::linear_pcm(
        f64::from(sample_rate),
        channels,
        bits,
        flags,
    ))
}

fn format_id(codec: CodecType) -> FormatId {
    if codec == codecs::CODEC_TYPE_FLAC {
        FormatId::Flac
    } else if codec == codecs::CODEC_TYPE_ALAC {
        FormatId::Alac
    } else if codec == codecs::CODEC_TYPE_MP3
        || codec == codecs::CODEC_TYPE_MP2
        || codec == codecs::CODEC_TYPE_MP1
    {
        FormatId::Mp3
    } else if codec == codecs::CODEC_TYPE_AAC {
        FormatId::Aac
    } else if codec == codecs::CODEC_TYPE_VORBIS {
        FormatId::Vorbis
    } else if codec == codecs::CODEC_TYPE_OPUS {
        FormatId::Opus
    } else {
        FormatId::Other(u32::from_be_bytes(*b"????"))
    }
}

/// Packet source over packets held in memory.
///
/// Packets are addressed by index, so reads may start anywhere.
#[derive(Debug, Clone)]
pub struct MemorySource {
    description: StreamDescription,
    data: Bytes,
    /// Byte range of each packet in `data`.
    packets: Vec<(usize, usize)>,
    magic_cookie: Option<Bytes>,
    channel_layout: Option<ChannelLayout>,
    decoder_spec: DecoderSpec,
}

impl MemorySource {
    /// Source yielding `packets` in order.
    pub fn new(description: StreamDescription, packets: Vec<Vec<u8>>) -> Self {
        let mut data = Vec::with_capacity(packets.iter().map(Vec::len).sum());
        let mut ranges = Vec::with_capacity(packets.len());
        for packet in &packets {
            ranges.push((data.len(), packet.len()));
            data.extend_from_slice(packet);
        }
        Self {
            description,
            data: Bytes::from(data),
            packets: ranges,
            magic_cookie: None,
            channel_layout: None,
            decoder_spec: DecoderSpec::LinearPcm,
        }
    }

    /// Source over interleaved PCM bytes, one frame per packet.
    ///
    /// Trailing bytes that do not form a whole frame are dropped.
    pub fn from_pcm(description: StreamDescription, data: impl Into<Bytes>) -> Self {
        let data: Bytes = data.into();
        let frame = description.bytes_per_frame as usize;
        let packets = if frame == 0 {
            Vec::new()
        } else {
            (0..data.len() / frame).map(|i| (i * frame, frame)).collect()
        };
        Self {
            description,
            data,
            packets,
            magic_cookie: None,
            channel_layout: None,
            decoder_spec: DecoderSpec::LinearPcm,
        }
    }

    #[must_use]
    pub fn with_magic_cookie(mut self, cookie: impl Into<Bytes>) -> Self {
        self.magic_cookie = Some(cookie.into());
        self
    }

    #[must_use]
    pub fn with_channel_layout(mut self, layout: ChannelLayout) -> Self {
        self.channel_layout = Some(layout);
        self
    }

    #[must_use]
    pub fn with_decoder_spec(mut self, spec: DecoderSpec) -> Self {
        self.decoder_spec = spec;
        self
    }

    /// Number of packets held.
    pub fn packet_count(&self) -> usize {
        self.packets.len()
    }
}

impl PacketSource for MemorySource {
    fn description(&self) -> StreamDescription {
        self.description
    }

    fn max_packet_size(&self) -> Result<u32> {
        if !self.description.is_vbr() {
            return Ok(self.description.bytes_per_packet);
        }
        let max = self.packets.iter().map(|&(_, len)| len).max().unwrap_or(0);
        u32::try_from(max)
            .map_err(|_| Error::configuration("get max packet size", Status::INVALID_PACKET_SIZE))
    }

    fn magic_cookie(&self) -> Option<Bytes> {
        self.magic_cookie.clone()
    }

    fn channel_layout(&self) -> Option<ChannelLayout> {
        self.channel_layout
    }

    fn decoder_spec(&self) -> DecoderSpec {
        self.decoder_spec.clone()
    }

    fn read_packets(
        &mut self,
        start_packet: u64,
        max_packets: u32,
        buffer: &mut [u8],
        descriptions: Option<&mut [PacketDescription]>,
    ) -> Result<PacketRead> {
        let mut fill = PacketFill::new(self.description.is_vbr(), max_packets, buffer, descriptions)?;
        let start = usize::try_from(start_packet).unwrap_or(usize::MAX);

        for &(offset, len) in self.packets.iter().skip(start) {
            if fill.packets_left() == 0 || !fill.fits(len)? {
                break;
            }
            fill.push(&self.data[offset..offset + len], 0);
        }

        Ok(fill.finish())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn vbr_source() -> MemorySource {
        let desc = StreamDescription::compressed(FormatId::Flac, 44100.0, 1, 4096);
        MemorySource::new(desc, vec![vec![1; 10], vec![2; 30], vec![3; 20], vec![4; 5]])
    }

    #[test]
    fn test_memory_cbr_read() {
        let desc = StreamDescription::pcm_i16_le(8000.0, 1);
        let mut source = MemorySource::from_pcm(desc, vec![0u8, 1, 2, 3, 4, 5, 6]);
        assert_eq!(source.packet_count(), 3);
        assert_eq!(source.max_packet_size().unwrap(), 2);

        let mut buffer = [0u8; 4];
        let read = source.read_packets(0, 10, &mut buffer, None).unwrap();
        assert_eq!(read, PacketRead { packets: 2, bytes: 4 });
        assert_eq!(buffer, [0, 1, 2, 3]);

        let read = source.read_packets(2, 10, &mut buffer, None).unwrap();
        assert_eq!(read, PacketRead { packets: 1, bytes: 2 });

        let read = source.read_packets(3, 10, &mut buffer, None).unwrap();
        assert_eq!(read.packets, 0);
    }

    #[test]
    fn test_memory_vbr_descriptions() {
        let mut source = vbr_source();
        assert_eq!(source.max_packet_size().unwrap(), 30);

        let mut buffer = [0u8; 64];
        let mut descs = [PacketDescription::default(); 3];
        let read = source
            .read_packets(0, 3, &mut buffer, Some(&mut descs))
            .unwrap();
        assert_eq!(read, PacketRead { packets: 3, bytes: 60 });
        assert_eq!(descs[0], PacketDescription::new(0, 10));
        assert_eq!(descs[1], PacketDescription::new(10, 30));
        assert_eq!(descs[2], PacketDescription::new(40, 20));
        assert_eq!(&buffer[40..60], &[3; 20]);
    }

    #[test]
    fn test_memory_vbr_stops_when_full() {
        let mut source = vbr_source();
        let mut buffer = [0u8; 45];
        let mut descs = [PacketDescription::default(); 4];
        let read = source
            .read_packets(0, 4, &mut buffer, Some(&mut descs))
            .unwrap();
        assert_eq!(read.packets, 2);
        assert_eq!(read.bytes, 40);
    }

    #[test]
    fn test_descriptions_bound_packet_count() {
        let mut source = vbr_source();
        let mut buffer = [0u8; 128];
        let mut descs = [PacketDescription::default(); 1];
        let read = source
            .read_packets(0, 4, &mut buffer, Some(&mut descs))
            .unwrap();
        assert_eq!(read.packets, 1);
    }

    #[test]
    fn test_vbr_read_requires_descriptions() {
        let mut source = vbr_source();
        let mut buffer = [0u8; 64];
        let err = source.read_packets(0, 2, &mut buffer, None).unwrap_err();
        assert!(err.is_engine());
        assert_eq!(err.status(), Some(Status::INVALID_PACKET_SIZE));
    }

    #[test]
    fn test_packet_larger_than_buffer() {
        let mut source = vbr_source();
        let mut buffer = [0u8; 16];
        let mut descs = [PacketDescription::default(); 4];
        let err = source
            .read_packets(1, 4, &mut buffer, Some(&mut descs))
            .unwrap_err();
        assert_eq!(err.operation(), Some("read packets"));
        assert_eq!(err.status(), Some(Status::BUFFER_TOO_SMALL));
    }

    #[test]
    fn test_container_missing_file() {
        let err = ContainerSource::open("/nonexistent/reel/input.wav").err().unwrap();
        assert!(err.is_configuration());
        assert_eq!(err.operation(), Some("open source file"));
        assert_eq!(err.status(), Some(Status::FILE_NOT_FOUND));
    }

    #[test]
    fn test_pcm_codec_descriptions() {
        let desc = pcm_description(codecs::CODEC_TYPE_PCM_S24BE, 48000, 2).unwrap();
        assert_eq!(desc.bytes_per_frame, 6);
        assert!(desc.is_big_endian());
        assert!(!desc.is_vbr());

        assert!(pcm_description(codecs::CODEC_TYPE_FLAC, 48000, 2).is_none());
        assert_eq!(format_id(codecs::CODEC_TYPE_FLAC), FormatId::Flac);
    }
}
