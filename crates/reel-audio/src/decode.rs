//! Packet decoding for the render queue.
//!
//! Linear PCM packets are converted directly; everything else goes through a
//! symphonia codec built from the source's codec parameters.

use bytes::Bytes;
use reel_core::{Error, Result, Status, StreamDescription};
use symphonia::core::{
    audio::SampleBuffer,
    codecs::{CodecParameters, Decoder, DecoderOptions},
    errors::Error as SymphoniaError,
    formats::Packet,
};
use tracing::{debug, error};

use crate::pcm::PcmLayout;

/// Upper bound on decoded frames per packet when the codec does not say.
pub const DEFAULT_MAX_PACKET_FRAMES: usize = 65536;

/// How packets of a stream are turned into samples.
#[derive(Debug, Clone)]
pub enum DecoderSpec {
    /// Packets hold raw PCM laid out as the stream description says.
    LinearPcm,
    /// Packets are decoded by a symphonia codec.
    ///
    /// The parameters carry no initialization data; the magic cookie set on
    /// the queue is attached when the decoder is created.
    Codec(Box<CodecParameters>),
}

/// Turns packets into interleaved f32 samples.
pub trait PacketDecoder {
    /// Decode one packet of `frames` frames (0 when unknown).
    ///
    /// Returns the decoded samples, valid until the next call.
    fn decode(&mut self, packet: &[u8], frames: u32) -> Result<&[f32]>;

    /// Largest number of frames a single decode can produce for a packet of
    /// `packet_bytes` bytes.
    fn max_frames(&self, packet_bytes: usize) -> usize;

    /// Whether a run of consecutive packets may be decoded in one call.
    fn accepts_packed_packets(&self) -> bool {
        false
    }
}

/// Build the decoder for a stream.
pub fn make_decoder(
    spec: &DecoderSpec,
    desc: &StreamDescription,
    magic_cookie: Option<&Bytes>,
) -> Result<Box<dyn PacketDecoder>> {
    match spec {
        DecoderSpec::LinearPcm => {
            let layout = PcmLayout::from_description(desc).ok_or_else(|| {
                Error::engine("create decoder", Status::UNSUPPORTED_FORMAT)
            })?;
            if magic_cookie.is_some() {
                debug!("Ignoring magic cookie for linear PCM stream");
            }
            Ok(Box::new(PcmDecoder::new(layout)))
        }
        DecoderSpec::Codec(params) => {
            let mut params = params.as_ref().clone();
            params.extra_data = magic_cookie.map(|cookie| cookie.to_vec().into_boxed_slice());
            Ok(Box::new(CodecDecoder::new(&params, desc)?))
        }
    }
}

/// Map a symphonia error onto a status code.
pub(crate) fn symphonia_status(err: &SymphoniaError) -> Status {
    match err {
        SymphoniaError::IoError(e) => Status::from_io(e),
        SymphoniaError::DecodeError(_) => Status::DECODE_FAILED,
        SymphoniaError::SeekError(_) => Status::INVALID_PACKET_OFFSET,
        SymphoniaError::Unsupported(_) => Status::UNSUPPORTED_FORMAT,
        SymphoniaError::LimitError(_) => Status::BUFFER_TOO_SMALL,
        SymphoniaError::ResetRequired => Status::INVALID_QUEUE_STATE,
    }
}

/// Decoder for linear PCM packets.
pub struct PcmDecoder {
    layout: PcmLayout,
    samples: Vec<f32>,
}

impl PcmDecoder {
    pub const fn new(layout: PcmLayout) -> Self {
        Self {
            layout,
            samples: Vec::new(),
        }
    }
}

impl PacketDecoder for PcmDecoder {
    fn decode(&mut self, packet: &[u8], _frames: u32) -> Result<&[f32]> {
        if packet.len() % self.layout.bytes_per_frame() != 0 {
            error!(
                "PCM packet of {} bytes is not a whole number of {}-byte frames",
                packet.len(),
                self.layout.bytes_per_frame()
            );
            return Err(Error::engine("decode packet", Status::INVALID_PACKET_SIZE));
        }

        self.samples.clear();
        self.layout.decode_into(packet, &mut self.samples);
        Ok(&self.samples)
    }

    fn max_frames(&self, packet_bytes: usize) -> usize {
        packet_bytes / self.layout.bytes_per_frame()
    }

    fn accepts_packed_packets(&self) -> bool {
        true
    }
}

/// Decoder wrapping a symphonia codec.
pub struct CodecDecoder {
    decoder: Box<dyn Decoder>,
    sample_buf: Option<SampleBuffer<f32>>,
    sample_buf_frames: usize,
    channels: usize,
    max_packet_frames: usize,
    next_ts: u64,
}

impl CodecDecoder {
    pub fn new(params: &CodecParameters, desc: &StreamDescription) -> Result<Self> {
        let decoder = symphonia::default::get_codecs()
            .make(params, &DecoderOptions::default())
            .map_err(|e| {
                error!("Failed to create decoder: {e}");
                Error::engine("create decoder", symphonia_status(&e))
            })?;

        let max_packet_frames = params
            .max_frames_per_packet
            .map_or(DEFAULT_MAX_PACKET_FRAMES, |frames| frames as usize);

        Ok(Self {
            decoder,
            sample_buf: None,
            sample_buf_frames: 0,
            channels: desc.channels_per_frame as usize,
            max_packet_frames,
            next_ts: 0,
        })
    }
}

impl PacketDecoder for CodecDecoder {
    fn decode(&mut self, packet: &[u8], frames: u32) -> Result<&[f32]> {
        let packet = Packet::new_from_slice(0, self.next_ts, u64::from(frames), packet);

        let decoded = self.decoder.decode(&packet).map_err(|e| {
            error!("Decode failed at ts {}: {e}", self.next_ts);
            Error::engine("decode packet", symphonia_status(&e))
        })?;

        let decoded_frames = decoded.frames();
        if decoded_frames == 0 {
            return Ok(&[]);
        }

        let spec = *decoded.spec();
        if spec.channels.count() != self.channels {
            error!(
                "Decoder produced {} channels, stream has {}",
                spec.channels.count(),
                self.channels
            );
            return Err(Error::engine("decode packet", Status::DECODE_FAILED));
        }

        if self.sample_buf.is_none() || self.sample_buf_frames < decoded.capacity() {
            self.sample_buf_frames = decoded.capacity();
            self.sample_buf = Some(SampleBuffer::new(self.sample_buf_frames as u64, spec));
        }

        self.next_ts += decoded_frames as u64;

        match self.sample_buf.as_mut() {
            Some(buf) => {
                buf.copy_interleaved_ref(decoded);
                Ok(buf.samples())
            }
            None => Ok(&[]),
        }
    }

    fn max_frames(&self, _packet_bytes: usize) -> usize {
        self.max_packet_frames
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use reel_core::FormatId;

    #[test]
    #[allow(clippy::float_cmp)]
    fn test_pcm_decoder() {
        let desc = StreamDescription::pcm_i16_le(44100.0, 2);
        let mut decoder = make_decoder(&DecoderSpec::LinearPcm, &desc, None).unwrap();
        assert!(decoder.accepts_packed_packets());
        assert_eq!(decoder.max_frames(4096), 1024);

        let mut packet = Vec::new();
        for value in [16384i16, -16384, 0, 8192] {
            packet.extend_from_slice(&value.to_le_bytes());
        }
        let samples = decoder.decode(&packet, 0).unwrap();
        assert_eq!(samples, &[0.5, -0.5, 0.0, 0.25]);
    }

    #[test]
    fn test_pcm_decoder_rejects_partial_frame() {
        let desc = StreamDescription::pcm_i16_le(44100.0, 2);
        let mut decoder = make_decoder(&DecoderSpec::LinearPcm, &desc, None).unwrap();
        let err = decoder.decode(&[0, 0, 0], 0).unwrap_err();
        assert!(err.is_engine());
        assert_eq!(err.status(), Some(Status::INVALID_PACKET_SIZE));
    }

    #[test]
    fn test_linear_pcm_spec_needs_pcm_description() {
        let desc = StreamDescription::compressed(FormatId::Flac, 44100.0, 2, 4096);
        let err = make_decoder(&DecoderSpec::LinearPcm, &desc, None).err().unwrap();
        assert_eq!(err.operation(), Some("create decoder"));
        assert_eq!(err.status(), Some(Status::UNSUPPORTED_FORMAT));
    }

    #[test]
    fn test_symphonia_status_mapping() {
        assert_eq!(
            symphonia_status(&SymphoniaError::DecodeError("bad frame")),
            Status::DECODE_FAILED
        );
        assert_eq!(
            symphonia_status(&SymphoniaError::Unsupported("codec")),
            Status::UNSUPPORTED_FORMAT
        );
        let eof = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "end");
        assert_eq!(
            symphonia_status(&SymphoniaError::IoError(eof)),
            Status::END_OF_FILE
        );
    }
}
