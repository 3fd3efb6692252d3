//! Stream format descriptions.

#![allow(clippy::unwrap_used)] // Tests use unwrap for brevity

use std::fmt;
use std::ops::BitOr;

use serde::{Deserialize, Serialize};

/// Audio data format of a stream.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum FormatId {
    /// Uncompressed linear PCM.
    LinearPcm,
    /// FLAC (lossless).
    Flac,
    /// Apple Lossless.
    Alac,
    /// MPEG-1/2 Layer III.
    Mp3,
    /// AAC.
    Aac,
    /// Vorbis.
    Vorbis,
    /// Opus.
    Opus,
    /// Any other codec, identified by its four-character code.
    Other(u32),
}

impl FormatId {
    /// Four-character code of this format.
    pub const fn fourcc(&self) -> u32 {
        match self {
            Self::LinearPcm => u32::from_be_bytes(*b"lpcm"),
            Self::Flac => u32::from_be_bytes(*b"flac"),
            Self::Alac => u32::from_be_bytes(*b"alac"),
            Self::Mp3 => u32::from_be_bytes(*b".mp3"),
            Self::Aac => u32::from_be_bytes(*b"aac "),
            Self::Vorbis => u32::from_be_bytes(*b"vorb"),
            Self::Opus => u32::from_be_bytes(*b"opus"),
            Self::Other(code) => *code,
        }
    }

    /// Returns true for compressed formats.
    pub const fn is_compressed(&self) -> bool {
        !matches!(self, Self::LinearPcm)
    }
}

impl fmt::Display for FormatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bytes = self.fourcc().to_be_bytes();
        if bytes.iter().all(|b| (0x20..=0x7e).contains(b)) {
            let code: String = bytes.iter().map(|&b| char::from(b)).collect();
            write!(f, "'{code}'")
        } else {
            write!(f, "0x{:08x}", self.fourcc())
        }
    }
}

/// Format flag bits.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(transparent)]
pub struct FormatFlags(pub u32);

impl FormatFlags {
    pub const NONE: Self = Self(0);
    pub const IS_FLOAT: Self = Self(1 << 0);
    pub const IS_BIG_ENDIAN: Self = Self(1 << 1);
    pub const IS_SIGNED_INTEGER: Self = Self(1 << 2);
    pub const IS_PACKED: Self = Self(1 << 3);
    pub const IS_NON_INTERLEAVED: Self = Self(1 << 5);

    /// Returns true if every bit of `other` is set.
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn bits(self) -> u32 {
        self.0
    }
}

impl BitOr for FormatFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Description of an audio stream's layout.
///
/// A stream with `bytes_per_packet == 0` or `frames_per_packet == 0` is
/// variable-bit-rate and needs a [`PacketDescription`](super::PacketDescription)
/// per packet.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct StreamDescription {
    /// Frames per second.
    pub sample_rate: f64,
    pub format_id: FormatId,
    pub format_flags: FormatFlags,
    /// Bytes in each packet, 0 when packets vary in size.
    pub bytes_per_packet: u32,
    /// Frames in each packet, 0 when packets vary in duration.
    pub frames_per_packet: u32,
    /// Bytes in a single frame, 0 for compressed formats.
    pub bytes_per_frame: u32,
    pub channels_per_frame: u32,
    /// Sample bit depth, 0 for compressed formats.
    pub bits_per_channel: u32,
}

impl StreamDescription {
    /// Interleaved, packed linear PCM with one frame per packet.
    pub const fn linear_pcm(
        sample_rate: f64,
        channels: u32,
        bits_per_channel: u32,
        flags: FormatFlags,
    ) -> Self {
        let bytes_per_frame = bits_per_channel.div_ceil(8) * channels;
        Self {
            sample_rate,
            format_id: FormatId::LinearPcm,
            format_flags: FormatFlags(flags.0 | FormatFlags::IS_PACKED.0),
            bytes_per_packet: bytes_per_frame,
            frames_per_packet: 1,
            bytes_per_frame,
            channels_per_frame: channels,
            bits_per_channel,
        }
    }

    /// Canonical capture format: interleaved 32-bit float in native byte order.
    pub const fn canonical_capture(sample_rate: f64, channels: u32) -> Self {
        let flags = if cfg!(target_endian = "big") {
            FormatFlags(FormatFlags::IS_FLOAT.0 | FormatFlags::IS_BIG_ENDIAN.0)
        } else {
            FormatFlags::IS_FLOAT
        };
        Self::linear_pcm(sample_rate, channels, 32, flags)
    }

    /// 16-bit signed little-endian integer PCM.
    pub const fn pcm_i16_le(sample_rate: f64, channels: u32) -> Self {
        Self::linear_pcm(sample_rate, channels, 16, FormatFlags::IS_SIGNED_INTEGER)
    }

    /// Compressed stream with variable-size packets.
    ///
    /// `frames_per_packet` is 0 when the codec has no fixed packet duration.
    pub const fn compressed(
        format_id: FormatId,
        sample_rate: f64,
        channels: u32,
        frames_per_packet: u32,
    ) -> Self {
        Self {
            sample_rate,
            format_id,
            format_flags: FormatFlags::NONE,
            bytes_per_packet: 0,
            frames_per_packet,
            bytes_per_frame: 0,
            channels_per_frame: channels,
            bits_per_channel: 0,
        }
    }

    /// Returns true if packets need individual size descriptors.
    pub const fn is_vbr(&self) -> bool {
        self.bytes_per_packet == 0 || self.frames_per_packet == 0
    }

    pub const fn is_linear_pcm(&self) -> bool {
        matches!(self.format_id, FormatId::LinearPcm)
    }

    pub const fn is_float(&self) -> bool {
        self.format_flags.contains(FormatFlags::IS_FLOAT)
    }

    pub const fn is_signed_integer(&self) -> bool {
        self.format_flags.contains(FormatFlags::IS_SIGNED_INTEGER)
    }

    pub const fn is_big_endian(&self) -> bool {
        self.format_flags.contains(FormatFlags::IS_BIG_ENDIAN)
    }

    pub const fn is_interleaved(&self) -> bool {
        !self.format_flags.contains(FormatFlags::IS_NON_INTERLEAVED)
    }

    /// Bytes used by one sample of one channel.
    pub const fn bytes_per_sample(&self) -> u32 {
        self.bits_per_channel.div_ceil(8)
    }

    /// Whole frames that fit in `bytes`; 0 for formats without a frame size.
    pub const fn bytes_to_frames(&self, bytes: u32) -> u32 {
        if self.bytes_per_frame == 0 {
            0
        } else {
            bytes / self.bytes_per_frame
        }
    }

    pub const fn frames_to_bytes(&self, frames: u32) -> u32 {
        frames * self.bytes_per_frame
    }
}

impl fmt::Display for StreamDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ch, {:6.0} Hz, {} (0x{:08X}) ",
            self.channels_per_frame,
            self.sample_rate,
            self.format_id,
            self.format_flags.bits()
        )?;

        if self.is_linear_pcm() {
            let endian = if self.is_big_endian() {
                "big-endian"
            } else {
                "little-endian"
            };
            let kind = if self.is_float() {
                "float"
            } else if self.is_signed_integer() {
                "signed integer"
            } else {
                "unsigned integer"
            };
            let layout = if self.is_interleaved() {
                ""
            } else {
                ", deinterleaved"
            };
            write!(
                f,
                "{}-bit {endian} {kind}{layout}",
                self.bits_per_channel
            )
        } else {
            write!(
                f,
                "{} bits/channel, {} bytes/packet, {} frames/packet, {} bytes/frame",
                self.bits_per_channel,
                self.bytes_per_packet,
                self.frames_per_packet,
                self.bytes_per_frame
            )
        }
    }
}
