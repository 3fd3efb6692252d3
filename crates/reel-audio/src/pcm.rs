//! Linear PCM sample conversion.

use reel_core::StreamDescription;

/// Integer or float encoding of a single PCM sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleEncoding {
    U8,
    S8,
    S16,
    S24,
    S32,
    F32,
    F64,
}

impl SampleEncoding {
    /// Bytes per sample.
    pub const fn width(self) -> usize {
        match self {
            Self::U8 | Self::S8 => 1,
            Self::S16 => 2,
            Self::S24 => 3,
            Self::S32 | Self::F32 => 4,
            Self::F64 => 8,
        }
    }
}

/// Byte layout of interleaved linear PCM.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PcmLayout {
    pub encoding: SampleEncoding,
    pub big_endian: bool,
    pub channels: usize,
}

impl PcmLayout {
    /// Layout of a linear PCM stream, or `None` if the description is not a
    /// supported interleaved PCM format.
    pub fn from_description(desc: &StreamDescription) -> Option<Self> {
        if !desc.is_linear_pcm() || !desc.is_interleaved() || desc.channels_per_frame == 0 {
            return None;
        }

        let encoding = match (desc.bytes_per_sample(), desc.is_float()) {
            (4, true) => SampleEncoding::F32,
            (8, true) => SampleEncoding::F64,
            (1, false) if desc.is_signed_integer() => SampleEncoding::S8,
            (1, false) => SampleEncoding::U8,
            (2, false) => SampleEncoding::S16,
            (3, false) => SampleEncoding::S24,
            (4, false) => SampleEncoding::S32,
            _ => return None,
        };

        Some(Self {
            encoding,
            big_endian: desc.is_big_endian(),
            channels: desc.channels_per_frame as usize,
        })
    }

    pub const fn bytes_per_frame(&self) -> usize {
        self.encoding.width() * self.channels
    }

    /// Convert packed samples to interleaved f32, appending to `out`.
    ///
    /// Trailing bytes that do not form a whole sample are ignored.
    pub fn decode_into(&self, bytes: &[u8], out: &mut Vec<f32>) {
        let width = self.encoding.width();
        out.reserve(bytes.len() / width);
        out.extend(
            bytes
                .chunks_exact(width)
                .map(|sample| decode_sample(sample, self.encoding, self.big_endian)),
        );
    }
}

fn decode_sample(bytes: &[u8], encoding: SampleEncoding, big_endian: bool) -> f32 {
    let mut raw = [0u8; 8];
    let width = encoding.width();
    raw[..width].copy_from_slice(bytes);
    if big_endian {
        raw[..width].reverse();
    }

    match encoding {
        SampleEncoding::U8 => (f32::from(raw[0]) - 128.0) / 128.0,
        SampleEncoding::S8 => f32::from(raw[0] as i8) / 128.0,
        SampleEncoding::S16 => f32::from(i16::from_le_bytes([raw[0], raw[1]])) / 32768.0,
        SampleEncoding::S24 => {
            // Place the 24 bits at the top of an i32 and shift back to sign-extend.
            let value = i32::from_le_bytes([0, raw[0], raw[1], raw[2]]) >> 8;
            value as f32 / 8_388_608.0
        }
        SampleEncoding::S32 => {
            i32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]) as f32 / 2_147_483_648.0
        }
        SampleEncoding::F32 => f32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]),
        SampleEncoding::F64 => f64::from_le_bytes(raw) as f32,
    }
}

/// Convert a float sample to 16-bit signed integer, rounding to nearest and
/// clamping to the i16 range.
pub fn f32_to_i16(sample: f32) -> i16 {
    (sample * 32768.0).round().clamp(-32768.0, 32767.0) as i16
}
