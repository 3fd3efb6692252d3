//! Channel layouts.

use serde::{Deserialize, Serialize};

/// Speaker assignment for the channels of a stream.
///
/// The mask uses the RIFF `WAVE_FORMAT_EXTENSIBLE` bit order: front left is
/// bit 0, front right bit 1, front center bit 2, and so on.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ChannelLayout {
    channel_mask: u32,
    channel_count: u32,
}

impl ChannelLayout {
    pub const FRONT_LEFT: u32 = 0x1;
    pub const FRONT_RIGHT: u32 = 0x2;
    pub const FRONT_CENTER: u32 = 0x4;

    /// Layout from a speaker-position mask.
    pub const fn from_mask(channel_mask: u32) -> Self {
        Self {
            channel_mask,
            channel_count: channel_mask.count_ones(),
        }
    }

    /// Conventional layout for a plain channel count.
    pub const fn default_for(channels: u32) -> Self {
        let channel_mask = match channels {
            0 => 0,
            1 => Self::FRONT_CENTER,
            2 => Self::FRONT_LEFT | Self::FRONT_RIGHT,
            32.. => u32::MAX,
            n => (1 << n) - 1,
        };
        Self {
            channel_mask,
            channel_count: channels,
        }
    }

    pub const fn channel_mask(&self) -> u32 {
        self.channel_mask
    }

    pub const fn channel_count(&self) -> u32 {
        self.channel_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_mask() {
        let layout = ChannelLayout::from_mask(0x3F);
        assert_eq!(layout.channel_count(), 6);
    }

    #[test]
    fn test_default_layouts() {
        assert_eq!(
            ChannelLayout::default_for(1).channel_mask(),
            ChannelLayout::FRONT_CENTER
        );
        assert_eq!(ChannelLayout::default_for(2).channel_mask(), 0x3);
        assert_eq!(ChannelLayout::default_for(4).channel_mask(), 0xF);
        assert_eq!(ChannelLayout::default_for(4).channel_count(), 4);
    }
}
