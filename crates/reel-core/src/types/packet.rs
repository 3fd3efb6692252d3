//! Packet descriptors for variable-bit-rate streams.

use serde::{Deserialize, Serialize};

/// Location and size of one packet inside a buffer of packed packets.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct PacketDescription {
    /// Byte offset of the packet from the start of the buffer.
    pub start_offset: u64,
    /// Frames in this packet, or 0 when the format's frame count is fixed.
    pub variable_frames: u32,
    /// Size of the packet in bytes.
    pub data_byte_size: u32,
}

impl PacketDescription {
    pub const fn new(start_offset: u64, data_byte_size: u32) -> Self {
        Self {
            start_offset,
            variable_frames: 0,
            data_byte_size,
        }
    }

    /// Byte offset one past the end of the packet.
    pub const fn end_offset(&self) -> u64 {
        self.start_offset + self.data_byte_size as u64
    }
}
