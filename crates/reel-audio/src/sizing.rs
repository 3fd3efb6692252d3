//! Ingest buffer sizing.
//!
//! Time is only a guideline here: the aim is a buffer somewhere between
//! 16 KiB and 64 KiB that holds about a second of audio, without allocating
//! more than the stream needs.

#![allow(clippy::unwrap_used)] // Tests use unwrap for brevity

use reel_core::{Error, Result, Status, StreamDescription};
use serde::Serialize;
use tracing::debug;

use crate::config::RenderConfig;

/// Largest ingest buffer, unless a single packet is bigger.
pub const MAX_BUFFER_BYTES: u32 = 0x10000;

/// Smallest ingest buffer; smaller reads hit the disk too often.
pub const MIN_BUFFER_BYTES: u32 = 0x4000;

/// Ingest buffer size and the number of packets read into it per refill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BufferSizing {
    pub buffer_byte_size: u32,
    pub packets_to_read: u32,
}

impl BufferSizing {
    /// Size a buffer for `seconds` of audio using the default 16-64 KiB bounds.
    pub fn for_duration(
        desc: &StreamDescription,
        max_packet_size: u32,
        seconds: f64,
    ) -> Result<Self> {
        Self::with_bounds(
            desc,
            max_packet_size,
            seconds,
            MIN_BUFFER_BYTES,
            MAX_BUFFER_BYTES,
        )
    }

    /// Size a buffer from a render configuration.
    pub fn from_config(
        desc: &StreamDescription,
        max_packet_size: u32,
        config: &RenderConfig,
    ) -> Result<Self> {
        Self::with_bounds(
            desc,
            max_packet_size,
            config.buffer_seconds,
            config.min_buffer_bytes,
            config.max_buffer_bytes,
        )
    }

    fn with_bounds(
        desc: &StreamDescription,
        max_packet_size: u32,
        seconds: f64,
        min_bytes: u32,
        max_bytes: u32,
    ) -> Result<Self> {
        if max_packet_size == 0 {
            return Err(Error::configuration(
                "get max packet size",
                Status::INVALID_PACKET_SIZE,
            ));
        }

        let mut buffer_byte_size = if desc.frames_per_packet != 0 {
            let packets_for_time =
                desc.sample_rate / f64::from(desc.frames_per_packet) * seconds;
            (packets_for_time * f64::from(max_packet_size)) as u32
        } else {
            // No fixed packet duration, so there is no way to tailor the
            // buffer to a time span.
            max_bytes.max(max_packet_size)
        };

        if buffer_byte_size > max_bytes && buffer_byte_size > max_packet_size {
            buffer_byte_size = max_bytes;
        } else if buffer_byte_size < min_bytes {
            buffer_byte_size = min_bytes;
        }

        let packets_to_read = buffer_byte_size / max_packet_size;
        if packets_to_read == 0 {
            // Only reachable when a single packet is larger than the clamp.
            return Err(Error::configuration(
                "calculate buffer size",
                Status::BUFFER_TOO_SMALL,
            ));
        }

        debug!(
            "Buffer sizing: max packet {} bytes -> {} bytes, {} packets per read",
            max_packet_size, buffer_byte_size, packets_to_read
        );

        Ok(Self {
            buffer_byte_size,
            packets_to_read,
        })
    }

    /// Capture buffer size: half the ingest buffer, so the render side never
    /// pulls faster than the refill side can push.
    pub const fn capture_byte_size(&self) -> u32 {
        self.buffer_byte_size / 2
    }
}
