//! Capture buffer filled by render pulls.

use reel_core::{Error, Result, Status, StreamDescription};

/// Fixed-size buffer of interleaved float frames in the capture format.
///
/// Allocated once per session and reused by every render pull.
#[derive(Debug)]
pub struct CaptureBuffer {
    samples: Box<[f32]>,
    byte_capacity: u32,
    bytes_per_frame: u32,
    channels: usize,
    /// Frames written by the last pull.
    frames: u32,
}

impl CaptureBuffer {
    /// Allocate `byte_capacity` bytes for frames in `format`.
    ///
    /// `format` must be the float capture format set on the render queue.
    pub fn new(byte_capacity: u32, format: &StreamDescription) -> Result<Self> {
        if !format.is_linear_pcm() || !format.is_float() || format.bits_per_channel != 32 {
            return Err(Error::configuration(
                "allocate capture buffer",
                Status::UNSUPPORTED_FORMAT,
            ));
        }

        let frame_capacity = format.bytes_to_frames(byte_capacity);
        if frame_capacity == 0 {
            return Err(Error::configuration(
                "allocate capture buffer",
                Status::BUFFER_TOO_SMALL,
            ));
        }

        let channels = format.channels_per_frame as usize;
        Ok(Self {
            samples: vec![0.0; frame_capacity as usize * channels].into_boxed_slice(),
            byte_capacity,
            bytes_per_frame: format.bytes_per_frame,
            channels,
            frames: 0,
        })
    }

    /// Size of the buffer in bytes, as requested at allocation.
    pub const fn byte_capacity(&self) -> u32 {
        self.byte_capacity
    }

    /// Whole frames the buffer can hold.
    pub const fn frame_capacity(&self) -> u32 {
        self.byte_capacity / self.bytes_per_frame
    }

    pub const fn channels(&self) -> usize {
        self.channels
    }

    /// Frames delivered by the last pull.
    pub const fn frames(&self) -> u32 {
        self.frames
    }

    /// Bytes delivered by the last pull.
    pub const fn byte_size(&self) -> u32 {
        self.frames * self.bytes_per_frame
    }

    /// Interleaved samples delivered by the last pull.
    pub fn samples(&self) -> &[f32] {
        &self.samples[..self.frames as usize * self.channels]
    }

    /// Writable region for `frames` frames, marking them as delivered.
    pub(crate) fn fill(&mut self, frames: u32) -> &mut [f32] {
        let frames = frames.min(self.frame_capacity());
        self.frames = frames;
        &mut self.samples[..frames as usize * self.channels]
    }

    pub(crate) fn reset(&mut self) {
        self.frames = 0;
    }
}
