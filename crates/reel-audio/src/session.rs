//! Refill side of a render session.

#![allow(clippy::unwrap_used)] // Tests use unwrap for brevity

use reel_core::{PacketDescription, Result};
use tracing::{debug, trace};

use crate::queue::{QueueBuffer, QueueControl, RefillCallback};
use crate::sizing::BufferSizing;
use crate::source::PacketSource;

/// Per-session producer state: the packet source, the read cursor and the
/// end-of-stream flags.
pub struct RenderSession<S> {
    source: S,
    sizing: BufferSizing,
    /// One entry per packet of a refill; allocated only for VBR sources.
    packet_descriptions: Option<Box<[PacketDescription]>>,
    current_packet: u64,
    packets_read: u64,
    refills: u64,
    flushed: bool,
    done: bool,
}

impl<S: PacketSource> RenderSession<S> {
    pub fn new(source: S, sizing: BufferSizing) -> Self {
        let packet_descriptions = source.description().is_vbr().then(|| {
            vec![PacketDescription::default(); sizing.packets_to_read as usize].into_boxed_slice()
        });

        Self {
            source,
            sizing,
            packet_descriptions,
            current_packet: 0,
            packets_read: 0,
            refills: 0,
            flushed: false,
            done: false,
        }
    }

    pub const fn source(&self) -> &S {
        &self.source
    }

    pub const fn sizing(&self) -> &BufferSizing {
        &self.sizing
    }

    /// Index of the next packet to read.
    pub const fn current_packet(&self) -> u64 {
        self.current_packet
    }

    pub const fn packets_read(&self) -> u64 {
        self.packets_read
    }

    /// Callback invocations that did work.
    pub const fn refills(&self) -> u64 {
        self.refills
    }

    /// Whether the queue has been flushed.
    pub const fn is_flushed(&self) -> bool {
        self.flushed
    }

    /// Whether the source reported the end of the stream.
    pub const fn is_done(&self) -> bool {
        self.done
    }

    /// Length of the packet-description array, if one was allocated.
    pub fn packet_description_count(&self) -> Option<usize> {
        self.packet_descriptions.as_ref().map(|descs| descs.len())
    }

    /// Take the session apart, returning the source and the descriptor array.
    pub fn into_parts(self) -> (S, Option<Box<[PacketDescription]>>) {
        (self.source, self.packet_descriptions)
    }
}

impl<S: PacketSource> RefillCallback for RenderSession<S> {
    fn refill(&mut self, queue: &mut QueueControl, buffer: &mut QueueBuffer) -> Result<()> {
        if self.done {
            return Ok(());
        }

        let capacity = self.sizing.buffer_byte_size.min(buffer.capacity()) as usize;
        let read = self.source.read_packets(
            self.current_packet,
            self.sizing.packets_to_read,
            &mut buffer.data_mut()[..capacity],
            self.packet_descriptions.as_deref_mut(),
        )?;
        self.refills += 1;

        if read.packets > 0 {
            buffer.set_byte_size(read.bytes)?;
            let descriptions = self
                .packet_descriptions
                .as_deref()
                .map(|descs| &descs[..read.packets as usize]);
            queue.enqueue(buffer, descriptions)?;
            self.current_packet += u64::from(read.packets);
            self.packets_read += u64::from(read.packets);
            trace!(
                "Refill: {} packets, {} bytes, next packet {}",
                read.packets,
                read.bytes,
                self.current_packet
            );
        } else {
            if !self.flushed {
                queue.flush()?;
                self.flushed = true;
            }
            queue.stop(false)?;
            self.done = true;
            debug!("End of stream after {} packets", self.current_packet);
        }

        Ok(())
    }
}
