//! Offline render queue.
//!
//! The queue owns one ingest buffer. A [`RefillCallback`] fills it and hands
//! it back through [`QueueControl::enqueue`]; each [`RenderQueue::render`]
//! pull decodes queued packets into a sample FIFO and copies whole chunks out
//! to the caller's [`CaptureBuffer`]. Nothing is clocked: the queue renders
//! exactly when asked.

use bytes::Bytes;
use reel_core::{ChannelLayout, Error, PacketDescription, Result, Status, StreamDescription};
use tracing::{debug, error, trace};

use crate::buffer::{CaptureBuffer, SampleFifo};
use crate::decode::{make_decoder, DecoderSpec, PacketDecoder};

/// Lifecycle of a render queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueueState {
    /// Configurable; not yet started.
    #[default]
    Created,
    /// Started; waiting for the priming pull and the first buffer.
    Started,
    /// At least one non-empty pull has been served.
    Rendering,
    /// Flushed; buffered frames are emitted as soon as they are pulled.
    Flushing,
    /// All queued data rendered or discarded.
    Stopped,
    /// Resources released.
    Disposed,
}

/// Ingest buffer handed to the refill callback.
#[derive(Debug)]
pub struct QueueBuffer {
    data: Box<[u8]>,
    byte_size: u32,
}

impl QueueBuffer {
    fn new(capacity: u32) -> Self {
        Self {
            data: vec![0; capacity as usize].into_boxed_slice(),
            byte_size: 0,
        }
    }

    /// Capacity in bytes.
    #[allow(clippy::cast_possible_truncation)]
    pub fn capacity(&self) -> u32 {
        self.data.len() as u32
    }

    /// Bytes of valid audio data.
    pub const fn byte_size(&self) -> u32 {
        self.byte_size
    }

    /// Whole buffer, for filling.
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Mark the first `byte_size` bytes as valid.
    pub fn set_byte_size(&mut self, byte_size: u32) -> Result<()> {
        if byte_size > self.capacity() {
            return Err(Error::engine("set buffer size", Status::BUFFER_TOO_SMALL));
        }
        self.byte_size = byte_size;
        Ok(())
    }

    /// Valid audio data.
    pub fn audio_data(&self) -> &[u8] {
        &self.data[..self.byte_size as usize]
    }
}

/// Producer side of the queue, invoked whenever the ingest buffer is drained.
pub trait RefillCallback {
    /// Fill `buffer` and enqueue it, or flush and stop `queue` at the end of
    /// the stream.
    fn refill(&mut self, queue: &mut QueueControl, buffer: &mut QueueBuffer) -> Result<()>;
}

/// A decodable slice of the ingest buffer.
#[derive(Debug, Clone, Copy)]
struct DecodeUnit {
    offset: usize,
    len: usize,
    frames: u32,
}

/// Queue state visible to the refill callback.
pub struct QueueControl {
    state: QueueState,
    description: StreamDescription,
    decoder_spec: DecoderSpec,
    capture_format: Option<StreamDescription>,
    magic_cookie: Option<Bytes>,
    channel_layout: Option<ChannelLayout>,
    decoder: Option<Box<dyn PacketDecoder>>,
    fifo: Option<SampleFifo>,
    units: Vec<DecodeUnit>,
    next_unit: usize,
    /// The ingest buffer holds enqueued data not yet fully decoded.
    queued: bool,
    primed: bool,
    flushed: bool,
    stop_pending: bool,
    frames_decoded: u64,
    frames_rendered: u64,
}

impl QueueControl {
    /// Current lifecycle state.
    pub const fn state(&self) -> QueueState {
        self.state
    }

    /// Format of the packets the queue accepts.
    pub const fn description(&self) -> &StreamDescription {
        &self.description
    }

    pub const fn is_flushed(&self) -> bool {
        self.flushed
    }

    const fn accepts_data(&self) -> bool {
        matches!(self.state, QueueState::Started | QueueState::Rendering)
            && !self.flushed
            && !self.stop_pending
    }

    /// Hand the filled ingest buffer to the queue.
    ///
    /// VBR streams need one descriptor per packet in the buffer; CBR streams
    /// ignore `descriptions`.
    pub fn enqueue(
        &mut self,
        buffer: &QueueBuffer,
        descriptions: Option<&[PacketDescription]>,
    ) -> Result<()> {
        if !self.accepts_data() || self.queued {
            error!("Enqueue rejected in state {:?}", self.state);
            return Err(Error::engine("enqueue buffer", Status::INVALID_QUEUE_STATE));
        }
        if buffer.byte_size() == 0 {
            return Err(Error::engine("enqueue buffer", Status::BUFFER_EMPTY));
        }
        let Some(decoder) = self.decoder.as_ref() else {
            return Err(Error::engine("enqueue buffer", Status::NOT_PRIMED));
        };

        let byte_size = buffer.byte_size() as usize;
        self.units.clear();
        self.next_unit = 0;

        if self.description.is_vbr() {
            let descs = descriptions
                .filter(|descs| !descs.is_empty())
                .ok_or_else(|| Error::engine("enqueue buffer", Status::INVALID_PACKET_SIZE))?;
            for desc in descs {
                if desc.end_offset() > byte_size as u64 {
                    error!(
                        "Packet at {}+{} outside buffer of {} bytes",
                        desc.start_offset, desc.data_byte_size, byte_size
                    );
                    return Err(Error::engine("enqueue buffer", Status::INVALID_PACKET_OFFSET));
                }
                self.units.push(DecodeUnit {
                    offset: desc.start_offset as usize,
                    len: desc.data_byte_size as usize,
                    frames: desc.variable_frames,
                });
            }
        } else {
            let packet_bytes = self.description.bytes_per_packet as usize;
            if byte_size % packet_bytes != 0 {
                return Err(Error::engine("enqueue buffer", Status::INVALID_PACKET_SIZE));
            }
            let packets = byte_size / packet_bytes;
            if decoder.accepts_packed_packets() {
                self.units.push(DecodeUnit {
                    offset: 0,
                    len: byte_size,
                    frames: (packets as u32) * self.description.frames_per_packet,
                });
            } else {
                self.units.extend((0..packets).map(|i| DecodeUnit {
                    offset: i * packet_bytes,
                    len: packet_bytes,
                    frames: self.description.frames_per_packet,
                }));
            }
        }

        trace!(
            "Enqueued {} bytes as {} decode units",
            byte_size,
            self.units.len()
        );
        self.queued = true;
        Ok(())
    }

    /// Emit buffered frames instead of holding back partial chunks.
    ///
    /// May be called once per session.
    pub fn flush(&mut self) -> Result<()> {
        if self.flushed {
            error!("Queue already flushed");
            return Err(Error::engine("flush queue", Status::INVALID_QUEUE_STATE));
        }
        if !matches!(self.state, QueueState::Started | QueueState::Rendering) {
            return Err(Error::engine("flush queue", Status::INVALID_QUEUE_STATE));
        }
        debug!("Flushing queue after {} decoded frames", self.frames_decoded);
        self.flushed = true;
        self.state = QueueState::Flushing;
        Ok(())
    }

    /// Stop the queue. A non-immediate stop lets queued data finish
    /// rendering; an immediate stop discards it.
    pub fn stop(&mut self, immediate: bool) -> Result<()> {
        match self.state {
            QueueState::Created | QueueState::Disposed => {
                Err(Error::engine("stop queue", Status::INVALID_QUEUE_STATE))
            }
            QueueState::Stopped => Ok(()),
            _ if immediate => {
                self.discard();
                self.state = QueueState::Stopped;
                Ok(())
            }
            _ => {
                self.stop_pending = true;
                Ok(())
            }
        }
    }

    fn discard(&mut self) {
        self.units.clear();
        self.next_unit = 0;
        self.queued = false;
        self.stop_pending = false;
        if let Some(fifo) = self.fifo.as_mut() {
            fifo.clear();
        }
    }

    const fn channels(&self) -> usize {
        self.description.channels_per_frame as usize
    }

    fn buffered_frames(&self) -> usize {
        self.fifo
            .as_ref()
            .map_or(0, |fifo| fifo.available() / self.channels())
    }

    fn has_pending_unit(&self) -> bool {
        self.next_unit < self.units.len()
    }

    fn is_drained(&self) -> bool {
        !self.has_pending_unit() && self.buffered_frames() == 0
    }

    /// Decode the next queued unit into the FIFO.
    fn decode_next(&mut self, ingest: &QueueBuffer) -> Result<()> {
        let unit = self.units[self.next_unit];
        self.next_unit += 1;

        let (Some(decoder), Some(fifo)) = (self.decoder.as_mut(), self.fifo.as_mut()) else {
            return Err(Error::engine("offline render", Status::NOT_PRIMED));
        };

        let data = &ingest.audio_data()[unit.offset..unit.offset + unit.len];
        let samples = decoder.decode(data, unit.frames)?;
        if samples.len() > fifo.free() {
            error!(
                "Decoded {} samples but only {} fit in the render buffer",
                samples.len(),
                fifo.free()
            );
            return Err(Error::engine("offline render", Status::BUFFER_TOO_SMALL));
        }
        fifo.write(samples);
        self.frames_decoded += (samples.len() / self.description.channels_per_frame as usize) as u64;
        Ok(())
    }
}

/// Pull-based render engine.
pub struct RenderQueue {
    control: QueueControl,
    ingest: Option<QueueBuffer>,
    refills: u64,
}

impl RenderQueue {
    /// Create a queue for packets in `description`.
    pub fn new(description: StreamDescription, decoder_spec: DecoderSpec) -> Result<Self> {
        if description.channels_per_frame == 0 || description.sample_rate <= 0.0 {
            error!("Cannot create queue for {description}");
            return Err(Error::configuration(
                "create queue",
                Status::UNSUPPORTED_FORMAT,
            ));
        }
        if !description.is_vbr() && description.bytes_per_packet == 0 {
            return Err(Error::configuration(
                "create queue",
                Status::INVALID_PACKET_SIZE,
            ));
        }

        Ok(Self {
            control: QueueControl {
                state: QueueState::Created,
                description,
                decoder_spec,
                capture_format: None,
                magic_cookie: None,
                channel_layout: None,
                decoder: None,
                fifo: None,
                units: Vec::new(),
                next_unit: 0,
                queued: false,
                primed: false,
                flushed: false,
                stop_pending: false,
                frames_decoded: 0,
                frames_rendered: 0,
            },
            ingest: None,
            refills: 0,
        })
    }

    fn require_created(&self, operation: &str) -> Result<()> {
        if self.control.state == QueueState::Created {
            Ok(())
        } else {
            Err(Error::engine(operation, Status::INVALID_QUEUE_STATE))
        }
    }

    /// Codec initialization data, handed to the decoder at priming.
    pub fn set_magic_cookie(&mut self, cookie: Bytes) -> Result<()> {
        self.require_created("set magic cookie")?;
        self.control.magic_cookie = Some(cookie);
        Ok(())
    }

    pub fn set_channel_layout(&mut self, layout: ChannelLayout) -> Result<()> {
        self.require_created("set channel layout")?;
        if layout.channel_count() != self.control.description.channels_per_frame {
            error!(
                "Channel layout has {} channels, stream has {}",
                layout.channel_count(),
                self.control.description.channels_per_frame
            );
            return Err(Error::engine(
                "set channel layout",
                Status::INVALID_CHANNEL_LAYOUT,
            ));
        }
        self.control.channel_layout = Some(layout);
        Ok(())
    }

    pub const fn channel_layout(&self) -> Option<ChannelLayout> {
        self.control.channel_layout
    }

    /// Allocate the ingest buffer.
    pub fn allocate_buffer(&mut self, byte_size: u32) -> Result<()> {
        self.require_created("allocate buffer")?;
        if byte_size == 0 {
            return Err(Error::engine("allocate buffer", Status::BUFFER_TOO_SMALL));
        }
        self.ingest = Some(QueueBuffer::new(byte_size));
        Ok(())
    }

    /// Set the format frames are rendered in: interleaved 32-bit float at the
    /// stream's rate and channel count.
    pub fn set_offline_render_format(
        &mut self,
        format: StreamDescription,
        layout: Option<ChannelLayout>,
    ) -> Result<()> {
        self.require_created("set offline render format")?;
        let desc = &self.control.description;
        let valid = format.is_linear_pcm()
            && format.is_float()
            && format.bits_per_channel == 32
            && format.is_interleaved()
            && format.channels_per_frame == desc.channels_per_frame
            && (format.sample_rate - desc.sample_rate).abs() < f64::EPSILON;
        if !valid {
            error!("Unsupported offline render format: {format}");
            return Err(Error::engine(
                "set offline render format",
                Status::UNSUPPORTED_FORMAT,
            ));
        }
        if let Some(layout) = layout {
            if layout.channel_count() != format.channels_per_frame {
                return Err(Error::engine(
                    "set offline render format",
                    Status::INVALID_CHANNEL_LAYOUT,
                ));
            }
        }
        self.control.capture_format = Some(format);
        Ok(())
    }

    pub const fn capture_format(&self) -> Option<&StreamDescription> {
        self.control.capture_format.as_ref()
    }

    /// Start the queue. The next pull must be a zero-frame priming pull.
    pub fn start(&mut self) -> Result<()> {
        self.require_created("start queue")?;
        if self.control.capture_format.is_none() || self.ingest.is_none() {
            error!("Queue started before render format and buffer were set");
            return Err(Error::engine("start queue", Status::INVALID_QUEUE_STATE));
        }
        self.control.state = QueueState::Started;
        debug!("Queue started: {}", self.control.description);
        Ok(())
    }

    /// Invoke the refill callback directly, outside a render pull.
    pub fn refill_with<C: RefillCallback + ?Sized>(&mut self, callback: &mut C) -> Result<()> {
        if !matches!(
            self.control.state,
            QueueState::Started | QueueState::Rendering | QueueState::Flushing
        ) {
            return Err(Error::engine("refill queue", Status::INVALID_QUEUE_STATE));
        }
        let Some(ingest) = self.ingest.as_mut() else {
            return Err(Error::engine("refill queue", Status::INVALID_QUEUE_STATE));
        };
        self.refills += 1;
        callback.refill(&mut self.control, ingest)
    }

    /// Render `frames` frames at `sample_time` into `capture`.
    ///
    /// `sample_time` must equal the frames rendered so far. A zero-frame pull
    /// primes the queue. Before a flush, a pull that cannot be served in full
    /// returns 0 and keeps the partial chunk buffered; after a flush whatever
    /// is buffered is returned.
    pub fn render<C: RefillCallback + ?Sized>(
        &mut self,
        callback: &mut C,
        sample_time: u64,
        frames: u32,
        capture: &mut CaptureBuffer,
    ) -> Result<u32> {
        if !matches!(
            self.control.state,
            QueueState::Started | QueueState::Rendering | QueueState::Flushing
        ) {
            error!("Render pull in state {:?}", self.control.state);
            return Err(Error::engine("offline render", Status::INVALID_QUEUE_STATE));
        }
        if sample_time != self.control.frames_rendered {
            error!(
                "Render pull at sample time {} but {} frames rendered",
                sample_time, self.control.frames_rendered
            );
            return Err(Error::engine("offline render", Status::INVALID_TIMESTAMP));
        }

        capture.reset();
        if frames == 0 {
            return self.prime(capture).map(|()| 0);
        }
        if !self.control.primed {
            return Err(Error::engine("offline render", Status::NOT_PRIMED));
        }
        if frames > capture.frame_capacity() {
            return Err(Error::engine("offline render", Status::BUFFER_TOO_SMALL));
        }
        if self.control.state == QueueState::Started {
            self.control.state = QueueState::Rendering;
        }

        let wanted = frames as usize;
        while self.control.buffered_frames() < wanted {
            let Some(ingest) = self.ingest.as_mut() else {
                return Err(Error::engine("offline render", Status::INVALID_QUEUE_STATE));
            };

            if self.control.has_pending_unit() {
                self.control.decode_next(ingest)?;
                continue;
            }
            if self.control.queued {
                // Every unit decoded; the buffer may be refilled.
                self.control.queued = false;
                self.control.units.clear();
                self.control.next_unit = 0;
            }
            if self.control.flushed || self.control.stop_pending {
                break;
            }

            self.refills += 1;
            callback.refill(&mut self.control, ingest)?;
            if !self.control.queued && !self.control.flushed && !self.control.stop_pending {
                trace!("Refill produced no data");
                break;
            }
        }

        let buffered = self.control.buffered_frames();
        let emit = if buffered >= wanted {
            wanted
        } else if self.control.flushed {
            buffered
        } else {
            0
        };

        if emit > 0 {
            if let Some(fifo) = self.control.fifo.as_mut() {
                #[allow(clippy::cast_possible_truncation)]
                let out = capture.fill(emit as u32);
                fifo.read(out);
            }
        }
        self.control.frames_rendered += emit as u64;

        if self.control.stop_pending && self.control.is_drained() {
            debug!(
                "Queue stopped after {} frames",
                self.control.frames_rendered
            );
            self.control.stop_pending = false;
            self.control.state = QueueState::Stopped;
        }

        trace!(
            "Pull at {}: {} of {} frames ({} buffered)",
            sample_time,
            emit,
            frames,
            self.control.buffered_frames()
        );
        Ok(emit as u32)
    }

    fn prime(&mut self, capture: &CaptureBuffer) -> Result<()> {
        if self.control.primed {
            return Ok(());
        }
        let control = &mut self.control;
        if capture.channels() != control.channels() {
            return Err(Error::engine("offline render", Status::UNSUPPORTED_FORMAT));
        }
        let Some(ingest) = self.ingest.as_ref() else {
            return Err(Error::engine("offline render", Status::INVALID_QUEUE_STATE));
        };

        let decoder = make_decoder(
            &control.decoder_spec,
            &control.description,
            control.magic_cookie.as_ref(),
        )?;
        let max_unit_frames = decoder.max_frames(ingest.capacity() as usize);
        let fifo_frames = capture.frame_capacity() as usize + max_unit_frames;
        control.fifo = Some(SampleFifo::new(fifo_frames * control.channels()));
        control.decoder = Some(decoder);
        control.primed = true;

        debug!(
            "Queue primed: {} frame render buffer, {} frames per decode",
            fifo_frames, max_unit_frames
        );
        Ok(())
    }

    /// Release the decoder and buffers. Safe to call more than once.
    pub fn dispose(&mut self) {
        if self.control.state == QueueState::Disposed {
            return;
        }
        self.control.discard();
        self.control.decoder = None;
        self.control.fifo = None;
        self.control.magic_cookie = None;
        self.ingest = None;
        self.control.state = QueueState::Disposed;
        debug!("Queue disposed");
    }

    pub const fn state(&self) -> QueueState {
        self.control.state
    }

    pub const fn is_flushed(&self) -> bool {
        self.control.flushed
    }

    /// Frames delivered to callers so far.
    pub const fn frames_rendered(&self) -> u64 {
        self.control.frames_rendered
    }

    /// Frames produced by the decoder so far.
    pub const fn frames_decoded(&self) -> u64 {
        self.control.frames_decoded
    }

    /// Refill callback invocations, including manual ones.
    pub const fn refill_count(&self) -> u64 {
        self.refills
    }

    pub fn buffer_capacity(&self) -> Option<u32> {
        self.ingest.as_ref().map(QueueBuffer::capacity)
    }
}

impl Drop for RenderQueue {
    fn drop(&mut self) {
        self.dispose();
    }
}
