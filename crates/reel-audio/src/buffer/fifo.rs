//! Sample FIFO between the packet decoder and render pulls.
//!
//! The render queue decodes whole packets into this buffer and hands out
//! exactly the frames each pull asks for. Capacity is fixed when the queue is
//! primed and never grows.

#![allow(clippy::unwrap_used)] // Tests use unwrap for brevity

/// Single-owner ring buffer of interleaved f32 samples.
pub struct SampleFifo {
    /// The underlying buffer storage.
    buffer: Box<[f32]>,
    /// Total samples ever read.
    read_pos: usize,
    /// Total samples ever written.
    write_pos: usize,
    /// Buffer capacity (power of 2 for efficient modulo).
    capacity: usize,
    /// Mask for efficient modulo (capacity - 1).
    mask: usize,
}

impl SampleFifo {
    /// Create a FIFO holding at least `capacity` samples.
    ///
    /// The capacity will be rounded up to the next power of 2.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1).next_power_of_two();
        let buffer = vec![0.0f32; capacity].into_boxed_slice();

        Self {
            buffer,
            read_pos: 0,
            write_pos: 0,
            capacity,
            mask: capacity - 1,
        }
    }

    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of samples available for reading.
    pub const fn available(&self) -> usize {
        self.write_pos.wrapping_sub(self.read_pos)
    }

    /// Number of free slots for writing.
    pub const fn free(&self) -> usize {
        self.capacity - self.available()
    }

    /// Write samples, returning how many fit.
    pub fn write(&mut self, samples: &[f32]) -> usize {
        let to_write = samples.len().min(self.free());
        if to_write == 0 {
            return 0;
        }

        let start = self.write_pos & self.mask;
        let first = to_write.min(self.capacity - start);
        self.buffer[start..start + first].copy_from_slice(&samples[..first]);
        // Wrap-around remainder
        self.buffer[..to_write - first].copy_from_slice(&samples[first..to_write]);

        self.write_pos = self.write_pos.wrapping_add(to_write);
        to_write
    }

    /// Read samples into `output`, returning how many were read.
    pub fn read(&mut self, output: &mut [f32]) -> usize {
        let to_read = output.len().min(self.available());
        if to_read == 0 {
            return 0;
        }

        let start = self.read_pos & self.mask;
        let first = to_read.min(self.capacity - start);
        output[..first].copy_from_slice(&self.buffer[start..start + first]);
        output[first..to_read].copy_from_slice(&self.buffer[..to_read - first]);

        self.read_pos = self.read_pos.wrapping_add(to_read);
        to_read
    }

    /// Discard everything buffered.
    pub fn clear(&mut self) {
        self.read_pos = self.write_pos;
    }
}
