//! Fixed-capacity buffers used by the render pipeline.

pub mod capture;
pub mod fifo;

pub use capture::CaptureBuffer;
pub use fifo::SampleFifo;
