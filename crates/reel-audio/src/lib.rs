//! # reel-audio
//!
//! Offline audio render pipeline for Reel.
//!
//! Features:
//! - Packet sources backed by symphonia containers or in-memory packets
//! - Pull-based render queue fed by a refill callback
//! - Buffer sizing that keeps ingest reads between 16 KiB and 64 KiB
//! - 16-bit PCM WAV capture through hound

pub mod buffer;
pub mod capture;
pub mod config;
pub mod decode;
pub mod diagnostics;
pub mod pcm;
pub mod queue;
pub mod renderer;
pub mod session;
pub mod sizing;
pub mod source;
pub mod worker;

pub use buffer::{CaptureBuffer, SampleFifo};
pub use capture::CaptureSink;
pub use config::RenderConfig;
pub use decode::DecoderSpec;
pub use diagnostics::{DiagnosticSink, RecordingDiagnostics, RenderProgress, TracingDiagnostics};
pub use queue::{QueueBuffer, QueueControl, QueueState, RefillCallback, RenderQueue};
pub use renderer::{OfflineRenderer, RenderReport};
pub use session::RenderSession;
pub use sizing::BufferSizing;
pub use source::{ContainerSource, MemorySource, PacketRead, PacketSource};
pub use worker::RenderHandle;
