//! Non-fatal diagnostics raised during a render.

use parking_lot::Mutex;
use reel_core::Status;
use serde::Serialize;
use tracing::{trace, warn};

/// Progress of one render pull.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RenderProgress {
    /// Sample time the pull was issued at.
    pub sample_time: u64,
    pub requested_frames: u32,
    pub rendered_frames: u32,
    pub requested_bytes: u32,
    pub rendered_bytes: u32,
}

/// Receiver for warnings and progress reports.
pub trait DiagnosticSink: Send + Sync {
    /// A non-fatal problem with `operation`.
    fn warning(&self, operation: &str, status: Status);

    /// Called after every render pull.
    fn progress(&self, _progress: &RenderProgress) {}
}

/// Sink that forwards to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDiagnostics;

impl DiagnosticSink for TracingDiagnostics {
    fn warning(&self, operation: &str, status: Status) {
        warn!("{operation}: {status}");
    }

    fn progress(&self, progress: &RenderProgress) {
        trace!(
            "Render at {}: requested {} frames ({} bytes), got {} frames ({} bytes)",
            progress.sample_time,
            progress.requested_frames,
            progress.requested_bytes,
            progress.rendered_frames,
            progress.rendered_bytes
        );
    }
}

/// Sink that keeps everything it receives.
#[derive(Debug, Default)]
pub struct RecordingDiagnostics {
    warnings: Mutex<Vec<(String, Status)>>,
    progress: Mutex<Vec<RenderProgress>>,
}

impl RecordingDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warnings(&self) -> Vec<(String, Status)> {
        self.warnings.lock().clone()
    }

    pub fn progress_reports(&self) -> Vec<RenderProgress> {
        self.progress.lock().clone()
    }
}

impl DiagnosticSink for RecordingDiagnostics {
    fn warning(&self, operation: &str, status: Status) {
        self.warnings.lock().push((operation.to_string(), status));
    }

    fn progress(&self, progress: &RenderProgress) {
        self.progress.lock().push(*progress);
    }
}
