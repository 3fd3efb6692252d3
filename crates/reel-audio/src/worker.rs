//! Background render worker.

use std::path::PathBuf;
use std::thread::JoinHandle;

use crossbeam_channel::{bounded, Receiver};
use reel_core::{Error, Result, Status};
use tracing::{debug, error};

use crate::renderer::{OfflineRenderer, RenderReport};

/// Handle to a render running on a worker thread.
pub struct RenderHandle {
    result_rx: Receiver<Result<RenderReport>>,
    thread: Option<JoinHandle<()>>,
}

impl RenderHandle {
    /// Whether the render has finished.
    pub fn is_finished(&self) -> bool {
        !self.result_rx.is_empty() || self.thread.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Block until the render completes and return its result.
    pub fn wait(mut self) -> Result<RenderReport> {
        let result = self.result_rx.recv().unwrap_or_else(|_| {
            error!("Render worker exited without a result");
            Err(Error::engine("render worker", Status::UNSPECIFIED))
        });
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                error!("Render worker panicked");
            }
        }
        result
    }
}

impl OfflineRenderer {
    /// Run [`render`](Self::render) on a named worker thread.
    pub fn spawn_render(
        &self,
        source: impl Into<PathBuf>,
        destination: impl Into<PathBuf>,
    ) -> Result<RenderHandle> {
        let source = source.into();
        let destination = destination.into();
        let renderer = self.clone();
        let (result_tx, result_rx) = bounded(1);

        let thread = std::thread::Builder::new()
            .name("offline-render".to_string())
            .spawn(move || {
                debug!("Render worker started for {}", source.display());
                let result = renderer.render(&source, &destination);
                // The handle may already be gone; nobody is left to tell.
                let _ = result_tx.send(result);
            })
            .map_err(|e| {
                error!("Failed to spawn render worker: {e}");
                Error::engine_io("spawn render worker", &e)
            })?;

        Ok(RenderHandle {
            result_rx,
            thread: Some(thread),
        })
    }
}
