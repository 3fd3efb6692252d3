//! Destination file writer.
//!
//! Rendered float frames are written as 16-bit signed little-endian PCM in a
//! RIFF/WAVE container. A sink that is not finalized removes its file.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use hound::{SampleFormat, WavSpec, WavWriter};
use reel_core::{Error, Result, Status, StreamDescription};
use tracing::{debug, warn};

use crate::buffer::CaptureBuffer;
use crate::pcm::f32_to_i16;

/// Map a hound error onto a status code.
fn hound_status(err: &hound::Error) -> Status {
    match err {
        hound::Error::IoError(e) => Status::from_io(e),
        hound::Error::FormatError(_) => Status::INVALID_FILE,
        _ => Status::UNSUPPORTED_FORMAT,
    }
}

/// Writer for the destination file.
pub struct CaptureSink {
    path: PathBuf,
    file_format: StreamDescription,
    client_format: Option<StreamDescription>,
    writer: Option<WavWriter<BufWriter<File>>>,
    frames_written: u64,
}

impl CaptureSink {
    /// Create (or truncate) the destination file with `file_format`, which
    /// must be 16-bit signed little-endian PCM.
    pub fn create(path: impl AsRef<Path>, file_format: &StreamDescription) -> Result<Self> {
        let path = path.as_ref();
        let supported = file_format.is_linear_pcm()
            && file_format.is_signed_integer()
            && !file_format.is_big_endian()
            && file_format.bits_per_channel == 16
            && file_format.is_interleaved();
        if !supported || file_format.sample_rate.fract() != 0.0 {
            warn!("Unsupported destination format: {file_format}");
            return Err(Error::configuration(
                "create destination file",
                Status::UNSUPPORTED_FORMAT,
            ));
        }

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let spec = WavSpec {
            channels: u16::try_from(file_format.channels_per_frame).map_err(|_| {
                Error::configuration("create destination file", Status::UNSUPPORTED_FORMAT)
            })?,
            sample_rate: file_format.sample_rate as u32,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };

        let writer = WavWriter::create(path, spec).map_err(|e| {
            warn!("Failed to create {}: {e}", path.display());
            Error::configuration("create destination file", hound_status(&e))
        })?;

        debug!("Created {}: {}", path.display(), file_format);
        Ok(Self {
            path: path.to_path_buf(),
            file_format: *file_format,
            client_format: None,
            writer: Some(writer),
            frames_written: 0,
        })
    }

    /// Format of the frames handed to [`write`](Self::write).
    ///
    /// Must be interleaved 32-bit float PCM at the file's rate and channel
    /// count, the layout [`CaptureBuffer`] holds.
    pub fn set_client_format(&mut self, format: StreamDescription) -> Result<()> {
        let file = &self.file_format;
        let valid = format.is_linear_pcm()
            && format.is_interleaved()
            && format.is_float()
            && format.bits_per_channel == 32
            && format.channels_per_frame == file.channels_per_frame
            && (format.sample_rate - file.sample_rate).abs() < f64::EPSILON;
        if !valid {
            warn!("Client format {format} does not fit destination {file}");
            return Err(Error::configuration(
                "set destination client format",
                Status::INVALID_CLIENT_FORMAT,
            ));
        }
        self.client_format = Some(format);
        Ok(())
    }

    pub const fn client_format(&self) -> Option<&StreamDescription> {
        self.client_format.as_ref()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Frames appended so far.
    pub const fn frames_written(&self) -> u64 {
        self.frames_written
    }

    /// Append the first `frames` frames of `capture`.
    pub fn write(&mut self, frames: u32, capture: &CaptureBuffer) -> Result<()> {
        if frames == 0 {
            return Ok(());
        }
        if self.client_format.is_none() {
            return Err(Error::engine(
                "write destination file",
                Status::INVALID_CLIENT_FORMAT,
            ));
        }
        let Some(writer) = self.writer.as_mut() else {
            return Err(Error::engine("write destination file", Status::IO_ERROR));
        };
        if frames > capture.frames() {
            return Err(Error::engine(
                "write destination file",
                Status::BUFFER_TOO_SMALL,
            ));
        }

        let samples = &capture.samples()[..frames as usize * capture.channels()];
        for &sample in samples {
            writer.write_sample(f32_to_i16(sample)).map_err(|e| {
                warn!("Failed to write {}: {e}", self.path.display());
                Error::engine("write destination file", hound_status(&e))
            })?;
        }

        self.frames_written += u64::from(frames);
        Ok(())
    }

    /// Complete the file header and close the file.
    ///
    /// On failure the partial file is removed.
    pub fn finalize(mut self) -> Result<u64> {
        let Some(writer) = self.writer.take() else {
            return Err(Error::engine("close destination file", Status::IO_ERROR));
        };
        if let Err(e) = writer.finalize() {
            warn!("Failed to finalize {}: {e}", self.path.display());
            let _ = self.remove_file();
            return Err(Error::engine("close destination file", hound_status(&e)));
        }
        debug!(
            "Closed {} after {} frames",
            self.path.display(),
            self.frames_written
        );
        Ok(self.frames_written)
    }

    /// Close and delete the file.
    pub fn discard(mut self) -> Result<()> {
        self.writer = None;
        self.remove_file()
            .map_err(|e| Error::engine_io("remove destination file", &e))
    }

    fn remove_file(&self) -> std::io::Result<()> {
        match std::fs::remove_file(&self.path) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => {
                warn!("Failed to remove {}: {e}", self.path.display());
                Err(e)
            }
            _ => Ok(()),
        }
    }
}

impl Drop for CaptureSink {
    fn drop(&mut self) {
        if self.writer.take().is_some() {
            let _ = self.remove_file();
        }
    }
}
