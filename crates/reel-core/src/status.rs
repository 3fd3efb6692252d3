//! Numeric status codes carried by Reel errors.
//!
//! Codes are either small integers (classic file-manager style) or
//! four-character codes packed big-endian into an `i32`.

#![allow(clippy::unwrap_used)] // Tests use unwrap for brevity

use std::fmt;
use std::io;

use serde::{Deserialize, Serialize};

/// Pack a four-character code into a status value.
pub const fn fourcc(code: &[u8; 4]) -> i32 {
    i32::from_be_bytes(*code)
}

/// Status code attached to a failed operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Status(pub i32);

impl Status {
    pub const OK: Self = Self(0);
    pub const UNSPECIFIED: Self = Self(fourcc(b"wht?"));

    // File-level codes.
    pub const END_OF_FILE: Self = Self(-39);
    pub const FILE_NOT_FOUND: Self = Self(-43);
    pub const PERMISSION_DENIED: Self = Self(-54);
    pub const IO_ERROR: Self = Self(fourcc(b"io!!"));
    pub const INVALID_FILE: Self = Self(fourcc(b"dta?"));
    pub const UNSUPPORTED_FILE_TYPE: Self = Self(fourcc(b"typ?"));
    pub const UNSUPPORTED_FORMAT: Self = Self(fourcc(b"fmt?"));
    pub const NO_AUDIO_TRACK: Self = Self(fourcc(b"trk?"));

    // Packet accounting.
    pub const INVALID_PACKET_SIZE: Self = Self(fourcc(b"pks?"));
    pub const INVALID_PACKET_OFFSET: Self = Self(fourcc(b"pck?"));
    pub const BUFFER_TOO_SMALL: Self = Self(fourcc(b"bsz?"));
    pub const BUFFER_EMPTY: Self = Self(fourcc(b"bfe?"));

    // Render queue.
    pub const INVALID_QUEUE_STATE: Self = Self(fourcc(b"qst?"));
    pub const NOT_PRIMED: Self = Self(fourcc(b"prm?"));
    pub const INVALID_TIMESTAMP: Self = Self(fourcc(b"tim?"));
    pub const DECODE_FAILED: Self = Self(fourcc(b"dec!"));
    pub const INVALID_CHANNEL_LAYOUT: Self = Self(fourcc(b"chl?"));

    // Capture sink.
    pub const INVALID_CLIENT_FORMAT: Self = Self(fourcc(b"cfmt"));

    /// Raw numeric value.
    pub const fn code(self) -> i32 {
        self.0
    }

    /// Returns true for the success status.
    pub const fn is_ok(self) -> bool {
        self.0 == 0
    }

    /// Map an I/O error onto a status code.
    ///
    /// Well-known kinds get a stable code; anything else keeps the OS error
    /// number when there is one.
    pub fn from_io(err: &io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::FILE_NOT_FOUND,
            io::ErrorKind::PermissionDenied => Self::PERMISSION_DENIED,
            io::ErrorKind::UnexpectedEof => Self::END_OF_FILE,
            _ => err.raw_os_error().map_or(Self::IO_ERROR, Self),
        }
    }
}

impl Default for Status {
    fn default() -> Self {
        Self::UNSPECIFIED
    }
}

impl From<i32> for Status {
    fn from(code: i32) -> Self {
        Self(code)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bytes = self.0.to_be_bytes();
        if bytes.iter().all(|b| (0x20..=0x7e).contains(b)) {
            let code: String = bytes.iter().map(|&b| char::from(b)).collect();
            write!(f, "'{code}'")
        } else if self.0 > -200_000 && self.0 < 200_000 {
            write!(f, "{}", self.0)
        } else {
            write!(f, "0x{:x}", self.0 as u32)
        }
    }
}
