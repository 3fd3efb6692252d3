//! # reel-core
//!
//! Core types, status codes, and error handling for the Reel offline renderer.

pub mod error;
pub mod status;
pub mod types;

pub use error::{Error, Result};
pub use status::Status;
pub use types::*;
