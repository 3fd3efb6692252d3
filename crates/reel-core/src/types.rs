//! Audio stream domain types shared by every Reel crate.

pub mod format;
pub mod layout;
pub mod packet;

pub use format::{FormatFlags, FormatId, StreamDescription};
pub use layout::ChannelLayout;
pub use packet::PacketDescription;
