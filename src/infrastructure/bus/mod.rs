//! Event bus adapters
//!
//! Sources of Salt events: the master's IPC publisher, line-oriented input
//! on stdin, and an in-process channel.

mod channel;
mod json_lines;
#[cfg(unix)]
mod salt_ipc;

pub use channel::{ChannelEventBus, EventSender};
pub use json_lines::{parse_line, JsonLinesBus};
#[cfg(unix)]
pub use salt_ipc::{decode_frame, SaltIpcBus, RECONNECT_INTERVAL};
