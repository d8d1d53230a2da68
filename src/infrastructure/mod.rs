//! Infrastructure layer - Adapter implementations
//!
//! Contains concrete implementations of the port interfaces,
//! integrating with external systems like the Salt master's event
//! publisher and GNTP receivers.

pub mod bus;
pub mod config;
pub mod notification;

// Re-export adapters
pub use bus::{ChannelEventBus, EventSender, JsonLinesBus};
#[cfg(unix)]
pub use bus::SaltIpcBus;
pub use config::XdgConfigStore;
pub use notification::{create_notifier, DesktopNotifier, GntpConfig, GntpNotifier, OriginInfo};
