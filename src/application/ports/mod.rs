//! Port interfaces (traits) for external systems
//!
//! These traits define the boundaries between the application
//! and infrastructure layers.

pub mod config;
pub mod event_bus;
pub mod notifier;

// Re-export common types
pub use config::ConfigStore;
pub use event_bus::{BusError, EventBus};
pub use notifier::{NotificationError, Notifier, RegistrationError};
