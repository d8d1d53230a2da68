//! Domain layer - Core business logic
//!
//! Contains value objects, entities, and domain errors.
//! This layer has no dependencies on external systems.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod event;
pub mod notification;
pub mod template;

// Re-export common types
pub use config::{AppConfig, Backend};
pub use dispatch::{DispatchSession, DispatchState};
pub use error::*;
pub use event::{Event, EventData};
pub use notification::{Notification, NotifierSession, NotifyOptions, Registration};
pub use template::{TemplateSet, DEFAULT_TEMPLATE};
