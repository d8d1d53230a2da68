//! Application layer - Use cases and port interfaces
//!
//! Contains the dispatch loop, the handler registry and the trait
//! definitions for the event bus and the notifier.

pub mod dispatch;
pub mod handlers;
pub mod oneshot;
pub mod ports;
pub mod registry;

// Re-export use cases
pub use dispatch::{DispatchConfig, DispatchError, DispatchStats, Dispatcher, Outcome};
pub use handlers::salt_registry;
pub use oneshot::{job_return_notification, OneShotError, SendNotificationUseCase, SALT_CATEGORY};
pub use registry::{HandlerAction, HandlerDescriptor, PatternRegistry, RegistryError};
