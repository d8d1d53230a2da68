//! salt-growl - Salt event bus to Growl notification bridge
//!
//! Subscribes to a Salt master's event bus, matches each event tag against
//! an ordered list of glob patterns and forwards matching events as
//! GNTP (Growl) notifications.
//!
//! # Architecture
//!
//! The crate follows hexagonal (ports & adapters) architecture:
//!
//! - **Domain**: Events, templates, notification value objects, config and errors
//! - **Application**: Pattern registry, dispatch loop, one-shot use cases and port interfaces (traits)
//! - **Infrastructure**: Adapter implementations (GNTP, desktop notifications, Salt IPC bus, config file)
//! - **CLI**: Command-line interface, argument parsing, logging and signal handling

pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
