//! Dispatch domain types

mod state;

pub use state::{DispatchSession, DispatchState, InvalidStateTransition};
