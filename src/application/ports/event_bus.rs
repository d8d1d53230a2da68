//! Event bus port interface

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::event::Event;

/// Event bus errors
#[derive(Debug, Clone, Error)]
pub enum BusError {
    #[error("Failed to connect to event bus at {uri}: {message}")]
    Connect { uri: String, message: String },

    #[error("Malformed event payload: {0}")]
    Malformed(String),

    #[error("Event bus closed")]
    Closed,

    /// The underlying stream failed and will not recover on its own
    #[error("Event bus read failed: {0}")]
    Io(String),
}

/// Port for the inbound Salt event stream
#[async_trait]
pub trait EventBus: Send {
    /// Address the bus is subscribed to, for diagnostics
    fn uri(&self) -> String;

    /// Wait for the next event.
    ///
    /// `Ok(None)` is a transient empty read and the caller should simply
    /// read again. `Err(BusError::Malformed)` drops one payload;
    /// `Err(BusError::Closed)` means no further events will arrive.
    /// `Err(BusError::Io)` is a stream failure and also ends the stream.
    async fn next_event(&mut self) -> Result<Option<Event>, BusError>;
}

/// Blanket implementation for boxed event bus types
#[async_trait]
impl EventBus for Box<dyn EventBus> {
    fn uri(&self) -> String {
        self.as_ref().uri()
    }

    async fn next_event(&mut self) -> Result<Option<Event>, BusError> {
        self.as_mut().next_event().await
    }
}
