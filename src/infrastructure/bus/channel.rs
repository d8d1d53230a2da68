//! In-process event bus backed by a tokio mpsc channel

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::application::ports::{BusError, EventBus};
use crate::domain::event::Event;

/// Sending half of a [`ChannelEventBus`]
pub type EventSender = mpsc::UnboundedSender<Event>;

/// Event bus fed by an [`EventSender`].
///
/// The bus reports [`BusError::Closed`] once every sender has been dropped
/// and all queued events have been read.
pub struct ChannelEventBus {
    receiver: mpsc::UnboundedReceiver<Event>,
}

impl ChannelEventBus {
    /// Create a connected sender / bus pair
    pub fn new() -> (EventSender, Self) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (sender, Self { receiver })
    }
}

#[async_trait]
impl EventBus for ChannelEventBus {
    fn uri(&self) -> String {
        "channel://in-process".to_string()
    }

    async fn next_event(&mut self) -> Result<Option<Event>, BusError> {
        match self.receiver.recv().await {
            Some(event) => Ok(Some(event)),
            None => Err(BusError::Closed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::event::EventData;

    #[tokio::test]
    async fn delivers_in_order_then_closes() {
        let (sender, mut bus) = ChannelEventBus::new();
        sender.send(Event::new("a", EventData::new())).unwrap();
        sender.send(Event::new("b", EventData::new())).unwrap();
        drop(sender);

        assert_eq!(bus.next_event().await.unwrap().unwrap().tag(), "a");
        assert_eq!(bus.next_event().await.unwrap().unwrap().tag(), "b");
        assert!(matches!(bus.next_event().await, Err(BusError::Closed)));
    }
}
