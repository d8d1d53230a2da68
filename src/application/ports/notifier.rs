//! Notification port interface

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::error::UndeclaredCategory;
use crate::domain::notification::{Notification, NotifierSession, Registration};

/// Registration errors. Fatal at startup.
#[derive(Debug, Clone, Error)]
pub enum RegistrationError {
    #[error("Failed to connect to notification receiver at {address}: {message}")]
    Connect { address: String, message: String },

    #[error("Notification receiver rejected registration ({code}): {description}")]
    Rejected { code: String, description: String },

    #[error("Invalid response from notification receiver: {0}")]
    Protocol(String),

    #[error("Registration timed out after {0}s")]
    Timeout(u64),
}

/// Notification errors. Logged, never fatal.
#[derive(Debug, Clone, Error)]
pub enum NotificationError {
    #[error(transparent)]
    UndeclaredCategory(#[from] UndeclaredCategory),

    #[error("Failed to reach notification receiver at {address}: {message}")]
    Unreachable { address: String, message: String },

    #[error("Notification receiver rejected notification ({code}): {description}")]
    Rejected { code: String, description: String },

    #[error("Invalid response from notification receiver: {0}")]
    Protocol(String),

    #[error("Notification timed out after {0}s")]
    Timeout(u64),

    #[error("Failed to show notification: {0}")]
    SendFailed(String),
}

/// Port for the outbound push-notification capability
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Register the application and every category it will notify with.
    ///
    /// Called once at startup; the returned session is reused for every
    /// later notification.
    async fn register(&self, registration: &Registration)
        -> Result<NotifierSession, RegistrationError>;

    /// Deliver one notification.
    ///
    /// Delivery is best-effort; callers log failures and move on.
    async fn notify(
        &self,
        session: &NotifierSession,
        notification: &Notification,
    ) -> Result<(), NotificationError>;
}

/// Blanket implementation for boxed notifier types
#[async_trait]
impl Notifier for Box<dyn Notifier> {
    async fn register(
        &self,
        registration: &Registration,
    ) -> Result<NotifierSession, RegistrationError> {
        self.as_ref().register(registration).await
    }

    async fn notify(
        &self,
        session: &NotifierSession,
        notification: &Notification,
    ) -> Result<(), NotificationError> {
        self.as_ref().notify(session, notification).await
    }
}
