//! One-shot notifications outside the dispatch loop

use serde_json::Value;
use thiserror::Error;

use crate::domain::notification::{Notification, NotifierSession, Registration};

use super::ports::{NotificationError, Notifier, RegistrationError};

/// Category used by one-shot notifications
pub const SALT_CATEGORY: &str = "Salt";

/// Errors from a one-shot notification
#[derive(Debug, Error)]
pub enum OneShotError {
    #[error("Registration failed: {0}")]
    Registration(#[from] RegistrationError),

    #[error("Notification failed: {0}")]
    Notification(#[from] NotificationError),
}

/// Register, then send a single notification.
///
/// Each call performs its own registration handshake, so it can be used
/// from short-lived processes such as job returners.
pub struct SendNotificationUseCase<N: Notifier> {
    notifier: N,
    registration: Registration,
}

impl<N: Notifier> SendNotificationUseCase<N> {
    /// Create a use case that registers `app_name` with the `Salt` category
    pub fn new(notifier: N, app_name: impl Into<String>, icon: Option<String>) -> Self {
        Self::with_registration(
            notifier,
            Registration::new(app_name, [SALT_CATEGORY]).with_icon(icon),
        )
    }

    /// Create a use case with an explicit registration
    pub fn with_registration(notifier: N, registration: Registration) -> Self {
        Self {
            notifier,
            registration,
        }
    }

    /// Perform only the registration handshake
    pub async fn register(&self) -> Result<NotifierSession, OneShotError> {
        Ok(self.notifier.register(&self.registration).await?)
    }

    /// Register and send `notification`
    pub async fn send(&self, notification: &Notification) -> Result<(), OneShotError> {
        let session = self.register().await?;
        self.notifier.notify(&session, notification).await?;
        Ok(())
    }
}

/// Build the notification for a finished job's return data.
///
/// The title is the executed function, falling back to the category name.
pub fn job_return_notification(ret: &Value) -> Notification {
    let title = ret
        .get("fun")
        .and_then(Value::as_str)
        .unwrap_or(SALT_CATEGORY);
    let body = serde_json::to_string_pretty(ret).unwrap_or_else(|_| ret.to_string());
    Notification::new(SALT_CATEGORY, title, body)
}
