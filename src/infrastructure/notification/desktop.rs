//! Local desktop notification adapter using notify-rust
//!
//! Fallback backend for hosts without a GNTP receiver. Works on Windows,
//! macOS, and Linux.

use async_trait::async_trait;

use crate::application::ports::{NotificationError, Notifier, RegistrationError};
use crate::domain::notification::{Notification, NotifierSession, Registration};

const DEFAULT_ICON: &str = "dialog-information";

/// Desktop notifier using notify-rust
#[derive(Debug, Default)]
pub struct DesktopNotifier;

impl DesktopNotifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Notifier for DesktopNotifier {
    // The desktop has no registration step; categories are only checked locally.
    async fn register(
        &self,
        registration: &Registration,
    ) -> Result<NotifierSession, RegistrationError> {
        Ok(registration.clone().into_session())
    }

    async fn notify(
        &self,
        session: &NotifierSession,
        notification: &Notification,
    ) -> Result<(), NotificationError> {
        session.ensure_declared(&notification.category)?;

        let app_name = session.app_name().to_owned();
        let icon = session.icon().unwrap_or(DEFAULT_ICON).to_owned();
        let title = notification.title.clone();
        let body = notification.body.clone();
        let sticky = notification.options.sticky;

        // notify-rust operations can block, so run in spawn_blocking
        tokio::task::spawn_blocking(move || {
            let mut desktop = notify_rust::Notification::new();
            desktop.appname(&app_name).summary(&title).body(&body).icon(&icon);
            if sticky {
                desktop.timeout(notify_rust::Timeout::Never);
            }
            desktop
                .show()
                .map_err(|e| NotificationError::SendFailed(e.to_string()))?;
            Ok(())
        })
        .await
        .map_err(|e| NotificationError::SendFailed(format!("Task join error: {}", e)))?
    }
}
