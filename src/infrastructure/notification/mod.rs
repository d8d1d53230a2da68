//! Notification infrastructure module
//!
//! GNTP is the primary backend; notify-rust covers local desktops without a
//! Growl-compatible receiver.

mod desktop;
mod gntp;
mod origin;

pub use desktop::DesktopNotifier;
pub use gntp::{GntpConfig, GntpNotifier};
pub use origin::OriginInfo;

use crate::application::ports::Notifier;
use crate::domain::config::{AppConfig, Backend};

/// Create the notifier selected by the configuration
pub fn create_notifier(config: &AppConfig) -> Box<dyn Notifier> {
    match config.backend_or_default() {
        Backend::Gntp => Box::new(GntpNotifier::new(GntpConfig {
            hostname: config.hostname_or_default().to_string(),
            port: config.port_or_default(),
            password: config.password().map(str::to_string),
            timeout: config.timeout_or_default(),
        })),
        Backend::Desktop => Box::new(DesktopNotifier::new()),
    }
}
