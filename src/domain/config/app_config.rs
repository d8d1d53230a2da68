//! Application configuration value object

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::error::ConfigError;

/// Default GNTP application name
pub const DEFAULT_APPLICATION_NAME: &str = "Salt";
/// Default GNTP receiver host
pub const DEFAULT_HOSTNAME: &str = "localhost";
/// Default GNTP receiver port
pub const DEFAULT_PORT: u16 = 23053;
/// Default per-request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
/// Default bus node role
pub const DEFAULT_NODE: &str = "master";
/// Default bus socket directory
pub const DEFAULT_SOCK_DIR: &str = "/var/run/salt/master";

/// Outbound notification backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Growl Notification Transport Protocol receiver
    #[default]
    Gntp,
    /// Local desktop notification service
    Desktop,
}

impl Backend {
    pub const ALL: &'static [&'static str] = &["gntp", "desktop"];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Gntp => "gntp",
            Self::Desktop => "desktop",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Backend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gntp" | "growl" => Ok(Self::Gntp),
            "desktop" => Ok(Self::Desktop),
            _ => Err(ConfigError::ValidationError {
                key: "backend".to_string(),
                message: format!(
                    "Invalid value '{}'. Valid options: {}",
                    s,
                    Self::ALL.join(", ")
                ),
            }),
        }
    }
}

/// Application configuration.
/// All fields are optional to support partial configs and merging.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    pub application_name: Option<String>,
    pub backend: Option<Backend>,
    pub hostname: Option<String>,
    pub port: Option<u16>,
    pub password: Option<String>,
    pub icon: Option<String>,
    pub timeout: Option<u64>,
    pub template_dir: Option<PathBuf>,
    pub node: Option<String>,
    pub sock_dir: Option<PathBuf>,
    pub results_callback: Option<String>,
}

impl AppConfig {
    /// Create config with default values
    pub fn defaults() -> Self {
        Self {
            application_name: Some(DEFAULT_APPLICATION_NAME.to_string()),
            backend: Some(Backend::Gntp),
            hostname: Some(DEFAULT_HOSTNAME.to_string()),
            port: Some(DEFAULT_PORT),
            password: None,
            icon: None,
            timeout: Some(DEFAULT_TIMEOUT_SECS),
            template_dir: None,
            node: Some(DEFAULT_NODE.to_string()),
            sock_dir: Some(PathBuf::from(DEFAULT_SOCK_DIR)),
            results_callback: None,
        }
    }

    /// Create an empty config (all None)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Merge this config with another, where other takes precedence.
    /// Only non-None values from other will override this.
    pub fn merge(self, other: Self) -> Self {
        Self {
            application_name: other.application_name.or(self.application_name),
            backend: other.backend.or(self.backend),
            hostname: other.hostname.or(self.hostname),
            port: other.port.or(self.port),
            password: other.password.or(self.password),
            icon: other.icon.or(self.icon),
            timeout: other.timeout.or(self.timeout),
            template_dir: other.template_dir.or(self.template_dir),
            node: other.node.or(self.node),
            sock_dir: other.sock_dir.or(self.sock_dir),
            results_callback: other.results_callback.or(self.results_callback),
        }
    }

    pub fn application_name_or_default(&self) -> &str {
        self.application_name
            .as_deref()
            .unwrap_or(DEFAULT_APPLICATION_NAME)
    }

    pub fn backend_or_default(&self) -> Backend {
        self.backend.unwrap_or_default()
    }

    pub fn hostname_or_default(&self) -> &str {
        self.hostname.as_deref().unwrap_or(DEFAULT_HOSTNAME)
    }

    pub fn port_or_default(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_PORT)
    }

    /// Per-request timeout, or 10s if not set. Zero is treated as unset.
    pub fn timeout_or_default(&self) -> std::time::Duration {
        let secs = self
            .timeout
            .filter(|t| *t > 0)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        std::time::Duration::from_secs(secs)
    }

    pub fn node_or_default(&self) -> &str {
        self.node.as_deref().unwrap_or(DEFAULT_NODE)
    }

    pub fn sock_dir_or_default(&self) -> PathBuf {
        self.sock_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SOCK_DIR))
    }

    /// The empty string counts as no password
    pub fn password(&self) -> Option<&str> {
        self.password.as_deref().filter(|p| !p.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_have_expected_values() {
        let config = AppConfig::defaults();
        assert_eq!(config.application_name, Some("Salt".to_string()));
        assert_eq!(config.backend, Some(Backend::Gntp));
        assert_eq!(config.hostname, Some("localhost".to_string()));
        assert_eq!(config.port, Some(23053));
        assert!(config.password.is_none());
        assert_eq!(config.node, Some("master".to_string()));
        assert_eq!(config.sock_dir, Some(PathBuf::from("/var/run/salt/master")));
        assert!(config.template_dir.is_none());
        assert!(config.results_callback.is_none());
    }

    #[test]
    fn empty_has_all_none() {
        let config = AppConfig::empty();
        assert!(config.application_name.is_none());
        assert!(config.hostname.is_none());
        assert!(config.port.is_none());
        assert!(config.node.is_none());
    }

    #[test]
    fn merge_other_takes_precedence() {
        let base = AppConfig {
            hostname: Some("growl.local".to_string()),
            port: Some(23053),
            node: Some("master".to_string()),
            ..Default::default()
        };

        let other = AppConfig {
            hostname: Some("10.0.0.5".to_string()),
            port: None,
            node: Some("minion".to_string()),
            ..Default::default()
        };

        let merged = base.merge(other);

        assert_eq!(merged.hostname, Some("10.0.0.5".to_string()));
        assert_eq!(merged.port, Some(23053));
        assert_eq!(merged.node, Some("minion".to_string()));
    }

    #[test]
    fn merge_preserves_base_when_other_is_none() {
        let base = AppConfig {
            password: Some("secret".to_string()),
            backend: Some(Backend::Desktop),
            ..Default::default()
        };

        let merged = base.merge(AppConfig::empty());

        assert_eq!(merged.password(), Some("secret"));
        assert_eq!(merged.backend_or_default(), Backend::Desktop);
    }

    #[test]
    fn accessors_fall_back_on_empty() {
        let config = AppConfig::empty();
        assert_eq!(config.application_name_or_default(), "Salt");
        assert_eq!(config.backend_or_default(), Backend::Gntp);
        assert_eq!(config.hostname_or_default(), "localhost");
        assert_eq!(config.port_or_default(), 23053);
        assert_eq!(config.timeout_or_default().as_secs(), 10);
        assert_eq!(config.node_or_default(), "master");
        assert_eq!(
            config.sock_dir_or_default(),
            PathBuf::from("/var/run/salt/master")
        );
    }

    #[test]
    fn zero_timeout_uses_default() {
        let config = AppConfig {
            timeout: Some(0),
            ..Default::default()
        };
        assert_eq!(config.timeout_or_default().as_secs(), 10);
    }

    #[test]
    fn empty_password_is_none() {
        let config = AppConfig {
            password: Some(String::new()),
            ..Default::default()
        };
        assert!(config.password().is_none());
    }

    #[test]
    fn backend_parses() {
        assert_eq!("gntp".parse::<Backend>().unwrap(), Backend::Gntp);
        assert_eq!("GROWL".parse::<Backend>().unwrap(), Backend::Gntp);
        assert_eq!("desktop".parse::<Backend>().unwrap(), Backend::Desktop);
        assert!("pager".parse::<Backend>().is_err());
    }

    #[test]
    fn backend_serializes_lowercase() {
        let config = AppConfig {
            backend: Some(Backend::Desktop),
            ..Default::default()
        };
        let text = toml::to_string(&config).unwrap();
        assert!(text.contains("backend = \"desktop\""));
    }
}
