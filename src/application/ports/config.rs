//! Configuration port interface

use async_trait::async_trait;
use std::path::PathBuf;

use crate::domain::config::AppConfig;
use crate::domain::error::ConfigError;

/// Port for configuration storage
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Load configuration from storage.
    ///
    /// A missing file yields an empty config rather than an error.
    async fn load(&self) -> Result<AppConfig, ConfigError>;

    /// Persist the whole configuration.
    async fn save(&self, config: &AppConfig) -> Result<(), ConfigError>;

    /// Location of the backing file.
    fn path(&self) -> PathBuf;

    /// Whether the backing file exists.
    fn exists(&self) -> bool;

    /// Write the default configuration. Fails if the file already exists.
    async fn init(&self) -> Result<(), ConfigError>;
}
