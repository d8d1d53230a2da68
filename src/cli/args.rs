//! CLI argument definitions using Clap

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::application::SALT_CATEGORY;
use crate::domain::config::{AppConfig, Backend};

/// salt-growl - Salt event bus to Growl notification bridge
#[derive(Parser, Debug)]
#[command(name = "salt-growl")]
#[command(version)]
#[command(about = "Forward Salt event bus traffic to Growl (GNTP) notifications")]
#[command(long_about = None)]
pub struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short = 'v', long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(flatten)]
    pub notifier: NotifierArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Notifier options shared by every subcommand
#[derive(Args, Debug, Default, Clone)]
pub struct NotifierArgs {
    /// Notification backend
    #[arg(short = 'b', long, value_name = "BACKEND", global = true)]
    pub backend: Option<BackendArg>,

    /// GNTP receiver host
    #[arg(short = 'H', long, value_name = "HOST", global = true)]
    pub hostname: Option<String>,

    /// GNTP receiver port
    #[arg(short = 'p', long, value_name = "PORT", global = true)]
    pub port: Option<u16>,

    /// GNTP password (prefer SALT_GROWL_PASSWORD)
    #[arg(long, value_name = "PASSWORD", global = true)]
    pub password: Option<String>,

    /// Application name shown by the receiver
    #[arg(long = "app-name", value_name = "NAME", global = true)]
    pub application_name: Option<String>,

    /// Application icon URL
    #[arg(long, value_name = "URL", global = true)]
    pub icon: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, value_name = "SECS", global = true)]
    pub timeout: Option<u64>,
}

/// Subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Watch the Salt event bus and forward events (default)
    Watch(WatchArgs),
    /// Send a single notification
    Notify {
        /// Notification text
        message: String,
        /// Notification type (category)
        #[arg(short = 't', long = "type", value_name = "TYPE", default_value = SALT_CATEGORY)]
        note_type: String,
        /// Notification title
        #[arg(long, default_value = "Title")]
        title: String,
    },
    /// Notify a job return read as JSON from stdin
    Return,
    /// Register the application and its notification types, then exit
    Register,
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Options for the dispatch loop
#[derive(Args, Debug, Default, Clone)]
pub struct WatchArgs {
    /// Read events from stdin instead of the master's IPC socket
    #[arg(long)]
    pub stdin: bool,

    /// Directory of notification templates
    #[arg(long, value_name = "DIR")]
    pub template_dir: Option<PathBuf>,

    /// Bus node role
    #[arg(long, value_name = "NODE")]
    pub node: Option<String>,

    /// Bus socket directory
    #[arg(long, value_name = "DIR")]
    pub sock_dir: Option<PathBuf>,

    /// Callback URL pattern for job returns
    #[arg(long, value_name = "URL")]
    pub results_callback: Option<String>,
}

/// Config action subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Create config file with defaults
    Init,
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// Config value
        value: String,
    },
    /// Get a config value
    Get {
        /// Config key
        key: String,
    },
    /// List all config values
    List,
    /// Show config file path
    Path,
}

/// Backend argument for clap ValueEnum
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum BackendArg {
    Gntp,
    Desktop,
}

impl From<BackendArg> for Backend {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Gntp => Backend::Gntp,
            BackendArg::Desktop => Backend::Desktop,
        }
    }
}

impl NotifierArgs {
    /// Command-line layer of the configuration
    pub fn to_config(&self) -> AppConfig {
        AppConfig {
            application_name: self.application_name.clone(),
            backend: self.backend.map(Backend::from),
            hostname: self.hostname.clone(),
            port: self.port,
            password: self.password.clone(),
            icon: self.icon.clone(),
            timeout: self.timeout,
            ..Default::default()
        }
    }
}

impl WatchArgs {
    /// Command-line layer of the configuration, including notifier options
    pub fn to_config(&self, notifier: &NotifierArgs) -> AppConfig {
        AppConfig {
            template_dir: self.template_dir.clone(),
            node: self.node.clone(),
            sock_dir: self.sock_dir.clone(),
            results_callback: self.results_callback.clone(),
            ..notifier.to_config()
        }
    }
}

/// Valid config keys
pub const VALID_CONFIG_KEYS: &[&str] = &[
    "application_name",
    "backend",
    "hostname",
    "port",
    "password",
    "icon",
    "timeout",
    "template_dir",
    "node",
    "sock_dir",
    "results_callback",
];

/// Check if a config key is valid
pub fn is_valid_config_key(key: &str) -> bool {
    VALID_CONFIG_KEYS.contains(&key)
}
