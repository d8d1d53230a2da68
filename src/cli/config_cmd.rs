//! Config command handler

use crate::application::ports::ConfigStore;
use crate::domain::config::{AppConfig, Backend};
use crate::domain::error::ConfigError;

use super::args::{is_valid_config_key, ConfigAction, VALID_CONFIG_KEYS};
use super::presenter::Presenter;

const NOT_SET: &str = "(not set)";

/// Handle config subcommand
pub async fn handle_config_command<S: ConfigStore>(
    action: ConfigAction,
    store: &S,
    presenter: &Presenter,
) -> Result<(), ConfigError> {
    match action {
        ConfigAction::Init => handle_init(store, presenter).await,
        ConfigAction::Set { key, value } => handle_set(store, presenter, &key, &value).await,
        ConfigAction::Get { key } => handle_get(store, presenter, &key).await,
        ConfigAction::List => handle_list(store, presenter).await,
        ConfigAction::Path => handle_path(store, presenter),
    }
}

async fn handle_init<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    store.init().await?;
    presenter.success(&format!(
        "Config file created at: {}",
        store.path().display()
    ));
    Ok(())
}

async fn handle_set<S: ConfigStore>(
    store: &S,
    presenter: &Presenter,
    key: &str,
    value: &str,
) -> Result<(), ConfigError> {
    ensure_valid_key(key)?;

    let mut config = store.load().await?;
    set_value(&mut config, key, value)?;
    store.save(&config).await?;

    let shown = if key == "password" {
        mask_secret(value)
    } else {
        value.to_string()
    };
    presenter.success(&format!("{} = {}", key, shown));
    Ok(())
}

async fn handle_get<S: ConfigStore>(
    store: &S,
    presenter: &Presenter,
    key: &str,
) -> Result<(), ConfigError> {
    ensure_valid_key(key)?;

    let config = store.load().await?;
    match display_value(&config, key) {
        Some(v) => presenter.output(&v),
        None => presenter.output(NOT_SET),
    }
    Ok(())
}

async fn handle_list<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    let config = store.load().await?;
    for key in VALID_CONFIG_KEYS {
        presenter.key_value(
            key,
            &display_value(&config, key).unwrap_or_else(|| NOT_SET.to_string()),
        );
    }
    Ok(())
}

fn handle_path<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    presenter.output(&store.path().to_string_lossy());
    Ok(())
}

fn ensure_valid_key(key: &str) -> Result<(), ConfigError> {
    if is_valid_config_key(key) {
        Ok(())
    } else {
        Err(ConfigError::ValidationError {
            key: key.to_string(),
            message: format!("Unknown key. Valid keys: {}", VALID_CONFIG_KEYS.join(", ")),
        })
    }
}

/// Validate `value` for `key` and store it
fn set_value(config: &mut AppConfig, key: &str, value: &str) -> Result<(), ConfigError> {
    let invalid = |message: String| ConfigError::ValidationError {
        key: key.to_string(),
        message,
    };

    match key {
        "application_name" => config.application_name = Some(non_empty(key, value)?),
        "backend" => config.backend = Some(value.parse::<Backend>()?),
        "hostname" => config.hostname = Some(non_empty(key, value)?),
        "port" => {
            let port = value
                .parse::<u16>()
                .ok()
                .filter(|p| *p > 0)
                .ok_or_else(|| invalid("Value must be a port number (1-65535)".to_string()))?;
            config.port = Some(port);
        }
        "password" => config.password = Some(value.to_string()),
        "icon" => config.icon = Some(non_empty(key, value)?),
        "timeout" => {
            let secs = value
                .trim_end_matches('s')
                .parse::<u64>()
                .ok()
                .filter(|s| *s > 0)
                .ok_or_else(|| invalid("Value must be a positive number of seconds".to_string()))?;
            config.timeout = Some(secs);
        }
        "template_dir" => config.template_dir = Some(non_empty(key, value)?.into()),
        "node" => config.node = Some(non_empty(key, value)?),
        "sock_dir" => config.sock_dir = Some(non_empty(key, value)?.into()),
        "results_callback" => config.results_callback = Some(non_empty(key, value)?),
        _ => return Err(invalid("Unknown key".to_string())),
    }
    Ok(())
}

/// Value as shown by `config get` / `config list`; the password is masked
fn display_value(config: &AppConfig, key: &str) -> Option<String> {
    match key {
        "application_name" => config.application_name.clone(),
        "backend" => config.backend.map(|b| b.to_string()),
        "hostname" => config.hostname.clone(),
        "port" => config.port.map(|p| p.to_string()),
        "password" => config.password.as_deref().map(mask_secret),
        "icon" => config.icon.clone(),
        "timeout" => config.timeout.map(|t| t.to_string()),
        "template_dir" => config.template_dir.as_ref().map(|p| p.display().to_string()),
        "node" => config.node.clone(),
        "sock_dir" => config.sock_dir.as_ref().map(|p| p.display().to_string()),
        "results_callback" => config.results_callback.clone(),
        _ => None,
    }
}

fn non_empty(key: &str, value: &str) -> Result<String, ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            key: key.to_string(),
            message: "Value must not be empty".to_string(),
        });
    }
    Ok(value.to_string())
}

/// Mask a secret for display, keeping only its length visible
fn mask_secret(secret: &str) -> String {
    "*".repeat(secret.chars().count())
}
