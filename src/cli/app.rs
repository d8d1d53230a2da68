//! Subcommand runners

use std::env;
use std::process::ExitCode;

use serde_json::Value;
use tokio::io::AsyncReadExt;
use tracing::{info, warn};

use crate::application::ports::{BusError, ConfigStore, EventBus, Notifier};
use crate::application::{
    job_return_notification, salt_registry, DispatchConfig, DispatchError, Dispatcher,
    SendNotificationUseCase, SALT_CATEGORY,
};
use crate::domain::config::AppConfig;
use crate::domain::notification::{Notification, Registration};
use crate::domain::template::TemplateSet;
use crate::infrastructure::{create_notifier, JsonLinesBus, XdgConfigStore};

use super::presenter::Presenter;
use super::signals;

/// Exit codes
pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_ERROR: u8 = 1;
pub const EXIT_USAGE_ERROR: u8 = 2;

/// Environment variable holding the GNTP password
pub const PASSWORD_ENV: &str = "SALT_GROWL_PASSWORD";

/// Run the dispatch loop until the bus closes or a shutdown signal arrives
pub async fn run_watch(config: AppConfig, use_stdin: bool) -> ExitCode {
    let presenter = Presenter::new();

    let shutdown = match signals::shutdown_token() {
        Ok(token) => token,
        Err(e) => {
            presenter.error(&format!("Failed to setup signal handler: {}", e));
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let (mut dispatcher, mut bus) = match start_dispatch(&config, use_stdin).await {
        Ok(started) => started,
        Err(e) => {
            presenter.error(&e.to_string());
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let stats = dispatcher.run(bus.as_mut(), shutdown).await;
    presenter.dispatch_summary(&stats);
    ExitCode::from(EXIT_SUCCESS)
}

/// Load templates, register, then connect the bus
async fn start_dispatch(
    config: &AppConfig,
    use_stdin: bool,
) -> Result<(Dispatcher<Box<dyn Notifier>>, Box<dyn EventBus>), DispatchError> {
    let templates = match &config.template_dir {
        Some(dir) => TemplateSet::load_dir(dir)?,
        None => TemplateSet::builtin()?,
    };
    let registry = salt_registry(config.results_callback.clone())?;

    let dispatcher = Dispatcher::start(
        create_notifier(config),
        registry,
        templates,
        DispatchConfig {
            app_name: config.application_name_or_default().to_string(),
            icon: config.icon.clone(),
        },
    )
    .await?;

    let bus = connect_bus(config, use_stdin).await?;
    Ok((dispatcher, bus))
}

#[cfg(unix)]
async fn connect_bus(
    config: &AppConfig,
    use_stdin: bool,
) -> Result<Box<dyn EventBus>, BusError> {
    use crate::infrastructure::SaltIpcBus;

    if use_stdin {
        return Ok(Box::new(JsonLinesBus::stdin()));
    }
    let path = SaltIpcBus::socket_path(&config.sock_dir_or_default(), config.node_or_default());
    Ok(Box::new(SaltIpcBus::connect(path).await?))
}

#[cfg(not(unix))]
async fn connect_bus(
    config: &AppConfig,
    use_stdin: bool,
) -> Result<Box<dyn EventBus>, BusError> {
    if use_stdin {
        return Ok(Box::new(JsonLinesBus::stdin()));
    }
    Err(BusError::Connect {
        uri: format!("ipc://{}", config.sock_dir_or_default().display()),
        message: "the IPC event bus is only available on Unix; use --stdin".to_string(),
    })
}

/// Send one notification of type `note_type`
pub async fn run_notify(config: AppConfig, message: &str, note_type: &str, title: &str) -> ExitCode {
    let presenter = Presenter::new();

    let registration = Registration::new(
        config.application_name_or_default(),
        [SALT_CATEGORY, note_type],
    )
    .with_icon(config.icon.clone());
    let use_case = SendNotificationUseCase::with_registration(create_notifier(&config), registration);

    match use_case
        .send(&Notification::new(note_type, title, message))
        .await
    {
        Ok(()) => {
            presenter.success("Notification sent");
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(e) => {
            presenter.error(&e.to_string());
            ExitCode::from(EXIT_ERROR)
        }
    }
}

/// Notify a job return read from stdin.
///
/// Delivery failures are reported but do not fail the returner.
pub async fn run_return(config: AppConfig) -> ExitCode {
    let presenter = Presenter::new();

    let mut input = String::new();
    if let Err(e) = tokio::io::stdin().read_to_string(&mut input).await {
        presenter.error(&format!("Failed to read job return: {}", e));
        return ExitCode::from(EXIT_ERROR);
    }
    let ret: Value = match serde_json::from_str(&input) {
        Ok(ret) => ret,
        Err(e) => {
            presenter.error(&format!("Invalid job return JSON: {}", e));
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let use_case = SendNotificationUseCase::new(
        create_notifier(&config),
        config.application_name_or_default(),
        config.icon.clone(),
    );
    match use_case.send(&job_return_notification(&ret)).await {
        Ok(()) => presenter.success("Job return sent"),
        Err(e) => presenter.warn(&e.to_string()),
    }
    ExitCode::from(EXIT_SUCCESS)
}

/// Register every notification type without sending anything
pub async fn run_register(config: AppConfig) -> ExitCode {
    let presenter = Presenter::new();

    let categories = match salt_registry(None) {
        Ok(registry) => registry.categories(),
        Err(e) => {
            presenter.error(&e.to_string());
            return ExitCode::from(EXIT_ERROR);
        }
    };
    let registration = Registration::new(config.application_name_or_default(), categories)
        .with_icon(config.icon.clone());
    let use_case = SendNotificationUseCase::with_registration(create_notifier(&config), registration);

    match use_case.register().await {
        Ok(session) => {
            presenter.success(&format!(
                "Registered '{}' with {} notification types",
                session.app_name(),
                session.categories().count()
            ));
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(e) => {
            presenter.error(&e.to_string());
            ExitCode::from(EXIT_ERROR)
        }
    }
}

/// Configuration read from the environment
pub fn env_config() -> AppConfig {
    AppConfig {
        password: env::var(PASSWORD_ENV).ok().filter(|s| !s.is_empty()),
        ..Default::default()
    }
}

/// Load and merge configuration from file, env, and CLI
pub async fn load_merged_config(cli_config: AppConfig) -> AppConfig {
    let store = XdgConfigStore::new();
    let file_config = match store.load().await {
        Ok(config) => config,
        Err(e) => {
            warn!(path = %store.path().display(), error = %e, "Ignoring unreadable config file");
            AppConfig::empty()
        }
    };

    let config = merge_layers(file_config, env_config(), cli_config);
    info!(
        backend = %config.backend_or_default(),
        receiver = %format!("{}:{}", config.hostname_or_default(), config.port_or_default()),
        "Configuration loaded"
    );
    config
}

/// defaults < file < env < cli
fn merge_layers(file: AppConfig, env: AppConfig, cli: AppConfig) -> AppConfig {
    AppConfig::defaults().merge(file).merge(env).merge(cli)
}
