//! Built-in Salt event handlers

use super::registry::{HandlerDescriptor, PatternRegistry, RegistryError};

/// Build the registry of Salt handlers.
///
/// `results_callback` is a URL pattern attached to job return notifications.
/// Job returns are registered ahead of new-job events so the narrower pattern
/// is tried first.
pub fn salt_registry(results_callback: Option<String>) -> Result<PatternRegistry, RegistryError> {
    Ok(PatternRegistry::new()
        .with(HandlerDescriptor::new(
            "minion_start",
            "salt/minion/*/start",
            "Start",
        )?)
        .with(
            HandlerDescriptor::new("job_return", "salt/job/*/ret/*", "Results")?
                .sticky()
                .callback(results_callback),
        )
        .with(HandlerDescriptor::new("job_new", "salt/job/*/new", "Job")?)
        .with(HandlerDescriptor::new("new_job", "new_job", "New Job")?.suppressed())
        // salt/auth fires on every minion key check and drowns everything else
        .with(HandlerDescriptor::new("salt_auth", "salt/auth", "Auth")?.suppressed()))
}
