//! Event dispatch use case

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::domain::dispatch::{DispatchSession, DispatchState};
use crate::domain::error::TemplateError;
use crate::domain::event::Event;
use crate::domain::notification::{Notification, NotifierSession, NotifyOptions, Registration};
use crate::domain::template::TemplateSet;

use super::ports::{BusError, EventBus, Notifier, RegistrationError};
use super::registry::{HandlerAction, HandlerDescriptor, PatternRegistry, RegistryError};

/// Startup errors. Any of these prevents the dispatch loop from starting.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Registration failed: {0}")]
    Registration(#[from] RegistrationError),

    #[error("Invalid handler registry: {0}")]
    Registry(#[from] RegistryError),

    #[error("Failed to load templates: {0}")]
    Template(#[from] TemplateError),

    #[error("Event bus unavailable: {0}")]
    Bus(#[from] BusError),
}

/// Static dispatcher settings
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// Application name announced at registration
    pub app_name: String,
    /// Application icon URL
    pub icon: Option<String>,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            app_name: crate::domain::config::DEFAULT_APPLICATION_NAME.to_string(),
            icon: None,
        }
    }
}

/// What happened to a single event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Numeric sequence tag, dropped before matching
    SkippedNumeric,
    /// No handler pattern matched
    Unhandled,
    /// Matched a handler that is switched off
    Suppressed { handler: String },
    /// Notification handed to the notifier
    Notified { handler: String, category: String },
    /// Body or callback template failed
    RenderFailed { handler: String, error: String },
    /// Notifier reported a failure
    NotifyFailed { handler: String, error: String },
}

/// Running counters for the dispatch loop
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub received: u64,
    pub skipped: u64,
    pub unhandled: u64,
    pub suppressed: u64,
    pub notified: u64,
    pub failed: u64,
    pub malformed: u64,
}

impl DispatchStats {
    fn record(&mut self, outcome: &Outcome) {
        self.received += 1;
        match outcome {
            Outcome::SkippedNumeric => self.skipped += 1,
            Outcome::Unhandled => self.unhandled += 1,
            Outcome::Suppressed { .. } => self.suppressed += 1,
            Outcome::Notified { .. } => self.notified += 1,
            Outcome::RenderFailed { .. } | Outcome::NotifyFailed { .. } => self.failed += 1,
        }
    }
}

/// Dispatches bus events to notification handlers.
///
/// Holds a registered notifier session; construct with [`Dispatcher::start`].
pub struct Dispatcher<N: Notifier> {
    registry: PatternRegistry,
    templates: TemplateSet,
    notifier: N,
    session: NotifierSession,
    state: DispatchSession,
    stats: DispatchStats,
}

impl<N: Notifier> Dispatcher<N> {
    /// Register the application with every registry category and return a
    /// dispatcher ready to process events.
    pub async fn start(
        notifier: N,
        registry: PatternRegistry,
        templates: TemplateSet,
        config: DispatchConfig,
    ) -> Result<Self, DispatchError> {
        let registration =
            Registration::new(config.app_name, registry.categories()).with_icon(config.icon);
        let session = notifier.register(&registration).await?;
        info!(
            app = session.app_name(),
            categories = ?registration.categories,
            "Registered with notification receiver"
        );

        Ok(Self {
            registry,
            templates,
            notifier,
            session,
            state: DispatchSession::new(),
            stats: DispatchStats::default(),
        })
    }

    /// The registered notifier session
    pub fn session(&self) -> &NotifierSession {
        &self.session
    }

    /// Current loop state
    pub fn state(&self) -> DispatchState {
        self.state.state()
    }

    /// Counters so far
    pub fn stats(&self) -> DispatchStats {
        self.stats
    }

    /// The wrapped notifier
    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Pull events from `bus` until it closes or `shutdown` fires.
    ///
    /// Per-event failures are logged and never end the loop. A failed read
    /// from the bus itself does, since retrying it would only spin.
    pub async fn run<B>(&mut self, bus: &mut B, shutdown: CancellationToken) -> DispatchStats
    where
        B: EventBus + ?Sized,
    {
        info!(uri = %bus.uri(), "Listening for events");

        loop {
            let read = tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    info!("Shutdown requested, leaving dispatch loop");
                    break;
                }
                read = bus.next_event() => read,
            };

            match read {
                Ok(Some(event)) => {
                    self.process(event).await;
                }
                Ok(None) => continue,
                Err(BusError::Closed) => {
                    info!("Event bus closed, leaving dispatch loop");
                    break;
                }
                Err(BusError::Malformed(message)) => {
                    self.stats.malformed += 1;
                    warn!(%message, "Dropping malformed event");
                }
                Err(err) => {
                    error!(error = %err, "Event bus failed, leaving dispatch loop");
                    break;
                }
            }
        }

        self.stats
    }

    /// Run one event through the Idle -> Processing -> Idle cycle
    pub async fn process(&mut self, event: Event) -> Outcome {
        if let Err(err) = self.state.begin() {
            error!(error = %err, "Dispatch state out of sync");
        }

        let outcome = self.handle(&event).await;

        if let Err(err) = self.state.finish() {
            error!(error = %err, "Dispatch state out of sync");
        }
        self.stats.record(&outcome);
        outcome
    }

    async fn handle(&self, event: &Event) -> Outcome {
        if event.is_numeric() {
            debug!(tag = event.tag(), "Skipping numeric tag");
            return Outcome::SkippedNumeric;
        }

        let Some(handler) = self.registry.lookup(event.tag()) else {
            info!(tag = event.tag(), payload = %event.pretty_data(), "Unhandled tag");
            return Outcome::Unhandled;
        };

        debug!(
            tag = event.tag(),
            handler = handler.name(),
            pattern = handler.pattern(),
            category = handler.category(),
            "Matched handler"
        );

        if handler.action() == HandlerAction::Suppress {
            debug!(tag = event.tag(), handler = handler.name(), "Handler suppressed");
            return Outcome::Suppressed {
                handler: handler.name().to_string(),
            };
        }

        let notification = match self.build_notification(handler, event) {
            Ok(notification) => notification,
            Err(err) => {
                error!(tag = event.tag(), handler = handler.name(), error = %err, "Failed to render notification");
                return Outcome::RenderFailed {
                    handler: handler.name().to_string(),
                    error: err.to_string(),
                };
            }
        };

        match self.notifier.notify(&self.session, &notification).await {
            Ok(()) => Outcome::Notified {
                handler: handler.name().to_string(),
                category: handler.category().to_string(),
            },
            Err(err) => {
                warn!(tag = event.tag(), handler = handler.name(), error = %err, "Failed to deliver notification");
                Outcome::NotifyFailed {
                    handler: handler.name().to_string(),
                    error: err.to_string(),
                }
            }
        }
    }

    fn build_notification(
        &self,
        handler: &HandlerDescriptor,
        event: &Event,
    ) -> Result<Notification, crate::domain::error::RenderError> {
        let body = self
            .templates
            .render(handler.template_name(), event.data())?;
        let callback = handler
            .callback_pattern()
            .map(|pattern| self.templates.render_str(pattern, event.data()))
            .transpose()?;

        Ok(
            Notification::new(handler.category(), event.tag(), body).with_options(NotifyOptions {
                sticky: handler.is_sticky(),
                callback,
                identifier: Some(event.tag().to_string()),
            }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::salt_registry;
    use crate::application::ports::NotificationError;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingNotifier {
        sent: Mutex<Vec<Notification>>,
        fail_notify: bool,
        fail_register: bool,
    }

    impl RecordingNotifier {
        fn sent(&self) -> Vec<Notification> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn register(
            &self,
            registration: &Registration,
        ) -> Result<NotifierSession, RegistrationError> {
            if self.fail_register {
                return Err(RegistrationError::Connect {
                    address: "localhost:23053".to_string(),
                    message: "connection refused".to_string(),
                });
            }
            Ok(registration.clone().into_session())
        }

        async fn notify(
            &self,
            session: &NotifierSession,
            notification: &Notification,
        ) -> Result<(), NotificationError> {
            session.ensure_declared(&notification.category)?;
            if self.fail_notify {
                return Err(NotificationError::SendFailed("receiver offline".to_string()));
            }
            self.sent.lock().unwrap().push(notification.clone());
            Ok(())
        }
    }

    struct VecBus {
        reads: VecDeque<Result<Option<Event>, BusError>>,
    }

    impl VecBus {
        fn new(reads: Vec<Result<Option<Event>, BusError>>) -> Self {
            Self {
                reads: reads.into(),
            }
        }
    }

    #[async_trait]
    impl EventBus for VecBus {
        fn uri(&self) -> String {
            "memory://test".to_string()
        }

        async fn next_event(&mut self) -> Result<Option<Event>, BusError> {
            self.reads.pop_front().unwrap_or(Err(BusError::Closed))
        }
    }

    fn event(tag: &str, data: serde_json::Value) -> Event {
        Event::from_value(tag, data)
    }

    async fn dispatcher(notifier: RecordingNotifier) -> Dispatcher<RecordingNotifier> {
        Dispatcher::start(
            notifier,
            salt_registry(None).unwrap(),
            TemplateSet::builtin().unwrap(),
            DispatchConfig::default(),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn start_registers_all_categories() {
        let d = dispatcher(RecordingNotifier::default()).await;
        assert_eq!(d.session().app_name(), "Salt");
        for category in ["Other", "Start", "Results", "Job", "New Job", "Auth"] {
            assert!(d.session().declares(category), "{category}");
        }
        assert_eq!(d.state(), DispatchState::Idle);
    }

    #[tokio::test]
    async fn start_fails_when_registration_fails() {
        let notifier = RecordingNotifier {
            fail_register: true,
            ..Default::default()
        };
        let result = Dispatcher::start(
            notifier,
            salt_registry(None).unwrap(),
            TemplateSet::builtin().unwrap(),
            DispatchConfig::default(),
        )
        .await;
        assert!(matches!(result, Err(DispatchError::Registration(_))));
    }

    #[tokio::test]
    async fn numeric_tag_is_skipped_before_matching() {
        let registry = PatternRegistry::new()
            .with(HandlerDescriptor::new("everything", "*", "Other").unwrap());
        let mut d = Dispatcher::start(
            RecordingNotifier::default(),
            registry,
            TemplateSet::builtin().unwrap(),
            DispatchConfig::default(),
        )
        .await
        .unwrap();

        let outcome = d.process(event("12345", json!({}))).await;
        assert_eq!(outcome, Outcome::SkippedNumeric);
        assert!(d.notifier().sent().is_empty());

        let outcome = d.process(event("1234a", json!({}))).await;
        assert!(matches!(outcome, Outcome::Notified { .. }));
    }

    #[tokio::test]
    async fn minion_start_notifies() {
        let mut d = dispatcher(RecordingNotifier::default()).await;
        let outcome = d
            .process(event("salt/minion/web01/start", json!({"data": "ready"})))
            .await;

        assert_eq!(
            outcome,
            Outcome::Notified {
                handler: "minion_start".to_string(),
                category: "Start".to_string()
            }
        );
        let sent = d.notifier().sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].category, "Start");
        assert_eq!(sent[0].title, "salt/minion/web01/start");
        assert_eq!(sent[0].body, "ready");
        assert_eq!(
            sent[0].options.identifier.as_deref(),
            Some("salt/minion/web01/start")
        );
        assert!(!sent[0].options.sticky);
    }

    #[tokio::test]
    async fn suppressed_handler_sends_nothing() {
        let mut d = dispatcher(RecordingNotifier::default()).await;
        let outcome = d.process(event("salt/auth", json!({"id": "web01"}))).await;
        assert_eq!(
            outcome,
            Outcome::Suppressed {
                handler: "salt_auth".to_string()
            }
        );
        assert!(d.notifier().sent().is_empty());
    }

    #[tokio::test]
    async fn unhandled_tag_sends_nothing() {
        let mut d = dispatcher(RecordingNotifier::default()).await;
        let outcome = d.process(event("salt/unknown/event", json!({}))).await;
        assert_eq!(outcome, Outcome::Unhandled);
        assert!(d.notifier().sent().is_empty());
        assert_eq!(d.state(), DispatchState::Idle);
    }

    #[tokio::test]
    async fn render_failure_is_contained() {
        let mut d = dispatcher(RecordingNotifier::default()).await;
        let outcome = d
            .process(event("salt/job/1/ret/web01", json!({"fun": "test.ping"})))
            .await;
        assert!(matches!(outcome, Outcome::RenderFailed { ref handler, .. } if handler == "job_return"));
        assert_eq!(d.state(), DispatchState::Idle);

        let outcome = d
            .process(event("salt/minion/web01/start", json!({"data": "ready"})))
            .await;
        assert!(matches!(outcome, Outcome::Notified { .. }));
    }

    #[tokio::test]
    async fn notify_failure_is_contained() {
        let notifier = RecordingNotifier {
            fail_notify: true,
            ..Default::default()
        };
        let mut d = dispatcher(notifier).await;
        let outcome = d
            .process(event("salt/minion/web01/start", json!({"data": "ready"})))
            .await;
        assert!(matches!(outcome, Outcome::NotifyFailed { .. }));
        assert_eq!(d.stats().failed, 1);
    }

    #[tokio::test]
    async fn callback_is_rendered() {
        let mut d = Dispatcher::start(
            RecordingNotifier::default(),
            salt_registry(Some("https://salt.example.com/jobs/{{ jid }}".to_string())).unwrap(),
            TemplateSet::builtin().unwrap(),
            DispatchConfig::default(),
        )
        .await
        .unwrap();

        d.process(event(
            "salt/job/20230101/ret/web01",
            json!({"fun": "test.ping", "fun_args": [], "id": "web01", "jid": "20230101", "return": true}),
        ))
        .await;

        let sent = d.notifier().sent();
        assert_eq!(
            sent[0].options.callback.as_deref(),
            Some("https://salt.example.com/jobs/20230101")
        );
        assert!(sent[0].options.sticky);
    }

    #[tokio::test]
    async fn run_survives_bad_reads_until_closed() {
        let mut d = dispatcher(RecordingNotifier::default()).await;
        let mut bus = VecBus::new(vec![
            Ok(None),
            Err(BusError::Malformed("truncated frame".to_string())),
            Ok(Some(event("12345", json!({})))),
            Ok(Some(event("salt/job/1/ret/web01", json!({})))),
            Ok(Some(event("salt/unknown/event", json!({})))),
            Ok(Some(event("salt/minion/web01/start", json!({"data": "ready"})))),
        ]);

        let stats = d.run(&mut bus, CancellationToken::new()).await;

        assert_eq!(stats.received, 4);
        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.unhandled, 1);
        assert_eq!(stats.notified, 1);
        assert_eq!(stats.malformed, 1);
        assert_eq!(d.notifier().sent().len(), 1);
    }

    #[tokio::test]
    async fn run_ends_on_bus_read_failure() {
        let mut d = dispatcher(RecordingNotifier::default()).await;
        let mut bus = VecBus::new(vec![
            Err(BusError::Io("Input/output error (os error 5)".to_string())),
            Ok(Some(event("salt/minion/web01/start", json!({"data": "ready"})))),
        ]);

        let stats = d.run(&mut bus, CancellationToken::new()).await;

        assert_eq!(stats.received, 0);
        assert_eq!(stats.malformed, 0);
        assert_eq!(bus.reads.len(), 1);
        assert!(d.notifier().sent().is_empty());
    }

    #[tokio::test]
    async fn run_stops_on_cancellation() {
        let mut d = dispatcher(RecordingNotifier::default()).await;
        let mut bus = VecBus::new(vec![Ok(Some(event(
            "salt/minion/web01/start",
            json!({"data": "ready"}),
        )))]);
        let token = CancellationToken::new();
        token.cancel();

        let stats = d.run(&mut bus, token).await;
        assert_eq!(stats.received, 0);
        assert!(d.notifier().sent().is_empty());
    }
}
