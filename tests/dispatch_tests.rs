//! End-to-end dispatch scenarios over an in-process event bus

use std::io;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;
use tokio_util::sync::CancellationToken;

use salt_growl::application::ports::{
    NotificationError, Notifier, RegistrationError,
};
use salt_growl::application::{salt_registry, DispatchConfig, DispatchStats, Dispatcher};
use salt_growl::domain::{Event, Notification, NotifierSession, Registration, TemplateSet};
use salt_growl::infrastructure::ChannelEventBus;

/// Notifier that records everything it is asked to deliver
#[derive(Clone, Default)]
struct RecordingNotifier {
    registrations: Arc<Mutex<Vec<Registration>>>,
    sent: Arc<Mutex<Vec<Notification>>>,
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
        self.registrations.lock().unwrap().push(registration.clone());
        Ok(registration.clone().into_session())
    }

    async fn notify(
        &self,
        session: &NotifierSession,
        notification: &Notification,
    ) -> Result<(), NotificationError> {
        session.ensure_declared(&notification.category)?;
        self.sent.lock().unwrap().push(notification.clone());
        Ok(())
    }
}

/// Log sink shared between the test and a scoped tracing subscriber
#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

async fn dispatch_all(events: Vec<Event>) -> (RecordingNotifier, DispatchStats) {
    let notifier = RecordingNotifier::default();
    let mut dispatcher = Dispatcher::start(
        notifier.clone(),
        salt_registry(Some("https://salt.example.com/jobs/{{ jid }}".to_string())).unwrap(),
        TemplateSet::builtin().unwrap(),
        DispatchConfig::default(),
    )
    .await
    .unwrap();

    let (sender, mut bus) = ChannelEventBus::new();
    for event in events {
        sender.send(event).unwrap();
    }
    drop(sender);

    let stats = dispatcher.run(&mut bus, CancellationToken::new()).await;
    (notifier, stats)
}

#[tokio::test]
async fn minion_start_is_forwarded() {
    let (notifier, stats) = dispatch_all(vec![Event::from_value(
        "salt/minion/web01/start",
        json!({"data": "ready"}),
    )])
    .await;

    let sent = notifier.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].category, "Start");
    assert_eq!(sent[0].title, "salt/minion/web01/start");
    assert_eq!(sent[0].body, "ready");
    assert_eq!(
        sent[0].options.identifier.as_deref(),
        Some("salt/minion/web01/start")
    );
    assert!(!sent[0].options.sticky);
    assert_eq!(stats.notified, 1);
}

#[tokio::test]
async fn job_return_is_sticky_with_every_field() {
    let (notifier, _) = dispatch_all(vec![Event::from_value(
        "salt/job/20230101/ret/web01",
        json!({
            "fun": "test.ping",
            "fun_args": [],
            "id": "web01",
            "jid": "20230101",
            "return": true
        }),
    )])
    .await;

    let sent = notifier.sent();
    assert_eq!(sent.len(), 1);
    let body = &sent[0].body;
    assert_eq!(sent[0].category, "Results");
    assert!(sent[0].options.sticky);
    assert!(body.contains("test.ping"), "{body}");
    assert!(body.contains("[]"), "{body}");
    assert!(body.contains("web01"), "{body}");
    assert!(body.contains("20230101"), "{body}");
    assert!(body.contains("true"), "{body}");
    assert_eq!(
        sent[0].options.callback.as_deref(),
        Some("https://salt.example.com/jobs/20230101")
    );
}

#[tokio::test]
async fn job_return_renders_nested_results_as_json() {
    let (notifier, stats) = dispatch_all(vec![Event::from_value(
        "salt/job/20230102/ret/web01",
        json!({
            "fun": "state.apply",
            "fun_args": ["web", {"test": true}],
            "id": "web01",
            "jid": "20230102",
            "return": {
                "pkg_|-nginx_|-nginx_|-installed": {
                    "result": true,
                    "changes": {}
                }
            }
        }),
    )])
    .await;

    assert_eq!(stats.notified, 1);
    let body = &notifier.sent()[0].body;
    assert!(!body.contains("[object]"), "{body}");
    assert!(body.contains(r#"["web",{"test":true}]"#), "{body}");
    assert!(body.contains("pkg_|-nginx_|-nginx_|-installed"), "{body}");
    assert!(body.contains(r#""result": true"#), "{body}");
}

#[tokio::test]
async fn numeric_tag_never_notifies() {
    let (notifier, stats) = dispatch_all(vec![Event::from_value("12345", json!({}))]).await;
    assert!(notifier.sent().is_empty());
    assert_eq!(stats.skipped, 1);
    assert_eq!(stats.unhandled, 0);
}

#[tokio::test]
async fn unknown_tag_is_logged_and_loop_continues() {
    let logs = CapturedLogs::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let (notifier, stats) = dispatch_all(vec![
        Event::from_value("salt/unknown/event", json!({"x": 1})),
        Event::from_value("salt/minion/db01/start", json!({"data": "up"})),
    ])
    .await;

    let text = logs.text();
    let line = text
        .lines()
        .find(|l| l.contains("Unhandled tag"))
        .unwrap_or_else(|| panic!("no unhandled-tag log in:\n{text}"));
    assert!(line.contains("INFO"), "{line}");
    assert!(line.contains("salt/unknown/event"), "{line}");
    // the pretty payload continues on the following lines
    assert!(text.contains("\"x\": 1"), "{text}");

    assert_eq!(stats.unhandled, 1);
    assert_eq!(stats.notified, 1);
    assert_eq!(notifier.sent()[0].title, "salt/minion/db01/start");
}

#[tokio::test]
async fn suppressed_handlers_stay_registered_but_silent() {
    let (notifier, stats) = dispatch_all(vec![
        Event::from_value("salt/auth", json!({"id": "web01", "act": "accept"})),
        Event::from_value("new_job", json!({"jid": "1"})),
    ])
    .await;

    assert!(notifier.sent().is_empty());
    assert_eq!(stats.suppressed, 2);

    let registrations = notifier.registrations.lock().unwrap();
    assert_eq!(registrations.len(), 1);
    assert!(registrations[0].categories.iter().any(|c| c == "Auth"));
    assert!(registrations[0].categories.iter().any(|c| c == "New Job"));
}

#[tokio::test]
async fn render_failure_does_not_stop_the_loop() {
    // job_return references fields this payload lacks
    let (notifier, stats) = dispatch_all(vec![
        Event::from_value("salt/job/1/ret/web01", json!({"id": "web01"})),
        Event::from_value("salt/job/2/new", json!({"jid": "2"})),
    ])
    .await;

    assert_eq!(stats.failed, 1);
    assert_eq!(stats.notified, 1);
    assert_eq!(notifier.sent()[0].category, "Job");
}

#[tokio::test]
async fn cancellation_ends_an_idle_loop() {
    let notifier = RecordingNotifier::default();
    let mut dispatcher = Dispatcher::start(
        notifier,
        salt_registry(None).unwrap(),
        TemplateSet::builtin().unwrap(),
        DispatchConfig::default(),
    )
    .await
    .unwrap();

    let (_sender, mut bus) = ChannelEventBus::new();
    let token = CancellationToken::new();
    token.cancel();

    let stats = dispatcher.run(&mut bus, token).await;
    assert_eq!(stats, DispatchStats::default());
}
