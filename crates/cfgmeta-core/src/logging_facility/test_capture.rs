//! In-memory capture of `log_op_*` events for test assertions.

use cfgmeta_core_types::schema::{
    EVENT_END, EVENT_END_ERROR, FIELD_COMPONENT, FIELD_DEFINITION, FIELD_ERR_CODE, FIELD_EVENT,
    FIELD_OP,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};
use tracing::field::{Field, Visit};
use tracing::{Level, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

/// One recorded event. Every field is kept as text.
#[derive(Clone, Debug)]
pub struct CapturedEvent {
    pub level: Level,
    pub component: Option<String>,
    pub op: Option<String>,
    pub event: Option<String>,
    pub fields: HashMap<String, String>,
}

impl CapturedEvent {
    /// Field value by canonical name (see `cfgmeta_core_types::schema`)
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn is(&self, op: &str, event: &str) -> bool {
        self.op.as_deref() == Some(op) && self.event.as_deref() == Some(event)
    }

    /// Definition the operation ran against, when it logged one.
    pub fn definition(&self) -> Option<&str> {
        self.field(FIELD_DEFINITION)
    }

    pub fn err_code(&self) -> Option<&str> {
        self.field(FIELD_ERR_CODE)
    }
}

#[derive(Default)]
struct FieldRecorder(HashMap<String, String>);

// Numbers and bools reach `record_debug` through the trait defaults.
impl Visit for FieldRecorder {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.0.insert(field.name().to_string(), format!("{:?}", value));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.0.insert(field.name().to_string(), value.to_string());
    }
}

/// Layer appending every event to a shared buffer.
pub struct TestCaptureLayer {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl TestCaptureLayer {
    pub fn new() -> (Self, TestCapture) {
        let events = Arc::new(Mutex::new(Vec::new()));
        let capture = TestCapture {
            events: Arc::clone(&events),
        };
        (Self { events }, capture)
    }
}

impl<S> Layer<S> for TestCaptureLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let mut recorder = FieldRecorder::default();
        event.record(&mut recorder);
        let fields = recorder.0;

        let captured = CapturedEvent {
            level: *event.metadata().level(),
            component: fields.get(FIELD_COMPONENT).cloned(),
            op: fields.get(FIELD_OP).cloned(),
            event: fields.get(FIELD_EVENT).cloned(),
            fields,
        };
        if let Ok(mut events) = self.events.lock() {
            events.push(captured);
        }
    }
}

/// Read side of the capture buffer.
#[derive(Clone)]
pub struct TestCapture {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl TestCapture {
    pub fn events(&self) -> Vec<CapturedEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn events_for_op(&self, op: &str) -> Vec<CapturedEvent> {
        self.filtered(|e| e.op.as_deref() == Some(op))
    }

    /// Successful end events of `op`.
    pub fn ends_for_op(&self, op: &str) -> Vec<CapturedEvent> {
        self.filtered(|e| e.is(op, EVENT_END))
    }

    /// Failed end events of `op`.
    pub fn errors_for_op(&self, op: &str) -> Vec<CapturedEvent> {
        self.filtered(|e| e.is(op, EVENT_END_ERROR))
    }

    /// # Panics
    /// When no event matches `op` and `event`.
    pub fn assert_event_exists(&self, op: &str, event: &str) {
        let events = self.events();
        assert!(
            events.iter().any(|e| e.is(op, event)),
            "Expected event op={} event={} not found in {} captured events",
            op,
            event,
            events.len()
        );
    }

    pub fn clear(&self) {
        if let Ok(mut events) = self.events.lock() {
            events.clear();
        }
    }

    pub fn count_events<F>(&self, predicate: F) -> usize
    where
        F: Fn(&CapturedEvent) -> bool,
    {
        self.events().iter().filter(|e| predicate(e)).count()
    }

    fn filtered<F>(&self, predicate: F) -> Vec<CapturedEvent>
    where
        F: Fn(&CapturedEvent) -> bool,
    {
        self.events().into_iter().filter(|e| predicate(e)).collect()
    }
}

static GLOBAL_CAPTURE: OnceLock<TestCapture> = OnceLock::new();

/// Install the capture subscriber once per process and return its handle.
///
/// Tests in one binary share the buffer, so assertions should select their
/// own `op` instead of counting everything.
///
/// ```
/// use cfgmeta_core::logging_facility::test_capture::init_test_capture;
/// use cfgmeta_core::log_op_start;
///
/// let capture = init_test_capture();
/// log_op_start!("parse_path");
/// capture.assert_event_exists("parse_path", "start");
/// ```
pub fn init_test_capture() -> TestCapture {
    GLOBAL_CAPTURE
        .get_or_init(|| {
            let (layer, capture) = TestCaptureLayer::new();
            let _ = tracing_subscriber::registry().with(layer).try_init();
            capture
        })
        .clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_event_accessors() {
        let mut fields = HashMap::new();
        fields.insert(FIELD_ERR_CODE.to_string(), "ERR_SCHEMA".to_string());
        fields.insert(FIELD_DEFINITION.to_string(), "backend".to_string());
        let event = CapturedEvent {
            level: Level::ERROR,
            component: Some("cfgmeta_core::definition".to_string()),
            op: Some("build_definition_tree".to_string()),
            event: Some(EVENT_END_ERROR.to_string()),
            fields,
        };

        assert!(event.is("build_definition_tree", EVENT_END_ERROR));
        assert!(!event.is("build_definition_tree", EVENT_END));
        assert_eq!(event.err_code(), Some("ERR_SCHEMA"));
        assert_eq!(event.definition(), Some("backend"));
        assert_eq!(event.field("duration_ms"), None);
    }
}
