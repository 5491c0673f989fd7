//! Tracing layer for JSONL output.
//!
//! Writes one JSON object per event to stderr, keeping stdout clean for
//! command payloads. The `event` key comes from an `event` field when the
//! call site sets one, otherwise from the callsite target.

use std::io::{self, Write};
use std::sync::Mutex;

use chrono::Utc;
use serde_json::{Map, Value};
use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Id};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Layer;

use super::events::Level;

/// Correlation fields recorded on a span.
#[derive(Debug, Clone, Default)]
struct SpanContext {
    run_id: Option<String>,
    stage: Option<String>,
}

impl Visit for SpanContext {
    fn record_str(&mut self, field: &Field, value: &str) {
        match field.name() {
            "run_id" => self.run_id = Some(value.to_string()),
            "stage" => self.stage = Some(value.to_string()),
            _ => {}
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        match field.name() {
            "run_id" => self.run_id = Some(format!("{:?}", value)),
            "stage" => self.stage = Some(format!("{:?}", value)),
            _ => {}
        }
    }
}

/// Collects event fields into a JSON map.
#[derive(Default)]
struct JsonFieldVisitor {
    fields: Map<String, Value>,
    message: Option<String>,
    event: Option<String>,
}

impl JsonFieldVisitor {
    fn put(&mut self, field: &Field, value: Value) {
        self.fields.insert(field.name().to_string(), value);
    }

    fn put_text(&mut self, field: &Field, value: String) {
        match field.name() {
            "message" => self.message = Some(value),
            "event" => self.event = Some(value),
            _ => self.put(field, Value::String(value)),
        }
    }
}

impl Visit for JsonFieldVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.put_text(field, value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.put_text(field, format!("{:?}", value));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.put(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.put(field, Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        if let Some(n) = serde_json::Number::from_f64(value) {
            self.put(field, Value::Number(n));
        }
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.put(field, Value::Bool(value));
    }
}

/// JSONL tracing layer.
pub struct JsonlLayer<W = io::Stderr> {
    writer: Mutex<W>,
}

impl JsonlLayer<io::Stderr> {
    /// Create a layer writing to stderr.
    pub fn stderr() -> Self {
        JsonlLayer::new(io::stderr())
    }
}

impl<W: Write> JsonlLayer<W> {
    /// Create a layer with a custom writer.
    pub fn new(writer: W) -> Self {
        JsonlLayer {
            writer: Mutex::new(writer),
        }
    }
}

impl<S, W> Layer<S> for JsonlLayer<W>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: Write + 'static,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        let mut context = SpanContext::default();
        attrs.record(&mut context);

        if let Some(span) = ctx.span(id) {
            span.extensions_mut().insert(context);
        }
    }

    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let ts = Utc::now();

        // Innermost span wins for each correlation field.
        let mut correlation = SpanContext::default();
        if let Some(scope) = ctx.event_scope(event) {
            for span in scope {
                if let Some(span_ctx) = span.extensions().get::<SpanContext>() {
                    if correlation.run_id.is_none() {
                        correlation.run_id.clone_from(&span_ctx.run_id);
                    }
                    if correlation.stage.is_none() {
                        correlation.stage.clone_from(&span_ctx.stage);
                    }
                }
            }
        }

        let mut visitor = JsonFieldVisitor::default();
        event.record(&mut visitor);

        let level: Level = (*event.metadata().level()).into();
        let name = visitor
            .event
            .unwrap_or_else(|| event.metadata().target().to_string());

        let mut obj = Map::new();
        obj.insert("ts".to_string(), Value::from(ts.to_rfc3339()));
        obj.insert("level".to_string(), serde_json::json!(level));
        obj.insert("event".to_string(), Value::from(name));
        if let Some(id) = correlation.run_id {
            obj.insert("run_id".to_string(), Value::from(id));
        }
        if let Some(stage) = correlation.stage {
            obj.insert("stage".to_string(), Value::from(stage));
        }
        if let Some(msg) = visitor.message {
            obj.insert("message".to_string(), Value::from(msg));
        }
        if !visitor.fields.is_empty() {
            obj.insert("fields".to_string(), Value::Object(visitor.fields));
        }

        let json = serde_json::to_string(&Value::Object(obj)).unwrap_or_default();
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writeln!(writer, "{}", json);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tracing_subscriber::layer::SubscriberExt;

    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().write(buf)
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl SharedBuffer {
        fn lines(&self) -> Vec<Value> {
            let bytes = self.0.lock().unwrap();
            String::from_utf8_lossy(&bytes)
                .lines()
                .map(|l| serde_json::from_str(l).unwrap())
                .collect()
        }
    }

    fn capture(f: impl FnOnce()) -> Vec<Value> {
        let buffer = SharedBuffer::default();
        let subscriber = tracing_subscriber::registry().with(JsonlLayer::new(buffer.clone()));
        tracing::subscriber::with_default(subscriber, f);
        buffer.lines()
    }

    #[test]
    fn test_basic_record() {
        let lines = capture(|| {
            tracing::info!(target: "test.event", message = "test message");
        });
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0]["level"], "info");
        assert_eq!(lines[0]["event"], "test.event");
        assert_eq!(lines[0]["message"], "test message");
        assert!(lines[0]["ts"].is_string());
        assert!(lines[0].get("fields").is_none());
    }

    #[test]
    fn test_event_field_overrides_target() {
        let lines = capture(|| {
            tracing::debug!(event = "detect.finished", accepted = 3u64, "Detection finished");
        });
        assert_eq!(lines[0]["event"], "detect.finished");
        assert_eq!(lines[0]["level"], "debug");
        assert_eq!(lines[0]["fields"]["accepted"], 3);
        assert!(lines[0]["fields"].get("event").is_none());
    }

    #[test]
    fn test_typed_fields() {
        let lines = capture(|| {
            tracing::warn!(count = -2i64, ratio = 0.5, active = true, name = "x", "typed");
        });
        let fields = &lines[0]["fields"];
        assert_eq!(fields["count"], -2);
        assert_eq!(fields["ratio"], 0.5);
        assert_eq!(fields["active"], true);
        assert_eq!(fields["name"], "x");
        assert_eq!(lines[0]["message"], "typed");
    }

    #[test]
    fn test_span_correlation_innermost_wins() {
        let lines = capture(|| {
            let outer = tracing::info_span!("run", run_id = "run-abc", stage = "init");
            let _outer = outer.enter();
            let inner = tracing::info_span!("step", stage = "redact");
            let _inner = inner.enter();
            tracing::info!("inside");
        });
        assert_eq!(lines[0]["run_id"], "run-abc");
        assert_eq!(lines[0]["stage"], "redact");
    }

    #[test]
    fn test_one_line_per_event() {
        let lines = capture(|| {
            tracing::error!("first");
            tracing::error!("second");
        });
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1]["message"], "second");
    }
}
