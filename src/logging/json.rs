//! JSON line log formatting.
//!
//! Every event becomes a single line:
//! ```text
//! {"correlationId":"req-5d1c0a9e3b7f4a21","level":"info","message":"Creating sensor","sensor_id":"temp_attic","service":"sensor-service","timestamp":"2026-01-18T14:30:00.123Z"}
//! ```
//! Event fields are flattened into the object. They never replace the
//! `timestamp`, `level`, `message`, `service` or `correlationId` keys.

use crate::logging::correlation::correlation_id_in_scope;
use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Number, Value};
use std::fmt::Debug;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;

pub struct JsonLogFormat;

pub fn level_name(level: &Level) -> &'static str {
    match *level {
        Level::ERROR => "error",
        Level::WARN => "warn",
        Level::INFO => "info",
        Level::DEBUG => "debug",
        Level::TRACE => "trace",
    }
}

#[derive(Default)]
struct JsonFieldVisitor {
    message: Option<String>,
    fields: Map<String, Value>,
}

impl JsonFieldVisitor {
    fn insert(&mut self, field: &Field, value: Value) {
        if field.name() == "message" {
            self.message = Some(match value {
                Value::String(message) => message,
                other => other.to_string(),
            });
        } else {
            self.fields.insert(field.name().to_string(), value);
        }
    }
}

impl Visit for JsonFieldVisitor {
    fn record_f64(&mut self, field: &Field, value: f64) {
        let value = Number::from_f64(value).map(Value::Number).unwrap_or(Value::Null);
        self.insert(field, value);
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.insert(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.insert(field, Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.insert(field, Value::from(value));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.insert(field, Value::from(value));
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.insert(field, Value::from(value.to_string()));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn Debug) {
        self.insert(field, Value::from(format!("{:?}", value)));
    }
}

impl<S, N> FormatEvent<S, N> for JsonLogFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let mut visitor = JsonFieldVisitor::default();
        event.record(&mut visitor);

        let mut entry = Map::new();
        entry.insert(
            "timestamp".to_string(),
            Value::from(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
        );
        entry.insert(
            "level".to_string(),
            Value::from(level_name(event.metadata().level())),
        );
        entry.insert(
            "message".to_string(),
            Value::from(visitor.message.unwrap_or_default()),
        );
        entry.insert("service".to_string(), Value::from(crate::APP_NAME.as_str()));
        if let Some(correlation_id) = correlation_id_in_scope(ctx) {
            entry.insert("correlationId".to_string(), Value::from(correlation_id));
        }

        for (key, value) in visitor.fields {
            entry.entry(key).or_insert(value);
        }

        let line = serde_json::to_string(&Value::Object(entry)).map_err(|_| std::fmt::Error)?;
        writeln!(writer, "{}", line)
    }
}
