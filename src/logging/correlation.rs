//! Remembers the correlation id of each span so formatters can attach it to events.
//!
//! Any span carrying a non-empty `correlation_id` field gets a [`SpanCorrelationId`]
//! extension. Formatters walk the event scope from the innermost span outwards
//! and use the first id they find.

use std::fmt::Debug;
use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Id, Record};
use tracing::Subscriber;
use tracing_subscriber::fmt::FmtContext;
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

/// Name of the span field holding the correlation id.
pub const CORRELATION_ID_FIELD: &str = "correlation_id";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpanCorrelationId(pub String);

#[derive(Default)]
struct CorrelationIdVisitor {
    correlation_id: Option<String>,
}

impl CorrelationIdVisitor {
    fn accept(&mut self, field: &Field, value: String) {
        if field.name() == CORRELATION_ID_FIELD && !value.is_empty() {
            self.correlation_id = Some(value);
        }
    }
}

impl Visit for CorrelationIdVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.accept(field, value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn Debug) {
        if field.name() == CORRELATION_ID_FIELD {
            self.accept(field, format!("{:?}", value));
        }
    }
}

/// Layer storing the `correlation_id` of new or updated spans in their extensions.
pub struct CorrelationLayer;

impl<S> Layer<S> for CorrelationLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        let mut visitor = CorrelationIdVisitor::default();
        attrs.record(&mut visitor);

        if let (Some(correlation_id), Some(span)) = (visitor.correlation_id, ctx.span(id)) {
            span.extensions_mut()
                .replace(SpanCorrelationId(correlation_id));
        }
    }

    fn on_record(&self, id: &Id, values: &Record<'_>, ctx: Context<'_, S>) {
        let mut visitor = CorrelationIdVisitor::default();
        values.record(&mut visitor);

        if let (Some(correlation_id), Some(span)) = (visitor.correlation_id, ctx.span(id)) {
            span.extensions_mut()
                .replace(SpanCorrelationId(correlation_id));
        }
    }
}

/// Returns the correlation id of the innermost enclosing span which has one.
pub fn correlation_id_in_scope<S, N>(ctx: &FmtContext<'_, S, N>) -> Option<String>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> tracing_subscriber::fmt::FormatFields<'a> + 'static,
{
    let scope = ctx.event_scope()?;
    for span in scope {
        if let Some(SpanCorrelationId(correlation_id)) =
            span.extensions().get::<SpanCorrelationId>()
        {
            return Some(correlation_id.clone());
        }
    }

    None
}
