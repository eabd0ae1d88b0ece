#![forbid(unsafe_code)]

//! Structured log events emitted by the sheet controller.
//!
//! Verifies that stack mutations and URL writes emit `debug` events with
//! their fields, that dropped URL levels emit a `warn` inside the
//! `sheet.initialize_from_url` span, and that skipped writes stay silent.
//!
//! Run:
//!   cargo test -p sheet-stack --test tracing_sync_events

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;

use sheet_stack::{
    DetailsParams, FormParams, MemoryNavigator, RestorePolicy, SheetController, SheetSyncConfig,
};

// ============================================================================
// Test Infrastructure
// ============================================================================

#[derive(Debug, Clone)]
struct CapturedEvent {
    level: tracing::Level,
    message: String,
    fields: HashMap<String, String>,
    parent_span_name: Option<String>,
}

struct EventCapture {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

struct FieldVisitor(Vec<(String, String)>);

impl tracing::field::Visit for FieldVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.0.push((field.name().to_string(), format!("{value:?}")));
    }

    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.0.push((field.name().to_string(), value.to_string()));
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.0.push((field.name().to_string(), value.to_string()));
    }
}

impl<S> tracing_subscriber::Layer<S> for EventCapture
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &tracing::Event<'_>, ctx: tracing_subscriber::layer::Context<'_, S>) {
        let mut visitor = FieldVisitor(Vec::new());
        event.record(&mut visitor);

        let fields: HashMap<String, String> = visitor.0.into_iter().collect();
        let message = fields.get("message").cloned().unwrap_or_default();
        let parent_span_name = ctx
            .current_span()
            .id()
            .and_then(|id| ctx.span(id))
            .map(|span_ref| span_ref.name().to_string());

        self.events.lock().unwrap().push(CapturedEvent {
            level: *event.metadata().level(),
            message,
            fields,
            parent_span_name,
        });
    }
}

fn with_captured_events<F>(f: F) -> Vec<CapturedEvent>
where
    F: FnOnce(),
{
    let events = Arc::new(Mutex::new(Vec::new()));
    let layer = EventCapture {
        events: events.clone(),
    };
    let subscriber = tracing_subscriber::registry()
        .with(tracing_subscriber::filter::LevelFilter::TRACE)
        .with(layer);
    tracing::subscriber::with_default(subscriber, f);
    let captured = events.lock().unwrap().clone();
    captured
}

fn find<'a>(events: &'a [CapturedEvent], message: &str) -> Vec<&'a CapturedEvent> {
    events.iter().filter(|e| e.message == message).collect()
}

// ============================================================================
// Mutation events
// ============================================================================

#[test]
fn open_emits_opened_and_url_write() {
    let events = with_captured_events(|| {
        let mut c = SheetController::new(MemoryNavigator::new());
        c.open_client_details(DetailsParams::new("clients", "abc123"))
            .unwrap();
    });

    let opened = find(&events, "sheet opened");
    assert_eq!(opened.len(), 1);
    assert_eq!(opened[0].level, tracing::Level::DEBUG);
    assert_eq!(opened[0].fields["slug"], "clients");
    assert_eq!(opened[0].fields["kind"], "client-details");
    assert_eq!(opened[0].fields["depth"], "1");

    let writes = find(&events, "sheet url write");
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].fields["method"], "Push");
    assert!(writes[0].fields["query"].contains("clients.id=abc123"));
}

#[test]
fn close_emits_closed_with_remaining_depth() {
    let events = with_captured_events(|| {
        let mut c = SheetController::new(MemoryNavigator::new());
        c.open_client_form(FormParams::create("clients")).unwrap();
        c.open_trial_form(FormParams::create("trials")).unwrap();
        c.close();
    });

    let closed = find(&events, "sheet closed");
    assert_eq!(closed.len(), 1);
    assert_eq!(closed[0].fields["slug"], "trials");
    assert_eq!(closed[0].fields["depth"], "1");
}

#[test]
fn noop_close_is_silent() {
    let events = with_captured_events(|| {
        let mut c = SheetController::new(MemoryNavigator::with_query("page=1"));
        c.close();
        c.reset();
    });
    assert!(events.is_empty(), "unexpected events: {events:?}");
}

// ============================================================================
// Restore events
// ============================================================================

#[test]
fn dropped_active_level_warns_inside_initialize_span() {
    let events = with_captured_events(|| {
        let mut c = SheetController::new(MemoryNavigator::with_query(
            "sheet=clients&clients.kind=client-details",
        ));
        c.initialize_from_url();
    });

    let warned = find(&events, "dropping active sheet from url");
    assert_eq!(warned.len(), 1);
    assert_eq!(warned[0].level, tracing::Level::WARN);
    assert_eq!(warned[0].fields["slug"], "clients");
    assert_eq!(
        warned[0].parent_span_name.as_deref(),
        Some("sheet.initialize_from_url")
    );

    let restored = find(&events, "sheet stack restored from url");
    assert_eq!(restored[0].fields["dropped"], "1");

    let canonical = find(&events, "sheet url write");
    assert_eq!(canonical.len(), 1);
    assert_eq!(canonical[0].fields["method"], "Replace");
}

#[test]
fn dropped_lower_level_warns_with_prefix() {
    let events = with_captured_events(|| {
        let config = SheetSyncConfig::default().with_restore(RestorePolicy::FullStack);
        let mut c = SheetController::with_config(
            MemoryNavigator::with_query(
                "sheet=trials&trials.kind=trial-form&sheet.stack=cases@0&cases@0.kind=case-details",
            ),
            config,
        )
        .unwrap();
        let report = c.initialize_from_url();
        assert_eq!(report.restored, 1);
        assert_eq!(report.dropped, 1);
    });

    let warned = find(&events, "dropping stacked sheet from url");
    assert_eq!(warned.len(), 1);
    assert_eq!(warned[0].fields["prefix"], "cases@0");
}

#[test]
fn clean_restore_does_not_warn_or_write() {
    let events = with_captured_events(|| {
        let mut c = SheetController::new(MemoryNavigator::with_query(
            "sheet=cases&cases.kind=case-form&cases.mode=create",
        ));
        c.on_navigation();
    });

    assert!(events.iter().all(|e| e.level != tracing::Level::WARN));
    assert!(find(&events, "sheet url write").is_empty());
    let restored = find(&events, "sheet stack restored from url");
    assert_eq!(restored.len(), 1);
    assert_eq!(
        restored[0].parent_span_name.as_deref(),
        Some("sheet.on_navigation")
    );
}
