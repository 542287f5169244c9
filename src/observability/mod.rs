//! Observability subsystem for ringlog
//!
//! - Structured logging (JSON lines)
//! - Counters
//! - Typed lifecycle events
//!
//! Observability never changes device behaviour and never fails an
//! operation.

mod events;
mod logger;
mod metrics;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use metrics::{MetricsRegistry, MetricsSnapshot};

/// Severity an event is logged at
fn severity_for(event: Event) -> Severity {
    if event.is_failure() {
        Severity::Warn
    } else if event.is_per_operation() {
        Severity::Trace
    } else {
        Severity::Info
    }
}

/// Log a lifecycle event
pub fn log_event(event: Event) {
    Logger::log(severity_for(event), event.as_str(), &[]);
}

/// Log a lifecycle event with fields
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    Logger::log(severity_for(event), event.as_str(), fields);
}

/// Log a metrics snapshot as one `METRICS` line
pub fn log_metrics(snapshot: &MetricsSnapshot) {
    let owned = snapshot.to_fields();
    let fields: Vec<(&str, &str)> = owned.iter().map(|(k, v)| (*k, v.as_str())).collect();
    Logger::info(Event::Metrics.as_str(), &fields);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_for_events() {
        assert_eq!(severity_for(Event::WriteRejected), Severity::Warn);
        assert_eq!(severity_for(Event::RecordCommit), Severity::Trace);
        assert_eq!(severity_for(Event::ServerStart), Severity::Info);
    }

    #[test]
    fn test_log_event() {
        log_event(Event::DeviceInit);
        log_event_with_fields(Event::ConfigLoaded, &[("capacity", "10")]);
        log_metrics(&MetricsSnapshot::default());
    }
}
