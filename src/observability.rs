//! Observability Shell (C6): structured tracing spans plus a small
//! metrics surface, both elidable with zero runtime cost when disabled.
//!
//! Tracing is naturally a no-op without an installed subscriber, so the
//! `tracing_enabled` switch only controls whether this crate emits spans
//! at all — there is no separate "disabled span" implementation to
//! maintain.

use std::sync::Arc;

use crate::config::StrategyKind;

/// Emission surface for counters, histograms, and gauges (spec §4.6).
/// Implementors own the actual metrics backend; this crate only shapes
/// the calls.
pub trait MetricsSink: Send + Sync {
    fn incr_counter(&self, name: &str, labels: &[(&str, &str)]);
    fn observe_histogram(&self, name: &str, value: f64, labels: &[(&str, &str)]);
    fn set_gauge(&self, name: &str, value: f64, labels: &[(&str, &str)]);
}

/// Default sink: every call is a no-op.
#[derive(Debug, Default)]
pub struct NoopMetricsSink;

impl MetricsSink for NoopMetricsSink {
    fn incr_counter(&self, _name: &str, _labels: &[(&str, &str)]) {}
    fn observe_histogram(&self, _name: &str, _value: f64, _labels: &[(&str, &str)]) {}
    fn set_gauge(&self, _name: &str, _value: f64, _labels: &[(&str, &str)]) {}
}

/// Re-emits every metric as a `tracing` event at `TRACE` level, so a
/// caller who already has a `tracing` subscriber wired to a metrics
/// exporter (e.g. via a layer) gets counters/histograms/gauges for free
/// without this crate depending on any specific metrics backend.
#[derive(Debug, Default)]
pub struct TracingMetricsSink;

impl MetricsSink for TracingMetricsSink {
    fn incr_counter(&self, name: &str, labels: &[(&str, &str)]) {
        tracing::trace!(metric.kind = "counter", metric.name = name, ?labels, "metric");
    }

    fn observe_histogram(&self, name: &str, value: f64, labels: &[(&str, &str)]) {
        tracing::trace!(
            metric.kind = "histogram",
            metric.name = name,
            metric.value = value,
            ?labels,
            "metric"
        );
    }

    fn set_gauge(&self, name: &str, value: f64, labels: &[(&str, &str)]) {
        tracing::trace!(
            metric.kind = "gauge",
            metric.name = name,
            metric.value = value,
            ?labels,
            "metric"
        );
    }
}

/// Collapses arbitrary caller-supplied rollback reason strings into the
/// bounded vocabulary the metrics surface reports, keeping label
/// cardinality bounded (spec §4.6). Novel strings fold to `"user"`.
pub fn normalize_rollback_reason(reason: &str) -> &'static str {
    match reason {
        "expired" => "expired",
        "manager-closed" => "manager-close",
        "cleanup" | "stale-cleanup" => "cleanup",
        _ => "user",
    }
}

fn strategy_label(strategy: StrategyKind) -> &'static str {
    match strategy {
        StrategyKind::Stash => "stash",
        StrategyKind::Branch => "branch",
        StrategyKind::SubWorkspace => "sub_workspace",
    }
}

/// Bundles the tracing/metrics switches and the configured sink; owned
/// by the Manager and cloned cheaply via its internal `Arc`.
#[derive(Clone)]
pub struct Observability {
    tracing_enabled: bool,
    metrics_enabled: bool,
    sink: Arc<dyn MetricsSink>,
}

impl Observability {
    pub fn new(tracing_enabled: bool, metrics_enabled: bool) -> Self {
        Self {
            tracing_enabled,
            metrics_enabled,
            sink: Arc::new(TracingMetricsSink),
        }
    }

    pub fn with_sink(tracing_enabled: bool, metrics_enabled: bool, sink: Arc<dyn MetricsSink>) -> Self {
        Self {
            tracing_enabled,
            metrics_enabled,
            sink,
        }
    }

    /// Returns a real span when tracing is enabled, or `Span::none()`
    /// otherwise — the latter costs nothing at every call site it wraps.
    pub fn span(&self, name: &'static str) -> tracing::Span {
        if self.tracing_enabled {
            tracing::info_span!("transaction", op = name)
        } else {
            tracing::Span::none()
        }
    }

    pub fn vcs_span(&self, operation: &str) -> tracing::Span {
        if self.tracing_enabled {
            tracing::debug_span!("transaction.vcs", op = %operation)
        } else {
            tracing::Span::none()
        }
    }

    fn counter(&self, name: &str, labels: &[(&str, &str)]) {
        if self.metrics_enabled {
            self.sink.incr_counter(name, labels);
        }
    }

    fn histogram(&self, name: &str, value: f64, labels: &[(&str, &str)]) {
        if self.metrics_enabled {
            self.sink.observe_histogram(name, value, labels);
        }
    }

    fn gauge(&self, name: &str, value: f64, labels: &[(&str, &str)]) {
        if self.metrics_enabled {
            self.sink.set_gauge(name, value, labels);
        }
    }

    pub fn record_begin(&self, strategy: StrategyKind, status: &str) {
        self.counter(
            "transaction_begin_total",
            &[("strategy", strategy_label(strategy)), ("status", status)],
        );
    }

    pub fn record_commit(&self, status: &str) {
        self.counter("transaction_commit_total", &[("status", status)]);
    }

    pub fn record_rollback(&self, reason: &str) {
        let normalized = normalize_rollback_reason(reason);
        self.counter("transaction_rollback_total", &[("reason", normalized)]);
    }

    pub fn record_expired(&self) {
        self.counter("transaction_expired_total", &[]);
    }

    pub fn record_vcs_error(&self, operation: &str) {
        self.counter("transaction_vcs_errors_total", &[("operation", operation)]);
    }

    pub fn observe_duration_secs(&self, seconds: f64) {
        self.histogram("transaction_duration_seconds", seconds, &[]);
    }

    pub fn observe_files_modified(&self, count: usize) {
        self.histogram("transaction_files_modified", count as f64, &[]);
    }

    pub fn observe_vcs_duration_secs(&self, operation: &str, seconds: f64) {
        self.histogram(
            "transaction_vcs_operation_duration_seconds",
            seconds,
            &[("operation", operation)],
        );
    }

    pub fn set_active_count(&self, active: bool) {
        self.gauge("transaction_active", if active { 1.0 } else { 0.0 }, &[]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_reasons_pass_through() {
        assert_eq!(normalize_rollback_reason("expired"), "expired");
        assert_eq!(normalize_rollback_reason("manager-closed"), "manager-close");
        assert_eq!(normalize_rollback_reason("cleanup"), "cleanup");
        assert_eq!(normalize_rollback_reason("stale-cleanup"), "cleanup");
    }

    #[test]
    fn novel_reasons_fold_to_user() {
        assert_eq!(normalize_rollback_reason("test"), "user");
        assert_eq!(normalize_rollback_reason("whatever-the-caller-passed"), "user");
    }

    #[test]
    fn disabled_tracing_yields_a_no_op_span() {
        let obs = Observability::new(false, true);
        assert!(obs.span("begin").is_none());
    }

    #[test]
    fn noop_sink_never_panics() {
        let sink = NoopMetricsSink;
        sink.incr_counter("x", &[("a", "b")]);
        sink.observe_histogram("x", 1.0, &[]);
        sink.set_gauge("x", 0.0, &[]);
    }
}
