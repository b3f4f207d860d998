// crates/edon-server/src/metrics.rs
// ============================================================================
// Module: Gateway Metrics
// Description: In-process counters and latency observations for requests,
// decisions and connector calls, rendered as Prometheus text or JSON.
// Purpose: Give operators the same request/outcome labeling shape
// `decision-gate-mcp::telemetry` uses for its MCP transport, extended
// with an actual text-exposition renderer since this gateway has no
// external telemetry pipeline to hand events to.
// Dependencies: std::sync::atomic, std::sync::Mutex
// ============================================================================

//! ## Overview
//! [`Metrics`] is a single struct of atomic counters plus a
//! mutex-guarded latency accumulator, built once in [`crate::state::AppContext`]
//! and cloned (behind an `Arc`) into every handler. It deliberately does
//! not depend on a metrics crate: the workspace carries none, and the
//! counter/gauge vocabulary spec.md asks for (requests by route+status,
//! decisions by verdict, evaluator/connector latency) is small enough to
//! hand-render as Prometheus text exposition directly.

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use edon_core::Verdict;

fn verdict_label(verdict: Verdict) -> &'static str {
    match verdict {
        Verdict::Allow => "allow",
        Verdict::Block => "block",
        Verdict::Escalate => "escalate",
        Verdict::Degrade => "degrade",
        Verdict::Pause => "pause",
        Verdict::Error => "error",
    }
}

#[derive(Debug, Default)]
struct LatencyAccumulator {
    count: u64,
    total_ms: u64,
}

/// Process-wide request, decision and connector counters.
///
/// # Invariants
/// - Counter keys are bounded: routes and verdicts come from a closed set
///   baked into the binary, never from caller-controlled input, so this
///   cannot be used to exhaust memory via label cardinality.
#[derive(Debug, Default)]
pub struct Metrics {
    requests_total: Mutex<BTreeMap<(&'static str, u16), u64>>,
    decisions_total: Mutex<BTreeMap<&'static str, u64>>,
    evaluator_latency: Mutex<LatencyAccumulator>,
    connector_latency: Mutex<BTreeMap<&'static str, LatencyAccumulator>>,
    requests_in_flight: AtomicU64,
}

impl Metrics {
    /// Builds an empty metrics registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one completed request against `route` with the given
    /// response `status`.
    pub fn record_request(&self, route: &'static str, status: u16) {
        let mut requests = self.requests_total.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        *requests.entry((route, status)).or_insert(0) += 1;
    }

    /// Marks the start of an in-flight request; the returned guard
    /// decrements the gauge on drop.
    #[must_use]
    pub fn track_in_flight(&self) -> InFlightGuard<'_> {
        self.requests_in_flight.fetch_add(1, Ordering::Relaxed);
        InFlightGuard { metrics: self }
    }

    /// Records one evaluator decision's verdict.
    pub fn record_decision(&self, verdict: Verdict) {
        let mut decisions = self.decisions_total.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        *decisions.entry(verdict_label(verdict)).or_insert(0) += 1;
    }

    /// Records an evaluator invocation's wall-clock latency.
    pub fn record_evaluator_latency(&self, elapsed_ms: u64) {
        let mut accumulator = self.evaluator_latency.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        accumulator.count += 1;
        accumulator.total_ms += elapsed_ms;
    }

    /// Records a connector invocation's wall-clock latency, keyed by tool.
    pub fn record_connector_latency(&self, tool: &'static str, elapsed_ms: u64) {
        let mut latencies = self.connector_latency.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let accumulator = latencies.entry(tool).or_default();
        accumulator.count += 1;
        accumulator.total_ms += elapsed_ms;
    }

    /// Renders every counter as Prometheus text exposition format.
    #[must_use]
    pub fn render_prometheus(&self) -> String {
        let mut out = String::new();

        out.push_str("# HELP edon_requests_total Total HTTP requests by route and status code.\n");
        out.push_str("# TYPE edon_requests_total counter\n");
        let requests = self.requests_total.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        for ((route, status), count) in requests.iter() {
            out.push_str(&format!("edon_requests_total{{route=\"{route}\",status=\"{status}\"}} {count}\n"));
        }
        drop(requests);

        out.push_str("# HELP edon_requests_in_flight Requests currently being handled.\n");
        out.push_str("# TYPE edon_requests_in_flight gauge\n");
        out.push_str(&format!("edon_requests_in_flight {}\n", self.requests_in_flight.load(Ordering::Relaxed)));

        out.push_str("# HELP edon_decisions_total Evaluator decisions by verdict.\n");
        out.push_str("# TYPE edon_decisions_total counter\n");
        let decisions = self.decisions_total.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        for (verdict, count) in decisions.iter() {
            out.push_str(&format!("edon_decisions_total{{verdict=\"{verdict}\"}} {count}\n"));
        }
        drop(decisions);

        out.push_str("# HELP edon_evaluator_latency_ms_avg Average evaluator latency in milliseconds.\n");
        out.push_str("# TYPE edon_evaluator_latency_ms_avg gauge\n");
        let evaluator = self.evaluator_latency.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        out.push_str(&format!("edon_evaluator_latency_ms_avg {}\n", average_ms(&evaluator)));
        drop(evaluator);

        out.push_str("# HELP edon_connector_latency_ms_avg Average connector latency in milliseconds by tool.\n");
        out.push_str("# TYPE edon_connector_latency_ms_avg gauge\n");
        let connectors = self.connector_latency.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        for (tool, accumulator) in connectors.iter() {
            out.push_str(&format!("edon_connector_latency_ms_avg{{tool=\"{tool}\"}} {}\n", average_ms(accumulator)));
        }
        drop(connectors);

        out
    }

    /// Renders the same counters as JSON, for tooling that cannot parse
    /// Prometheus text exposition.
    #[must_use]
    pub fn render_trust_spec_json(&self) -> serde_json::Value {
        let requests = self.requests_total.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let requests_json: Vec<_> = requests
            .iter()
            .map(|((route, status), count)| serde_json::json!({"route": route, "status": status, "count": count}))
            .collect();
        drop(requests);

        let decisions = self.decisions_total.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let decisions_json: BTreeMap<_, _> = decisions.iter().map(|(verdict, count)| (*verdict, *count)).collect();
        drop(decisions);

        let evaluator = self.evaluator_latency.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let evaluator_avg_ms = average_ms(&evaluator);
        drop(evaluator);

        let connectors = self.connector_latency.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let connectors_json: BTreeMap<_, _> =
            connectors.iter().map(|(tool, accumulator)| (*tool, average_ms(accumulator))).collect();
        drop(connectors);

        serde_json::json!({
            "requests": requests_json,
            "requests_in_flight": self.requests_in_flight.load(Ordering::Relaxed),
            "decisions_by_verdict": decisions_json,
            "evaluator_latency_ms_avg": evaluator_avg_ms,
            "connector_latency_ms_avg": connectors_json,
        })
    }
}

fn average_ms(accumulator: &LatencyAccumulator) -> u64 {
    if accumulator.count == 0 { 0 } else { accumulator.total_ms / accumulator.count }
}

/// RAII guard decrementing the in-flight gauge when a request finishes.
pub struct InFlightGuard<'a> {
    metrics: &'a Metrics,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.metrics.requests_in_flight.fetch_sub(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prometheus_output_includes_recorded_counters() {
        let metrics = Metrics::new();
        metrics.record_request("/execute", 200);
        metrics.record_decision(Verdict::Allow);
        metrics.record_evaluator_latency(10);
        let rendered = metrics.render_prometheus();
        assert!(rendered.contains("edon_requests_total{route=\"/execute\",status=\"200\"} 1"));
        assert!(rendered.contains("edon_decisions_total{verdict=\"allow\"} 1"));
    }

    #[test]
    fn trust_spec_json_reports_zero_latency_when_unrecorded() {
        let metrics = Metrics::new();
        let rendered = metrics.render_trust_spec_json();
        assert_eq!(rendered["evaluator_latency_ms_avg"], serde_json::json!(0));
    }
}
