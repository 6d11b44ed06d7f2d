//! # Connection Metrics
//!
//! Prometheus counters for one [`NodeConnection`](super::NodeConnection).
//! Each connection owns its own [`Registry`] so several connections in one
//! process never collide; embedders that want a single scrape endpoint can
//! gather from each registry in turn.

use prometheus::{Encoder, IntCounter, IntGauge, Registry, TextEncoder};

#[derive(Clone)]
pub struct ConnectionMetrics {
    registry: Registry,
    /// Requests written to a transport.
    pub requests_dispatched_total: IntCounter,
    /// Responses matched to a pending request.
    pub responses_received_total: IntCounter,
    /// Responses that carried a node error.
    pub node_errors_total: IntCounter,
    /// Responses whose id matched nothing pending.
    pub stale_responses_total: IntCounter,
    /// Endpoint hops after a failed connect or a lost session.
    pub failovers_total: IntCounter,
    /// Requests failed because their session went away.
    pub requests_lost_total: IntCounter,
    pub pending_requests: IntGauge,
    /// 1 while a session is connected, else 0.
    pub connected: IntGauge,
}

fn counter(registry: &Registry, name: &str, help: &str) -> IntCounter {
    let metric = IntCounter::new(name, help).expect("metric creation");
    registry
        .register(Box::new(metric.clone()))
        .expect("metric registration");
    metric
}

fn gauge(registry: &Registry, name: &str, help: &str) -> IntGauge {
    let metric = IntGauge::new(name, help).expect("metric creation");
    registry
        .register(Box::new(metric.clone()))
        .expect("metric registration");
    metric
}

impl ConnectionMetrics {
    pub fn new() -> Self {
        let registry = Registry::new_custom(Some("graphene".into()), None)
            .expect("failed to create prometheus registry");

        Self {
            requests_dispatched_total: counter(
                &registry,
                "requests_dispatched_total",
                "Requests written to the active transport",
            ),
            responses_received_total: counter(
                &registry,
                "responses_received_total",
                "Responses delivered to a pending request",
            ),
            node_errors_total: counter(&registry, "node_errors_total", "Responses carrying a node error"),
            stale_responses_total: counter(
                &registry,
                "stale_responses_total",
                "Responses dropped because no request with their id was pending",
            ),
            failovers_total: counter(&registry, "failovers_total", "Hops to the next candidate endpoint"),
            requests_lost_total: counter(
                &registry,
                "requests_lost_total",
                "Pending requests failed by a lost or closed session",
            ),
            pending_requests: gauge(&registry, "pending_requests", "Requests awaiting a response"),
            connected: gauge(&registry, "connected", "1 while a session is connected"),
            registry,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Prometheus text exposition of every metric above.
    pub fn encode(&self) -> String {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        if let Err(e) = encoder.encode(&self.registry.gather(), &mut buffer) {
            tracing::warn!(error = %e, "failed to encode metrics");
            return String::new();
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}

impl Default for ConnectionMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ConnectionMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionMetrics")
            .field("pending_requests", &self.pending_requests.get())
            .field("connected", &self.connected.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_encode() {
        let metrics = ConnectionMetrics::new();
        metrics.requests_dispatched_total.inc();
        metrics.pending_requests.set(3);

        let output = metrics.encode();
        assert!(output.contains("graphene_requests_dispatched_total 1"));
        assert!(output.contains("graphene_pending_requests 3"));
        assert!(output.contains("graphene_failovers_total 0"));
    }

    #[test]
    fn registries_are_independent() {
        let a = ConnectionMetrics::new();
        let b = ConnectionMetrics::new();
        a.failovers_total.inc();
        assert_eq!(b.failovers_total.get(), 0);
    }
}
