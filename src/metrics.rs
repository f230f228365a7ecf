use prometheus::{IntCounter, IntCounterVec, Opts, Registry};

static NAMESPACE: &str = "hub_console_sync";

/// Counters for the sync engine, the proxy client and the session monitor.
/// Metrics work unregistered, which keeps tests free of registry setup.
#[derive(Clone)]
pub struct Metrics {
    /// Stream events applied to a collection, by kind and action.
    pub events_applied: IntCounterVec,
    /// Event stream connection attempts after the first.
    pub stream_reconnects: IntCounter,
    /// Stream payloads that could not be decoded.
    pub stream_parse_failures: IntCounter,
    /// Failed proxy calls, by error code.
    pub request_failures: IntCounterVec,
    pub session_checks: IntCounter,
    pub session_expired: IntCounter,
}

impl Metrics {
    pub fn new() -> prometheus::Result<Self> {
        Ok(Self {
            events_applied: IntCounterVec::new(
                Opts::new("events_applied_total", "Stream events applied to collections")
                    .namespace(NAMESPACE),
                &["kind", "action"],
            )?,
            stream_reconnects: IntCounter::with_opts(
                Opts::new("stream_reconnects_total", "Event stream reconnections")
                    .namespace(NAMESPACE),
            )?,
            stream_parse_failures: IntCounter::with_opts(
                Opts::new(
                    "stream_parse_failures_total",
                    "Event stream payloads that failed to decode",
                )
                .namespace(NAMESPACE),
            )?,
            request_failures: IntCounterVec::new(
                Opts::new("request_failures_total", "Failed proxy requests").namespace(NAMESPACE),
                &["code"],
            )?,
            session_checks: IntCounter::with_opts(
                Opts::new("session_checks_total", "Session liveness probes").namespace(NAMESPACE),
            )?,
            session_expired: IntCounter::with_opts(
                Opts::new("session_expired_total", "Session probes answered with 401")
                    .namespace(NAMESPACE),
            )?,
        })
    }

    pub fn register(&self, registry: &Registry) -> prometheus::Result<()> {
        registry.register(Box::new(self.events_applied.clone()))?;
        registry.register(Box::new(self.stream_reconnects.clone()))?;
        registry.register(Box::new(self.stream_parse_failures.clone()))?;
        registry.register(Box::new(self.request_failures.clone()))?;
        registry.register(Box::new(self.session_checks.clone()))?;
        registry.register(Box::new(self.session_expired.clone()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registers_cleanly_into_a_fresh_registry() {
        let metrics = Metrics::new().unwrap();
        let registry = Registry::new();
        metrics.register(&registry).unwrap();

        metrics
            .events_applied
            .with_label_values(&["ManagedCluster", "upsert"])
            .inc();
        metrics.stream_reconnects.inc();

        let families = registry.gather();
        assert!(families
            .iter()
            .any(|family| family.get_name() == "hub_console_sync_events_applied_total"));
    }
}
