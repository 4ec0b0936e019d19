use std::time::Instant;

use prometheus::{
    Encoder, Histogram, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};

use crate::error::AppError;

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub order_mutations_total: IntCounterVec,
    pub order_mutation_latency_seconds: HistogramVec,
    pub rejected_transitions_total: IntCounterVec,
    pub statistics_latency_seconds: Histogram,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let order_mutations_total = IntCounterVec::new(
            Opts::new(
                "order_mutations_total",
                "Order mutations by operation and outcome",
            ),
            &["operation", "outcome"],
        )
        .expect("valid order_mutations_total metric");

        let order_mutation_latency_seconds = HistogramVec::new(
            HistogramOpts::new(
                "order_mutation_latency_seconds",
                "Latency of order mutations in seconds",
            ),
            &["operation"],
        )
        .expect("valid order_mutation_latency_seconds metric");

        let rejected_transitions_total = IntCounterVec::new(
            Opts::new(
                "rejected_transitions_total",
                "Status changes refused by the lifecycle, by scope",
            ),
            &["scope"],
        )
        .expect("valid rejected_transitions_total metric");

        let statistics_latency_seconds = Histogram::with_opts(HistogramOpts::new(
            "statistics_latency_seconds",
            "Latency of statistics summary computation in seconds",
        ))
        .expect("valid statistics_latency_seconds metric");

        registry
            .register(Box::new(order_mutations_total.clone()))
            .expect("register order_mutations_total");
        registry
            .register(Box::new(order_mutation_latency_seconds.clone()))
            .expect("register order_mutation_latency_seconds");
        registry
            .register(Box::new(rejected_transitions_total.clone()))
            .expect("register rejected_transitions_total");
        registry
            .register(Box::new(statistics_latency_seconds.clone()))
            .expect("register statistics_latency_seconds");

        Self {
            registry,
            order_mutations_total,
            order_mutation_latency_seconds,
            rejected_transitions_total,
            statistics_latency_seconds,
        }
    }

    pub fn observe_mutation<T>(
        &self,
        operation: &str,
        started: Instant,
        result: &Result<T, AppError>,
    ) {
        let outcome = match result {
            Ok(_) => "success",
            Err(err) if err.is_rejection() => "rejected",
            Err(_) => "error",
        };

        if let Err(AppError::InvalidTransition { scope, .. }) = result {
            let scope = if scope.starts_with("item") { "item" } else { "order" };
            self.rejected_transitions_total
                .with_label_values(&[scope])
                .inc();
        }

        self.order_mutation_latency_seconds
            .with_label_values(&[operation])
            .observe(started.elapsed().as_secs_f64());
        self.order_mutations_total
            .with_label_values(&[operation, outcome])
            .inc();
    }

    pub fn encode(&self) -> Result<String, String> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();

        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|err| format!("failed to encode metrics: {err}"))?;

        String::from_utf8(buffer).map_err(|err| format!("metrics are not valid utf8: {err}"))
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
