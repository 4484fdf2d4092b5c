// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Prometheus metrics for the reconciliation daemon.
//!
//! There is no HTTP `/metrics` endpoint in this build (see the design notes
//! on why the health/metrics surface is out of scope); metrics are gathered
//! on demand via [`gather_metrics`], e.g. for periodic debug logging or a
//! future exporter.
//!
//! # Example
//!
//! ```rust,no_run
//! use dnsync::metrics::record_cycle;
//! use std::time::Duration;
//!
//! record_cycle("success", Duration::from_millis(120));
//! ```

use prometheus::{CounterVec, Encoder, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder};
use std::sync::LazyLock;
use std::time::Duration;

use crate::constants::METRICS_NAMESPACE;

/// Global Prometheus metrics registry.
pub static METRICS_REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

/// Total reconciliation cycles by outcome (`success`, `partial`, `error`).
pub static CYCLES_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_cycles_total"),
        "Total number of reconciliation cycles by outcome",
    );
    let counter = CounterVec::new(opts, &["outcome"]).unwrap();
    METRICS_REGISTRY.register(Box::new(counter.clone())).unwrap();
    counter
});

/// Duration of a full reconciliation cycle in seconds.
pub static CYCLE_DURATION_SECONDS: LazyLock<HistogramVec> = LazyLock::new(|| {
    let opts = HistogramOpts::new(
        format!("{METRICS_NAMESPACE}_cycle_duration_seconds"),
        "Duration of a reconciliation cycle in seconds",
    )
    .buckets(vec![0.05, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 60.0]);
    let histogram = HistogramVec::new(opts, &["outcome"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(histogram.clone()))
        .unwrap();
    histogram
});

/// Total DNS write operations issued, by operation (`add`, `delete`,
/// `update`) and result (`ok`, `error`).
pub static DNS_OPERATIONS_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_dns_operations_total"),
        "Total DNS write operations by operation and result",
    );
    let counter = CounterVec::new(opts, &["operation", "result"]).unwrap();
    METRICS_REGISTRY.register(Box::new(counter.clone())).unwrap();
    counter
});

/// Total proxy instance polls, by instance name and result.
pub static PROXY_POLLS_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_proxy_polls_total"),
        "Total proxy instance polls by instance and result",
    );
    let counter = CounterVec::new(opts, &["instance", "result"]).unwrap();
    METRICS_REGISTRY.register(Box::new(counter.clone())).unwrap();
    counter
});

/// Records currently tracked as owned by this daemon, sampled once per cycle.
pub static MANAGED_RECORDS: LazyLock<prometheus::GaugeVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_managed_records"),
        "Number of DNS records currently owned by this daemon",
    );
    let gauge = prometheus::GaugeVec::new(opts, &["domain"]).unwrap();
    METRICS_REGISTRY.register(Box::new(gauge.clone())).unwrap();
    gauge
});

/// Record the outcome and duration of one reconciliation cycle.
pub fn record_cycle(outcome: &str, duration: Duration) {
    CYCLES_TOTAL.with_label_values(&[outcome]).inc();
    CYCLE_DURATION_SECONDS
        .with_label_values(&[outcome])
        .observe(duration.as_secs_f64());
}

/// Record the result of a single DNS write operation.
pub fn record_dns_operation(operation: &str, result: &str) {
    DNS_OPERATIONS_TOTAL
        .with_label_values(&[operation, result])
        .inc();
}

/// Record the result of polling one proxy instance.
pub fn record_proxy_poll(instance: &str, result: &str) {
    PROXY_POLLS_TOTAL.with_label_values(&[instance, result]).inc();
}

/// Set the count of managed records for a domain, for the current cycle.
pub fn set_managed_records(domain: &str, count: usize) {
    MANAGED_RECORDS
        .with_label_values(&[domain])
        .set(count as f64);
}

/// Gather and encode all metrics in Prometheus text exposition format.
pub fn gather_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = METRICS_REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(format!("UTF-8 error: {e}")))
}

#[cfg(test)]
#[path = "metrics_tests.rs"]
mod metrics_tests;
