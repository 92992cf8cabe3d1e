//! Metrics collection and exposition.
//!
//! # Metrics
//! - `edge_requests_total` (counter): requests by routing decision
//! - `edge_cache_lookups_total` (counter): resolution cache hits and misses
//! - `edge_remote_lookups_total` (counter): remote lookups by outcome
//! - `edge_remote_lookup_duration_seconds` (histogram): remote lookup latency
//! - `edge_cache_entries` (gauge): entries held by the resolution cache
//! - `edge_upstream_requests_total` (counter): forwarded requests by status
//!
//! # Design Decisions
//! - Recording is a no-op until an exporter is installed
//! - Labels are low-cardinality (never host or username)

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Count a request by the routing decision taken for it.
pub fn record_decision(decision: &'static str) {
    counter!("edge_requests_total", "decision" => decision).increment(1);
}

pub fn record_cache_lookup(hit: bool) {
    let result = if hit { "hit" } else { "miss" };
    counter!("edge_cache_lookups_total", "result" => result).increment(1);
}

/// Record a finished remote lookup and its latency.
pub fn record_remote_lookup(outcome: &'static str, started: Instant) {
    counter!("edge_remote_lookups_total", "outcome" => outcome).increment(1);
    histogram!("edge_remote_lookup_duration_seconds").record(started.elapsed().as_secs_f64());
}

pub fn record_cache_size(size: usize) {
    gauge!("edge_cache_entries").set(size as f64);
}

/// Count a request forwarded to the render upstream.
pub fn record_upstream(status: u16, started: Instant) {
    counter!("edge_upstream_requests_total", "status" => status.to_string()).increment(1);
    histogram!("edge_upstream_duration_seconds").record(started.elapsed().as_secs_f64());
}
