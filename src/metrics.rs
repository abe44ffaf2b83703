//! Pipeline metrics with Prometheus
//!
//! Exposes the operational signals that matter for a recommender serving
//! loop: throughput by outcome, stage latency, candidate pool fill, and
//! per-event-type scoring failures.
//!
//! NOTE: session ids never appear in labels to prevent high-cardinality
//! explosion; the only labels are the three event types and the outcome.

use lazy_static::lazy_static;
use prometheus::{
    Histogram, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry,
};

lazy_static! {
    /// Global metrics registry
    pub static ref METRICS_REGISTRY: Registry = Registry::new();

    // ============================================================================
    // Session Throughput
    // ============================================================================

    /// Sessions processed, by path taken ("scored" or "fallback_only")
    pub static ref SESSIONS_PROCESSED_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("nexrec_sessions_processed_total", "Total sessions processed"),
        &["path"]
    ).unwrap();

    /// End-to-end pipeline duration per session
    pub static ref PIPELINE_DURATION: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "nexrec_pipeline_duration_seconds",
            "Full pipeline duration per session"
        )
        .buckets(vec![0.0001, 0.0005, 0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25])
    ).unwrap();

    // ============================================================================
    // Stage 1: Candidates
    // ============================================================================

    /// Candidate pool size per session
    pub static ref CANDIDATE_POOL_SIZE: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "nexrec_candidate_pool_size",
            "Candidates generated per session"
        )
        .buckets(vec![0.0, 10.0, 25.0, 50.0, 100.0, 150.0, 200.0])
    ).unwrap();

    // ============================================================================
    // Stage 2: Scoring and Ranking
    // ============================================================================

    /// Scoring failures, by event type
    pub static ref SCORING_FAILURES_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("nexrec_scoring_failures_total", "Scoring failures per event type"),
        &["event_type"]
    ).unwrap();

    /// Final list length, by event type
    pub static ref RECOMMENDATION_LIST_LENGTH: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "nexrec_recommendation_list_length",
            "Items in the final list per event type"
        )
        .buckets(vec![0.0, 5.0, 10.0, 15.0, 19.0, 20.0]),
        &["event_type"]
    ).unwrap();
}

/// Register all metrics with the global registry
///
/// Call once at startup. Returns an error if any metric is already
/// registered (i.e., if called twice).
pub fn register_metrics() -> Result<(), prometheus::Error> {
    METRICS_REGISTRY.register(Box::new(SESSIONS_PROCESSED_TOTAL.clone()))?;
    METRICS_REGISTRY.register(Box::new(PIPELINE_DURATION.clone()))?;
    METRICS_REGISTRY.register(Box::new(CANDIDATE_POOL_SIZE.clone()))?;
    METRICS_REGISTRY.register(Box::new(SCORING_FAILURES_TOTAL.clone()))?;
    METRICS_REGISTRY.register(Box::new(RECOMMENDATION_LIST_LENGTH.clone()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_register_once() {
        register_metrics().expect("first registration succeeds");
        assert!(register_metrics().is_err());
    }

    #[test]
    fn test_counters_increment() {
        SESSIONS_PROCESSED_TOTAL
            .with_label_values(&["fallback_only"])
            .inc();
        SCORING_FAILURES_TOTAL.with_label_values(&["carts"]).inc();
        assert!(
            SCORING_FAILURES_TOTAL
                .with_label_values(&["carts"])
                .get()
                >= 1
        );
    }
}
