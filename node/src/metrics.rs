//! # Prometheus Metrics
//!
//! Counters and timings for Economic Clustering work done by a single
//! invocation. Printed in the Prometheus text exposition format when the
//! binary runs with `--metrics`, ready for a textfile collector.
//!
//! All metrics live in a dedicated [`prometheus::Registry`] under the
//! `burst` namespace.

use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};

/// Holds all Prometheus metric handles for the node.
#[derive(Clone)]
pub struct NodeMetrics {
    registry: Registry,
    /// Fork verifications, labelled `result="accepted"` or `"rejected"`.
    pub ec_verifications_total: IntCounterVec,
    /// Successful anchor selections.
    pub ec_anchor_selections_total: IntCounter,
    /// Height of the loaded chain's tip.
    pub chain_height: IntGauge,
    /// Wall time of a single fork verification.
    pub ec_verification_seconds: Histogram,
}

impl NodeMetrics {
    /// Creates and registers all metrics.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new_custom(Some("burst".into()), None)?;

        let ec_verifications_total = IntCounterVec::new(
            Opts::new(
                "ec_verifications_total",
                "Economic Clustering fork verifications by outcome",
            ),
            &["result"],
        )?;
        registry.register(Box::new(ec_verifications_total.clone()))?;

        let ec_anchor_selections_total = IntCounter::new(
            "ec_anchor_selections_total",
            "Economic Clustering anchor blocks selected",
        )?;
        registry.register(Box::new(ec_anchor_selections_total.clone()))?;

        let chain_height = IntGauge::new("chain_height", "Height of the chain tip")?;
        registry.register(Box::new(chain_height.clone()))?;

        let ec_verification_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "ec_verification_seconds",
                "Time spent verifying one transaction's fork",
            )
            .buckets(vec![
                0.0001, 0.00025, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1,
            ]),
        )?;
        registry.register(Box::new(ec_verification_seconds.clone()))?;

        Ok(Self {
            registry,
            ec_verifications_total,
            ec_anchor_selections_total,
            chain_height,
            ec_verification_seconds,
        })
    }

    /// Records one verification outcome and its duration.
    pub fn observe_verification(&self, accepted: bool, seconds: f64) {
        let result = if accepted { "accepted" } else { "rejected" };
        self.ec_verifications_total
            .with_label_values(&[result])
            .inc();
        self.ec_verification_seconds.observe(seconds);
    }

    /// Encodes all registered metrics into the Prometheus text format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
