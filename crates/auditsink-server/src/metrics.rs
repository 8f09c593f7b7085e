// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Prometheus metrics for audit event ingestion.

use std::sync::Arc;
use std::time::Duration;

use auditsink_audit::IngestMetrics;
use prometheus::{Encoder, Histogram, HistogramOpts, IntCounter, Opts, Registry, TextEncoder};
use tracing::error;

/// Ingestion counters and latency, registered on a private registry.
pub struct IngestPrometheusMetrics {
	/// Counter: every ingestion attempt, valid or not
	received_total: IntCounter,

	/// Counter: events stored as new rows
	ingested_total: IntCounter,

	/// Counter: submissions answered with an existing event id
	deduplicated_total: IntCounter,

	/// Counter: validation or storage failures
	rejected_total: IntCounter,

	/// Histogram: end-to-end ingestion latency in seconds
	ingest_duration_seconds: Histogram,

	registry: Arc<Registry>,
}

impl IngestPrometheusMetrics {
	/// # Errors
	/// Returns an error if metric registration fails.
	pub fn new() -> Result<Self, prometheus::Error> {
		let registry = Arc::new(Registry::new());

		let received_total = IntCounter::with_opts(Opts::new(
			"auditsink_events_received_total",
			"Total number of audit events submitted for ingestion",
		))?;
		registry.register(Box::new(received_total.clone()))?;

		let ingested_total = IntCounter::with_opts(Opts::new(
			"auditsink_events_ingested_total",
			"Total number of audit events stored as new records",
		))?;
		registry.register(Box::new(ingested_total.clone()))?;

		let deduplicated_total = IntCounter::with_opts(Opts::new(
			"auditsink_events_deduplicated_total",
			"Total number of submissions resolved to an existing event",
		))?;
		registry.register(Box::new(deduplicated_total.clone()))?;

		let rejected_total = IntCounter::with_opts(Opts::new(
			"auditsink_events_rejected_total",
			"Total number of submissions that failed validation or storage",
		))?;
		registry.register(Box::new(rejected_total.clone()))?;

		let ingest_duration_seconds = Histogram::with_opts(
			HistogramOpts::new(
				"auditsink_ingest_duration_seconds",
				"Audit event ingestion latency in seconds",
			)
			.buckets(vec![
				0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5,
			]),
		)?;
		registry.register(Box::new(ingest_duration_seconds.clone()))?;

		Ok(Self {
			received_total,
			ingested_total,
			deduplicated_total,
			rejected_total,
			ingest_duration_seconds,
			registry,
		})
	}

	/// Render the registry in the Prometheus text format.
	pub fn gather(&self) -> Result<String, prometheus::Error> {
		let metric_families = self.registry.gather();
		let encoder = TextEncoder::new();
		let mut buf = Vec::new();
		encoder.encode(&metric_families, &mut buf).map_err(|e| {
			error!(error = %e, "failed to encode metrics");
			e
		})?;
		Ok(String::from_utf8_lossy(&buf).to_string())
	}
}

impl IngestMetrics for IngestPrometheusMetrics {
	fn received(&self) {
		self.received_total.inc();
	}

	fn ingested(&self) {
		self.ingested_total.inc();
	}

	fn deduplicated(&self) {
		self.deduplicated_total.inc();
	}

	fn rejected(&self) {
		self.rejected_total.inc();
	}

	fn observe_duration(&self, elapsed: Duration) {
		self.ingest_duration_seconds.observe(elapsed.as_secs_f64());
	}
}
