// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Ingestion counters, injected into the pipeline.
pub trait IngestMetrics: Send + Sync {
	fn received(&self);
	fn ingested(&self);
	fn deduplicated(&self);
	fn rejected(&self);

	fn observe_duration(&self, _elapsed: Duration) {}
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMetrics;

impl IngestMetrics for NoopMetrics {
	fn received(&self) {}
	fn ingested(&self) {}
	fn deduplicated(&self) {}
	fn rejected(&self) {}
}

/// In-process counters, handy for tests and embedding.
#[derive(Debug, Default)]
pub struct CountingMetrics {
	received: AtomicU64,
	ingested: AtomicU64,
	deduplicated: AtomicU64,
	rejected: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
	pub received: u64,
	pub ingested: u64,
	pub deduplicated: u64,
	pub rejected: u64,
}

impl CountingMetrics {
	pub fn snapshot(&self) -> MetricsSnapshot {
		MetricsSnapshot {
			received: self.received.load(Ordering::Relaxed),
			ingested: self.ingested.load(Ordering::Relaxed),
			deduplicated: self.deduplicated.load(Ordering::Relaxed),
			rejected: self.rejected.load(Ordering::Relaxed),
		}
	}
}

impl IngestMetrics for CountingMetrics {
	fn received(&self) {
		self.received.fetch_add(1, Ordering::Relaxed);
	}

	fn ingested(&self) {
		self.ingested.fetch_add(1, Ordering::Relaxed);
	}

	fn deduplicated(&self) {
		self.deduplicated.fetch_add(1, Ordering::Relaxed);
	}

	fn rejected(&self) {
		self.rejected.fetch_add(1, Ordering::Relaxed);
	}
}
