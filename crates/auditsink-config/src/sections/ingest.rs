// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Ingestion pipeline tuning.
//!
//! Controls the bounded retry used when an insert reports a duplicate
//! idempotency key but the conflicting row is not yet visible to a lookup.

use serde::Deserialize;

const DEFAULT_LOOKUP_MAX_ATTEMPTS: u32 = 5;
const DEFAULT_LOOKUP_BASE_DELAY_MS: u64 = 10;
const DEFAULT_LOOKUP_MAX_DELAY_MS: u64 = 250;

#[derive(Debug, Clone, PartialEq)]
pub struct IngestConfig {
	pub lookup_max_attempts: u32,
	pub lookup_base_delay_ms: u64,
	pub lookup_max_delay_ms: u64,
}

impl Default for IngestConfig {
	fn default() -> Self {
		IngestConfigLayer::default().finalize()
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IngestConfigLayer {
	#[serde(default)]
	pub lookup_max_attempts: Option<u32>,
	#[serde(default)]
	pub lookup_base_delay_ms: Option<u64>,
	#[serde(default)]
	pub lookup_max_delay_ms: Option<u64>,
}

impl IngestConfigLayer {
	pub fn merge(&mut self, other: IngestConfigLayer) {
		if other.lookup_max_attempts.is_some() {
			self.lookup_max_attempts = other.lookup_max_attempts;
		}
		if other.lookup_base_delay_ms.is_some() {
			self.lookup_base_delay_ms = other.lookup_base_delay_ms;
		}
		if other.lookup_max_delay_ms.is_some() {
			self.lookup_max_delay_ms = other.lookup_max_delay_ms;
		}
	}

	pub fn finalize(self) -> IngestConfig {
		IngestConfig {
			lookup_max_attempts: self
				.lookup_max_attempts
				.unwrap_or(DEFAULT_LOOKUP_MAX_ATTEMPTS),
			lookup_base_delay_ms: self
				.lookup_base_delay_ms
				.unwrap_or(DEFAULT_LOOKUP_BASE_DELAY_MS),
			lookup_max_delay_ms: self
				.lookup_max_delay_ms
				.unwrap_or(DEFAULT_LOOKUP_MAX_DELAY_MS),
		}
	}
}
