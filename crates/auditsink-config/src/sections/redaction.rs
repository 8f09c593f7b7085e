// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Payload redaction configuration.

use serde::Deserialize;

const DEFAULT_MAX_JSON_BYTES: usize = 4096;

/// Smallest accepted payload cap. The truncation marker itself must fit.
pub const MIN_MAX_JSON_BYTES: usize = 64;

fn default_redact_keys() -> Vec<String> {
	["password", "secret", "token", "apiKey", "authorization"]
		.iter()
		.map(|s| s.to_string())
		.collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct RedactionConfig {
	/// Object keys whose values are masked, matched case-insensitively.
	pub redact_keys: Vec<String>,
	/// Byte cap for each serialized, redacted payload field.
	pub max_json_bytes: usize,
}

impl Default for RedactionConfig {
	fn default() -> Self {
		RedactionConfigLayer::default().finalize()
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RedactionConfigLayer {
	#[serde(default)]
	pub redact_keys: Option<Vec<String>>,
	#[serde(default)]
	pub max_json_bytes: Option<usize>,
}

impl RedactionConfigLayer {
	pub fn merge(&mut self, other: RedactionConfigLayer) {
		if other.redact_keys.is_some() {
			self.redact_keys = other.redact_keys;
		}
		if other.max_json_bytes.is_some() {
			self.max_json_bytes = other.max_json_bytes;
		}
	}

	pub fn finalize(self) -> RedactionConfig {
		let redact_keys = self
			.redact_keys
			.unwrap_or_else(default_redact_keys)
			.into_iter()
			.map(|k| k.trim().to_string())
			.filter(|k| !k.is_empty())
			.collect();

		RedactionConfig {
			redact_keys,
			max_json_bytes: self.max_json_bytes.unwrap_or(DEFAULT_MAX_JSON_BYTES),
		}
	}
}
