// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Key-based masking and size capping of payload JSON.
//!
//! Values under configured keys are replaced with [`MASK`], the result is
//! serialized compactly, and anything over the byte cap is replaced with a
//! small marker recording the size that was dropped.

use auditsink_config::RedactionConfig;
use serde_json::{json, Map, Value};

/// Replacement for masked values.
pub const MASK: &str = "***";

/// Stored when a masked tree cannot be serialized.
pub const SERIALIZATION_FAILED_MARKER: &str = r#"{"error":"redaction-serialization-failed"}"#;

const MAX_DEPTH: usize = 128;

#[derive(Debug, Clone)]
pub struct RedactionEngine {
	redact_keys: Vec<String>,
	max_bytes: usize,
}

impl RedactionEngine {
	pub fn new<I, S>(redact_keys: I, max_bytes: usize) -> Self
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		Self {
			redact_keys: redact_keys
				.into_iter()
				.map(|k| k.as_ref().to_lowercase())
				.collect(),
			max_bytes,
		}
	}

	pub fn from_config(config: &RedactionConfig) -> Self {
		Self::new(&config.redact_keys, config.max_json_bytes)
	}

	pub fn max_bytes(&self) -> usize {
		self.max_bytes
	}

	/// Mask, serialize and cap `tree`. The input is never modified.
	pub fn redact(&self, tree: &Value) -> String {
		let masked = self.mask(tree);

		let serialized = match serde_json::to_string(&masked) {
			Ok(s) => s,
			Err(e) => {
				tracing::warn!(error = %e, "failed to serialize redacted payload");
				return SERIALIZATION_FAILED_MARKER.to_string();
			}
		};

		if serialized.len() > self.max_bytes {
			tracing::debug!(
				size_bytes = serialized.len(),
				max_bytes = self.max_bytes,
				"redacted payload exceeds cap, truncating"
			);
			return json!({ "truncated": true, "sizeBytes": serialized.len() }).to_string();
		}

		serialized
	}

	/// Return a masked deep copy of `tree`.
	pub fn mask(&self, tree: &Value) -> Value {
		self.mask_with_depth(tree, 0)
	}

	fn mask_with_depth(&self, value: &Value, depth: usize) -> Value {
		if depth > MAX_DEPTH {
			return Value::String(MASK.to_string());
		}

		match value {
			Value::Object(obj) => {
				let mut out = Map::with_capacity(obj.len());
				for (key, child) in obj {
					let masked = if self.is_redacted_key(key) {
						Value::String(MASK.to_string())
					} else {
						self.mask_with_depth(child, depth + 1)
					};
					out.insert(key.clone(), masked);
				}
				Value::Object(out)
			}
			Value::Array(items) => Value::Array(
				items
					.iter()
					.map(|item| self.mask_with_depth(item, depth + 1))
					.collect(),
			),
			scalar => scalar.clone(),
		}
	}

	fn is_redacted_key(&self, key: &str) -> bool {
		let key = key.to_lowercase();
		self.redact_keys.iter().any(|k| *k == key)
	}
}

impl Default for RedactionEngine {
	fn default() -> Self {
		Self::from_config(&RedactionConfig::default())
	}
}
