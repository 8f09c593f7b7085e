// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Partial configuration merged across sources.

use serde::Deserialize;

use crate::sections::{
	AuthConfigLayer, DatabaseConfigLayer, HttpConfigLayer, IngestConfigLayer, LoggingConfigLayer,
	QueryConfigLayer, RedactionConfigLayer,
};

/// Every section is optional so a source only overrides what it sets.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerConfigLayer {
	#[serde(default)]
	pub http: Option<HttpConfigLayer>,
	#[serde(default)]
	pub database: Option<DatabaseConfigLayer>,
	#[serde(default)]
	pub redaction: Option<RedactionConfigLayer>,
	#[serde(default)]
	pub ingest: Option<IngestConfigLayer>,
	#[serde(default)]
	pub query: Option<QueryConfigLayer>,
	#[serde(default)]
	pub auth: Option<AuthConfigLayer>,
	#[serde(default)]
	pub logging: Option<LoggingConfigLayer>,
}

impl ServerConfigLayer {
	/// Merge `other` into `self`; fields set in `other` win.
	pub fn merge(&mut self, other: ServerConfigLayer) {
		merge_option(&mut self.http, other.http, HttpConfigLayer::merge);
		merge_option(
			&mut self.database,
			other.database,
			DatabaseConfigLayer::merge,
		);
		merge_option(
			&mut self.redaction,
			other.redaction,
			RedactionConfigLayer::merge,
		);
		merge_option(&mut self.ingest, other.ingest, IngestConfigLayer::merge);
		merge_option(&mut self.query, other.query, QueryConfigLayer::merge);
		merge_option(&mut self.auth, other.auth, AuthConfigLayer::merge);
		merge_option(&mut self.logging, other.logging, LoggingConfigLayer::merge);
	}
}

fn merge_option<T, F>(target: &mut Option<T>, source: Option<T>, merge_fn: F)
where
	F: FnOnce(&mut T, T),
{
	match (target.as_mut(), source) {
		(Some(t), Some(s)) => merge_fn(t, s),
		(None, Some(s)) => *target = Some(s),
		_ => {}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_merge_empty_layers() {
		let mut base = ServerConfigLayer::default();
		base.merge(ServerConfigLayer::default());
		assert!(base.http.is_none());
		assert!(base.redaction.is_none());
	}

	#[test]
	fn test_merge_preserves_base_when_other_empty() {
		let mut base = ServerConfigLayer {
			query: Some(QueryConfigLayer {
				max_page_size: Some(200),
				..Default::default()
			}),
			..Default::default()
		};
		base.merge(ServerConfigLayer::default());
		assert_eq!(base.query.unwrap().max_page_size, Some(200));
	}

	#[test]
	fn test_merge_field_level() {
		let mut base = ServerConfigLayer {
			http: Some(HttpConfigLayer {
				host: Some("127.0.0.1".to_string()),
				port: Some(9000),
			}),
			..Default::default()
		};
		base.merge(ServerConfigLayer {
			http: Some(HttpConfigLayer {
				host: None,
				port: Some(9100),
			}),
			..Default::default()
		});

		let http = base.http.unwrap();
		assert_eq!(http.host.as_deref(), Some("127.0.0.1"));
		assert_eq!(http.port, Some(9100));
	}

	#[test]
	fn test_deserialize_full_toml() {
		let layer: ServerConfigLayer = toml::from_str(
			r#"
			[http]
			port = 9090

			[redaction]
			redact_keys = ["password", "ssn"]
			max_json_bytes = 2048

			[logging]
			format = "json"
			"#,
		)
		.unwrap();

		assert_eq!(layer.http.unwrap().port, Some(9090));
		let redaction = layer.redaction.unwrap();
		assert_eq!(redaction.max_json_bytes, Some(2048));
		assert_eq!(redaction.redact_keys.unwrap().len(), 2);
		assert!(layer.database.is_none());
	}
}
