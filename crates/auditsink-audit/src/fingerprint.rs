// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Server-side idempotency key derivation.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use sha2::{Digest, Sha256};

use crate::event::AuditEventRequest;

/// Derive the deduplication key for a request.
///
/// Only producer-controlled fields that stay constant across retries take
/// part: producer, action, subject and the body correlation id. Timestamps,
/// payloads, transport metadata and any client-supplied key are ignored.
///
/// Each field is written as `tag:<byte length>:<value>` so that separators
/// inside values cannot make two different field sets encode the same way.
pub fn derive_idempotency_key(request: &AuditEventRequest) -> String {
	let fields = [
		("p", request.producer_id.as_str()),
		("a", request.action.as_str()),
		("st", request.subject.subject_type.as_str()),
		("si", request.subject.id.as_str()),
		("c", request.correlation_id.as_deref().unwrap_or("")),
	];

	let material = fields
		.iter()
		.map(|(tag, value)| format!("{tag}:{}:{value}", value.len()))
		.collect::<Vec<_>>()
		.join("|");
	sha256_base64(&material)
}

pub fn sha256_base64(input: &str) -> String {
	let digest = Sha256::digest(input.as_bytes());
	STANDARD.encode(digest)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::event::{Payload, Subject};
	use chrono::{TimeZone, Utc};
	use serde_json::json;

	fn request() -> AuditEventRequest {
		AuditEventRequest {
			producer_id: "deployer".to_string(),
			action: "deploy".to_string(),
			outcome: "success".to_string(),
			subject: Subject {
				subject_type: "service".to_string(),
				id: "billing".to_string(),
			},
			correlation_id: Some("corr-1".to_string()),
			..Default::default()
		}
	}

	#[test]
	fn test_known_vector() {
		assert_eq!(
			sha256_base64("abc"),
			"ungWv48Bz+pBQUDeXa4iI7ADYaOWF3qctBD/YfIAFa0="
		);
	}

	#[test]
	fn test_key_is_base64_of_32_bytes() {
		let key = derive_idempotency_key(&request());
		assert_eq!(key.len(), 44);
		assert_eq!(STANDARD.decode(&key).unwrap().len(), 32);
	}

	#[test]
	fn test_ignores_non_fingerprint_fields() {
		let a = request();
		let mut b = request();
		b.outcome = "failure".to_string();
		b.occurred_at_utc = Some(Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap());
		b.payload = Some(Payload {
			arguments_redacted: Some(json!({"x": 1})),
			..Default::default()
		});
		b.trace_id = Some("trace".to_string());
		b.idempotency_key = Some("client-key".to_string());

		assert_eq!(derive_idempotency_key(&a), derive_idempotency_key(&b));
	}

	#[test]
	fn test_each_fingerprint_field_changes_key() {
		let base = derive_idempotency_key(&request());

		let mut r = request();
		r.producer_id = "other".to_string();
		assert_ne!(derive_idempotency_key(&r), base);

		let mut r = request();
		r.action = "rollback".to_string();
		assert_ne!(derive_idempotency_key(&r), base);

		let mut r = request();
		r.subject.subject_type = "job".to_string();
		assert_ne!(derive_idempotency_key(&r), base);

		let mut r = request();
		r.subject.id = "payments".to_string();
		assert_ne!(derive_idempotency_key(&r), base);

		let mut r = request();
		r.correlation_id = None;
		assert_ne!(derive_idempotency_key(&r), base);
	}

	#[test]
	fn test_missing_and_empty_correlation_are_equivalent() {
		let mut a = request();
		a.correlation_id = None;
		let mut b = request();
		b.correlation_id = Some(String::new());
		assert_eq!(derive_idempotency_key(&a), derive_idempotency_key(&b));
	}

	#[test]
	fn test_separator_inside_values_does_not_collide() {
		let mut a = request();
		a.producer_id = "svc-a".to_string();
		a.action = "login|a:x".to_string();
		a.correlation_id = None;

		let mut b = request();
		b.producer_id = "svc-a|a:login".to_string();
		b.action = "x".to_string();
		b.correlation_id = None;

		assert_ne!(derive_idempotency_key(&a), derive_idempotency_key(&b));
	}

	#[test]
	fn test_tag_text_inside_subject_does_not_collide() {
		let mut a = request();
		a.subject.subject_type = "user|si:u1".to_string();
		a.subject.id = String::new();

		let mut b = request();
		b.subject.subject_type = "user".to_string();
		b.subject.id = "u1".to_string();

		assert_ne!(derive_idempotency_key(&a), derive_idempotency_key(&b));
	}
}
