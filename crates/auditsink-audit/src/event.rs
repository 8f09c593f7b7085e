// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Audit event types: the inbound request, the persisted record and the
//! transport metadata captured alongside it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use uuid::Uuid;

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

use crate::error::AuditError;

pub const DEFAULT_SCHEMA_VERSION: i32 = 1;

/// An audit event as submitted by a producer.
///
/// Required fields default to empty so that [`AuditEventRequest::validate`]
/// can report every missing field at once instead of failing on the first.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct AuditEventRequest {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub schema_version: Option<i32>,
	#[serde(default)]
	pub producer_id: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub occurred_at_utc: Option<DateTime<Utc>>,
	#[serde(default)]
	pub action: String,
	#[serde(default)]
	pub outcome: String,
	#[serde(default)]
	pub subject: Subject,
	#[serde(default)]
	pub actor: Actor,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub context: Option<EventContext>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub channel: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub correlation_id: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub trace_id: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub policy: Option<Policy>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub payload: Option<Payload>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub error: Option<ErrorInfo>,
	/// Client-side key. Informational only; deduplication uses the derived key.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub idempotency_key: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct Subject {
	#[serde(rename = "type", default)]
	pub subject_type: String,
	#[serde(default)]
	pub id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct Actor {
	#[serde(default)]
	pub id: String,
	#[serde(rename = "type", default)]
	pub actor_type: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub roles: Option<Vec<String>>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub tenant_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct EventContext {
	#[serde(default)]
	pub app_id: Option<String>,
	#[serde(default)]
	pub track_id: Option<String>,
	#[serde(default)]
	pub release_id: Option<String>,
	#[serde(default, alias = "jiraKey")]
	pub ticket_key: Option<String>,
	#[serde(default, alias = "snowSysId")]
	pub external_system_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct Policy {
	#[serde(default)]
	pub decision_id: Option<String>,
	#[serde(default)]
	pub rule_path: Option<String>,
}

/// Payload sub-objects are arbitrary JSON and are redacted before storage.
///
/// A missing field is `None`; an explicit JSON `null` is `Some(Value::Null)`.
/// Both are stored as SQL NULL.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct Payload {
	#[serde(
		default,
		alias = "argsRedacted",
		deserialize_with = "present_value",
		skip_serializing_if = "Option::is_none"
	)]
	pub arguments_redacted: Option<Value>,
	#[serde(
		default,
		deserialize_with = "present_value",
		skip_serializing_if = "Option::is_none"
	)]
	pub result_redacted: Option<Value>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub payload_hash: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct ErrorInfo {
	#[serde(default)]
	pub error_type: Option<String>,
	#[serde(default)]
	pub error_message_hash: Option<String>,
}

fn present_value<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
	D: Deserializer<'de>,
{
	Value::deserialize(deserializer).map(Some)
}

fn is_blank(s: &str) -> bool {
	s.trim().is_empty()
}

impl AuditEventRequest {
	/// Check that every required field is present and non-blank.
	pub fn validate(&self) -> Result<(), AuditError> {
		let required = [
			("producerId", self.producer_id.as_str()),
			("action", self.action.as_str()),
			("outcome", self.outcome.as_str()),
			("subject.type", self.subject.subject_type.as_str()),
			("subject.id", self.subject.id.as_str()),
			("actor.id", self.actor.id.as_str()),
			("actor.type", self.actor.actor_type.as_str()),
		];

		let fields: Vec<String> = required
			.iter()
			.filter(|(_, value)| is_blank(value))
			.map(|(name, _)| name.to_string())
			.collect();

		if fields.is_empty() {
			Ok(())
		} else {
			Err(AuditError::Validation { fields })
		}
	}

	/// Roles joined with `,` in the order supplied, or `None` when there are none.
	pub fn flattened_roles(&self) -> Option<String> {
		self.actor
			.roles
			.as_ref()
			.filter(|roles| !roles.is_empty())
			.map(|roles| roles.join(","))
	}
}

/// Transport-level facts captured when a request arrives.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestMetadata {
	pub client_ip: Option<String>,
	pub user_agent: Option<String>,
	/// Header fallback used only when the body carries no correlation id.
	pub correlation_id: Option<String>,
	/// Header fallback used only when the body carries no trace id.
	pub trace_id: Option<String>,
}

/// A persisted, immutable audit event.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditEvent {
	pub id: Uuid,
	pub occurred_at_utc: DateTime<Utc>,
	pub producer_id: String,
	pub action: String,
	pub outcome: String,
	pub subject_type: String,
	pub subject_id: String,
	pub actor_id: String,
	pub actor_type: String,
	pub roles: Option<String>,
	pub tenant_id: Option<String>,
	pub channel: Option<String>,
	pub client_ip: Option<String>,
	pub user_agent: Option<String>,
	pub correlation_id: Option<String>,
	pub trace_id: Option<String>,
	pub app_id: Option<String>,
	pub track_id: Option<String>,
	pub release_id: Option<String>,
	pub ticket_key: Option<String>,
	pub external_system_id: Option<String>,
	pub policy_decision_id: Option<String>,
	pub rule_path: Option<String>,
	pub payload_hash: Option<String>,
	pub arguments_redacted: Option<String>,
	pub result_redacted: Option<String>,
	pub error_type: Option<String>,
	pub error_message_hash: Option<String>,
	pub schema_version: i32,
	pub idempotency_key: String,
}

/// Outcome of a single ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestResult {
	pub event_id: Uuid,
	pub deduped: bool,
}
