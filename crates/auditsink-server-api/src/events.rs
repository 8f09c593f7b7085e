// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use auditsink_audit::{AuditEvent, IngestResult, Page, SearchCriteria};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(feature = "openapi")]
use utoipa::{IntoParams, ToSchema};

/// Acknowledgement for an ingested event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct IngestResponse {
	pub event_id: Uuid,
	/// True when an identical event was already recorded.
	pub deduped: bool,
}

impl From<IngestResult> for IngestResponse {
	fn from(r: IngestResult) -> Self {
		Self {
			event_id: r.event_id,
			deduped: r.deduped,
		}
	}
}

/// A stored audit event. Payload fields hold redacted JSON text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct AuditEventResponse {
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

impl From<AuditEvent> for AuditEventResponse {
	fn from(e: AuditEvent) -> Self {
		Self {
			id: e.id,
			occurred_at_utc: e.occurred_at_utc,
			producer_id: e.producer_id,
			action: e.action,
			outcome: e.outcome,
			subject_type: e.subject_type,
			subject_id: e.subject_id,
			actor_id: e.actor_id,
			actor_type: e.actor_type,
			roles: e.roles,
			tenant_id: e.tenant_id,
			channel: e.channel,
			client_ip: e.client_ip,
			user_agent: e.user_agent,
			correlation_id: e.correlation_id,
			trace_id: e.trace_id,
			app_id: e.app_id,
			track_id: e.track_id,
			release_id: e.release_id,
			ticket_key: e.ticket_key,
			external_system_id: e.external_system_id,
			policy_decision_id: e.policy_decision_id,
			rule_path: e.rule_path,
			payload_hash: e.payload_hash,
			arguments_redacted: e.arguments_redacted,
			result_redacted: e.result_redacted,
			error_type: e.error_type,
			error_message_hash: e.error_message_hash,
			schema_version: e.schema_version,
			idempotency_key: e.idempotency_key,
		}
	}
}

/// Paged envelope for event listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct AuditEventPage {
	pub content: Vec<AuditEventResponse>,
	pub page: u32,
	pub size: u32,
	pub total_elements: u64,
	pub total_pages: u64,
	pub first: bool,
	pub last: bool,
}

impl From<Page<AuditEvent>> for AuditEventPage {
	fn from(page: Page<AuditEvent>) -> Self {
		let page = page.map(AuditEventResponse::from);
		Self {
			content: page.content,
			page: page.page,
			size: page.size,
			total_elements: page.total_elements,
			total_pages: page.total_pages,
			first: page.first,
			last: page.last,
		}
	}
}

/// Paging and sorting parameters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(IntoParams))]
#[cfg_attr(feature = "openapi", into_params(parameter_in = Query))]
#[serde(rename_all = "camelCase")]
pub struct ListEventsParams {
	/// Zero-based page number.
	pub page: Option<u32>,
	pub size: Option<u32>,
	/// One of id, occurred_at_utc, action, outcome, actor_id, subject_id, tenant_id.
	pub sort_by: Option<String>,
	/// `asc` or `desc`.
	pub sort_order: Option<String>,
}

/// Search filters plus paging. Absent filters are unconstrained; dates are inclusive.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(IntoParams))]
#[cfg_attr(feature = "openapi", into_params(parameter_in = Query))]
#[serde(rename_all = "camelCase")]
pub struct SearchEventsParams {
	pub tenant_id: Option<String>,
	pub actor_id: Option<String>,
	pub subject_id: Option<String>,
	pub action: Option<String>,
	pub outcome: Option<String>,
	pub correlation_id: Option<String>,
	pub trace_id: Option<String>,
	pub app_id: Option<String>,
	pub from_date: Option<DateTime<Utc>>,
	pub to_date: Option<DateTime<Utc>>,
	pub page: Option<u32>,
	pub size: Option<u32>,
	pub sort_by: Option<String>,
	pub sort_order: Option<String>,
}

fn non_empty(value: &Option<String>) -> Option<String> {
	value.as_ref().filter(|v| !v.trim().is_empty()).cloned()
}

impl SearchEventsParams {
	/// Blank strings are treated as absent.
	pub fn criteria(&self) -> SearchCriteria {
		SearchCriteria {
			tenant_id: non_empty(&self.tenant_id),
			actor_id: non_empty(&self.actor_id),
			subject_id: non_empty(&self.subject_id),
			action: non_empty(&self.action),
			outcome: non_empty(&self.outcome),
			correlation_id: non_empty(&self.correlation_id),
			trace_id: non_empty(&self.trace_id),
			app_id: non_empty(&self.app_id),
			from_date: self.from_date,
			to_date: self.to_date,
		}
	}
}
