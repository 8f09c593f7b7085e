// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::error::{AuditError, AuditResult, StoreError};
use crate::event::{AuditEvent, AuditEventRequest, IngestResult, RequestMetadata, DEFAULT_SCHEMA_VERSION};
use crate::fingerprint::derive_idempotency_key;
use crate::metrics::IngestMetrics;
use crate::redaction::RedactionEngine;
use crate::retry::{retry_until_found, RetryConfig};
use crate::store::EventStore;

/// Validates, normalizes, redacts, fingerprints and stores incoming events.
///
/// Duplicate submissions are detected by the store's uniqueness constraint
/// on the derived idempotency key and answered with the existing event id.
pub struct IngestionPipeline {
	store: Arc<dyn EventStore>,
	redaction: RedactionEngine,
	retry: RetryConfig,
	metrics: Arc<dyn IngestMetrics>,
}

impl IngestionPipeline {
	pub fn new(
		store: Arc<dyn EventStore>,
		redaction: RedactionEngine,
		retry: RetryConfig,
		metrics: Arc<dyn IngestMetrics>,
	) -> Self {
		Self {
			store,
			redaction,
			retry,
			metrics,
		}
	}

	#[instrument(
		skip(self, request, metadata),
		fields(producer_id = %request.producer_id, action = %request.action)
	)]
	pub async fn ingest(
		&self,
		request: AuditEventRequest,
		metadata: RequestMetadata,
	) -> AuditResult<IngestResult> {
		let started = Instant::now();
		self.metrics.received();

		let result = self.ingest_inner(request, metadata).await;

		match &result {
			Ok(r) if r.deduped => self.metrics.deduplicated(),
			Ok(_) => self.metrics.ingested(),
			Err(_) => self.metrics.rejected(),
		}
		self.metrics.observe_duration(started.elapsed());

		result
	}

	async fn ingest_inner(
		&self,
		request: AuditEventRequest,
		metadata: RequestMetadata,
	) -> AuditResult<IngestResult> {
		if let Err(e) = request.validate() {
			warn!(error = %e, "rejecting invalid audit event");
			return Err(e);
		}

		if let Some(client_key) = request.idempotency_key.as_deref() {
			warn!(
				client_key = %client_key,
				"ignoring client-supplied idempotency key, using derived key"
			);
		}

		let event = self.normalize(&request, metadata, Utc::now());

		match self.store.insert(&event).await {
			Ok(()) => {
				info!(event_id = %event.id, deduped = false, "audit event recorded");
				Ok(IngestResult {
					event_id: event.id,
					deduped: false,
				})
			}
			Err(StoreError::Conflict) => self.resolve_duplicate(&event.idempotency_key).await,
			Err(StoreError::Storage(msg)) => {
				tracing::error!(error = %msg, "failed to persist audit event");
				Err(AuditError::Storage(msg))
			}
		}
	}

	async fn resolve_duplicate(&self, key: &str) -> AuditResult<IngestResult> {
		debug!("idempotency key already recorded, looking up existing event");

		let existing = retry_until_found(&self.retry, || self.store.find_id_by_idempotency_key(key))
			.await?;

		match existing {
			Some(existing_id) => {
				info!(event_id = %existing_id, deduped = true, "duplicate audit event");
				Ok(IngestResult {
					event_id: existing_id,
					deduped: true,
				})
			}
			None => {
				tracing::error!(
					attempts = self.retry.max_attempts,
					"existing event for duplicate key never became visible"
				);
				Err(AuditError::LookupInconsistency {
					key: key.to_string(),
					attempts: self.retry.max_attempts,
				})
			}
		}
	}

	/// Build the record to persist. A fresh id is assigned on every call.
	pub fn normalize(
		&self,
		request: &AuditEventRequest,
		metadata: RequestMetadata,
		now: DateTime<Utc>,
	) -> AuditEvent {
		let context = request.context.clone().unwrap_or_default();
		let policy = request.policy.clone().unwrap_or_default();
		let error = request.error.clone().unwrap_or_default();
		let payload = request.payload.as_ref();

		AuditEvent {
			id: Uuid::new_v4(),
			occurred_at_utc: request.occurred_at_utc.unwrap_or(now),
			producer_id: request.producer_id.clone(),
			action: request.action.clone(),
			outcome: request.outcome.clone(),
			subject_type: request.subject.subject_type.clone(),
			subject_id: request.subject.id.clone(),
			actor_id: request.actor.id.clone(),
			actor_type: request.actor.actor_type.clone(),
			roles: request.flattened_roles(),
			tenant_id: request.actor.tenant_id.clone(),
			channel: request.channel.clone(),
			client_ip: metadata.client_ip,
			user_agent: metadata.user_agent,
			correlation_id: request.correlation_id.clone().or(metadata.correlation_id),
			trace_id: request.trace_id.clone().or(metadata.trace_id),
			app_id: context.app_id,
			track_id: context.track_id,
			release_id: context.release_id,
			ticket_key: context.ticket_key,
			external_system_id: context.external_system_id,
			policy_decision_id: policy.decision_id,
			rule_path: policy.rule_path,
			payload_hash: payload.and_then(|p| p.payload_hash.clone()),
			arguments_redacted: payload
				.and_then(|p| p.arguments_redacted.as_ref())
				.filter(|v| !v.is_null())
				.map(|v| self.redaction.redact(v)),
			result_redacted: payload
				.and_then(|p| p.result_redacted.as_ref())
				.filter(|v| !v.is_null())
				.map(|v| self.redaction.redact(v)),
			error_type: error.error_type,
			error_message_hash: error.error_message_hash,
			schema_version: request.schema_version.unwrap_or(DEFAULT_SCHEMA_VERSION),
			idempotency_key: derive_idempotency_key(request),
		}
	}
}
