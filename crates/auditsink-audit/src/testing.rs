// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! In-memory store with scriptable failure modes for unit tests.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use uuid::Uuid;

use crate::error::StoreError;
use crate::event::AuditEvent;
use crate::store::{EventStore, PageRequest, SearchCriteria, SortOrder};

#[derive(Default)]
pub struct MemoryStore {
	events: Mutex<Vec<AuditEvent>>,
	/// Number of key lookups that report nothing before the row becomes visible.
	pub hidden_lookups: AtomicU32,
	pub lookups: AtomicU32,
	pub fail_inserts: Mutex<Option<String>>,
}

impl MemoryStore {
	pub fn push(&self, event: AuditEvent) {
		self.events.lock().unwrap().push(event);
	}

	pub fn len(&self) -> usize {
		self.events.lock().unwrap().len()
	}

	fn matches(event: &AuditEvent, c: &SearchCriteria) -> bool {
		fn eq(field: &Option<String>, want: &Option<String>) -> bool {
			want.is_none() || field == want
		}

		eq(&event.tenant_id, &c.tenant_id)
			&& c.actor_id.as_ref().map_or(true, |v| *v == event.actor_id)
			&& c.subject_id.as_ref().map_or(true, |v| *v == event.subject_id)
			&& c.action.as_ref().map_or(true, |v| *v == event.action)
			&& c.outcome.as_ref().map_or(true, |v| *v == event.outcome)
			&& eq(&event.correlation_id, &c.correlation_id)
			&& eq(&event.trace_id, &c.trace_id)
			&& eq(&event.app_id, &c.app_id)
			&& c.from_date.map_or(true, |d| event.occurred_at_utc >= d)
			&& c.to_date.map_or(true, |d| event.occurred_at_utc <= d)
	}
}

#[async_trait]
impl EventStore for MemoryStore {
	async fn insert(&self, event: &AuditEvent) -> Result<(), StoreError> {
		if let Some(msg) = self.fail_inserts.lock().unwrap().clone() {
			return Err(StoreError::Storage(msg));
		}

		let mut events = self.events.lock().unwrap();
		if events
			.iter()
			.any(|e| e.idempotency_key == event.idempotency_key)
		{
			return Err(StoreError::Conflict);
		}
		events.push(event.clone());
		Ok(())
	}

	async fn find_by_id(&self, id: Uuid) -> Result<Option<AuditEvent>, StoreError> {
		Ok(self
			.events
			.lock()
			.unwrap()
			.iter()
			.find(|e| e.id == id)
			.cloned())
	}

	async fn find_id_by_idempotency_key(&self, key: &str) -> Result<Option<Uuid>, StoreError> {
		self.lookups.fetch_add(1, Ordering::SeqCst);
		let hidden = self.hidden_lookups.load(Ordering::SeqCst);
		if hidden > 0 {
			self.hidden_lookups.store(hidden - 1, Ordering::SeqCst);
			return Ok(None);
		}

		Ok(self
			.events
			.lock()
			.unwrap()
			.iter()
			.find(|e| e.idempotency_key == key)
			.map(|e| e.id))
	}

	async fn scan(
		&self,
		criteria: &SearchCriteria,
		page: &PageRequest,
	) -> Result<Vec<AuditEvent>, StoreError> {
		let mut matched: Vec<AuditEvent> = self
			.events
			.lock()
			.unwrap()
			.iter()
			.filter(|e| Self::matches(e, criteria))
			.cloned()
			.collect();

		matched.sort_by(|a, b| (a.occurred_at_utc, a.id).cmp(&(b.occurred_at_utc, b.id)));
		if page.sort_order == SortOrder::Desc {
			matched.reverse();
		}

		Ok(matched
			.into_iter()
			.skip(page.offset() as usize)
			.take(page.size as usize)
			.collect())
	}

	async fn count(&self, criteria: &SearchCriteria) -> Result<u64, StoreError> {
		Ok(self
			.events
			.lock()
			.unwrap()
			.iter()
			.filter(|e| Self::matches(e, criteria))
			.count() as u64)
	}
}

pub fn sample_event(idempotency_key: &str, tenant_id: &str) -> AuditEvent {
	AuditEvent {
		id: Uuid::new_v4(),
		occurred_at_utc: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
		producer_id: "deployer".to_string(),
		action: "deploy".to_string(),
		outcome: "success".to_string(),
		subject_type: "service".to_string(),
		subject_id: "billing".to_string(),
		actor_id: "u-1".to_string(),
		actor_type: "user".to_string(),
		roles: None,
		tenant_id: Some(tenant_id.to_string()),
		channel: None,
		client_ip: None,
		user_agent: None,
		correlation_id: None,
		trace_id: None,
		app_id: None,
		track_id: None,
		release_id: None,
		ticket_key: None,
		external_system_id: None,
		policy_decision_id: None,
		rule_path: None,
		payload_hash: None,
		arguments_redacted: None,
		result_redacted: None,
		error_type: None,
		error_message_hash: None,
		schema_version: 1,
		idempotency_key: idempotency_key.to_string(),
	}
}
