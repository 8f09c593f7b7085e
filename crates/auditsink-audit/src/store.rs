// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Storage seam for audit events.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::StoreError;
use crate::event::AuditEvent;

/// Optional search constraints. `None` leaves a field unconstrained.
///
/// Date bounds are inclusive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchCriteria {
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
}

impl SearchCriteria {
	pub fn is_empty(&self) -> bool {
		*self == Self::default()
	}
}

/// Columns a caller may sort by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
	Id,
	#[default]
	OccurredAtUtc,
	Action,
	Outcome,
	ActorId,
	SubjectId,
	TenantId,
}

impl SortField {
	pub const ALL: [SortField; 7] = [
		SortField::Id,
		SortField::OccurredAtUtc,
		SortField::Action,
		SortField::Outcome,
		SortField::ActorId,
		SortField::SubjectId,
		SortField::TenantId,
	];

	/// The storage column name. Never derived from caller input.
	pub fn column(self) -> &'static str {
		match self {
			SortField::Id => "id",
			SortField::OccurredAtUtc => "occurred_at_utc",
			SortField::Action => "action",
			SortField::Outcome => "outcome",
			SortField::ActorId => "actor_id",
			SortField::SubjectId => "subject_id",
			SortField::TenantId => "tenant_id",
		}
	}

	/// Parse a caller-supplied sort field, falling back to the default when
	/// absent or not on the allow-list.
	pub fn parse_lenient(value: Option<&str>) -> Self {
		match value.map(str::trim).filter(|v| !v.is_empty()) {
			Some(v) => v.parse().unwrap_or_else(|e: UnknownSortField| {
				tracing::debug!(error = %e, "falling back to default sort field");
				SortField::default()
			}),
			None => SortField::default(),
		}
	}
}

impl fmt::Display for SortField {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.column())
	}
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported sort field '{0}'")]
pub struct UnknownSortField(pub String);

impl FromStr for SortField {
	type Err = UnknownSortField;

	/// Accepts the column name or its camelCase form.
	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"id" => Ok(SortField::Id),
			"occurred_at_utc" | "occurredAtUtc" => Ok(SortField::OccurredAtUtc),
			"action" => Ok(SortField::Action),
			"outcome" => Ok(SortField::Outcome),
			"actor_id" | "actorId" => Ok(SortField::ActorId),
			"subject_id" | "subjectId" => Ok(SortField::SubjectId),
			"tenant_id" | "tenantId" => Ok(SortField::TenantId),
			other => Err(UnknownSortField(other.to_string())),
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
	Asc,
	#[default]
	Desc,
}

impl SortOrder {
	/// `asc` (any case) sorts ascending; anything else, including nothing, descending.
	pub fn parse_lenient(value: Option<&str>) -> Self {
		match value {
			Some(v) if v.trim().eq_ignore_ascii_case("asc") => SortOrder::Asc,
			_ => SortOrder::Desc,
		}
	}

	pub fn as_sql(self) -> &'static str {
		match self {
			SortOrder::Asc => "ASC",
			SortOrder::Desc => "DESC",
		}
	}
}

/// A resolved page window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
	pub page: u32,
	pub size: u32,
	pub sort_field: SortField,
	pub sort_order: SortOrder,
}

impl PageRequest {
	pub fn offset(&self) -> u64 {
		u64::from(self.page) * u64::from(self.size)
	}
}

/// Durable, append-only event storage.
///
/// Implementations must enforce idempotency key uniqueness themselves and
/// report a duplicate as [`StoreError::Conflict`].
#[async_trait]
pub trait EventStore: Send + Sync {
	async fn insert(&self, event: &AuditEvent) -> Result<(), StoreError>;

	async fn find_by_id(&self, id: Uuid) -> Result<Option<AuditEvent>, StoreError>;

	async fn find_id_by_idempotency_key(&self, key: &str) -> Result<Option<Uuid>, StoreError>;

	async fn scan(
		&self,
		criteria: &SearchCriteria,
		page: &PageRequest,
	) -> Result<Vec<AuditEvent>, StoreError>;

	async fn count(&self, criteria: &SearchCriteria) -> Result<u64, StoreError>;

	/// Cheap liveness check.
	async fn ping(&self) -> Result<(), StoreError> {
		Ok(())
	}
}
