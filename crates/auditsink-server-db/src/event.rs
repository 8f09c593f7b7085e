// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use async_trait::async_trait;
use auditsink_audit::{
	AuditEvent, EventStore, PageRequest, SearchCriteria, SortField, StoreError,
};
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::Row;
use uuid::Uuid;

use crate::error::{DbError, Result};

const COLUMNS: &str = "id, occurred_at_utc, producer_id, action, outcome, subject_type, \
	subject_id, actor_id, actor_type, roles, tenant_id, channel, client_ip, user_agent, \
	correlation_id, trace_id, app_id, track_id, release_id, ticket_key, external_system_id, \
	policy_decision_id, rule_path, payload_hash, arguments_redacted, result_redacted, \
	error_type, error_message_hash, schema_version, idempotency_key";

/// Fixed-width UTC text so that string order matches time order.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
	ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Round up to the next whole microsecond, the precision of stored timestamps.
fn ceil_to_micros(ts: DateTime<Utc>) -> DateTime<Utc> {
	let sub_micro = i64::from(ts.timestamp_subsec_nanos() % 1_000);
	if sub_micro == 0 {
		return ts;
	}
	ts.checked_add_signed(chrono::Duration::nanoseconds(1_000 - sub_micro))
		.unwrap_or(ts)
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
	DateTime::parse_from_rfc3339(s)
		.map(|dt| dt.with_timezone(&Utc))
		.map_err(|e| DbError::Internal(format!("invalid stored timestamp '{s}': {e}")))
}

fn is_idempotency_conflict(err: &sqlx::Error) -> bool {
	match err {
		sqlx::Error::Database(db_err) => {
			db_err.is_unique_violation() && db_err.message().contains("idempotency_key")
		}
		_ => false,
	}
}

/// Build the WHERE clause and its positional bind values.
fn where_clause(criteria: &SearchCriteria) -> (String, Vec<String>) {
	let mut conditions = vec!["1=1".to_string()];
	let mut binds = Vec::new();

	let equals = [
		("tenant_id", &criteria.tenant_id),
		("actor_id", &criteria.actor_id),
		("subject_id", &criteria.subject_id),
		("action", &criteria.action),
		("outcome", &criteria.outcome),
		("correlation_id", &criteria.correlation_id),
		("trace_id", &criteria.trace_id),
		("app_id", &criteria.app_id),
	];
	for (column, value) in equals {
		if let Some(v) = value {
			conditions.push(format!("{column} = ?"));
			binds.push(v.clone());
		}
	}

	if let Some(from) = criteria.from_date {
		conditions.push("occurred_at_utc >= ?".to_string());
		binds.push(format_timestamp(&ceil_to_micros(from)));
	}
	if let Some(to) = criteria.to_date {
		conditions.push("occurred_at_utc <= ?".to_string());
		binds.push(format_timestamp(&to));
	}

	(conditions.join(" AND "), binds)
}

fn order_clause(page: &PageRequest) -> String {
	let dir = page.sort_order.as_sql();
	match page.sort_field {
		SortField::Id => format!("id {dir}"),
		field => format!("{} {dir}, id {dir}", field.column()),
	}
}

pub struct EventRepository {
	pool: SqlitePool,
}

impl EventRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	#[tracing::instrument(skip(self, event), fields(event_id = %event.id))]
	pub async fn insert(&self, event: &AuditEvent) -> Result<()> {
		let sql = format!(
			"INSERT INTO audit_events ({COLUMNS}) VALUES \
			 (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
		);

		let result = sqlx::query(&sql)
			.bind(event.id.to_string())
			.bind(format_timestamp(&event.occurred_at_utc))
			.bind(&event.producer_id)
			.bind(&event.action)
			.bind(&event.outcome)
			.bind(&event.subject_type)
			.bind(&event.subject_id)
			.bind(&event.actor_id)
			.bind(&event.actor_type)
			.bind(&event.roles)
			.bind(&event.tenant_id)
			.bind(&event.channel)
			.bind(&event.client_ip)
			.bind(&event.user_agent)
			.bind(&event.correlation_id)
			.bind(&event.trace_id)
			.bind(&event.app_id)
			.bind(&event.track_id)
			.bind(&event.release_id)
			.bind(&event.ticket_key)
			.bind(&event.external_system_id)
			.bind(&event.policy_decision_id)
			.bind(&event.rule_path)
			.bind(&event.payload_hash)
			.bind(&event.arguments_redacted)
			.bind(&event.result_redacted)
			.bind(&event.error_type)
			.bind(&event.error_message_hash)
			.bind(event.schema_version)
			.bind(&event.idempotency_key)
			.execute(&self.pool)
			.await;

		match result {
			Ok(_) => Ok(()),
			Err(e) if is_idempotency_conflict(&e) => {
				tracing::debug!("idempotency key conflict");
				Err(DbError::Conflict(event.idempotency_key.clone()))
			}
			Err(e) => Err(e.into()),
		}
	}

	#[tracing::instrument(skip(self))]
	pub async fn find_by_id(&self, id: Uuid) -> Result<Option<AuditEvent>> {
		let sql = format!("SELECT {COLUMNS} FROM audit_events WHERE id = ?");
		let row = sqlx::query(&sql)
			.bind(id.to_string())
			.fetch_optional(&self.pool)
			.await?;

		row.as_ref().map(row_to_event).transpose()
	}

	#[tracing::instrument(skip(self, key))]
	pub async fn find_id_by_idempotency_key(&self, key: &str) -> Result<Option<Uuid>> {
		let row: Option<(String,)> =
			sqlx::query_as("SELECT id FROM audit_events WHERE idempotency_key = ?")
				.bind(key)
				.fetch_optional(&self.pool)
				.await?;

		row.map(|(id,)| {
			Uuid::parse_str(&id).map_err(|e| DbError::Internal(format!("invalid stored id: {e}")))
		})
		.transpose()
	}

	#[tracing::instrument(skip(self, criteria), fields(page = page.page, size = page.size))]
	pub async fn scan(&self, criteria: &SearchCriteria, page: &PageRequest) -> Result<Vec<AuditEvent>> {
		let (where_sql, binds) = where_clause(criteria);
		let sql = format!(
			"SELECT {COLUMNS} FROM audit_events WHERE {where_sql} ORDER BY {} LIMIT ? OFFSET ?",
			order_clause(page)
		);

		let mut query = sqlx::query(&sql);
		for value in &binds {
			query = query.bind(value);
		}
		let offset = i64::try_from(page.offset()).unwrap_or(i64::MAX);
		query = query.bind(i64::from(page.size)).bind(offset);

		let rows = query.fetch_all(&self.pool).await?;
		rows.iter().map(row_to_event).collect()
	}

	#[tracing::instrument(skip(self, criteria))]
	pub async fn count(&self, criteria: &SearchCriteria) -> Result<u64> {
		let (where_sql, binds) = where_clause(criteria);
		let sql = format!("SELECT COUNT(*) AS cnt FROM audit_events WHERE {where_sql}");

		let mut query = sqlx::query(&sql);
		for value in &binds {
			query = query.bind(value);
		}

		let row = query.fetch_one(&self.pool).await?;
		let total: i64 = row.get("cnt");
		Ok(total.max(0) as u64)
	}

	pub async fn ping(&self) -> Result<()> {
		sqlx::query("SELECT 1").execute(&self.pool).await?;
		Ok(())
	}
}

fn row_to_event(row: &SqliteRow) -> Result<AuditEvent> {
	let id: String = row.try_get("id")?;
	let occurred_at: String = row.try_get("occurred_at_utc")?;

	Ok(AuditEvent {
		id: Uuid::parse_str(&id)
			.map_err(|e| DbError::Internal(format!("invalid stored id '{id}': {e}")))?,
		occurred_at_utc: parse_timestamp(&occurred_at)?,
		producer_id: row.try_get("producer_id")?,
		action: row.try_get("action")?,
		outcome: row.try_get("outcome")?,
		subject_type: row.try_get("subject_type")?,
		subject_id: row.try_get("subject_id")?,
		actor_id: row.try_get("actor_id")?,
		actor_type: row.try_get("actor_type")?,
		roles: row.try_get("roles")?,
		tenant_id: row.try_get("tenant_id")?,
		channel: row.try_get("channel")?,
		client_ip: row.try_get("client_ip")?,
		user_agent: row.try_get("user_agent")?,
		correlation_id: row.try_get("correlation_id")?,
		trace_id: row.try_get("trace_id")?,
		app_id: row.try_get("app_id")?,
		track_id: row.try_get("track_id")?,
		release_id: row.try_get("release_id")?,
		ticket_key: row.try_get("ticket_key")?,
		external_system_id: row.try_get("external_system_id")?,
		policy_decision_id: row.try_get("policy_decision_id")?,
		rule_path: row.try_get("rule_path")?,
		payload_hash: row.try_get("payload_hash")?,
		arguments_redacted: row.try_get("arguments_redacted")?,
		result_redacted: row.try_get("result_redacted")?,
		error_type: row.try_get("error_type")?,
		error_message_hash: row.try_get("error_message_hash")?,
		schema_version: row.try_get("schema_version")?,
		idempotency_key: row.try_get("idempotency_key")?,
	})
}

#[async_trait]
impl EventStore for EventRepository {
	async fn insert(&self, event: &AuditEvent) -> std::result::Result<(), StoreError> {
		Ok(self.insert(event).await?)
	}

	async fn find_by_id(&self, id: Uuid) -> std::result::Result<Option<AuditEvent>, StoreError> {
		Ok(self.find_by_id(id).await?)
	}

	async fn find_id_by_idempotency_key(
		&self,
		key: &str,
	) -> std::result::Result<Option<Uuid>, StoreError> {
		Ok(self.find_id_by_idempotency_key(key).await?)
	}

	async fn scan(
		&self,
		criteria: &SearchCriteria,
		page: &PageRequest,
	) -> std::result::Result<Vec<AuditEvent>, StoreError> {
		Ok(self.scan(criteria, page).await?)
	}

	async fn count(&self, criteria: &SearchCriteria) -> std::result::Result<u64, StoreError> {
		Ok(self.count(criteria).await?)
	}

	async fn ping(&self) -> std::result::Result<(), StoreError> {
		Ok(self.ping().await?)
	}
}
