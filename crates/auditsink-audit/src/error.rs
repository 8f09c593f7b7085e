// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use thiserror::Error;

pub type AuditResult<T> = Result<T, AuditError>;

#[derive(Error, Debug)]
pub enum AuditError {
	/// The request is missing required fields. Nothing was persisted.
	#[error("validation failed: {}", .fields.join(", "))]
	Validation { fields: Vec<String> },

	/// An insert reported a duplicate key but the existing row never became visible.
	#[error("duplicate idempotency key {key} but existing event not found after {attempts} lookups")]
	LookupInconsistency { key: String, attempts: u32 },

	#[error("storage error: {0}")]
	Storage(String),
}

impl AuditError {
	pub fn validation_message(fields: &[String]) -> String {
		fields
			.iter()
			.map(|f| format!("{f} must not be blank"))
			.collect::<Vec<_>>()
			.join("; ")
	}
}

/// Errors surfaced by an [`EventStore`](crate::store::EventStore).
#[derive(Error, Debug)]
pub enum StoreError {
	#[error("idempotency key already recorded")]
	Conflict,

	#[error("storage failure: {0}")]
	Storage(String),
}

impl From<StoreError> for AuditError {
	fn from(err: StoreError) -> Self {
		match err {
			StoreError::Conflict => {
				AuditError::Storage("unexpected idempotency conflict".to_string())
			}
			StoreError::Storage(msg) => AuditError::Storage(msg),
		}
	}
}
