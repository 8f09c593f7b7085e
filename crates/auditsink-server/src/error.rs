// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Server error types and HTTP response conversions.

use auditsink_audit::AuditError;
use auditsink_server_api::ErrorResponse;
use axum::{
	extract::rejection::{JsonRejection, PathRejection, QueryRejection},
	http::StatusCode,
	response::{IntoResponse, Response},
	Json,
};

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
	/// Required fields were missing or blank.
	#[error("Validation failed: {}", .0.join(", "))]
	Validation(Vec<String>),

	/// Malformed body, path or query string.
	#[error("Invalid request: {0}")]
	BadRequest(String),

	#[error("Audit event not found: {0}")]
	NotFound(String),

	#[error("Unauthorized: {0}")]
	Unauthorized(String),

	/// A duplicate was detected but the existing event could not be read back.
	#[error("Service unavailable: {0}")]
	ServiceUnavailable(String),

	#[error("Internal error: {0}")]
	Internal(String),

	#[error("Metrics encoding error: {0}")]
	Metrics(#[from] prometheus::Error),
}

impl From<AuditError> for ServerError {
	fn from(err: AuditError) -> Self {
		match err {
			AuditError::Validation { fields } => ServerError::Validation(fields),
			e @ AuditError::LookupInconsistency { .. } => ServerError::ServiceUnavailable(e.to_string()),
			AuditError::Storage(msg) => ServerError::Internal(msg),
		}
	}
}

impl From<JsonRejection> for ServerError {
	fn from(rejection: JsonRejection) -> Self {
		ServerError::BadRequest(rejection.body_text())
	}
}

impl From<QueryRejection> for ServerError {
	fn from(rejection: QueryRejection) -> Self {
		ServerError::BadRequest(rejection.body_text())
	}
}

impl From<PathRejection> for ServerError {
	fn from(rejection: PathRejection) -> Self {
		ServerError::BadRequest(rejection.body_text())
	}
}

impl IntoResponse for ServerError {
	fn into_response(self) -> Response {
		let (status, body) = match &self {
			ServerError::Validation(fields) => (
				StatusCode::BAD_REQUEST,
				ErrorResponse::new("validation_failed", AuditError::validation_message(fields)),
			),
			ServerError::BadRequest(msg) => (
				StatusCode::BAD_REQUEST,
				ErrorResponse::new("bad_request", msg.clone()),
			),
			ServerError::NotFound(id) => (
				StatusCode::NOT_FOUND,
				ErrorResponse::new("not_found", format!("Audit event not found: {id}")),
			),
			ServerError::Unauthorized(msg) => (
				StatusCode::UNAUTHORIZED,
				ErrorResponse::new("unauthorized", msg.clone()),
			),
			ServerError::ServiceUnavailable(msg) => {
				tracing::error!(error = %msg, "lookup inconsistency");
				(
					StatusCode::SERVICE_UNAVAILABLE,
					ErrorResponse::new(
						"lookup_inconsistency",
						"The event was recorded but could not be read back yet; retry the request",
					),
				)
			}
			ServerError::Internal(msg) => {
				tracing::error!(error = %msg, "internal error");
				internal_error()
			}
			ServerError::Metrics(e) => {
				tracing::error!(error = %e, "metrics encoding error");
				internal_error()
			}
		};

		(status, Json(body)).into_response()
	}
}

fn internal_error() -> (StatusCode, ErrorResponse) {
	(
		StatusCode::INTERNAL_SERVER_ERROR,
		ErrorResponse::new("internal_error", "An internal error occurred"),
	)
}
