// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Health and metrics HTTP handlers.

use std::time::Duration;

use auditsink_server_api::{HealthResponse, HealthStatus};
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use tokio::time::timeout;

use crate::{api::AppState, error::ServerError};

const DB_CHECK_TIMEOUT: Duration = Duration::from_secs(2);

#[utoipa::path(
	get,
	path = "/health",
	responses(
		(status = 200, description = "Service and database are healthy", body = HealthResponse),
		(status = 503, description = "Database is unreachable", body = HealthResponse)
	),
	tag = "health"
)]
/// GET /health and /audit/health - liveness plus a database ping.
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
	let (database, error) = match timeout(DB_CHECK_TIMEOUT, state.store.ping()).await {
		Ok(Ok(())) => (HealthStatus::Healthy, None),
		Ok(Err(e)) => {
			tracing::warn!(error = %e, "database health check failed");
			(HealthStatus::Unhealthy, Some("database unavailable".to_string()))
		}
		Err(_) => {
			tracing::warn!("database health check timed out");
			(
				HealthStatus::Unhealthy,
				Some("database health check timed out".to_string()),
			)
		}
	};

	let response = HealthResponse {
		status: database,
		database,
		version: env!("CARGO_PKG_VERSION").to_string(),
		error,
	};

	let http_status = match database {
		HealthStatus::Healthy => StatusCode::OK,
		HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
	};

	(http_status, Json(response))
}

#[utoipa::path(
	get,
	path = "/metrics",
	responses(
		(status = 200, description = "Prometheus metrics", content_type = "text/plain")
	),
	tag = "health"
)]
/// GET /metrics - Prometheus text exposition of ingestion counters.
pub async fn prometheus_metrics(
	State(state): State<AppState>,
) -> Result<impl IntoResponse, ServerError> {
	let metrics = state.metrics.gather()?;
	Ok((
		StatusCode::OK,
		[(
			axum::http::header::CONTENT_TYPE,
			"text/plain; version=0.0.4; charset=utf-8",
		)],
		metrics,
	))
}
