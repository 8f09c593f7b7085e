// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Application state and router assembly.

use std::sync::Arc;

use auditsink_audit::{EventStore, IngestionPipeline, QueryEngine, RedactionEngine, RetryConfig};
use auditsink_config::{SecretString, ServerConfig};
use auditsink_server_db::EventRepository;
use axum::{
	middleware,
	routing::get,
	Json, Router,
};
use sqlx::SqlitePool;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use crate::{
	api_docs::ApiDoc, auth_middleware::require_api_key, error::ServerError,
	metrics::IngestPrometheusMetrics, routes,
};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
	pub store: Arc<dyn EventStore>,
	pub pipeline: Arc<IngestionPipeline>,
	pub query: QueryEngine,
	pub metrics: Arc<IngestPrometheusMetrics>,
	/// When set, audit routes require a matching `X-Api-Key` header.
	pub api_key: Option<SecretString>,
}

/// Wire the repository, redaction, retry policy and metrics together.
pub fn create_app_state(pool: SqlitePool, config: &ServerConfig) -> Result<AppState, ServerError> {
	let store: Arc<dyn EventStore> = Arc::new(EventRepository::new(pool));
	let metrics = Arc::new(IngestPrometheusMetrics::new()?);

	let pipeline = IngestionPipeline::new(
		store.clone(),
		RedactionEngine::from_config(&config.redaction),
		RetryConfig::from(&config.ingest),
		metrics.clone(),
	);
	let query = QueryEngine::new(store.clone(), config.query.clone());

	if config.auth.is_enabled() {
		tracing::info!("api key required for audit routes");
	} else {
		tracing::warn!("no api key configured, audit routes are open");
	}

	Ok(AppState {
		store,
		pipeline: Arc::new(pipeline),
		query,
		metrics,
		api_key: config.auth.api_key.clone(),
	})
}

/// Build the HTTP router.
///
/// Audit event routes sit behind the API key check. Health, metrics and the
/// OpenAPI document stay open for probes and scrapers.
pub fn create_router(state: AppState) -> Router {
	let audit = Router::new()
		.route(
			"/audit/events",
			get(routes::events::list_events).post(routes::events::ingest_event),
		)
		.route("/audit/events/search", get(routes::events::search_events))
		.route("/audit/events/{id}", get(routes::events::get_event))
		.route_layer(middleware::from_fn_with_state(
			state.clone(),
			require_api_key,
		));

	let public = Router::new()
		.route("/health", get(routes::health::health_check))
		.route("/audit/health", get(routes::health::health_check))
		.route("/metrics", get(routes::health::prometheus_metrics))
		.route("/api/openapi.json", get(openapi_json));

	Router::new()
		.merge(audit)
		.merge(public)
		.layer(TraceLayer::new_for_http())
		.with_state(state)
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
	Json(ApiDoc::openapi())
}
