// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! OpenAPI documentation for auditsink-server.
//!
//! The raw JSON document is served at `/api/openapi.json`.

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
	info(
		title = "Audit Sink API",
		version = "1.0.0",
		description = "Ingestion, deduplication and query of audit events.",
		license(name = "Proprietary")
	),
	servers(
		(url = "/", description = "Local server")
	),
	tags(
		(name = "audit", description = "Audit event ingestion and query"),
		(name = "health", description = "Health checks and metrics")
	),
	paths(
		crate::routes::events::ingest_event,
		crate::routes::events::list_events,
		crate::routes::events::search_events,
		crate::routes::events::get_event,
		crate::routes::health::health_check,
		crate::routes::health::prometheus_metrics,
	),
	components(schemas(
		auditsink_audit::AuditEventRequest,
		auditsink_audit::Subject,
		auditsink_audit::Actor,
		auditsink_audit::EventContext,
		auditsink_audit::Policy,
		auditsink_audit::Payload,
		auditsink_audit::ErrorInfo,
		auditsink_server_api::IngestResponse,
		auditsink_server_api::AuditEventResponse,
		auditsink_server_api::AuditEventPage,
		auditsink_server_api::ErrorResponse,
		auditsink_server_api::HealthResponse,
		auditsink_server_api::HealthStatus,
	))
)]
pub struct ApiDoc;
