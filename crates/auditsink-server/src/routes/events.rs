// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Audit event ingestion and query handlers.

use std::net::SocketAddr;

use auditsink_audit::AuditEventRequest;
use auditsink_server_api::{
	AuditEventPage, AuditEventResponse, ErrorResponse, IngestResponse, ListEventsParams,
	SearchEventsParams,
};
use axum::{
	extract::{
		rejection::{JsonRejection, PathRejection, QueryRejection},
		ConnectInfo, Path, Query, State,
	},
	http::{Extensions, HeaderMap, StatusCode},
	Json,
};
use uuid::Uuid;

use crate::{api::AppState, client_info::request_metadata, error::ServerError};

#[utoipa::path(
	post,
	path = "/audit/events",
	request_body = AuditEventRequest,
	responses(
		(status = 202, description = "Event recorded", body = IngestResponse),
		(status = 200, description = "Duplicate of an existing event", body = IngestResponse),
		(status = 400, description = "Missing fields or malformed body", body = ErrorResponse),
		(status = 401, description = "Missing or invalid API key", body = ErrorResponse),
		(status = 503, description = "Duplicate detected but not yet readable", body = ErrorResponse),
		(status = 500, description = "Storage failure", body = ErrorResponse)
	),
	tag = "audit"
)]
pub async fn ingest_event(
	State(state): State<AppState>,
	headers: HeaderMap,
	extensions: Extensions,
	payload: Result<Json<AuditEventRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<IngestResponse>), ServerError> {
	let Json(request) = payload?;
	let peer = extensions
		.get::<ConnectInfo<SocketAddr>>()
		.map(|ConnectInfo(addr)| *addr);
	let metadata = request_metadata(&headers, peer);

	let result = state.pipeline.ingest(request, metadata).await?;

	let status = if result.deduped {
		StatusCode::OK
	} else {
		StatusCode::ACCEPTED
	};
	Ok((status, Json(result.into())))
}

#[utoipa::path(
	get,
	path = "/audit/events",
	params(ListEventsParams),
	responses(
		(status = 200, description = "One page of events", body = AuditEventPage),
		(status = 400, description = "Malformed query string", body = ErrorResponse),
		(status = 401, description = "Missing or invalid API key", body = ErrorResponse)
	),
	tag = "audit"
)]
pub async fn list_events(
	State(state): State<AppState>,
	params: Result<Query<ListEventsParams>, QueryRejection>,
) -> Result<Json<AuditEventPage>, ServerError> {
	let Query(params) = params?;
	let page = state.query.page_request(
		params.page,
		params.size,
		params.sort_by.as_deref(),
		params.sort_order.as_deref(),
	);

	let result = state.query.list(page).await?;
	Ok(Json(result.into()))
}

#[utoipa::path(
	get,
	path = "/audit/events/search",
	params(SearchEventsParams),
	responses(
		(status = 200, description = "One page of matching events", body = AuditEventPage),
		(status = 400, description = "Malformed query string", body = ErrorResponse),
		(status = 401, description = "Missing or invalid API key", body = ErrorResponse)
	),
	tag = "audit"
)]
pub async fn search_events(
	State(state): State<AppState>,
	params: Result<Query<SearchEventsParams>, QueryRejection>,
) -> Result<Json<AuditEventPage>, ServerError> {
	let Query(params) = params?;
	let criteria = params.criteria();
	let page = state.query.page_request(
		params.page,
		params.size,
		params.sort_by.as_deref(),
		params.sort_order.as_deref(),
	);

	let result = state.query.search(&criteria, page).await?;
	Ok(Json(result.into()))
}

#[utoipa::path(
	get,
	path = "/audit/events/{id}",
	params(("id" = String, Path, description = "Event UUID")),
	responses(
		(status = 200, description = "The event", body = AuditEventResponse),
		(status = 400, description = "Malformed id", body = ErrorResponse),
		(status = 401, description = "Missing or invalid API key", body = ErrorResponse),
		(status = 404, description = "No event with that id", body = ErrorResponse)
	),
	tag = "audit"
)]
pub async fn get_event(
	State(state): State<AppState>,
	id: Result<Path<String>, PathRejection>,
) -> Result<Json<AuditEventResponse>, ServerError> {
	let Path(raw) = id?;
	let id = Uuid::parse_str(raw.trim())
		.map_err(|_| ServerError::BadRequest(format!("Invalid event id: {raw}")))?;

	match state.query.get(id).await? {
		Some(event) => Ok(Json(event.into())),
		None => Err(ServerError::NotFound(id.to_string())),
	}
}
