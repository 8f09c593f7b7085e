// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! HTTP-level tests driving the full router against an on-disk SQLite database.

use auditsink_config::{AuthConfig, DatabaseConfig, SecretString, ServerConfig};
use auditsink_server::{create_app_state, create_router};
use auditsink_server_db::{create_pool, run_migrations};
use axum::{
	body::Body,
	http::{Request, StatusCode},
	Router,
};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

async fn setup_test_app(api_key: Option<&str>) -> (Router, TempDir) {
	let dir = tempfile::tempdir().unwrap();
	let config = ServerConfig {
		database: DatabaseConfig {
			url: format!("sqlite:{}?mode=rwc", dir.path().join("test.db").display()),
			..Default::default()
		},
		auth: AuthConfig {
			api_key: api_key.map(|k| SecretString::new(k.to_string())),
		},
		..Default::default()
	};

	let pool = create_pool(&config.database).await.unwrap();
	run_migrations(&pool).await.unwrap();
	let state = create_app_state(pool, &config).unwrap();
	(create_router(state), dir)
}

fn event_body(correlation: &str, occurred_at: &str) -> Value {
	json!({
		"producerId": "payments",
		"occurredAtUtc": occurred_at,
		"action": "refund.issue",
		"outcome": "success",
		"subject": {"type": "order", "id": "o-42"},
		"actor": {"id": "u-7", "type": "user", "roles": ["support"], "tenantId": "acme"},
		"correlationId": correlation,
		"payload": {"argumentsRedacted": {"amount": 10, "apiKey": "sk-live"}}
	})
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
	Request::builder()
		.method("POST")
		.uri(uri)
		.header("content-type", "application/json")
		.body(Body::from(body.to_string()))
		.unwrap()
}

fn get(uri: &str) -> Request<Body> {
	Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
	let response = app.clone().oneshot(request).await.unwrap();
	let status = response.status();
	let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
		.await
		.unwrap();
	let body = if bytes.is_empty() {
		Value::Null
	} else {
		serde_json::from_slice(&bytes).unwrap_or_else(|_| {
			Value::String(String::from_utf8_lossy(&bytes).to_string())
		})
	};
	(status, body)
}

#[tokio::test]
async fn test_ingest_then_duplicate_returns_original_id() {
	let (app, _dir) = setup_test_app(None).await;

	let (status, first) = send(
		&app,
		post_json("/audit/events", &event_body("c-1", "2025-03-01T10:00:00Z")),
	)
	.await;
	assert_eq!(status, StatusCode::ACCEPTED);
	assert_eq!(first["deduped"], false);

	let (status, second) = send(
		&app,
		post_json("/audit/events", &event_body("c-1", "2025-03-01T11:30:00Z")),
	)
	.await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(second["deduped"], true);
	assert_eq!(second["eventId"], first["eventId"]);
}

#[tokio::test]
async fn test_stored_event_is_redacted_and_readable() {
	let (app, _dir) = setup_test_app(None).await;

	let (_, ingested) = send(
		&app,
		post_json("/audit/events", &event_body("c-2", "2025-03-01T10:00:00Z")),
	)
	.await;
	let id = ingested["eventId"].as_str().unwrap();

	let (status, event) = send(&app, get(&format!("/audit/events/{id}"))).await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(event["id"], id);
	assert_eq!(event["tenantId"], "acme");
	let args = event["argumentsRedacted"].as_str().unwrap();
	assert!(args.contains("\"apiKey\":\"***\""));
	assert!(!args.contains("sk-live"));
}

#[tokio::test]
async fn test_missing_fields_are_rejected_with_400() {
	let (app, _dir) = setup_test_app(None).await;

	let body = json!({"producerId": "payments", "subject": {"type": "order"}});
	let (status, err) = send(&app, post_json("/audit/events", &body)).await;
	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(err["error"], "validation_failed");
	let message = err["message"].as_str().unwrap();
	assert!(message.contains("action must not be blank"));
	assert!(message.contains("subject.id must not be blank"));
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
	let (app, _dir) = setup_test_app(None).await;

	let request = Request::builder()
		.method("POST")
		.uri("/audit/events")
		.header("content-type", "application/json")
		.body(Body::from("{not json"))
		.unwrap();
	let (status, err) = send(&app, request).await;
	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(err["error"], "bad_request");
}

#[tokio::test]
async fn test_get_unknown_and_malformed_ids() {
	let (app, _dir) = setup_test_app(None).await;

	let (status, err) = send(
		&app,
		get("/audit/events/00000000-0000-4000-8000-000000000000"),
	)
	.await;
	assert_eq!(status, StatusCode::NOT_FOUND);
	assert_eq!(err["error"], "not_found");

	let (status, err) = send(&app, get("/audit/events/not-a-uuid")).await;
	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(err["error"], "bad_request");
}

#[tokio::test]
async fn test_list_paginates_with_envelope() {
	let (app, _dir) = setup_test_app(None).await;

	for i in 0..5 {
		let (status, _) = send(
			&app,
			post_json(
				"/audit/events",
				&event_body(&format!("c-{i}"), &format!("2025-03-0{}T10:00:00Z", i + 1)),
			),
		)
		.await;
		assert_eq!(status, StatusCode::ACCEPTED);
	}

	let (status, page) = send(&app, get("/audit/events?page=1&size=2")).await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(page["totalElements"], 5);
	assert_eq!(page["totalPages"], 3);
	assert_eq!(page["page"], 1);
	assert_eq!(page["first"], false);
	assert_eq!(page["last"], false);
	assert_eq!(page["content"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_search_by_tenant_and_from_date() {
	let (app, _dir) = setup_test_app(None).await;

	for (i, day) in ["2025-01-10", "2025-02-10", "2025-03-10"].iter().enumerate() {
		send(
			&app,
			post_json(
				"/audit/events",
				&event_body(&format!("s-{i}"), &format!("{day}T08:00:00Z")),
			),
		)
		.await;
	}

	let (status, page) = send(
		&app,
		get("/audit/events/search?tenantId=acme&fromDate=2025-02-01T00:00:00Z&sortBy=occurred_at_utc&sortOrder=asc"),
	)
	.await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(page["totalElements"], 2);
	let content = page["content"].as_array().unwrap();
	assert_eq!(content[0]["correlationId"], "s-1");
	assert_eq!(content[1]["correlationId"], "s-2");

	let (_, page) = send(&app, get("/audit/events/search?tenantId=globex")).await;
	assert_eq!(page["totalElements"], 0);
	assert_eq!(page["first"], true);
	assert_eq!(page["last"], true);
}

#[tokio::test]
async fn test_malformed_query_is_bad_request() {
	let (app, _dir) = setup_test_app(None).await;

	let (status, err) = send(&app, get("/audit/events?page=minus-one")).await;
	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(err["error"], "bad_request");
}

#[tokio::test]
async fn test_api_key_guards_audit_routes_only() {
	let (app, _dir) = setup_test_app(Some("k-123")).await;

	let (status, err) = send(&app, get("/audit/events")).await;
	assert_eq!(status, StatusCode::UNAUTHORIZED);
	assert_eq!(err["error"], "unauthorized");

	let request = Request::builder()
		.uri("/audit/events")
		.header("x-api-key", "wrong")
		.body(Body::empty())
		.unwrap();
	let (status, _) = send(&app, request).await;
	assert_eq!(status, StatusCode::UNAUTHORIZED);

	let request = Request::builder()
		.uri("/audit/events")
		.header("x-api-key", "k-123")
		.body(Body::empty())
		.unwrap();
	let (status, _) = send(&app, request).await;
	assert_eq!(status, StatusCode::OK);

	let (status, _) = send(&app, get("/health")).await;
	assert_eq!(status, StatusCode::OK);
	let (status, _) = send(&app, get("/metrics")).await;
	assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_health_reports_database() {
	let (app, _dir) = setup_test_app(None).await;

	for uri in ["/health", "/audit/health"] {
		let (status, body) = send(&app, get(uri)).await;
		assert_eq!(status, StatusCode::OK);
		assert_eq!(body["status"], "healthy");
		assert_eq!(body["database"], "healthy");
	}
}

#[tokio::test]
async fn test_metrics_count_ingestion_outcomes() {
	let (app, _dir) = setup_test_app(None).await;

	let body = event_body("m-1", "2025-03-01T10:00:00Z");
	send(&app, post_json("/audit/events", &body)).await;
	send(&app, post_json("/audit/events", &body)).await;
	send(&app, post_json("/audit/events", &json!({}))).await;

	let response = app.clone().oneshot(get("/metrics")).await.unwrap();
	assert_eq!(response.status(), StatusCode::OK);
	let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
		.await
		.unwrap();
	let text = String::from_utf8(bytes.to_vec()).unwrap();
	assert!(text.contains("auditsink_events_received_total 3"));
	assert!(text.contains("auditsink_events_ingested_total 1"));
	assert!(text.contains("auditsink_events_deduplicated_total 1"));
	assert!(text.contains("auditsink_events_rejected_total 1"));
}

#[tokio::test]
async fn test_openapi_document_is_served() {
	let (app, _dir) = setup_test_app(None).await;

	let (status, doc) = send(&app, get("/api/openapi.json")).await;
	assert_eq!(status, StatusCode::OK);
	assert!(doc["paths"]["/audit/events"].is_object());
}
