// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! HTTP server for audit event ingestion and query.
//!
//! Exposes the ingestion pipeline and query engine from `auditsink-audit`
//! over axum, backed by the SQLite repository from `auditsink-server-db`.

pub mod api;
pub mod api_docs;
pub mod auth_middleware;
pub mod client_info;
pub mod error;
pub mod metrics;
pub mod routes;

pub use api::{create_app_state, create_router, AppState};
pub use error::ServerError;
pub use metrics::IngestPrometheusMetrics;
