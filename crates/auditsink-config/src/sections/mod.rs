// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sections for the audit sink server.

pub mod auth;
pub mod database;
pub mod http;
pub mod ingest;
pub mod logging;
pub mod query;
pub mod redaction;

pub use auth::{AuthConfig, AuthConfigLayer};
pub use database::{DatabaseConfig, DatabaseConfigLayer};
pub use http::{HttpConfig, HttpConfigLayer};
pub use ingest::{IngestConfig, IngestConfigLayer};
pub use logging::{LogFormat, LoggingConfig, LoggingConfigLayer};
pub use query::{QueryConfig, QueryConfigLayer};
pub use redaction::{RedactionConfig, RedactionConfigLayer, MIN_MAX_JSON_BYTES};
