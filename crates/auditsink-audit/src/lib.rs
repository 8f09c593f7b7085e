// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Audit event ingestion and query core.
//!
//! This crate provides:
//! - The inbound event model and the persisted [`AuditEvent`] record
//! - Key-based payload redaction with a byte cap ([`RedactionEngine`])
//! - Server-derived idempotency keys and a deduplicating [`IngestionPipeline`]
//! - The [`EventStore`] trait implemented by storage backends
//! - A paged [`QueryEngine`]

pub mod error;
pub mod event;
pub mod fingerprint;
pub mod metrics;
pub mod pipeline;
pub mod query;
pub mod redaction;
pub mod retry;
pub mod store;

#[cfg(test)]
mod testing;

pub use error::{AuditError, AuditResult, StoreError};
pub use event::{
	Actor, AuditEvent, AuditEventRequest, ErrorInfo, EventContext, IngestResult, Payload, Policy,
	RequestMetadata, Subject,
};
pub use fingerprint::derive_idempotency_key;
pub use metrics::{CountingMetrics, IngestMetrics, MetricsSnapshot, NoopMetrics};
pub use pipeline::IngestionPipeline;
pub use query::{Page, QueryEngine};
pub use redaction::{RedactionEngine, MASK};
pub use retry::RetryConfig;
pub use store::{EventStore, PageRequest, SearchCriteria, SortField, SortOrder};
