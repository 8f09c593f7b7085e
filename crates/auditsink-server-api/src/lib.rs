// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

pub mod error;
pub mod events;
pub mod health;

pub use error::ErrorResponse;
pub use events::{
	AuditEventPage, AuditEventResponse, IngestResponse, ListEventsParams, SearchEventsParams,
};
pub use health::{HealthResponse, HealthStatus};
