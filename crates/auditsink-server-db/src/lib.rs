// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! # auditsink-server-db
//!
//! SQLite persistence for audit events via sqlx.
//!
//! [`EventRepository`] holds a `SqlitePool` and implements
//! [`auditsink_audit::EventStore`]. Idempotency is enforced by a `UNIQUE`
//! constraint; a violation surfaces as [`DbError::Conflict`] and maps to
//! `StoreError::Conflict` at the trait boundary.

pub mod error;
pub mod event;
pub mod pool;

#[cfg(test)]
pub mod testing;

pub use error::{DbError, Result};
pub use event::{format_timestamp, EventRepository};
pub use pool::{create_pool, run_migrations};
