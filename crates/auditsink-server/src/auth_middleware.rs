// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Shared API key check for the audit routes.

use axum::{
	extract::{Request, State},
	middleware::Next,
	response::Response,
};
use subtle::ConstantTimeEq;
use tracing::warn;

use crate::{api::AppState, error::ServerError};

pub const API_KEY_HEADER: &str = "x-api-key";

/// Rejects requests whose `X-Api-Key` does not match the configured key.
/// Passes everything through when no key is configured.
pub async fn require_api_key(
	State(state): State<AppState>,
	request: Request,
	next: Next,
) -> Result<Response, ServerError> {
	let Some(expected) = state.api_key.as_ref() else {
		return Ok(next.run(request).await);
	};

	let Some(provided) = request
		.headers()
		.get(API_KEY_HEADER)
		.and_then(|h| h.to_str().ok())
	else {
		warn!(path = %request.uri().path(), "api key missing");
		return Err(ServerError::Unauthorized("missing API key".to_string()));
	};

	if key_matches(expected.expose().as_bytes(), provided.trim().as_bytes()) {
		Ok(next.run(request).await)
	} else {
		warn!(path = %request.uri().path(), "api key rejected");
		Err(ServerError::Unauthorized("invalid API key".to_string()))
	}
}

fn key_matches(expected: &[u8], provided: &[u8]) -> bool {
	if expected.len() != provided.len() {
		return false;
	}
	expected.ct_eq(provided).into()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_key_matches() {
		assert!(key_matches(b"s3cret", b"s3cret"));
		assert!(!key_matches(b"s3cret", b"s3creT"));
		assert!(!key_matches(b"s3cret", b"s3cre"));
		assert!(!key_matches(b"s3cret", b""));
	}
}
