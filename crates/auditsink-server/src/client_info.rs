// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Request metadata extraction.
//!
//! Pulls the client address, user agent and correlation headers off an
//! incoming request so the ingestion pipeline can record them alongside the
//! event body.

use std::net::SocketAddr;

use auditsink_audit::RequestMetadata;
use axum::http::HeaderMap;

pub const CORRELATION_ID_HEADER: &str = "x-correlation-id";
pub const TRACEPARENT_HEADER: &str = "traceparent";
pub const TRACE_ID_HEADER: &str = "x-trace-id";

/// Build request metadata from headers, falling back to the peer address.
#[tracing::instrument(level = "debug", skip(headers))]
pub fn request_metadata(headers: &HeaderMap, peer: Option<SocketAddr>) -> RequestMetadata {
	let client_ip = extract_client_ip(headers).or_else(|| peer.map(|addr| addr.ip().to_string()));
	let user_agent = header_value(headers, "user-agent");
	let correlation_id = header_value(headers, CORRELATION_ID_HEADER);
	let trace_id = header_value(headers, TRACEPARENT_HEADER)
		.or_else(|| header_value(headers, TRACE_ID_HEADER));

	tracing::debug!(ip = ?client_ip, "client metadata extracted");

	RequestMetadata {
		client_ip,
		user_agent,
		correlation_id,
		trace_id,
	}
}

/// Extract client IP from request headers.
///
/// Checks headers in order of preference:
/// 1. `X-Forwarded-For` (first IP in chain, for reverse proxies)
/// 2. `X-Real-IP` (nginx style)
/// 3. `CF-Connecting-IP` (Cloudflare)
fn extract_client_ip(headers: &HeaderMap) -> Option<String> {
	if let Some(xff) = headers.get("x-forwarded-for") {
		if let Ok(xff_str) = xff.to_str() {
			if let Some(first_ip) = xff_str.split(',').next() {
				let ip = first_ip.trim();
				if !ip.is_empty() {
					return Some(ip.to_string());
				}
			}
		}
	}

	header_value(headers, "x-real-ip").or_else(|| header_value(headers, "cf-connecting-ip"))
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
	headers
		.get(name)
		.and_then(|v| v.to_str().ok())
		.map(str::trim)
		.filter(|v| !v.is_empty())
		.map(str::to_string)
}

#[cfg(test)]
mod tests {
	use super::*;
	use axum::http::HeaderValue;

	fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
		let mut map = HeaderMap::new();
		for (name, value) in pairs {
			map.insert(*name, HeaderValue::from_static(value));
		}
		map
	}

	#[test]
	fn test_forwarded_for_takes_first_hop() {
		let h = headers(&[
			("x-forwarded-for", "203.0.113.7, 10.0.0.1"),
			("x-real-ip", "10.0.0.2"),
		]);
		assert_eq!(extract_client_ip(&h).as_deref(), Some("203.0.113.7"));
	}

	#[test]
	fn test_real_ip_then_cloudflare() {
		let h = headers(&[("x-real-ip", " 10.0.0.2 ")]);
		assert_eq!(extract_client_ip(&h).as_deref(), Some("10.0.0.2"));

		let h = headers(&[("cf-connecting-ip", "198.51.100.1")]);
		assert_eq!(extract_client_ip(&h).as_deref(), Some("198.51.100.1"));
	}

	#[test]
	fn test_peer_address_is_last_resort() {
		let peer: SocketAddr = "192.0.2.10:5555".parse().unwrap();
		let meta = request_metadata(&HeaderMap::new(), Some(peer));
		assert_eq!(meta.client_ip.as_deref(), Some("192.0.2.10"));

		let meta = request_metadata(&HeaderMap::new(), None);
		assert!(meta.client_ip.is_none());
	}

	#[test]
	fn test_correlation_and_trace_headers() {
		let h = headers(&[
			("user-agent", "billing-svc/1.2"),
			("x-correlation-id", "corr-1"),
			("traceparent", "00-abc-def-01"),
			("x-trace-id", "ignored"),
		]);
		let meta = request_metadata(&h, None);
		assert_eq!(meta.user_agent.as_deref(), Some("billing-svc/1.2"));
		assert_eq!(meta.correlation_id.as_deref(), Some("corr-1"));
		assert_eq!(meta.trace_id.as_deref(), Some("00-abc-def-01"));

		let h = headers(&[("x-trace-id", "trace-9")]);
		assert_eq!(request_metadata(&h, None).trace_id.as_deref(), Some("trace-9"));
	}
}
