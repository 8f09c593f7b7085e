// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Bounded retry with exponential backoff for lookups that may briefly miss.

use std::time::Duration;

use auditsink_config::IngestConfig;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct RetryConfig {
	pub max_attempts: u32,
	pub base_delay: Duration,
	pub max_delay: Duration,
	pub backoff_factor: f64,
	pub jitter: bool,
}

impl Default for RetryConfig {
	fn default() -> Self {
		Self::from(&IngestConfig::default())
	}
}

impl From<&IngestConfig> for RetryConfig {
	fn from(config: &IngestConfig) -> Self {
		Self {
			max_attempts: config.lookup_max_attempts.max(1),
			base_delay: Duration::from_millis(config.lookup_base_delay_ms),
			max_delay: Duration::from_millis(config.lookup_max_delay_ms),
			backoff_factor: 2.0,
			jitter: true,
		}
	}
}

fn calculate_delay(cfg: &RetryConfig, attempt: u32) -> Duration {
	let exponential_delay = cfg.base_delay.as_secs_f64() * cfg.backoff_factor.powi(attempt as i32);
	let capped_delay = exponential_delay.min(cfg.max_delay.as_secs_f64());

	let final_delay = if cfg.jitter {
		let jitter_factor = 0.5 + fastrand::f64();
		capped_delay * jitter_factor
	} else {
		capped_delay
	};

	Duration::from_secs_f64(final_delay)
}

/// Run `f` until it yields `Some`, up to `cfg.max_attempts` times.
///
/// Errors are returned immediately. `Ok(None)` means every attempt missed.
pub async fn retry_until_found<F, Fut, T, E>(cfg: &RetryConfig, mut f: F) -> Result<Option<T>, E>
where
	F: FnMut() -> Fut,
	Fut: std::future::Future<Output = Result<Option<T>, E>>,
{
	let mut attempt = 0;

	loop {
		if let Some(found) = f().await? {
			return Ok(Some(found));
		}

		attempt += 1;
		if attempt >= cfg.max_attempts {
			warn!(
				attempt = attempt,
				max_attempts = cfg.max_attempts,
				"lookup attempts exhausted"
			);
			return Ok(None);
		}

		let delay = calculate_delay(cfg, attempt - 1);
		warn!(
			attempt = attempt,
			max_attempts = cfg.max_attempts,
			delay_ms = delay.as_millis() as u64,
			"lookup missed, retrying"
		);

		tokio::time::sleep(delay).await;
	}
}
