// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Layered configuration for the audit sink server.
//!
//! Settings are merged from built-in defaults, an optional TOML file and
//! `AUDITSINK_*` environment variables, in that order, then validated.
//!
//! ```ignore
//! use auditsink_config::load_config;
//!
//! let config = load_config()?;
//! println!("listening on {}", config.socket_addr());
//! ```

pub mod error;
pub mod layer;
pub mod secret;
pub mod sections;
pub mod sources;

pub use error::ConfigError;
pub use layer::ServerConfigLayer;
pub use secret::{load_secret_env, Secret, SecretString};
pub use sections::*;
pub use sources::{ConfigSource, DefaultsSource, EnvSource, Precedence, TomlSource};

use tracing::{debug, info};

/// Fully resolved server configuration.
#[derive(Debug, Clone, Default)]
pub struct ServerConfig {
	pub http: HttpConfig,
	pub database: DatabaseConfig,
	pub redaction: RedactionConfig,
	pub ingest: IngestConfig,
	pub query: QueryConfig,
	pub auth: AuthConfig,
	pub logging: LoggingConfig,
}

impl ServerConfig {
	/// Get the socket address string for binding.
	pub fn socket_addr(&self) -> String {
		format!("{}:{}", self.http.host, self.http.port)
	}
}

/// Load configuration from all sources with standard precedence.
///
/// Precedence (highest to lowest):
/// 1. Environment variables (`AUDITSINK_*`)
/// 2. Config file (`/etc/auditsink/server.toml`)
/// 3. Built-in defaults
pub fn load_config() -> Result<ServerConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::system()),
		Box::new(EnvSource),
	])
}

/// Load configuration with a custom config file path.
pub fn load_config_with_file(
	config_path: impl Into<std::path::PathBuf>,
) -> Result<ServerConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::new(config_path)),
		Box::new(EnvSource),
	])
}

/// Load configuration from environment only.
pub fn load_config_from_env() -> Result<ServerConfig, ConfigError> {
	load_from_sources(vec![Box::new(DefaultsSource), Box::new(EnvSource)])
}

fn load_from_sources(mut sources: Vec<Box<dyn ConfigSource>>) -> Result<ServerConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = ServerConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		merged.merge(source.load()?);
	}

	finalize(merged)
}

/// Resolve a merged layer into a validated configuration.
pub fn finalize(layer: ServerConfigLayer) -> Result<ServerConfig, ConfigError> {
	let config = ServerConfig {
		http: layer.http.unwrap_or_default().finalize(),
		database: layer.database.unwrap_or_default().finalize(),
		redaction: layer.redaction.unwrap_or_default().finalize(),
		ingest: layer.ingest.unwrap_or_default().finalize(),
		query: layer.query.unwrap_or_default().finalize(),
		auth: layer.auth.unwrap_or_default().finalize(),
		logging: layer.logging.unwrap_or_default().finalize(),
	};

	validate_config(&config)?;

	info!(
		host = %config.http.host,
		port = config.http.port,
		database = %config.database.url,
		redact_keys = config.redaction.redact_keys.len(),
		max_json_bytes = config.redaction.max_json_bytes,
		max_page_size = config.query.max_page_size,
		api_key_required = config.auth.is_enabled(),
		"Server configuration loaded"
	);

	Ok(config)
}

/// Validate cross-field configuration rules.
fn validate_config(config: &ServerConfig) -> Result<(), ConfigError> {
	if config.redaction.max_json_bytes < MIN_MAX_JSON_BYTES {
		return Err(ConfigError::Validation(format!(
			"redaction.max_json_bytes must be at least {MIN_MAX_JSON_BYTES}, got {}",
			config.redaction.max_json_bytes
		)));
	}

	if config.query.default_page_size == 0 {
		return Err(ConfigError::Validation(
			"query.default_page_size must be at least 1".to_string(),
		));
	}

	if config.query.max_page_size < config.query.default_page_size {
		return Err(ConfigError::Validation(format!(
			"query.max_page_size ({}) must not be smaller than query.default_page_size ({})",
			config.query.max_page_size, config.query.default_page_size
		)));
	}

	if config.ingest.lookup_max_attempts == 0 {
		return Err(ConfigError::Validation(
			"ingest.lookup_max_attempts must be at least 1".to_string(),
		));
	}

	if config.database.max_connections == 0 {
		return Err(ConfigError::Validation(
			"database.max_connections must be at least 1".to_string(),
		));
	}

	Ok(())
}
