// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sources: built-in defaults, a TOML file and environment variables.

use std::path::PathBuf;

use tracing::{debug, trace};

use crate::error::ConfigError;
use crate::layer::ServerConfigLayer;
use crate::secret::load_secret_env;
use crate::sections::{
	AuthConfigLayer, DatabaseConfigLayer, HttpConfigLayer, IngestConfigLayer, LogFormat,
	LoggingConfigLayer, QueryConfigLayer, RedactionConfigLayer,
};

/// Source precedence levels (higher = overrides lower).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
	Defaults = 10,
	ConfigFile = 20,
	Environment = 50,
}

pub trait ConfigSource: Send + Sync {
	fn name(&self) -> &'static str;
	fn precedence(&self) -> Precedence;
	fn load(&self) -> Result<ServerConfigLayer, ConfigError>;
}

pub struct DefaultsSource;

impl ConfigSource for DefaultsSource {
	fn name(&self) -> &'static str {
		"defaults"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Defaults
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		debug!("loading defaults");
		Ok(ServerConfigLayer::default())
	}
}

/// TOML file source. A missing file yields an empty layer.
pub struct TomlSource {
	path: PathBuf,
}

impl TomlSource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn system() -> Self {
		Self::new("/etc/auditsink/server.toml")
	}
}

impl ConfigSource for TomlSource {
	fn name(&self) -> &'static str {
		"toml-config"
	}

	fn precedence(&self) -> Precedence {
		Precedence::ConfigFile
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		if !self.path.exists() {
			debug!(path = %self.path.display(), "config file not found, skipping");
			return Ok(ServerConfigLayer::default());
		}

		debug!(path = %self.path.display(), "loading config file");
		let content = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::FileRead {
			path: self.path.clone(),
			source: e,
		})?;

		let layer: ServerConfigLayer =
			toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
				path: self.path.clone(),
				source: e,
			})?;

		trace!("parsed config layer from TOML");
		Ok(layer)
	}
}

/// Environment variable source.
///
/// Convention: `AUDITSINK_<SECTION>_<FIELD>`, with the listener and a few
/// common settings using shorter names.
pub struct EnvSource;

impl ConfigSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		debug!("loading environment variables");
		Ok(ServerConfigLayer {
			http: Some(load_http_from_env()?),
			database: Some(load_database_from_env()?),
			redaction: Some(load_redaction_from_env()?),
			ingest: Some(load_ingest_from_env()?),
			query: Some(load_query_from_env()?),
			auth: Some(load_auth_from_env()?),
			logging: Some(load_logging_from_env()?),
		})
	}
}

fn env_var(name: &str) -> Option<String> {
	std::env::var(name).ok().filter(|s| !s.is_empty())
}

fn env_parse<T: std::str::FromStr>(name: &str, kind: &str) -> Result<Option<T>, ConfigError> {
	match env_var(name) {
		Some(v) => v
			.trim()
			.parse()
			.map(Some)
			.map_err(|_| ConfigError::InvalidValue {
				key: name.to_string(),
				message: format!("invalid {kind} value '{v}'"),
			}),
		None => Ok(None),
	}
}

fn env_u16(name: &str) -> Result<Option<u16>, ConfigError> {
	env_parse(name, "u16")
}

fn env_u32(name: &str) -> Result<Option<u32>, ConfigError> {
	env_parse(name, "u32")
}

fn env_u64(name: &str) -> Result<Option<u64>, ConfigError> {
	env_parse(name, "u64")
}

fn env_usize(name: &str) -> Result<Option<usize>, ConfigError> {
	env_parse(name, "usize")
}

fn env_list(name: &str) -> Option<Vec<String>> {
	env_var(name).map(|v| {
		v.split(',')
			.map(|s| s.trim().to_string())
			.filter(|s| !s.is_empty())
			.collect()
	})
}

fn load_http_from_env() -> Result<HttpConfigLayer, ConfigError> {
	Ok(HttpConfigLayer {
		host: env_var("AUDITSINK_HOST"),
		port: env_u16("AUDITSINK_PORT")?,
	})
}

fn load_database_from_env() -> Result<DatabaseConfigLayer, ConfigError> {
	Ok(DatabaseConfigLayer {
		url: env_var("AUDITSINK_DATABASE_URL"),
		max_connections: env_u32("AUDITSINK_DATABASE_MAX_CONNECTIONS")?,
		acquire_timeout_secs: env_u64("AUDITSINK_DATABASE_ACQUIRE_TIMEOUT_SECS")?,
		busy_timeout_ms: env_u64("AUDITSINK_DATABASE_BUSY_TIMEOUT_MS")?,
	})
}

fn load_redaction_from_env() -> Result<RedactionConfigLayer, ConfigError> {
	Ok(RedactionConfigLayer {
		redact_keys: env_list("AUDITSINK_REDACT_KEYS"),
		max_json_bytes: env_usize("AUDITSINK_PAYLOAD_MAX_JSON_BYTES")?,
	})
}

fn load_ingest_from_env() -> Result<IngestConfigLayer, ConfigError> {
	Ok(IngestConfigLayer {
		lookup_max_attempts: env_u32("AUDITSINK_INGEST_LOOKUP_MAX_ATTEMPTS")?,
		lookup_base_delay_ms: env_u64("AUDITSINK_INGEST_LOOKUP_BASE_DELAY_MS")?,
		lookup_max_delay_ms: env_u64("AUDITSINK_INGEST_LOOKUP_MAX_DELAY_MS")?,
	})
}

fn load_query_from_env() -> Result<QueryConfigLayer, ConfigError> {
	Ok(QueryConfigLayer {
		default_page_size: env_u32("AUDITSINK_QUERY_DEFAULT_PAGE_SIZE")?,
		max_page_size: env_u32("AUDITSINK_QUERY_MAX_PAGE_SIZE")?,
	})
}

fn load_auth_from_env() -> Result<AuthConfigLayer, ConfigError> {
	let api_key =
		load_secret_env("AUDITSINK_API_KEY").map_err(|e| ConfigError::Secret(e.to_string()))?;
	Ok(AuthConfigLayer { api_key })
}

fn load_logging_from_env() -> Result<LoggingConfigLayer, ConfigError> {
	let format = match env_var("AUDITSINK_LOG_FORMAT") {
		Some(v) => match v.to_lowercase().as_str() {
			"json" => Some(LogFormat::Json),
			"pretty" | "text" => Some(LogFormat::Pretty),
			_ => {
				return Err(ConfigError::InvalidValue {
					key: "AUDITSINK_LOG_FORMAT".to_string(),
					message: format!("expected 'pretty' or 'json', got '{v}'"),
				})
			}
		},
		None => None,
	};

	Ok(LoggingConfigLayer {
		level: env_var("AUDITSINK_LOG_LEVEL"),
		format,
	})
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_precedence_ordering() {
		assert!(Precedence::Environment > Precedence::ConfigFile);
		assert!(Precedence::ConfigFile > Precedence::Defaults);
	}

	#[test]
	fn test_defaults_source_returns_empty_layer() {
		let layer = DefaultsSource.load().unwrap();
		assert!(layer.http.is_none());
		assert!(layer.database.is_none());
	}

	#[test]
	fn test_toml_source_missing_file_returns_empty() {
		let layer = TomlSource::new("/nonexistent/auditsink.toml").load().unwrap();
		assert!(layer.http.is_none());
	}

	#[test]
	fn test_toml_source_reads_file() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("server.toml");
		std::fs::write(&path, "[query]\nmax_page_size = 50\n").unwrap();

		let layer = TomlSource::new(&path).load().unwrap();
		assert_eq!(layer.query.unwrap().max_page_size, Some(50));
	}

	#[test]
	fn test_toml_source_invalid_file_errors() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("server.toml");
		std::fs::write(&path, "[http\nport = ").unwrap();

		let err = TomlSource::new(&path).load().unwrap_err();
		assert!(matches!(err, ConfigError::TomlParse { .. }));
	}

	#[test]
	fn test_env_parse_rejects_garbage() {
		std::env::set_var("AUDITSINK_TEST_PARSE_U16", "not-a-port");
		let result = env_u16("AUDITSINK_TEST_PARSE_U16");
		std::env::remove_var("AUDITSINK_TEST_PARSE_U16");
		assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
	}

	#[test]
	fn test_env_list_splits_and_trims() {
		std::env::set_var("AUDITSINK_TEST_LIST", "password, ssn ,,token");
		let keys = env_list("AUDITSINK_TEST_LIST");
		std::env::remove_var("AUDITSINK_TEST_LIST");
		assert_eq!(
			keys,
			Some(vec![
				"password".to_string(),
				"ssn".to_string(),
				"token".to_string()
			])
		);
	}
}
