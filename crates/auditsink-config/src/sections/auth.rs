// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Shared API key configuration.

use crate::secret::SecretString;

/// Resolved auth configuration. `None` leaves the API open.
#[derive(Debug, Clone, Default)]
pub struct AuthConfig {
	pub api_key: Option<SecretString>,
}

impl AuthConfig {
	pub fn is_enabled(&self) -> bool {
		self.api_key.is_some()
	}
}

#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct AuthConfigLayer {
	#[serde(default)]
	pub api_key: Option<SecretString>,
}

impl AuthConfigLayer {
	pub fn merge(&mut self, other: AuthConfigLayer) {
		if other.api_key.is_some() {
			self.api_key = other.api_key;
		}
	}

	pub fn finalize(self) -> AuthConfig {
		AuthConfig {
			api_key: self.api_key.filter(|k| !k.expose().trim().is_empty()),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_blank_key_disables_auth() {
		let config = AuthConfigLayer {
			api_key: Some(SecretString::new("   ".to_string())),
		}
		.finalize();
		assert!(!config.is_enabled());
	}

	#[test]
	fn test_key_from_toml_is_redacted_in_debug() {
		let layer: AuthConfigLayer = toml::from_str(r#"api_key = "k-123""#).unwrap();
		let config = layer.finalize();
		assert!(config.is_enabled());
		assert!(!format!("{config:?}").contains("k-123"));
	}
}
