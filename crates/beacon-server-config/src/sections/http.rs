// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! HTTP listener configuration.

use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpConfig {
	pub host: String,
	pub port: u16,
}

impl Default for HttpConfig {
	fn default() -> Self {
		Self {
			host: "0.0.0.0".to_string(),
			port: 8080,
		}
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HttpConfigLayer {
	#[serde(default)]
	pub host: Option<String>,
	#[serde(default)]
	pub port: Option<u16>,
}

impl HttpConfigLayer {
	pub fn merge(&mut self, other: HttpConfigLayer) {
		if other.host.is_some() {
			self.host = other.host;
		}
		if other.port.is_some() {
			self.port = other.port;
		}
	}

	pub fn finalize(self) -> HttpConfig {
		let defaults = HttpConfig::default();
		HttpConfig {
			host: self.host.unwrap_or(defaults.host),
			port: self.port.unwrap_or(defaults.port),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_defaults() {
		assert_eq!(HttpConfigLayer::default().finalize(), HttpConfig::default());
	}

	#[test]
	fn test_merge_keeps_unset_fields() {
		let mut base = HttpConfigLayer {
			host: Some("127.0.0.1".to_string()),
			port: Some(9000),
		};
		base.merge(HttpConfigLayer {
			host: None,
			port: Some(9100),
		});
		let config = base.finalize();
		assert_eq!(config.host, "127.0.0.1");
		assert_eq!(config.port, 9100);
	}
}
