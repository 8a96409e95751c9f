// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Partial configuration as read from a single source.

use serde::Deserialize;

use crate::sections::{
	AuthConfigLayer, DatabaseConfigLayer, HttpConfigLayer, IssuesConfigLayer, LoggingConfigLayer,
	SmtpConfigLayer,
};

/// One source's view of the configuration. Every section is optional so
/// that later sources only override what they actually set.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerConfigLayer {
	#[serde(default)]
	pub http: Option<HttpConfigLayer>,
	#[serde(default)]
	pub database: Option<DatabaseConfigLayer>,
	#[serde(default)]
	pub logging: Option<LoggingConfigLayer>,
	#[serde(default)]
	pub auth: Option<AuthConfigLayer>,
	#[serde(default)]
	pub issues: Option<IssuesConfigLayer>,
	#[serde(default)]
	pub smtp: Option<SmtpConfigLayer>,
}

fn merge_section<T>(base: &mut Option<T>, other: Option<T>, merge: impl FnOnce(&mut T, T)) {
	let Some(incoming) = other else {
		return;
	};
	if let Some(existing) = base.as_mut() {
		merge(existing, incoming);
	} else {
		*base = Some(incoming);
	}
}

impl ServerConfigLayer {
	/// Overlay `other` on top of `self`. Fields set in `other` win.
	pub fn merge(&mut self, other: ServerConfigLayer) {
		merge_section(&mut self.http, other.http, HttpConfigLayer::merge);
		merge_section(&mut self.database, other.database, DatabaseConfigLayer::merge);
		merge_section(&mut self.logging, other.logging, LoggingConfigLayer::merge);
		merge_section(&mut self.auth, other.auth, AuthConfigLayer::merge);
		merge_section(&mut self.issues, other.issues, IssuesConfigLayer::merge);
		merge_section(&mut self.smtp, other.smtp, SmtpConfigLayer::merge);
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_merge_fills_missing_sections() {
		let mut base = ServerConfigLayer::default();
		base.merge(ServerConfigLayer {
			database: Some(DatabaseConfigLayer {
				url: Some("sqlite::memory:".to_string()),
			}),
			..Default::default()
		});
		assert_eq!(
			base.database.and_then(|d| d.url).as_deref(),
			Some("sqlite::memory:")
		);
		assert!(base.http.is_none());
	}

	#[test]
	fn test_merge_later_layer_wins_per_field() {
		let mut base: ServerConfigLayer = toml::from_str(
			r#"
			[http]
			host = "127.0.0.1"
			port = 9000

			[issues]
			max_page_size = 50
			"#,
		)
		.unwrap();
		let env: ServerConfigLayer = toml::from_str(
			r#"
			[http]
			port = 9100
			"#,
		)
		.unwrap();
		base.merge(env);

		let http = base.http.unwrap();
		assert_eq!(http.host.as_deref(), Some("127.0.0.1"));
		assert_eq!(http.port, Some(9100));
		assert_eq!(base.issues.unwrap().max_page_size, Some(50));
	}

	#[test]
	fn test_empty_section_does_not_clear() {
		let mut base = ServerConfigLayer {
			logging: Some(LoggingConfigLayer {
				level: Some("debug".to_string()),
				format: None,
			}),
			..Default::default()
		};
		base.merge(ServerConfigLayer {
			logging: Some(LoggingConfigLayer::default()),
			..Default::default()
		});
		assert_eq!(base.logging.unwrap().level.as_deref(), Some("debug"));
	}
}
