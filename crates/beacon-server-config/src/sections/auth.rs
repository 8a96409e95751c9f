// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! API token configuration.
//!
//! Each token is written as `principal_id:role:token`, where role is
//! `admin` or `user`. The token part may itself contain `:`.

use std::collections::HashSet;

use beacon_server_smtp::SecretString;
use serde::Deserialize;

use crate::error::ConfigError;

/// Role names accepted in token entries.
pub const ROLES: &[&str] = &["admin", "user"];

/// A bearer token mapped to the principal it authenticates.
#[derive(Debug, Clone)]
pub struct ApiToken {
	pub principal_id: String,
	pub role: String,
	pub token: SecretString,
}

impl ApiToken {
	/// Parse a single `principal_id:role:token` entry.
	pub fn parse(entry: &str) -> Result<Self, ConfigError> {
		let invalid = |message: &str| ConfigError::InvalidValue {
			key: "auth.tokens".to_string(),
			message: message.to_string(),
		};

		let mut parts = entry.trim().splitn(3, ':');
		let principal_id = parts.next().unwrap_or_default().trim();
		let role = parts
			.next()
			.ok_or_else(|| invalid("expected principal_id:role:token"))?
			.trim()
			.to_ascii_lowercase();
		let token = parts
			.next()
			.ok_or_else(|| invalid("expected principal_id:role:token"))?
			.trim();

		if principal_id.is_empty() {
			return Err(invalid("principal id must not be empty"));
		}
		if !ROLES.contains(&role.as_str()) {
			return Err(invalid(&format!(
				"unknown role '{role}' for principal '{principal_id}'"
			)));
		}
		if token.is_empty() {
			return Err(invalid(&format!(
				"token for principal '{principal_id}' must not be empty"
			)));
		}

		Ok(Self {
			principal_id: principal_id.to_string(),
			role,
			token: SecretString::new(token.to_string()),
		})
	}
}

#[derive(Debug, Clone, Default)]
pub struct AuthConfig {
	pub tokens: Vec<ApiToken>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthConfigLayer {
	#[serde(default)]
	pub tokens: Option<Vec<String>>,
}

impl AuthConfigLayer {
	pub fn merge(&mut self, other: AuthConfigLayer) {
		if other.tokens.is_some() {
			self.tokens = other.tokens;
		}
	}

	pub fn finalize(self) -> Result<AuthConfig, ConfigError> {
		let tokens = self
			.tokens
			.unwrap_or_default()
			.iter()
			.filter(|entry| !entry.trim().is_empty())
			.map(|entry| ApiToken::parse(entry))
			.collect::<Result<Vec<_>, _>>()?;

		let mut seen = HashSet::new();
		for token in &tokens {
			if !seen.insert(token.token.expose()) {
				return Err(ConfigError::Validation(format!(
					"duplicate API token configured for principal '{}'",
					token.principal_id
				)));
			}
		}

		Ok(AuthConfig { tokens })
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_parse_entry() {
		let token = ApiToken::parse("alice:admin:s3cret").unwrap();
		assert_eq!(token.principal_id, "alice");
		assert_eq!(token.role, "admin");
		assert_eq!(token.token.expose(), "s3cret");
	}

	#[test]
	fn test_token_may_contain_colons() {
		let token = ApiToken::parse("ci:user:abc:def").unwrap();
		assert_eq!(token.token.expose(), "abc:def");
	}

	#[test]
	fn test_role_is_case_insensitive() {
		assert_eq!(ApiToken::parse("bob:USER:t").unwrap().role, "user");
	}

	#[test]
	fn test_rejects_malformed_entries() {
		for entry in ["alice", "alice:admin", ":admin:t", "alice:root:t", "alice:admin:"] {
			assert!(
				matches!(ApiToken::parse(entry), Err(ConfigError::InvalidValue { .. })),
				"expected {entry:?} to be rejected"
			);
		}
	}

	#[test]
	fn test_debug_redacts_token() {
		let token = ApiToken::parse("alice:admin:hunter2").unwrap();
		let debug = format!("{token:?}");
		assert!(!debug.contains("hunter2"));
		assert!(debug.contains("alice"));
	}

	#[test]
	fn test_finalize_skips_blank_entries() {
		let layer = AuthConfigLayer {
			tokens: Some(vec!["alice:admin:a".to_string(), "  ".to_string()]),
		};
		assert_eq!(layer.finalize().unwrap().tokens.len(), 1);
	}

	#[test]
	fn test_finalize_rejects_duplicate_tokens() {
		let layer = AuthConfigLayer {
			tokens: Some(vec!["alice:admin:same".to_string(), "bob:user:same".to_string()]),
		};
		assert!(matches!(layer.finalize(), Err(ConfigError::Validation(_))));
	}

	#[test]
	fn test_no_tokens_by_default() {
		assert!(AuthConfigLayer::default().finalize().unwrap().tokens.is_empty());
	}
}
