// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Bearer token authentication.
//!
//! Tokens come from configuration as `principal_id:role:token`. Only their
//! SHA-256 digests are kept in memory, and lookups hash the presented token
//! the same way. Token values are never logged.

use std::collections::HashMap;

use axum::{
	extract::FromRequestParts,
	http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use beacon_issues_core::{IssueError, Principal, Role};
use beacon_server_config::AuthConfig;
use sha2::{Digest, Sha256};
use tracing::instrument;

use crate::api::AppState;
use crate::error::ApiError;

/// Principals keyed by the hex SHA-256 digest of their token.
#[derive(Debug, Clone, Default)]
pub struct TokenRegistry {
	principals: HashMap<String, Principal>,
}

impl TokenRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn from_config(config: &AuthConfig) -> Result<Self, IssueError> {
		let mut registry = Self::new();
		for entry in &config.tokens {
			let role: Role = entry.role.parse()?;
			registry.insert(
				entry.token.expose(),
				Principal::new(entry.principal_id.clone(), role),
			);
		}
		Ok(registry)
	}

	pub fn insert(&mut self, token: &str, principal: Principal) {
		self.principals.insert(token_digest(token), principal);
	}

	pub fn authenticate(&self, token: &str) -> Option<Principal> {
		self.principals.get(&token_digest(token)).cloned()
	}

	pub fn len(&self) -> usize {
		self.principals.len()
	}

	pub fn is_empty(&self) -> bool {
		self.principals.is_empty()
	}
}

fn token_digest(token: &str) -> String {
	hex::encode(Sha256::digest(token.as_bytes()))
}

/// Extract bearer token from the Authorization header.
///
/// Expects the format: `Authorization: Bearer <token>`
#[instrument(level = "trace", skip_all)]
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
	let auth_header = headers.get(AUTHORIZATION)?;
	let auth_str = auth_header.to_str().ok()?;
	auth_str
		.strip_prefix("Bearer ")
		.map(str::trim)
		.filter(|token| !token.is_empty())
		.map(|token| token.to_string())
}

/// Extractor that rejects requests without a known bearer token.
///
/// ```ignore
/// async fn handler(RequireAuth(principal): RequireAuth) -> impl IntoResponse {
///     principal.id
/// }
/// ```
#[derive(Debug, Clone)]
pub struct RequireAuth(pub Principal);

impl FromRequestParts<AppState> for RequireAuth {
	type Rejection = ApiError;

	async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
		let Some(token) = extract_bearer_token(&parts.headers) else {
			tracing::debug!(path = %parts.uri.path(), "request without bearer token");
			return Err(ApiError::Unauthorized);
		};

		match state.tokens.authenticate(&token) {
			Some(principal) => Ok(RequireAuth(principal)),
			None => {
				tracing::warn!(path = %parts.uri.path(), "unknown bearer token");
				Err(ApiError::Unauthorized)
			}
		}
	}
}
