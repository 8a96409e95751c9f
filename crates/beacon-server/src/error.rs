// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! HTTP error mapping.

use axum::{http::StatusCode, response::IntoResponse, Json};
use beacon_server_issues::IssueServerError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Body of every error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
	pub error: String,
	pub message: String,
}

#[derive(Debug, Error)]
pub enum ApiError {
	#[error("{0}")]
	BadRequest(String),

	#[error("missing or invalid bearer token")]
	Unauthorized,

	#[error("admin role required")]
	Forbidden,

	#[error("{0}")]
	NotFound(String),

	#[error("{0}")]
	Conflict(String),

	#[error("internal server error")]
	Internal,
}

impl ApiError {
	pub fn status(&self) -> StatusCode {
		match self {
			ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
			ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
			ApiError::Forbidden => StatusCode::FORBIDDEN,
			ApiError::NotFound(_) => StatusCode::NOT_FOUND,
			ApiError::Conflict(_) => StatusCode::CONFLICT,
			ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}

	pub fn code(&self) -> &'static str {
		match self {
			ApiError::BadRequest(_) => "bad_request",
			ApiError::Unauthorized => "unauthorized",
			ApiError::Forbidden => "forbidden",
			ApiError::NotFound(_) => "not_found",
			ApiError::Conflict(_) => "conflict",
			ApiError::Internal => "internal_error",
		}
	}

	pub fn issue_not_found() -> Self {
		ApiError::NotFound("issue not found".to_string())
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> axum::response::Response {
		let body = ErrorResponse {
			error: self.code().to_string(),
			message: self.to_string(),
		};
		(self.status(), Json(body)).into_response()
	}
}

impl From<IssueServerError> for ApiError {
	fn from(e: IssueServerError) -> Self {
		match e {
			IssueServerError::InvalidInput(e) => ApiError::BadRequest(e.to_string()),
			IssueServerError::InvalidUuid(e) => ApiError::BadRequest(format!("invalid id: {e}")),
			IssueServerError::Parse(message) => ApiError::BadRequest(message),
			IssueServerError::Forbidden => ApiError::Forbidden,
			IssueServerError::Conflict(message) => ApiError::Conflict(message),
			e @ (IssueServerError::Database(_)
			| IssueServerError::Serialization(_)
			| IssueServerError::InvalidDateTime(_)) => {
				tracing::error!(error = %e, "issue store failure");
				ApiError::Internal
			}
		}
	}
}
