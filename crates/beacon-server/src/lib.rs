// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Beacon error tracking server.
//!
//! This crate provides the HTTP surface over the issue store: error
//! ingestion for any authenticated caller and the admin issue dashboard API.

pub mod api;
pub mod auth_middleware;
pub mod error;
pub mod health;
pub mod jobs;
pub mod routes;
pub mod version;

pub use api::{create_app_state, create_router, AppState};
pub use auth_middleware::{RequireAuth, TokenRegistry};
pub use beacon_server_config::ServerConfig;
pub use error::{ApiError, ErrorResponse};
