// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use tempfile::TempDir;

use crate::pool::{create_pool, run_migrations};

/// Single-connection in-memory pool with the issue schema.
pub async fn create_issue_test_pool() -> SqlitePool {
	let pool = SqlitePoolOptions::new()
		.max_connections(1)
		.connect(":memory:")
		.await
		.unwrap();
	run_migrations(&pool).await.unwrap();
	pool
}

/// File-backed WAL pool for tests that need concurrent writers.
pub async fn create_file_test_pool() -> (SqlitePool, TempDir) {
	let dir = tempfile::tempdir().unwrap();
	let db_url = format!("sqlite:{}", dir.path().join("issues.db").display());
	let pool = create_pool(&db_url).await.unwrap();
	run_migrations(&pool).await.unwrap();
	(pool, dir)
}
