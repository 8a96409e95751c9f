// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Integration tests for the issue HTTP API.

use axum::{
	body::Body,
	http::{header, Method, Request, StatusCode},
	Router,
};
use beacon_issues_core::{Issue, IssueStats, IssueStatus};
use beacon_server::{create_app_state, create_router, ServerConfig};
use beacon_server_config::ApiToken;
use serde_json::{json, Value};
use tempfile::tempdir;
use tower::ServiceExt;

const ADMIN_TOKEN: &str = "admin-token";
const USER_TOKEN: &str = "user-token";

/// Creates a test app with an isolated file-backed database.
async fn setup_test_app() -> (Router, tempfile::TempDir) {
	let dir = tempdir().unwrap();
	let db_path = dir.path().join("beacon_test.db");
	let db_url = format!("sqlite:{}", db_path.display());
	let pool = beacon_server_issues::create_pool(&db_url).await.unwrap();
	beacon_server_issues::run_migrations(&pool).await.unwrap();

	let mut config = ServerConfig::default();
	config.auth.tokens = vec![
		ApiToken::parse(&format!("alice:admin:{ADMIN_TOKEN}")).unwrap(),
		ApiToken::parse(&format!("svc:user:{USER_TOKEN}")).unwrap(),
	];
	let state = create_app_state(pool, &config).unwrap();
	(create_router(state), dir)
}

fn request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
	let mut builder = Request::builder().method(method).uri(uri);
	if let Some(token) = token {
		builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
	}
	match body {
		Some(body) => builder
			.header(header::CONTENT_TYPE, "application/json")
			.body(Body::from(body.to_string()))
			.unwrap(),
		None => builder.body(Body::empty()).unwrap(),
	}
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
	let response = app.clone().oneshot(request).await.unwrap();
	let status = response.status();
	let body = axum::body::to_bytes(response.into_body(), usize::MAX)
		.await
		.unwrap();
	let body = if body.is_empty() {
		Value::Null
	} else {
		serde_json::from_slice(&body).unwrap()
	};
	(status, body)
}

async fn log_error(app: &Router, token: &str, body: Value) -> String {
	let (status, body) = send(app, request(Method::POST, "/api/issues", Some(token), Some(body))).await;
	assert_eq!(status, StatusCode::OK, "log_error failed: {body}");
	body["issue_id"].as_str().unwrap().to_string()
}

async fn get_issue(app: &Router, id: &str) -> Issue {
	let (status, body) = send(
		app,
		request(Method::GET, &format!("/api/admin/issues/{id}"), Some(ADMIN_TOKEN), None),
	)
	.await;
	assert_eq!(status, StatusCode::OK);
	serde_json::from_value(body).unwrap()
}

#[tokio::test]
async fn test_health_needs_no_auth() {
	let (app, _dir) = setup_test_app().await;

	let (status, body) = send(&app, request(Method::GET, "/health", None, None)).await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(body["status"], "healthy");
	assert_eq!(body["components"]["database"]["status"], "healthy");
}

#[tokio::test]
async fn test_missing_or_unknown_token_is_401() {
	let (app, _dir) = setup_test_app().await;
	let body = json!({"title": "TypeError", "message": "x is undefined"});

	let (status, error) = send(&app, request(Method::POST, "/api/issues", None, Some(body.clone()))).await;
	assert_eq!(status, StatusCode::UNAUTHORIZED);
	assert_eq!(error["error"], "unauthorized");

	let (status, _) = send(
		&app,
		request(Method::POST, "/api/issues", Some("not-a-token"), Some(body)),
	)
	.await;
	assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_repeated_errors_collapse_into_one_issue() {
	let (app, _dir) = setup_test_app().await;
	let report = json!({
		"title": "TypeError",
		"message": "Cannot read properties of undefined (reading 'id')",
		"stack": "at render (app.js:10:5)\nat main (app.js:99:1)",
		"level": "error",
		"request_path": "/dashboard"
	});

	let first = log_error(&app, USER_TOKEN, report.clone()).await;
	let second = log_error(&app, USER_TOKEN, report).await;
	assert_eq!(first, second);

	let issue = get_issue(&app, &first).await;
	assert_eq!(issue.occurrence_count, 2);
	assert_eq!(issue.status, IssueStatus::Open);
	assert_eq!(issue.user_id.as_deref(), Some("svc"));
}

#[tokio::test]
async fn test_admin_routes_forbid_non_admins() {
	let (app, _dir) = setup_test_app().await;
	let id = log_error(&app, USER_TOKEN, json!({"title": "E", "message": "m"})).await;

	let forbidden = [
		request(Method::GET, "/api/admin/issues", Some(USER_TOKEN), None),
		request(Method::GET, "/api/admin/issues/stats", Some(USER_TOKEN), None),
		request(Method::GET, &format!("/api/admin/issues/{id}"), Some(USER_TOKEN), None),
		request(
			Method::POST,
			&format!("/api/admin/issues/{id}/status"),
			Some(USER_TOKEN),
			Some(json!({"status": "resolved"})),
		),
		request(Method::DELETE, &format!("/api/admin/issues/{id}"), Some(USER_TOKEN), None),
		request(Method::GET, "/api/admin/settings", Some(USER_TOKEN), None),
	];

	for req in forbidden {
		let uri = req.uri().to_string();
		let (status, body) = send(&app, req).await;
		assert_eq!(status, StatusCode::FORBIDDEN, "{uri}");
		assert_eq!(body["error"], "forbidden");
	}
}

#[tokio::test]
async fn test_resolved_issue_reopens_on_recurrence() {
	let (app, _dir) = setup_test_app().await;
	let report = json!({"title": "NullPointerException", "message": "obj is null"});

	let id = log_error(&app, USER_TOKEN, report.clone()).await;

	let (status, body) = send(
		&app,
		request(
			Method::POST,
			&format!("/api/admin/issues/{id}/status"),
			Some(ADMIN_TOKEN),
			Some(json!({"status": "resolved"})),
		),
	)
	.await;
	assert_eq!(status, StatusCode::OK);
	let resolved: Issue = serde_json::from_value(body).unwrap();
	assert_eq!(resolved.status, IssueStatus::Resolved);
	assert_eq!(resolved.resolved_by.as_deref(), Some("alice"));
	assert!(resolved.resolved_at.is_some());

	assert_eq!(log_error(&app, USER_TOKEN, report).await, id);

	let reopened = get_issue(&app, &id).await;
	assert_eq!(reopened.status, IssueStatus::Open);
	assert_eq!(reopened.occurrence_count, 2);
	assert!(reopened.resolved_by.is_none());
	assert!(reopened.resolved_at.is_none());
}

#[tokio::test]
async fn test_list_filters_and_paginates() {
	let (app, _dir) = setup_test_app().await;
	for i in 0..3 {
		log_error(
			&app,
			USER_TOKEN,
			json!({"title": format!("DatabaseError {i}"), "message": "connection refused"}),
		)
		.await;
	}
	log_error(
		&app,
		USER_TOKEN,
		json!({"title": "SlowQuery", "message": "took 5s", "level": "warning"}),
	)
	.await;

	let (status, page) = send(
		&app,
		request(Method::GET, "/api/admin/issues?limit=2", Some(ADMIN_TOKEN), None),
	)
	.await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(page["total"], 4);
	assert_eq!(page["limit"], 2);
	assert_eq!(page["issues"].as_array().unwrap().len(), 2);

	let (_, page) = send(
		&app,
		request(
			Method::GET,
			"/api/admin/issues?level=warning",
			Some(ADMIN_TOKEN),
			None,
		),
	)
	.await;
	assert_eq!(page["total"], 1);
	assert_eq!(page["issues"][0]["title"], "SlowQuery");

	let (_, page) = send(
		&app,
		request(
			Method::GET,
			"/api/admin/issues?search=DATABASEerror&status=open",
			Some(ADMIN_TOKEN),
			None,
		),
	)
	.await;
	assert_eq!(page["total"], 3);

	let (status, body) = send(
		&app,
		request(Method::GET, "/api/admin/issues?status=archived", Some(ADMIN_TOKEN), None),
	)
	.await;
	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(body["error"], "bad_request");
}

#[tokio::test]
async fn test_stats_match_issue_counts() {
	let (app, _dir) = setup_test_app().await;
	let a = log_error(&app, USER_TOKEN, json!({"title": "A", "message": "m"})).await;
	log_error(&app, USER_TOKEN, json!({"title": "B", "message": "m", "level": "info"})).await;
	send(
		&app,
		request(
			Method::POST,
			&format!("/api/admin/issues/{a}/status"),
			Some(ADMIN_TOKEN),
			Some(json!({"status": "closed"})),
		),
	)
	.await;

	let (status, body) = send(
		&app,
		request(Method::GET, "/api/admin/issues/stats", Some(ADMIN_TOKEN), None),
	)
	.await;
	assert_eq!(status, StatusCode::OK);
	let stats: IssueStats = serde_json::from_value(body).unwrap();
	assert_eq!(stats.total, 2);
	assert_eq!(stats.open, 1);
	assert_eq!(stats.closed, 1);
	assert_eq!(stats.resolved, 0);
	assert_eq!(stats.by_level.error, 1);
	assert_eq!(stats.by_level.info, 1);
	assert_eq!(stats.by_level.sum(), stats.total);
}

#[tokio::test]
async fn test_events_are_listed_newest_first() {
	let (app, _dir) = setup_test_app().await;
	let report = |path: &str| json!({"title": "E", "message": "m", "request_path": path});
	let id = log_error(&app, USER_TOKEN, report("/first")).await;
	log_error(&app, USER_TOKEN, report("/second")).await;

	let (status, events) = send(
		&app,
		request(
			Method::GET,
			&format!("/api/admin/issues/{id}/events?limit=1"),
			Some(ADMIN_TOKEN),
			None,
		),
	)
	.await;
	assert_eq!(status, StatusCode::OK);
	let events = events.as_array().unwrap();
	assert_eq!(events.len(), 1);
	assert_eq!(events[0]["request_path"], "/second");
}

#[tokio::test]
async fn test_bad_and_unknown_ids() {
	let (app, _dir) = setup_test_app().await;

	let (status, body) = send(
		&app,
		request(Method::GET, "/api/admin/issues/not-a-uuid", Some(ADMIN_TOKEN), None),
	)
	.await;
	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(body["error"], "bad_request");

	let missing = "01900000-0000-7000-8000-000000000000";
	for req in [
		request(Method::GET, &format!("/api/admin/issues/{missing}"), Some(ADMIN_TOKEN), None),
		request(
			Method::GET,
			&format!("/api/admin/issues/{missing}/events"),
			Some(ADMIN_TOKEN),
			None,
		),
		request(
			Method::POST,
			&format!("/api/admin/issues/{missing}/status"),
			Some(ADMIN_TOKEN),
			Some(json!({"status": "resolved"})),
		),
		request(Method::DELETE, &format!("/api/admin/issues/{missing}"), Some(ADMIN_TOKEN), None),
	] {
		let (status, body) = send(&app, req).await;
		assert_eq!(status, StatusCode::NOT_FOUND);
		assert_eq!(body["error"], "not_found");
	}
}

#[tokio::test]
async fn test_delete_issue() {
	let (app, _dir) = setup_test_app().await;
	let id = log_error(&app, USER_TOKEN, json!({"title": "E", "message": "m"})).await;
	let uri = format!("/api/admin/issues/{id}");

	let (status, _) = send(&app, request(Method::DELETE, &uri, Some(ADMIN_TOKEN), None)).await;
	assert_eq!(status, StatusCode::NO_CONTENT);

	let (status, _) = send(&app, request(Method::GET, &uri, Some(ADMIN_TOKEN), None)).await;
	assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalid_reports_are_rejected() {
	let (app, _dir) = setup_test_app().await;

	let (status, body) = send(
		&app,
		request(
			Method::POST,
			"/api/issues",
			Some(USER_TOKEN),
			Some(json!({"title": "", "message": "m"})),
		),
	)
	.await;
	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(body["error"], "bad_request");

	let (status, body) = send(
		&app,
		request(
			Method::POST,
			"/api/issues",
			Some(USER_TOKEN),
			Some(json!({"message": "no title"})),
		),
	)
	.await;
	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(body["error"], "bad_request");
}

#[tokio::test]
async fn test_settings_round_trip() {
	let (app, _dir) = setup_test_app().await;

	let (status, settings) = send(
		&app,
		request(Method::GET, "/api/admin/settings", Some(ADMIN_TOKEN), None),
	)
	.await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(settings["notifications_enabled"], true);
	assert_eq!(settings["notification_min_level"], "error");

	let (status, settings) = send(
		&app,
		request(
			Method::PUT,
			"/api/admin/settings",
			Some(ADMIN_TOKEN),
			Some(json!({"notifications_enabled": false, "notification_min_level": "warning"})),
		),
	)
	.await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(settings["notifications_enabled"], false);
	assert_eq!(settings["notification_min_level"], "warning");
	assert_eq!(settings["updated_by"], "alice");

	let (_, settings) = send(
		&app,
		request(Method::GET, "/api/admin/settings", Some(ADMIN_TOKEN), None),
	)
	.await;
	assert_eq!(settings["notification_min_level"], "warning");
}
