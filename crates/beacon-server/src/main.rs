// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Beacon error tracking server binary.

use std::path::PathBuf;
use std::sync::Arc;

use beacon_server::{create_app_state, create_router, jobs, version};
use beacon_server_config::{LogFormat, LoggingConfig};
use beacon_server_jobs::JobScheduler;
use clap::{Parser, Subcommand};
use tower_http::{
	cors::{Any, CorsLayer},
	trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Beacon server - error ingestion and issue tracking.
#[derive(Parser, Debug)]
#[command(name = "beacon-server", about = "Beacon error tracking server", version)]
struct Args {
	/// Path to a TOML config file (default: /etc/beacon/server.toml)
	#[arg(long, short, env = "BEACON_SERVER_CONFIG")]
	config: Option<PathBuf>,

	#[command(subcommand)]
	command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Show version and build information
	Version,
}

fn init_tracing(logging: &LoggingConfig) {
	let filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
	let registry = tracing_subscriber::registry().with(filter);

	match logging.format {
		LogFormat::Json => registry
			.with(tracing_subscriber::fmt::layer().json())
			.init(),
		LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
	}
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	if let Some(Command::Version) = args.command {
		println!("{}", version::format_version_info());
		return Ok(());
	}

	dotenvy::dotenv().ok();

	let config = match &args.config {
		Some(path) => beacon_server_config::load_config_with_file(path)?,
		None => beacon_server_config::load_config()?,
	};

	init_tracing(&config.logging);

	tracing::info!(
		host = %config.http.host,
		port = config.http.port,
		database = %config.database.url,
		"starting beacon-server"
	);

	let pool = beacon_server_issues::create_pool(&config.database.url).await?;
	beacon_server_issues::run_migrations(&pool).await?;

	let mut state = create_app_state(pool, &config)?;
	if state.tokens.is_empty() {
		tracing::warn!("No API tokens configured, every /api route will answer 401");
	}

	let dispatcher = jobs::build_dispatcher(config.smtp.as_ref())?;
	let mut scheduler = JobScheduler::new();
	jobs::register_issue_jobs(
		&mut scheduler,
		state.repository(),
		dispatcher,
		&config.issues,
	);
	let scheduler = Arc::new(scheduler);
	state.job_scheduler = Some(Arc::clone(&scheduler));
	scheduler.start().await;

	let app = create_router(state)
		.layer(TraceLayer::new_for_http())
		.layer(
			CorsLayer::new()
				.allow_origin(Any)
				.allow_methods(Any)
				.allow_headers(Any),
		);

	let addr = config.socket_addr();
	tracing::info!("listening on {}", addr);

	let listener = tokio::net::TcpListener::bind(&addr).await?;

	axum::serve(listener, app)
		.with_graceful_shutdown(async {
			if let Err(e) = tokio::signal::ctrl_c().await {
				tracing::error!(error = %e, "Failed to listen for shutdown signal");
			}
			tracing::info!("Received shutdown signal");
		})
		.await?;

	tracing::info!("Shutting down job scheduler...");
	scheduler.shutdown().await;

	tracing::info!("Server shutdown complete");
	Ok(())
}
