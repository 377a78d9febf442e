mod config;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::http::HeaderValue;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use funds_api::auth::{self, AppState, AppStateInner};
use funds_core::{FundsService, SystemClock};
use funds_db::Database;

use crate::config::Config;

const DEFAULT_LOG_FILTER: &str =
    "funds=debug,funds_api=debug,funds_core=debug,funds_db=debug,tower_http=debug";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .init();

    let config = Config::from_env()?;
    if config.jwt_secret == "dev-secret-change-me" {
        warn!("FUNDS_JWT_SECRET is not set; using the development secret");
    }

    // Init database
    let db = Arc::new(Database::open(&PathBuf::from(&config.db_path))?);
    auth::ensure_default_admin(
        &db,
        &config.admin_username,
        &config.admin_password,
        &config.admin_email,
    )?;

    // Shared state
    let funds = FundsService::new(db.clone(), Arc::new(SystemClock)).with_terms(config.terms);
    let app_state: AppState = Arc::new(AppStateInner {
        db,
        funds,
        jwt_secret: config.jwt_secret.clone(),
        token_ttl: config.token_ttl,
    });

    let origins = config
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect::<Vec<_>>();

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any);

    let app = funds_api::router(app_state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!(
        "Funds server listening on {} (monthly rate {}, maturity {} days)",
        addr, config.terms.monthly_rate, config.terms.maturity_days
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Funds server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
