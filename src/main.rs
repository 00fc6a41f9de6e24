use axum::{routing::get, Json, Router};
use dotenv::dotenv;
use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tracing::{error, info};

use rideline_backend::api::{api_router, ApiContext};
use rideline_backend::config::AppConfig;
use rideline_backend::database::driver_repository::DriverRepository;
use rideline_backend::database::ride_repository::RideRepository;
use rideline_backend::database::user_repository::UserRepository;
use rideline_backend::database::init_pool_from_config;
use rideline_backend::gateway::RazorpayGateway;
use rideline_backend::health::HealthChecker;
use rideline_backend::logging::init_tracing;
use rideline_backend::middleware::{request_logging_middleware, UuidRequestId};
use rideline_backend::services::{CheckoutOrchestrator, CheckoutTimeouts};

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown");
}

/// Full dependency health report
async fn health_handler(
    axum::extract::State(health): axum::extract::State<HealthChecker>,
) -> Json<rideline_backend::health::HealthStatus> {
    Json(health.check().await)
}

/// Liveness: the process is up and serving
async fn liveness_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "alive" }))
}

/// Readiness: dependencies are reachable
async fn readiness_handler(
    axum::extract::State(health): axum::extract::State<HealthChecker>,
) -> impl axum::response::IntoResponse {
    let status = health.check().await;
    let code = if status.is_healthy() {
        axum::http::StatusCode::OK
    } else {
        axum::http::StatusCode::SERVICE_UNAVAILABLE
    };
    (code, Json(status))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let config = AppConfig::from_env()?;
    config.validate()?;
    init_tracing(&config.logging);

    info!(
        host = %config.server.host,
        port = config.server.port,
        "Starting rideline backend"
    );

    let pool = init_pool_from_config(&config.database).await.map_err(|e| {
        error!(error = %e, "Database initialization failed");
        anyhow::anyhow!("database initialization failed: {}", e)
    })?;

    let gateway = Arc::new(RazorpayGateway::from_env().map_err(|e| {
        error!(error = %e, "Razorpay configuration failed");
        anyhow::anyhow!("razorpay configuration failed: {}", e)
    })?);

    let rides = Arc::new(RideRepository::new(pool.clone()));
    let users = Arc::new(UserRepository::new(pool.clone()));
    let drivers = Arc::new(DriverRepository::new(pool.clone()));

    let orchestrator = Arc::new(CheckoutOrchestrator::new(
        gateway.clone(),
        rides.clone(),
        CheckoutTimeouts {
            order: Duration::from_secs(config.checkout.order_timeout_secs),
            persist: Duration::from_secs(config.checkout.persist_timeout_secs),
        },
    ));

    let health = HealthChecker::new(Some(pool.clone()));

    let health_routes = Router::new()
        .route("/health", get(health_handler))
        .route("/health/live", get(liveness_handler))
        .route("/health/ready", get(readiness_handler))
        .with_state(health.clone());

    let app = health_routes
        .merge(api_router(ApiContext {
            gateway,
            orchestrator,
            rides,
            users,
            drivers,
        }))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
                .layer(axum::middleware::from_fn(request_logging_middleware))
                .layer(PropagateRequestIdLayer::x_request_id()),
        );

    let addr = SocketAddr::from_str(&format!("{}:{}", config.server.host, config.server.port))?;
    let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
        error!(error = %e, %addr, "Failed to bind listener");
        anyhow::anyhow!("failed to bind {}: {}", addr, e)
    })?;

    info!(%addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}
