//! Health check module
//! Provides health status for the application and its dependencies

use serde::Serialize;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::time::timeout;

/// Health status response
#[derive(Debug, Serialize, Clone)]
pub struct HealthStatus {
    pub status: HealthState,
    pub checks: HashMap<String, ComponentHealth>,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Overall health state
#[derive(Debug, Serialize, Clone)]
pub enum HealthState {
    Healthy,
    Degraded,
    Unhealthy,
}

/// Individual component health status
#[derive(Debug, Serialize, Clone)]
pub struct ComponentHealth {
    pub status: ComponentState,
    pub response_time_ms: Option<u128>,
    pub details: Option<String>,
}

/// Component state
#[derive(Debug, Serialize, Clone)]
pub enum ComponentState {
    Up,
    Down,
}

impl HealthStatus {
    pub fn new() -> Self {
        Self {
            status: HealthState::Healthy,
            checks: HashMap::new(),
            timestamp: chrono::Utc::now(),
        }
    }

    pub fn is_healthy(&self) -> bool {
        matches!(self.status, HealthState::Healthy)
    }
}

impl Default for HealthStatus {
    fn default() -> Self {
        Self::new()
    }
}

impl ComponentHealth {
    pub fn up(response_time_ms: Option<u128>) -> Self {
        Self {
            status: ComponentState::Up,
            response_time_ms,
            details: None,
        }
    }

    pub fn down(details: Option<String>) -> Self {
        Self {
            status: ComponentState::Down,
            response_time_ms: None,
            details,
        }
    }
}

/// Health checker for the application
#[derive(Clone)]
pub struct HealthChecker {
    db_pool: Option<sqlx::PgPool>,
    check_timeout: Duration,
}

impl HealthChecker {
    pub fn new(db_pool: Option<sqlx::PgPool>) -> Self {
        Self {
            db_pool,
            check_timeout: Duration::from_secs(5),
        }
    }

    /// Run all component checks and aggregate the overall status
    pub async fn check(&self) -> HealthStatus {
        let mut status = HealthStatus::new();

        if let Some(pool) = &self.db_pool {
            let start = Instant::now();
            let result = timeout(self.check_timeout, crate::database::health_check(pool)).await;
            let component = match result {
                Ok(Ok(())) => ComponentHealth::up(Some(start.elapsed().as_millis())),
                Ok(Err(e)) => ComponentHealth::down(Some(e.to_string())),
                Err(_) => ComponentHealth::down(Some("health check timed out".to_string())),
            };
            if matches!(component.status, ComponentState::Down) {
                status.status = HealthState::Unhealthy;
            }
            status.checks.insert("database".to_string(), component);
        } else {
            status.status = HealthState::Degraded;
            status.checks.insert(
                "database".to_string(),
                ComponentHealth::down(Some("database not configured".to_string())),
            );
        }

        status
    }
}
