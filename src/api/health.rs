//! Health check endpoints for Kubernetes probes

use std::time::Instant;

use axum::{extract::State, http::StatusCode, response::IntoResponse};

use crate::api::types::Json;
use serde::Serialize;

use super::state::AppState;

/// Detailed health response with component status
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checks: Option<Vec<HealthCheck>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
}

/// Health check status
#[derive(Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

/// Individual component health check
#[derive(Serialize)]
pub struct HealthCheck {
    pub name: String,
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
}

/// Simple health check - returns 200 if the service is running
pub async fn health_check() -> impl IntoResponse {
    let response = HealthResponse {
        status: HealthStatus::Healthy,
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: None,
        latency_ms: None,
    };

    (StatusCode::OK, Json(response))
}

/// Liveness check for detecting crashed processes
pub async fn live_check() -> impl IntoResponse {
    StatusCode::OK
}

/// Readiness check with dependency verification.
///
/// Each resource's store is probed; the cache is probed too but only ever
/// degrades the status, since the gateway serves correct (if slower)
/// responses without it.
pub async fn ready_check(State(state): State<AppState>) -> impl IntoResponse {
    let start = Instant::now();
    let mut checks = Vec::new();
    let mut overall_status = HealthStatus::Healthy;

    for gateway in state.gateways() {
        let check = check_store(gateway.resource(), gateway).await;

        if check.status != HealthStatus::Healthy {
            overall_status = HealthStatus::Unhealthy;
        }
        checks.push(check);
    }

    let cache_start = Instant::now();
    let cache_ok = state.cache().ping().await;

    if !cache_ok && overall_status == HealthStatus::Healthy {
        overall_status = HealthStatus::Degraded;
    }

    checks.push(HealthCheck {
        name: "cache".to_string(),
        status: if cache_ok {
            HealthStatus::Healthy
        } else {
            HealthStatus::Degraded
        },
        message: (!cache_ok).then(|| "Cache backend unreachable".to_string()),
        latency_ms: Some(cache_start.elapsed().as_millis() as u64),
    });

    let response = HealthResponse {
        status: overall_status,
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: Some(checks),
        latency_ms: Some(start.elapsed().as_millis() as u64),
    };

    let status_code = match overall_status {
        // Degraded means "cache-less but serving"; keep accepting traffic
        HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(response))
}

async fn check_store(resource: &str, gateway: &crate::domain::CacheAsideGateway) -> HealthCheck {
    let start = Instant::now();

    match gateway.store_count().await {
        Ok(_) => HealthCheck {
            name: format!("store:{}", resource),
            status: HealthStatus::Healthy,
            message: None,
            latency_ms: Some(start.elapsed().as_millis() as u64),
        },
        Err(e) => HealthCheck {
            name: format!("store:{}", resource),
            status: HealthStatus::Unhealthy,
            message: Some(e.to_string()),
            latency_ms: Some(start.elapsed().as_millis() as u64),
        },
    }
}
