use crate::backend::TOKEN_ENV_VAR;
use crate::config::ServerConfig;
use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::SystemTime;

/// Health status for a component or the overall system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    /// Functioning but requests may fail, e.g. no credentials configured.
    Degraded,
    Unhealthy,
}

impl HealthStatus {
    pub fn status_code(&self) -> StatusCode {
        match self {
            HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
            HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Combines two health statuses, returning the worse of the two.
    pub fn combine(self, other: Self) -> Self {
        match (self, other) {
            (HealthStatus::Unhealthy, _) | (_, HealthStatus::Unhealthy) => HealthStatus::Unhealthy,
            (HealthStatus::Degraded, _) | (_, HealthStatus::Degraded) => HealthStatus::Degraded,
            _ => HealthStatus::Healthy,
        }
    }
}

/// Health check result for a single component.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub component: String,
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ComponentHealth {
    pub fn healthy(component: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            status: HealthStatus::Healthy,
            error: None,
        }
    }

    pub fn degraded(component: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            status: HealthStatus::Degraded,
            error: Some(error.into()),
        }
    }

    pub fn unhealthy(component: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            status: HealthStatus::Unhealthy,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub timestamp: i64,
    pub version: String,
}

impl IntoResponse for HealthResponse {
    fn into_response(self) -> Response {
        let status = self.status.status_code();
        (status, Json(self)).into_response()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    pub status: HealthStatus,
    pub timestamp: i64,
    pub components: Vec<ComponentHealth>,
}

impl IntoResponse for ReadinessResponse {
    fn into_response(self) -> Response {
        let status = if self.ready {
            StatusCode::OK
        } else {
            StatusCode::SERVICE_UNAVAILABLE
        };
        (status, Json(self)).into_response()
    }
}

#[derive(Clone)]
pub struct HealthChecker {
    config: Arc<ServerConfig>,
}

impl HealthChecker {
    pub fn new(config: Arc<ServerConfig>) -> Self {
        Self { config }
    }

    pub fn liveness(&self) -> HealthResponse {
        HealthResponse {
            status: HealthStatus::Healthy,
            timestamp: Self::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    pub fn readiness(&self) -> ReadinessResponse {
        let components = vec![self.check_backend_config(), self.check_credentials()];
        let mut overall = HealthStatus::Healthy;
        for component in &components {
            overall = overall.combine(component.status);
        }

        ReadinessResponse {
            ready: overall != HealthStatus::Unhealthy,
            status: overall,
            timestamp: Self::now(),
            components,
        }
    }

    fn check_backend_config(&self) -> ComponentHealth {
        let url = &self.config.backend_base_url;
        if url.starts_with("http://") || url.starts_with("https://") {
            ComponentHealth::healthy("backend")
        } else {
            ComponentHealth::unhealthy("backend", format!("{url:?} is not an http(s) URL"))
        }
    }

    fn check_credentials(&self) -> ComponentHealth {
        let env_token = std::env::var(TOKEN_ENV_VAR)
            .map(|t| !t.trim().is_empty())
            .unwrap_or(false);
        if env_token {
            return ComponentHealth::healthy("credentials");
        }
        match self.config.credentials_file.as_ref() {
            Some(path) if path.is_file() => ComponentHealth::healthy("credentials"),
            Some(path) => ComponentHealth::unhealthy(
                "credentials",
                format!("credentials file {} is not readable", path.display()),
            ),
            None => ComponentHealth::degraded(
                "credentials",
                "no credentials configured; spreadsheet requests will be rejected",
            ),
        }
    }

    fn now() -> i64 {
        SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs() as i64
    }
}

/// Axum handler for the liveness endpoint.
pub async fn liveness_handler(State(checker): State<Arc<HealthChecker>>) -> impl IntoResponse {
    checker.liveness()
}

/// Axum handler for the readiness endpoint.
pub async fn readiness_handler(State(checker): State<Arc<HealthChecker>>) -> impl IntoResponse {
    checker.readiness()
}
