// HTTP request handlers

use super::routes::AppState;
use crate::error::ProxyError;
use axum::{body::Bytes, extract::State, http::Method, Json};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub checks: HashMap<String, HealthCheck>,
    pub timestamp: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthCheck {
    pub status: String,
    pub message: String,
}

pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let mut checks = HashMap::new();
    let mut overall_status = HealthStatus::Healthy;

    // A missing key keeps the server up but fails every generation call
    let credential_check = if state.proxy.has_credential() {
        HealthCheck {
            status: "ok".to_string(),
            message: "API key configured".to_string(),
        }
    } else {
        overall_status = HealthStatus::Degraded;
        HealthCheck {
            status: "error".to_string(),
            message: "API key not configured on server".to_string(),
        }
    };
    checks.insert("credential".to_string(), credential_check);

    checks.insert(
        "model".to_string(),
        HealthCheck {
            status: "ok".to_string(),
            message: state.proxy.model().to_string(),
        },
    );

    Json(HealthResponse {
        status: overall_status,
        checks,
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

/// Handler for `/api/generate`, mounted for every method so that non-POST
/// calls get the proxy's own 405 body.
pub async fn generate_handler(
    State(state): State<AppState>,
    method: Method,
    body: Bytes,
) -> Result<Json<crate::models::GenerateReply>, ProxyError> {
    state.proxy.handle(&method, &body).await.map(Json)
}
