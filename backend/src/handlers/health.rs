//! Health check

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::store::KeyValueStore;

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub store: String,
    pub backend: String,
    pub version: String,
}

/// GET /health - Store reachability and build version
pub async fn health_check(
    State(store): State<Arc<dyn KeyValueStore>>,
) -> (StatusCode, Json<HealthResponse>) {
    let (code, status, store_status) = match store.ping().await {
        Ok(()) => (StatusCode::OK, "healthy", "connected".to_string()),
        Err(e) => {
            tracing::error!(error = %e, "store health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                "unhealthy",
                format!("error: {}", e),
            )
        }
    };

    (
        code,
        Json(HealthResponse {
            status: status.to_string(),
            store: store_status,
            backend: store.backend_name().to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }),
    )
}
