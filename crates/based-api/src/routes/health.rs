use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub services: HashMap<String, String>,
}

pub async fn root() -> Json<Value> {
    Json(json!({"message": "BasedAgent API is running"}))
}

/// Health check endpoint
///
/// Reports the store connection, registered tool providers and the number
/// of conversations with a message in flight.
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let mut services = HashMap::new();

    let store = match state.persist.get_user(0).await {
        Ok(_) => "connected",
        Err(e) => {
            tracing::warn!(error = %e, "Store health check failed");
            "disconnected"
        }
    };
    services.insert("store".to_string(), store.to_string());
    services.insert(
        "tool_providers".to_string(),
        state.chat.provider_names().join(","),
    );
    services.insert(
        "pending_chats".to_string(),
        state.chat.guard().pending_count().to_string(),
    );

    let status = if store == "connected" { "healthy" } else { "degraded" };

    Json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        services,
    })
}
