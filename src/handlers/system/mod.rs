// handlers/system/mod.rs - Service info and health endpoints (public)

use axum::{extract::State, http::StatusCode, response::{IntoResponse, Json}};
use serde_json::{json, Value};

use crate::app::AppState;

/// GET / - Service description and route map
pub async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "Property API",
            "version": version,
            "description": "Property listing service with owner-scoped edits and image ingestion",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "list": "GET /properties?page=&pageSize= (public)",
                "show": "GET /properties/:id (public)",
                "featured": "GET /properties/featured (public)",
                "search": "GET /properties/search?location=&propertyType= (public)",
                "by_user": "GET /properties/user/:user_id (public)",
                "create": "POST /properties (bearer token)",
                "update": "PUT /properties/:id (bearer token, owner only)",
                "delete": "DELETE /properties/:id (bearer token, owner only)",
            }
        }
    }))
}

/// GET /health - 200 while the property store answers, 503 otherwise
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.service.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "store": "ok"
                }
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "store unavailable",
                    "data": {
                        "status": "degraded",
                        "timestamp": now
                    }
                })),
            )
        }
    }
}
