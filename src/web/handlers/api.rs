use axum::{
    body::Bytes,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::llm::providers::openai::DEFAULT_API_URL;
use crate::llm::LlmError;
use crate::web::state::AppState;

// Request/response types

#[derive(Debug, Deserialize)]
pub struct GenerateSqlRequest {
    #[serde(default)]
    pub prompt: String,
}

#[derive(Debug, Serialize)]
pub struct GenerateSqlResponse {
    pub sql: String,
}

// System status

#[derive(Debug, Serialize)]
pub struct SystemStatus {
    pub version: String,
    pub uptime_seconds: i64,
    pub backend: String,
    pub model: String,
}

// The structured entry point returns a typed error object the caller can
// branch on: { "error": { "kind": ..., "message": ... } }
impl IntoResponse for LlmError {
    fn into_response(self) -> Response {
        let status = match self {
            LlmError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            LlmError::Config(_) | LlmError::Shape(_) => StatusCode::INTERNAL_SERVER_ERROR,
            LlmError::Upstream(_) => StatusCode::BAD_GATEWAY,
        };

        let body = Json(json!({
            "error": {
                "kind": self.kind(),
                "message": self.message(),
            }
        }));

        (status, body).into_response()
    }
}

// SQL generation - the structured entry point
pub async fn generate_sql(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<GenerateSqlRequest>,
) -> Result<Json<GenerateSqlResponse>, LlmError> {
    debug!("Generating SQL for prompt: {}", payload.prompt);

    let sql = app_state
        .llm_manager
        .generate_sql(&payload.prompt)
        .await
        .map_err(|e| {
            error!("SQL generation failed: {}", e);
            e
        })?;

    info!("Generated SQL ({} chars)", sql.len());

    Ok(Json(GenerateSqlResponse { sql }))
}

// Raw passthrough - forwards the body verbatim with the credential injected
// and mirrors the upstream status and body back to the caller.
pub async fn proxy_chat(State(app_state): State<Arc<AppState>>, body: Bytes) -> Response {
    let api_key = match &app_state.config.llm.api_key {
        Some(key) => key.clone(),
        None => {
            error!("Proxy request received but no API key is configured");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "API key is not configured on the server" })),
            )
                .into_response();
        }
    };

    let api_url = app_state
        .config
        .llm
        .api_url
        .clone()
        .unwrap_or_else(|| DEFAULT_API_URL.to_string());

    debug!("Forwarding {} byte body to upstream", body.len());

    let upstream = app_state
        .http_client
        .post(&api_url)
        .header("Authorization", format!("Bearer {}", api_key))
        .header("Content-Type", "application/json")
        .body(body)
        .send()
        .await;

    let upstream = match upstream {
        Ok(response) => response,
        Err(e) => {
            error!("Upstream request failed: {}", e);
            return (
                StatusCode::BAD_GATEWAY,
                Json(json!({ "error": "Failed to reach the upstream API" })),
            )
                .into_response();
        }
    };

    let status = StatusCode::from_u16(upstream.status().as_u16())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    let content_type = upstream
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("application/json")
        .to_string();

    match upstream.bytes().await {
        Ok(bytes) => (status, [(header::CONTENT_TYPE, content_type)], bytes).into_response(),
        Err(e) => {
            error!("Failed to read upstream response body: {}", e);
            (
                StatusCode::BAD_GATEWAY,
                Json(json!({ "error": "Failed to read the upstream response" })),
            )
                .into_response()
        }
    }
}

// System status
pub async fn system_status(State(app_state): State<Arc<AppState>>) -> Json<SystemStatus> {
    let uptime = chrono::Utc::now() - app_state.startup_time;

    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: uptime.num_seconds(),
        backend: app_state.config.llm.backend.clone(),
        model: app_state.config.llm.model.clone(),
    })
}
