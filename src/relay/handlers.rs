//! HTTP request handlers.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};

use super::server::AppState;
use super::types::{ChatRequest, ChatResponse, UpstreamRequest};
use crate::config::ApiKey;
use crate::error::{Error, Result};

/// Handle POST /chat
pub async fn chat(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>> {
    // Checked before the body so a misconfigured server fails the same way for any input
    let Some(api_key) = state.api_key.as_ref() else {
        tracing::error!(
            var = %state.config.upstream.api_key_env,
            "Rejecting chat request: credential not configured"
        );
        return Err(Error::MissingCredential {
            var: state.config.upstream.api_key_env.clone(),
        });
    };

    let Json(request) = payload.map_err(|rejection| {
        tracing::warn!(error = %rejection.body_text(), "Invalid chat request body");
        Error::InvalidRequest {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    })?;

    let payload = UpstreamRequest::from_chat(&request, &state.config.upstream.default_model);

    tracing::info!(
        model = %payload.model,
        messages = payload.messages.len(),
        max_tokens = payload.max_tokens,
        "Received chat request"
    );

    let raw = forward(&state, api_key, &payload).await?;
    let response = ChatResponse::from_upstream(raw, &payload.model);

    if response.text.is_empty() {
        tracing::warn!(model = %response.model, "Upstream response carried no reply text");
    }
    tracing::info!(model = %response.model, "Chat request completed");

    Ok(Json(response))
}

/// Send the payload upstream and return the parsed JSON body.
async fn forward(
    state: &AppState,
    api_key: &ApiKey,
    payload: &UpstreamRequest,
) -> Result<serde_json::Value> {
    let url = state.config.upstream.completions_url();

    let upstream_response = state
        .http_client
        .post(&url)
        .header(header::CONTENT_TYPE, "application/json")
        .header(
            header::AUTHORIZATION,
            format!("Bearer {}", api_key.expose_secret()),
        )
        .json(payload)
        .send()
        .await
        .map_err(|e| {
            tracing::error!(error = %e, url = %url, "Failed to reach upstream");
            Error::Transport(e)
        })?;

    let status = upstream_response.status();
    if status.is_client_error() || status.is_server_error() {
        let body = upstream_response.text().await.unwrap_or_default();
        tracing::error!(status = %status, body = %body, "Upstream returned error");
        return Err(Error::Upstream {
            status: StatusCode::from_u16(status.as_u16())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            body,
        });
    }

    let raw: serde_json::Value = upstream_response.json().await.map_err(|e| {
        tracing::error!(error = %e, "Failed to parse upstream response");
        Error::Transport(e)
    })?;

    if !raw.is_object() {
        tracing::error!(body = %raw, "Upstream response is not a JSON object");
        return Err(Error::MalformedResponse {
            body: raw.to_string(),
        });
    }

    Ok(raw)
}

/// Handle GET /health
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "ok": true }))
}
