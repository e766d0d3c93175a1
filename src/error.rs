//! Error types for chat-relay.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Result type alias for relay operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for chat-relay.
///
/// Every variant renders as a `{"detail": ...}` body, the shape frontend
/// callers already parse.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Missing {var} env var on server.")]
    MissingCredential { var: String },

    /// Upstream answered with a 4xx/5xx; `body` is its raw text.
    #[error("{body}")]
    Upstream { status: StatusCode, body: String },

    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    /// Upstream answered 2xx with JSON that is not an object.
    #[error("Upstream response is not a JSON object: {body}")]
    MalformedResponse { body: String },

    #[error("{message}")]
    InvalidRequest { status: StatusCode, message: String },
}

impl Error {
    pub fn status(&self) -> StatusCode {
        match self {
            Error::MissingCredential { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Upstream { status, .. } => *status,
            Error::Transport(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::MalformedResponse { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Error::InvalidRequest { status, .. } => *status,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = serde_json::json!({
            "detail": self.to_string()
        });

        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_missing_credential_is_500_with_fixed_detail() {
        let response = Error::MissingCredential {
            var: "GROQ_API_KEY".to_string(),
        }
        .into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        assert_eq!(json["detail"], "Missing GROQ_API_KEY env var on server.");
    }

    #[tokio::test]
    async fn test_upstream_error_mirrors_status_and_body() {
        let response = Error::Upstream {
            status: StatusCode::TOO_MANY_REQUESTS,
            body: r#"{"error":"rate_limited"}"#.to_string(),
        }
        .into_response();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        let json = body_json(response).await;
        assert_eq!(json["detail"], r#"{"error":"rate_limited"}"#);
    }

    #[tokio::test]
    async fn test_malformed_response_is_500() {
        let response = Error::MalformedResponse {
            body: "[1,2]".to_string(),
        }
        .into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        assert_eq!(
            json["detail"],
            "Upstream response is not a JSON object: [1,2]"
        );
    }

    #[tokio::test]
    async fn test_invalid_request_keeps_extractor_status() {
        let response = Error::InvalidRequest {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            message: "missing field `prompt`".to_string(),
        }
        .into_response();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let json = body_json(response).await;
        assert_eq!(json["detail"], "missing field `prompt`");
    }
}
