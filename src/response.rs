//! Uniform JSON envelope for every POST outcome.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::{cors::CorsPolicy, error::RelayError};

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Envelope {
    Success { success: bool, message: &'static str },
    Failure { error: String },
}

/// 200 with `{success, message}` or the error's status with `{error}`; CORS headers either way.
pub fn respond(cors: &CorsPolicy, outcome: Result<&'static str, RelayError>) -> Response {
    let (status, body) = match outcome {
        Ok(message) => (
            StatusCode::OK,
            Envelope::Success {
                success: true,
                message,
            },
        ),
        Err(e) => (e.status(), Envelope::Failure { error: e.to_string() }),
    };
    (status, cors.actual_headers(), Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::email::EmailError;
    use axum::{body::to_bytes, http::header};
    use serde_json::{Value, json};

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn success_envelope() {
        let cors = CorsPolicy::new("http://localhost:3000").unwrap();
        let response = respond(&cors, Ok("Registration email sent successfully"));

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "http://localhost:3000"
        );
        assert_eq!(
            body_json(response).await,
            json!({"success": true, "message": "Registration email sent successfully"})
        );
    }

    #[tokio::test]
    async fn failure_envelope_keeps_cors_headers() {
        let cors = CorsPolicy::new("http://localhost:3000").unwrap();
        let err = RelayError::delivery(
            "Failed to send registration email",
            EmailError::SmtpError("connection refused (os error 111)".into()),
        );
        let response = respond(&cors, Err(err));

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_METHODS], "POST");
        assert_eq!(
            body_json(response).await,
            json!({"error": "Failed to send registration email"})
        );
    }
}
