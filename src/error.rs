//! Request error taxonomy: what the client sees and what goes to the log.

use axum::http::StatusCode;
use thiserror::Error;
use tracing::{error, warn};

use crate::email::EmailError;

/// Every way a form submission can fail. The `Display` text is what the client sees.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Invalid JSON body")]
    InvalidJson(#[source] serde_json::Error),

    #[error("{0}")]
    MissingFields(&'static str),

    #[error("Unsupported formType: {0}")]
    UnsupportedFormType(String),

    #[error("Invalid request body")]
    InvalidPayload(#[source] serde_json::Error),

    #[error("Invalid recipient email address")]
    InvalidRecipient(#[source] EmailError),

    /// Anything that went wrong after validation. `public` is the generic client message,
    /// the source stays in the server log.
    #[error("{public}")]
    Delivery {
        public: &'static str,
        #[source]
        source: EmailError,
    },
}

impl RelayError {
    /// Wrap a dispatcher failure for an endpoint whose generic failure text is `public`.
    pub fn delivery(public: &'static str, source: EmailError) -> Self {
        match source {
            EmailError::InvalidAddress(_) => RelayError::InvalidRecipient(source),
            source => RelayError::Delivery { public, source },
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            RelayError::InvalidJson(_) => "invalid_json",
            RelayError::MissingFields(_) => "missing_fields",
            RelayError::UnsupportedFormType(_) => "unsupported_form_type",
            RelayError::InvalidPayload(_) => "invalid_payload",
            RelayError::InvalidRecipient(_) => "invalid_recipient",
            RelayError::Delivery { .. } => "send_failure",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::Delivery { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    /// Log with the underlying detail, which never reaches the client.
    pub fn log(&self, endpoint: &str) {
        match self {
            RelayError::Delivery { source, .. } => {
                error!(endpoint, kind = self.kind(), error = %source, "Email delivery failed");
            }
            RelayError::InvalidJson(e) | RelayError::InvalidPayload(e) => {
                warn!(endpoint, kind = self.kind(), error = %e, "Rejected request");
            }
            RelayError::InvalidRecipient(e) => {
                warn!(endpoint, kind = self.kind(), error = %e, "Rejected request");
            }
            _ => warn!(endpoint, kind = self.kind(), "Rejected request: {self}"),
        }
    }
}
