//! Route handlers: the three form endpoints and their CORS preflight.

use std::sync::Arc;

use axum::{
    Router,
    body::Bytes,
    extract::State,
    response::Response,
    routing::post,
};
use tracing::{debug, info};

use crate::{
    compose,
    config::ApiConfig,
    cors::CorsPolicy,
    email::EmailState,
    error::RelayError,
    forms::{self, ConfirmationPayload, ContactPayload, RegistrationPayload},
    response::respond,
    validation,
};

pub const REGISTRATION_SENT: &str = "Registration email sent successfully";
pub const REGISTRATION_FAILED: &str = "Failed to send registration email";
pub const CONTACT_SENT: &str =
    "Thank you for reaching out to Cohession Africa. We will get back to you shortly";
pub const CONTACT_FAILED: &str = "Failed to send email";
pub const CONFIRMATION_SENT: &str = "Confirmation email sent successfully";
pub const CONFIRMATION_FAILED: &str = "Failed to send confirmation email";

/// Shared, read-only state for all handlers.
pub struct AppState {
    pub email: EmailState,
    pub cors: CorsPolicy,
}

impl AppState {
    pub fn from_config(cfg: &ApiConfig) -> anyhow::Result<Self> {
        let cors = CorsPolicy::new(cfg.allowed_origin())?;
        let email = EmailState::from_config(cfg)?;
        Ok(Self { email, cors })
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/register-tournament",
            post(register_tournament).options(preflight),
        )
        .route(
            "/send-email-internal",
            post(send_email_internal).options(preflight),
        )
        .route(
            "/send-email-confirmation",
            post(send_email_confirmation).options(preflight),
        )
        .with_state(state)
}

/// OPTIONS on any form route: 204 with the preflight headers.
pub async fn preflight(State(state): State<Arc<AppState>>) -> Response {
    state.cors.preflight()
}

/// POST `/register-tournament`
pub async fn register_tournament(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let outcome = relay_registration(&state, &body).await;
    finish(&state, "register-tournament", outcome.map(|_| REGISTRATION_SENT))
}

/// POST `/send-email-internal`
pub async fn send_email_internal(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let outcome = relay_contact(&state, &body).await;
    finish(&state, "send-email-internal", outcome.map(|_| CONTACT_SENT))
}

/// POST `/send-email-confirmation`
pub async fn send_email_confirmation(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let outcome = relay_confirmation(&state, &body).await;
    finish(&state, "send-email-confirmation", outcome.map(|_| CONFIRMATION_SENT))
}

async fn relay_registration(state: &AppState, body: &[u8]) -> Result<(), RelayError> {
    let json = validation::parse_body(body)?;
    validation::REGISTRATION.check(&json)?;
    let payload = RegistrationPayload::from_json(json)?;
    info!(
        form_type = payload.form.form_type(),
        reference = %payload.reference_number,
        "Tournament registration received"
    );

    let message = compose::registration(&payload);
    state
        .email
        .dispatch(message)
        .await
        .map_err(|e| RelayError::delivery(REGISTRATION_FAILED, e))
}

async fn relay_contact(state: &AppState, body: &[u8]) -> Result<(), RelayError> {
    let json = validation::parse_body(body)?;
    validation::CONTACT.check(&json)?;
    let payload: ContactPayload = forms::decode(json)?;
    info!(
        topic = %payload.topic,
        reference = payload.reference_number.as_deref().unwrap_or("N/A"),
        "Contact inquiry received"
    );

    let message = compose::contact(&payload);
    state
        .email
        .dispatch(message)
        .await
        .map_err(|e| RelayError::delivery(CONTACT_FAILED, e))
}

async fn relay_confirmation(state: &AppState, body: &[u8]) -> Result<(), RelayError> {
    let json = validation::parse_body(body)?;
    validation::CONFIRMATION.check(&json)?;
    let payload: ConfirmationPayload = forms::decode(json)?;
    info!(reference = %payload.reference, "Confirmation requested");

    let message = compose::confirmation(&payload)
        .map_err(|e| RelayError::delivery(CONFIRMATION_FAILED, e))?;
    state
        .email
        .dispatch(message)
        .await
        .map_err(|e| RelayError::delivery(CONFIRMATION_FAILED, e))
}

fn finish(
    state: &AppState,
    endpoint: &str,
    outcome: Result<&'static str, RelayError>,
) -> Response {
    match &outcome {
        Ok(_) => debug!(endpoint, "Email sent"),
        Err(e) => e.log(endpoint),
    }
    respond(&state.cors, outcome)
}
