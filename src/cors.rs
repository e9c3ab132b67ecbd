//! CORS headers for the browser forms.
//!
//! Headers are attached by the response builder rather than a middleware layer so that
//! every outcome of a handler, including validation and delivery failures, carries them.

use std::time::Duration;

use axum::{
    http::{
        HeaderMap, HeaderValue, StatusCode,
        header::{
            ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
            ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_MAX_AGE, InvalidHeaderValue,
        },
    },
    response::{IntoResponse, Response},
};

const PREFLIGHT_MAX_AGE: Duration = Duration::from_secs(24 * 60 * 60);

/// Single allowed origin, fixed at start-up.
#[derive(Debug, Clone)]
pub struct CorsPolicy {
    origin: HeaderValue,
}

impl CorsPolicy {
    pub fn new(origin: &str) -> Result<Self, InvalidHeaderValue> {
        Ok(Self {
            origin: HeaderValue::from_str(origin)?,
        })
    }

    pub fn origin(&self) -> &HeaderValue {
        &self.origin
    }

    /// Headers for the substantive POST response.
    pub fn actual_headers(&self) -> HeaderMap {
        let mut headers = self.base_headers();
        headers.insert(ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static("POST"));
        headers
    }

    /// Headers for the OPTIONS preflight, cacheable by the browser.
    pub fn preflight_headers(&self) -> HeaderMap {
        let mut headers = self.base_headers();
        headers.insert(
            ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static("POST, OPTIONS"),
        );
        headers.insert(
            ACCESS_CONTROL_MAX_AGE,
            HeaderValue::from(PREFLIGHT_MAX_AGE.as_secs()),
        );
        headers
    }

    /// 204 No Content with the preflight headers.
    pub fn preflight(&self) -> Response {
        (StatusCode::NO_CONTENT, self.preflight_headers()).into_response()
    }

    fn base_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, self.origin.clone());
        headers.insert(
            ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static("Content-Type"),
        );
        headers
    }
}
