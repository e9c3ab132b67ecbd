//! Body parsing and required-field presence checks.
//!
//! Only presence is checked here. Field shapes (email format, phone) are not validated.

use serde_json::Value;

use crate::error::RelayError;

/// Fields an endpoint cannot do without, and the message naming them.
#[derive(Debug, Clone, Copy)]
pub struct RequiredFields {
    pub fields: &'static [&'static str],
    pub message: &'static str,
}

pub const REGISTRATION: RequiredFields = RequiredFields {
    fields: &["email", "referenceNumber", "formType"],
    message: "Missing required fields (email, referenceNumber, or formType)",
};

pub const CONTACT: RequiredFields = RequiredFields {
    fields: &["firstName", "email", "topic", "message"],
    message: "Missing required fields (First Name, Email, Topic, or Message)",
};

pub const CONFIRMATION: RequiredFields = RequiredFields {
    fields: &["recipientEmail", "recipientName", "reference", "subject"],
    message: "Missing required fields for confirmation email (recipientEmail, recipientName, reference, or subject)",
};

impl RequiredFields {
    /// Fails with `MissingFields` unless every field is present and truthy.
    pub fn check(&self, body: &Value) -> Result<(), RelayError> {
        if self.missing(body).is_empty() {
            Ok(())
        } else {
            Err(RelayError::MissingFields(self.message))
        }
    }

    pub fn missing(&self, body: &Value) -> Vec<&'static str> {
        self.fields
            .iter()
            .copied()
            .filter(|field| !body.get(field).is_some_and(is_truthy))
            .collect()
    }
}

/// Parse the raw request body as JSON.
pub fn parse_body(body: &[u8]) -> Result<Value, RelayError> {
    serde_json::from_slice(body).map_err(RelayError::InvalidJson)
}

/// Browser-form truthiness: `null`, `false`, `0`, `""` and absence all count as missing.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
