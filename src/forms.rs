//! Typed form payloads.
//!
//! Text fields are lenient: browser forms send numbers (`exp`, phone numbers) as JSON numbers
//! as often as strings, so numbers and booleans are accepted and kept as their JSON text.
//! Empty strings are treated as absent.

use serde::{Deserialize, Deserializer, de::DeserializeOwned, de::Error as _};
use serde_json::Value;

use crate::error::RelayError;

/// Tournament registration: common fields plus one variant per `formType`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationPayload {
    #[serde(deserialize_with = "required_text")]
    pub email: String,
    #[serde(deserialize_with = "required_text")]
    pub reference_number: String,
    #[serde(flatten)]
    pub form: RegistrationForm,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "formType", rename_all = "UPPERCASE")]
pub enum RegistrationForm {
    Solo(SoloEntry),
    Team(TeamEntry),
    Coach(CoachEntry),
    Other(OtherEntry),
}

impl RegistrationForm {
    pub const TAGS: [&'static str; 4] = ["SOLO", "TEAM", "COACH", "OTHER"];

    pub fn form_type(&self) -> &'static str {
        match self {
            RegistrationForm::Solo(_) => "SOLO",
            RegistrationForm::Team(_) => "TEAM",
            RegistrationForm::Coach(_) => "COACH",
            RegistrationForm::Other(_) => "OTHER",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SoloEntry {
    #[serde(default, deserialize_with = "optional_text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    pub dob: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    pub position: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    pub gender: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    pub city: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamEntry {
    #[serde(default, deserialize_with = "optional_text")]
    pub team_name: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    pub gender: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    pub city: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    pub manager_name: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoachEntry {
    #[serde(default, deserialize_with = "optional_text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    pub certs: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    pub exp: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    pub city: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    pub phone: Option<String>,
}

/// Volunteer, sponsor or media: `category` carries the role.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OtherEntry {
    #[serde(default, deserialize_with = "optional_text")]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    pub phone: Option<String>,
}

impl RegistrationPayload {
    /// Decode a validated body. The `formType` tag is checked first so an unknown form
    /// is reported as such rather than as a generic decoding failure.
    pub fn from_json(body: Value) -> Result<Self, RelayError> {
        match body.get("formType") {
            Some(Value::String(tag)) if RegistrationForm::TAGS.contains(&tag.as_str()) => {}
            Some(Value::String(tag)) => return Err(RelayError::UnsupportedFormType(tag.clone())),
            Some(other) => return Err(RelayError::UnsupportedFormType(other.to_string())),
            None => return Err(RelayError::UnsupportedFormType(String::new())),
        }
        decode(body)
    }
}

/// Contact inquiry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactPayload {
    #[serde(deserialize_with = "required_text")]
    pub first_name: String,
    #[serde(default, deserialize_with = "optional_text")]
    pub last_name: Option<String>,
    #[serde(deserialize_with = "required_text")]
    pub email: String,
    #[serde(default, deserialize_with = "optional_text")]
    pub phone: Option<String>,
    #[serde(deserialize_with = "required_text")]
    pub topic: String,
    #[serde(deserialize_with = "required_text")]
    pub message: String,
    #[serde(default, deserialize_with = "optional_text")]
    pub reference_number: Option<String>,
}

/// Confirmation sent back to the person who submitted a form.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmationPayload {
    #[serde(deserialize_with = "required_text")]
    pub recipient_email: String,
    #[serde(deserialize_with = "required_text")]
    pub recipient_name: String,
    #[serde(deserialize_with = "required_text")]
    pub reference: String,
    #[serde(deserialize_with = "required_text")]
    pub subject: String,
}

/// Decode a validated body into its typed payload.
pub fn decode<T: DeserializeOwned>(body: Value) -> Result<T, RelayError> {
    serde_json::from_value(body).map_err(RelayError::InvalidPayload)
}

fn text(value: Value) -> Result<Option<String>, String> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) if s.is_empty() => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Number(n) => Ok(Some(n.to_string())),
        Value::Bool(b) => Ok(Some(b.to_string())),
        Value::Array(_) | Value::Object(_) => {
            Err("expected text, found a JSON array or object".into())
        }
    }
}

fn optional_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    match value {
        Some(v) => text(v).map_err(D::Error::custom),
        None => Ok(None),
    }
}

fn required_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    text(value)
        .map_err(D::Error::custom)?
        .ok_or_else(|| D::Error::custom("required text is empty"))
}
