//! Message formatting: payload in, `OutboundMessage` out.
//!
//! Formatting is pure. User input is only ever substituted as data: plain-text bodies are
//! built with `format!`, and the HTML confirmation goes through a Handlebars template whose
//! values are HTML-escaped.

use handlebars::Handlebars;
use once_cell::sync::OnceCell;
use serde_json::json;

use crate::{
    email::EmailError,
    forms::{ConfirmationPayload, ContactPayload, RegistrationForm, RegistrationPayload},
};

const CONFIRMATION_TEMPLATE: &str = include_str!("templates/confirmation.hbs");
const LOGO_URL: &str = "https://cohesionafrica.com/assets/cohesion_logo-C7iedy-3.png";
const PRIMARY_COLOR: &str = "#1D4ED8";
const NOT_AVAILABLE: &str = "N/A";

static REGISTRY: OnceCell<Handlebars<'static>> = OnceCell::new();

/// Where a message goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recipient {
    /// The configured internal inbox.
    Internal,
    /// An address supplied by the submitter.
    Address(String),
}

/// One email, built once per request. The sender is always the configured `from`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub to: Recipient,
    pub reply_to: Option<String>,
    pub subject: String,
    pub text: String,
    pub html: Option<String>,
}

/// Internal notification for a tournament registration.
pub fn registration(payload: &RegistrationPayload) -> OutboundMessage {
    let form_type = payload.form.form_type();
    let reference = &payload.reference_number;
    let details: String = registration_details(payload)
        .into_iter()
        .map(|(label, value)| format!("{label}: {value}\n"))
        .collect();

    OutboundMessage {
        to: Recipient::Internal,
        reply_to: Some(payload.email.clone()),
        subject: format!("New Tournament Registration: {form_type} (Ref: {reference})"),
        text: format!(
            "=== New Tournament Registration: {form_type} ===\n\nReference Number: {reference}\n\n{details}"
        ),
        html: None,
    }
}

fn registration_details(payload: &RegistrationPayload) -> Vec<(&'static str, String)> {
    let email = payload.email.clone();
    match &payload.form {
        RegistrationForm::Solo(e) => vec![
            ("Name", or_na(&e.name)),
            ("Date of Birth", or_na(&e.dob)),
            ("Position", or_na(&e.position)),
            ("Category", or_na(&e.category)),
            ("Gender", or_na(&e.gender)),
            ("City", or_na(&e.city)),
        ],
        RegistrationForm::Team(e) => vec![
            ("Team Name", or_na(&e.team_name)),
            ("Category", or_na(&e.category)),
            ("Gender", or_na(&e.gender)),
            ("City", or_na(&e.city)),
            ("Manager Name", or_na(&e.manager_name)),
            ("Manager Email", email),
            ("Manager Phone", or_na(&e.phone)),
        ],
        RegistrationForm::Coach(e) => vec![
            ("Name", or_na(&e.name)),
            ("Certifications", or_na(&e.certs)),
            ("Experience (Years)", or_na(&e.exp)),
            ("City", or_na(&e.city)),
            ("Email", email),
            ("Phone", or_na(&e.phone)),
        ],
        RegistrationForm::Other(e) => vec![
            ("Role", format!("{} (Volunteer/Sponsor/Media)", or_na(&e.category))),
            ("Name/Organization", or_na(&e.name)),
            ("Email", email),
            ("Phone", or_na(&e.phone)),
        ],
    }
}

/// Internal notification for a contact inquiry.
pub fn contact(payload: &ContactPayload) -> OutboundMessage {
    let name = match &payload.last_name {
        Some(last) => format!("{} {last}", payload.first_name),
        None => payload.first_name.clone(),
    };
    let text = format!(
        "New contact form submission:\n\n\
         Reference Number: {reference}\n\
         Name: {name}\n\
         Email: {email}\n\
         Phone: {phone}\n\
         Topic: {topic}\n\n\
         Message:\n{message}\n",
        reference = or_na(&payload.reference_number),
        email = payload.email,
        phone = or_na(&payload.phone),
        topic = payload.topic,
        message = payload.message,
    );

    OutboundMessage {
        to: Recipient::Internal,
        reply_to: Some(payload.email.clone()),
        subject: format!("New Inquiry: {}", payload.topic),
        text,
        html: None,
    }
}

/// Confirmation to the submitter: HTML body plus a plain-text alternative.
pub fn confirmation(payload: &ConfirmationPayload) -> Result<OutboundMessage, EmailError> {
    let html = registry()?
        .render(
            "confirmation",
            &json!({
                "logo_url": LOGO_URL,
                "primary_color": PRIMARY_COLOR,
                "subject": payload.subject,
                "name": payload.recipient_name,
                "reference": payload.reference,
            }),
        )
        .map_err(|e| EmailError::RenderError(e.to_string()))?;

    let text = format!(
        "Hello {name},\n\n\
         Thank you for reaching out to Cohession Africa. We've received your message. \
         Your Reference Number is: {reference}.\n\n\
         We aim to respond within 24-48 business hours.\n\n\
         Best regards,\nThe Cohession Africa Team",
        name = payload.recipient_name,
        reference = payload.reference,
    );

    Ok(OutboundMessage {
        to: Recipient::Address(payload.recipient_email.clone()),
        reply_to: None,
        subject: payload.subject.clone(),
        text,
        html: Some(html),
    })
}

/// Handlebars registry in strict mode, compiled on first use.
fn registry() -> Result<&'static Handlebars<'static>, EmailError> {
    REGISTRY.get_or_try_init(|| {
        let mut reg = Handlebars::new();
        reg.set_strict_mode(true);
        reg.register_template_string("confirmation", CONFIRMATION_TEMPLATE)
            .map_err(|e| EmailError::RenderError(e.to_string()))?;
        Ok(reg)
    })
}

fn or_na(value: &Option<String>) -> String {
    value.as_deref().unwrap_or(NOT_AVAILABLE).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms::{CoachEntry, OtherEntry, SoloEntry, TeamEntry};

    fn registration_payload(form: RegistrationForm) -> RegistrationPayload {
        RegistrationPayload {
            email: "ada@example.com".into(),
            reference_number: "CA-2025-0042".into(),
            form,
        }
    }

    fn some(s: &str) -> Option<String> {
        Some(s.to_string())
    }

    fn assert_contains_all(text: &str, needles: &[&str]) {
        for needle in needles {
            assert!(text.contains(needle), "missing `{needle}` in:\n{text}");
        }
    }

    #[test]
    fn solo_lists_every_field() {
        let msg = registration(&registration_payload(RegistrationForm::Solo(SoloEntry {
            name: some("Ada Obi"),
            dob: some("2008-04-02"),
            position: some("Goalkeeper"),
            category: some("U17"),
            gender: some("Female"),
            city: some("Accra"),
        })));

        assert_eq!(msg.to, Recipient::Internal);
        assert_eq!(msg.reply_to.as_deref(), Some("ada@example.com"));
        assert_eq!(msg.subject, "New Tournament Registration: SOLO (Ref: CA-2025-0042)");
        assert!(msg.text.starts_with("=== New Tournament Registration: SOLO ==="));
        assert_contains_all(
            &msg.text,
            &[
                "Reference Number: CA-2025-0042",
                "Name: Ada Obi\n",
                "Date of Birth: 2008-04-02\n",
                "Position: Goalkeeper\n",
                "Category: U17\n",
                "Gender: Female\n",
                "City: Accra\n",
            ],
        );
        assert!(msg.html.is_none());
    }

    #[test]
    fn team_uses_common_email_for_manager() {
        let msg = registration(&registration_payload(RegistrationForm::Team(TeamEntry {
            team_name: some("Lagos Lions"),
            category: some("U20"),
            gender: some("Male"),
            city: some("Lagos"),
            manager_name: some("Tunde"),
            phone: some("+234 800 000 0000"),
        })));

        assert_contains_all(
            &msg.text,
            &[
                "CA-2025-0042",
                "Team Name: Lagos Lions\n",
                "Category: U20\n",
                "Gender: Male\n",
                "City: Lagos\n",
                "Manager Name: Tunde\n",
                "Manager Email: ada@example.com\n",
                "Manager Phone: +234 800 000 0000\n",
            ],
        );
    }

    #[test]
    fn coach_fills_missing_certs_and_experience_with_na() {
        let msg = registration(&registration_payload(RegistrationForm::Coach(CoachEntry {
            name: some("Kofi"),
            certs: None,
            exp: None,
            city: some("Kumasi"),
            phone: some("0244"),
        })));

        assert_contains_all(
            &msg.text,
            &[
                "CA-2025-0042",
                "Name: Kofi\n",
                "Certifications: N/A\n",
                "Experience (Years): N/A\n",
                "City: Kumasi\n",
                "Email: ada@example.com\n",
                "Phone: 0244\n",
            ],
        );
    }

    #[test]
    fn other_labels_the_role() {
        let msg = registration(&registration_payload(RegistrationForm::Other(OtherEntry {
            category: some("Sponsor"),
            name: some("Acme Ltd"),
            phone: some("0700"),
        })));

        assert_contains_all(
            &msg.text,
            &[
                "CA-2025-0042",
                "Role: Sponsor (Volunteer/Sponsor/Media)\n",
                "Name/Organization: Acme Ltd\n",
                "Email: ada@example.com\n",
                "Phone: 0700\n",
            ],
        );
        assert_eq!(msg.subject, "New Tournament Registration: OTHER (Ref: CA-2025-0042)");
    }

    fn contact_payload() -> ContactPayload {
        ContactPayload {
            first_name: "Ada".into(),
            last_name: None,
            email: "ada@example.com".into(),
            phone: None,
            topic: "Partnership".into(),
            message: "Hello".into(),
            reference_number: None,
        }
    }

    #[test]
    fn contact_omits_absent_optional_fields() {
        let msg = contact(&contact_payload());

        assert_eq!(msg.subject, "New Inquiry: Partnership");
        assert_eq!(msg.reply_to.as_deref(), Some("ada@example.com"));
        assert_eq!(
            msg.text,
            "New contact form submission:\n\n\
             Reference Number: N/A\n\
             Name: Ada\n\
             Email: ada@example.com\n\
             Phone: N/A\n\
             Topic: Partnership\n\n\
             Message:\nHello\n"
        );
    }

    #[test]
    fn contact_includes_present_optional_fields() {
        let msg = contact(&ContactPayload {
            last_name: some("Lovelace"),
            phone: some("+44 20 0000"),
            reference_number: some("INQ-7"),
            ..contact_payload()
        });
        assert_contains_all(
            &msg.text,
            &["Name: Ada Lovelace\n", "Phone: +44 20 0000\n", "Reference Number: INQ-7\n"],
        );
    }

    #[test]
    fn template_syntax_in_user_text_is_literal() {
        let msg = contact(&ContactPayload {
            message: "{{topic}} {0} {name}".into(),
            ..contact_payload()
        });
        assert!(msg.text.contains("Message:\n{{topic}} {0} {name}\n"));

        let msg = confirmation(&ConfirmationPayload {
            recipient_email: "ada@example.com".into(),
            recipient_name: "{{reference}}".into(),
            reference: "CA-1".into(),
            subject: "Thanks".into(),
        })
        .unwrap();
        assert!(msg.html.unwrap().contains("Hello {{reference}},"));
    }

    #[test]
    fn confirmation_has_html_and_text_with_the_same_details() {
        let msg = confirmation(&ConfirmationPayload {
            recipient_email: "ada@example.com".into(),
            recipient_name: "Ada".into(),
            reference: "CA-2025-0042".into(),
            subject: "We received your registration".into(),
        })
        .unwrap();

        assert_eq!(msg.to, Recipient::Address("ada@example.com".into()));
        assert_eq!(msg.reply_to, None);
        assert_eq!(msg.subject, "We received your registration");
        let html = msg.html.unwrap();
        assert_contains_all(
            &html,
            &[
                LOGO_URL,
                "<h1 style=\"font-size: 24px; color: #1D4ED8; margin-top: 0;\">We received your registration</h1>",
                "Hello Ada,",
                "<strong>CA-2025-0042</strong>",
            ],
        );
        assert_contains_all(
            &msg.text,
            &["Hello Ada,", "Your Reference Number is: CA-2025-0042."],
        );
    }

    #[test]
    fn confirmation_escapes_markup() {
        let msg = confirmation(&ConfirmationPayload {
            recipient_email: "ada@example.com".into(),
            recipient_name: "<script>alert(1)</script>".into(),
            reference: "R&D-1".into(),
            subject: "Hi".into(),
        })
        .unwrap();
        let html = msg.html.unwrap();
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("R&amp;D-1"));
        // plain text carries the raw value
        assert!(msg.text.contains("Hello <script>alert(1)</script>,"));
    }

    #[test]
    fn formatting_is_deterministic() {
        let payload = registration_payload(RegistrationForm::Solo(SoloEntry::default()));
        assert_eq!(registration(&payload), registration(&payload));
        assert_eq!(contact(&contact_payload()), contact(&contact_payload()));

        let confirm = ConfirmationPayload {
            recipient_email: "ada@example.com".into(),
            recipient_name: "Ada".into(),
            reference: "CA-1".into(),
            subject: "Thanks".into(),
        };
        assert_eq!(confirmation(&confirm).unwrap(), confirmation(&confirm).unwrap());
    }
}
