//! The contact form contract: what `POST /api/contact` must answer for a
//! given payload, and the built-in scenario table that exercises it.

pub mod phone;
pub mod suite;

use serde_json::{json, Value};

use crate::scenario::Payload;

pub use phone::{is_korean_mobile, KOREAN_MOBILE_PATTERN};
pub use suite::{contact_suite, SuiteOptions};

pub const REQUIRED_FIELDS: [&str; 3] = ["name", "phone", "region"];
pub const OPTIONAL_FIELDS: [&str; 1] = ["message"];

pub const STATUS_ACCEPTED: u16 = 200;
pub const STATUS_REJECTED: u16 = 400;
pub const STATUS_SERVER_FAILURE: u16 = 500;

/// Success messages the endpoint is known to answer with, compared case-insensitively.
pub const SUCCESS_MESSAGES: [&str; 3] = ["inquiry submitted successfully", "success", "ok"];

/// The canonical valid submission.
pub fn valid_payload() -> Payload {
    payload_from(json!({
        "name": "Jane Doe",
        "phone": "010-1234-5678",
        "region": "Seoul",
        "message": "I would like more information about your services."
    }))
}

pub(crate) fn payload_from(value: Value) -> Payload {
    match value {
        Value::Object(map) => map,
        _ => Payload::new(),
    }
}

/// Why a payload is rejected, if it is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    MissingField(&'static str),
    InvalidPhone(String),
}

/// Validate a payload the way the endpoint's contract says it is validated.
///
/// Required fields must be non-blank strings; the phone must also be a
/// Korean mobile number.
pub fn validate(payload: &Payload) -> Result<(), Rejection> {
    for field in REQUIRED_FIELDS {
        match payload.get(field) {
            Some(Value::String(s)) if !s.trim().is_empty() => {}
            _ => return Err(Rejection::MissingField(field)),
        }
    }
    if let Some(Value::String(phone)) = payload.get("phone") {
        if !is_korean_mobile(phone) {
            return Err(Rejection::InvalidPhone(phone.clone()));
        }
    }
    Ok(())
}

/// Status the endpoint must answer with when it is healthy.
pub fn expected_status(payload: &Payload) -> u16 {
    match validate(payload) {
        Ok(()) => STATUS_ACCEPTED,
        Err(_) => STATUS_REJECTED,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_payload_is_accepted() {
        assert_eq!(validate(&valid_payload()), Ok(()));
        assert_eq!(expected_status(&valid_payload()), 200);
    }

    #[test]
    fn test_missing_required_field_is_rejected() {
        for field in REQUIRED_FIELDS {
            let mut payload = valid_payload();
            payload.remove(field);
            assert_eq!(validate(&payload), Err(Rejection::MissingField(field)));
            assert_eq!(expected_status(&payload), 400);
        }
    }

    #[test]
    fn test_null_blank_or_numeric_fields_are_rejected() {
        let mut payload = valid_payload();
        payload.insert("phone".into(), Value::Null);
        assert_eq!(validate(&payload), Err(Rejection::MissingField("phone")));

        let mut payload = valid_payload();
        payload.insert("phone".into(), json!(""));
        assert_eq!(expected_status(&payload), 400);

        let mut payload = valid_payload();
        payload.insert("phone".into(), json!(1012345678));
        assert_eq!(expected_status(&payload), 400);

        let mut payload = valid_payload();
        payload.insert("name".into(), json!("   "));
        assert_eq!(validate(&payload), Err(Rejection::MissingField("name")));
    }

    #[test]
    fn test_malformed_phone_is_rejected() {
        let mut payload = valid_payload();
        payload.insert("phone".into(), json!("010 1234 5678"));
        assert_eq!(
            validate(&payload),
            Err(Rejection::InvalidPhone("010 1234 5678".into()))
        );
    }

    #[test]
    fn test_message_is_optional() {
        let mut payload = valid_payload();
        payload.remove("message");
        assert_eq!(expected_status(&payload), 200);
    }
}
