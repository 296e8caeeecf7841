use serde_json::{json, Value};

use super::{
    expected_status, payload_from, valid_payload, OPTIONAL_FIELDS, REQUIRED_FIELDS,
    STATUS_ACCEPTED, STATUS_SERVER_FAILURE, SUCCESS_MESSAGES,
};
use crate::scenario::{BodyCheck, Payload, Scenario, Suite};

pub const SUITE_NAME: &str = "contact-form";

/// Tag carried by scenarios that only pass while the server is made to fail.
pub const INDUCED_FAILURE_TAG: &str = "induced-failure";

/// Phone values the endpoint must reject. `None` sends JSON null.
const INVALID_PHONES: [Option<&str>; 16] = [
    Some("012-3456-7890"),
    Some("123-4567-8901"),
    Some("abcdefghijk"),
    Some("010-12-345678"),
    Some("010-12345-678"),
    Some("010-12345-6789"),
    Some("019-123-456"),
    Some("010--1234-5678"),
    Some("010-1234-56789"),
    Some("0171234567890"),
    Some("018-12-3456"),
    Some("010-123_4567"),
    Some("010 1234 5678"),
    Some("+82-10-1234-5678"),
    Some(""),
    None,
];

#[derive(Debug, Clone, Default)]
pub struct SuiteOptions {
    /// Add the 500 scenario. Only meaningful while the server is forced to fail.
    pub include_induced_failure: bool,
}

/// Checks every accepted submission must satisfy.
fn accepted_checks(echo: &[&str]) -> Vec<BodyCheck> {
    vec![
        BodyCheck::IsString("message".into()),
        BodyCheck::IsObject("data".into()),
        BodyCheck::Echoes {
            object: "data".into(),
            fields: echo.iter().map(|f| f.to_string()).collect(),
        },
    ]
}

fn contact_payload(name: &str, phone: &str, region: &str, message: Option<&str>) -> Payload {
    let mut payload = payload_from(json!({ "name": name, "phone": phone, "region": region }));
    if let Some(message) = message {
        payload.insert("message".into(), json!(message));
    }
    payload
}

/// The built-in scenario table for the contact endpoint.
pub fn contact_suite(options: &SuiteOptions) -> Vec<Scenario> {
    let all_fields: Vec<&str> = REQUIRED_FIELDS
        .iter()
        .chain(OPTIONAL_FIELDS.iter())
        .copied()
        .collect();
    let mut scenarios = Vec::new();

    scenarios.push(
        Scenario::builder("valid submission is accepted")
            .payload(valid_payload())
            .expect_status(STATUS_ACCEPTED)
            .checks(accepted_checks(&all_fields))
            .check(BodyCheck::OneOf {
                path: "message".into(),
                values: SUCCESS_MESSAGES.iter().map(|m| m.to_string()).collect(),
                ignore_case: true,
            })
            .tags(["success"])
            .build(),
    );

    for field in REQUIRED_FIELDS {
        let mut payload = contact_payload(
            "Test User",
            "010-1234-5678",
            "Seoul",
            Some("This is a test message."),
        );
        payload.remove(field);
        let status = expected_status(&payload);
        scenarios.push(
            Scenario::builder(&format!("missing {} is rejected", field))
                .payload(payload)
                .expect_status(status)
                .tags(["validation", "missing-field"])
                .build(),
        );
    }

    for phone in INVALID_PHONES {
        let mut payload = contact_payload("Test User", "", "Seoul", None);
        let label = match phone {
            Some("") => "empty phone".to_string(),
            Some(p) => format!("phone \"{}\"", p),
            None => "null phone".to_string(),
        };
        payload.insert(
            "phone".into(),
            phone.map_or(Value::Null, |p| Value::String(p.to_string())),
        );
        let status = expected_status(&payload);
        scenarios.push(
            Scenario::builder(&format!("{} is rejected", label))
                .payload(payload)
                .expect_status(status)
                .tags(["validation", "phone"])
                .build(),
        );
    }

    scenarios.push(
        Scenario::builder("submission with message is accepted")
            .payload(contact_payload(
                "Kim Minsoo",
                "010-1234-5678",
                "Seoul",
                Some("I would like more information about your services."),
            ))
            .expect_status(STATUS_ACCEPTED)
            .checks(accepted_checks(&all_fields))
            .tags(["success", "optional-message"])
            .build(),
    );

    scenarios.push(
        Scenario::builder("submission without message is accepted")
            .payload(contact_payload("Lee Jieun", "010-8765-4321", "Busan", None))
            .expect_status(STATUS_ACCEPTED)
            .checks(accepted_checks(&REQUIRED_FIELDS))
            .tags(["success", "optional-message"])
            .build(),
    );

    // The notification is dispatched after validation; its outcome must not
    // leak into the response.
    scenarios.push(
        Scenario::builder("notification outcome does not change the response")
            .payload(contact_payload(
                "Test User",
                "010-1234-5678",
                "Seoul",
                Some("This is a test inquiry for Telegram notification."),
            ))
            .expect_status(STATUS_ACCEPTED)
            .checks(accepted_checks(&all_fields))
            .tags(["success", "notification"])
            .build(),
    );

    scenarios.push(
        Scenario::builder("repeated submission is accepted again")
            .payload(valid_payload())
            .expect_status(STATUS_ACCEPTED)
            .checks(accepted_checks(&all_fields))
            .tags(["success", "resubmission"])
            .build(),
    );

    if options.include_induced_failure {
        scenarios.push(
            Scenario::builder("induced server failure reports an error")
                .payload(contact_payload(
                    "Test User",
                    "010-1234-5678",
                    "Seoul",
                    Some("Testing server error handling"),
                ))
                .expect_status(STATUS_SERVER_FAILURE)
                .check(BodyCheck::AnyNonEmptyString(vec![
                    "error".into(),
                    "message".into(),
                ]))
                .tags([INDUCED_FAILURE_TAG])
                .build(),
        );
    }

    scenarios
}

/// [`contact_suite`] packaged as a [`Suite`] without endpoint overrides.
pub fn builtin_suite(options: &SuiteOptions) -> Suite {
    Suite::new(SUITE_NAME, contact_suite(options))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contact::{is_korean_mobile, STATUS_REJECTED};

    #[test]
    fn test_validation_rows_expect_400() {
        let scenarios = contact_suite(&SuiteOptions::default());
        let validation: Vec<_> = scenarios
            .iter()
            .filter(|s| s.tags().iter().any(|t| t == "validation"))
            .collect();

        assert_eq!(validation.len(), REQUIRED_FIELDS.len() + INVALID_PHONES.len());
        for scenario in validation {
            assert_eq!(
                scenario.expected_status(),
                STATUS_REJECTED,
                "{}",
                scenario.name()
            );
        }
    }

    #[test]
    fn test_invalid_phone_rows_really_are_invalid() {
        for phone in INVALID_PHONES.iter().flatten() {
            assert!(!is_korean_mobile(phone), "{}", phone);
        }
    }

    #[test]
    fn test_null_and_absent_phone_rows() {
        let scenarios = contact_suite(&SuiteOptions::default());
        let null_phone = scenarios
            .iter()
            .find(|s| s.name() == "null phone is rejected")
            .unwrap();
        assert_eq!(null_phone.payload().get("phone"), Some(&Value::Null));

        let missing_phone = scenarios
            .iter()
            .find(|s| s.name() == "missing phone is rejected")
            .unwrap();
        assert!(!missing_phone.payload().contains_key("phone"));
    }

    #[test]
    fn test_success_rows_expect_200_with_json() {
        let scenarios = contact_suite(&SuiteOptions::default());
        for scenario in scenarios.iter().filter(|s| s.tags().iter().any(|t| t == "success")) {
            assert_eq!(scenario.expected_status(), 200);
            assert!(scenario.expects_json());
            assert_eq!(expected_status(scenario.payload()), 200, "{}", scenario.name());
        }
    }

    #[test]
    fn test_without_message_row_omits_message() {
        let scenarios = contact_suite(&SuiteOptions::default());
        let row = scenarios
            .iter()
            .find(|s| s.name() == "submission without message is accepted")
            .unwrap();
        assert!(!row.payload().contains_key("message"));
    }

    #[test]
    fn test_induced_failure_is_opt_in() {
        let default = contact_suite(&SuiteOptions::default());
        assert!(default
            .iter()
            .all(|s| !s.tags().iter().any(|t| t == INDUCED_FAILURE_TAG)));

        let with_failure = contact_suite(&SuiteOptions {
            include_induced_failure: true,
        });
        assert_eq!(with_failure.len(), default.len() + 1);
        let last = with_failure.last().unwrap();
        assert_eq!(last.expected_status(), 500);
    }
}
