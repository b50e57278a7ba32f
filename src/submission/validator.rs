use regex::Regex;
use std::sync::LazyLock;

use crate::error::SubmitError;

use super::record::SubmissionRecord;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\S+@\S+\.\S+$").unwrap());

/// Check the required-field contract.
///
/// Stops at the first required field (in declared order) that is absent,
/// blank or an empty selection. An empty `required` list skips that check.
/// A present `email` must look like `local@domain.tld`; a repeated `email`
/// entry is checked as its joined cell text and so never passes.
pub fn validate(record: &SubmissionRecord, required: &[String]) -> Result<(), SubmitError> {
    if required.is_empty() {
        tracing::debug!("No required fields configured, skipping required check");
    }

    for field in required {
        let missing = record.get(field).is_none_or(|v| v.is_blank());
        if missing {
            return Err(SubmitError::Validation {
                field: Some(field.clone()),
                message: format!("Field \"{field}\" is required"),
            });
        }
    }

    if let Some(email) = record.get("email").map(|v| v.to_cell()) {
        if !email.is_empty() && !is_valid_email(&email) {
            return Err(SubmitError::Validation {
                field: Some("email".to_string()),
                message: "Invalid email format".to_string(),
            });
        }
    }

    Ok(())
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}
