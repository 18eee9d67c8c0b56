//! Field-level validation shared by every create/update path.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} required")]
    Missing(String),
    #[error("Invalid email format")]
    InvalidEmail,
}

/// Returns the trimmed value when present and non-blank.
pub fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Checks that every `(field, value)` pair is filled in.
///
/// The error names all of them, e.g. `"company_name and contact_name are required"`,
/// whichever one is missing.
pub fn require(fields: &[(&str, Option<&str>)]) -> Result<(), ValidationError> {
    if fields.iter().all(|(_, value)| present(*value).is_some()) {
        return Ok(());
    }

    let names: Vec<&str> = fields.iter().map(|(name, _)| *name).collect();
    let message = match names.as_slice() {
        [single] => format!("{single} is"),
        [init @ .., last] => format!("{} and {last} are", init.join(", ")),
        [] => "fields are".to_string(),
    };
    Err(ValidationError::Missing(message))
}

/// `local@domain.tld`: word runs joined by single `.` or `-`, ending in one or
/// more 2-3 character labels. `\w` is ASCII only, as browsers apply it.
static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?-u)^\w+([\.-]?\w+)*@\w+([\.-]?\w+)*(\.\w{2,3})+$").expect("Invalid regex")
});

/// Email check used by the client and hosting schemas.
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// Empty emails are allowed; anything else must be well-formed.
pub fn optional_email(email: &str) -> Result<(), ValidationError> {
    if email.is_empty() || is_valid_email(email) {
        Ok(())
    } else {
        Err(ValidationError::InvalidEmail)
    }
}
