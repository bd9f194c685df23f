//! Validation collaborator: permissive `local@domain.tld` syntax check.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Message for a candidate that passes the syntax check.
pub const VALID_MESSAGE: &str = "Valid email";

/// Message for a candidate that fails the syntax check.
pub const INVALID_MESSAGE: &str = "Invalid email format";

// Anchored at the start only: trailing text after a well-formed prefix passes.
static EMAIL_SHAPE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[^@]+@[^@]+\.[^@]+").ok());

/// Outcome of one syntax check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validation {
    /// Whether the candidate looks like an email address.
    pub is_valid: bool,
    /// Human-readable verdict.
    pub message: String,
}

/// Check `candidate` against the email shape. Pure and total.
pub fn validate_email(candidate: &str) -> Validation {
    let is_valid = EMAIL_SHAPE
        .as_ref()
        .is_some_and(|re| re.is_match(candidate));
    Validation {
        is_valid,
        message: if is_valid { VALID_MESSAGE } else { INVALID_MESSAGE }.to_owned(),
    }
}
