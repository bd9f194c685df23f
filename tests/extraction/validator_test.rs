//! Email shape check.

use mailgate::validator::{validate_email, INVALID_MESSAGE, VALID_MESSAGE};

#[test]
fn accepts_ordinary_addresses() {
    for candidate in ["john@example.com", "a.b+tag@sub.domain.org", "x@y.z"] {
        let verdict = validate_email(candidate);
        assert!(verdict.is_valid, "{candidate}");
        assert_eq!(verdict.message, VALID_MESSAGE);
    }
}

#[test]
fn rejects_malformed_candidates() {
    for candidate in ["none", "", "john@", "@example.com", "john@example", "a@@b.com"] {
        let verdict = validate_email(candidate);
        assert!(!verdict.is_valid, "{candidate}");
        assert_eq!(verdict.message, INVALID_MESSAGE);
    }
}

#[test]
fn only_the_prefix_must_match() {
    assert!(validate_email("john@example.com and more text").is_valid);
    assert!(validate_email("a@b.c@d").is_valid);
    assert!(!validate_email("no-at-sign.com").is_valid);
}

#[test]
fn messages_are_fixed_strings() {
    assert_eq!(VALID_MESSAGE, "Valid email");
    assert_eq!(INVALID_MESSAGE, "Invalid email format");
}
