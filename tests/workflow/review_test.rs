//! Response interpretation and prompt contents.

use mailgate::workflow::{ReviewDecision, ReviewPolicy, ReviewPrompt, WorkflowState};

fn strict() -> ReviewPolicy {
    ReviewPolicy {
        accept_corrections: false,
        ..ReviewPolicy::default()
    }
}

#[test]
fn yes_and_no_are_case_insensitive_and_trimmed() {
    let policy = ReviewPolicy::default();
    assert_eq!(ReviewDecision::parse("y", &policy), Some(ReviewDecision::Accept));
    assert_eq!(ReviewDecision::parse(" Y \n", &policy), Some(ReviewDecision::Accept));
    assert_eq!(ReviewDecision::parse("n", &policy), Some(ReviewDecision::Reject));
    assert_eq!(ReviewDecision::parse("N", &policy), Some(ReviewDecision::Reject));
}

#[test]
fn other_text_is_a_correction() {
    let policy = ReviewPolicy::default();
    assert_eq!(
        ReviewDecision::parse("  me@here.io ", &policy),
        Some(ReviewDecision::Correct("me@here.io".to_owned()))
    );
    assert_eq!(
        ReviewDecision::parse("yes", &policy),
        Some(ReviewDecision::Correct("yes".to_owned()))
    );
    assert_eq!(
        ReviewDecision::parse("", &policy),
        Some(ReviewDecision::Correct(String::new()))
    );
}

#[test]
fn other_text_is_refused_without_corrections() {
    assert_eq!(ReviewDecision::parse("me@here.io", &strict()), None);
    assert_eq!(ReviewDecision::parse("y", &strict()), Some(ReviewDecision::Accept));
}

#[test]
fn prompt_carries_state_fields() {
    let mut state = WorkflowState::new("text");
    state.llm_response = Some("a@b.com".to_owned());
    state.tool_output = Some("Valid email".to_owned());
    state.attempts = 1;

    let prompt = ReviewPrompt::from_state(&state, &ReviewPolicy::default());

    assert_eq!(prompt.extracted, "a@b.com");
    assert_eq!(prompt.validation, "Valid email");
    assert_eq!(prompt.attempts, 1);
    assert_eq!(prompt.question(), "Approve? (y/n) or enter corrected email: ");
}

#[test]
fn strict_prompt_asks_yes_or_no() {
    let prompt = ReviewPrompt::from_state(&WorkflowState::default(), &strict());
    assert_eq!(prompt.extracted, "");
    assert!(!prompt.accepts_corrections);
    assert_eq!(prompt.question(), "Approve? (y/n): ");
}
