//! The four workflow stages.
//!
//! Each stage takes the prior state by value and returns the next one. All
//! routing goes through [`next_step`]; every call appends exactly one log
//! entry. Persistence is the engine's job.

use serde_json::json;
use tracing::info;

use crate::validator::Validation;

use super::review::ReviewDecision;
use super::state::{
    FinalResult, WorkflowState, NODE_FINALIZE, NODE_INTERPRET, NODE_REVIEW, NODE_VALIDATE,
};
use super::transition::{next_step, Event, ReviewPolicy, TransitionError};

/// Store an extraction result and move to validation.
///
/// # Errors
///
/// Returns [`TransitionError`] unless the state is at `interpret_input`.
pub fn interpret_input(
    mut state: WorkflowState,
    extracted: &str,
    policy: &ReviewPolicy,
) -> Result<WorkflowState, TransitionError> {
    state.current_step = next_step(state.current_step, &Event::Extracted, policy)?;
    let extracted = extracted.trim().to_owned();
    info!(node = NODE_INTERPRET, extracted = %extracted, "candidate extracted");
    state.record(NODE_INTERPRET, json!({ "extracted": extracted }));
    state.llm_response = Some(extracted);
    Ok(state)
}

/// Store a validation verdict and move to human review.
///
/// # Errors
///
/// Returns [`TransitionError`] unless the state is at `validate`.
pub fn validate(
    mut state: WorkflowState,
    validation: &Validation,
    policy: &ReviewPolicy,
) -> Result<WorkflowState, TransitionError> {
    state.current_step = next_step(state.current_step, &Event::Validated, policy)?;
    info!(node = NODE_VALIDATE, is_valid = validation.is_valid, "candidate validated");
    state.tool_output = Some(validation.message.clone());
    state.record(
        NODE_VALIDATE,
        json!({ "is_valid": validation.is_valid, "message": validation.message }),
    );
    Ok(state)
}

/// Apply a human decision.
///
/// `check` is the validation predicate, re-run on corrected values.
///
/// # Errors
///
/// Returns [`TransitionError`] unless the state is at `human_review`.
pub fn human_review(
    mut state: WorkflowState,
    response: &str,
    decision: ReviewDecision,
    check: impl Fn(&str) -> Validation,
    policy: &ReviewPolicy,
) -> Result<WorkflowState, TransitionError> {
    let event = match decision {
        ReviewDecision::Accept => {
            state.approved = true;
            Event::Accepted
        }
        ReviewDecision::Reject => {
            state.approved = false;
            state.attempts = state.attempts.saturating_add(1);
            Event::Rejected {
                attempts: state.attempts,
            }
        }
        ReviewDecision::Correct(value) => {
            let verdict = check(&value);
            state.tool_output = Some(verdict.message);
            state.approved = verdict.is_valid;
            state.llm_response = Some(value);
            Event::Corrected
        }
    };

    state.current_step = next_step(state.current_step, &event, policy)?;
    let feedback = response.trim().to_owned();
    info!(
        node = NODE_REVIEW,
        decision = event.label(),
        approved = state.approved,
        attempts = state.attempts,
        "human review applied"
    );
    state.record(
        NODE_REVIEW,
        json!({ "feedback": feedback, "approved": state.approved }),
    );
    state.human_feedback = Some(feedback);
    Ok(state)
}

/// Build the final record. Terminal; leaves `current_step` at `end`.
pub fn finalize(mut state: WorkflowState) -> (WorkflowState, FinalResult) {
    let result = FinalResult::from_state(&state);
    info!(
        node = NODE_FINALIZE,
        status = %result.status,
        attempts = result.attempts,
        "workflow finalized"
    );
    state.record(
        NODE_FINALIZE,
        json!({
            "final_email": result.final_email,
            "status": result.status,
            "attempts": result.attempts,
        }),
    );
    (state, result)
}
