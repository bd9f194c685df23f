//! The workflow's transition table.
//!
//! Every change of [`Step`] goes through [`next_step`]. Stages report what
//! happened as an [`Event`]; they never pick their successor themselves.

use serde::Deserialize;

use super::state::Step;

/// Policy constants for the human review stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ReviewPolicy {
    /// Rejections after which the run ends instead of retrying.
    pub max_rejections: u32,
    /// Whether a response other than `y`/`n` is taken as a corrected email.
    pub accept_corrections: bool,
}

impl Default for ReviewPolicy {
    fn default() -> Self {
        Self {
            max_rejections: 2,
            accept_corrections: true,
        }
    }
}

/// What a stage reports after running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// A fresh run is kicked off.
    Begin,
    /// Extraction stored a candidate.
    Extracted,
    /// Validation stored its verdict.
    Validated,
    /// The human accepted the candidate.
    Accepted,
    /// The human rejected the candidate; `attempts` is the updated count.
    Rejected {
        /// Rejection count including this one.
        attempts: u32,
    },
    /// The human supplied a replacement value.
    Corrected,
}

impl Event {
    /// Short label used in errors and diagrams.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Begin => "begin",
            Self::Extracted => "extracted",
            Self::Validated => "validated",
            Self::Accepted => "accepted",
            Self::Rejected { .. } => "rejected",
            Self::Corrected => "corrected",
        }
    }
}

/// Raised for a `(step, event)` pair with no edge.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("no transition from '{from}' on '{event}'")]
pub struct TransitionError {
    /// Step the machine was in.
    pub from: Step,
    /// Label of the offending event.
    pub event: &'static str,
}

/// Resolve the successor of `from` given `event`.
///
/// # Errors
///
/// Returns [`TransitionError`] when the table has no such edge.
pub fn next_step(from: Step, event: &Event, policy: &ReviewPolicy) -> Result<Step, TransitionError> {
    match (from, event) {
        (Step::Start, Event::Begin) => Ok(Step::InterpretInput),
        (Step::InterpretInput, Event::Extracted) => Ok(Step::Validate),
        (Step::Validate, Event::Validated) => Ok(Step::HumanReview),
        (Step::HumanReview, Event::Accepted | Event::Corrected) => Ok(Step::End),
        (Step::HumanReview, Event::Rejected { attempts }) => {
            if *attempts >= policy.max_rejections {
                Ok(Step::End)
            } else {
                Ok(Step::InterpretInput)
            }
        }
        _ => Err(TransitionError {
            from,
            event: event.label(),
        }),
    }
}
