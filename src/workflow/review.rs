//! Human review: prompt contents, response interpretation, and the
//! [`Reviewer`] seam front-ends implement.

use async_trait::async_trait;

use super::state::WorkflowState;
use super::transition::ReviewPolicy;

/// Interpreted human response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewDecision {
    /// `y`: accept the candidate.
    Accept,
    /// `n`: reject and retry (within the bound).
    Reject,
    /// Anything else: a replacement email.
    Correct(String),
}

impl ReviewDecision {
    /// Interpret a raw response: trimmed, then `y`/`n` matched case-insensitively.
    ///
    /// Returns `None` for free text when corrections are disabled.
    pub fn parse(raw: &str, policy: &ReviewPolicy) -> Option<Self> {
        let response = raw.trim();
        if response.eq_ignore_ascii_case("y") {
            Some(Self::Accept)
        } else if response.eq_ignore_ascii_case("n") {
            Some(Self::Reject)
        } else if policy.accept_corrections {
            Some(Self::Correct(response.to_owned()))
        } else {
            None
        }
    }
}

/// What the human sees.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewPrompt {
    /// Extracted candidate.
    pub extracted: String,
    /// Validation verdict.
    pub validation: String,
    /// Rejections so far.
    pub attempts: u32,
    /// Whether free text is accepted as a correction.
    pub accepts_corrections: bool,
}

impl ReviewPrompt {
    /// Build the prompt for a state awaiting review.
    pub fn from_state(state: &WorkflowState, policy: &ReviewPolicy) -> Self {
        Self {
            extracted: state.llm_response.clone().unwrap_or_default(),
            validation: state.tool_output.clone().unwrap_or_default(),
            attempts: state.attempts,
            accepts_corrections: policy.accept_corrections,
        }
    }

    /// The question line shown before reading a response.
    pub fn question(&self) -> &'static str {
        if self.accepts_corrections {
            "Approve? (y/n) or enter corrected email: "
        } else {
            "Approve? (y/n): "
        }
    }
}

/// A source of human decisions.
#[async_trait]
pub trait Reviewer: Send + Sync {
    /// Show `prompt` and return one raw line of response.
    ///
    /// # Errors
    ///
    /// Returns an error when no response can be obtained (e.g. closed input).
    async fn review(&self, prompt: &ReviewPrompt) -> anyhow::Result<String>;

    /// Called when a response was not understood; the prompt is shown again.
    fn unrecognized(&self, _response: &str) {}
}
