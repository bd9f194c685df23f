//! Workflow state record, execution log entries, and the run's final record.
//!
//! [`WorkflowState`] is persisted verbatim as the JSON snapshot, so its
//! serde shape is the on-disk contract.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Log node name for the extraction stage.
pub const NODE_INTERPRET: &str = "interpret_input";
/// Log node name for the validation stage.
pub const NODE_VALIDATE: &str = "validate_email_tool";
/// Log node name for the human review stage.
pub const NODE_REVIEW: &str = "human_review";
/// Log node name for the finalization stage.
pub const NODE_FINALIZE: &str = "finalize";

/// The stage that runs next.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    /// Fresh run; nothing executed yet.
    #[default]
    Start,
    /// Extraction is next.
    InterpretInput,
    /// Validation is next.
    Validate,
    /// Waiting for a human decision.
    HumanReview,
    /// Terminal: finalization runs (or has run).
    End,
}

impl Step {
    /// Snake-case name, identical to the serialized form.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::InterpretInput => "interpret_input",
            Self::Validate => "validate",
            Self::HumanReview => "human_review",
            Self::End => "end",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One stage invocation in the execution log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Stage node name.
    pub node: String,
    /// Seconds since the Unix epoch.
    pub timestamp: f64,
    /// Stage-specific details.
    pub details: Value,
}

impl LogEntry {
    /// Create an entry stamped with the current time.
    pub fn now(node: &str, details: Value) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or_default();
        Self {
            node: node.to_owned(),
            timestamp,
            details,
        }
    }
}

/// Complete state of one extraction run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowState {
    /// Raw text supplied at run start.
    pub user_input: String,
    /// Stage that runs next.
    pub current_step: Step,
    /// Latest candidate email (from extraction or a human correction).
    pub llm_response: Option<String>,
    /// Latest validation message.
    pub tool_output: Option<String>,
    /// Latest raw human response.
    pub human_feedback: Option<String>,
    /// True once a human accepted or supplied a valid correction.
    pub approved: bool,
    /// Number of rejections so far.
    pub attempts: u32,
    /// Append-only audit trail, oldest first.
    pub execution_log: Vec<LogEntry>,
}

impl WorkflowState {
    /// Fresh state for a new run over `user_input`.
    pub fn new(user_input: impl Into<String>) -> Self {
        Self {
            user_input: user_input.into(),
            ..Self::default()
        }
    }

    /// Append one log entry.
    pub fn record(&mut self, node: &str, details: Value) {
        self.execution_log.push(LogEntry::now(node, details));
    }

    /// Whether finalization has already run for this state.
    pub fn is_finalized(&self) -> bool {
        self.execution_log
            .last()
            .is_some_and(|entry| entry.node == NODE_FINALIZE)
    }
}

/// Outcome of a finished run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// The human accepted the value or corrected it validly.
    Approved,
    /// Rejected, out of attempts, or an invalid correction.
    Rejected,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Approved => f.write_str("approved"),
            Self::Rejected => f.write_str("rejected"),
        }
    }
}

/// The run's output record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalResult {
    /// Last candidate email.
    pub final_email: Option<String>,
    /// Approval status.
    pub status: Status,
    /// Rejection count.
    pub attempts: u32,
}

impl FinalResult {
    /// Package the result fields of `state`.
    pub fn from_state(state: &WorkflowState) -> Self {
        Self {
            final_email: state.llm_response.clone(),
            status: if state.approved {
                Status::Approved
            } else {
                Status::Rejected
            },
            attempts: state.attempts,
        }
    }
}
