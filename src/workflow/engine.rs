//! Workflow driver.
//!
//! Runs stages in the order the transition table dictates, persisting the
//! snapshot after every one. Human review is a suspend/resume boundary:
//! [`Workflow::advance`] stops with [`RunOutcome::AwaitingReview`] and
//! [`Workflow::resume`] picks up from the human's answer, so a run can span
//! several processes. [`Workflow::run`] drives both halves for interactive
//! front-ends.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::extractor::Extractor;
use crate::validator::validate_email;

use super::review::{ReviewDecision, ReviewPrompt, Reviewer};
use super::stages;
use super::state::{FinalResult, Step, WorkflowState};
use super::store::{reset_snapshot, StateStore, StoreError};
use super::transition::{next_step, Event, ReviewPolicy, TransitionError};

/// Errors that stop a run.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    /// The snapshot could not be persisted.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// A stage reported an event with no edge from the current step.
    #[error(transparent)]
    Transition(#[from] TransitionError),
    /// A stage's required input is empty.
    #[error("cannot run '{step}': '{field}' is not set")]
    MissingField {
        /// Step that needed the field.
        step: Step,
        /// Missing field name.
        field: &'static str,
    },
    /// `resume` was called on a state that is not waiting for a human.
    #[error("workflow is at '{step}', not awaiting review")]
    NotAwaitingReview {
        /// Current step.
        step: Step,
    },
    /// Free-text response while corrections are disabled.
    #[error("unrecognized response '{response}', expected 'y' or 'n'")]
    UnrecognizedResponse {
        /// The trimmed response.
        response: String,
    },
    /// The reviewer could not produce a response.
    #[error("reviewer failed: {0}")]
    Reviewer(String),
    /// The snapshot holds no run to continue.
    #[error("no saved run to continue, start one first")]
    NothingToContinue,
}

/// Where a run stopped.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// Suspended at human review.
    AwaitingReview {
        /// Persisted state.
        state: WorkflowState,
        /// What to show the human.
        prompt: ReviewPrompt,
    },
    /// Finalization ran.
    Finished {
        /// Persisted state.
        state: WorkflowState,
        /// The run's output record.
        result: FinalResult,
    },
}

/// The extraction/validation/review workflow with injected collaborators.
pub struct Workflow {
    extractor: Arc<dyn Extractor>,
    store: Arc<dyn StateStore>,
    policy: ReviewPolicy,
}

impl Workflow {
    /// Assemble a workflow.
    pub fn new(
        extractor: Arc<dyn Extractor>,
        store: Arc<dyn StateStore>,
        policy: ReviewPolicy,
    ) -> Self {
        Self {
            extractor,
            store,
            policy,
        }
    }

    /// Active review policy.
    pub fn policy(&self) -> &ReviewPolicy {
        &self.policy
    }

    /// Last persisted snapshot (or the empty state).
    pub fn load(&self) -> WorkflowState {
        self.store.load()
    }

    fn commit(&self, state: &WorkflowState) -> Result<(), WorkflowError> {
        self.store.save(state).map_err(|e| {
            warn!(error = %e, "failed to persist workflow state");
            WorkflowError::from(e)
        })
    }

    /// Begin a fresh run over `user_input` and persist it.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Store`] if the snapshot cannot be written.
    pub fn start(&self, user_input: &str) -> Result<WorkflowState, WorkflowError> {
        let state = WorkflowState::new(user_input);
        info!(input_len = user_input.len(), "workflow started");
        self.commit(&state)?;
        Ok(state)
    }

    /// Overwrite the snapshot with the canonical empty state.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Store`] if the snapshot cannot be written.
    pub fn reset(&self) -> Result<WorkflowState, WorkflowError> {
        let state = reset_snapshot(self.store.as_ref())?;
        info!("workflow state reset");
        Ok(state)
    }

    /// Run stages until human input is needed or the run is finalized.
    ///
    /// A state that was already finalized is returned as-is with its
    /// result; finalization never runs twice.
    ///
    /// # Errors
    ///
    /// Returns a [`WorkflowError`] on persistence failure, a missing input,
    /// or an impossible transition.
    pub async fn advance(&self, mut state: WorkflowState) -> Result<RunOutcome, WorkflowError> {
        loop {
            debug!(step = %state.current_step, "advancing");
            match state.current_step {
                Step::Start => {
                    state.current_step = next_step(Step::Start, &Event::Begin, &self.policy)?;
                }
                Step::InterpretInput => {
                    if state.user_input.trim().is_empty() {
                        return Err(WorkflowError::MissingField {
                            step: Step::InterpretInput,
                            field: "user_input",
                        });
                    }
                    let extracted = self.extractor.extract(&state.user_input).await;
                    state = stages::interpret_input(state, &extracted, &self.policy)?;
                    self.commit(&state)?;
                }
                Step::Validate => {
                    let Some(candidate) = state.llm_response.as_deref() else {
                        return Err(WorkflowError::MissingField {
                            step: Step::Validate,
                            field: "llm_response",
                        });
                    };
                    let verdict = validate_email(candidate);
                    state = stages::validate(state, &verdict, &self.policy)?;
                    self.commit(&state)?;
                }
                Step::HumanReview => {
                    let prompt = ReviewPrompt::from_state(&state, &self.policy);
                    return Ok(RunOutcome::AwaitingReview { state, prompt });
                }
                Step::End => {
                    if state.is_finalized() {
                        let result = FinalResult::from_state(&state);
                        return Ok(RunOutcome::Finished { state, result });
                    }
                    let (done, result) = stages::finalize(state);
                    self.commit(&done)?;
                    return Ok(RunOutcome::Finished {
                        state: done,
                        result,
                    });
                }
            }
        }
    }

    /// Pick up the persisted run where it stopped.
    ///
    /// Stages that already ran are not repeated: a snapshot saved at
    /// `validate` resumes with validation, one saved at `end` without a
    /// `finalize` entry is finalized. A finished snapshot returns its result.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::NothingToContinue`] when the snapshot is the
    /// empty state, or any error from [`Workflow::advance`].
    pub async fn continue_saved(&self) -> Result<RunOutcome, WorkflowError> {
        let state = self.store.load();
        if state.current_step == Step::Start && state.user_input.trim().is_empty() {
            return Err(WorkflowError::NothingToContinue);
        }
        info!(
            step = %state.current_step,
            log_len = state.execution_log.len(),
            "continuing saved run"
        );
        self.advance(state).await
    }

    /// Apply a human response to a suspended state, then keep advancing.
    ///
    /// An unrecognized response leaves both `state` and the snapshot untouched.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::NotAwaitingReview`] unless the state is at
    /// `human_review`, [`WorkflowError::UnrecognizedResponse`] for free text
    /// with corrections disabled, or any error from [`Workflow::advance`].
    pub async fn resume(
        &self,
        state: WorkflowState,
        response: &str,
    ) -> Result<RunOutcome, WorkflowError> {
        if state.current_step != Step::HumanReview {
            return Err(WorkflowError::NotAwaitingReview {
                step: state.current_step,
            });
        }
        let decision = ReviewDecision::parse(response, &self.policy).ok_or_else(|| {
            WorkflowError::UnrecognizedResponse {
                response: response.trim().to_owned(),
            }
        })?;
        self.apply_review(state, response, decision).await
    }

    async fn apply_review(
        &self,
        state: WorkflowState,
        response: &str,
        decision: ReviewDecision,
    ) -> Result<RunOutcome, WorkflowError> {
        let state = stages::human_review(state, response, decision, validate_email, &self.policy)?;
        self.commit(&state)?;
        self.advance(state).await
    }

    /// Run to completion, asking `reviewer` at every review point.
    ///
    /// # Errors
    ///
    /// Returns a [`WorkflowError`] on persistence failure or when the
    /// reviewer cannot answer.
    pub async fn run(
        &self,
        user_input: &str,
        reviewer: &dyn Reviewer,
    ) -> Result<(WorkflowState, FinalResult), WorkflowError> {
        let mut outcome = self.advance(self.start(user_input)?).await?;
        loop {
            match outcome {
                RunOutcome::Finished { state, result } => return Ok((state, result)),
                RunOutcome::AwaitingReview { state, prompt } => {
                    let response = reviewer
                        .review(&prompt)
                        .await
                        .map_err(|e| WorkflowError::Reviewer(format!("{e:#}")))?;
                    match ReviewDecision::parse(&response, &self.policy) {
                        Some(decision) => {
                            outcome = self.apply_review(state, &response, decision).await?;
                        }
                        None => {
                            reviewer.unrecognized(response.trim());
                            outcome = RunOutcome::AwaitingReview { state, prompt };
                        }
                    }
                }
            }
        }
    }
}
