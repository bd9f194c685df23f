//! Scripted collaborators shared by the workflow tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use mailgate::extractor::{Extractor, NONE_SENTINEL};
use mailgate::workflow::{
    ReviewPolicy, ReviewPrompt, Reviewer, StateStore, StoreError, Workflow, WorkflowState,
};

/// In-process store that counts saves.
#[derive(Default)]
pub struct MemoryStore {
    snapshot: Mutex<Option<WorkflowState>>,
    saves: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeding is not counted as a save.
    pub fn with_snapshot(state: WorkflowState) -> Self {
        Self {
            snapshot: Mutex::new(Some(state)),
            saves: AtomicUsize::new(0),
        }
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

impl StateStore for MemoryStore {
    fn load(&self) -> WorkflowState {
        self.snapshot
            .lock()
            .expect("snapshot lock")
            .clone()
            .unwrap_or_default()
    }

    fn save(&self, state: &WorkflowState) -> Result<(), StoreError> {
        *self.snapshot.lock().expect("snapshot lock") = Some(state.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Extractor replaying a fixed list of answers, then the sentinel.
#[derive(Default)]
pub struct ScriptedExtractor {
    answers: Mutex<VecDeque<String>>,
    calls: AtomicUsize,
}

impl ScriptedExtractor {
    pub fn new(answers: &[&str]) -> Self {
        Self {
            answers: Mutex::new(answers.iter().map(|a| (*a).to_owned()).collect()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Extractor for ScriptedExtractor {
    async fn extract(&self, _text: &str) -> String {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.answers
            .lock()
            .ok()
            .and_then(|mut answers| answers.pop_front())
            .unwrap_or_else(|| NONE_SENTINEL.to_owned())
    }
}

/// Reviewer replaying a fixed list of responses and recording prompts.
#[derive(Default)]
pub struct ScriptedReviewer {
    responses: Mutex<VecDeque<String>>,
    prompts: Mutex<Vec<ReviewPrompt>>,
    unrecognized: Mutex<Vec<String>>,
}

impl ScriptedReviewer {
    pub fn new(responses: &[&str]) -> Self {
        Self {
            responses: Mutex::new(responses.iter().map(|r| (*r).to_owned()).collect()),
            ..Self::default()
        }
    }

    pub fn prompts(&self) -> Vec<ReviewPrompt> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }

    pub fn unrecognized(&self) -> Vec<String> {
        self.unrecognized
            .lock()
            .map(|u| u.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Reviewer for ScriptedReviewer {
    async fn review(&self, prompt: &ReviewPrompt) -> anyhow::Result<String> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.clone());
        }
        self.responses
            .lock()
            .ok()
            .and_then(|mut responses| responses.pop_front())
            .ok_or_else(|| anyhow::anyhow!("reviewer ran out of responses"))
    }

    fn unrecognized(&self, response: &str) {
        if let Ok(mut seen) = self.unrecognized.lock() {
            seen.push(response.to_owned());
        }
    }
}

/// Workflow over a scripted extractor and an in-memory store.
pub struct Harness {
    pub workflow: Workflow,
    pub extractor: Arc<ScriptedExtractor>,
    pub store: Arc<MemoryStore>,
}

pub fn harness(answers: &[&str], policy: ReviewPolicy) -> Harness {
    let extractor = Arc::new(ScriptedExtractor::new(answers));
    let store = Arc::new(MemoryStore::new());
    let workflow = Workflow::new(extractor.clone(), store.clone(), policy);
    Harness {
        workflow,
        extractor,
        store,
    }
}

pub fn nodes(log: &[mailgate::workflow::LogEntry]) -> Vec<&str> {
    log.iter().map(|entry| entry.node.as_str()).collect()
}
