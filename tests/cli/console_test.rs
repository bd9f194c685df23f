//! Console reviewer driven by in-memory buffers.

use std::sync::Arc;

use async_trait::async_trait;

use mailgate::adapters::console::ConsoleReviewer;
use mailgate::extractor::Extractor;
use mailgate::workflow::{
    JsonFileStore, ReviewPolicy, ReviewPrompt, Reviewer, StateStore, Status, Workflow,
};

struct FixedExtractor(&'static str);

#[async_trait]
impl Extractor for FixedExtractor {
    async fn extract(&self, _text: &str) -> String {
        self.0.to_owned()
    }
}

fn prompt(accepts_corrections: bool) -> ReviewPrompt {
    ReviewPrompt {
        extracted: "john@example.com".to_owned(),
        validation: "Valid email".to_owned(),
        attempts: 0,
        accepts_corrections,
    }
}

fn text(bytes: Vec<u8>) -> String {
    String::from_utf8(bytes).expect("console output should be UTF-8")
}

#[tokio::test]
async fn review_prints_prompt_and_reads_line() {
    let console = ConsoleReviewer::new(&b"  y  \n"[..], Vec::new());

    let response = console.review(&prompt(true)).await.expect("should read a line");

    assert_eq!(response, "y");
    let out = text(console.into_output());
    assert!(out.contains("[Human Review Required]"));
    assert!(out.contains("Extracted email: john@example.com"));
    assert!(out.contains("Validation result: Valid email"));
    assert!(out.ends_with("Approve? (y/n) or enter corrected email: "));
}

#[tokio::test]
async fn strict_prompt_omits_correction_hint() {
    let console = ConsoleReviewer::new(&b"n\n"[..], Vec::new());
    console.review(&prompt(false)).await.expect("should read a line");
    assert!(text(console.into_output()).ends_with("Approve? (y/n): "));
}

#[tokio::test]
async fn unrecognized_response_triggers_short_reprompt() {
    let console = ConsoleReviewer::new(&b"maybe\ny\n"[..], Vec::new());

    let first = console.review(&prompt(false)).await.expect("should read a line");
    console.unrecognized(&first);
    let second = console.review(&prompt(false)).await.expect("should read a line");

    assert_eq!(second, "y");
    let out = text(console.into_output());
    assert_eq!(out.matches("[Human Review Required]").count(), 1);
    assert!(out.contains("Please answer 'y' or 'n'.\nApprove? (y/n): "));
}

#[tokio::test]
async fn closed_input_is_an_error() {
    let console = ConsoleReviewer::new(&b""[..], Vec::new());
    let err = console
        .review(&prompt(true))
        .await
        .expect_err("EOF should fail");
    assert!(err.to_string().contains("console input closed"));
}

#[tokio::test]
async fn ask_and_print_share_the_output() {
    let console = ConsoleReviewer::new(&b"hello there\n"[..], Vec::new());
    console.print("banner\n").await.expect("print should succeed");
    let answer = console.ask("Enter your message: ").await.expect("should read");
    assert_eq!(answer, "hello there");
    assert_eq!(text(console.into_output()), "banner\nEnter your message: ");
}

#[tokio::test]
async fn console_drives_a_full_run() {
    let dir = tempfile::tempdir().expect("should create temp dir");
    let store = Arc::new(JsonFileStore::new(dir.path().join("state.json")));
    let workflow = Workflow::new(
        Arc::new(FixedExtractor("none")),
        store.clone(),
        ReviewPolicy::default(),
    );
    let console = ConsoleReviewer::new(&b"fixed@mail.com\n"[..], Vec::new());

    let (state, result) = workflow
        .run("no address here", &console)
        .await
        .expect("run should finish");

    assert_eq!(store.load(), state);
    assert_eq!(result.status, Status::Approved);
    assert_eq!(result.final_email.as_deref(), Some("fixed@mail.com"));
    let out = text(console.into_output());
    assert!(out.contains("Extracted email: none"));
    assert!(out.contains("Validation result: Invalid email format"));
}
