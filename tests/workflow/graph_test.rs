//! Mermaid graph export.

use mailgate::workflow::graph::{edges, mermaid};
use mailgate::workflow::ReviewPolicy;

#[test]
fn default_graph_has_all_edges() {
    let doc = mermaid(&ReviewPolicy::default());
    let expected = "flowchart TD\n\
        \x20   __start__([start])\n\
        \x20   __end__([end])\n\
        \x20   __start__ --> interpret_input\n\
        \x20   interpret_input --> validate\n\
        \x20   validate --> human_review\n\
        \x20   human_review -->|y| finalize\n\
        \x20   human_review -->|correction| finalize\n\
        \x20   human_review -->|n, under 2 rejections| interpret_input\n\
        \x20   human_review -->|n, 2 rejections reached| finalize\n\
        \x20   finalize --> __end__\n";
    assert_eq!(doc, expected);
}

#[test]
fn strict_policy_drops_correction_edge() {
    let policy = ReviewPolicy {
        accept_corrections: false,
        ..ReviewPolicy::default()
    };
    assert!(!mermaid(&policy).contains("correction"));
    assert_eq!(edges(&policy).len(), 7);
}

#[test]
fn zero_bound_has_no_retry_edge() {
    let policy = ReviewPolicy {
        max_rejections: 0,
        ..ReviewPolicy::default()
    };
    let graph = edges(&policy);
    assert!(!graph
        .iter()
        .any(|e| e.from == "human_review" && e.to == "interpret_input"));
    assert!(graph
        .iter()
        .any(|e| e.label == "n, 0 rejections reached" && e.to == "finalize"));
}

#[test]
fn bound_of_one_has_no_retry_edge() {
    let policy = ReviewPolicy {
        max_rejections: 1,
        ..ReviewPolicy::default()
    };
    let graph = edges(&policy);
    assert!(!graph
        .iter()
        .any(|e| e.from == "human_review" && e.to == "interpret_input"));
    assert!(!mermaid(&policy).contains("under 1 rejections"));
    assert!(graph
        .iter()
        .any(|e| e.label == "n, 1 rejections reached" && e.to == "finalize"));
    assert_eq!(edges(&policy).len(), 7);
}

#[test]
fn labels_track_the_bound() {
    let policy = ReviewPolicy {
        max_rejections: 5,
        ..ReviewPolicy::default()
    };
    let doc = mermaid(&policy);
    assert!(doc.contains("human_review -->|n, under 5 rejections| interpret_input"));
    assert!(doc.contains("human_review -->|n, 5 rejections reached| finalize"));
}
