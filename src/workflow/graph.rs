//! Mermaid rendering of the workflow's control-flow graph.
//!
//! Edges are read off [`next_step`] rather than written by hand, so the
//! diagram cannot drift from the transition table.

use std::fmt::Write as _;

use super::state::Step;
use super::transition::{next_step, Event, ReviewPolicy};

/// One labelled edge of the graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    /// Source node.
    pub from: &'static str,
    /// Target node.
    pub to: &'static str,
    /// Edge label, empty for unconditional edges.
    pub label: String,
}

fn node_name(step: Step) -> &'static str {
    match step {
        Step::Start => "__start__",
        Step::InterpretInput => "interpret_input",
        Step::Validate => "validate",
        Step::HumanReview => "human_review",
        Step::End => "finalize",
    }
}

/// All edges reachable under `policy`, in traversal order.
pub fn edges(policy: &ReviewPolicy) -> Vec<Edge> {
    let max = policy.max_rejections;
    // (from, event, label, is the retry edge)
    let candidates: [(Step, Event, String, bool); 7] = [
        (Step::Start, Event::Begin, String::new(), false),
        (Step::InterpretInput, Event::Extracted, String::new(), false),
        (Step::Validate, Event::Validated, String::new(), false),
        (Step::HumanReview, Event::Accepted, "y".to_owned(), false),
        (Step::HumanReview, Event::Corrected, "correction".to_owned(), false),
        (
            Step::HumanReview,
            // A real rejection always carries a count of at least one.
            Event::Rejected {
                attempts: max.saturating_sub(1).max(1),
            },
            format!("n, under {max} rejections"),
            true,
        ),
        (
            Step::HumanReview,
            Event::Rejected { attempts: max },
            format!("n, {max} rejections reached"),
            false,
        ),
    ];

    let mut out: Vec<Edge> = Vec::new();
    for (from, event, label, retry) in candidates {
        if !policy.accept_corrections && event == Event::Corrected {
            continue;
        }
        let Ok(to) = next_step(from, &event, policy) else {
            continue;
        };
        // A bound of 0 or 1 makes the retry event land on `end` too.
        if retry && to == Step::End {
            continue;
        }
        let edge = Edge {
            from: node_name(from),
            to: node_name(to),
            label,
        };
        if !out.contains(&edge) {
            out.push(edge);
        }
    }
    out.push(Edge {
        from: node_name(Step::End),
        to: "__end__",
        label: String::new(),
    });
    out
}

/// Render the graph as a Mermaid `flowchart TD` document.
pub fn mermaid(policy: &ReviewPolicy) -> String {
    let mut doc = String::from("flowchart TD\n");
    doc.push_str("    __start__([start])\n");
    doc.push_str("    __end__([end])\n");
    for edge in edges(policy) {
        if edge.label.is_empty() {
            let _ = writeln!(doc, "    {} --> {}", edge.from, edge.to);
        } else {
            let _ = writeln!(doc, "    {} -->|{}| {}", edge.from, edge.label, edge.to);
        }
    }
    doc
}
