//! Mailgate: human-in-the-loop email extraction.
//!
//! A language model pulls one email address out of free text, a regex
//! checks its shape, and a human accepts, rejects (bounded retries) or
//! corrects it before the result is finalized. The full workflow state is
//! persisted after every stage.
//!
//! See `DESIGN.md` for the architecture notes.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod adapters;
pub mod config;
pub mod credentials;
pub mod extractor;
pub mod logging;
pub mod providers;
pub mod validator;
pub mod workflow;
