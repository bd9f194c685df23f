//! Front-ends that collect human decisions for the workflow.
//!
//! The console adapter covers interactive runs. Non-interactive front-ends
//! use the suspend/resume API on [`crate::workflow::Workflow`] directly.

pub mod console;
