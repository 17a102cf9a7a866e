//! State management for checkout submissions.

pub mod submission;

pub use submission::{SubmissionStateError, SubmissionStateMachine};
