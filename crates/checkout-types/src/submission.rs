//! Submission state types.
//!
//! A checkout goes through Idle -> Pending -> Succeeded | Failed. Exactly one
//! state holds at a time; the state machine enforcing the transitions lives
//! in the core crate.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// State of the order submission of one checkout.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum SubmissionState {
	/// No request sent yet, or the last result was acknowledged.
	#[default]
	Idle,
	/// A request is in flight.
	Pending {
		/// Generation token of the in-flight request.
		generation: u64,
	},
	/// The backend accepted the order.
	Succeeded {
		generation: u64,
		/// JSON body returned by the backend.
		data: serde_json::Value,
	},
	/// The request failed; `message` is ready for display.
	Failed { generation: u64, message: String },
}

impl SubmissionState {
	pub fn status(&self) -> SubmissionStatus {
		match self {
			SubmissionState::Idle => SubmissionStatus::Idle,
			SubmissionState::Pending { .. } => SubmissionStatus::Pending,
			SubmissionState::Succeeded { .. } => SubmissionStatus::Succeeded,
			SubmissionState::Failed { .. } => SubmissionStatus::Failed,
		}
	}

	pub fn is_pending(&self) -> bool {
		matches!(self, SubmissionState::Pending { .. })
	}

	/// Generation of the request this state belongs to, if any.
	pub fn generation(&self) -> Option<u64> {
		match self {
			SubmissionState::Idle => None,
			SubmissionState::Pending { generation }
			| SubmissionState::Succeeded { generation, .. }
			| SubmissionState::Failed { generation, .. } => Some(*generation),
		}
	}

	pub fn response_data(&self) -> Option<&serde_json::Value> {
		match self {
			SubmissionState::Succeeded { data, .. } => Some(data),
			_ => None,
		}
	}

	pub fn error_message(&self) -> Option<&str> {
		match self {
			SubmissionState::Failed { message, .. } => Some(message),
			_ => None,
		}
	}
}

/// Payload-free discriminant of [`SubmissionState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SubmissionStatus {
	Idle,
	Pending,
	Succeeded,
	Failed,
}

impl fmt::Display for SubmissionStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			SubmissionStatus::Idle => write!(f, "Idle"),
			SubmissionStatus::Pending => write!(f, "Pending"),
			SubmissionStatus::Succeeded => write!(f, "Succeeded"),
			SubmissionStatus::Failed => write!(f, "Failed"),
		}
	}
}

/// A failed order submission, reduced to a message fit for display.
///
/// Network errors, non-success statuses and server-side rejections all end
/// up here.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct SubmissionFailure {
	pub message: String,
}

impl SubmissionFailure {
	pub fn new(message: impl Into<String>) -> Self {
		Self {
			message: message.into(),
		}
	}
}
