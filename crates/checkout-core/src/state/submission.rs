//! Submission state machine implementation.
//!
//! Tracks the single order submission of a checkout through
//! Idle -> Pending -> Succeeded | Failed. Every request gets a generation
//! number when it starts; a result is only applied while the state is still
//! pending for that same generation, which is how results of abandoned
//! requests are recognized.

use checkout_types::{SubmissionFailure, SubmissionState, SubmissionStatus};
use once_cell::sync::Lazy;
use std::collections::{HashMap, HashSet};
use thiserror::Error;

/// Errors that can occur during submission state management.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmissionStateError {
	#[error("Invalid state transition from {from} to {to}")]
	InvalidTransition {
		from: SubmissionStatus,
		to: SubmissionStatus,
	},
	#[error("Result of request #{generation} is stale")]
	StaleGeneration { generation: u64 },
}

/// Owns the submission state of one checkout.
#[derive(Debug, Default)]
pub struct SubmissionStateMachine {
	state: SubmissionState,
	/// Last generation handed out.
	generation: u64,
}

impl SubmissionStateMachine {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn state(&self) -> &SubmissionState {
		&self.state
	}

	/// Generation of the most recently started request, 0 if none.
	pub fn current_generation(&self) -> u64 {
		self.generation
	}

	/// Moves to Pending for a new request and returns its generation.
	pub fn begin(&mut self) -> Result<u64, SubmissionStateError> {
		self.check_transition(SubmissionStatus::Pending)?;
		self.generation += 1;
		self.state = SubmissionState::Pending {
			generation: self.generation,
		};
		Ok(self.generation)
	}

	/// Applies the settled result of request `generation`.
	///
	/// Results for any other generation than the pending one are rejected with
	/// `StaleGeneration` and leave the state untouched.
	pub fn resolve(
		&mut self,
		generation: u64,
		result: Result<serde_json::Value, SubmissionFailure>,
	) -> Result<&SubmissionState, SubmissionStateError> {
		let target = match &result {
			Ok(_) => SubmissionStatus::Succeeded,
			Err(_) => SubmissionStatus::Failed,
		};

		match self.state {
			SubmissionState::Pending { generation: pending } if pending == generation => {},
			_ if self.state.generation() == Some(generation) => {
				return Err(SubmissionStateError::InvalidTransition {
					from: self.state.status(),
					to: target,
				});
			},
			_ => return Err(SubmissionStateError::StaleGeneration { generation }),
		}

		self.check_transition(target)?;
		self.state = match result {
			Ok(data) => SubmissionState::Succeeded { generation, data },
			Err(failure) => SubmissionState::Failed {
				generation,
				message: failure.message,
			},
		};
		Ok(&self.state)
	}

	/// Returns to Idle, dropping any stored response data or message.
	pub fn reset(&mut self) -> Result<(), SubmissionStateError> {
		if self.state == SubmissionState::Idle {
			return Ok(());
		}
		self.check_transition(SubmissionStatus::Idle)?;
		self.state = SubmissionState::Idle;
		Ok(())
	}

	/// Gives up on a pending request. Returns its generation, or `None` when
	/// nothing was pending.
	pub fn abandon(&mut self) -> Option<u64> {
		match self.state {
			SubmissionState::Pending { generation } => {
				self.state = SubmissionState::Idle;
				Some(generation)
			},
			_ => None,
		}
	}

	fn check_transition(&self, to: SubmissionStatus) -> Result<(), SubmissionStateError> {
		let from = self.state.status();
		if Self::is_valid_transition(from, to) {
			Ok(())
		} else {
			Err(SubmissionStateError::InvalidTransition { from, to })
		}
	}

	/// Checks if a state transition is valid
	fn is_valid_transition(from: SubmissionStatus, to: SubmissionStatus) -> bool {
		// Static transition table - each state maps to allowed next states
		static TRANSITIONS: Lazy<HashMap<SubmissionStatus, HashSet<SubmissionStatus>>> =
			Lazy::new(|| {
				let mut m = HashMap::new();
				m.insert(
					SubmissionStatus::Idle,
					HashSet::from([SubmissionStatus::Pending]),
				);
				m.insert(
					SubmissionStatus::Pending,
					HashSet::from([
						SubmissionStatus::Succeeded,
						SubmissionStatus::Failed,
						SubmissionStatus::Idle,
					]),
				);
				m.insert(
					SubmissionStatus::Succeeded,
					HashSet::from([SubmissionStatus::Idle]),
				);
				// retry or reset
				m.insert(
					SubmissionStatus::Failed,
					HashSet::from([SubmissionStatus::Pending, SubmissionStatus::Idle]),
				);
				m
			});

		TRANSITIONS
			.get(&from)
			.is_some_and(|allowed| allowed.contains(&to))
	}
}
