//! Event types for observing the checkout.
//!
//! The checkout engine publishes these on its event bus so front ends and
//! tests can follow the submission lifecycle without polling.

use serde::{Deserialize, Serialize};

/// Lifecycle events of a checkout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CheckoutEvent {
	/// The checkout view was opened.
	CheckoutOpened,
	/// The checkout view was closed without finishing the order.
	CheckoutClosed,
	/// An order request was built and handed to delivery.
	SubmissionStarted { generation: u64, item_count: u32 },
	/// The backend accepted the order.
	SubmissionSucceeded { generation: u64 },
	/// The order could not be submitted.
	SubmissionFailed { generation: u64, message: String },
	/// A result arrived for a request abandoned by reopening the checkout.
	StaleResultDiscarded { generation: u64 },
	/// The customer acknowledged success; the cart was cleared.
	OrderAcknowledged { generation: u64 },
}
