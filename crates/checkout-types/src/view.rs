//! View model of the checkout modal.
//!
//! Front ends render a [`CheckoutView`] as-is; all decisions about which
//! controls are available are already made when the view is selected.

use serde::Serialize;

use crate::{FormErrors, FormField};

pub const CHECKOUT_TITLE: &str = "Checkout";
pub const SENDING_INDICATOR: &str = "Sending order data...";
pub const ERROR_TITLE: &str = "Failed to submit order";
pub const SUCCESS_TITLE: &str = "Success!";
pub const SUCCESS_MESSAGE: &str = "Your order was submitted successfully.";
pub const SUCCESS_DETAILS: &str =
	"We will get back to you with more details via email within the next few minutes.";

/// User actions offered by the checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Action {
	Close,
	BackToCart,
	Submit,
	/// Acknowledges a successful order.
	Okay,
}

impl Action {
	pub fn label(&self) -> &'static str {
		match self {
			Action::Close => "Close",
			Action::BackToCart => "Back to Cart",
			Action::Submit => "Submit Order",
			Action::Okay => "Okay",
		}
	}
}

/// Bottom row of the form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum ActionBar {
	/// Clickable actions.
	Buttons(Vec<Action>),
	/// Non-interactive text replacing the actions while sending.
	Indicator(&'static str),
}

/// The checkout form with its total and controls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormView {
	pub title: &'static str,
	/// Cart total, already formatted for display.
	pub total_amount: String,
	pub fields: Vec<FormField>,
	/// Whether the inputs accept edits.
	pub editable: bool,
	pub field_errors: FormErrors,
	pub actions: ActionBar,
}

/// Inline panel describing a failed submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorPanel {
	pub title: &'static str,
	pub message: String,
}

/// Confirmation replacing the whole modal content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SuccessView {
	pub title: &'static str,
	pub message: &'static str,
	pub details: &'static str,
	pub action: Action,
}

impl Default for SuccessView {
	fn default() -> Self {
		Self {
			title: SUCCESS_TITLE,
			message: SUCCESS_MESSAGE,
			details: SUCCESS_DETAILS,
			action: Action::Okay,
		}
	}
}

/// What the checkout modal shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "view", rename_all = "camelCase")]
pub enum CheckoutView {
	/// Editable form with Submit enabled.
	Form(FormView),
	/// Form frozen behind the sending indicator.
	Sending(FormView),
	/// Order accepted.
	Success(SuccessView),
	/// Form plus the failure panel; Submit stays available for retry.
	Error { form: FormView, error: ErrorPanel },
}

impl CheckoutView {
	/// Whether the Submit action is currently offered.
	pub fn submit_enabled(&self) -> bool {
		self.form().is_some_and(|form| match &form.actions {
			ActionBar::Buttons(actions) => actions.contains(&Action::Submit),
			ActionBar::Indicator(_) => false,
		})
	}

	/// The form part of the view, absent on success.
	pub fn form(&self) -> Option<&FormView> {
		match self {
			CheckoutView::Form(form) | CheckoutView::Sending(form) => Some(form),
			CheckoutView::Error { form, .. } => Some(form),
			CheckoutView::Success(_) => None,
		}
	}

	pub fn error_message(&self) -> Option<&str> {
		match self {
			CheckoutView::Error { error, .. } => Some(&error.message),
			_ => None,
		}
	}
}
