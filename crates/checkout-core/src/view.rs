//! View selection.
//!
//! Decides what the checkout shows from the submission state, the field
//! errors of the last attempt and the current cart.

use checkout_types::{
	cart_total, format_currency, Action, ActionBar, CartItem, CheckoutView, ErrorPanel, FormErrors,
	FormField, FormView, SubmissionState, SuccessView, CHECKOUT_TITLE, ERROR_TITLE,
	SENDING_INDICATOR,
};

/// Selects the view for the given state.
///
/// The total is recomputed from `items` on every call.
pub fn select_view(
	state: &SubmissionState,
	field_errors: &FormErrors,
	items: &[CartItem],
) -> CheckoutView {
	match state {
		SubmissionState::Idle => CheckoutView::Form(form_view(field_errors, items, true)),
		SubmissionState::Pending { .. } => {
			CheckoutView::Sending(form_view(field_errors, items, false))
		},
		SubmissionState::Succeeded { .. } => CheckoutView::Success(SuccessView::default()),
		SubmissionState::Failed { message, .. } => CheckoutView::Error {
			form: form_view(field_errors, items, true),
			error: ErrorPanel {
				title: ERROR_TITLE,
				message: message.clone(),
			},
		},
	}
}

fn form_view(field_errors: &FormErrors, items: &[CartItem], editable: bool) -> FormView {
	let actions = if editable {
		ActionBar::Buttons(vec![Action::Close, Action::BackToCart, Action::Submit])
	} else {
		ActionBar::Indicator(SENDING_INDICATOR)
	};

	FormView {
		title: CHECKOUT_TITLE,
		total_amount: cart_total(items)
			.map(format_currency)
			.unwrap_or_else(|e| e.to_string()),
		fields: FormField::ALL.to_vec(),
		editable,
		field_errors: field_errors.clone(),
		actions,
	}
}
