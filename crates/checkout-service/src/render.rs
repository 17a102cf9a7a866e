//! Plain-text rendering of checkout views for the terminal.

use checkout_types::{ActionBar, CheckoutView, FormView};
use std::fmt::Write;

/// Renders a view as the lines printed by `checkout submit`.
pub fn render_view(view: &CheckoutView) -> String {
	let mut out = String::new();
	match view {
		CheckoutView::Form(form) | CheckoutView::Sending(form) => render_form(&mut out, form),
		CheckoutView::Error { form, error } => {
			render_form(&mut out, form);
			let _ = writeln!(out, "  ! {}", error.title);
			let _ = writeln!(out, "    {}", error.message);
		},
		CheckoutView::Success(success) => {
			let _ = writeln!(out, "{}", success.title);
			let _ = writeln!(out, "  {}", success.message);
			let _ = writeln!(out, "  {}", success.details);
			let _ = writeln!(out, "  [{}]", success.action.label());
		},
	}
	out
}

fn render_form(out: &mut String, form: &FormView) {
	let _ = writeln!(out, "{}", form.title);
	let _ = writeln!(out, "  Total Amount: {}", form.total_amount);
	for field in &form.fields {
		let marker = if form.editable { "" } else { " (locked)" };
		let _ = writeln!(out, "  {}{}", field.label(), marker);
		if let Some(message) = form.field_errors.get(*field) {
			let _ = writeln!(out, "    - {}", message);
		}
	}
	match &form.actions {
		ActionBar::Buttons(actions) => {
			let labels: Vec<String> = actions
				.iter()
				.map(|action| format!("[{}]", action.label()))
				.collect();
			let _ = writeln!(out, "  {}", labels.join(" "));
		},
		ActionBar::Indicator(text) => {
			let _ = writeln!(out, "  {}", text);
		},
	}
}
