//! String formatting utilities.
//!
//! Provides the fixed-locale currency formatter used for cart totals and a
//! helper shortening identifiers in log lines.

use rust_decimal::{Decimal, RoundingStrategy};

/// Utility function to truncate an identifier for display purposes.
///
/// Shows only the first 8 characters followed by ".." for longer strings.
pub fn truncate_id(id: &str) -> String {
	match id.char_indices().nth(8) {
		Some((end, _)) => format!("{}..", &id[..end]),
		None => id.to_string(),
	}
}

/// Formats an amount as US dollars, e.g. `$1,234.50`.
///
/// The amount is rounded to cents (half away from zero), the integer part is
/// grouped by thousands and negative amounts get a leading minus sign.
pub fn format_currency(amount: Decimal) -> String {
	let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
	let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
		"-"
	} else {
		""
	};

	let mut cents = rounded.abs();
	cents.rescale(2);
	let text = cents.to_string();
	let (integer_part, decimal_part) = text.split_once('.').unwrap_or((text.as_str(), "00"));

	format!("{}${}.{}", sign, group_thousands(integer_part), decimal_part)
}

/// Inserts `,` between groups of three digits.
fn group_thousands(digits: &str) -> String {
	let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
	for (i, digit) in digits.chars().enumerate() {
		if i > 0 && (digits.len() - i) % 3 == 0 {
			grouped.push(',');
		}
		grouped.push(digit);
	}
	grouped
}
