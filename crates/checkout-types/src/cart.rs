//! Cart types.
//!
//! A cart is an ordered list of meals with a unit price and a quantity. The
//! total is never stored; it is recomputed from the items every time it is
//! needed.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors raised for carts whose total cannot be computed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
	#[error("Price of meal {0} is negative")]
	NegativePrice(MealId),
	#[error("Cart total is out of range")]
	TotalOverflow,
}

/// Identifier of a meal on the menu.
///
/// Menu backends use either numeric or textual ids, so both are accepted and
/// serialized back in the form they were received.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MealId {
	Number(u64),
	Text(String),
}

impl fmt::Display for MealId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			MealId::Number(id) => write!(f, "{}", id),
			MealId::Text(id) => write!(f, "{}", id),
		}
	}
}

impl From<u64> for MealId {
	fn from(id: u64) -> Self {
		MealId::Number(id)
	}
}

impl From<&str> for MealId {
	fn from(id: &str) -> Self {
		MealId::Text(id.to_string())
	}
}

/// A single cart line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
	/// Meal identifier, echoed back to the backend as `meal.id`.
	pub id: MealId,
	/// Display name of the meal.
	pub name: String,
	/// Unit price in the currency's major unit.
	#[serde(with = "rust_decimal::serde::float")]
	pub price: Decimal,
	/// Number of units, always at least 1 while the line is in a cart.
	pub quantity: u32,
}

impl CartItem {
	pub fn new(
		id: impl Into<MealId>,
		name: impl Into<String>,
		price: Decimal,
		quantity: u32,
	) -> Self {
		Self {
			id: id.into(),
			name: name.into(),
			price,
			quantity,
		}
	}

	/// Price of the whole line (`quantity × price`).
	pub fn line_total(&self) -> Result<Decimal, CartError> {
		line_total(&self.id, self.price, self.quantity)
	}
}

/// `quantity × price` of one line, rejecting negative prices and totals
/// beyond the range of [`Decimal`].
pub(crate) fn line_total(id: &MealId, price: Decimal, quantity: u32) -> Result<Decimal, CartError> {
	if price.is_sign_negative() && !price.is_zero() {
		return Err(CartError::NegativePrice(id.clone()));
	}
	price
		.checked_mul(Decimal::from(quantity))
		.ok_or(CartError::TotalOverflow)
}

/// Sums `quantity × price` over all items.
pub fn cart_total(items: &[CartItem]) -> Result<Decimal, CartError> {
	items.iter().try_fold(Decimal::ZERO, |total, item| {
		total
			.checked_add(item.line_total()?)
			.ok_or(CartError::TotalOverflow)
	})
}
