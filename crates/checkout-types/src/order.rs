//! Order request types.
//!
//! The order request is the payload posted to the backend's `/orders`
//! endpoint. It is built once per submission attempt and never modified
//! afterwards; a retry builds a fresh one.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::cart::{line_total, CartError};
use crate::MealId;

/// Customer contact block of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCustomer {
	pub name: String,
	pub email: String,
}

/// Reference to the ordered meal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MealRef {
	pub id: MealId,
}

/// One ordered cart line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
	pub name: String,
	#[serde(with = "rust_decimal::serde::float")]
	pub price: Decimal,
	pub quantity: u32,
	pub meal: MealRef,
}

/// Payload of `POST {api_base_url}/orders`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
	pub customer: OrderCustomer,
	pub cart: Vec<OrderLine>,
	pub street: String,
	pub city: String,
	pub zip: String,
}

impl OrderRequest {
	/// Sum of `quantity × price` over the ordered lines.
	pub fn total(&self) -> Result<Decimal, CartError> {
		self.cart.iter().try_fold(Decimal::ZERO, |total, line| {
			total
				.checked_add(line_total(&line.meal.id, line.price, line.quantity)?)
				.ok_or(CartError::TotalOverflow)
		})
	}

	/// Total number of units ordered.
	pub fn item_count(&self) -> u32 {
		self.cart
			.iter()
			.fold(0u32, |count, line| count.saturating_add(line.quantity))
	}
}
