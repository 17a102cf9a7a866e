//! In-memory cart store.

use checkout_types::{cart_total, CartError, CartItem, MealId};
use rust_decimal::Decimal;
use tokio::sync::RwLock;

/// Ordered list of cart lines.
///
/// Lines keep the order in which meals were first added. Every read returns
/// a snapshot, so totals are always computed from the current contents.
/// Contents whose total cannot be computed are never stored.
#[derive(Debug, Default)]
pub struct CartStore {
	items: RwLock<Vec<CartItem>>,
}

impl CartStore {
	pub fn new() -> Self {
		Self::default()
	}

	/// Creates a store pre-filled with `items`. Lines with a zero quantity
	/// are dropped.
	pub fn with_items(items: Vec<CartItem>) -> Result<Self, CartError> {
		let items: Vec<CartItem> = items
			.into_iter()
			.filter(|item| {
				if item.quantity == 0 {
					tracing::warn!(meal_id = %item.id, "Dropping cart line with zero quantity");
				}
				item.quantity > 0
			})
			.collect();
		cart_total(&items)?;
		Ok(Self {
			items: RwLock::new(items),
		})
	}

	/// Snapshot of the current cart lines.
	pub async fn items(&self) -> Vec<CartItem> {
		self.items.read().await.clone()
	}

	/// Adds one unit of a meal, appending a new line if the meal is not in
	/// the cart yet. The cart is left unchanged if the new total cannot be
	/// computed.
	pub async fn add_item(&self, item: CartItem) -> Result<(), CartError> {
		let mut items = self.items.write().await;
		let mut updated = items.clone();
		match updated.iter_mut().find(|existing| existing.id == item.id) {
			Some(existing) => existing.quantity = existing.quantity.saturating_add(1),
			None => updated.push(CartItem { quantity: 1, ..item }),
		}
		cart_total(&updated)?;
		*items = updated;
		Ok(())
	}

	/// Removes one unit of a meal; the line disappears with its last unit.
	///
	/// Returns false if the meal was not in the cart.
	pub async fn remove_item(&self, id: &MealId) -> bool {
		let mut items = self.items.write().await;
		let Some(index) = items.iter().position(|item| &item.id == id) else {
			return false;
		};
		if items[index].quantity > 1 {
			items[index].quantity -= 1;
		} else {
			items.remove(index);
		}
		true
	}

	/// Empties the cart.
	pub async fn clear(&self) {
		self.items.write().await.clear();
		tracing::debug!("Cleared cart");
	}

	/// Sum of `quantity × price` over the current lines.
	pub async fn total(&self) -> Result<Decimal, CartError> {
		cart_total(&self.items.read().await)
	}

	pub async fn is_empty(&self) -> bool {
		self.items.read().await.is_empty()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn dec(value: &str) -> Decimal {
		value.parse().unwrap()
	}

	fn pizza() -> CartItem {
		CartItem::new(1u64, "Pizza", dec("12.5"), 1)
	}

	#[tokio::test]
	async fn test_add_item_increments_existing_line() {
		let store = CartStore::new();
		store.add_item(pizza()).await.unwrap();
		store
			.add_item(CartItem::new("m2", "Salad", dec("8"), 5))
			.await
			.unwrap();
		store.add_item(pizza()).await.unwrap();

		let items = store.items().await;
		assert_eq!(items.len(), 2);
		assert_eq!(items[0].name, "Pizza");
		assert_eq!(items[0].quantity, 2);
		assert_eq!(items[1].quantity, 1);
		assert_eq!(store.total().await, Ok(dec("33")));
	}

	#[tokio::test]
	async fn test_remove_item() {
		let store =
			CartStore::with_items(vec![CartItem::new(1u64, "Pizza", dec("12.5"), 2)]).unwrap();

		assert!(store.remove_item(&MealId::Number(1)).await);
		assert_eq!(store.items().await[0].quantity, 1);
		assert!(store.remove_item(&MealId::Number(1)).await);
		assert!(store.is_empty().await);
		assert!(!store.remove_item(&MealId::Number(1)).await);
	}

	#[tokio::test]
	async fn test_total_tracks_contents() {
		let store = CartStore::with_items(vec![
			CartItem::new(1u64, "Pizza", dec("12.5"), 2),
			CartItem::new(2u64, "Ghost", dec("3"), 0),
		])
		.unwrap();
		assert_eq!(store.items().await.len(), 1);
		assert_eq!(store.total().await, Ok(dec("25")));

		store.clear().await;
		assert_eq!(store.total().await, Ok(Decimal::ZERO));
	}

	#[tokio::test]
	async fn test_rejects_contents_without_total() {
		let result = CartStore::with_items(vec![
			CartItem::new(1u64, "Pizza", Decimal::MAX, 1),
			CartItem::new(2u64, "Salad", dec("8"), 1),
		]);
		assert_eq!(result.err(), Some(CartError::TotalOverflow));

		let store =
			CartStore::with_items(vec![CartItem::new(1u64, "Pizza", Decimal::MAX, 1)]).unwrap();
		assert_eq!(
			store.add_item(CartItem::new(1u64, "Pizza", Decimal::MAX, 1)).await,
			Err(CartError::TotalOverflow)
		);
		assert_eq!(store.items().await[0].quantity, 1);
		assert_eq!(store.total().await, Ok(Decimal::MAX));
	}

	#[tokio::test]
	async fn test_add_item_saturates_quantity() {
		let store = CartStore::with_items(vec![CartItem::new(1u64, "Mint", Decimal::ZERO, u32::MAX)])
			.unwrap();
		store
			.add_item(CartItem::new(1u64, "Mint", Decimal::ZERO, 1))
			.await
			.unwrap();
		assert_eq!(store.items().await[0].quantity, u32::MAX);
	}
}
