//! Maps validated customer details and the cart snapshot onto the order
//! request posted to the backend.

use checkout_types::{CartItem, CustomerDetails, MealRef, OrderCustomer, OrderLine, OrderRequest};

/// Builds the order request for one submission attempt.
///
/// Cart lines are copied one to one and keep their order.
pub fn build_order_request(details: &CustomerDetails, items: &[CartItem]) -> OrderRequest {
	OrderRequest {
		customer: OrderCustomer {
			name: details.name.clone(),
			email: details.email.clone(),
		},
		cart: items
			.iter()
			.map(|item| OrderLine {
				name: item.name.clone(),
				price: item.price,
				quantity: item.quantity,
				meal: MealRef {
					id: item.id.clone(),
				},
			})
			.collect(),
		street: details.street.clone(),
		city: details.city.clone(),
		zip: details.zip.clone(),
	}
}
