//! Demo orders backend.
//!
//! A minimal stand-in for the ordering API so the checkout can be exercised
//! locally: `POST /orders` validates and stores an order, `GET /orders`
//! lists the accepted ones. Orders live in memory only.

use axum::{
	extract::State,
	http::StatusCode,
	response::{IntoResponse, Json, Response},
	routing::post,
	Router,
};
use checkout_types::OrderRequest;
use serde::Serialize;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

const MISSING_ORDER_DATA: &str = "Missing data.";
const MISSING_CUSTOMER_DATA: &str =
	"Missing data: Email, name, street, postal code or city is missing.";

/// Errors returned by the demo backend, always as `{ "message": ... }`.
#[derive(Debug, Error)]
pub enum ApiError {
	#[error("{0}")]
	BadRequest(String),
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let status = match self {
			ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
		};
		(
			status,
			Json(serde_json::json!({ "message": self.to_string() })),
		)
			.into_response()
	}
}

/// An accepted order.
#[derive(Debug, Clone, Serialize)]
pub struct StoredOrder {
	pub id: String,
	#[serde(flatten)]
	pub order: OrderRequest,
}

/// Number of accepted orders kept; older ones are dropped first.
pub const MAX_STORED_ORDERS: usize = 1000;

/// Shared application state for the demo backend.
///
/// Keeps at most [`MAX_STORED_ORDERS`] orders, oldest first.
#[derive(Clone, Default)]
pub struct AppState {
	pub orders: Arc<RwLock<VecDeque<StoredOrder>>>,
}

/// Builds the router of the demo backend.
pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/orders", post(handle_create_order).get(handle_list_orders))
		.layer(
			ServiceBuilder::new()
				.layer(TraceLayer::new_for_http())
				.layer(CorsLayer::permissive()),
		)
		.with_state(state)
}

/// Starts the demo backend and serves until the process is stopped.
pub async fn start_server(host: &str, port: u16) -> Result<(), Box<dyn std::error::Error>> {
	let app = router(AppState::default());

	let bind_address = format!("{}:{}", host, port);
	let listener = TcpListener::bind(&bind_address).await?;

	tracing::info!("Demo orders backend listening on {}", bind_address);

	axum::serve(listener, app).await?;

	Ok(())
}

/// Handles POST /orders requests.
async fn handle_create_order(
	State(state): State<AppState>,
	Json(payload): Json<Value>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
	let order: OrderRequest = serde_json::from_value(payload).map_err(|e| {
		tracing::warn!(error = %e, "Rejected malformed order");
		ApiError::BadRequest(MISSING_ORDER_DATA.to_string())
	})?;

	if order.cart.is_empty() {
		return Err(ApiError::BadRequest(MISSING_ORDER_DATA.to_string()));
	}

	let total = order.total().map_err(|e| {
		tracing::warn!(error = %e, "Rejected order without a valid total");
		ApiError::BadRequest(e.to_string())
	})?;

	let customer_fields = [
		order.customer.name.as_str(),
		order.customer.email.as_str(),
		order.street.as_str(),
		order.city.as_str(),
		order.zip.as_str(),
	];
	if customer_fields.iter().any(|value| value.trim().is_empty())
		|| !order.customer.email.contains('@')
	{
		tracing::warn!("Rejected order with incomplete customer data");
		return Err(ApiError::BadRequest(MISSING_CUSTOMER_DATA.to_string()));
	}

	let id = uuid::Uuid::new_v4().to_string();
	tracing::info!(
		order_id = %checkout_types::truncate_id(&id),
		items = order.item_count(),
		total = %checkout_types::format_currency(total),
		"Order created"
	);
	let mut orders = state.orders.write().await;
	if orders.len() == MAX_STORED_ORDERS {
		orders.pop_front();
	}
	orders.push_back(StoredOrder {
		id: id.clone(),
		order,
	});
	drop(orders);

	Ok((
		StatusCode::CREATED,
		Json(serde_json::json!({ "message": "Order created!", "id": id })),
	))
}

/// Handles GET /orders requests.
async fn handle_list_orders(State(state): State<AppState>) -> Json<Vec<StoredOrder>> {
	Json(state.orders.read().await.iter().cloned().collect())
}

#[cfg(test)]
mod tests {
	use super::*;

	async fn spawn_backend() -> (String, AppState) {
		let state = AppState::default();
		let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
		let address = listener.local_addr().unwrap();
		let app = router(state.clone());
		tokio::spawn(async move {
			axum::serve(listener, app).await.unwrap();
		});
		(format!("http://{}", address), state)
	}

	fn order() -> Value {
		serde_json::json!({
			"customer": {"name": "Jo", "email": "jo@x.com"},
			"cart": [{"name": "Pizza", "price": 12.5, "quantity": 2, "meal": {"id": 1}}],
			"street": "Main",
			"city": "Town",
			"zip": "1000"
		})
	}

	#[tokio::test]
	async fn test_accepts_valid_order() {
		let (base_url, state) = spawn_backend().await;

		let response = reqwest::Client::new()
			.post(format!("{}/orders", base_url))
			.json(&order())
			.send()
			.await
			.unwrap();
		assert_eq!(response.status().as_u16(), 201);
		let body: Value = response.json().await.unwrap();
		assert_eq!(body["message"], "Order created!");

		let orders = state.orders.read().await;
		assert_eq!(orders.len(), 1);
		assert_eq!(body["id"], orders[0].id.as_str());
		assert_eq!(orders[0].order.customer.name, "Jo");
	}

	#[tokio::test]
	async fn test_rejects_empty_cart_and_missing_customer_data() {
		let (base_url, state) = spawn_backend().await;
		let client = reqwest::Client::new();

		let mut empty_cart = order();
		empty_cart["cart"] = serde_json::json!([]);
		let response = client
			.post(format!("{}/orders", base_url))
			.json(&empty_cart)
			.send()
			.await
			.unwrap();
		assert_eq!(response.status().as_u16(), 400);
		let body: Value = response.json().await.unwrap();
		assert_eq!(body["message"], MISSING_ORDER_DATA);

		let mut no_street = order();
		no_street["street"] = serde_json::json!("  ");
		let response = client
			.post(format!("{}/orders", base_url))
			.json(&no_street)
			.send()
			.await
			.unwrap();
		assert_eq!(response.status().as_u16(), 400);
		let body: Value = response.json().await.unwrap();
		assert_eq!(body["message"], MISSING_CUSTOMER_DATA);

		assert!(state.orders.read().await.is_empty());
	}

	#[tokio::test]
	async fn test_rejects_total_out_of_range() {
		let (base_url, state) = spawn_backend().await;

		let mut banquet = order();
		banquet["cart"][0]["price"] = serde_json::json!(1e20);
		banquet["cart"][0]["quantity"] = serde_json::json!(4_000_000_000u32);
		let response = reqwest::Client::new()
			.post(format!("{}/orders", base_url))
			.json(&banquet)
			.send()
			.await
			.unwrap();
		assert_eq!(response.status().as_u16(), 400);
		let body: Value = response.json().await.unwrap();
		assert_eq!(body["message"], "Cart total is out of range");
		assert!(state.orders.read().await.is_empty());
	}

	#[tokio::test]
	async fn test_drops_oldest_orders_beyond_capacity() {
		let (base_url, state) = spawn_backend().await;
		{
			let mut orders = state.orders.write().await;
			for index in 0..MAX_STORED_ORDERS {
				orders.push_back(StoredOrder {
					id: format!("old-{}", index),
					order: serde_json::from_value(order()).unwrap(),
				});
			}
		}

		let response = reqwest::Client::new()
			.post(format!("{}/orders", base_url))
			.json(&order())
			.send()
			.await
			.unwrap();
		assert_eq!(response.status().as_u16(), 201);
		let body: Value = response.json().await.unwrap();

		let orders = state.orders.read().await;
		assert_eq!(orders.len(), MAX_STORED_ORDERS);
		assert_eq!(orders[0].id, "old-1");
		assert_eq!(orders[MAX_STORED_ORDERS - 1].id, body["id"].as_str().unwrap());
	}

	#[tokio::test]
	async fn test_lists_orders() {
		let (base_url, _state) = spawn_backend().await;
		let client = reqwest::Client::new();
		client
			.post(format!("{}/orders", base_url))
			.json(&order())
			.send()
			.await
			.unwrap();

		let orders: Value = client
			.get(format!("{}/orders", base_url))
			.send()
			.await
			.unwrap()
			.json()
			.await
			.unwrap();
		assert_eq!(orders.as_array().map(Vec::len), Some(1));
		assert_eq!(orders[0]["zip"], "1000");
		assert!(orders[0]["id"].is_string());
	}
}
