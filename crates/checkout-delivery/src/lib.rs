//! Order delivery module for the checkout.
//!
//! This module sends a finished [`OrderRequest`] to the ordering backend. The
//! transport is pluggable: the `http` implementation posts JSON with
//! `reqwest`, the `mock` implementation answers locally for development.
//! Whatever the transport, a failed delivery carries a message that can be
//! shown to the customer as-is.

use async_trait::async_trait;
use checkout_types::{
	truncate_id, ConfigSchema, ImplementationRegistry, OrderRequest, SubmissionFailure,
};
use std::sync::Arc;
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod http;
	pub mod mock;
}

/// Shown when the backend rejects an order without explaining why.
pub const GENERIC_REJECTION_MESSAGE: &str = "Something went wrong, failed to send request.";
/// Shown when the transport fails without a usable message.
pub const GENERIC_FAILURE_MESSAGE: &str = "Something went wrong!";

/// Errors that can occur while delivering an order.
#[derive(Debug, Error)]
pub enum DeliveryError {
	/// The request could not be sent or the response not read.
	#[error("Network error: {0}")]
	Network(String),
	/// The backend answered with a non-success status.
	#[error("Order rejected with status {status}: {message}")]
	Rejected { status: u16, message: String },
	/// The backend answered with a success status but an unusable body.
	#[error("Invalid response: {0}")]
	InvalidResponse(String),
	/// The implementation configuration is invalid.
	#[error("Configuration error: {0}")]
	Configuration(String),
}

impl DeliveryError {
	/// Message suitable for the checkout's error panel.
	pub fn display_message(&self) -> String {
		match self {
			DeliveryError::Rejected { message, .. } => message.clone(),
			DeliveryError::Network(message) if message.trim().is_empty() => {
				GENERIC_FAILURE_MESSAGE.to_string()
			},
			DeliveryError::Network(message) => message.clone(),
			other => other.to_string(),
		}
	}
}

impl From<DeliveryError> for SubmissionFailure {
	fn from(err: DeliveryError) -> Self {
		SubmissionFailure::new(err.display_message())
	}
}

/// Trait defining the interface for order delivery implementations.
#[async_trait]
pub trait OrderDeliveryInterface: Send + Sync {
	/// Returns the configuration schema for this delivery implementation.
	///
	/// The schema is used to validate the implementation's TOML table before
	/// the implementation is created.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;

	/// Sends the order and returns the backend's JSON answer.
	///
	/// Implementations do not retry; every call is exactly one attempt.
	async fn submit_order(&self, order: &OrderRequest) -> Result<serde_json::Value, DeliveryError>;
}

/// Type alias for delivery factory functions.
///
/// Factories receive the implementation's configuration table and the full
/// URL of the order endpoint.
pub type DeliveryFactory =
	fn(&toml::Value, &str) -> Result<Box<dyn OrderDeliveryInterface>, DeliveryError>;

/// Registry trait for delivery implementations.
pub trait DeliveryRegistry: ImplementationRegistry<Factory = DeliveryFactory> {}

/// Get all registered delivery implementations.
///
/// Returns a vector of (name, factory) tuples for all available delivery
/// implementations.
pub fn get_all_implementations() -> Vec<(&'static str, DeliveryFactory)> {
	use implementations::{http, mock};

	vec![
		(http::Registry::NAME, http::Registry::factory()),
		(mock::Registry::NAME, mock::Registry::factory()),
	]
}

/// Service that delivers orders through the configured implementation.
pub struct DeliveryService {
	/// Name of the implementation, as configured.
	name: String,
	implementation: Arc<dyn OrderDeliveryInterface>,
}

impl DeliveryService {
	pub fn new(name: impl Into<String>, implementation: Arc<dyn OrderDeliveryInterface>) -> Self {
		Self {
			name: name.into(),
			implementation,
		}
	}

	/// Name of the implementation in use.
	pub fn implementation_name(&self) -> &str {
		&self.name
	}

	/// Delivers an order, logging the outcome.
	pub async fn deliver(&self, order: &OrderRequest) -> Result<serde_json::Value, DeliveryError> {
		tracing::debug!(
			implementation = %self.name,
			lines = order.cart.len(),
			"Delivering order"
		);

		match self.implementation.submit_order(order).await {
			Ok(response) => {
				let order_id = response
					.get("id")
					.and_then(|id| id.as_str())
					.map(truncate_id)
					.unwrap_or_else(|| "-".to_string());
				tracing::info!(implementation = %self.name, order_id = %order_id, "Order delivered");
				Ok(response)
			},
			Err(e) => {
				tracing::warn!(implementation = %self.name, error = %e, "Order delivery failed");
				Err(e)
			},
		}
	}
}
