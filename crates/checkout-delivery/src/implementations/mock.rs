//! Mock delivery implementation for development and testing.
//!
//! Answers every order locally with a configurable status, optionally after
//! an artificial delay, and keeps the orders it received so tests can
//! inspect them.

use crate::{
	DeliveryError, DeliveryFactory, DeliveryRegistry, OrderDeliveryInterface,
	GENERIC_REJECTION_MESSAGE,
};
use async_trait::async_trait;
use checkout_types::{
	ConfigSchema, Field, FieldType, ImplementationRegistry, OrderRequest, Schema, ValidationError,
};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;

/// Configuration for the mock delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MockDeliveryConfig {
	/// HTTP status to answer with.
	#[serde(default = "default_status")]
	pub status: u16,
	/// Message returned with the answer.
	#[serde(default)]
	pub message: Option<String>,
	/// Delay before answering, in milliseconds.
	#[serde(default)]
	pub latency_ms: u64,
}

fn default_status() -> u16 {
	201
}

impl Default for MockDeliveryConfig {
	fn default() -> Self {
		Self {
			status: default_status(),
			message: None,
			latency_ms: 0,
		}
	}
}

/// Delivery answering without any network access.
pub struct MockDelivery {
	config: MockDeliveryConfig,
	next_id: AtomicU64,
	received: Mutex<Vec<OrderRequest>>,
}

impl MockDelivery {
	pub fn new(config: MockDeliveryConfig) -> Self {
		Self {
			config,
			next_id: AtomicU64::new(1),
			received: Mutex::new(Vec::new()),
		}
	}

	/// Orders received so far, oldest first.
	pub async fn received(&self) -> Vec<OrderRequest> {
		self.received.lock().await.clone()
	}
}

#[async_trait]
impl OrderDeliveryInterface for MockDelivery {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(MockDeliverySchema)
	}

	async fn submit_order(&self, order: &OrderRequest) -> Result<serde_json::Value, DeliveryError> {
		if self.config.latency_ms > 0 {
			tokio::time::sleep(Duration::from_millis(self.config.latency_ms)).await;
		}
		self.received.lock().await.push(order.clone());

		if !(200..300).contains(&self.config.status) {
			return Err(DeliveryError::Rejected {
				status: self.config.status,
				message: self
					.config
					.message
					.clone()
					.unwrap_or_else(|| GENERIC_REJECTION_MESSAGE.to_string()),
			});
		}

		let id = self.next_id.fetch_add(1, Ordering::Relaxed);
		Ok(serde_json::json!({
			"message": self.config.message.as_deref().unwrap_or("Order created!"),
			"id": format!("mock-{}", id),
		}))
	}
}

/// Configuration schema for MockDelivery.
pub struct MockDeliverySchema;

impl ConfigSchema for MockDeliverySchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			vec![],
			vec![
				Field::new(
					"status",
					FieldType::Integer {
						min: Some(100),
						max: Some(599),
					},
				),
				Field::new("message", FieldType::String),
				Field::new(
					"latency_ms",
					FieldType::Integer {
						min: Some(0),
						max: Some(60_000),
					},
				),
			],
		);
		schema.validate(config)
	}
}

/// Factory function to create a mock delivery from configuration.
///
/// Configuration parameters (all optional):
/// - `status`: status to answer with, default 201
/// - `message`: message returned with the answer
/// - `latency_ms`: delay before answering
pub fn create_mock_delivery(
	config: &toml::Value,
	_orders_url: &str,
) -> Result<Box<dyn OrderDeliveryInterface>, DeliveryError> {
	MockDeliverySchema
		.validate(config)
		.map_err(|e| DeliveryError::Configuration(format!("Invalid mock delivery config: {}", e)))?;

	let mock_config: MockDeliveryConfig = config
		.clone()
		.try_into()
		.map_err(|e| DeliveryError::Configuration(format!("Invalid mock delivery config: {}", e)))?;

	Ok(Box::new(MockDelivery::new(mock_config)))
}

/// Registry for the mock delivery implementation.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "mock";
	type Factory = DeliveryFactory;

	fn factory() -> Self::Factory {
		create_mock_delivery
	}
}

impl DeliveryRegistry for Registry {}
