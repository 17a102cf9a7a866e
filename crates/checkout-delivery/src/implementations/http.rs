//! HTTP delivery implementation.
//!
//! Posts the order as JSON to the backend's order endpoint. Any 2xx answer
//! with a JSON body is a success. For other statuses the backend's
//! `message` field becomes the customer-facing error.

use crate::{
	DeliveryError, DeliveryFactory, DeliveryRegistry, OrderDeliveryInterface,
	GENERIC_REJECTION_MESSAGE,
};
use async_trait::async_trait;
use checkout_types::{
	ConfigSchema, Field, FieldType, ImplementationRegistry, OrderRequest, Schema, ValidationError,
};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Configuration of the HTTP delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpDeliveryConfig {
	/// Timeout of the whole request in seconds.
	#[serde(default = "default_timeout_seconds")]
	pub timeout_seconds: u64,
	/// Optional User-Agent header.
	#[serde(default)]
	pub user_agent: Option<String>,
	/// Extra headers sent with every order.
	#[serde(default)]
	pub headers: HashMap<String, String>,
}

fn default_timeout_seconds() -> u64 {
	30
}

impl Default for HttpDeliveryConfig {
	fn default() -> Self {
		Self {
			timeout_seconds: default_timeout_seconds(),
			user_agent: None,
			headers: HashMap::new(),
		}
	}
}

/// Delivers orders with a `reqwest` client.
pub struct HttpDelivery {
	client: reqwest::Client,
	orders_url: String,
}

impl HttpDelivery {
	pub fn new(
		orders_url: impl Into<String>,
		config: &HttpDeliveryConfig,
	) -> Result<Self, DeliveryError> {
		let mut headers = HeaderMap::new();
		for (name, value) in &config.headers {
			let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
				DeliveryError::Configuration(format!("Invalid header name '{}': {}", name, e))
			})?;
			let value = HeaderValue::from_str(value).map_err(|e| {
				DeliveryError::Configuration(format!("Invalid value for header '{}': {}", name, e))
			})?;
			headers.insert(name, value);
		}

		let mut builder = reqwest::Client::builder()
			.timeout(Duration::from_secs(config.timeout_seconds))
			.default_headers(headers);
		if let Some(user_agent) = &config.user_agent {
			builder = builder.user_agent(user_agent.clone());
		}
		let client = builder
			.build()
			.map_err(|e| DeliveryError::Configuration(format!("Failed to build HTTP client: {}", e)))?;

		Ok(Self {
			client,
			orders_url: orders_url.into(),
		})
	}

	pub fn orders_url(&self) -> &str {
		&self.orders_url
	}
}

#[async_trait]
impl OrderDeliveryInterface for HttpDelivery {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(HttpDeliverySchema)
	}

	async fn submit_order(&self, order: &OrderRequest) -> Result<serde_json::Value, DeliveryError> {
		let response = self
			.client
			.post(&self.orders_url)
			.json(order)
			.send()
			.await
			.map_err(|e| DeliveryError::Network(e.to_string()))?;

		let status = response.status();
		let body = response
			.text()
			.await
			.map_err(|e| DeliveryError::Network(e.to_string()))?;
		let parsed = serde_json::from_str::<serde_json::Value>(&body);

		if !status.is_success() {
			let message = parsed
				.ok()
				.and_then(|value| {
					value
						.get("message")
						.and_then(|message| message.as_str())
						.map(str::to_string)
				})
				.filter(|message| !message.trim().is_empty())
				.unwrap_or_else(|| GENERIC_REJECTION_MESSAGE.to_string());
			return Err(DeliveryError::Rejected {
				status: status.as_u16(),
				message,
			});
		}

		parsed.map_err(|e| {
			DeliveryError::InvalidResponse(format!("Response body is not valid JSON: {}", e))
		})
	}
}

/// Configuration schema for HttpDelivery.
pub struct HttpDeliverySchema;

impl ConfigSchema for HttpDeliverySchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			vec![],
			vec![
				Field::new(
					"timeout_seconds",
					FieldType::Integer {
						min: Some(1),
						max: Some(300),
					},
				),
				Field::new("user_agent", FieldType::String).with_validator(|value| {
					match value.as_str() {
						Some(agent) if agent.trim().is_empty() => {
							Err("user_agent cannot be blank".to_string())
						},
						_ => Ok(()),
					}
				}),
				Field::new("headers", FieldType::StringMap),
			],
		);
		schema.validate(config)
	}
}

/// Factory function to create an HTTP delivery from configuration.
///
/// Configuration parameters (all optional):
/// - `timeout_seconds`: request timeout, 1..=300, default 30
/// - `user_agent`: User-Agent header
/// - `headers`: table of extra headers
pub fn create_http_delivery(
	config: &toml::Value,
	orders_url: &str,
) -> Result<Box<dyn OrderDeliveryInterface>, DeliveryError> {
	HttpDeliverySchema
		.validate(config)
		.map_err(|e| DeliveryError::Configuration(format!("Invalid http delivery config: {}", e)))?;

	let http_config: HttpDeliveryConfig = config
		.clone()
		.try_into()
		.map_err(|e| DeliveryError::Configuration(format!("Invalid http delivery config: {}", e)))?;

	Ok(Box::new(HttpDelivery::new(orders_url, &http_config)?))
}

/// Registry for the HTTP delivery implementation.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "http";
	type Factory = DeliveryFactory;

	fn factory() -> Self::Factory {
		create_http_delivery
	}
}

impl DeliveryRegistry for Registry {}
