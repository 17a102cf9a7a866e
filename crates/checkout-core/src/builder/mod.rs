//! Builder pattern for constructing checkout engines.
//!
//! Creates the configured delivery implementation through a factory map and
//! wires it into a [`CheckoutEngine`] together with the cart and progress
//! stores. Stores can be injected to share them with the rest of the UI.

use crate::engine::{event_bus::EventBus, CheckoutEngine};
use checkout_config::Config;
use checkout_delivery::{DeliveryError, DeliveryService, OrderDeliveryInterface};
use checkout_store::{CartStore, UserProgressStore};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur during checkout engine construction.
#[derive(Debug, Error)]
pub enum BuilderError {
	#[error("Configuration error: {0}")]
	Config(String),
	#[error("Missing required component: {0}")]
	MissingComponent(String),
}

/// Factory functions needed to build a CheckoutEngine.
///
/// Each delivery factory takes the implementation's TOML table and the order
/// endpoint URL.
pub struct CheckoutFactories<DF> {
	pub delivery_factories: HashMap<String, DF>,
}

/// Builder for constructing a CheckoutEngine with a pluggable delivery.
pub struct CheckoutBuilder {
	config: Config,
	cart: Option<Arc<CartStore>>,
	progress: Option<Arc<UserProgressStore>>,
	event_capacity: usize,
}

impl CheckoutBuilder {
	/// Creates a new CheckoutBuilder with the given configuration.
	pub fn new(config: Config) -> Self {
		Self {
			config,
			cart: None,
			progress: None,
			event_capacity: 64,
		}
	}

	/// Uses an existing cart store instead of an empty one.
	pub fn with_cart(mut self, cart: Arc<CartStore>) -> Self {
		self.cart = Some(cart);
		self
	}

	/// Uses an existing user-progress store.
	pub fn with_progress(mut self, progress: Arc<UserProgressStore>) -> Self {
		self.progress = Some(progress);
		self
	}

	pub fn with_event_capacity(mut self, capacity: usize) -> Self {
		self.event_capacity = capacity;
		self
	}

	/// Builds the CheckoutEngine, creating the primary delivery
	/// implementation from its factory.
	pub fn build<DF>(self, factories: CheckoutFactories<DF>) -> Result<CheckoutEngine, BuilderError>
	where
		DF: Fn(&toml::Value, &str) -> Result<Box<dyn OrderDeliveryInterface>, DeliveryError>,
	{
		let primary = &self.config.delivery.primary;
		let delivery_config = self.config.delivery.primary_config().ok_or_else(|| {
			BuilderError::Config(format!(
				"Primary delivery '{}' not found in implementations",
				primary
			))
		})?;
		let factory = factories.delivery_factories.get(primary).ok_or_else(|| {
			BuilderError::MissingComponent(format!(
				"No factory registered for delivery '{}'",
				primary
			))
		})?;

		let orders_url = self.config.checkout.orders_url();
		let implementation = match factory(delivery_config, &orders_url) {
			Ok(implementation) => {
				tracing::info!(component = "delivery", implementation = %primary, orders_url = %orders_url, "Loaded");
				implementation
			},
			Err(e) => {
				tracing::error!(
					component = "delivery",
					implementation = %primary,
					error = %e,
					"Failed to create delivery implementation"
				);
				return Err(BuilderError::Config(format!(
					"Failed to create delivery implementation '{}': {}",
					primary, e
				)));
			},
		};

		let delivery = Arc::new(DeliveryService::new(
			primary.clone(),
			Arc::from(implementation),
		));
		let cart = self.cart.unwrap_or_default();
		let progress = self.progress.unwrap_or_default();

		Ok(CheckoutEngine::new(
			self.config,
			cart,
			progress,
			delivery,
			EventBus::new(self.event_capacity),
		))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use checkout_delivery::get_all_implementations;
	use checkout_types::{CartItem, CustomerFormData, SubmissionStatus};

	fn all_factories() -> CheckoutFactories<checkout_delivery::DeliveryFactory> {
		CheckoutFactories {
			delivery_factories: get_all_implementations()
				.into_iter()
				.map(|(name, factory)| (name.to_string(), factory))
				.collect(),
		}
	}

	fn mock_config() -> Config {
		r#"
[checkout]
api_base_url = "http://localhost:3000"

[delivery]
primary = "mock"
[delivery.implementations.mock]
status = 201
"#
		.parse()
		.unwrap()
	}

	#[test]
	fn test_build_with_http_delivery() {
		let engine = CheckoutBuilder::new(Config::testing("http://localhost:3000"))
			.build(all_factories())
			.unwrap();
		assert_eq!(
			engine.config().checkout.orders_url(),
			"http://localhost:3000/orders"
		);
	}

	#[test]
	fn test_missing_factory() {
		let factories = CheckoutFactories::<checkout_delivery::DeliveryFactory> {
			delivery_factories: HashMap::new(),
		};
		let result = CheckoutBuilder::new(mock_config()).build(factories);
		assert!(matches!(result, Err(BuilderError::MissingComponent(_))));
	}

	#[test]
	fn test_invalid_delivery_config() {
		let mut config = mock_config();
		config.delivery.implementations.insert(
			"mock".to_string(),
			toml::from_str("status = 42").unwrap(),
		);

		let err = CheckoutBuilder::new(config)
			.build(all_factories())
			.err()
			.unwrap();
		assert!(err
			.to_string()
			.contains("Failed to create delivery implementation 'mock'"));
	}

	#[tokio::test]
	async fn test_built_engine_uses_injected_stores() {
		let cart = Arc::new(
			CartStore::with_items(vec![CartItem::new(
				1u64,
				"Pizza",
				"12.5".parse().unwrap(),
				2,
			)])
			.unwrap(),
		);
		let engine = CheckoutBuilder::new(mock_config())
			.with_cart(cart.clone())
			.build(all_factories())
			.unwrap();

		engine.open_checkout().await;
		let form = CustomerFormData::from_entries([
			("name", "Jo"),
			("email", "jo@x.com"),
			("street", "Main"),
			("city", "Town"),
			("zip", "1000"),
		]);
		let state = engine.submit(&form).await.unwrap();
		assert_eq!(state.status(), SubmissionStatus::Succeeded);
		assert_eq!(state.response_data().unwrap()["message"], "Order created!");

		engine.acknowledge_success().await.unwrap();
		assert!(cart.is_empty().await);
	}
}
