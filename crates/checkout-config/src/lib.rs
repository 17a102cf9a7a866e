//! Configuration module for the checkout.
//!
//! Configuration is a TOML file with two sections: `[checkout]`, naming the
//! backend the orders are posted to, and `[delivery]`, listing the available
//! delivery implementations and the one to use. `${VAR}` and
//! `${VAR:-default}` placeholders are replaced with environment variables
//! before parsing, which is how the API base URL is usually injected:
//!
//! ```toml
//! [checkout]
//! api_base_url = "${API_URL:-http://localhost:3000}"
//!
//! [delivery]
//! primary = "http"
//! [delivery.implementations.http]
//! timeout_seconds = 30
//! ```

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error that occurs during file I/O operations.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	/// Error that occurs when parsing TOML configuration.
	#[error("Configuration error: {0}")]
	Parse(String),
	/// Error that occurs when configuration validation fails.
	#[error("Validation error: {0}")]
	Validation(String),
}

impl From<toml::de::Error> for ConfigError {
	fn from(err: toml::de::Error) -> Self {
		// Keep the message only, the error's Display repeats the input
		ConfigError::Parse(err.message().to_string())
	}
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
	/// Backend the checkout talks to.
	pub checkout: CheckoutConfig,
	/// Order delivery implementations.
	pub delivery: DeliveryConfig,
}

/// Backend location.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CheckoutConfig {
	/// Base URL of the ordering API, e.g. `http://localhost:3000`.
	pub api_base_url: String,
	/// Path of the order endpoint below the base URL.
	#[serde(default = "default_orders_path")]
	pub orders_path: String,
}

fn default_orders_path() -> String {
	"/orders".to_string()
}

impl CheckoutConfig {
	/// Full URL orders are posted to.
	pub fn orders_url(&self) -> String {
		format!(
			"{}{}",
			self.api_base_url.trim_end_matches('/'),
			self.orders_path
		)
	}
}

/// Configuration for order delivery.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DeliveryConfig {
	/// Which implementation submits orders.
	pub primary: String,
	/// Map of implementation names to their raw TOML configuration.
	pub implementations: HashMap<String, toml::Value>,
}

impl DeliveryConfig {
	/// Configuration table of the primary implementation.
	pub fn primary_config(&self) -> Option<&toml::Value> {
		self.implementations.get(&self.primary)
	}
}

/// Resolves environment variables in a string.
///
/// Replaces ${VAR_NAME} with the value of the environment variable VAR_NAME.
/// Supports default values with ${VAR_NAME:-default_value}.
///
/// Input strings are limited to 1MB to prevent ReDoS attacks.
pub(crate) fn resolve_env_vars(input: &str) -> Result<String, ConfigError> {
	const MAX_INPUT_SIZE: usize = 1024 * 1024;
	if input.len() > MAX_INPUT_SIZE {
		return Err(ConfigError::Validation(format!(
			"Configuration file too large: {} bytes (max: {} bytes)",
			input.len(),
			MAX_INPUT_SIZE
		)));
	}

	let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]{0,127})(?::-([^}]{0,256}))?\}")
		.map_err(|e| ConfigError::Parse(format!("Regex error: {}", e)))?;

	let mut resolved = String::with_capacity(input.len());
	let mut last_end = 0;
	for cap in re.captures_iter(input) {
		let (Some(full_match), Some(var_name)) = (cap.get(0), cap.get(1)) else {
			continue;
		};
		let value = match std::env::var(var_name.as_str()) {
			Ok(value) => value,
			Err(_) => match cap.get(2) {
				Some(default) => default.as_str().to_string(),
				None => {
					return Err(ConfigError::Validation(format!(
						"Environment variable '{}' not found",
						var_name.as_str()
					)))
				},
			},
		};

		resolved.push_str(&input[last_end..full_match.start()]);
		resolved.push_str(&value);
		last_end = full_match.end();
	}
	resolved.push_str(&input[last_end..]);

	Ok(resolved)
}

impl Config {
	/// Loads configuration from a file, resolving environment variables.
	pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let path = path.as_ref();
		let content = tokio::fs::read_to_string(path).await.map_err(|e| {
			ConfigError::Io(std::io::Error::new(
				e.kind(),
				format!("Cannot read {}: {}", path.display(), e),
			))
		})?;
		let config: Config = content.parse()?;
		tracing::debug!(
			path = %path.display(),
			orders_url = %config.checkout.orders_url(),
			delivery = %config.delivery.primary,
			"Loaded configuration"
		);
		Ok(config)
	}

	/// Configuration posting to `api_base_url` through the HTTP delivery with
	/// default settings.
	#[cfg(feature = "testing")]
	pub fn testing(api_base_url: &str) -> Self {
		let mut implementations = HashMap::new();
		implementations.insert(
			"http".to_string(),
			toml::Value::Table(toml::map::Map::new()),
		);
		Self {
			checkout: CheckoutConfig {
				api_base_url: api_base_url.to_string(),
				orders_path: default_orders_path(),
			},
			delivery: DeliveryConfig {
				primary: "http".to_string(),
				implementations,
			},
		}
	}

	/// Validates the configuration:
	/// - the API base URL is an absolute http(s) URL
	/// - the orders path starts with '/'
	/// - at least one delivery implementation exists and the primary is one of them
	fn validate(&self) -> Result<(), ConfigError> {
		let base_url = self.checkout.api_base_url.trim();
		if base_url.is_empty() {
			return Err(ConfigError::Validation(
				"checkout.api_base_url cannot be empty".into(),
			));
		}
		if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
			return Err(ConfigError::Validation(format!(
				"checkout.api_base_url must start with http:// or https://, got '{}'",
				base_url
			)));
		}
		if !self.checkout.orders_path.starts_with('/') {
			return Err(ConfigError::Validation(format!(
				"checkout.orders_path must start with '/', got '{}'",
				self.checkout.orders_path
			)));
		}

		if self.delivery.implementations.is_empty() {
			return Err(ConfigError::Validation(
				"At least one delivery implementation must be configured".into(),
			));
		}
		if self.delivery.primary.is_empty() {
			return Err(ConfigError::Validation(
				"Delivery primary implementation cannot be empty".into(),
			));
		}
		if self.delivery.primary_config().is_none() {
			return Err(ConfigError::Validation(format!(
				"Primary delivery '{}' not found in implementations",
				self.delivery.primary
			)));
		}

		Ok(())
	}
}

/// Parses a TOML string: environment variables are resolved first and the
/// result is validated.
impl FromStr for Config {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let resolved = resolve_env_vars(s)?;
		let mut config: Config = toml::from_str(&resolved)?;
		config.checkout.api_base_url = config.checkout.api_base_url.trim().to_string();
		config.validate()?;
		Ok(config)
	}
}
