//! Configuration validation utilities.
//!
//! Every pluggable implementation owns a TOML table in the configuration
//! file. This module lets an implementation describe that table as a
//! [`Schema`] and check it before the implementation is constructed, so that
//! typos surface at startup instead of at the first order.

use thiserror::Error;

/// Errors that can occur during configuration validation.
#[derive(Debug, Error)]
pub enum ValidationError {
	/// Error that occurs when a required field is missing.
	#[error("Missing required field: {0}")]
	MissingField(String),
	/// Error that occurs when a field has an invalid value.
	#[error("Invalid value for field '{field}': {message}")]
	InvalidValue { field: String, message: String },
	/// Error that occurs when field type is incorrect.
	#[error("Type mismatch for field '{field}': expected {expected}, got {actual}")]
	TypeMismatch {
		field: String,
		expected: String,
		actual: String,
	},
}

/// Expected type of a configuration field.
#[derive(Debug)]
pub enum FieldType {
	String,
	/// An integer with optional inclusive bounds.
	Integer { min: Option<i64>, max: Option<i64> },
	Boolean,
	/// A table of string values (e.g. extra HTTP headers).
	StringMap,
}

impl FieldType {
	fn name(&self) -> &'static str {
		match self {
			FieldType::String => "string",
			FieldType::Integer { .. } => "integer",
			FieldType::Boolean => "boolean",
			FieldType::StringMap => "table of strings",
		}
	}
}

/// Custom check run after the type check succeeded.
pub type FieldValidator = Box<dyn Fn(&toml::Value) -> Result<(), String> + Send + Sync>;

/// A field in a configuration schema.
pub struct Field {
	pub name: String,
	pub field_type: FieldType,
	pub validator: Option<FieldValidator>,
}

impl std::fmt::Debug for Field {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Field")
			.field("name", &self.name)
			.field("field_type", &self.field_type)
			.field("validator", &self.validator.is_some())
			.finish()
	}
}

impl Field {
	pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
		Self {
			name: name.into(),
			field_type,
			validator: None,
		}
	}

	/// Adds a custom validator to this field.
	///
	/// The closure receives the field's value and returns a message when the
	/// value is rejected.
	pub fn with_validator<F>(mut self, validator: F) -> Self
	where
		F: Fn(&toml::Value) -> Result<(), String> + Send + Sync + 'static,
	{
		self.validator = Some(Box::new(validator));
		self
	}
}

/// Required and optional fields of one implementation table.
#[derive(Debug)]
pub struct Schema {
	pub required: Vec<Field>,
	pub optional: Vec<Field>,
}

impl Schema {
	pub fn new(required: Vec<Field>, optional: Vec<Field>) -> Self {
		Self { required, optional }
	}

	/// Validates a TOML table against this schema.
	///
	/// Required fields must be present; every present field must have the
	/// expected type, stay within its bounds and pass its custom validator.
	/// Unknown fields are ignored.
	pub fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let table = config
			.as_table()
			.ok_or_else(|| ValidationError::TypeMismatch {
				field: "root".to_string(),
				expected: "table".to_string(),
				actual: config.type_str().to_string(),
			})?;

		for field in &self.required {
			let value = table
				.get(&field.name)
				.ok_or_else(|| ValidationError::MissingField(field.name.clone()))?;
			validate_field(field, value)?;
		}

		for field in &self.optional {
			if let Some(value) = table.get(&field.name) {
				validate_field(field, value)?;
			}
		}

		Ok(())
	}
}

fn validate_field(field: &Field, value: &toml::Value) -> Result<(), ValidationError> {
	let type_mismatch = || ValidationError::TypeMismatch {
		field: field.name.clone(),
		expected: field.field_type.name().to_string(),
		actual: value.type_str().to_string(),
	};

	match &field.field_type {
		FieldType::String => {
			if !value.is_str() {
				return Err(type_mismatch());
			}
		},
		FieldType::Integer { min, max } => {
			let int_val = value.as_integer().ok_or_else(type_mismatch)?;
			if let Some(min_val) = min.filter(|min_val| int_val < *min_val) {
				return Err(ValidationError::InvalidValue {
					field: field.name.clone(),
					message: format!("Value {} is less than minimum {}", int_val, min_val),
				});
			}
			if let Some(max_val) = max.filter(|max_val| int_val > *max_val) {
				return Err(ValidationError::InvalidValue {
					field: field.name.clone(),
					message: format!("Value {} is greater than maximum {}", int_val, max_val),
				});
			}
		},
		FieldType::Boolean => {
			if !value.is_bool() {
				return Err(type_mismatch());
			}
		},
		FieldType::StringMap => {
			let table = value.as_table().ok_or_else(type_mismatch)?;
			if let Some((key, entry)) = table.iter().find(|(_, entry)| !entry.is_str()) {
				return Err(ValidationError::TypeMismatch {
					field: format!("{}.{}", field.name, key),
					expected: "string".to_string(),
					actual: entry.type_str().to_string(),
				});
			}
		},
	}

	if let Some(validator) = &field.validator {
		validator(value).map_err(|message| ValidationError::InvalidValue {
			field: field.name.clone(),
			message,
		})?;
	}

	Ok(())
}

/// Trait implemented by the schema of each configurable implementation.
pub trait ConfigSchema: Send + Sync {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError>;
}
