//! Customer form types.
//!
//! The checkout form is harvested as a loose field-name → string mapping
//! ([`CustomerFormData`]) and turned into a typed [`CustomerDetails`] by
//! explicit parsing. Parsing reports every failing field at once so the form
//! can show all problems next to their inputs.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use validator::{Validate, ValidationErrors};

/// Accepted postal codes: 3 to 10 letters, digits, spaces or dashes, not
/// starting or ending with a separator.
static ZIP_PATTERN: Lazy<Regex> =
	Lazy::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9 \-]{1,8}[A-Za-z0-9]$").unwrap());

/// Fields of the checkout form, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormField {
	Name,
	Email,
	Street,
	Zip,
	City,
}

impl FormField {
	pub const ALL: [FormField; 5] = [
		FormField::Name,
		FormField::Email,
		FormField::Street,
		FormField::Zip,
		FormField::City,
	];

	/// Name of the form input carrying this field.
	pub fn as_str(&self) -> &'static str {
		match self {
			FormField::Name => "name",
			FormField::Email => "email",
			FormField::Street => "street",
			FormField::Zip => "zip",
			FormField::City => "city",
		}
	}

	/// Label shown next to the input.
	pub fn label(&self) -> &'static str {
		match self {
			FormField::Name => "Full Name",
			FormField::Email => "E-Mail Address",
			FormField::Street => "Street",
			FormField::Zip => "Zip",
			FormField::City => "City",
		}
	}
}

impl fmt::Display for FormField {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for FormField {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		FormField::ALL
			.into_iter()
			.find(|field| field.as_str() == s)
			.ok_or_else(|| format!("Unknown form field: {}", s))
	}
}

/// Raw form values as harvested at submit time.
///
/// Field names that are not part of the checkout form are kept but never
/// read; missing fields read as the empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomerFormData {
	fields: BTreeMap<String, String>,
}

impl CustomerFormData {
	pub fn new() -> Self {
		Self::default()
	}

	/// Builds form data from `(name, value)` entries. Later entries win.
	pub fn from_entries<I, K, V>(entries: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<String>,
	{
		entries.into_iter().collect()
	}

	/// Sets the value of a form field.
	pub fn set(&mut self, field: FormField, value: impl Into<String>) {
		self.fields.insert(field.as_str().to_string(), value.into());
	}

	/// Builder-style variant of [`CustomerFormData::set`].
	pub fn with(mut self, field: FormField, value: impl Into<String>) -> Self {
		self.set(field, value);
		self
	}

	/// Returns the raw value of a form field.
	pub fn get(&self, field: FormField) -> &str {
		self.fields
			.get(field.as_str())
			.map(String::as_str)
			.unwrap_or_default()
	}
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for CustomerFormData {
	fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
		Self {
			fields: iter
				.into_iter()
				.map(|(name, value)| (name.into(), value.into()))
				.collect(),
		}
	}
}

/// Customer details that passed validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct CustomerDetails {
	#[validate(length(min = 1, message = "Please enter your full name."))]
	pub name: String,
	#[validate(email(message = "Please enter a valid e-mail address."))]
	pub email: String,
	#[validate(length(min = 1, message = "Please enter a street."))]
	pub street: String,
	#[validate(length(min = 1, message = "Please enter a city."))]
	pub city: String,
	#[validate(regex(path = *ZIP_PATTERN, message = "Please enter a valid zip code."))]
	pub zip: String,
}

impl CustomerDetails {
	/// Parses and validates raw form data. Values are trimmed first.
	pub fn parse(form: &CustomerFormData) -> Result<Self, FormErrors> {
		let details = Self {
			name: form.get(FormField::Name).trim().to_string(),
			email: form.get(FormField::Email).trim().to_string(),
			street: form.get(FormField::Street).trim().to_string(),
			city: form.get(FormField::City).trim().to_string(),
			zip: form.get(FormField::Zip).trim().to_string(),
		};

		details.validate()?;
		Ok(details)
	}
}

/// Validation failure of a single form field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
	pub field: FormField,
	pub message: String,
}

/// All validation failures of one submission attempt, ordered by field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormErrors {
	errors: Vec<FieldError>,
}

impl FormErrors {
	pub fn new(mut errors: Vec<FieldError>) -> Self {
		errors.sort_by_key(|error| error.field);
		Self { errors }
	}

	pub fn errors(&self) -> &[FieldError] {
		&self.errors
	}

	/// First message reported for `field`, if any.
	pub fn get(&self, field: FormField) -> Option<&str> {
		self.errors
			.iter()
			.find(|error| error.field == field)
			.map(|error| error.message.as_str())
	}

	pub fn is_empty(&self) -> bool {
		self.errors.is_empty()
	}

	pub fn len(&self) -> usize {
		self.errors.len()
	}
}

impl fmt::Display for FormErrors {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "Invalid customer data")?;
		for (i, error) in self.errors.iter().enumerate() {
			let separator = if i == 0 { ": " } else { "; " };
			write!(f, "{}{} ({})", separator, error.field, error.message)?;
		}
		Ok(())
	}
}

impl std::error::Error for FormErrors {}

impl From<ValidationErrors> for FormErrors {
	fn from(errors: ValidationErrors) -> Self {
		let mut collected = Vec::new();
		for (name, field_errors) in errors.field_errors() {
			let Ok(field) = name.parse::<FormField>() else {
				continue;
			};
			for error in field_errors.iter() {
				let message = error
					.message
					.as_ref()
					.map(|message| message.to_string())
					.unwrap_or_else(|| format!("Invalid value ({})", error.code));
				collected.push(FieldError { field, message });
			}
		}
		FormErrors::new(collected)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn valid_form() -> CustomerFormData {
		CustomerFormData::from_entries([
			("name", "Jo"),
			("email", "jo@x.com"),
			("street", "Main"),
			("city", "Town"),
			("zip", "1000"),
		])
	}

	#[test]
	fn test_parse_valid_form() {
		let details = CustomerDetails::parse(&valid_form()).unwrap();
		assert_eq!(details.name, "Jo");
		assert_eq!(details.email, "jo@x.com");
		assert_eq!(details.street, "Main");
		assert_eq!(details.city, "Town");
		assert_eq!(details.zip, "1000");
	}

	#[test]
	fn test_parse_trims_values() {
		let form = valid_form().with(FormField::Name, "  Jo Doe  ");
		let details = CustomerDetails::parse(&form).unwrap();
		assert_eq!(details.name, "Jo Doe");
	}

	#[test]
	fn test_empty_form_reports_every_field() {
		let errors = CustomerDetails::parse(&CustomerFormData::new()).unwrap_err();
		assert_eq!(errors.len(), 5);
		let fields: Vec<FormField> = errors.errors().iter().map(|e| e.field).collect();
		assert_eq!(fields, FormField::ALL.to_vec());
		assert_eq!(errors.get(FormField::Name), Some("Please enter your full name."));
	}

	#[test]
	fn test_malformed_email_and_zip() {
		let form = valid_form()
			.with(FormField::Email, "not-an-email")
			.with(FormField::Zip, "1");
		let errors = CustomerDetails::parse(&form).unwrap_err();
		assert_eq!(errors.len(), 2);
		assert_eq!(
			errors.get(FormField::Email),
			Some("Please enter a valid e-mail address.")
		);
		assert_eq!(errors.get(FormField::Zip), Some("Please enter a valid zip code."));
		assert!(errors.get(FormField::Name).is_none());
		assert!(errors.to_string().starts_with("Invalid customer data: email"));
	}

	#[test]
	fn test_unknown_fields_are_ignored() {
		let mut entries: Vec<(&str, &str)> = vec![("coupon", "FREE")];
		entries.extend([
			("name", "Jo"),
			("email", "jo@x.com"),
			("street", "Main"),
			("city", "Town"),
			("zip", "1000"),
		]);
		let form = CustomerFormData::from_entries(entries);
		assert!(CustomerDetails::parse(&form).is_ok());
	}

	#[test]
	fn test_form_field_round_trip_names() {
		for field in FormField::ALL {
			assert_eq!(field.as_str().parse::<FormField>().unwrap(), field);
		}
		assert!("coupon".parse::<FormField>().is_err());
	}
}
