//! Utility functions for display formatting.

pub mod formatting;

pub use formatting::{format_currency, truncate_id};
