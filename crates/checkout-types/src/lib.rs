//! Common types module for the food-order checkout.
//!
//! This module defines the data types shared by every checkout component:
//! cart contents, customer form data, the order request sent to the backend,
//! the submission state machine states and the view model rendered by front
//! ends. Keeping them in one crate keeps the wire shapes consistent.

/// Cart contents and total computation.
pub mod cart;
/// Raw and validated customer form data.
pub mod customer;
/// Lifecycle events emitted by the checkout engine.
pub mod events;
/// Order request payload sent to the backend.
pub mod order;
/// User-progress modes deciding which surface is visible.
pub mod progress;
/// Registry trait for self-registering implementations.
pub mod registry;
/// Submission state of one checkout.
pub mod submission;
/// Utility functions for display formatting.
pub mod utils;
/// Configuration validation types for implementation-specific settings.
pub mod validation;
/// View model chosen by the view selector.
pub mod view;

// Re-export all types for convenient access
pub use cart::*;
pub use customer::*;
pub use events::*;
pub use order::*;
pub use progress::*;
pub use registry::*;
pub use submission::*;
pub use utils::{format_currency, truncate_id};
pub use validation::*;
pub use view::*;
