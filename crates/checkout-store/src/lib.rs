//! State containers shared by the checkout.
//!
//! The cart and the user-progress mode are owned outside the checkout flow
//! and handed to it by reference. Each container has a single writer at a
//! time and is safe to read from any task.

pub mod cart;
pub mod progress;

pub use cart::CartStore;
pub use progress::UserProgressStore;
