//! Core checkout engine.
//!
//! This crate holds the order-submission workflow of the checkout: the
//! submission state machine, the mapping from form and cart onto the order
//! request, the view selection and the engine coordinating them with the
//! stores and the order delivery. Engines are composed with the
//! [`CheckoutBuilder`] from configuration and delivery factories.

pub mod builder;
pub mod engine;
pub mod mapper;
pub mod state;
pub mod view;

pub use builder::{BuilderError, CheckoutBuilder, CheckoutFactories};
pub use engine::{event_bus::EventBus, CheckoutEngine, CheckoutError, PendingSubmission};
pub use mapper::build_order_request;
pub use state::{SubmissionStateError, SubmissionStateMachine};
pub use view::select_view;
