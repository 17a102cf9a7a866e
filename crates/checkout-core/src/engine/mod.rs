//! Checkout engine.
//!
//! Ties the cart, the user progress, the order delivery and the submission
//! state machine together and exposes the operations a front end calls:
//! opening and closing the checkout, submitting the form, acknowledging a
//! successful order and reading the view to render.
//!
//! Locks are never held across the delivery call. A submission is split in
//! [`CheckoutEngine::begin_submission`] and
//! [`CheckoutEngine::complete_submission`]; [`CheckoutEngine::submit`] runs
//! both around the request.

use crate::mapper::build_order_request;
use crate::state::{SubmissionStateError, SubmissionStateMachine};
use crate::view::select_view;
use checkout_config::Config;
use checkout_delivery::DeliveryService;
use checkout_store::{CartStore, UserProgressStore};
use checkout_types::{
	cart_total, format_currency, CartError, CheckoutEvent, CheckoutView, CustomerDetails, CustomerFormData, FormErrors,
	OrderRequest, SubmissionFailure, SubmissionState, SubmissionStatus, UserProgress,
};
use rust_decimal::Decimal;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{broadcast, Mutex};
use tracing::instrument;

pub mod event_bus;

use event_bus::EventBus;

/// Errors that can occur during checkout operations.
#[derive(Debug, Error)]
pub enum CheckoutError {
	/// The form did not pass validation; nothing was sent.
	#[error(transparent)]
	InvalidForm(#[from] FormErrors),
	#[error("Cannot submit an order with an empty cart")]
	EmptyCart,
	#[error("An order submission is already in progress")]
	SubmissionInProgress,
	#[error("Checkout is not open")]
	NotOpen,
	#[error("Invalid cart: {0}")]
	Cart(#[from] CartError),
	#[error("State error: {0}")]
	State(#[from] SubmissionStateError),
}

/// A started submission: the request to deliver and the generation its
/// result must be reported with.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingSubmission {
	pub generation: u64,
	pub request: OrderRequest,
}

/// Runs the checkout of one cart.
pub struct CheckoutEngine {
	/// Checkout configuration.
	config: Config,
	/// Cart being checked out.
	cart: Arc<CartStore>,
	/// Which part of the ordering UI is visible.
	progress: Arc<UserProgressStore>,
	/// Delivery service posting the orders.
	delivery: Arc<DeliveryService>,
	state_machine: Mutex<SubmissionStateMachine>,
	/// Field errors of the last rejected form.
	form_errors: Mutex<FormErrors>,
	event_bus: EventBus,
}

impl CheckoutEngine {
	pub fn new(
		config: Config,
		cart: Arc<CartStore>,
		progress: Arc<UserProgressStore>,
		delivery: Arc<DeliveryService>,
		event_bus: EventBus,
	) -> Self {
		Self {
			config,
			cart,
			progress,
			delivery,
			state_machine: Mutex::new(SubmissionStateMachine::new()),
			form_errors: Mutex::new(FormErrors::default()),
			event_bus,
		}
	}

	/// Current cart total.
	pub async fn cart_total(&self) -> Result<Decimal, CheckoutError> {
		Ok(self.cart.total().await?)
	}

	/// Current cart total formatted for display, e.g. `$25.00`.
	pub async fn formatted_total(&self) -> Result<String, CheckoutError> {
		Ok(format_currency(self.cart_total().await?))
	}

	/// Shows the checkout.
	///
	/// A request still pending from an earlier opening is abandoned: its
	/// result will be discarded when it arrives. The outcome of a finished
	/// request is kept.
	#[instrument(skip_all)]
	pub async fn open_checkout(&self) {
		if self.progress.current().await == UserProgress::Checkout {
			return;
		}

		let mut machine = self.state_machine.lock().await;
		if let Some(generation) = machine.abandon() {
			tracing::warn!(generation, "Abandoned pending order submission");
		}
		*self.form_errors.lock().await = FormErrors::default();
		self.progress.show_checkout().await;
		drop(machine);

		tracing::info!("Opened checkout");
		self.publish(CheckoutEvent::CheckoutOpened);
	}

	/// Hides the checkout.
	///
	/// A pending request is not cancelled. Closing the success view
	/// acknowledges the order.
	#[instrument(skip_all)]
	pub async fn close(&self) -> Result<(), CheckoutError> {
		if self.state().await.status() == SubmissionStatus::Succeeded {
			return self.acknowledge_success().await;
		}

		self.progress.hide_checkout().await;
		tracing::info!("Closed checkout");
		self.publish(CheckoutEvent::CheckoutClosed);
		Ok(())
	}

	/// Leaves the checkout for the cart.
	#[instrument(skip_all)]
	pub async fn back_to_cart(&self) {
		self.progress.show_cart().await;
		tracing::debug!("Returned to cart");
	}

	/// Validates the form, builds the order request from the current cart and
	/// moves the submission to Pending.
	///
	/// Invalid forms leave the state unchanged and their field errors are
	/// shown by [`CheckoutEngine::view`].
	#[instrument(skip_all)]
	pub async fn begin_submission(
		&self,
		form: &CustomerFormData,
	) -> Result<PendingSubmission, CheckoutError> {
		if self.progress.current().await != UserProgress::Checkout {
			return Err(CheckoutError::NotOpen);
		}

		let mut machine = self.state_machine.lock().await;
		if machine.state().is_pending() {
			return Err(CheckoutError::SubmissionInProgress);
		}

		let details = match CustomerDetails::parse(form) {
			Ok(details) => details,
			Err(errors) => {
				tracing::debug!(invalid_fields = errors.len(), "Rejected checkout form");
				*self.form_errors.lock().await = errors.clone();
				return Err(CheckoutError::InvalidForm(errors));
			},
		};
		*self.form_errors.lock().await = FormErrors::default();

		let items = self.cart.items().await;
		if items.is_empty() {
			return Err(CheckoutError::EmptyCart);
		}

		let total = cart_total(&items)?;
		let request = build_order_request(&details, &items);
		let generation = machine.begin()?;
		drop(machine);

		tracing::info!(
			generation,
			lines = request.cart.len(),
			total = %format_currency(total),
			"Submitting order"
		);
		self.publish(CheckoutEvent::SubmissionStarted {
			generation,
			item_count: request.item_count(),
		});

		Ok(PendingSubmission {
			generation,
			request,
		})
	}

	/// Applies the settled result of submission `generation`.
	///
	/// Returns false when the result is stale and was discarded.
	#[instrument(skip(self, result))]
	pub async fn complete_submission(
		&self,
		generation: u64,
		result: Result<serde_json::Value, SubmissionFailure>,
	) -> Result<bool, CheckoutError> {
		let mut machine = self.state_machine.lock().await;
		let outcome = machine
			.resolve(generation, result)
			.map(|state| state.error_message().map(str::to_string));
		drop(machine);

		let event = match outcome {
			Ok(Some(message)) => {
				tracing::warn!(error = %message, "Order submission failed");
				CheckoutEvent::SubmissionFailed {
					generation,
					message,
				}
			},
			Ok(None) => {
				tracing::info!("Order submitted");
				CheckoutEvent::SubmissionSucceeded { generation }
			},
			Err(SubmissionStateError::StaleGeneration { .. }) => {
				tracing::warn!("Discarding result of abandoned order submission");
				self.publish(CheckoutEvent::StaleResultDiscarded { generation });
				return Ok(false);
			},
			Err(e) => return Err(e.into()),
		};

		self.publish(event);
		Ok(true)
	}

	/// Submits the form: validates it, delivers the order and applies the
	/// result. Delivery failures end in the Failed state, not in an error.
	///
	/// Returns the submission state after the attempt.
	pub async fn submit(&self, form: &CustomerFormData) -> Result<SubmissionState, CheckoutError> {
		let pending = self.begin_submission(form).await?;

		let result = self
			.delivery
			.deliver(&pending.request)
			.await
			.map_err(SubmissionFailure::from);
		self.complete_submission(pending.generation, result).await?;

		Ok(self.state().await)
	}

	/// Finishes a successful checkout: empties the cart, hides the checkout
	/// and returns the submission to Idle.
	///
	/// Fails without side effects when the last submission did not succeed.
	#[instrument(skip_all)]
	pub async fn acknowledge_success(&self) -> Result<(), CheckoutError> {
		let mut machine = self.state_machine.lock().await;
		let generation = match machine.state() {
			SubmissionState::Succeeded { generation, .. } => *generation,
			other => {
				return Err(SubmissionStateError::InvalidTransition {
					from: other.status(),
					to: SubmissionStatus::Idle,
				}
				.into())
			},
		};

		self.cart.clear().await;
		self.progress.hide_checkout().await;
		machine.reset()?;
		drop(machine);

		tracing::info!(generation, "Order acknowledged");
		self.publish(CheckoutEvent::OrderAcknowledged { generation });
		Ok(())
	}

	/// View to render, or `None` while the checkout is hidden.
	pub async fn view(&self) -> Option<CheckoutView> {
		if self.progress.current().await != UserProgress::Checkout {
			return None;
		}

		let state = self.state().await;
		let form_errors = self.form_errors.lock().await.clone();
		let items = self.cart.items().await;
		Some(select_view(&state, &form_errors, &items))
	}

	/// Snapshot of the submission state.
	pub async fn state(&self) -> SubmissionState {
		self.state_machine.lock().await.state().clone()
	}

	/// Subscribes to checkout events.
	pub fn subscribe(&self) -> broadcast::Receiver<CheckoutEvent> {
		self.event_bus.subscribe()
	}

	pub fn config(&self) -> &Config {
		&self.config
	}

	pub fn cart(&self) -> &Arc<CartStore> {
		&self.cart
	}

	pub fn progress(&self) -> &Arc<UserProgressStore> {
		&self.progress
	}

	pub fn event_bus(&self) -> &EventBus {
		&self.event_bus
	}

	fn publish(&self, event: CheckoutEvent) {
		// no subscribers is fine
		let _ = self.event_bus.publish(event);
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use async_trait::async_trait;
	use checkout_delivery::{DeliveryError, OrderDeliveryInterface};
	use checkout_types::{CartItem, ConfigSchema, FormField, MealId};
	use mockall::mock;
	use serde_json::json;
	use std::sync::Mutex as StdMutex;

	mock! {
		pub Delivery {}

		#[async_trait]
		impl OrderDeliveryInterface for Delivery {
			fn config_schema(&self) -> Box<dyn ConfigSchema>;
			async fn submit_order(
				&self,
				order: &OrderRequest,
			) -> Result<serde_json::Value, DeliveryError>;
		}
	}

	fn pizza_cart() -> Arc<CartStore> {
		Arc::new(
			CartStore::with_items(vec![CartItem::new(
				1u64,
				"Pizza",
				"12.5".parse().unwrap(),
				2,
			)])
			.unwrap(),
		)
	}

	fn valid_form() -> CustomerFormData {
		CustomerFormData::from_entries([
			("name", "Jo"),
			("email", "jo@x.com"),
			("street", "Main"),
			("city", "Town"),
			("zip", "1000"),
		])
	}

	fn engine_with(delivery: MockDelivery, cart: Arc<CartStore>) -> CheckoutEngine {
		CheckoutEngine::new(
			Config::testing("http://localhost:3000"),
			cart,
			Arc::new(UserProgressStore::new()),
			Arc::new(DeliveryService::new("mock", Arc::new(delivery))),
			EventBus::new(16),
		)
	}

	async fn open_engine(delivery: MockDelivery) -> CheckoutEngine {
		let engine = engine_with(delivery, pizza_cart());
		engine.open_checkout().await;
		engine
	}

	#[tokio::test]
	async fn test_successful_checkout_sends_exact_payload() {
		let received = Arc::new(StdMutex::new(Vec::new()));
		let captured = received.clone();
		let mut delivery = MockDelivery::new();
		delivery
			.expect_submit_order()
			.times(1)
			.returning(move |order| {
				captured
					.lock()
					.unwrap()
					.push(serde_json::to_value(order).unwrap());
				Ok(json!({"message": "Order created!"}))
			});
		let engine = open_engine(delivery).await;

		let form = engine.view().await.unwrap();
		assert_eq!(form.form().unwrap().total_amount, "$25.00");
		assert_eq!(engine.formatted_total().await.unwrap(), "$25.00");

		let state = engine.submit(&valid_form()).await.unwrap();
		assert_eq!(state.status(), SubmissionStatus::Succeeded);
		assert_eq!(
			received.lock().unwrap().as_slice(),
			&[json!({
				"customer": {"name": "Jo", "email": "jo@x.com"},
				"cart": [{"name": "Pizza", "price": 12.5, "quantity": 2, "meal": {"id": 1}}],
				"street": "Main",
				"city": "Town",
				"zip": "1000"
			})]
		);
		assert!(matches!(engine.view().await, Some(CheckoutView::Success(_))));
	}

	#[tokio::test]
	async fn test_server_error_shows_error_view_and_keeps_cart() {
		let mut delivery = MockDelivery::new();
		delivery.expect_submit_order().times(1).returning(|_| {
			Err(DeliveryError::Rejected {
				status: 500,
				message: "Internal error".to_string(),
			})
		});
		let engine = open_engine(delivery).await;

		let state = engine.submit(&valid_form()).await.unwrap();
		assert_eq!(state.error_message(), Some("Internal error"));

		let view = engine.view().await.unwrap();
		assert_eq!(view.error_message(), Some("Internal error"));
		assert!(view.submit_enabled());
		assert_eq!(engine.cart().items().await.len(), 1);
		assert_eq!(engine.cart_total().await.unwrap(), Decimal::from(25));
	}

	#[tokio::test]
	async fn test_retry_after_failure_builds_new_request() {
		let mut delivery = MockDelivery::new();
		let received = Arc::new(StdMutex::new(Vec::<OrderRequest>::new()));
		let captured = received.clone();
		delivery
			.expect_submit_order()
			.times(2)
			.returning(move |order| {
				let mut orders = captured.lock().unwrap();
				orders.push(order.clone());
				if orders.len() == 1 {
					Err(DeliveryError::Network(String::new()))
				} else {
					Ok(json!({"message": "Order created!"}))
				}
			});
		let engine = open_engine(delivery).await;

		let failed = engine.submit(&valid_form()).await.unwrap();
		assert_eq!(failed.error_message(), Some("Something went wrong!"));

		engine
			.cart()
			.add_item(CartItem::new("m2", "Salad", Decimal::from(8), 1))
			.await
			.unwrap();
		let edited = valid_form().with(FormField::City, "Elsewhere");
		let succeeded = engine.submit(&edited).await.unwrap();
		assert_eq!(succeeded.status(), SubmissionStatus::Succeeded);
		assert_eq!(succeeded.generation(), Some(2));

		let orders = received.lock().unwrap();
		assert_eq!(orders.len(), 2);
		assert_eq!(orders[0].city, "Town");
		assert_eq!(orders[0].cart.len(), 1);
		assert_eq!(orders[1].city, "Elsewhere");
		assert_eq!(orders[1].street, "Main");
		assert_eq!(orders[1].cart.len(), 2);
		assert_eq!(orders[1].cart[1].name, "Salad");
		assert_eq!(orders[1].cart[1].meal.id, MealId::Text("m2".to_string()));
		assert_eq!(orders[1].total(), Ok(Decimal::from(33)));
	}

	#[tokio::test]
	async fn test_only_one_submission_in_flight() {
		let mut delivery = MockDelivery::new();
		delivery.expect_submit_order().times(0);
		let engine = open_engine(delivery).await;

		let pending = engine.begin_submission(&valid_form()).await.unwrap();
		assert_eq!(pending.generation, 1);

		let view = engine.view().await.unwrap();
		assert!(matches!(view, CheckoutView::Sending(_)));
		assert!(!view.submit_enabled());

		let err = engine.submit(&valid_form()).await.unwrap_err();
		assert!(matches!(err, CheckoutError::SubmissionInProgress));
		assert_eq!(engine.state().await.generation(), Some(1));
	}

	#[tokio::test]
	async fn test_acknowledge_success_empties_cart_and_hides_checkout() {
		let mut delivery = MockDelivery::new();
		delivery
			.expect_submit_order()
			.returning(|_| Ok(json!({"message": "Order created!"})));
		let engine = open_engine(delivery).await;
		let mut events = engine.subscribe();

		engine.submit(&valid_form()).await.unwrap();
		engine.acknowledge_success().await.unwrap();

		assert!(engine.cart().is_empty().await);
		assert_eq!(engine.cart_total().await.unwrap(), Decimal::ZERO);
		assert_eq!(engine.state().await, SubmissionState::Idle);
		assert_eq!(engine.progress().current().await, UserProgress::Idle);
		assert!(engine.view().await.is_none());

		let mut received = Vec::new();
		while let Ok(event) = events.try_recv() {
			received.push(event);
		}
		assert_eq!(
			received,
			vec![
				CheckoutEvent::SubmissionStarted {
					generation: 1,
					item_count: 2
				},
				CheckoutEvent::SubmissionSucceeded { generation: 1 },
				CheckoutEvent::OrderAcknowledged { generation: 1 },
			]
		);
	}

	#[tokio::test]
	async fn test_acknowledge_requires_success() {
		let engine = open_engine(MockDelivery::new()).await;

		let err = engine.acknowledge_success().await.unwrap_err();
		assert!(matches!(
			err,
			CheckoutError::State(SubmissionStateError::InvalidTransition { .. })
		));
		assert!(!engine.cart().is_empty().await);
		assert!(engine.view().await.is_some());
	}

	#[tokio::test]
	async fn test_closing_success_view_acknowledges() {
		let engine = open_engine(MockDelivery::new()).await;
		let pending = engine.begin_submission(&valid_form()).await.unwrap();
		engine
			.complete_submission(pending.generation, Ok(json!({})))
			.await
			.unwrap();

		engine.close().await.unwrap();
		assert!(engine.cart().is_empty().await);
		assert_eq!(engine.state().await, SubmissionState::Idle);
	}

	#[tokio::test]
	async fn test_invalid_form_reports_fields_and_sends_nothing() {
		let mut delivery = MockDelivery::new();
		delivery.expect_submit_order().times(0);
		let engine = open_engine(delivery).await;

		let form = valid_form()
			.with(FormField::Email, "not-an-email")
			.with(FormField::Zip, "");
		let err = engine.submit(&form).await.unwrap_err();

		let errors = match err {
			CheckoutError::InvalidForm(errors) => errors,
			other => panic!("expected form errors, got {:?}", other),
		};
		assert_eq!(errors.len(), 2);
		assert_eq!(engine.state().await, SubmissionState::Idle);

		let view = engine.view().await.unwrap();
		let form_view = view.form().unwrap();
		assert!(form_view.field_errors.get(FormField::Email).is_some());
		assert!(form_view.field_errors.get(FormField::Zip).is_some());

		// a valid attempt clears the errors
		engine.begin_submission(&valid_form()).await.unwrap();
		let view = engine.view().await.unwrap();
		assert!(view.form().unwrap().field_errors.is_empty());
	}

	#[tokio::test]
	async fn test_empty_cart_is_rejected() {
		let engine = engine_with(MockDelivery::new(), Arc::new(CartStore::new()));
		engine.open_checkout().await;

		let err = engine.submit(&valid_form()).await.unwrap_err();
		assert!(matches!(err, CheckoutError::EmptyCart));
		assert_eq!(engine.state().await, SubmissionState::Idle);
	}

	#[tokio::test]
	async fn test_submit_requires_open_checkout() {
		let engine = engine_with(MockDelivery::new(), pizza_cart());

		let err = engine.submit(&valid_form()).await.unwrap_err();
		assert!(matches!(err, CheckoutError::NotOpen));
	}

	#[tokio::test]
	async fn test_result_applied_after_close() {
		let engine = open_engine(MockDelivery::new()).await;
		let pending = engine.begin_submission(&valid_form()).await.unwrap();

		engine.close().await.unwrap();
		assert!(engine.view().await.is_none());

		let applied = engine
			.complete_submission(pending.generation, Err(SubmissionFailure::new("Timeout")))
			.await
			.unwrap();
		assert!(applied);
		assert_eq!(engine.state().await.error_message(), Some("Timeout"));

		// the failure is still shown when the checkout is opened again
		engine.open_checkout().await;
		assert_eq!(
			engine.view().await.unwrap().error_message(),
			Some("Timeout")
		);
	}

	#[tokio::test]
	async fn test_stale_result_after_reopen_is_discarded() {
		let engine = open_engine(MockDelivery::new()).await;
		let pending = engine.begin_submission(&valid_form()).await.unwrap();

		engine.back_to_cart().await;
		assert_eq!(engine.progress().current().await, UserProgress::Cart);
		engine.open_checkout().await;
		assert_eq!(engine.state().await, SubmissionState::Idle);

		let mut events = engine.subscribe();
		let applied = engine
			.complete_submission(pending.generation, Ok(json!({"message": "Order created!"})))
			.await
			.unwrap();
		assert!(!applied);
		assert_eq!(engine.state().await, SubmissionState::Idle);
		assert!(matches!(engine.view().await, Some(CheckoutView::Form(_))));
		assert_eq!(
			events.try_recv().unwrap(),
			CheckoutEvent::StaleResultDiscarded { generation: 1 }
		);

		// the next submission gets a fresh generation
		let next = engine.begin_submission(&valid_form()).await.unwrap();
		assert_eq!(next.generation, 2);
	}

	#[tokio::test]
	async fn test_total_follows_cart_changes() {
		let engine = open_engine(MockDelivery::new()).await;
		engine
			.cart()
			.add_item(CartItem::new("m2", "Salad", Decimal::from(8), 1))
			.await
			.unwrap();

		assert_eq!(engine.formatted_total().await.unwrap(), "$33.00");
		let view = engine.view().await.unwrap();
		assert_eq!(view.form().unwrap().total_amount, "$33.00");
	}
}
