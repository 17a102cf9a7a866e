//! Event bus for observing the checkout.
//!
//! A thin wrapper around a tokio broadcast channel. Publishing never blocks;
//! subscribers that fall behind lose the oldest events.

use checkout_types::CheckoutEvent;
use tokio::sync::broadcast;

/// Broadcast channel carrying [`CheckoutEvent`]s.
#[derive(Clone)]
pub struct EventBus {
	sender: broadcast::Sender<CheckoutEvent>,
}

impl EventBus {
	/// Creates an event bus buffering up to `capacity` events per subscriber.
	pub fn new(capacity: usize) -> Self {
		let (sender, _) = broadcast::channel(capacity);
		Self { sender }
	}

	/// Creates a new subscriber. Only events published afterwards are
	/// received.
	pub fn subscribe(&self) -> broadcast::Receiver<CheckoutEvent> {
		self.sender.subscribe()
	}

	/// Publishes an event to all current subscribers.
	///
	/// Fails when nobody is subscribed.
	pub fn publish(
		&self,
		event: CheckoutEvent,
	) -> Result<(), broadcast::error::SendError<CheckoutEvent>> {
		self.sender.send(event)?;
		Ok(())
	}
}

impl Default for EventBus {
	fn default() -> Self {
		Self::new(64)
	}
}
