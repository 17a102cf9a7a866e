//! User-progress store.

use checkout_types::UserProgress;
use tokio::sync::RwLock;

/// Holds which surface of the ordering UI is open.
#[derive(Debug, Default)]
pub struct UserProgressStore {
	progress: RwLock<UserProgress>,
}

impl UserProgressStore {
	pub fn new() -> Self {
		Self::default()
	}

	pub async fn current(&self) -> UserProgress {
		*self.progress.read().await
	}

	pub async fn show_cart(&self) {
		self.set(UserProgress::Cart).await;
	}

	pub async fn hide_cart(&self) {
		self.set(UserProgress::Idle).await;
	}

	pub async fn show_checkout(&self) {
		self.set(UserProgress::Checkout).await;
	}

	pub async fn hide_checkout(&self) {
		self.set(UserProgress::Idle).await;
	}

	async fn set(&self, next: UserProgress) {
		let mut progress = self.progress.write().await;
		if *progress != next {
			tracing::debug!(from = %*progress, to = %next, "User progress changed");
			*progress = next;
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn test_transitions() {
		let store = UserProgressStore::new();
		assert_eq!(store.current().await, UserProgress::Idle);

		store.show_cart().await;
		assert_eq!(store.current().await, UserProgress::Cart);

		store.show_checkout().await;
		assert_eq!(store.current().await, UserProgress::Checkout);

		store.hide_checkout().await;
		assert_eq!(store.current().await, UserProgress::Idle);

		store.show_cart().await;
		store.hide_cart().await;
		assert_eq!(store.current().await, UserProgress::Idle);
	}
}
