//! User-progress modes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which surface of the ordering UI is currently open.
///
/// The checkout view is only visible while the mode is
/// [`UserProgress::Checkout`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UserProgress {
	/// Nothing open; the menu is shown.
	#[default]
	Idle,
	/// The cart modal is open.
	Cart,
	/// The checkout modal is open.
	Checkout,
}

impl fmt::Display for UserProgress {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			UserProgress::Idle => write!(f, "Idle"),
			UserProgress::Cart => write!(f, "Cart"),
			UserProgress::Checkout => write!(f, "Checkout"),
		}
	}
}
