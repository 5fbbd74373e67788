use elimu_protocol::{Role, User};

/// Observable authentication state.
///
/// Starts as [`SessionState::Loading`] until the persisted session has been
/// read once, then moves between the other two variants.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
	#[default]
	Loading,
	Unauthenticated,
	Authenticated(User),
}

impl SessionState {
	pub fn is_loading(&self) -> bool {
		matches!(self, Self::Loading)
	}

	pub fn is_authenticated(&self) -> bool {
		matches!(self, Self::Authenticated(_))
	}

	pub fn user(&self) -> Option<&User> {
		match self {
			Self::Authenticated(user) => Some(user),
			_ => None,
		}
	}

	pub fn role(&self) -> Option<Role> {
		self.user().map(|u| u.role)
	}
}
