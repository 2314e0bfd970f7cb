use std::borrow::Cow;
use thiserror::Error;

/// The host renderer can't deliver commit notifications.
#[derive(Debug, Clone, Error)]
#[error("{reason}")]
pub struct HostError {
	reason: Cow<'static, str>,
}

impl HostError {
	#[must_use]
	pub fn new(reason: impl Into<Cow<'static, str>>) -> Self {
		Self { reason: reason.into() }
	}

	#[must_use]
	pub fn reason(&self) -> &str {
		&self.reason
	}
}

/// Setup-time failures, the only errors surfaced to the embedding application.
#[derive(Debug, Error)]
pub enum SetupError {
	/// The engine disabled itself and will ignore all commits.
	#[error("commit notifications are unavailable: {0}")]
	HostUnavailable(#[from] HostError),
	#[error("the engine is already listening to a commit source")]
	AlreadyAttached,
	#[error("the engine was shut down")]
	ShutDown,
}
