use crate::snapshot::{ChangeReason, ReasonSet};
use core::cell::Cell;
use std::rc::Rc;

/// Engine configuration, fixed at construction except for the [`PauseSwitch`].
#[derive(Debug, Clone)]
pub struct Options {
	/// Whether the engine starts unpaused.
	pub enabled: bool,
	/// Categories to diff. Each instance can narrow this further.
	pub tracked: ReasonSet,
	/// Count renders that changed nothing tracked.
	pub track_unnecessary_renders: bool,
	/// Log each render with changes at `INFO` level.
	///
	/// Values are only logged with the `dangerous-logging` feature.
	pub log: bool,
}

impl Default for Options {
	fn default() -> Self {
		Self {
			enabled: true,
			tracked: ReasonSet::all(),
			track_unnecessary_renders: false,
			log: false,
		}
	}
}

impl Options {
	#[must_use]
	pub fn with_enabled(mut self, enabled: bool) -> Self {
		self.enabled = enabled;
		self
	}

	#[must_use]
	pub fn with_tracked(mut self, tracked: ReasonSet) -> Self {
		self.tracked = tracked;
		self
	}

	#[must_use]
	pub fn without_reason(mut self, reason: ChangeReason) -> Self {
		self.tracked = self.tracked.without(reason);
		self
	}

	#[must_use]
	pub fn with_track_unnecessary_renders(mut self, track_unnecessary_renders: bool) -> Self {
		self.track_unnecessary_renders = track_unnecessary_renders;
		self
	}

	#[must_use]
	pub fn with_log(mut self, log: bool) -> Self {
		self.log = log;
		self
	}
}

/// Shared pause flag.
///
/// Clones control the same engine. The engine reads the flag once per commit,
/// so flipping it mid-commit (for example from a subscriber) takes effect with the next commit.
#[derive(Debug, Clone, Default)]
pub struct PauseSwitch(Rc<Cell<bool>>);

impl PauseSwitch {
	#[must_use]
	pub fn new(paused: bool) -> Self {
		Self(Rc::new(Cell::new(paused)))
	}

	pub fn pause(&self) {
		self.0.set(true)
	}

	pub fn resume(&self) {
		self.0.set(false)
	}

	/// Returns whether the switch is now paused.
	pub fn toggle(&self) -> bool {
		let paused = !self.0.get();
		self.0.set(paused);
		paused
	}

	#[must_use]
	pub fn is_paused(&self) -> bool {
		self.0.get()
	}
}
