//! The host renderer's side of the contract.
//!
//! The engine never owns instances. It reads them through [`HostInstance`] during a commit notification
//! and keys its statistics by the [`InstanceIdentity`] the host assigns.

use crate::{
	error::HostError,
	snapshot::{ChangeReason, ReasonSet, ValueSnapshot},
	value::Value,
};
use core::{
	fmt::{self, Display, Formatter},
	time::Duration,
};

/// Stable key of one logical instance, assigned by the host.
///
/// Must not be reused for a different component type at the same position after a remount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceIdentity(pub u64);

impl Display for InstanceIdentity {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		write!(f, "#{}", self.0)
	}
}

/// The host's key for a position in its tree, like a hashed path of child indices and keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TreePosition(pub u64);

/// One rendered instance as seen from inside a commit notification.
pub trait HostInstance {
	fn identity(&self) -> InstanceIdentity;

	fn position(&self) -> TreePosition;

	/// The just-committed snapshot of `reason`'s category, if the instance has one.
	fn snapshot(&self, reason: ChangeReason) -> Option<&ValueSnapshot>;

	/// The directly preceding committed render of this same instance.
	///
	/// [`None`] on first mount.
	fn alternate(&self) -> Option<&Self>;

	/// Time spent rendering this instance in this commit.
	fn duration(&self) -> Duration {
		Duration::ZERO
	}

	/// Categories this instance can have at all.
	fn tracked(&self) -> ReasonSet {
		ReasonSet::all()
	}
}

/// An owned [`HostInstance`] for hosts that copy their render records out.
#[derive(Debug, Clone)]
pub struct RenderedInstance {
	identity: InstanceIdentity,
	position: TreePosition,
	props: Option<ValueSnapshot>,
	state: Option<ValueSnapshot>,
	context: Option<ValueSnapshot>,
	duration: Duration,
	tracked: ReasonSet,
	alternate: Option<Box<RenderedInstance>>,
}

impl RenderedInstance {
	#[must_use]
	pub fn new(identity: InstanceIdentity, position: TreePosition) -> Self {
		Self {
			identity,
			position,
			props: None,
			state: None,
			context: None,
			duration: Duration::ZERO,
			tracked: ReasonSet::all(),
			alternate: None,
		}
	}

	#[must_use]
	pub fn with_snapshot(mut self, reason: ChangeReason, snapshot: ValueSnapshot) -> Self {
		*self.slot_mut(reason) = Some(snapshot);
		self
	}

	#[must_use]
	pub fn with_props(self, props: ValueSnapshot) -> Self {
		self.with_snapshot(ChangeReason::Props, props)
	}

	#[must_use]
	pub fn with_state(self, state: ValueSnapshot) -> Self {
		self.with_snapshot(ChangeReason::State, state)
	}

	#[must_use]
	pub fn with_context(self, context: ValueSnapshot) -> Self {
		self.with_snapshot(ChangeReason::Context, context)
	}

	/// Assigns one value in `reason`'s snapshot, creating the snapshot if necessary.
	#[must_use]
	pub fn with_value(mut self, reason: ChangeReason, name: &str, value: impl Into<Value>) -> Self {
		self.slot_mut(reason).get_or_insert_with(ValueSnapshot::new).insert(name, value);
		self
	}

	#[must_use]
	pub fn with_duration(mut self, duration: Duration) -> Self {
		self.duration = duration;
		self
	}

	#[must_use]
	pub fn with_tracked(mut self, tracked: ReasonSet) -> Self {
		self.tracked = tracked;
		self
	}

	/// Links the preceding committed render.
	///
	/// Any alternate of `previous` itself is dropped, since only one render of history is ever read.
	#[must_use]
	pub fn with_alternate(mut self, mut previous: RenderedInstance) -> Self {
		previous.alternate = None;
		self.alternate = Some(Box::new(previous));
		self
	}

	/// Builds this instance's next render, linking `self` as its alternate.
	///
	/// Snapshots are carried over unchanged, so values keep their identity until replaced.
	#[must_use]
	pub fn rerender(self) -> Self {
		let next = Self {
			identity: self.identity,
			position: self.position,
			props: self.props.clone(),
			state: self.state.clone(),
			context: self.context.clone(),
			duration: Duration::ZERO,
			tracked: self.tracked,
			alternate: None,
		};
		next.with_alternate(self)
	}

	fn slot_mut(&mut self, reason: ChangeReason) -> &mut Option<ValueSnapshot> {
		match reason {
			ChangeReason::Props => &mut self.props,
			ChangeReason::State => &mut self.state,
			ChangeReason::Context => &mut self.context,
		}
	}
}

impl HostInstance for RenderedInstance {
	fn identity(&self) -> InstanceIdentity {
		self.identity
	}

	fn position(&self) -> TreePosition {
		self.position
	}

	fn snapshot(&self, reason: ChangeReason) -> Option<&ValueSnapshot> {
		match reason {
			ChangeReason::Props => self.props.as_ref(),
			ChangeReason::State => self.state.as_ref(),
			ChangeReason::Context => self.context.as_ref(),
		}
	}

	fn alternate(&self) -> Option<&Self> {
		self.alternate.as_deref()
	}

	fn duration(&self) -> Duration {
		self.duration
	}

	fn tracked(&self) -> ReasonSet {
		self.tracked
	}
}

/// One commit pass.
#[derive(Debug)]
pub struct Commit<'a, I> {
	/// Instances in the order the host committed them.
	pub rendered: &'a [I],
	/// Identities the host confirmed as permanently removed in this commit.
	pub unmounted: &'a [InstanceIdentity],
}

impl<'a, I> Commit<'a, I> {
	#[must_use]
	pub fn new(rendered: &'a [I], unmounted: &'a [InstanceIdentity]) -> Self {
		Self { rendered, unmounted }
	}
}

// Not derived, since that would require `I: Clone`.
impl<I> Clone for Commit<'_, I> {
	fn clone(&self) -> Self {
		*self
	}
}
impl<I> Copy for Commit<'_, I> {}

pub type CommitListener<I> = Box<dyn FnMut(Commit<'_, I>)>;

/// A stream of commit notifications.
pub trait CommitSource {
	type Instance: HostInstance + 'static;

	/// Registers `listener` to be called synchronously once per commit.
	///
	/// # Errors
	///
	/// Iff the host can't deliver commit notifications.
	fn register(&mut self, listener: CommitListener<Self::Instance>) -> Result<(), HostError>;
}

/// An in-process [`CommitSource`] that the host drives by calling [`CommitHook::commit`].
pub struct CommitHook<I> {
	listeners: Vec<CommitListener<I>>,
	unavailable: Option<HostError>,
}

impl<I> CommitHook<I> {
	#[must_use]
	pub fn new() -> Self {
		Self {
			listeners: Vec::new(),
			unavailable: None,
		}
	}

	/// A hook whose host can't deliver notifications, so registration fails with `error`.
	#[must_use]
	pub fn unavailable(error: HostError) -> Self {
		Self {
			listeners: Vec::new(),
			unavailable: Some(error),
		}
	}

	/// Notifies all listeners of one commit.
	pub fn commit(&mut self, rendered: &[I], unmounted: &[InstanceIdentity]) {
		let commit = Commit::new(rendered, unmounted);
		for listener in &mut self.listeners {
			listener(commit);
		}
	}

	#[must_use]
	pub fn listener_count(&self) -> usize {
		self.listeners.len()
	}
}

impl<I> Default for CommitHook<I> {
	fn default() -> Self {
		Self::new()
	}
}

impl<I: HostInstance + 'static> CommitSource for CommitHook<I> {
	type Instance = I;

	fn register(&mut self, listener: CommitListener<I>) -> Result<(), HostError> {
		if let Some(error) = &self.unavailable {
			return Err(error.clone());
		}
		self.listeners.push(listener);
		Ok(())
	}
}
