//! Synchronous fan-out of per-render results.

use crate::{aggregate::PerInstanceStats, classify::ChangeRecord, host::InstanceIdentity};
use core::{
	cell::{Cell, RefCell},
	fmt::{self, Debug, Display, Formatter},
};
use std::{
	any::Any,
	panic::{catch_unwind, AssertUnwindSafe},
	rc::{Rc, Weak},
};
use thiserror::Error;
use tracing::trace;

/// Called once per instance per commit with that render's changes and the identity's updated statistics.
pub type Handler = dyn Fn(InstanceIdentity, &[ChangeRecord], &PerInstanceStats);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(u64);

impl Display for SubscriberId {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

type Subscribers = RefCell<Vec<(SubscriberId, Rc<Handler>)>>;

/// A subscriber panicked while handling a render. Other subscribers were still called.
#[derive(Debug, Clone, Error)]
#[error("subscriber {subscriber} panicked while handling a render of {identity}: {message}")]
pub struct SubscriberFailure {
	pub subscriber: SubscriberId,
	pub identity: InstanceIdentity,
	pub message: String,
}

/// Delivers results to zero or more subscribers without queueing or retrying.
pub struct Reporter {
	subscribers: Rc<Subscribers>,
	next_id: Cell<u64>,
}

impl Reporter {
	#[must_use]
	pub fn new() -> Self {
		Self {
			subscribers: Rc::default(),
			next_id: Cell::new(0),
		}
	}

	/// Adds `handler` after all current subscribers.
	///
	/// It stays subscribed until the returned [`Subscription`] is dropped or [unsubscribed](`Subscription::unsubscribe`).
	#[must_use = "Dropping the `Subscription` unsubscribes immediately."]
	pub fn subscribe(&self, handler: impl Fn(InstanceIdentity, &[ChangeRecord], &PerInstanceStats) + 'static) -> Subscription {
		let id = SubscriberId(self.next_id.get());
		self.next_id.set(self.next_id.get() + 1);
		let handler: Rc<Handler> = Rc::new(handler);
		self.subscribers.borrow_mut().push((id, handler));
		trace!(subscriber = %id, "Subscribed.");
		Subscription {
			id,
			subscribers: Rc::downgrade(&self.subscribers),
		}
	}

	#[must_use]
	pub fn subscriber_count(&self) -> usize {
		self.subscribers.borrow().len()
	}

	/// Calls every subscriber in subscription order.
	///
	/// Panics are caught per subscriber and returned instead. Subscribers added or removed by a handler
	/// take effect with the next call.
	#[must_use = "Subscriber failures should be logged."]
	pub fn publish(&self, identity: InstanceIdentity, changes: &[ChangeRecord], stats: &PerInstanceStats) -> Vec<SubscriberFailure> {
		let subscribers: Vec<_> = match self.subscribers.try_borrow() {
			Ok(subscribers) if subscribers.is_empty() => return Vec::new(),
			Ok(subscribers) => subscribers.clone(),
			Err(_) => return Vec::new(),
		};

		let mut failures = Vec::new();
		for (subscriber, handler) in subscribers {
			if let Err(payload) = catch_unwind(AssertUnwindSafe(|| handler(identity, changes, stats))) {
				failures.push(SubscriberFailure {
					subscriber,
					identity,
					message: panic_message(payload.as_ref()),
				});
			}
		}
		failures
	}

	/// Drops all subscribers. Outstanding [`Subscription`]s become inert.
	pub fn clear(&self) {
		self.subscribers.borrow_mut().clear();
	}
}

impl Default for Reporter {
	fn default() -> Self {
		Self::new()
	}
}

impl Debug for Reporter {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("Reporter").field("subscriber_count", &self.subscriber_count()).finish()
	}
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
	if let Some(message) = payload.downcast_ref::<&'static str>() {
		(*message).to_owned()
	} else if let Some(message) = payload.downcast_ref::<String>() {
		message.clone()
	} else {
		"(non-string panic payload)".to_owned()
	}
}

/// Unsubscribes on drop.
#[derive(Debug)]
pub struct Subscription {
	id: SubscriberId,
	subscribers: Weak<Subscribers>,
}

impl Subscription {
	#[must_use]
	pub fn id(&self) -> SubscriberId {
		self.id
	}

	pub fn unsubscribe(self) {
		drop(self)
	}
}

impl Drop for Subscription {
	fn drop(&mut self) {
		let subscribers = match self.subscribers.upgrade() {
			Some(subscribers) => subscribers,
			None => return,
		};
		let borrowed = subscribers.try_borrow_mut();
		if let Ok(mut borrowed) = borrowed {
			borrowed.retain(|(id, _)| *id != self.id);
			trace!(subscriber = %self.id, "Unsubscribed.");
		}
	}
}
