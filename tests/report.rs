use render_cause::{aggregate::RenderSample, classify, Aggregator, ChangeReason, InstanceIdentity, ReasonSet, Reporter, TreePosition};
use std::{
	cell::{Cell, RefCell},
	rc::Rc,
	time::{Duration, Instant},
};

use support_::{instance, logging};

fn publish_once(reporter: &Reporter) -> Vec<render_cause::SubscriberFailure> {
	let current = instance(1, 0).with_value(ChangeReason::Props, "a", 1);
	let records = classify(&current, ReasonSet::all());
	let mut aggregator = Aggregator::new();
	let sample = RenderSample {
		identity: InstanceIdentity(1),
		position: TreePosition(0),
		duration: Duration::ZERO,
		timestamp: Instant::now(),
		unnecessary: false,
	};
	let (_, stats) = aggregator.record(&sample, &records);
	reporter.publish(InstanceIdentity(1), &records, stats)
}

#[test]
fn delivers_to_all_subscribers_in_order() {
	let reporter = Reporter::new();
	let calls = Rc::new(RefCell::new(Vec::new()));

	let _first = reporter.subscribe({
		let calls = Rc::clone(&calls);
		move |identity, changes, stats| calls.borrow_mut().push(("first", identity, changes.len(), stats.render_count))
	});
	let _second = reporter.subscribe({
		let calls = Rc::clone(&calls);
		move |identity, changes, stats| calls.borrow_mut().push(("second", identity, changes.len(), stats.render_count))
	});

	assert!(publish_once(&reporter).is_empty());
	assert_eq!(*calls.borrow(), [("first", InstanceIdentity(1), 1, 1), ("second", InstanceIdentity(1), 1, 1)]);
}

#[test]
fn panicking_subscriber_is_isolated() {
	logging();
	let reporter = Reporter::new();
	let delivered = Rc::new(Cell::new(0));

	let failing = reporter.subscribe(|_, _, _| panic!("subscriber bug"));
	let _counting = reporter.subscribe({
		let delivered = Rc::clone(&delivered);
		move |_, _, _| delivered.set(delivered.get() + 1)
	});

	let failures = publish_once(&reporter);
	assert_eq!(failures.len(), 1);
	assert_eq!(failures[0].subscriber, failing.id());
	assert_eq!(failures[0].identity, InstanceIdentity(1));
	assert_eq!(failures[0].message, "subscriber bug");
	assert_eq!(delivered.get(), 1);

	// The failing subscriber stays subscribed and fails again, without affecting the other one.
	assert_eq!(publish_once(&reporter).len(), 1);
	assert_eq!(delivered.get(), 2);
}

#[test]
fn unsubscribe_stops_delivery() {
	let reporter = Reporter::new();
	let delivered = Rc::new(Cell::new(0));

	let subscription = reporter.subscribe({
		let delivered = Rc::clone(&delivered);
		move |_, _, _| delivered.set(delivered.get() + 1)
	});
	let _ = publish_once(&reporter);
	assert_eq!(delivered.get(), 1);

	subscription.unsubscribe();
	assert_eq!(reporter.subscriber_count(), 0);
	let _ = publish_once(&reporter);
	assert_eq!(delivered.get(), 1);

	{
		let _dropped = reporter.subscribe({
			let delivered = Rc::clone(&delivered);
			move |_, _, _| delivered.set(delivered.get() + 1)
		});
	}
	let _ = publish_once(&reporter);
	assert_eq!(delivered.get(), 1);
}

#[test]
fn handler_can_unsubscribe_itself() {
	let reporter = Reporter::new();
	let delivered = Rc::new(Cell::new(0));
	let slot = Rc::new(RefCell::new(None));

	let subscription = reporter.subscribe({
		let delivered = Rc::clone(&delivered);
		let slot = Rc::clone(&slot);
		move |_, _, _| {
			delivered.set(delivered.get() + 1);
			drop(slot.borrow_mut().take());
		}
	});
	*slot.borrow_mut() = Some(subscription);

	assert!(publish_once(&reporter).is_empty());
	assert!(publish_once(&reporter).is_empty());
	assert_eq!(delivered.get(), 1);
	assert_eq!(reporter.subscriber_count(), 0);
}

#[test]
fn no_subscribers() {
	let reporter = Reporter::default();
	assert!(publish_once(&reporter).is_empty());
	reporter.clear();
	assert_eq!(reporter.subscriber_count(), 0);
}
