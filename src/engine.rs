use crate::{
	aggregate::{Aggregator, PerInstanceStats, RenderSample, Totals},
	classify::{classify, ChangeRecord},
	error::SetupError,
	host::{Commit, CommitListener, CommitSource, HostInstance, InstanceIdentity},
	options::{Options, PauseSwitch},
	report::{Reporter, Subscription},
	snapshot::ChangeReason,
};
use core::{cell::RefCell, fmt::Write as _};
use std::{collections::VecDeque, rc::Rc, time::Instant};
use tracing::{debug, error, info, instrument, level_filters::STATIC_MAX_LEVEL, trace, trace_span, warn, Level};

/// How many nested commits are buffered while the engine is busy.
///
/// Further nested commits are dropped with a warning until the buffer is drained.
pub const MAX_DEFERRED_COMMITS: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
	/// Not listening to a [`CommitSource`]. Commits can still be fed in directly.
	Detached,
	Attached,
	/// The commit source was unavailable. All commits are ignored.
	Disabled,
	/// [`Engine::shutdown`] was called. All commits are ignored.
	ShutDown,
}

/// The single entry point of the pipeline: extract → diff → classify → aggregate → report.
///
/// Everything runs synchronously inside the host's commit notification.
/// The engine owns all [`PerInstanceStats`], subscribers only ever see them borrowed.
#[derive(Debug)]
pub struct Engine {
	options: Options,
	switch: PauseSwitch,
	aggregator: Aggregator,
	reporter: Reporter,
	log_subscription: Option<Subscription>,
	deferred: Rc<DeferredCommits>,
	state: EngineState,
}

/// A commit that arrived while the engine was borrowed, observed at arrival.
#[derive(Debug)]
struct DeferredCommit {
	renders: Vec<(RenderSample, Vec<ChangeRecord>)>,
	unmounted: Vec<InstanceIdentity>,
}

type DeferredCommits = RefCell<VecDeque<DeferredCommit>>;

impl Engine {
	/// Creates a detached engine with no statistics.
	#[must_use]
	#[instrument]
	pub fn new(options: Options) -> Self {
		let reporter = Reporter::new();
		let log_subscription = if options.log { Some(reporter.subscribe(log_render)) } else { None };
		Self {
			switch: PauseSwitch::new(!options.enabled),
			options,
			aggregator: Aggregator::new(),
			reporter,
			log_subscription,
			deferred: Rc::default(),
			state: EngineState::Detached,
		}
	}

	/// Creates an engine and [attaches](`Engine::attach`) it to `source`.
	///
	/// # Errors
	///
	/// See [`Engine::attach`]. The disabled engine is dropped in that case.
	pub fn install<S: CommitSource>(options: Options, source: &mut S) -> Result<Rc<RefCell<Self>>, SetupError> {
		let engine = Rc::new(RefCell::new(Self::new(options)));
		Self::attach(&engine, source)?;
		Ok(engine)
	}

	/// Registers the engine's one listener with `source`.
	///
	/// The listener only holds a weak reference, so dropping the last [`Rc`] stops processing.
	///
	/// Commits that arrive while `engine` is already borrowed (for example from a subscriber that commits synchronously)
	/// are diffed right away, but folded into the statistics and reported only at the end of the next commit the engine processes.
	/// Up to [`MAX_DEFERRED_COMMITS`] are buffered like this. Any beyond that are dropped with a warning.
	///
	/// # Errors
	///
	/// - [`SetupError::AlreadyAttached`] if the engine is already listening to a source.
	/// - [`SetupError::ShutDown`] after [`Engine::shutdown`].
	/// - [`SetupError::HostUnavailable`] if `source` can't deliver commits.
	///   The engine is then [disabled](`EngineState::Disabled`) and ignores all commits until it's attached to another source.
	pub fn attach<S: CommitSource>(engine: &Rc<RefCell<Self>>, source: &mut S) -> Result<(), SetupError> {
		match engine.borrow().state {
			EngineState::Attached => return Err(SetupError::AlreadyAttached),
			EngineState::ShutDown => return Err(SetupError::ShutDown),
			EngineState::Detached | EngineState::Disabled => (),
		}

		let (options, switch, deferred) = {
			let this = engine.borrow();
			(this.options.clone(), this.switch.clone(), Rc::clone(&this.deferred))
		};
		let weak = Rc::downgrade(engine);
		let listener: CommitListener<S::Instance> = Box::new(move |commit: Commit<'_, S::Instance>| {
			let engine = match weak.upgrade() {
				Some(engine) => engine,
				None => return,
			};
			let borrowed = engine.try_borrow_mut();
			match borrowed {
				Ok(mut engine) => engine.on_commit(commit),
				Err(_) => defer(&deferred, &options, &switch, commit),
			}
		});

		let registered = source.register(listener);
		let mut this = engine.borrow_mut();
		match registered {
			Ok(()) => {
				this.state = EngineState::Attached;
				info!("Listening to commits.");
				Ok(())
			}
			Err(host_error) => {
				this.state = EngineState::Disabled;
				error!("Commit notifications are unavailable, so render causes won't be tracked: {}", host_error);
				Err(host_error.into())
			}
		}
	}

	/// Processes one commit pass.
	///
	/// The pause switch is read once here. While paused, rendered instances are skipped entirely,
	/// but unmounts are still applied so that statistics of removed instances don't linger.
	///
	/// Identities that lost their position to another and didn't render elsewhere in this commit are retired at the end.
	/// Deferred nested commits are applied after that, in arrival order.
	#[instrument(skip(self, commit), fields(rendered = commit.rendered.len(), unmounted = commit.unmounted.len()))]
	pub fn on_commit<I: HostInstance>(&mut self, commit: Commit<'_, I>) {
		if !self.is_live() {
			return;
		}

		for &identity in commit.unmounted {
			self.retire(identity);
		}

		if self.switch.is_paused() {
			trace!("Paused.");
		} else {
			for instance in commit.rendered {
				self.process(instance);
			}
		}
		self.settle();
		self.drain_deferred();
	}

	/// Processes a single rendered instance as its own commit.
	pub fn on_render<I: HostInstance + ?Sized>(&mut self, instance: &I) {
		if !self.is_live() {
			return;
		}

		if !self.switch.is_paused() {
			self.process(instance);
		}
		self.settle();
		self.drain_deferred();
	}

	/// Deletes `identity`'s statistics once the host confirmed its removal.
	pub fn on_unmount(&mut self, identity: InstanceIdentity) {
		if self.is_live() {
			self.retire(identity)
		}
	}

	fn is_live(&self) -> bool {
		match self.state {
			EngineState::Detached | EngineState::Attached => true,
			EngineState::Disabled | EngineState::ShutDown => false,
		}
	}

	fn retire(&mut self, identity: InstanceIdentity) {
		match self.aggregator.retire(identity) {
			Some(stats) => debug!(%identity, render_count = stats.render_count, "Unmounted."),
			None => debug!(%identity, "Unmount of an untracked identity."),
		}
	}

	fn settle(&mut self) {
		for stats in self.aggregator.settle() {
			debug!(identity = %stats.identity, render_count = stats.render_count, "Replaced at its position. Dropped its statistics.");
		}
	}

	fn drain_deferred(&mut self) {
		loop {
			let next = self.deferred.borrow_mut().pop_front();
			let DeferredCommit { renders, unmounted } = match next {
				Some(next) => next,
				None => break,
			};
			trace!(rendered = renders.len(), unmounted = unmounted.len(), "Applying deferred commit.");

			for identity in unmounted {
				self.retire(identity);
			}
			for (sample, records) in renders {
				self.fold(&sample, &records);
			}
			self.settle();
		}
	}

	fn process<I: HostInstance + ?Sized>(&mut self, instance: &I) {
		let span = trace_span!("Processing render", identity = %instance.identity());
		let _enter = span.enter();

		let (sample, records) = observe(&self.options, instance);
		self.fold(&sample, &records);
	}

	fn fold(&mut self, sample: &RenderSample, records: &[ChangeRecord]) {
		let (_, stats) = self.aggregator.record(sample, records);
		for failure in self.reporter.publish(sample.identity, records, stats) {
			error!("{}", failure);
		}
	}

	/// Adds a subscriber. See [`Reporter::subscribe`].
	#[must_use = "Dropping the `Subscription` unsubscribes immediately."]
	pub fn subscribe(&self, handler: impl Fn(InstanceIdentity, &[ChangeRecord], &PerInstanceStats) + 'static) -> Subscription {
		self.reporter.subscribe(handler)
	}

	/// A handle to this engine's pause flag.
	#[must_use]
	pub fn switch(&self) -> PauseSwitch {
		self.switch.clone()
	}

	#[must_use]
	pub fn options(&self) -> &Options {
		&self.options
	}

	/// Whether the built-in [`Options::log`] subscriber is active.
	#[must_use]
	pub fn is_logging(&self) -> bool {
		self.log_subscription.is_some()
	}

	#[must_use]
	pub fn state(&self) -> EngineState {
		self.state
	}

	#[must_use]
	pub fn stats(&self, identity: InstanceIdentity) -> Option<&PerInstanceStats> {
		self.aggregator.get(identity)
	}

	pub fn iter_stats(&self) -> impl Iterator<Item = &PerInstanceStats> + '_ {
		self.aggregator.iter()
	}

	#[must_use]
	pub fn totals(&self) -> Totals {
		self.aggregator.totals()
	}

	/// The number of live identities.
	#[must_use]
	pub fn len(&self) -> usize {
		self.aggregator.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.aggregator.is_empty()
	}

	/// Clears all statistics and subscribers. The engine ignores all further commits.
	pub fn shutdown(&mut self) {
		let totals = self.aggregator.totals();
		self.aggregator.clear();
		self.deferred.borrow_mut().clear();
		self.log_subscription = None;
		self.reporter.clear();
		self.state = EngineState::ShutDown;
		info!(instances = totals.instances, renders = totals.renders, "Shut down.");
	}
}

impl Default for Engine {
	fn default() -> Self {
		Self::new(Options::default())
	}
}

/// Runs the pure part of the pipeline for one instance.
fn observe<I: HostInstance + ?Sized>(options: &Options, instance: &I) -> (RenderSample, Vec<ChangeRecord>) {
	let records = classify(instance, options.tracked);
	let sample = RenderSample {
		identity: instance.identity(),
		position: instance.position(),
		duration: instance.duration(),
		timestamp: Instant::now(),
		unnecessary: options.track_unnecessary_renders && records.is_empty() && instance.alternate().is_some(),
	};
	(sample, records)
}

fn defer<I: HostInstance>(deferred: &DeferredCommits, options: &Options, switch: &PauseSwitch, commit: Commit<'_, I>) {
	let mut deferred = deferred.borrow_mut();
	if deferred.len() >= MAX_DEFERRED_COMMITS {
		warn!(rendered = commit.rendered.len(), unmounted = commit.unmounted.len(), "Too many nested commits. Dropping this one.");
		return;
	}

	let renders = if switch.is_paused() {
		Vec::new()
	} else {
		commit.rendered.iter().map(|instance| observe(options, instance)).collect()
	};
	deferred.push_back(DeferredCommit {
		renders,
		unmounted: commit.unmounted.to_vec(),
	});
	debug!(queued = deferred.len(), "Engine busy. Deferred a nested commit.");
}

fn log_render(identity: InstanceIdentity, changes: &[ChangeRecord], stats: &PerInstanceStats) {
	if STATIC_MAX_LEVEL < Level::INFO || changes.is_empty() {
		return;
	}

	let mut summary = String::new();
	for &reason in &ChangeReason::ALL {
		let mut changes = changes.iter().filter(|change| change.reason == reason).peekable();
		if changes.peek().is_none() {
			continue;
		}
		if !summary.is_empty() {
			summary.push_str("; ");
		}
		let _ = write!(summary, "{:?}:", reason);
		for change in changes {
			if cfg!(feature = "dangerous-logging") {
				let _ = write!(summary, " {} = {:?}", change.name, change.value);
			} else {
				summary.push(' ');
				summary.push_str(&change.name);
			}
		}
	}
	info!(%identity, render_count = stats.render_count, "Render caused by {}", summary);
}
