//! Per-instance render statistics.
//!
//! Statistics are keyed by [`InstanceIdentity`]. A separate index tracks which identity occupies each [`TreePosition`],
//! along with how many identities held that position before, which tags each occupant with a generation.
//!
//! A different identity rendering at an occupied position displaces the occupant without touching its statistics.
//! If the displaced identity doesn't render anywhere else before [`Aggregator::settle`], it was remounted away and
//! its statistics are dropped. Otherwise it only moved, like after a keyed reorder.

use crate::{
	classify::ChangeRecord,
	host::{InstanceIdentity, TreePosition},
	snapshot::ChangeReason,
};
use core::{
	ops::{AddAssign, Index},
	time::Duration,
};
use hashbrown::{hash_map::Entry, HashMap, HashSet};
use std::time::Instant;
use tracing::{debug, trace};

/// Change counts per [`ChangeReason`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReasonCounts([u64; ChangeReason::COUNT]);

impl ReasonCounts {
	#[must_use]
	pub fn get(&self, reason: ChangeReason) -> u64 {
		self.0[reason.index()]
	}

	#[must_use]
	pub fn total(&self) -> u64 {
		self.0.iter().fold(0, |total, count| total.saturating_add(*count))
	}

	/// Counts each record under its reason.
	pub fn add_records(&mut self, records: &[ChangeRecord]) {
		for record in records {
			let count = &mut self.0[record.reason.index()];
			*count = count.saturating_add(1);
		}
	}

	pub fn iter(&self) -> impl Iterator<Item = (ChangeReason, u64)> + '_ {
		ChangeReason::ALL.iter().map(move |&reason| (reason, self.get(reason)))
	}
}

impl Index<ChangeReason> for ReasonCounts {
	type Output = u64;

	fn index(&self, reason: ChangeReason) -> &Self::Output {
		&self.0[reason.index()]
	}
}

impl AddAssign<&ReasonCounts> for ReasonCounts {
	fn add_assign(&mut self, rhs: &ReasonCounts) {
		for (count, added) in self.0.iter_mut().zip(rhs.0.iter()) {
			*count = count.saturating_add(*added);
		}
	}
}

/// Rolling statistics of one live identity.
#[derive(Debug, Clone)]
pub struct PerInstanceStats {
	pub identity: InstanceIdentity,
	pub position: TreePosition,
	/// How many other identities occupied [`position`](`PerInstanceStats::position`) before this one took it.
	///
	/// This counts across unmounts too, so `(position, generation)` never repeats.
	pub generation: u32,
	pub render_count: u64,
	pub change_counts: ReasonCounts,
	/// Renders after the first that changed nothing tracked.
	///
	/// Only counted with [`Options::track_unnecessary_renders`](`crate::Options::track_unnecessary_renders`).
	pub unnecessary_renders: u64,
	pub total_duration: Duration,
	pub last_render: Instant,
}

impl PerInstanceStats {
	fn new(identity: InstanceIdentity, position: TreePosition, generation: u32, now: Instant) -> Self {
		Self {
			identity,
			position,
			generation,
			render_count: 0,
			change_counts: ReasonCounts::default(),
			unnecessary_renders: 0,
			total_duration: Duration::ZERO,
			last_render: now,
		}
	}
}

/// What the aggregator needs to know about one render besides its change records.
#[derive(Debug, Clone, Copy)]
pub struct RenderSample {
	pub identity: InstanceIdentity,
	pub position: TreePosition,
	pub duration: Duration,
	pub timestamp: Instant,
	pub unnecessary: bool,
}

/// How a render's identity related to the tracked tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
	/// First render of an identity at a free position.
	Mounted,
	/// Another render of a known identity at the position it holds.
	Rendered,
	/// The identity took over a position another identity still held.
	///
	/// `displaced` keeps its statistics until the next [`Aggregator::settle`], and keeps them for good if it renders elsewhere first.
	Replaced { displaced: InstanceIdentity, generation: u32 },
	/// A known identity rendered at another position, like after a keyed reorder. Its statistics moved along.
	Moved { from: TreePosition },
}

/// Sums over all live identities.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Totals {
	pub instances: usize,
	pub renders: u64,
	pub changes: ReasonCounts,
	pub unnecessary_renders: u64,
}

#[derive(Debug, Default)]
struct Occupancy {
	/// Identities that took this position so far. Outlives the occupant.
	taken: u32,
	occupant: Option<InstanceIdentity>,
}

/// Owns every [`PerInstanceStats`].
#[derive(Debug, Default)]
pub struct Aggregator {
	stats: HashMap<InstanceIdentity, PerInstanceStats>,
	positions: HashMap<TreePosition, Occupancy>,
	displaced: HashSet<InstanceIdentity>,
}

impl Aggregator {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Folds one render into its identity's statistics, allocating them first if necessary.
	pub fn record(&mut self, sample: &RenderSample, records: &[ChangeRecord]) -> (Admission, &PerInstanceStats) {
		let (admission, generation) = self.admit(sample);

		let stats = match self.stats.entry(sample.identity) {
			Entry::Occupied(occupied) => {
				let stats = occupied.into_mut();
				stats.position = sample.position;
				stats.generation = generation;
				stats
			}
			Entry::Vacant(vacant) => vacant.insert(PerInstanceStats::new(sample.identity, sample.position, generation, sample.timestamp)),
		};
		stats.render_count = stats.render_count.saturating_add(1);
		stats.change_counts.add_records(records);
		if sample.unnecessary {
			stats.unnecessary_renders = stats.unnecessary_renders.saturating_add(1);
		}
		stats.total_duration = stats.total_duration.saturating_add(sample.duration);
		stats.last_render = sample.timestamp;
		trace!(identity = %sample.identity, ?admission, render_count = stats.render_count, "Recorded render.");
		(admission, &*stats)
	}

	/// Moves `sample`'s identity into its position and returns the generation it holds it at.
	fn admit(&mut self, sample: &RenderSample) -> (Admission, u32) {
		let RenderSample { identity, position, .. } = *sample;
		self.displaced.remove(&identity);

		let from = self.stats.get(&identity).map(|stats| (stats.position, stats.generation));
		let moved_from = from.map(|(from, _)| from).filter(|&from| from != position);
		if let Some(from) = moved_from {
			if let Some(left) = self.positions.get_mut(&from) {
				if left.occupant == Some(identity) {
					left.occupant = None;
				}
			}
		}

		let occupancy = self.positions.entry(position).or_default();
		let (generation, displaced) = match (occupancy.occupant, from) {
			(Some(occupant), Some((_, generation))) if occupant == identity => (generation, None),
			(occupant, _) => {
				let generation = occupancy.taken;
				occupancy.taken = occupancy.taken.wrapping_add(1);
				occupancy.occupant = Some(identity);
				(generation, occupant.filter(|&occupant| occupant != identity))
			}
		};

		if let Some(displaced) = displaced {
			debug!(%displaced, by = %identity, ?position, generation, "Displaced. Statistics are dropped on settle unless it renders elsewhere.");
			self.displaced.insert(displaced);
		}
		if let Some(from) = moved_from {
			debug!(%identity, ?from, to = ?position, "Moved.");
		}

		let admission = match (moved_from, displaced, from) {
			(Some(from), _, _) => Admission::Moved { from },
			(None, Some(displaced), _) => Admission::Replaced { displaced, generation },
			(None, None, Some(_)) => Admission::Rendered,
			(None, None, None) => Admission::Mounted,
		};
		(admission, generation)
	}

	/// Drops the statistics of every identity that was displaced from its position and didn't render anywhere since.
	///
	/// Call this once all renders of a commit are recorded.
	pub fn settle(&mut self) -> Vec<PerInstanceStats> {
		let displaced: Vec<_> = self.displaced.drain().collect();
		displaced.into_iter().filter_map(|identity| self.retire(identity)).collect()
	}

	/// Deletes `identity`'s statistics, returning them if it was live.
	pub fn retire(&mut self, identity: InstanceIdentity) -> Option<PerInstanceStats> {
		self.displaced.remove(&identity);
		let stats = self.stats.remove(&identity)?;
		if let Some(occupancy) = self.positions.get_mut(&stats.position) {
			if occupancy.occupant == Some(identity) {
				occupancy.occupant = None;
			}
		}
		Some(stats)
	}

	#[must_use]
	pub fn get(&self, identity: InstanceIdentity) -> Option<&PerInstanceStats> {
		self.stats.get(&identity)
	}

	/// Iterates live statistics in no particular order.
	pub fn iter(&self) -> impl Iterator<Item = &PerInstanceStats> + '_ {
		self.stats.values()
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.stats.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.stats.is_empty()
	}

	#[must_use]
	pub fn totals(&self) -> Totals {
		self.iter().fold(Totals::default(), |mut totals, stats| {
			totals.instances += 1;
			totals.renders = totals.renders.saturating_add(stats.render_count);
			totals.changes += &stats.change_counts;
			totals.unnecessary_renders = totals.unnecessary_renders.saturating_add(stats.unnecessary_renders);
			totals
		})
	}

	/// Forgets all statistics and position generations.
	pub fn clear(&mut self) {
		self.stats.clear();
		self.positions.clear();
		self.displaced.clear();
	}
}
