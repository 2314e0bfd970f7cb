use crate::{
	host::HostInstance,
	snapshot::{ChangeReason, ValueSnapshot},
};

/// The current and, if any, preceding snapshot of one category of one instance.
#[derive(Debug, Clone, Copy)]
pub struct SnapshotPair<'a> {
	pub current: &'a ValueSnapshot,
	/// [`None`] on first mount, which is distinct from an empty snapshot.
	pub previous: Option<&'a ValueSnapshot>,
}

/// Reads `reason`'s snapshots from `instance` without touching it.
///
/// Returns [`None`] if the instance has no current snapshot for that category,
/// which the classifier treats as "no changes" rather than as an error.
pub fn extract<I: HostInstance + ?Sized>(instance: &I, reason: ChangeReason) -> Option<SnapshotPair<'_>> {
	let current = instance.snapshot(reason)?;
	let previous = instance.alternate().and_then(|alternate| alternate.snapshot(reason));
	Some(SnapshotPair { current, previous })
}
