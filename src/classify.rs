use crate::{
	diff::diff,
	extract::extract,
	host::HostInstance,
	snapshot::{ChangeReason, Name, ReasonSet},
	value::Value,
};
use core::fmt::{self, Display, Formatter};

/// One changed name in one category of one render.
///
/// Only the current value is kept.
#[derive(Debug, Clone)]
pub struct ChangeRecord {
	pub reason: ChangeReason,
	pub name: Name,
	pub value: Value,
}

impl Display for ChangeRecord {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		write!(f, "{{{:?},{},{:?}}}", self.reason, self.name, self.value)
	}
}

/// Diffs each category in `tracked` (restricted to what `instance` itself [tracks](`HostInstance::tracked`))
/// in [`ChangeReason::ALL`] order and concatenates the results.
///
/// Categories without a current snapshot contribute nothing.
#[must_use]
pub fn classify<I: HostInstance + ?Sized>(instance: &I, tracked: ReasonSet) -> Vec<ChangeRecord> {
	let mut records = Vec::new();
	for reason in tracked.intersection(instance.tracked()).iter() {
		if let Some(pair) = extract(instance, reason) {
			records.extend(
				diff(pair.current, pair.previous)
					.into_iter()
					.map(|(name, value)| ChangeRecord { reason, name, value }),
			);
		}
	}
	records
}
