use crate::{
	snapshot::{Name, ValueSnapshot},
	value::Value,
};
use tracing::{instrument, trace};

/// Lists the names in `current` whose values changed since `previous`, with their current values.
///
/// - Without a `previous` snapshot (first mount), every name is reported.
/// - A name is reported iff it's missing from `previous` or its previous value isn't [the same](`Value::is_same`).
///   Values are never compared structurally, so a composite that's recreated each render always counts as changed.
/// - Names only present in `previous` are not reported.
/// - Output is in `current`'s order.
///
/// Runs in O(`current.len()`), independent of value size.
#[must_use]
#[instrument(level = "trace", skip(current, previous), fields(current.len = current.len(), first = previous.is_none()))]
pub fn diff(current: &ValueSnapshot, previous: Option<&ValueSnapshot>) -> Vec<(Name, Value)> {
	let previous = match previous {
		Some(previous) => previous,
		None => return current.iter().map(|(name, value)| (name.clone(), value.clone())).collect(),
	};

	let changes: Vec<_> = current
		.iter()
		.filter(|(name, value)| match previous.get(name) {
			Some(previous_value) => !previous_value.is_same(value),
			None => true,
		})
		.map(|(name, value)| (name.clone(), value.clone()))
		.collect();
	trace!("{} of {} name(s) changed.", changes.len(), current.len());
	changes
}
