use crate::value::Value;
use core::{
	fmt::{self, Debug, Formatter},
	iter::FromIterator,
	slice,
};
use hashbrown::HashMap;
use std::rc::Rc;

/// The stable name of one tracked value, like a prop name or hook index.
pub type Name = Rc<str>;

/// Which tracked category of an instance changed.
///
/// The declaration order here is the order in which categories are classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ChangeReason {
	Props,
	State,
	Context,
}

impl ChangeReason {
	/// All reasons in classification order.
	pub const ALL: [ChangeReason; 3] = [ChangeReason::Props, ChangeReason::State, ChangeReason::Context];

	pub const COUNT: usize = Self::ALL.len();

	#[must_use]
	pub fn index(self) -> usize {
		self as usize
	}

	const fn bit(self) -> u8 {
		1 << self as u8
	}
}

/// A closed set of [`ChangeReason`]s.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReasonSet(u8);

impl ReasonSet {
	#[must_use]
	pub const fn empty() -> Self {
		Self(0)
	}

	#[must_use]
	pub const fn all() -> Self {
		Self(ChangeReason::Props.bit() | ChangeReason::State.bit() | ChangeReason::Context.bit())
	}

	#[must_use]
	pub const fn with(self, reason: ChangeReason) -> Self {
		Self(self.0 | reason.bit())
	}

	#[must_use]
	pub const fn without(self, reason: ChangeReason) -> Self {
		Self(self.0 & !reason.bit())
	}

	#[must_use]
	pub const fn contains(self, reason: ChangeReason) -> bool {
		self.0 & reason.bit() != 0
	}

	#[must_use]
	pub const fn intersection(self, other: Self) -> Self {
		Self(self.0 & other.0)
	}

	#[must_use]
	pub const fn is_empty(self) -> bool {
		self.0 == 0
	}

	/// Iterates the contained reasons in classification order.
	pub fn iter(self) -> impl Iterator<Item = ChangeReason> {
		ChangeReason::ALL.iter().copied().filter(move |reason| self.contains(*reason))
	}
}

impl Default for ReasonSet {
	fn default() -> Self {
		Self::all()
	}
}

impl Debug for ReasonSet {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_set().entries(self.iter()).finish()
	}
}

impl FromIterator<ChangeReason> for ReasonSet {
	fn from_iter<T: IntoIterator<Item = ChangeReason>>(iter: T) -> Self {
		iter.into_iter().fold(Self::empty(), Self::with)
	}
}

/// Ordered name → [`Value`] mapping of one tracked category at one commit.
///
/// Order is the category's declaration or assignment order and determines output order.
/// It is irrelevant for comparisons, which go through the name index.
#[derive(Clone, Default)]
pub struct ValueSnapshot {
	entries: Vec<(Name, Value)>,
	index: HashMap<Name, usize>,
}

impl ValueSnapshot {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	#[must_use]
	pub fn with_capacity(capacity: usize) -> Self {
		Self {
			entries: Vec::with_capacity(capacity),
			index: HashMap::with_capacity(capacity),
		}
	}

	/// Assigns `value` to `name`.
	///
	/// Reassigning an existing name replaces its value but keeps its position.
	pub fn insert(&mut self, name: impl Into<Name>, value: impl Into<Value>) -> Option<Value> {
		let name = name.into();
		let value = value.into();
		match self.index.get(&name) {
			Some(&i) => Some(core::mem::replace(&mut self.entries[i].1, value)),
			None => {
				self.index.insert(name.clone(), self.entries.len());
				self.entries.push((name, value));
				None
			}
		}
	}

	#[must_use]
	pub fn get(&self, name: &str) -> Option<&Value> {
		self.index.get(name).map(|&i| &self.entries[i].1)
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn iter(&self) -> Iter<'_> {
		Iter(self.entries.iter())
	}
}

impl Debug for ValueSnapshot {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_map().entries(self.iter()).finish()
	}
}

impl<N: Into<Name>, V: Into<Value>> FromIterator<(N, V)> for ValueSnapshot {
	fn from_iter<T: IntoIterator<Item = (N, V)>>(iter: T) -> Self {
		let iter = iter.into_iter();
		let mut snapshot = Self::with_capacity(iter.size_hint().0);
		for (name, value) in iter {
			snapshot.insert(name, value);
		}
		snapshot
	}
}

impl<'a> IntoIterator for &'a ValueSnapshot {
	type Item = (&'a Name, &'a Value);
	type IntoIter = Iter<'a>;

	fn into_iter(self) -> Self::IntoIter {
		self.iter()
	}
}

/// Iterates a [`ValueSnapshot`] in order.
pub struct Iter<'a>(slice::Iter<'a, (Name, Value)>);
impl<'a> Iterator for Iter<'a> {
	type Item = (&'a Name, &'a Value);

	fn next(&mut self) -> Option<Self::Item> {
		self.0.next().map(|(name, value)| (name, value))
	}

	fn size_hint(&self) -> (usize, Option<usize>) {
		self.0.size_hint()
	}
}
impl ExactSizeIterator for Iter<'_> {}
