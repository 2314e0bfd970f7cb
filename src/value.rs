//! Opaque tracked values and the shallow identity rule used to compare them.

use core::{
	any::Any,
	fmt::{self, Debug, Formatter},
};
use std::rc::Rc;

/// Anything that can sit behind a [`Value::Ref`].
///
/// Blanket-implemented for every `Debug + 'static` type.
pub trait Opaque: Any + Debug {
	fn as_any(&self) -> &dyn Any;
}
impl<T: Any + Debug> Opaque for T {
	fn as_any(&self) -> &dyn Any {
		self
	}
}

/// One tracked value as the host renderer sees it.
///
/// Primitives compare by value, [`Value::Ref`]s compare by allocation only.
/// Cloning a [`Value`] never copies a referenced allocation, so a clone [is the same](`Value::is_same`) as its original.
#[derive(Clone)]
pub enum Value {
	Undefined,
	Null,
	Bool(bool),
	Number(f64),
	Str(Rc<str>),
	/// An object, array, closure or other composite, identified by its allocation.
	Ref(Rc<dyn Opaque>),
}

impl Value {
	/// Wraps `value` in a fresh allocation.
	///
	/// Two calls with equal arguments produce values that are **not** [the same](`Value::is_same`).
	#[must_use]
	pub fn reference<T: Opaque>(value: T) -> Self {
		Self::Ref(Rc::new(value))
	}

	/// Shallow identity.
	///
	/// This never looks into a [`Value::Ref`]'s contents: two structurally equal composites in distinct allocations are different.
	/// `NaN` is the same as `NaN`, but `0.0` and `-0.0` are not the same.
	#[must_use]
	pub fn is_same(&self, other: &Self) -> bool {
		match (self, other) {
			(Self::Undefined, Self::Undefined) | (Self::Null, Self::Null) => true,
			(Self::Bool(a), Self::Bool(b)) => a == b,
			(Self::Number(a), Self::Number(b)) => (a.is_nan() && b.is_nan()) || a.to_bits() == b.to_bits(),
			(Self::Str(a), Self::Str(b)) => Rc::ptr_eq(a, b) || a == b,
			(Self::Ref(a), Self::Ref(b)) => Rc::as_ptr(a).cast::<()>() == Rc::as_ptr(b).cast::<()>(),
			_ => false,
		}
	}

	/// Borrows the referenced allocation as `T`, if this is a [`Value::Ref`] holding one.
	#[must_use]
	pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
		match self {
			Self::Ref(opaque) => (**opaque).as_any().downcast_ref(),
			_ => None,
		}
	}
}

impl Debug for Value {
	// No addresses, so formatted change sequences stay reproducible.
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			Self::Undefined => f.write_str("undefined"),
			Self::Null => f.write_str("null"),
			Self::Bool(b) => Debug::fmt(b, f),
			Self::Number(n) => Debug::fmt(n, f),
			Self::Str(s) => Debug::fmt(&**s, f),
			Self::Ref(opaque) => Debug::fmt(&**opaque, f),
		}
	}
}

impl Default for Value {
	fn default() -> Self {
		Self::Undefined
	}
}

impl From<bool> for Value {
	fn from(b: bool) -> Self {
		Self::Bool(b)
	}
}

impl From<f64> for Value {
	fn from(n: f64) -> Self {
		Self::Number(n)
	}
}

impl From<i32> for Value {
	fn from(n: i32) -> Self {
		Self::Number(n.into())
	}
}

impl From<&str> for Value {
	fn from(s: &str) -> Self {
		Self::Str(s.into())
	}
}

impl From<String> for Value {
	fn from(s: String) -> Self {
		Self::Str(s.into())
	}
}

impl From<Rc<str>> for Value {
	fn from(s: Rc<str>) -> Self {
		Self::Str(s)
	}
}

impl<T: Into<Value>> From<Option<T>> for Value {
	fn from(value: Option<T>) -> Self {
		value.map_or(Self::Null, Into::into)
	}
}
