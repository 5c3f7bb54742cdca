use std::any::Any;
use std::fmt::{self, Debug};
use std::rc::Rc;

use crate::array::Array;
use crate::object::Object;
use crate::observer::Observer;

/// A piece of plain data the engine can observe.
///
/// Containers are handles: cloning an `Object` or an `Array` yields
/// another reference to the same storage, and identity is pointer identity.
#[derive(Clone, Default)]
pub enum Value {
	#[default]
	Undefined,
	Null,
	Bool(bool),
	Number(f64),
	String(Rc<str>),
	Object(Object),
	Array(Array),
	Opaque(Opaque),
}

/// A host-owned leaf (for instance a UI tree node).
/// It is never observed and never traversed.
#[derive(Clone)]
pub struct Opaque(Rc<dyn Any>);

impl Opaque {
	pub fn new<T: Any>(value: T) -> Self {
		Opaque(Rc::new(value))
	}

	pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
		self.0.downcast_ref::<T>()
	}

	pub fn ptr_eq(&self, other: &Opaque) -> bool {
		Rc::ptr_eq(&self.0, &other.0)
	}
}

impl Debug for Opaque {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "Opaque({:p})", Rc::as_ptr(&self.0))
	}
}

impl Value {
	/// The accessor's "nothing changed" test: identity for containers,
	/// value equality for primitives, and `NaN` is the same as `NaN`.
	pub fn same(&self, other: &Value) -> bool {
		match (self, other) {
			(Value::Number(a), Value::Number(b)) => a == b || (a.is_nan() && b.is_nan()),
			_ => self == other,
		}
	}

	pub fn is_container(&self) -> bool {
		matches!(self, Value::Object(_) | Value::Array(_))
	}

	pub fn is_undefined(&self) -> bool {
		matches!(self, Value::Undefined)
	}

	/// The observer already attached to this value, if any.
	pub fn observer(&self) -> Option<Observer> {
		match self {
			Value::Object(object) => object.observer(),
			Value::Array(array) => array.observer(),
			_ => None,
		}
	}

	pub fn as_object(&self) -> Option<&Object> {
		match self {
			Value::Object(object) => Some(object),
			_ => None,
		}
	}

	pub fn as_array(&self) -> Option<&Array> {
		match self {
			Value::Array(array) => Some(array),
			_ => None,
		}
	}

	pub fn as_number(&self) -> Option<f64> {
		match self {
			Value::Number(number) => Some(*number),
			_ => None,
		}
	}

	pub fn as_bool(&self) -> Option<bool> {
		match self {
			Value::Bool(value) => Some(*value),
			_ => None,
		}
	}

	pub fn as_str(&self) -> Option<&str> {
		match self {
			Value::String(value) => Some(value),
			_ => None,
		}
	}
}

/// Strict equality. Note that `NaN != NaN` here, use [`Value::same`]
/// for the change test.
impl PartialEq for Value {
	fn eq(&self, other: &Self) -> bool {
		match (self, other) {
			(Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
			(Value::Bool(a), Value::Bool(b)) => a == b,
			(Value::Number(a), Value::Number(b)) => a == b,
			(Value::String(a), Value::String(b)) => a == b,
			(Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
			(Value::Array(a), Value::Array(b)) => a.ptr_eq(b),
			(Value::Opaque(a), Value::Opaque(b)) => a.ptr_eq(b),
			_ => false,
		}
	}
}

impl Debug for Value {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Value::Undefined => f.write_str("undefined"),
			Value::Null => f.write_str("null"),
			Value::Bool(value) => value.fmt(f),
			Value::Number(value) => value.fmt(f),
			Value::String(value) => value.fmt(f),
			Value::Object(object) => object.fmt(f),
			Value::Array(array) => array.fmt(f),
			Value::Opaque(opaque) => opaque.fmt(f),
		}
	}
}

impl From<bool> for Value {
	fn from(value: bool) -> Self {
		Value::Bool(value)
	}
}

impl From<f64> for Value {
	fn from(value: f64) -> Self {
		Value::Number(value)
	}
}

impl From<i32> for Value {
	fn from(value: i32) -> Self {
		Value::Number(value as f64)
	}
}

impl From<usize> for Value {
	fn from(value: usize) -> Self {
		Value::Number(value as f64)
	}
}

impl From<&str> for Value {
	fn from(value: &str) -> Self {
		Value::String(value.into())
	}
}

impl From<String> for Value {
	fn from(value: String) -> Self {
		Value::String(value.into())
	}
}

impl From<Rc<str>> for Value {
	fn from(value: Rc<str>) -> Self {
		Value::String(value)
	}
}

impl From<Object> for Value {
	fn from(value: Object) -> Self {
		Value::Object(value)
	}
}

impl From<Array> for Value {
	fn from(value: Array) -> Self {
		Value::Array(value)
	}
}

impl From<Opaque> for Value {
	fn from(value: Opaque) -> Self {
		Value::Opaque(value)
	}
}

impl From<()> for Value {
	fn from(_: ()) -> Self {
		Value::Undefined
	}
}

/// Addresses a slot for the explicit [`set`](crate::set) and
/// [`remove`](crate::remove) operations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Key {
	Index(usize),
	Name(Rc<str>),
}

impl From<usize> for Key {
	fn from(index: usize) -> Self {
		Key::Index(index)
	}
}

impl From<&str> for Key {
	fn from(name: &str) -> Self {
		Key::Name(name.into())
	}
}

impl From<String> for Key {
	fn from(name: String) -> Self {
		Key::Name(name.into())
	}
}

impl From<Rc<str>> for Key {
	fn from(name: Rc<str>) -> Self {
		Key::Name(name)
	}
}

#[cfg(test)]
mod tests {
	use rstest::rstest;

	use super::*;

	#[rstest]
	#[case(Value::Number(f64::NAN), Value::Number(f64::NAN), true)]
	#[case(Value::Number(1.0), Value::Number(1.0), true)]
	#[case(Value::Number(1.0), Value::Number(2.0), false)]
	#[case(Value::from("a"), Value::from("a"), true)]
	#[case(Value::Null, Value::Undefined, false)]
	fn same_value(#[case] a: Value, #[case] b: Value, #[case] expected: bool) {
		assert_eq!(a.same(&b), expected);
	}

	#[test]
	fn nan_is_not_strictly_equal() {
		assert_ne!(Value::Number(f64::NAN), Value::Number(f64::NAN));
	}

	#[test]
	fn containers_compare_by_identity() {
		let a = Object::new();
		let b = Object::new();
		assert!(Value::from(a.clone()).same(&Value::from(a)));
		assert!(!Value::from(Object::new()).same(&Value::from(b)));
	}
}
