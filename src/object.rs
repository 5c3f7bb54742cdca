use std::cell::{Cell, RefCell};
use std::fmt::{self, Debug};
use std::rc::Rc;

use fxhash::FxBuildHasher;
use indexmap::IndexMap;
use tracing::warn;

use crate::dep::Dep;
use crate::evaluation::has_target;
use crate::observer::{depend_array, observe, Observer};
use crate::value::Value;

type Slots = IndexMap<Rc<str>, Slot, FxBuildHasher>;

/// A plain object with insertion-ordered keys.
///
/// Once observed, every key present at that moment reads and writes
/// through an intercepting accessor. Keys added later with [`Object::set`]
/// stay plain; use [`crate::set`] to add a reactive key.
#[derive(Clone, Default)]
pub struct Object {
	body: Rc<ObjectBody>,
}

#[derive(Default)]
struct ObjectBody {
	slots: RefCell<Slots>,
	observer: RefCell<Option<Observer>>,
	frozen: Cell<bool>,
	internal: Cell<bool>,
}

struct Slot {
	value: Value,
	accessor: Option<Accessor>,
}

struct Accessor {
	dep: Dep,
	child: Option<Observer>,
	shallow: bool,
}

impl Object {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn ptr_eq(&self, other: &Object) -> bool {
		Rc::ptr_eq(&self.body, &other.body)
	}

	pub fn observer(&self) -> Option<Observer> {
		self.body.observer.borrow().clone()
	}

	pub(crate) fn attach(&self, observer: Observer) {
		*self.body.observer.borrow_mut() = Some(observer);
	}

	/// Marks an engine-owned instance. It is never observed, and keys
	/// cannot be added or removed through [`crate::set`] / [`crate::remove`].
	pub fn mark_internal(&self) {
		self.body.internal.set(true);
	}

	pub fn is_internal(&self) -> bool {
		self.body.internal.get()
	}

	/// Freezes the object: it will not be observed or traversed, and
	/// writes are ignored.
	pub fn freeze(&self) {
		self.body.frozen.set(true);
	}

	pub fn is_frozen(&self) -> bool {
		self.body.frozen.get()
	}

	pub fn is_extensible(&self) -> bool {
		!self.is_frozen()
	}

	pub fn len(&self) -> usize {
		self.body.slots.borrow().len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	pub fn contains_key(&self, key: &str) -> bool {
		self.body.slots.borrow().contains_key(key)
	}

	pub fn keys(&self) -> Vec<Rc<str>> {
		self.body.slots.borrow().keys().cloned().collect()
	}

	/// Whether `key` reads and writes through an accessor.
	pub fn is_reactive(&self, key: &str) -> bool {
		self.body
			.slots
			.borrow()
			.get(key)
			.map_or(false, |slot| slot.accessor.is_some())
	}

	/// The registry behind the accessor of `key`.
	pub fn dep(&self, key: &str) -> Option<Dep> {
		let slots = self.body.slots.borrow();
		slots.get(key)?.accessor.as_ref().map(|a| a.dep.clone())
	}

	/// Snapshot of the stored values, read without tracking.
	pub(crate) fn entries(&self) -> Vec<(Rc<str>, Value)> {
		self.body
			.slots
			.borrow()
			.iter()
			.map(|(key, slot)| (key.clone(), slot.value.clone()))
			.collect()
	}

	/// Reads `key`. Missing keys read as `Undefined`.
	pub fn get(&self, key: &str) -> Value {
		let (value, dep, child) = {
			let slots = self.body.slots.borrow();
			let Some(slot) = slots.get(key) else {
				return Value::Undefined;
			};

			match &slot.accessor {
				Some(accessor) if has_target() => (
					slot.value.clone(),
					accessor.dep.clone(),
					accessor.child.clone(),
				),
				_ => return slot.value.clone(),
			}
		};

		dep.depend();
		if let Some(child) = child {
			child.dep().depend();
			if let Value::Array(array) = &value {
				depend_array(array);
			}
		}

		value
	}

	/// Writes `key`. Through an accessor this is a no-op for the same
	/// value; otherwise the new value is observed and subscribers notified.
	pub fn set(&self, key: impl Into<Rc<str>>, value: impl Into<Value>) {
		let key = key.into();
		let value = value.into();

		if self.is_frozen() {
			warn!(key = %key, "cannot assign to a key of a frozen object");
			return;
		}

		let (dep, shallow) = {
			let mut slots = self.body.slots.borrow_mut();
			if !slots.contains_key(&key) {
				slots.insert(
					key,
					Slot {
						value,
						accessor: None,
					},
				);
				return;
			}

			let Some(slot) = slots.get_mut(&key) else {
				return;
			};
			let Some(accessor) = &slot.accessor else {
				slot.value = value;
				return;
			};

			if slot.value.same(&value) {
				return;
			}

			let notify = (accessor.dep.clone(), accessor.shallow);
			slot.value = value.clone();
			notify
		};

		let child = if shallow { None } else { observe(&value) };
		if let Some(accessor) = self
			.body
			.slots
			.borrow_mut()
			.get_mut(&key)
			.and_then(|slot| slot.accessor.as_mut())
		{
			accessor.child = child;
		}

		dep.notify();
	}

	/// Removes `key` without notifying anyone. Use [`crate::remove`]
	/// to delete a key reactively.
	pub fn delete(&self, key: &str) -> Option<Value> {
		if self.is_frozen() {
			warn!(key, "cannot delete a key of a frozen object");
			return None;
		}

		self.body
			.slots
			.borrow_mut()
			.shift_remove(key)
			.map(|slot| slot.value)
	}

	/// Installs an intercepting accessor for `key` holding `value`.
	pub(crate) fn define(&self, key: Rc<str>, value: Value, shallow: bool) {
		let dep = Dep::new();
		let child = if shallow { None } else { observe(&value) };

		self.body.slots.borrow_mut().insert(
			key,
			Slot {
				value,
				accessor: Some(Accessor {
					dep,
					child,
					shallow,
				}),
			},
		);
	}
}

impl<K, V> FromIterator<(K, V)> for Object
where
	K: Into<Rc<str>>,
	V: Into<Value>,
{
	fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
		let object = Object::new();
		{
			let mut slots = object.body.slots.borrow_mut();
			for (key, value) in iter {
				slots.insert(
					key.into(),
					Slot {
						value: value.into(),
						accessor: None,
					},
				);
			}
		}
		object
	}
}

impl Debug for Object {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_map().entries(self.entries()).finish()
	}
}
