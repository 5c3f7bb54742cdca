use std::cell::Cell;
use std::fmt::Debug;
use std::rc::Rc;

use tracing::warn;

use crate::array::Array;
use crate::dep::Dep;
use crate::object::Object;
use crate::value::{Key, Value};

thread_local! {
	static SHOULD_OBSERVE: Cell<bool> = Cell::new(true);
}

/// Bookkeeping attached to an observed object or array.
#[derive(Clone)]
pub struct Observer {
	body: Rc<ObserverBody>,
}

struct ObserverBody {
	/// Notified when keys are added or removed, or the array is mutated.
	dep: Dep,
	/// Number of roots that use this value as their top-level state.
	root_count: Cell<usize>,
}

impl Observer {
	fn new() -> Self {
		Observer {
			body: Rc::new(ObserverBody {
				dep: Dep::new(),
				root_count: Cell::new(0),
			}),
		}
	}

	pub fn dep(&self) -> &Dep {
		&self.body.dep
	}

	pub fn root_count(&self) -> usize {
		self.body.root_count.get()
	}

	pub fn ptr_eq(&self, other: &Observer) -> bool {
		Rc::ptr_eq(&self.body, &other.body)
	}

	fn for_object(object: &Object) -> Self {
		let observer = Observer::new();
		// Attach first, so cycles back to `object` see the marker.
		object.attach(observer.clone());
		for (key, value) in object.entries() {
			object.define(key, value, false);
		}
		observer
	}

	fn for_array(array: &Array) -> Self {
		let observer = Observer::new();
		array.attach(observer.clone());
		for item in array.to_vec() {
			observe(&item);
		}
		observer
	}
}

impl Debug for Observer {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Observer")
			.field("dep", &self.body.dep)
			.field("root_count", &self.root_count())
			.finish()
	}
}

pub fn toggle_observing(value: bool) {
	SHOULD_OBSERVE.with(|s| s.set(value))
}

pub fn should_observe() -> bool {
	SHOULD_OBSERVE.with(|s| s.get())
}

/// Runs `func` with observation of new values switched off, then
/// restores the previous setting.
pub fn without_observing<R>(func: impl FnOnce() -> R) -> R {
	struct Restore(bool);

	impl Drop for Restore {
		fn drop(&mut self) {
			toggle_observing(self.0)
		}
	}

	let _restore = Restore(should_observe());
	toggle_observing(false);
	func()
}

/// Returns the observer of `value`, creating it when `value` is an
/// extensible, non-internal object or array and observation is on.
pub fn observe(value: &Value) -> Option<Observer> {
	match value {
		Value::Object(object) => {
			if let Some(observer) = object.observer() {
				return Some(observer);
			}

			if !should_observe() || !object.is_extensible() || object.is_internal() {
				return None;
			}

			Some(Observer::for_object(object))
		}
		Value::Array(array) => {
			if let Some(observer) = array.observer() {
				return Some(observer);
			}

			if !should_observe() || !array.is_extensible() {
				return None;
			}

			Some(Observer::for_array(array))
		}
		_ => None,
	}
}

/// Observes `value` as the top-level state of a root.
pub fn observe_root(value: &Value) -> Option<Observer> {
	let observer = observe(value);
	if let Some(observer) = &observer {
		let count = &observer.body.root_count;
		count.set(count.get() + 1);
	}
	observer
}

/// Installs an intercepting accessor for `key`. With `shallow`, the
/// value itself is not observed.
pub fn define_reactive(object: &Object, key: impl Into<Rc<str>>, value: impl Into<Value>, shallow: bool) {
	object.define(key.into(), value.into(), shallow)
}

/// Array elements cannot be intercepted one by one, so a read of an
/// array subscribes to every observed element as well.
pub(crate) fn depend_array(array: &Array) {
	for item in array.to_vec() {
		if let Some(observer) = item.observer() {
			observer.dep().depend();
		}

		if let Value::Array(inner) = &item {
			depend_array(inner);
		}
	}
}

fn is_root_state(object: &Object) -> bool {
	object.is_internal() || object.observer().map_or(false, |ob| ob.root_count() > 0)
}

/// Writes `key` on `target`, adding a reactive key when it is missing
/// and notifying the target's observer.
pub fn set(target: &Value, key: impl Into<Key>, value: impl Into<Value>) -> Value {
	let value = value.into();

	match (target, key.into()) {
		(Value::Array(array), Key::Index(index)) => {
			if array.len() < index {
				array.set_len(index);
			}
			array.splice(index, 1, vec![value.clone()]);
		}
		(Value::Array(_), Key::Name(name)) => {
			warn!(key = %name, "arrays only accept index keys");
		}
		(Value::Object(object), key) => {
			let name: Rc<str> = match key {
				Key::Name(name) => name,
				Key::Index(index) => index.to_string().into(),
			};

			if object.contains_key(&name) {
				object.set(name, value.clone());
				return value;
			}

			if is_root_state(object) {
				warn!(
					key = %name,
					"avoid adding reactive keys to root state at runtime, declare them up front"
				);
				return value;
			}

			match object.observer() {
				None => object.set(name, value.clone()),
				Some(observer) => {
					object.define(name, value.clone(), false);
					observer.dep().notify();
				}
			}
		}
		(target, key) => {
			warn!(?target, ?key, "cannot set a reactive key on a primitive value");
		}
	}

	value
}

/// Deletes `key` from `target` and notifies the target's observer.
pub fn remove(target: &Value, key: impl Into<Key>) {
	match (target, key.into()) {
		(Value::Array(array), Key::Index(index)) => {
			array.splice(index, 1, Vec::new());
		}
		(Value::Object(object), key) => {
			let name: Rc<str> = match key {
				Key::Name(name) => name,
				Key::Index(index) => index.to_string().into(),
			};

			if is_root_state(object) {
				warn!(key = %name, "avoid deleting keys of root state, set them to null instead");
				return;
			}

			if object.delete(&name).is_none() {
				return;
			}

			if let Some(observer) = object.observer() {
				observer.dep().notify();
			}
		}
		(target, key) => {
			warn!(?target, ?key, "cannot delete a reactive key of a primitive value");
		}
	}
}
