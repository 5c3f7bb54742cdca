use std::cell::{Cell, RefCell};
use std::cmp::Ordering;
use std::fmt::{self, Debug};
use std::rc::Rc;

use tracing::{trace, warn};

use crate::observer::{observe, Observer};
use crate::value::Value;

/// A plain array.
///
/// Once observed, `push`, `pop`, `shift`, `unshift`, `splice`, `sort_by`
/// and `reverse` notify the array's observer. Index assignment and length
/// changes cannot be intercepted, go through [`crate::set`] and
/// [`crate::remove`] for those.
#[derive(Clone, Default)]
pub struct Array {
	body: Rc<ArrayBody>,
}

#[derive(Default)]
struct ArrayBody {
	items: RefCell<Vec<Value>>,
	observer: RefCell<Option<Observer>>,
	frozen: Cell<bool>,
}

impl Array {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn ptr_eq(&self, other: &Array) -> bool {
		Rc::ptr_eq(&self.body, &other.body)
	}

	pub fn observer(&self) -> Option<Observer> {
		self.body.observer.borrow().clone()
	}

	pub(crate) fn attach(&self, observer: Observer) {
		*self.body.observer.borrow_mut() = Some(observer);
	}

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
		self.body.items.borrow().len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Reads an element. Element reads are not tracked individually;
	/// whoever read the array through an accessor depends on its shape.
	pub fn get(&self, index: usize) -> Value {
		self.body
			.items
			.borrow()
			.get(index)
			.cloned()
			.unwrap_or_default()
	}

	pub fn to_vec(&self) -> Vec<Value> {
		self.body.items.borrow().clone()
	}

	/// Plain index assignment. Not intercepted: nobody is notified and
	/// the value is not observed.
	pub fn set_index(&self, index: usize, value: impl Into<Value>) {
		if self.is_frozen() {
			warn!(index, "cannot assign to an index of a frozen array");
			return;
		}

		let mut items = self.body.items.borrow_mut();
		if index >= items.len() {
			items.resize(index + 1, Value::Undefined);
		}
		items[index] = value.into();
	}

	/// Plain length assignment. Not intercepted.
	pub fn set_len(&self, len: usize) {
		if self.is_frozen() {
			warn!(len, "cannot change the length of a frozen array");
			return;
		}

		self.body.items.borrow_mut().resize(len, Value::Undefined);
	}

	pub fn push(&self, value: impl Into<Value>) -> usize {
		let value = value.into();
		self.intercept("push", |items| {
			items.push(value.clone());
			(items.len(), vec![value])
		})
		.unwrap_or_else(|| self.len())
	}

	pub fn pop(&self) -> Option<Value> {
		self.intercept("pop", |items| (items.pop(), Vec::new()))
			.flatten()
	}

	pub fn shift(&self) -> Option<Value> {
		self.intercept("shift", |items| {
			let first = if items.is_empty() {
				None
			} else {
				Some(items.remove(0))
			};
			(first, Vec::new())
		})
		.flatten()
	}

	pub fn unshift(&self, value: impl Into<Value>) -> usize {
		let value = value.into();
		self.intercept("unshift", |items| {
			items.insert(0, value.clone());
			(items.len(), vec![value])
		})
		.unwrap_or_else(|| self.len())
	}

	/// Removes `delete_count` elements at `start` and inserts `insert`
	/// in their place. Out of range arguments are clamped.
	pub fn splice(&self, start: usize, delete_count: usize, insert: Vec<Value>) -> Vec<Value> {
		self.intercept("splice", |items| {
			let start = start.min(items.len());
			let end = start.saturating_add(delete_count).min(items.len());
			let removed = items.splice(start..end, insert.iter().cloned()).collect();
			(removed, insert)
		})
		.unwrap_or_default()
	}

	/// Sorts in place. The comparator must not access this array.
	pub fn sort_by(&self, mut compare: impl FnMut(&Value, &Value) -> Ordering) {
		self.intercept("sort", |items| {
			items.sort_by(|a, b| compare(a, b));
			((), Vec::new())
		});
	}

	pub fn reverse(&self) {
		self.intercept("reverse", |items| {
			items.reverse();
			((), Vec::new())
		});
	}

	fn intercept<R>(
		&self,
		method: &'static str,
		func: impl FnOnce(&mut Vec<Value>) -> (R, Vec<Value>),
	) -> Option<R> {
		if self.is_frozen() {
			warn!(method, "cannot mutate a frozen array");
			return None;
		}

		let (result, inserted) = func(&mut self.body.items.borrow_mut());

		if let Some(observer) = self.observer() {
			for item in &inserted {
				observe(item);
			}

			trace!(method, "observed array mutated");
			observer.dep().notify();
		}

		Some(result)
	}
}

impl<V> FromIterator<V> for Array
where
	V: Into<Value>,
{
	fn from_iter<I: IntoIterator<Item = V>>(iter: I) -> Self {
		let array = Array::new();
		*array.body.items.borrow_mut() = iter.into_iter().map(Into::into).collect();
		array
	}
}

impl Debug for Array {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_list().entries(self.to_vec()).finish()
	}
}
