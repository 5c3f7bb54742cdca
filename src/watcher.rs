use std::cell::{Cell, RefCell};
use std::fmt::Debug;
use std::rc::{Rc, Weak};

use tracing::warn;

use crate::dep::Dep;
use crate::dependencies::{DepList, Dependencies};
use crate::error::{handle_error, ReactiveError};
use crate::evaluation::push_target;
use crate::scheduler::queue_watcher;
use crate::traverse::traverse;
use crate::value::Value;

pub type WatcherId = u64;

pub type Getter = Box<dyn Fn() -> anyhow::Result<Value>>;
pub type Callback = Box<dyn Fn(&Value, &Value) -> anyhow::Result<()>>;
pub type Hook = Box<dyn Fn()>;

thread_local! {
	static NEXT_ID: Cell<WatcherId> = Cell::new(1);
}

fn next_id() -> WatcherId {
	NEXT_ID.with(|next| {
		let id = next.get();
		next.set(id + 1);
		id
	})
}

/// What a watcher computes, with a human readable expression used in
/// error reports.
pub struct Evaluator {
	expression: Rc<str>,
	getter: Getter,
}

impl Evaluator {
	pub fn new(func: impl Fn() -> anyhow::Result<Value> + 'static) -> Self {
		Evaluator {
			expression: "<function>".into(),
			getter: Box::new(func),
		}
	}

	/// Resolves a dot-delimited path such as `user.tags.0` against `context`.
	pub fn path(context: Value, path: &str) -> Self {
		let getter: Getter = match parse_path(path) {
			Some(segments) => Box::new(move || Ok(resolve(&context, &segments))),
			None => {
				warn!(path, "failed watching path, only simple dot-delimited paths are supported");
				Box::new(|| Ok(Value::Undefined))
			}
		};

		Evaluator {
			expression: path.into(),
			getter,
		}
	}

	pub fn named(mut self, expression: impl Into<Rc<str>>) -> Self {
		self.expression = expression.into();
		self
	}

	pub fn expression(&self) -> &str {
		&self.expression
	}
}

fn parse_path(path: &str) -> Option<Vec<Rc<str>>> {
	let valid = path
		.chars()
		.all(|c| c.is_alphanumeric() || c == '_' || c == '.' || c == '$');
	if !valid {
		return None;
	}

	Some(path.split('.').map(Rc::from).collect())
}

fn resolve(context: &Value, segments: &[Rc<str>]) -> Value {
	let mut value = context.clone();
	for segment in segments {
		value = match &value {
			Value::Object(object) => object.get(segment),
			Value::Array(array) if &**segment == "length" => Value::from(array.len()),
			Value::Array(array) => segment
				.parse::<usize>()
				.map_or(Value::Undefined, |index| array.get(index)),
			_ => return Value::Undefined,
		};
	}
	value
}

#[derive(Default)]
pub struct WatcherOptions {
	/// Pull mode: notifications only mark the watcher dirty.
	pub lazy: bool,
	/// Re-run inside `notify` instead of going through the scheduler.
	pub sync: bool,
	/// Subscribe to everything reachable from the value.
	pub deep: bool,
	/// Created by user code; affects error labels.
	pub user: bool,
	/// Runs right before the scheduler re-runs the watcher.
	pub before: Option<Hook>,
	/// Runs after the flush in which the watcher was re-run.
	pub after: Option<Hook>,
}

/// One computation and the registries it currently depends on.
///
/// Registries and the scheduler queue only hold weak references, so
/// dropping the last handle stops the watcher.
#[derive(Clone)]
pub struct Watcher {
	body: Rc<WatcherBody>,
}

pub(crate) struct WatcherBody {
	id: WatcherId,
	expression: Rc<str>,
	getter: Getter,
	callback: Option<Callback>,
	lazy: bool,
	sync: bool,
	deep: bool,
	user: bool,
	before: Option<Hook>,
	after: Option<Hook>,
	value: RefCell<Value>,
	dirty: Cell<bool>,
	active: Cell<bool>,
	deps: RefCell<Dependencies>,
}

impl Drop for WatcherBody {
	fn drop(&mut self) {
		for dep in self.deps.get_mut().drain() {
			dep.remove_sub(self.id);
		}
	}
}

impl Watcher {
	/// Creates a watcher. Eager watchers evaluate right away, lazy ones
	/// on first [`Watcher::evaluate`].
	pub fn new(evaluator: Evaluator, callback: Option<Callback>, options: WatcherOptions) -> Self {
		let watcher = Watcher {
			body: Rc::new(WatcherBody {
				id: next_id(),
				expression: evaluator.expression,
				getter: evaluator.getter,
				callback,
				lazy: options.lazy,
				sync: options.sync,
				deep: options.deep,
				user: options.user,
				before: options.before,
				after: options.after,
				value: RefCell::new(Value::Undefined),
				dirty: Cell::new(options.lazy),
				active: Cell::new(true),
				deps: RefCell::new(Dependencies::new()),
			}),
		};

		if !watcher.body.lazy {
			if let Some(value) = watcher.get() {
				*watcher.body.value.borrow_mut() = value;
			}
		}

		watcher
	}

	pub(crate) fn from_body(body: Rc<WatcherBody>) -> Self {
		Watcher { body }
	}

	pub(crate) fn downgrade(&self) -> Weak<WatcherBody> {
		Rc::downgrade(&self.body)
	}

	pub fn id(&self) -> WatcherId {
		self.body.id
	}

	pub fn expression(&self) -> &str {
		&self.body.expression
	}

	/// The cached value of the last successful evaluation.
	pub fn value(&self) -> Value {
		self.body.value.borrow().clone()
	}

	pub fn is_dirty(&self) -> bool {
		self.body.dirty.get()
	}

	pub fn is_active(&self) -> bool {
		self.body.active.get()
	}

	pub fn is_lazy(&self) -> bool {
		self.body.lazy
	}

	pub fn is_user(&self) -> bool {
		self.body.user
	}

	pub fn dependency_count(&self) -> usize {
		self.body.deps.borrow().current().len()
	}

	/// Describes the watcher in reports about it.
	pub fn label(&self) -> String {
		if self.body.user {
			format!("watcher with expression \"{}\"", self.body.expression)
		} else if self.body.lazy {
			format!("computed property \"{}\"", self.body.expression)
		} else {
			format!("render watcher \"{}\"", self.body.expression)
		}
	}

	fn getter_label(&self) -> String {
		if self.body.user {
			format!("getter for watcher \"{}\"", self.body.expression)
		} else if self.body.lazy {
			format!("computed property \"{}\"", self.body.expression)
		} else {
			"render".to_string()
		}
	}

	/// Runs the evaluator with this watcher as the active context and
	/// re-collects dependencies. A failed evaluation is reported and
	/// yields `None`; the cached value stays in place.
	fn get(&self) -> Option<Value> {
		let result = {
			let _evaluation = push_target(Some(self.clone()));
			let result = (self.body.getter)();
			if self.body.deep {
				if let Ok(value) = &result {
					traverse(value);
				}
			}
			result
		};

		self.cleanup_deps();

		match result {
			Ok(value) => Some(value),
			Err(source) => {
				handle_error(ReactiveError::Evaluator {
					label: self.getter_label(),
					source,
				});
				None
			}
		}
	}

	pub(crate) fn add_dep(&self, dep: &Dep) {
		if !self.is_active() {
			return;
		}

		let subscribe = self.body.deps.borrow_mut().based_on(dep);
		if subscribe {
			dep.add_sub(self);
		}
	}

	fn cleanup_deps(&self) {
		let stale = if self.is_active() {
			self.body.deps.borrow_mut().swap()
		} else {
			self.body.deps.borrow_mut().drain()
		};

		for dep in stale {
			dep.remove_sub(self.body.id);
		}
	}

	/// Called by a registry when a dependency changed.
	pub fn update(&self) {
		if self.body.lazy {
			self.body.dirty.set(true);
		} else if self.body.sync {
			self.run();
		} else {
			queue_watcher(self);
		}
	}

	/// Re-evaluates and invokes the callback when the value changed.
	/// Containers and deep watchers always count as changed, since they
	/// may have been mutated in place. A failed evaluation changes nothing.
	pub fn run(&self) {
		if !self.is_active() {
			return;
		}

		let Some(value) = self.get() else {
			return;
		};
		let changed = {
			let old = self.body.value.borrow();
			!value.same(&old) || value.is_container() || self.body.deep
		};

		if changed {
			let old = self.body.value.replace(value.clone());
			self.invoke_callback(&value, &old, false);
		}
	}

	pub(crate) fn invoke_callback(&self, value: &Value, old: &Value, immediate: bool) {
		let Some(callback) = &self.body.callback else {
			return;
		};

		if let Err(source) = callback(value, old) {
			let kind = if immediate { "immediate watcher" } else { "watcher" };
			handle_error(ReactiveError::Callback {
				label: format!("callback for {} \"{}\"", kind, self.body.expression),
				source,
			});
		}
	}

	/// Evaluates a lazy watcher and clears its dirty flag.
	pub fn evaluate(&self) {
		if let Some(value) = self.get() {
			*self.body.value.borrow_mut() = value;
		}
		self.body.dirty.set(false);
	}

	/// Subscribes the active context to every registry this watcher
	/// depends on.
	pub fn depend(&self) {
		let deps: DepList = self.body.deps.borrow().current().iter().cloned().collect();
		for dep in deps {
			dep.depend();
		}
	}

	/// Unsubscribes from every registry. Idempotent.
	pub fn teardown(&self) {
		if !self.body.active.replace(false) {
			return;
		}

		let deps = self.body.deps.borrow_mut().drain();
		for dep in deps {
			dep.remove_sub(self.body.id);
		}
	}

	pub(crate) fn before(&self) {
		if let Some(before) = &self.body.before {
			before()
		}
	}

	pub(crate) fn after(&self) {
		if let Some(after) = &self.body.after {
			after()
		}
	}
}

impl Debug for Watcher {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Watcher")
			.field("id", &self.body.id)
			.field("expression", &self.body.expression)
			.field("dirty", &self.is_dirty())
			.field("active", &self.is_active())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_simple_paths() {
		let segments = parse_path("user.tags.0").unwrap();
		let expected: Vec<Rc<str>> = vec!["user".into(), "tags".into(), "0".into()];
		assert_eq!(segments, expected);
		assert!(parse_path("user[0]").is_none());
		assert!(parse_path("a + b").is_none());
	}
}
