use std::fmt::Debug;

use crate::evaluation::has_target;
use crate::value::Value;
use crate::watcher::{Evaluator, Watcher, WatcherOptions};

/// A cached derived value.
///
/// The evaluator does not run until the first read. Notifications only
/// mark it dirty, and the next read re-evaluates once. Reading it inside
/// another evaluation also subscribes the reader to everything the
/// computed value depends on.
#[derive(Clone)]
pub struct Computed {
	watcher: Watcher,
}

impl Computed {
	pub fn new(name: &str, func: impl Fn() -> anyhow::Result<Value> + 'static) -> Self {
		Computed::from_evaluator(Evaluator::new(func).named(name))
	}

	pub fn from_evaluator(evaluator: Evaluator) -> Self {
		Computed {
			watcher: Watcher::new(
				evaluator,
				None,
				WatcherOptions {
					lazy: true,
					..Default::default()
				},
			),
		}
	}

	pub fn get(&self) -> Value {
		if self.watcher.is_dirty() {
			self.watcher.evaluate();
		}

		if has_target() {
			self.watcher.depend();
		}

		self.watcher.value()
	}

	pub fn watcher(&self) -> &Watcher {
		&self.watcher
	}
}

impl Debug for Computed {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_tuple("Computed").field(&self.watcher).finish()
	}
}
