use crate::evaluation::untracked;
use crate::value::Value;
use crate::watcher::{Evaluator, Watcher, WatcherOptions};

#[derive(Debug, Default, Clone, Copy)]
pub struct WatchOptions {
	pub deep: bool,
	/// Invoke the callback once with the current value right away.
	pub immediate: bool,
	pub sync: bool,
}

/// Keeps a user watcher alive. Call [`Unwatch::unwatch`] to stop it;
/// dropping the handle stops it as well, even when other clones of the
/// watcher are still around.
#[must_use = "the watcher stops when this handle is dropped"]
#[derive(Debug)]
pub struct Unwatch {
	watcher: Watcher,
}

impl Unwatch {
	pub fn unwatch(self) {
		self.watcher.teardown();
	}

	pub fn watcher(&self) -> &Watcher {
		&self.watcher
	}
}

impl Drop for Unwatch {
	fn drop(&mut self) {
		self.watcher.teardown();
	}
}

/// Calls `callback(new, old)` whenever the value of `evaluator` changes.
pub fn watch(
	evaluator: Evaluator,
	callback: impl Fn(&Value, &Value) -> anyhow::Result<()> + 'static,
	options: WatchOptions,
) -> Unwatch {
	let watcher = Watcher::new(
		evaluator,
		Some(Box::new(callback)),
		WatcherOptions {
			deep: options.deep,
			sync: options.sync,
			user: true,
			..Default::default()
		},
	);

	if options.immediate {
		untracked(|| watcher.invoke_callback(&watcher.value(), &Value::Undefined, true));
	}

	Unwatch { watcher }
}
