use std::cell::{Cell, RefCell};

use crate::error::{handle_error, ReactiveError};

type Task = Box<dyn FnOnce() -> anyhow::Result<()>>;

thread_local! {
	static CALLBACKS: RefCell<Vec<Task>> = RefCell::new(Vec::new());
	static PENDING: Cell<bool> = Cell::new(false);
}

#[cfg(target_arch = "wasm32")]
mod host {
	use wasm_bindgen::prelude::*;

	#[wasm_bindgen]
	extern "C" {
		#[wasm_bindgen(js_name = queueMicrotask)]
		fn queue_microtask(closure: &JsValue);
	}

	pub fn schedule() {
		queue_microtask(&Closure::once_into_js(|| {
			super::tick();
		}));
	}
}

#[cfg(not(target_arch = "wasm32"))]
mod host {
	/// The host drives the queue with [`tick`](super::tick).
	pub fn schedule() {}
}

/// Queues `func` to run on the next tick.
pub fn next_tick(func: impl FnOnce() -> anyhow::Result<()> + 'static) {
	CALLBACKS.with(|c| c.borrow_mut().push(Box::new(func)));
	if !PENDING.with(|p| p.replace(true)) {
		host::schedule();
	}
}

/// Runs the callbacks queued so far. Callbacks queued while they run
/// wait for the next tick. Returns whether anything ran.
pub fn tick() -> bool {
	let callbacks = CALLBACKS.with(|c| std::mem::take(&mut *c.borrow_mut()));
	PENDING.with(|p| p.set(false));

	if callbacks.is_empty() {
		return false;
	}

	for callback in callbacks {
		if let Err(error) = callback() {
			handle_error(ReactiveError::Tick(error));
		}
	}

	true
}

/// Ticks until nothing is queued.
pub fn run_until_idle() {
	while tick() {}
}

pub fn is_tick_pending() -> bool {
	PENDING.with(|p| p.get())
}
