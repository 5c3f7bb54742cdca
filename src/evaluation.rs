use std::cell::RefCell;

use crate::watcher::Watcher;

thread_local! {
	static TARGET_STACK: RefCell<Vec<Option<Watcher>>> = RefCell::new(Vec::new());
}

/// Scope of one evaluation. While it is alive, observed reads subscribe
/// the pushed watcher. Dropping it pops exactly what was pushed, also
/// when the evaluator unwinds.
#[must_use]
pub struct Evaluation {
	depth: usize,
}

impl Drop for Evaluation {
	fn drop(&mut self) {
		// Released after the borrow, it may hold the last handle.
		let _popped = TARGET_STACK.with(|stack| {
			let mut stack = stack.borrow_mut();
			debug_assert_eq!(stack.len(), self.depth, "evaluation scopes must be strictly nested");
			stack.pop()
		});
	}
}

/// Makes `target` the active context. `None` suspends tracking.
pub fn push_target(target: Option<Watcher>) -> Evaluation {
	TARGET_STACK.with(|stack| {
		let mut stack = stack.borrow_mut();
		stack.push(target);
		Evaluation { depth: stack.len() }
	})
}

pub fn current_target() -> Option<Watcher> {
	TARGET_STACK.with(|stack| stack.borrow().last().cloned().flatten())
}

pub fn has_target() -> bool {
	TARGET_STACK.with(|stack| matches!(stack.borrow().last(), Some(Some(_))))
}

/// Runs `func` without registering any dependency.
pub fn untracked<R>(func: impl FnOnce() -> R) -> R {
	let _evaluation = push_target(None);
	func()
}
