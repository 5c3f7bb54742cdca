use std::cell::RefCell;
use std::rc::Weak;

use fxhash::{FxHashMap, FxHashSet};
use tracing::{debug, trace};

use crate::config;
use crate::error::{handle_error, ReactiveError};
use crate::microtask::next_tick;
use crate::watcher::{Watcher, WatcherBody, WatcherId};

type PostFlush = Box<dyn FnOnce()>;

/// A pending watcher. The queue does not keep watchers alive: one
/// dropped before the flush is skipped.
#[derive(Clone)]
struct Queued {
	id: WatcherId,
	watcher: Weak<WatcherBody>,
}

impl Queued {
	fn upgrade(&self) -> Option<Watcher> {
		self.watcher.upgrade().map(Watcher::from_body)
	}
}

#[derive(Default)]
struct Scheduler {
	queue: Vec<Queued>,
	has: FxHashSet<WatcherId>,
	circular: FxHashMap<WatcherId, usize>,
	post_flush: Vec<PostFlush>,
	waiting: bool,
	flushing: bool,
	index: usize,
}

thread_local! {
	static SCHEDULER: RefCell<Scheduler> = RefCell::new(Scheduler::default());
}

fn with<R>(func: impl FnOnce(&mut Scheduler) -> R) -> R {
	SCHEDULER.with(|s| func(&mut s.borrow_mut()))
}

/// Queues `watcher` for the next flush. A watcher already pending is
/// not queued twice. During a flush the watcher is inserted by id, so
/// it still runs in this flush when its id is past the cursor.
pub fn queue_watcher(watcher: &Watcher) {
	let id = watcher.id();

	let schedule = with(|s| {
		if !s.has.insert(id) {
			return false;
		}

		let queued = Queued {
			id,
			watcher: watcher.downgrade(),
		};

		if !s.flushing {
			s.queue.push(queued);
		} else {
			let mut at = s.queue.len();
			while at > s.index + 1 && s.queue[at - 1].id > id {
				at -= 1;
			}
			s.queue.insert(at, queued);
		}

		trace!(id, "watcher queued");
		!std::mem::replace(&mut s.waiting, true)
	});

	if schedule {
		schedule_flush();
	}
}

/// Registers `func` to run once after the next flush drains.
pub fn after_flush(func: impl FnOnce() + 'static) {
	let schedule = with(|s| {
		s.post_flush.push(Box::new(func));
		!std::mem::replace(&mut s.waiting, true)
	});

	if schedule {
		schedule_flush();
	}
}

pub fn is_flushing() -> bool {
	with(|s| s.flushing)
}

pub fn has_pending() -> bool {
	with(|s| s.waiting)
}

fn schedule_flush() {
	if config::async_flush() {
		next_tick(|| {
			flush_scheduler_queue();
			Ok(())
		});
	} else {
		flush_scheduler_queue();
	}
}

/// Puts the scheduler back to idle if a watcher panics mid-flush.
struct ResetOnUnwind;

impl Drop for ResetOnUnwind {
	fn drop(&mut self) {
		if std::thread::panicking() {
			let _ = SCHEDULER.try_with(|s| {
				if let Ok(mut s) = s.try_borrow_mut() {
					*s = Scheduler::default();
				}
			});
		}
	}
}

fn flush_scheduler_queue() {
	let _reset = ResetOnUnwind;
	let max_update_count = config::max_update_count();

	let len = with(|s| {
		s.flushing = true;
		s.index = 0;
		// Parents are created before their children, so ascending ids
		// update parents first.
		s.queue.sort_by_key(|queued| queued.id);
		s.queue.len()
	});
	debug!(len, "flushing watchers");

	let mut aborted = false;
	loop {
		let Some(queued) = with(|s| s.queue.get(s.index).cloned()) else {
			break;
		};

		let id = queued.id;
		let Some(watcher) = queued.upgrade() else {
			with(|s| {
				s.has.remove(&id);
				s.index += 1;
			});
			continue;
		};

		watcher.before();
		with(|s| s.has.remove(&id));
		watcher.run();

		let runaway = with(|s| {
			if !s.has.contains(&id) {
				return None;
			}

			let count = s.circular.entry(id).or_insert(0);
			*count += 1;
			(*count > max_update_count).then_some(*count)
		});

		if let Some(count) = runaway {
			handle_error(ReactiveError::InfiniteUpdateLoop {
				watcher: watcher.label(),
				count,
			});
			aborted = true;
			break;
		}

		with(|s| s.index += 1);
	}

	let (flushed, post_flush) = with(|s| {
		let mut flushed = std::mem::take(&mut s.queue);
		if aborted {
			// Only what ran up to the runaway watcher gets its hook.
			flushed.truncate(s.index + 1);
		}
		let post_flush = std::mem::take(&mut s.post_flush);
		s.has.clear();
		s.circular.clear();
		s.index = 0;
		s.waiting = false;
		s.flushing = false;
		(flushed, post_flush)
	});
	debug!(ran = flushed.len(), "watchers flushed");

	for watcher in flushed.iter().rev().filter_map(Queued::upgrade) {
		if watcher.is_active() {
			watcher.after();
		}
	}

	for func in post_flush {
		func();
	}
}
