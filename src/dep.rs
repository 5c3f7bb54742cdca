use std::cell::{Cell, RefCell};
use std::fmt::Debug;
use std::rc::{Rc, Weak};

use crate::config;
use crate::evaluation::current_target;
use crate::watcher::{Watcher, WatcherBody, WatcherId};

thread_local! {
	static NEXT_ID: Cell<u64> = Cell::new(0);
}

/// The subscription registry of one observable slot.
#[derive(Clone)]
pub struct Dep {
	body: Rc<DepBody>,
}

struct DepBody {
	id: u64,
	subs: RefCell<Vec<(WatcherId, Weak<WatcherBody>)>>,
}

impl Default for Dep {
	fn default() -> Self {
		Dep::new()
	}
}

impl Dep {
	pub fn new() -> Self {
		let id = NEXT_ID.with(|next| {
			let id = next.get();
			next.set(id + 1);
			id
		});

		Dep {
			body: Rc::new(DepBody {
				id,
				subs: RefCell::new(Vec::new()),
			}),
		}
	}

	pub fn id(&self) -> u64 {
		self.body.id
	}

	pub fn subscriber_count(&self) -> usize {
		self.body
			.subs
			.borrow()
			.iter()
			.filter(|(_, sub)| sub.strong_count() > 0)
			.count()
	}

	pub(crate) fn add_sub(&self, watcher: &Watcher) {
		self.body
			.subs
			.borrow_mut()
			.push((watcher.id(), watcher.downgrade()));
	}

	pub(crate) fn remove_sub(&self, id: WatcherId) {
		self.body.subs.borrow_mut().retain(|(sub, _)| *sub != id);
	}

	/// Subscribes the active evaluation context, if there is one.
	pub fn depend(&self) {
		if let Some(target) = current_target() {
			target.add_dep(self);
		}
	}

	/// Hands every current subscriber its update. Subscribers are taken
	/// from a snapshot, so re-subscription during the call cannot deliver
	/// a second notification.
	pub fn notify(&self) {
		let mut subs: Vec<Watcher> = {
			let mut subs = self.body.subs.borrow_mut();
			subs.retain(|(_, sub)| sub.strong_count() > 0);
			subs.iter()
				.filter_map(|(_, sub)| sub.upgrade())
				.map(Watcher::from_body)
				.collect()
		};

		if !config::async_flush() {
			// Without the scheduler's sort, keep creation order here.
			subs.sort_by_key(|sub| sub.id());
		}

		for sub in subs {
			sub.update();
		}
	}
}

impl PartialEq for Dep {
	fn eq(&self, other: &Self) -> bool {
		self.body.id == other.body.id
	}
}

impl Eq for Dep {}

impl Debug for Dep {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Dep")
			.field("id", &self.body.id)
			.field("subs", &self.body.subs.borrow().len())
			.finish()
	}
}
