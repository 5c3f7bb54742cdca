use fxhash::FxHashSet;
use smallvec::SmallVec;

use crate::dep::Dep;

pub(crate) type DepList = SmallVec<[Dep; 4]>;

/// The registries a watcher is subscribed to, plus the ones collected
/// by the evaluation currently in progress.
#[derive(Default)]
pub(crate) struct Dependencies {
	current: DepList,
	current_ids: FxHashSet<u64>,
	next: DepList,
	next_ids: FxHashSet<u64>,
}

impl Dependencies {
	pub fn new() -> Self {
		Self::default()
	}

	/// Records `dep` for the running evaluation. Returns `true` when the
	/// watcher is not subscribed to it yet.
	pub fn based_on(&mut self, dep: &Dep) -> bool {
		let id = dep.id();
		if !self.next_ids.insert(id) {
			return false;
		}

		self.next.push(dep.clone());
		!self.current_ids.contains(&id)
	}

	/// Promotes the collected set to current and returns the registries
	/// that were not touched by the last evaluation.
	pub fn swap(&mut self) -> DepList {
		let prev = std::mem::take(&mut self.current);

		// Diff the keys
		let stale = prev
			.into_iter()
			.filter(|dep| !self.next_ids.contains(&dep.id()))
			.collect();

		self.current = std::mem::take(&mut self.next);
		self.current_ids = std::mem::take(&mut self.next_ids);

		stale
	}

	pub fn current(&self) -> &[Dep] {
		&self.current
	}

	pub fn drain(&mut self) -> DepList {
		self.current_ids.clear();
		self.next_ids.clear();
		self.next.clear();
		std::mem::take(&mut self.current)
	}
}
