//! Fine-grained reactivity for plain data.
//!
//! [`observe`] turns objects and arrays into observed state. Watchers
//! read that state, which subscribes them to the slots they touched, and
//! every write re-runs the stale watchers: lazily on the next read for
//! [`Computed`] values, immediately for `sync` watchers, and otherwise
//! once per watcher on the next [`tick`], in creation order.

pub mod config;
pub mod macros;

mod array;
mod computed;
mod dep;
mod dependencies;
mod error;
mod evaluation;
mod microtask;
mod object;
mod observer;
mod scheduler;
mod traverse;
mod value;
mod watch;
mod watcher;

#[doc(hidden)]
pub use anyhow;

pub use array::Array;
pub use computed::Computed;
pub use dep::Dep;
pub use error::{handle_error, ReactiveError};
pub use evaluation::{current_target, has_target, push_target, untracked, Evaluation};
pub use microtask::{is_tick_pending, next_tick, run_until_idle, tick};
pub use object::Object;
pub use observer::{
	define_reactive, observe, observe_root, remove, set, should_observe, toggle_observing,
	without_observing, Observer,
};
pub use scheduler::{after_flush, has_pending, is_flushing, queue_watcher};
pub use traverse::traverse;
pub use value::{Key, Opaque, Value};
pub use watch::{watch, Unwatch, WatchOptions};
pub use watcher::{Callback, Evaluator, Getter, Hook, Watcher, WatcherId, WatcherOptions};
