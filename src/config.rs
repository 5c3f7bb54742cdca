use std::cell::RefCell;
use std::rc::Rc;

use crate::error::ReactiveError;

pub type ErrorHandler = Rc<dyn Fn(&ReactiveError)>;

pub const MAX_UPDATE_COUNT: usize = 100;

#[derive(Clone)]
pub struct Config {
	/// When `false`, queued watchers are flushed synchronously
	/// instead of on the next tick.
	pub async_flush: bool,

	/// How many times one watcher may be re-queued during a single
	/// flush before the flush is aborted.
	pub max_update_count: usize,

	pub error_handler: Option<ErrorHandler>,
}

impl Default for Config {
	fn default() -> Self {
		Config {
			async_flush: true,
			max_update_count: MAX_UPDATE_COUNT,
			error_handler: None,
		}
	}
}

thread_local! {
	static CONFIG: RefCell<Config> = RefCell::new(Config::default());
}

pub fn configure(func: impl FnOnce(&mut Config)) {
	CONFIG.with(|c| func(&mut c.borrow_mut()))
}

pub fn reset() {
	CONFIG.with(|c| *c.borrow_mut() = Config::default())
}

pub fn set_error_handler(handler: impl Fn(&ReactiveError) + 'static) {
	configure(|c| c.error_handler = Some(Rc::new(handler)))
}

pub(crate) fn async_flush() -> bool {
	CONFIG.with(|c| c.borrow().async_flush)
}

pub(crate) fn max_update_count() -> usize {
	CONFIG.with(|c| c.borrow().max_update_count)
}

pub(crate) fn error_handler() -> Option<ErrorHandler> {
	CONFIG.with(|c| c.borrow().error_handler.clone())
}
