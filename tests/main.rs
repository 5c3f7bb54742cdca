use std::cell::{Cell, RefCell};
use std::rc::Rc;

use mockall::predicate::eq;
use watchful::{
	config, observe, render, tick, watch, Array, Computed, Evaluator, Object, ReactiveError, Value,
	WatchOptions,
};


use mock::Spy;

fn observed(object: &Object) -> Object {
	observe(&Value::from(object.clone()));
	object.clone()
}

fn number(value: Value) -> f64 {
	value.as_number().unwrap_or(f64::NAN)
}

#[test]
fn observe_is_idempotent() {
	let value = Value::from(Object::from_iter([("a", 1)]));
	let first = observe(&value).unwrap();
	let second = observe(&value).unwrap();
	assert!(first.ptr_eq(&second));

	let list = Value::from(Array::from_iter([1, 2, 3]));
	assert!(observe(&list).unwrap().ptr_eq(&observe(&list).unwrap()));
}

#[test]
fn repeated_reads_subscribe_once() {
	let state = observed(&Object::from_iter([("a", 1)]));

	let watcher = render!("reads a twice", (state) => {
		state.get("a");
		state.get("a");
	});

	assert_eq!(state.dep("a").unwrap().subscriber_count(), 1);
	assert_eq!(watcher.dependency_count(), 1);

	state.set("a", 2);
	tick();
	assert_eq!(state.dep("a").unwrap().subscriber_count(), 1);
}

#[test]
fn writes_are_batched_until_the_next_tick() {
	let state = observed(&Object::from_iter([("a", 1)]));
	let mock = mock::SharedMock::new();

	mock.get().expect_trigger().with(eq(1.0)).times(1).return_const(());

	let _render = render!("a", (state, mock) => {
		mock.get().trigger(number(state.get("a")));
	});

	mock.get().checkpoint();

	mock.get().expect_trigger().times(0).return_const(());

	state.set("a", 1);
	tick();

	mock.get().checkpoint();

	mock.get().expect_trigger().with(eq(4.0)).times(1).return_const(());

	state.set("a", 2);
	state.set("a", 3);
	state.set("a", 4);
	tick();

	mock.get().checkpoint();
}

#[test]
fn array_push_notifies_once_and_observes_the_new_element() {
	let list = Array::from_iter([1, 2, 3]);
	let state = observed(&Object::from_iter([("list", Value::from(list.clone()))]));
	let runs = Rc::new(Cell::new(0));

	let _render = render!("list", (state, runs) => {
		runs.set(runs.get() + 1);
		state.get("list");
	});

	let item = Object::from_iter([("done", false)]);
	list.push(item.clone());
	assert!(item.observer().is_some());
	assert!(item.is_reactive("done"));

	tick();
	assert_eq!(runs.get(), 2);
	assert_eq!(list.len(), 4);
}

#[test]
fn computed_is_lazy_and_cached() {
	let state = observed(&Object::from_iter([("a", 1)]));
	let calls = Rc::new(Cell::new(0));

	let doubled = Computed::new("doubled", {
		let state = state.clone();
		let calls = calls.clone();
		move || {
			calls.set(calls.get() + 1);
			Ok(Value::from(number(state.get("a")) * 2.0))
		}
	});

	assert_eq!(calls.get(), 0);
	assert_eq!(doubled.get(), Value::from(2.0));
	assert_eq!(doubled.get(), Value::from(2.0));
	assert_eq!(calls.get(), 1);

	state.set("a", 5);
	assert_eq!(calls.get(), 1);
	assert!(doubled.watcher().is_dirty());

	assert_eq!(doubled.get(), Value::from(10.0));
	assert_eq!(calls.get(), 2);
}

#[test]
fn teardown_stops_all_further_runs() {
	let state = observed(&Object::from_iter([("a", 1), ("b", 1)]));
	let runs = Rc::new(Cell::new(0));

	let watcher = render!("a and b", (state, runs) => {
		runs.set(runs.get() + 1);
		number(state.get("a")) + number(state.get("b"))
	});

	watcher.teardown();
	watcher.teardown();

	state.set("a", 2);
	state.set("b", 2);
	tick();

	assert_eq!(runs.get(), 1);
	assert!(!watcher.is_active());
	assert_eq!(state.dep("a").unwrap().subscriber_count(), 0);
}

#[test]
fn deep_watch_sees_nested_writes() {
	let inner = Object::from_iter([("y", 1)]);
	let state = observed(&Object::from_iter([("x", Value::from(inner.clone()))]));
	let deep_calls = Rc::new(Cell::new(0));
	let shallow_calls = Rc::new(Cell::new(0));

	let _deep = watch(
		Evaluator::path(state.clone().into(), "x"),
		{
			let deep_calls = deep_calls.clone();
			move |_, _| {
				deep_calls.set(deep_calls.get() + 1);
				Ok(())
			}
		},
		WatchOptions {
			deep: true,
			..Default::default()
		},
	);

	let _shallow = watch(
		Evaluator::path(state.clone().into(), "x"),
		{
			let shallow_calls = shallow_calls.clone();
			move |_, _| {
				shallow_calls.set(shallow_calls.get() + 1);
				Ok(())
			}
		},
		WatchOptions::default(),
	);

	inner.set("y", 2);
	tick();

	assert_eq!(deep_calls.get(), 1);
	assert_eq!(shallow_calls.get(), 0);
}

#[test]
fn runaway_watcher_aborts_the_flush() {
	let reports = Rc::new(RefCell::new(Vec::new()));
	config::set_error_handler({
		let reports = reports.clone();
		move |error| {
			if let ReactiveError::InfiniteUpdateLoop { watcher, .. } = error {
				reports.borrow_mut().push(watcher.clone());
			}
		}
	});

	let state = observed(&Object::from_iter([("a", 0)]));
	let runs = Rc::new(Cell::new(0));

	let _render = render!("runaway", (state, runs) => {
		runs.set(runs.get() + 1);
		let next = number(state.get("a")) + 1.0;
		state.set("a", next);
	});

	tick();

	assert_eq!(*reports.borrow(), vec!["render watcher \"runaway\"".to_string()]);
	assert_eq!(runs.get(), 1 + config::MAX_UPDATE_COUNT + 1);
	assert!(!tick());

	config::reset();
}

#[test]
fn runaway_limit_is_configurable() {
	let counts = Rc::new(RefCell::new(Vec::new()));
	config::configure(|c| {
		c.max_update_count = 3;
		c.error_handler = Some(Rc::new({
			let counts = counts.clone();
			move |error: &ReactiveError| {
				if let ReactiveError::InfiniteUpdateLoop { count, .. } = error {
					counts.borrow_mut().push(*count);
				}
			}
		}));
	});

	let state = observed(&Object::from_iter([("a", 0)]));
	let runs = Rc::new(Cell::new(0));

	let _render = render!("runaway", (state, runs) => {
		runs.set(runs.get() + 1);
		let next = number(state.get("a")) + 1.0;
		state.set("a", next);
	});

	tick();

	assert_eq!(*counts.borrow(), vec![4]);
	assert_eq!(runs.get(), 1 + 3 + 1);

	config::reset();
}
