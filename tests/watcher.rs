use std::cell::{Cell, RefCell};
use std::rc::Rc;

use watchful::{
	computed, config, has_target, observe, render, tick, untracked, watch, Array, Computed, Evaluator,
	Object, ReactiveError, Value, WatchOptions,
};


use mock::Spy;

fn observed(object: Object) -> Object {
	observe(&Value::from(object.clone()));
	object
}

#[test]
fn stale_dependencies_are_dropped() {
	let state = observed(Object::from_iter([
		("flag", Value::from(true)),
		("a", Value::from(1)),
		("b", Value::from(2)),
	]));
	let runs = Rc::new(Cell::new(0));

	let watcher = render!("branch", (state, runs) => {
		runs.set(runs.get() + 1);
		if state.get("flag") == Value::Bool(true) {
			state.get("a")
		} else {
			state.get("b")
		}
	});

	assert_eq!(state.dep("a").unwrap().subscriber_count(), 1);
	assert_eq!(state.dep("b").unwrap().subscriber_count(), 0);

	state.set("flag", false);
	tick();
	assert_eq!(runs.get(), 2);
	assert_eq!(watcher.value(), Value::from(2));
	assert_eq!(state.dep("a").unwrap().subscriber_count(), 0);
	assert_eq!(state.dep("b").unwrap().subscriber_count(), 1);

	state.set("a", 10);
	tick();
	assert_eq!(runs.get(), 2);
}

#[test]
fn dropping_a_watcher_unsubscribes_it() {
	let state = observed(Object::from_iter([("a", 1)]));

	let watcher = render!("a", (state) => state.get("a"));
	assert_eq!(state.dep("a").unwrap().subscriber_count(), 1);

	drop(watcher);
	assert_eq!(state.dep("a").unwrap().subscriber_count(), 0);

	state.set("a", 2);
	assert!(!tick());
}

#[test]
fn dropping_the_unwatch_handle_cancels_a_queued_callback() {
	let state = observed(Object::from_iter([("a", 1)]));
	let calls = Rc::new(Cell::new(0));

	let unwatch = watch(
		Evaluator::path(Value::from(state.clone()), "a"),
		{
			let calls = calls.clone();
			move |_, _| {
				calls.set(calls.get() + 1);
				Ok(())
			}
		},
		WatchOptions::default(),
	);
	let watcher = unwatch.watcher().clone();

	state.set("a", 2);
	drop(unwatch);
	tick();

	assert_eq!(calls.get(), 0);
	assert!(!watcher.is_active());
	assert_eq!(state.dep("a").unwrap().subscriber_count(), 0);
}

#[test]
fn watchers_dropped_while_queued_are_skipped() {
	let state = observed(Object::from_iter([("a", 1)]));
	let runs = Rc::new(Cell::new(0));

	let watcher = render!("a", (state, runs) => {
		runs.set(runs.get() + 1);
		state.get("a")
	});

	state.set("a", 2);
	drop(watcher);
	assert!(tick());

	assert_eq!(runs.get(), 1);
}

#[test]
fn path_evaluators_resolve_through_objects_and_arrays() {
	let tags = Array::from_iter(["a", "b"]);
	let user = Object::from_iter([("tags", Value::from(tags.clone()))]);
	let state = observed(Object::from_iter([("user", Value::from(user))]));
	let context = Value::from(state.clone());

	let first = Computed::from_evaluator(Evaluator::path(context.clone(), "user.tags.0"));
	let count = Computed::from_evaluator(Evaluator::path(context.clone(), "user.tags.length"));
	let missing = Computed::from_evaluator(Evaluator::path(context.clone(), "user.name.first"));
	let invalid = Computed::from_evaluator(Evaluator::path(context, "user[0]"));

	assert_eq!(first.get(), Value::from("a"));
	assert_eq!(count.get(), Value::from(2));
	assert_eq!(missing.get(), Value::Undefined);
	assert_eq!(invalid.get(), Value::Undefined);

	tags.unshift("z");
	assert_eq!(first.get(), Value::from("z"));
	assert_eq!(count.get(), Value::from(3));
}

#[test]
fn renders_depend_on_what_computed_values_read() {
	let state = observed(Object::from_iter([("price", 2), ("quantity", 3)]));
	let mock = mock::SharedMock::new();

	let total = computed!("total", (state) => {
		state.get("price").as_number().unwrap_or(0.0) * state.get("quantity").as_number().unwrap_or(0.0)
	});

	mock.get().expect_trigger().with(mockall::predicate::eq(6.0)).times(1).return_const(());

	let _render = render!("summary", (total, mock) => {
		mock.get().trigger(total.get().as_number().unwrap_or(0.0));
	});

	mock.get().checkpoint();

	mock.get().expect_trigger().with(mockall::predicate::eq(12.0)).times(1).return_const(());

	state.set("quantity", 6);
	tick();

	mock.get().checkpoint();
}

#[test]
fn untracked_reads_register_nothing() {
	let state = observed(Object::from_iter([("a", 1), ("b", 2)]));

	let watcher = render!("a only", (state) => {
		assert!(has_target());
		let b = untracked(|| {
			assert!(!has_target());
			state.get("b")
		});
		state.get("a").as_number().unwrap_or(0.0) + b.as_number().unwrap_or(0.0)
	});

	assert_eq!(watcher.dependency_count(), 1);
	assert_eq!(state.dep("b").unwrap().subscriber_count(), 0);
	assert!(!has_target());
}

#[test]
fn watch_reports_new_and_old_values() {
	let state = observed(Object::from_iter([("count", 0)]));
	let calls: Rc<RefCell<Vec<(Value, Value)>>> = Rc::new(RefCell::new(Vec::new()));

	let unwatch = watch(
		Evaluator::path(Value::from(state.clone()), "count"),
		{
			let calls = calls.clone();
			move |new, old| {
				calls.borrow_mut().push((new.clone(), old.clone()));
				Ok(())
			}
		},
		WatchOptions {
			immediate: true,
			..Default::default()
		},
	);

	assert_eq!(*calls.borrow(), vec![(Value::from(0), Value::Undefined)]);

	state.set("count", 1);
	tick();
	assert_eq!(calls.borrow().last().unwrap(), &(Value::from(1), Value::from(0)));

	unwatch.unwatch();
	state.set("count", 2);
	tick();
	assert_eq!(calls.borrow().len(), 2);
}

#[test]
fn sync_watch_fires_inside_the_write() {
	let state = observed(Object::from_iter([("count", 0)]));
	let seen = Rc::new(Cell::new(0.0));

	let _unwatch = watch(
		Evaluator::path(Value::from(state.clone()), "count"),
		{
			let seen = seen.clone();
			move |new, _| {
				seen.set(new.as_number().unwrap_or(0.0));
				Ok(())
			}
		},
		WatchOptions {
			sync: true,
			..Default::default()
		},
	);

	state.set("count", 7);
	assert_eq!(seen.get(), 7.0);
}

#[test]
fn user_errors_are_labelled() {
	let labels = Rc::new(RefCell::new(Vec::new()));
	config::set_error_handler({
		let labels = labels.clone();
		move |error: &ReactiveError| labels.borrow_mut().push(error.label().to_string())
	});

	let state = observed(Object::from_iter([("count", 0)]));

	let _failing_callback = watch(
		Evaluator::path(Value::from(state.clone()), "count"),
		|_, _| Err(anyhow::anyhow!("callback failed")),
		WatchOptions {
			immediate: true,
			..Default::default()
		},
	);

	let _failing_getter = watch(
		Evaluator::new(|| Err(anyhow::anyhow!("getter failed"))).named("broken"),
		|_, _| Ok(()),
		WatchOptions::default(),
	);

	let failing_computed = Computed::new("ratio", || Err(anyhow::anyhow!("division failed")));
	assert_eq!(failing_computed.get(), Value::Undefined);

	state.set("count", 1);
	tick();

	assert_eq!(
		*labels.borrow(),
		vec![
			"callback for immediate watcher \"count\"",
			"getter for watcher \"broken\"",
			"computed property \"ratio\"",
			"callback for watcher \"count\"",
		]
	);

	config::reset();
}
