use fxhash::FxHashSet;

use crate::value::Value;

/// Reads every nested key of `value` through its accessors, so the
/// active watcher depends on all of them.
///
/// Frozen containers and opaque leaves are skipped. Observed containers
/// are visited once per call, keyed by their observer's registry id.
pub fn traverse(value: &Value) {
	let mut seen = FxHashSet::default();
	visit(value, &mut seen);
}

fn visit(value: &Value, seen: &mut FxHashSet<u64>) {
	match value {
		Value::Array(array) => {
			if array.is_frozen() {
				return;
			}

			if let Some(observer) = array.observer() {
				if !seen.insert(observer.dep().id()) {
					return;
				}
			}

			for item in array.to_vec().iter().rev() {
				visit(item, seen);
			}
		}
		Value::Object(object) => {
			if object.is_frozen() {
				return;
			}

			if let Some(observer) = object.observer() {
				if !seen.insert(observer.dep().id()) {
					return;
				}
			}

			for key in object.keys().iter().rev() {
				visit(&object.get(key), seen);
			}
		}
		_ => {}
	}
}
