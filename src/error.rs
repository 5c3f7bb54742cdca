use thiserror::Error;

use crate::config;

#[derive(Debug, Error)]
pub enum ReactiveError {
	/// An evaluator failed. The watcher keeps its previous value.
	#[error("error in {label}: {source}")]
	Evaluator {
		label: String,
		#[source]
		source: anyhow::Error,
	},

	#[error("error in {label}: {source}")]
	Callback {
		label: String,
		#[source]
		source: anyhow::Error,
	},

	/// A watcher kept re-queueing itself inside one flush.
	#[error("you may have an infinite update loop in {watcher} (re-queued {count} times)")]
	InfiniteUpdateLoop { watcher: String, count: usize },

	#[error("error in next tick callback: {0}")]
	Tick(#[source] anyhow::Error),
}

impl ReactiveError {
	pub fn label(&self) -> &str {
		match self {
			ReactiveError::Evaluator { label, .. } | ReactiveError::Callback { label, .. } => label,
			ReactiveError::InfiniteUpdateLoop { watcher, .. } => watcher,
			ReactiveError::Tick(_) => "nextTick",
		}
	}
}

/// Routes an error to the configured handler, or logs it.
pub fn handle_error(error: ReactiveError) {
	match config::error_handler() {
		Some(handler) => handler(&error),
		None => tracing::error!(label = error.label(), "{}", error),
	}
}
