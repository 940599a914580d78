//! Navigation state store.
//!
//! The store is owned by the router and written only by the pipeline.
//! Readers get [`NavigationState`] snapshots by value.

use crate::pattern::RouteParams;
use crate::query::QueryParams;
use std::cell::{Cell, RefCell};

/// Phase of the navigation pipeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NavigationPhase {
	/// No run in progress, or the last run halted or failed.
	#[default]
	Idle,
	/// Running middleware and resolving the route.
	Resolving,
	/// Awaiting the guard.
	Guarded,
	/// Awaiting the enter hook.
	Entering,
	/// The last run rendered.
	Rendered,
}

/// Snapshot of the router's navigation state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavigationState {
	/// Path of the latest navigation, without the query.
	pub current_path: Option<String>,
	/// Path that was current before it.
	pub previous_path: Option<String>,
	/// Parameters of the resolved route.
	pub params: RouteParams,
	/// Parsed query of the latest navigation.
	pub query: QueryParams,
}

#[derive(Debug, Default)]
pub(crate) struct StateStore {
	state: RefCell<NavigationState>,
	phase: Cell<NavigationPhase>,
	/// Pattern of the route that was last rendered.
	active: RefCell<Option<String>>,
	sequence: Cell<u64>,
}

impl StateStore {
	pub(crate) fn snapshot(&self) -> NavigationState {
		self.state.borrow().clone()
	}

	/// Moves current to previous and records the new target.
	///
	/// Returns the previous path.
	pub(crate) fn begin(&self, path: &str, query: QueryParams) -> Option<String> {
		let mut state = self.state.borrow_mut();
		state.previous_path = state.current_path.take();
		state.current_path = Some(path.to_string());
		state.query = query;
		state.previous_path.clone()
	}

	pub(crate) fn set_params(&self, params: RouteParams) {
		self.state.borrow_mut().params = params;
	}

	pub(crate) fn phase(&self) -> NavigationPhase {
		self.phase.get()
	}

	pub(crate) fn set_phase(&self, phase: NavigationPhase) {
		tracing::debug!(?phase, "navigation phase");
		self.phase.set(phase);
	}

	pub(crate) fn active(&self) -> Option<String> {
		self.active.borrow().clone()
	}

	/// Clears the active route, returning its pattern.
	pub(crate) fn take_active(&self) -> Option<String> {
		self.active.borrow_mut().take()
	}

	pub(crate) fn set_active(&self, pattern: &str) {
		*self.active.borrow_mut() = Some(pattern.to_string());
	}

	/// Starts a new pipeline run and returns its sequence number.
	pub(crate) fn next_sequence(&self) -> u64 {
		let next = self.sequence.get() + 1;
		self.sequence.set(next);
		next
	}

	pub(crate) fn is_latest(&self, sequence: u64) -> bool {
		self.sequence.get() == sequence
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_begin_shifts_current_to_previous() {
		let store = StateStore::default();

		assert_eq!(store.begin("/a", QueryParams::new()), None);
		assert_eq!(store.begin("/b", QueryParams::new()), Some("/a".to_string()));

		let state = store.snapshot();
		assert_eq!(state.current_path.as_deref(), Some("/b"));
		assert_eq!(state.previous_path.as_deref(), Some("/a"));
	}

	#[rstest]
	fn test_snapshot_is_a_copy() {
		// Arrange
		let store = StateStore::default();
		store.begin("/a", QueryParams::new());
		let snapshot = store.snapshot();

		// Act
		store.begin("/b", QueryParams::new());
		store.set_params([("id", "1")].into_iter().collect());

		// Assert
		assert_eq!(snapshot.current_path.as_deref(), Some("/a"));
		assert!(snapshot.params.is_empty());
	}

	#[rstest]
	fn test_sequence_tracks_latest_run() {
		let store = StateStore::default();
		let first = store.next_sequence();
		assert!(store.is_latest(first));

		let second = store.next_sequence();
		assert!(!store.is_latest(first));
		assert!(store.is_latest(second));
	}

	#[rstest]
	fn test_take_active_clears_route() {
		let store = StateStore::default();
		store.set_active("/users/:id");

		assert_eq!(store.take_active().as_deref(), Some("/users/:id"));
		assert_eq!(store.active(), None);
	}
}
