use super::{
	LocationBackend, LocationEvent, LocationListener, fragment_path, join_root, normalize_path,
	strip_root,
};
use crate::config::{RouterMode, ScrollBehavior};
use crate::error::RouterError;
use std::cell::RefCell;

#[derive(Debug, Clone)]
struct Entry {
	href: String,
	state: Option<serde_json::Value>,
}

/// In-memory history stack.
///
/// Entries are stored as the href the browser would show: `#/path` in
/// fragment mode and `root + path` in address-bar mode. Like the browser,
/// a fragment change (push or replace in hash mode) and a `back`/`forward`
/// move notify the listeners; address-bar pushes do not.
pub struct MemoryLocation {
	mode: RouterMode,
	root: String,
	entries: RefCell<Vec<Entry>>,
	cursor: RefCell<usize>,
	listeners: RefCell<Vec<LocationListener>>,
	scrolls: RefCell<Vec<ScrollBehavior>>,
}

impl std::fmt::Debug for MemoryLocation {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("MemoryLocation")
			.field("mode", &self.mode)
			.field("root", &self.root)
			.field("entries", &self.hrefs())
			.field("cursor", &*self.cursor.borrow())
			.finish()
	}
}

impl MemoryLocation {
	/// Creates a history holding a single entry for `/`.
	pub fn new(mode: RouterMode) -> Self {
		let location = Self {
			mode,
			root: "/".to_string(),
			entries: RefCell::new(Vec::new()),
			cursor: RefCell::new(0),
			listeners: RefCell::new(Vec::new()),
			scrolls: RefCell::new(Vec::new()),
		};
		location.entries.borrow_mut().push(Entry {
			href: location.href_for("/"),
			state: None,
		});
		location
	}

	pub fn with_root(mut self, root: impl Into<String>) -> Self {
		self.root = root.into();
		self.reset("/");
		self
	}

	/// Replaces the whole history with a single entry for `path`.
	pub fn starting_at(self, path: &str) -> Self {
		self.reset(path);
		self
	}

	fn reset(&self, path: &str) {
		*self.entries.borrow_mut() = vec![Entry {
			href: self.href_for(path),
			state: None,
		}];
		*self.cursor.borrow_mut() = 0;
	}

	fn href_for(&self, path: &str) -> String {
		match self.mode {
			RouterMode::Hash => format!("#{}", normalize_path(path)),
			RouterMode::History => join_root(&self.root, path),
		}
	}

	fn path_for(&self, href: &str) -> String {
		match self.mode {
			RouterMode::Hash => fragment_path(href),
			RouterMode::History => strip_root(&self.root, href),
		}
	}

	/// Href of the current entry, as the address bar would show it.
	pub fn href(&self) -> String {
		self.entries.borrow()[*self.cursor.borrow()].href.clone()
	}

	pub fn hrefs(&self) -> Vec<String> {
		self.entries.borrow().iter().map(|e| e.href.clone()).collect()
	}

	/// Opaque state stored with the current entry.
	pub fn state(&self) -> Option<serde_json::Value> {
		self.entries.borrow()[*self.cursor.borrow()].state.clone()
	}

	pub fn len(&self) -> usize {
		self.entries.borrow().len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.borrow().is_empty()
	}

	/// Scroll requests received so far, oldest first.
	pub fn scroll_requests(&self) -> Vec<ScrollBehavior> {
		self.scrolls.borrow().clone()
	}

	/// Simulates the user activating a same-origin link to `path`.
	///
	/// In address-bar mode the click is intercepted and reported as
	/// [`LocationEvent::LinkActivated`]; in fragment mode the browser
	/// follows the link itself and reports the fragment change.
	pub fn click_link(&self, path: &str) {
		match self.mode {
			RouterMode::History => self.emit(LocationEvent::LinkActivated(normalize_path(path))),
			RouterMode::Hash => {
				self.push_entry(path, None);
				self.emit(LocationEvent::Changed(self.current()));
			}
		}
	}

	fn push_entry(&self, path: &str, state: Option<&serde_json::Value>) {
		let href = self.href_for(path);
		let mut entries = self.entries.borrow_mut();
		let mut cursor = self.cursor.borrow_mut();
		entries.truncate(*cursor + 1);
		entries.push(Entry {
			href,
			state: state.cloned(),
		});
		*cursor = entries.len() - 1;
	}

	fn emit(&self, event: LocationEvent) {
		let listeners = self.listeners.borrow().clone();
		for listener in listeners {
			listener(event.clone());
		}
	}

	fn step(&self, forward: bool) {
		let moved = {
			let len = self.entries.borrow().len();
			let mut cursor = self.cursor.borrow_mut();
			if forward && *cursor + 1 < len {
				*cursor += 1;
				true
			} else if !forward && *cursor > 0 {
				*cursor -= 1;
				true
			} else {
				false
			}
		};
		if moved {
			self.emit(LocationEvent::Changed(self.current()));
		}
	}
}

impl LocationBackend for MemoryLocation {
	fn mode(&self) -> RouterMode {
		self.mode
	}

	fn current(&self) -> String {
		self.path_for(&self.href())
	}

	fn push(&self, path: &str, state: Option<&serde_json::Value>) -> Result<(), RouterError> {
		let changed = self.href() != self.href_for(path);
		if self.mode == RouterMode::Hash {
			// Assigning the same fragment neither adds an entry nor notifies.
			if changed {
				self.push_entry(path, state);
				self.emit(LocationEvent::Changed(self.current()));
			}
			return Ok(());
		}
		self.push_entry(path, state);
		Ok(())
	}

	fn replace(&self, path: &str, state: Option<&serde_json::Value>) -> Result<(), RouterError> {
		let href = self.href_for(path);
		let changed = self.href() != href;
		{
			let mut entries = self.entries.borrow_mut();
			let cursor = *self.cursor.borrow();
			entries[cursor] = Entry {
				href,
				state: state.cloned(),
			};
		}
		if self.mode == RouterMode::Hash && changed {
			self.emit(LocationEvent::Changed(self.current()));
		}
		Ok(())
	}

	fn back(&self) -> Result<(), RouterError> {
		self.step(false);
		Ok(())
	}

	fn forward(&self) -> Result<(), RouterError> {
		self.step(true);
		Ok(())
	}

	fn scroll_to_top(&self, behavior: ScrollBehavior) {
		self.scrolls.borrow_mut().push(behavior);
	}

	fn subscribe(&self, listener: LocationListener) -> Result<(), RouterError> {
		self.listeners.borrow_mut().push(listener);
		Ok(())
	}
}
