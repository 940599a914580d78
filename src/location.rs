//! Location adapters.
//!
//! A [`LocationBackend`] hides whether the router runs in fragment mode
//! (`#/path`) or address-bar mode (History API under a root prefix). Every
//! backend reports locations root-relative, always starting with `/`, with
//! the query string still attached.
//!
//! [`MemoryLocation`] keeps history in memory and is used natively;
//! [`BrowserLocation`] drives the real browser on `wasm32`.

use crate::config::{RouterMode, ScrollBehavior};
use crate::error::RouterError;
use std::rc::Rc;

mod memory;
pub use memory::MemoryLocation;

#[cfg(target_arch = "wasm32")]
mod browser;
#[cfg(target_arch = "wasm32")]
pub use browser::BrowserLocation;

/// A location change surfaced by a backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocationEvent {
	/// The platform already moved to this location (pop or fragment change).
	Changed(String),
	/// A same-origin link was activated and its default action suppressed;
	/// the router still has to push the location.
	LinkActivated(String),
}

/// Callback receiving backend events.
pub type LocationListener = Rc<dyn Fn(LocationEvent)>;

/// Navigation backend used by the router.
///
/// `back` and `forward` are fire-and-forget: the resulting location change
/// arrives later through the subscribed listener.
pub trait LocationBackend {
	/// Which kind of location this backend drives.
	fn mode(&self) -> RouterMode;

	/// Current root-relative location, including any query string.
	fn current(&self) -> String;

	/// Adds a history entry.
	fn push(&self, path: &str, state: Option<&serde_json::Value>) -> Result<(), RouterError>;

	/// Substitutes the current history entry.
	fn replace(&self, path: &str, state: Option<&serde_json::Value>) -> Result<(), RouterError>;

	fn back(&self) -> Result<(), RouterError>;

	fn forward(&self) -> Result<(), RouterError>;

	fn scroll_to_top(&self, behavior: ScrollBehavior);

	/// Registers the listener that receives location changes.
	fn subscribe(&self, listener: LocationListener) -> Result<(), RouterError>;
}

/// Ensures a leading `/`, dropping a leading `#` first.
///
/// ```
/// use reinhardt_navigation::location::normalize_path;
///
/// assert_eq!(normalize_path("about"), "/about");
/// assert_eq!(normalize_path("#/about"), "/about");
/// assert_eq!(normalize_path(""), "/");
/// ```
pub fn normalize_path(path: &str) -> String {
	let path = path.strip_prefix('#').unwrap_or(path);
	if path.starts_with('/') {
		path.to_string()
	} else {
		format!("/{}", path)
	}
}

/// Strips the root prefix from an address-bar path.
///
/// Paths outside the root are returned unchanged.
pub fn strip_root(root: &str, pathname: &str) -> String {
	let root = root.trim_end_matches('/');
	if root.is_empty() {
		return normalize_path(pathname);
	}
	match pathname.strip_prefix(root) {
		Some("") => "/".to_string(),
		Some(rest) if rest.starts_with('/') || rest.starts_with('?') => normalize_path(rest),
		_ => normalize_path(pathname),
	}
}

/// Prefixes a root-relative path with the root.
pub fn join_root(root: &str, path: &str) -> String {
	let root = root.trim_end_matches('/');
	format!("{}{}", root, normalize_path(path))
}

/// Extracts the router location from a URL fragment.
pub fn fragment_path(hash: &str) -> String {
	let fragment = hash.strip_prefix('#').unwrap_or(hash);
	if fragment.is_empty() {
		"/".to_string()
	} else {
		normalize_path(fragment)
	}
}

/// Router path held in the fragment of a full URL.
pub fn url_fragment_path(url: &str) -> String {
	let fragment = url.split_once('#').map(|(_, fragment)| fragment).unwrap_or_default();
	fragment_path(fragment)
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case("/", "/app", "/app")]
	#[case("/", "/", "/")]
	#[case("/app", "/app/users/1", "/users/1")]
	#[case("/app/", "/app/users/1", "/users/1")]
	#[case("/app", "/app", "/")]
	#[case("/app", "/app?x=1", "/?x=1")]
	#[case("/app", "/application", "/application")]
	#[case("/app", "/other", "/other")]
	fn test_strip_root(#[case] root: &str, #[case] pathname: &str, #[case] expected: &str) {
		assert_eq!(strip_root(root, pathname), expected);
	}

	#[rstest]
	#[case("/", "/users", "/users")]
	#[case("/app", "/users", "/app/users")]
	#[case("/app/", "users", "/app/users")]
	#[case("/app", "/", "/app/")]
	fn test_join_root(#[case] root: &str, #[case] path: &str, #[case] expected: &str) {
		assert_eq!(join_root(root, path), expected);
	}

	#[rstest]
	#[case("", "/")]
	#[case("#", "/")]
	#[case("#/", "/")]
	#[case("#/users/1", "/users/1")]
	#[case("#users", "/users")]
	#[case("#/search?q=a", "/search?q=a")]
	fn test_fragment_path(#[case] hash: &str, #[case] expected: &str) {
		assert_eq!(fragment_path(hash), expected);
	}

	#[rstest]
	#[case("https://example.com/app", "/")]
	#[case("https://example.com/#", "/")]
	#[case("https://example.com/#/missing", "/missing")]
	#[case("https://example.com/?x=1#/404?from=a", "/404?from=a")]
	fn test_url_fragment_path(#[case] url: &str, #[case] expected: &str) {
		assert_eq!(url_fragment_path(url), expected);
	}
}
