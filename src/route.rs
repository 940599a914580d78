//! Route definitions and the route table.
//!
//! A [`Route`] bundles a pattern string with its renderer and optional
//! guard, hooks and metadata. Routes are compiled when they are inserted
//! into a [`RouteTable`], so a malformed pattern is reported while the
//! router is being built rather than on the first navigation.

use crate::error::{CallbackError, RouterError};
use crate::pattern::{PatternMatch, RouteParams, RoutePattern};
use crate::query::QueryParams;
use futures::future::{self, FutureExt, LocalBoxFuture};
use std::collections::HashMap;
use std::future::Future;
use std::rc::Rc;

pub(crate) type Renderer = Rc<dyn Fn(&RouteParams, &QueryParams)>;

pub(crate) type GuardFn<C> =
	Rc<dyn Fn(RouteParams, Rc<C>) -> LocalBoxFuture<'static, Result<bool, CallbackError>>>;

pub(crate) type EnterHook =
	Rc<dyn Fn(RouteParams) -> LocalBoxFuture<'static, Result<(), CallbackError>>>;

pub(crate) type ExitHook = Rc<dyn Fn() -> LocalBoxFuture<'static, Result<(), CallbackError>>>;

/// Open key-value metadata attached to a route.
pub type RouteMeta = HashMap<String, serde_json::Value>;

/// A single route definition.
///
/// `C` is the guard context type injected into the router (for example an
/// authentication session).
///
/// ```
/// use reinhardt_navigation::Route;
///
/// struct Session { logged_in: bool }
///
/// let route = Route::<Session>::new("/profile/:id", |params, _query| {
///     println!("profile {}", params.get("id").unwrap_or_default());
/// })
/// .named("profile")
/// .guard(|_params, session| session.logged_in)
/// .meta("title", "Profile");
///
/// assert_eq!(route.pattern(), "/profile/:id");
/// ```
pub struct Route<C = ()> {
	pattern: String,
	name: Option<String>,
	renderer: Renderer,
	guard: Option<GuardFn<C>>,
	on_enter: Option<EnterHook>,
	on_exit: Option<ExitHook>,
	meta: RouteMeta,
}

impl<C> Clone for Route<C> {
	fn clone(&self) -> Self {
		Self {
			pattern: self.pattern.clone(),
			name: self.name.clone(),
			renderer: Rc::clone(&self.renderer),
			guard: self.guard.clone(),
			on_enter: self.on_enter.clone(),
			on_exit: self.on_exit.clone(),
			meta: self.meta.clone(),
		}
	}
}

impl<C> std::fmt::Debug for Route<C> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Route")
			.field("pattern", &self.pattern)
			.field("name", &self.name)
			.field("has_guard", &self.guard.is_some())
			.field("has_enter_hook", &self.on_enter.is_some())
			.field("has_exit_hook", &self.on_exit.is_some())
			.field("meta", &self.meta)
			.finish()
	}
}

impl<C: 'static> Route<C> {
	/// Creates a route whose renderer receives the captured params and the
	/// parsed query. The renderer's result is not inspected.
	pub fn new<F>(pattern: impl Into<String>, renderer: F) -> Self
	where
		F: Fn(&RouteParams, &QueryParams) + 'static,
	{
		Self {
			pattern: pattern.into(),
			name: None,
			renderer: Rc::new(renderer),
			guard: None,
			on_enter: None,
			on_exit: None,
			meta: RouteMeta::new(),
		}
	}

	/// Names the route for [`Router::reverse`](crate::Router::reverse).
	pub fn named(mut self, name: impl Into<String>) -> Self {
		self.name = Some(name.into());
		self
	}

	/// Adds a synchronous guard. Returning `false` denies access.
	pub fn guard<G>(mut self, guard: G) -> Self
	where
		G: Fn(&RouteParams, &C) -> bool + 'static,
	{
		let guard: GuardFn<C> = Rc::new(move |params: RouteParams, ctx: Rc<C>| {
			future::ready(Ok::<_, CallbackError>(guard(&params, &*ctx))).boxed_local()
		});
		self.guard = Some(guard);
		self
	}

	/// Adds an asynchronous guard.
	///
	/// An `Err` is not a denial: it aborts the navigation and is returned
	/// to the caller.
	pub fn guard_async<G, Fut>(mut self, guard: G) -> Self
	where
		G: Fn(RouteParams, Rc<C>) -> Fut + 'static,
		Fut: Future<Output = Result<bool, CallbackError>> + 'static,
	{
		let guard: GuardFn<C> =
			Rc::new(move |params: RouteParams, ctx: Rc<C>| guard(params, ctx).boxed_local());
		self.guard = Some(guard);
		self
	}

	/// Runs after the guard passes and before the renderer.
	pub fn on_enter<H>(mut self, hook: H) -> Self
	where
		H: Fn(&RouteParams) + 'static,
	{
		let hook: EnterHook = Rc::new(move |params: RouteParams| {
			hook(&params);
			future::ready(Ok::<_, CallbackError>(())).boxed_local()
		});
		self.on_enter = Some(hook);
		self
	}

	pub fn on_enter_async<H, Fut>(mut self, hook: H) -> Self
	where
		H: Fn(RouteParams) -> Fut + 'static,
		Fut: Future<Output = Result<(), CallbackError>> + 'static,
	{
		let hook: EnterHook = Rc::new(move |params: RouteParams| hook(params).boxed_local());
		self.on_enter = Some(hook);
		self
	}

	/// Runs when navigating away from this route, before the next route's
	/// guard.
	pub fn on_exit<H>(mut self, hook: H) -> Self
	where
		H: Fn() + 'static,
	{
		let hook: ExitHook = Rc::new(move || {
			hook();
			future::ready(Ok::<_, CallbackError>(())).boxed_local()
		});
		self.on_exit = Some(hook);
		self
	}

	pub fn on_exit_async<H, Fut>(mut self, hook: H) -> Self
	where
		H: Fn() -> Fut + 'static,
		Fut: Future<Output = Result<(), CallbackError>> + 'static,
	{
		let hook: ExitHook = Rc::new(move || hook().boxed_local());
		self.on_exit = Some(hook);
		self
	}

	pub fn meta(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
		self.meta.insert(key.into(), value.into());
		self
	}
}

impl<C> Route<C> {
	pub fn pattern(&self) -> &str {
		&self.pattern
	}

	pub fn name(&self) -> Option<&str> {
		self.name.as_deref()
	}

	pub fn metadata(&self) -> &RouteMeta {
		&self.meta
	}

	pub fn has_guard(&self) -> bool {
		self.guard.is_some()
	}

	pub(crate) fn guard_fn(&self) -> Option<&GuardFn<C>> {
		self.guard.as_ref()
	}

	pub(crate) fn enter_hook(&self) -> Option<&EnterHook> {
		self.on_enter.as_ref()
	}

	pub(crate) fn exit_hook(&self) -> Option<&ExitHook> {
		self.on_exit.as_ref()
	}

	pub(crate) fn render(&self, params: &RouteParams, query: &QueryParams) {
		(self.renderer)(params, query)
	}
}

/// A route paired with its compiled matcher.
pub(crate) struct CompiledRoute<C> {
	pub(crate) route: Route<C>,
	pub(crate) matcher: RoutePattern,
}

/// Ordered route table. Insertion order is match priority.
pub struct RouteTable<C = ()> {
	routes: Vec<CompiledRoute<C>>,
	named: HashMap<String, usize>,
}

impl<C> Default for RouteTable<C> {
	fn default() -> Self {
		Self {
			routes: Vec::new(),
			named: HashMap::new(),
		}
	}
}

impl<C> std::fmt::Debug for RouteTable<C> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("RouteTable")
			.field(
				"patterns",
				&self.routes.iter().map(|r| r.matcher.as_str()).collect::<Vec<_>>(),
			)
			.field("named", &self.named.keys().collect::<Vec<_>>())
			.finish()
	}
}

impl<C> RouteTable<C> {
	pub fn new() -> Self {
		Self::default()
	}

	/// Compiles and appends a route.
	///
	/// # Errors
	///
	/// Fails if the pattern is malformed or already registered.
	pub fn insert(&mut self, route: Route<C>) -> Result<(), RouterError> {
		if self.routes.iter().any(|r| r.matcher.as_str() == route.pattern) {
			return Err(RouterError::DuplicatePattern(route.pattern));
		}
		let matcher = RoutePattern::new(&route.pattern)?;
		if let Some(name) = &route.name {
			self.named.insert(name.clone(), self.routes.len());
		}
		self.routes.push(CompiledRoute { route, matcher });
		Ok(())
	}

	/// Returns the first route, in insertion order, whose pattern matches.
	pub(crate) fn resolve(&self, path: &str) -> Option<(&CompiledRoute<C>, PatternMatch)> {
		self.routes
			.iter()
			.find_map(|compiled| compiled.matcher.matches(path).map(|m| (compiled, m)))
	}

	pub(crate) fn by_pattern(&self, pattern: &str) -> Option<&CompiledRoute<C>> {
		self.routes.iter().find(|r| r.matcher.as_str() == pattern)
	}

	/// Returns the pattern of the first matching route.
	pub fn match_pattern(&self, path: &str) -> Option<&str> {
		self.resolve(path).map(|(r, _)| r.matcher.as_str())
	}

	/// Builds a path for a named route.
	pub fn reverse(&self, name: &str, params: &[(&str, &str)]) -> Result<String, RouterError> {
		let index = self
			.named
			.get(name)
			.ok_or_else(|| RouterError::InvalidRouteName(name.to_string()))?;

		let params_map: HashMap<String, String> = params
			.iter()
			.map(|(k, v)| (k.to_string(), v.to_string()))
			.collect();

		self.routes[*index]
			.matcher
			.reverse(&params_map, None)
			.map_err(RouterError::MissingParameter)
	}

	pub fn len(&self) -> usize {
		self.routes.len()
	}

	pub fn is_empty(&self) -> bool {
		self.routes.is_empty()
	}

	pub fn has_route(&self, name: &str) -> bool {
		self.named.contains_key(name)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	fn noop(_: &RouteParams, _: &QueryParams) {}

	#[rstest]
	fn test_first_structural_match_wins() {
		// Arrange
		let mut table: RouteTable = RouteTable::new();
		table.insert(Route::new("/users/:id", noop)).unwrap();
		table.insert(Route::new("/users/active", noop)).unwrap();

		// Act
		let (route, m) = table.resolve("/users/active").unwrap();

		// Assert
		assert_eq!(route.matcher.as_str(), "/users/:id");
		assert_eq!(m.params.get("id"), Some("active"));
	}

	#[rstest]
	fn test_literal_first_wins_when_registered_first() {
		let mut table: RouteTable = RouteTable::new();
		table.insert(Route::new("/users/active", noop)).unwrap();
		table.insert(Route::new("/users/:id", noop)).unwrap();

		assert_eq!(table.match_pattern("/users/active"), Some("/users/active"));
		assert_eq!(table.match_pattern("/users/7"), Some("/users/:id"));
	}

	#[rstest]
	fn test_no_match() {
		let mut table: RouteTable = RouteTable::new();
		table.insert(Route::new("/", noop)).unwrap();
		assert!(table.resolve("/missing").is_none());
	}

	#[rstest]
	fn test_duplicate_pattern_rejected() {
		let mut table: RouteTable = RouteTable::new();
		table.insert(Route::new("/a", noop)).unwrap();

		let err = table.insert(Route::new("/a", noop)).unwrap_err();
		assert!(matches!(err, RouterError::DuplicatePattern(p) if p == "/a"));
		assert_eq!(table.len(), 1);
	}

	#[rstest]
	fn test_malformed_pattern_rejected_on_insert() {
		let mut table: RouteTable = RouteTable::new();
		let err = table.insert(Route::new("/a/:", noop)).unwrap_err();
		assert!(matches!(err, RouterError::Pattern(_)));
		assert!(table.is_empty());
	}

	#[rstest]
	fn test_reverse_named_route() {
		let mut table: RouteTable = RouteTable::new();
		table
			.insert(Route::new("/users/:id/posts/:post", noop).named("user_post"))
			.unwrap();

		assert!(table.has_route("user_post"));
		assert_eq!(
			table
				.reverse("user_post", &[("id", "1"), ("post", "2")])
				.unwrap(),
			"/users/1/posts/2"
		);
		assert!(matches!(
			table.reverse("user_post", &[("id", "1")]),
			Err(RouterError::MissingParameter(p)) if p == "post"
		));
		assert!(matches!(
			table.reverse("nope", &[]),
			Err(RouterError::InvalidRouteName(_))
		));
	}

	#[rstest]
	fn test_route_metadata() {
		let route: Route = Route::new("/admin", noop)
			.meta("title", "Admin")
			.meta("level", 3);

		assert_eq!(route.metadata()["title"], serde_json::json!("Admin"));
		assert_eq!(route.metadata()["level"], serde_json::json!(3));
	}

	#[rstest]
	fn test_route_debug_hides_callbacks() {
		let route: Route = Route::new("/a", noop).guard(|_, _| true);
		let debug = format!("{:?}", route);
		assert!(debug.contains("has_guard: true"));
		assert!(debug.contains("has_enter_hook: false"));
	}
}
