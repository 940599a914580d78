//! The navigation pipeline.
//!
//! A [`Router`] owns the route table, the state store and a location
//! backend. Every navigation, whether requested through [`Router::navigate`]
//! or reported by the backend, runs the same pipeline:
//!
//! 1. split the location and parse the query
//! 2. move current to previous and record the new target
//! 3. run the middleware chain in registration order
//! 4. resolve the route, redirecting to the fallback on no match
//! 5. await the exit hook of the previously active route
//! 6. await the guard, redirecting to [`UNAUTHENTICATED_REDIRECT`] on denial
//! 7. await the enter hook
//! 8. render
//! 9. scroll
//! 10. notify the route-change listener
//!
//! Redirects start a fresh run. Each run takes a sequence number; a run that
//! is overtaken while awaiting a callback stops at its next step without
//! writing to the state store. A failed run leaves the phase at
//! [`NavigationPhase::Idle`].
//!
//! ## Example
//!
//! ```
//! use reinhardt_navigation::{Route, Router, RouterConfig, RouterMode};
//!
//! # futures::executor::block_on(async {
//! let router = Router::builder(RouterConfig::new(RouterMode::History))
//! 	.route(Route::new("/", |_, _| {}))
//! 	.route(Route::new("/users/:id", |params, _| {
//! 		assert_eq!(params.get("id"), Some("42"));
//! 	}))
//! 	.build()
//! 	.unwrap();
//!
//! let outcome = router.navigate("/users/42", None).await.unwrap();
//! assert_eq!(outcome.rendered_path(), Some("/users/42"));
//! # });
//! ```

use crate::config::{RouterConfig, RouterMode, ScrollBehavior, UNAUTHENTICATED_REDIRECT};
use crate::error::{CallbackStage, RouterError};
use crate::location::{LocationBackend, LocationEvent, LocationListener, normalize_path};
use crate::middleware::{Middleware, MiddlewareChain, Next, Transition};
use crate::pattern::RouteParams;
use crate::query::{parse_query, split_location};
use crate::route::{Route, RouteMeta, RouteTable};
use crate::state::{NavigationPhase, NavigationState, StateStore};
use futures::future::{FutureExt, LocalBoxFuture};
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

/// Maximum number of chained redirects before a navigation is abandoned.
const MAX_REDIRECT_HOPS: usize = 8;

type RouteChangeListener = Rc<dyn Fn(&str, Option<&str>)>;

/// Why the pipeline redirected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectReason {
	/// No registered pattern matched; redirected to the fallback path.
	NotFound,
	/// The route guard denied access.
	GuardDenied,
}

/// How a pipeline run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationOutcome {
	/// The route was rendered.
	Rendered {
		/// Path that was rendered, without the query.
		path: String,
		/// Pattern of the rendered route.
		pattern: String,
	},
	/// The run redirected; `outcome` is the result of the redirected run.
	Redirected {
		/// Redirect target.
		to: String,
		/// What triggered the redirect.
		reason: RedirectReason,
		/// Result of the redirected run.
		outcome: Box<NavigationOutcome>,
	},
	/// A middleware halted the navigation.
	Halted,
	/// A newer navigation started before this one could render.
	Superseded,
}

impl NavigationOutcome {
	/// Path finally rendered, following redirects.
	pub fn rendered_path(&self) -> Option<&str> {
		match self {
			Self::Rendered { path, .. } => Some(path),
			Self::Redirected { outcome, .. } => outcome.rendered_path(),
			Self::Halted | Self::Superseded => None,
		}
	}

	/// Number of redirects taken before the run ended.
	pub fn redirect_count(&self) -> usize {
		match self {
			Self::Redirected { outcome, .. } => 1 + outcome.redirect_count(),
			_ => 0,
		}
	}
}

struct RouterInner<C> {
	config: RouterConfig,
	table: RouteTable<C>,
	context: Rc<C>,
	location: Rc<dyn LocationBackend>,
	middleware: RefCell<MiddlewareChain>,
	on_route_change: Option<RouteChangeListener>,
	store: StateStore,
	pending: RefCell<VecDeque<LocationEvent>>,
	/// Fragment changes caused by the router itself, awaiting their echo.
	echoes: RefCell<VecDeque<String>>,
	started: Cell<bool>,
}

impl<C> RouterInner<C> {
	/// Writes a location to the backend, remembering the change event a
	/// fragment-mode backend will echo back.
	fn write_location(
		&self,
		path: &str,
		state: Option<&serde_json::Value>,
		replace: bool,
	) -> Result<(), RouterError> {
		let echo = self.started.get()
			&& self.location.mode() == RouterMode::Hash
			&& self.location.current() != path;
		if echo {
			self.echoes.borrow_mut().push_back(path.to_string());
		}

		let result = if replace {
			self.location.replace(path, state)
		} else {
			self.location.push(path, state)
		};
		if result.is_err() && echo {
			self.echoes.borrow_mut().retain(|e| e != path);
		}
		result
	}

	fn is_echo(&self, event: &LocationEvent) -> bool {
		let LocationEvent::Changed(location) = event else {
			return false;
		};
		let mut echoes = self.echoes.borrow_mut();
		let Some(index) = echoes.iter().position(|e| e == location) else {
			return false;
		};
		// Echoes arrive in write order; earlier entries will never be echoed.
		let skipped = echoes.drain(..=index).count() - 1;
		tracing::debug!(location = %location, skipped, "ignoring echo of own navigation");
		true
	}

	/// Whether a newer run has started since `sequence`.
	fn is_stale(&self, sequence: u64, path: &str) -> bool {
		let stale = !self.store.is_latest(sequence);
		if stale {
			tracing::warn!(path = %path, sequence, "navigation superseded");
		}
		stale
	}

	/// Whether `location` is what the router currently shows.
	fn is_current(&self, location: &str) -> bool {
		let (path, raw_query) = split_location(location);
		let state = self.store.snapshot();
		state.current_path.as_deref() == Some(path) && state.query == parse_query(raw_query)
	}
}

/// Client-side router.
///
/// `C` is the context handed to every guard, typically the application's
/// session or auth state. Cloning a router yields another handle to the same
/// instance.
pub struct Router<C = ()> {
	inner: Rc<RouterInner<C>>,
}

impl<C> Clone for Router<C> {
	fn clone(&self) -> Self {
		Self {
			inner: Rc::clone(&self.inner),
		}
	}
}

impl<C> std::fmt::Debug for Router<C> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Router")
			.field("config", &self.inner.config)
			.field("routes", &self.inner.table)
			.field("middleware", &self.inner.middleware.borrow().len())
			.field("state", &self.inner.store.snapshot())
			.finish()
	}
}

impl Router {
	/// Starts building a router without a guard context.
	pub fn builder(config: RouterConfig) -> RouterBuilder {
		RouterBuilder::new(config, ())
	}
}

impl<C: 'static> Router<C> {
	/// Starts building a router whose guards receive `context`.
	pub fn builder_with_context(config: RouterConfig, context: C) -> RouterBuilder<C> {
		RouterBuilder::new(config, context)
	}

	/// Appends a middleware. Middleware runs in registration order.
	pub fn use_middleware<M>(&self, middleware: M)
	where
		M: Middleware + 'static,
	{
		self.inner.middleware.borrow_mut().push(Rc::new(middleware));
	}

	/// Subscribes to location changes and navigates to the current location.
	///
	/// Subscribing happens once; calling `start` again only re-runs the
	/// pipeline for the current location.
	pub async fn start(&self) -> Result<NavigationOutcome, RouterError> {
		if !self.inner.started.replace(true) {
			self.inner.location.subscribe(self.listener())?;
			tracing::debug!(mode = ?self.inner.config.mode, "router started");
		}
		let current = self.inner.location.current();
		self.run(current, 0).await
	}

	/// Pushes `path` onto the history and runs the pipeline for it.
	pub async fn navigate(
		&self,
		path: &str,
		state: Option<serde_json::Value>,
	) -> Result<NavigationOutcome, RouterError> {
		let target = normalize_path(path);
		self.inner.write_location(&target, state.as_ref(), false)?;
		self.run(target, 0).await
	}

	/// Replaces the current history entry with `path` and runs the pipeline.
	pub async fn replace(
		&self,
		path: &str,
		state: Option<serde_json::Value>,
	) -> Result<NavigationOutcome, RouterError> {
		let target = normalize_path(path);
		self.inner.write_location(&target, state.as_ref(), true)?;
		self.run(target, 0).await
	}

	/// Asks the backend to go back. The pipeline runs when the change arrives.
	pub fn back(&self) -> Result<(), RouterError> {
		self.inner.location.back()
	}

	/// Asks the backend to go forward. The pipeline runs when the change arrives.
	pub fn forward(&self) -> Result<(), RouterError> {
		self.inner.location.forward()
	}

	/// Runs the pipeline for every queued location change, oldest first.
	///
	/// Changes to the location already shown are skipped. In the browser the
	/// queue is drained automatically; headless callers drive it with this.
	pub async fn sync(&self) -> Result<Vec<NavigationOutcome>, RouterError> {
		let mut outcomes = Vec::new();
		loop {
			let event = self.inner.pending.borrow_mut().pop_front();
			let Some(event) = event else {
				break;
			};
			match event {
				LocationEvent::Changed(location) => {
					if self.inner.is_current(&location) {
						tracing::debug!(location = %location, "location unchanged");
						continue;
					}
					outcomes.push(self.run(location, 0).await?);
				}
				LocationEvent::LinkActivated(path) => {
					outcomes.push(self.navigate(&path, None).await?);
				}
			}
		}
		Ok(outcomes)
	}

	/// Number of location changes waiting for [`Router::sync`].
	pub fn pending_changes(&self) -> usize {
		self.inner.pending.borrow().len()
	}

	/// Returns a copy of the navigation state.
	pub fn state(&self) -> NavigationState {
		self.inner.store.snapshot()
	}

	/// Phase of the latest pipeline run; [`NavigationPhase::Idle`] after a
	/// halt or a failure.
	pub fn phase(&self) -> NavigationPhase {
		self.inner.store.phase()
	}

	/// Pattern of the route that was last rendered.
	pub fn active_route(&self) -> Option<String> {
		self.inner.store.active()
	}

	/// Metadata of the route that was last rendered.
	pub fn current_meta(&self) -> Option<RouteMeta> {
		let active = self.inner.store.active()?;
		self.inner
			.table
			.by_pattern(&active)
			.map(|compiled| compiled.route.metadata().clone())
	}

	/// Builds a path for a named route.
	pub fn reverse(&self, name: &str, params: &[(&str, &str)]) -> Result<String, RouterError> {
		self.inner.table.reverse(name, params)
	}

	/// Context handed to every guard.
	pub fn context(&self) -> &C {
		&self.inner.context
	}

	/// Options the router was built with.
	pub fn config(&self) -> &RouterConfig {
		&self.inner.config
	}

	/// Number of registered routes.
	pub fn route_count(&self) -> usize {
		self.inner.table.len()
	}

	fn listener(&self) -> LocationListener {
		let weak = Rc::downgrade(&self.inner);
		Rc::new(move |event: LocationEvent| {
			let Some(inner) = weak.upgrade() else {
				return;
			};
			if inner.is_echo(&event) {
				return;
			}
			inner.pending.borrow_mut().push_back(event);

			#[cfg(target_arch = "wasm32")]
			{
				let router = Router { inner };
				wasm_bindgen_futures::spawn_local(async move {
					// Nobody awaits this task, so failures can only be logged.
					if let Err(err) = router.sync().await {
						tracing::error!(error = %err, "navigation failed");
					}
				});
			}
		})
	}

	fn run(
		&self,
		location: String,
		hops: usize,
	) -> LocalBoxFuture<'_, Result<NavigationOutcome, RouterError>> {
		async move {
			let sequence = self.inner.store.next_sequence();
			let result = self.pipeline(location, sequence, hops).await;
			if result.is_err() && self.inner.store.is_latest(sequence) {
				self.inner.store.set_phase(NavigationPhase::Idle);
			}
			result
		}
		.boxed_local()
	}

	/// Runs the pipeline steps for one sequence number.
	///
	/// Every await point is followed by a staleness check, and a stale run
	/// returns [`NavigationOutcome::Superseded`] without touching the store.
	async fn pipeline(
		&self,
		location: String,
		sequence: u64,
		hops: usize,
	) -> Result<NavigationOutcome, RouterError> {
		let inner = &self.inner;
		inner.store.set_phase(NavigationPhase::Resolving);

		let (path, raw_query) = split_location(&location);
		let path = path.to_string();
		let query = parse_query(raw_query);
		let from = inner.store.begin(&path, query.clone());

		let transition = Transition {
			to: path.clone(),
			from: from.clone(),
			query: query.clone(),
		};
		// Cloned so middleware may register further middleware.
		let chain = inner.middleware.borrow().clone();
		let next = chain.run(&transition).await?;
		if inner.is_stale(sequence, &path) {
			return Ok(NavigationOutcome::Superseded);
		}
		if next == Next::Halt {
			inner.store.set_phase(NavigationPhase::Idle);
			return Ok(NavigationOutcome::Halted);
		}

		let Some((compiled, matched)) = inner.table.resolve(&path) else {
			inner.store.set_params(RouteParams::new());
			tracing::warn!(path = %path, "no route matched");
			let fallback = inner.config.fallback.clone();
			return self
				.redirect(fallback, RedirectReason::NotFound, sequence, hops)
				.await;
		};
		let route: Route<C> = compiled.route.clone();
		let pattern = compiled.matcher.as_str().to_string();
		let params = matched.into_params();
		inner.store.set_params(params.clone());

		if let Some(previous) = inner.store.take_active()
			&& let Some(exit) = inner
				.table
				.by_pattern(&previous)
				.and_then(|r| r.route.exit_hook())
				.cloned()
		{
			tracing::debug!(route = %previous, "running exit hook");
			exit()
				.await
				.map_err(|e| RouterError::callback(CallbackStage::Exit, e))?;
			if inner.is_stale(sequence, &path) {
				return Ok(NavigationOutcome::Superseded);
			}
		}

		inner.store.set_phase(NavigationPhase::Guarded);
		if let Some(guard) = route.guard_fn() {
			let allowed = guard(params.clone(), Rc::clone(&inner.context))
				.await
				.map_err(|e| RouterError::callback(CallbackStage::Guard, e))?;
			if inner.is_stale(sequence, &path) {
				return Ok(NavigationOutcome::Superseded);
			}
			if !allowed {
				return self
					.redirect(
						UNAUTHENTICATED_REDIRECT.to_string(),
						RedirectReason::GuardDenied,
						sequence,
						hops,
					)
					.await;
			}
		}

		inner.store.set_phase(NavigationPhase::Entering);
		if let Some(enter) = route.enter_hook() {
			enter(params.clone())
				.await
				.map_err(|e| RouterError::callback(CallbackStage::Enter, e))?;
			if inner.is_stale(sequence, &path) {
				return Ok(NavigationOutcome::Superseded);
			}
		}

		inner.store.set_phase(NavigationPhase::Rendered);
		inner.store.set_active(&pattern);
		route.render(&params, &query);

		let behavior = inner.config.scroll_behavior;
		if behavior != ScrollBehavior::None {
			inner.location.scroll_to_top(behavior);
		}

		if let Some(notify) = &inner.on_route_change {
			notify(&path, from.as_deref());
		}
		tracing::info!(path = %path, pattern = %pattern, "navigation complete");

		Ok(NavigationOutcome::Rendered { path, pattern })
	}

	async fn redirect(
		&self,
		target: String,
		reason: RedirectReason,
		sequence: u64,
		hops: usize,
	) -> Result<NavigationOutcome, RouterError> {
		if !self.inner.store.is_latest(sequence) {
			tracing::warn!(to = %target, sequence, "stale navigation dropped its redirect");
			return Ok(NavigationOutcome::Superseded);
		}
		if hops >= MAX_REDIRECT_HOPS {
			return Err(RouterError::RedirectLoop { path: target, hops });
		}

		tracing::warn!(to = %target, ?reason, "redirecting navigation");
		self.inner.write_location(&target, None, true)?;
		let outcome = self.run(target.clone(), hops + 1).await?;

		Ok(NavigationOutcome::Redirected {
			to: target,
			reason,
			outcome: Box::new(outcome),
		})
	}
}

/// Builder for [`Router`].
pub struct RouterBuilder<C = ()> {
	config: RouterConfig,
	context: C,
	routes: Vec<Route<C>>,
	location: Option<Rc<dyn LocationBackend>>,
	middleware: MiddlewareChain,
	on_route_change: Option<RouteChangeListener>,
}

impl<C: 'static> RouterBuilder<C> {
	fn new(config: RouterConfig, context: C) -> Self {
		Self {
			config,
			context,
			routes: Vec::new(),
			location: None,
			middleware: MiddlewareChain::default(),
			on_route_change: None,
		}
	}

	/// Registers a route. Registration order is match priority.
	pub fn route(mut self, route: Route<C>) -> Self {
		self.routes.push(route);
		self
	}

	/// Registers several routes in order.
	pub fn routes(mut self, routes: impl IntoIterator<Item = Route<C>>) -> Self {
		self.routes.extend(routes);
		self
	}

	/// Appends a middleware to the chain.
	pub fn middleware<M>(mut self, middleware: M) -> Self
	where
		M: Middleware + 'static,
	{
		self.middleware.push(Rc::new(middleware));
		self
	}

	/// Uses `location` instead of the platform default backend.
	pub fn location<L>(mut self, location: Rc<L>) -> Self
	where
		L: LocationBackend + 'static,
	{
		self.location = Some(location);
		self
	}

	/// Called with `(to, from)` after every completed navigation.
	pub fn on_route_change<F>(mut self, callback: F) -> Self
	where
		F: Fn(&str, Option<&str>) + 'static,
	{
		self.on_route_change = Some(Rc::new(callback));
		self
	}

	/// Validates the configuration and compiles the route table.
	///
	/// # Errors
	///
	/// Fails on invalid configuration, a malformed pattern or a pattern
	/// registered twice.
	pub fn build(self) -> Result<Router<C>, RouterError> {
		self.config.validate()?;

		let mut table = RouteTable::new();
		for route in self.routes {
			table.insert(route)?;
		}

		let location = match self.location {
			Some(location) => {
				if location.mode() != self.config.mode {
					tracing::warn!(
						configured = ?self.config.mode,
						backend = ?location.mode(),
						"location backend mode differs from configuration"
					);
				}
				location
			}
			None => default_location(&self.config)?,
		};

		Ok(Router {
			inner: Rc::new(RouterInner {
				config: self.config,
				table,
				context: Rc::new(self.context),
				location,
				middleware: RefCell::new(self.middleware),
				on_route_change: self.on_route_change,
				store: StateStore::default(),
				pending: RefCell::new(VecDeque::new()),
				echoes: RefCell::new(VecDeque::new()),
				started: Cell::new(false),
			}),
		})
	}
}

#[cfg(target_arch = "wasm32")]
fn default_location(config: &RouterConfig) -> Result<Rc<dyn LocationBackend>, RouterError> {
	Ok(Rc::new(crate::location::BrowserLocation::new(config)?))
}

#[cfg(not(target_arch = "wasm32"))]
fn default_location(config: &RouterConfig) -> Result<Rc<dyn LocationBackend>, RouterError> {
	Ok(Rc::new(
		crate::location::MemoryLocation::new(config.mode).with_root(config.root.clone()),
	))
}
