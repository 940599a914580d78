//! # Reinhardt Navigation
//!
//! Client-side navigation router for single-page applications:
//!
//! - **Pattern matching**: static segments, `:name` parameters and a trailing `*` wildcard
//! - **Ordered resolution**: routes are tested in registration order, first match wins
//! - **Navigation pipeline**: middleware, exit hook, guard, enter hook, render, scroll, notify
//! - **Typed guard context**: guards receive an injected context instead of global state
//! - **Two backends**: fragment (`#/path`) and address-bar (History API) locations
//! - **Last navigation wins**: a run overtaken by a newer one never renders
//!
//! # Examples
//!
//! ## Guarded routes
//!
//! ```
//! use reinhardt_navigation::{NavigationOutcome, RedirectReason, Route, Router, RouterConfig};
//! use std::cell::Cell;
//!
//! struct Session {
//! 	signed_in: Cell<bool>,
//! }
//!
//! # futures::executor::block_on(async {
//! let router = Router::builder_with_context(
//! 	RouterConfig::default(),
//! 	Session { signed_in: Cell::new(false) },
//! )
//! .route(Route::new("/login", |_, _| {}))
//! .route(Route::new("/account", |_, _| {}).guard(|_, session: &Session| session.signed_in.get()))
//! .build()
//! .unwrap();
//!
//! let outcome = router.navigate("/account", None).await.unwrap();
//! assert!(matches!(
//! 	outcome,
//! 	NavigationOutcome::Redirected { reason: RedirectReason::GuardDenied, .. }
//! ));
//!
//! router.context().signed_in.set(true);
//! let outcome = router.navigate("/account", None).await.unwrap();
//! assert_eq!(outcome.rendered_path(), Some("/account"));
//! # });
//! ```
//!
//! ## Query strings
//!
//! ```
//! use reinhardt_navigation::{parse_query, split_location};
//!
//! let (path, query) = split_location("/search?q=rust%20lang&page=2");
//! let query = parse_query(query);
//!
//! assert_eq!(path, "/search");
//! assert_eq!(query.get("q"), Some("rust lang"));
//! assert_eq!(query.get("page"), Some("2"));
//! ```

pub mod config;
pub mod error;
pub mod location;
pub mod middleware;
pub mod pattern;
pub mod query;
pub mod route;
pub mod router;
pub mod state;

pub use config::{
	DEFAULT_FALLBACK, RouterConfig, RouterMode, ScrollBehavior, UNAUTHENTICATED_REDIRECT,
};
pub use error::{CallbackError, CallbackStage, ConfigError, PatternError, RouterError};
#[cfg(target_arch = "wasm32")]
pub use location::BrowserLocation;
pub use location::{LocationBackend, LocationEvent, MemoryLocation};
pub use middleware::{AsyncFnMiddleware, Middleware, Next, Transition, from_async_fn};
pub use pattern::{PatternMatch, RouteParams, RoutePattern, Segment};
pub use query::{QueryParams, parse_query, split_location};
pub use route::{Route, RouteMeta, RouteTable};
pub use router::{NavigationOutcome, RedirectReason, Router, RouterBuilder};
pub use state::{NavigationPhase, NavigationState};
