//! Navigation middleware.
//!
//! Middleware runs on every navigation, in registration order, before the
//! route is resolved. Each entry returns [`Next::Proceed`] to hand control
//! to the next entry or [`Next::Halt`] to stop the navigation silently:
//! nothing is rendered and no change notification fires.

use crate::error::{CallbackError, CallbackStage, RouterError};
use crate::query::QueryParams;
use async_trait::async_trait;
use std::future::Future;
use std::rc::Rc;

/// The navigation a middleware is asked about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
	/// Clean target path, without the query string.
	pub to: String,
	/// Path that was current before this navigation started.
	pub from: Option<String>,
	/// Parsed query of the target location.
	pub query: QueryParams,
}

/// Middleware verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Next {
	/// Continue with the next entry, then the route.
	Proceed,
	/// Stop the navigation without rendering.
	Halt,
}

/// A stage of the middleware chain.
///
/// Plain closures `Fn(&Transition) -> Next` implement this trait; use
/// [`from_async_fn`] for asynchronous closures.
#[async_trait(?Send)]
pub trait Middleware {
	async fn handle(&self, transition: &Transition) -> Result<Next, CallbackError>;
}

#[async_trait(?Send)]
impl<F> Middleware for F
where
	F: Fn(&Transition) -> Next,
{
	async fn handle(&self, transition: &Transition) -> Result<Next, CallbackError> {
		Ok(self(transition))
	}
}

/// Middleware backed by an async closure.
pub struct AsyncFnMiddleware<F> {
	f: F,
}

#[async_trait(?Send)]
impl<F, Fut> Middleware for AsyncFnMiddleware<F>
where
	F: Fn(Transition) -> Fut,
	Fut: Future<Output = Result<Next, CallbackError>> + 'static,
{
	async fn handle(&self, transition: &Transition) -> Result<Next, CallbackError> {
		(self.f)(transition.clone()).await
	}
}

/// Wraps an async closure as [`Middleware`].
pub fn from_async_fn<F, Fut>(f: F) -> AsyncFnMiddleware<F>
where
	F: Fn(Transition) -> Fut,
	Fut: Future<Output = Result<Next, CallbackError>> + 'static,
{
	AsyncFnMiddleware { f }
}

/// Append-only, ordered middleware chain.
#[derive(Clone, Default)]
pub(crate) struct MiddlewareChain {
	entries: Vec<Rc<dyn Middleware>>,
}

impl MiddlewareChain {
	pub(crate) fn push(&mut self, middleware: Rc<dyn Middleware>) {
		self.entries.push(middleware);
	}

	pub(crate) fn len(&self) -> usize {
		self.entries.len()
	}

	/// Runs every entry in order until one halts or fails.
	pub(crate) async fn run(&self, transition: &Transition) -> Result<Next, RouterError> {
		for (index, middleware) in self.entries.iter().enumerate() {
			let next = middleware
				.handle(transition)
				.await
				.map_err(|e| RouterError::callback(CallbackStage::Middleware, e))?;

			if next == Next::Halt {
				tracing::debug!(index, to = %transition.to, "middleware halted navigation");
				return Ok(Next::Halt);
			}
		}
		Ok(Next::Proceed)
	}
}
