//! Error types for client-side navigation.
//!
//! No-match and guard denial are not errors: they are routed to redirects
//! by the pipeline. Everything here is either raised while building the
//! route table or surfaced from a collaborator callback.

use std::fmt;

/// Boxed error returned by caller-supplied guards, hooks and middleware.
pub type CallbackError = Box<dyn std::error::Error + 'static>;

/// Error raised when a route pattern cannot be compiled.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatternError {
	#[error("pattern '{0}' must start with '/'")]
	MissingLeadingSlash(String),

	#[error("pattern length {length} exceeds maximum allowed length of {max} bytes")]
	TooLong { length: usize, max: usize },

	#[error("pattern has {count} path segments, exceeding maximum of {max}")]
	TooManySegments { count: usize, max: usize },

	#[error("empty parameter name in pattern '{0}'")]
	EmptyParamName(String),

	#[error("invalid parameter name '{name}' in pattern '{pattern}'")]
	InvalidParamName { pattern: String, name: String },

	#[error("duplicate parameter '{name}' in pattern '{pattern}'")]
	DuplicateParam { pattern: String, name: String },

	#[error("wildcard must be the last segment of pattern '{0}'")]
	WildcardNotLast(String),

	#[error("segment '{segment}' mixes '*' with literal text in pattern '{pattern}'")]
	MalformedWildcard { pattern: String, segment: String },

	#[error("failed to compile pattern regex: {0}")]
	Regex(String),
}

/// Error raised when router configuration cannot be loaded or is invalid.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	#[error("TOML error: {0}")]
	Toml(#[from] toml::de::Error),

	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),

	#[error("invalid {field}: {reason}")]
	Invalid { field: &'static str, reason: String },
}

/// Pipeline stage in which a collaborator callback failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackStage {
	/// A middleware entry.
	Middleware,
	/// The route guard.
	Guard,
	/// The enter hook of the resolved route.
	Enter,
	/// The exit hook of the previously active route.
	Exit,
}

impl fmt::Display for CallbackStage {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			Self::Middleware => "middleware",
			Self::Guard => "guard",
			Self::Enter => "enter hook",
			Self::Exit => "exit hook",
		};
		f.write_str(name)
	}
}

/// Error type for router operations.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum RouterError {
	/// A registered pattern failed to compile.
	#[error("invalid route pattern: {0}")]
	Pattern(#[from] PatternError),

	/// The same pattern string was registered twice.
	#[error("pattern '{0}' is already registered")]
	DuplicatePattern(String),

	/// Invalid route name for reverse lookup.
	#[error("invalid route name: {0}")]
	InvalidRouteName(String),

	/// Missing parameter for reverse URL.
	#[error("missing parameter: {0}")]
	MissingParameter(String),

	#[error("configuration error: {0}")]
	Config(#[from] ConfigError),

	/// The platform history primitive rejected the request.
	#[error("location backend error: {0}")]
	Location(String),

	/// A guard, hook or middleware returned an error.
	#[error("{stage} failed: {source}")]
	Callback {
		stage: CallbackStage,
		#[source]
		source: CallbackError,
	},

	/// Redirects kept chaining past the hop limit.
	#[error("redirect loop detected after {hops} hops ending at '{path}'")]
	RedirectLoop { path: String, hops: usize },
}

impl RouterError {
	pub(crate) fn callback(stage: CallbackStage, source: CallbackError) -> Self {
		Self::Callback { stage, source }
	}
}
