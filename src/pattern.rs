//! Route pattern compilation and matching.
//!
//! Patterns are `/`-separated. Each segment is one of:
//!
//! - `:name` - captures a single non-empty segment (excludes `/`)
//! - `*` - captures the rest of the path, separators included, possibly empty
//! - anything else - matched literally
//!
//! Patterns are anchored at both ends, so `/users/:id` does not match
//! `/users/42/posts`. Captured values are returned verbatim, without
//! percent-decoding.

use crate::error::PatternError;
use std::collections::HashMap;

/// Maximum allowed length for a route pattern string in bytes.
const MAX_PATTERN_LENGTH: usize = 1024;

/// Maximum allowed number of path segments in a route pattern.
const MAX_PATTERN_SEGMENTS: usize = 32;

/// Maximum allowed size for a compiled pattern regex (in bytes).
const MAX_REGEX_SIZE: usize = 1 << 20; // 1 MiB

/// A classified pattern segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
	/// Text that must match exactly.
	Literal(String),
	/// `:name`, capturing one non-empty segment.
	Param(String),
	/// Trailing `*`, capturing the rest of the path.
	Wildcard,
}

/// Path parameters captured by a match, in pattern order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteParams {
	entries: Vec<(String, String)>,
	wildcard: Option<String>,
}

impl RouteParams {
	/// Creates an empty parameter set.
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns the value captured for `name`.
	pub fn get(&self, name: &str) -> Option<&str> {
		self.entries
			.iter()
			.find(|(key, _)| key == name)
			.map(|(_, value)| value.as_str())
	}

	/// Iterates over `(name, value)` pairs in left-to-right pattern order.
	pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
		self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
	}

	/// Parameter names in pattern order.
	pub fn names(&self) -> Vec<&str> {
		self.entries.iter().map(|(k, _)| k.as_str()).collect()
	}

	/// Number of named parameters.
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	/// Returns `true` if no named parameter was captured.
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Copies the named parameters into a map, losing their order.
	pub fn to_map(&self) -> HashMap<String, String> {
		self.entries.iter().cloned().collect()
	}

	/// Text captured by a trailing `*`. Not counted among the named entries.
	pub fn wildcard(&self) -> Option<&str> {
		self.wildcard.as_deref()
	}

	pub(crate) fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
		self.entries.push((name.into(), value.into()));
	}
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RouteParams {
	fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
		let mut params = Self::new();
		for (k, v) in iter {
			params.push(k, v);
		}
		params
	}
}

/// Result of matching a concrete path against a pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternMatch {
	pub params: RouteParams,
	/// Text captured by a trailing `*`, if the pattern has one.
	pub wildcard: Option<String>,
}

impl PatternMatch {
	/// Folds the wildcard capture into the parameters handed to callbacks.
	pub fn into_params(self) -> RouteParams {
		RouteParams {
			wildcard: self.wildcard,
			..self.params
		}
	}
}

/// A compiled route pattern.
///
/// Built once when the route table is constructed and never mutated.
#[derive(Debug, Clone)]
pub struct RoutePattern {
	/// The original pattern string.
	pattern: String,
	segments: Vec<Segment>,
	regex: regex::Regex,
}

impl RoutePattern {
	/// Compiles a pattern string.
	///
	/// # Errors
	///
	/// Returns a [`PatternError`] if the pattern does not start with `/`,
	/// exceeds the length or segment limits, names a parameter badly,
	/// repeats a parameter name, or places `*` anywhere but the final
	/// segment.
	pub fn new(pattern: &str) -> Result<Self, PatternError> {
		if pattern.len() > MAX_PATTERN_LENGTH {
			return Err(PatternError::TooLong {
				length: pattern.len(),
				max: MAX_PATTERN_LENGTH,
			});
		}
		if !pattern.starts_with('/') {
			return Err(PatternError::MissingLeadingSlash(pattern.to_string()));
		}

		let raw: Vec<&str> = pattern[1..].split('/').collect();
		if raw.len() > MAX_PATTERN_SEGMENTS {
			return Err(PatternError::TooManySegments {
				count: raw.len(),
				max: MAX_PATTERN_SEGMENTS,
			});
		}

		let segments = Self::classify(pattern, &raw)?;
		let regex = regex::RegexBuilder::new(&Self::compile(&segments))
			.size_limit(MAX_REGEX_SIZE)
			.build()
			.map_err(|e| PatternError::Regex(e.to_string()))?;

		Ok(Self {
			pattern: pattern.to_string(),
			segments,
			regex,
		})
	}

	fn classify(pattern: &str, raw: &[&str]) -> Result<Vec<Segment>, PatternError> {
		let mut segments = Vec::with_capacity(raw.len());
		let mut seen: Vec<&str> = Vec::new();

		for (index, segment) in raw.iter().enumerate() {
			if let Some(name) = segment.strip_prefix(':') {
				if name.is_empty() {
					return Err(PatternError::EmptyParamName(pattern.to_string()));
				}
				if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
					return Err(PatternError::InvalidParamName {
						pattern: pattern.to_string(),
						name: name.to_string(),
					});
				}
				if seen.contains(&name) {
					return Err(PatternError::DuplicateParam {
						pattern: pattern.to_string(),
						name: name.to_string(),
					});
				}
				seen.push(name);
				segments.push(Segment::Param(name.to_string()));
			} else if *segment == "*" {
				if index + 1 != raw.len() {
					return Err(PatternError::WildcardNotLast(pattern.to_string()));
				}
				segments.push(Segment::Wildcard);
			} else if segment.contains('*') {
				return Err(PatternError::MalformedWildcard {
					pattern: pattern.to_string(),
					segment: segment.to_string(),
				});
			} else {
				segments.push(Segment::Literal(segment.to_string()));
			}
		}

		Ok(segments)
	}

	fn compile(segments: &[Segment]) -> String {
		let mut regex_str = String::from("^");
		for segment in segments {
			regex_str.push('/');
			match segment {
				Segment::Literal(text) => regex_str.push_str(&regex::escape(text)),
				// Parameters must capture at least one character.
				Segment::Param(_) => regex_str.push_str("([^/]+)"),
				Segment::Wildcard => regex_str.push_str("(.*)"),
			}
		}
		regex_str.push('$');
		regex_str
	}

	/// Returns the original pattern string.
	pub fn as_str(&self) -> &str {
		&self.pattern
	}

	pub fn segments(&self) -> &[Segment] {
		&self.segments
	}

	/// Returns the parameter names in pattern order.
	pub fn param_names(&self) -> Vec<&str> {
		self.segments
			.iter()
			.filter_map(|s| match s {
				Segment::Param(name) => Some(name.as_str()),
				_ => None,
			})
			.collect()
	}

	pub fn has_wildcard(&self) -> bool {
		matches!(self.segments.last(), Some(Segment::Wildcard))
	}

	/// Attempts to match a path against this pattern.
	pub fn matches(&self, path: &str) -> Option<PatternMatch> {
		let caps = self.regex.captures(path)?;
		let mut params = RouteParams::new();
		let mut wildcard = None;

		let mut group = 1;
		for segment in &self.segments {
			match segment {
				Segment::Literal(_) => continue,
				Segment::Param(name) => {
					let value = caps.get(group).map(|m| m.as_str()).unwrap_or_default();
					params.push(name.as_str(), value);
				}
				Segment::Wildcard => {
					wildcard = caps.get(group).map(|m| m.as_str().to_string());
				}
			}
			group += 1;
		}

		Some(PatternMatch { params, wildcard })
	}

	/// Checks if this pattern would match the given path.
	pub fn is_match(&self, path: &str) -> bool {
		self.regex.is_match(path)
	}

	/// Builds a concrete path from this pattern.
	///
	/// Returns the name of the first missing parameter on failure. A
	/// trailing wildcard is filled from `wildcard`, or left empty.
	pub fn reverse(
		&self,
		params: &HashMap<String, String>,
		wildcard: Option<&str>,
	) -> Result<String, String> {
		let mut path = String::new();
		for segment in &self.segments {
			path.push('/');
			match segment {
				Segment::Literal(text) => path.push_str(text),
				Segment::Param(name) => {
					let value = params.get(name).ok_or_else(|| name.clone())?;
					path.push_str(value);
				}
				Segment::Wildcard => path.push_str(wildcard.unwrap_or_default()),
			}
		}
		Ok(path)
	}
}

impl PartialEq for RoutePattern {
	fn eq(&self, other: &Self) -> bool {
		self.pattern == other.pattern
	}
}

impl Eq for RoutePattern {}

impl std::fmt::Display for RoutePattern {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.pattern)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_root_pattern() {
		let pattern = RoutePattern::new("/").unwrap();
		assert!(pattern.is_match("/"));
		assert!(!pattern.is_match("/users"));
		assert!(!pattern.is_match(""));
	}

	#[rstest]
	fn test_literal_pattern_is_anchored() {
		let pattern = RoutePattern::new("/users").unwrap();
		assert!(pattern.is_match("/users"));
		assert!(!pattern.is_match("/users/"));
		assert!(!pattern.is_match("/users/42"));
		assert!(!pattern.is_match("/api/users"));
	}

	#[rstest]
	fn test_single_param() {
		let pattern = RoutePattern::new("/profile/:id").unwrap();
		let m = pattern.matches("/profile/42").unwrap();

		assert_eq!(m.params.get("id"), Some("42"));
		assert_eq!(m.wildcard, None);
	}

	#[rstest]
	fn test_params_in_pattern_order() {
		let pattern = RoutePattern::new("/orgs/:org/repos/:repo/issues/:number").unwrap();
		let m = pattern.matches("/orgs/acme/repos/web/issues/7").unwrap();

		assert_eq!(m.params.names(), vec!["org", "repo", "number"]);
		let values: Vec<&str> = m.params.iter().map(|(_, v)| v).collect();
		assert_eq!(values, vec!["acme", "web", "7"]);
		assert_eq!(pattern.param_names(), vec!["org", "repo", "number"]);
	}

	#[rstest]
	fn test_param_values_are_not_decoded() {
		let pattern = RoutePattern::new("/search/:term").unwrap();
		let m = pattern.matches("/search/a%20b").unwrap();
		assert_eq!(m.params.get("term"), Some("a%20b"));
	}

	#[rstest]
	fn test_param_requires_non_empty_segment() {
		let pattern = RoutePattern::new("/users/:id").unwrap();
		assert!(!pattern.is_match("/users/"));
		assert!(!pattern.is_match("/users"));
	}

	#[rstest]
	fn test_param_does_not_cross_separator() {
		let pattern = RoutePattern::new("/users/:id").unwrap();
		assert!(!pattern.is_match("/users/42/posts"));
	}

	#[rstest]
	#[case("/files/a/b/c", "a/b/c")]
	#[case("/files/readme.md", "readme.md")]
	#[case("/files/", "")]
	fn test_wildcard_is_greedy(#[case] path: &str, #[case] captured: &str) {
		let pattern = RoutePattern::new("/files/*").unwrap();
		let m = pattern.matches(path).unwrap();

		assert_eq!(m.wildcard.as_deref(), Some(captured));
		assert!(m.params.is_empty());
	}

	#[rstest]
	fn test_wildcard_folded_into_params() {
		let pattern = RoutePattern::new("/docs/:lang/*").unwrap();
		let params = pattern.matches("/docs/en/guide/intro").unwrap().into_params();

		assert_eq!(params.names(), vec!["lang"]);
		assert_eq!(params.wildcard(), Some("guide/intro"));
	}

	#[rstest]
	fn test_wildcard_with_param() {
		let pattern = RoutePattern::new("/repos/:repo/*").unwrap();
		let m = pattern.matches("/repos/web/src/lib.rs").unwrap();

		assert_eq!(m.params.get("repo"), Some("web"));
		assert_eq!(m.wildcard.as_deref(), Some("src/lib.rs"));
	}

	#[rstest]
	fn test_literal_special_chars_escaped() {
		let pattern = RoutePattern::new("/api/v1.0").unwrap();
		assert!(pattern.is_match("/api/v1.0"));
		assert!(!pattern.is_match("/api/v1X0"));
	}

	#[rstest]
	#[case("users", "must start with '/'")]
	#[case("/users/:", "empty parameter name")]
	#[case("/users/:user-id", "invalid parameter name")]
	#[case("/a/:id/b/:id", "duplicate parameter")]
	#[case("/files/*/raw", "wildcard must be the last segment")]
	#[case("/files/*.txt", "mixes '*'")]
	fn test_malformed_patterns_rejected(#[case] input: &str, #[case] message: &str) {
		let err = RoutePattern::new(input).unwrap_err();
		assert!(
			err.to_string().contains(message),
			"unexpected error for {input}: {err}"
		);
	}

	#[rstest]
	fn test_pattern_rejects_excessive_length() {
		// Arrange
		let long_pattern = "/".to_string() + &"a".repeat(1025);

		// Act
		let result = RoutePattern::new(&long_pattern);

		// Assert
		assert!(matches!(result, Err(PatternError::TooLong { .. })));
	}

	#[rstest]
	fn test_pattern_rejects_excessive_segments() {
		// Arrange
		let segments: Vec<&str> = (0..35).map(|_| "seg").collect();
		let pattern = format!("/{}", segments.join("/"));

		// Act
		let result = RoutePattern::new(&pattern);

		// Assert
		assert!(matches!(result, Err(PatternError::TooManySegments { .. })));
	}

	#[rstest]
	fn test_reverse() {
		let pattern = RoutePattern::new("/users/:user_id/posts/:post_id").unwrap();
		let params: HashMap<String, String> = [("user_id", "10"), ("post_id", "20")]
			.into_iter()
			.map(|(k, v)| (k.to_string(), v.to_string()))
			.collect();

		assert_eq!(
			pattern.reverse(&params, None),
			Ok("/users/10/posts/20".to_string())
		);
	}

	#[rstest]
	fn test_reverse_missing_param() {
		let pattern = RoutePattern::new("/users/:id").unwrap();
		assert_eq!(pattern.reverse(&HashMap::new(), None), Err("id".to_string()));
	}

	#[rstest]
	fn test_reverse_wildcard() {
		let pattern = RoutePattern::new("/files/*").unwrap();
		assert_eq!(
			pattern.reverse(&HashMap::new(), Some("a/b")),
			Ok("/files/a/b".to_string())
		);
	}

	#[rstest]
	fn test_pattern_equality_and_display() {
		let p1 = RoutePattern::new("/users/:id").unwrap();
		let p2 = RoutePattern::new("/users/:id").unwrap();
		let p3 = RoutePattern::new("/users/:user_id").unwrap();

		assert_eq!(p1, p2);
		assert_ne!(p1, p3);
		assert_eq!(p1.to_string(), "/users/:id");
	}
}
