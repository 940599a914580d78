//! Query string parsing.

use std::collections::HashMap;
use std::collections::hash_map;

/// Flat, decoded query parameters. A repeated key keeps its last value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
	pairs: HashMap<String, String>,
}

impl QueryParams {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn get(&self, key: &str) -> Option<&str> {
		self.pairs.get(key).map(String::as_str)
	}

	pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
		self.pairs.insert(key.into(), value.into());
	}

	pub fn len(&self) -> usize {
		self.pairs.len()
	}

	pub fn is_empty(&self) -> bool {
		self.pairs.is_empty()
	}

	pub fn iter(&self) -> hash_map::Iter<'_, String, String> {
		self.pairs.iter()
	}

	pub fn as_map(&self) -> &HashMap<String, String> {
		&self.pairs
	}

	/// Encodes the pairs as `k=v&...`, keys sorted for stable output.
	pub fn to_query_string(&self) -> String {
		let mut keys: Vec<&String> = self.pairs.keys().collect();
		keys.sort();
		keys.into_iter()
			.map(|k| {
				format!(
					"{}={}",
					urlencoding::encode(k),
					urlencoding::encode(&self.pairs[k])
				)
			})
			.collect::<Vec<_>>()
			.join("&")
	}
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for QueryParams {
	fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
		let mut query = Self::new();
		for (k, v) in iter {
			query.insert(k, v);
		}
		query
	}
}

/// Splits a raw location at the first `?` into path and query string.
///
/// ```
/// use reinhardt_navigation::split_location;
///
/// assert_eq!(split_location("/search?q=rust"), ("/search", Some("q=rust")));
/// assert_eq!(split_location("/about"), ("/about", None));
/// ```
pub fn split_location(location: &str) -> (&str, Option<&str>) {
	match location.split_once('?') {
		Some((path, query)) => (path, Some(query)),
		None => (location, None),
	}
}

/// Parses a raw query string (without the leading `?`).
///
/// Pairs are split on `&`, then on the first `=`. Keys and values are
/// percent-decoded; a pair without `=` gets an empty value and a pair
/// with an empty key is dropped.
pub fn parse_query(raw: Option<&str>) -> QueryParams {
	let mut query = QueryParams::new();
	let Some(raw) = raw else {
		return query;
	};

	for pair in raw.split('&') {
		let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
		if key.is_empty() {
			continue;
		}
		query.insert(decode(key), decode(value));
	}
	query
}

// Invalid UTF-8 after decoding keeps the raw text.
fn decode(raw: &str) -> String {
	urlencoding::decode(raw)
		.map(|decoded| decoded.into_owned())
		.unwrap_or_else(|_| raw.to_string())
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_parse_pairs() {
		let query = parse_query(Some("a=1&b=2"));
		assert_eq!(query.len(), 2);
		assert_eq!(query.get("a"), Some("1"));
		assert_eq!(query.get("b"), Some("2"));
	}

	#[rstest]
	fn test_last_write_wins() {
		let query = parse_query(Some("a=1&a=2"));
		assert_eq!(query.len(), 1);
		assert_eq!(query.get("a"), Some("2"));
	}

	#[rstest]
	#[case(None)]
	#[case(Some(""))]
	fn test_empty_input(#[case] raw: Option<&str>) {
		assert!(parse_query(raw).is_empty());
	}

	#[rstest]
	fn test_pair_without_equals_has_empty_value() {
		let query = parse_query(Some("debug&page=2"));
		assert_eq!(query.get("debug"), Some(""));
		assert_eq!(query.get("page"), Some("2"));
	}

	#[rstest]
	#[case("=orphan")]
	#[case("&&")]
	#[case("=")]
	fn test_empty_keys_dropped(#[case] raw: &str) {
		assert!(parse_query(Some(raw)).is_empty());
	}

	#[rstest]
	fn test_splits_on_first_equals_only() {
		let query = parse_query(Some("expr=a=b"));
		assert_eq!(query.get("expr"), Some("a=b"));
	}

	#[rstest]
	fn test_percent_decoding() {
		let query = parse_query(Some("q=hello%20world&na%6De=x%2Fy"));
		assert_eq!(query.get("q"), Some("hello world"));
		assert_eq!(query.get("name"), Some("x/y"));
	}

	#[rstest]
	fn test_plus_is_not_a_space() {
		let query = parse_query(Some("q=a+b"));
		assert_eq!(query.get("q"), Some("a+b"));
	}

	#[rstest]
	fn test_invalid_utf8_kept_raw() {
		let query = parse_query(Some("q=%FF"));
		assert_eq!(query.get("q"), Some("%FF"));
	}

	#[rstest]
	#[case("/search?q=rust&page=2", "/search", Some("q=rust&page=2"))]
	#[case("/search?", "/search", Some(""))]
	#[case("/a?b?c", "/a", Some("b?c"))]
	#[case("/plain", "/plain", None)]
	fn test_split_location(
		#[case] location: &str,
		#[case] path: &str,
		#[case] query: Option<&str>,
	) {
		assert_eq!(split_location(location), (path, query));
	}

	#[rstest]
	fn test_to_query_string_sorted_and_encoded() {
		let query: QueryParams = [("b", "2"), ("a", "x y")].into_iter().collect();
		assert_eq!(query.to_query_string(), "a=x%20y&b=2");
	}
}
