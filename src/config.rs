//! Router construction options.
//!
//! [`RouterConfig`] holds the serializable part of the options and can be
//! loaded from TOML or JSON; missing keys fall back to their defaults.
//!
//! ```
//! use reinhardt_navigation::{RouterConfig, RouterMode, ScrollBehavior};
//!
//! let config = RouterConfig::from_toml_str(r#"
//! mode = "history"
//! root = "/app"
//! scroll_behavior = "smooth"
//! "#).unwrap();
//!
//! assert_eq!(config.mode, RouterMode::History);
//! assert_eq!(config.fallback, "/404");
//! assert_eq!(config.scroll_behavior, ScrollBehavior::Smooth);
//! ```

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Path used when no registered pattern matches.
pub const DEFAULT_FALLBACK: &str = "/404";

/// Fixed redirect target used when a guard denies access.
pub const UNAUTHENTICATED_REDIRECT: &str = "/login";

/// Navigation backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouterMode {
	/// Fragment mode: the location lives after `#`.
	#[default]
	Hash,
	/// Address-bar mode: the History API drives the visible path.
	History,
}

/// Scroll restoration applied after each render.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrollBehavior {
	/// Jump to the origin immediately.
	#[default]
	Auto,
	/// Scroll to the origin smoothly.
	Smooth,
	/// Leave the scroll position alone.
	None,
}

/// Router construction options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
	/// Location backend to drive.
	pub mode: RouterMode,
	/// Prefix stripped from the address-bar path in history mode.
	pub root: String,
	/// Path navigated to, by replace, when no pattern matches.
	pub fallback: String,
	/// Scroll applied after each render.
	pub scroll_behavior: ScrollBehavior,
}

impl Default for RouterConfig {
	fn default() -> Self {
		Self::new(RouterMode::default())
	}
}

impl RouterConfig {
	/// Default options for `mode`.
	pub fn new(mode: RouterMode) -> Self {
		Self {
			mode,
			root: "/".to_string(),
			fallback: DEFAULT_FALLBACK.to_string(),
			scroll_behavior: ScrollBehavior::default(),
		}
	}

	/// Sets the address-bar root prefix.
	pub fn with_root(mut self, root: impl Into<String>) -> Self {
		self.root = root.into();
		self
	}

	/// Sets the fallback path.
	pub fn with_fallback(mut self, fallback: impl Into<String>) -> Self {
		self.fallback = fallback.into();
		self
	}

	/// Sets the scroll policy.
	pub fn with_scroll_behavior(mut self, behavior: ScrollBehavior) -> Self {
		self.scroll_behavior = behavior;
		self
	}

	/// Loads and validates a configuration from a TOML document.
	pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
		let config: Self = toml::from_str(source)?;
		config.validate()?;
		Ok(config)
	}

	/// Loads and validates a configuration from a JSON document.
	pub fn from_json_str(source: &str) -> Result<Self, ConfigError> {
		let config: Self = serde_json::from_str(source)?;
		config.validate()?;
		Ok(config)
	}

	/// Checks that `root` and `fallback` are absolute paths.
	pub fn validate(&self) -> Result<(), ConfigError> {
		if !self.root.starts_with('/') {
			return Err(ConfigError::Invalid {
				field: "root",
				reason: format!("'{}' must start with '/'", self.root),
			});
		}
		if !self.fallback.starts_with('/') {
			return Err(ConfigError::Invalid {
				field: "fallback",
				reason: format!("'{}' must start with '/'", self.fallback),
			});
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_defaults() {
		let config = RouterConfig::default();
		assert_eq!(config.mode, RouterMode::Hash);
		assert_eq!(config.root, "/");
		assert_eq!(config.fallback, "/404");
		assert_eq!(config.scroll_behavior, ScrollBehavior::Auto);
	}

	#[rstest]
	fn test_partial_json() {
		let config = RouterConfig::from_json_str(r#"{"scroll_behavior": "none"}"#).unwrap();
		assert_eq!(config.mode, RouterMode::Hash);
		assert_eq!(config.scroll_behavior, ScrollBehavior::None);
	}

	#[rstest]
	fn test_full_toml() {
		let config = RouterConfig::from_toml_str(
			r#"
mode = "history"
root = "/app"
fallback = "/not-found"
scroll_behavior = "smooth"
"#,
		)
		.unwrap();

		assert_eq!(
			config,
			RouterConfig::new(RouterMode::History)
				.with_root("/app")
				.with_fallback("/not-found")
				.with_scroll_behavior(ScrollBehavior::Smooth)
		);
	}

	#[rstest]
	fn test_unknown_mode_rejected() {
		let result = RouterConfig::from_toml_str(r#"mode = "memory""#);
		assert!(matches!(result, Err(ConfigError::Toml(_))));
	}

	#[rstest]
	#[case(r#"root = "app""#, "root")]
	#[case(r#"fallback = "404""#, "fallback")]
	fn test_validation(#[case] source: &str, #[case] field: &str) {
		let err = RouterConfig::from_toml_str(source).unwrap_err();
		assert!(matches!(err, ConfigError::Invalid { field: f, .. } if f == field));
	}
}
