use super::{
	LocationBackend, LocationEvent, LocationListener, fragment_path, join_root, normalize_path,
	strip_root, url_fragment_path,
};
use crate::config::{RouterConfig, RouterMode, ScrollBehavior};
use crate::error::RouterError;
use std::rc::Rc;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Event, HashChangeEvent, HtmlElement, MouseEvent, ScrollToOptions, Window};

fn js_error(context: &str, err: JsValue) -> RouterError {
	RouterError::Location(format!("{}: {:?}", context, err))
}

/// Location backend driving `window.location` and `window.history`.
#[derive(Debug, Clone)]
pub struct BrowserLocation {
	window: Window,
	mode: RouterMode,
	root: String,
}

impl BrowserLocation {
	pub fn new(config: &RouterConfig) -> Result<Self, RouterError> {
		let window = web_sys::window()
			.ok_or_else(|| RouterError::Location("No window object".to_string()))?;
		Ok(Self {
			window,
			mode: config.mode,
			root: config.root.clone(),
		})
	}

	fn history(&self) -> Result<web_sys::History, RouterError> {
		self.window
			.history()
			.map_err(|e| js_error("history unavailable", e))
	}

	fn state_value(state: Option<&serde_json::Value>) -> JsValue {
		state
			.and_then(|value| js_sys::JSON::parse(&value.to_string()).ok())
			.unwrap_or(JsValue::NULL)
	}

	fn listen(&self, event: &str, listener: LocationListener) -> Result<(), RouterError> {
		let this = self.clone();
		let handler = Closure::wrap(Box::new(move |event: Event| {
			// Several fragment writes in one turn all dispatch after the last
			// one, so read the URL each event carries.
			let location = match event.dyn_ref::<HashChangeEvent>() {
				Some(change) => url_fragment_path(&change.new_url()),
				None => this.current(),
			};
			listener(LocationEvent::Changed(location));
		}) as Box<dyn FnMut(_)>);

		self.window
			.add_event_listener_with_callback(event, handler.as_ref().unchecked_ref())
			.map_err(|e| js_error(event, e))?;
		// The router lives as long as the page.
		handler.forget();
		Ok(())
	}

	/// Intercepts same-origin link clicks in address-bar mode.
	fn intercept_links(&self, listener: LocationListener) -> Result<(), RouterError> {
		let document = self
			.window
			.document()
			.ok_or_else(|| RouterError::Location("No document object".to_string()))?;
		let root = self.root.clone();

		let handler = Closure::wrap(Box::new(move |event: Event| {
			if event.default_prevented() {
				return;
			}
			if let Some(mouse) = event.dyn_ref::<MouseEvent>()
				&& (mouse.button() != 0
					|| mouse.ctrl_key()
					|| mouse.meta_key()
					|| mouse.shift_key()
					|| mouse.alt_key())
			{
				return;
			}
			let Some(element) = event
				.target()
				.and_then(|t| t.dyn_into::<HtmlElement>().ok())
			else {
				return;
			};

			// Walk up to the enclosing anchor.
			let mut current = Some(element);
			while let Some(el) = current {
				if el.tag_name().eq_ignore_ascii_case("a") {
					let Some(href) = el.get_attribute("href") else {
						return;
					};
					if !href.starts_with('/') || href.starts_with("//") {
						return;
					}
					if el.has_attribute("download") {
						return;
					}
					if let Some(target) = el.get_attribute("target")
						&& !target.is_empty()
						&& target != "_self"
					{
						return;
					}
					event.prevent_default();
					listener(LocationEvent::LinkActivated(strip_root(&root, &href)));
					return;
				}
				current = el
					.parent_element()
					.and_then(|p| p.dyn_into::<HtmlElement>().ok());
			}
		}) as Box<dyn FnMut(_)>);

		document
			.add_event_listener_with_callback("click", handler.as_ref().unchecked_ref())
			.map_err(|e| js_error("click", e))?;
		handler.forget();
		Ok(())
	}
}

impl LocationBackend for BrowserLocation {
	fn mode(&self) -> RouterMode {
		self.mode
	}

	fn current(&self) -> String {
		let location = self.window.location();
		match self.mode {
			RouterMode::Hash => fragment_path(&location.hash().unwrap_or_default()),
			RouterMode::History => {
				let pathname = location.pathname().unwrap_or_else(|_| "/".to_string());
				let search = location.search().unwrap_or_default();
				strip_root(&self.root, &format!("{}{}", pathname, search))
			}
		}
	}

	fn push(&self, path: &str, state: Option<&serde_json::Value>) -> Result<(), RouterError> {
		match self.mode {
			// Fragment history entries carry no state.
			RouterMode::Hash => self
				.window
				.location()
				.set_hash(&normalize_path(path))
				.map_err(|e| js_error("set_hash", e)),
			RouterMode::History => self
				.history()?
				.push_state_with_url(
					&Self::state_value(state),
					"",
					Some(&join_root(&self.root, path)),
				)
				.map_err(|e| js_error("pushState", e)),
		}
	}

	fn replace(&self, path: &str, state: Option<&serde_json::Value>) -> Result<(), RouterError> {
		match self.mode {
			RouterMode::Hash => self
				.window
				.location()
				.replace(&format!("#{}", normalize_path(path)))
				.map_err(|e| js_error("location.replace", e)),
			RouterMode::History => self
				.history()?
				.replace_state_with_url(
					&Self::state_value(state),
					"",
					Some(&join_root(&self.root, path)),
				)
				.map_err(|e| js_error("replaceState", e)),
		}
	}

	fn back(&self) -> Result<(), RouterError> {
		self.history()?
			.back()
			.map_err(|e| js_error("history.back", e))
	}

	fn forward(&self) -> Result<(), RouterError> {
		self.history()?
			.forward()
			.map_err(|e| js_error("history.forward", e))
	}

	fn scroll_to_top(&self, behavior: ScrollBehavior) {
		match behavior {
			ScrollBehavior::None => {}
			ScrollBehavior::Auto => self.window.scroll_to_with_x_and_y(0.0, 0.0),
			ScrollBehavior::Smooth => {
				let options = ScrollToOptions::new();
				options.set_top(0.0);
				options.set_left(0.0);
				options.set_behavior(web_sys::ScrollBehavior::Smooth);
				self.window.scroll_to_with_scroll_to_options(&options);
			}
		}
	}

	fn subscribe(&self, listener: LocationListener) -> Result<(), RouterError> {
		match self.mode {
			RouterMode::Hash => self.listen("hashchange", listener),
			RouterMode::History => {
				self.listen("popstate", Rc::clone(&listener))?;
				self.intercept_links(listener)
			}
		}
	}
}
