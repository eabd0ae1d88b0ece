#![forbid(unsafe_code)]

//! `window.history` navigator and `popstate` hook.
//!
//! Only compiled on `wasm32` targets.
//!
//! # Failure Modes
//!
//! The [`Navigator`] trait is infallible, so DOM exceptions from
//! `location.search` or `history.pushState` are logged with `warn!` and the
//! operation degrades to "no query" / "no write".

use std::cell::RefCell;
use std::rc::Rc;

use js_sys::Function;
use sheet_stack::{HistoryMethod, Navigator, RestoreReport, SheetController};
use tracing::warn;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Event, Window};

use crate::href::compose_href;

const POPSTATE: &str = "popstate";

/// [`Navigator`] over the page's `location` and `history`.
#[derive(Debug, Clone)]
pub struct BrowserNavigator {
    window: Window,
}

impl BrowserNavigator {
    /// Navigator for the global window, or `None` outside a browsing context.
    #[must_use]
    pub fn new() -> Option<Self> {
        web_sys::window().map(Self::from_window)
    }

    #[must_use]
    pub fn from_window(window: Window) -> Self {
        Self { window }
    }

    #[must_use]
    pub fn window(&self) -> &Window {
        &self.window
    }
}

impl Navigator for BrowserNavigator {
    fn current_query(&self) -> String {
        match self.window.location().search() {
            Ok(search) => search.strip_prefix('?').unwrap_or(&search).to_owned(),
            Err(err) => {
                warn!(?err, "location.search unavailable");
                String::new()
            }
        }
    }

    fn write_query(&mut self, query: &str, method: HistoryMethod) {
        let location = self.window.location();
        let (Ok(path), Ok(hash)) = (location.pathname(), location.hash()) else {
            warn!("location.pathname or location.hash unavailable");
            return;
        };
        let url = compose_href(&path, query, &hash);

        let history = match self.window.history() {
            Ok(history) => history,
            Err(err) => {
                warn!(?err, "window.history unavailable");
                return;
            }
        };
        let result = match method {
            HistoryMethod::Push => {
                history.push_state_with_url(&JsValue::NULL, "", Some(url.as_str()))
            }
            HistoryMethod::Replace => {
                history.replace_state_with_url(&JsValue::NULL, "", Some(url.as_str()))
            }
        };
        if let Err(err) = result {
            warn!(?err, ?method, %url, "history write failed");
        }
    }
}

/// `popstate` listener that lives as long as this value.
///
/// The host typically forwards the callback to
/// [`SheetController::on_navigation`](sheet_stack::SheetController::on_navigation).
pub struct PopStateListener {
    window: Window,
    closure: Closure<dyn FnMut(Event)>,
}

impl PopStateListener {
    /// Register `on_pop` for back/forward navigation on `window`.
    pub fn install(window: &Window, mut on_pop: impl FnMut() + 'static) -> Result<Self, JsValue> {
        let closure = Closure::<dyn FnMut(Event)>::new(move |_event: Event| on_pop());
        window.add_event_listener_with_callback(POPSTATE, closure.as_ref().unchecked_ref())?;
        Ok(Self {
            window: window.clone(),
            closure,
        })
    }

    fn callback(&self) -> &Function {
        self.closure.as_ref().unchecked_ref()
    }
}

impl std::fmt::Debug for PopStateListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PopStateListener").finish_non_exhaustive()
    }
}

impl Drop for PopStateListener {
    fn drop(&mut self) {
        if let Err(err) = self
            .window
            .remove_event_listener_with_callback(POPSTATE, self.callback())
        {
            warn!(?err, "failed to remove popstate listener");
        }
    }
}

/// Restore `controller` from the current URL and keep it in step with
/// back/forward navigation until the returned listener is dropped.
pub fn attach(
    controller: &Rc<RefCell<SheetController<BrowserNavigator>>>,
) -> Result<(RestoreReport, PopStateListener), JsValue> {
    let (report, window) = {
        let mut c = controller.borrow_mut();
        (c.initialize_from_url(), c.navigator().window().clone())
    };
    let handle = Rc::clone(controller);
    let listener = PopStateListener::install(&window, move || match handle.try_borrow_mut() {
        Ok(mut c) => {
            c.on_navigation();
        }
        Err(_) => warn!("popstate during a sheet mutation; ignored"),
    })?;
    Ok((report, listener))
}
