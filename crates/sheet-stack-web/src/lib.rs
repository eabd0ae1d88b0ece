#![forbid(unsafe_code)]

//! Browser host adapter for `sheet-stack`.
//!
//! On `wasm32` this crate provides [`BrowserNavigator`], a
//! [`Navigator`](sheet_stack::Navigator) backed by `window.location` and
//! `window.history`, plus [`PopStateListener`] and [`attach`] to re-run URL
//! restoration on back/forward navigation.
//!
//! The [`href`] helpers are platform independent and tested natively.

pub mod href;

#[cfg(target_arch = "wasm32")]
mod browser;

#[cfg(target_arch = "wasm32")]
pub use browser::{BrowserNavigator, PopStateListener, attach};

pub use href::{HrefParts, compose_href, split_href, with_query};
