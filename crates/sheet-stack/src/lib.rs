#![forbid(unsafe_code)]

//! Sheet Stack
//!
//! URL-addressable stack of overlay sheets. Application code opens typed
//! sheets (client form, case details, ...) on a stack; the visible sheet is
//! the top of the stack, and its identity lives in the query string so that
//! deep links, reloads and browser back/forward all reconstruct the same
//! view.
//!
//! # Key Components
//!
//! - [`SheetDescriptor`] - Immutable description of one open sheet
//! - [`SheetStack`] - In-memory stack with typed `open_*` operations
//! - [`SheetController`] - Stack mirrored into a [`Navigator`] on every mutation
//! - [`query`] - Stack ⇄ query-string codec, total on malformed input
//! - [`SheetRegistry`] - Kind → renderer lookup for the host UI
//! - [`DraftCache`] - Unsubmitted form values keyed by slug
//! - [`SheetSyncConfig`] - Query key, restore policy and history method as data
//!
//! # How it fits in the system
//!
//! The core has no browser dependency. Hosts supply a [`Navigator`]:
//! [`MemoryNavigator`] for tests and native shells, or the
//! `BrowserNavigator` in `sheet-stack-web` for wasm builds.

pub mod config;
pub mod descriptor;
pub mod drafts;
pub mod error;
pub mod navigator;
pub mod query;
pub mod registry;
pub mod stack;
pub mod sync;

pub use config::{RestorePolicy, SheetSyncConfig};
pub use descriptor::{
    DescriptorParts, EntityId, FormTarget, MAX_ENTITY_ID_LEN, MAX_SLUG_LEN, SheetContent,
    SheetDescriptor, SheetKind, SheetMode, SheetSize, Slug,
};
pub use drafts::DraftCache;
pub use error::{ConfigError, Result, SheetError};
pub use navigator::{HistoryMethod, MemoryNavigator, Navigator};
pub use query::{DecodeOutcome, decode_query, encode_stack, merge_into_query, same_query};
pub use registry::SheetRegistry;
pub use stack::{DetailsParams, FormParams, OpenMode, SheetStack};
pub use sync::{RestoreReport, SheetController};
