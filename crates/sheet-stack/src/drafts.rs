#![forbid(unsafe_code)]

//! Per-sheet draft values keyed by slug.
//!
//! Forms rendered inside a sheet save their unsubmitted values here so that
//! closing and reopening a sheet of the same family restores the draft. The
//! cache stores opaque JSON; the form decides the shape.
//!
//! The whole cache serializes to a JSON object keyed by slug, which the host
//! may stash in session storage between reloads.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::descriptor::Slug;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DraftCache {
    drafts: BTreeMap<Slug, Value>,
}

impl DraftCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` for `slug`, returning the previous draft.
    pub fn save(&mut self, slug: &Slug, value: Value) -> Option<Value> {
        self.drafts.insert(slug.clone(), value)
    }

    /// Serialize `value` and store it for `slug`.
    pub fn save_as<T: Serialize>(&mut self, slug: &Slug, value: &T) -> serde_json::Result<()> {
        self.save(slug, serde_json::to_value(value)?);
        Ok(())
    }

    #[must_use]
    pub fn restore(&self, slug: &Slug) -> Option<&Value> {
        self.drafts.get(slug)
    }

    /// Deserialize the draft for `slug`. `None` when there is no draft.
    pub fn restore_as<T: DeserializeOwned>(&self, slug: &Slug) -> Option<serde_json::Result<T>> {
        self.restore(slug).map(|value| T::deserialize(value))
    }

    /// Remove and return the draft for `slug`.
    pub fn take(&mut self, slug: &Slug) -> Option<Value> {
        self.drafts.remove(slug)
    }

    /// Drop the draft for `slug`. Returns whether one existed.
    pub fn discard(&mut self, slug: &Slug) -> bool {
        self.drafts.remove(slug).is_some()
    }

    pub fn clear(&mut self) {
        self.drafts.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.drafts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.drafts.is_empty()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Parse a cache written by [`to_json`](Self::to_json). Invalid slugs
    /// are rejected.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}
