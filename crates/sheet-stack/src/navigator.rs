#![forbid(unsafe_code)]

//! Routing boundary.
//!
//! The controller only needs three things from the hosting router: read the
//! current query string, write a new one without reloading, and be told when
//! the user navigated back or forward. The first two are the [`Navigator`]
//! trait; the third is the host calling
//! [`SheetController::on_navigation`](crate::SheetController::on_navigation).
//!
//! [`MemoryNavigator`] keeps a history list in process. Native hosts and
//! tests use it; the browser adapter lives in `sheet-stack-web`.

use serde::{Deserialize, Serialize};

/// How a URL write lands in the session history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryMethod {
    /// Overwrite the current history entry.
    Replace,
    /// Add a new entry, so browser back closes the sheet.
    #[default]
    Push,
}

/// Read/write access to the query string of the current location.
pub trait Navigator {
    /// Current query string, without the leading `?`.
    fn current_query(&self) -> String;

    /// Replace the query string. Must not trigger a full navigation.
    fn write_query(&mut self, query: &str, method: HistoryMethod);
}

impl<N: Navigator + ?Sized> Navigator for &mut N {
    fn current_query(&self) -> String {
        (**self).current_query()
    }

    fn write_query(&mut self, query: &str, method: HistoryMethod) {
        (**self).write_query(query, method);
    }
}

impl<N: Navigator + ?Sized> Navigator for Box<N> {
    fn current_query(&self) -> String {
        (**self).current_query()
    }

    fn write_query(&mut self, query: &str, method: HistoryMethod) {
        (**self).write_query(query, method);
    }
}

/// In-process session history.
///
/// # Invariants
///
/// 1. `entries` is never empty and `cursor < entries.len()`.
/// 2. A push discards every entry after the cursor (new branch).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryNavigator {
    entries: Vec<String>,
    cursor: usize,
    writes: u64,
}

impl Default for MemoryNavigator {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryNavigator {
    /// Start at an empty query.
    #[must_use]
    pub fn new() -> Self {
        Self::with_query("")
    }

    /// Start at `query` (a leading `?` is stripped).
    #[must_use]
    pub fn with_query(query: &str) -> Self {
        Self {
            entries: vec![strip_question_mark(query).to_owned()],
            cursor: 0,
            writes: 0,
        }
    }

    /// Step back one entry. Returns `false` at the start of history.
    pub fn back(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor -= 1;
        true
    }

    /// Step forward one entry. Returns `false` at the end of history.
    pub fn forward(&mut self) -> bool {
        if self.cursor + 1 >= self.entries.len() {
            return false;
        }
        self.cursor += 1;
        true
    }

    /// Simulate the user editing the address bar.
    pub fn visit(&mut self, query: &str) {
        self.push_entry(strip_question_mark(query).to_owned());
    }

    /// Number of history entries.
    #[must_use]
    pub fn history_len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Number of [`write_query`](Navigator::write_query) calls so far.
    #[must_use]
    pub fn writes(&self) -> u64 {
        self.writes
    }

    #[must_use]
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    fn push_entry(&mut self, query: String) {
        self.entries.truncate(self.cursor + 1);
        self.entries.push(query);
        self.cursor = self.entries.len() - 1;
    }
}

impl Navigator for MemoryNavigator {
    fn current_query(&self) -> String {
        self.entries[self.cursor].clone()
    }

    fn write_query(&mut self, query: &str, method: HistoryMethod) {
        self.writes += 1;
        let query = strip_question_mark(query).to_owned();
        match method {
            HistoryMethod::Replace => self.entries[self.cursor] = query,
            HistoryMethod::Push => self.push_entry(query),
        }
    }
}

fn strip_question_mark(query: &str) -> &str {
    query.strip_prefix('?').unwrap_or(query)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_with_single_entry() {
        let nav = MemoryNavigator::with_query("?page=2");
        assert_eq!(nav.current_query(), "page=2");
        assert_eq!(nav.history_len(), 1);
        assert_eq!(nav.writes(), 0);
    }

    #[test]
    fn replace_overwrites_current_entry() {
        let mut nav = MemoryNavigator::new();
        nav.write_query("a=1", HistoryMethod::Replace);
        assert_eq!(nav.history_len(), 1);
        assert_eq!(nav.current_query(), "a=1");
    }

    #[test]
    fn push_then_back_and_forward() {
        let mut nav = MemoryNavigator::new();
        nav.write_query("a=1", HistoryMethod::Push);
        nav.write_query("a=2", HistoryMethod::Push);
        assert_eq!(nav.history_len(), 3);

        assert!(nav.back());
        assert_eq!(nav.current_query(), "a=1");
        assert!(nav.back());
        assert_eq!(nav.current_query(), "");
        assert!(!nav.back());

        assert!(nav.forward());
        assert!(nav.forward());
        assert!(!nav.forward());
        assert_eq!(nav.current_query(), "a=2");
    }

    #[test]
    fn push_after_back_discards_forward_entries() {
        let mut nav = MemoryNavigator::new();
        nav.write_query("a=1", HistoryMethod::Push);
        nav.write_query("a=2", HistoryMethod::Push);
        nav.back();
        nav.write_query("b=1", HistoryMethod::Push);
        assert_eq!(nav.entries(), ["", "a=1", "b=1"]);
        assert!(!nav.forward());
    }

    #[test]
    fn navigator_through_mut_ref() {
        fn write(nav: &mut impl Navigator) {
            nav.write_query("x=1", HistoryMethod::Replace);
        }
        let mut nav = MemoryNavigator::new();
        write(&mut &mut nav);
        assert_eq!(nav.current_query(), "x=1");
    }
}
