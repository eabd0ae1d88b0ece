#![forbid(unsafe_code)]

//! URL-synchronized sheet controller.
//!
//! [`SheetController`] is the only component that reads or writes the sheet
//! portion of the URL. It wraps a [`SheetStack`] and a [`Navigator`]:
//!
//! ```text
//! open_* / close / reset ──▶ SheetStack ──▶ merge_into_query ──▶ Navigator::write_query
//!
//! mount / popstate ──▶ Navigator::current_query ──▶ decode_query ──▶ SheetStack::replace
//! ```
//!
//! # Invariants
//!
//! 1. After any successful mutation returns, the navigator's query encodes
//!    the new stack (same call, no deferred write).
//! 2. A failed `open_*` writes nothing.
//! 3. [`on_navigation`](SheetController::on_navigation) never writes; the
//!    URL is the source of truth at that moment.
//! 4. No write is issued when the rendered query equals the current one.

use tracing::{debug, info_span};

use crate::config::SheetSyncConfig;
use crate::descriptor::SheetDescriptor;
use crate::drafts::DraftCache;
use crate::error::{ConfigError, Result};
use crate::navigator::{HistoryMethod, Navigator};
use crate::query::{self, DecodeOutcome};
use crate::stack::{DetailsParams, FormParams, OpenMode, SheetStack};

/// Summary of a URL → stack restore.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RestoreReport {
    /// Levels installed into the stack.
    pub restored: usize,
    /// Levels present in the URL that were discarded.
    pub dropped: usize,
}

/// Sheet stack mirrored into a navigator's query string.
#[derive(Debug)]
pub struct SheetController<N: Navigator> {
    stack: SheetStack,
    navigator: N,
    config: SheetSyncConfig,
    drafts: DraftCache,
}

impl<N: Navigator> SheetController<N> {
    /// Controller with [`SheetSyncConfig::default`]. The stack starts empty;
    /// call [`initialize_from_url`](Self::initialize_from_url) on mount.
    pub fn new(navigator: N) -> Self {
        Self {
            stack: SheetStack::new(),
            navigator,
            config: SheetSyncConfig::default(),
            drafts: DraftCache::new(),
        }
    }

    /// Controller with a validated custom configuration.
    pub fn with_config(
        navigator: N,
        config: SheetSyncConfig,
    ) -> std::result::Result<Self, ConfigError> {
        Ok(Self {
            config: config.validated()?,
            ..Self::new(navigator)
        })
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    pub fn open(&mut self, descriptor: SheetDescriptor, mode: OpenMode) {
        self.stack.open(descriptor, mode);
        self.write_url(self.config.history);
    }

    pub fn open_client_form(&mut self, params: FormParams) -> Result<()> {
        self.apply(|stack| stack.open_client_form(params).map(drop))
    }

    pub fn open_client_details(&mut self, params: DetailsParams) -> Result<()> {
        self.apply(|stack| stack.open_client_details(params).map(drop))
    }

    pub fn open_case_form(&mut self, params: FormParams) -> Result<()> {
        self.apply(|stack| stack.open_case_form(params).map(drop))
    }

    pub fn open_case_details(&mut self, params: DetailsParams) -> Result<()> {
        self.apply(|stack| stack.open_case_details(params).map(drop))
    }

    pub fn open_trial_form(&mut self, params: FormParams) -> Result<()> {
        self.apply(|stack| stack.open_trial_form(params).map(drop))
    }

    pub fn open_opponent_form(&mut self, params: FormParams) -> Result<()> {
        self.apply(|stack| stack.open_opponent_form(params).map(drop))
    }

    /// Pop the active sheet. No-op (and no URL write) when empty.
    pub fn close(&mut self) -> Option<SheetDescriptor> {
        let closed = self.stack.close()?;
        self.write_url(self.config.history);
        Some(closed)
    }

    /// Close every sheet. Returns how many were open.
    pub fn close_all(&mut self) -> usize {
        let closed = self.stack.close_all();
        if closed > 0 {
            self.write_url(self.config.history);
        }
        closed
    }

    /// Alias of [`close_all`](Self::close_all).
    pub fn reset(&mut self) -> usize {
        self.close_all()
    }

    /// Clear the stack and every saved draft.
    pub fn sign_out(&mut self) {
        self.drafts.clear();
        self.stack.close_all();
        self.write_url(HistoryMethod::Replace);
    }

    fn apply(&mut self, op: impl FnOnce(&mut SheetStack) -> Result<()>) -> Result<()> {
        op(&mut self.stack)?;
        self.write_url(self.config.history);
        Ok(())
    }

    // ========================================================================
    // URL → stack
    // ========================================================================

    /// Rebuild the stack from the current URL, discarding what is in memory.
    ///
    /// Malformed levels are dropped, never reported as errors, as are lower
    /// levels the restore policy does not keep. When anything was dropped the
    /// URL is rewritten in place so the address bar matches the restored
    /// stack.
    pub fn initialize_from_url(&mut self) -> RestoreReport {
        let _span = info_span!("sheet.initialize_from_url").entered();
        let report = self.restore();
        if report.dropped > 0 {
            self.write_url(HistoryMethod::Replace);
        }
        report
    }

    /// Back/forward hook: re-read the URL without writing it.
    pub fn on_navigation(&mut self) -> RestoreReport {
        let _span = info_span!("sheet.on_navigation").entered();
        self.restore()
    }

    fn restore(&mut self) -> RestoreReport {
        let query = self.navigator.current_query();
        let DecodeOutcome {
            descriptors,
            dropped,
        } = query::decode_query(&query, &self.config);
        let report = RestoreReport {
            restored: descriptors.len(),
            dropped,
        };
        self.stack.replace(descriptors);
        debug!(
            restored = report.restored,
            dropped = report.dropped,
            "sheet stack restored from url"
        );
        report
    }

    // ========================================================================
    // Stack → URL
    // ========================================================================

    fn write_url(&mut self, method: HistoryMethod) {
        let current = self.navigator.current_query();
        let next = query::merge_into_query(&current, &self.stack, &self.config);
        if query::same_query(&current, &next) {
            return;
        }
        debug!(
            depth = self.stack.len(),
            ?method,
            query = %next,
            "sheet url write"
        );
        self.navigator.write_query(&next, method);
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    #[must_use]
    pub fn active(&self) -> Option<&SheetDescriptor> {
        self.stack.active()
    }

    #[must_use]
    pub fn stack(&self) -> &SheetStack {
        &self.stack
    }

    #[must_use]
    pub fn config(&self) -> &SheetSyncConfig {
        &self.config
    }

    #[must_use]
    pub fn navigator(&self) -> &N {
        &self.navigator
    }

    /// Mutable access for host-driven navigation (e.g. simulated back).
    /// Call [`on_navigation`](Self::on_navigation) afterwards.
    pub fn navigator_mut(&mut self) -> &mut N {
        &mut self.navigator
    }

    #[must_use]
    pub fn drafts(&self) -> &DraftCache {
        &self.drafts
    }

    pub fn drafts_mut(&mut self) -> &mut DraftCache {
        &mut self.drafts
    }

    pub fn into_parts(self) -> (SheetStack, N) {
        (self.stack, self.navigator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RestorePolicy;
    use crate::descriptor::{SheetKind, Slug};
    use crate::navigator::MemoryNavigator;
    use serde_json::json;

    fn controller() -> SheetController<MemoryNavigator> {
        SheetController::new(MemoryNavigator::with_query("page=1"))
    }

    #[test]
    fn open_writes_url_in_same_call() {
        let mut c = controller();
        c.open_client_form(FormParams::create("clients")).unwrap();
        let query = c.navigator().current_query();
        assert!(query.starts_with("page=1&sheet=clients"));
        assert_eq!(c.navigator().writes(), 1);
    }

    #[test]
    fn failed_open_writes_nothing() {
        let mut c = controller();
        let mut params = DetailsParams::new("clients", "x");
        params.entity_id = None;
        assert!(c.open_client_details(params).is_err());
        assert_eq!(c.navigator().writes(), 0);
        assert_eq!(c.navigator().current_query(), "page=1");
    }

    #[test]
    fn close_on_empty_does_not_write() {
        let mut c = controller();
        assert!(c.close().is_none());
        assert_eq!(c.reset(), 0);
        assert_eq!(c.navigator().writes(), 0);
    }

    #[test]
    fn close_restores_previous_sheet_in_url() {
        let mut c = controller();
        c.open_client_form(FormParams::create("clients")).unwrap();
        c.open_trial_form(FormParams::edit("trials", "t-1")).unwrap();
        c.close();
        let query = c.navigator().current_query();
        assert!(query.contains("sheet=clients"));
        assert!(!query.contains("trials"));
    }

    #[test]
    fn browser_back_closes_sheet_via_on_navigation() {
        let mut c = controller();
        c.open_case_form(FormParams::create("cases")).unwrap();
        assert!(c.navigator_mut().back());
        let report = c.on_navigation();
        assert_eq!(report, RestoreReport::default());
        assert!(c.active().is_none());

        assert!(c.navigator_mut().forward());
        c.on_navigation();
        assert_eq!(c.active().unwrap().kind(), SheetKind::CaseForm);
        assert_eq!(c.navigator().writes(), 1);
    }

    #[test]
    fn initialize_canonicalizes_dropped_levels() {
        let mut c = SheetController::new(MemoryNavigator::with_query(
            "q=x&sheet=clients&clients.kind=client-details",
        ));
        let report = c.initialize_from_url();
        assert_eq!(report, RestoreReport { restored: 0, dropped: 1 });
        assert!(c.stack().is_empty());
        assert_eq!(c.navigator().current_query(), "q=x");
        assert_eq!(c.navigator().history_len(), 1);
    }

    #[test]
    fn initialize_strips_lower_levels_under_active_only() {
        let mut c = SheetController::new(MemoryNavigator::with_query(
            "q=x&sheet.stack=clients@0&clients@0.kind=client-form\
             &sheet=trials&trials.kind=trial-form&trials.mode=create&trials.size=md",
        ));
        let report = c.initialize_from_url();
        assert_eq!(report, RestoreReport { restored: 1, dropped: 1 });
        assert_eq!(
            c.navigator().current_query(),
            "q=x&sheet=trials&trials.kind=trial-form&trials.mode=create&trials.size=md"
        );
        assert_eq!(c.navigator().history_len(), 1);
    }

    #[test]
    fn open_then_close_keeps_host_params_under_slug_prefix() {
        let mut c = SheetController::new(MemoryNavigator::with_query(
            "clients.page=2&clients.sort=name",
        ));
        c.open_client_form(FormParams::create("clients")).unwrap();
        assert!(c.navigator().current_query().contains("clients.page=2"));
        c.close();
        assert_eq!(
            c.navigator().current_query(),
            "clients.page=2&clients.sort=name"
        );
    }

    #[test]
    fn initialize_discards_in_memory_stack() {
        let mut c = controller();
        c.open_client_form(FormParams::create("clients")).unwrap();
        c.open_case_form(FormParams::create("cases")).unwrap();
        c.navigator_mut().visit("sheet=trials&trials.kind=trial-form");
        let report = c.initialize_from_url();
        assert_eq!(report.restored, 1);
        assert_eq!(c.stack().len(), 1);
        assert_eq!(c.active().unwrap().kind(), SheetKind::TrialForm);
    }

    #[test]
    fn replace_history_keeps_single_entry() {
        let config = SheetSyncConfig::default().with_history(HistoryMethod::Replace);
        let mut c = SheetController::with_config(MemoryNavigator::new(), config).unwrap();
        c.open_client_form(FormParams::create("clients")).unwrap();
        c.open_case_form(FormParams::create("cases")).unwrap();
        assert_eq!(c.navigator().history_len(), 1);
    }

    #[test]
    fn with_config_rejects_invalid() {
        let config = SheetSyncConfig::default().with_max_restore_depth(0);
        assert!(SheetController::with_config(MemoryNavigator::new(), config).is_err());
    }

    #[test]
    fn full_stack_survives_reload() {
        let config = SheetSyncConfig::default().with_restore(RestorePolicy::FullStack);
        let mut c = SheetController::with_config(MemoryNavigator::new(), config.clone()).unwrap();
        c.open_client_form(FormParams::create("clients")).unwrap();
        c.open_client_details(DetailsParams::new("clients", "abc123"))
            .unwrap();
        let (stack, nav) = c.into_parts();

        let mut reloaded =
            SheetController::with_config(MemoryNavigator::with_query(&nav.current_query()), config)
                .unwrap();
        reloaded.initialize_from_url();
        assert_eq!(reloaded.stack(), &stack);
    }

    #[test]
    fn sign_out_clears_stack_and_drafts() {
        let mut c = controller();
        c.open_client_form(FormParams::create("clients")).unwrap();
        c.drafts_mut()
            .save(&Slug::new("clients").unwrap(), json!({"name": "Ana"}));
        c.sign_out();
        assert!(c.stack().is_empty());
        assert!(c.drafts().is_empty());
        assert_eq!(c.navigator().current_query(), "page=1");
    }
}
