#![forbid(unsafe_code)]

//! In-memory sheet stack.
//!
//! [`SheetStack`] owns the ordered list of open sheets (oldest first, the
//! last entry is active) and exposes one typed `open_*` operation per sheet
//! kind plus the generic [`open`](SheetStack::open) escape hatch.
//!
//! # Invariants
//!
//! 1. Only [`open`](SheetStack::open) pushes; only [`close`](SheetStack::close)
//!    pops. Each pushes or pops at most one descriptor.
//! 2. A failed `open_*` leaves the stack untouched, including when `reset`
//!    was requested.
//! 3. `open(d)` followed by `close()` restores the exact prior stack.
//!
//! # Failure Modes
//!
//! - `close()` on an empty stack returns `None` (no panic).
//! - `open_*` with a missing or contradictory id returns
//!   [`SheetError::InvalidDescriptor`].
//!
//! The stack never touches the URL. [`SheetController`](crate::SheetController)
//! wraps it and mirrors every mutation into the navigator.

use tracing::debug;

use crate::descriptor::{
    DescriptorParts, EntityId, SheetDescriptor, SheetKind, SheetMode, SheetSize, Slug,
};
use crate::error::{Result, SheetError};

/// Whether an open pushes onto the stack or replaces it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OpenMode {
    #[default]
    Push,
    /// Clear the stack, then push.
    Reset,
}

impl OpenMode {
    #[must_use]
    pub const fn from_reset(reset: bool) -> Self {
        if reset { Self::Reset } else { Self::Push }
    }
}

/// Call-site parameters for a form sheet (`open_client_form` and friends).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormParams {
    pub mode: SheetMode,
    pub entity_id: Option<String>,
    pub slug: String,
    pub size: SheetSize,
    pub reset: bool,
}

impl FormParams {
    #[must_use]
    pub fn create(slug: impl Into<String>) -> Self {
        Self {
            mode: SheetMode::Create,
            entity_id: None,
            slug: slug.into(),
            size: SheetSize::default(),
            reset: false,
        }
    }

    #[must_use]
    pub fn edit(slug: impl Into<String>, entity_id: impl Into<String>) -> Self {
        Self {
            mode: SheetMode::Edit,
            entity_id: Some(entity_id.into()),
            ..Self::create(slug)
        }
    }

    #[must_use]
    pub fn view(slug: impl Into<String>, entity_id: impl Into<String>) -> Self {
        Self {
            mode: SheetMode::View,
            entity_id: Some(entity_id.into()),
            ..Self::create(slug)
        }
    }

    #[must_use]
    pub fn with_size(mut self, size: SheetSize) -> Self {
        self.size = size;
        self
    }

    #[must_use]
    pub fn with_reset(mut self, reset: bool) -> Self {
        self.reset = reset;
        self
    }

    fn into_descriptor(self, kind: SheetKind) -> Result<(SheetDescriptor, OpenMode)> {
        let mut parts = DescriptorParts::new(kind, Slug::new(self.slug)?);
        parts.mode = Some(self.mode);
        parts.entity_id = self.entity_id.map(EntityId::new).transpose()?;
        parts.size = self.size;
        let descriptor = SheetDescriptor::try_from(parts)?;
        Ok((descriptor, OpenMode::from_reset(self.reset)))
    }
}

/// Call-site parameters for a details sheet.
///
/// `entity_id` is optional here only so that a missing id is reported as
/// [`SheetError::InvalidDescriptor`] instead of being unrepresentable at
/// loosely typed call sites.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailsParams {
    pub entity_id: Option<String>,
    pub slug: String,
    pub size: SheetSize,
    pub reset: bool,
}

impl DetailsParams {
    #[must_use]
    pub fn new(slug: impl Into<String>, entity_id: impl Into<String>) -> Self {
        Self {
            entity_id: Some(entity_id.into()),
            slug: slug.into(),
            size: SheetSize::default(),
            reset: false,
        }
    }

    #[must_use]
    pub fn with_size(mut self, size: SheetSize) -> Self {
        self.size = size;
        self
    }

    #[must_use]
    pub fn with_reset(mut self, reset: bool) -> Self {
        self.reset = reset;
        self
    }

    fn into_descriptor(self, kind: SheetKind) -> Result<(SheetDescriptor, OpenMode)> {
        let mut parts = DescriptorParts::new(kind, Slug::new(self.slug)?);
        parts.entity_id = Some(
            self.entity_id
                .ok_or(SheetError::invalid(kind, "entity id is required"))
                .and_then(EntityId::new)?,
        );
        parts.size = self.size;
        let descriptor = SheetDescriptor::try_from(parts)?;
        Ok((descriptor, OpenMode::from_reset(self.reset)))
    }
}

/// Ordered stack of open sheets; the last entry is active.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SheetStack {
    entries: Vec<SheetDescriptor>,
}

impl SheetStack {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Core Operations
    // ========================================================================

    /// Push `descriptor`, clearing the stack first for [`OpenMode::Reset`].
    pub fn open(&mut self, descriptor: SheetDescriptor, mode: OpenMode) -> &SheetDescriptor {
        if mode == OpenMode::Reset {
            self.entries.clear();
        }
        debug!(
            slug = %descriptor.slug(),
            kind = %descriptor.kind(),
            depth = self.entries.len() + 1,
            "sheet opened"
        );
        // Index of the slot about to be filled; in bounds after the push.
        let depth = self.entries.len();
        self.entries.push(descriptor);
        &self.entries[depth]
    }

    pub fn open_client_form(&mut self, params: FormParams) -> Result<&SheetDescriptor> {
        self.open_form(SheetKind::ClientForm, params)
    }

    pub fn open_client_details(&mut self, params: DetailsParams) -> Result<&SheetDescriptor> {
        self.open_details(SheetKind::ClientDetails, params)
    }

    pub fn open_case_form(&mut self, params: FormParams) -> Result<&SheetDescriptor> {
        self.open_form(SheetKind::CaseForm, params)
    }

    pub fn open_case_details(&mut self, params: DetailsParams) -> Result<&SheetDescriptor> {
        self.open_details(SheetKind::CaseDetails, params)
    }

    pub fn open_trial_form(&mut self, params: FormParams) -> Result<&SheetDescriptor> {
        self.open_form(SheetKind::TrialForm, params)
    }

    pub fn open_opponent_form(&mut self, params: FormParams) -> Result<&SheetDescriptor> {
        self.open_form(SheetKind::OpponentForm, params)
    }

    fn open_form(&mut self, kind: SheetKind, params: FormParams) -> Result<&SheetDescriptor> {
        let (descriptor, mode) = params.into_descriptor(kind)?;
        Ok(self.open(descriptor, mode))
    }

    fn open_details(&mut self, kind: SheetKind, params: DetailsParams) -> Result<&SheetDescriptor> {
        let (descriptor, mode) = params.into_descriptor(kind)?;
        Ok(self.open(descriptor, mode))
    }

    /// Pop the active sheet. `None` when nothing is open.
    pub fn close(&mut self) -> Option<SheetDescriptor> {
        let closed = self.entries.pop()?;
        debug!(
            slug = %closed.slug(),
            kind = %closed.kind(),
            depth = self.entries.len(),
            "sheet closed"
        );
        Some(closed)
    }

    /// Close every sheet. Returns how many were open.
    pub fn close_all(&mut self) -> usize {
        let closed = self.entries.len();
        self.entries.clear();
        if closed > 0 {
            debug!(closed, "sheet stack cleared");
        }
        closed
    }

    /// Alias of [`close_all`](Self::close_all).
    pub fn reset(&mut self) -> usize {
        self.close_all()
    }

    /// Install a whole new stack, discarding the current one.
    pub fn replace(&mut self, entries: Vec<SheetDescriptor>) {
        self.entries = entries;
    }

    // ========================================================================
    // Info
    // ========================================================================

    /// The topmost (visible) sheet.
    #[must_use]
    pub fn active(&self) -> Option<&SheetDescriptor> {
        self.entries.last()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &SheetDescriptor> + '_ {
        self.entries.iter()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[SheetDescriptor] {
        &self.entries
    }

    /// Index of the topmost sheet with `slug`, counted from the bottom.
    #[must_use]
    pub fn depth_of(&self, slug: &Slug) -> Option<usize> {
        self.entries.iter().rposition(|d| d.slug() == slug)
    }
}
