#![forbid(unsafe_code)]

//! Kind → renderer lookup table.
//!
//! The core never names a concrete UI component. The host registers one
//! render function per [`SheetKind`] at startup (and optionally one per
//! custom content key) and asks the registry to resolve the active sheet.
//!
//! # Invariants
//!
//! 1. Each kind and each custom content key maps to at most one renderer;
//!    registering again replaces the previous one.
//! 2. Custom content resolves by content key first, then falls back to the
//!    [`SheetKind::Custom`] entry.
//! 3. Unregistered kinds resolve to `None`; the host decides what to show.
//!
//! # Example
//!
//! ```
//! use sheet_stack::{FormParams, SheetKind, SheetRegistry, SheetStack};
//!
//! let mut registry = SheetRegistry::new();
//! registry.register(SheetKind::ClientForm, |d| format!("client form for {}", d.slug()));
//!
//! let mut stack = SheetStack::new();
//! stack.open_client_form(FormParams::create("clients")).unwrap();
//! assert_eq!(
//!     registry.render_active(&stack).as_deref(),
//!     Some("client form for clients")
//! );
//! ```

use std::collections::HashMap;
use std::fmt;

use crate::descriptor::{SheetDescriptor, SheetKind};
use crate::stack::SheetStack;

type RenderFn<R> = Box<dyn Fn(&SheetDescriptor) -> R>;

/// Render functions keyed by sheet kind and custom content key.
pub struct SheetRegistry<R> {
    by_kind: HashMap<SheetKind, RenderFn<R>>,
    by_content: HashMap<String, RenderFn<R>>,
}

impl<R> fmt::Debug for SheetRegistry<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<_> = self.by_kind.keys().collect();
        kinds.sort();
        let mut content: Vec<_> = self.by_content.keys().collect();
        content.sort();
        f.debug_struct("SheetRegistry")
            .field("kinds", &kinds)
            .field("content", &content)
            .finish()
    }
}

impl<R> Default for SheetRegistry<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> SheetRegistry<R> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            by_kind: HashMap::new(),
            by_content: HashMap::new(),
        }
    }

    /// Register the renderer for `kind`. Returns `true` if one was replaced.
    pub fn register(
        &mut self,
        kind: SheetKind,
        render: impl Fn(&SheetDescriptor) -> R + 'static,
    ) -> bool {
        self.by_kind.insert(kind, Box::new(render)).is_some()
    }

    /// Register the renderer for custom content with `content_key`.
    pub fn register_custom(
        &mut self,
        content_key: impl Into<String>,
        render: impl Fn(&SheetDescriptor) -> R + 'static,
    ) -> bool {
        self.by_content
            .insert(content_key.into(), Box::new(render))
            .is_some()
    }

    #[must_use]
    pub fn contains(&self, kind: SheetKind) -> bool {
        self.by_kind.contains_key(&kind)
    }

    /// Number of registered renderers, kinds and content keys together.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_kind.len() + self.by_content.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Render `descriptor`, or `None` if nothing is registered for it.
    pub fn resolve(&self, descriptor: &SheetDescriptor) -> Option<R> {
        let render = descriptor
            .content_key()
            .and_then(|key| self.by_content.get(key))
            .or_else(|| self.by_kind.get(&descriptor.kind()))?;
        Some(render(descriptor))
    }

    /// Render the active sheet of `stack`.
    pub fn render_active(&self, stack: &SheetStack) -> Option<R> {
        self.resolve(stack.active()?)
    }
}
