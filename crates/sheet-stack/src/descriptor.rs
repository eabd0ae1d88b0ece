#![forbid(unsafe_code)]

//! Typed sheet descriptors.
//!
//! A [`SheetDescriptor`] identifies one overlay panel: what it renders
//! ([`SheetContent`]), the [`Slug`] that namespaces it in the URL and in the
//! draft cache, and a presentational [`SheetSize`].
//!
//! # Invariants
//!
//! 1. A descriptor is immutable once built. Changing a sheet means closing
//!    it and opening a new one.
//! 2. Form kinds carry a [`FormTarget`]: `Edit` and `View` always hold an
//!    [`EntityId`], `Create` never does. Details kinds always hold an id.
//! 3. Slugs are non-empty and contain only ASCII alphanumerics, `-` and `_`,
//!    so they can be used verbatim as query-key fragments.
//!
//! [`DescriptorParts`] is the flat, wire-shaped form of a descriptor. The
//! typed `open_*` operations and the URL decoder both funnel through
//! `SheetDescriptor::try_from(DescriptorParts)`, so there is exactly one
//! place where the mode/id rules are checked.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SheetError};

/// Longest accepted slug, in bytes.
pub const MAX_SLUG_LEN: usize = 64;

/// Longest accepted entity id, in bytes.
pub const MAX_ENTITY_ID_LEN: usize = 128;

fn is_key_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

pub(crate) fn is_key_fragment(s: &str) -> bool {
    !s.is_empty() && s.len() <= MAX_SLUG_LEN && s.chars().all(is_key_char)
}

// ---------------------------------------------------------------------------
// Mode / size
// ---------------------------------------------------------------------------

/// What a form sheet is doing with its entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SheetMode {
    Create,
    Edit,
    View,
}

impl SheetMode {
    pub const ALL: [Self; 3] = [Self::Create, Self::Edit, Self::View];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Edit => "edit",
            Self::View => "view",
        }
    }
}

impl fmt::Display for SheetMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SheetMode {
    type Err = SheetError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str() == s)
            .ok_or_else(|| SheetError::UnknownMode(s.to_owned()))
    }
}

/// Presentational width of a sheet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SheetSize {
    Sm,
    #[default]
    Md,
    Lg,
    Xl,
}

impl SheetSize {
    pub const ALL: [Self; 4] = [Self::Sm, Self::Md, Self::Lg, Self::Xl];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sm => "sm",
            Self::Md => "md",
            Self::Lg => "lg",
            Self::Xl => "xl",
        }
    }
}

impl fmt::Display for SheetSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SheetSize {
    type Err = SheetError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|size| size.as_str() == s)
            .ok_or_else(|| SheetError::UnknownSize(s.to_owned()))
    }
}

// ---------------------------------------------------------------------------
// Slug / EntityId
// ---------------------------------------------------------------------------

/// Stable key naming a sheet's family in the URL and in the draft cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Slug(String);

impl Slug {
    /// Validate and wrap a slug.
    pub fn new(slug: impl Into<String>) -> Result<Self> {
        let slug = slug.into();
        let reason = if slug.is_empty() {
            "must not be empty"
        } else if slug.len() > MAX_SLUG_LEN {
            "exceeds 64 bytes"
        } else if !slug.chars().all(is_key_char) {
            "only ASCII alphanumerics, '-' and '_' are allowed"
        } else {
            return Ok(Self(slug));
        };
        Err(SheetError::InvalidSlug { slug, reason })
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Slug {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Slug {
    type Error = SheetError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Slug> for String {
    fn from(slug: Slug) -> Self {
        slug.0
    }
}

/// Opaque identifier of the entity a sheet edits or displays.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntityId(String);

impl EntityId {
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        let reason = if id.is_empty() {
            "must not be empty"
        } else if id.len() > MAX_ENTITY_ID_LEN {
            "exceeds 128 bytes"
        } else if id.chars().any(char::is_control) {
            "must not contain control characters"
        } else {
            return Ok(Self(id));
        };
        Err(SheetError::InvalidEntityId { reason })
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for EntityId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for EntityId {
    type Error = SheetError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<EntityId> for String {
    fn from(id: EntityId) -> Self {
        id.0
    }
}

// ---------------------------------------------------------------------------
// Kinds and content
// ---------------------------------------------------------------------------

/// Mode plus target entity of a form sheet.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FormTarget {
    Create,
    Edit(EntityId),
    View(EntityId),
}

impl FormTarget {
    /// Combine a mode with an optional id.
    ///
    /// `Edit`/`View` without an id and `Create` with an id are both
    /// rejected; the returned message is wrapped by the caller with the
    /// sheet kind.
    pub fn from_parts(
        mode: SheetMode,
        entity_id: Option<EntityId>,
    ) -> std::result::Result<Self, &'static str> {
        match (mode, entity_id) {
            (SheetMode::Create, None) => Ok(Self::Create),
            (SheetMode::Create, Some(_)) => Err("create mode must not carry an entity id"),
            (SheetMode::Edit, Some(id)) => Ok(Self::Edit(id)),
            (SheetMode::View, Some(id)) => Ok(Self::View(id)),
            (SheetMode::Edit | SheetMode::View, None) => {
                Err("edit and view modes require an entity id")
            }
        }
    }

    #[must_use]
    pub const fn mode(&self) -> SheetMode {
        match self {
            Self::Create => SheetMode::Create,
            Self::Edit(_) => SheetMode::Edit,
            Self::View(_) => SheetMode::View,
        }
    }

    #[must_use]
    pub fn entity_id(&self) -> Option<&EntityId> {
        match self {
            Self::Create => None,
            Self::Edit(id) | Self::View(id) => Some(id),
        }
    }
}

/// Fieldless tag of [`SheetContent`], used on the wire and as registry key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SheetKind {
    ClientForm,
    ClientDetails,
    CaseForm,
    CaseDetails,
    TrialForm,
    OpponentForm,
    #[serde(rename = "custom-content")]
    Custom,
}

impl SheetKind {
    pub const ALL: [Self; 7] = [
        Self::ClientForm,
        Self::ClientDetails,
        Self::CaseForm,
        Self::CaseDetails,
        Self::TrialForm,
        Self::OpponentForm,
        Self::Custom,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ClientForm => "client-form",
            Self::ClientDetails => "client-details",
            Self::CaseForm => "case-form",
            Self::CaseDetails => "case-details",
            Self::TrialForm => "trial-form",
            Self::OpponentForm => "opponent-form",
            Self::Custom => "custom-content",
        }
    }

    /// Form kinds carry a [`FormTarget`] and therefore a mode.
    #[must_use]
    pub const fn is_form(self) -> bool {
        matches!(
            self,
            Self::ClientForm | Self::CaseForm | Self::TrialForm | Self::OpponentForm
        )
    }

    /// Details kinds always display one existing entity.
    #[must_use]
    pub const fn is_details(self) -> bool {
        matches!(self, Self::ClientDetails | Self::CaseDetails)
    }
}

impl fmt::Display for SheetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SheetKind {
    type Err = SheetError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| SheetError::UnknownKind(s.to_owned()))
    }
}

/// What a sheet renders. Each variant holds exactly the fields it needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SheetContent {
    ClientForm(FormTarget),
    ClientDetails { client_id: EntityId },
    CaseForm(FormTarget),
    CaseDetails { case_id: EntityId },
    TrialForm(FormTarget),
    OpponentForm(FormTarget),
    /// Host-defined content, dispatched on `content` by the registry.
    Custom {
        content: String,
        props: BTreeMap<String, String>,
    },
}

impl SheetContent {
    #[must_use]
    pub const fn kind(&self) -> SheetKind {
        match self {
            Self::ClientForm(_) => SheetKind::ClientForm,
            Self::ClientDetails { .. } => SheetKind::ClientDetails,
            Self::CaseForm(_) => SheetKind::CaseForm,
            Self::CaseDetails { .. } => SheetKind::CaseDetails,
            Self::TrialForm(_) => SheetKind::TrialForm,
            Self::OpponentForm(_) => SheetKind::OpponentForm,
            Self::Custom { .. } => SheetKind::Custom,
        }
    }

    #[must_use]
    pub fn form_target(&self) -> Option<&FormTarget> {
        match self {
            Self::ClientForm(target)
            | Self::CaseForm(target)
            | Self::TrialForm(target)
            | Self::OpponentForm(target) => Some(target),
            _ => None,
        }
    }

    fn form(kind: SheetKind, target: FormTarget) -> Option<Self> {
        match kind {
            SheetKind::ClientForm => Some(Self::ClientForm(target)),
            SheetKind::CaseForm => Some(Self::CaseForm(target)),
            SheetKind::TrialForm => Some(Self::TrialForm(target)),
            SheetKind::OpponentForm => Some(Self::OpponentForm(target)),
            _ => None,
        }
    }

    fn details(kind: SheetKind, id: EntityId) -> Option<Self> {
        match kind {
            SheetKind::ClientDetails => Some(Self::ClientDetails { client_id: id }),
            SheetKind::CaseDetails => Some(Self::CaseDetails { case_id: id }),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Descriptor
// ---------------------------------------------------------------------------

/// Flat, wire-shaped view of a descriptor prior to validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescriptorParts {
    pub kind: SheetKind,
    /// Form kinds default to `Create` when absent.
    pub mode: Option<SheetMode>,
    pub entity_id: Option<EntityId>,
    pub slug: Slug,
    pub size: SheetSize,
    /// Custom content key; required for [`SheetKind::Custom`] only.
    pub content: Option<String>,
    pub props: BTreeMap<String, String>,
}

impl DescriptorParts {
    #[must_use]
    pub fn new(kind: SheetKind, slug: Slug) -> Self {
        Self {
            kind,
            mode: None,
            entity_id: None,
            slug,
            size: SheetSize::default(),
            content: None,
            props: BTreeMap::new(),
        }
    }
}

/// One open sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetDescriptor {
    content: SheetContent,
    slug: Slug,
    size: SheetSize,
}

impl SheetDescriptor {
    /// Build a descriptor from already-typed content.
    pub fn new(content: SheetContent, slug: Slug, size: SheetSize) -> Result<Self> {
        if let SheetContent::Custom { content: key, props } = &content {
            validate_custom(key, props)?;
        }
        Ok(Self {
            content,
            slug,
            size,
        })
    }

    /// Build a custom-content descriptor from raw call-site values.
    pub fn custom(
        content: &str,
        props: BTreeMap<String, String>,
        slug: &str,
        size: SheetSize,
    ) -> Result<Self> {
        Self::new(
            SheetContent::Custom {
                content: content.to_owned(),
                props,
            },
            Slug::new(slug)?,
            size,
        )
    }

    #[must_use]
    pub fn content(&self) -> &SheetContent {
        &self.content
    }

    #[must_use]
    pub const fn kind(&self) -> SheetKind {
        self.content.kind()
    }

    /// Form kinds report their target's mode, details kinds report `View`,
    /// custom content has no mode.
    #[must_use]
    pub fn mode(&self) -> Option<SheetMode> {
        match &self.content {
            SheetContent::ClientDetails { .. } | SheetContent::CaseDetails { .. } => {
                Some(SheetMode::View)
            }
            other => other.form_target().map(FormTarget::mode),
        }
    }

    #[must_use]
    pub fn entity_id(&self) -> Option<&EntityId> {
        match &self.content {
            SheetContent::ClientDetails { client_id } => Some(client_id),
            SheetContent::CaseDetails { case_id } => Some(case_id),
            other => other.form_target().and_then(FormTarget::entity_id),
        }
    }

    #[must_use]
    pub fn slug(&self) -> &Slug {
        &self.slug
    }

    #[must_use]
    pub const fn size(&self) -> SheetSize {
        self.size
    }

    /// Custom content key, if this is a custom sheet.
    #[must_use]
    pub fn content_key(&self) -> Option<&str> {
        match &self.content {
            SheetContent::Custom { content, .. } => Some(content),
            _ => None,
        }
    }

    /// Custom-content props; `None` for every other kind.
    #[must_use]
    pub fn props(&self) -> Option<&BTreeMap<String, String>> {
        match &self.content {
            SheetContent::Custom { props, .. } => Some(props),
            _ => None,
        }
    }

    /// Flatten back into wire form. Details kinds omit their implied mode.
    #[must_use]
    pub fn to_parts(&self) -> DescriptorParts {
        let mode = self.content.form_target().map(FormTarget::mode);
        DescriptorParts {
            kind: self.kind(),
            mode,
            entity_id: self.entity_id().cloned(),
            slug: self.slug.clone(),
            size: self.size,
            content: self.content_key().map(str::to_owned),
            props: self.props().cloned().unwrap_or_default(),
        }
    }
}

impl TryFrom<DescriptorParts> for SheetDescriptor {
    type Error = SheetError;

    fn try_from(parts: DescriptorParts) -> Result<Self> {
        let DescriptorParts {
            kind,
            mode,
            entity_id,
            slug,
            size,
            content,
            props,
        } = parts;

        if kind != SheetKind::Custom && (content.is_some() || !props.is_empty()) {
            return Err(SheetError::invalid(
                kind,
                "only custom content carries a content key or props",
            ));
        }

        let content = if kind.is_form() {
            let target = FormTarget::from_parts(mode.unwrap_or(SheetMode::Create), entity_id)
                .map_err(|reason| SheetError::invalid(kind, reason))?;
            SheetContent::form(kind, target)
        } else if kind.is_details() {
            if matches!(mode, Some(SheetMode::Create | SheetMode::Edit)) {
                return Err(SheetError::invalid(kind, "details sheets are view-only"));
            }
            let id = entity_id.ok_or(SheetError::invalid(kind, "entity id is required"))?;
            SheetContent::details(kind, id)
        } else {
            if entity_id.is_some() || mode.is_some() {
                return Err(SheetError::invalid(
                    kind,
                    "custom content carries no mode or entity id",
                ));
            }
            let key = content.ok_or(SheetError::invalid(kind, "content key is required"))?;
            Some(SheetContent::Custom { content: key, props })
        };

        let content = content.ok_or(SheetError::invalid(kind, "unsupported kind"))?;
        Self::new(content, slug, size)
    }
}

fn validate_custom(key: &str, props: &BTreeMap<String, String>) -> Result<()> {
    if !is_key_fragment(key) {
        return Err(SheetError::InvalidContentKey {
            key: key.to_owned(),
        });
    }
    if props.keys().any(|name| !is_key_fragment(name)) {
        return Err(SheetError::invalid(
            SheetKind::Custom,
            "prop names must be URL-safe key fragments",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slug(s: &str) -> Slug {
        Slug::new(s).unwrap()
    }

    fn id(s: &str) -> EntityId {
        EntityId::new(s).unwrap()
    }

    #[test]
    fn slug_rejects_empty_and_separators() {
        assert!(Slug::new("").is_err());
        assert!(Slug::new("a.b").is_err());
        assert!(Slug::new("a@b").is_err());
        assert!(Slug::new("a,b").is_err());
        assert!(Slug::new("x".repeat(MAX_SLUG_LEN + 1)).is_err());
        assert_eq!(Slug::new("client_notes-2").unwrap().as_str(), "client_notes-2");
    }

    #[test]
    fn entity_id_rejects_control_characters() {
        assert!(EntityId::new("abc\n").is_err());
        assert!(EntityId::new("").is_err());
        assert_eq!(id("550e8400-e29b").as_str(), "550e8400-e29b");
    }

    #[test]
    fn wire_names_round_trip_through_from_str() {
        for kind in SheetKind::ALL {
            assert_eq!(kind.as_str().parse::<SheetKind>().unwrap(), kind);
        }
        for mode in SheetMode::ALL {
            assert_eq!(mode.as_str().parse::<SheetMode>().unwrap(), mode);
        }
        for size in SheetSize::ALL {
            assert_eq!(size.as_str().parse::<SheetSize>().unwrap(), size);
        }
        assert!(matches!(
            "drawer".parse::<SheetKind>(),
            Err(SheetError::UnknownKind(_))
        ));
    }

    #[test]
    fn serde_names_match_wire_names() {
        for kind in SheetKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
    }

    #[test]
    fn form_target_enforces_mode_id_pairing() {
        assert_eq!(
            FormTarget::from_parts(SheetMode::Create, None),
            Ok(FormTarget::Create)
        );
        assert!(FormTarget::from_parts(SheetMode::Create, Some(id("x"))).is_err());
        assert!(FormTarget::from_parts(SheetMode::Edit, None).is_err());
        assert!(FormTarget::from_parts(SheetMode::View, None).is_err());
        assert_eq!(
            FormTarget::from_parts(SheetMode::Edit, Some(id("x"))).unwrap(),
            FormTarget::Edit(id("x"))
        );
    }

    #[test]
    fn parts_default_form_mode_is_create() {
        let parts = DescriptorParts::new(SheetKind::TrialForm, slug("trials"));
        let d = SheetDescriptor::try_from(parts).unwrap();
        assert_eq!(d.mode(), Some(SheetMode::Create));
        assert_eq!(d.entity_id(), None);
    }

    #[test]
    fn details_without_id_is_rejected() {
        let parts = DescriptorParts::new(SheetKind::ClientDetails, slug("clients"));
        let err = SheetDescriptor::try_from(parts).unwrap_err();
        assert_eq!(
            err,
            SheetError::InvalidDescriptor {
                kind: SheetKind::ClientDetails,
                reason: "entity id is required",
            }
        );
    }

    #[test]
    fn details_reject_edit_mode() {
        let mut parts = DescriptorParts::new(SheetKind::CaseDetails, slug("cases"));
        parts.entity_id = Some(id("c-1"));
        parts.mode = Some(SheetMode::Edit);
        assert!(SheetDescriptor::try_from(parts).is_err());
    }

    #[test]
    fn builtin_kinds_have_no_props() {
        let parts = DescriptorParts::new(SheetKind::ClientForm, slug("clients"));
        let d = SheetDescriptor::try_from(parts).unwrap();
        assert_eq!(d.props(), None);
        assert!(d.to_parts().props.is_empty());
    }

    #[test]
    fn props_only_allowed_on_custom() {
        let mut parts = DescriptorParts::new(SheetKind::ClientForm, slug("clients"));
        parts.props.insert("tab".into(), "notes".into());
        assert!(SheetDescriptor::try_from(parts).is_err());
    }

    #[test]
    fn custom_requires_content_key() {
        let parts = DescriptorParts::new(SheetKind::Custom, slug("help"));
        assert!(SheetDescriptor::try_from(parts).is_err());

        let mut props = BTreeMap::new();
        props.insert("topic".to_owned(), "billing & fees".to_owned());
        let d = SheetDescriptor::custom("help-article", props.clone(), "help", SheetSize::Sm)
            .unwrap();
        assert_eq!(d.kind(), SheetKind::Custom);
        assert_eq!(d.content_key(), Some("help-article"));
        assert_eq!(d.props(), Some(&props));
        assert_eq!(d.mode(), None);
    }

    #[test]
    fn custom_rejects_unsafe_prop_names() {
        let mut props = BTreeMap::new();
        props.insert("a.b".to_owned(), "v".to_owned());
        assert!(SheetDescriptor::custom("x", props, "help", SheetSize::Md).is_err());
    }

    #[test]
    fn to_parts_round_trips() {
        let d = SheetDescriptor::new(
            SheetContent::OpponentForm(FormTarget::Edit(id("o-9"))),
            slug("opponents"),
            SheetSize::Xl,
        )
        .unwrap();
        let back = SheetDescriptor::try_from(d.to_parts()).unwrap();
        assert_eq!(back, d);

        let details = SheetDescriptor::new(
            SheetContent::ClientDetails {
                client_id: id("abc123"),
            },
            slug("clients"),
            SheetSize::Md,
        )
        .unwrap();
        assert_eq!(details.mode(), Some(SheetMode::View));
        assert_eq!(details.to_parts().mode, None);
        assert_eq!(SheetDescriptor::try_from(details.to_parts()).unwrap(), details);
    }
}
