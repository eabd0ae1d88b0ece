#![forbid(unsafe_code)]

//! Sheet stack ⇄ query string codec.
//!
//! # Key scheme
//!
//! With the default `query_key` of `sheet`:
//!
//! ```text
//! ?sheet=trials                     active sheet's slug (absent = no sheet)
//! &trials.kind=trial-form           companion keys, prefixed by the slug
//! &trials.mode=edit                 form kinds only
//! &trials.id=t-1
//! &trials.size=md
//! &help.content=article             custom content key
//! &help.p.topic=billing             custom content props
//! ```
//!
//! Under [`RestorePolicy::FullStack`] the lower levels are listed bottom to
//! top in `sheet.stack=clients@0,cases@1`, and each level's companion keys
//! use its `<slug>@<depth>` prefix. Slugs never contain `.`, `@` or `,`, so
//! the prefixes cannot collide with each other.
//!
//! Only the fields listed above (`kind`, `mode`, `id`, `size`, `content`
//! and `p.<name>`) are sheet state. Host parameters that merely share a
//! slug's prefix, such as `clients.page`, are left alone.
//!
//! # Failure Modes
//!
//! Decoding is total. Any level that fails to parse is dropped and counted
//! in [`DecodeOutcome::dropped`]; if the active level is dropped the whole
//! result is empty. Nothing here returns an error or panics.

use std::collections::BTreeMap;

use tracing::{debug, warn};
use url::form_urlencoded;

use crate::config::{RestorePolicy, SheetSyncConfig};
use crate::descriptor::{
    DescriptorParts, EntityId, SheetDescriptor, SheetKind, SheetMode, SheetSize, Slug,
};
use crate::error::{Result, SheetError};
use crate::stack::SheetStack;

const KIND: &str = "kind";
const MODE: &str = "mode";
const ID: &str = "id";
const SIZE: &str = "size";
const CONTENT: &str = "content";
const PROP: &str = "p";
const DEPTH_SEP: char = '@';
const LIST_SEP: char = ',';

/// Result of decoding a query string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodeOutcome {
    /// Restored stack, bottom first.
    pub descriptors: Vec<SheetDescriptor>,
    /// Levels present in the query that were not restored, either because
    /// they failed to parse or because the restore policy discards them.
    pub dropped: usize,
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// Query pairs describing `stack` under `config`. Empty when nothing is open.
#[must_use]
pub fn encode_stack(stack: &SheetStack, config: &SheetSyncConfig) -> Vec<(String, String)> {
    let Some(active) = stack.active() else {
        return Vec::new();
    };
    let mut pairs = vec![(config.query_key.clone(), active.slug().to_string())];

    if config.restore == RestorePolicy::FullStack {
        let entries = stack.as_slice();
        let below = &entries[..entries.len() - 1];
        let keep = config.max_restore_depth.saturating_sub(1).min(below.len());
        let window = &below[below.len() - keep..];
        if !window.is_empty() {
            let prefixes: Vec<String> = window
                .iter()
                .enumerate()
                .map(|(depth, d)| level_prefix(d.slug(), depth))
                .collect();
            pairs.push((config.stack_key(), prefixes.join(",")));
            for (prefix, descriptor) in prefixes.iter().zip(window) {
                push_level(&mut pairs, prefix, descriptor);
            }
        }
    }

    push_level(&mut pairs, active.slug().as_str(), active);
    pairs
}

fn level_prefix(slug: &Slug, depth: usize) -> String {
    format!("{slug}{DEPTH_SEP}{depth}")
}

fn push_level(pairs: &mut Vec<(String, String)>, prefix: &str, descriptor: &SheetDescriptor) {
    let parts = descriptor.to_parts();
    pairs.push((format!("{prefix}.{KIND}"), parts.kind.as_str().to_owned()));
    if let Some(mode) = parts.mode {
        pairs.push((format!("{prefix}.{MODE}"), mode.as_str().to_owned()));
    }
    if let Some(id) = parts.entity_id {
        pairs.push((format!("{prefix}.{ID}"), id.into()));
    }
    if let Some(content) = parts.content {
        pairs.push((format!("{prefix}.{CONTENT}"), content));
    }
    pairs.push((format!("{prefix}.{SIZE}"), parts.size.as_str().to_owned()));
    for (name, value) in parts.props {
        pairs.push((format!("{prefix}.{PROP}.{name}"), value));
    }
}

/// Rewrite `existing` so it describes `stack`.
///
/// Every sheet-owned key currently in `existing` is removed, as is any
/// sheet field under a prefix about to be written; all other parameters keep
/// their relative order. The encoded stack is appended.
#[must_use]
pub fn merge_into_query(existing: &str, stack: &SheetStack, config: &SheetSyncConfig) -> String {
    let pairs = parse_pairs(strip_question_mark(existing));
    let encoded = encode_stack(stack, config);
    let mut owned = owned_prefixes(&pairs, config);
    owned.extend(owned_prefixes(&encoded, config));

    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in &pairs {
        if !is_sheet_key(key, &owned, config) {
            serializer.append_pair(key, value);
        }
    }
    for (key, value) in &encoded {
        serializer.append_pair(key, value);
    }
    serializer.finish()
}

/// Whether two query strings carry the same pairs in the same order,
/// regardless of percent-encoding style.
#[must_use]
pub fn same_query(a: &str, b: &str) -> bool {
    parse_pairs(strip_question_mark(a)) == parse_pairs(strip_question_mark(b))
}

/// Sheet-owned keys present in `query`, in query order.
#[must_use]
pub fn sheet_keys(query: &str, config: &SheetSyncConfig) -> Vec<String> {
    let pairs = parse_pairs(strip_question_mark(query));
    let owned = owned_prefixes(&pairs, config);
    pairs
        .into_iter()
        .map(|(key, _)| key)
        .filter(|key| is_sheet_key(key, &owned, config))
        .collect()
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Rebuild a stack from `query`. Never fails; see the module docs.
#[must_use]
pub fn decode_query(query: &str, config: &SheetSyncConfig) -> DecodeOutcome {
    let pairs = parse_pairs(strip_question_mark(query));
    let Some(active_slug) = lookup(&pairs, &config.query_key) else {
        return DecodeOutcome::default();
    };

    let active = match decode_level(&pairs, active_slug, active_slug) {
        Ok(descriptor) => descriptor,
        Err(err) => {
            warn!(slug = active_slug, error = %err, "dropping active sheet from url");
            return DecodeOutcome {
                descriptors: Vec::new(),
                dropped: 1,
            };
        }
    };

    let mut descriptors = Vec::new();
    let mut dropped = 0;
    let listed = lookup(&pairs, &config.stack_key()).unwrap_or_default();

    if config.restore == RestorePolicy::ActiveOnly {
        let ignored = listed.split(LIST_SEP).filter(|p| !p.is_empty()).count();
        if ignored > 0 {
            debug!(ignored, "ignoring stacked sheets under active-only restore");
            dropped += ignored;
        }
    } else {
        for prefix in listed.split(LIST_SEP).filter(|p| !p.is_empty()) {
            let result = prefix
                .split_once(DEPTH_SEP)
                .ok_or(SheetError::InvalidSlug {
                    slug: prefix.to_owned(),
                    reason: "stack entry is missing its depth",
                })
                .and_then(|(slug, _)| decode_level(&pairs, prefix, slug));
            match result {
                Ok(descriptor) => descriptors.push(descriptor),
                Err(err) => {
                    warn!(prefix, error = %err, "dropping stacked sheet from url");
                    dropped += 1;
                }
            }
        }

        let keep = config.max_restore_depth.saturating_sub(1);
        if descriptors.len() > keep {
            let excess = descriptors.len() - keep;
            warn!(excess, "url stack deeper than max_restore_depth");
            descriptors.drain(..excess);
            dropped += excess;
        }
    }

    descriptors.push(active);
    DecodeOutcome {
        descriptors,
        dropped,
    }
}

fn decode_level(pairs: &[(String, String)], prefix: &str, slug: &str) -> Result<SheetDescriptor> {
    let slug = Slug::new(slug)?;
    let field = |name: &str| lookup(pairs, &format!("{prefix}.{name}"));

    let kind = field(KIND)
        .ok_or(SheetError::MissingKind)?
        .parse::<SheetKind>()?;
    let mut parts = DescriptorParts::new(kind, slug);
    parts.mode = field(MODE).map(str::parse::<SheetMode>).transpose()?;
    parts.entity_id = field(ID).map(EntityId::new).transpose()?;
    parts.size = field(SIZE)
        .map(str::parse::<SheetSize>)
        .transpose()?
        .unwrap_or_default();
    parts.content = field(CONTENT).map(str::to_owned);

    let prop_prefix = format!("{prefix}.{PROP}.");
    let mut props = BTreeMap::new();
    for (key, value) in pairs {
        if let Some(name) = key.strip_prefix(&prop_prefix) {
            props.entry(name.to_owned()).or_insert_with(|| value.clone());
        }
    }
    parts.props = props;

    SheetDescriptor::try_from(parts)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn strip_question_mark(query: &str) -> &str {
    query.strip_prefix('?').unwrap_or(query)
}

fn parse_pairs(query: &str) -> Vec<(String, String)> {
    form_urlencoded::parse(query.as_bytes())
        .into_owned()
        .collect()
}

/// First value for `key`; later duplicates are ignored.
fn lookup<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    pairs
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

/// Prefixes whose companion keys belong to the sheet state in `pairs`.
fn owned_prefixes(pairs: &[(String, String)], config: &SheetSyncConfig) -> Vec<String> {
    let stack_key = config.stack_key();
    let mut owned = Vec::new();
    for (key, value) in pairs {
        if *key == config.query_key && !value.is_empty() {
            owned.push(value.clone());
        } else if *key == stack_key {
            owned.extend(
                value
                    .split(LIST_SEP)
                    .filter(|p| !p.is_empty())
                    .map(str::to_owned),
            );
        }
    }
    owned
}

fn is_sheet_key(key: &str, owned: &[String], config: &SheetSyncConfig) -> bool {
    key == config.query_key
        || key == config.stack_key()
        || owned.iter().any(|prefix| {
            key.strip_prefix(prefix.as_str())
                .and_then(|rest| rest.strip_prefix('.'))
                .is_some_and(is_level_field)
        })
}

/// Field names the codec reads after a level prefix.
fn is_level_field(field: &str) -> bool {
    matches!(field, KIND | MODE | ID | SIZE | CONTENT)
        || field
            .strip_prefix(PROP)
            .is_some_and(|rest| rest.starts_with('.'))
}
