//! Fallback selector generation.
//!
//! Expands one recorded seed selector into an ordered list of alternatives,
//! most stable first: attribute-anchored forms, tag+class combinations,
//! copies with dynamic parts stripped, and finally a text-anchored form.
//! Pure and deterministic; every stage is best-effort and contributes
//! nothing when it cannot extract the pieces it needs.

use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::types::LocateHints;

/// Attributes worth anchoring on, in decreasing stability order.
const STABLE_ATTRIBUTES: [&str; 6] = [
    "placeholder",
    "aria-label",
    "name",
    "title",
    "role",
    "data-testid",
];

/// Interaction-state markers that record a transient UI state, not element
/// identity. Stripping them yields a selector that survives re-render.
const STATE_MARKERS: [&str; 5] = [".focus-visible", ".hover", ".active", ".focus", ":focus"];

/// Class-name fragments that mark interaction state; classes containing one
/// are excluded from generated selectors.
const STATE_CLASS_FRAGMENTS: [&str; 6] =
    ["focus", "hover", "active", "selected", "checked", "disabled"];

static ATTR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"\[(placeholder|aria-label|name|title|role|data-testid)\*?=['"]([^'"]*)['"]"#,
    )
    .expect("attribute pattern compiles")
});

static CLASS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\.([A-Za-z0-9_-]+)").expect("class pattern compiles"));

static ID_CLAUSE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\[id=['"].*?['"]\]"#).expect("id clause pattern compiles"));

static LEADING_TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([a-zA-Z][a-zA-Z0-9]*)").expect("tag pattern compiles"));

/// Generate fallback selectors from most to least stable.
///
/// The seed itself is never part of the output; the caller prepends it as
/// candidate 0 and deduplicates the combined sequence.
pub fn generate_stable_selectors(seed: &str, hints: &LocateHints) -> Vec<String> {
    let mut fallbacks = Vec::new();

    let attrs = seed_attributes(seed);
    let tag = extract_element_tag(seed, hints);

    // 1. Attribute-anchored selectors (most stable).
    if let Some(tag) = tag.as_deref() {
        for attr in STABLE_ATTRIBUTES {
            if let Some(value) = attrs.get(attr) {
                fallbacks.push(format!("{tag}[{attr}*=\"{value}\"]"));
            }
        }
    }

    // 2. Tag + stable classes + one attribute.
    let classes = extract_stable_classes(seed);
    if let Some(tag) = tag.as_deref() {
        if !classes.is_empty() {
            let class_selector = classes.join(".");
            for attr in STABLE_ATTRIBUTES {
                if let Some(value) = attrs.get(attr) {
                    fallbacks.push(format!("{tag}.{class_selector}[{attr}*=\"{value}\"]"));
                }
            }

            // 3. Tag + classes alone.
            fallbacks.push(format!("{tag}.{class_selector}"));
        }
    }

    // 4. Copies with dynamic parts removed.
    if seed.contains("[id=") {
        fallbacks.push(ID_CLAUSE_RE.replace_all(seed, "").into_owned());
    }
    for state in STATE_MARKERS {
        if seed.contains(state) {
            fallbacks.push(seed.replace(state, ""));
        }
    }

    // 5. Text-anchored selector.
    if let (Some(tag), Some(text)) = (hints.element_tag.as_deref(), hints.element_text.as_deref()) {
        if !text.trim().is_empty() {
            fallbacks.push(format!("{tag}:has-text('{text}')"));
        }
    }

    dedup_preserving_order(fallbacks)
}

/// First occurrence wins, order otherwise untouched.
pub fn dedup_preserving_order(items: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}

/// Tag from the seed's leading tag token, else from the hints.
pub fn extract_element_tag(seed: &str, hints: &LocateHints) -> Option<String> {
    if let Some(captures) = LEADING_TAG_RE.captures(seed) {
        return Some(captures[1].to_ascii_lowercase());
    }
    hints
        .element_tag
        .as_deref()
        .filter(|tag| !tag.is_empty())
        .map(str::to_ascii_lowercase)
}

/// CSS classes from the seed that do not look interaction-state related.
pub fn extract_stable_classes(seed: &str) -> Vec<String> {
    CLASS_RE
        .captures_iter(seed)
        .map(|captures| captures[1].to_string())
        .filter(|class| {
            let lower = class.to_ascii_lowercase();
            !STATE_CLASS_FRAGMENTS
                .iter()
                .any(|fragment| lower.contains(fragment))
        })
        .collect()
}

/// First value per stable attribute found in the seed selector.
fn seed_attributes(seed: &str) -> HashMap<&'static str, String> {
    let mut attrs = HashMap::new();
    for captures in ATTR_RE.captures_iter(seed) {
        let matched = &captures[1];
        if let Some(name) = STABLE_ATTRIBUTES.iter().copied().find(|attr| *attr == matched) {
            attrs.entry(name).or_insert_with(|| captures[2].to_string());
        }
    }
    attrs
}
