//! Pairing of display fields with their media source fields.
//!
//! A field labelled `<base>/media` is the source of the field labelled
//! `<base>`. Pairs are found incrementally as fields are enumerated, in either
//! order.

use std::collections::HashMap;

use smol_str::SmolStr;

/// Label suffix marking a media source field.
pub const MEDIA_SUFFIX: &str = "/media";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldRole {
    /// Shows rendered controls.
    Display,
    /// Holds `[sound:…]` tags.
    Source,
}

/// A field label split into base name and role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldLabel {
    pub base: SmolStr,
    pub role: FieldRole,
}

impl FieldLabel {
    pub fn parse(label: &str) -> Self {
        match label.strip_suffix(MEDIA_SUFFIX) {
            Some(base) => Self {
                base: SmolStr::new(base),
                role: FieldRole::Source,
            },
            None => Self {
                base: SmolStr::new(label),
                role: FieldRole::Display,
            },
        }
    }
}

/// Field indices of one source/display pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPair {
    pub base: SmolStr,
    pub source: usize,
    pub display: usize,
}

#[derive(Debug, Default)]
struct Halves {
    sources: Vec<usize>,
    displays: Vec<usize>,
}

/// Incremental pairing over fields in enumeration order.
#[derive(Debug, Default)]
pub struct PairingResolver {
    seen: HashMap<SmolStr, Halves>,
}

impl PairingResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record field `index` and return the pairs it completes.
    ///
    /// A new half pairs with every opposite half of the same base already seen.
    pub fn push(&mut self, index: usize, label: &str) -> Vec<FieldPair> {
        let FieldLabel { base, role } = FieldLabel::parse(label);
        let halves = self.seen.entry(base.clone()).or_default();

        let pairs: Vec<FieldPair> = match role {
            FieldRole::Source => {
                halves.sources.push(index);
                halves
                    .displays
                    .iter()
                    .map(|&display| FieldPair {
                        base: base.clone(),
                        source: index,
                        display,
                    })
                    .collect()
            }
            FieldRole::Display => {
                halves.displays.push(index);
                halves
                    .sources
                    .iter()
                    .map(|&source| FieldPair {
                        base: base.clone(),
                        source,
                        display: index,
                    })
                    .collect()
            }
        };

        for pair in &pairs {
            tracing::debug!(base = %pair.base, pair.source, pair.display, "pairing: fields paired");
        }
        pairs
    }
}

/// Pair up an ordered list of field labels.
pub fn resolve_pairs<S: AsRef<str>>(labels: &[S]) -> Vec<FieldPair> {
    let mut resolver = PairingResolver::new();
    labels
        .iter()
        .enumerate()
        .flat_map(|(index, label)| resolver.push(index, label.as_ref()))
        .collect()
}
