//! Per-architecture mapping from base mnemonics to semantic categories.
//!
//! Entries are either exact mnemonics or glob patterns (`*` matches any run of
//! characters). Lookup precedence:
//! 1. exact entries
//! 2. the pattern with the most literal characters
//! 3. among equally specific patterns, the one registered first
//!
//! Anything unmatched is `Category::Other`. A taxonomy is built once, validated
//! eagerly, and then shared read-only (typically behind an `Arc`).

mod tables;

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{Architecture, Category};

pub use tables::builtin_entries;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaxonomyError {
    /// The same pattern was registered twice with different categories.
    #[error(
        "conflicting taxonomy entry for {arch} '{pattern}': already {existing}, attempted {attempted}"
    )]
    Conflict { arch: Architecture, pattern: String, existing: Category, attempted: Category },

    #[error("invalid taxonomy pattern '{0}' for {1}")]
    InvalidPattern(String, Architecture),
}

/// One registered rule, as seen from the outside.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxonomyEntry {
    pub architecture: Architecture,
    pub pattern: String,
    pub category: Category,
}

/// Extension entry as written in a suite file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntrySpec {
    pub pattern: String,
    pub category: Category,
}

#[derive(Debug, Clone)]
struct PatternRule {
    pattern: String,
    segments: Vec<String>,
    specificity: usize,
    order: usize,
    category: Category,
}

impl PatternRule {
    fn new(pattern: &str, order: usize, category: Category) -> Self {
        let segments: Vec<String> = pattern.split('*').map(str::to_string).collect();
        let specificity = segments.iter().map(|s| s.len()).sum();
        Self { pattern: pattern.to_string(), segments, specificity, order, category }
    }

    fn matches(&self, mnemonic: &str) -> bool {
        glob_match(&self.segments, mnemonic)
    }
}

/// Match `text` against a glob that was split on `*`.
///
/// The first segment anchors at the start, the last at the end, and the middle
/// segments are found greedily left to right.
fn glob_match(segments: &[String], text: &str) -> bool {
    let (first, rest) = match segments.split_first() {
        Some(split) => split,
        None => return text.is_empty(),
    };
    if rest.is_empty() {
        return text == first;
    }
    let Some(mut remaining) = text.strip_prefix(first.as_str()) else {
        return false;
    };
    let (last, middle) = match rest.split_last() {
        Some(split) => split,
        None => return true,
    };
    for seg in middle {
        if seg.is_empty() {
            continue;
        }
        match remaining.find(seg.as_str()) {
            Some(pos) => remaining = &remaining[pos + seg.len()..],
            None => return false,
        }
    }
    remaining.len() >= last.len() && remaining.ends_with(last.as_str())
}

#[derive(Debug, Clone, Default)]
struct ArchTable {
    exact: HashMap<String, Category>,
    /// Sorted by (specificity desc, order asc) once building finishes.
    patterns: Vec<PatternRule>,
    next_order: usize,
}

impl ArchTable {
    fn lookup(&self, mnemonic: &str) -> Category {
        if let Some(c) = self.exact.get(mnemonic) {
            return *c;
        }
        self.patterns
            .iter()
            .find(|p| p.matches(mnemonic))
            .map(|p| p.category)
            .unwrap_or(Category::Other)
    }
}

/// Collects entries and rejects conflicts before any fixture is classified.
#[derive(Debug, Clone, Default)]
pub struct TaxonomyBuilder {
    tables: BTreeMap<Architecture, ArchTable>,
}

impl TaxonomyBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder preloaded with the built-in tables for every architecture.
    pub fn with_builtins() -> Result<Self, TaxonomyError> {
        let mut builder = Self::new();
        for arch in Architecture::ALL {
            for (pattern, category) in builtin_entries(arch) {
                builder.register(arch, pattern, *category)?;
            }
        }
        Ok(builder)
    }

    pub fn register(
        &mut self,
        arch: Architecture,
        pattern: &str,
        category: Category,
    ) -> Result<&mut Self, TaxonomyError> {
        let pattern = pattern.trim().to_lowercase();
        if pattern.is_empty() || pattern.chars().all(|c| c == '*') {
            return Err(TaxonomyError::InvalidPattern(pattern, arch));
        }
        let table = self.tables.entry(arch).or_default();

        if !pattern.contains('*') {
            if let Some(existing) = table.exact.get(&pattern) {
                if *existing != category {
                    return Err(TaxonomyError::Conflict {
                        arch,
                        pattern,
                        existing: *existing,
                        attempted: category,
                    });
                }
                return Ok(self);
            }
            table.exact.insert(pattern, category);
            return Ok(self);
        }

        if let Some(existing) = table.patterns.iter().find(|p| p.pattern == pattern) {
            if existing.category != category {
                return Err(TaxonomyError::Conflict {
                    arch,
                    pattern,
                    existing: existing.category,
                    attempted: category,
                });
            }
            return Ok(self);
        }
        let order = table.next_order;
        table.next_order += 1;
        table.patterns.push(PatternRule::new(&pattern, order, category));
        Ok(self)
    }

    pub fn extend(
        &mut self,
        arch: Architecture,
        entries: &[EntrySpec],
    ) -> Result<&mut Self, TaxonomyError> {
        for entry in entries {
            self.register(arch, &entry.pattern, entry.category)?;
        }
        Ok(self)
    }

    pub fn build(mut self) -> Taxonomy {
        for table in self.tables.values_mut() {
            table
                .patterns
                .sort_by(|a, b| b.specificity.cmp(&a.specificity).then(a.order.cmp(&b.order)));
        }
        Taxonomy { tables: self.tables }
    }
}

/// Immutable, validated taxonomy.
#[derive(Debug, Clone)]
pub struct Taxonomy {
    tables: BTreeMap<Architecture, ArchTable>,
}

impl Taxonomy {
    /// The built-in taxonomy with no user extensions.
    pub fn builtin() -> Result<Self, TaxonomyError> {
        Ok(TaxonomyBuilder::with_builtins()?.build())
    }

    /// Category for one already-normalized mnemonic. Never fails.
    pub fn classify(&self, arch: Architecture, mnemonic: &str) -> Category {
        match self.tables.get(&arch) {
            Some(table) => table.lookup(mnemonic),
            None => Category::Other,
        }
    }

    /// All entries for one architecture: exact entries sorted by mnemonic,
    /// then patterns in precedence order.
    pub fn entries(&self, arch: Architecture) -> Vec<TaxonomyEntry> {
        let Some(table) = self.tables.get(&arch) else {
            return Vec::new();
        };
        let mut exact: Vec<TaxonomyEntry> = table
            .exact
            .iter()
            .map(|(m, c)| TaxonomyEntry { architecture: arch, pattern: m.clone(), category: *c })
            .collect();
        exact.sort_by(|a, b| a.pattern.cmp(&b.pattern));
        exact.extend(table.patterns.iter().map(|p| TaxonomyEntry {
            architecture: arch,
            pattern: p.pattern.clone(),
            category: p.category,
        }));
        exact
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segs(p: &str) -> Vec<String> {
        p.split('*').map(str::to_string).collect()
    }

    #[test]
    fn glob_handles_anchors_and_middles() {
        assert!(glob_match(&segs("v*add*"), "vaddps"));
        assert!(glob_match(&segs("v*add*"), "vpaddd"));
        assert!(!glob_match(&segs("v*add*"), "addps"));
        assert!(glob_match(&segs("fadd.*"), "fadd.s"));
        assert!(!glob_match(&segs("fadd.*"), "fadd"));
        assert!(glob_match(&segs("*.f32"), "vadd.f32"));
        assert!(!glob_match(&segs("a*a"), "a"));
        assert!(glob_match(&segs("a*a"), "aa"));
    }
}
