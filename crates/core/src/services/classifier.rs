//! Instruction classifier: mnemonic sequence -> per-category counts.

use crate::model::{Architecture, CategoryCounts};
use crate::taxonomy::Taxonomy;

/// Count every mnemonic under exactly one category.
///
/// Single linear pass with one taxonomy lookup per mnemonic. The counts always
/// sum to `sequence.len()`; an empty sequence yields all zeros.
pub fn classify<S: AsRef<str>>(
    taxonomy: &Taxonomy,
    sequence: &[S],
    arch: Architecture,
) -> CategoryCounts {
    let mut counts = CategoryCounts::new();
    for mnemonic in sequence {
        counts.increment(taxonomy.classify(arch, mnemonic.as_ref()));
    }
    counts
}
