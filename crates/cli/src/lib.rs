//! isa-oracle CLI library.
//!
//! Thin command layer over `oracle-core`; kept as a library so the commands
//! can be driven from tests without spawning the binary.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use oracle_core::model::Architecture;
use oracle_core::services::disassembly::Artifact;

pub mod commands;

/// Read an artifact from disk. Files ending in `.s`/`.S`/`.asm`, or any file
/// when `listing` is set, are treated as assembly text.
pub fn read_artifact(path: &Path, listing: bool) -> Result<Artifact> {
    let is_listing = listing
        || matches!(path.extension().and_then(|e| e.to_str()), Some("s" | "S" | "asm"));
    if is_listing {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read listing {}", path.display()))?;
        Ok(Artifact::Listing(text))
    } else {
        let bytes =
            fs::read(path).with_context(|| format!("Failed to read object {}", path.display()))?;
        Ok(Artifact::Object(bytes))
    }
}

/// Sort and deduplicate architectures into report order.
pub fn ordered_architectures(requested: &[Architecture]) -> Vec<Architecture> {
    let mut archs = requested.to_vec();
    archs.sort();
    archs.dedup();
    archs
}
