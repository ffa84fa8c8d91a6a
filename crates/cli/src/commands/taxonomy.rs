use std::path::Path;

use anyhow::{Context, Result};
use oracle_core::config::{build_taxonomy, parse_suite_file};
use oracle_core::model::Architecture;
use oracle_core::taxonomy::{Taxonomy, TaxonomyEntry};

/// Entries for `arch`, including a suite's taxonomy extensions when given.
pub fn taxonomy_entries(arch: Architecture, suite: Option<&Path>) -> Result<Vec<TaxonomyEntry>> {
    let taxonomy = match suite {
        Some(path) => {
            let file = parse_suite_file(path)
                .with_context(|| format!("Failed to read suite {}", path.display()))?;
            build_taxonomy(&file.taxonomy).context("Suite taxonomy is inconsistent")?
        }
        None => Taxonomy::builtin().context("Built-in taxonomy is inconsistent")?,
    };
    Ok(taxonomy.entries(arch))
}

pub fn taxonomy_command(arch: Architecture, suite: Option<&Path>, json: bool) -> Result<()> {
    let entries = taxonomy_entries(arch, suite)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    println!("Taxonomy for {arch} ({} entries):", entries.len());
    for entry in entries {
        println!("  {:<16} {}", entry.pattern, entry.category);
    }
    Ok(())
}
