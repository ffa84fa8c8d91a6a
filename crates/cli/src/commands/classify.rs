use std::path::Path;

use anyhow::{Context, Result};
use oracle_core::model::{Architecture, Category, CategoryCounts};
use oracle_core::services::classifier::classify;
use oracle_core::services::disassembly::{disassemble, ArmMode, DisassemblyOptions};
use oracle_core::services::verdict::dominant;
use oracle_core::taxonomy::Taxonomy;
use serde::Serialize;

use crate::read_artifact;

#[derive(Debug, Serialize)]
pub struct ClassifySummary {
    pub artifact: String,
    pub architecture: Architecture,
    pub sha256: String,
    pub instructions: usize,
    pub counts: CategoryCounts,
    pub dominant: Option<Category>,
    pub ratio: f64,
}

#[derive(Debug, Clone)]
pub struct ClassifyOptions<'a> {
    pub architecture: Architecture,
    pub artifact: &'a Path,
    pub listing: bool,
    pub kernel: Option<String>,
    pub thumb: bool,
}

/// Disassemble and classify a single artifact with the built-in taxonomy.
pub fn classify_artifact(options: &ClassifyOptions<'_>) -> Result<ClassifySummary> {
    let artifact = read_artifact(options.artifact, options.listing)?;
    let disassembly = DisassemblyOptions {
        kernel: options.kernel.clone(),
        arm_mode: if options.thumb { ArmMode::Thumb } else { ArmMode::Arm },
    };
    let sequence = disassemble(&artifact, options.architecture, &disassembly)
        .with_context(|| format!("Failed to decode {}", options.artifact.display()))?;
    let taxonomy = Taxonomy::builtin().context("Built-in taxonomy is inconsistent")?;
    let counts = classify(&taxonomy, &sequence, options.architecture);
    let top = dominant(&counts);
    let ratio = match (top, counts.total()) {
        (Some(c), total) if total > 0 => counts.get(c) as f64 / total as f64,
        _ => 0.0,
    };

    Ok(ClassifySummary {
        artifact: options.artifact.display().to_string(),
        architecture: options.architecture,
        sha256: artifact.sha256(),
        instructions: sequence.len(),
        counts,
        dominant: top,
        ratio,
    })
}

pub fn classify_command(options: &ClassifyOptions<'_>, json: bool) -> Result<()> {
    let summary = classify_artifact(options)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("Artifact: {} ({})", summary.artifact, summary.architecture);
    println!("  SHA-256: {}", summary.sha256);
    println!("  Instructions: {}", summary.instructions);
    for (category, count) in summary.counts.iter() {
        println!("  {:<18} {}", category.as_str(), count);
    }
    match summary.dominant {
        Some(c) => println!("Dominant: {} ({:.3})", c, summary.ratio),
        None => println!("Dominant: (none)"),
    }
    Ok(())
}
