use std::path::Path;

use anyhow::{Context, Result};
use oracle_core::config::load_suite;

/// Validate a suite file without compiling anything.
pub fn check_suite_command(path: &Path) -> Result<()> {
    let suite =
        load_suite(path).with_context(|| format!("Failed to load suite {}", path.display()))?;

    let cells: usize = suite.fixtures.iter().map(|f| f.expected.len()).sum();
    println!("Suite OK: {}", suite.path.display());
    println!("  Fixtures: {}", suite.fixtures.len());
    for fixture in &suite.fixtures {
        let archs: Vec<&str> = fixture.expected.keys().map(|a| a.as_str()).collect();
        println!("  - {} [{}]", fixture.name, archs.join(", "));
    }
    println!("  Cells: {cells}");
    println!(
        "  Threshold: {}  Workers: {}  Timeout: {}s",
        suite.settings.policy.threshold,
        suite.settings.workers,
        suite.settings.timeout.as_secs()
    );
    Ok(())
}
