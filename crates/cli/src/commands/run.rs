use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use log::info;
use oracle_core::config::load_suite;
use oracle_core::model::Architecture;
use oracle_core::services::oracle::{AggregateReport, Oracle};
use oracle_core::services::report::{emit, ReportSink};

use crate::commands::{JsonSink, TextSink};
use crate::ordered_architectures;

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub suite: PathBuf,
    /// Empty means every architecture the suite declares.
    pub architectures: Vec<Architecture>,
    pub workers: Option<usize>,
    pub timeout_secs: Option<u64>,
    pub json: bool,
}

/// Load a suite and run the whole matrix.
pub fn run_suite(options: &RunOptions) -> Result<AggregateReport> {
    let suite = load_suite(&options.suite)
        .with_context(|| format!("Failed to load suite {}", options.suite.display()))?;

    let mut settings = suite.settings.clone();
    if let Some(workers) = options.workers {
        anyhow::ensure!(workers > 0, "--workers must be at least 1");
        settings.workers = workers;
    }
    if let Some(secs) = options.timeout_secs {
        anyhow::ensure!(secs > 0, "--timeout-secs must be at least 1");
        settings.timeout = Duration::from_secs(secs);
    }

    let architectures = if options.architectures.is_empty() {
        suite.architectures()
    } else {
        ordered_architectures(&options.architectures)
    };
    info!(
        "suite {}: {} fixtures across {} architectures",
        suite.path.display(),
        suite.fixtures.len(),
        architectures.len()
    );

    let compiler = Arc::new(suite.compiler());
    let oracle = Oracle::new(Arc::new(suite.taxonomy.clone()), compiler, settings);
    Ok(oracle.run(&suite.fixtures, &architectures))
}

/// Run a suite and render the report to stdout. Returns whether every verdict passed.
pub fn run_command(options: &RunOptions) -> Result<bool> {
    let report = run_suite(options)?;
    let stdout = io::stdout();
    let mut sink: Box<dyn ReportSink> = if options.json {
        Box::new(JsonSink::new(stdout.lock()))
    } else {
        Box::new(TextSink::new(stdout.lock()))
    };
    emit(&report, sink.as_mut()).context("Failed to write report")?;
    Ok(report.all_passed())
}
