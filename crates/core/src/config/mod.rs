//! Suite configuration: fixtures, expectations and run settings.
//!
//! A suite file is YAML (`.yaml`/`.yml`) or JSON (`.json`). Fixture source
//! paths are relative to the suite file. Everything is validated on load so
//! that a bad suite never reaches the driver.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{Architecture, Category, Fixture};
use crate::services::compiler::{default_commands, CommandCompiler, CompilerCommand};
use crate::services::disassembly::{ArmMode, DisassemblyOptions};
use crate::services::oracle::OracleSettings;
use crate::services::verdict::{VerdictPolicy, DEFAULT_THRESHOLD};
use crate::taxonomy::{EntrySpec, Taxonomy, TaxonomyBuilder, TaxonomyError};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {message}", path.display())]
    Read { path: PathBuf, message: String },
    #[error("failed to parse {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },
    #[error("threshold must be in (0, 1], got {0}")]
    Threshold(f64),
    #[error("workers must be at least 1")]
    Workers,
    #[error("timeout_secs must be at least 1")]
    Timeout,
    #[error("suite declares no fixtures")]
    NoFixtures,
    #[error("fixture name must not be empty")]
    EmptyName,
    #[error("duplicate fixture name '{0}'")]
    DuplicateFixture(String),
    #[error("fixture '{0}' declares no expected categories")]
    NoExpectations(String),
    #[error("fixture '{fixture}' has an empty expectation list for {architecture}")]
    EmptyExpectation { fixture: String, architecture: Architecture },
    #[error("fixture '{fixture}': cannot read source {}: {message}", path.display())]
    Source { fixture: String, path: PathBuf, message: String },
    #[error(transparent)]
    Taxonomy(#[from] TaxonomyError),
}

fn default_opt_level() -> String {
    "O2".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

/// Raw, serde-facing layout of a suite file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuiteFile {
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    #[serde(default)]
    pub ignore: Vec<Category>,
    #[serde(default = "default_opt_level")]
    pub opt_level: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workers: Option<usize>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub arm_mode: ArmMode,
    /// Per-architecture overrides of the default clang commands.
    #[serde(default)]
    pub compilers: BTreeMap<Architecture, CompilerCommand>,
    /// Extra taxonomy entries layered over the built-in tables.
    #[serde(default)]
    pub taxonomy: BTreeMap<Architecture, Vec<EntrySpec>>,
    pub fixtures: Vec<FixtureSpec>,
}

fn default_threshold() -> f64 {
    DEFAULT_THRESHOLD
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixtureSpec {
    pub name: String,
    pub source: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kernel: Option<String>,
    pub expected: BTreeMap<Architecture, Vec<Category>>,
}

/// A loaded and validated suite, ready to hand to the driver.
#[derive(Debug, Clone)]
pub struct Suite {
    pub path: PathBuf,
    pub fixtures: Vec<Fixture>,
    pub taxonomy: Taxonomy,
    pub settings: OracleSettings,
    pub compilers: BTreeMap<Architecture, CompilerCommand>,
}

impl Suite {
    /// Command compiler using the default commands with this suite's overrides.
    pub fn compiler(&self) -> CommandCompiler {
        CommandCompiler::new(self.compilers.clone())
    }

    /// Architectures any fixture declares, in architecture order.
    pub fn architectures(&self) -> Vec<Architecture> {
        let declared: BTreeSet<Architecture> =
            self.fixtures.iter().flat_map(|f| f.expected.keys().copied()).collect();
        declared.into_iter().collect()
    }
}

/// Parse a suite file, choosing the format from its extension.
pub fn parse_suite_file(path: &Path) -> Result<SuiteFile, ConfigError> {
    let bytes = fs::read(path)
        .map_err(|e| ConfigError::Read { path: path.to_path_buf(), message: e.to_string() })?;
    let parse_err = |message: String| ConfigError::Parse { path: path.to_path_buf(), message };
    if path.extension().and_then(|e| e.to_str()) == Some("json") {
        serde_json::from_slice(&bytes).map_err(|e| parse_err(e.to_string()))
    } else {
        serde_yaml::from_slice(&bytes).map_err(|e| parse_err(e.to_string()))
    }
}

/// Load, validate and resolve a suite file.
pub fn load_suite(path: impl AsRef<Path>) -> Result<Suite, ConfigError> {
    let path = path.as_ref();
    let file = parse_suite_file(path)?;
    let base = path.parent().unwrap_or_else(|| Path::new("."));
    resolve_suite(file, base, path)
}

/// Validate `file` and read fixture sources relative to `base`.
pub fn resolve_suite(file: SuiteFile, base: &Path, path: &Path) -> Result<Suite, ConfigError> {
    if !(file.threshold > 0.0 && file.threshold <= 1.0) {
        return Err(ConfigError::Threshold(file.threshold));
    }
    if file.workers == Some(0) {
        return Err(ConfigError::Workers);
    }
    if file.timeout_secs == 0 {
        return Err(ConfigError::Timeout);
    }
    if file.fixtures.is_empty() {
        return Err(ConfigError::NoFixtures);
    }

    let taxonomy = build_taxonomy(&file.taxonomy)?;

    let mut seen = BTreeSet::new();
    let mut fixtures = Vec::with_capacity(file.fixtures.len());
    for spec in &file.fixtures {
        let name = spec.name.trim();
        if name.is_empty() {
            return Err(ConfigError::EmptyName);
        }
        if !seen.insert(name.to_string()) {
            return Err(ConfigError::DuplicateFixture(name.to_string()));
        }
        if spec.expected.is_empty() {
            return Err(ConfigError::NoExpectations(name.to_string()));
        }
        if let Some((arch, _)) = spec.expected.iter().find(|(_, cats)| cats.is_empty()) {
            return Err(ConfigError::EmptyExpectation {
                fixture: name.to_string(),
                architecture: *arch,
            });
        }

        let source_path = base.join(&spec.source);
        let source = fs::read_to_string(&source_path).map_err(|e| ConfigError::Source {
            fixture: name.to_string(),
            path: source_path.clone(),
            message: e.to_string(),
        })?;
        debug!("loaded fixture {name} from {}", source_path.display());
        fixtures.push(Fixture {
            name: name.to_string(),
            source_path,
            source,
            kernel: spec.kernel.clone(),
            expected: spec.expected.clone(),
        });
    }

    let mut settings = OracleSettings {
        policy: VerdictPolicy { threshold: file.threshold, ignore: file.ignore.clone() },
        opt_level: file.opt_level.clone(),
        timeout: Duration::from_secs(file.timeout_secs),
        disassembly: DisassemblyOptions { kernel: None, arm_mode: file.arm_mode },
        ..OracleSettings::default()
    };
    if let Some(workers) = file.workers {
        settings.workers = workers;
    }

    let mut compilers = default_commands();
    compilers.extend(file.compilers.clone());

    Ok(Suite { path: path.to_path_buf(), fixtures, taxonomy, settings, compilers })
}

/// Built-in taxonomy plus per-architecture extensions.
pub fn build_taxonomy(
    extensions: &BTreeMap<Architecture, Vec<EntrySpec>>,
) -> Result<Taxonomy, TaxonomyError> {
    let mut builder = TaxonomyBuilder::with_builtins()?;
    for (arch, entries) in extensions {
        builder.extend(*arch, entries)?;
    }
    Ok(builder.build())
}
