//! Core data model shared by every stage of the oracle.
//!
//! This module contains:
//! - `Architecture`: the closed set of target instruction-set architectures
//! - `Category`: the closed set of semantic instruction classes
//! - `CategoryCounts`: per-category tallies for one mnemonic sequence
//! - `Fixture`: a benchmark source paired with its expected categories
//! - `Verdict` and friends: the per-cell outcome handed to the report sink

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Target instruction-set architecture.
///
/// Declaration order is the architecture order used when sorting reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Architecture {
    X86,
    Arm,
    Riscv,
    Mips,
    Ppc,
}

impl Architecture {
    pub const ALL: [Architecture; 5] = [
        Architecture::X86,
        Architecture::Arm,
        Architecture::Riscv,
        Architecture::Mips,
        Architecture::Ppc,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Architecture::X86 => "x86",
            Architecture::Arm => "arm",
            Architecture::Riscv => "riscv",
            Architecture::Mips => "mips",
            Architecture::Ppc => "ppc",
        }
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown architecture '{0}' (expected one of x86, arm, riscv, mips, ppc)")]
pub struct UnknownArchitecture(pub String);

impl FromStr for Architecture {
    type Err = UnknownArchitecture;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "x86" | "x86_64" | "x86-64" | "amd64" | "i386" | "i686" => Ok(Architecture::X86),
            "arm" | "armv7" | "arm64" | "aarch64" | "thumb" => Ok(Architecture::Arm),
            "riscv" | "risc-v" | "riscv32" | "riscv64" | "rv32" | "rv64" => Ok(Architecture::Riscv),
            "mips" | "mipsel" | "mips32" | "mips64" => Ok(Architecture::Mips),
            "ppc" | "powerpc" | "ppc32" | "ppc64" | "ppc64le" | "powerpc64" => Ok(Architecture::Ppc),
            _ => Err(UnknownArchitecture(s.to_string())),
        }
    }
}

/// Semantic instruction class.
///
/// Declaration order doubles as the tie-break priority used when two
/// categories share the top count: earlier variants win.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Bitwise,
    FloatAdd,
    IntegerMultiply,
    ShiftRotate,
    ControlFlow,
    Other,
}

impl Category {
    pub const COUNT: usize = 6;

    /// All categories in tie-break priority order.
    pub const PRIORITY: [Category; Category::COUNT] = [
        Category::Bitwise,
        Category::FloatAdd,
        Category::IntegerMultiply,
        Category::ShiftRotate,
        Category::ControlFlow,
        Category::Other,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Bitwise => "bitwise",
            Category::FloatAdd => "float-add",
            Category::IntegerMultiply => "integer-multiply",
            Category::ShiftRotate => "shift-rotate",
            Category::ControlFlow => "control-flow",
            Category::Other => "other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown category '{0}'")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase().replace('_', "-");
        Category::PRIORITY
            .into_iter()
            .find(|c| c.as_str() == key)
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

/// Ordered base mnemonics produced by disassembling one artifact.
pub type MnemonicSequence = Vec<String>;

/// Per-category instruction counts.
///
/// Stored densely so that a category with zero hits compares equal to one that
/// was never touched. Serialized as a `category -> count` map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "BTreeMap<Category, u64>", into = "BTreeMap<Category, u64>")]
pub struct CategoryCounts {
    counts: [u64; Category::COUNT],
}

impl CategoryCounts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, category: Category) -> u64 {
        self.counts[category.index()]
    }

    pub fn set(&mut self, category: Category, count: u64) {
        self.counts[category.index()] = count;
    }

    pub fn increment(&mut self, category: Category) {
        self.counts[category.index()] += 1;
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Iterate `(category, count)` pairs in priority order, zeros included.
    pub fn iter(&self) -> impl Iterator<Item = (Category, u64)> + '_ {
        Category::PRIORITY.into_iter().map(move |c| (c, self.get(c)))
    }

    /// Copy of these counts with the given categories zeroed out.
    pub fn without(&self, ignored: &[Category]) -> Self {
        let mut out = *self;
        for c in ignored {
            out.set(*c, 0);
        }
        out
    }
}

impl<const N: usize> From<[(Category, u64); N]> for CategoryCounts {
    fn from(pairs: [(Category, u64); N]) -> Self {
        let mut counts = CategoryCounts::new();
        for (c, n) in pairs {
            counts.set(c, n);
        }
        counts
    }
}

impl From<BTreeMap<Category, u64>> for CategoryCounts {
    fn from(map: BTreeMap<Category, u64>) -> Self {
        let mut counts = CategoryCounts::new();
        for (c, n) in map {
            counts.set(c, n);
        }
        counts
    }
}

impl From<CategoryCounts> for BTreeMap<Category, u64> {
    fn from(counts: CategoryCounts) -> Self {
        counts.iter().filter(|(_, n)| *n > 0).collect()
    }
}

/// A benchmark program and the categories it is expected to compile into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fixture {
    pub name: String,
    pub source_path: PathBuf,
    pub source: String,
    /// Function whose body is the measured kernel; `None` means whole text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kernel: Option<String>,
    /// Acceptable dominant categories per architecture.
    pub expected: BTreeMap<Architecture, Vec<Category>>,
}

impl Fixture {
    pub fn expected_for(&self, arch: Architecture) -> Option<&[Category]> {
        self.expected.get(&arch).map(|v| v.as_slice())
    }
}

/// Three-way outcome of judging one cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerdictResult {
    Pass,
    Fail,
    Ambiguous,
}

impl VerdictResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerdictResult::Pass => "pass",
            VerdictResult::Fail => "fail",
            VerdictResult::Ambiguous => "ambiguous",
        }
    }
}

impl fmt::Display for VerdictResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a cell failed before it could be judged on its instruction mix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CellFailure {
    Compile { message: String },
    Decode { offset: usize, message: String },
    Timeout { millis: u64 },
}

impl fmt::Display for CellFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellFailure::Compile { message } => write!(f, "compile error: {message}"),
            CellFailure::Decode { offset, message } => {
                write!(f, "decode error at offset 0x{offset:X}: {message}")
            }
            CellFailure::Timeout { millis } => write!(f, "compile timed out after {millis} ms"),
        }
    }
}

/// Pure outcome of the dominance computation, before it is attached to a cell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Judgement {
    pub observed: Option<Category>,
    pub ratio: f64,
    pub margin: f64,
    pub result: VerdictResult,
}

/// Final record for one (fixture, architecture) cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub fixture: String,
    pub architecture: Architecture,
    pub expected: Vec<Category>,
    pub observed: Option<Category>,
    pub ratio: f64,
    pub margin: f64,
    pub result: VerdictResult,
    pub counts: CategoryCounts,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cause: Option<CellFailure>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact_sha256: Option<String>,
}

impl Verdict {
    pub fn judged(
        fixture: &Fixture,
        architecture: Architecture,
        counts: CategoryCounts,
        judgement: Judgement,
    ) -> Self {
        Self {
            fixture: fixture.name.clone(),
            architecture,
            expected: fixture.expected_for(architecture).unwrap_or_default().to_vec(),
            observed: judgement.observed,
            ratio: judgement.ratio,
            margin: judgement.margin,
            result: judgement.result,
            counts,
            cause: None,
            artifact_sha256: None,
        }
    }

    pub fn failed(fixture: &Fixture, architecture: Architecture, cause: CellFailure) -> Self {
        Self {
            fixture: fixture.name.clone(),
            architecture,
            expected: fixture.expected_for(architecture).unwrap_or_default().to_vec(),
            observed: None,
            ratio: 0.0,
            margin: 0.0,
            result: VerdictResult::Fail,
            counts: CategoryCounts::new(),
            cause: Some(cause),
            artifact_sha256: None,
        }
    }
}
