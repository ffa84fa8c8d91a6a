//! oracle-core
//!
//! Verification oracle for instruction-category benchmarks. Each fixture is
//! compiled for a set of target architectures, the result is disassembled
//! into base mnemonics, the mnemonics are classified through a per-architecture
//! taxonomy, and a dominance verdict says whether the expected category
//! actually dominates the generated code.
//!
//! All substantive logic lives here so it is testable without the CLI.

pub mod config;
pub mod model;
pub mod services;
pub mod taxonomy;

/// Returns the library version as encoded at compile time.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
