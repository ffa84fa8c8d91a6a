use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use isa_oracle::commands::{
    check_suite_command, classify_command, run_command, taxonomy_command, ClassifyOptions,
    RunOptions,
};
use oracle_core::model::Architecture;

/// Instruction-category verification oracle.
///
/// Compiles benchmark fixtures for several architectures and checks that the
/// generated code is dominated by the instruction category each fixture is
/// meant to exercise. All substantive logic lives in `oracle-core`.
#[derive(Parser, Debug)]
#[command(
    name = "isa-oracle",
    version,
    about = "Verify that compiled fixtures exercise the intended instruction categories",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run every (fixture, architecture) cell of a suite and report verdicts.
    ///
    /// Exits 0 only when every verdict passes.
    Run {
        /// Suite file (YAML or JSON).
        #[arg(long)]
        suite: PathBuf,

        /// Restrict the run to these architectures (repeatable).
        #[arg(long = "arch")]
        arch: Vec<Architecture>,

        /// Worker threads; defaults to the suite setting or available parallelism.
        #[arg(long)]
        workers: Option<usize>,

        /// Per-cell compile timeout in seconds.
        #[arg(long)]
        timeout_secs: Option<u64>,

        /// Emit JSON instead of a text table.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Disassemble and classify one object file or assembly listing.
    Classify {
        /// Target architecture of the artifact.
        #[arg(long)]
        arch: Architecture,

        /// Path to the object file or listing.
        #[arg(long)]
        artifact: PathBuf,

        /// Treat the artifact as assembly text regardless of its extension.
        #[arg(long, default_value_t = false)]
        listing: bool,

        /// Only count instructions in this function.
        #[arg(long)]
        kernel: Option<String>,

        /// Decode 32-bit ARM objects as Thumb.
        #[arg(long, default_value_t = false)]
        thumb: bool,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// List taxonomy entries for one architecture.
    Taxonomy {
        #[arg(long)]
        arch: Architecture,

        /// Include the taxonomy extensions declared by this suite.
        #[arg(long)]
        suite: Option<PathBuf>,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Validate a suite file and its fixture sources without compiling.
    CheckSuite {
        #[arg(long)]
        suite: PathBuf,
    },
}

fn main() -> Result<ExitCode> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Run { suite, arch, workers, timeout_secs, json } => {
            let options = RunOptions { suite, architectures: arch, workers, timeout_secs, json };
            if !run_command(&options)? {
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::Classify { arch, artifact, listing, kernel, thumb, json } => {
            let options =
                ClassifyOptions { architecture: arch, artifact: &artifact, listing, kernel, thumb };
            classify_command(&options, json)?
        }
        Command::Taxonomy { arch, suite, json } => {
            taxonomy_command(arch, suite.as_deref(), json)?
        }
        Command::CheckSuite { suite } => check_suite_command(&suite)?,
    }

    Ok(ExitCode::SUCCESS)
}
