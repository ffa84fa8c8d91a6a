use std::collections::BTreeMap;
use std::fs;
use std::io::Read;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::Architecture;
use crate::services::disassembly::Artifact;

/// Request to build one fixture for one architecture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompileRequest {
    pub fixture: String,
    pub source: String,
    pub architecture: Architecture,
    /// Optimization level without the dash, e.g. `O2`.
    pub opt_level: String,
    /// Wall-clock budget; a compiler still running when it expires is killed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<Duration>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error("no compiler configured for {0}")]
    Unsupported(Architecture),
    #[error("failed to spawn {program}: {message}")]
    Spawn { program: String, message: String },
    #[error("compiler exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },
    #[error("compiler I/O error: {0}")]
    Io(String),
    #[error("compiler killed after {millis} ms")]
    TimedOut { millis: u64 },
}

/// External collaborator that turns fixture source into a binary or listing.
pub trait CompilerService: Send + Sync {
    fn compile(&self, request: &CompileRequest) -> Result<Artifact, CompileError>;
    fn name(&self) -> &str;
}

/// Whether a command produces an object file or assembly text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputKind {
    #[default]
    Object,
    Assembly,
}

/// Command template for one architecture.
///
/// `{source}`, `{output}` and `{opt}` are substituted in every argument. When
/// no argument mentions `{output}` the artifact is read from stdout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompilerCommand {
    pub program: String,
    pub args: Vec<String>,
    #[serde(default)]
    pub output: OutputKind,
}

impl CompilerCommand {
    /// `clang --target=<triple> -c` with the given extra flags.
    pub fn clang(triple: &str, extra: &[&str]) -> Self {
        let mut args = vec![format!("--target={triple}"), "-{opt}".to_string()];
        args.extend(extra.iter().map(|s| s.to_string()));
        args.extend(["-c", "{source}", "-o", "{output}"].iter().map(|s| s.to_string()));
        Self { program: "clang".to_string(), args, output: OutputKind::Object }
    }

    fn writes_output_file(&self) -> bool {
        self.args.iter().any(|a| a.contains("{output}"))
    }
}

/// Default command set: clang cross-targets for all five architectures.
pub fn default_commands() -> BTreeMap<Architecture, CompilerCommand> {
    let common = ["-fno-asynchronous-unwind-tables", "-fno-stack-protector"];
    let mut map = BTreeMap::new();
    map.insert(Architecture::X86, CompilerCommand::clang("x86_64-linux-gnu", &common));
    map.insert(
        Architecture::Arm,
        CompilerCommand::clang("armv7a-linux-gnueabihf", &[common[0], common[1], "-marm"]),
    );
    map.insert(Architecture::Riscv, CompilerCommand::clang("riscv64-linux-gnu", &common));
    map.insert(Architecture::Mips, CompilerCommand::clang("mips-linux-gnu", &common));
    map.insert(Architecture::Ppc, CompilerCommand::clang("powerpc64-linux-gnu", &common));
    map
}

/// Compiler service that shells out to per-architecture command templates.
#[derive(Debug, Clone)]
pub struct CommandCompiler {
    commands: BTreeMap<Architecture, CompilerCommand>,
    source_extension: String,
}

impl CommandCompiler {
    pub fn new(commands: BTreeMap<Architecture, CompilerCommand>) -> Self {
        Self { commands, source_extension: "c".to_string() }
    }

    pub fn with_source_extension(mut self, ext: impl Into<String>) -> Self {
        self.source_extension = ext.into();
        self
    }

    pub fn command_for(&self, arch: Architecture) -> Option<&CompilerCommand> {
        self.commands.get(&arch)
    }
}

impl Default for CommandCompiler {
    fn default() -> Self {
        Self::new(default_commands())
    }
}

impl CompilerService for CommandCompiler {
    fn compile(&self, request: &CompileRequest) -> Result<Artifact, CompileError> {
        let command = self
            .commands
            .get(&request.architecture)
            .ok_or(CompileError::Unsupported(request.architecture))?;

        let dir = tempfile::tempdir().map_err(|e| CompileError::Io(e.to_string()))?;
        let source_path = dir.path().join(format!("{}.{}", request.fixture, self.source_extension));
        let ext = match command.output {
            OutputKind::Object => "o",
            OutputKind::Assembly => "s",
        };
        let output_path = dir.path().join(format!("{}.{ext}", request.fixture));
        fs::write(&source_path, &request.source).map_err(|e| CompileError::Io(e.to_string()))?;

        let args: Vec<String> = command
            .args
            .iter()
            .map(|a| {
                a.replace("{source}", &source_path.display().to_string())
                    .replace("{output}", &output_path.display().to_string())
                    .replace("{opt}", &request.opt_level)
            })
            .collect();
        debug!(
            "compiling {} for {}: {} {}",
            request.fixture,
            request.architecture,
            command.program,
            args.join(" ")
        );

        let mut child = Command::new(&command.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| CompileError::Spawn {
                program: command.program.clone(),
                message: e.to_string(),
            })?;
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let status = wait_with_deadline(&mut child, request.timeout)?;
        let stdout = join_drain(stdout);
        if !status.success() {
            return Err(CompileError::Failed {
                status: status.to_string(),
                stderr: String::from_utf8_lossy(&join_drain(stderr)).trim().to_string(),
            });
        }

        let bytes = if command.writes_output_file() {
            fs::read(&output_path).map_err(|e| CompileError::Io(e.to_string()))?
        } else {
            stdout
        };
        Ok(match command.output {
            OutputKind::Object => Artifact::Object(bytes),
            OutputKind::Assembly => Artifact::Listing(String::from_utf8_lossy(&bytes).into_owned()),
        })
    }

    fn name(&self) -> &str {
        "command"
    }
}

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Read a child pipe to the end on its own thread so the child never blocks on a full pipe.
fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Option<JoinHandle<Vec<u8>>> {
    let mut pipe = pipe?;
    Some(thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        buf
    }))
}

fn join_drain(handle: Option<JoinHandle<Vec<u8>>>) -> Vec<u8> {
    handle.and_then(|h| h.join().ok()).unwrap_or_default()
}

/// Wait for `child`, killing and reaping it once `timeout` has elapsed.
fn wait_with_deadline(
    child: &mut Child,
    timeout: Option<Duration>,
) -> Result<ExitStatus, CompileError> {
    let io_err = |e: std::io::Error| CompileError::Io(e.to_string());
    let Some((timeout, deadline)) =
        timeout.and_then(|t| Instant::now().checked_add(t).map(|d| (t, d)))
    else {
        return child.wait().map_err(io_err);
    };
    loop {
        if let Some(status) = child.try_wait().map_err(io_err)? {
            return Ok(status);
        }
        if Instant::now() >= deadline {
            let _ = child.kill();
            let _ = child.wait();
            debug!("killed compiler pid {} after {} ms", child.id(), timeout.as_millis());
            return Err(CompileError::TimedOut { millis: timeout.as_millis() as u64 });
        }
        thread::sleep(POLL_INTERVAL);
    }
}
