use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use chrono::Utc;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::model::{Architecture, CellFailure, Fixture, Verdict, VerdictResult};
use crate::services::classifier::classify;
use crate::services::compiler::{CompileError, CompileRequest, CompilerService};
use crate::services::disassembly::{disassemble, Artifact, DisassemblyOptions};
use crate::services::verdict::{verdict, VerdictPolicy};
use crate::taxonomy::Taxonomy;

/// Why a matrix cell produced no verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The fixture declares no expectation for this architecture.
    Undeclared,
    /// The run was aborted before the cell started.
    Aborted,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::Undeclared => "undeclared",
            SkipReason::Aborted => "aborted",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedCell {
    pub fixture: String,
    pub architecture: Architecture,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReportSummary {
    pub pass: usize,
    pub fail: usize,
    pub ambiguous: usize,
    pub skipped: usize,
}

/// All verdicts of one run, ordered by (fixture order, architecture order).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateReport {
    pub started_at: String,
    pub finished_at: String,
    pub compiler: String,
    pub aborted: bool,
    pub verdicts: Vec<Verdict>,
    pub skipped: Vec<SkippedCell>,
}

impl AggregateReport {
    pub fn summary(&self) -> ReportSummary {
        let mut summary = ReportSummary { skipped: self.skipped.len(), ..Default::default() };
        for v in &self.verdicts {
            match v.result {
                VerdictResult::Pass => summary.pass += 1,
                VerdictResult::Fail => summary.fail += 1,
                VerdictResult::Ambiguous => summary.ambiguous += 1,
            }
        }
        summary
    }

    /// True when every produced verdict passed and nothing was aborted.
    pub fn all_passed(&self) -> bool {
        !self.aborted && self.verdicts.iter().all(|v| v.result == VerdictResult::Pass)
    }
}

/// Shared flag that stops new cells from starting. In-flight cells finish.
#[derive(Debug, Clone, Default)]
pub struct AbortHandle {
    flag: Arc<AtomicBool>,
}

impl AbortHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn abort(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_aborted(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Run-wide knobs for the driver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OracleSettings {
    pub policy: VerdictPolicy,
    pub opt_level: String,
    pub workers: usize,
    pub timeout: Duration,
    pub disassembly: DisassemblyOptions,
}

impl Default for OracleSettings {
    fn default() -> Self {
        Self {
            policy: VerdictPolicy::default(),
            opt_level: "O2".to_string(),
            workers: thread::available_parallelism().map(|n| n.get()).unwrap_or(4),
            timeout: Duration::from_secs(60),
            disassembly: DisassemblyOptions::default(),
        }
    }
}

/// Orchestrates the fixture x architecture matrix.
pub struct Oracle {
    taxonomy: Arc<Taxonomy>,
    compiler: Arc<dyn CompilerService>,
    settings: OracleSettings,
    abort: AbortHandle,
}

struct Cell {
    index: (usize, usize),
    fixture: Arc<Fixture>,
    arch: Architecture,
}

impl Oracle {
    pub fn new(
        taxonomy: Arc<Taxonomy>,
        compiler: Arc<dyn CompilerService>,
        settings: OracleSettings,
    ) -> Self {
        Self { taxonomy, compiler, settings, abort: AbortHandle::new() }
    }

    pub fn settings(&self) -> &OracleSettings {
        &self.settings
    }

    /// Handle a caller can use to stop the run from another thread.
    pub fn abort_handle(&self) -> AbortHandle {
        self.abort.clone()
    }

    /// Verify every declared (fixture, architecture) pair in `architectures`.
    ///
    /// Cells run on a fixed worker pool; per-cell failures become failed
    /// verdicts and never stop the other cells.
    pub fn run(&self, fixtures: &[Fixture], architectures: &[Architecture]) -> AggregateReport {
        let started_at = Utc::now().to_rfc3339();
        let mut skipped = Vec::new();
        let mut queue = VecDeque::new();

        for (fi, fixture) in fixtures.iter().enumerate() {
            let shared = Arc::new(fixture.clone());
            for (ai, arch) in architectures.iter().enumerate() {
                if fixture.expected_for(*arch).is_none() {
                    warn!("{} declares no expectation for {arch}; skipping", fixture.name);
                    skipped.push(SkippedCell {
                        fixture: fixture.name.clone(),
                        architecture: *arch,
                        reason: SkipReason::Undeclared,
                    });
                    continue;
                }
                queue.push_back(Cell {
                    index: (fi, ai),
                    fixture: Arc::clone(&shared),
                    arch: *arch,
                });
            }
        }

        let cell_count = queue.len();
        let workers = self.settings.workers.clamp(1, cell_count.max(1));
        info!(
            "running {cell_count} cells on {workers} workers with compiler '{}'",
            self.compiler.name()
        );

        let queue = Arc::new(Mutex::new(queue));
        let (tx, rx) = mpsc::channel::<((usize, usize), Verdict)>();

        thread::scope(|scope| {
            for _ in 0..workers {
                let queue = Arc::clone(&queue);
                let tx = tx.clone();
                scope.spawn(move || loop {
                    if self.abort.is_aborted() {
                        break;
                    }
                    let next = match queue.lock() {
                        Ok(mut q) => q.pop_front(),
                        Err(_) => None,
                    };
                    let Some(cell) = next else { break };
                    let verdict = self.run_cell(&cell.fixture, cell.arch);
                    if tx.send((cell.index, verdict)).is_err() {
                        break;
                    }
                });
            }
        });
        drop(tx);

        // Single accumulation point for every verdict.
        let mut results: Vec<((usize, usize), Verdict)> = rx.into_iter().collect();
        results.sort_by_key(|(index, _)| *index);
        let verdicts: Vec<Verdict> = results.into_iter().map(|(_, v)| v).collect();

        let aborted = self.abort.is_aborted();
        if let Ok(mut remaining) = queue.lock() {
            for cell in remaining.drain(..) {
                skipped.push(SkippedCell {
                    fixture: cell.fixture.name.clone(),
                    architecture: cell.arch,
                    reason: SkipReason::Aborted,
                });
            }
        }

        let report = AggregateReport {
            started_at,
            finished_at: Utc::now().to_rfc3339(),
            compiler: self.compiler.name().to_string(),
            aborted,
            verdicts,
            skipped,
        };
        let summary = report.summary();
        info!(
            "run finished: {} pass, {} fail, {} ambiguous, {} skipped",
            summary.pass, summary.fail, summary.ambiguous, summary.skipped
        );
        report
    }

    /// Compile, disassemble, classify and judge one cell.
    pub fn run_cell(&self, fixture: &Fixture, arch: Architecture) -> Verdict {
        let expected = fixture.expected_for(arch).unwrap_or_default();
        let request = CompileRequest {
            fixture: fixture.name.clone(),
            source: fixture.source.clone(),
            architecture: arch,
            opt_level: self.settings.opt_level.clone(),
            timeout: Some(self.settings.timeout),
        };

        let artifact = match compile_with_timeout(
            Arc::clone(&self.compiler),
            request,
            self.settings.timeout,
        ) {
            Ok(artifact) => artifact,
            Err(cause) => {
                warn!("{} on {arch}: {cause}", fixture.name);
                return Verdict::failed(fixture, arch, cause);
            }
        };
        let sha = artifact.sha256();

        let mut options = self.settings.disassembly.clone();
        if fixture.kernel.is_some() {
            options.kernel = fixture.kernel.clone();
        }
        let sequence = match disassemble(&artifact, arch, &options) {
            Ok(seq) => seq,
            Err(e) => {
                let cause = CellFailure::Decode { offset: e.offset, message: e.message };
                warn!("{} on {arch}: {cause}", fixture.name);
                let mut failed = Verdict::failed(fixture, arch, cause);
                failed.artifact_sha256 = Some(sha);
                return failed;
            }
        };

        let counts = classify(&self.taxonomy, &sequence, arch);
        let judgement = verdict(&counts, expected, &self.settings.policy);
        debug!(
            "{} on {arch}: {} instructions, observed {:?}, ratio {:.3} -> {}",
            fixture.name,
            sequence.len(),
            judgement.observed,
            judgement.ratio,
            judgement.result
        );
        let mut judged = Verdict::judged(fixture, arch, counts, judgement);
        judged.artifact_sha256 = Some(sha);
        judged
    }
}

/// Extra wait past the deadline for a compiler that enforces it itself.
const KILL_GRACE: Duration = Duration::from_secs(1);

/// Run the compiler on its own thread and give up shortly after `timeout`.
///
/// Compilers that honor `CompileRequest::timeout` kill their own child at the
/// deadline. Any other compile still running after the grace period is left
/// detached and its result is dropped.
fn compile_with_timeout(
    compiler: Arc<dyn CompilerService>,
    request: CompileRequest,
    timeout: Duration,
) -> Result<Artifact, CellFailure> {
    let (tx, rx) = mpsc::channel();
    let name = format!("compile-{}-{}", request.fixture, request.architecture);
    thread::Builder::new()
        .name(name)
        .spawn(move || {
            let _ = tx.send(compiler.compile(&request));
        })
        .map_err(|e| CellFailure::Compile {
            message: format!("failed to spawn compile thread: {e}"),
        })?;

    let millis = timeout.as_millis() as u64;
    match rx.recv_timeout(timeout.saturating_add(KILL_GRACE)) {
        Ok(Ok(artifact)) => Ok(artifact),
        Ok(Err(CompileError::TimedOut { .. })) | Err(RecvTimeoutError::Timeout) => {
            Err(CellFailure::Timeout { millis })
        }
        Ok(Err(e)) => Err(CellFailure::Compile { message: e.to_string() }),
        Err(RecvTimeoutError::Disconnected) => {
            Err(CellFailure::Compile { message: "compiler thread exited without a result".into() })
        }
    }
}
