#![cfg(unix)]

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;
use std::time::{Duration, Instant};

use oracle_core::model::{Architecture, Category, CellFailure, Fixture, VerdictResult};
use oracle_core::services::compiler::{
    CommandCompiler, CompileError, CompileRequest, CompilerCommand, CompilerService, OutputKind,
};
use oracle_core::services::disassembly::Artifact;
use oracle_core::services::oracle::{Oracle, OracleSettings};
use oracle_core::taxonomy::Taxonomy;
use tempfile::tempdir;

fn compiler(program: &str, args: &[&str]) -> CommandCompiler {
    let command = CompilerCommand {
        program: program.to_string(),
        args: args.iter().map(|a| a.to_string()).collect(),
        output: OutputKind::Assembly,
    };
    CommandCompiler::new(BTreeMap::from([(Architecture::X86, command)]))
}

/// Shell command that records its pid and then hangs.
fn hanging_compiler(pid_file: &Path) -> CommandCompiler {
    let script = format!("echo $$ > {}; exec sleep 30", pid_file.display());
    compiler("sh", &["-c", &script])
}

fn request(timeout: Option<Duration>) -> CompileRequest {
    CompileRequest {
        fixture: "bitwise".to_string(),
        source: "kernel:\n\txorl %esi, %edi\n\tretq\n".to_string(),
        architecture: Architecture::X86,
        opt_level: "O2".to_string(),
        timeout,
    }
}

fn process_exists(pid: &str) -> bool {
    Command::new("kill")
        .args(["-0", pid])
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

fn read_pid(path: &Path) -> String {
    fs::read_to_string(path).expect("pid file").trim().to_string()
}

#[test]
fn stdout_of_an_assembly_command_is_the_listing() {
    let artifact = compiler("cat", &["{source}"]).compile(&request(None)).expect("cat compile");
    match artifact {
        Artifact::Listing(text) => assert!(text.contains("xorl"), "{text}"),
        other => panic!("expected a listing, got {other:?}"),
    }
}

#[test]
fn failing_command_reports_status_and_stderr() {
    let err = compiler("sh", &["-c", "echo 'no such target' >&2; exit 3"])
        .compile(&request(None))
        .expect_err("failing compile");
    match err {
        CompileError::Failed { stderr, .. } => assert_eq!(stderr, "no such target"),
        other => panic!("expected a failed compile, got {other:?}"),
    }
}

#[test]
fn missing_architecture_is_unsupported() {
    let mut req = request(None);
    req.architecture = Architecture::Ppc;
    let err = compiler("cat", &["{source}"]).compile(&req).expect_err("no ppc command");
    assert_eq!(err, CompileError::Unsupported(Architecture::Ppc));
}

#[test]
fn hung_compiler_is_killed_and_reaped_at_the_deadline() {
    let tmp = tempdir().expect("tempdir");
    let pid_file = tmp.path().join("pid");
    let started = Instant::now();
    let err = hanging_compiler(&pid_file)
        .compile(&request(Some(Duration::from_millis(300))))
        .expect_err("hung compile");

    assert_eq!(err, CompileError::TimedOut { millis: 300 });
    assert!(started.elapsed() < Duration::from_secs(10), "waited {:?}", started.elapsed());
    let pid = read_pid(&pid_file);
    assert!(!process_exists(&pid), "compiler pid {pid} still running");
}

#[test]
fn oracle_reports_timeout_after_killing_the_compiler() {
    let tmp = tempdir().expect("tempdir");
    let pid_file = tmp.path().join("pid");
    let fixture = Fixture {
        name: "bitwise".to_string(),
        source_path: PathBuf::from("bitwise.s"),
        source: String::new(),
        kernel: None,
        expected: BTreeMap::from([(Architecture::X86, vec![Category::Bitwise])]),
    };
    let settings = OracleSettings {
        workers: 1,
        timeout: Duration::from_millis(300),
        ..OracleSettings::default()
    };
    let oracle = Oracle::new(
        Arc::new(Taxonomy::builtin().expect("builtin taxonomy")),
        Arc::new(hanging_compiler(&pid_file)),
        settings,
    );
    let report = oracle.run(&[fixture], &[Architecture::X86]);

    let cell = &report.verdicts[0];
    assert_eq!(cell.result, VerdictResult::Fail);
    assert_eq!(cell.cause, Some(CellFailure::Timeout { millis: 300 }));
    let pid = read_pid(&pid_file);
    assert!(!process_exists(&pid), "compiler pid {pid} outlived the run");
}
