use std::fs;
use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::tempdir;

fn write(dir: &Path, name: &str, body: &str) {
    fs::write(dir.join(name), body).expect("write file");
}

#[test]
fn taxonomy_lists_builtin_entries_as_json() {
    let output = cargo_bin_cmd!("isa-oracle")
        .args(["taxonomy", "--arch", "mips", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let entries: serde_json::Value = serde_json::from_slice(&output).expect("taxonomy json");
    let nor = entries
        .as_array()
        .expect("entries array")
        .iter()
        .find(|e| e["pattern"] == "nor")
        .expect("nor entry");
    assert_eq!(nor["category"], "bitwise");
    assert_eq!(nor["architecture"], "mips");
}

#[test]
fn taxonomy_includes_suite_extensions() {
    let tmp = tempdir().expect("tempdir");
    write(
        tmp.path(),
        "suite.yaml",
        "taxonomy:\n  x86:\n    - { pattern: \"vpshld*\", category: shift-rotate }\nfixtures: []\n",
    );
    cargo_bin_cmd!("isa-oracle")
        .args(["taxonomy", "--arch", "x86", "--suite"])
        .arg(tmp.path().join("suite.yaml"))
        .assert()
        .success()
        .stdout(predicate::str::contains("vpshld*").and(predicate::str::contains("shift-rotate")));
}

#[test]
fn unknown_architecture_is_a_usage_error() {
    cargo_bin_cmd!("isa-oracle")
        .args(["taxonomy", "--arch", "sparc"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown architecture"));
}

#[test]
fn classify_reports_dominant_category_of_a_listing() {
    let tmp = tempdir().expect("tempdir");
    write(
        tmp.path(),
        "kernel.s",
        "kernel:\n\txorl %esi, %edi\n\tandl %edx, %edi\n\tnotl %edi\n\tmovl %edi, %eax\n\tretq\n",
    );
    let output = cargo_bin_cmd!("isa-oracle")
        .args(["classify", "--arch", "x86", "--json", "--artifact"])
        .arg(tmp.path().join("kernel.s"))
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let body: serde_json::Value = serde_json::from_slice(&output).expect("classify json");
    assert_eq!(body["instructions"], 5);
    assert_eq!(body["dominant"], "bitwise");
    assert_eq!(body["counts"]["bitwise"], 3);
}

#[test]
fn classify_fails_on_undecodable_object() {
    let tmp = tempdir().expect("tempdir");
    write(tmp.path(), "junk.o", "definitely not an object file");
    cargo_bin_cmd!("isa-oracle")
        .args(["classify", "--arch", "x86", "--artifact"])
        .arg(tmp.path().join("junk.o"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to decode"));
}

#[test]
fn check_suite_accepts_valid_and_rejects_duplicate_fixtures() {
    let tmp = tempdir().expect("tempdir");
    write(tmp.path(), "xor.c", "int kernel(int a, int b) { return a ^ b; }\n");
    write(
        tmp.path(),
        "suite.yaml",
        "fixtures:\n  - { name: xor, source: xor.c, expected: { x86: [bitwise], mips: [bitwise] } }\n",
    );
    cargo_bin_cmd!("isa-oracle")
        .args(["check-suite", "--suite"])
        .arg(tmp.path().join("suite.yaml"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Suite OK").and(predicate::str::contains("Cells: 2")));

    write(
        tmp.path(),
        "dup.yaml",
        "fixtures:\n  - { name: xor, source: xor.c, expected: { x86: [bitwise] } }\n  - { name: xor, source: xor.c, expected: { arm: [bitwise] } }\n",
    );
    cargo_bin_cmd!("isa-oracle")
        .args(["check-suite", "--suite"])
        .arg(tmp.path().join("dup.yaml"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("duplicate fixture name 'xor'"));
}

/// Suite whose "compiler" just echoes a hand-written listing back.
#[cfg(unix)]
fn listing_suite(dir: &Path, x86_expectation: &str) {
    write(dir, "bitwise.s", "kernel:\n\txorl %esi, %edi\n\torl %edx, %edi\n\tretq\n");
    write(
        dir,
        "suite.yaml",
        &format!(
            r#"
workers: 2
timeout_secs: 30
compilers:
  x86: {{ program: cat, args: ["{{source}}"], output: assembly }}
  mips: {{ program: "false", args: [], output: assembly }}
fixtures:
  - name: bitwise
    source: bitwise.s
    kernel: kernel
    expected:
      x86: [{x86_expectation}]
      mips: [bitwise]
"#
        ),
    );
}

#[cfg(unix)]
#[test]
fn run_passes_when_listing_matches_expectation() {
    let tmp = tempdir().expect("tempdir");
    listing_suite(tmp.path(), "bitwise");
    cargo_bin_cmd!("isa-oracle")
        .args(["run", "--arch", "x86", "--suite"])
        .arg(tmp.path().join("suite.yaml"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Summary: 1 pass, 0 fail"));
}

#[cfg(unix)]
#[test]
fn run_exits_nonzero_and_isolates_failing_cells() {
    let tmp = tempdir().expect("tempdir");
    listing_suite(tmp.path(), "float-add");
    let output = cargo_bin_cmd!("isa-oracle")
        .args(["run", "--json", "--suite"])
        .arg(tmp.path().join("suite.yaml"))
        .assert()
        .failure()
        .get_output()
        .stdout
        .clone();
    let report: serde_json::Value = serde_json::from_slice(&output).expect("report json");
    let verdicts = report["verdicts"].as_array().expect("verdicts array");
    assert_eq!(verdicts.len(), 2);

    assert_eq!(verdicts[0]["architecture"], "x86");
    assert_eq!(verdicts[0]["observed"], "bitwise");
    assert_eq!(verdicts[0]["result"], "fail");

    assert_eq!(verdicts[1]["architecture"], "mips");
    assert_eq!(verdicts[1]["result"], "fail");
    assert_eq!(verdicts[1]["cause"]["kind"], "compile");
}

#[test]
fn zero_timeout_override_is_rejected() {
    let tmp = tempdir().expect("tempdir");
    write(tmp.path(), "xor.c", "int kernel(int a, int b) { return a ^ b; }\n");
    write(
        tmp.path(),
        "suite.yaml",
        "fixtures:\n  - { name: xor, source: xor.c, expected: { x86: [bitwise] } }\n",
    );
    cargo_bin_cmd!("isa-oracle")
        .args(["run", "--timeout-secs", "0", "--suite"])
        .arg(tmp.path().join("suite.yaml"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("--timeout-secs must be at least 1"));
}
