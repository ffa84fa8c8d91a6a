use std::fs;
use std::path::{Path, PathBuf};

use isa_oracle::{ordered_architectures, read_artifact};
use oracle_core::model::Architecture;
use oracle_core::services::disassembly::Artifact;
use tempfile::tempdir;

fn write(dir: &Path, name: &str, body: &[u8]) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, body).expect("write file");
    path
}

#[test]
fn read_artifact_picks_listing_by_extension_or_flag() {
    let tmp = tempdir().expect("tempdir");
    let asm = write(tmp.path(), "kernel.s", b"kernel:\n\txor %eax, %eax\n");
    assert!(matches!(read_artifact(&asm, false).expect("read .s"), Artifact::Listing(_)));

    let txt = write(tmp.path(), "kernel.txt", b"kernel:\n\txor %eax, %eax\n");
    assert!(matches!(read_artifact(&txt, false).expect("read .txt"), Artifact::Object(_)));
    assert!(matches!(read_artifact(&txt, true).expect("read .txt as listing"), Artifact::Listing(_)));
}

#[test]
fn read_artifact_reports_missing_files() {
    let tmp = tempdir().expect("tempdir");
    let err = read_artifact(&tmp.path().join("missing.o"), false).expect_err("missing file");
    assert!(err.to_string().contains("missing.o"));
}

#[test]
fn architectures_are_sorted_and_deduplicated() {
    let archs = ordered_architectures(&[
        Architecture::Ppc,
        Architecture::X86,
        Architecture::Ppc,
        Architecture::Arm,
    ]);
    assert_eq!(archs, vec![Architecture::X86, Architecture::Arm, Architecture::Ppc]);
}
