use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::model::{Architecture, MnemonicSequence};
use crate::services::backends::ListingBackend;

/// Output of the compiler service for one (fixture, architecture) cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Artifact {
    /// Relocatable object or linked image (ELF, PE or Mach-O).
    Object(Vec<u8>),
    /// Assembly listing (`cc -S` or `objdump -d` output).
    Listing(String),
}

impl Artifact {
    pub fn bytes(&self) -> &[u8] {
        match self {
            Artifact::Object(bytes) => bytes,
            Artifact::Listing(text) => text.as_bytes(),
        }
    }

    /// SHA-256 of the artifact contents as lowercase hex.
    pub fn sha256(&self) -> String {
        let digest = Sha256::digest(self.bytes());
        format!("{:x}", digest)
    }
}

/// The artifact could not be turned into a mnemonic sequence.
///
/// `offset` is the byte offset into the artifact where decoding stopped. For
/// listings it is the offset of the offending line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("decode failed at offset 0x{offset:X}: {message}")]
pub struct DecodeError {
    pub offset: usize,
    pub message: String,
}

impl DecodeError {
    pub fn new(offset: usize, message: impl Into<String>) -> Self {
        Self { offset, message: message.into() }
    }
}

/// Instruction-set state used when decoding 32-bit ARM objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArmMode {
    #[default]
    Arm,
    Thumb,
}

/// Knobs that influence how an artifact is decoded.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DisassemblyOptions {
    /// Restrict decoding to this function symbol when the object has it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kernel: Option<String>,
    #[serde(default)]
    pub arm_mode: ArmMode,
}

/// Trait implemented by disassembly backends (e.g., Capstone, listing parser).
pub trait DisassemblyBackend: Send + Sync {
    fn disassemble(
        &self,
        artifact: &Artifact,
        arch: Architecture,
        options: &DisassemblyOptions,
    ) -> Result<MnemonicSequence, DecodeError>;
    fn name(&self) -> &'static str;
}

/// Turn any artifact into normalized base mnemonics for `arch`.
///
/// Never mutates or retains the artifact.
pub fn disassemble(
    artifact: &Artifact,
    arch: Architecture,
    options: &DisassemblyOptions,
) -> Result<MnemonicSequence, DecodeError> {
    match artifact {
        Artifact::Listing(_) => ListingBackend.disassemble(artifact, arch, options),
        Artifact::Object(_) => object_backend().disassemble(artifact, arch, options),
    }
}

#[cfg(feature = "capstone-backend")]
fn object_backend() -> &'static dyn DisassemblyBackend {
    &crate::services::backends::CapstoneBackend
}

#[cfg(not(feature = "capstone-backend"))]
fn object_backend() -> &'static dyn DisassemblyBackend {
    &NoObjectBackend
}

/// Stand-in used when the crate is built without an object decoder.
#[cfg(not(feature = "capstone-backend"))]
struct NoObjectBackend;

#[cfg(not(feature = "capstone-backend"))]
impl DisassemblyBackend for NoObjectBackend {
    fn disassemble(
        &self,
        _artifact: &Artifact,
        _arch: Architecture,
        _options: &DisassemblyOptions,
    ) -> Result<MnemonicSequence, DecodeError> {
        Err(DecodeError::new(0, "object decoding requires the capstone-backend feature"))
    }

    fn name(&self) -> &'static str {
        "none"
    }
}
