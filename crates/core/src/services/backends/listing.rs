use crate::model::{Architecture, MnemonicSequence};
use crate::services::disassembly::{Artifact, DecodeError, DisassemblyBackend, DisassemblyOptions};
use crate::services::normalize::normalize;

/// Parses textual assembly: compiler `-S` output or `objdump -d` dumps.
pub struct ListingBackend;

/// x86 prefixes that precede the real mnemonic in a listing.
const X86_PREFIXES: &[&str] = &[
    "lock", "rep", "repe", "repz", "repne", "repnz", "notrack", "bnd", "data16", "addr32", "rex",
    "rex.w", "cs", "ds", "es", "ss",
];

impl DisassemblyBackend for ListingBackend {
    fn disassemble(
        &self,
        artifact: &Artifact,
        arch: Architecture,
        options: &DisassemblyOptions,
    ) -> Result<MnemonicSequence, DecodeError> {
        let Artifact::Listing(text) = artifact else {
            return Err(DecodeError::new(0, "listing backend received an object artifact"));
        };
        parse_listing(text, arch, options.kernel.as_deref())
    }

    fn name(&self) -> &'static str {
        "listing"
    }
}

/// Extract normalized mnemonics from a listing.
///
/// With `kernel` set, only instructions under that label (up to the next
/// global label) are kept; a listing without the label is used whole.
pub fn parse_listing(
    text: &str,
    arch: Architecture,
    kernel: Option<&str>,
) -> Result<MnemonicSequence, DecodeError> {
    let mut all = Vec::new();
    let mut in_kernel = false;
    let mut kernel_seen = false;
    let mut kernel_mnemonics = Vec::new();
    let mut offset = 0usize;

    for line in text.split_inclusive('\n') {
        let line_offset = offset;
        offset += line.len();

        if line.contains('\0') {
            return Err(DecodeError::new(line_offset, "binary data in assembly listing"));
        }

        match classify_line(line) {
            Line::Skip => {}
            Line::Label(label) => {
                if let Some(k) = kernel {
                    if same_symbol(label, k) {
                        in_kernel = true;
                        kernel_seen = true;
                    } else if !is_local_label(label) {
                        in_kernel = false;
                    }
                }
            }
            Line::Instruction(body) => {
                let Some(raw) = first_mnemonic(body, arch) else { continue };
                let mnemonic = normalize(arch, raw);
                if in_kernel {
                    kernel_mnemonics.push(mnemonic.clone());
                }
                all.push(mnemonic);
            }
        }
    }

    if kernel_seen {
        Ok(kernel_mnemonics)
    } else {
        Ok(all)
    }
}

enum Line<'a> {
    Skip,
    Label(&'a str),
    Instruction(&'a str),
}

fn classify_line(line: &str) -> Line<'_> {
    let trimmed = line.trim();
    if trimmed.is_empty()
        || trimmed.starts_with(['#', '@', ';', '!'])
        || trimmed.starts_with("//")
        || trimmed.starts_with("Disassembly of")
        || trimmed.contains("file format")
    {
        return Line::Skip;
    }

    // objdump: "0000000000001130 <kernel>:" starts a function.
    if let Some(rest) = trimmed.strip_suffix(">:") {
        return match rest.split_once('<') {
            Some((_, name)) => Line::Label(name),
            None => Line::Skip,
        };
    }

    // objdump: "  4:\t48 01 d0   \tadd    %rdx,%rax"
    if let Some((addr, rest)) = trimmed.split_once(':') {
        if !addr.is_empty() && addr.chars().all(|c| c.is_ascii_hexdigit()) && rest.contains('\t')
        {
            let mut fields = rest.split('\t').map(str::trim).filter(|f| !f.is_empty());
            let _bytes = fields.next();
            return match fields.next() {
                Some(insn) => Line::Instruction(insn),
                None => Line::Skip,
            };
        }
    }

    if trimmed.starts_with('.') && !trimmed.contains(':') {
        return Line::Skip;
    }

    // Symbol assignments such as MIPS "$LFB0 = .".
    if trimmed.split_whitespace().nth(1) == Some("=") {
        return Line::Skip;
    }

    // Labels, possibly followed by an instruction on the same line.
    if let Some((label, rest)) = trimmed.split_once(':') {
        if is_label_token(label) {
            let rest = rest.trim();
            if rest.is_empty() || rest.starts_with(['#', ';', '@']) || rest.starts_with("//") {
                return Line::Label(label);
            }
            return Line::Instruction(rest);
        }
    }

    Line::Instruction(trimmed)
}

fn is_label_token(token: &str) -> bool {
    !token.is_empty()
        && !token.contains(char::is_whitespace)
        && token.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '$'))
}

fn is_local_label(label: &str) -> bool {
    [".L", "$", "L.", "LBB", "Ltmp"].iter().any(|p| label.starts_with(p))
}

/// Mach-O prefixes C symbols with an underscore.
fn same_symbol(label: &str, kernel: &str) -> bool {
    label == kernel || label.strip_prefix('_') == Some(kernel)
}

fn first_mnemonic(body: &str, arch: Architecture) -> Option<&str> {
    let mut tokens = body.split_whitespace().filter(|t| !t.starts_with('{'));
    let mut token = tokens.next()?;
    if arch == Architecture::X86 {
        while X86_PREFIXES.contains(&token.to_lowercase().as_str()) {
            token = tokens.next()?;
        }
    }
    let token = token.trim_end_matches(',');
    if token.starts_with('.') {
        return None;
    }
    Some(token)
}
