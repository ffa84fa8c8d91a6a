use capstone::{arch, prelude::*, Capstone, Endian};
use goblin::{elf, mach, pe, Object};
use log::debug;

use crate::model::{Architecture, MnemonicSequence};
use crate::services::disassembly::{
    ArmMode, Artifact, DecodeError, DisassemblyBackend, DisassemblyOptions,
};
use crate::services::normalize::normalize;

/// Decodes ELF, PE and Mach-O objects with Capstone.
pub struct CapstoneBackend;

#[derive(Debug, Clone)]
struct SymbolInfo {
    name: String,
    file_range: Option<(usize, usize)>,
}

#[derive(Debug, Clone)]
struct CodeRange {
    name: String,
    start: usize,
    end: usize,
}

/// What the object header and section table told us.
#[derive(Debug, Clone)]
struct ObjectLayout {
    arch: Architecture,
    is_64: bool,
    big_endian: bool,
    /// File offset of the machine field, reported on architecture mismatch.
    machine_offset: usize,
    code: Vec<CodeRange>,
    symbols: Vec<SymbolInfo>,
}

fn section_range_to_file(
    addr: u64,
    size: Option<u64>,
    sec_addr: u64,
    sec_size: u64,
    sec_offset: u64,
    bytes_len: usize,
) -> Option<(usize, usize)> {
    let sec_end = sec_addr.checked_add(sec_size)?;
    if addr < sec_addr || addr >= sec_end {
        return None;
    }
    let offset_in_section = addr.saturating_sub(sec_addr);
    let start = sec_offset.saturating_add(offset_in_section);
    if start as usize >= bytes_len {
        return None;
    }
    let available = sec_size.saturating_sub(offset_in_section);
    let length = size.unwrap_or(available).min(available);
    let end = start.saturating_add(length);
    let end = end.min(bytes_len as u64);
    if end <= start {
        None
    } else {
        Some((start as usize, end as usize))
    }
}

/// File range of a section that must lie entirely inside the file.
fn contained(start: u64, size: u64, bytes_len: usize) -> Option<(usize, usize)> {
    let end = start.checked_add(size)?;
    if end > bytes_len as u64 {
        return None;
    }
    Some((usize::try_from(start).ok()?, usize::try_from(end).ok()?))
}

fn clip(start: u64, size: u64, bytes_len: usize) -> Option<(usize, usize)> {
    let start = usize::try_from(start).ok()?;
    let end = start.saturating_add(usize::try_from(size).ok()?).min(bytes_len);
    (start < end).then_some((start, end))
}

fn elf_layout(elf: &elf::Elf, bytes_len: usize) -> Result<ObjectLayout, DecodeError> {
    // e_machine sits right after e_ident (16 bytes) and e_type (2 bytes).
    let machine_offset = 18;
    let arch = match elf.header.e_machine {
        elf::header::EM_X86_64 | elf::header::EM_386 => Architecture::X86,
        elf::header::EM_AARCH64 | elf::header::EM_ARM => Architecture::Arm,
        elf::header::EM_RISCV => Architecture::Riscv,
        elf::header::EM_MIPS => Architecture::Mips,
        elf::header::EM_PPC | elf::header::EM_PPC64 => Architecture::Ppc,
        other => {
            return Err(DecodeError::new(
                machine_offset,
                format!("unsupported ELF machine {other}"),
            ))
        }
    };
    let thumb_bit = elf.header.e_machine == elf::header::EM_ARM;

    let mut code = Vec::new();
    for (index, sh) in elf.section_headers.iter().enumerate() {
        if sh.sh_type != elf::section_header::SHT_PROGBITS || !sh.is_executable() {
            continue;
        }
        if sh.sh_size == 0 {
            continue;
        }
        let name = elf.shdr_strtab.get_at(sh.sh_name).unwrap_or("").to_string();
        let Some((start, end)) = contained(sh.sh_offset, sh.sh_size, bytes_len) else {
            let header_offset = usize::try_from(elf.header.e_shoff)
                .unwrap_or(usize::MAX)
                .saturating_add(index.saturating_mul(elf.header.e_shentsize as usize));
            return Err(DecodeError::new(
                header_offset,
                format!("section {name} extends past the end of the file"),
            ));
        };
        code.push(CodeRange { name, start, end });
    }

    let mut symbols = Vec::new();
    for sym in &elf.syms {
        if !sym.is_function() || sym.st_shndx == elf::section_header::SHN_UNDEF as usize {
            continue;
        }
        let name = elf.strtab.get_at(sym.st_name).unwrap_or("").to_string();
        if name.is_empty() {
            continue;
        }
        let value = if thumb_bit { sym.st_value & !1 } else { sym.st_value };
        let size = if sym.st_size > 0 { Some(sym.st_size) } else { None };
        let file_range = elf.section_headers.get(sym.st_shndx).and_then(|shdr| {
            section_range_to_file(value, size, shdr.sh_addr, shdr.sh_size, shdr.sh_offset, bytes_len)
        });
        symbols.push(SymbolInfo { name, file_range });
    }

    Ok(ObjectLayout {
        arch,
        is_64: elf.is_64,
        big_endian: !elf.little_endian,
        machine_offset,
        code,
        symbols,
    })
}

fn pe_layout(pe: &pe::PE, bytes_len: usize) -> Result<ObjectLayout, DecodeError> {
    let machine_offset = (pe.header.dos_header.pe_pointer as usize).saturating_add(4);
    let arch = match pe.header.coff_header.machine {
        pe::header::COFF_MACHINE_X86 | pe::header::COFF_MACHINE_X86_64 => Architecture::X86,
        pe::header::COFF_MACHINE_ARM | pe::header::COFF_MACHINE_ARM64 => Architecture::Arm,
        other => {
            return Err(DecodeError::new(
                machine_offset,
                format!("unsupported PE machine 0x{other:X}"),
            ))
        }
    };

    let mut code = Vec::new();
    for sec in &pe.sections {
        if sec.characteristics & pe::section_table::IMAGE_SCN_CNT_CODE == 0 {
            continue;
        }
        let size = if sec.virtual_size == 0 {
            sec.size_of_raw_data
        } else {
            sec.virtual_size.min(sec.size_of_raw_data)
        };
        if let Some((start, end)) = clip(sec.pointer_to_raw_data as u64, size as u64, bytes_len) {
            let name = sec.name().unwrap_or_default().to_string();
            code.push(CodeRange { name, start, end });
        }
    }

    let mut symbols = Vec::new();
    for exp in &pe.exports {
        if exp.rva == 0 {
            continue;
        }
        let name = exp.name.unwrap_or_default().to_string();
        if name.is_empty() {
            continue;
        }
        let file_range = pe.sections.iter().find_map(|sec| {
            let size = if sec.virtual_size == 0 { sec.size_of_raw_data } else { sec.virtual_size };
            section_range_to_file(
                exp.rva as u64,
                None,
                sec.virtual_address as u64,
                size as u64,
                sec.pointer_to_raw_data as u64,
                bytes_len,
            )
        });
        symbols.push(SymbolInfo { name, file_range });
    }

    Ok(ObjectLayout { arch, is_64: pe.is_64, big_endian: false, machine_offset, code, symbols })
}

fn mach_layout(bin: &mach::MachO, bytes_len: usize) -> Result<ObjectLayout, DecodeError> {
    // cputype follows the 4-byte magic.
    let machine_offset = 4;
    let arch = match bin.header.cputype() {
        mach::cputype::CPU_TYPE_X86 | mach::cputype::CPU_TYPE_X86_64 => Architecture::X86,
        mach::cputype::CPU_TYPE_ARM | mach::cputype::CPU_TYPE_ARM64 => Architecture::Arm,
        mach::cputype::CPU_TYPE_POWERPC | mach::cputype::CPU_TYPE_POWERPC64 => Architecture::Ppc,
        other => {
            return Err(DecodeError::new(
                machine_offset,
                format!("unsupported Mach-O cputype 0x{other:X}"),
            ))
        }
    };

    let mut sections = Vec::new();
    for (sec, _) in bin.segments.sections().flatten().filter_map(Result::ok) {
        sections.push(sec);
    }

    let code = sections
        .iter()
        .filter(|sec| sec.name().map(|n| n == "__text").unwrap_or(false))
        .filter_map(|sec| {
            let (start, end) = clip(sec.offset as u64, sec.size, bytes_len)?;
            Some(CodeRange { name: "__text".to_string(), start, end })
        })
        .collect();

    let mut symbols = Vec::new();
    for sym in bin.symbols() {
        let Ok((name, nlist)) = sym else { continue };
        let name = name.trim_start_matches('_').to_string();
        if name.is_empty() {
            continue;
        }
        let file_range = sections.iter().find_map(|sec| {
            section_range_to_file(
                nlist.n_value,
                None,
                sec.addr,
                sec.size,
                sec.offset as u64,
                bytes_len,
            )
        });
        symbols.push(SymbolInfo { name, file_range });
    }

    Ok(ObjectLayout {
        arch,
        is_64: bin.is_64,
        big_endian: !bin.little_endian,
        machine_offset,
        code,
        symbols,
    })
}

fn parse_object(bytes: &[u8]) -> Result<ObjectLayout, DecodeError> {
    match Object::parse(bytes) {
        Ok(Object::Elf(elf)) => elf_layout(&elf, bytes.len()),
        Ok(Object::PE(pe)) => pe_layout(&pe, bytes.len()),
        Ok(Object::Mach(mach::Mach::Binary(bin))) => mach_layout(&bin, bytes.len()),
        Ok(_) => Err(DecodeError::new(0, "unsupported object format")),
        Err(e) => Err(DecodeError::new(0, format!("failed to parse object: {e}"))),
    }
}

fn make_cs(layout: &ObjectLayout, arm_mode: ArmMode) -> Result<Capstone, DecodeError> {
    let endian = if layout.big_endian { Endian::Big } else { Endian::Little };
    let built = match (layout.arch, layout.is_64) {
        (Architecture::X86, true) => Capstone::new().x86().mode(arch::x86::ArchMode::Mode64).build(),
        (Architecture::X86, false) => {
            Capstone::new().x86().mode(arch::x86::ArchMode::Mode32).build()
        }
        (Architecture::Arm, true) => {
            Capstone::new().arm64().mode(arch::arm64::ArchMode::Arm).build()
        }
        (Architecture::Arm, false) => {
            let mode = match arm_mode {
                ArmMode::Arm => arch::arm::ArchMode::Arm,
                ArmMode::Thumb => arch::arm::ArchMode::Thumb,
            };
            Capstone::new().arm().mode(mode).endian(endian).build()
        }
        (Architecture::Riscv, is_64) => {
            let mode =
                if is_64 { arch::riscv::ArchMode::RiscV64 } else { arch::riscv::ArchMode::RiscV32 };
            Capstone::new()
                .riscv()
                .mode(mode)
                .extra_mode(std::iter::once(arch::riscv::ArchExtraMode::RiscVC))
                .build()
        }
        (Architecture::Mips, is_64) => {
            let mode =
                if is_64 { arch::mips::ArchMode::Mips64 } else { arch::mips::ArchMode::Mips32 };
            Capstone::new().mips().mode(mode).endian(endian).build()
        }
        (Architecture::Ppc, is_64) => {
            let mode = if is_64 { arch::ppc::ArchMode::Mode64 } else { arch::ppc::ArchMode::Mode32 };
            Capstone::new().ppc().mode(mode).endian(endian).build()
        }
    };
    built.map_err(|e| DecodeError::new(0, format!("capstone init failed: {e}")))
}

fn decode_range(
    cs: &Capstone,
    bytes: &[u8],
    range: &CodeRange,
    arch: Architecture,
    out: &mut MnemonicSequence,
) -> Result<(), DecodeError> {
    let code = &bytes[range.start..range.end];
    let base = range.start as u64;
    let insns = cs
        .disasm_all(code, base)
        .map_err(|e| DecodeError::new(range.start, format!("capstone: {e}")))?;

    let mut decoded_end = 0usize;
    for insn in insns.iter() {
        decoded_end = (insn.address() - base) as usize + insn.bytes().len();
        out.push(normalize(arch, insn.mnemonic().unwrap_or("unknown")));
    }
    if decoded_end < code.len() {
        return Err(DecodeError::new(
            range.start + decoded_end,
            format!("undecodable bytes in {}", range.name),
        ));
    }
    Ok(())
}

impl DisassemblyBackend for CapstoneBackend {
    fn disassemble(
        &self,
        artifact: &Artifact,
        arch: Architecture,
        options: &DisassemblyOptions,
    ) -> Result<MnemonicSequence, DecodeError> {
        let Artifact::Object(bytes) = artifact else {
            return Err(DecodeError::new(0, "capstone backend received a text listing"));
        };
        if bytes.is_empty() {
            return Err(DecodeError::new(0, "empty object"));
        }

        let layout = parse_object(bytes)?;
        if layout.arch != arch {
            return Err(DecodeError::new(
                layout.machine_offset,
                format!("object targets {} but {} was requested", layout.arch, arch),
            ));
        }
        let cs = make_cs(&layout, options.arm_mode)?;

        let kernel_range = options.kernel.as_deref().and_then(|kernel| {
            let bare = kernel.trim_start_matches('_');
            let sym = layout
                .symbols
                .iter()
                .find(|s| (s.name == kernel || s.name == bare) && s.file_range.is_some());
            if sym.is_none() {
                debug!("kernel symbol '{kernel}' not found; decoding all executable sections");
            }
            sym.and_then(|s| s.file_range)
                .map(|(start, end)| CodeRange { name: kernel.to_string(), start, end })
        });
        let ranges = match kernel_range {
            Some(range) => vec![range],
            None => layout.code.clone(),
        };

        let mut sequence = Vec::new();
        for range in &ranges {
            decode_range(&cs, bytes, range, arch, &mut sequence)?;
        }
        Ok(sequence)
    }

    fn name(&self) -> &'static str {
        "capstone"
    }
}
