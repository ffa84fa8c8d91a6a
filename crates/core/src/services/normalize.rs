//! Reduce a raw mnemonic to the base form the taxonomy is keyed on.
//!
//! Only execution-time decorations are removed (operand-size suffixes,
//! condition codes, flag-setting and record bits, branch hints, compressed
//! encodings). Suffixes that change what the instruction computes, such as
//! `addss`/`addsd` or `add.s`/`add.d`, are preserved.

use crate::model::Architecture;

/// x86 stems that take an AT&T operand-size suffix (`addl`, `shrq`, ...).
const X86_SIZED_STEMS: &[&str] = &[
    "add", "sub", "and", "or", "xor", "not", "neg", "andn", "mul", "imul", "div", "idiv", "shl",
    "sal", "shr", "sar", "rol", "ror", "rcl", "rcr", "shld", "shrd", "mov", "lea", "cmp", "test",
    "inc", "dec", "push", "pop", "call", "ret", "jmp", "adc", "sbb", "bswap",
];

/// x87 stems whose AT&T forms carry a memory-operand size (`fadds`, `faddl`,
/// `fildq`, `fstpt`).
const X87_SIZED_STEMS: &[&str] = &[
    "fadd", "fsub", "fsubr", "fmul", "fdiv", "fdivr", "fld", "fst", "fstp", "fcom", "fcomp",
    "fiadd", "fisub", "fisubr", "fimul", "fidiv", "fidivr", "fild", "fist", "fistp", "ficom",
];

/// ARM stems that accept a condition code and/or an `s` flag suffix.
const ARM_CONDITIONAL_STEMS: &[&str] = &[
    "add", "adc", "sub", "sbc", "rsb", "rsc", "and", "orr", "eor", "bic", "mvn", "mov", "mul",
    "mla", "mls", "umull", "smull", "umlal", "smlal", "lsl", "lsr", "asr", "ror", "rrx", "cmp",
    "cmn", "tst", "teq", "ldr", "str", "push", "pop", "bx", "blx", "bl", "b",
];

/// Stems from the list above that never carry the `s` flag.
const ARM_CONDITION_ONLY_STEMS: &[&str] =
    &["cmp", "cmn", "tst", "teq", "ldr", "str", "push", "pop", "bx", "blx", "bl", "b"];

const ARM_CONDITIONS: &[&str] = &[
    "eq", "ne", "cs", "hs", "cc", "lo", "mi", "pl", "vs", "vc", "hi", "ls", "ge", "lt", "gt", "le",
    "al",
];

pub fn normalize(arch: Architecture, raw: &str) -> String {
    let m = raw.trim().to_lowercase();
    match arch {
        Architecture::X86 => normalize_x86(m),
        Architecture::Arm => normalize_arm(m),
        Architecture::Riscv => normalize_riscv(m),
        Architecture::Mips => m,
        Architecture::Ppc => normalize_ppc(m),
    }
}

fn normalize_x86(m: String) -> String {
    if X86_SIZED_STEMS.contains(&m.as_str()) {
        return m;
    }
    if let Some(stem) = m.strip_suffix(['b', 'w', 'l', 'q']) {
        if X86_SIZED_STEMS.contains(&stem) {
            return stem.to_string();
        }
    }
    if X87_SIZED_STEMS.contains(&m.as_str()) {
        return m;
    }
    if let Some(stem) = m.strip_suffix(['s', 'l', 't', 'q']) {
        if X87_SIZED_STEMS.contains(&stem) {
            return stem.to_string();
        }
    }
    m
}

fn normalize_arm(m: String) -> String {
    // Thumb-2 encoding width qualifiers.
    let m = match m.strip_suffix(".w").or_else(|| m.strip_suffix(".n")) {
        Some(base) => base.to_string(),
        None => m,
    };
    // A64 conditional branch.
    if let Some(cond) = m.strip_prefix("b.") {
        if ARM_CONDITIONS.contains(&cond) {
            return "b".to_string();
        }
    }
    if m.contains('.') || ARM_CONDITIONAL_STEMS.contains(&m.as_str()) {
        return m;
    }
    // Longest stem first so `bl` wins over `b` and `umull` over `mul`.
    let mut stems: Vec<&str> = ARM_CONDITIONAL_STEMS.to_vec();
    stems.sort_by_key(|s| std::cmp::Reverse(s.len()));
    for stem in stems {
        if let Some(rest) = m.strip_prefix(stem) {
            if is_arm_suffix(rest, !ARM_CONDITION_ONLY_STEMS.contains(&stem)) {
                return stem.to_string();
            }
        }
    }
    m
}

/// `s`, a condition, or both in either UAL (`addseq`) or pre-UAL (`addeqs`) order.
fn is_arm_suffix(rest: &str, allows_flag: bool) -> bool {
    if ARM_CONDITIONS.contains(&rest) {
        return true;
    }
    if !allows_flag {
        return false;
    }
    if rest == "s" {
        return true;
    }
    if let Some(cond) = rest.strip_prefix('s') {
        return ARM_CONDITIONS.contains(&cond);
    }
    if let Some(cond) = rest.strip_suffix('s') {
        return ARM_CONDITIONS.contains(&cond);
    }
    false
}

fn normalize_riscv(m: String) -> String {
    match m.strip_prefix("c.") {
        Some(base) => base.to_string(),
        None => m,
    }
}

fn normalize_ppc(m: String) -> String {
    let trimmed = m.trim_end_matches(['+', '-']);
    trimmed.strip_suffix('.').unwrap_or(trimmed).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn x86_strips_att_size_suffix_only_on_known_stems() {
        assert_eq!(normalize(Architecture::X86, "xorl"), "xor");
        assert_eq!(normalize(Architecture::X86, "IMULQ"), "imul");
        assert_eq!(normalize(Architecture::X86, "sall"), "sal");
        assert_eq!(normalize(Architecture::X86, "shl"), "shl");
        assert_eq!(normalize(Architecture::X86, "rol"), "rol");
        assert_eq!(normalize(Architecture::X86, "addss"), "addss");
        assert_eq!(normalize(Architecture::X86, "addsd"), "addsd");
        assert_eq!(normalize(Architecture::X86, "call"), "call");
        assert_eq!(normalize(Architecture::X86, "callq"), "call");
    }

    #[test]
    fn x87_memory_size_suffixes_are_stripped() {
        assert_eq!(normalize(Architecture::X86, "fadds"), "fadd");
        assert_eq!(normalize(Architecture::X86, "faddl"), "fadd");
        assert_eq!(normalize(Architecture::X86, "fsubrl"), "fsubr");
        assert_eq!(normalize(Architecture::X86, "fildq"), "fild");
        assert_eq!(normalize(Architecture::X86, "fstpt"), "fstp");
        assert_eq!(normalize(Architecture::X86, "faddp"), "faddp");
        assert_eq!(normalize(Architecture::X86, "fsubp"), "fsubp");
    }

    #[test]
    fn arm_strips_conditions_and_flag_bit() {
        assert_eq!(normalize(Architecture::Arm, "eoreq"), "eor");
        assert_eq!(normalize(Architecture::Arm, "eors"), "eor");
        assert_eq!(normalize(Architecture::Arm, "addseq"), "add");
        assert_eq!(normalize(Architecture::Arm, "addeqs"), "add");
        assert_eq!(normalize(Architecture::Arm, "bne"), "b");
        assert_eq!(normalize(Architecture::Arm, "bls"), "b");
        assert_eq!(normalize(Architecture::Arm, "bl"), "bl");
        assert_eq!(normalize(Architecture::Arm, "b.ne"), "b");
        assert_eq!(normalize(Architecture::Arm, "vadd.f32"), "vadd.f32");
        assert_eq!(normalize(Architecture::Arm, "lsls"), "lsl");
        assert_eq!(normalize(Architecture::Arm, "fadd"), "fadd");
    }

    #[test]
    fn arm_strips_thumb_width_qualifiers() {
        assert_eq!(normalize(Architecture::Arm, "eor.w"), "eor");
        assert_eq!(normalize(Architecture::Arm, "eors.w"), "eor");
        assert_eq!(normalize(Architecture::Arm, "lsl.w"), "lsl");
        assert_eq!(normalize(Architecture::Arm, "bne.w"), "b");
        assert_eq!(normalize(Architecture::Arm, "b.n"), "b");
        assert_eq!(normalize(Architecture::Arm, "vadd.f32"), "vadd.f32");
    }

    #[test]
    fn ppc_and_riscv_decorations() {
        assert_eq!(normalize(Architecture::Ppc, "rlwinm."), "rlwinm");
        assert_eq!(normalize(Architecture::Ppc, "bne+"), "bne");
        assert_eq!(normalize(Architecture::Ppc, "andi."), "andi");
        assert_eq!(normalize(Architecture::Riscv, "c.add"), "add");
        assert_eq!(normalize(Architecture::Riscv, "fadd.s"), "fadd.s");
        assert_eq!(normalize(Architecture::Mips, "add.s"), "add.s");
    }
}
