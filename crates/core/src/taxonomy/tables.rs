//! Built-in mnemonic tables.
//!
//! Keys are normalized base mnemonics (see `services::normalize`), so AT&T
//! size suffixes, ARM condition codes and PowerPC record dots never appear
//! here. Data-type suffixes are kept: `addss` and `addsd` are distinct keys.

use crate::model::{Architecture, Category};

use Category::{Bitwise, ControlFlow, FloatAdd, IntegerMultiply, ShiftRotate};

pub fn builtin_entries(arch: Architecture) -> &'static [(&'static str, Category)] {
    match arch {
        Architecture::X86 => X86,
        Architecture::Arm => ARM,
        Architecture::Riscv => RISCV,
        Architecture::Mips => MIPS,
        Architecture::Ppc => PPC,
    }
}

const X86: &[(&str, Category)] = &[
    // Scalar and SSE logic.
    ("and", Bitwise),
    ("or", Bitwise),
    ("xor", Bitwise),
    ("not", Bitwise),
    ("andn", Bitwise),
    ("pand", Bitwise),
    ("pandn", Bitwise),
    ("por", Bitwise),
    ("pxor", Bitwise),
    ("andps", Bitwise),
    ("andpd", Bitwise),
    ("andnps", Bitwise),
    ("andnpd", Bitwise),
    ("orps", Bitwise),
    ("orpd", Bitwise),
    ("xorps", Bitwise),
    ("xorpd", Bitwise),
    ("vpand*", Bitwise),
    ("vpor*", Bitwise),
    ("vpxor*", Bitwise),
    ("vpternlog*", Bitwise),
    ("vand*", Bitwise),
    ("vor*", Bitwise),
    ("vxor*", Bitwise),
    ("k*and*", Bitwise),
    ("k*or*", Bitwise),
    ("knot*", Bitwise),
    // x87, SSE and AVX add/subtract.
    ("addss", FloatAdd),
    ("addsd", FloatAdd),
    ("addps", FloatAdd),
    ("addpd", FloatAdd),
    ("subss", FloatAdd),
    ("subsd", FloatAdd),
    ("subps", FloatAdd),
    ("subpd", FloatAdd),
    ("haddps", FloatAdd),
    ("haddpd", FloatAdd),
    ("addsubps", FloatAdd),
    ("addsubpd", FloatAdd),
    ("fadd", FloatAdd),
    ("faddp", FloatAdd),
    ("fiadd", FloatAdd),
    ("fsub", FloatAdd),
    ("fsubp", FloatAdd),
    ("fsubr", FloatAdd),
    ("fsubrp", FloatAdd),
    ("v*add*", FloatAdd),
    ("vsub*", FloatAdd),
    // Integer vector adds look like AVX float adds to the glob above.
    ("vpadd*", Category::Other),
    ("vphadd*", Category::Other),
    ("vpmadd*", IntegerMultiply),
    ("vfmadd*", Category::Other),
    ("vfnmadd*", Category::Other),
    // Integer multiply.
    ("mul", IntegerMultiply),
    ("imul", IntegerMultiply),
    ("mulx", IntegerMultiply),
    ("pmulld", IntegerMultiply),
    ("pmullw", IntegerMultiply),
    ("pmulhw", IntegerMultiply),
    ("pmulhuw", IntegerMultiply),
    ("pmuludq", IntegerMultiply),
    ("pmuldq", IntegerMultiply),
    ("pmaddwd", IntegerMultiply),
    ("vpmul*", IntegerMultiply),
    // Shifts and rotates.
    ("shl", ShiftRotate),
    ("sal", ShiftRotate),
    ("shr", ShiftRotate),
    ("sar", ShiftRotate),
    ("rol", ShiftRotate),
    ("ror", ShiftRotate),
    ("rcl", ShiftRotate),
    ("rcr", ShiftRotate),
    ("shld", ShiftRotate),
    ("shrd", ShiftRotate),
    ("shlx", ShiftRotate),
    ("shrx", ShiftRotate),
    ("sarx", ShiftRotate),
    ("rorx", ShiftRotate),
    ("psll*", ShiftRotate),
    ("psrl*", ShiftRotate),
    ("psra*", ShiftRotate),
    ("vpsll*", ShiftRotate),
    ("vpsrl*", ShiftRotate),
    ("vpsra*", ShiftRotate),
    ("vprol*", ShiftRotate),
    ("vpror*", ShiftRotate),
    // Branches, calls and the compares that feed them.
    ("jmp", ControlFlow),
    ("call", ControlFlow),
    ("ret", ControlFlow),
    ("cmp", ControlFlow),
    ("test", ControlFlow),
    ("loop", ControlFlow),
    ("loope", ControlFlow),
    ("loopne", ControlFlow),
    ("jecxz", ControlFlow),
    ("jrcxz", ControlFlow),
    ("j*", ControlFlow),
];

const ARM: &[(&str, Category)] = &[
    // A32/A64 integer logic and NEON logic.
    ("and", Bitwise),
    ("orr", Bitwise),
    ("eor", Bitwise),
    ("bic", Bitwise),
    ("mvn", Bitwise),
    ("orn", Bitwise),
    ("eon", Bitwise),
    ("not", Bitwise),
    ("bsl", Bitwise),
    ("bit", Bitwise),
    ("bif", Bitwise),
    ("vand", Bitwise),
    ("vorr", Bitwise),
    ("vorn", Bitwise),
    ("veor", Bitwise),
    ("vbic", Bitwise),
    ("vmvn", Bitwise),
    ("vbsl", Bitwise),
    // VFP/NEON and A64 floating add/subtract.
    ("fadd", FloatAdd),
    ("fsub", FloatAdd),
    ("faddp", FloatAdd),
    ("fadda", FloatAdd),
    ("vadd.f*", FloatAdd),
    ("vsub.f*", FloatAdd),
    ("vpadd.f*", FloatAdd),
    // Integer multiply and multiply-accumulate.
    ("mul", IntegerMultiply),
    ("mla", IntegerMultiply),
    ("mls", IntegerMultiply),
    ("mneg", IntegerMultiply),
    ("madd", IntegerMultiply),
    ("msub", IntegerMultiply),
    ("smull", IntegerMultiply),
    ("umull", IntegerMultiply),
    ("smlal", IntegerMultiply),
    ("umlal", IntegerMultiply),
    ("smulh", IntegerMultiply),
    ("umulh", IntegerMultiply),
    ("smaddl", IntegerMultiply),
    ("umaddl", IntegerMultiply),
    ("smulbb", IntegerMultiply),
    ("vmul.i*", IntegerMultiply),
    ("vmla.i*", IntegerMultiply),
    ("vmull.*", IntegerMultiply),
    // Shifts and rotates, register and immediate forms.
    ("lsl", ShiftRotate),
    ("lsr", ShiftRotate),
    ("asr", ShiftRotate),
    ("ror", ShiftRotate),
    ("rrx", ShiftRotate),
    ("lslv", ShiftRotate),
    ("lsrv", ShiftRotate),
    ("asrv", ShiftRotate),
    ("rorv", ShiftRotate),
    ("extr", ShiftRotate),
    ("shl", ShiftRotate),
    ("ushr", ShiftRotate),
    ("sshr", ShiftRotate),
    ("ushl", ShiftRotate),
    ("sshl", ShiftRotate),
    ("vshl.*", ShiftRotate),
    ("vshr.*", ShiftRotate),
    // Branches and flag-setting compares.
    ("b", ControlFlow),
    ("bl", ControlFlow),
    ("bx", ControlFlow),
    ("blx", ControlFlow),
    ("br", ControlFlow),
    ("blr", ControlFlow),
    ("ret", ControlFlow),
    ("cbz", ControlFlow),
    ("cbnz", ControlFlow),
    ("tbz", ControlFlow),
    ("tbnz", ControlFlow),
    ("cmp", ControlFlow),
    ("cmn", ControlFlow),
    ("tst", ControlFlow),
    ("teq", ControlFlow),
    ("ccmp", ControlFlow),
];

const RISCV: &[(&str, Category)] = &[
    // Base ISA logic plus Zbb; `not` is the `xori rd, rs, -1` alias.
    ("and", Bitwise),
    ("andi", Bitwise),
    ("or", Bitwise),
    ("ori", Bitwise),
    ("xor", Bitwise),
    ("xori", Bitwise),
    ("not", Bitwise),
    ("andn", Bitwise),
    ("orn", Bitwise),
    ("xnor", Bitwise),
    // F/D extension add/subtract.
    ("fadd.*", FloatAdd),
    ("fsub.*", FloatAdd),
    // M extension.
    ("mul", IntegerMultiply),
    ("mulh", IntegerMultiply),
    ("mulhu", IntegerMultiply),
    ("mulhsu", IntegerMultiply),
    ("mulw", IntegerMultiply),
    // Shifts plus Zbb rotates.
    ("sll", ShiftRotate),
    ("slli", ShiftRotate),
    ("srl", ShiftRotate),
    ("srli", ShiftRotate),
    ("sra", ShiftRotate),
    ("srai", ShiftRotate),
    ("sllw", ShiftRotate),
    ("slliw", ShiftRotate),
    ("srlw", ShiftRotate),
    ("srliw", ShiftRotate),
    ("sraw", ShiftRotate),
    ("sraiw", ShiftRotate),
    ("rol", ShiftRotate),
    ("ror", ShiftRotate),
    ("rori", ShiftRotate),
    ("rolw", ShiftRotate),
    ("rorw", ShiftRotate),
    ("roriw", ShiftRotate),
    // Branches, jumps and their pseudo-ops.
    ("beq", ControlFlow),
    ("bne", ControlFlow),
    ("blt", ControlFlow),
    ("bge", ControlFlow),
    ("bltu", ControlFlow),
    ("bgeu", ControlFlow),
    ("bgt", ControlFlow),
    ("ble", ControlFlow),
    ("bgtu", ControlFlow),
    ("bleu", ControlFlow),
    ("beqz", ControlFlow),
    ("bnez", ControlFlow),
    ("blez", ControlFlow),
    ("bgez", ControlFlow),
    ("bltz", ControlFlow),
    ("bgtz", ControlFlow),
    ("j", ControlFlow),
    ("jal", ControlFlow),
    ("jalr", ControlFlow),
    ("jr", ControlFlow),
    ("ret", ControlFlow),
    ("call", ControlFlow),
    ("tail", ControlFlow),
];

const MIPS: &[(&str, Category)] = &[
    // `nor rd, rs, $zero` is how MIPS spells `not`.
    ("and", Bitwise),
    ("andi", Bitwise),
    ("or", Bitwise),
    ("ori", Bitwise),
    ("xor", Bitwise),
    ("xori", Bitwise),
    ("nor", Bitwise),
    ("not", Bitwise),
    // FPU add/subtract in every format.
    ("add.s", FloatAdd),
    ("add.d", FloatAdd),
    ("add.ps", FloatAdd),
    ("sub.s", FloatAdd),
    ("sub.d", FloatAdd),
    ("sub.ps", FloatAdd),
    // HI/LO multiplies and the R6 three-operand forms.
    ("mul", IntegerMultiply),
    ("mult", IntegerMultiply),
    ("multu", IntegerMultiply),
    ("dmult", IntegerMultiply),
    ("dmultu", IntegerMultiply),
    ("dmul", IntegerMultiply),
    ("muh", IntegerMultiply),
    ("muhu", IntegerMultiply),
    ("madd", IntegerMultiply),
    ("maddu", IntegerMultiply),
    ("msub", IntegerMultiply),
    ("msubu", IntegerMultiply),
    // Shifts and MIPS32r2 rotates.
    ("sll", ShiftRotate),
    ("srl", ShiftRotate),
    ("sra", ShiftRotate),
    ("sllv", ShiftRotate),
    ("srlv", ShiftRotate),
    ("srav", ShiftRotate),
    ("rotr", ShiftRotate),
    ("rotrv", ShiftRotate),
    ("dsll", ShiftRotate),
    ("dsrl", ShiftRotate),
    ("dsra", ShiftRotate),
    ("dsll32", ShiftRotate),
    ("dsrl32", ShiftRotate),
    ("dsra32", ShiftRotate),
    ("dsllv", ShiftRotate),
    ("dsrlv", ShiftRotate),
    ("dsrav", ShiftRotate),
    ("drotr", ShiftRotate),
    ("drotr32", ShiftRotate),
    ("drotrv", ShiftRotate),
    // Branches and jumps.
    ("b", ControlFlow),
    ("bal", ControlFlow),
    ("beq", ControlFlow),
    ("bne", ControlFlow),
    ("beqz", ControlFlow),
    ("bnez", ControlFlow),
    ("blez", ControlFlow),
    ("bgtz", ControlFlow),
    ("bltz", ControlFlow),
    ("bgez", ControlFlow),
    ("j", ControlFlow),
    ("jal", ControlFlow),
    ("jr", ControlFlow),
    ("jalr", ControlFlow),
];

const PPC: &[(&str, Category)] = &[
    // Integer logic; `andi.`/`andis.` arrive here without their dot.
    ("and", Bitwise),
    ("andc", Bitwise),
    ("andi", Bitwise),
    ("andis", Bitwise),
    ("or", Bitwise),
    ("orc", Bitwise),
    ("ori", Bitwise),
    ("oris", Bitwise),
    ("xor", Bitwise),
    ("xori", Bitwise),
    ("xoris", Bitwise),
    ("nand", Bitwise),
    ("nor", Bitwise),
    ("not", Bitwise),
    ("eqv", Bitwise),
    ("vand", Bitwise),
    ("vor", Bitwise),
    ("vxor", Bitwise),
    ("xxland", Bitwise),
    ("xxlor", Bitwise),
    ("xxlxor", Bitwise),
    // FPU, paired-single, AltiVec and VSX add/subtract.
    ("fadd", FloatAdd),
    ("fadds", FloatAdd),
    ("fsub", FloatAdd),
    ("fsubs", FloatAdd),
    ("ps_add", FloatAdd),
    ("ps_sub", FloatAdd),
    ("vaddfp", FloatAdd),
    ("vsubfp", FloatAdd),
    ("xsadd*", FloatAdd),
    ("xssub*", FloatAdd),
    ("xvadd*", FloatAdd),
    ("xvsub*", FloatAdd),
    // Integer multiply.
    ("mullw", IntegerMultiply),
    ("mulld", IntegerMultiply),
    ("mulhw", IntegerMultiply),
    ("mulhwu", IntegerMultiply),
    ("mulhd", IntegerMultiply),
    ("mulhdu", IntegerMultiply),
    ("mulli", IntegerMultiply),
    // Shifts and rotate-and-mask, plus their extended mnemonics.
    ("slw", ShiftRotate),
    ("srw", ShiftRotate),
    ("sraw", ShiftRotate),
    ("srawi", ShiftRotate),
    ("sld", ShiftRotate),
    ("srd", ShiftRotate),
    ("srad", ShiftRotate),
    ("sradi", ShiftRotate),
    ("slwi", ShiftRotate),
    ("srwi", ShiftRotate),
    ("sldi", ShiftRotate),
    ("srdi", ShiftRotate),
    ("rotlw", ShiftRotate),
    ("rotlwi", ShiftRotate),
    ("rotrwi", ShiftRotate),
    ("rotld", ShiftRotate),
    ("rotldi", ShiftRotate),
    ("rlwinm", ShiftRotate),
    ("rlwnm", ShiftRotate),
    ("rlwimi", ShiftRotate),
    ("rld*", ShiftRotate),
    ("clrlwi", ShiftRotate),
    ("clrldi", ShiftRotate),
    // Branches and compares.
    ("b", ControlFlow),
    ("bl", ControlFlow),
    ("blr", ControlFlow),
    ("bctr", ControlFlow),
    ("bctrl", ControlFlow),
    ("beq", ControlFlow),
    ("bne", ControlFlow),
    ("blt", ControlFlow),
    ("bgt", ControlFlow),
    ("ble", ControlFlow),
    ("bge", ControlFlow),
    ("bdnz", ControlFlow),
    ("bdz", ControlFlow),
    ("bc", ControlFlow),
    ("beqlr", ControlFlow),
    ("bnelr", ControlFlow),
    // Conditional returns and counter branches (`bltlr`, `bdnzlr`, `beqctrl`).
    ("b*lr", ControlFlow),
    ("b*lrl", ControlFlow),
    ("b*ctr", ControlFlow),
    ("b*ctrl", ControlFlow),
    ("cmpw", ControlFlow),
    ("cmpwi", ControlFlow),
    ("cmplw", ControlFlow),
    ("cmplwi", ControlFlow),
    ("cmpd", ControlFlow),
    ("cmpdi", ControlFlow),
    ("cmpld", ControlFlow),
    ("cmpldi", ControlFlow),
];
