use oracle_core::model::{Architecture, Category};
use oracle_core::services::backends::parse_listing;
use oracle_core::services::classifier::classify;
use oracle_core::services::disassembly::{disassemble, Artifact, DisassemblyOptions};
use oracle_core::taxonomy::Taxonomy;

const X86_ATT: &str = r#"	.text
	.file	"bitwise.c"
	.globl	helper
	.p2align	4, 0x90
helper:
	movl	%edi, %eax
	retq
	.globl	kernel
kernel:                                 # @kernel
	.cfi_startproc
	xorl	%esi, %edi
	andl	%edx, %edi
	notl	%edi
.LBB1_1:
	orl	%edi, %eax
	retq
	.cfi_endproc
main:
	pushq	%rbp
	callq	kernel
	popq	%rbp
	retq
"#;

#[test]
fn att_listing_is_normalized_to_base_mnemonics() {
    let seq = parse_listing(X86_ATT, Architecture::X86, None).expect("parse listing");
    assert_eq!(
        seq,
        vec!["mov", "ret", "xor", "and", "not", "or", "ret", "push", "call", "pop", "ret"]
    );
}

#[test]
fn kernel_label_restricts_to_one_function_across_local_labels() {
    let seq = parse_listing(X86_ATT, Architecture::X86, Some("kernel")).expect("parse kernel");
    assert_eq!(seq, vec!["xor", "and", "not", "or", "ret"]);
}

#[test]
fn missing_kernel_label_falls_back_to_whole_listing() {
    let whole = parse_listing(X86_ATT, Architecture::X86, None).expect("parse listing");
    let fallback = parse_listing(X86_ATT, Architecture::X86, Some("nope")).expect("parse fallback");
    assert_eq!(whole, fallback);
}

#[test]
fn objdump_output_is_understood() {
    let dump = "\nbitwise.o:     file format elf64-x86-64\n\n\nDisassembly of section .text:\n\n\
0000000000000000 <kernel>:\n   0:\t31 f7                \txor    %esi,%edi\n   \
2:\t21 d7                \tand    %edx,%edi\n   4:\tf0 09 07             \tlock or %eax,(%rdi)\n   \
7:\tc3                   \tret    \n\n0000000000000008 <other>:\n   8:\t90                   \tnop\n";
    let seq = parse_listing(dump, Architecture::X86, Some("kernel")).expect("parse kernel");
    assert_eq!(seq, vec!["xor", "and", "or", "ret"]);
}

#[test]
fn arm_conditions_and_flag_bits_are_stripped() {
    let listing = "kernel:\n\teors\tr0, r0, r1\n\teoreq\tr0, r0, r2\n\tandne\tr1, r1, r3\n\tbls\t.LBB0_2\n\tbx\tlr\n";
    let seq = parse_listing(listing, Architecture::Arm, None).expect("parse listing");
    assert_eq!(seq, vec!["eor", "eor", "and", "b", "bx"]);
}

#[test]
fn ppc_record_forms_and_mips_symbols() {
    let ppc = "kernel:\n\tand. 3, 3, 4\n\trlwinm 3, 3, 2, 0, 29\n\tbeqlr+ 0\n\tblr\n";
    let seq = parse_listing(ppc, Architecture::Ppc, None).expect("parse listing");
    assert_eq!(seq, vec!["and", "rlwinm", "beqlr", "blr"]);

    let mips = "kernel:\n$LFB0 = .\n\t.set\tnoreorder\n\tnor\t$2,$4,$0\n\tjr\t$31\n\tnop\n";
    let seq = parse_listing(mips, Architecture::Mips, None).expect("parse listing");
    assert_eq!(seq, vec!["nor", "jr", "nop"]);
}

#[test]
fn riscv_compressed_prefix_is_dropped() {
    let listing = "kernel:\n\tc.xor\ta0, a1\n\txori\ta0, a0, -1\n\tret\n";
    let seq = parse_listing(listing, Architecture::Riscv, None).expect("parse listing");
    assert_eq!(seq, vec!["xor", "xori", "ret"]);
}

#[test]
fn binary_garbage_in_listing_reports_line_offset() {
    let listing = "kernel:\n\txor %eax, %eax\n\0\0\x7fELF\n";
    let err = parse_listing(listing, Architecture::X86, None).expect_err("nul bytes");
    assert_eq!(err.offset, "kernel:\n\txor %eax, %eax\n".len());
}

#[test]
fn listing_artifacts_dispatch_through_disassemble() {
    let artifact = Artifact::Listing("kernel:\n\tmullw 3, 3, 4\n\tblr\n".to_string());
    let options = DisassemblyOptions { kernel: Some("kernel".into()), ..Default::default() };
    let seq = disassemble(&artifact, Architecture::Ppc, &options).expect("disassemble listing");
    assert_eq!(seq, vec!["mullw", "blr"]);
}

#[test]
fn thumb2_wide_encodings_count_toward_their_base() {
    let dump = "\nshift.o:     file format elf32-littlearm\n\nDisassembly of section .text:\n\n\
00000000 <kernel>:\n   0:\tea80 0001 \teor.w\tr0, r0, r1\n   4:\tea4f 70f0 \tror.w\tr0, r0, #31\n   \
8:\tfa00 f001 \tlsl.w\tr0, r0, r1\n   c:\t4770      \tbx\tlr\n";
    let seq = parse_listing(dump, Architecture::Arm, Some("kernel")).expect("parse thumb dump");
    assert_eq!(seq, vec!["eor", "ror", "lsl", "bx"]);

    let taxonomy = Taxonomy::builtin().expect("builtin taxonomy");
    let counts = classify(&taxonomy, &seq, Architecture::Arm);
    assert_eq!(counts.get(Category::Bitwise), 1);
    assert_eq!(counts.get(Category::ShiftRotate), 2);
    assert_eq!(counts.get(Category::Other), 0);
}

#[test]
fn x87_att_forms_are_float_adds() {
    let listing = "kernel:\n\tflds\t4(%esp)\n\tfadds\t8(%esp)\n\tfaddl\t12(%esp)\n\tfsubl\t20(%esp)\n\tfstps\t4(%esp)\n\tretl\n";
    let seq = parse_listing(listing, Architecture::X86, None).expect("parse x87 listing");
    assert_eq!(seq, vec!["fld", "fadd", "fadd", "fsub", "fstp", "ret"]);

    let taxonomy = Taxonomy::builtin().expect("builtin taxonomy");
    let counts = classify(&taxonomy, &seq, Architecture::X86);
    assert_eq!(counts.get(Category::FloatAdd), 3);
}
