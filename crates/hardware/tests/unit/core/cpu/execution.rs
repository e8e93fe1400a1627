//! Instruction Execution Unit Tests.
//!
//! Verifies RV32I and M-extension semantics on a bare core: arithmetic,
//! shifts and comparisons, loads with sign extension, stores, control flow,
//! the environment-call halt, and the unknown-opcode paths.
//!
//! Programs are placed at address 0 and registers are seeded directly; each
//! test steps exactly as many instructions as it lays down.

use rvcache_core::common::error::SimError;
use rvcache_core::config::{CacheConfig, GeneralConfig, ReplacementPolicyKind};
use rvcache_core::core::cache::Cache;
use rvcache_core::core::cpu::Cpu;
use rvcache_core::core::mem::Memory;

use crate::common::instruction::{InstructionBuilder, NOP};

/// Builds a core with `words` at address 0 and a default configuration.
fn cpu_with_program(words: &[u32]) -> Cpu {
    cpu_with_config(words, &GeneralConfig::default())
}

/// Builds a core with `words` at address 0 under the given settings.
fn cpu_with_config(words: &[u32], general: &GeneralConfig) -> Cpu {
    let mut memory = Memory::new(17);
    for (i, w) in words.iter().enumerate() {
        memory.write_u32((i * 4) as u32, *w).unwrap();
    }
    let cache = Cache::new(&CacheConfig::default(), ReplacementPolicyKind::Lru, memory).unwrap();
    Cpu::new(cache, general)
}

/// Steps `n` instructions, unwrapping every result.
fn run_steps(cpu: &mut Cpu, n: usize) {
    for _ in 0..n {
        cpu.step().unwrap();
    }
}

fn inst() -> InstructionBuilder {
    InstructionBuilder::new()
}

// ══════════════════════════════════════════════════════════
// 1. Register-Register Arithmetic
// ══════════════════════════════════════════════════════════

#[test]
fn add_and_sub() {
    let mut cpu = cpu_with_program(&[
        inst().add(5, 6, 7).build(),
        inst().sub(8, 6, 7).build(),
        inst().sub(9, 0, 7).build(),
    ]);
    cpu.regs.write(6, 2);
    cpu.regs.write(7, 3);
    run_steps(&mut cpu, 3);

    assert_eq!(cpu.regs.read(5), 5);
    assert_eq!(cpu.regs.read(8), 0xFFFF_FFFF, "2 - 3 wraps");
    assert_eq!(cpu.regs.read(9), 0xFFFF_FFFD, "0 - 3 wraps");
    assert_eq!(cpu.pc, 12);
}

#[test]
fn signed_and_unsigned_compare() {
    let mut cpu = cpu_with_program(&[
        inst().slt(5, 6, 7).build(),
        inst().sltu(8, 6, 7).build(),
    ]);
    cpu.regs.write(6, 0xFFFF_FFFF); // -1 signed, huge unsigned
    cpu.regs.write(7, 1);
    run_steps(&mut cpu, 2);

    assert_eq!(cpu.regs.read(5), 1, "-1 < 1 signed");
    assert_eq!(cpu.regs.read(8), 0, "0xFFFFFFFF > 1 unsigned");
}

#[test]
fn shifts_mask_the_amount() {
    let mut cpu = cpu_with_program(&[
        inst().sll(5, 6, 7).build(),
        inst().srl(8, 9, 10).build(),
        inst().sra(11, 9, 10).build(),
    ]);
    cpu.regs.write(6, 1);
    cpu.regs.write(7, 33); // amount masked to 1
    cpu.regs.write(9, 0x8000_0000);
    cpu.regs.write(10, 1);
    run_steps(&mut cpu, 3);

    assert_eq!(cpu.regs.read(5), 2);
    assert_eq!(cpu.regs.read(8), 0x4000_0000);
    assert_eq!(cpu.regs.read(11), 0xC000_0000, "SRA copies the sign bit");
}

#[test]
fn bitwise_ops() {
    let mut cpu = cpu_with_program(&[
        inst().xor(5, 6, 7).build(),
        inst().or(8, 6, 7).build(),
        inst().and(9, 6, 7).build(),
    ]);
    cpu.regs.write(6, 0b1100);
    cpu.regs.write(7, 0b1010);
    run_steps(&mut cpu, 3);

    assert_eq!(cpu.regs.read(5), 0b0110);
    assert_eq!(cpu.regs.read(8), 0b1110);
    assert_eq!(cpu.regs.read(9), 0b1000);
}

// ══════════════════════════════════════════════════════════
// 2. Multiply / Divide Extension
// ══════════════════════════════════════════════════════════

#[test]
fn mul_keeps_low_word() {
    let mut cpu = cpu_with_program(&[
        inst().mul(5, 6, 7).build(),
        inst().mul(8, 9, 9).build(),
    ]);
    cpu.regs.write(6, 7);
    cpu.regs.write(7, 6);
    cpu.regs.write(9, 0x10000);
    run_steps(&mut cpu, 2);

    assert_eq!(cpu.regs.read(5), 42);
    assert_eq!(cpu.regs.read(8), 0, "0x10000^2 overflows to zero");
}

#[test]
fn mulh_variants() {
    let mut cpu = cpu_with_program(&[
        inst().mulh(5, 6, 7).build(),
        inst().mulhu(8, 9, 9).build(),
        inst().mulhsu(10, 11, 9).build(),
    ]);
    cpu.regs.write(6, 0x8000_0000); // i32::MIN
    cpu.regs.write(7, 2);
    cpu.regs.write(9, 0xFFFF_FFFF);
    cpu.regs.write(11, 0xFFFF_FFFF); // -1 signed
    run_steps(&mut cpu, 3);

    assert_eq!(cpu.regs.read(5), 0xFFFF_FFFF, "MIN * 2 high word is -1");
    assert_eq!(cpu.regs.read(8), 0xFFFF_FFFE, "max * max unsigned high word");
    assert_eq!(cpu.regs.read(10), 0xFFFF_FFFF, "-1 * max unsigned high word");
}

#[test]
fn division_truncates_toward_zero() {
    let mut cpu = cpu_with_program(&[
        inst().div(5, 6, 7).build(),
        inst().div(8, 9, 7).build(),
        inst().divu(10, 6, 7).build(),
        inst().rem(11, 9, 7).build(),
        inst().remu(12, 6, 7).build(),
    ]);
    cpu.regs.write(6, 7);
    cpu.regs.write(7, 2);
    cpu.regs.write(9, (-7i32) as u32);
    run_steps(&mut cpu, 5);

    assert_eq!(cpu.regs.read(5), 3);
    assert_eq!(cpu.regs.read(8), (-3i32) as u32);
    assert_eq!(cpu.regs.read(10), 3);
    assert_eq!(cpu.regs.read(11), (-1i32) as u32);
    assert_eq!(cpu.regs.read(12), 1);
}

/// DIV/DIVU by zero produce all ones; REM/REMU return the dividend.
#[test]
fn division_by_zero() {
    let mut cpu = cpu_with_program(&[
        inst().div(5, 6, 0).build(),
        inst().divu(8, 6, 0).build(),
        inst().rem(9, 6, 0).build(),
        inst().remu(10, 6, 0).build(),
    ]);
    cpu.regs.write(6, 7);
    run_steps(&mut cpu, 4);

    assert_eq!(cpu.regs.read(5), 0xFFFF_FFFF);
    assert_eq!(cpu.regs.read(8), 0xFFFF_FFFF);
    assert_eq!(cpu.regs.read(9), 7);
    assert_eq!(cpu.regs.read(10), 7);
}

/// Signed overflow wraps: MIN / -1 = MIN with remainder 0.
#[test]
fn division_signed_overflow() {
    let mut cpu = cpu_with_program(&[
        inst().div(5, 6, 7).build(),
        inst().rem(8, 6, 7).build(),
    ]);
    cpu.regs.write(6, 0x8000_0000);
    cpu.regs.write(7, 0xFFFF_FFFF);
    run_steps(&mut cpu, 2);

    assert_eq!(cpu.regs.read(5), 0x8000_0000);
    assert_eq!(cpu.regs.read(8), 0);
}

// ══════════════════════════════════════════════════════════
// 3. Register-Immediate Arithmetic
// ══════════════════════════════════════════════════════════

#[test]
fn addi_sign_extends() {
    let mut cpu = cpu_with_program(&[
        inst().addi(5, 0, 100).build(),
        inst().addi(5, 5, -1).build(),
    ]);
    run_steps(&mut cpu, 2);
    assert_eq!(cpu.regs.read(5), 99);
}

#[test]
fn compare_immediates() {
    let mut cpu = cpu_with_program(&[
        inst().slti(5, 6, 1).build(),
        inst().sltiu(7, 6, -1).build(),
        inst().sltiu(8, 6, 1).build(),
    ]);
    cpu.regs.write(6, 0xFFFF_FFFE); // -2 signed
    run_steps(&mut cpu, 3);

    assert_eq!(cpu.regs.read(5), 1, "-2 < 1 signed");
    assert_eq!(cpu.regs.read(7), 1, "imm -1 compares as 0xFFFFFFFF unsigned");
    assert_eq!(cpu.regs.read(8), 0);
}

#[test]
fn logical_immediates() {
    let mut cpu = cpu_with_program(&[
        inst().xori(5, 6, -1).build(),
        inst().ori(7, 6, 0x0F0).build(),
        inst().andi(8, 6, 0x0FF).build(),
    ]);
    cpu.regs.write(6, 0x0000_FF00);
    run_steps(&mut cpu, 3);

    assert_eq!(cpu.regs.read(5), 0xFFFF_00FF, "XORI with -1 is NOT");
    assert_eq!(cpu.regs.read(7), 0x0000_FFF0);
    assert_eq!(cpu.regs.read(8), 0);
}

#[test]
fn shift_immediates() {
    let mut cpu = cpu_with_program(&[
        inst().slli(5, 6, 4).build(),
        inst().srli(7, 6, 31).build(),
        inst().srai(8, 6, 4).build(),
    ]);
    cpu.regs.write(6, 0x8000_0010);
    run_steps(&mut cpu, 3);

    assert_eq!(cpu.regs.read(5), 0x0000_0100);
    assert_eq!(cpu.regs.read(7), 1);
    assert_eq!(cpu.regs.read(8), 0xF800_0001, "SRAI copies the sign bit");
}

// ══════════════════════════════════════════════════════════
// 4. Loads and Stores
// ══════════════════════════════════════════════════════════

#[test]
fn store_load_word_roundtrip() {
    let mut cpu = cpu_with_program(&[
        inst().sw(7, 6, 0).build(),
        inst().lw(5, 6, 0).build(),
    ]);
    cpu.regs.write(6, 0x1000);
    cpu.regs.write(7, 0xDEAD_BEEF);
    run_steps(&mut cpu, 2);

    assert_eq!(cpu.regs.read(5), 0xDEAD_BEEF);
    assert_eq!(cpu.cache.stats().data_access, 2);
}

#[test]
fn signed_byte_load_extends() {
    let mut cpu = cpu_with_program(&[
        inst().sb(7, 6, 0).build(),
        inst().lb(5, 6, 0).build(),
        inst().lbu(8, 6, 0).build(),
    ]);
    cpu.regs.write(6, 0x1200);
    cpu.regs.write(7, 0x80);
    run_steps(&mut cpu, 3);

    assert_eq!(cpu.regs.read(5), 0xFFFF_FF80);
    assert_eq!(cpu.regs.read(8), 0x0000_0080);
}

#[test]
fn signed_halfword_load_extends() {
    let mut cpu = cpu_with_program(&[
        inst().sh(7, 6, 0).build(),
        inst().lh(5, 6, 0).build(),
        inst().lhu(8, 6, 0).build(),
    ]);
    cpu.regs.write(6, 0x1300);
    cpu.regs.write(7, 0x8000);
    run_steps(&mut cpu, 3);

    assert_eq!(cpu.regs.read(5), 0xFFFF_8000);
    assert_eq!(cpu.regs.read(8), 0x0000_8000);
}

/// Negative load/store offsets address below the base register.
#[test]
fn negative_offsets() {
    let mut cpu = cpu_with_program(&[
        inst().sw(7, 6, -4).build(),
        inst().lw(5, 6, -4).build(),
    ]);
    cpu.regs.write(6, 0x1010);
    cpu.regs.write(7, 0x55AA_55AA);
    run_steps(&mut cpu, 2);

    assert_eq!(cpu.regs.read(5), 0x55AA_55AA);
    assert_eq!(cpu.cache.memory().read_u32(0x100C).unwrap(), 0);
}

/// Misaligned accesses inside one line are performed, not trapped.
#[test]
fn misaligned_access_is_performed() {
    let mut cpu = cpu_with_program(&[
        inst().sw(7, 6, 0).build(),
        inst().lw(5, 6, 1).build(),
    ]);
    cpu.regs.write(6, 0x1000);
    cpu.regs.write(7, 0xAABB_CCDD);
    run_steps(&mut cpu, 2);

    // Bytes at 0x1001..0x1005: CC BB AA 00.
    assert_eq!(cpu.regs.read(5), 0x00AA_BBCC);
}

// ══════════════════════════════════════════════════════════
// 5. Control Flow
// ══════════════════════════════════════════════════════════

#[test]
fn branch_taken_skips_ahead() {
    let mut cpu = cpu_with_program(&[
        inst().beq(6, 7, 8).build(),
        inst().addi(5, 0, 1).build(),
        inst().addi(5, 0, 2).build(),
    ]);
    cpu.regs.write(6, 9);
    cpu.regs.write(7, 9);
    run_steps(&mut cpu, 2);

    assert_eq!(cpu.regs.read(5), 2, "the branch skipped the first ADDI");
    assert_eq!(cpu.pc, 12);
}

#[test]
fn branch_not_taken_falls_through() {
    let mut cpu = cpu_with_program(&[
        inst().bne(6, 7, 8).build(),
        inst().addi(5, 0, 1).build(),
    ]);
    cpu.regs.write(6, 9);
    cpu.regs.write(7, 9);
    run_steps(&mut cpu, 2);

    assert_eq!(cpu.regs.read(5), 1);
    assert_eq!(cpu.pc, 8);
}

#[test]
fn branch_comparisons_respect_signedness() {
    let mut cpu = cpu_with_program(&[
        inst().blt(6, 7, 8).build(), // taken: -1 < 1 signed
        NOP,
        inst().bltu(6, 7, 8).build(), // not taken: 0xFFFFFFFF > 1
        inst().bgeu(6, 7, 8).build(), // taken
        NOP,
        inst().bge(7, 6, 8).build(), // taken: 1 >= -1 signed
    ]);
    cpu.regs.write(6, 0xFFFF_FFFF);
    cpu.regs.write(7, 1);

    run_steps(&mut cpu, 4);
    assert_eq!(cpu.pc, 28, "blt, bgeu, and bge taken; bltu fell through");
}

/// A backward branch drives a simple counted loop.
#[test]
fn backward_branch_loops() {
    let mut cpu = cpu_with_program(&[
        inst().addi(5, 5, 1).build(),
        inst().bne(5, 6, -4).build(),
    ]);
    cpu.regs.write(6, 3);

    // Three iterations of (addi, bne); the last bne falls through.
    run_steps(&mut cpu, 6);
    assert_eq!(cpu.regs.read(5), 3);
    assert_eq!(cpu.pc, 8);
}

#[test]
fn jal_links_and_jumps() {
    let mut cpu = cpu_with_program(&[
        inst().jal(1, 8).build(),
        NOP,
        inst().addi(5, 0, 7).build(),
    ]);
    run_steps(&mut cpu, 2);

    assert_eq!(cpu.regs.read(1), 4, "link register holds pc + 4");
    assert_eq!(cpu.regs.read(5), 7);
    assert_eq!(cpu.pc, 12);
}

#[test]
fn jalr_clears_low_bit() {
    let mut cpu = cpu_with_program(&[inst().jalr(5, 6, 2).build()]);
    cpu.regs.write(6, 0x0101);
    run_steps(&mut cpu, 1);

    assert_eq!(cpu.pc, 0x0102, "target low bit cleared");
    assert_eq!(cpu.regs.read(5), 4);
}

/// When rd == rs1 the target is computed before the link is written.
#[test]
fn jalr_rd_equals_rs1() {
    let mut cpu = cpu_with_program(&[inst().jalr(6, 6, 0).build()]);
    cpu.regs.write(6, 0x100);
    run_steps(&mut cpu, 1);

    assert_eq!(cpu.pc, 0x100);
    assert_eq!(cpu.regs.read(6), 4);
}

#[test]
fn lui_and_auipc() {
    let mut cpu = cpu_with_program(&[
        inst().lui(5, 0x12345).build(),
        inst().auipc(6, 1).build(),
    ]);
    run_steps(&mut cpu, 2);

    assert_eq!(cpu.regs.read(5), 0x1234_5000);
    assert_eq!(cpu.regs.read(6), 4 + 0x1000, "AUIPC adds to its own pc");
}

// ══════════════════════════════════════════════════════════
// 6. System and Decoding Edges
// ══════════════════════════════════════════════════════════

/// ECALL halts without advancing the program counter.
#[test]
fn ecall_halts() {
    let mut cpu = cpu_with_program(&[inst().ecall().build()]);
    cpu.step().unwrap();

    assert!(cpu.halted());
    assert_eq!(cpu.pc, 0);
}

#[test]
fn ebreak_halts() {
    let mut cpu = cpu_with_program(&[inst().ebreak().build()]);
    cpu.step().unwrap();
    assert!(cpu.halted());
}

/// Register x0 ignores writes from every instruction class.
#[test]
fn zero_register_stays_zero() {
    let mut cpu = cpu_with_program(&[
        inst().addi(0, 0, 5).build(),
        inst().jal(0, 4).build(),
        inst().lui(0, 0xFFFFF).build(),
    ]);
    run_steps(&mut cpu, 3);

    assert_eq!(cpu.regs.read(0), 0);
}

/// Unknown opcodes are skipped by default.
#[test]
fn unknown_opcode_skipped_when_lenient() {
    let mut cpu = cpu_with_program(&[0x0000_001B, inst().addi(5, 0, 1).build()]);
    run_steps(&mut cpu, 2);

    assert!(!cpu.halted());
    assert_eq!(cpu.regs.read(5), 1);
    assert_eq!(cpu.pc, 8);
}

/// Strict decoding turns unknown opcodes into errors.
#[test]
fn unknown_opcode_fatal_when_strict() {
    let general = GeneralConfig {
        strict_decode: true,
        ..GeneralConfig::default()
    };
    let mut cpu = cpu_with_config(&[0x0000_001B], &general);

    let err = cpu.step().unwrap_err();
    assert!(matches!(
        err,
        SimError::UnknownOpcode {
            inst: 0x0000_001B,
            pc: 0
        }
    ));
}

/// Every step fetches exactly one instruction through the cache.
#[test]
fn fetches_are_counted() {
    let mut cpu = cpu_with_program(&[NOP, NOP, NOP]);
    run_steps(&mut cpu, 3);

    assert_eq!(cpu.cache.stats().instr_access, 3);
    assert_eq!(cpu.cache.stats().instr_hit, 2);
}
