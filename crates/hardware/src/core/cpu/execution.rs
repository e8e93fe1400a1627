//! Instruction Semantics.
//!
//! This module implements the execution of decoded RV32IM instructions. It
//! performs the following:
//! 1. **Dispatch:** Routes each major opcode to its execution helper.
//! 2. **Arithmetic:** Base integer operations and the multiply/divide extension.
//! 3. **Memory Operations:** Loads and stores through the cache, with sign
//!    extension applied here rather than in the memory model.
//! 4. **Control Flow:** Branches, jumps, and the environment-call halt.
//!
//! Unknown encodings are skipped (program counter advanced by one instruction)
//! unless strict decoding is enabled, in which case they are fatal.

use log::{debug, warn};

use super::Cpu;
use crate::common::constants::INSTRUCTION_SIZE;
use crate::common::data::AccessType;
use crate::common::error::{SimError, SimResult};
use crate::isa::instruction::Decoded;
use crate::isa::rv32i::{funct3, funct7, opcodes};
use crate::isa::rv32m::{funct3 as m_funct3, opcodes as m_opcodes};

/// Mask selecting the shift amount from a register or immediate operand.
const SHAMT_MASK: u32 = 0x1F;

/// Instruction bit distinguishing SRAI from SRLI.
const SRAI_BIT: u32 = 30;

impl Cpu {
    /// Executes one decoded instruction and updates the program counter.
    pub(super) fn execute(&mut self, d: &Decoded) -> SimResult<()> {
        match d.opcode {
            opcodes::OP_REG => self.exec_reg(d),
            opcodes::OP_IMM => self.exec_imm(d),
            opcodes::OP_LOAD => self.exec_load(d),
            opcodes::OP_STORE => self.exec_store(d),
            opcodes::OP_BRANCH => self.exec_branch(d),
            opcodes::OP_JAL => {
                let link = self.pc.wrapping_add(INSTRUCTION_SIZE);
                self.regs.write(d.rd, link);
                self.pc = self.pc.wrapping_add(d.imm as u32);
                Ok(())
            }
            opcodes::OP_JALR => {
                let target = self.regs.read(d.rs1).wrapping_add(d.imm as u32) & !1;
                let link = self.pc.wrapping_add(INSTRUCTION_SIZE);
                self.regs.write(d.rd, link);
                self.pc = target;
                Ok(())
            }
            opcodes::OP_LUI => {
                self.regs.write(d.rd, d.imm as u32);
                self.advance_pc();
                Ok(())
            }
            opcodes::OP_AUIPC => {
                self.regs.write(d.rd, self.pc.wrapping_add(d.imm as u32));
                self.advance_pc();
                Ok(())
            }
            opcodes::OP_SYSTEM => {
                // ECALL/EBREAK: halt without advancing the PC.
                self.halted = true;
                Ok(())
            }
            _ => self.skip_unknown(d),
        }
    }

    /// Register-register arithmetic (OP_REG), base integer and M extension.
    fn exec_reg(&mut self, d: &Decoded) -> SimResult<()> {
        let a = self.regs.read(d.rs1);
        let b = self.regs.read(d.rs2);

        let value = match (d.funct7, d.funct3) {
            (funct7::DEFAULT, funct3::ADD_SUB) => a.wrapping_add(b),
            (funct7::SUB, funct3::ADD_SUB) => a.wrapping_sub(b),
            (funct7::DEFAULT, funct3::SLL) => a << (b & SHAMT_MASK),
            (funct7::DEFAULT, funct3::SLT) => ((a as i32) < (b as i32)) as u32,
            (funct7::DEFAULT, funct3::SLTU) => (a < b) as u32,
            (funct7::DEFAULT, funct3::XOR) => a ^ b,
            (funct7::DEFAULT, funct3::SRL_SRA) => a >> (b & SHAMT_MASK),
            (funct7::SRA, funct3::SRL_SRA) => ((a as i32) >> (b & SHAMT_MASK)) as u32,
            (funct7::DEFAULT, funct3::OR) => a | b,
            (funct7::DEFAULT, funct3::AND) => a & b,
            (m_opcodes::M_EXTENSION, f3) => Self::exec_muldiv(f3, a, b),
            _ => return self.skip_unknown(d),
        };

        self.regs.write(d.rd, value);
        self.advance_pc();
        Ok(())
    }

    /// Multiply/divide extension semantics.
    ///
    /// Division by zero follows the RISC-V convention: DIV/DIVU produce all
    /// ones, REM/REMU return the dividend. Signed overflow (`i32::MIN / -1`)
    /// wraps to `i32::MIN` with remainder 0.
    fn exec_muldiv(f3: u32, a: u32, b: u32) -> u32 {
        match f3 {
            m_funct3::MUL => a.wrapping_mul(b),
            m_funct3::MULH => (((a as i32 as i64).wrapping_mul(b as i32 as i64)) >> 32) as u32,
            m_funct3::MULHSU => (((a as i32 as i64).wrapping_mul(b as i64)) >> 32) as u32,
            m_funct3::MULHU => (((a as u64) * (b as u64)) >> 32) as u32,
            m_funct3::DIV => {
                if b == 0 {
                    u32::MAX
                } else {
                    (a as i32).wrapping_div(b as i32) as u32
                }
            }
            m_funct3::DIVU => {
                if b == 0 {
                    u32::MAX
                } else {
                    a / b
                }
            }
            m_funct3::REM => {
                if b == 0 {
                    a
                } else {
                    (a as i32).wrapping_rem(b as i32) as u32
                }
            }
            _ => {
                // REMU
                if b == 0 { a } else { a % b }
            }
        }
    }

    /// Register-immediate arithmetic (OP_IMM).
    fn exec_imm(&mut self, d: &Decoded) -> SimResult<()> {
        let a = self.regs.read(d.rs1);
        let imm = d.imm;
        let shamt = (imm as u32) & SHAMT_MASK;

        let value = match d.funct3 {
            funct3::ADD_SUB => a.wrapping_add(imm as u32),
            funct3::SLL => a << shamt,
            funct3::SLT => ((a as i32) < imm) as u32,
            funct3::SLTU => (a < imm as u32) as u32,
            funct3::XOR => a ^ imm as u32,
            funct3::SRL_SRA => {
                if (d.raw >> SRAI_BIT) & 1 == 1 {
                    ((a as i32) >> shamt) as u32
                } else {
                    a >> shamt
                }
            }
            funct3::OR => a | imm as u32,
            _ => a & imm as u32,
        };

        self.regs.write(d.rd, value);
        self.advance_pc();
        Ok(())
    }

    /// Load instructions (OP_LOAD).
    ///
    /// The cache returns zero-extended bytes; signed variants extend here.
    fn exec_load(&mut self, d: &Decoded) -> SimResult<()> {
        let addr = self.regs.read(d.rs1).wrapping_add(d.imm as u32);

        let value = match d.funct3 {
            funct3::LB => {
                let v = self.read_data(addr, 1)?;
                (v as u8 as i8) as i32 as u32
            }
            funct3::LH => {
                let v = self.read_data(addr, 2)?;
                (v as u16 as i16) as i32 as u32
            }
            funct3::LW => self.read_data(addr, 4)?,
            funct3::LBU => self.read_data(addr, 1)?,
            funct3::LHU => self.read_data(addr, 2)?,
            _ => return self.skip_unknown(d),
        };

        self.regs.write(d.rd, value);
        self.advance_pc();
        Ok(())
    }

    /// Store instructions (OP_STORE).
    fn exec_store(&mut self, d: &Decoded) -> SimResult<()> {
        let addr = self.regs.read(d.rs1).wrapping_add(d.imm as u32);
        let data = self.regs.read(d.rs2);

        match d.funct3 {
            funct3::SB => self.write_data(addr, data & 0xFF, 1)?,
            funct3::SH => self.write_data(addr, data & 0xFFFF, 2)?,
            funct3::SW => self.write_data(addr, data, 4)?,
            _ => return self.skip_unknown(d),
        }

        self.advance_pc();
        Ok(())
    }

    /// Conditional branches (OP_BRANCH).
    fn exec_branch(&mut self, d: &Decoded) -> SimResult<()> {
        let a = self.regs.read(d.rs1);
        let b = self.regs.read(d.rs2);

        let taken = match d.funct3 {
            funct3::BEQ => a == b,
            funct3::BNE => a != b,
            funct3::BLT => (a as i32) < (b as i32),
            funct3::BGE => (a as i32) >= (b as i32),
            funct3::BLTU => a < b,
            funct3::BGEU => a >= b,
            _ => return self.skip_unknown(d),
        };

        if taken {
            self.pc = self.pc.wrapping_add(d.imm as u32);
        } else {
            self.advance_pc();
        }
        Ok(())
    }

    /// Routes a data load through the cache.
    fn read_data(&mut self, addr: u32, size: u32) -> SimResult<u32> {
        self.note_misalignment(addr, size);
        self.cache.access(addr, AccessType::Read, 0, size)
    }

    /// Routes a data store through the cache.
    fn write_data(&mut self, addr: u32, data: u32, size: u32) -> SimResult<()> {
        self.note_misalignment(addr, size);
        self.cache.access(addr, AccessType::Write, data, size)?;
        Ok(())
    }

    /// Reports a misaligned data access in diagnostic mode.
    ///
    /// Misaligned accesses are still performed; only crossing a cache line
    /// boundary is fatal, and the cache enforces that.
    fn note_misalignment(&self, addr: u32, size: u32) {
        if self.trace && size > 1 && addr % size != 0 {
            warn!("misaligned {}-byte data access at {:#010x}", size, addr);
        }
    }

    /// Handles an unrecognized encoding: fatal in strict mode, otherwise the
    /// instruction is skipped.
    fn skip_unknown(&mut self, d: &Decoded) -> SimResult<()> {
        if self.strict_decode {
            return Err(SimError::UnknownOpcode {
                inst: d.raw,
                pc: self.pc,
            });
        }
        debug!(
            "skipping unrecognized instruction {:#010x} at pc {:#010x}",
            d.raw, self.pc
        );
        self.advance_pc();
        Ok(())
    }

    /// Advances the program counter to the next sequential instruction.
    #[inline]
    fn advance_pc(&mut self) {
        self.pc = self.pc.wrapping_add(INSTRUCTION_SIZE);
    }
}
