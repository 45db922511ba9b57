//! Random math: height-seeded integer programs.
//!
//! A program is a short straight-line sequence of 32-bit integer operations
//! over a nine-register file. Programs are generated once per block height
//! by [`generate`] and executed on every iteration of the mixing loop by
//! [`execute`].
//!
//! ```text
//! height ──► SeedStream ──► generator ──► Program ──► interpreter ──► registers
//!            (BLAKE-256)    (timing model)  (71 slots)   (R0..R8)
//! ```
//!
//! Registers R0..R3 are the only destinations. R4..R8 are inputs supplied
//! by the mixing loop and are never written by generated code.

mod generator;
mod interpreter;
mod seed;

use core::fmt;

use crate::error::{CryptoNightError, Result};

pub use generator::{generate, generate_into};
pub use interpreter::{execute, execute_slice};

/// Latency budget, in cycles, of the simulated CPU.
pub const TOTAL_LATENCY: usize = 15 * 3;

/// Minimum number of instructions in a generated program.
pub const NUM_INSTRUCTIONS_MIN: usize = 60;

/// Maximum number of instructions in a generated program.
pub const NUM_INSTRUCTIONS_MAX: usize = 70;

/// Instruction slots in a program buffer, including the terminating RET.
pub const PROGRAM_SLOTS: usize = NUM_INSTRUCTIONS_MAX + 1;

/// Number of ALU lanes able to run a multiplication.
pub const ALU_COUNT_MUL: usize = 1;

/// Number of ALU lanes able to run every other operation.
pub const ALU_COUNT: usize = 3;

/// Number of registers visible to a program.
pub const REGISTER_COUNT: usize = 9;

/// Number of registers that may be written by a program.
pub const DESTINATION_REGISTERS: usize = 4;

/// Register file shared between the mixing loop and the interpreter.
pub type RegisterFile = [u32; REGISTER_COUNT];

/// Operation performed by one instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Opcode {
    /// `dst = dst * src`
    Mul = 0,
    /// `dst = dst + src + c`
    Add = 1,
    /// `dst = dst - src`
    Sub = 2,
    /// `dst = dst >>> src`
    Ror = 3,
    /// `dst = dst <<< src`
    Rol = 4,
    /// `dst = dst ^ src`
    Xor = 5,
    /// End of program.
    Ret = 6,
}

impl Opcode {
    /// Cycles the operation occupies under the realistic timing model.
    pub const fn latency(self) -> usize {
        match self {
            Opcode::Mul => 3,
            Opcode::Add => 2,
            Opcode::Sub => 1,
            Opcode::Ror | Opcode::Rol => 2,
            Opcode::Xor => 1,
            Opcode::Ret => 0,
        }
    }

    /// Cycles the operation costs under the unlimited-resource ASIC model.
    pub const fn asic_latency(self) -> usize {
        match self {
            Opcode::Mul => 3,
            Opcode::Ret => 0,
            _ => 1,
        }
    }

    /// Number of ALU lanes that can execute the operation.
    pub const fn alu_count(self) -> usize {
        match self {
            Opcode::Mul => ALU_COUNT_MUL,
            _ => ALU_COUNT,
        }
    }

    /// Returns `true` for ROR and ROL.
    pub const fn is_rotation(self) -> bool {
        matches!(self, Opcode::Ror | Opcode::Rol)
    }
}

/// One program instruction.
///
/// `c` is only meaningful for [`Opcode::Add`]; it is zero for everything the
/// generator emits with another opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Instruction {
    opcode: Opcode,
    dst: u8,
    src: u8,
    c: u32,
}

impl Instruction {
    /// The program terminator.
    pub const RET: Instruction = Instruction::raw(Opcode::Ret, 0, 0, 0);

    /// Builds an instruction, validating its register operands.
    ///
    /// # Parameters
    /// - `opcode`: The operation.
    /// - `dst`: Destination register, `0..=3`.
    /// - `src`: Source register, `0..=8`.
    /// - `c`: Constant added by [`Opcode::Add`].
    ///
    /// # Errors
    /// Returns [`CryptoNightError::InvalidRegister`] if either index is out of range.
    pub fn new(opcode: Opcode, dst: u8, src: u8, c: u32) -> Result<Self> {
        if usize::from(dst) >= DESTINATION_REGISTERS {
            return Err(CryptoNightError::InvalidRegister {
                role: "destination",
                index: dst,
            });
        }
        if usize::from(src) >= REGISTER_COUNT {
            return Err(CryptoNightError::InvalidRegister {
                role: "source",
                index: src,
            });
        }
        Ok(Instruction::raw(opcode, dst, src, c))
    }

    /// Builds an instruction whose operands are already known to be in range.
    pub(crate) const fn raw(opcode: Opcode, dst: u8, src: u8, c: u32) -> Self {
        Instruction {
            opcode,
            dst,
            src,
            c,
        }
    }

    /// The operation.
    pub fn opcode(&self) -> Opcode {
        self.opcode
    }

    /// Destination register index.
    pub fn dst(&self) -> u8 {
        self.dst
    }

    /// Source register index.
    pub fn src(&self) -> u8 {
        self.src
    }

    /// Constant operand.
    pub fn c(&self) -> u32 {
        self.c
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (d, s) = (self.dst, self.src);
        match self.opcode {
            Opcode::Mul => write!(f, "r{d} = r{d} * r{s}"),
            Opcode::Add => write!(f, "r{d} = r{d} + r{s} + {:#010x}", self.c),
            Opcode::Sub => write!(f, "r{d} = r{d} - r{s}"),
            Opcode::Ror => write!(f, "r{d} = rotr(r{d}, r{s})"),
            Opcode::Rol => write!(f, "r{d} = rotl(r{d}, r{s})"),
            Opcode::Xor => write!(f, "r{d} = r{d} ^ r{s}"),
            Opcode::Ret => f.write_str("ret"),
        }
    }
}

/// A RET-terminated random math program.
///
/// The buffer always has [`PROGRAM_SLOTS`] entries. Slots after the
/// terminator hold RET as well.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    code: [Instruction; PROGRAM_SLOTS],
    len: usize,
}

impl Program {
    /// Generates the program for a block height. See [`generate`].
    pub fn generate(height: u64) -> Self {
        generate(height)
    }

    /// Builds a program from raw instructions.
    ///
    /// Copying stops at the first RET or after [`NUM_INSTRUCTIONS_MAX`]
    /// instructions; a terminator is always placed after the last one.
    /// No length or register-usage constraints are enforced.
    pub fn from_instructions(instructions: &[Instruction]) -> Self {
        let mut code = [Instruction::RET; PROGRAM_SLOTS];
        let mut len = 0;
        for (slot, inst) in code
            .iter_mut()
            .zip(instructions.iter().take(NUM_INSTRUCTIONS_MAX))
        {
            if inst.opcode == Opcode::Ret {
                break;
            }
            *slot = *inst;
            len += 1;
        }
        Program { code, len }
    }

    pub(crate) fn from_code(code: [Instruction; PROGRAM_SLOTS], len: usize) -> Self {
        Program { code, len }
    }

    /// Number of instructions before the terminator.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the program has no instructions.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The instructions before the terminator.
    pub fn instructions(&self) -> &[Instruction] {
        &self.code[..self.len]
    }

    /// The full slot buffer, terminator included.
    pub fn code(&self) -> &[Instruction; PROGRAM_SLOTS] {
        &self.code
    }

    /// Returns `true` if any instruction reads R8.
    pub fn uses_r8(&self) -> bool {
        self.instructions().iter().any(|inst| inst.src == 8)
    }

    /// Runs the program over `registers`. See [`execute`].
    pub fn execute(&self, registers: &mut RegisterFile) {
        execute(self, registers)
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for inst in self.instructions() {
            writeln!(f, "{inst}")?;
        }
        write!(f, "{}", Instruction::RET)
    }
}

/// Returns the index of the first RET in `code`, or its length if none.
pub fn code_size(code: &[Instruction]) -> usize {
    code.iter()
        .position(|inst| inst.opcode == Opcode::Ret)
        .unwrap_or(code.len())
}
