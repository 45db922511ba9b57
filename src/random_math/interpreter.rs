//! Straight-line interpreter for random math programs.

use super::{Instruction, Opcode, Program, RegisterFile, NUM_INSTRUCTIONS_MAX};

/// Runs `program` over `registers`.
///
/// Arithmetic wraps modulo 2^32 and rotations use the low five bits of the
/// source register.
///
/// # Parameters
/// - `program`: The program to run.
/// - `registers`: Register file, updated in place.
///
/// # Examples
///
/// ```
/// use cryptonight_r::random_math::{execute, Instruction, Opcode, Program};
///
/// let program = Program::from_instructions(&[
///     Instruction::new(Opcode::Add, 0, 1, 10).unwrap(),
///     Instruction::new(Opcode::Mul, 0, 0, 0).unwrap(),
/// ]);
/// let mut regs = [1, 2, 0, 0, 0, 0, 0, 0, 0];
/// execute(&program, &mut regs);
/// assert_eq!(regs[0], 169);
/// ```
pub fn execute(program: &Program, registers: &mut RegisterFile) {
    execute_slice(program.code(), registers)
}

/// Runs raw instructions until the first RET, or until
/// [`NUM_INSTRUCTIONS_MAX`] instructions have executed.
pub fn execute_slice(code: &[Instruction], registers: &mut RegisterFile) {
    for inst in code.iter().take(NUM_INSTRUCTIONS_MAX) {
        let dst = usize::from(inst.dst());
        let src = registers[usize::from(inst.src())];
        let value = registers[dst];
        registers[dst] = match inst.opcode() {
            Opcode::Mul => value.wrapping_mul(src),
            Opcode::Add => value.wrapping_add(src).wrapping_add(inst.c()),
            Opcode::Sub => value.wrapping_sub(src),
            Opcode::Ror => value.rotate_right(src % 32),
            Opcode::Rol => value.rotate_left(src % 32),
            Opcode::Xor => value ^ src,
            Opcode::Ret => return,
        };
    }
}
