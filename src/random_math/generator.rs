//! Program generation under a simulated CPU timing model.
//!
//! Instructions are decoded from the seed stream and accepted only when a
//! three-lane ALU (one lane capable of multiplication) could schedule them
//! inside the [`TOTAL_LATENCY`] budget. Short programs are then padded until
//! an unlimited-resource ASIC would also need the full budget.

use tracing::{debug, trace};

use super::seed::SeedStream;
use super::{
    Instruction, Opcode, Program, DESTINATION_REGISTERS, NUM_INSTRUCTIONS_MAX,
    NUM_INSTRUCTIONS_MIN, PROGRAM_SLOTS, REGISTER_COUNT, TOTAL_LATENCY,
};

/// Rejected instructions tolerated in one pass.
const MAX_RETRIES: usize = 64;

/// Decode iterations allowed in one pass.
const MAX_ITERATIONS: usize = 256;

/// How far past a register's ready cycle an instruction may be scheduled.
const MAX_START_DELAY: usize = 7;

/// Source register substituted when an instruction would read its own destination.
const SELF_SOURCE_REGISTER: u8 = 8;

/// Padding sequence appended while balancing.
const BALANCE_PATTERN: [Opcode; 3] = [Opcode::Ror, Opcode::Mul, Opcode::Mul];

/// Initial redundancy tracker values; R4..R8 never match a real instruction.
const INITIAL_TRACKER: [u32; REGISTER_COUNT] = [
    0, 1, 2, 3, 0xFFFFFF, 0xFFFFFF, 0xFFFFFF, 0xFFFFFF, 0xFFFFFF,
];

/// Mutable state of one generation pass.
struct GenerationContext {
    latency: [usize; REGISTER_COUNT],
    asic_latency: [usize; REGISTER_COUNT],
    tracker: [u32; REGISTER_COUNT],
    alu_busy: [[bool; super::ALU_COUNT]; TOTAL_LATENCY + 1],
    rotated: [bool; DESTINATION_REGISTERS],
    rotate_count: usize,
    num_retries: usize,
    total_iterations: usize,
    code_size: usize,
    r8_used: bool,
}

impl GenerationContext {
    fn new() -> Self {
        GenerationContext {
            latency: [0; REGISTER_COUNT],
            asic_latency: [0; REGISTER_COUNT],
            tracker: INITIAL_TRACKER,
            alu_busy: [[false; super::ALU_COUNT]; TOTAL_LATENCY + 1],
            rotated: [false; DESTINATION_REGISTERS],
            rotate_count: 0,
            num_retries: 0,
            total_iterations: 0,
            code_size: 0,
            r8_used: false,
        }
    }

    /// Returns `true` while some destination register still has budget left.
    fn has_budget(&self) -> bool {
        self.latency[..DESTINATION_REGISTERS]
            .iter()
            .any(|&l| l < TOTAL_LATENCY)
    }

    /// Decodes, schedules and appends instructions until the pass ends.
    fn fill(&mut self, seed: &mut SeedStream, code: &mut [Instruction; PROGRAM_SLOTS]) {
        while self.has_budget() && self.num_retries < MAX_RETRIES {
            self.total_iterations += 1;
            if self.total_iterations > MAX_ITERATIONS {
                break;
            }

            let (opcode, dst, src) = decode(seed);
            let (a, b) = (usize::from(dst), usize::from(src));

            if opcode.is_rotation() && self.rotated[a] {
                continue;
            }
            if opcode != Opcode::Mul && self.tracker[a] & 0xFFFF00 == self.signature(opcode, b) {
                continue;
            }

            let (start, alu) = self.find_slot(opcode, a, b);
            if start > self.latency[a] + MAX_START_DELAY {
                continue;
            }

            let done = start + opcode.latency();
            match alu {
                Some(alu) if done <= TOTAL_LATENCY => {
                    if opcode.is_rotation() {
                        self.rotate_count += 1;
                    }
                    self.alu_busy[start][alu] = true;
                    self.latency[a] = done;
                    self.asic_latency[a] =
                        self.asic_latency[a].max(self.asic_latency[b]) + opcode.asic_latency();
                    self.rotated[a] = opcode.is_rotation();
                    self.tracker[a] = self.code_size as u32 + self.signature(opcode, b);
                    if src == SELF_SOURCE_REGISTER {
                        self.r8_used = true;
                    }

                    let mut c = 0;
                    if opcode == Opcode::Add {
                        self.alu_busy[start + 1][alu] = true;
                        c = seed.next_u32();
                    }
                    code[self.code_size] = Instruction::raw(opcode, dst, src, c);
                    self.code_size += 1;
                    if self.code_size >= NUM_INSTRUCTIONS_MIN {
                        break;
                    }
                }
                _ => self.num_retries += 1,
            }
        }
    }

    /// Tracker pattern of `opcode` reading register `src`.
    fn signature(&self, opcode: Opcode, src: usize) -> u32 {
        ((opcode as u32) << 8) + ((self.tracker[src] & 0xFF) << 16)
    }

    /// Finds the earliest cycle and lane that can start `opcode`.
    ///
    /// Returns the cycle reached and the chosen lane, or `None` if the budget
    /// ran out before a lane was found.
    fn find_slot(&self, opcode: Opcode, dst: usize, src: usize) -> (usize, Option<usize>) {
        let mut cycle = self.latency[dst].max(self.latency[src]);
        while cycle < TOTAL_LATENCY {
            let lane = (0..opcode.alu_count()).rev().find(|&lane| {
                !self.alu_busy[cycle][lane]
                    && !(opcode == Opcode::Add && self.alu_busy[cycle + 1][lane])
                    && !(opcode.is_rotation() && cycle < self.rotate_count * opcode.latency())
            });
            if lane.is_some() {
                return (cycle, lane);
            }
            cycle += 1;
        }
        (cycle, None)
    }

    /// Pads the program until the ASIC model uses the full latency budget.
    fn balance(&mut self, code: &mut [Instruction; PROGRAM_SLOTS]) {
        let prev_code_size = self.code_size;
        while self.code_size < NUM_INSTRUCTIONS_MAX
            && self.asic_latency[..DESTINATION_REGISTERS]
                .iter()
                .all(|&l| l < TOTAL_LATENCY)
        {
            let asic = &self.asic_latency[..DESTINATION_REGISTERS];
            let mut min_idx = 0;
            let mut max_idx = 0;
            for (i, &l) in asic.iter().enumerate().skip(1) {
                if l < asic[min_idx] {
                    min_idx = i;
                }
                if l > asic[max_idx] {
                    max_idx = i;
                }
            }

            let opcode = BALANCE_PATTERN[(self.code_size - prev_code_size) % BALANCE_PATTERN.len()];
            self.latency[min_idx] = self.latency[max_idx] + opcode.latency();
            self.asic_latency[min_idx] = self.asic_latency[max_idx] + opcode.asic_latency();
            code[self.code_size] = Instruction::raw(opcode, min_idx as u8, max_idx as u8, 0);
            self.code_size += 1;
        }
    }

    fn is_complete(&self) -> bool {
        self.r8_used && (NUM_INSTRUCTIONS_MIN..=NUM_INSTRUCTIONS_MAX).contains(&self.code_size)
    }
}

/// Reads one instruction header from the seed stream.
fn decode(seed: &mut SeedStream) -> (Opcode, u8, u8) {
    let c = seed.next_byte();
    let opcode = match c & 7 {
        0..=2 => Opcode::Mul,
        3 => Opcode::Add,
        4 => Opcode::Sub,
        5 => {
            if seed.next_i8() >= 0 {
                Opcode::Ror
            } else {
                Opcode::Rol
            }
        }
        _ => Opcode::Xor,
    };
    let dst = (c >> 3) & 3;
    let mut src = (c >> 5) & 7;
    if matches!(opcode, Opcode::Add | Opcode::Sub | Opcode::Xor) && src == dst {
        src = SELF_SOURCE_REGISTER;
    }
    (opcode, dst, src)
}

/// Generates the random math program for a block height.
///
/// # Parameters
/// - `height`: Block height seeding the program.
///
/// # Returns
/// A program of 60 to 70 instructions that reads R8 at least once.
///
/// # Examples
///
/// ```
/// use cryptonight_r::random_math::generate;
///
/// let program = generate(1_806_260);
/// assert!((60..=70).contains(&program.len()));
/// assert!(program.uses_r8());
/// ```
pub fn generate(height: u64) -> Program {
    let mut code = [Instruction::RET; PROGRAM_SLOTS];
    let len = generate_into(height, &mut code);
    Program::from_code(code, len)
}

/// Generates the program for `height` into a caller-owned buffer.
///
/// Passes that end too short, too long, or without reading R8 are discarded
/// and a new pass starts from a fresh context; the seed stream is not reset,
/// so every pass sees new bytes.
///
/// Each pass is bounded, but the number of passes is not. Termination has
/// been checked exhaustively only for heights below 10,000,000, by the
/// ignored `generate_all_heights_well_formed` sweep.
///
/// # Parameters
/// - `height`: Block height seeding the program.
/// - `code`: Destination buffer; on return every slot from the result onwards is RET.
///
/// # Returns
/// The number of instructions before the terminating RET.
pub fn generate_into(height: u64, code: &mut [Instruction; PROGRAM_SLOTS]) -> usize {
    let mut seed = SeedStream::new(height);
    let mut attempt = 1usize;
    loop {
        code.fill(Instruction::RET);
        let mut ctx = GenerationContext::new();
        ctx.fill(&mut seed, code);
        ctx.balance(code);

        if ctx.is_complete() {
            trace!(height, attempt, size = ctx.code_size, "random math program generated");
            return ctx.code_size;
        }

        debug!(
            height,
            attempt,
            size = ctx.code_size,
            r8_used = ctx.r8_used,
            retries = ctx.num_retries,
            "random math pass rejected"
        );
        attempt += 1;
    }
}
