//! Core execution engine.
//!
//! The VM owns a flat memory of [`MEMORY_SIZE`] words, three general
//! registers and an instruction pointer pair. Each step fetches the word at
//! `next`, decodes it into an [`Instruction`] and executes it. All arithmetic
//! wraps modulo 2^16.
//!
//! # Instruction Pointer
//!
//! `current` is the address being executed and `next` the address of the
//! following step. A step sets `current = next` and provisionally
//! `next = current + 1`; branches overwrite `next` afterwards.

mod io;
mod memory;
mod profile;
mod registers;

pub use io::{
    InputSource, LineInput, NoInput, OUTPUT_WIDTH, OutputBuffer, OutputSink, QueuedInput,
    StreamOutput,
};
pub use profile::{ExecutionProfile, InstructionClass};

use crate::debug;
use crate::machine::encoding::{Word, wrap};
use crate::machine::errors::MachineError;
use crate::machine::isa::{Instruction, Register, ShiftDirection};
use memory::Memory;
use registers::Registers;

/// Number of addressable words.
pub const MEMORY_SIZE: usize = 4096;

/// Whether the VM is executing.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MachineState {
    Halted,
    Running,
}

/// The virtual machine.
///
/// `O` receives the text written by `OUT` and `OTC`; input is passed per run
/// so the same VM can be driven by different sources.
pub struct VM<O = OutputBuffer> {
    memory: Memory,
    registers: Registers,
    current_ip: usize,
    next_ip: usize,
    state: MachineState,
    output: O,
    profile: ExecutionProfile,
    steps: u64,
}

impl VM {
    /// Creates a halted VM with zeroed memory that captures output in an
    /// [`OutputBuffer`].
    pub fn new() -> Self {
        Self::with_output(OutputBuffer::new())
    }
}

impl Default for VM {
    fn default() -> Self {
        Self::new()
    }
}

impl<O: OutputSink> VM<O> {
    /// Creates a halted VM with zeroed memory writing output to `output`.
    pub fn with_output(output: O) -> Self {
        Self {
            memory: Memory::new(),
            registers: Registers::new(),
            current_ip: 0,
            next_ip: 0,
            state: MachineState::Halted,
            output,
            profile: ExecutionProfile::new(),
            steps: 0,
        }
    }

    /// Copies `program` into memory starting at address 0.
    ///
    /// Registers, the instruction pointer and memory past the program are not
    /// touched. Fails with [`MachineError::ProgramTooLarge`] if the program
    /// exceeds [`MEMORY_SIZE`] words.
    pub fn load(&mut self, program: &[Word]) -> Result<(), MachineError> {
        self.memory.load(program)
    }

    /// Runs from address 0 until `HLT` or the first error.
    ///
    /// A program that never halts makes this loop forever; use
    /// [`VM::run_with_limit`] to bound it.
    pub fn run<I: InputSource + ?Sized>(&mut self, input: &mut I) -> Result<(), MachineError> {
        self.execute(input, None)
    }

    /// Like [`VM::run`], but fails with [`MachineError::StepLimitExceeded`]
    /// if the program is still running after `max_steps` instructions.
    pub fn run_with_limit<I: InputSource + ?Sized>(
        &mut self,
        input: &mut I,
        max_steps: u64,
    ) -> Result<(), MachineError> {
        self.execute(input, Some(max_steps))
    }

    fn execute<I: InputSource + ?Sized>(
        &mut self,
        input: &mut I,
        limit: Option<u64>,
    ) -> Result<(), MachineError> {
        self.current_ip = 0;
        self.next_ip = 0;
        self.steps = 0;
        self.profile = ExecutionProfile::new();
        self.state = MachineState::Running;

        while self.state == MachineState::Running {
            if let Some(limit) = limit
                && self.steps >= limit
            {
                self.state = MachineState::Halted;
                return Err(MachineError::StepLimitExceeded { limit });
            }
            self.step(input)?;
        }
        Ok(())
    }

    /// Executes exactly one instruction.
    ///
    /// Any error halts the machine; registers and memory keep whatever the
    /// failing instruction had not yet changed.
    pub fn step<I: InputSource + ?Sized>(&mut self, input: &mut I) -> Result<(), MachineError> {
        let result = self.step_inner(input);
        if result.is_err() {
            self.state = MachineState::Halted;
        }
        result
    }

    fn step_inner<I: InputSource + ?Sized>(&mut self, input: &mut I) -> Result<(), MachineError> {
        self.current_ip = self.next_ip;
        self.next_ip = self.current_ip + 1;

        let address = self.current_ip;
        let word = self.memory.read(address)?;
        let instr = Instruction::decode(word, address)?;
        debug!("{address:04}  {word:#06x}  {instr}");

        self.steps += 1;
        self.profile.add(InstructionClass::of(&instr));
        self.exec(instr, input)
    }

    fn exec<I: InputSource + ?Sized>(
        &mut self,
        instr: Instruction,
        input: &mut I,
    ) -> Result<(), MachineError> {
        match instr {
            Instruction::Halt => self.state = MachineState::Halted,
            Instruction::Load(reg, addr) => {
                let value = self.memory.read(addr as usize)?;
                self.registers.set(reg, value);
            }
            Instruction::Store(addr) => {
                self.memory
                    .write(addr as usize, self.registers.get(Register::A))?;
            }
            Instruction::Swap(reg) => self.registers.swap_with_a(reg),
            Instruction::AddRegister(reg) => {
                let rhs = self.registers.get(reg);
                self.op_add(rhs, 1);
            }
            Instruction::AddMemory(addr) => {
                let rhs = self.memory.read(addr as usize)?;
                self.op_add(rhs, 1);
            }
            Instruction::SubRegister(reg) => {
                let rhs = self.registers.get(reg);
                self.op_add(rhs, -1);
            }
            Instruction::SubMemory(addr) => {
                let rhs = self.memory.read(addr as usize)?;
                self.op_add(rhs, -1);
            }
            Instruction::Shift { amount, direction } => self.op_shift(amount, direction),
            Instruction::Reserved(_) => {}
            Instruction::Input => {
                let value = input.next_value()?;
                self.registers.set(Register::A, wrap(value));
            }
            Instruction::OutputNumber => {
                let a = self.registers.get(Register::A);
                self.output.emit(&a.to_string())?;
            }
            Instruction::OutputChar => {
                let a = self.registers.get(Register::A);
                let ch = char::from_u32(a as u32)
                    .ok_or(MachineError::InvalidCharacter { value: a })?;
                self.output.emit(ch.encode_utf8(&mut [0u8; 4]))?;
            }
            Instruction::BranchZero(addr) => {
                if self.registers.get(Register::A) == 0 {
                    self.next_ip = addr as usize;
                }
            }
            // A is unsigned, so "A >= 0" always holds.
            Instruction::BranchPositive(addr) => self.next_ip = addr as usize,
            Instruction::Jump(addr) => self.next_ip = addr as usize,
        }
        Ok(())
    }

    /// `A = wrap(A + sign * rhs)`.
    fn op_add(&mut self, rhs: Word, sign: i64) {
        let a = self.registers.get(Register::A) as i64;
        self.registers
            .set(Register::A, wrap(a + sign * rhs as i64));
    }

    /// Shifts A by the value of `amount`; shifting by 16 or more yields 0.
    fn op_shift(&mut self, amount: Register, direction: ShiftDirection) {
        let a = self.registers.get(Register::A);
        let by = self.registers.get(amount) as u32;
        let shifted = match direction {
            ShiftDirection::Left => a.checked_shl(by),
            ShiftDirection::Right => a.checked_shr(by),
        };
        self.registers.set(Register::A, shifted.unwrap_or(0));
    }

    /// Writes an unreduced value into memory, failing with
    /// [`MachineError::ValueOutOfRange`] if it is not a valid word.
    pub fn set_memory(&mut self, address: usize, value: i64) -> Result<(), MachineError> {
        self.memory.write_value(address, value)
    }

    /// Returns the word at `address`.
    pub fn read_memory(&self, address: usize) -> Result<Word, MachineError> {
        self.memory.read(address)
    }

    /// Returns the whole memory.
    pub fn memory(&self) -> &[Word] {
        self.memory.as_slice()
    }

    pub fn register(&self, reg: Register) -> Word {
        self.registers.get(reg)
    }

    pub fn state(&self) -> MachineState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == MachineState::Running
    }

    /// Address of the most recently fetched instruction.
    pub fn current_ip(&self) -> usize {
        self.current_ip
    }

    /// Address the next step will fetch from.
    pub fn next_ip(&self) -> usize {
        self.next_ip
    }

    pub fn output(&self) -> &O {
        &self.output
    }

    pub fn output_mut(&mut self) -> &mut O {
        &mut self.output
    }

    pub fn into_output(self) -> O {
        self.output
    }

    /// Instruction counts of the latest run.
    pub fn profile(&self) -> &ExecutionProfile {
        &self.profile
    }

    /// Number of instructions executed by the latest run.
    pub fn steps(&self) -> u64 {
        self.steps
    }
}
