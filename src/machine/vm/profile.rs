use crate::machine::isa::Instruction;

/// Number of instruction classes tracked by [`ExecutionProfile`].
const CLASS_COUNT: usize = 6;

/// Coarse grouping of executed instructions for profiling.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
#[repr(u8)]
pub enum InstructionClass {
    /// Loads and stores.
    Memory = 0,
    /// Register exchanges and reserved no-ops.
    Register = 1,
    /// Additions and subtractions.
    Arithmetic = 2,
    /// Left and right shifts.
    Shift = 3,
    /// Input and output.
    Io = 4,
    /// Halt, branches and jumps.
    Control = 5,
}

impl InstructionClass {
    pub const fn as_str(&self) -> &'static str {
        match self {
            InstructionClass::Memory => "Memory",
            InstructionClass::Register => "Register",
            InstructionClass::Arithmetic => "Arithmetic",
            InstructionClass::Shift => "Shift",
            InstructionClass::Io => "I/O",
            InstructionClass::Control => "Control",
        }
    }

    /// Returns the class an instruction is counted under.
    pub const fn of(instr: &Instruction) -> Self {
        match instr {
            Instruction::Load(..) | Instruction::Store(_) => InstructionClass::Memory,
            Instruction::Swap(_) | Instruction::Reserved(_) => InstructionClass::Register,
            Instruction::AddRegister(_)
            | Instruction::AddMemory(_)
            | Instruction::SubRegister(_)
            | Instruction::SubMemory(_) => InstructionClass::Arithmetic,
            Instruction::Shift { .. } => InstructionClass::Shift,
            Instruction::Input | Instruction::OutputNumber | Instruction::OutputChar => {
                InstructionClass::Io
            }
            Instruction::Halt
            | Instruction::BranchZero(_)
            | Instruction::BranchPositive(_)
            | Instruction::Jump(_) => InstructionClass::Control,
        }
    }

    /// All classes in discriminant order.
    const ALL: [InstructionClass; CLASS_COUNT] = [
        InstructionClass::Memory,
        InstructionClass::Register,
        InstructionClass::Arithmetic,
        InstructionClass::Shift,
        InstructionClass::Io,
        InstructionClass::Control,
    ];
}

/// Per-class count of executed instructions.
///
/// Backed by a flat array indexed by [`InstructionClass`] discriminant.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ExecutionProfile {
    counts: [u64; CLASS_COUNT],
}

impl ExecutionProfile {
    /// Creates an empty profile.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one executed instruction of the given class.
    #[inline(always)]
    pub fn add(&mut self, class: InstructionClass) {
        let slot = &mut self.counts[class as usize];
        *slot = slot.saturating_add(1);
    }

    /// Returns the count for a single class.
    pub fn get(&self, class: InstructionClass) -> u64 {
        self.counts[class as usize]
    }

    /// Returns the total number of instructions recorded.
    pub fn total(&self) -> u64 {
        self.counts
            .iter()
            .fold(0u64, |acc, &v| acc.saturating_add(v))
    }

    /// Returns an iterator over all classes and their counts.
    pub fn iter(&self) -> impl Iterator<Item = (InstructionClass, u64)> {
        InstructionClass::ALL.into_iter().zip(self.counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::machine::isa::Register;

    #[test]
    fn counts_by_class() {
        let mut profile = ExecutionProfile::new();
        for instr in [
            Instruction::Load(Register::A, 3),
            Instruction::AddRegister(Register::B),
            Instruction::OutputNumber,
            Instruction::Jump(0),
            Instruction::Store(1),
        ] {
            profile.add(InstructionClass::of(&instr));
        }
        assert_eq!(profile.get(InstructionClass::Memory), 2);
        assert_eq!(profile.get(InstructionClass::Shift), 0);
        assert_eq!(profile.total(), 5);
    }

    #[test]
    fn iter_visits_every_class_once() {
        let profile = ExecutionProfile::new();
        let names: Vec<_> = profile.iter().map(|(c, _)| c.as_str()).collect();
        assert_eq!(
            names,
            ["Memory", "Register", "Arithmetic", "Shift", "I/O", "Control"]
        );
    }
}
