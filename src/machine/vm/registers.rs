use crate::machine::encoding::Word;
use crate::machine::isa::Register;

/// Register file holding the three general registers.
///
/// All registers start at zero and always hold an in-range word.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub(super) struct Registers {
    a: Word,
    b: Word,
    c: Word,
}

impl Registers {
    /// Creates a zeroed register file.
    pub(super) fn new() -> Self {
        Self::default()
    }

    /// Returns the value of `reg`.
    pub(super) fn get(&self, reg: Register) -> Word {
        match reg {
            Register::A => self.a,
            Register::B => self.b,
            Register::C => self.c,
        }
    }

    /// Stores `value` into `reg`.
    pub(super) fn set(&mut self, reg: Register, value: Word) {
        match reg {
            Register::A => self.a = value,
            Register::B => self.b = value,
            Register::C => self.c = value,
        }
    }

    /// Exchanges A with `reg`. Swapping A with itself is a no-op.
    pub(super) fn swap_with_a(&mut self, reg: Register) {
        let a = self.a;
        self.a = self.get(reg);
        self.set(reg, a);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registers_are_independent() {
        let mut regs = Registers::new();
        regs.set(Register::B, 7);
        assert_eq!(regs.get(Register::A), 0);
        assert_eq!(regs.get(Register::B), 7);
        assert_eq!(regs.get(Register::C), 0);
    }

    #[test]
    fn swap_exchanges_values() {
        let mut regs = Registers::new();
        regs.set(Register::A, 1);
        regs.set(Register::C, 2);
        regs.swap_with_a(Register::C);
        assert_eq!(regs.get(Register::A), 2);
        assert_eq!(regs.get(Register::C), 1);
    }
}
