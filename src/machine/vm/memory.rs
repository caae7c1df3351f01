use super::MEMORY_SIZE;
use crate::machine::encoding::{Word, checked_word};
use crate::machine::errors::MachineError;

/// Flat, zero-initialized word memory.
///
/// Every access is bounds-checked against [`MEMORY_SIZE`]; there is no other
/// protection.
pub(super) struct Memory {
    cells: Box<[Word]>,
}

impl Memory {
    /// Creates a memory of [`MEMORY_SIZE`] zeroed words.
    pub(super) fn new() -> Self {
        Self {
            cells: vec![0; MEMORY_SIZE].into_boxed_slice(),
        }
    }

    fn out_of_range(address: usize) -> MachineError {
        MachineError::AddressOutOfRange {
            address,
            size: MEMORY_SIZE,
        }
    }

    /// Returns the word at `address`.
    pub(super) fn read(&self, address: usize) -> Result<Word, MachineError> {
        self.cells
            .get(address)
            .copied()
            .ok_or_else(|| Self::out_of_range(address))
    }

    /// Stores `value` at `address`.
    pub(super) fn write(&mut self, address: usize, value: Word) -> Result<(), MachineError> {
        let slot = self
            .cells
            .get_mut(address)
            .ok_or_else(|| Self::out_of_range(address))?;
        *slot = value;
        Ok(())
    }

    /// Stores an unreduced value, failing if it is not a valid word.
    pub(super) fn write_value(&mut self, address: usize, value: i64) -> Result<(), MachineError> {
        let word = checked_word(value)?;
        self.write(address, word)
    }

    /// Copies `program` to the start of memory.
    ///
    /// Returns [`MachineError::ProgramTooLarge`] if it does not fit; memory is
    /// left untouched in that case.
    pub(super) fn load(&mut self, program: &[Word]) -> Result<(), MachineError> {
        if program.len() > MEMORY_SIZE {
            return Err(MachineError::ProgramTooLarge {
                len: program.len(),
                capacity: MEMORY_SIZE,
            });
        }
        self.cells[..program.len()].copy_from_slice(program);
        Ok(())
    }

    /// Returns all memory cells.
    pub(super) fn as_slice(&self) -> &[Word] {
        &self.cells
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_write_bounds() {
        let mut mem = Memory::new();
        mem.write(MEMORY_SIZE - 1, 9).unwrap();
        assert_eq!(mem.read(MEMORY_SIZE - 1).unwrap(), 9);
        assert_eq!(
            mem.read(MEMORY_SIZE),
            Err(MachineError::AddressOutOfRange {
                address: MEMORY_SIZE,
                size: MEMORY_SIZE
            })
        );
        assert!(mem.write(MEMORY_SIZE, 1).is_err());
    }

    #[test]
    fn write_value_rejects_out_of_range() {
        let mut mem = Memory::new();
        assert!(matches!(
            mem.write_value(0, 65536),
            Err(MachineError::ValueOutOfRange { value: 65536 })
        ));
        assert!(mem.write_value(0, -1).is_err());
        mem.write_value(0, 65535).unwrap();
        assert_eq!(mem.read(0).unwrap(), 65535);
    }

    #[test]
    fn load_keeps_tail() {
        let mut mem = Memory::new();
        mem.write(5, 42).unwrap();
        mem.load(&[1, 2, 3]).unwrap();
        assert_eq!(&mem.as_slice()[..3], &[1, 2, 3]);
        assert_eq!(mem.read(5).unwrap(), 42);
    }

    #[test]
    fn load_rejects_oversized_program() {
        let mut mem = Memory::new();
        let program = vec![1; MEMORY_SIZE + 1];
        assert!(matches!(
            mem.load(&program),
            Err(MachineError::ProgramTooLarge { len, capacity })
                if len == MEMORY_SIZE + 1 && capacity == MEMORY_SIZE
        ));
        assert_eq!(mem.read(0).unwrap(), 0);
    }
}
