//! Instruction Set Architecture (ISA) definitions.
//!
//! The machine has sixteen opcodes. Several of them carry a selector in the
//! data field instead of an address (which register to add, which direction
//! to shift, which I/O port to use), so the assembler exposes one mnemonic
//! per opcode/selector pair.
//!
//! The [`for_each_mnemonic!`](crate::for_each_mnemonic) macro holds the
//! canonical mnemonic table and invokes a callback macro for code generation,
//! so the assembler and the fingerprint test read the same definitions.
//!
//! This module generates:
//! - The [`Mnemonic`] enum with its source spelling and [`Encoding`]
//!
//! and defines by hand:
//! - [`Opcode`], the closed set of 4-bit opcodes
//! - [`Instruction`], a fully decoded instruction with its operand
//!
//! # Word Format
//!
//! ```text
//!  15  12 11                     0
//! +------+------------------------+
//! |opcode|   address / selector   |
//! +------+------------------------+
//! ```

use crate::machine::encoding::{self, Word};
use crate::machine::errors::MachineError;
use std::fmt;

/// Invokes a callback macro with the complete mnemonic table.
#[macro_export]
macro_rules! for_each_mnemonic {
    ($callback:ident) => {
        $callback! {
            /// HLT ; stop execution
            Hlt = "HLT" => Opcode(Halt),
            /// DAT value ; raw word placed at this address
            Dat = "DAT" => Data,
            // =========================
            // Load and Store
            // =========================
            /// LDA addr ; A = mem[addr]
            Lda = "LDA" => Opcode(LoadA),
            /// LDB addr ; B = mem[addr]
            Ldb = "LDB" => Opcode(LoadB),
            /// LDC addr ; C = mem[addr]
            Ldc = "LDC" => Opcode(LoadC),
            /// STA addr ; mem[addr] = A
            Sta = "STA" => Opcode(StoreA),
            /// SWB ; swap A and B
            Swb = "SWB" => Fixed(Swap, 0),
            /// SWC ; swap A and C
            Swc = "SWC" => Fixed(Swap, 1),
            // =========================
            // Arithmetic
            // =========================
            /// ADA ; A = A + A
            Ada = "ADA" => Fixed(AddRegister, 0),
            /// ADB ; A = A + B
            Adb = "ADB" => Fixed(AddRegister, 1),
            /// ADC ; A = A + C
            Adc = "ADC" => Fixed(AddRegister, 2),
            /// ADD addr ; A = A + mem[addr]
            Add = "ADD" => Opcode(AddMemory),
            /// SBA ; A = A - A
            Sba = "SBA" => Fixed(SubRegister, 0),
            /// SBB ; A = A - B
            Sbb = "SBB" => Fixed(SubRegister, 1),
            /// SBC ; A = A - C
            Sbc = "SBC" => Fixed(SubRegister, 2),
            /// SUB addr ; A = A - mem[addr]
            Sub = "SUB" => Opcode(SubMemory),
            /// LSB ; A = A << B
            Lsb = "LSB" => Fixed(Shift, 0),
            /// LSC ; A = A << C
            Lsc = "LSC" => Fixed(Shift, 1),
            /// RSB ; A = A >> B
            Rsb = "RSB" => Fixed(Shift, 2),
            /// RSC ; A = A >> C
            Rsc = "RSC" => Fixed(Shift, 3),
            // =========================
            // Input / Output
            // =========================
            /// INP ; A = next input value
            Inp = "INP" => Fixed(Io, 0),
            /// OUT ; print A as a decimal number
            Out = "OUT" => Fixed(Io, 1),
            /// OTC ; print A as a character
            Otc = "OTC" => Fixed(Io, 2),
            // =========================
            // Control Flow
            // =========================
            /// BRZ addr ; if A == 0 then jump to addr
            Brz = "BRZ" => Opcode(BranchZero),
            /// BRP addr ; if A >= 0 then jump to addr
            Brp = "BRP" => Opcode(BranchPositive),
            /// JMP addr ; jump to addr
            Jmp = "JMP" => Opcode(Jump),
        }
    };
}

#[macro_export]
macro_rules! define_mnemonics {
    (
        $(
            $(#[$doc:meta])*
            $name:ident = $text:literal => $kind:ident $( ( $( $arg:tt )* ) )?
        ),* $(,)?
    ) => {
        /// Assembly mnemonic accepted by the assembler.
        #[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
        pub enum Mnemonic {
            $(
                $(#[$doc])*
                $name,
            )*
        }

        impl Mnemonic {
            /// Every mnemonic in table order.
            pub const ALL: &'static [Mnemonic] = &[ $( Mnemonic::$name, )* ];

            /// Looks up a mnemonic by its (case-sensitive) source spelling.
            pub fn from_name(name: &str) -> Option<Self> {
                match name {
                    $( $text => Some(Mnemonic::$name), )*
                    _ => None,
                }
            }

            /// Returns the source spelling of this mnemonic.
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $( Mnemonic::$name => $text, )*
                }
            }

            /// Returns how this mnemonic turns its operand into a word.
            pub const fn encoding(&self) -> Encoding {
                match self {
                    $( Mnemonic::$name => $crate::define_mnemonics!(@encoding $kind $( ( $( $arg )* ) )?), )*
                }
            }
        }
    };

    (@encoding Data) => { Encoding::Data };
    (@encoding Opcode($op:ident)) => { Encoding::Opcode(Opcode::$op) };
    (@encoding Fixed($op:ident, $selector:expr)) => { Encoding::Fixed(Opcode::$op, $selector) };
}

for_each_mnemonic!(define_mnemonics);

/// How a mnemonic line becomes an output word.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Encoding {
    /// Pseudo-instruction: the operand itself is the word.
    Data,
    /// Opcode whose data field is the operand (an address).
    Opcode(Opcode),
    /// Opcode with a fixed selector; any source operand is ignored.
    Fixed(Opcode, u16),
}

impl fmt::Display for Mnemonic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The sixteen opcodes, one per value of a word's high nibble.
#[repr(u8)]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Opcode {
    Halt = 0,
    LoadA = 1,
    LoadB = 2,
    LoadC = 3,
    StoreA = 4,
    Swap = 5,
    AddRegister = 6,
    AddMemory = 7,
    SubRegister = 8,
    SubMemory = 9,
    Shift = 10,
    /// Unassigned; executes as a no-op.
    Reserved = 11,
    Io = 12,
    BranchZero = 13,
    BranchPositive = 14,
    Jump = 15,
}

impl TryFrom<u8> for Opcode {
    type Error = MachineError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Ok(match value {
            0 => Opcode::Halt,
            1 => Opcode::LoadA,
            2 => Opcode::LoadB,
            3 => Opcode::LoadC,
            4 => Opcode::StoreA,
            5 => Opcode::Swap,
            6 => Opcode::AddRegister,
            7 => Opcode::AddMemory,
            8 => Opcode::SubRegister,
            9 => Opcode::SubMemory,
            10 => Opcode::Shift,
            11 => Opcode::Reserved,
            12 => Opcode::Io,
            13 => Opcode::BranchZero,
            14 => Opcode::BranchPositive,
            15 => Opcode::Jump,
            _ => {
                return Err(MachineError::InvalidInstruction {
                    word: 0,
                    opcode: value,
                    data: 0,
                    address: 0,
                });
            }
        })
    }
}

/// One of the three general registers.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Register {
    A,
    B,
    C,
}

/// Shift direction selected by bit 1 of the `SFT` selector.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ShiftDirection {
    Left,
    Right,
}

/// A decoded instruction.
///
/// Addresses are always within the 12-bit data field.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Instruction {
    Halt,
    /// Load a memory cell into A, B or C.
    Load(Register, u16),
    Store(u16),
    /// Exchange A with B or C.
    Swap(Register),
    AddRegister(Register),
    AddMemory(u16),
    SubRegister(Register),
    SubMemory(u16),
    /// Shift A by the value of B or C.
    Shift {
        amount: Register,
        direction: ShiftDirection,
    },
    /// Opcode 11; the data field is kept so the word re-encodes unchanged.
    Reserved(u16),
    Input,
    OutputNumber,
    OutputChar,
    BranchZero(u16),
    BranchPositive(u16),
    Jump(u16),
}

impl Instruction {
    /// Decodes a word fetched from `address`.
    ///
    /// Fails with [`MachineError::InvalidInstruction`] when the selector is
    /// not defined for the opcode. Halt ignores its data field.
    pub fn decode(word: Word, address: usize) -> Result<Self, MachineError> {
        let (op, data) = encoding::decode(word);
        let invalid = || MachineError::InvalidInstruction {
            word,
            opcode: op,
            data,
            address,
        };

        let opcode = Opcode::try_from(op).map_err(|_| invalid())?;
        Ok(match opcode {
            Opcode::Halt => Instruction::Halt,
            Opcode::LoadA => Instruction::Load(Register::A, data),
            Opcode::LoadB => Instruction::Load(Register::B, data),
            Opcode::LoadC => Instruction::Load(Register::C, data),
            Opcode::StoreA => Instruction::Store(data),
            Opcode::Swap => match data {
                0 => Instruction::Swap(Register::B),
                1 => Instruction::Swap(Register::C),
                _ => return Err(invalid()),
            },
            Opcode::AddRegister => {
                Instruction::AddRegister(select_register(data).ok_or_else(invalid)?)
            }
            Opcode::AddMemory => Instruction::AddMemory(data),
            Opcode::SubRegister => {
                Instruction::SubRegister(select_register(data).ok_or_else(invalid)?)
            }
            Opcode::SubMemory => Instruction::SubMemory(data),
            Opcode::Shift => {
                if data > 0b11 {
                    return Err(invalid());
                }
                Instruction::Shift {
                    amount: if data & 0b01 == 0 { Register::B } else { Register::C },
                    direction: if data & 0b10 == 0 {
                        ShiftDirection::Left
                    } else {
                        ShiftDirection::Right
                    },
                }
            }
            Opcode::Reserved => Instruction::Reserved(data),
            Opcode::Io => match data {
                0 => Instruction::Input,
                1 => Instruction::OutputNumber,
                2 => Instruction::OutputChar,
                _ => return Err(invalid()),
            },
            Opcode::BranchZero => Instruction::BranchZero(data),
            Opcode::BranchPositive => Instruction::BranchPositive(data),
            Opcode::Jump => Instruction::Jump(data),
        })
    }

    /// Returns the opcode of this instruction.
    pub const fn opcode(&self) -> Opcode {
        match self {
            Instruction::Halt => Opcode::Halt,
            Instruction::Load(Register::A, _) => Opcode::LoadA,
            Instruction::Load(Register::B, _) => Opcode::LoadB,
            Instruction::Load(Register::C, _) => Opcode::LoadC,
            Instruction::Store(_) => Opcode::StoreA,
            Instruction::Swap(_) => Opcode::Swap,
            Instruction::AddRegister(_) => Opcode::AddRegister,
            Instruction::AddMemory(_) => Opcode::AddMemory,
            Instruction::SubRegister(_) => Opcode::SubRegister,
            Instruction::SubMemory(_) => Opcode::SubMemory,
            Instruction::Shift { .. } => Opcode::Shift,
            Instruction::Reserved(_) => Opcode::Reserved,
            Instruction::Input | Instruction::OutputNumber | Instruction::OutputChar => Opcode::Io,
            Instruction::BranchZero(_) => Opcode::BranchZero,
            Instruction::BranchPositive(_) => Opcode::BranchPositive,
            Instruction::Jump(_) => Opcode::Jump,
        }
    }

    /// Returns the data field this instruction encodes to.
    pub const fn data(&self) -> u16 {
        match self {
            Instruction::Halt | Instruction::Input => 0,
            Instruction::Load(_, addr)
            | Instruction::Store(addr)
            | Instruction::AddMemory(addr)
            | Instruction::SubMemory(addr)
            | Instruction::BranchZero(addr)
            | Instruction::BranchPositive(addr)
            | Instruction::Jump(addr)
            | Instruction::Reserved(addr) => *addr,
            Instruction::Swap(Register::C) => 1,
            Instruction::Swap(_) => 0,
            Instruction::AddRegister(reg) | Instruction::SubRegister(reg) => match reg {
                Register::A => 0,
                Register::B => 1,
                Register::C => 2,
            },
            Instruction::Shift { amount, direction } => {
                let reg = match amount {
                    Register::C => 0b01,
                    _ => 0b00,
                };
                let dir = match direction {
                    ShiftDirection::Left => 0b00,
                    ShiftDirection::Right => 0b10,
                };
                reg | dir
            }
            Instruction::OutputNumber => 1,
            Instruction::OutputChar => 2,
        }
    }

    /// Packs this instruction back into a word.
    pub fn encode(&self) -> Result<Word, MachineError> {
        encoding::encode(self.opcode() as u8, self.data())
    }

    /// Returns the assembler mnemonic that produces this instruction, if any.
    pub fn mnemonic(&self) -> Option<Mnemonic> {
        let opcode = self.opcode();
        let data = self.data();
        Mnemonic::ALL.iter().copied().find(|m| match m.encoding() {
            Encoding::Opcode(op) => op == opcode,
            Encoding::Fixed(op, selector) => op == opcode && selector == data,
            Encoding::Data => false,
        })
    }

    /// Whether this instruction takes an address operand in source form.
    pub const fn has_address(&self) -> bool {
        matches!(
            self,
            Instruction::Load(..)
                | Instruction::Store(_)
                | Instruction::AddMemory(_)
                | Instruction::SubMemory(_)
                | Instruction::BranchZero(_)
                | Instruction::BranchPositive(_)
                | Instruction::Jump(_)
        )
    }
}

/// Selector 0/1/2 of `ADR`/`SBR`.
fn select_register(data: u16) -> Option<Register> {
    match data {
        0 => Some(Register::A),
        1 => Some(Register::B),
        2 => Some(Register::C),
        _ => None,
    }
}

/// Renders the canonical source form, e.g. `LDA 12` or `SWC`.
impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.mnemonic() {
            Some(m) if self.has_address() => write!(f, "{} {}", m, self.data()),
            Some(m) => write!(f, "{m}"),
            None => write!(f, "NOP {}", self.data()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opcode_try_from_invalid() {
        assert!(matches!(
            Opcode::try_from(16),
            Err(MachineError::InvalidInstruction { opcode: 16, .. })
        ));
        assert_eq!(Opcode::try_from(11).unwrap(), Opcode::Reserved);
    }

    #[test]
    fn mnemonic_lookup_is_case_sensitive() {
        assert_eq!(Mnemonic::from_name("LDA"), Some(Mnemonic::Lda));
        assert_eq!(Mnemonic::from_name("lda"), None);
        assert_eq!(Mnemonic::from_name("ADR"), None);
    }

    #[test]
    fn fixed_mnemonics_decode_back_to_themselves() {
        for m in Mnemonic::ALL {
            let word = match m.encoding() {
                Encoding::Data => continue,
                Encoding::Opcode(Opcode::Halt) => 0,
                Encoding::Opcode(op) => encoding::encode(op as u8, 42).unwrap(),
                Encoding::Fixed(op, selector) => encoding::encode(op as u8, selector).unwrap(),
            };
            let instr = Instruction::decode(word, 0).unwrap();
            assert_eq!(instr.mnemonic(), Some(*m), "{m}");
            assert_eq!(instr.encode().unwrap(), word, "{m}");
        }
    }

    #[test]
    fn decode_register_selectors() {
        assert_eq!(
            Instruction::decode(0x6002, 0).unwrap(),
            Instruction::AddRegister(Register::C)
        );
        assert_eq!(
            Instruction::decode(0x5001, 0).unwrap(),
            Instruction::Swap(Register::C)
        );
        assert_eq!(
            Instruction::decode(0xA003, 0).unwrap(),
            Instruction::Shift {
                amount: Register::C,
                direction: ShiftDirection::Right
            }
        );
    }

    #[test]
    fn decode_rejects_undefined_selectors() {
        for word in [0x6003u16, 0x8003, 0x5002, 0xA004, 0xC003] {
            let err = Instruction::decode(word, 9).unwrap_err();
            assert!(
                matches!(err, MachineError::InvalidInstruction { word: w, address: 9, .. } if w == word),
                "{word:#06x}"
            );
        }
    }

    #[test]
    fn halt_ignores_data() {
        assert_eq!(Instruction::decode(0x0007, 0).unwrap(), Instruction::Halt);
    }

    #[test]
    fn display_canonical_form() {
        assert_eq!(Instruction::Load(Register::B, 12).to_string(), "LDB 12");
        assert_eq!(Instruction::Swap(Register::C).to_string(), "SWC");
        assert_eq!(Instruction::OutputChar.to_string(), "OTC");
        assert_eq!(Instruction::Jump(0).to_string(), "JMP 0");
        assert_eq!(Instruction::Reserved(3).to_string(), "NOP 3");
    }
}
