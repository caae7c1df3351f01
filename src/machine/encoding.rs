//! Word packing and wraparound arithmetic.
//!
//! Every instruction is a single 16-bit word: a 4-bit opcode in the high
//! nibble and a 12-bit data field (address or selector) in the low bits.

use crate::machine::errors::MachineError;

/// Universal unit of storage: registers, memory cells and encoded instructions.
pub type Word = u16;

/// Number of distinct word values; arithmetic is reduced modulo this.
pub const WORD_MODULUS: i64 = 1 << 16;

/// Bit position of the opcode nibble.
pub const OPCODE_SHIFT: u32 = 12;

/// Mask selecting the data field.
pub const DATA_MASK: Word = 0x0FFF;

/// Largest encodable opcode.
pub const MAX_OPCODE: u8 = 0x0F;

/// Packs an opcode and data field into a word.
///
/// Fails with [`MachineError::OperandOutOfRange`] if `data` does not fit the
/// 12-bit field.
pub fn encode(opcode: u8, data: u16) -> Result<Word, MachineError> {
    debug_assert!(opcode <= MAX_OPCODE, "opcode {opcode} exceeds 4 bits");
    if data > DATA_MASK {
        return Err(MachineError::OperandOutOfRange {
            value: data as u64,
            max: DATA_MASK,
        });
    }
    Ok(((opcode as Word) << OPCODE_SHIFT) | data)
}

/// Splits a word into `(opcode, data)`.
pub const fn decode(word: Word) -> (u8, u16) {
    ((word >> OPCODE_SHIFT) as u8, word & DATA_MASK)
}

/// Reduces any intermediate result into `[0, 65535]`.
///
/// Negative values wrap from the top: `wrap(-1) == 65535`.
pub const fn wrap(value: i64) -> Word {
    value.rem_euclid(WORD_MODULUS) as Word
}

/// Checks that `value` is a valid word without wrapping it.
pub fn checked_word(value: i64) -> Result<Word, MachineError> {
    Word::try_from(value).map_err(|_| MachineError::ValueOutOfRange { value })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn wrap_boundaries() {
        assert_eq!(wrap(65535 + 1), 0);
        assert_eq!(wrap(0 - 1), 65535);
        assert_eq!(wrap(65535), 65535);
        assert_eq!(wrap(-65536), 0);
        assert_eq!(wrap(3 * WORD_MODULUS + 7), 7);
    }

    #[test]
    fn encode_places_opcode_in_high_nibble() {
        assert_eq!(encode(1, 5).unwrap(), 0x1005);
        assert_eq!(encode(15, 0xFFF).unwrap(), 0xFFFF);
        assert_eq!(encode(0, 0).unwrap(), 0);
    }

    #[test]
    fn encode_rejects_wide_data() {
        assert!(matches!(
            encode(1, 4096),
            Err(MachineError::OperandOutOfRange {
                value: 4096,
                max: 0x0FFF
            })
        ));
    }

    #[test]
    fn decode_splits_fields() {
        assert_eq!(decode(0xC002), (12, 2));
        assert_eq!(decode(0x0007), (0, 7));
    }

    #[test]
    fn checked_word_bounds() {
        assert_eq!(checked_word(65535).unwrap(), 65535);
        assert!(matches!(
            checked_word(65536),
            Err(MachineError::ValueOutOfRange { value: 65536 })
        ));
        assert!(checked_word(-1).is_err());
    }

    proptest! {
        #[test]
        fn wrap_matches_double_modulo(v in any::<i64>()) {
            let expected = ((v % WORD_MODULUS) + WORD_MODULUS) % WORD_MODULUS;
            prop_assert_eq!(wrap(v) as i64, expected);
        }

        #[test]
        fn decode_inverts_encode(op in 0u8..=MAX_OPCODE, data in 0u16..=DATA_MASK) {
            prop_assert_eq!(decode(encode(op, data).unwrap()), (op, data));
        }
    }
}
