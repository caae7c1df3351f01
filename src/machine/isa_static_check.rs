#[cfg(test)]
mod tests {
    use crate::machine::isa::{Encoding, Mnemonic};

    const FNV_OFFSET: u64 = 0xcbf29ce484222325;
    const FNV_PRIME: u64 = 0x100000001b3;
    const EXPECTED_ISA_HASH: u64 = 2718480153155367615;

    fn fnv1a64(mut h: u64, bytes: &[u8]) -> u64 {
        for b in bytes {
            h ^= *b as u64;
            h = h.wrapping_mul(FNV_PRIME);
        }
        h
    }

    fn encoding_fingerprint(encoding: Encoding) -> [u8; 4] {
        match encoding {
            Encoding::Data => [0, 0, 0, 0],
            Encoding::Opcode(op) => [1, op as u8, 0, 0],
            Encoding::Fixed(op, selector) => {
                let [lo, hi] = selector.to_le_bytes();
                [2, op as u8, lo, hi]
            }
        }
    }

    macro_rules! hash_isa {
        (
            $( $(#[$doc:meta])* $name:ident = $text:literal => $kind:ident $( ( $( $arg:tt )* ) )? ),* $(,)?
        ) => {{
            let mut h = FNV_OFFSET;
            $(
                h = fnv1a64(h, stringify!($name).as_bytes());
                h = fnv1a64(h, $text.as_bytes());
                h = fnv1a64(h, &encoding_fingerprint(Mnemonic::$name.encoding()));
            )*
            h
        }};
    }

    fn current_isa_hash() -> u64 {
        crate::for_each_mnemonic!(hash_isa)
    }

    #[test]
    #[ignore]
    fn print_isa_hash() {
        println!("ISA_HASH={}", current_isa_hash());
    }

    /// Changing a mnemonic's spelling, opcode or selector breaks every
    /// previously assembled program image; update the constant deliberately.
    #[test]
    fn isa_hash_unchanged() {
        assert_eq!(current_isa_hash(), EXPECTED_ISA_HASH);
    }
}
