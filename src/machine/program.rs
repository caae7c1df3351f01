//! Assembled program image and its binary file format.
//!
//! [`Program`] is the assembler's output: the ordered word sequence that the
//! VM copies into memory starting at address 0. It has no other structure;
//! labels are gone by the time a program exists.
//!
//! # Image Format
//!
//! ```text
//! magic "MMC\0" | version (major, minor, patch) | u32 LE word count | u16 LE words
//! ```

use crate::machine::encoding::Word;
use crate::machine::errors::MachineError;
use crate::machine::isa::Instruction;
use std::fmt::Write;

/// Magic bytes identifying a serialized program image.
const MAGIC: &[u8; 4] = b"MMC\0";

/// Current image format version.
const CURRENT_VERSION: Version = Version::new(1, 0, 0);

/// Semantic version for image format compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Version {
    major: u8,
    minor: u8,
    patch: u8,
}

impl Version {
    /// Creates a new version with the given components.
    const fn new(major: u8, minor: u8, patch: u8) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

/// An assembled program: words in load order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Program {
    words: Vec<Word>,
}

impl Program {
    /// Wraps a word sequence.
    pub fn new(words: Vec<Word>) -> Self {
        Self { words }
    }

    /// Returns the words in load order.
    pub fn words(&self) -> &[Word] {
        &self.words
    }

    /// Consumes the program and returns its words.
    pub fn into_words(self) -> Vec<Word> {
        self.words
    }

    /// Returns the number of words.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Returns `true` if the program has no words.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Serializes the program to a portable binary image.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(MAGIC.len() + 3 + 4 + self.words.len() * 2);
        out.extend_from_slice(MAGIC);
        out.extend_from_slice(&[
            CURRENT_VERSION.major,
            CURRENT_VERSION.minor,
            CURRENT_VERSION.patch,
        ]);
        out.extend_from_slice(&(self.words.len() as u32).to_le_bytes());
        for word in &self.words {
            out.extend_from_slice(&word.to_le_bytes());
        }
        out
    }

    /// Deserializes a program from its binary image.
    ///
    /// Validates the magic header, rejects images from a newer major format
    /// version, and requires the payload length to match the word count.
    pub fn from_bytes(input: &[u8]) -> Result<Self, MachineError> {
        let decode_err = |reason: &str| MachineError::DecodeError {
            reason: reason.to_string(),
        };

        let header_len = MAGIC.len() + 3 + 4;
        if input.len() < header_len {
            return Err(decode_err("truncated header"));
        }
        let (magic, rest) = input.split_at(MAGIC.len());
        if magic != MAGIC {
            return Err(decode_err("bad magic"));
        }

        let version = Version::new(rest[0], rest[1], rest[2]);
        if version.major > CURRENT_VERSION.major {
            return Err(MachineError::DecodeError {
                reason: format!(
                    "unsupported version {}.{}.{} (max {}.x.x)",
                    version.major, version.minor, version.patch, CURRENT_VERSION.major
                ),
            });
        }

        let mut count = [0u8; 4];
        count.copy_from_slice(&rest[3..7]);
        let count = u32::from_le_bytes(count) as usize;
        let payload = &rest[7..];
        if payload.len() != count.saturating_mul(2) {
            return Err(MachineError::DecodeError {
                reason: format!(
                    "expected {} payload bytes for {} words, got {}",
                    count.saturating_mul(2),
                    count,
                    payload.len()
                ),
            });
        }

        let words = payload
            .chunks_exact(2)
            .map(|pair| Word::from_le_bytes([pair[0], pair[1]]))
            .collect();
        Ok(Self { words })
    }

    /// Renders an address / word / disassembly table.
    ///
    /// Words that do not decode, or that decode to an instruction encoding a
    /// different word (data that happens to look like `HLT`), print as `DAT`.
    pub fn listing(&self) -> String {
        let mut out = String::new();
        for (address, &word) in self.words.iter().enumerate() {
            let text = match Instruction::decode(word, address) {
                Ok(instr) if instr.encode().ok() == Some(word) => instr.to_string(),
                _ => format!("DAT {word}"),
            };
            let _ = writeln!(out, "{address:04}  {word:#06x}  {text}");
        }
        out
    }
}

impl From<Vec<Word>> for Program {
    fn from(words: Vec<Word>) -> Self {
        Self::new(words)
    }
}
