use mmc_derive::Error;

/// Coarse classification of [`MachineError`] values.
///
/// Callers that only care about the failure family (e.g. "was this a bad
/// label or a bad address?") match on the kind instead of individual variants.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    /// Malformed assembly line or ambiguous operand.
    Syntax,
    /// Unknown or duplicated label.
    Name,
    /// Address, operand or value outside its valid bounds.
    Range,
    /// Opcode/selector combination outside the dispatch table.
    InvalidInstruction,
    /// Program larger than memory.
    Capacity,
    /// Input source has no more values.
    Input,
    /// Step budget exhausted.
    Limit,
    /// File or console failure.
    Io,
    /// Malformed program image.
    Decode,
    /// Malformed configuration value.
    Config,
}

/// Errors that can occur during assembly, loading or execution.
#[derive(Debug, Error, Clone, Eq, PartialEq)]
pub enum MachineError {
    /// Line whose first token is neither a mnemonic nor a label followed by one.
    #[error("malformed line: expected `[label] MNEMONIC [operand]`, got `{text}`")]
    MalformedLine { text: String },
    /// Label followed by a token that is not a mnemonic.
    #[error("unknown mnemonic {name}")]
    UnknownMnemonic { name: String },
    /// More than one operand after the mnemonic.
    #[error("too many operands: expected at most 1, got {actual}")]
    TooManyOperands { actual: usize },
    /// Operand that is neither a decimal literal nor a `$label` reference.
    #[error("invalid operand {token}: expected a decimal literal or a $label reference")]
    InvalidOperand { token: String },
    /// Resolved operand does not fit the field it is encoded into.
    #[error("operand {value} out of range (max {max})")]
    OperandOutOfRange { value: u64, max: u16 },
    /// Label declared more than once.
    #[error("duplicate label: {label}")]
    DuplicateLabel { label: String },
    /// Reference to a label that is never declared.
    #[error("undefined label: {label}")]
    UndefinedLabel { label: String },
    /// Assembly error with source location.
    #[error("line {line}:{offset}: {source}")]
    AssemblyError {
        line: usize,
        offset: usize,
        source: Box<MachineError>,
    },
    /// Memory access outside `[0, size)`.
    #[error("address {address} out of range (memory holds {size} words)")]
    AddressOutOfRange { address: usize, size: usize },
    /// Value that does not fit a 16-bit word.
    #[error("value {value} out of range for a 16-bit word")]
    ValueOutOfRange { value: i64 },
    /// Register A holds a value with no character representation.
    #[error("value {value} is not a valid character code point")]
    InvalidCharacter { value: u16 },
    /// Fetched word decodes to an opcode/selector pair outside the dispatch table.
    #[error("invalid instruction {word:#06x} at address {address} (opcode {opcode}, selector {data})")]
    InvalidInstruction {
        word: u16,
        opcode: u8,
        data: u16,
        address: usize,
    },
    /// Program does not fit in memory.
    #[error("program of {len} words exceeds memory capacity of {capacity} words")]
    ProgramTooLarge { len: usize, capacity: usize },
    /// An input instruction ran with no value available.
    #[error("input exhausted")]
    InputExhausted,
    /// Run exceeded its step budget.
    #[error("step limit of {limit} instructions exceeded")]
    StepLimitExceeded { limit: u64 },
    /// File or console failure.
    #[error("io error on {path}: {source}")]
    IoError { path: String, source: String },
    /// Failed to decode a program image.
    #[error("decoding error: {reason}")]
    DecodeError { reason: String },
    /// Environment or command-line setting with an unusable value.
    #[error("invalid value `{value}` for {key}: {reason}")]
    InvalidConfig {
        key: String,
        value: String,
        reason: &'static str,
    },
}

impl MachineError {
    /// Returns the failure family of this error.
    ///
    /// Located assembly errors report the kind of the error they wrap.
    pub fn kind(&self) -> ErrorKind {
        match self {
            MachineError::MalformedLine { .. }
            | MachineError::UnknownMnemonic { .. }
            | MachineError::TooManyOperands { .. }
            | MachineError::InvalidOperand { .. } => ErrorKind::Syntax,
            MachineError::DuplicateLabel { .. } | MachineError::UndefinedLabel { .. } => {
                ErrorKind::Name
            }
            MachineError::OperandOutOfRange { .. }
            | MachineError::AddressOutOfRange { .. }
            | MachineError::ValueOutOfRange { .. }
            | MachineError::InvalidCharacter { .. } => ErrorKind::Range,
            MachineError::InvalidInstruction { .. } => ErrorKind::InvalidInstruction,
            MachineError::ProgramTooLarge { .. } => ErrorKind::Capacity,
            MachineError::InputExhausted => ErrorKind::Input,
            MachineError::StepLimitExceeded { .. } => ErrorKind::Limit,
            MachineError::IoError { .. } => ErrorKind::Io,
            MachineError::DecodeError { .. } => ErrorKind::Decode,
            MachineError::InvalidConfig { .. } => ErrorKind::Config,
            MachineError::AssemblyError { source, .. } => source.kind(),
        }
    }

    /// Attaches a 1-based source position to an assembly error.
    pub(crate) fn at(self, line: usize, offset: usize) -> Self {
        MachineError::AssemblyError {
            line,
            offset,
            source: Box::new(self),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn located_errors_keep_their_kind() {
        let err = MachineError::DuplicateLabel {
            label: "loop".into(),
        }
        .at(3, 1);
        assert_eq!(err.kind(), ErrorKind::Name);
        assert_eq!(err.to_string(), "line 3:1: duplicate label: loop");
    }

    #[test]
    fn display_formats_hex_words() {
        let err = MachineError::InvalidInstruction {
            word: 0x6003,
            opcode: 6,
            data: 3,
            address: 2,
        };
        assert_eq!(
            err.to_string(),
            "invalid instruction 0x6003 at address 2 (opcode 6, selector 3)"
        );
        assert_eq!(err.kind(), ErrorKind::InvalidInstruction);
    }

    #[test]
    fn unit_variant_display() {
        assert_eq!(MachineError::InputExhausted.to_string(), "input exhausted");
        assert_eq!(MachineError::InputExhausted.kind(), ErrorKind::Input);
    }

    #[test]
    fn capacity_and_range_kinds() {
        let err = MachineError::ProgramTooLarge {
            len: 4097,
            capacity: 4096,
        };
        assert_eq!(err.kind(), ErrorKind::Capacity);
        let err = MachineError::AddressOutOfRange {
            address: 4096,
            size: 4096,
        };
        assert_eq!(err.kind(), ErrorKind::Range);
    }
}
