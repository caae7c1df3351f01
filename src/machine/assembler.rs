//! Assembly language parser and word compiler.
//!
//! Converts mnemonic source into the word sequence the VM loads at address 0.
//! Uses the [`for_each_mnemonic!`](crate::for_each_mnemonic) table (through
//! [`Mnemonic`]) to recognize instructions.
//!
//! # Syntax
//!
//! ```text
//! [label] MNEMONIC [operand]   // optional comment
//! ```
//!
//! - Mnemonics are uppercase (e.g. `LDA`, `OTC`)
//! - A leading token that is not a mnemonic declares a label for the line
//! - Operands are decimal literals (`12`) or label references (`$loop`)
//! - A missing operand means `0`
//! - `DAT value` places `value` itself in the output
//! - Comments start with `//`
//!
//! Labels resolve to the line's position among lines that emit a word, so
//! blank and comment-only lines never take an address.

use crate::machine::encoding::{self, DATA_MASK, Word};
use crate::machine::errors::MachineError;
use crate::machine::isa::{Encoding, Mnemonic};
use crate::machine::program::Program;
use crate::{error, warn};
use std::collections::HashMap;
use std::fmt::Write;
use std::fs;
use std::path::Path;

const COMMENT_MARKER: &str = "//";
const LABEL_SIGIL: char = '$';

/// Return the line/column/message triple for located assembly errors.
fn assembly_error_location(err: &MachineError) -> Option<(usize, usize, String)> {
    match err {
        MachineError::AssemblyError {
            line,
            offset,
            source,
        } => Some((*line, *offset, source.to_string())),
        _ => None,
    }
}

/// Formats a compiler-style diagnostic for assembly failures.
pub fn render_assembly_diagnostic(
    file: &str,
    source: &str,
    line: usize,
    offset: usize,
    message: &str,
) -> String {
    let mut diag = String::new();
    let _ = writeln!(diag, "error: {message}");
    let _ = writeln!(diag, " --> {file}:{line}:{offset}");

    if let Some(raw_line) = source.lines().nth(line.saturating_sub(1)) {
        let line_text = raw_line.trim_end_matches('\r');
        let underline = " ".repeat(offset.saturating_sub(1));
        let _ = writeln!(diag, "     |");
        let _ = writeln!(diag, "{:>4} | {}", line, line_text);
        let _ = writeln!(diag, "     | {}^", underline);
    }

    diag
}

/// Logs a diagnostic for an assembly error.
fn log_assembly_error(file: &str, source: &str, err: &MachineError) {
    match assembly_error_location(err) {
        Some((line, offset, message)) => {
            error!(
                "{}",
                render_assembly_diagnostic(file, source, line, offset, &message)
            );
        }
        None => error!("{err}"),
    }
}

/// Label definitions built by the first pass and consumed by the second.
#[derive(Debug, Default, Clone)]
pub struct LabelTable {
    labels: HashMap<String, usize>,
}

impl LabelTable {
    /// Creates an empty label table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `name` to `address`, rejecting redefinitions.
    pub fn define(&mut self, name: &str, address: usize) -> Result<(), MachineError> {
        if self.labels.contains_key(name) {
            return Err(MachineError::DuplicateLabel {
                label: name.to_string(),
            });
        }
        self.labels.insert(name.to_string(), address);
        Ok(())
    }

    /// Resolves a label to its address.
    pub fn resolve(&self, name: &str) -> Result<usize, MachineError> {
        self.labels
            .get(name)
            .copied()
            .ok_or_else(|| MachineError::UndefinedLabel {
                label: name.to_string(),
            })
    }

    /// Returns the number of labels.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Returns `true` if no label has been defined.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Operand of an assembly line before label resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    /// Decimal literal.
    Literal(u64),
    /// `$name` reference, stored without the sigil.
    Label(String),
}

/// One word-emitting source line after the first pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AsmLine {
    /// 1-based source line number.
    pub line: usize,
    /// Label declared on this line, if any.
    pub label: Option<String>,
    pub mnemonic: Mnemonic,
    pub operand: Operand,
    /// 1-based column of the operand (or of the mnemonic when absent).
    pub operand_offset: usize,
}

/// Output of the first pass: retained lines in address order plus labels.
#[derive(Debug, Clone, Default)]
pub struct ParsedSource {
    pub lines: Vec<AsmLine>,
    pub labels: LabelTable,
}

#[derive(Debug, Clone, Copy)]
struct Token<'a> {
    text: &'a str,
    /// 1-based column offset in the line.
    offset: usize,
}

/// Tokenize a single line of assembly.
///
/// Rules:
/// - `//` ends the line
/// - tokens are separated by spaces or tabs
fn tokenize(line: &str) -> Vec<Token<'_>> {
    let code = match line.find(COMMENT_MARKER) {
        Some(end) => &line[..end],
        None => line,
    };

    let mut out = Vec::with_capacity(3);
    let mut start: Option<usize> = None;
    for (i, ch) in code.char_indices() {
        if ch.is_whitespace() {
            if let Some(s) = start.take() {
                out.push(Token {
                    text: &code[s..i],
                    offset: s + 1,
                });
            }
        } else if start.is_none() {
            start = Some(i);
        }
    }
    if let Some(s) = start {
        out.push(Token {
            text: &code[s..],
            offset: s + 1,
        });
    }
    out
}

/// Parses an operand token: a decimal literal or a `$label` reference.
pub(crate) fn parse_operand(tok: &str) -> Result<Operand, MachineError> {
    if let Some(name) = tok.strip_prefix(LABEL_SIGIL) {
        if name.is_empty() {
            return Err(MachineError::InvalidOperand {
                token: tok.to_string(),
            });
        }
        return Ok(Operand::Label(name.to_string()));
    }

    if tok.is_empty() || !tok.bytes().all(|b| b.is_ascii_digit()) {
        return Err(MachineError::InvalidOperand {
            token: tok.to_string(),
        });
    }
    tok.parse::<u64>()
        .map(Operand::Literal)
        .map_err(|_| MachineError::OperandOutOfRange {
            value: u64::MAX,
            max: Word::MAX,
        })
}

/// Parses one source line.
///
/// Returns `Ok(None)` for lines with no tokens (blank or comment-only).
/// Errors carry the line number and column.
pub fn parse_line(line_no: usize, text: &str) -> Result<Option<AsmLine>, MachineError> {
    let tokens = tokenize(text);
    let Some(first) = tokens.first() else {
        return Ok(None);
    };

    let (label, mnemonic_idx) = if Mnemonic::from_name(first.text).is_some() {
        (None, 0)
    } else {
        match tokens.get(1) {
            Some(_) => (Some(first.text.to_string()), 1),
            None => {
                return Err(MachineError::MalformedLine {
                    text: text.trim().to_string(),
                }
                .at(line_no, first.offset));
            }
        }
    };

    let mnemonic_tok = tokens[mnemonic_idx];
    let mnemonic = Mnemonic::from_name(mnemonic_tok.text).ok_or_else(|| {
        MachineError::UnknownMnemonic {
            name: mnemonic_tok.text.to_string(),
        }
        .at(line_no, mnemonic_tok.offset)
    })?;

    let operands = &tokens[mnemonic_idx + 1..];
    if operands.len() > 1 {
        return Err(MachineError::TooManyOperands {
            actual: operands.len(),
        }
        .at(line_no, operands[1].offset));
    }

    let (operand, operand_offset) = match operands.first() {
        Some(tok) => (
            parse_operand(tok.text).map_err(|e| e.at(line_no, tok.offset))?,
            tok.offset,
        ),
        None => (Operand::Literal(0), mnemonic_tok.offset),
    };

    if let (Encoding::Fixed(..), Some(tok)) = (mnemonic.encoding(), operands.first()) {
        warn!(
            "line {line_no}: {mnemonic} takes no operand; `{}` is ignored",
            tok.text
        );
    }

    Ok(Some(AsmLine {
        line: line_no,
        label,
        mnemonic,
        operand,
        operand_offset,
    }))
}

/// First pass: parses every line and records label addresses.
///
/// A label's address is the number of word-emitting lines before it, which is
/// also the memory address the line occupies once loaded at address 0.
pub fn first_pass(source: &str) -> Result<ParsedSource, MachineError> {
    let mut parsed = ParsedSource::default();

    for (idx, text) in source.lines().enumerate() {
        let line_no = idx + 1;
        let Some(line) = parse_line(line_no, text)? else {
            continue;
        };

        if let Some(label) = &line.label {
            let column = text.find(label.as_str()).map_or(1, |c| c + 1);
            parsed
                .labels
                .define(label, parsed.lines.len())
                .map_err(|e| e.at(line_no, column))?;
        }
        parsed.lines.push(line);
    }

    Ok(parsed)
}

/// Encodes a single line with labels already known.
fn emit(line: &AsmLine, labels: &LabelTable) -> Result<Word, MachineError> {
    let value = match &line.operand {
        Operand::Literal(v) => *v,
        Operand::Label(name) => labels.resolve(name)? as u64,
    };

    match line.mnemonic.encoding() {
        Encoding::Data => Word::try_from(value).map_err(|_| MachineError::OperandOutOfRange {
            value,
            max: Word::MAX,
        }),
        Encoding::Opcode(op) => {
            let data = u16::try_from(value)
                .ok()
                .filter(|d| *d <= DATA_MASK)
                .ok_or(MachineError::OperandOutOfRange {
                    value,
                    max: DATA_MASK,
                })?;
            encoding::encode(op as u8, data)
        }
        Encoding::Fixed(op, selector) => encoding::encode(op as u8, selector),
    }
}

/// Second pass: resolves label references and emits one word per line.
///
/// Pure over its inputs, so resolution can be tested without the parser.
pub fn resolve(lines: &[AsmLine], labels: &LabelTable) -> Result<Vec<Word>, MachineError> {
    lines
        .iter()
        .map(|line| emit(line, labels).map_err(|e| e.at(line.line, line.operand_offset)))
        .collect()
}

/// Assemble a full source string into a program.
///
/// Runs both passes; the first failure aborts assembly and no partial
/// program is returned.
pub fn assemble_source(source: &str) -> Result<Program, MachineError> {
    assemble_source_with_name(source, "<source>")
}

/// Assembles source with an associated filename for error diagnostics.
fn assemble_source_with_name(source: &str, source_name: &str) -> Result<Program, MachineError> {
    let result = first_pass(source)
        .and_then(|parsed| resolve(&parsed.lines, &parsed.labels))
        .map(Program::new);

    if let Err(err) = &result {
        log_assembly_error(source_name, source, err);
    }

    result
}

/// Convenience: assemble directly from file path
pub fn assemble_file<P: AsRef<Path>>(path: P) -> Result<Program, MachineError> {
    let path_ref = path.as_ref();
    let source = fs::read_to_string(path_ref).map_err(|e| MachineError::IoError {
        path: path_ref.display().to_string(),
        source: e.to_string(),
    })?;
    assemble_source_with_name(&source, &path_ref.display().to_string())
}
