//! Input and output ports of the machine.
//!
//! The engine never touches a console directly. `INP` pulls the next value
//! from an [`InputSource`]; `OUT` and `OTC` push text into an [`OutputSink`].
//! Tests use [`QueuedInput`] and [`OutputBuffer`]; the `mmc` binary wires
//! [`LineInput`] and [`StreamOutput`] to the terminal.
//!
//! # Output Chunks
//!
//! Output is grouped into chunks of at most `width` characters. Characters
//! are appended one at a time and a new chunk is opened only when the last
//! one is full, so consecutive outputs share a chunk (`"10"` then `"7"`
//! gives `"107"`) and longer numbers spill into the next chunk. Chunks are
//! never padded.

use crate::machine::errors::MachineError;
use crate::warn;
use std::collections::VecDeque;
use std::io::{self, BufRead, Write};

/// Default number of characters per output chunk.
pub const OUTPUT_WIDTH: usize = 4;

const INPUT_PROMPT: &str = "Input: ";

fn io_error(path: &str, err: io::Error) -> MachineError {
    MachineError::IoError {
        path: path.to_string(),
        source: err.to_string(),
    }
}

/// Synchronous source of values for the `INP` instruction.
///
/// Values are unreduced; the engine wraps them into a word.
pub trait InputSource {
    /// Returns the next value, blocking if necessary.
    fn next_value(&mut self) -> Result<i64, MachineError>;
}

/// Sink for text produced by `OUT` and `OTC`.
pub trait OutputSink {
    /// Appends `text` to the output.
    fn emit(&mut self, text: &str) -> Result<(), MachineError>;
}

impl<T: InputSource + ?Sized> InputSource for &mut T {
    fn next_value(&mut self) -> Result<i64, MachineError> {
        (**self).next_value()
    }
}

impl<T: OutputSink + ?Sized> OutputSink for &mut T {
    fn emit(&mut self, text: &str) -> Result<(), MachineError> {
        (**self).emit(text)
    }
}

/// Pre-supplied input values consumed front to back.
#[derive(Clone, Debug, Default)]
pub struct QueuedInput {
    values: VecDeque<i64>,
}

impl QueuedInput {
    pub fn new(values: impl IntoIterator<Item = i64>) -> Self {
        Self {
            values: values.into_iter().collect(),
        }
    }

    /// Appends a value to the back of the queue.
    pub fn push(&mut self, value: i64) {
        self.values.push_back(value);
    }

    /// Number of values not yet consumed.
    pub fn remaining(&self) -> usize {
        self.values.len()
    }
}

impl InputSource for QueuedInput {
    fn next_value(&mut self) -> Result<i64, MachineError> {
        self.values.pop_front().ok_or(MachineError::InputExhausted)
    }
}

/// Input source for programs that never execute `INP`.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoInput;

impl InputSource for NoInput {
    fn next_value(&mut self) -> Result<i64, MachineError> {
        Err(MachineError::InputExhausted)
    }
}

/// Interactive line reader.
///
/// Writes a prompt, reads one line and accepts it only if it is a non-empty
/// run of decimal digits; anything else is reported and the prompt repeats.
/// End of input fails with [`MachineError::InputExhausted`].
pub struct LineInput<R, W> {
    reader: R,
    prompt: W,
}

impl<R: BufRead, W: Write> LineInput<R, W> {
    pub fn new(reader: R, prompt: W) -> Self {
        Self { reader, prompt }
    }
}

impl LineInput<io::StdinLock<'static>, io::Stderr> {
    /// Reads from stdin, prompting on stderr so stdout carries only program output.
    pub fn stdin() -> Self {
        Self::new(io::stdin().lock(), io::stderr())
    }
}

impl<R: BufRead, W: Write> InputSource for LineInput<R, W> {
    fn next_value(&mut self) -> Result<i64, MachineError> {
        let mut line = String::new();
        loop {
            self.prompt
                .write_all(INPUT_PROMPT.as_bytes())
                .and_then(|_| self.prompt.flush())
                .map_err(|e| io_error("<prompt>", e))?;

            line.clear();
            let read = self
                .reader
                .read_line(&mut line)
                .map_err(|e| io_error("<input>", e))?;
            if read == 0 {
                return Err(MachineError::InputExhausted);
            }

            let text = line.trim();
            if !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit()) {
                match text.parse::<i64>() {
                    Ok(value) => return Ok(value),
                    Err(_) => warn!("input `{text}` is too large"),
                }
            } else {
                warn!("input `{text}` is not a non-negative decimal number");
            }
        }
    }
}

/// Captured output, split into chunks.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OutputBuffer {
    chunks: Vec<String>,
    width: usize,
}

impl Default for OutputBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputBuffer {
    /// Creates a buffer with [`OUTPUT_WIDTH`]-character chunks.
    pub fn new() -> Self {
        Self::with_width(OUTPUT_WIDTH)
    }

    /// Creates a buffer with `width`-character chunks. A width of 0 is treated as 1.
    pub fn with_width(width: usize) -> Self {
        Self {
            chunks: Vec::new(),
            width: width.max(1),
        }
    }

    /// Returns the chunks produced so far.
    pub fn lines(&self) -> &[String] {
        &self.chunks
    }

    /// Returns the whole output with chunk boundaries removed.
    pub fn text(&self) -> String {
        self.chunks.concat()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Discards all captured output.
    pub fn clear(&mut self) {
        self.chunks.clear();
    }
}

impl OutputSink for OutputBuffer {
    fn emit(&mut self, text: &str) -> Result<(), MachineError> {
        for ch in text.chars() {
            match self.chunks.last_mut() {
                Some(chunk) if chunk.chars().count() < self.width => chunk.push(ch),
                _ => self.chunks.push(ch.to_string()),
            }
        }
        Ok(())
    }
}

/// Writes output chunks to a stream, one chunk per line.
///
/// A line is terminated when the next character would start a new chunk, or
/// by [`StreamOutput::finish`].
pub struct StreamOutput<W> {
    writer: W,
    width: usize,
    column: usize,
}

impl<W: Write> StreamOutput<W> {
    pub fn new(writer: W, width: usize) -> Self {
        Self {
            writer,
            width: width.max(1),
            column: 0,
        }
    }

    /// Terminates the current chunk, if any, and flushes the stream.
    pub fn finish(&mut self) -> Result<(), MachineError> {
        if self.column > 0 {
            self.writer
                .write_all(b"\n")
                .map_err(|e| io_error("<output>", e))?;
            self.column = 0;
        }
        self.writer.flush().map_err(|e| io_error("<output>", e))
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> OutputSink for StreamOutput<W> {
    fn emit(&mut self, text: &str) -> Result<(), MachineError> {
        let mut buf = [0u8; 4];
        for ch in text.chars() {
            if self.column == self.width {
                self.writer
                    .write_all(b"\n")
                    .map_err(|e| io_error("<output>", e))?;
                self.column = 0;
            }
            self.writer
                .write_all(ch.encode_utf8(&mut buf).as_bytes())
                .map_err(|e| io_error("<output>", e))?;
            self.column += 1;
        }
        self.writer.flush().map_err(|e| io_error("<output>", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn queued_input_drains_in_order() {
        let mut input = QueuedInput::new([3, 4]);
        input.push(5);
        assert_eq!(input.next_value().unwrap(), 3);
        assert_eq!(input.next_value().unwrap(), 4);
        assert_eq!(input.remaining(), 1);
        assert_eq!(input.next_value().unwrap(), 5);
        assert_eq!(input.next_value(), Err(MachineError::InputExhausted));
    }

    #[test]
    fn no_input_is_always_exhausted() {
        assert_eq!(NoInput.next_value(), Err(MachineError::InputExhausted));
    }

    #[test]
    fn line_input_reprompts_on_garbage() {
        let reader = Cursor::new("abc\n-4\n\n 42 \n7\n");
        let mut prompt = Vec::new();
        let mut input = LineInput::new(reader, &mut prompt);
        assert_eq!(input.next_value().unwrap(), 42);
        assert_eq!(input.next_value().unwrap(), 7);
        assert_eq!(input.next_value(), Err(MachineError::InputExhausted));
        drop(input);
        let prompts = String::from_utf8(prompt).unwrap();
        assert_eq!(prompts.matches(INPUT_PROMPT).count(), 6);
    }

    #[test]
    fn buffer_chunks_without_padding() {
        let mut out = OutputBuffer::new();
        out.emit("10").unwrap();
        out.emit("7").unwrap();
        assert_eq!(out.lines(), ["107"]);
        out.emit("12345").unwrap();
        assert_eq!(out.lines(), ["1071", "2345"]);
        out.emit("A").unwrap();
        assert_eq!(out.lines(), ["1071", "2345", "A"]);
        assert_eq!(out.text(), "10712345A");
    }

    #[test]
    fn buffer_counts_characters_not_bytes() {
        let mut out = OutputBuffer::with_width(2);
        out.emit("éé").unwrap();
        out.emit("x").unwrap();
        assert_eq!(out.lines(), ["éé", "x"]);
    }

    #[test]
    fn stream_output_breaks_lines_per_chunk() {
        let mut out = StreamOutput::new(Vec::new(), 4);
        out.emit("10").unwrap();
        out.emit("7").unwrap();
        out.emit("65535").unwrap();
        out.finish().unwrap();
        assert_eq!(String::from_utf8(out.into_inner()).unwrap(), "1076\n5535\n");
    }

    #[test]
    fn stream_output_finish_on_boundary() {
        let mut out = StreamOutput::new(Vec::new(), 2);
        out.emit("ab").unwrap();
        out.finish().unwrap();
        out.finish().unwrap();
        assert_eq!(String::from_utf8(out.into_inner()).unwrap(), "ab\n");
    }
}
