//! A 16-bit teaching computer and its assembler.
//!
//! Source text goes through the two-pass [`assembler`] and becomes a
//! [`program::Program`], a plain sequence of words. The [`vm`] loads those
//! words at address 0 and runs them. The two halves share nothing but the
//! word format defined in [`encoding`] and [`isa`].
//!
//! # Architecture
//!
//! - **Memory**: 4096 words, zero-initialized, bounds-checked on every access
//! - **Registers**: A (accumulator), B and C
//! - **Instruction format**: one word, 4-bit opcode and 12-bit data field
//! - **Arithmetic**: unsigned, wrapping modulo 2^16
//! - **I/O**: injected [`vm::InputSource`] and [`vm::OutputSink`] ports
//!
//! # Modules
//!
//! - [`assembler`]: Source parsing, label resolution and diagnostics
//! - [`encoding`]: Word packing and wraparound arithmetic
//! - [`errors`]: Assembly and execution error types
//! - [`isa`]: Opcodes, mnemonics and decoded instructions
//! - [`program`]: Assembled program image and its file format
//! - [`vm`]: Execution engine, I/O ports and profiling

pub mod assembler;
pub mod encoding;
pub mod errors;
pub mod isa;
#[cfg(test)]
mod isa_static_check;
pub mod program;
pub mod vm;
