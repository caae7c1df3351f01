//! MMC library.
//!
//! Provides a small 16-bit computer: an assembler for its mnemonic language
//! and a virtual machine that executes the assembled words.

pub mod utils;

pub mod config;
pub mod machine;
