//! Derive macros for the mmc crate.
//!
//! Provides `#[derive(Error)]`, which turns an `#[error("...")]` message on
//! every variant into `Display` and `std::error::Error` implementations.

mod error;

use proc_macro::TokenStream;

/// Implements `Display` and `Error` from per-variant `#[error("...")]` messages.
#[proc_macro_derive(Error, attributes(error))]
pub fn derive_error(input: TokenStream) -> TokenStream {
    error::derive_error(input)
}
