//! The Compiler module turns R1 source into a `Listing` of
//! accumulator-machine assembly.
//!
//! It is a single pass: the lexer feeds a lookahead token stream, and a
//! recursive descent parser emits instructions while it recognizes them.

pub mod code;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod stream;
pub mod symbols;

use std::io::BufRead;

pub use parser::Outcome;

/// Compiles everything `reader` yields. When `trace` is set every token is
/// also recorded in the listing as a comment.
pub fn compile<R: BufRead>(reader: R, trace: bool) -> Outcome {
    parser::Parser::new(lexer::Lexer::new(reader).trace(trace)).run()
}
