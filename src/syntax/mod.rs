//! Syntax: the pest grammar and the parser that turns source text into a [`Program`](crate::ast::Program).

pub mod parser;

pub use parser::{parse, parse_str};
