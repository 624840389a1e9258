//! Runtime implementation for `slrgen` transition tables.

pub mod definition;
pub mod parser;
pub mod tokens;
