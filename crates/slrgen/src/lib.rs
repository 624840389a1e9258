//! SLR(1) parser table generator.

pub mod error;
pub mod first_follow;
pub mod grammar;
pub mod item;
pub mod lr0;
pub mod table;
pub mod types;
pub mod util;

pub use crate::{
    error::Error,
    grammar::Grammar,
    table::{Config, TransitionTable},
};

/// Build the SLR(1) transition table of the grammar with the default config.
pub fn compute(g: &Grammar) -> Result<TransitionTable, Error> {
    Config::new().generate(g)
}
