//! Error types.

use crate::{
    grammar::{Grammar, SymbolID},
    lr0::StateID,
    table::TransitionAction,
    util::display_fn,
};
use std::fmt;

/// The grammar violates a structural invariant.
///
/// Raised while defining a grammar, or while analysing it when the
/// FIRST/FOLLOW recursion runs into a cycle it cannot resolve.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum GrammarError {
    #[error("the symbol name must not be empty")]
    EmptyName,

    #[error("the symbol name `{name}' has already been declared")]
    DuplicateName { name: String },

    #[error("the production for `{head}' has an empty right-hand side")]
    EmptyProduction { head: String },

    #[error("the head of a production must be a nonterminal, but `{name}' is a terminal")]
    TerminalHead { name: String },

    #[error("the reserved symbol `{name}' cannot appear in a user production")]
    ReservedSymbol { name: String },

    #[error("the symbol {symbol:?} is not declared in this grammar")]
    UndeclaredSymbol { symbol: SymbolID },

    #[error("too many {kind} declared in this grammar")]
    CapacityExceeded { kind: &'static str },

    #[error("missing root: every production head also occurs in some right-hand side")]
    MissingRoot,

    #[error("multiple roots: {}", names.join(", "))]
    MultipleRoots { names: Vec<String> },

    #[error("indirect left recursion detected while computing FIRST({name})")]
    IndirectLeftRecursion { name: String },

    #[error("cyclic dependency detected while computing FOLLOW({name})")]
    CyclicFollow { name: String },
}

/// The caller broke the contract of an operation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ContractError {
    #[error("invalid state: {}", _0)]
    InvalidState(String),

    #[error("invalid argument: {}", _0)]
    InvalidArgument(String),
}

/// Two different actions were derived for the same table cell.
#[derive(Debug, Clone, PartialEq)]
pub struct Conflict {
    pub state: StateID,
    pub symbol: SymbolID,
    pub symbol_name: String,
    pub existing: TransitionAction,
    pub incoming: TransitionAction,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ConflictKind {
    ShiftReduce,
    ReduceReduce,
    /// Any other pairing, e.g. accept against reduce.
    Other,
}

impl Conflict {
    pub fn kind(&self) -> ConflictKind {
        use TransitionAction::*;
        match (self.existing, self.incoming) {
            (Shift(..), Reduce(..)) | (Reduce(..), Shift(..)) => ConflictKind::ShiftReduce,
            (Reduce(..), Reduce(..)) => ConflictKind::ReduceReduce,
            _ => ConflictKind::Other,
        }
    }

    /// Render the conflict with symbol and production names resolved.
    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(move |f| {
            write!(
                f,
                "{:?} on `{}': {} vs {}",
                self.state,
                self.symbol_name,
                self.existing.display(g),
                self.incoming.display(g)
            )
        })
    }
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?} on `{}': {:?} vs {:?}",
            self.state, self.symbol_name, self.existing, self.incoming
        )
    }
}

/// The grammar is not SLR(1).
#[derive(Debug, thiserror::Error)]
#[error("detected {} conflict(s){}", .conflicts.len(), list_conflicts(.conflicts))]
pub struct ConflictError {
    pub conflicts: Vec<Conflict>,
}

fn list_conflicts(conflicts: &[Conflict]) -> String {
    conflicts.iter().map(|c| format!("\n- {}", c)).collect()
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("structural grammar error")]
    Grammar(
        #[from]
        #[source]
        GrammarError,
    ),

    #[error("contract violation")]
    Contract(
        #[from]
        #[source]
        ContractError,
    ),

    #[error("error during constructing the transition table")]
    Conflict(
        #[from]
        #[source]
        ConflictError,
    ),
}
