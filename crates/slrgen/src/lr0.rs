//! Construction of the canonical LR(0) automaton.

use crate::{
    error::{ContractError, Error},
    grammar::{Grammar, SymbolID},
    item::{closure_of, goto, ItemSet},
    types::{Map, Queue, Set},
    util::display_fn,
};
use std::{fmt, hash::Hash};

#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateID {
    raw: u32,
}

impl fmt::Debug for StateID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S#{:03}", self.raw)
    }
}

impl StateID {
    /// The state created from the closure of the augmented item.
    pub const START: Self = Self::from_raw(0);

    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self { raw }
    }

    #[inline]
    pub const fn into_raw(self) -> u32 {
        self.raw
    }

    fn from_index(index: usize) -> Result<Self, ContractError> {
        u32::try_from(index).map(Self::from_raw).map_err(|_| {
            ContractError::InvalidState(format!("too many parser states ({})", index))
        })
    }

    pub(crate) fn index(self) -> usize {
        self.raw as usize
    }
}

/// A state of the LR(0) automaton.
///
/// Two states are equal when they hold the same set of items, whatever
/// their identifiers are.
#[derive(Debug, Clone)]
pub struct ParserState {
    id: StateID,
    items: ItemSet,
}

impl PartialEq for ParserState {
    fn eq(&self, other: &Self) -> bool {
        self.items == other.items
    }
}
impl Eq for ParserState {}

impl Hash for ParserState {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.items.hash(state)
    }
}

impl ParserState {
    pub fn id(&self) -> StateID {
        self.id
    }

    pub fn items(&self) -> &ItemSet {
        &self.items
    }

    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(move |f| {
            writeln!(f, "#### State {:?}", self.id)?;
            for item in &self.items {
                writeln!(f, "- {}", item.display(g))?;
            }
            Ok(())
        })
    }
}

/// The transition function `(state, symbol) -> state` of the automaton.
///
/// The edges are grouped by their source state.
#[derive(Debug, Default, Clone)]
pub struct TransitionMap {
    edges: Map<StateID, Map<SymbolID, StateID>>,
    len: usize,
}

impl TransitionMap {
    /// Record a transition. Each `(from, symbol)` pair can be recorded once.
    pub fn insert(
        &mut self,
        from: StateID,
        symbol: SymbolID,
        to: StateID,
    ) -> Result<(), ContractError> {
        let edges = self.edges.entry(from).or_default();
        if let Some(existing) = edges.get(&symbol) {
            return Err(ContractError::InvalidState(format!(
                "the transition from {:?} under {:?} is already recorded (to {:?})",
                from, symbol, existing
            )));
        }
        edges.insert(symbol, to);
        self.len += 1;
        Ok(())
    }

    pub fn get(&self, from: StateID, symbol: SymbolID) -> Option<StateID> {
        self.edges.get(&from)?.get(&symbol).copied()
    }

    pub fn contains(&self, from: StateID, symbol: SymbolID) -> bool {
        self.get(from, symbol).is_some()
    }

    /// The outgoing transitions of `from`, in the order they were recorded.
    pub fn transitions_from(
        &self,
        from: StateID,
    ) -> impl Iterator<Item = (SymbolID, StateID)> + '_ {
        self.edges
            .get(&from)
            .into_iter()
            .flat_map(|edges| edges.iter().map(|(symbol, to)| (*symbol, *to)))
    }

    pub fn iter(&self) -> impl Iterator<Item = (StateID, SymbolID, StateID)> + '_ {
        self.edges.iter().flat_map(|(from, edges)| {
            edges.iter().map(move |(symbol, to)| (*from, *symbol, *to))
        })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

#[derive(Debug, Clone)]
pub struct LR0Automaton {
    states: Vec<ParserState>,
    transitions: TransitionMap,
}

impl LR0Automaton {
    /// The states in creation order. The position of a state is its ID.
    pub fn states(&self) -> &[ParserState] {
        &self.states[..]
    }

    pub fn state(&self, id: StateID) -> Option<&ParserState> {
        self.states.get(id.index())
    }

    pub fn start_state(&self) -> StateID {
        StateID::START
    }

    pub fn transitions(&self) -> &TransitionMap {
        &self.transitions
    }

    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(move |f| {
            for (i, state) in self.states.iter().enumerate() {
                if i > 0 {
                    writeln!(f)?;
                }
                write!(f, "{}", state.display(g))?;
                for (symbol, to) in self.transitions.transitions_from(state.id) {
                    writeln!(f, "  {} => {:?}", g.symbol_name(symbol), to)?;
                }
            }
            Ok(())
        })
    }
}

/// Calculate the LR(0) automaton based on the specified grammar.
#[tracing::instrument(skip_all)]
pub fn lr0(g: &Grammar) -> Result<LR0Automaton, Error> {
    let mut item_sets = Set::<ItemSet>::default();
    item_sets.insert(closure_of(g, g.augmented_item()));

    let mut transitions = TransitionMap::default();
    let mut pending = Queue::default();
    pending.push(StateID::START);
    while let Some(current) = pending.pop() {
        for &symbol in g.symbols() {
            let items = &item_sets[current.index()];
            let next_items = goto(g, items, symbol);
            if next_items.is_empty() {
                continue;
            }

            let (index, added) = item_sets.insert_full(next_items);
            let next = StateID::from_index(index)?;
            if added {
                tracing::trace!(
                    "new state {:?} from {:?} under `{}'",
                    next,
                    current,
                    g.symbol_name(symbol)
                );
                pending.push(next);
            }
            transitions.insert(current, symbol, next)?;
        }
    }

    let states = item_sets
        .into_iter()
        .enumerate()
        .map(|(index, items)| {
            Ok(ParserState {
                id: StateID::from_index(index)?,
                items,
            })
        })
        .collect::<Result<Vec<_>, ContractError>>()?;
    tracing::debug!("LR(0) automaton has {} states", states.len());

    Ok(LR0Automaton {
        states,
        transitions,
    })
}
