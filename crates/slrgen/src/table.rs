//! Calculation of the SLR(1) transition table.

use crate::{
    error::{Conflict, ConflictError, ContractError, Error},
    first_follow::FirstFollow,
    grammar::{Grammar, NonterminalID, ProductionID, SymbolID, TerminalID},
    lr0::{lr0, LR0Automaton, ParserState, StateID, TransitionMap},
    types::Map,
    util::display_fn,
};
use slrgen_runtime::{
    definition::{ParseAction, ParseActionError, ParseTable},
    parser::Token,
};
use std::fmt;

/// The action that the parser performs in a state on a particular symbol.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum TransitionAction {
    /// Read the lookahead terminal and move to the specified state.
    Shift(StateID),

    /// Reduce by the specified production.
    Reduce(ProductionID),

    /// Move to the specified state after a reduction to the nonterminal.
    Goto(StateID),

    Accept,

    /// Reject the input.
    Error,
}

impl TransitionAction {
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error)
    }

    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(move |f| match self {
            Self::Shift(to) => write!(f, "shift({:?})", to),
            Self::Reduce(p) => write!(f, "reduce({})", g.production(*p).display(g)),
            Self::Goto(to) => write!(f, "goto({:?})", to),
            Self::Accept => f.write_str("accept"),
            Self::Error => f.write_str("error"),
        })
    }
}

#[derive(Debug, Copy, Clone)]
struct Reduction {
    head: NonterminalID,
    len: usize,
}

/// The complete decision table derived from an LR(0) automaton.
///
/// Every state has exactly one action for every symbol of the grammar.
#[derive(Debug)]
pub struct TransitionTable {
    automaton: LR0Automaton,
    rows: Vec<Map<SymbolID, TransitionAction>>,
    reductions: Map<ProductionID, Reduction>,
}

impl TransitionTable {
    pub fn states(&self) -> &[ParserState] {
        self.automaton.states()
    }

    pub fn transitions(&self) -> &TransitionMap {
        self.automaton.transitions()
    }

    pub fn start_state(&self) -> StateID {
        self.automaton.start_state()
    }

    /// The action in `state` on `symbol`.
    ///
    /// A symbol which does not belong to the grammar is always rejected.
    pub fn action(
        &self,
        state: StateID,
        symbol: SymbolID,
    ) -> Result<TransitionAction, ContractError> {
        let row = self.row(state)?;
        Ok(row.get(&symbol).copied().unwrap_or(TransitionAction::Error))
    }

    /// Every action of `state`, in the declaration order of the symbols.
    pub fn row(&self, state: StateID) -> Result<&Map<SymbolID, TransitionAction>, ContractError> {
        self.rows.get(state.index()).ok_or_else(|| {
            ContractError::InvalidState(format!(
                "the state {:?} is unknown for this transition table",
                state
            ))
        })
    }

    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(move |f| {
            for (i, row) in self.rows.iter().enumerate() {
                if i > 0 {
                    writeln!(f)?;
                }
                writeln!(f, "#### State S#{:03}", i)?;
                for (symbol, action) in row {
                    if !action.is_error() {
                        writeln!(f, "- {} => {}", g.symbol_name(*symbol), action.display(g))?;
                    }
                }
            }
            Ok(())
        })
    }
}

#[derive(Debug, Default)]
pub struct Config {
    fail_fast: bool,
}

impl Config {
    pub const fn new() -> Self {
        Self { fail_fast: false }
    }

    /// Stop at the first conflict and report only that one.
    pub fn fail_fast(&mut self) -> &mut Self {
        self.fail_fast = true;
        self
    }

    /// Collect the conflicts of every state before failing.
    ///
    /// This is the default.
    pub fn report_all_conflicts(&mut self) -> &mut Self {
        self.fail_fast = false;
        self
    }

    /// Build the LR(0) automaton of the grammar and derive its table.
    pub fn generate(&self, g: &Grammar) -> Result<TransitionTable, Error> {
        let automaton = lr0(g)?;
        self.build(g, &automaton)
    }

    /// Derive the table from an automaton built for the same grammar.
    #[tracing::instrument(skip_all)]
    pub fn build(&self, g: &Grammar, lr0: &LR0Automaton) -> Result<TransitionTable, Error> {
        let mut first_follow = FirstFollow::new(g);
        let accepting = g.augmented_item().advance_dot(g)?;

        let mut rows = Vec::with_capacity(lr0.states().len());
        let mut conflicts = Vec::new();
        for state in lr0.states() {
            let mut pending = PendingRow::new(g, state.id());

            for item in state.items() {
                let production = g.get_production(item.production).ok_or_else(|| {
                    ContractError::InvalidState(format!(
                        "{:?} refers to the production {:?} unknown to this grammar",
                        state.id(),
                        item.production
                    ))
                })?;
                match production.right().get(item.index) {
                    Some(&SymbolID::T(t)) => {
                        // superseded by Accept
                        if item.production == ProductionID::ACCEPT && t == TerminalID::EOI {
                            continue;
                        }
                        let next = lr0.transitions().get(state.id(), SymbolID::T(t)).ok_or_else(
                            || {
                                ContractError::InvalidState(format!(
                                    "missing transition from {:?} under `{}'",
                                    state.id(),
                                    g.symbol_name(SymbolID::T(t))
                                ))
                            },
                        )?;
                        pending.set(SymbolID::T(t), TransitionAction::Shift(next), &mut conflicts);
                    }
                    Some(SymbolID::N(..)) => (),
                    None if item.production == ProductionID::ACCEPT => (),
                    None => {
                        let follow = first_follow.follow_set(SymbolID::N(production.left()))?;
                        for t in follow.iter() {
                            pending.set(
                                SymbolID::T(t),
                                TransitionAction::Reduce(item.production),
                                &mut conflicts,
                            );
                        }
                    }
                }
            }

            if state.items().contains(&accepting) {
                pending.set(
                    SymbolID::T(TerminalID::EOI),
                    TransitionAction::Accept,
                    &mut conflicts,
                );
            }

            for (symbol, next) in lr0.transitions().transitions_from(state.id()) {
                if let SymbolID::N(..) = symbol {
                    pending.set(symbol, TransitionAction::Goto(next), &mut conflicts);
                }
            }

            rows.push(pending.finish());

            if self.fail_fast && !conflicts.is_empty() {
                conflicts.truncate(1);
                break;
            }
        }

        if !conflicts.is_empty() {
            for conflict in &conflicts {
                tracing::debug!("conflict: {}", conflict.display(g));
            }
            return Err(ConflictError { conflicts }.into());
        }

        let reductions = g
            .productions()
            .map(|(id, p)| {
                (
                    id,
                    Reduction {
                        head: p.left(),
                        len: p.len(),
                    },
                )
            })
            .collect();

        tracing::debug!("transition table has {} rows", rows.len());
        Ok(TransitionTable {
            automaton: lr0.clone(),
            rows,
            reductions,
        })
    }
}

struct PendingRow<'g> {
    grammar: &'g Grammar,
    state: StateID,
    actions: Map<SymbolID, TransitionAction>,
}

impl<'g> PendingRow<'g> {
    fn new(grammar: &'g Grammar, state: StateID) -> Self {
        Self {
            grammar,
            state,
            actions: Map::default(),
        }
    }

    fn set(&mut self, symbol: SymbolID, action: TransitionAction, conflicts: &mut Vec<Conflict>) {
        match self.actions.get(&symbol) {
            Some(existing) if *existing == action => (),
            Some(existing) => conflicts.push(Conflict {
                state: self.state,
                symbol,
                symbol_name: self.grammar.symbol_name(symbol).to_owned(),
                existing: *existing,
                incoming: action,
            }),
            None => {
                self.actions.insert(symbol, action);
            }
        }
    }

    fn finish(mut self) -> Map<SymbolID, TransitionAction> {
        self.grammar
            .symbols()
            .iter()
            .map(|symbol| {
                let action = self
                    .actions
                    .swap_remove(symbol)
                    .unwrap_or(TransitionAction::Error);
                (*symbol, action)
            })
            .collect()
    }
}

/// Derive the transition table of the automaton with the default config.
pub fn generate(g: &Grammar, lr0: &LR0Automaton) -> Result<TransitionTable, Error> {
    Config::new().build(g, lr0)
}

impl ParseTable for TransitionTable {
    type State = StateID;
    type Symbol = SymbolID;
    type Reduce = ProductionID;

    fn initial_state(&self) -> Self::State {
        self.start_state()
    }

    fn action(
        &self,
        current: Self::State,
        symbol: Self::Symbol,
    ) -> Result<ParseAction<Self::State, Self::Symbol, Self::Reduce>, ParseActionError> {
        let action = self
            .action(current, symbol)
            .map_err(|_| ParseActionError::IncorrectState)?;
        Ok(match action {
            TransitionAction::Shift(to) => ParseAction::Shift(to),
            TransitionAction::Reduce(p) => {
                let reduction = self
                    .reductions
                    .get(&p)
                    .ok_or(ParseActionError::IncorrectState)?;
                ParseAction::Reduce(p, SymbolID::N(reduction.head), reduction.len)
            }
            TransitionAction::Goto(to) => ParseAction::Goto(to),
            TransitionAction::Accept => ParseAction::Accept,
            TransitionAction::Error => ParseAction::Error,
        })
    }

    fn expected(&self, current: Self::State) -> Vec<Self::Symbol> {
        self.row(current)
            .map(|row| {
                row.iter()
                    .filter(|(symbol, action)| symbol.is_terminal() && !action.is_error())
                    .map(|(symbol, _)| *symbol)
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl Token<SymbolID> for TerminalID {
    fn as_symbol(&self) -> SymbolID {
        SymbolID::T(*self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::ConflictKind,
        grammar::{tests::expression, tests::symbol, SymbolID::*},
    };

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }

    #[test]
    fn expression_table_is_complete() {
        init_tracing();
        let g = expression();
        let table = Config::new().generate(&g).unwrap();
        eprintln!("{}", table.display(&g));

        assert_eq!(table.states().len(), 14);
        for state in table.states() {
            let row = table.row(state.id()).unwrap();
            assert_eq!(row.len(), g.symbols().len());
            assert!(row.keys().eq(g.symbols().iter()));
        }
    }

    #[test]
    fn expression_table_actions() {
        let g = expression();
        let table = Config::new().generate(&g).unwrap();
        let s0 = table.start_state();

        let id = symbol(&g, "id");
        let e = symbol(&g, "E");
        assert!(matches!(table.action(s0, id).unwrap(), TransitionAction::Shift(..)));
        assert!(matches!(table.action(s0, e).unwrap(), TransitionAction::Goto(..)));
        assert_eq!(table.action(s0, symbol(&g, "+")).unwrap(), TransitionAction::Error);
        assert_eq!(table.action(s0, symbol(&g, "$start")).unwrap(), TransitionAction::Error);

        let TransitionAction::Goto(after_s) = table.action(s0, symbol(&g, "S")).unwrap() else {
            panic!("expected goto");
        };
        assert_eq!(table.action(after_s, T(TerminalID::EOI)).unwrap(), TransitionAction::Accept);

        let TransitionAction::Goto(after_e) = table.action(s0, e).unwrap() else {
            panic!("expected goto");
        };
        assert!(matches!(
            table.action(after_e, symbol(&g, "+")).unwrap(),
            TransitionAction::Shift(..)
        ));
        assert!(matches!(
            table.action(after_e, T(TerminalID::EOI)).unwrap(),
            TransitionAction::Reduce(p) if g.production(p).display(&g).to_string() == "S -> E"
        ));

        let accept_count = table
            .states()
            .iter()
            .filter(|s| table.action(s.id(), T(TerminalID::EOI)).unwrap() == TransitionAction::Accept)
            .count();
        assert_eq!(accept_count, 1);
    }

    #[test]
    fn reduce_on_follow_set_only() {
        let g = expression();
        let table = Config::new().generate(&g).unwrap();
        let s0 = table.start_state();
        let TransitionAction::Shift(after_id) = table.action(s0, symbol(&g, "id")).unwrap() else {
            panic!("expected shift");
        };
        for &sym in g.symbols() {
            let action = table.action(after_id, sym).unwrap();
            match g.symbol_name(sym) {
                "+" | "*" | ")" | "$" => assert!(
                    matches!(action, TransitionAction::Reduce(p) if g.production(p).display(&g).to_string() == "F -> id")
                ),
                _ => assert_eq!(action, TransitionAction::Error),
            }
        }
    }

    #[test]
    fn unknown_state_and_symbol() {
        let g = expression();
        let table = Config::new().generate(&g).unwrap();
        assert!(matches!(
            table.action(StateID::from_raw(999), symbol(&g, "id")),
            Err(ContractError::InvalidState(..))
        ));
        assert_eq!(
            table
                .action(table.start_state(), T(TerminalID::from_raw(999)))
                .unwrap(),
            TransitionAction::Error
        );
    }

    #[test]
    fn duplicate_production_conflicts() {
        // S -> A, A -> x | x
        let g = Grammar::define(|g| {
            let x = g.terminal("x")?;
            let s = g.nonterminal("S")?;
            let a = g.nonterminal("A")?;
            g.rule(s, [N(a)])?;
            g.rule(a, [T(x)])?;
            g.rule(a, [T(x)])?;
            Ok(())
        })
        .unwrap();
        let err = Config::new().generate(&g).unwrap_err();
        let Error::Conflict(ConflictError { conflicts }) = err else {
            panic!("expected conflicts");
        };
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].kind(), ConflictKind::ReduceReduce);
        assert_eq!(conflicts[0].symbol_name, "$");
    }

    #[test]
    fn shift_reduce_conflict_is_reported() {
        // S -> E, E -> E + E | id
        let g = Grammar::define(|g| {
            let plus = g.terminal("+")?;
            let id = g.terminal("id")?;
            let s = g.nonterminal("S")?;
            let e = g.nonterminal("E")?;
            g.rule(s, [N(e)])?;
            g.rule(e, [N(e), T(plus), N(e)])?;
            g.rule(e, [T(id)])?;
            Ok(())
        })
        .unwrap();

        let err = Config::new().generate(&g).unwrap_err();
        let Error::Conflict(ConflictError { conflicts }) = err else {
            panic!("expected conflicts");
        };
        assert_eq!(conflicts.len(), 1);
        let conflict = &conflicts[0];
        assert_eq!(conflict.kind(), ConflictKind::ShiftReduce);
        assert_eq!(conflict.symbol_name, "+");
        eprintln!("{}", conflict.display(&g));
    }

    #[test]
    fn fail_fast_reports_first_conflict() {
        // S -> A | B, A -> x | y, B -> x | y
        let g = Grammar::define(|g| {
            let x = g.terminal("x")?;
            let y = g.terminal("y")?;
            let s = g.nonterminal("S")?;
            let a = g.nonterminal("A")?;
            let b = g.nonterminal("B")?;
            g.rule(s, [N(a)])?;
            g.rule(s, [N(b)])?;
            g.rule(a, [T(x)])?;
            g.rule(a, [T(y)])?;
            g.rule(b, [T(x)])?;
            g.rule(b, [T(y)])?;
            Ok(())
        })
        .unwrap();

        let all = match Config::new().report_all_conflicts().generate(&g) {
            Err(Error::Conflict(err)) => err.conflicts,
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        };
        assert_eq!(all.len(), 2);

        let first = match Config::new().fail_fast().generate(&g) {
            Err(Error::Conflict(err)) => err.conflicts,
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        };
        assert_eq!(first, all[..1]);
    }

    #[test]
    fn cyclic_follow_fails_generation() {
        // S -> a A, A -> b B | c, B -> d A
        let g = Grammar::define(|g| {
            let a = g.terminal("a")?;
            let b = g.terminal("b")?;
            let c = g.terminal("c")?;
            let d = g.terminal("d")?;
            let s_ = g.nonterminal("S")?;
            let a_ = g.nonterminal("A")?;
            let b_ = g.nonterminal("B")?;
            g.rule(s_, [T(a), N(a_)])?;
            g.rule(a_, [T(b), N(b_)])?;
            g.rule(a_, [T(c)])?;
            g.rule(b_, [T(d), N(a_)])?;
            Ok(())
        })
        .unwrap();
        let err = Config::new().generate(&g).unwrap_err();
        assert!(matches!(
            err,
            Error::Grammar(crate::error::GrammarError::CyclicFollow { .. })
        ));
    }

    #[test]
    fn automaton_of_another_grammar_is_rejected() {
        let g = expression();
        let small = Grammar::define(|g| {
            let x = g.terminal("x")?;
            let s = g.nonterminal("S")?;
            g.rule(s, [T(x)])?;
            Ok(())
        })
        .unwrap();

        let automaton = lr0(&g).unwrap();
        let err = generate(&small, &automaton).unwrap_err();
        assert!(matches!(err, Error::Contract(ContractError::InvalidState(..))));
    }

    #[test]
    fn table_serves_the_runtime() {
        let g = expression();
        let table = Config::new().generate(&g).unwrap();
        let s0 = ParseTable::initial_state(&table);
        assert_eq!(s0, StateID::START);

        let mut expected = ParseTable::expected(&table, s0);
        expected.sort();
        let mut want = vec![symbol(&g, "("), symbol(&g, "id")];
        want.sort();
        assert_eq!(expected, want);

        assert!(matches!(
            ParseTable::action(&table, StateID::from_raw(999), symbol(&g, "id")),
            Err(ParseActionError::IncorrectState)
        ));
        assert_eq!(TerminalID::EOI.as_symbol(), T(TerminalID::EOI));
    }
}
