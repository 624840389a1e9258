//! Calculation of FIRST and FOLLOW sets.
//!
//! Both sets are computed on demand and memoized per nonterminal. A
//! nonterminal whose computation is still running is marked as being in
//! progress, so that re-entering it is reported as a grammar error instead
//! of recursing forever.

use crate::{
    error::{ContractError, Error, GrammarError},
    grammar::{Grammar, NonterminalID, SymbolID, TerminalSet},
    types::Map,
};
use bit_vec::BitVec;

#[derive(Debug)]
pub struct FirstFollow<'g> {
    grammar: &'g Grammar,
    first_sets: Map<NonterminalID, TerminalSet>,
    follow_sets: Map<NonterminalID, TerminalSet>,
    first_in_progress: BitVec,
    follow_in_progress: BitVec,
}

impl<'g> FirstFollow<'g> {
    pub fn new(grammar: &'g Grammar) -> Self {
        let num_nonterminals = grammar.nonterminals().count();
        Self {
            grammar,
            first_sets: Map::default(),
            follow_sets: Map::default(),
            first_in_progress: BitVec::from_elem(num_nonterminals, false),
            follow_in_progress: BitVec::from_elem(num_nonterminals, false),
        }
    }

    pub fn grammar(&self) -> &'g Grammar {
        self.grammar
    }

    /// `FIRST(symbol)`, the terminals that can begin a derivation of `symbol`.
    pub fn first_set(&mut self, symbol: SymbolID) -> Result<TerminalSet, Error> {
        self.verify_symbol(symbol)?;
        match symbol {
            SymbolID::T(t) => Ok(Some(t).into_iter().collect()),
            SymbolID::N(n) => self.first_of(n),
        }
    }

    /// `FOLLOW(symbol)`, the terminals that can appear right after `symbol`
    /// in a sentential form derived from the augmented root.
    pub fn follow_set(&mut self, symbol: SymbolID) -> Result<TerminalSet, Error> {
        self.verify_symbol(symbol)?;
        match symbol {
            SymbolID::T(..) => Err(ContractError::InvalidArgument(format!(
                "FOLLOW is only defined for nonterminals, but `{}' is a terminal",
                self.grammar.symbol_name(symbol)
            ))
            .into()),
            SymbolID::N(n) => self.follow_of(n),
        }
    }

    fn verify_symbol(&self, symbol: SymbolID) -> Result<(), ContractError> {
        if !self.grammar.contains(symbol) {
            return Err(ContractError::InvalidArgument(format!(
                "the symbol {:?} does not belong to this grammar",
                symbol
            )));
        }
        Ok(())
    }

    fn first_of(&mut self, n: NonterminalID) -> Result<TerminalSet, Error> {
        if let Some(first) = self.first_sets.get(&n) {
            return Ok(first.clone());
        }

        let index = usize::from(n.into_raw());
        if self.first_in_progress.get(index).unwrap_or(false) {
            return Err(GrammarError::IndirectLeftRecursion {
                name: self.grammar.symbol_name(SymbolID::N(n)).to_owned(),
            }
            .into());
        }

        self.first_in_progress.set(index, true);
        let result = self.compute_first(n);
        self.first_in_progress.set(index, false);

        let first = result?;
        tracing::trace!(
            "FIRST({}) = {{{}}}",
            self.grammar.symbol_name(SymbolID::N(n)),
            self.names(&first)
        );
        self.first_sets.insert(n, first.clone());
        Ok(first)
    }

    fn compute_first(&mut self, n: NonterminalID) -> Result<TerminalSet, Error> {
        let g = self.grammar;
        let mut first = TerminalSet::default();
        for &id in g.productions_of(n) {
            match g.production(id).right().first() {
                // direct left recursion adds nothing new
                Some(SymbolID::N(head)) if *head == n => continue,
                Some(SymbolID::N(m)) => first.union_with(&self.first_of(*m)?),
                Some(SymbolID::T(t)) => {
                    first.insert(*t);
                }
                None => (),
            }
        }
        Ok(first)
    }

    fn follow_of(&mut self, n: NonterminalID) -> Result<TerminalSet, Error> {
        if let Some(follow) = self.follow_sets.get(&n) {
            return Ok(follow.clone());
        }

        let index = usize::from(n.into_raw());
        if self.follow_in_progress.get(index).unwrap_or(false) {
            return Err(GrammarError::CyclicFollow {
                name: self.grammar.symbol_name(SymbolID::N(n)).to_owned(),
            }
            .into());
        }

        self.follow_in_progress.set(index, true);
        let result = self.compute_follow(n);
        self.follow_in_progress.set(index, false);

        let follow = result?;
        tracing::trace!(
            "FOLLOW({}) = {{{}}}",
            self.grammar.symbol_name(SymbolID::N(n)),
            self.names(&follow)
        );
        self.follow_sets.insert(n, follow.clone());
        Ok(follow)
    }

    fn compute_follow(&mut self, n: NonterminalID) -> Result<TerminalSet, Error> {
        let g = self.grammar;
        let mut follow = TerminalSet::default();
        for (_, production) in g.productions() {
            let right = production.right();
            for (i, symbol) in right.iter().enumerate() {
                if *symbol != SymbolID::N(n) {
                    continue;
                }
                match right.get(i + 1) {
                    Some(next) => follow.union_with(&self.first_set(*next)?),
                    None if production.left() == n => (),
                    None => follow.union_with(&self.follow_of(production.left())?),
                }
            }
        }
        Ok(follow)
    }

    fn names(&self, set: &TerminalSet) -> String {
        set.iter()
            .map(|t| self.grammar.symbol_name(SymbolID::T(t)))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::{tests::expression, tests::symbol, SymbolID::*, TerminalID};

    fn names(g: &Grammar, set: &TerminalSet) -> Vec<String> {
        let mut names: Vec<_> = set
            .iter()
            .map(|t| g.symbol_name(T(t)).to_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn first_of_terminal_is_itself() {
        let g = expression();
        let mut ff = FirstFollow::new(&g);
        for (id, _) in g.terminals() {
            let first = ff.first_set(T(id)).unwrap();
            assert_eq!(first.iter().collect::<Vec<_>>(), [id]);
        }
    }

    #[test]
    fn first_sets_of_expression_grammar() {
        let g = expression();
        let mut ff = FirstFollow::new(&g);
        for name in ["S", "E", "T", "F"] {
            let first = ff.first_set(symbol(&g, name)).unwrap();
            assert_eq!(names(&g, &first), ["(", "id"], "FIRST({})", name);
        }
    }

    #[test]
    fn follow_sets_of_expression_grammar() {
        let g = expression();
        let mut ff = FirstFollow::new(&g);

        let follow = ff.follow_set(symbol(&g, "S")).unwrap();
        assert_eq!(names(&g, &follow), ["$"]);

        let follow = ff.follow_set(symbol(&g, "E")).unwrap();
        assert_eq!(names(&g, &follow), ["$", ")", "+"]);

        let follow = ff.follow_set(symbol(&g, "T")).unwrap();
        assert_eq!(names(&g, &follow), ["$", ")", "*", "+"]);

        let follow = ff.follow_set(symbol(&g, "F")).unwrap();
        assert_eq!(names(&g, &follow), ["$", ")", "*", "+"]);

        // memoized results are identical
        let again = ff.follow_set(symbol(&g, "E")).unwrap();
        assert_eq!(names(&g, &again), ["$", ")", "+"]);
    }

    #[test]
    fn follow_of_terminal_is_invalid() {
        let g = expression();
        let mut ff = FirstFollow::new(&g);
        let err = ff.follow_set(symbol(&g, "id")).unwrap_err();
        assert!(matches!(
            err,
            Error::Contract(ContractError::InvalidArgument(..))
        ));

        let err = ff.first_set(T(TerminalID::from_raw(100))).unwrap_err();
        assert!(matches!(
            err,
            Error::Contract(ContractError::InvalidArgument(..))
        ));
    }

    #[test]
    fn right_recursion_is_allowed() {
        // S -> L, L -> x , L | x
        let g = Grammar::define(|g| {
            let x = g.terminal("x")?;
            let comma = g.terminal(",")?;
            let s = g.nonterminal("S")?;
            let l = g.nonterminal("L")?;
            g.rule(s, [N(l)])?;
            g.rule(l, [T(x), T(comma), N(l)])?;
            g.rule(l, [T(x)])?;
            Ok(())
        })
        .unwrap();
        let mut ff = FirstFollow::new(&g);
        let follow = ff.follow_set(symbol(&g, "L")).unwrap();
        assert_eq!(names(&g, &follow), ["$"]);
        let first = ff.first_set(symbol(&g, "L")).unwrap();
        assert_eq!(names(&g, &first), ["x"]);
    }

    #[test]
    fn indirect_left_recursion() {
        // S -> A, A -> B a, B -> A b | c
        let g = Grammar::define(|g| {
            let a = g.terminal("a")?;
            let b = g.terminal("b")?;
            let c = g.terminal("c")?;
            let s_ = g.nonterminal("S")?;
            let a_ = g.nonterminal("A")?;
            let b_ = g.nonterminal("B")?;
            g.rule(s_, [N(a_)])?;
            g.rule(a_, [N(b_), T(a)])?;
            g.rule(b_, [N(a_), T(b)])?;
            g.rule(b_, [T(c)])?;
            Ok(())
        })
        .unwrap();

        let mut ff = FirstFollow::new(&g);
        for _ in 0..2 {
            let err = ff.first_set(symbol(&g, "S")).unwrap_err();
            assert!(matches!(
                err,
                Error::Grammar(GrammarError::IndirectLeftRecursion { name }) if name == "A"
            ));
        }
        assert!(ff.first_sets.is_empty());
        assert!(!ff.first_in_progress.any());
    }

    #[test]
    fn cyclic_follow() {
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

        let mut ff = FirstFollow::new(&g);
        for _ in 0..2 {
            let err = ff.follow_set(symbol(&g, "A")).unwrap_err();
            assert!(matches!(
                err,
                Error::Grammar(GrammarError::CyclicFollow { name }) if name == "A"
            ));
        }
        assert!(!ff.follow_sets.contains_key(&NonterminalID::from_raw(2)));
        assert!(!ff.follow_sets.contains_key(&NonterminalID::from_raw(3)));
        assert!(!ff.follow_in_progress.any());

        // unrelated sets are still available
        let follow = ff.follow_set(symbol(&g, "S")).unwrap();
        assert_eq!(names(&g, &follow), ["$"]);
    }
}
