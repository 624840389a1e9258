//! Parser definition.

use std::fmt;

/// The trait for abstracting the generated SLR(1) transition table.
pub trait ParseTable {
    /// The number to identify the state of the automaton.
    type State: Copy + fmt::Debug;

    /// The number to identify the terminal/nonterminal symbols.
    type Symbol: Copy + fmt::Debug;

    /// The context value corresponding to the matched production rule.
    type Reduce;

    /// Return the initial state number.
    fn initial_state(&self) -> Self::State;

    /// Return the action corresponding to the specified state number and
    /// symbol.
    ///
    /// The end of input is an ordinary terminal which the token stream is
    /// expected to yield.
    fn action(
        &self,
        current: Self::State,
        symbol: Self::Symbol,
    ) -> Result<ParseAction<Self::State, Self::Symbol, Self::Reduce>, ParseActionError>;

    /// Return the terminal symbols which are not rejected in the specified state.
    fn expected(&self, current: Self::State) -> Vec<Self::Symbol>;
}

impl<T: ?Sized> ParseTable for &T
where
    T: ParseTable,
{
    type State = T::State;
    type Symbol = T::Symbol;
    type Reduce = T::Reduce;

    fn initial_state(&self) -> Self::State {
        (**self).initial_state()
    }

    fn action(
        &self,
        current: Self::State,
        symbol: Self::Symbol,
    ) -> Result<ParseAction<Self::State, Self::Symbol, Self::Reduce>, ParseActionError> {
        (**self).action(current, symbol)
    }

    fn expected(&self, current: Self::State) -> Vec<Self::Symbol> {
        (**self).expected(current)
    }
}

impl<T: ?Sized> ParseTable for std::rc::Rc<T>
where
    T: ParseTable,
{
    type State = T::State;
    type Symbol = T::Symbol;
    type Reduce = T::Reduce;

    fn initial_state(&self) -> Self::State {
        (**self).initial_state()
    }

    fn action(
        &self,
        current: Self::State,
        symbol: Self::Symbol,
    ) -> Result<ParseAction<Self::State, Self::Symbol, Self::Reduce>, ParseActionError> {
        (**self).action(current, symbol)
    }

    fn expected(&self, current: Self::State) -> Vec<Self::Symbol> {
        (**self).expected(current)
    }
}

impl<T: ?Sized> ParseTable for std::sync::Arc<T>
where
    T: ParseTable,
{
    type State = T::State;
    type Symbol = T::Symbol;
    type Reduce = T::Reduce;

    fn initial_state(&self) -> Self::State {
        (**self).initial_state()
    }

    fn action(
        &self,
        current: Self::State,
        symbol: Self::Symbol,
    ) -> Result<ParseAction<Self::State, Self::Symbol, Self::Reduce>, ParseActionError> {
        (**self).action(current, symbol)
    }

    fn expected(&self, current: Self::State) -> Vec<Self::Symbol> {
        (**self).expected(current)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ParseAction<TState, TSymbol, TReduce> {
    /// Consume the lookahead token and push the state.
    Shift(TState),

    /// Pop the given number of states and items, then go to the state
    /// of the left-hand side symbol.
    Reduce(TReduce, TSymbol, usize),

    /// Push the state after a reduction.
    Goto(TState),

    Accept,

    /// Reject the lookahead symbol.
    Error,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseActionError {
    #[error("incorrect state")]
    IncorrectState,

    #[error("incorrect symbol")]
    IncorrectSymbol,
}
