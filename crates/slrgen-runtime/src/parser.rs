//! Parser.

use crate::definition::{ParseAction, ParseActionError, ParseTable};
use std::{fmt, mem};

/// A trait for abstracting token symbols.
pub trait Token<TSym> {
    fn as_symbol(&self) -> TSym;
}

/// The parser driven based on the generated transition table.
pub struct Parser<TDef, TTok>
where
    TDef: ParseTable,
    TTok: Token<TDef::Symbol>,
{
    definition: TDef,
    state_stack: Vec<TDef::State>,
    item_stack: Vec<ParseItem<TTok, TDef::Symbol>>,
    parser_state: ParserState,
    peeked_token: Option<TTok>,
    position: usize,
    steps: usize,
    step_limit: Option<usize>,
}

impl<TDef, TTok> fmt::Debug for Parser<TDef, TTok>
where
    TDef: ParseTable + fmt::Debug,
    TTok: Token<TDef::Symbol> + fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Parser")
            .field("definition", &self.definition)
            .field("state_stack", &self.state_stack)
            .field("item_stack", &self.item_stack)
            .field("parser_state", &self.parser_state)
            .field("peeked_token", &self.peeked_token)
            .field("position", &self.position)
            .finish_non_exhaustive()
    }
}

#[derive(Debug)]
enum ParserState {
    Reading,
    Accepted,
}

impl<TDef, TTok> Parser<TDef, TTok>
where
    TDef: ParseTable,
    TTok: Token<TDef::Symbol>,
{
    /// Create an instance of `Parser` using the specified transition table.
    pub fn new(definition: TDef) -> Self {
        let initial_state = definition.initial_state();
        Self {
            definition,
            state_stack: vec![initial_state],
            item_stack: vec![],
            parser_state: ParserState::Reading,
            peeked_token: None,
            position: 0,
            steps: 0,
            step_limit: None,
        }
    }

    /// Abort parsing once the specified number of actions has been performed.
    pub fn with_step_limit(mut self, limit: usize) -> Self {
        self.step_limit = Some(limit);
        self
    }

    /// The zero-based index of the next token to be consumed.
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self.parser_state, ParserState::Accepted)
    }

    /// The terminal symbols acceptable in the current state.
    ///
    /// After a syntax error this describes what the parser was expecting.
    pub fn expected(&self) -> Vec<TDef::Symbol> {
        match self.state_stack.last() {
            Some(current) => self.definition.expected(*current),
            None => vec![],
        }
    }

    /// Discard the parsing progress and start over from the initial state.
    pub fn reset(&mut self) {
        self.state_stack.clear();
        self.state_stack.push(self.definition.initial_state());
        self.item_stack.clear();
        self.parser_state = ParserState::Reading;
        self.peeked_token = None;
        self.position = 0;
        self.steps = 0;
    }

    /// Consume some tokens and drive the state machine
    /// until it matches a certain production rule.
    ///
    /// On a reduction, `args` receives the items of the right-hand side.
    /// On acceptance, it receives the item of the root symbol.
    pub fn next_event<I, E>(
        &mut self,
        tokens: &mut I,
        args: &mut Vec<ParseItem<TTok, TDef::Symbol>>,
    ) -> Result<ParseEvent<TDef>, ParseError<E>>
    where
        I: Iterator<Item = Result<TTok, E>>,
        E: fmt::Display,
    {
        if self.is_accepted() {
            return Err(ParseError::Finished);
        }

        loop {
            self.count_step::<E>()?;

            let current = *self
                .state_stack
                .last()
                .ok_or_else(|| ParseError::EmptyNodeStack)?;

            if self.peeked_token.is_none() {
                self.peeked_token = tokens.next().transpose().map_err(ParseError::Lexer)?;
            }
            let lookahead = self
                .peeked_token
                .as_ref()
                .map(|t| t.as_symbol())
                .ok_or_else(|| ParseError::UnexpectedEOI)?;

            match self
                .definition
                .action(current, lookahead)
                .map_err(ParseError::ParserDef)?
            {
                ParseAction::Shift(n) => {
                    let t = self
                        .peeked_token
                        .take()
                        .ok_or_else(|| ParseError::UnexpectedEOI)?;
                    tracing::trace!("shift {:?} at {}, goto {:?}", lookahead, self.position, n);
                    self.item_stack.push(ParseItem::T(t));
                    self.state_stack.push(n);
                    self.position += 1;
                    continue;
                }

                ParseAction::Reduce(reduce, lhs, n) => {
                    args.clear();
                    args.resize_with(n, Default::default);
                    for i in 0..n {
                        self.state_stack
                            .pop()
                            .ok_or_else(|| ParseError::EmptyNodeStack)?;
                        let arg = self
                            .item_stack
                            .pop()
                            .ok_or_else(|| ParseError::EmptyItemStack)?;
                        args[n - i - 1] = arg;
                    }

                    let uncovered = *self
                        .state_stack
                        .last()
                        .ok_or_else(|| ParseError::EmptyNodeStack)?;
                    match self
                        .definition
                        .action(uncovered, lhs)
                        .map_err(ParseError::ParserDef)?
                    {
                        ParseAction::Goto(next) => {
                            tracing::trace!("reduce to {:?}, goto {:?}", lhs, next);
                            self.state_stack.push(next);
                            self.item_stack.push(ParseItem::N(lhs));
                        }
                        _ => return Err(ParseError::MissingGoto),
                    }

                    return Ok(ParseEvent::Reduce(reduce));
                }

                ParseAction::Accept => {
                    let arg = self
                        .item_stack
                        .pop()
                        .ok_or_else(|| ParseError::EmptyItemStack)?;
                    args.clear();
                    args.push(arg);

                    self.parser_state = ParserState::Accepted;
                    return Ok(ParseEvent::Accept);
                }

                // gotos are only taken right after a reduction
                ParseAction::Goto(..) => {
                    return Err(ParseError::ParserDef(ParseActionError::IncorrectSymbol));
                }

                ParseAction::Error => {
                    tracing::debug!("syntax error at {} on {:?}", self.position, lookahead);
                    return Err(ParseError::Syntax {
                        position: self.position,
                    });
                }
            }
        }
    }

    /// Drive the state machine until the input is accepted, and return
    /// the applied reductions in order.
    pub fn parse<I, E>(&mut self, tokens: &mut I) -> Result<Vec<TDef::Reduce>, ParseError<E>>
    where
        I: Iterator<Item = Result<TTok, E>>,
        E: fmt::Display,
    {
        let mut args = vec![];
        let mut reductions = vec![];
        loop {
            match self.next_event(tokens, &mut args)? {
                ParseEvent::Reduce(reduce) => reductions.push(reduce),
                ParseEvent::Accept => return Ok(reductions),
            }
        }
    }

    fn count_step<E: fmt::Display>(&mut self) -> Result<(), ParseError<E>> {
        self.steps += 1;
        match self.step_limit {
            Some(limit) if self.steps > limit => Err(ParseError::StepLimitExceeded { limit }),
            _ => Ok(()),
        }
    }
}

#[derive(Debug)]
#[non_exhaustive]
pub enum ParseItem<TTok, TSym> {
    T(TTok),
    N(TSym),

    #[doc(hidden)]
    __Empty,
}

impl<TTok, TSym> Default for ParseItem<TTok, TSym> {
    fn default() -> Self {
        Self::__Empty
    }
}

impl<TTok, TSym> ParseItem<TTok, TSym> {
    pub fn take(&mut self) -> Option<Self> {
        match mem::replace(self, Self::__Empty) {
            Self::__Empty => None,
            me => Some(me),
        }
    }
}

#[derive(Debug)]
pub enum ParseEvent<TDef>
where
    TDef: ParseTable,
{
    Reduce(TDef::Reduce),
    Accept,
}

#[derive(Debug, thiserror::Error)]
pub enum ParseError<L: fmt::Display> {
    #[error("from lexer: {}", _0)]
    Lexer(L),

    #[error("from parser definition: {}", _0)]
    ParserDef(ParseActionError),

    #[error("syntax error at token {}", position)]
    Syntax { position: usize },

    #[error("unexpected EOI")]
    UnexpectedEOI,

    #[error("missing goto after reduction")]
    MissingGoto,

    #[error("exceeded the step limit ({})", limit)]
    StepLimitExceeded { limit: usize },

    #[error("the input has already been accepted")]
    Finished,

    #[error("empty node stack")]
    EmptyNodeStack,

    #[error("empty item stack")]
    EmptyItemStack,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokens::TokenStream;
    use std::rc::Rc;

    /// Hand-written table of `S -> ( S ) | x`.
    ///
    /// S0: $start -> . S $   S1: $start -> S . $   S2: S -> ( . S )
    /// S3: S -> x .          S4: S -> ( S . )      S5: S -> ( S ) .
    #[derive(Debug)]
    struct Parens;

    const REDUCE_PAREN: u8 = 1;
    const REDUCE_X: u8 = 2;

    impl ParseTable for Parens {
        type State = u8;
        type Symbol = char;
        type Reduce = u8;

        fn initial_state(&self) -> u8 {
            0
        }

        fn action(&self, current: u8, symbol: char) -> Result<ParseAction<u8, char, u8>, ParseActionError> {
            use ParseAction::*;
            Ok(match (current, symbol) {
                (0 | 2, '(') => Shift(2),
                (0 | 2, 'x') => Shift(3),
                (0, 'S') => Goto(1),
                (2, 'S') => Goto(4),
                (1, '$') => Accept,
                (3, ')' | '$') => Reduce(REDUCE_X, 'S', 1),
                (4, ')') => Shift(5),
                (5, ')' | '$') => Reduce(REDUCE_PAREN, 'S', 3),
                (0..=5, _) => Error,
                _ => return Err(ParseActionError::IncorrectState),
            })
        }

        fn expected(&self, current: u8) -> Vec<char> {
            ['(', ')', 'x', '$']
                .into_iter()
                .filter(|c| !matches!(self.action(current, *c), Ok(ParseAction::Error) | Err(..)))
                .collect()
        }
    }

    impl Token<char> for char {
        fn as_symbol(&self) -> char {
            *self
        }
    }

    fn chars(input: &str) -> Vec<char> {
        input.chars().collect()
    }

    #[test]
    fn accepts_nested_input() {
        let input = chars("((x))$");
        let mut parser = Parser::new(Parens);
        let reductions = parser.parse(&mut TokenStream::new(&input)).unwrap();
        assert_eq!(reductions, [REDUCE_X, REDUCE_PAREN, REDUCE_PAREN]);
        assert!(parser.is_accepted());
        // `$` is never shifted
        assert_eq!(parser.position(), 5);
    }

    #[test]
    fn reduce_hands_over_arguments() {
        let input = chars("(x)$");
        let mut tokens = TokenStream::new(&input);
        let mut parser = Parser::new(&Parens);
        let mut args = vec![];

        let event = parser.next_event(&mut tokens, &mut args).unwrap();
        assert!(matches!(event, ParseEvent::Reduce(REDUCE_X)));
        assert!(matches!(args[..], [ParseItem::T('x')]));

        let event = parser.next_event(&mut tokens, &mut args).unwrap();
        assert!(matches!(event, ParseEvent::Reduce(REDUCE_PAREN)));
        assert!(matches!(
            args[..],
            [ParseItem::T('('), ParseItem::N('S'), ParseItem::T(')')]
        ));
        assert!(args[1].take().is_some());
        assert!(args[1].take().is_none());

        let event = parser.next_event(&mut tokens, &mut args).unwrap();
        assert!(matches!(event, ParseEvent::Accept));
        assert!(matches!(args[..], [ParseItem::N('S')]));

        let err = parser.next_event(&mut tokens, &mut args).unwrap_err();
        assert!(matches!(err, ParseError::Finished));
    }

    #[test]
    fn syntax_error_reports_position() {
        let input = chars("(x$");
        let mut parser = Parser::new(Rc::new(Parens));
        let err = parser.parse(&mut TokenStream::new(&input)).unwrap_err();
        assert!(matches!(err, ParseError::Syntax { position: 2 }));
        assert_eq!(parser.expected(), [')']);
    }

    #[test]
    fn missing_end_of_input() {
        let input = chars("(x)");
        let mut parser = Parser::new(Parens);
        let err = parser.parse(&mut TokenStream::new(&input)).unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedEOI));
    }

    #[test]
    fn lexer_error_is_propagated() {
        let mut tokens = vec![Ok('('), Err("bad token")].into_iter();
        let mut parser = Parser::new(Parens);
        let err = parser.parse(&mut tokens).unwrap_err();
        assert!(matches!(err, ParseError::Lexer("bad token")));
        assert_eq!(err.to_string(), "from lexer: bad token");
    }

    #[test]
    fn step_limit_is_enforced() {
        let input = chars("((((x))))$");
        let mut parser = Parser::new(Parens).with_step_limit(5);
        let err = parser.parse(&mut TokenStream::new(&input)).unwrap_err();
        assert!(matches!(err, ParseError::StepLimitExceeded { limit: 5 }));

        parser.reset();
        let mut parser = Parser::new(Parens).with_step_limit(100);
        assert!(parser.parse(&mut TokenStream::new(&input)).is_ok());
    }

    #[test]
    fn reset_starts_over() {
        let mut parser = Parser::new(Parens);
        let bad = chars("x x");
        assert!(parser.parse(&mut TokenStream::new(&bad)).is_err());

        parser.reset();
        let good = chars("x$");
        assert_eq!(
            parser.parse(&mut TokenStream::new(&good)).unwrap(),
            [REDUCE_X]
        );
    }
}
