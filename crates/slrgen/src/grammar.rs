//! Grammar types.

use crate::{
    error::GrammarError,
    item::Item,
    types::{Map, Set},
    util::display_fn,
};
use std::{fmt, sync::OnceLock};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct TerminalID {
    raw: u16,
}

impl TerminalID {
    /// Reserved symbol used as a terminal symbol that means the end of input.
    pub const EOI: Self = Self::from_raw(0);

    const OFFSET: u16 = 1;

    #[inline]
    pub const fn from_raw(raw: u16) -> Self {
        Self { raw }
    }

    #[inline]
    pub const fn into_raw(self) -> u16 {
        self.raw
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TerminalSet {
    inner: bit_set::BitSet,
}

impl TerminalSet {
    pub fn contains(&self, id: TerminalID) -> bool {
        self.inner.contains(id.into_raw().into())
    }
    pub fn insert(&mut self, id: TerminalID) -> bool {
        self.inner.insert(id.into_raw().into())
    }
    pub fn union_with(&mut self, other: &Self) {
        self.inner.union_with(&other.inner)
    }
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
    pub fn len(&self) -> usize {
        self.inner.len()
    }
    pub fn iter(&self) -> impl Iterator<Item = TerminalID> + '_ {
        // every member was inserted from a `u16`
        self.inner
            .iter()
            .map(|raw| TerminalID::from_raw(raw as u16))
    }
}

impl FromIterator<TerminalID> for TerminalSet {
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = TerminalID>,
    {
        Self {
            inner: iter.into_iter().map(|t| t.into_raw().into()).collect(),
        }
    }
}

#[derive(Debug)]
pub struct Terminal {
    name: String,
}
impl Terminal {
    pub fn name(&self) -> &str {
        &self.name
    }
}
impl fmt::Display for Terminal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct NonterminalID {
    raw: u16,
}

impl NonterminalID {
    /// Reserved symbol used as the head of the augmented production.
    pub const START: Self = Self::from_raw(0);

    const OFFSET: u16 = 1;

    #[inline]
    pub const fn from_raw(raw: u16) -> Self {
        Self { raw }
    }

    #[inline]
    pub const fn into_raw(self) -> u16 {
        self.raw
    }
}

#[derive(Debug)]
pub struct Nonterminal {
    name: String,
}
impl Nonterminal {
    pub fn name(&self) -> &str {
        &self.name
    }
}
impl fmt::Display for Nonterminal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SymbolID {
    T(TerminalID),
    N(NonterminalID),
}

impl SymbolID {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::T(..))
    }
}

impl From<TerminalID> for SymbolID {
    fn from(id: TerminalID) -> Self {
        Self::T(id)
    }
}

impl From<NonterminalID> for SymbolID {
    fn from(id: NonterminalID) -> Self {
        Self::N(id)
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct ProductionID {
    raw: u16,
}

impl ProductionID {
    /// The augmented production `$start -> Root $`.
    pub const ACCEPT: Self = Self::new(0);

    const OFFSET: u16 = 1;

    #[inline]
    const fn new(raw: u16) -> Self {
        Self { raw }
    }

    #[inline]
    pub const fn into_raw(self) -> u16 {
        self.raw
    }
}

impl fmt::Debug for ProductionID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P#{:03}", self.raw)
    }
}

/// The type that represents a production rule in grammar.
#[derive(Debug)]
pub struct Production {
    id: ProductionID,
    left: NonterminalID,
    right: Vec<SymbolID>,
    items: OnceLock<Vec<Item>>,
}

impl PartialEq for Production {
    fn eq(&self, other: &Self) -> bool {
        self.left == other.left && self.right == other.right
    }
}
impl Eq for Production {}

impl Production {
    pub fn id(&self) -> ProductionID {
        self.id
    }

    /// Return the left-hand side of this production.
    pub fn left(&self) -> NonterminalID {
        self.left
    }

    /// Return the right-hand side of this production.
    pub fn right(&self) -> &[SymbolID] {
        &self.right[..]
    }

    pub fn len(&self) -> usize {
        self.right.len()
    }

    /// Every item of this production, from the dot at the beginning to
    /// the dot at the end. Derived on first use.
    pub fn items(&self) -> &[Item] {
        self.items.get_or_init(|| {
            (0..=self.right.len())
                .map(|index| Item::new(self.id, index))
                .collect()
        })
    }

    // `"LHS -> R1 R2 R3"`
    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(move |f| {
            write!(f, "{} ->", g.nonterminals[&self.left])?;
            for symbol in &self.right {
                write!(f, " {}", g.symbol_name(*symbol))?;
            }
            Ok(())
        })
    }
}

/// The grammar definition used to derive the parser tables.
///
/// A `Grammar` is immutable once defined and always contains the augmented
/// production `$start -> Root $`, where `Root` is the single nonterminal
/// which heads some production but never occurs in a right-hand side.
#[derive(Debug)]
pub struct Grammar {
    terminals: Map<TerminalID, Terminal>,
    nonterminals: Map<NonterminalID, Nonterminal>,
    productions: Map<ProductionID, Production>,
    by_head: Map<NonterminalID, Vec<ProductionID>>,
    symbols: Vec<SymbolID>,
    root: NonterminalID,
}

impl fmt::Display for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "## terminals:")?;
        for terminal in self.terminals.values() {
            writeln!(f, "{}", terminal)?;
        }

        writeln!(f, "\n## nonterminals:")?;
        for (id, nonterminal) in &self.nonterminals {
            write!(f, "{}", nonterminal)?;
            if *id == self.root {
                write!(f, " (root)")?;
            }
            writeln!(f)?;
        }

        writeln!(f, "\n## productions:")?;
        for production in self.productions.values() {
            writeln!(f, "{}", production.display(self))?;
        }

        Ok(())
    }
}

impl Grammar {
    /// Define a grammar using the specified function.
    pub fn define<F>(f: F) -> Result<Self, GrammarError>
    where
        F: FnOnce(&mut GrammarDef) -> Result<(), GrammarError>,
    {
        let mut def = GrammarDef::default();
        f(&mut def)?;
        def.end()
    }

    pub fn terminals(&self) -> impl Iterator<Item = (TerminalID, &Terminal)> + '_ {
        self.terminals.iter().map(|(id, t)| (*id, t))
    }

    pub fn nonterminals(&self) -> impl Iterator<Item = (NonterminalID, &Nonterminal)> + '_ {
        self.nonterminals.iter().map(|(id, n)| (*id, n))
    }

    pub fn productions(&self) -> impl Iterator<Item = (ProductionID, &Production)> + '_ {
        self.productions.iter().map(|(id, p)| (*id, p))
    }

    /// The production identified by `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` was issued by another grammar. Use
    /// [`get_production`](Self::get_production) for IDs of unknown origin.
    pub fn production(&self, id: ProductionID) -> &Production {
        &self.productions[&id]
    }

    pub fn get_production(&self, id: ProductionID) -> Option<&Production> {
        self.productions.get(&id)
    }

    /// The productions whose head is `n`, in declaration order.
    pub fn productions_of(&self, n: NonterminalID) -> &[ProductionID] {
        self.by_head.get(&n).map_or(&[], |ids| &ids[..])
    }

    /// Every symbol of this grammar in its fixed declaration order:
    /// `$`, `$start`, then the user declarations.
    pub fn symbols(&self) -> &[SymbolID] {
        &self.symbols[..]
    }

    pub fn contains(&self, symbol: SymbolID) -> bool {
        match symbol {
            SymbolID::T(t) => self.terminals.contains_key(&t),
            SymbolID::N(n) => self.nonterminals.contains_key(&n),
        }
    }

    pub fn root(&self) -> NonterminalID {
        self.root
    }

    pub fn end_of_stream(&self) -> TerminalID {
        TerminalID::EOI
    }

    /// The item `$start -> . Root $` from which the automaton starts.
    pub fn augmented_item(&self) -> Item {
        Item::new(ProductionID::ACCEPT, 0)
    }

    pub fn symbol_name(&self, symbol: SymbolID) -> &str {
        match symbol {
            SymbolID::T(t) => self.terminals.get(&t).map_or("<unknown>", |t| t.name()),
            SymbolID::N(n) => self.nonterminals.get(&n).map_or("<unknown>", |n| n.name()),
        }
    }

    pub fn find_symbol(&self, name: &str) -> Option<SymbolID> {
        self.symbols
            .iter()
            .copied()
            .find(|symbol| self.symbol_name(*symbol) == name)
    }
}

/// The contextural values for building a `Grammar`.
#[derive(Debug)]
pub struct GrammarDef {
    terminals: Map<TerminalID, Terminal>,
    nonterminals: Map<NonterminalID, Nonterminal>,
    productions: Map<ProductionID, Production>,
    symbols: Vec<SymbolID>,
    next_terminal_id: u16,
    next_nonterminal_id: u16,
    next_production_id: u16,
}

impl Default for GrammarDef {
    fn default() -> Self {
        let mut def = GrammarDef {
            terminals: Map::default(),
            nonterminals: Map::default(),
            productions: Map::default(),
            symbols: vec![],
            next_terminal_id: TerminalID::OFFSET,
            next_nonterminal_id: NonterminalID::OFFSET,
            next_production_id: ProductionID::OFFSET,
        };

        def.terminals.insert(
            TerminalID::EOI,
            Terminal {
                name: "$".to_owned(),
            },
        );
        def.symbols.push(SymbolID::T(TerminalID::EOI));

        def.nonterminals.insert(
            NonterminalID::START,
            Nonterminal {
                name: "$start".to_owned(),
            },
        );
        def.symbols.push(SymbolID::N(NonterminalID::START));

        def
    }
}

impl GrammarDef {
    /// Declare a terminal symbol used in this grammar.
    pub fn terminal(&mut self, name: &str) -> Result<TerminalID, GrammarError> {
        self.verify_name(name)?;

        let id = TerminalID::from_raw(allocate(&mut self.next_terminal_id, "terminals")?);
        self.terminals.insert(
            id,
            Terminal {
                name: name.to_owned(),
            },
        );
        self.symbols.push(SymbolID::T(id));

        Ok(id)
    }

    /// Declare a nonterminal symbol used in this grammar.
    pub fn nonterminal(&mut self, name: &str) -> Result<NonterminalID, GrammarError> {
        self.verify_name(name)?;

        let id = NonterminalID::from_raw(allocate(&mut self.next_nonterminal_id, "nonterminals")?);
        self.nonterminals.insert(
            id,
            Nonterminal {
                name: name.to_owned(),
            },
        );
        self.symbols.push(SymbolID::N(id));

        Ok(id)
    }

    /// Specify a production rule into this grammer.
    pub fn rule<I>(
        &mut self,
        left: impl Into<SymbolID>,
        right: I,
    ) -> Result<ProductionID, GrammarError>
    where
        I: IntoIterator<Item = SymbolID>,
    {
        let left = match left.into() {
            SymbolID::N(NonterminalID::START) => {
                return Err(GrammarError::ReservedSymbol {
                    name: self.name_of(SymbolID::N(NonterminalID::START)),
                })
            }
            SymbolID::N(n) if self.nonterminals.contains_key(&n) => n,
            SymbolID::T(t) if self.terminals.contains_key(&t) => {
                return Err(GrammarError::TerminalHead {
                    name: self.name_of(SymbolID::T(t)),
                })
            }
            symbol => return Err(GrammarError::UndeclaredSymbol { symbol }),
        };

        let right: Vec<SymbolID> = right.into_iter().collect();
        if right.is_empty() {
            return Err(GrammarError::EmptyProduction {
                head: self.name_of(SymbolID::N(left)),
            });
        }
        for &symbol in &right {
            match symbol {
                SymbolID::T(TerminalID::EOI) | SymbolID::N(NonterminalID::START) => {
                    return Err(GrammarError::ReservedSymbol {
                        name: self.name_of(symbol),
                    });
                }
                SymbolID::T(t) if self.terminals.contains_key(&t) => (),
                SymbolID::N(n) if self.nonterminals.contains_key(&n) => (),
                _ => return Err(GrammarError::UndeclaredSymbol { symbol }),
            }
        }

        if self
            .productions
            .values()
            .any(|p| p.left == left && p.right == right)
        {
            // surfaces later as a reduce/reduce conflict
            tracing::warn!(
                "duplicate production for `{}'",
                self.name_of(SymbolID::N(left))
            );
        }

        let id = ProductionID::new(allocate(&mut self.next_production_id, "productions")?);
        self.productions.insert(
            id,
            Production {
                id,
                left,
                right,
                items: OnceLock::new(),
            },
        );

        Ok(id)
    }

    fn verify_name(&self, name: &str) -> Result<(), GrammarError> {
        if name.is_empty() {
            return Err(GrammarError::EmptyName);
        }
        let used = self.terminals.values().any(|t| t.name == name)
            || self.nonterminals.values().any(|n| n.name == name);
        if used {
            return Err(GrammarError::DuplicateName {
                name: name.to_owned(),
            });
        }
        Ok(())
    }

    fn name_of(&self, symbol: SymbolID) -> String {
        match symbol {
            SymbolID::T(t) => self.terminals.get(&t).map(|t| t.name.clone()),
            SymbolID::N(n) => self.nonterminals.get(&n).map(|n| n.name.clone()),
        }
        .unwrap_or_else(|| format!("{:?}", symbol))
    }

    fn end(self) -> Result<Grammar, GrammarError> {
        let mut derived = Set::default();
        for production in self.productions.values() {
            for symbol in &production.right {
                if let SymbolID::N(n) = symbol {
                    derived.insert(*n);
                }
            }
        }

        let mut roots = Set::default();
        for production in self.productions.values() {
            if !derived.contains(&production.left) {
                roots.insert(production.left);
            }
        }
        let root = match roots.len() {
            0 => return Err(GrammarError::MissingRoot),
            1 => roots[0],
            _ => {
                return Err(GrammarError::MultipleRoots {
                    names: roots
                        .iter()
                        .map(|n| self.nonterminals[n].name.clone())
                        .collect(),
                })
            }
        };

        for (id, nonterminal) in &self.nonterminals {
            if *id != NonterminalID::START && self.productions.values().all(|p| p.left != *id) {
                tracing::warn!(
                    "the nonterminal `{}' has no associated production",
                    nonterminal.name
                );
            }
        }

        let mut productions = Map::default();
        productions.insert(
            ProductionID::ACCEPT,
            Production {
                id: ProductionID::ACCEPT,
                left: NonterminalID::START,
                right: vec![SymbolID::N(root), SymbolID::T(TerminalID::EOI)],
                items: OnceLock::new(),
            },
        );
        productions.extend(self.productions);

        let mut by_head = Map::<NonterminalID, Vec<ProductionID>>::default();
        for (id, production) in &productions {
            by_head.entry(production.left).or_default().push(*id);
        }

        Ok(Grammar {
            terminals: self.terminals,
            nonterminals: self.nonterminals,
            productions,
            by_head,
            symbols: self.symbols,
            root,
        })
    }
}

/// Take the next raw ID from `next`.
fn allocate(next: &mut u16, kind: &'static str) -> Result<u16, GrammarError> {
    let raw = *next;
    *next = raw
        .checked_add(1)
        .ok_or(GrammarError::CapacityExceeded { kind })?;
    Ok(raw)
}
