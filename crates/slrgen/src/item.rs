//! LR(0) items and the closure/goto operations over item sets.

use crate::{
    error::ContractError,
    grammar::{Grammar, Production, ProductionID, SymbolID},
    util::display_fn,
};
use std::{collections::BTreeSet, fmt};

/// The LR(0) item, a production with a dot somewhere in its right-hand side.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Item {
    pub production: ProductionID,
    pub index: usize,
}

/// A set of items. Equality and hashing ignore the order of insertion.
pub type ItemSet = BTreeSet<Item>;

impl Item {
    pub const fn new(production: ProductionID, index: usize) -> Self {
        Self { production, index }
    }

    pub fn has_next_token(&self, g: &Grammar) -> bool {
        g.get_production(self.production)
            .map_or(false, |p| self.index < p.len())
    }

    /// The symbol right after the dot.
    pub fn next_token(&self, g: &Grammar) -> Result<SymbolID, ContractError> {
        self.production(g)?
            .right()
            .get(self.index)
            .copied()
            .ok_or_else(|| {
                ContractError::InvalidState(format!(
                    "no symbol follows the dot in `{}'",
                    self.display(g)
                ))
            })
    }

    /// Move the dot over the next symbol.
    pub fn advance_dot(&self, g: &Grammar) -> Result<Self, ContractError> {
        if self.index >= self.production(g)?.len() {
            return Err(ContractError::InvalidState(format!(
                "cannot advance the dot of `{}' any further",
                self.display(g)
            )));
        }
        Ok(Self::new(self.production, self.index + 1))
    }

    /// Whether this is `$start -> Root . $`.
    pub fn is_accepting(&self, g: &Grammar) -> bool {
        self.production == ProductionID::ACCEPT
            && g.get_production(self.production)
                .map_or(false, |p| self.index + 1 == p.len())
    }

    fn production<'g>(&self, g: &'g Grammar) -> Result<&'g Production, ContractError> {
        g.get_production(self.production).ok_or_else(|| {
            ContractError::InvalidState(format!(
                "the production {:?} does not belong to this grammar",
                self.production
            ))
        })
    }

    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(move |f| {
            let Some(production) = g.get_production(self.production) else {
                return write!(f, "{:?} . {}", self.production, self.index);
            };
            write!(
                f,
                "{} ->",
                g.symbol_name(SymbolID::N(production.left()))
            )?;
            for (i, symbol) in production.right().iter().enumerate() {
                if i == self.index {
                    f.write_str(" .")?;
                }
                write!(f, " {}", g.symbol_name(*symbol))?;
            }
            if self.index == production.len() {
                f.write_str(" .")?;
            }
            Ok(())
        })
    }
}

/// Expand `items` until no item has its dot right before a nonterminal
/// whose productions are missing from the set.
pub fn closure<I>(g: &Grammar, items: I) -> ItemSet
where
    I: IntoIterator<Item = Item>,
{
    let mut closure: ItemSet = items.into_iter().collect();
    let mut added = Vec::new();
    loop {
        added.clear();
        for item in &closure {
            let production = g.production(item.production);
            if let Some(SymbolID::N(n)) = production.right().get(item.index) {
                for &id in g.productions_of(*n) {
                    let item = Item::new(id, 0);
                    if !closure.contains(&item) {
                        added.push(item);
                    }
                }
            }
        }

        let changed = added
            .drain(..)
            .fold(false, |changed, item| changed | closure.insert(item));
        if !changed {
            break;
        }
    }
    closure
}

pub fn closure_of(g: &Grammar, item: Item) -> ItemSet {
    closure(g, Some(item))
}

/// The closure of the items in `items` advanced over `symbol`.
///
/// An empty result means there is no transition under `symbol`.
pub fn goto<'a, I>(g: &Grammar, items: I, symbol: SymbolID) -> ItemSet
where
    I: IntoIterator<Item = &'a Item>,
{
    let kernels = items.into_iter().filter_map(|item| {
        let production = g.production(item.production);
        (production.right().get(item.index) == Some(&symbol))
            .then(|| Item::new(item.production, item.index + 1))
    });
    closure(g, kernels)
}
