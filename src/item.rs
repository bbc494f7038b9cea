//! LR(1) items and item sets: dotted productions with a lookahead,
//! closure, and GOTO.

use std::collections::BTreeSet;

use crate::grammar::Grammar;
use crate::production::ProductionId;
use crate::symbol::Symbol;

/// `[production -> alpha . beta, lookahead]`.
///
/// Value semantics: equality, ordering, and hashing are structural over
/// `(production, dot, lookahead)`. Unlike the teacher's `GrammarItemKey`,
/// which keeps the lookahead out of the key and tracks it in a parallel
/// `TokenSet` map, this crate follows the original Python reference's
/// `LR1Item` dataclass and keys items by the full triple, matching
/// spec.md §3's "items are value objects; equality and hashing are
/// structural".
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LR1Item {
    pub production: ProductionId,
    pub dot: usize,
    pub lookahead: Symbol,
}

impl LR1Item {
    pub fn new(production: ProductionId, dot: usize, lookahead: Symbol) -> Self {
        LR1Item { production, dot, lookahead }
    }

    pub fn is_complete(&self, grammar: &Grammar) -> bool {
        self.dot == grammar.production(self.production).len()
    }

    /// The symbol immediately after the dot, or `None` if the item is complete.
    pub fn symbol_after_dot<'g>(&self, grammar: &'g Grammar) -> Option<&'g Symbol> {
        grammar.production(self.production).symbol_at(self.dot)
    }

    /// The symbols after the symbol after the dot (`beta` in `A -> alpha . X beta`).
    pub fn beta<'g>(&self, grammar: &'g Grammar) -> &'g [Symbol] {
        grammar.production(self.production).tail(self.dot + 1)
    }

    /// Advances the dot by one. Panics if the item is already complete,
    /// matching spec.md §4.2's "`advance_dot` fails on complete items".
    pub fn advance_dot(&self, grammar: &Grammar) -> Self {
        assert!(!self.is_complete(grammar), "advance_dot called on a complete item");
        LR1Item {
            production: self.production,
            dot: self.dot + 1,
            lookahead: self.lookahead.clone(),
        }
    }
}

/// An unordered, structurally-equal-by-contents set of items.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ItemSet(BTreeSet<LR1Item>);

impl ItemSet {
    pub fn new(items: impl IntoIterator<Item = LR1Item>) -> Self {
        ItemSet(items.into_iter().collect())
    }

    pub fn iter(&self) -> impl Iterator<Item = &LR1Item> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn contains(&self, item: &LR1Item) -> bool {
        self.0.contains(item)
    }

    /// Symbols that appear immediately after a dot in this set, in
    /// deterministic (sorted) order, so callers expanding GOTO over
    /// them get a reproducible state numbering (spec.md's "Determinism"
    /// design note).
    pub fn symbols_after_dot(&self, grammar: &Grammar) -> BTreeSet<Symbol> {
        self.0
            .iter()
            .filter_map(|item| item.symbol_after_dot(grammar).cloned())
            .collect()
    }

    /// Least fixed point of the closure expansion rule (spec.md §4.2),
    /// implemented as a worklist to avoid rescanning the whole set on
    /// every addition.
    pub fn closure(&self, grammar: &Grammar) -> ItemSet {
        self.closure_cancellable(grammar, || false).expect("uncancellable closure")
    }

    /// As [`ItemSet::closure`], but polls `is_cancelled` once per
    /// worklist item and bails out with `None` if it ever returns true,
    /// per spec.md §5's cooperative-cancellation note naming CLOSURE
    /// expansion as one of the three fixed-point loops a caller may
    /// abort.
    pub fn closure_cancellable(&self, grammar: &Grammar, is_cancelled: impl Fn() -> bool) -> Option<ItemSet> {
        let mut items: BTreeSet<LR1Item> = self.0.clone();
        let mut worklist: Vec<LR1Item> = self.0.iter().cloned().collect();

        while let Some(item) = worklist.pop() {
            if is_cancelled() {
                return None;
            }
            let Some(b) = item.symbol_after_dot(grammar) else {
                continue;
            };
            if !b.is_non_terminal() {
                continue;
            }
            let b = b.clone();

            let mut lookahead_seed = item.beta(grammar).to_vec();
            lookahead_seed.push(item.lookahead.clone());
            let lookaheads = grammar.first(&lookahead_seed);

            for production in grammar.productions_for(&b) {
                for lookahead in &lookaheads {
                    if lookahead.is_epsilon() {
                        continue;
                    }
                    let new_item = LR1Item::new(production.id, 0, lookahead.clone());
                    if items.insert(new_item.clone()) {
                        worklist.push(new_item);
                    }
                }
            }
        }

        Some(ItemSet(items))
    }

    /// `GOTO(I, X)`: advance every item whose symbol-after-dot is `X`,
    /// then close. Returns `None` when the result would be empty,
    /// distinguishing "undefined" from "empty set" per spec.md §4.2.
    pub fn goto(&self, grammar: &Grammar, x: &Symbol) -> Option<ItemSet> {
        self.goto_cancellable(grammar, x, || false).expect("uncancellable goto")
    }

    /// As [`ItemSet::goto`], but propagates cooperative cancellation into
    /// the resulting CLOSURE computation. Returns `Some(None)` for an
    /// ordinary undefined GOTO and `None` only when cancelled.
    pub fn goto_cancellable(
        &self,
        grammar: &Grammar,
        x: &Symbol,
        is_cancelled: impl Fn() -> bool,
    ) -> Option<Option<ItemSet>> {
        let advanced: BTreeSet<LR1Item> = self
            .0
            .iter()
            .filter(|item| item.symbol_after_dot(grammar) == Some(x))
            .map(|item| item.advance_dot(grammar))
            .collect();
        if advanced.is_empty() {
            Some(None)
        } else {
            ItemSet(advanced).closure_cancellable(grammar, is_cancelled).map(Some)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::Symbol;

    fn nt(name: &str) -> Symbol {
        Symbol::non_terminal(name)
    }

    fn t(name: &str) -> Symbol {
        Symbol::terminal(name)
    }

    fn arithmetic_grammar() -> Grammar {
        let (grammar, errors) = Grammar::new(
            vec![
                (nt("E"), vec![nt("E"), t("+"), nt("T")]),
                (nt("E"), vec![nt("T")]),
                (nt("T"), vec![nt("T"), t("*"), nt("F")]),
                (nt("T"), vec![nt("F")]),
                (nt("F"), vec![t("("), nt("E"), t(")")]),
                (nt("F"), vec![t("id")]),
            ],
            nt("E"),
        );
        assert!(errors.is_empty());
        grammar
    }

    #[test]
    fn initial_state_is_closure_of_augmented_item() {
        let grammar = arithmetic_grammar();
        let start = ItemSet::new([LR1Item::new(ProductionId(0), 0, Symbol::end_marker())]);
        let state0 = start.closure(&grammar);
        // every production of E, T, F should contribute a dot-0 item somewhere
        assert!(state0.len() > 1);
        assert!(state0.contains(&LR1Item::new(ProductionId(0), 0, Symbol::end_marker())));
    }

    #[test]
    fn goto_on_absent_symbol_is_none() {
        let grammar = arithmetic_grammar();
        let start = ItemSet::new([LR1Item::new(ProductionId(0), 0, Symbol::end_marker())]).closure(&grammar);
        assert!(start.goto(&grammar, &t(")")).is_none());
        assert!(start.goto(&grammar, &nt("E")).is_some());
    }
}
