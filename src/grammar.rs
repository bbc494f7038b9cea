//! Grammar representation: augmentation, validation, and memoized
//! FIRST/FOLLOW fixed points.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;

use crate::error::GrammarError;
use crate::production::{Production, ProductionId};
use crate::symbol::Symbol;

/// A context-free grammar, augmented with a fresh start production at
/// construction time and immutable thereafter.
///
/// FIRST/FOLLOW caches are warmed eagerly before `Grammar::new` returns
/// (see [`Grammar::warm_caches`]), so no interior mutability escapes
/// past construction and `&Grammar` is safely `Send + Sync`-shareable.
#[derive(Debug)]
pub struct Grammar {
    productions: Vec<Production>,
    start: Symbol,
    user_start: Symbol,
    terminals: BTreeSet<Symbol>,
    non_terminals: BTreeSet<Symbol>,
    first_cache: RefCell<BTreeMap<Symbol, BTreeSet<Symbol>>>,
    follow_cache: RefCell<BTreeMap<Symbol, BTreeSet<Symbol>>>,
}

impl Grammar {
    /// Builds the augmented grammar `S' -> S` from a user-supplied
    /// production list and start symbol, validates it, and returns both
    /// the grammar and its (possibly empty) diagnostics list.
    ///
    /// `UndefinedNonTerminal` is the only fatal diagnostic; if it is
    /// present the returned grammar should not be used further (its
    /// FIRST/FOLLOW sets may be incomplete).
    pub fn new(user_productions: Vec<(Symbol, Vec<Symbol>)>, start: Symbol) -> (Self, Vec<GrammarError>) {
        let fresh_start = fresh_start_symbol(&start, &user_productions);

        let mut productions = Vec::with_capacity(user_productions.len() + 1);
        productions.push(Production::new(
            ProductionId(0),
            fresh_start.clone(),
            vec![start.clone()],
        ));
        for (i, (lhs, rhs)) in user_productions.into_iter().enumerate() {
            productions.push(Production::new(ProductionId(i as u32 + 1), lhs, rhs));
        }

        let mut terminals: BTreeSet<Symbol> = BTreeSet::new();
        let mut non_terminals: BTreeSet<Symbol> = BTreeSet::new();
        terminals.insert(Symbol::end_marker());
        non_terminals.insert(fresh_start.clone());

        let mut has_epsilon_production = false;
        for production in &productions {
            non_terminals.insert(production.lhs.clone());
            if production.rhs.is_empty() {
                has_epsilon_production = true;
            }
            for symbol in &production.rhs {
                if symbol.is_non_terminal() {
                    non_terminals.insert(symbol.clone());
                } else if symbol.is_terminal() {
                    terminals.insert(symbol.clone());
                }
            }
        }
        if has_epsilon_production {
            terminals.insert(Symbol::epsilon());
        }

        let grammar = Grammar {
            productions,
            start: fresh_start,
            user_start: start,
            terminals,
            non_terminals,
            first_cache: RefCell::new(BTreeMap::new()),
            follow_cache: RefCell::new(BTreeMap::new()),
        };

        let errors = grammar.validate();
        grammar.warm_caches();
        (grammar, errors)
    }

    fn validate(&self) -> Vec<GrammarError> {
        let mut errors = Vec::new();

        let defined: HashSet<&str> = self
            .productions
            .iter()
            .map(|p| p.lhs.name())
            .collect();
        let mut used_non_terminals: BTreeSet<Symbol> = BTreeSet::new();
        for production in &self.productions {
            for symbol in &production.rhs {
                if symbol.is_non_terminal() {
                    used_non_terminals.insert(symbol.clone());
                    if !defined.contains(symbol.name()) {
                        errors.push(GrammarError::UndefinedNonTerminal(symbol.name().to_string()));
                    }
                }
            }
        }

        let reachable = self.reachable_non_terminals();
        for symbol in &self.non_terminals {
            if symbol != &self.start && !reachable.contains(symbol) {
                errors.push(GrammarError::UnreachableNonTerminal(symbol.name().to_string()));
            }
        }

        errors
    }

    fn reachable_non_terminals(&self) -> BTreeSet<Symbol> {
        let mut reachable = BTreeSet::new();
        let mut worklist = vec![self.start.clone()];
        reachable.insert(self.start.clone());
        while let Some(nt) = worklist.pop() {
            for production in self.productions_for(&nt) {
                for symbol in &production.rhs {
                    if symbol.is_non_terminal() && reachable.insert(symbol.clone()) {
                        worklist.push(symbol.clone());
                    }
                }
            }
        }
        reachable
    }

    fn warm_caches(&self) {
        for symbol in self.non_terminals.clone() {
            self.first(std::slice::from_ref(&symbol));
        }
        for symbol in self.non_terminals.clone() {
            self.follow(&symbol);
        }
    }

    pub fn productions(&self) -> &[Production] {
        &self.productions
    }

    pub fn production(&self, id: ProductionId) -> &Production {
        &self.productions[id.0 as usize]
    }

    pub fn productions_for<'a>(&'a self, lhs: &'a Symbol) -> impl Iterator<Item = &'a Production> {
        self.productions.iter().filter(move |p| &p.lhs == lhs)
    }

    pub fn augmented_start(&self) -> &Symbol {
        &self.start
    }

    pub fn user_start(&self) -> &Symbol {
        &self.user_start
    }

    pub fn terminals(&self) -> &BTreeSet<Symbol> {
        &self.terminals
    }

    pub fn non_terminals(&self) -> &BTreeSet<Symbol> {
        &self.non_terminals
    }

    pub fn is_terminal(&self, symbol: &Symbol) -> bool {
        self.terminals.contains(symbol)
    }

    pub fn is_non_terminal(&self, symbol: &Symbol) -> bool {
        self.non_terminals.contains(symbol)
    }

    /// FIRST(alpha) for a symbol sequence, per spec.md §4.1.
    pub fn first(&self, alpha: &[Symbol]) -> BTreeSet<Symbol> {
        let mut result = BTreeSet::new();
        let mut in_progress = HashSet::new();
        self.first_into(alpha, &mut result, &mut in_progress);
        result
    }

    fn first_into(
        &self,
        alpha: &[Symbol],
        result: &mut BTreeSet<Symbol>,
        in_progress: &mut HashSet<Symbol>,
    ) {
        if alpha.is_empty() {
            result.insert(Symbol::epsilon());
            return;
        }
        for symbol in alpha {
            let first_of_symbol = self.first_of_symbol(symbol, in_progress);
            let has_epsilon = first_of_symbol.contains(&Symbol::epsilon());
            result.extend(first_of_symbol.iter().filter(|s| !s.is_epsilon()).cloned());
            if !has_epsilon {
                return;
            }
        }
        result.insert(Symbol::epsilon());
    }

    fn first_of_symbol(&self, symbol: &Symbol, in_progress: &mut HashSet<Symbol>) -> BTreeSet<Symbol> {
        if symbol.is_terminal() {
            let mut set = BTreeSet::new();
            set.insert(symbol.clone());
            return set;
        }
        if symbol.is_epsilon() {
            let mut set = BTreeSet::new();
            set.insert(Symbol::epsilon());
            return set;
        }

        if let Some(cached) = self.first_cache.borrow().get(symbol) {
            return cached.clone();
        }
        if in_progress.contains(symbol) {
            return BTreeSet::new();
        }
        in_progress.insert(symbol.clone());

        let mut result = BTreeSet::new();
        for production in self.productions_for(symbol) {
            self.first_into(&production.rhs, &mut result, in_progress);
        }

        in_progress.remove(symbol);
        self.first_cache.borrow_mut().insert(symbol.clone(), result.clone());
        result
    }

    /// FOLLOW(A), per spec.md §4.1.
    pub fn follow(&self, a: &Symbol) -> BTreeSet<Symbol> {
        let mut in_progress = HashSet::new();
        self.follow_with_guard(a, &mut in_progress)
    }

    fn follow_with_guard(&self, a: &Symbol, in_progress: &mut HashSet<Symbol>) -> BTreeSet<Symbol> {
        if let Some(cached) = self.follow_cache.borrow().get(a) {
            return cached.clone();
        }
        if in_progress.contains(a) {
            return BTreeSet::new();
        }
        in_progress.insert(a.clone());

        let mut result = BTreeSet::new();
        if a == &self.start {
            result.insert(Symbol::end_marker());
        }

        for production in &self.productions {
            for (i, symbol) in production.rhs.iter().enumerate() {
                if symbol != a {
                    continue;
                }
                let beta = &production.rhs[i + 1..];
                let first_beta = self.first(beta);
                result.extend(first_beta.iter().filter(|s| !s.is_epsilon()).cloned());
                if beta.is_empty() || first_beta.contains(&Symbol::epsilon()) {
                    result.extend(self.follow_with_guard(&production.lhs, in_progress));
                }
            }
        }

        in_progress.remove(a);
        self.follow_cache.borrow_mut().insert(a.clone(), result.clone());
        result
    }

    /// Human-readable listing grouped by lhs, mirroring the original
    /// Python reference's `Grammar.__str__`.
    pub fn to_display_string(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut seen = BTreeSet::new();
        for production in &self.productions {
            if !seen.insert(production.lhs.clone()) {
                continue;
            }
            let alternatives: Vec<String> = self
                .productions_for(&production.lhs)
                .map(|p| {
                    if p.rhs.is_empty() {
                        Symbol::epsilon().to_string()
                    } else {
                        p.rhs.iter().map(|s| s.to_string()).collect::<Vec<_>>().join(" ")
                    }
                })
                .collect();
            writeln!(f, "{} -> {}", production.lhs, alternatives.join(" | "))?;
        }
        Ok(())
    }
}

fn fresh_start_symbol(start: &Symbol, productions: &[(Symbol, Vec<Symbol>)]) -> Symbol {
    let mut candidate = format!("{}'", start.name());
    loop {
        let clashes = productions.iter().any(|(lhs, rhs)| {
            lhs.name() == candidate || rhs.iter().any(|s| s.name() == candidate)
        }) || start.name() == candidate;
        if !clashes {
            return Symbol::non_terminal(&candidate);
        }
        candidate.push('\'');
    }
}
