//! Grammar symbols: terminals, non-terminals, and the two reserved
//! symbols `$` (end-of-input) and `ε` (epsilon).

use serde::Serialize;
use std::fmt;
use std::rc::Rc;

/// What kind of grammar entity a [`Symbol`] names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolKind {
    Terminal,
    NonTerminal,
    Epsilon,
}

/// A grammar symbol. Value semantics: two symbols are equal, ordered,
/// and hash identically iff their `(name, kind)` pair matches.
#[derive(Debug, Clone, Eq, Serialize)]
pub struct Symbol {
    name: Rc<str>,
    kind: SymbolKind,
}

impl Symbol {
    /// The reserved end-of-input terminal, written `$`.
    pub fn end_marker() -> Self {
        Symbol {
            name: Rc::from("$"),
            kind: SymbolKind::Terminal,
        }
    }

    /// The reserved epsilon symbol, written `ε`.
    pub fn epsilon() -> Self {
        Symbol {
            name: Rc::from("\u{03b5}"),
            kind: SymbolKind::Epsilon,
        }
    }

    pub fn terminal(name: &str) -> Self {
        Symbol {
            name: Rc::from(name),
            kind: SymbolKind::Terminal,
        }
    }

    pub fn non_terminal(name: &str) -> Self {
        Symbol {
            name: Rc::from(name),
            kind: SymbolKind::NonTerminal,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> SymbolKind {
        self.kind
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.kind, SymbolKind::Terminal)
    }

    pub fn is_non_terminal(&self) -> bool {
        matches!(self.kind, SymbolKind::NonTerminal)
    }

    pub fn is_epsilon(&self) -> bool {
        matches!(self.kind, SymbolKind::Epsilon)
    }

    pub fn is_end_marker(&self) -> bool {
        self.is_terminal() && &*self.name == "$"
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.name == other.name
    }
}

impl std::hash::Hash for Symbol {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.kind.hash(state);
        self.name.hash(state);
    }
}

impl PartialOrd for Symbol {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Symbol {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (&self.name, self.kind).cmp(&(&other.name, other.kind))
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_is_by_name_and_kind() {
        assert_eq!(Symbol::terminal("a"), Symbol::terminal("a"));
        assert_ne!(Symbol::terminal("a"), Symbol::non_terminal("a"));
    }

    #[test]
    fn reserved_symbols() {
        assert!(Symbol::end_marker().is_end_marker());
        assert!(Symbol::epsilon().is_epsilon());
    }

    #[test]
    fn ordering_is_by_name_then_kind() {
        let mut symbols = vec![Symbol::terminal("b"), Symbol::terminal("a")];
        symbols.sort();
        assert_eq!(symbols, vec![Symbol::terminal("a"), Symbol::terminal("b")]);
    }
}
