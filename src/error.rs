//! Error types for grammar construction, table synthesis, and parsing.
//!
//! Grammar and table construction never abort on their own: they collect
//! diagnostics and hand them back alongside the constructed value, the
//! way the teacher's `GrammarSpecification` accumulates errors/warnings
//! instead of calling `panic!`. Only `ParserEngine::new` and `parse`
//! return a single terminal `Err` rather than an accumulated list,
//! since the driver genuinely halts on its first unrecoverable step.

use serde::Serialize;
use thiserror::Error;

use crate::symbol::Symbol;
use crate::table::Conflict;

/// A single defect found while constructing a [`crate::grammar::Grammar`].
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
pub enum GrammarError {
    /// A non-terminal appears on some right-hand side but has no production.
    #[error("non-terminal `{0}` is used but never defined")]
    UndefinedNonTerminal(String),

    /// A non-terminal is defined but unreachable from the start symbol.
    /// Informational only: it is reported, never fatal.
    #[error("non-terminal `{0}` is unreachable from the start symbol")]
    UnreachableNonTerminal(String),
}

impl GrammarError {
    /// Informational errors never block grammar construction; only
    /// [`GrammarError::UndefinedNonTerminal`] does.
    pub fn is_fatal(&self) -> bool {
        matches!(self, GrammarError::UndefinedNonTerminal(_))
    }
}

/// Defects found while synthesizing a [`crate::table::ParsingTable`].
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
pub enum TableError {
    /// The table has one or more unresolved conflicts; an engine refuses
    /// to run against it.
    #[error("parsing table has {} conflict(s)", .0.len())]
    HasConflicts(Vec<Conflict>),
}

/// Errors raised while driving a parse.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
pub enum ParseError {
    /// No ACTION entry for `(state, token)`.
    #[error("no action defined in state {state} for token `{token}`")]
    NoAction { state: usize, token: String },

    /// A reduction completed but GOTO is undefined for the resulting state/symbol.
    #[error("no goto defined in state {state} for non-terminal `{symbol}`")]
    MissingGoto { state: usize, symbol: Symbol },

    /// The safety bound of `10 * tokens.len()` steps was exceeded.
    #[error("step limit of {0} exceeded")]
    StepLimitExceeded(usize),

    /// A cooperative cancellation callback requested an abort.
    #[error("parse cancelled")]
    Cancelled,
}

/// Top-level error type composing all fallible surfaces of the crate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("grammar construction failed: {0:?}")]
    Grammar(Vec<GrammarError>),

    #[error(transparent)]
    Table(#[from] TableError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    /// A fixed-point or worklist loop was cancelled cooperatively.
    #[error("cancelled")]
    Cancelled,
}
