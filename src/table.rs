//! ACTION/GOTO table synthesis: per spec.md §4.4, built by enumerating
//! every item of every state and recording first-installed-wins
//! conflicts, with tabular export views that mirror
//! `original_source/backend/parser/table.py` cell-by-cell.

use std::collections::BTreeMap;

use crate::automaton::Automaton;
use crate::grammar::Grammar;
use crate::production::ProductionId;
use crate::symbol::Symbol;

/// A single ACTION table entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum Action {
    Shift(usize),
    Reduce(ProductionId),
    Accept,
}

impl Action {
    /// `sN` / `rN` / `acc` cell encoding, per spec.md §4.4 and §6.
    pub fn cell_text(&self) -> String {
        match self {
            Action::Shift(state) => format!("s{state}"),
            Action::Reduce(id) => format!("r{}", id.0),
            Action::Accept => "acc".to_string(),
        }
    }
}

/// Kind of conflict recorded while installing ACTION/GOTO entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictKind {
    ShiftReduce,
    ReduceReduce,
    ShiftShift,
    AcceptConflict,
}

/// A competing pair of actions for the same `(state, symbol)` cell. The
/// table keeps `existing` and discards `incoming`, per spec.md §4.4's
/// "the table keeps the first-installed action to remain well-defined".
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Conflict {
    pub state: usize,
    pub symbol: Symbol,
    pub kind: ConflictKind,
    pub existing: Action,
    pub incoming: Action,
}

/// ACTION and GOTO tables over an [`Automaton`].
#[derive(Debug)]
pub struct ParsingTable {
    action: BTreeMap<(usize, Symbol), Action>,
    goto: BTreeMap<(usize, Symbol), usize>,
    conflicts: Vec<Conflict>,
}

impl ParsingTable {
    /// Synthesizes ACTION/GOTO by enumerating every item of every state
    /// (spec.md §4.4). The automaton's own transitions supply shift and
    /// goto targets; the augmented production's accept item supplies
    /// the single ACCEPT entry.
    pub fn build(grammar: &Grammar, automaton: &Automaton) -> Self {
        let mut action: BTreeMap<(usize, Symbol), Action> = BTreeMap::new();
        let mut goto: BTreeMap<(usize, Symbol), usize> = BTreeMap::new();
        let mut conflicts = Vec::new();

        for (state_idx, state) in automaton.states.iter().enumerate() {
            for item in state.iter() {
                if item.is_complete(grammar) {
                    let production = grammar.production(item.production);
                    let new_action = if production.id == ProductionId(0) && item.lookahead.is_end_marker() {
                        Action::Accept
                    } else {
                        Action::Reduce(item.production)
                    };
                    install_action(
                        &mut action,
                        &mut conflicts,
                        state_idx,
                        item.lookahead.clone(),
                        new_action,
                    );
                } else if let Some(symbol) = item.symbol_after_dot(grammar) {
                    if symbol.is_terminal() {
                        if let Some(transition) = automaton
                            .transitions_from(state_idx)
                            .find(|t| &t.symbol == symbol)
                        {
                            install_action(
                                &mut action,
                                &mut conflicts,
                                state_idx,
                                symbol.clone(),
                                Action::Shift(transition.to),
                            );
                        }
                    }
                }
            }

            for transition in automaton.transitions_from(state_idx) {
                if transition.symbol.is_non_terminal() {
                    goto.insert((state_idx, transition.symbol.clone()), transition.to);
                }
            }
        }

        ParsingTable { action, goto, conflicts }
    }

    pub fn action(&self, state: usize, symbol: &Symbol) -> Option<Action> {
        self.action.get(&(state, symbol.clone())).copied()
    }

    pub fn goto(&self, state: usize, symbol: &Symbol) -> Option<usize> {
        self.goto.get(&(state, symbol.clone())).copied()
    }

    pub fn conflicts(&self) -> &[Conflict] {
        &self.conflicts
    }

    pub fn is_valid(&self) -> bool {
        self.conflicts.is_empty()
    }

    /// `["State", sorted terminal names...]` header plus one row per
    /// state, cells encoded per [`Action::cell_text`], per spec.md §6.
    pub fn export_action_table(&self, grammar: &Grammar, num_states: usize) -> (Vec<String>, Vec<Vec<String>>) {
        let mut header = vec!["State".to_string()];
        header.extend(grammar.terminals().iter().map(|s| s.name().to_string()));

        let mut rows = Vec::with_capacity(num_states);
        for state in 0..num_states {
            let mut row = vec![state.to_string()];
            for terminal in grammar.terminals() {
                row.push(
                    self.action(state, terminal)
                        .map(|a| a.cell_text())
                        .unwrap_or_default(),
                );
            }
            rows.push(row);
        }
        (header, rows)
    }

    /// `["State", sorted non-terminal names...]` header plus one row
    /// per state, cells holding a decimal state number or empty.
    pub fn export_goto_table(&self, grammar: &Grammar, num_states: usize) -> (Vec<String>, Vec<Vec<String>>) {
        let mut header = vec!["State".to_string()];
        header.extend(grammar.non_terminals().iter().map(|s| s.name().to_string()));

        let mut rows = Vec::with_capacity(num_states);
        for state in 0..num_states {
            let mut row = vec![state.to_string()];
            for non_terminal in grammar.non_terminals() {
                row.push(
                    self.goto(state, non_terminal)
                        .map(|s| s.to_string())
                        .unwrap_or_default(),
                );
            }
            rows.push(row);
        }
        (header, rows)
    }

    /// Short read-only summary, mirroring
    /// `original_source/backend/parser/table.py::get_table_summary`.
    pub fn get_table_summary(&self) -> String {
        format!(
            "{} action entries, {} goto entries, {} conflict(s)",
            self.action.len(),
            self.goto.len(),
            self.conflicts.len()
        )
    }

    /// Count of conflicts grouped by kind, mirroring
    /// `table.py::get_conflict_summary`.
    pub fn get_conflict_summary(&self) -> BTreeMap<&'static str, usize> {
        let mut summary = BTreeMap::new();
        for conflict in &self.conflicts {
            let key = match conflict.kind {
                ConflictKind::ShiftReduce => "shift_reduce",
                ConflictKind::ReduceReduce => "reduce_reduce",
                ConflictKind::ShiftShift => "shift_shift",
                ConflictKind::AcceptConflict => "accept_conflict",
            };
            *summary.entry(key).or_insert(0) += 1;
        }
        summary
    }
}

fn install_action(
    action: &mut BTreeMap<(usize, Symbol), Action>,
    conflicts: &mut Vec<Conflict>,
    state: usize,
    symbol: Symbol,
    new_action: Action,
) {
    let key = (state, symbol.clone());
    match action.get(&key) {
        None => {
            action.insert(key, new_action);
        }
        Some(&existing) if existing == new_action => {}
        Some(&existing) => {
            let kind = conflict_kind(existing, new_action);
            conflicts.push(Conflict { state, symbol, kind, existing, incoming: new_action });
            // keep the first-installed action
        }
    }
}

fn conflict_kind(existing: Action, incoming: Action) -> ConflictKind {
    match (existing, incoming) {
        (Action::Accept, _) | (_, Action::Accept) => ConflictKind::AcceptConflict,
        (Action::Shift(_), Action::Shift(_)) => ConflictKind::ShiftShift,
        (Action::Shift(_), Action::Reduce(_)) | (Action::Reduce(_), Action::Shift(_)) => {
            ConflictKind::ShiftReduce
        }
        (Action::Reduce(_), Action::Reduce(_)) => ConflictKind::ReduceReduce,
    }
}
