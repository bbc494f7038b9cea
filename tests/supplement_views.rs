//! Exercises SPEC_FULL.md §2's "[SUPPLEMENT]" read-only conveniences —
//! `Grammar::to_display_string`, `Automaton::state_index_of`,
//! `ParsingTable::get_table_summary`, and
//! `ParsingTable::get_conflict_summary` — so they cannot silently
//! regress without a test noticing.

use lr1_visualizer_core::automaton::Automaton;
use lr1_visualizer_core::grammar::Grammar;
use lr1_visualizer_core::symbol::Symbol;
use lr1_visualizer_core::table::ParsingTable;

fn nt(name: &str) -> Symbol {
    Symbol::non_terminal(name)
}

fn t(name: &str) -> Symbol {
    Symbol::terminal(name)
}

#[test]
fn display_string_lists_every_lhs_with_its_alternatives_grouped() {
    let (grammar, errors) = Grammar::new(
        vec![
            (nt("E"), vec![nt("E"), t("+"), nt("T")]),
            (nt("E"), vec![nt("T")]),
            (nt("T"), vec![t("id")]),
        ],
        nt("E"),
    );
    assert!(errors.is_empty());

    let listing = grammar.to_display_string();
    assert!(listing.contains("E -> E + T | T"));
    assert!(listing.contains("T -> id"));
    // the augmented production's lhs (E') is also a non-terminal of the grammar.
    assert!(listing.contains("E' -> E"));
}

#[test]
fn state_index_of_finds_every_built_state_and_nothing_else() {
    let (grammar, errors) = Grammar::new(vec![(nt("S"), vec![t("a")])], nt("S"));
    assert!(errors.is_empty());
    let automaton = Automaton::build(&grammar);

    for (expected_index, state) in automaton.states.iter().enumerate() {
        assert_eq!(automaton.state_index_of(state), Some(expected_index));
    }

    let bogus = lr1_visualizer_core::ItemSet::new(Vec::<lr1_visualizer_core::LR1Item>::new());
    assert_eq!(automaton.state_index_of(&bogus), None);
}

#[test]
fn table_summary_reports_entry_and_conflict_counts() {
    let (grammar, errors) = Grammar::new(
        vec![(nt("S"), vec![nt("S"), nt("S")]), (nt("S"), vec![t("a")])],
        nt("S"),
    );
    assert!(errors.is_empty());
    let automaton = Automaton::build(&grammar);
    let table = ParsingTable::build(&grammar, &automaton);

    let summary = table.get_table_summary();
    assert!(summary.contains("action entries"));
    assert!(summary.contains("goto entries"));
    assert!(summary.contains(&format!("{} conflict", table.conflicts().len())));
}

#[test]
fn conflict_summary_groups_by_kind() {
    // S -> A | B; A -> a; B -> a: a single reduce/reduce conflict on `$`.
    let (grammar, errors) = Grammar::new(
        vec![
            (nt("S"), vec![nt("A")]),
            (nt("S"), vec![nt("B")]),
            (nt("A"), vec![t("a")]),
            (nt("B"), vec![t("a")]),
        ],
        nt("S"),
    );
    assert!(errors.is_empty());
    let automaton = Automaton::build(&grammar);
    let table = ParsingTable::build(&grammar, &automaton);

    let summary = table.get_conflict_summary();
    assert_eq!(summary.get("reduce_reduce"), Some(&1));
    assert_eq!(summary.get("shift_reduce"), None);
}
