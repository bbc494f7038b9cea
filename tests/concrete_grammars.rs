//! Integration tests over the five concrete grammars in spec.md §8.

use lr1_visualizer_core::automaton::Automaton;
use lr1_visualizer_core::error::ParseError;
use lr1_visualizer_core::grammar::Grammar;
use lr1_visualizer_core::symbol::Symbol;
use lr1_visualizer_core::table::ParsingTable;
use lr1_visualizer_core::ParserEngine;

fn nt(name: &str) -> Symbol {
    Symbol::non_terminal(name)
}

fn t(name: &str) -> Symbol {
    Symbol::terminal(name)
}

fn build(productions: Vec<(Symbol, Vec<Symbol>)>, start: Symbol) -> (Grammar, ParsingTable) {
    let (grammar, errors) = Grammar::new(productions, start);
    assert!(errors.iter().all(|e| !e.is_fatal()), "unexpected fatal errors: {errors:?}");
    let automaton = Automaton::build(&grammar);
    let table = ParsingTable::build(&grammar, &automaton);
    (grammar, table)
}

// G1: E -> E + T | T; T -> T * F | F; F -> ( E ) | id
fn g1() -> (Grammar, ParsingTable) {
    build(
        vec![
            (nt("E"), vec![nt("E"), t("+"), nt("T")]),
            (nt("E"), vec![nt("T")]),
            (nt("T"), vec![nt("T"), t("*"), nt("F")]),
            (nt("T"), vec![nt("F")]),
            (nt("F"), vec![t("("), nt("E"), t(")")]),
            (nt("F"), vec![t("id")]),
        ],
        nt("E"),
    )
}

#[test]
fn g1_single_id_accepts_with_a_chain() {
    let (grammar, table) = g1();
    let engine = ParserEngine::new(&grammar, &table).unwrap();
    let outcome = engine.parse("id");
    assert!(outcome.accepted);
    assert!(outcome.error.is_none());

    let root_id = outcome.ast.root.expect("root node");
    let mut node = &outcome.ast.nodes[&root_id];
    assert_eq!(node.symbol, nt("E"));
    for expected in [nt("T"), nt("F")] {
        assert_eq!(node.children.len(), 1);
        node = &outcome.ast.nodes[&node.children[0]];
        assert_eq!(node.symbol, expected);
    }
    assert_eq!(node.children.len(), 1);
    let terminal = &outcome.ast.nodes[&node.children[0]];
    assert_eq!(terminal.symbol, t("id"));
}

#[test]
fn g1_precedence_binds_multiplication_tighter() {
    let (grammar, table) = g1();
    let engine = ParserEngine::new(&grammar, &table).unwrap();
    let outcome = engine.parse("id + id * id");
    assert!(outcome.accepted);

    let root_id = outcome.ast.root.expect("root node");
    let root = &outcome.ast.nodes[&root_id];
    assert_eq!(root.symbol, nt("E"));
    assert_eq!(root.children.len(), 3);
    let plus_child = &outcome.ast.nodes[&root.children[1]];
    assert_eq!(plus_child.symbol, t("+"));
    let right_t = &outcome.ast.nodes[&root.children[2]];
    assert_eq!(right_t.symbol, nt("T"));
    assert_eq!(right_t.children.len(), 3, "T -> T * F has three children");
}

#[test]
fn g1_dangling_plus_reports_no_action() {
    let (grammar, table) = g1();
    let engine = ParserEngine::new(&grammar, &table).unwrap();
    let outcome = engine.parse("id +");
    assert!(!outcome.accepted);
    assert!(matches!(outcome.error, Some(ParseError::NoAction { token, .. }) if token == "$"));
}

// G2: S -> S S | a (ambiguous)
#[test]
fn g2_ambiguous_grammar_blocks_engine_construction() {
    let (grammar, errors) = Grammar::new(
        vec![(nt("S"), vec![nt("S"), nt("S")]), (nt("S"), vec![t("a")])],
        nt("S"),
    );
    assert!(errors.is_empty());
    let automaton = Automaton::build(&grammar);
    let table = ParsingTable::build(&grammar, &automaton);
    assert!(!table.is_valid());
    assert!(table.conflicts().iter().any(|c| c.symbol == t("a")));
    assert!(ParserEngine::new(&grammar, &table).is_err());
}

// G3: S -> A B; A -> a | epsilon; B -> b | epsilon
fn g3() -> (Grammar, ParsingTable) {
    build(
        vec![
            (nt("S"), vec![nt("A"), nt("B")]),
            (nt("A"), vec![t("a")]),
            (nt("A"), vec![]),
            (nt("B"), vec![t("b")]),
            (nt("B"), vec![]),
        ],
        nt("S"),
    )
}

#[test]
fn g3_first_of_start_contains_epsilon_and_both_terminals() {
    let (grammar, _) = g3();
    let first_s = grammar.first(&[nt("S")]);
    assert!(first_s.contains(&t("a")));
    assert!(first_s.contains(&t("b")));
    assert!(first_s.contains(&Symbol::epsilon()));
}

#[test]
fn g3_every_combination_of_optional_symbols_accepts() {
    let (grammar, table) = g3();
    let engine = ParserEngine::new(&grammar, &table).unwrap();
    for input in ["a b", "a", "b", ""] {
        let outcome = engine.parse(input);
        assert!(outcome.accepted, "expected `{input}` to accept");
    }
}

// G4: S -> A | B; A -> a; B -> a (reduce/reduce)
#[test]
fn g4_reduce_reduce_conflict_on_end_marker() {
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
    assert!(!table.is_valid());
    assert!(table.conflicts().iter().any(|c| c.symbol == Symbol::end_marker()));
}

// G5: S -> ( S ) | ( )
fn g5() -> (Grammar, ParsingTable) {
    build(
        vec![(nt("S"), vec![t("("), nt("S"), t(")")]), (nt("S"), vec![t("("), t(")")])],
        nt("S"),
    )
}

#[test]
fn g5_nested_parens_accept() {
    let (grammar, table) = g5();
    let engine = ParserEngine::new(&grammar, &table).unwrap();
    let outcome = engine.parse("( ( ) )");
    assert!(outcome.accepted);
}

#[test]
fn g5_dangling_parens_report_no_action() {
    let (grammar, table) = g5();
    let engine = ParserEngine::new(&grammar, &table).unwrap();
    let outcome = engine.parse("( (");
    assert!(!outcome.accepted);
    assert!(matches!(outcome.error, Some(ParseError::NoAction { token, .. }) if token == "$"));
}
