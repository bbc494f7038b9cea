//! The shift-reduce driver: consumes a token stream against a
//! conflict-free [`ParsingTable`], emitting a step-by-step trace and a
//! parent-linked abstract syntax tree, per spec.md §4.5.
//!
//! Grounded on the teacher's `lalr1::Parser::parse_text` stack-driven
//! loop (`lalr1/src/lib.rs`), retargeted from code-generated
//! `next_action`/`goto_state` trait methods to live [`ParsingTable`]
//! lookups, and on `original_source/backend/parser/engine.py` for the
//! step/trace/AST shapes. Unlike the original, this engine actually
//! links `children`/`parent` on every reduction — the original builds
//! `ASTNode`s on reduce but never assigns either field, which spec.md
//! §8's AST law forbids.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Serialize, Serializer};

use crate::error::{ParseError, TableError};
use crate::grammar::Grammar;
use crate::production::ProductionId;
use crate::symbol::Symbol;
use crate::table::{Action, ParsingTable};
use crate::tokenizer;

/// Identifier of an [`AstNode`], monotonically increasing within one parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node_{}", self.0)
    }
}

/// Serializes as the `"node_{n}"` string spec.md §6's AST format expects
/// for `id`/`children`/`parent` fields and for `Ast::nodes`' map keys,
/// not as the bare `u32` the derive would otherwise emit.
impl Serialize for NodeId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A node of the parse tree. Non-root nodes have exactly one parent;
/// a non-terminal node's `children` are in left-to-right rhs order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AstNode {
    pub id: NodeId,
    pub symbol: Symbol,
    pub children: Vec<NodeId>,
    pub parent: Option<NodeId>,
    pub production: Option<ProductionId>,
}

/// The full tree produced by a parse: every node keyed by id, plus the
/// root (`None` if no parse tree could be identified).
#[derive(Debug, Clone, Default, Serialize)]
pub struct Ast {
    pub nodes: BTreeMap<NodeId, AstNode>,
    pub root: Option<NodeId>,
}

/// `{kind, target}` view of a single ACTION applied during a step.
#[derive(Debug, Clone, Serialize)]
pub struct ActionRecord {
    pub kind: String,
    pub target: Option<String>,
}

impl ActionRecord {
    fn shift(state: usize) -> Self {
        ActionRecord { kind: "shift".to_string(), target: Some(state.to_string()) }
    }

    fn reduce(production: ProductionId) -> Self {
        ActionRecord { kind: "reduce".to_string(), target: Some(production.to_string()) }
    }

    fn accept() -> Self {
        ActionRecord { kind: "accept".to_string(), target: None }
    }

    fn error() -> Self {
        ActionRecord { kind: "error".to_string(), target: None }
    }
}

/// One row of the trace: the stack *before* the action was applied,
/// the action itself, and the AST nodes (0 or 1) created while applying it.
#[derive(Debug, Clone, Serialize)]
pub struct ParsingStep {
    pub step_number: usize,
    pub stack: Vec<(usize, String)>,
    pub cursor: usize,
    pub current_token: String,
    pub action: ActionRecord,
    pub explanation: String,
    pub ast_nodes_created: Vec<NodeId>,
}

/// Result of driving one input through the engine.
#[derive(Debug, Clone, Serialize)]
pub struct ParseOutcome {
    pub steps: Vec<ParsingStep>,
    pub accepted: bool,
    pub ast: Ast,
    pub error: Option<ParseError>,
}

/// Tunable limits for one engine, mirroring the teacher's
/// `CLOptions::expect` tunable-expectation idiom (`alap_gen/src/main.rs`)
/// generalized from "expected conflict count" to "step-limit multiplier
/// and cooperative cancellation", per spec.md §5's cancellation note.
pub struct EngineLimits {
    /// Safety bound is `step_limit_multiplier * tokens.len()`. Spec.md
    /// §4.5 fixes this at 10; exposed here as a knob rather than a
    /// hard-coded constant.
    pub step_limit_multiplier: usize,
    /// Polled once per step; returning `true` aborts the parse with
    /// [`ParseError::Cancelled`].
    pub cancellation: Option<Box<dyn Fn() -> bool>>,
}

impl Default for EngineLimits {
    fn default() -> Self {
        EngineLimits { step_limit_multiplier: 10, cancellation: None }
    }
}

impl fmt::Debug for EngineLimits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineLimits")
            .field("step_limit_multiplier", &self.step_limit_multiplier)
            .field("cancellation", &self.cancellation.is_some())
            .finish()
    }
}

/// Drives a single grammar/table pair over arbitrary input. Stateless
/// between calls: each [`ParserEngine::parse`] builds a fresh stack and
/// AST, per spec.md §3's "Engine creates a new Parser state per input
/// and discards it after emitting the trace".
pub struct ParserEngine<'g> {
    grammar: &'g Grammar,
    table: &'g ParsingTable,
    limits: EngineLimits,
}

impl<'g> ParserEngine<'g> {
    /// Refuses a conflicted table, per spec.md §4.5's precondition.
    pub fn new(grammar: &'g Grammar, table: &'g ParsingTable) -> Result<Self, TableError> {
        Self::with_limits(grammar, table, EngineLimits::default())
    }

    pub fn with_limits(
        grammar: &'g Grammar,
        table: &'g ParsingTable,
        limits: EngineLimits,
    ) -> Result<Self, TableError> {
        if !table.is_valid() {
            return Err(TableError::HasConflicts(table.conflicts().to_vec()));
        }
        Ok(ParserEngine { grammar, table, limits })
    }

    /// Tokenizes `input` with the minimal tokenizer (spec.md §4.6) and
    /// drives the shift-reduce loop over the result.
    pub fn parse(&self, input: &str) -> ParseOutcome {
        self.parse_tokens(tokenizer::tokenize(input))
    }

    /// Drives the shift-reduce loop over an already-tokenized input.
    /// `tokens` must end with exactly one `$`.
    pub fn parse_tokens(&self, tokens: Vec<String>) -> ParseOutcome {
        let step_limit = self.limits.step_limit_multiplier * tokens.len();

        let mut stack: Vec<(usize, Option<Symbol>)> = vec![(0, None)];
        let mut ast_stack: Vec<Option<NodeId>> = vec![None];
        let mut nodes: BTreeMap<NodeId, AstNode> = BTreeMap::new();
        let mut next_id = 0u32;
        let mut steps = Vec::new();
        let mut cursor = 0usize;
        let mut step_number = 0usize;

        loop {
            if let Some(cancellation) = &self.limits.cancellation {
                if cancellation() {
                    push_terminal_step(&mut steps, step_number, &stack, cursor, &tokens, "parse cancelled");
                    return ParseOutcome {
                        steps,
                        accepted: false,
                        ast: finalize_ast(nodes, self.grammar.user_start()),
                        error: Some(ParseError::Cancelled),
                    };
                }
            }

            if step_number >= step_limit {
                push_terminal_step(
                    &mut steps,
                    step_number,
                    &stack,
                    cursor,
                    &tokens,
                    &format!("step limit of {step_limit} exceeded"),
                );
                return ParseOutcome {
                    steps,
                    accepted: false,
                    ast: finalize_ast(nodes, self.grammar.user_start()),
                    error: Some(ParseError::StepLimitExceeded(step_limit)),
                };
            }

            let state = stack.last().expect("stack never empties").0;
            let current_token = tokens[cursor].clone();
            let lookahead = if current_token == "$" {
                Symbol::end_marker()
            } else {
                Symbol::terminal(&current_token)
            };

            let Some(action) = self.table.action(state, &lookahead) else {
                push_terminal_step(
                    &mut steps,
                    step_number,
                    &stack,
                    cursor,
                    &tokens,
                    &format!("no action defined in state {state} for token `{current_token}`"),
                );
                return ParseOutcome {
                    steps,
                    accepted: false,
                    ast: finalize_ast(nodes, self.grammar.user_start()),
                    error: Some(ParseError::NoAction { state, token: current_token }),
                };
            };

            let stack_before = render_stack(&stack);

            match action {
                Action::Shift(next_state) => {
                    let id = NodeId(next_id);
                    next_id += 1;
                    nodes.insert(
                        id,
                        AstNode { id, symbol: lookahead.clone(), children: Vec::new(), parent: None, production: None },
                    );
                    stack.push((next_state, Some(lookahead.clone())));
                    ast_stack.push(Some(id));
                    steps.push(ParsingStep {
                        step_number,
                        stack: stack_before,
                        cursor,
                        current_token: current_token.clone(),
                        action: ActionRecord::shift(next_state),
                        explanation: format!("shift `{current_token}`, go to state {next_state}"),
                        ast_nodes_created: vec![id],
                    });
                    cursor += 1;
                    step_number += 1;
                }
                Action::Reduce(production_id) => {
                    let production = self.grammar.production(production_id);
                    let k = production.len();
                    let split_at = stack.len() - k;
                    stack.truncate(split_at);
                    let children: Vec<NodeId> = ast_stack.split_off(split_at).into_iter().flatten().collect();

                    let id = NodeId(next_id);
                    next_id += 1;
                    for &child in &children {
                        if let Some(child_node) = nodes.get_mut(&child) {
                            child_node.parent = Some(id);
                        }
                    }
                    nodes.insert(
                        id,
                        AstNode {
                            id,
                            symbol: production.lhs.clone(),
                            children: children.clone(),
                            parent: None,
                            production: Some(production_id),
                        },
                    );

                    let state_after_pop = stack.last().expect("stack never empties").0;
                    let Some(goto_state) = self.table.goto(state_after_pop, &production.lhs) else {
                        steps.push(ParsingStep {
                            step_number,
                            stack: stack_before,
                            cursor,
                            current_token: current_token.clone(),
                            action: ActionRecord::error(),
                            explanation: format!(
                                "no goto defined in state {state_after_pop} for non-terminal `{}`",
                                production.lhs
                            ),
                            ast_nodes_created: vec![id],
                        });
                        return ParseOutcome {
                            steps,
                            accepted: false,
                            ast: finalize_ast(nodes, self.grammar.user_start()),
                            error: Some(ParseError::MissingGoto { state: state_after_pop, symbol: production.lhs.clone() }),
                        };
                    };

                    stack.push((goto_state, Some(production.lhs.clone())));
                    ast_stack.push(Some(id));
                    steps.push(ParsingStep {
                        step_number,
                        stack: stack_before,
                        cursor,
                        current_token: current_token.clone(),
                        action: ActionRecord::reduce(production_id),
                        explanation: format!("reduce by production {production_id}: {production}"),
                        ast_nodes_created: vec![id],
                    });
                    step_number += 1;
                }
                Action::Accept => {
                    steps.push(ParsingStep {
                        step_number,
                        stack: stack_before,
                        cursor,
                        current_token: current_token.clone(),
                        action: ActionRecord::accept(),
                        explanation: "accept".to_string(),
                        ast_nodes_created: Vec::new(),
                    });
                    return ParseOutcome {
                        steps,
                        accepted: true,
                        ast: finalize_ast(nodes, self.grammar.user_start()),
                        error: None,
                    };
                }
            }
        }
    }
}

fn render_stack(stack: &[(usize, Option<Symbol>)]) -> Vec<(usize, String)> {
    stack
        .iter()
        .map(|(state, symbol)| (*state, symbol.as_ref().map(|s| s.to_string()).unwrap_or_default()))
        .collect()
}

fn push_terminal_step(
    steps: &mut Vec<ParsingStep>,
    step_number: usize,
    stack: &[(usize, Option<Symbol>)],
    cursor: usize,
    tokens: &[String],
    explanation: &str,
) {
    steps.push(ParsingStep {
        step_number,
        stack: render_stack(stack),
        cursor,
        current_token: tokens.get(cursor).cloned().unwrap_or_default(),
        action: ActionRecord::error(),
        explanation: explanation.to_string(),
        ast_nodes_created: Vec::new(),
    });
}

/// Root selection per spec.md §4.5: the last-reduced node carrying the
/// user start symbol; failing that, the last parent-less non-terminal
/// node with children; failing that, the last parent-less node.
fn finalize_ast(nodes: BTreeMap<NodeId, AstNode>, user_start: &Symbol) -> Ast {
    let root = nodes
        .values()
        .filter(|n| n.parent.is_none() && &n.symbol == user_start)
        .max_by_key(|n| n.id.0)
        .map(|n| n.id)
        .or_else(|| {
            nodes
                .values()
                .filter(|n| n.parent.is_none() && n.symbol.is_non_terminal() && !n.children.is_empty())
                .max_by_key(|n| n.id.0)
                .map(|n| n.id)
        })
        .or_else(|| nodes.values().filter(|n| n.parent.is_none()).max_by_key(|n| n.id.0).map(|n| n.id));

    Ast { nodes, root }
}
