//! Canonical `for` loop decomposition.
//!
//! A canonical loop has the shape
//!
//! ```text
//! for (i = lb; i <op> ub; <incr>) body
//! ```
//!
//! with one initializer (an assignment or a single initialized
//! declaration), `<op>` one of `< <= > >=`, and `<incr>` one of
//! `i++ ++i i-- --i i += c i -= c i = i + c i = c + i i = i - c`.
//! Every part must name the same variable.

use crate::frontend::ast::{AssignOp, BinaryOp};
use crate::ir::tree::{NodeId, NodeKind, SymbolId, SyntaxTree};
use serde::Serialize;

/// How the induction variable advances each iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LoopStep {
    /// `++` or `--`; the step is the unit delta
    Unit(i64),
    /// The step expression from `+=`, `-=` or `i = i ± c`
    Expr {
        expr: NodeId,
        /// Set for `-=` and `i = i - c`
        negated: bool,
    },
}

impl LoopStep {
    /// The step as an integer, if it is written as a literal.
    ///
    /// No folding is attempted: `i += 2` has a literal step, `i += 1 + 1`
    /// and `i += -2` do not.
    pub fn literal_value(&self, tree: &SyntaxTree) -> Option<i64> {
        match *self {
            LoopStep::Unit(delta) => Some(delta),
            LoopStep::Expr { expr, negated } => match tree.kind(expr) {
                NodeKind::IntLit(n) if negated => n.checked_neg(),
                NodeKind::IntLit(n) => Some(*n),
                _ => None,
            },
        }
    }
}

/// The parts of a canonical `for` loop.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CanonicalLoop {
    pub induction_var: SymbolId,
    /// The initializer statement
    pub init: NodeId,
    pub lower_bound: NodeId,
    pub upper_bound: NodeId,
    pub test_op: BinaryOp,
    pub step: LoopStep,
    pub body: NodeId,
}

/// Decompose a `for` loop into its canonical parts.
///
/// Returns `None` if `loop_node` is not a `for` loop or does not have the
/// canonical shape.
pub fn decompose_for(tree: &SyntaxTree, loop_node: NodeId) -> Option<CanonicalLoop> {
    let NodeKind::For { init, test, incr, body } = tree.kind(loop_node) else {
        return None;
    };

    let init = (*init)?;
    let (induction_var, lower_bound) = decompose_init(tree, init)?;
    let (test_op, upper_bound) = decompose_test(tree, (*test)?, induction_var)?;
    let step = decompose_incr(tree, (*incr)?, induction_var)?;

    Some(CanonicalLoop {
        induction_var,
        init,
        lower_bound,
        upper_bound,
        test_op,
        step,
        body: *body,
    })
}

fn var_symbol(tree: &SyntaxTree, id: NodeId) -> Option<SymbolId> {
    match tree.kind(id) {
        NodeKind::VarRef(symbol) => Some(*symbol),
        _ => None,
    }
}

/// `i = lb` or `int i = lb`.
fn decompose_init(tree: &SyntaxTree, init: NodeId) -> Option<(SymbolId, NodeId)> {
    match tree.kind(init) {
        NodeKind::ExprStmt { expr } => match tree.kind(*expr) {
            NodeKind::Assign { op: AssignOp::Assign, target, value } => {
                Some((var_symbol(tree, *target)?, *value))
            }
            _ => None,
        },
        NodeKind::DeclStmt { decls } => match decls.as_slice() {
            [decl] => match tree.kind(*decl) {
                NodeKind::VarDecl { symbol, dims, init: Some(value) } if dims.is_empty() => {
                    Some((*symbol, *value))
                }
                _ => None,
            },
            _ => None,
        },
        _ => None,
    }
}

/// `i <op> ub`.
fn decompose_test(tree: &SyntaxTree, test: NodeId, var: SymbolId) -> Option<(BinaryOp, NodeId)> {
    match tree.kind(test) {
        NodeKind::Binary { op, lhs, rhs } if op.is_relational() && var_symbol(tree, *lhs) == Some(var) => {
            Some((*op, *rhs))
        }
        _ => None,
    }
}

fn decompose_incr(tree: &SyntaxTree, incr: NodeId, var: SymbolId) -> Option<LoopStep> {
    match tree.kind(incr) {
        NodeKind::IncDec { op, operand } if var_symbol(tree, *operand) == Some(var) => {
            Some(LoopStep::Unit(op.delta()))
        }
        NodeKind::Assign { op, target, value } if var_symbol(tree, *target) == Some(var) => match op {
            AssignOp::AddAssign => Some(LoopStep::Expr { expr: *value, negated: false }),
            AssignOp::SubAssign => Some(LoopStep::Expr { expr: *value, negated: true }),
            AssignOp::Assign => match tree.kind(*value) {
                NodeKind::Binary { op: BinaryOp::Add, lhs, rhs } => {
                    if var_symbol(tree, *lhs) == Some(var) {
                        Some(LoopStep::Expr { expr: *rhs, negated: false })
                    } else if var_symbol(tree, *rhs) == Some(var) {
                        Some(LoopStep::Expr { expr: *lhs, negated: false })
                    } else {
                        None
                    }
                }
                NodeKind::Binary { op: BinaryOp::Sub, lhs, rhs } if var_symbol(tree, *lhs) == Some(var) => {
                    Some(LoopStep::Expr { expr: *rhs, negated: true })
                }
                _ => None,
            },
            _ => None,
        },
        _ => None,
    }
}
