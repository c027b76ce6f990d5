//! Common enclosing loop resolution.

use std::collections::HashSet;
use crate::ir::query::is_ancestor;
use crate::ir::tree::{NodeId, SyntaxTree};
use crate::utils::errors::{AnalysisError, AnalysisErrorKind};

/// Loops enclosing `from`, innermost first, starting with `from` itself
/// if it is a loop and stopping before `boundary`.
///
/// Fails if the walk reaches the root without meeting `boundary`, which
/// means `from` lies outside the analyzed scope.
pub fn outer_loop_chain(tree: &SyntaxTree, from: NodeId, boundary: NodeId) -> Result<Vec<NodeId>, AnalysisError> {
    let mut chain = Vec::new();
    let mut current = Some(from);

    while let Some(node) = current {
        if node == boundary {
            return Ok(chain);
        }
        if tree.kind(node).is_loop() {
            chain.push(node);
        }
        current = tree.parent(node);
    }

    Err(AnalysisError::new(
        AnalysisErrorKind::BoundaryNotReached,
        format!("reached the root from {} without meeting scope {}", from, boundary),
        tree.span(from),
    ))
}

/// The innermost loop enclosing both `a` and `b` (each counts as
/// enclosing itself), or `None` if they share no loop inside `boundary`.
///
/// When neither loop contains the other, the answer is the first loop on
/// the way out from `b` that also encloses `a`.
pub fn find_common_ancestor_loop(
    tree: &SyntaxTree,
    a: NodeId,
    b: NodeId,
    boundary: NodeId,
) -> Result<Option<NodeId>, AnalysisError> {
    if a == b {
        return Ok(Some(a));
    }
    if is_ancestor(tree, a, b) {
        return Ok(Some(a));
    }
    if is_ancestor(tree, b, a) {
        return Ok(Some(b));
    }

    let outer_a: HashSet<NodeId> = outer_loop_chain(tree, a, boundary)?.into_iter().collect();
    let common = outer_loop_chain(tree, b, boundary)?
        .into_iter()
        .find(|l| outer_a.contains(l));
    Ok(common)
}
