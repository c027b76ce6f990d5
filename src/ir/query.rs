//! Structural queries over the syntax tree.

use crate::ir::tree::{NodeId, NodeKind, SyntaxTree};

/// Collect every node in the subtree rooted at `root` (root included)
/// that satisfies `pred`, in pre-order.
pub fn query_subtree<F>(tree: &SyntaxTree, root: NodeId, mut pred: F) -> Vec<NodeId>
where
    F: FnMut(NodeId, &NodeKind) -> bool,
{
    let mut found = Vec::new();
    let mut stack = vec![root];

    while let Some(id) = stack.pop() {
        let kind = tree.kind(id);
        if pred(id, kind) {
            found.push(id);
        }
        // Reverse so the leftmost child is visited first
        stack.extend(kind.children().into_iter().rev());
    }

    found
}

/// All `for` loops in a subtree, independent of nesting.
pub fn loops_in(tree: &SyntaxTree, root: NodeId) -> Vec<NodeId> {
    query_subtree(tree, root, |_, kind| kind.is_loop())
}

/// Strict ancestors of `id`, innermost first.
pub fn ancestors(tree: &SyntaxTree, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
    std::iter::successors(tree.parent(id), move |&n| tree.parent(n))
}

/// The nearest `for` loop strictly enclosing `id`.
pub fn enclosing_loop(tree: &SyntaxTree, id: NodeId) -> Option<NodeId> {
    ancestors(tree, id).find(|&n| tree.kind(n).is_loop())
}

/// The nearest `for` loop strictly enclosing `id` and strictly inside `scope`.
pub fn enclosing_loop_within(tree: &SyntaxTree, id: NodeId, scope: NodeId) -> Option<NodeId> {
    ancestors(tree, id)
        .take_while(|&n| n != scope)
        .find(|&n| tree.kind(n).is_loop())
}

/// The statement containing `id`, or `id` itself if it is a statement.
pub fn enclosing_statement(tree: &SyntaxTree, id: NodeId) -> Option<NodeId> {
    std::iter::once(id)
        .chain(ancestors(tree, id))
        .find(|&n| tree.kind(n).is_statement())
}

pub fn enclosing_function(tree: &SyntaxTree, id: NodeId) -> Option<NodeId> {
    ancestors(tree, id).find(|&n| matches!(tree.kind(n), NodeKind::Function { .. }))
}

/// True if `ancestor` strictly encloses `node`.
pub fn is_ancestor(tree: &SyntaxTree, ancestor: NodeId, node: NodeId) -> bool {
    ancestors(tree, node).any(|n| n == ancestor)
}
