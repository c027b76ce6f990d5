//! Array access classification.
//!
//! Filters the read and write references of a scope down to array
//! element accesses and resolves each one to the array it touches.

use crate::ir::query::enclosing_loop_within;
use crate::ir::refs::{base_symbol, collect_read_write_refs, decompose_subscript};
use crate::ir::tree::{NodeId, SymbolId, SyntaxTree};
use crate::utils::errors::{AnalysisError, AnalysisErrorKind};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum AccessKind {
    Read,
    Write,
}

/// A subscript expression classified as a read or a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ArrayAccess {
    /// The array, as a named entity rather than an expression
    pub array: SymbolId,
    /// The outermost subscript expression
    pub node: NodeId,
    /// Nearest enclosing `for` loop inside the analyzed scope
    pub enclosing_loop: Option<NodeId>,
    pub kind: AccessKind,
}

/// Reads and writes of a scope, each in lexical order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassifiedAccesses {
    pub reads: Vec<ArrayAccess>,
    pub writes: Vec<ArrayAccess>,
}

impl ClassifiedAccesses {
    pub fn len(&self) -> usize {
        self.reads.len() + self.writes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reads.is_empty() && self.writes.is_empty()
    }
}

/// Collect the array element reads and writes within `scope`.
///
/// Fails if a subscript's base is not a named variable, as in `f(x)[i]`.
pub fn classify_accesses(tree: &SyntaxTree, scope: NodeId) -> Result<ClassifiedAccesses, AnalysisError> {
    let refs = collect_read_write_refs(tree, scope);

    Ok(ClassifiedAccesses {
        reads: resolve_accesses(tree, scope, &refs.reads, AccessKind::Read)?,
        writes: resolve_accesses(tree, scope, &refs.writes, AccessKind::Write)?,
    })
}

fn resolve_accesses(
    tree: &SyntaxTree,
    scope: NodeId,
    refs: &[NodeId],
    kind: AccessKind,
) -> Result<Vec<ArrayAccess>, AnalysisError> {
    let mut accesses = Vec::new();

    for &node in refs {
        let Some(parts) = decompose_subscript(tree, node) else {
            continue;
        };
        let array = base_symbol(tree, parts.base).ok_or_else(|| {
            AnalysisError::new(
                AnalysisErrorKind::UnresolvableBase,
                format!("cannot resolve array base of type {}", tree.kind(parts.base).label()),
                tree.span(node),
            )
        })?;

        accesses.push(ArrayAccess {
            array,
            node,
            enclosing_loop: enclosing_loop_within(tree, node, scope),
            kind,
        });
    }

    Ok(accesses)
}
