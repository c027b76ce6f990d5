//! Dependence testing pair construction.
//!
//! Pairs up accesses to the same array that share an analyzable loop
//! nest. Each pair carries the induction variables of the loops enclosing
//! both accesses, outermost first. These pairs are the input a precise
//! dependence test would consume; no such test is run here.

use log::trace;
use serde::Serialize;
use crate::analysis::access::ArrayAccess;
use crate::analysis::ancestor::{find_common_ancestor_loop, outer_loop_chain};
use crate::analysis::loops::AnalyzableLoops;
use crate::ir::tree::{NodeId, SymbolId, SyntaxTree};
use crate::utils::errors::AnalysisError;

/// A candidate aliasing pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependenceTestingPair {
    pub access_a: ArrayAccess,
    pub access_b: ArrayAccess,
    /// Common analyzable loops, outermost first
    pub common_loops: Vec<NodeId>,
    /// Induction variables of `common_loops`, never empty
    pub common_induction_variables: Vec<SymbolId>,
}

/// All candidate pairs of one analyzed scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependenceCollection {
    pub scope: NodeId,
    pub write_write: Vec<DependenceTestingPair>,
    pub write_read: Vec<DependenceTestingPair>,
}

impl DependenceCollection {
    pub fn new(scope: NodeId) -> Self {
        Self {
            scope,
            write_write: Vec::new(),
            write_read: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.write_write.len() + self.write_read.len()
    }

    pub fn is_empty(&self) -> bool {
        self.write_write.is_empty() && self.write_read.is_empty()
    }
}

/// Build the write-write and write-read pairs for `scope`.
///
/// Writes are paired with every later write (each unordered pair once,
/// never with themselves) and with every read, in discovery order.
pub fn build_candidates(
    tree: &SyntaxTree,
    writes: &[ArrayAccess],
    reads: &[ArrayAccess],
    loops: &AnalyzableLoops,
    scope: NodeId,
) -> Result<DependenceCollection, AnalysisError> {
    let mut collection = DependenceCollection::new(scope);

    for (index, write) in writes.iter().enumerate() {
        if write.enclosing_loop.is_none() {
            continue;
        }

        for other in &writes[index + 1..] {
            if let Some(pair) = make_pair(tree, write, other, loops, scope)? {
                trace!("write-write candidate {} / {}", write.node, other.node);
                collection.write_write.push(pair);
            }
        }

        for read in reads {
            if let Some(pair) = make_pair(tree, write, read, loops, scope)? {
                trace!("write-read candidate {} / {}", write.node, read.node);
                collection.write_read.push(pair);
            }
        }
    }

    Ok(collection)
}

fn make_pair(
    tree: &SyntaxTree,
    a: &ArrayAccess,
    b: &ArrayAccess,
    loops: &AnalyzableLoops,
    scope: NodeId,
) -> Result<Option<DependenceTestingPair>, AnalysisError> {
    if a.array != b.array {
        return Ok(None);
    }
    let (Some(loop_a), Some(loop_b)) = (a.enclosing_loop, b.enclosing_loop) else {
        return Ok(None);
    };
    let Some(ancestor) = find_common_ancestor_loop(tree, loop_a, loop_b, scope)? else {
        return Ok(None);
    };

    let mut common_loops: Vec<NodeId> = outer_loop_chain(tree, ancestor, scope)?
        .into_iter()
        .take_while(|&l| loops.contains(l))
        .collect();
    common_loops.reverse();

    let common_induction_variables: Vec<SymbolId> = common_loops
        .iter()
        .filter_map(|&l| loops.induction_variable(l))
        .collect();
    if common_induction_variables.is_empty() {
        return Ok(None);
    }

    Ok(Some(DependenceTestingPair {
        access_a: *a,
        access_b: *b,
        common_loops,
        common_induction_variables,
    }))
}
