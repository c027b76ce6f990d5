//! Read and write reference collection.
//!
//! A reference is a plain variable (`VarRef`) or an outermost subscript
//! expression (`a[i][j]`). References are collected in lexical order: a
//! pre-order walk that visits children in source order, with an
//! assignment target visited before its value.
//!
//! Compound assignments and `++`/`--` make their operand both a read and
//! a write. Subscript indices are always reads. Taking the address of a
//! plain variable (`&x`) is neither a read nor a write reference, but `x`
//! is recorded as addressed and counts as written by `written_symbols`.

use std::collections::HashSet;
use crate::frontend::ast::UnaryOp;
use crate::ir::tree::{NodeId, NodeKind, SymbolId, SyntaxTree};

/// Read and write references within a scope, each in lexical order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefSets {
    pub reads: Vec<NodeId>,
    pub writes: Vec<NodeId>,
    /// Plain variables whose address is taken (`&x`)
    pub addressed: Vec<NodeId>,
}

/// A subscript expression split into its base and index list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptParts {
    /// The innermost non-subscript base expression
    pub base: NodeId,
    /// Index expressions, outermost dimension first
    pub subscripts: Vec<NodeId>,
}

/// How an lvalue is used at the point it is visited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Access {
    Read,
    Write,
    ReadWrite,
    /// Operand of `&`
    Address,
}

struct RefCollector<'t> {
    tree: &'t SyntaxTree,
    refs: RefSets,
}

impl<'t> RefCollector<'t> {
    fn visit(&mut self, id: NodeId) {
        match self.tree.kind(id) {
            NodeKind::VarRef(_) | NodeKind::Subscript { .. } => self.visit_lvalue(id, Access::Read),
            NodeKind::Assign { op, target, value } => {
                let access = if op.is_compound() { Access::ReadWrite } else { Access::Write };
                self.visit_lvalue(*target, access);
                self.visit(*value);
            }
            NodeKind::IncDec { operand, .. } => self.visit_lvalue(*operand, Access::ReadWrite),
            NodeKind::Unary { op: UnaryOp::AddrOf, operand } => self.visit_lvalue(*operand, Access::Address),
            kind => {
                for child in kind.children() {
                    self.visit(child);
                }
            }
        }
    }

    fn visit_lvalue(&mut self, id: NodeId, access: Access) {
        match self.tree.kind(id) {
            NodeKind::VarRef(_) | NodeKind::Subscript { .. } => {
                if matches!(access, Access::Read | Access::ReadWrite) {
                    self.refs.reads.push(id);
                }
                if matches!(access, Access::Write | Access::ReadWrite) {
                    self.refs.writes.push(id);
                }
                if access == Access::Address && matches!(self.tree.kind(id), NodeKind::VarRef(_)) {
                    self.refs.addressed.push(id);
                }
                if let Some(parts) = decompose_subscript(self.tree, id) {
                    // The base is part of the reference unless it is a computed expression
                    if !matches!(self.tree.kind(parts.base), NodeKind::VarRef(_)) {
                        self.visit(parts.base);
                    }
                    for index in parts.subscripts {
                        self.visit(index);
                    }
                }
            }
            // `*p = ...` reads the pointer; pointer targets are not tracked
            _ => self.visit(id),
        }
    }
}

/// Collect read and write references in the subtree rooted at `scope`.
pub fn collect_read_write_refs(tree: &SyntaxTree, scope: NodeId) -> RefSets {
    let mut collector = RefCollector { tree, refs: RefSets::default() };
    collector.visit(scope);
    collector.refs
}

/// Every variable written anywhere in `scope`: assigned scalars, the
/// base arrays of written subscripts, and variables whose address escapes.
pub fn written_symbols(tree: &SyntaxTree, scope: NodeId) -> HashSet<SymbolId> {
    let refs = collect_read_write_refs(tree, scope);
    refs.writes
        .into_iter()
        .chain(refs.addressed)
        .filter_map(|id| match decompose_subscript(tree, id) {
            Some(parts) => base_symbol(tree, parts.base),
            None => base_symbol(tree, id),
        })
        .collect()
}

/// Split a subscript expression into its base and flattened index list.
///
/// `a[i][j]` and `(a[i])[j]` both decompose to base `a` with `[i, j]`.
/// Returns `None` if `id` is not a subscript.
pub fn decompose_subscript(tree: &SyntaxTree, id: NodeId) -> Option<SubscriptParts> {
    let NodeKind::Subscript { .. } = tree.kind(id) else {
        return None;
    };

    let mut levels = Vec::new();
    let mut current = id;
    while let NodeKind::Subscript { base, indices } = tree.kind(current) {
        levels.push(indices);
        current = *base;
    }

    let subscripts = levels.into_iter().rev().flatten().copied().collect();
    Some(SubscriptParts { base: current, subscripts })
}

/// The named entity an expression refers to, if it is a plain variable.
pub fn base_symbol(tree: &SyntaxTree, expr: NodeId) -> Option<SymbolId> {
    match tree.kind(expr) {
        NodeKind::VarRef(symbol) => Some(*symbol),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::parse;
    use crate::ir::lower_ast::lower_program;

    fn build(body: &str) -> SyntaxTree {
        let source = format!(
            "int g(int x); void f(int n, double a[10][10], double b[10], double *p) {{ int i, j, x; {} }}",
            body
        );
        lower_program(&parse(&source).unwrap()).unwrap()
    }

    fn body(tree: &SyntaxTree) -> NodeId {
        let f = tree.find_function("f").unwrap();
        tree.function_body(f).unwrap()
    }

    /// Render references as `name` or `name[]` for compact assertions.
    fn describe(tree: &SyntaxTree, ids: &[NodeId]) -> Vec<String> {
        ids.iter()
            .map(|&id| match decompose_subscript(tree, id) {
                Some(parts) => format!("{}[]", tree.symbol_name(base_symbol(tree, parts.base).unwrap())),
                None => tree.symbol_name(base_symbol(tree, id).unwrap()).to_string(),
            })
            .collect()
    }

    #[test]
    fn test_assignment_refs() {
        let tree = build("a[i][j] = b[i] + x;");
        let refs = collect_read_write_refs(&tree, body(&tree));
        assert_eq!(describe(&tree, &refs.writes), vec!["a[]"]);
        assert_eq!(describe(&tree, &refs.reads), vec!["i", "j", "b[]", "i", "x"]);
    }

    #[test]
    fn test_compound_and_incdec() {
        let tree = build("b[i] += 1.0; x++; --j;");
        let refs = collect_read_write_refs(&tree, body(&tree));
        assert_eq!(describe(&tree, &refs.writes), vec!["b[]", "x", "j"]);
        assert_eq!(describe(&tree, &refs.reads), vec!["b[]", "i", "x", "j"]);
        // The same node is both read and written
        assert_eq!(refs.reads[0], refs.writes[0]);
    }

    #[test]
    fn test_address_of_and_calls() {
        let tree = build("x = g(j) + *p; scanf(&x, &b[i]);");
        let refs = collect_read_write_refs(&tree, body(&tree));
        assert_eq!(describe(&tree, &refs.writes), vec!["x"]);
        assert_eq!(describe(&tree, &refs.reads), vec!["j", "p", "i"]);
        // `&b[i]` escapes an element, not a variable
        assert_eq!(describe(&tree, &refs.addressed), vec!["x"]);
    }

    #[test]
    fn test_address_taken_counts_as_written() {
        let tree = build("g(&j); x = i;");
        let written = written_symbols(&tree, body(&tree));
        let mut names: Vec<_> = written.iter().map(|s| tree.symbol_name(*s)).collect();
        names.sort();
        assert_eq!(names, vec!["j", "x"]);
    }

    #[test]
    fn test_declaration_initializers_are_reads() {
        let tree = build("{ int y = x + 1; double c[n]; }");
        let refs = collect_read_write_refs(&tree, body(&tree));
        assert!(refs.writes.is_empty());
        assert_eq!(describe(&tree, &refs.reads), vec!["x", "n"]);
    }

    #[test]
    fn test_for_header_refs() {
        let tree = build("for (i = 0; i < n; i++) b[i] = 0.0;");
        let refs = collect_read_write_refs(&tree, body(&tree));
        assert_eq!(describe(&tree, &refs.writes), vec!["i", "i", "b[]"]);
        assert_eq!(describe(&tree, &refs.reads), vec!["i", "n", "i", "i"]);
    }

    #[test]
    fn test_written_symbols() {
        let tree = build("a[i][j] = 1.0; x = 2; i++; *p = 3.0;");
        let written = written_symbols(&tree, body(&tree));
        let mut names: Vec<_> = written.iter().map(|s| tree.symbol_name(*s)).collect();
        names.sort();
        assert_eq!(names, vec!["a", "i", "x"]);
    }

    #[test]
    fn test_decompose_subscript() {
        let tree = build("x = (a[i])[j + 1];");
        let refs = collect_read_write_refs(&tree, body(&tree));
        let access = refs.reads[0];
        let parts = decompose_subscript(&tree, access).unwrap();
        assert_eq!(tree.symbol_name(base_symbol(&tree, parts.base).unwrap()), "a");
        assert_eq!(parts.subscripts.len(), 2);
        assert!(matches!(tree.kind(parts.subscripts[0]), NodeKind::VarRef(_)));
        assert!(matches!(tree.kind(parts.subscripts[1]), NodeKind::Binary { .. }));
        assert!(decompose_subscript(&tree, parts.base).is_none());
    }

    #[test]
    fn test_computed_base_is_visited() {
        let tree = build("x = g(j)[i];");
        let refs = collect_read_write_refs(&tree, body(&tree));
        // the subscript itself, then the call argument, then the index
        assert_eq!(refs.reads.len(), 3);
        let parts = decompose_subscript(&tree, refs.reads[0]).unwrap();
        assert!(base_symbol(&tree, parts.base).is_none());
    }
}
