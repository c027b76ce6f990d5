//! Loop analyzability check.
//!
//! A loop is analyzable when it is canonical, steps by an integer literal,
//! and never assigns its induction variable inside the body. Analyzable
//! loops are bound to their induction variable; other loops get a
//! rejection reason and are left out of dependence testing.

use crate::frontend::ast::Type;
use crate::ir::canonical::{decompose_for, CanonicalLoop};
use crate::ir::refs::written_symbols;
use crate::ir::tree::{NodeId, SymbolId, SyntaxTree};
use crate::utils::errors::{AnalysisError, AnalysisErrorKind};
use crate::AnalysisConfig;
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// An analyzable loop and the variable it iterates over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct InductionVariableBinding {
    pub variable: SymbolId,
    pub loop_node: NodeId,
}

/// Why a loop is not analyzable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Rejection {
    /// Header is not `for (i = lb; i <op> ub; <incr>)`
    NotCanonical,
    /// Step is not an integer literal
    NonLiteralStep,
    /// Induction variable has a non-integer declared type
    NonIntegerIndex,
    /// Induction variable is written in the body
    IndexModified,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Rejection::NotCanonical => "not a canonical for loop",
            Rejection::NonLiteralStep => "step is not an integer literal",
            Rejection::NonIntegerIndex => "index variable is not an integer",
            Rejection::IndexModified => "index variable is modified in the body",
        };
        write!(f, "{}", s)
    }
}

/// Outcome of examining one loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LoopVerdict {
    Analyzable(InductionVariableBinding),
    Rejected(Rejection),
}

impl LoopVerdict {
    pub fn binding(&self) -> Option<InductionVariableBinding> {
        match self {
            LoopVerdict::Analyzable(binding) => Some(*binding),
            LoopVerdict::Rejected(_) => None,
        }
    }
}

/// A verdict together with the canonical parts, when the header had them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoopClassification {
    pub loop_node: NodeId,
    pub verdict: LoopVerdict,
    pub parts: Option<CanonicalLoop>,
}

/// Examine a single `for` loop.
///
/// Fails only if `loop_node` is not a `for` loop. A loop that does not
/// qualify gets a `Rejected` verdict.
pub fn classify_loop(
    tree: &SyntaxTree,
    loop_node: NodeId,
    config: &AnalysisConfig,
) -> Result<LoopClassification, AnalysisError> {
    if !tree.kind(loop_node).is_loop() {
        return Err(AnalysisError::new(
            AnalysisErrorKind::UnexpectedNode,
            format!("expected a for loop, found {}", tree.kind(loop_node).label()),
            tree.span(loop_node),
        ));
    }

    let rejected = |reason: Rejection, parts: Option<CanonicalLoop>| LoopClassification {
        loop_node,
        verdict: LoopVerdict::Rejected(reason),
        parts,
    };

    let Some(parts) = decompose_for(tree, loop_node) else {
        return Ok(rejected(Rejection::NotCanonical, None));
    };

    if parts.step.literal_value(tree).is_none() {
        return Ok(rejected(Rejection::NonLiteralStep, Some(parts)));
    }

    // Implicitly declared variables have no type to check
    let index_ty = &tree.symbol(parts.induction_var).ty;
    if config.require_integer_index && *index_ty != Type::Unknown && !index_ty.is_integer() {
        return Ok(rejected(Rejection::NonIntegerIndex, Some(parts)));
    }

    if written_symbols(tree, parts.body).contains(&parts.induction_var) {
        return Ok(rejected(Rejection::IndexModified, Some(parts)));
    }

    Ok(LoopClassification {
        loop_node,
        verdict: LoopVerdict::Analyzable(InductionVariableBinding {
            variable: parts.induction_var,
            loop_node,
        }),
        parts: Some(parts),
    })
}

/// Bind `loop_node` to its induction variable if the loop is analyzable.
pub fn check_analyzable(tree: &SyntaxTree, loop_node: NodeId) -> Option<InductionVariableBinding> {
    classify_loop(tree, loop_node, &AnalysisConfig::default())
        .ok()
        .and_then(|c| c.verdict.binding())
}

/// Analyzable loops of one scope, in discovery order.
///
/// Each loop has exactly one binding. A variable may index several
/// sibling loops, so the reverse lookup yields a list.
#[derive(Debug, Clone, Default)]
pub struct AnalyzableLoops {
    by_loop: IndexMap<NodeId, InductionVariableBinding>,
    by_variable: HashMap<SymbolId, Vec<NodeId>>,
}

impl AnalyzableLoops {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, binding: InductionVariableBinding) {
        if self.by_loop.insert(binding.loop_node, binding).is_none() {
            self.by_variable.entry(binding.variable).or_default().push(binding.loop_node);
        }
    }

    pub fn induction_variable(&self, loop_node: NodeId) -> Option<SymbolId> {
        self.by_loop.get(&loop_node).map(|b| b.variable)
    }

    pub fn contains(&self, loop_node: NodeId) -> bool {
        self.by_loop.contains_key(&loop_node)
    }

    /// Loops indexed by `variable`, in discovery order.
    pub fn loops_for(&self, variable: SymbolId) -> &[NodeId] {
        self.by_variable.get(&variable).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn bindings(&self) -> impl Iterator<Item = &InductionVariableBinding> {
        self.by_loop.values()
    }

    pub fn len(&self) -> usize {
        self.by_loop.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_loop.is_empty()
    }
}

impl FromIterator<InductionVariableBinding> for AnalyzableLoops {
    fn from_iter<I: IntoIterator<Item = InductionVariableBinding>>(iter: I) -> Self {
        let mut loops = Self::new();
        for binding in iter {
            loops.insert(binding);
        }
        loops
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::parse;
    use crate::ir::lower_ast::lower_program;
    use crate::ir::query::loops_in;

    fn build(body: &str) -> (SyntaxTree, Vec<NodeId>) {
        let source = format!("void f(int n, double a[100]) {{ int i, j; double x; {} }}", body);
        let tree = lower_program(&parse(&source).unwrap()).unwrap();
        let loops = loops_in(&tree, tree.root());
        (tree, loops)
    }

    fn verdict(body: &str) -> LoopVerdict {
        let (tree, loops) = build(body);
        classify_loop(&tree, loops[0], &AnalysisConfig::default()).unwrap().verdict
    }

    #[test]
    fn test_analyzable_loop() {
        let (tree, loops) = build("for (i = 0; i < 10; i++) { a[i] = 0; }");
        let binding = check_analyzable(&tree, loops[0]).unwrap();
        assert_eq!(tree.symbol_name(binding.variable), "i");
        assert_eq!(binding.loop_node, loops[0]);
    }

    #[test]
    fn test_index_modified() {
        assert_eq!(
            verdict("for (i = 0; i < 10; i++) { i = i + 1; a[i] = 0; }"),
            LoopVerdict::Rejected(Rejection::IndexModified)
        );
        assert_eq!(
            verdict("for (i = 0; i < 10; i++) { for (j = 0; j < 2; j++) i++; }"),
            LoopVerdict::Rejected(Rejection::IndexModified)
        );
    }

    #[test]
    fn test_address_taken_index() {
        let source = "void g(int *p); void f(int n, double a[10]) { int i; for (i = 0; i < n; i++) { g(&i); a[i] = a[i + 1]; } }";
        let tree = lower_program(&parse(source).unwrap()).unwrap();
        let loops = loops_in(&tree, tree.root());
        let classification = classify_loop(&tree, loops[0], &AnalysisConfig::default()).unwrap();
        assert_eq!(classification.verdict, LoopVerdict::Rejected(Rejection::IndexModified));

        // Addresses of other variables or of array elements leave the index alone
        assert!(verdict("for (i = 0; i < n; i++) { x = *(&x); a[i] = *(&a[i]); }").binding().is_some());
    }

    #[test]
    fn test_reading_index_is_fine() {
        assert!(verdict("for (i = 0; i < n; i += 2) { j = i; a[i] = a[i - 1]; }").binding().is_some());
    }

    #[test]
    fn test_non_literal_step() {
        assert_eq!(
            verdict("for (i = 0; i < n; i += j) ;"),
            LoopVerdict::Rejected(Rejection::NonLiteralStep)
        );
        assert_eq!(
            verdict("for (i = 0; i < n; i += 1 + 1) ;"),
            LoopVerdict::Rejected(Rejection::NonLiteralStep)
        );
    }

    #[test]
    fn test_not_canonical() {
        assert_eq!(verdict("for (i = 0; i != n; i++) ;"), LoopVerdict::Rejected(Rejection::NotCanonical));
        assert_eq!(verdict("for (i = 0, j = 0; i < n; i++) ;"), LoopVerdict::Rejected(Rejection::NotCanonical));
    }

    #[test]
    fn test_integer_index_requirement() {
        let body = "for (x = 0; x < 1; x++) ;";
        assert_eq!(verdict(body), LoopVerdict::Rejected(Rejection::NonIntegerIndex));

        let (tree, loops) = build(body);
        let config = AnalysisConfig { require_integer_index: false, ..AnalysisConfig::default() };
        let result = classify_loop(&tree, loops[0], &config).unwrap();
        assert!(result.verdict.binding().is_some());
    }

    #[test]
    fn test_undeclared_index_is_accepted() {
        assert!(verdict("for (k = 0; k < 4; k++) ;").binding().is_some());
    }

    #[test]
    fn test_classify_rejects_non_loop() {
        let (tree, _) = build("");
        let err = classify_loop(&tree, tree.root(), &AnalysisConfig::default()).unwrap_err();
        assert_eq!(err.kind, AnalysisErrorKind::UnexpectedNode);
    }

    #[test]
    fn test_analyzable_loops_map() {
        let (tree, loops) = build("for (i = 0; i < n; i++) ; for (i = 0; i < n; i++) ; for (j = 0; j < n; j++) ;");
        let map: AnalyzableLoops = loops.iter().filter_map(|&l| check_analyzable(&tree, l)).collect();
        assert_eq!(map.len(), 3);

        let i = map.induction_variable(loops[0]).unwrap();
        assert_eq!(map.induction_variable(loops[1]), Some(i));
        assert_eq!(map.loops_for(i), &[loops[0], loops[1]]);
        assert_eq!(map.loops_for(map.induction_variable(loops[2]).unwrap()), &[loops[2]]);

        let order: Vec<_> = map.bindings().map(|b| b.loop_node).collect();
        assert_eq!(order, loops);
    }
}
