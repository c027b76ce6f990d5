//! Syntax tree the dependence analysis runs over.
//!
//! - `tree`: arena nodes with parent links, and the symbol table
//! - `lower_ast`: AST to syntax tree, with name resolution
//! - `query`, `canonical`, `refs`: structural facilities the analysis uses

pub mod tree;
pub mod lower_ast;
pub mod query;
pub mod canonical;
pub mod refs;

pub use tree::{Node, NodeId, NodeKind, SymbolId, SymbolInfo, SymbolKind, SyntaxTree};
pub use lower_ast::lower_program;
pub use canonical::{decompose_for, CanonicalLoop, LoopStep};
pub use refs::{collect_read_write_refs, RefSets, SubscriptParts};
