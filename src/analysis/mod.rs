//! Dependence analysis over loop nests.
//!
//! - `loops`: which `for` loops are analyzable, and their induction variables
//! - `access`: array element reads and writes, resolved to array identities
//! - `ancestor`: common enclosing loops of two accesses
//! - `candidates`: write-write and write-read dependence testing pairs
//! - `driver`: runs the above per function body

pub mod loops;
pub mod access;
pub mod ancestor;
pub mod candidates;
pub mod driver;

pub use loops::{
    check_analyzable, classify_loop, AnalyzableLoops, InductionVariableBinding, LoopClassification,
    LoopVerdict, Rejection,
};
pub use access::{classify_accesses, AccessKind, ArrayAccess, ClassifiedAccesses};
pub use ancestor::{find_common_ancestor_loop, outer_loop_chain};
pub use candidates::{build_candidates, DependenceCollection, DependenceTestingPair};
pub use driver::{BodyAnalysis, DependencePass, FunctionAnalysis, FunctionFailure, ProgramAnalysis};

use crate::ir::tree::SyntaxTree;
use crate::AnalysisConfig;

/// Analyze every function definition in `tree`.
pub fn analyze_program(tree: &SyntaxTree, config: AnalysisConfig) -> ProgramAnalysis {
    DependencePass::new(tree, config).analyze_program()
}
