//! # loopdep - Loop Dependence Candidate Analysis for C
//!
//! A static analysis pass over C loop nests:
//! - Finds analyzable `for` loops (canonical header, literal step,
//!   index never reassigned in the body)
//! - Classifies array element reads and writes
//! - Pairs accesses to the same array that share an analyzable loop nest,
//!   recording the common induction variables outermost first
//!
//! The pairs are candidates for a precise dependence test; no such test
//! and no transformation is performed.
//!
//! ## Architecture
//!
//! ```text
//! Source → Frontend (AST) → Syntax tree → Loop check / Access classifier → Candidate builder → Report
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use loopdep::prelude::*;
//!
//! let source = r#"
//!     void scale(int n, double a[100][100]) {
//!         int i, j;
//!         for (i = 1; i < n; i++)
//!             for (j = 0; j < n; j++)
//!                 a[i][j] = a[i - 1][j] * 2.0;
//!     }
//! "#;
//!
//! let output = loopdep::analyze_source(source, AnalysisConfig::default())?;
//! let pair = &output.analysis.functions[0].body.dependences.write_read[0];
//! assert_eq!(pair.common_induction_variables.len(), 2);
//! ```

#![warn(clippy::all)]

pub mod frontend;
pub mod ir;
pub mod analysis;
pub mod utils;

// Re-export commonly used types
pub mod prelude {
    //! Convenient re-exports of commonly used types.

    pub use crate::frontend::{parse, ParseError};
    pub use crate::ir::{lower_program, NodeId, NodeKind, SymbolId, SyntaxTree};
    pub use crate::analysis::{
        AccessKind, AnalyzableLoops, ArrayAccess, DependenceCollection, DependencePass,
        DependenceTestingPair, FunctionAnalysis, InductionVariableBinding, LoopVerdict,
        ProgramAnalysis, Rejection,
    };
    pub use crate::utils::errors::*;
    pub use crate::utils::report::{build_report, render_json, render_text, ProgramReport};
    pub use crate::{AnalysisConfig, AnalysisOutput};
}

use anyhow::Result;

/// Main entry point for parsing source code.
pub fn parse(source: &str) -> Result<frontend::Program> {
    frontend::parse(source)
}

/// Lower an AST to the syntax tree the analysis runs over.
pub fn lower(program: &frontend::Program) -> utils::errors::LoopDepResult<ir::SyntaxTree> {
    Ok(ir::lower_program(program)?)
}

/// Configuration for the analysis pass.
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// Reject loops whose index has a declared non-integer type
    pub require_integer_index: bool,
    /// Log and report the canonical parts (var, lb, ub, step) of each loop
    pub dump_loop_parts: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            require_integer_index: true,
            dump_loop_parts: false,
        }
    }
}

/// A syntax tree together with the analysis results that refer into it.
#[derive(Debug, Clone)]
pub struct AnalysisOutput {
    pub tree: ir::SyntaxTree,
    pub analysis: analysis::ProgramAnalysis,
}

impl AnalysisOutput {
    /// Build the renderable report.
    pub fn report(&self, config: &AnalysisConfig) -> utils::report::ProgramReport {
        utils::report::build_report(&self.tree, &self.analysis, config)
    }
}

/// Full pipeline: parse, lower, and analyze every function definition.
pub fn analyze_source(source: &str, config: AnalysisConfig) -> Result<AnalysisOutput> {
    let program = parse(source)?;
    let tree = lower(&program)?;
    let analysis = analysis::DependencePass::new(&tree, config).analyze_program();
    Ok(AnalysisOutput { tree, analysis })
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_analyze_source() {
        let source = "void f(int n, double a[10]) { int i; for (i = 0; i < n; i++) a[i] = a[i] + 1.0; }";
        let output = analyze_source(source, AnalysisConfig::default()).unwrap();
        assert_eq!(output.analysis.functions.len(), 1);
        let report = output.report(&AnalysisConfig::default());
        assert_eq!(report.functions[0].write_read.len(), 1);
    }

    #[test]
    fn test_errors_propagate() {
        assert!(analyze_source("void f( {", AnalysisConfig::default()).is_err());
        assert!(analyze_source("void f() { int x; int x; }", AnalysisConfig::default()).is_err());

        let program = parse("void f() { int x; int x; }").unwrap();
        assert!(matches!(lower(&program), Err(utils::errors::LoopDepError::Lower(_))));
    }
}
