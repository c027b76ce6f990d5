//! Pass driver.
//!
//! Runs the loop check, access classification and candidate builder over
//! one function body at a time. Every body gets fresh state; nothing is
//! carried from one function to the next.

use log::{debug, info, warn};
use crate::analysis::access::{classify_accesses, ClassifiedAccesses};
use crate::analysis::candidates::{build_candidates, DependenceCollection};
use crate::analysis::loops::{classify_loop, AnalyzableLoops, LoopClassification, LoopVerdict};
use crate::ir::query::loops_in;
use crate::ir::tree::{NodeId, NodeKind, SyntaxTree};
use crate::utils::errors::{AnalysisError, AnalysisErrorKind};
use crate::utils::report::{step_text, unparse};
use crate::AnalysisConfig;

/// Results for one analyzed scope.
#[derive(Debug, Clone)]
pub struct BodyAnalysis {
    pub scope: NodeId,
    /// Every `for` loop in the scope, in pre-order
    pub loops: Vec<LoopClassification>,
    pub analyzable: AnalyzableLoops,
    pub accesses: ClassifiedAccesses,
    pub dependences: DependenceCollection,
}

#[derive(Debug, Clone)]
pub struct FunctionAnalysis {
    pub function: NodeId,
    pub name: String,
    pub body: BodyAnalysis,
}

/// A function whose analysis was aborted.
#[derive(Debug, Clone)]
pub struct FunctionFailure {
    pub function: NodeId,
    pub name: String,
    pub error: AnalysisError,
}

/// Results for every function definition in a translation unit.
#[derive(Debug, Clone, Default)]
pub struct ProgramAnalysis {
    pub functions: Vec<FunctionAnalysis>,
    pub failures: Vec<FunctionFailure>,
}

impl ProgramAnalysis {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// The dependence analysis pass over one syntax tree.
pub struct DependencePass<'t> {
    tree: &'t SyntaxTree,
    config: AnalysisConfig,
}

impl<'t> DependencePass<'t> {
    pub fn new(tree: &'t SyntaxTree, config: AnalysisConfig) -> Self {
        Self { tree, config }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Analyze every function definition, in source order.
    ///
    /// A function whose analysis fails is recorded in `failures` and the
    /// remaining functions are still analyzed.
    pub fn analyze_program(&self) -> ProgramAnalysis {
        let mut result = ProgramAnalysis::default();

        for function in self.tree.functions() {
            match self.analyze_function(function) {
                Ok(Some(analysis)) => result.functions.push(analysis),
                Ok(None) => {}
                Err(error) => {
                    let name = self.tree.function_name(function).unwrap_or_default().to_string();
                    warn!("analysis of {} aborted: {}", name, error);
                    result.failures.push(FunctionFailure { function, name, error });
                }
            }
        }

        result
    }

    /// Analyze one function. Prototypes yield `None`.
    pub fn analyze_function(&self, function: NodeId) -> Result<Option<FunctionAnalysis>, AnalysisError> {
        let NodeKind::Function { body, .. } = self.tree.kind(function) else {
            return Err(AnalysisError::new(
                AnalysisErrorKind::UnexpectedNode,
                format!("expected a function, found {}", self.tree.kind(function).label()),
                self.tree.span(function),
            ));
        };
        let name = self.tree.function_name(function).unwrap_or_default().to_string();

        let Some(body) = *body else {
            debug!("skipping prototype {}", name);
            return Ok(None);
        };

        let analysis = self.analyze_body(body)?;
        info!(
            "{}: {} loops ({} analyzable), {} write-write and {} write-read candidates",
            name,
            analysis.loops.len(),
            analysis.analyzable.len(),
            analysis.dependences.write_write.len(),
            analysis.dependences.write_read.len(),
        );

        Ok(Some(FunctionAnalysis { function, name, body: analysis }))
    }

    /// Analyze one scope, normally a function body.
    ///
    /// Scopes analyzed by separate calls must not overlap.
    pub fn analyze_body(&self, scope: NodeId) -> Result<BodyAnalysis, AnalysisError> {
        let mut loops = Vec::new();
        let mut analyzable = AnalyzableLoops::new();

        for loop_node in loops_in(self.tree, scope) {
            let classification = classify_loop(self.tree, loop_node, &self.config)?;
            self.log_loop(&classification);
            if let Some(binding) = classification.verdict.binding() {
                analyzable.insert(binding);
            }
            loops.push(classification);
        }

        let accesses = classify_accesses(self.tree, scope)?;
        let dependences = build_candidates(self.tree, &accesses.writes, &accesses.reads, &analyzable, scope)?;

        Ok(BodyAnalysis { scope, loops, analyzable, accesses, dependences })
    }

    fn log_loop(&self, classification: &LoopClassification) {
        let span = self.tree.span(classification.loop_node);
        match classification.verdict {
            LoopVerdict::Analyzable(binding) => {
                debug!("loop at {} is analyzable, index {}", span, self.tree.symbol_name(binding.variable))
            }
            LoopVerdict::Rejected(reason) => debug!("loop at {} rejected: {}", span, reason),
        }

        if self.config.dump_loop_parts {
            if let Some(parts) = &classification.parts {
                debug!(
                    "  var: {}  lb: {}  ub: {}  step: {}",
                    self.tree.symbol_name(parts.induction_var),
                    unparse(self.tree, parts.lower_bound),
                    unparse(self.tree, parts.upper_bound),
                    step_text(self.tree, &parts.step),
                );
            }
        }
    }
}
