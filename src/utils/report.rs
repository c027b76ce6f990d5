//! Rendering of analysis results.
//!
//! Results are first converted into a `ProgramReport`, a plain tree of
//! strings and spans. The report is rendered as indented text or as
//! JSON. `dump_tree` prints the syntax tree itself for debugging.

use std::fmt::Write;
use serde::Serialize;
use crate::analysis::access::ArrayAccess;
use crate::analysis::candidates::DependenceTestingPair;
use crate::analysis::driver::{FunctionAnalysis, ProgramAnalysis};
use crate::analysis::loops::{LoopClassification, LoopVerdict};
use crate::frontend::ast::{BinaryOp, IncDecOp};
use crate::ir::canonical::LoopStep;
use crate::ir::tree::{NodeId, NodeKind, SyntaxTree};
use crate::utils::location::Span;
use crate::utils::pretty::{format_list_with, CodeFormatter};
use crate::AnalysisConfig;

/// Report for a whole translation unit.
#[derive(Debug, Clone, Serialize)]
pub struct ProgramReport {
    pub functions: Vec<FunctionReport>,
    pub failures: Vec<FailureReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FunctionReport {
    pub name: String,
    pub span: Span,
    pub loops: Vec<LoopReport>,
    pub analyzable_loops: usize,
    pub write_write: Vec<PairReport>,
    pub write_read: Vec<PairReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoopReport {
    pub node: NodeId,
    pub location: String,
    pub analyzable: bool,
    /// Present whenever the header is canonical
    pub induction_variable: Option<String>,
    pub rejection: Option<String>,
    /// Only filled in when loop parts are requested
    pub parts: Option<LoopPartsReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoopPartsReport {
    pub var: String,
    pub lower_bound: String,
    pub upper_bound: String,
    pub step: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AccessReport {
    pub node: NodeId,
    pub array: String,
    pub text: String,
    pub location: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PairReport {
    pub a: AccessReport,
    pub b: AccessReport,
    pub common_induction_variables: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FailureReport {
    pub function: String,
    pub error: String,
}

/// Convert analysis results into a report.
pub fn build_report(tree: &SyntaxTree, analysis: &ProgramAnalysis, config: &AnalysisConfig) -> ProgramReport {
    ProgramReport {
        functions: analysis
            .functions
            .iter()
            .map(|f| function_report(tree, f, config))
            .collect(),
        failures: analysis
            .failures
            .iter()
            .map(|f| FailureReport { function: f.name.clone(), error: f.error.to_string() })
            .collect(),
    }
}

fn function_report(tree: &SyntaxTree, analysis: &FunctionAnalysis, config: &AnalysisConfig) -> FunctionReport {
    let body = &analysis.body;
    FunctionReport {
        name: analysis.name.clone(),
        span: tree.span(analysis.function),
        loops: body.loops.iter().map(|l| loop_report(tree, l, config)).collect(),
        analyzable_loops: body.analyzable.len(),
        write_write: body.dependences.write_write.iter().map(|p| pair_report(tree, p)).collect(),
        write_read: body.dependences.write_read.iter().map(|p| pair_report(tree, p)).collect(),
    }
}

fn loop_report(tree: &SyntaxTree, classification: &LoopClassification, config: &AnalysisConfig) -> LoopReport {
    let parts = classification.parts.as_ref();
    let (analyzable, rejection) = match classification.verdict {
        LoopVerdict::Analyzable(_) => (true, None),
        LoopVerdict::Rejected(reason) => (false, Some(reason.to_string())),
    };

    LoopReport {
        node: classification.loop_node,
        location: tree.span(classification.loop_node).start().to_string(),
        analyzable,
        induction_variable: parts.map(|p| tree.symbol_name(p.induction_var).to_string()),
        rejection,
        parts: parts.filter(|_| config.dump_loop_parts).map(|p| LoopPartsReport {
            var: tree.symbol_name(p.induction_var).to_string(),
            lower_bound: unparse(tree, p.lower_bound),
            upper_bound: unparse(tree, p.upper_bound),
            step: step_text(tree, &p.step),
        }),
    }
}

fn access_report(tree: &SyntaxTree, access: &ArrayAccess) -> AccessReport {
    AccessReport {
        node: access.node,
        array: tree.symbol_name(access.array).to_string(),
        text: unparse(tree, access.node),
        location: tree.span(access.node).start().to_string(),
    }
}

fn pair_report(tree: &SyntaxTree, pair: &DependenceTestingPair) -> PairReport {
    PairReport {
        a: access_report(tree, &pair.access_a),
        b: access_report(tree, &pair.access_b),
        common_induction_variables: pair
            .common_induction_variables
            .iter()
            .map(|v| tree.symbol_name(*v).to_string())
            .collect(),
    }
}

/// Render a report as indented text.
pub fn render_text(report: &ProgramReport) -> String {
    let mut out = CodeFormatter::default_indent();

    for function in &report.functions {
        out.writeln(&format!("function {} ({})", function.name, function.span));
        out.nested(|out| {
            for l in &function.loops {
                let name = l.induction_variable.as_deref().map(|v| format!(" {}", v)).unwrap_or_default();
                match &l.rejection {
                    None => out.writeln(&format!("loop{} at {}: analyzable", name, l.location)),
                    Some(reason) => out.writeln(&format!("loop{} at {}: rejected ({})", name, l.location, reason)),
                }
                if let Some(parts) = &l.parts {
                    out.nested(|out| {
                        out.writeln(&format!(
                            "var: {}  lb: {}  ub: {}  step: {}",
                            parts.var, parts.lower_bound, parts.upper_bound, parts.step
                        ))
                    });
                }
            }
            out.writeln(&format!("analyzable loops: {}", function.analyzable_loops));
            write_pairs(out, "write-write", &function.write_write);
            write_pairs(out, "write-read", &function.write_read);
        });
    }

    for failure in &report.failures {
        out.writeln(&format!("function {}: analysis failed: {}", failure.function, failure.error));
    }

    out.finish()
}

fn write_pairs(out: &mut CodeFormatter, label: &str, pairs: &[PairReport]) {
    out.writeln(&format!("{} candidates: {}", label, pairs.len()));
    out.nested(|out| {
        for pair in pairs {
            let _ = writeln!(
                out,
                "{} ({}) <-> {} ({}) : [{}]",
                pair.a.text,
                pair.a.location,
                pair.b.text,
                pair.b.location,
                pair.common_induction_variables.join(", ")
            );
        }
    });
}

/// Render a report as pretty-printed JSON.
pub fn render_json(report: &ProgramReport) -> serde_json::Result<String> {
    serde_json::to_string_pretty(report)
}

/// The step of a canonical loop as source-like text.
pub fn step_text(tree: &SyntaxTree, step: &LoopStep) -> String {
    match step.literal_value(tree) {
        Some(value) => value.to_string(),
        None => match step {
            LoopStep::Unit(delta) => delta.to_string(),
            LoopStep::Expr { expr, negated: true } => format!("-({})", unparse(tree, *expr)),
            LoopStep::Expr { expr, negated: false } => unparse(tree, *expr),
        },
    }
}

/// Binding strength of an expression; higher binds tighter.
fn precedence(kind: &NodeKind) -> u8 {
    match kind {
        NodeKind::Comma { .. } => 1,
        NodeKind::Assign { .. } => 2,
        NodeKind::Ternary { .. } => 3,
        NodeKind::Binary { op, .. } => match op {
            BinaryOp::Or => 4,
            BinaryOp::And => 5,
            BinaryOp::Eq | BinaryOp::Ne => 6,
            BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => 7,
            BinaryOp::Add | BinaryOp::Sub => 8,
            BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => 9,
        },
        NodeKind::Unary { .. } | NodeKind::Cast { .. } => 10,
        NodeKind::IncDec { op, .. } if op.is_prefix() => 10,
        NodeKind::IncDec { .. } | NodeKind::Subscript { .. } | NodeKind::Call { .. } => 11,
        _ => 12,
    }
}

/// Print an expression as C source, with only the parentheses it needs.
pub fn unparse(tree: &SyntaxTree, id: NodeId) -> String {
    let mut out = String::new();
    write_expr(tree, id, 0, &mut out);
    out
}

fn write_expr(tree: &SyntaxTree, id: NodeId, min_prec: u8, out: &mut String) {
    let kind = tree.kind(id);
    let prec = precedence(kind);
    let wrap = prec < min_prec;
    if wrap {
        out.push('(');
    }

    match kind {
        NodeKind::IntLit(n) => { let _ = write!(out, "{}", n); }
        NodeKind::FloatLit(x) => { let _ = write!(out, "{:?}", x); }
        NodeKind::CharLit(s) => out.push_str(s),
        NodeKind::StrLit(s) => { let _ = write!(out, "\"{}\"", s); }
        NodeKind::VarRef(symbol) => out.push_str(tree.symbol_name(*symbol)),
        NodeKind::Subscript { base, indices } => {
            write_expr(tree, *base, 11, out);
            for index in indices {
                out.push('[');
                write_expr(tree, *index, 0, out);
                out.push(']');
            }
        }
        NodeKind::Call { callee, args } => {
            out.push_str(tree.name_str(*callee));
            out.push('(');
            let args = format_list_with(args, ", ", |a| unparse_at(tree, *a, 2));
            out.push_str(&args);
            out.push(')');
        }
        NodeKind::Unary { op, operand } => {
            let _ = write!(out, "{}", op);
            write_expr(tree, *operand, 10, out);
        }
        NodeKind::IncDec { op, operand } => match op {
            IncDecOp::PreInc | IncDecOp::PreDec => {
                out.push_str(op.symbol());
                write_expr(tree, *operand, 10, out);
            }
            IncDecOp::PostInc | IncDecOp::PostDec => {
                write_expr(tree, *operand, 11, out);
                out.push_str(op.symbol());
            }
        },
        NodeKind::Binary { op, lhs, rhs } => {
            write_expr(tree, *lhs, prec, out);
            let _ = write!(out, " {} ", op);
            write_expr(tree, *rhs, prec + 1, out);
        }
        NodeKind::Assign { op, target, value } => {
            write_expr(tree, *target, 3, out);
            let _ = write!(out, " {} ", op);
            write_expr(tree, *value, 2, out);
        }
        NodeKind::Ternary { cond, then_expr, else_expr } => {
            write_expr(tree, *cond, 4, out);
            out.push_str(" ? ");
            write_expr(tree, *then_expr, 1, out);
            out.push_str(" : ");
            write_expr(tree, *else_expr, 3, out);
        }
        NodeKind::Cast { ty, expr } => {
            let _ = write!(out, "({}) ", ty);
            write_expr(tree, *expr, 10, out);
        }
        NodeKind::Comma { exprs } => {
            out.push_str(&format_list_with(exprs, ", ", |e| unparse_at(tree, *e, 2)));
        }
        other => out.push_str(other.label()),
    }

    if wrap {
        out.push(')');
    }
}

fn unparse_at(tree: &SyntaxTree, id: NodeId, min_prec: u8) -> String {
    let mut out = String::new();
    write_expr(tree, id, min_prec, &mut out);
    out
}

/// Structural dump of the subtree rooted at `root`, one node per line.
pub fn dump_tree(tree: &SyntaxTree, root: NodeId) -> String {
    let mut out = CodeFormatter::default_indent();
    dump_node(tree, root, &mut out);
    out.finish()
}

fn dump_node(tree: &SyntaxTree, id: NodeId, out: &mut CodeFormatter) {
    let kind = tree.kind(id);
    let detail = match kind {
        NodeKind::Function { name, return_type, .. } => format!(" {} -> {}", tree.name_str(*name), return_type),
        NodeKind::VarDecl { symbol, .. } => {
            let info = tree.symbol(*symbol);
            format!(" {}: {}", tree.name_str(info.name), info.ty)
        }
        NodeKind::VarRef(symbol) => format!(" {}", tree.symbol_name(*symbol)),
        NodeKind::IntLit(_) | NodeKind::FloatLit(_) | NodeKind::CharLit(_) | NodeKind::StrLit(_) => {
            format!(" {}", unparse(tree, id))
        }
        NodeKind::Call { callee, .. } => format!(" {}", tree.name_str(*callee)),
        NodeKind::Unary { op, .. } => format!(" {}", op),
        NodeKind::IncDec { op, .. } => format!(" {}{}", op.symbol(), if op.is_prefix() { " (prefix)" } else { "" }),
        NodeKind::Binary { op, .. } => format!(" {}", op),
        NodeKind::Assign { op, .. } => format!(" {}", op),
        NodeKind::Cast { ty, .. } => format!(" {}", ty),
        _ => String::new(),
    };

    let span = tree.span(id);
    if span.is_dummy() {
        out.writeln(&format!("{}{} {}", kind.label(), detail, id));
    } else {
        out.writeln(&format!("{}{} {} @{}", kind.label(), detail, id, span.start()));
    }

    out.nested(|out| {
        for child in kind.children() {
            dump_node(tree, child, out);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::driver::DependencePass;
    use crate::frontend::parse;
    use crate::ir::lower_ast::lower_program;
    use crate::ir::refs::collect_read_write_refs;

    fn build(source: &str) -> SyntaxTree {
        lower_program(&parse(source).unwrap()).unwrap()
    }

    /// Unparse the value of the single assignment in `f`.
    fn roundtrip(expr: &str) -> String {
        let tree = build(&format!("void f(int a, int b, int c, double x[4][4], int *p) {{ int y; y = {}; }}", expr));
        let f = tree.find_function("f").unwrap();
        let refs = collect_read_write_refs(&tree, tree.function_body(f).unwrap());
        let target = refs.writes[0];
        match tree.kind(tree.parent(target).unwrap()) {
            NodeKind::Assign { value, .. } => unparse(&tree, *value),
            other => panic!("Expected assignment, got {:?}", other),
        }
    }

    #[test]
    fn test_unparse_precedence() {
        assert_eq!(roundtrip("a + b * c"), "a + b * c");
        assert_eq!(roundtrip("(a + b) * c"), "(a + b) * c");
        assert_eq!(roundtrip("a - (b - c)"), "a - (b - c)");
        assert_eq!(roundtrip("(a - b) - c"), "a - b - c");
        assert_eq!(roundtrip("x[a - 1][b]"), "x[a - 1][b]");
        assert_eq!(roundtrip("-(a + 1)"), "-(a + 1)");
        assert_eq!(roundtrip("a > 0 ? *p : c++"), "a > 0 ? *p : c++");
        assert_eq!(roundtrip("g(a, b + 1) / 4.0"), "g(a, b + 1) / 4.0");
        assert_eq!(roundtrip("(int) x[0][0]"), "(int) x[0][0]");
    }

    const SOURCE: &str = r#"
        void f(int n, double a[100]) {
            int i, k;
            for (i = 1; i < n; i += 2)
                a[i] = a[i - 1];
            for (k = 0; k < n; k += n) ;
        }
    "#;

    #[test]
    fn test_text_report() {
        let tree = build(SOURCE);
        let config = AnalysisConfig { dump_loop_parts: true, ..AnalysisConfig::default() };
        let analysis = DependencePass::new(&tree, config.clone()).analyze_program();
        let text = render_text(&build_report(&tree, &analysis, &config));

        assert!(text.starts_with("function f ("));
        assert!(text.contains("  loop i at 4:13: analyzable\n"));
        assert!(text.contains("    var: i  lb: 1  ub: n  step: 2\n"));
        assert!(text.contains("loop k at 6:13: rejected (step is not an integer literal)"));
        assert!(text.contains("    var: k  lb: 0  ub: n  step: n\n"));
        assert!(text.contains("  analyzable loops: 1\n"));
        assert!(text.contains("  write-write candidates: 0\n"));
        assert!(text.contains("    a[i] (5:17) <-> a[i - 1] (5:24) : [i]\n"));
    }

    #[test]
    fn test_parts_hidden_by_default() {
        let tree = build(SOURCE);
        let config = AnalysisConfig::default();
        let analysis = DependencePass::new(&tree, config.clone()).analyze_program();
        let report = build_report(&tree, &analysis, &config);
        assert!(report.functions[0].loops.iter().all(|l| l.parts.is_none()));
        assert!(!render_text(&report).contains("var:"));
    }

    #[test]
    fn test_json_report() {
        let tree = build(SOURCE);
        let config = AnalysisConfig::default();
        let analysis = DependencePass::new(&tree, config.clone()).analyze_program();
        let json = render_json(&build_report(&tree, &analysis, &config)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        let function = &value["functions"][0];
        assert_eq!(function["name"], "f");
        assert_eq!(function["analyzable_loops"], 1);
        assert_eq!(function["write_read"][0]["a"]["text"], "a[i]");
        assert_eq!(function["write_read"][0]["common_induction_variables"][0], "i");
        assert_eq!(function["loops"][1]["analyzable"], false);
        assert!(value["failures"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_dump_tree() {
        let tree = build("void f() { int i; i = 1 + 2; }");
        let dump = dump_tree(&tree, tree.root());
        assert!(dump.starts_with("TranslationUnit"));
        assert!(dump.contains("\n  Function f -> void"));
        assert!(dump.contains("VarDecl i: int"));
        assert!(dump.contains("Assign ="));
        assert!(dump.contains("VarRef i"));
        assert!(dump.contains("IntLit 2"));
    }
}
