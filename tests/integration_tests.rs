//! Integration tests for the dependence analysis pipeline.

use std::collections::HashSet;
use loopdep::prelude::*;
use loopdep::{analyze_source, lower, parse};
use loopdep::ir::query::{is_ancestor, loops_in};
use loopdep::utils::report::unparse;

const JACOBI: &str = r#"
void jacobi() {
  int n=100;
  int m=100;
  int tmax = 10000;

  double in[n][m];
  double out[n][m];

  int t,i,j;

  for (t=0;t<tmax;++t) {
      for (i=0;i<n;i++) {
          for (j=0;j<m;j++) {
             out[i][j] = (in[i-1][j]+in[i+1][j]+in[i][j-1]+in[i][j+1])/4.0;
          }
      }

      for (i=0;i<n;i++) {
          for (j=0;j<m;j++) {
             in[i][j] = out[i][j];
          }
      }
  }
}
"#;

fn analyze(source: &str) -> AnalysisOutput {
    analyze_source(source, AnalysisConfig::default()).expect("analysis failed")
}

fn ivar_names(tree: &SyntaxTree, pair: &DependenceTestingPair) -> Vec<String> {
    pair.common_induction_variables
        .iter()
        .map(|v| tree.symbol_name(*v).to_string())
        .collect()
}

fn pair_text(tree: &SyntaxTree, pair: &DependenceTestingPair) -> (String, String) {
    (unparse(tree, pair.access_a.node), unparse(tree, pair.access_b.node))
}

/// All pairs of every analyzed function.
fn all_pairs(output: &AnalysisOutput) -> Vec<&DependenceTestingPair> {
    output
        .analysis
        .functions
        .iter()
        .flat_map(|f| f.body.dependences.write_write.iter().chain(&f.body.dependences.write_read))
        .collect()
}

#[test]
fn test_jacobi_end_to_end() {
    let output = analyze(JACOBI);
    let tree = &output.tree;
    assert_eq!(output.analysis.functions.len(), 1);

    let jacobi = &output.analysis.functions[0];
    assert_eq!(jacobi.name, "jacobi");
    assert_eq!(jacobi.body.loops.len(), 5);
    assert_eq!(jacobi.body.analyzable.len(), 5);

    let deps = &jacobi.body.dependences;
    assert_eq!(deps.write_write.len(), 0);
    assert_eq!(deps.write_read.len(), 5);

    let texts: Vec<_> = deps.write_read.iter().map(|p| pair_text(tree, p)).collect();
    let expected = [
        ("out[i][j]", "out[i][j]"),
        ("in[i][j]", "in[i - 1][j]"),
        ("in[i][j]", "in[i + 1][j]"),
        ("in[i][j]", "in[i][j - 1]"),
        ("in[i][j]", "in[i][j + 1]"),
    ];
    for (actual, (a, b)) in texts.iter().zip(expected) {
        assert_eq!(actual.0, a);
        assert_eq!(actual.1, b);
    }

    // The two nests are siblings under t
    for pair in &deps.write_read {
        assert_eq!(ivar_names(tree, pair), vec!["t"]);
        assert_eq!(pair.common_loops.len(), 1);
        assert_eq!(pair.access_a.kind, AccessKind::Write);
        assert_eq!(pair.access_b.kind, AccessKind::Read);
    }
}

#[test]
fn test_jacobi_bindings() {
    let output = analyze(JACOBI);
    let tree = &output.tree;
    let analyzable = &output.analysis.functions[0].body.analyzable;

    let names: Vec<_> = analyzable.bindings().map(|b| tree.symbol_name(b.variable)).collect();
    assert_eq!(names, vec!["t", "i", "j", "i", "j"]);

    // One binding per loop; a variable may index several loops
    let loops: HashSet<_> = analyzable.bindings().map(|b| b.loop_node).collect();
    assert_eq!(loops.len(), 5);
    for binding in analyzable.bindings() {
        assert_eq!(analyzable.induction_variable(binding.loop_node), Some(binding.variable));
        assert!(analyzable.loops_for(binding.variable).contains(&binding.loop_node));
    }
    let i = analyzable.bindings().nth(1).unwrap().variable;
    assert_eq!(analyzable.loops_for(i).len(), 2);
}

#[test]
fn test_jacobi_text_report() {
    let config = AnalysisConfig { dump_loop_parts: true, ..AnalysisConfig::default() };
    let output = analyze_source(JACOBI, config.clone()).unwrap();
    let text = render_text(&output.report(&config));

    assert!(text.contains("function jacobi"));
    assert!(text.contains("loop t at 12:3: analyzable"));
    assert!(text.contains("var: t  lb: 0  ub: tmax  step: 1"));
    assert!(text.contains("analyzable loops: 5"));
    assert!(text.contains("write-write candidates: 0"));
    assert!(text.contains("write-read candidates: 5"));
    assert!(text.contains("in[i][j] (21:14) <-> in[i - 1][j] (15:27) : [t]"));
}

#[test]
fn test_analyzable_examples() {
    let source = r#"
        void ok(int a[10]) { int i; for (i = 0; i < 10; i++) { a[i] = 0; } }
        void modified(int a[10]) { int i; for (i = 0; i < 10; i++) { i = i + 1; a[i] = 0; } }
    "#;
    let output = analyze(source);
    let tree = &output.tree;

    let ok = &output.analysis.functions[0].body;
    assert_eq!(ok.analyzable.len(), 1);
    let binding = ok.analyzable.bindings().next().unwrap();
    assert_eq!(tree.symbol_name(binding.variable), "i");

    let modified = &output.analysis.functions[1].body;
    assert!(modified.analyzable.is_empty());
    assert_eq!(modified.loops[0].verdict, LoopVerdict::Rejected(Rejection::IndexModified));
}

#[test]
fn test_matmul_candidates() {
    let source = r#"
        void matmul(int n, double A[64][64], double B[64][64], double C[64][64]) {
            for (int i = 0; i < n; i++)
                for (int j = 0; j < n; j++) {
                    C[i][j] = 0.0;
                    for (int k = 0; k < n; k++)
                        C[i][j] += A[i][k] * B[k][j];
                }
        }
    "#;
    let output = analyze(source);
    let tree = &output.tree;
    let deps = &output.analysis.functions[0].body.dependences;

    // The two writes to C share the i and j loops
    assert_eq!(deps.write_write.len(), 1);
    assert_eq!(ivar_names(tree, &deps.write_write[0]), vec!["i", "j"]);

    // C[i][j] = 0.0 pairs with the read of +=, and += pairs with itself
    assert_eq!(deps.write_read.len(), 2);
    assert_eq!(ivar_names(tree, &deps.write_read[0]), vec!["i", "j"]);
    assert_eq!(ivar_names(tree, &deps.write_read[1]), vec!["i", "j", "k"]);
    assert_eq!(deps.write_read[1].access_a.node, deps.write_read[1].access_b.node);
}

#[test]
fn test_pairs_share_array_identity() {
    let output = analyze(JACOBI);
    for pair in all_pairs(&output) {
        assert_eq!(pair.access_a.array, pair.access_b.array);
    }

    let source = r#"
        void f(int n, double a[10], double b[10]) {
            int i;
            for (i = 0; i < n; i++) { a[i] = b[i]; b[i] = a[i]; }
        }
    "#;
    let output = analyze(source);
    let deps = &output.analysis.functions[0].body.dependences;
    assert!(deps.write_write.is_empty());
    assert_eq!(deps.write_read.len(), 2);
    for pair in all_pairs(&output) {
        assert_eq!(pair.access_a.array, pair.access_b.array);
    }
}

#[test]
fn test_writes_outside_loops_never_pair() {
    let source = r#"
        void f(int n, double a[10]) {
            int i;
            a[0] = 1.0;
            for (i = 1; i < n; i++) a[i] = a[i - 1] + a[0];
            a[n - 1] = a[0];
        }
    "#;
    let output = analyze(source);
    let accesses = &output.analysis.functions[0].body.accesses;
    let outside: HashSet<_> = accesses
        .writes
        .iter()
        .filter(|w| w.enclosing_loop.is_none())
        .map(|w| w.node)
        .collect();
    assert_eq!(outside.len(), 2);

    let pairs = all_pairs(&output);
    assert!(!pairs.is_empty());
    for pair in pairs {
        assert!(!outside.contains(&pair.access_a.node));
        assert!(!outside.contains(&pair.access_b.node));
    }
}

#[test]
fn test_induction_variables_outer_to_inner() {
    let source = r#"
        void f(int n, double a[8][8][8]) {
            int i, j, k;
            for (i = 1; i < n; i++)
                for (j = 1; j < n; j++)
                    for (k = 1; k < n; k++)
                        a[i][j][k] = a[i - 1][j][k] + a[i][j - 1][k] + a[i][j][k - 1];
        }
    "#;
    let output = analyze(source);
    let tree = &output.tree;
    let pairs = all_pairs(&output);
    assert_eq!(pairs.len(), 3);

    for pair in pairs {
        assert_eq!(ivar_names(tree, pair), vec!["i", "j", "k"]);
        assert!(!pair.common_induction_variables.is_empty());
        for window in pair.common_loops.windows(2) {
            assert!(is_ancestor(tree, window[0], window[1]));
        }
    }
}

#[test]
fn test_write_write_pairs_are_unique() {
    let source = r#"
        void f(int n, double a[10]) {
            int i;
            for (i = 0; i < n; i++) { a[i] = 0.0; a[i + 1] = 1.0; a[i + 2] = 2.0; a[i + 3] = 3.0; }
        }
    "#;
    let output = analyze(source);
    let deps = &output.analysis.functions[0].body.dependences;
    assert_eq!(deps.write_write.len(), 6);

    let mut seen = HashSet::new();
    for pair in &deps.write_write {
        assert_ne!(pair.access_a.node, pair.access_b.node);
        let key = if pair.access_a.node < pair.access_b.node {
            (pair.access_a.node, pair.access_b.node)
        } else {
            (pair.access_b.node, pair.access_a.node)
        };
        assert!(seen.insert(key), "pair reported twice");
    }
}

#[test]
fn test_while_loops_are_not_analyzed() {
    let source = r#"
        void f(int n, double a[10]) {
            int i = 0;
            while (i < n) { a[i] = a[i + 1]; i++; }
            do { a[i] = 0.0; i--; } while (i > 0);
        }
    "#;
    let output = analyze(source);
    let body = &output.analysis.functions[0].body;
    assert!(body.loops.is_empty());
    assert!(body.dependences.is_empty());
    assert!(body.accesses.writes.iter().all(|w| w.enclosing_loop.is_none()));
}

#[test]
fn test_unresolvable_base_aborts_function() {
    let source = r#"
        double *row(int k);
        void bad(int n) { int i; double x; for (i = 0; i < n; i++) x = row(i)[0]; }
        void good(int n, double a[10]) { int i; for (i = 1; i < n; i++) a[i] = a[i - 1]; }
    "#;
    let output = analyze(source);
    assert!(!output.analysis.is_success());
    assert_eq!(output.analysis.failures.len(), 1);
    assert_eq!(output.analysis.failures[0].name, "bad");
    assert_eq!(output.analysis.failures[0].error.kind, AnalysisErrorKind::UnresolvableBase);

    assert_eq!(output.analysis.functions.len(), 1);
    assert_eq!(output.analysis.functions[0].name, "good");
    assert_eq!(output.analysis.functions[0].body.dependences.write_read.len(), 1);
}

#[test]
fn test_functions_are_analyzed_independently() {
    let source = r#"
        double g[10];
        void first(int n) { int i; for (i = 0; i < n; i++) g[i] = 1.0; }
        void second(int n) { int i; for (i = 0; i < n; i++) g[i] = g[i] * 2.0; }
    "#;
    let output = analyze(source);
    let functions = &output.analysis.functions;
    assert_eq!(functions.len(), 2);
    // The write in `first` never pairs with the read in `second`
    assert!(functions[0].body.dependences.is_empty());
    assert_eq!(functions[1].body.dependences.write_read.len(), 1);
    assert_ne!(functions[0].body.dependences.scope, functions[1].body.dependences.scope);
}

#[test]
fn test_non_integer_index_option() {
    let source = "void f(double a[10]) { double x; for (x = 0; x < 10; x++) a[0] = x; }";

    let strict = analyze(source);
    assert_eq!(
        strict.analysis.functions[0].body.loops[0].verdict,
        LoopVerdict::Rejected(Rejection::NonIntegerIndex)
    );

    let config = AnalysisConfig { require_integer_index: false, ..AnalysisConfig::default() };
    let relaxed = analyze_source(source, config).unwrap();
    assert_eq!(relaxed.analysis.functions[0].body.analyzable.len(), 1);
}

#[test]
fn test_json_report() {
    let output = analyze(JACOBI);
    let json = render_json(&output.report(&AnalysisConfig::default())).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    let jacobi = &value["functions"][0];
    assert_eq!(jacobi["name"], "jacobi");
    assert_eq!(jacobi["analyzable_loops"], 5);
    assert_eq!(jacobi["write_write"].as_array().unwrap().len(), 0);
    assert_eq!(jacobi["write_read"].as_array().unwrap().len(), 5);
    assert_eq!(jacobi["write_read"][1]["b"]["array"], "in");
}

#[test]
fn test_pipeline_stages() {
    let program = parse(JACOBI).expect("Failed to parse");
    assert_eq!(program.functions().count(), 1);

    let tree = lower(&program).expect("Failed to lower");
    let function = tree.find_function("jacobi").unwrap();
    assert_eq!(loops_in(&tree, function).len(), 5);

    let pass = DependencePass::new(&tree, AnalysisConfig::default());
    let analysis = pass.analyze_function(function).unwrap().unwrap();
    assert_eq!(analysis.body.dependences.write_read.len(), 5);
}

#[test]
fn test_parse_errors_are_reported() {
    let result = analyze_source("void f() { for (i = 0; i < 10 i++) ; }", AnalysisConfig::default());
    let message = format!("{:#}", result.unwrap_err());
    assert!(message.contains("Parse errors"));
}
