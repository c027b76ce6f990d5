//! loopdep Command Line Interface
//!
//! Usage:
//!   loopdep [OPTIONS] <input-file>
//!   loopdep --help
//!
//! Examples:
//!   loopdep jacobi.c                       # Text report for every function
//!   loopdep --emit=json jacobi.c           # Machine-readable report
//!   loopdep --function=jacobi -vv jacobi.c # One function, with loop verdicts logged
//!   loopdep --emit=tree jacobi.c           # Dump the syntax tree

use clap::{Parser, ValueEnum};
use loopdep::analysis::{DependencePass, ProgramAnalysis};
use loopdep::utils::report::{build_report, dump_tree, render_json, render_text};
use loopdep::utils::SourceMap;
use loopdep::AnalysisConfig;
use std::path::PathBuf;
use std::fs;
use anyhow::{Result, Context, bail};
use log::{info, debug, error};

/// loopdep - dependence candidate analysis for C loop nests
#[derive(Parser, Debug)]
#[command(name = "loopdep")]
#[command(version)]
#[command(about = "Finds analyzable loops and candidate dependence pairs in C loop nests", long_about = None)]
struct Cli {
    /// Input C source file
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Output file (defaults to stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// What to emit
    #[arg(long, default_value = "report")]
    emit: EmitKind,

    /// Only analyze the named function
    #[arg(long, value_name = "NAME")]
    function: Option<String>,

    /// Accept loops whose index variable has a non-integer type
    #[arg(long)]
    allow_non_integer_index: bool,

    /// Include each loop's var / lb / ub / step in the report
    #[arg(long)]
    dump_loop_parts: bool,

    /// Verbose output (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode (suppress warnings)
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum EmitKind {
    /// Text report of loops and candidate pairs
    Report,
    /// JSON report
    Json,
    /// Syntax tree dump
    Tree,
    /// Abstract Syntax Tree
    Ast,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.quiet {
        log::LevelFilter::Error
    } else {
        match cli.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .format_timestamp(None)
        .init();

    info!("loopdep v{}", loopdep::VERSION);
    debug!("Input file: {:?}", cli.input);

    // Read input file
    let source = fs::read_to_string(&cli.input)
        .with_context(|| format!("Failed to read input file: {:?}", cli.input))?;

    // Parse the source
    info!("Parsing...");
    let program = loopdep::parse(&source)
        .with_context(|| "Failed to parse input")?;

    // Handle --emit=ast early exit
    if matches!(cli.emit, EmitKind::Ast) {
        let output = format!("{:#?}", program);
        write_output(&cli.output, &output)?;
        return Ok(());
    }

    let tree = loopdep::lower(&program)
        .with_context(|| "Failed to build syntax tree")?;

    if matches!(cli.emit, EmitKind::Tree) {
        let root = match &cli.function {
            Some(name) => match tree.find_function(name) {
                Some(function) => function,
                None => bail!("No function named '{}'", name),
            },
            None => tree.root(),
        };
        write_output(&cli.output, &dump_tree(&tree, root))?;
        return Ok(());
    }

    let config = build_config(&cli);
    debug!("Analysis config: {:?}", config);

    info!("Analyzing...");
    let pass = DependencePass::new(&tree, config.clone());
    let analysis = match &cli.function {
        Some(name) => analyze_one(&pass, &tree, name)?,
        None => pass.analyze_program(),
    };

    let report = build_report(&tree, &analysis, &config);
    let output = match cli.emit {
        EmitKind::Json => render_json(&report).context("Failed to serialize report")?,
        _ => render_text(&report),
    };
    write_output(&cli.output, &output)?;

    if !analysis.is_success() {
        let source_map = SourceMap::new(source);
        for failure in &analysis.failures {
            error!("{}: {}", failure.name, failure.error);
            if let Some(line) = failure.error.span.and_then(|span| source_map.line(span.start_line)) {
                error!("    {}", line.trim());
            }
        }
        bail!("Analysis failed for {} function(s)", analysis.failures.len());
    }

    Ok(())
}

fn build_config(cli: &Cli) -> AnalysisConfig {
    AnalysisConfig {
        require_integer_index: !cli.allow_non_integer_index,
        dump_loop_parts: cli.dump_loop_parts,
    }
}

fn analyze_one(pass: &DependencePass<'_>, tree: &loopdep::ir::SyntaxTree, name: &str) -> Result<ProgramAnalysis> {
    let Some(function) = tree.find_function(name) else {
        bail!("No function named '{}'", name);
    };

    let mut analysis = ProgramAnalysis::default();
    match pass.analyze_function(function) {
        Ok(Some(result)) => analysis.functions.push(result),
        Ok(None) => bail!("'{}' is a prototype without a body", name),
        Err(error) => analysis.failures.push(loopdep::analysis::FunctionFailure {
            function,
            name: name.to_string(),
            error,
        }),
    }
    Ok(analysis)
}

fn write_output(path: &Option<PathBuf>, content: &str) -> Result<()> {
    match path {
        Some(p) => {
            fs::write(p, content)
                .with_context(|| format!("Failed to write output file: {:?}", p))?;
            info!("Output written to {:?}", p);
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
