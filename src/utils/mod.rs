//! Utility modules for the dependence analyzer.
//!
//! This module contains common utilities used throughout the codebase:
//! - Error types
//! - Source location tracking
//! - Name interning
//! - Indented text output
//! - Report rendering

pub mod errors;
pub mod location;
pub mod intern;
pub mod pretty;
pub mod report;

// Re-exports
pub use errors::*;
pub use location::{SourceLocation, SourceMap, Span};
pub use intern::{Name, NameInterner};
pub use report::{build_report, dump_tree, render_json, render_text, unparse, ProgramReport};
