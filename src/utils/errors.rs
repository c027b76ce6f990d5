//! Error types for the dependence analyzer.
//!
//! This module defines all error types used throughout the crate,
//! organized by the phase that produces them. Loops that fail the
//! analyzability check are not errors; they are reported as verdicts.

use thiserror::Error;
use crate::utils::location::Span;
use std::fmt;

/// Top-level error type for the analyzer.
#[derive(Error, Debug)]
pub enum LoopDepError {
    /// Error during lexing/tokenization
    #[error("Lexer error: {0}")]
    Lexer(#[from] LexerError),

    /// Error during parsing
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// Error while lowering the AST into the syntax tree
    #[error("Lowering error: {0}")]
    Lower(#[from] LowerError),

    /// Error during dependence analysis
    #[error("Analysis error: {0}")]
    Analysis(#[from] AnalysisError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error during lexical analysis.
#[derive(Error, Debug, Clone)]
pub struct LexerError {
    /// The error message
    pub message: String,
    /// Location in source
    pub span: Span,
    /// The kind of lexer error
    pub kind: LexerErrorKind,
}

impl fmt::Display for LexerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}", self.message, self.span)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexerErrorKind {
    /// Unexpected character
    UnexpectedChar,
    /// Unterminated string or character literal
    UnterminatedLiteral,
    /// Invalid number literal
    InvalidNumber,
    /// Invalid escape sequence
    InvalidEscape,
}

/// Error during parsing.
#[derive(Error, Debug, Clone)]
pub struct ParseError {
    /// The error message
    pub message: String,
    /// Location in source
    pub span: Span,
    /// The kind of parse error
    pub kind: ParseErrorKind,
    /// What was found
    pub found: Option<String>,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}", self.message, self.span)?;
        if let Some(ref found) = self.found {
            write!(f, " (found: {})", found)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// Unexpected token
    UnexpectedToken,
    /// Expected a type specifier
    ExpectedType,
    /// Invalid assignment target or declarator
    InvalidSyntax,
}

/// Error while lowering the AST into the arena syntax tree.
#[derive(Error, Debug, Clone)]
pub struct LowerError {
    /// The error message
    pub message: String,
    /// Location in source
    pub span: Span,
    /// The kind of lowering error
    pub kind: LowerErrorKind,
}

impl fmt::Display for LowerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}", self.message, self.span)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LowerErrorKind {
    /// Two declarations of the same name in one scope
    DuplicateDefinition,
    /// Array dimension that is not an integer constant or expression
    InvalidDimensions,
}

/// Error during dependence analysis.
///
/// These abort the analysis of the current function body. A loop that is
/// merely not analyzable never produces one.
#[derive(Error, Debug, Clone)]
pub struct AnalysisError {
    /// The error message
    pub message: String,
    /// Location in source (if available)
    pub span: Option<Span>,
    /// The kind of analysis error
    pub kind: AnalysisErrorKind,
}

impl AnalysisError {
    /// Create an error with a span.
    pub fn new(kind: AnalysisErrorKind, message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span: Some(span),
            kind,
        }
    }
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref span) = self.span {
            write!(f, "{} at {}", self.message, span)
        } else {
            write!(f, "{}", self.message)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisErrorKind {
    /// Subscript base is not a named variable (e.g. `f(x)[i]`)
    UnresolvableBase,
    /// Upward walk reached the root without meeting the analysis scope
    BoundaryNotReached,
    /// Node handed to an operation has the wrong kind
    UnexpectedNode,
}

/// Result type using LoopDepError.
pub type LoopDepResult<T> = Result<T, LoopDepError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ParseError {
            message: "Unexpected token".to_string(),
            span: Span::new(1, 5, 1, 10),
            kind: ParseErrorKind::UnexpectedToken,
            found: Some("number".to_string()),
        };
        let s = format!("{}", err);
        assert!(s.contains("Unexpected token"));
        assert!(s.contains("1:5-10"));
        assert!(s.contains("number"));
    }

    #[test]
    fn test_analysis_error_wraps() {
        let err = AnalysisError::new(
            AnalysisErrorKind::UnresolvableBase,
            "cannot resolve array base",
            Span::new(3, 1, 3, 8),
        );
        let top: LoopDepError = err.into();
        assert!(top.to_string().starts_with("Analysis error: cannot resolve array base"));
    }
}
