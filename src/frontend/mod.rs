//! Frontend: Lexer, Parser, and AST for the C subset.
//!
//! This module handles parsing of C source into an AST. It covers the
//! subset that loop-nest kernels are written in:
//!
//! ```text
//! void jacobi(double in[N][N], double out[N][N]) {
//!     int t, i, j;
//!     for (t = 0; t < T; t++) {
//!         for (i = 1; i < N - 1; i++)
//!             for (j = 1; j < N - 1; j++)
//!                 out[i][j] = 0.25 * (in[i - 1][j] + in[i + 1][j]);
//!     }
//! }
//! ```
//!
//! Preprocessor lines are skipped rather than expanded.

pub mod token;
pub mod lexer;
pub mod ast;
pub mod parser;

// Re-exports
pub use lexer::Lexer;
pub use parser::Parser;
pub use ast::*;
pub use token::{Token, TokenKind};
pub use crate::utils::errors::ParseError;

use anyhow::Result;

/// Parse source code into an AST.
pub fn parse(source: &str) -> Result<ast::Program> {
    let lexer = Lexer::new(source);
    let mut parser = Parser::new(lexer)?;
    parser.parse_program()
}
