//! Token types for the C subset.
//!
//! This module defines all token types produced by the lexer.

use crate::utils::location::Span;
use std::fmt;

/// A token in the source code.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// The kind of token
    pub kind: TokenKind,
    /// The source span
    pub span: Span,
    /// The lexeme (raw text)
    pub lexeme: String,
}

impl Token {
    /// Create a new token.
    pub fn new(kind: TokenKind, span: Span, lexeme: String) -> Self {
        Self { kind, span, lexeme }
    }

    /// Check if this is an EOF token.
    pub fn is_eof(&self) -> bool {
        matches!(self.kind, TokenKind::Eof)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({})", self.kind, self.lexeme)
    }
}

/// The kind of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Literals
    /// Integer literal (decimal, hex or octal, optional suffix)
    Integer,
    /// Floating-point literal
    Float,
    /// Character literal
    Char,
    /// String literal
    String,

    /// Identifier (variable, function name, etc.)
    Identifier,

    // Statement keywords
    For,
    While,
    Do,
    If,
    Else,
    Return,
    Break,
    Continue,

    // Type keywords
    Int,
    Long,
    Short,
    CharType,
    FloatType,
    Double,
    Void,
    Unsigned,
    Signed,
    Const,
    Static,

    // Arithmetic operators
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    PlusPlus,
    MinusMinus,

    // Comparison operators
    EqualEqual,
    BangEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,

    // Assignment operators
    Equal,
    PlusEqual,
    MinusEqual,
    StarEqual,
    SlashEqual,
    PercentEqual,

    // Logical and address operators
    AmpAmp,
    PipePipe,
    Bang,
    Amp,

    // Delimiters
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    LeftBrace,
    RightBrace,
    Comma,
    Semicolon,
    Colon,
    Question,

    /// End of file
    Eof,
}

impl TokenKind {
    /// Check if this is a keyword.
    pub fn is_keyword(&self) -> bool {
        use TokenKind::*;
        matches!(
            self,
            For | While | Do | If | Else | Return | Break | Continue |
            Int | Long | Short | CharType | FloatType | Double | Void |
            Unsigned | Signed | Const | Static
        )
    }

    /// Check if this token can start a declaration.
    pub fn is_type_specifier(&self) -> bool {
        use TokenKind::*;
        matches!(
            self,
            Int | Long | Short | CharType | FloatType | Double | Void |
            Unsigned | Signed | Const | Static
        )
    }

    /// Check if this is an assignment operator.
    pub fn is_assignment(&self) -> bool {
        use TokenKind::*;
        matches!(self, Equal | PlusEqual | MinusEqual | StarEqual | SlashEqual | PercentEqual)
    }

    /// Get the keyword for a string, if it is a keyword.
    pub fn keyword(s: &str) -> Option<TokenKind> {
        match s {
            "for" => Some(TokenKind::For),
            "while" => Some(TokenKind::While),
            "do" => Some(TokenKind::Do),
            "if" => Some(TokenKind::If),
            "else" => Some(TokenKind::Else),
            "return" => Some(TokenKind::Return),
            "break" => Some(TokenKind::Break),
            "continue" => Some(TokenKind::Continue),
            "int" => Some(TokenKind::Int),
            "long" => Some(TokenKind::Long),
            "short" => Some(TokenKind::Short),
            "char" => Some(TokenKind::CharType),
            "float" => Some(TokenKind::FloatType),
            "double" => Some(TokenKind::Double),
            "void" => Some(TokenKind::Void),
            "unsigned" => Some(TokenKind::Unsigned),
            "signed" => Some(TokenKind::Signed),
            "const" => Some(TokenKind::Const),
            "static" => Some(TokenKind::Static),
            _ => None,
        }
    }

    /// Get a human-readable name for this token kind.
    pub fn name(&self) -> &'static str {
        use TokenKind::*;
        match self {
            Integer => "integer",
            Float => "float",
            Char => "character",
            String => "string",
            Identifier => "identifier",
            For => "for",
            While => "while",
            Do => "do",
            If => "if",
            Else => "else",
            Return => "return",
            Break => "break",
            Continue => "continue",
            Int => "int",
            Long => "long",
            Short => "short",
            CharType => "char",
            FloatType => "float",
            Double => "double",
            Void => "void",
            Unsigned => "unsigned",
            Signed => "signed",
            Const => "const",
            Static => "static",
            Plus => "+",
            Minus => "-",
            Star => "*",
            Slash => "/",
            Percent => "%",
            PlusPlus => "++",
            MinusMinus => "--",
            EqualEqual => "==",
            BangEqual => "!=",
            Less => "<",
            LessEqual => "<=",
            Greater => ">",
            GreaterEqual => ">=",
            Equal => "=",
            PlusEqual => "+=",
            MinusEqual => "-=",
            StarEqual => "*=",
            SlashEqual => "/=",
            PercentEqual => "%=",
            AmpAmp => "&&",
            PipePipe => "||",
            Bang => "!",
            Amp => "&",
            LeftParen => "(",
            RightParen => ")",
            LeftBracket => "[",
            RightBracket => "]",
            LeftBrace => "{",
            RightBrace => "}",
            Comma => ",",
            Semicolon => ";",
            Colon => ":",
            Question => "?",
            Eof => "end of file",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
