//! Lexer for the C subset.
//!
//! The lexer converts source text into a stream of tokens. Comments and
//! preprocessor lines are skipped; the analysis never needs them.

use crate::frontend::token::{Token, TokenKind};
use crate::utils::location::{Span, SourceLocation};
use crate::utils::errors::{LexerError, LexerErrorKind};
use unicode_xid::UnicodeXID;
use std::iter::Peekable;
use std::str::Chars;

/// A lexer for tokenizing source code.
pub struct Lexer<'a> {
    /// The source text
    source: &'a str,
    /// Character iterator
    chars: Peekable<Chars<'a>>,
    /// Current byte offset
    offset: usize,
    /// Current line number (1-indexed)
    line: usize,
    /// Current column number (1-indexed)
    column: usize,
    /// Start of current token
    token_start: SourceLocation,
    /// Whether only whitespace has been seen on the current line
    at_line_start: bool,
    /// Whether we've hit EOF
    at_eof: bool,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for the given source.
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.chars().peekable(),
            offset: 0,
            line: 1,
            column: 1,
            token_start: SourceLocation::start(),
            at_line_start: true,
            at_eof: false,
        }
    }

    fn current_location(&self) -> SourceLocation {
        SourceLocation::new(self.line, self.column, self.offset)
    }

    fn mark_token_start(&mut self) {
        self.token_start = self.current_location();
    }

    fn make_span(&self) -> Span {
        Span::from_locations(self.token_start, self.current_location())
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    /// Peek at the character after the current one.
    fn peek_next(&self) -> Option<char> {
        let mut chars = self.source[self.offset..].chars();
        chars.next();
        chars.next()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        self.offset += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
            self.at_line_start = true;
        } else {
            self.column += 1;
            if !c.is_whitespace() {
                self.at_line_start = false;
            }
        }
        Some(c)
    }

    fn match_char(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn is_digit_where(&mut self, pred: fn(char) -> bool) -> bool {
        self.peek().map(pred).unwrap_or(false)
    }

    /// Skip whitespace, comments and preprocessor lines.
    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                Some(' ') | Some('\t') | Some('\r') | Some('\n') => {
                    self.advance();
                }
                Some('#') if self.at_line_start => {
                    // Directive, including backslash continuations
                    while let Some(c) = self.advance() {
                        if c == '\\' && self.peek() == Some('\n') {
                            self.advance();
                            continue;
                        }
                        if self.peek() == Some('\n') {
                            break;
                        }
                    }
                }
                Some('/') => {
                    if self.peek_next() == Some('/') {
                        while self.peek().is_some() && self.peek() != Some('\n') {
                            self.advance();
                        }
                    } else if self.peek_next() == Some('*') {
                        self.advance();
                        self.advance();
                        while let Some(c) = self.advance() {
                            if c == '*' && self.peek() == Some('/') {
                                self.advance();
                                break;
                            }
                        }
                    } else {
                        break;
                    }
                }
                _ => break,
            }
        }
    }

    fn make_token(&self, kind: TokenKind) -> Token {
        let span = self.make_span();
        let lexeme = self.source[span.start_offset..span.end_offset].to_string();
        Token::new(kind, span, lexeme)
    }

    fn make_error(&self, message: &str, kind: LexerErrorKind) -> LexerError {
        LexerError {
            message: message.to_string(),
            span: self.make_span(),
            kind,
        }
    }

    /// Scan a number literal. The first digit is already consumed.
    fn scan_number(&mut self, first: char) -> Result<Token, LexerError> {
        if first == '0' && matches!(self.peek(), Some('x') | Some('X')) {
            self.advance();
            if !self.is_digit_where(|c| c.is_ascii_hexdigit()) {
                return Err(self.make_error("Invalid hexadecimal literal", LexerErrorKind::InvalidNumber));
            }
            while self.is_digit_where(|c| c.is_ascii_hexdigit()) {
                self.advance();
            }
            self.scan_integer_suffix();
            return Ok(self.make_token(TokenKind::Integer));
        }

        while self.is_digit_where(|c| c.is_ascii_digit()) {
            self.advance();
        }

        let mut is_float = false;

        if self.peek() == Some('.') {
            is_float = true;
            self.advance();
            while self.is_digit_where(|c| c.is_ascii_digit()) {
                self.advance();
            }
        }

        if matches!(self.peek(), Some('e') | Some('E')) {
            is_float = true;
            self.advance();
            if matches!(self.peek(), Some('+') | Some('-')) {
                self.advance();
            }
            if !self.is_digit_where(|c| c.is_ascii_digit()) {
                return Err(self.make_error(
                    "Invalid floating-point exponent",
                    LexerErrorKind::InvalidNumber,
                ));
            }
            while self.is_digit_where(|c| c.is_ascii_digit()) {
                self.advance();
            }
        }

        if is_float {
            if matches!(self.peek(), Some('f') | Some('F') | Some('l') | Some('L')) {
                self.advance();
            }
            Ok(self.make_token(TokenKind::Float))
        } else {
            self.scan_integer_suffix();
            Ok(self.make_token(TokenKind::Integer))
        }
    }

    fn scan_integer_suffix(&mut self) {
        while matches!(self.peek(), Some('u') | Some('U') | Some('l') | Some('L')) {
            self.advance();
        }
    }

    fn scan_identifier(&mut self) -> Token {
        while self.peek().map(|c| c.is_xid_continue() || c == '_').unwrap_or(false) {
            self.advance();
        }

        let span = self.make_span();
        let lexeme = &self.source[span.start_offset..span.end_offset];
        let kind = TokenKind::keyword(lexeme).unwrap_or(TokenKind::Identifier);
        Token::new(kind, span, lexeme.to_string())
    }

    /// Scan a quoted literal. The opening quote is already consumed.
    fn scan_quoted(&mut self, quote: char, kind: TokenKind) -> Result<Token, LexerError> {
        loop {
            match self.advance() {
                Some(c) if c == quote => break,
                Some('\\') => match self.advance() {
                    Some('n') | Some('t') | Some('r') | Some('\\') | Some('0') |
                    Some('\'') | Some('"') => {}
                    Some(c) => {
                        return Err(self.make_error(
                            &format!("Invalid escape sequence: \\{}", c),
                            LexerErrorKind::InvalidEscape,
                        ));
                    }
                    None => {
                        return Err(self.make_error("Unterminated literal", LexerErrorKind::UnterminatedLiteral));
                    }
                },
                Some('\n') | None => {
                    return Err(self.make_error("Unterminated literal", LexerErrorKind::UnterminatedLiteral));
                }
                Some(_) => {}
            }
        }
        Ok(self.make_token(kind))
    }

    /// Scan the next token.
    pub fn next_token(&mut self) -> Result<Token, LexerError> {
        self.skip_trivia();
        self.mark_token_start();

        let c = match self.advance() {
            Some(c) => c,
            None => {
                self.at_eof = true;
                return Ok(self.make_token(TokenKind::Eof));
            }
        };

        let kind = match c {
            '(' => TokenKind::LeftParen,
            ')' => TokenKind::RightParen,
            '[' => TokenKind::LeftBracket,
            ']' => TokenKind::RightBracket,
            '{' => TokenKind::LeftBrace,
            '}' => TokenKind::RightBrace,
            ',' => TokenKind::Comma,
            ';' => TokenKind::Semicolon,
            ':' => TokenKind::Colon,
            '?' => TokenKind::Question,

            '+' => {
                if self.match_char('+') {
                    TokenKind::PlusPlus
                } else if self.match_char('=') {
                    TokenKind::PlusEqual
                } else {
                    TokenKind::Plus
                }
            }
            '-' => {
                if self.match_char('-') {
                    TokenKind::MinusMinus
                } else if self.match_char('=') {
                    TokenKind::MinusEqual
                } else {
                    TokenKind::Minus
                }
            }
            '*' => if self.match_char('=') { TokenKind::StarEqual } else { TokenKind::Star },
            '/' => if self.match_char('=') { TokenKind::SlashEqual } else { TokenKind::Slash },
            '%' => if self.match_char('=') { TokenKind::PercentEqual } else { TokenKind::Percent },
            '=' => if self.match_char('=') { TokenKind::EqualEqual } else { TokenKind::Equal },
            '!' => if self.match_char('=') { TokenKind::BangEqual } else { TokenKind::Bang },
            '<' => if self.match_char('=') { TokenKind::LessEqual } else { TokenKind::Less },
            '>' => if self.match_char('=') { TokenKind::GreaterEqual } else { TokenKind::Greater },
            '&' => if self.match_char('&') { TokenKind::AmpAmp } else { TokenKind::Amp },
            '|' => {
                if self.match_char('|') {
                    TokenKind::PipePipe
                } else {
                    return Err(self.make_error(
                        "Bitwise '|' is not supported",
                        LexerErrorKind::UnexpectedChar,
                    ));
                }
            }

            '"' => return self.scan_quoted('"', TokenKind::String),
            '\'' => return self.scan_quoted('\'', TokenKind::Char),

            c if c.is_ascii_digit() => return self.scan_number(c),

            c if c.is_xid_start() || c == '_' => return Ok(self.scan_identifier()),

            _ => {
                return Err(self.make_error(
                    &format!("Unexpected character: '{}'", c),
                    LexerErrorKind::UnexpectedChar,
                ))
            }
        };

        Ok(self.make_token(kind))
    }

    /// Check if we've reached EOF.
    pub fn is_at_end(&self) -> bool {
        self.at_eof
    }

    /// Collect all tokens into a vector.
    pub fn tokenize(mut self) -> Result<Vec<Token>, LexerError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let is_eof = token.is_eof();
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        Ok(tokens)
    }
}
