//! Parser for the C subset.
//!
//! This module implements a recursive descent parser that converts
//! a stream of tokens into an AST. Errors inside a function body are
//! collected and the parser resynchronizes at the next statement, so one
//! run reports every syntax error it can find.

use crate::frontend::lexer::Lexer;
use crate::frontend::token::{Token, TokenKind};
use crate::frontend::ast::*;
use crate::utils::location::Span;
use crate::utils::errors::{ParseError, ParseErrorKind};
use anyhow::{Result, bail, anyhow};

/// A parser for the C subset.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
    previous: Token,
    lookahead: Option<Token>,
    errors: Vec<ParseError>,
}

impl<'a> Parser<'a> {
    /// Create a new parser from a lexer.
    pub fn new(mut lexer: Lexer<'a>) -> Result<Self> {
        let first_token = lexer.next_token()
            .map_err(|e| anyhow!("Lexer error: {}", e))?;

        Ok(Self {
            lexer,
            current: first_token.clone(),
            previous: first_token,
            lookahead: None,
            errors: Vec::new(),
        })
    }

    /// Parse a complete translation unit.
    pub fn parse_program(&mut self) -> Result<Program> {
        let start = self.current.span;
        let mut program = Program::new();

        while !self.is_at_end() {
            match self.parse_top_level() {
                Ok(item) => program.items.push(item),
                Err(e) => {
                    self.errors.push(self.make_parse_error(&e.to_string()));
                    self.synchronize();
                }
            }
        }

        program.span = start.merge(&self.previous.span);

        if !self.errors.is_empty() {
            let messages: Vec<String> = self.errors.iter().map(|e| e.to_string()).collect();
            bail!("Parse errors: {}", messages.join("; "));
        }

        Ok(program)
    }

    fn parse_top_level(&mut self) -> Result<Item> {
        let start = self.current.span;
        let base = self.parse_specifiers()?;
        let ty = self.parse_pointers(base.clone())?;
        let name_span = self.current.span;
        let name = self.consume_identifier("Expected declarator name")?;

        if self.check(TokenKind::LeftParen) {
            return Ok(Item::Function(self.parse_function(start, ty, name)?));
        }

        let first = self.parse_declarator_rest(name, ty, name_span)?;
        let mut declarators = vec![first];
        while self.match_token(TokenKind::Comma)? {
            declarators.push(self.parse_declarator(base.clone())?);
        }
        self.consume(TokenKind::Semicolon, "Expected ';' after declaration")?;

        Ok(Item::Global(Declaration {
            declarators,
            span: start.merge(&self.previous.span),
        }))
    }

    fn parse_function(&mut self, start: Span, return_type: Type, name: String) -> Result<Function> {
        self.consume(TokenKind::LeftParen, "Expected '(' after function name")?;
        let params = self.parse_parameters()?;
        self.consume(TokenKind::RightParen, "Expected ')' after parameters")?;

        let body = if self.match_token(TokenKind::Semicolon)? {
            None
        } else {
            Some(self.parse_block()?)
        };

        Ok(Function {
            name,
            return_type,
            params,
            body,
            span: start.merge(&self.previous.span),
        })
    }

    fn parse_parameters(&mut self) -> Result<Vec<Parameter>> {
        let mut params = Vec::new();

        // `(void)` declares no parameters
        if self.check(TokenKind::Void) && self.peek_kind()? == TokenKind::RightParen {
            self.advance()?;
            return Ok(params);
        }

        if !self.check(TokenKind::RightParen) {
            loop {
                params.push(self.parse_parameter()?);
                if !self.match_token(TokenKind::Comma)? {
                    break;
                }
            }
        }

        Ok(params)
    }

    fn parse_parameter(&mut self) -> Result<Parameter> {
        let start = self.current.span;
        let base = self.parse_specifiers()?;
        let ty = self.parse_pointers(base)?;

        let name = if self.check(TokenKind::Identifier) {
            Some(self.consume_identifier("Expected parameter name")?)
        } else {
            None
        };
        let dimensions = self.parse_dimensions()?;

        Ok(Parameter {
            name,
            ty,
            dimensions,
            span: start.merge(&self.previous.span),
        })
    }

    /// Parse declaration specifiers into a base type.
    fn parse_specifiers(&mut self) -> Result<Type> {
        let mut seen_any = false;
        let mut base: Option<Type> = None;
        let mut sign_only = false;

        while self.current.kind.is_type_specifier() {
            seen_any = true;
            match self.current.kind {
                TokenKind::Const | TokenKind::Static => {}
                TokenKind::Unsigned | TokenKind::Signed => sign_only = true,
                TokenKind::Int => {
                    if base.is_none() {
                        base = Some(Type::Int);
                    }
                }
                TokenKind::Long => base = Some(Type::Long),
                TokenKind::Short => base = Some(Type::Short),
                TokenKind::CharType => base = Some(Type::Char),
                TokenKind::FloatType => base = Some(Type::Float),
                TokenKind::Double => base = Some(Type::Double),
                TokenKind::Void => base = Some(Type::Void),
                _ => unreachable!("is_type_specifier covers every arm"),
            }
            self.advance()?;
        }

        match base {
            Some(ty) => Ok(ty),
            None if seen_any && sign_only => Ok(Type::Int),
            _ => bail!("Expected type specifier, found {}", self.current.kind),
        }
    }

    fn parse_pointers(&mut self, mut ty: Type) -> Result<Type> {
        while self.match_token(TokenKind::Star)? {
            ty = Type::Pointer(Box::new(ty));
        }
        Ok(ty)
    }

    fn parse_dimensions(&mut self) -> Result<Vec<Option<Expr>>> {
        let mut dimensions = Vec::new();
        while self.match_token(TokenKind::LeftBracket)? {
            if self.match_token(TokenKind::RightBracket)? {
                dimensions.push(None);
            } else {
                dimensions.push(Some(self.parse_assignment()?));
                self.consume(TokenKind::RightBracket, "Expected ']' after array dimension")?;
            }
        }
        Ok(dimensions)
    }

    fn parse_declarator(&mut self, base: Type) -> Result<Declarator> {
        let ty = self.parse_pointers(base)?;
        let span = self.current.span;
        let name = self.consume_identifier("Expected declarator name")?;
        self.parse_declarator_rest(name, ty, span)
    }

    fn parse_declarator_rest(&mut self, name: String, ty: Type, start: Span) -> Result<Declarator> {
        let dimensions = self.parse_dimensions()?;
        let init = if self.match_token(TokenKind::Equal)? {
            Some(self.parse_initializer()?)
        } else {
            None
        };

        Ok(Declarator {
            name,
            ty,
            dimensions,
            init,
            span: start.merge(&self.previous.span),
        })
    }

    /// Parse `= expr` or a brace initializer, flattened to a comma list.
    fn parse_initializer(&mut self) -> Result<Expr> {
        let start = self.current.span;
        if !self.match_token(TokenKind::LeftBrace)? {
            return self.parse_assignment();
        }
        let mut elements = Vec::new();
        while !self.check(TokenKind::RightBrace) {
            elements.push(self.parse_initializer()?);
            if !self.match_token(TokenKind::Comma)? {
                break;
            }
        }
        self.consume(TokenKind::RightBrace, "Expected '}' after initializer list")?;
        Ok(Expr::new(ExprKind::Comma(elements), start.merge(&self.previous.span)))
    }

    fn parse_declaration(&mut self) -> Result<Declaration> {
        let start = self.current.span;
        let base = self.parse_specifiers()?;
        let mut declarators = vec![self.parse_declarator(base.clone())?];
        while self.match_token(TokenKind::Comma)? {
            declarators.push(self.parse_declarator(base.clone())?);
        }
        self.consume(TokenKind::Semicolon, "Expected ';' after declaration")?;
        Ok(Declaration {
            declarators,
            span: start.merge(&self.previous.span),
        })
    }

    fn parse_block(&mut self) -> Result<Block> {
        let start = self.current.span;
        self.consume(TokenKind::LeftBrace, "Expected '{'")?;

        let mut statements = Vec::new();
        while !self.check(TokenKind::RightBrace) && !self.is_at_end() {
            match self.parse_statement() {
                Ok(stmt) => statements.push(stmt),
                Err(e) => {
                    self.errors.push(self.make_parse_error(&e.to_string()));
                    self.synchronize_statement()?;
                }
            }
        }

        self.consume(TokenKind::RightBrace, "Expected '}'")?;

        Ok(Block {
            statements,
            span: start.merge(&self.previous.span),
        })
    }

    fn parse_statement(&mut self) -> Result<Stmt> {
        let start = self.current.span;

        let kind = match self.current.kind {
            TokenKind::For => self.parse_for_statement()?,
            TokenKind::While => {
                self.advance()?;
                let condition = self.parse_paren_condition()?;
                let body = Box::new(self.parse_statement()?);
                StmtKind::While { condition, body }
            }
            TokenKind::Do => {
                self.advance()?;
                let body = Box::new(self.parse_statement()?);
                self.consume(TokenKind::While, "Expected 'while' after do body")?;
                let condition = self.parse_paren_condition()?;
                self.consume(TokenKind::Semicolon, "Expected ';' after do-while")?;
                StmtKind::DoWhile { body, condition }
            }
            TokenKind::If => {
                self.advance()?;
                let condition = self.parse_paren_condition()?;
                let then_branch = Box::new(self.parse_statement()?);
                let else_branch = if self.match_token(TokenKind::Else)? {
                    Some(Box::new(self.parse_statement()?))
                } else {
                    None
                };
                StmtKind::If { condition, then_branch, else_branch }
            }
            TokenKind::Return => {
                self.advance()?;
                let value = if self.check(TokenKind::Semicolon) {
                    None
                } else {
                    Some(self.parse_expression()?)
                };
                self.consume(TokenKind::Semicolon, "Expected ';' after return")?;
                StmtKind::Return { value }
            }
            TokenKind::Break => {
                self.advance()?;
                self.consume(TokenKind::Semicolon, "Expected ';' after break")?;
                StmtKind::Break
            }
            TokenKind::Continue => {
                self.advance()?;
                self.consume(TokenKind::Semicolon, "Expected ';' after continue")?;
                StmtKind::Continue
            }
            TokenKind::LeftBrace => StmtKind::Block(self.parse_block()?),
            TokenKind::Semicolon => {
                self.advance()?;
                StmtKind::Empty
            }
            kind if kind.is_type_specifier() => StmtKind::Declaration(self.parse_declaration()?),
            _ => {
                let expr = self.parse_expression()?;
                self.consume(TokenKind::Semicolon, "Expected ';' after expression")?;
                StmtKind::Expression { expr }
            }
        };

        Ok(Stmt {
            kind,
            span: start.merge(&self.previous.span),
        })
    }

    fn parse_for_statement(&mut self) -> Result<StmtKind> {
        self.consume(TokenKind::For, "Expected 'for'")?;
        self.consume(TokenKind::LeftParen, "Expected '(' after 'for'")?;

        let init = if self.match_token(TokenKind::Semicolon)? {
            ForInit::Empty
        } else if self.current.kind.is_type_specifier() {
            ForInit::Declaration(self.parse_declaration()?)
        } else {
            let expr = self.parse_expression()?;
            self.consume(TokenKind::Semicolon, "Expected ';' after for initializer")?;
            ForInit::Expression(expr)
        };

        let condition = if self.check(TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.consume(TokenKind::Semicolon, "Expected ';' after for condition")?;

        let update = if self.check(TokenKind::RightParen) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.consume(TokenKind::RightParen, "Expected ')' after for header")?;

        let body = Box::new(self.parse_statement()?);
        Ok(StmtKind::For { init, condition, update, body })
    }

    fn parse_paren_condition(&mut self) -> Result<Expr> {
        self.consume(TokenKind::LeftParen, "Expected '('")?;
        let condition = self.parse_expression()?;
        self.consume(TokenKind::RightParen, "Expected ')'")?;
        Ok(condition)
    }

    // Expression parsing, lowest precedence first

    fn parse_expression(&mut self) -> Result<Expr> {
        let first = self.parse_assignment()?;
        if !self.check(TokenKind::Comma) {
            return Ok(first);
        }
        let mut exprs = vec![first];
        while self.match_token(TokenKind::Comma)? {
            exprs.push(self.parse_assignment()?);
        }
        let span = exprs[0].span.merge(&self.previous.span);
        Ok(Expr::new(ExprKind::Comma(exprs), span))
    }

    fn parse_assignment(&mut self) -> Result<Expr> {
        let target = self.parse_ternary()?;

        if let Some(op) = self.match_assign_op()? {
            if !is_lvalue(&target) {
                bail!("Invalid assignment target");
            }
            let value = self.parse_assignment()?;
            let span = target.span.merge(&value.span);
            return Ok(Expr::new(
                ExprKind::Assign { op, target: Box::new(target), value: Box::new(value) },
                span,
            ));
        }

        Ok(target)
    }

    fn match_assign_op(&mut self) -> Result<Option<AssignOp>> {
        let op = match self.current.kind {
            TokenKind::Equal => AssignOp::Assign,
            TokenKind::PlusEqual => AssignOp::AddAssign,
            TokenKind::MinusEqual => AssignOp::SubAssign,
            TokenKind::StarEqual => AssignOp::MulAssign,
            TokenKind::SlashEqual => AssignOp::DivAssign,
            TokenKind::PercentEqual => AssignOp::ModAssign,
            _ => return Ok(None),
        };
        self.advance()?;
        Ok(Some(op))
    }

    fn parse_ternary(&mut self) -> Result<Expr> {
        let condition = self.parse_or_expr()?;
        if !self.match_token(TokenKind::Question)? {
            return Ok(condition);
        }
        let then_expr = self.parse_expression()?;
        self.consume(TokenKind::Colon, "Expected ':' in conditional expression")?;
        let else_expr = self.parse_ternary()?;
        let span = condition.span.merge(&else_expr.span);
        Ok(Expr::new(
            ExprKind::Ternary {
                condition: Box::new(condition),
                then_expr: Box::new(then_expr),
                else_expr: Box::new(else_expr),
            },
            span,
        ))
    }

    /// Parse one left-associative precedence level.
    fn parse_binary_level(
        &mut self,
        next: fn(&mut Self) -> Result<Expr>,
        ops: &[(TokenKind, BinaryOp)],
    ) -> Result<Expr> {
        let mut left = next(self)?;
        while let Some(&(_, op)) = ops.iter().find(|(kind, _)| self.check(*kind)) {
            self.advance()?;
            let right = next(self)?;
            let span = left.span.merge(&right.span);
            left = Expr::new(ExprKind::Binary { op, left: Box::new(left), right: Box::new(right) }, span);
        }
        Ok(left)
    }

    fn parse_or_expr(&mut self) -> Result<Expr> {
        self.parse_binary_level(Self::parse_and_expr, &[(TokenKind::PipePipe, BinaryOp::Or)])
    }

    fn parse_and_expr(&mut self) -> Result<Expr> {
        self.parse_binary_level(Self::parse_equality_expr, &[(TokenKind::AmpAmp, BinaryOp::And)])
    }

    fn parse_equality_expr(&mut self) -> Result<Expr> {
        self.parse_binary_level(
            Self::parse_comparison_expr,
            &[(TokenKind::EqualEqual, BinaryOp::Eq), (TokenKind::BangEqual, BinaryOp::Ne)],
        )
    }

    fn parse_comparison_expr(&mut self) -> Result<Expr> {
        self.parse_binary_level(
            Self::parse_additive_expr,
            &[
                (TokenKind::Less, BinaryOp::Lt),
                (TokenKind::LessEqual, BinaryOp::Le),
                (TokenKind::Greater, BinaryOp::Gt),
                (TokenKind::GreaterEqual, BinaryOp::Ge),
            ],
        )
    }

    fn parse_additive_expr(&mut self) -> Result<Expr> {
        self.parse_binary_level(
            Self::parse_multiplicative_expr,
            &[(TokenKind::Plus, BinaryOp::Add), (TokenKind::Minus, BinaryOp::Sub)],
        )
    }

    fn parse_multiplicative_expr(&mut self) -> Result<Expr> {
        self.parse_binary_level(
            Self::parse_unary_expr,
            &[
                (TokenKind::Star, BinaryOp::Mul),
                (TokenKind::Slash, BinaryOp::Div),
                (TokenKind::Percent, BinaryOp::Mod),
            ],
        )
    }

    fn parse_unary_expr(&mut self) -> Result<Expr> {
        let start = self.current.span;
        let unary = match self.current.kind {
            TokenKind::Minus => Some(UnaryOp::Neg),
            TokenKind::Bang => Some(UnaryOp::Not),
            TokenKind::Star => Some(UnaryOp::Deref),
            TokenKind::Amp => Some(UnaryOp::AddrOf),
            _ => None,
        };
        if let Some(op) = unary {
            self.advance()?;
            let operand = self.parse_unary_expr()?;
            let span = start.merge(&operand.span);
            return Ok(Expr::new(ExprKind::Unary { op, operand: Box::new(operand) }, span));
        }

        let prefix = match self.current.kind {
            TokenKind::PlusPlus => Some(IncDecOp::PreInc),
            TokenKind::MinusMinus => Some(IncDecOp::PreDec),
            _ => None,
        };
        if let Some(op) = prefix {
            self.advance()?;
            let operand = self.parse_unary_expr()?;
            if !is_lvalue(&operand) {
                bail!("Operand of '{}' is not assignable", op.symbol());
            }
            let span = start.merge(&operand.span);
            return Ok(Expr::new(ExprKind::IncDec { op, operand: Box::new(operand) }, span));
        }

        // Cast: '(' type ')' unary
        if self.check(TokenKind::LeftParen) && self.peek_kind()?.is_type_specifier() {
            self.advance()?;
            let base = self.parse_specifiers()?;
            let target_type = self.parse_pointers(base)?;
            self.consume(TokenKind::RightParen, "Expected ')' after cast type")?;
            let expr = self.parse_unary_expr()?;
            let span = start.merge(&expr.span);
            return Ok(Expr::new(ExprKind::Cast { target_type, expr: Box::new(expr) }, span));
        }

        self.parse_postfix_expr()
    }

    fn parse_postfix_expr(&mut self) -> Result<Expr> {
        let mut expr = self.parse_primary_expr()?;

        loop {
            match self.current.kind {
                TokenKind::LeftBracket => {
                    self.advance()?;
                    let index = self.parse_expression()?;
                    self.consume(TokenKind::RightBracket, "Expected ']'")?;
                    let span = expr.span.merge(&self.previous.span);
                    expr = match expr.kind {
                        ExprKind::ArrayAccess { array, mut indices } => {
                            indices.push(index);
                            Expr::new(ExprKind::ArrayAccess { array, indices }, span)
                        }
                        kind => {
                            let base = Expr::new(kind, expr.span);
                            Expr::new(ExprKind::ArrayAccess { array: Box::new(base), indices: vec![index] }, span)
                        }
                    };
                }
                TokenKind::LeftParen => {
                    let function = match &expr.kind {
                        ExprKind::Variable(name) => name.clone(),
                        _ => bail!("Only named functions can be called"),
                    };
                    self.advance()?;
                    let args = self.parse_args()?;
                    self.consume(TokenKind::RightParen, "Expected ')' after arguments")?;
                    let span = expr.span.merge(&self.previous.span);
                    expr = Expr::new(ExprKind::Call { function, args }, span);
                }
                TokenKind::PlusPlus | TokenKind::MinusMinus => {
                    let op = if self.check(TokenKind::PlusPlus) { IncDecOp::PostInc } else { IncDecOp::PostDec };
                    if !is_lvalue(&expr) {
                        bail!("Operand of '{}' is not assignable", op.symbol());
                    }
                    self.advance()?;
                    let span = expr.span.merge(&self.previous.span);
                    expr = Expr::new(ExprKind::IncDec { op, operand: Box::new(expr) }, span);
                }
                _ => break,
            }
        }

        Ok(expr)
    }

    fn parse_primary_expr(&mut self) -> Result<Expr> {
        let start = self.current.span;

        match self.current.kind {
            TokenKind::Integer => {
                let value = parse_int_literal(&self.current.lexeme)
                    .ok_or_else(|| anyhow!("Invalid integer literal '{}'", self.current.lexeme))?;
                self.advance()?;
                Ok(Expr::int_lit(value, start))
            }
            TokenKind::Float => {
                let text = self.current.lexeme.trim_end_matches(['f', 'F', 'l', 'L']);
                let value: f64 = text.parse().map_err(|_| anyhow!("Invalid float literal"))?;
                self.advance()?;
                Ok(Expr::new(ExprKind::FloatLiteral(value), start))
            }
            TokenKind::Char => {
                let text = self.current.lexeme.clone();
                self.advance()?;
                Ok(Expr::new(ExprKind::CharLiteral(text), start))
            }
            TokenKind::String => {
                let lexeme = &self.current.lexeme;
                let value = lexeme[1..lexeme.len() - 1].to_string();
                self.advance()?;
                Ok(Expr::new(ExprKind::StringLiteral(value), start))
            }
            TokenKind::Identifier => {
                let name = self.current.lexeme.clone();
                self.advance()?;
                Ok(Expr::var(name, start))
            }
            TokenKind::LeftParen => {
                self.advance()?;
                let inner = self.parse_expression()?;
                self.consume(TokenKind::RightParen, "Expected ')'")?;
                Ok(Expr::new(ExprKind::Grouped(Box::new(inner)), start.merge(&self.previous.span)))
            }
            _ => bail!("Unexpected token: {}", self.current.kind),
        }
    }

    fn parse_args(&mut self) -> Result<Vec<Expr>> {
        let mut args = Vec::new();
        if !self.check(TokenKind::RightParen) {
            loop {
                args.push(self.parse_assignment()?);
                if !self.match_token(TokenKind::Comma)? { break; }
            }
        }
        Ok(args)
    }

    // Helper methods
    fn check(&self, kind: TokenKind) -> bool { self.current.kind == kind }
    fn is_at_end(&self) -> bool { self.current.kind == TokenKind::Eof }

    fn peek_kind(&mut self) -> Result<TokenKind> {
        if self.lookahead.is_none() {
            let token = self.lexer.next_token().map_err(|e| anyhow!("Lexer error: {}", e))?;
            self.lookahead = Some(token);
        }
        Ok(self.lookahead.as_ref().map(|t| t.kind).unwrap_or(TokenKind::Eof))
    }

    fn advance(&mut self) -> Result<&Token> {
        let next = match self.lookahead.take() {
            Some(token) => token,
            None => self.lexer.next_token().map_err(|e| anyhow!("Lexer error: {}", e))?,
        };
        self.previous = std::mem::replace(&mut self.current, next);
        Ok(&self.previous)
    }

    fn consume(&mut self, kind: TokenKind, message: &str) -> Result<&Token> {
        if self.check(kind) { self.advance() }
        else { bail!("{}: expected {}, found {}", message, kind, self.current.kind) }
    }

    fn consume_identifier(&mut self, message: &str) -> Result<String> {
        if self.check(TokenKind::Identifier) {
            let name = self.current.lexeme.clone();
            self.advance()?;
            Ok(name)
        } else {
            bail!("{}: expected identifier, found {}", message, self.current.kind)
        }
    }

    fn match_token(&mut self, kind: TokenKind) -> Result<bool> {
        if self.check(kind) { self.advance()?; Ok(true) } else { Ok(false) }
    }

    fn make_parse_error(&self, message: &str) -> ParseError {
        let kind = if message.contains("type specifier") {
            ParseErrorKind::ExpectedType
        } else if message.contains("Invalid") || message.contains("not assignable") {
            ParseErrorKind::InvalidSyntax
        } else {
            ParseErrorKind::UnexpectedToken
        };
        ParseError {
            message: message.to_string(),
            span: self.current.span,
            kind,
            found: Some(self.current.kind.name().to_string()),
        }
    }

    /// Skip to the start of the next top-level item.
    fn synchronize(&mut self) {
        let mut depth = 0usize;
        if self.is_at_end() {
            return;
        }
        while !self.is_at_end() {
            let kind = self.current.kind;
            if self.advance().is_err() {
                return;
            }
            match kind {
                TokenKind::LeftBrace => depth += 1,
                TokenKind::RightBrace => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 { return; }
                }
                TokenKind::Semicolon if depth == 0 => return,
                _ => {}
            }
        }
    }

    /// Skip to the start of the next statement inside a block.
    fn synchronize_statement(&mut self) -> Result<()> {
        // Always make progress
        if !self.is_at_end() && !self.check(TokenKind::RightBrace) {
            self.advance()?;
        }
        while !self.is_at_end() && !self.check(TokenKind::RightBrace) {
            if self.previous.kind == TokenKind::Semicolon { return Ok(()); }
            match self.current.kind {
                TokenKind::For | TokenKind::If | TokenKind::While | TokenKind::Do |
                TokenKind::Return | TokenKind::LeftBrace => return Ok(()),
                kind if kind.is_type_specifier() => return Ok(()),
                _ => {}
            }
            self.advance()?;
        }
        Ok(())
    }
}

/// Expressions that may appear on the left of an assignment.
fn is_lvalue(expr: &Expr) -> bool {
    match &expr.ungrouped().kind {
        ExprKind::Variable(_) | ExprKind::ArrayAccess { .. } => true,
        ExprKind::Unary { op: UnaryOp::Deref, .. } => true,
        _ => false,
    }
}

/// Parse a C integer literal (decimal, hex or octal, with suffixes).
fn parse_int_literal(lexeme: &str) -> Option<i64> {
    let digits = lexeme.trim_end_matches(['u', 'U', 'l', 'L']);
    if let Some(hex) = digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        i64::from_str_radix(hex, 16).ok()
    } else if digits.len() > 1 && digits.starts_with('0') {
        i64::from_str_radix(&digits[1..], 8).ok()
    } else {
        digits.parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Result<Program> {
        let lexer = Lexer::new(source);
        let mut parser = Parser::new(lexer)?;
        parser.parse_program()
    }

    fn body_of(program: &Program, index: usize) -> &[Stmt] {
        let func = program.functions().nth(index).expect("function");
        &func.body.as_ref().expect("definition").statements
    }

    #[test]
    fn test_empty_function() {
        let program = parse("void test() {}").unwrap();
        let func = program.find_function("test").unwrap();
        assert_eq!(func.return_type, Type::Void);
        assert!(func.is_definition());
    }

    #[test]
    fn test_prototype_and_params() {
        let program = parse("int f(int n, double *p, double a[][100]); int g(void);").unwrap();
        let f = program.find_function("f").unwrap();
        assert!(!f.is_definition());
        assert_eq!(f.params.len(), 3);
        assert_eq!(f.params[1].ty, Type::Pointer(Box::new(Type::Double)));
        assert_eq!(f.params[2].dimensions.len(), 2);
        assert!(f.params[2].dimensions[0].is_none());
        assert!(program.find_function("g").unwrap().params.is_empty());
    }

    #[test]
    fn test_globals_and_declarations() {
        let program = parse("int n = 10, m; void f() { double in[n][m], x = 1.0; unsigned k; }").unwrap();
        assert!(matches!(&program.items[0], Item::Global(d) if d.declarators.len() == 2));
        match &body_of(&program, 0)[0].kind {
            StmtKind::Declaration(decl) => {
                assert_eq!(decl.declarators[0].name, "in");
                assert_eq!(decl.declarators[0].dimensions.len(), 2);
                assert!(decl.declarators[1].init.is_some());
            }
            other => panic!("Expected declaration, got {:?}", other),
        }
        match &body_of(&program, 0)[1].kind {
            StmtKind::Declaration(decl) => assert_eq!(decl.declarators[0].ty, Type::Int),
            other => panic!("Expected declaration, got {:?}", other),
        }
    }

    #[test]
    fn test_for_loop_header() {
        let program = parse("void f() { for (i = 0; i < 10; i++) a[i] = 0; }").unwrap();
        match &body_of(&program, 0)[0].kind {
            StmtKind::For { init, condition, update, body } => {
                assert!(matches!(init, ForInit::Expression(e) if matches!(e.kind, ExprKind::Assign { .. })));
                assert!(matches!(condition.as_ref().unwrap().kind, ExprKind::Binary { op: BinaryOp::Lt, .. }));
                assert!(matches!(update.as_ref().unwrap().kind, ExprKind::IncDec { op: IncDecOp::PostInc, .. }));
                assert!(matches!(body.kind, StmtKind::Expression { .. }));
            }
            other => panic!("Expected for loop, got {:?}", other),
        }
    }

    #[test]
    fn test_for_with_declaration_and_comma() {
        let program = parse("void f() { for (int i = 0, j = 0; ; i++, j--) {} for (;;) ; }").unwrap();
        match &body_of(&program, 0)[0].kind {
            StmtKind::For { init: ForInit::Declaration(decl), condition: None, update: Some(update), .. } => {
                assert_eq!(decl.declarators.len(), 2);
                assert!(matches!(&update.kind, ExprKind::Comma(items) if items.len() == 2));
            }
            other => panic!("Expected for loop, got {:?}", other),
        }
        assert!(matches!(&body_of(&program, 0)[1].kind, StmtKind::For { init: ForInit::Empty, .. }));
    }

    #[test]
    fn test_multi_dimensional_access_folds() {
        let program = parse("void f() { out[i][j] = in[i-1][j]; }").unwrap();
        match &body_of(&program, 0)[0].kind {
            StmtKind::Expression { expr } => match &expr.kind {
                ExprKind::Assign { target, value, op: AssignOp::Assign } => {
                    assert!(matches!(&target.kind, ExprKind::ArrayAccess { indices, .. } if indices.len() == 2));
                    assert!(matches!(&value.kind, ExprKind::ArrayAccess { indices, .. } if indices.len() == 2));
                }
                other => panic!("Expected assignment, got {:?}", other),
            },
            other => panic!("Expected expression, got {:?}", other),
        }
    }

    #[test]
    fn test_subscript_of_call() {
        let program = parse("void f() { x = g(1)[2]; }").unwrap();
        match &body_of(&program, 0)[0].kind {
            StmtKind::Expression { expr } => match &expr.kind {
                ExprKind::Assign { value, .. } => match &value.kind {
                    ExprKind::ArrayAccess { array, .. } => assert!(matches!(array.kind, ExprKind::Call { .. })),
                    other => panic!("Expected access, got {:?}", other),
                },
                other => panic!("Expected assignment, got {:?}", other),
            },
            other => panic!("Expected expression, got {:?}", other),
        }
    }

    #[test]
    fn test_assignment_is_right_associative() {
        let program = parse("void f() { a = b = 3; }").unwrap();
        match &body_of(&program, 0)[0].kind {
            StmtKind::Expression { expr } => match &expr.kind {
                ExprKind::Assign { value, .. } => assert!(matches!(value.kind, ExprKind::Assign { .. })),
                other => panic!("Expected assignment, got {:?}", other),
            },
            other => panic!("Expected expression, got {:?}", other),
        }
    }

    #[test]
    fn test_control_flow_statements() {
        let source = r#"
            int f(int n) {
                int s = 0;
                while (n > 0) { n--; }
                do { s += 2; } while (s < 10);
                if (s == 10) return s; else return -1;
            }
        "#;
        let program = parse(source).unwrap();
        let body = body_of(&program, 0);
        assert!(matches!(body[1].kind, StmtKind::While { .. }));
        assert!(matches!(body[2].kind, StmtKind::DoWhile { .. }));
        assert!(matches!(body[3].kind, StmtKind::If { else_branch: Some(_), .. }));
    }

    #[test]
    fn test_cast_and_ternary() {
        let program = parse("void f() { x = (double) n / 2; y = n > 0 ? *p : &q == 0; }").unwrap();
        match &body_of(&program, 0)[0].kind {
            StmtKind::Expression { expr } => match &expr.kind {
                ExprKind::Assign { value, .. } => match &value.kind {
                    ExprKind::Binary { op: BinaryOp::Div, left, .. } => {
                        assert!(matches!(left.kind, ExprKind::Cast { target_type: Type::Double, .. }))
                    }
                    other => panic!("Expected division, got {:?}", other),
                },
                other => panic!("Expected assignment, got {:?}", other),
            },
            other => panic!("Expected expression, got {:?}", other),
        }
    }

    #[test]
    fn test_int_literals() {
        assert_eq!(parse_int_literal("42"), Some(42));
        assert_eq!(parse_int_literal("0x1f"), Some(31));
        assert_eq!(parse_int_literal("017"), Some(15));
        assert_eq!(parse_int_literal("10UL"), Some(10));
        assert_eq!(parse_int_literal("0"), Some(0));
    }

    #[test]
    fn test_errors_are_collected() {
        let err = parse("void f() { x = ; y = 2; 3 = z; }").unwrap_err();
        let message = err.to_string();
        assert!(message.starts_with("Parse errors"));
        assert!(message.contains("Invalid assignment target"));
    }

    #[test]
    fn test_invalid_increment_target() {
        assert!(parse("void f() { (a + b)++; }").is_err());
        assert!(parse("void f() { ++3; }").is_err());
    }

    #[test]
    fn test_brace_initializer() {
        let program = parse("int a[3] = {1, 2, 3};").unwrap();
        match &program.items[0] {
            Item::Global(decl) => {
                assert!(matches!(&decl.declarators[0].init, Some(Expr { kind: ExprKind::Comma(v), .. }) if v.len() == 3))
            }
            other => panic!("Expected global, got {:?}", other),
        }
    }
}
