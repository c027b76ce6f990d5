//! AST to syntax tree lowering.
//!
//! This module converts the parsed AST into the arena `SyntaxTree`.
//! The lowering process:
//! - Resolves variable names to `SymbolId`s through nested block scopes
//! - Records parent links and spans for every node
//! - Drops parentheses
//! - Folds sized array dimensions into declared types

use std::collections::HashMap;
use crate::frontend::ast::{
    Block, Declaration, Declarator, Expr, ExprKind, ForInit, Function, Item, Parameter,
    Program, Stmt, StmtKind, Type,
};
use crate::ir::tree::*;
use crate::utils::errors::{LowerError, LowerErrorKind};
use crate::utils::location::Span;

/// Context for lowering, tracking variable bindings.
struct LoweringContext {
    tree: SyntaxTree,
    /// Block scopes, innermost last; index 0 is file scope
    scopes: Vec<HashMap<String, SymbolId>>,
    /// One symbol per undeclared name
    implicit: HashMap<String, SymbolId>,
}

impl LoweringContext {
    fn new() -> Self {
        Self {
            tree: SyntaxTree::new(),
            scopes: vec![HashMap::new()],
            implicit: HashMap::new(),
        }
    }

    fn enter_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    fn exit_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    fn at_file_scope(&self) -> bool {
        self.scopes.len() == 1
    }

    fn define_var(&mut self, name: &str, ty: Type, kind: SymbolKind, span: Span) -> Result<SymbolId, LowerError> {
        let file_scope = self.at_file_scope();
        if let Some(&existing) = self.scopes.last().and_then(|scope| scope.get(name)) {
            // Repeated file-scope declarations name the same object
            if file_scope {
                return Ok(existing);
            }
            return Err(LowerError {
                message: format!("Duplicate definition of '{}'", name),
                span,
                kind: LowerErrorKind::DuplicateDefinition,
            });
        }

        let interned = self.tree.intern(name);
        let id = self.tree.add_symbol(SymbolInfo { name: interned, ty, kind, decl: None, span });
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), id);
        }
        Ok(id)
    }

    fn lookup_var(&mut self, name: &str, span: Span) -> SymbolId {
        for scope in self.scopes.iter().rev() {
            if let Some(&id) = scope.get(name) {
                return id;
            }
        }
        if let Some(&id) = self.implicit.get(name) {
            return id;
        }

        log::warn!("'{}' used at {} without a visible declaration", name, span);
        let interned = self.tree.intern(name);
        let id = self.tree.add_symbol(SymbolInfo {
            name: interned,
            ty: Type::Unknown,
            kind: SymbolKind::Implicit,
            decl: None,
            span,
        });
        self.implicit.insert(name.to_string(), id);
        id
    }

    fn push(&mut self, kind: NodeKind, span: Span) -> NodeId {
        self.tree.push(kind, span)
    }
}

/// Lower an AST program to a syntax tree.
pub fn lower_program(program: &Program) -> Result<SyntaxTree, LowerError> {
    let mut ctx = LoweringContext::new();
    let mut items = Vec::new();

    for item in &program.items {
        match item {
            Item::Function(func) => items.push(lower_function(func, &mut ctx)?),
            Item::Global(decl) => items.push(lower_declaration(decl, SymbolKind::Global, &mut ctx)?),
        }
    }

    let root = ctx.push(NodeKind::TranslationUnit { items }, program.span);
    ctx.tree.set_root(root);
    Ok(ctx.tree)
}

/// Lower a function definition or prototype.
fn lower_function(func: &Function, ctx: &mut LoweringContext) -> Result<NodeId, LowerError> {
    // Parameters share the scope of the outermost body block
    ctx.enter_scope();

    let mut params = Vec::new();
    for param in &func.params {
        if let Some(id) = lower_parameter(param, ctx)? {
            params.push(id);
        }
    }

    let body = match &func.body {
        Some(block) => Some(lower_block_in_scope(block, ctx)?),
        None => None,
    };

    ctx.exit_scope();

    let name = ctx.tree.intern(&func.name);
    Ok(ctx.push(
        NodeKind::Function {
            name,
            return_type: func.return_type.clone(),
            params,
            body,
        },
        func.span,
    ))
}

fn lower_parameter(param: &Parameter, ctx: &mut LoweringContext) -> Result<Option<NodeId>, LowerError> {
    let Some(name) = &param.name else {
        return Ok(None);
    };

    let (ty, dims) = lower_dimensions(&param.ty, &param.dimensions, ctx)?;
    let symbol = ctx.define_var(name, ty, SymbolKind::Param, param.span)?;
    let decl = ctx.push(NodeKind::VarDecl { symbol, dims, init: None }, param.span);
    ctx.tree.set_symbol_decl(symbol, decl);
    Ok(Some(decl))
}

/// Lower array dimensions, returning the full declared type and the
/// nodes for the sized dimension expressions.
fn lower_dimensions(
    base: &Type,
    dimensions: &[Option<Expr>],
    ctx: &mut LoweringContext,
) -> Result<(Type, Vec<NodeId>), LowerError> {
    if dimensions.is_empty() {
        return Ok((base.clone(), Vec::new()));
    }

    let mut sizes = Vec::new();
    let mut nodes = Vec::new();
    for dim in dimensions {
        match dim {
            Some(expr) => {
                let size = match &expr.ungrouped().kind {
                    ExprKind::IntLiteral(n) if *n <= 0 => {
                        return Err(LowerError {
                            message: format!("Array dimension must be positive, got {}", n),
                            span: expr.span,
                            kind: LowerErrorKind::InvalidDimensions,
                        });
                    }
                    ExprKind::IntLiteral(n) => Some(*n),
                    ExprKind::FloatLiteral(_) | ExprKind::StringLiteral(_) => {
                        return Err(LowerError {
                            message: "Array dimension must have integer type".to_string(),
                            span: expr.span,
                            kind: LowerErrorKind::InvalidDimensions,
                        });
                    }
                    _ => None,
                };
                sizes.push(size);
                nodes.push(lower_expr(expr, ctx)?);
            }
            None => sizes.push(None),
        }
    }

    let ty = Type::Array { element: Box::new(base.clone()), dimensions: sizes };
    Ok((ty, nodes))
}

fn lower_declaration(decl: &Declaration, kind: SymbolKind, ctx: &mut LoweringContext) -> Result<NodeId, LowerError> {
    let mut decls = Vec::new();
    for declarator in &decl.declarators {
        decls.push(lower_declarator(declarator, kind, ctx)?);
    }
    Ok(ctx.push(NodeKind::DeclStmt { decls }, decl.span))
}

fn lower_declarator(d: &Declarator, kind: SymbolKind, ctx: &mut LoweringContext) -> Result<NodeId, LowerError> {
    let (ty, dims) = lower_dimensions(&d.ty, &d.dimensions, ctx)?;
    let symbol = ctx.define_var(&d.name, ty, kind, d.span)?;
    let init = match &d.init {
        Some(expr) => Some(lower_expr(expr, ctx)?),
        None => None,
    };
    let decl = ctx.push(NodeKind::VarDecl { symbol, dims, init }, d.span);
    ctx.tree.set_symbol_decl(symbol, decl);
    Ok(decl)
}

fn lower_block(block: &Block, ctx: &mut LoweringContext) -> Result<NodeId, LowerError> {
    ctx.enter_scope();
    let result = lower_block_in_scope(block, ctx);
    ctx.exit_scope();
    result
}

/// Lower a block without opening a new scope.
fn lower_block_in_scope(block: &Block, ctx: &mut LoweringContext) -> Result<NodeId, LowerError> {
    let stmts = block
        .statements
        .iter()
        .map(|stmt| lower_stmt(stmt, ctx))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ctx.push(NodeKind::Block { stmts }, block.span))
}

fn lower_stmt(stmt: &Stmt, ctx: &mut LoweringContext) -> Result<NodeId, LowerError> {
    let kind = match &stmt.kind {
        StmtKind::Declaration(decl) => return lower_declaration(decl, SymbolKind::Local, ctx),
        StmtKind::Expression { expr } => NodeKind::ExprStmt { expr: lower_expr(expr, ctx)? },
        StmtKind::Block(block) => return lower_block(block, ctx),
        StmtKind::For { init, condition, update, body } => {
            // A declaration in the header is scoped to the loop
            ctx.enter_scope();
            let result = lower_for(init, condition.as_ref(), update.as_ref(), body, stmt.span, ctx);
            ctx.exit_scope();
            return result;
        }
        StmtKind::While { condition, body } => NodeKind::While {
            cond: lower_expr(condition, ctx)?,
            body: lower_stmt(body, ctx)?,
        },
        StmtKind::DoWhile { body, condition } => {
            let body = lower_stmt(body, ctx)?;
            NodeKind::DoWhile { body, cond: lower_expr(condition, ctx)? }
        }
        StmtKind::If { condition, then_branch, else_branch } => {
            let cond = lower_expr(condition, ctx)?;
            let then_branch = lower_stmt(then_branch, ctx)?;
            let else_branch = match else_branch {
                Some(stmt) => Some(lower_stmt(stmt, ctx)?),
                None => None,
            };
            NodeKind::If { cond, then_branch, else_branch }
        }
        StmtKind::Return { value } => NodeKind::Return {
            value: match value {
                Some(expr) => Some(lower_expr(expr, ctx)?),
                None => None,
            },
        },
        StmtKind::Break => NodeKind::Break,
        StmtKind::Continue => NodeKind::Continue,
        StmtKind::Empty => NodeKind::Empty,
    };
    Ok(ctx.push(kind, stmt.span))
}

fn lower_for(
    init: &ForInit,
    condition: Option<&Expr>,
    update: Option<&Expr>,
    body: &Stmt,
    span: Span,
    ctx: &mut LoweringContext,
) -> Result<NodeId, LowerError> {
    let init = match init {
        ForInit::Empty => None,
        ForInit::Declaration(decl) => Some(lower_declaration(decl, SymbolKind::Local, ctx)?),
        ForInit::Expression(expr) => {
            let expr_id = lower_expr(expr, ctx)?;
            Some(ctx.push(NodeKind::ExprStmt { expr: expr_id }, expr.span))
        }
    };
    let test = condition.map(|e| lower_expr(e, ctx)).transpose()?;
    let incr = update.map(|e| lower_expr(e, ctx)).transpose()?;
    let body = lower_stmt(body, ctx)?;
    Ok(ctx.push(NodeKind::For { init, test, incr, body }, span))
}

fn lower_expr(expr: &Expr, ctx: &mut LoweringContext) -> Result<NodeId, LowerError> {
    let kind = match &expr.kind {
        ExprKind::Grouped(inner) => return lower_expr(inner, ctx),
        ExprKind::IntLiteral(n) => NodeKind::IntLit(*n),
        ExprKind::FloatLiteral(x) => NodeKind::FloatLit(*x),
        ExprKind::CharLiteral(s) => NodeKind::CharLit(s.clone()),
        ExprKind::StringLiteral(s) => NodeKind::StrLit(s.clone()),
        ExprKind::Variable(name) => NodeKind::VarRef(ctx.lookup_var(name, expr.span)),
        ExprKind::ArrayAccess { array, indices } => {
            let base = lower_expr(array, ctx)?;
            let indices = lower_exprs(indices, ctx)?;
            NodeKind::Subscript { base, indices }
        }
        ExprKind::Binary { op, left, right } => {
            let lhs = lower_expr(left, ctx)?;
            NodeKind::Binary { op: *op, lhs, rhs: lower_expr(right, ctx)? }
        }
        ExprKind::Unary { op, operand } => NodeKind::Unary { op: *op, operand: lower_expr(operand, ctx)? },
        ExprKind::IncDec { op, operand } => NodeKind::IncDec { op: *op, operand: lower_expr(operand, ctx)? },
        ExprKind::Assign { op, target, value } => {
            let target = lower_expr(target, ctx)?;
            NodeKind::Assign { op: *op, target, value: lower_expr(value, ctx)? }
        }
        ExprKind::Call { function, args } => {
            let args = lower_exprs(args, ctx)?;
            NodeKind::Call { callee: ctx.tree.intern(function), args }
        }
        ExprKind::Ternary { condition, then_expr, else_expr } => {
            let cond = lower_expr(condition, ctx)?;
            let then_expr = lower_expr(then_expr, ctx)?;
            NodeKind::Ternary { cond, then_expr, else_expr: lower_expr(else_expr, ctx)? }
        }
        ExprKind::Cast { target_type, expr: inner } => NodeKind::Cast {
            ty: target_type.clone(),
            expr: lower_expr(inner, ctx)?,
        },
        ExprKind::Comma(exprs) => NodeKind::Comma { exprs: lower_exprs(exprs, ctx)? },
    };
    Ok(ctx.push(kind, expr.span))
}

fn lower_exprs(exprs: &[Expr], ctx: &mut LoweringContext) -> Result<Vec<NodeId>, LowerError> {
    exprs.iter().map(|e| lower_expr(e, ctx)).collect()
}
