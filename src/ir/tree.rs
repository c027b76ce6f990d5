//! Arena syntax tree.
//!
//! The tree is what the dependence analysis reads. Every node lives in one
//! `Vec` owned by the `SyntaxTree` and is addressed by a `NodeId`; node
//! identity is id equality. Each node records its parent, so upward walks
//! (enclosing loop, enclosing function) are a chain of index lookups.
//!
//! Names are resolved during lowering: every variable reference points to
//! a `SymbolId`, the named entity shared by all references to the same
//! declaration.

use crate::frontend::ast::{AssignOp, BinaryOp, IncDecOp, Type, UnaryOp};
use crate::utils::intern::{Name, NameInterner};
use crate::utils::location::Span;
use serde::{Serialize, Deserialize};
use std::fmt;

/// A unique identifier for syntax tree nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A unique identifier for a declared (or implicitly declared) variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SymbolId(pub u32);

impl SymbolId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Where a symbol was declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SymbolKind {
    Global,
    Param,
    Local,
    /// Used without a visible declaration
    Implicit,
}

/// A named entity.
#[derive(Debug, Clone)]
pub struct SymbolInfo {
    pub name: Name,
    pub ty: Type,
    pub kind: SymbolKind,
    /// The `VarDecl` node, if the symbol was declared
    pub decl: Option<NodeId>,
    pub span: Span,
}

/// A node in the syntax tree.
#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
    pub span: Span,
}

/// The kind of a syntax tree node, with its children.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    TranslationUnit { items: Vec<NodeId> },

    /// Function definition or prototype; `params` are `VarDecl` nodes
    Function {
        name: Name,
        return_type: Type,
        params: Vec<NodeId>,
        body: Option<NodeId>,
    },

    /// One declarator; `dims` holds the sized dimension expressions
    VarDecl {
        symbol: SymbolId,
        dims: Vec<NodeId>,
        init: Option<NodeId>,
    },

    // Statements
    DeclStmt { decls: Vec<NodeId> },
    Block { stmts: Vec<NodeId> },
    ExprStmt { expr: NodeId },
    /// `init` is a `DeclStmt` or `ExprStmt`
    For {
        init: Option<NodeId>,
        test: Option<NodeId>,
        incr: Option<NodeId>,
        body: NodeId,
    },
    While { cond: NodeId, body: NodeId },
    DoWhile { body: NodeId, cond: NodeId },
    If {
        cond: NodeId,
        then_branch: NodeId,
        else_branch: Option<NodeId>,
    },
    Return { value: Option<NodeId> },
    Break,
    Continue,
    Empty,

    // Expressions
    IntLit(i64),
    FloatLit(f64),
    CharLit(String),
    StrLit(String),
    VarRef(SymbolId),
    /// `base[i][j]...`; consecutive subscripts are folded into `indices`
    Subscript { base: NodeId, indices: Vec<NodeId> },
    Call { callee: Name, args: Vec<NodeId> },
    Unary { op: UnaryOp, operand: NodeId },
    IncDec { op: IncDecOp, operand: NodeId },
    Binary { op: BinaryOp, lhs: NodeId, rhs: NodeId },
    Assign { op: AssignOp, target: NodeId, value: NodeId },
    Ternary {
        cond: NodeId,
        then_expr: NodeId,
        else_expr: NodeId,
    },
    Cast { ty: Type, expr: NodeId },
    Comma { exprs: Vec<NodeId> },
}

impl NodeKind {
    /// Children in source order.
    pub fn children(&self) -> Vec<NodeId> {
        use NodeKind::*;
        match self {
            TranslationUnit { items } => items.clone(),
            Function { params, body, .. } => params.iter().copied().chain(*body).collect(),
            VarDecl { dims, init, .. } => dims.iter().copied().chain(*init).collect(),
            DeclStmt { decls } => decls.clone(),
            Block { stmts } => stmts.clone(),
            ExprStmt { expr } => vec![*expr],
            For { init, test, incr, body } => {
                init.iter().chain(test).chain(incr).copied().chain(Some(*body)).collect()
            }
            While { cond, body } => vec![*cond, *body],
            DoWhile { body, cond } => vec![*body, *cond],
            If { cond, then_branch, else_branch } => {
                let mut children = vec![*cond, *then_branch];
                children.extend(*else_branch);
                children
            }
            Return { value } => value.iter().copied().collect(),
            Break | Continue | Empty => Vec::new(),
            IntLit(_) | FloatLit(_) | CharLit(_) | StrLit(_) | VarRef(_) => Vec::new(),
            Subscript { base, indices } => std::iter::once(*base).chain(indices.iter().copied()).collect(),
            Call { args, .. } => args.clone(),
            Unary { operand, .. } | IncDec { operand, .. } => vec![*operand],
            Binary { lhs, rhs, .. } => vec![*lhs, *rhs],
            Assign { target, value, .. } => vec![*target, *value],
            Ternary { cond, then_expr, else_expr } => vec![*cond, *then_expr, *else_expr],
            Cast { expr, .. } => vec![*expr],
            Comma { exprs } => exprs.clone(),
        }
    }

    pub fn is_loop(&self) -> bool {
        matches!(self, NodeKind::For { .. })
    }

    pub fn is_statement(&self) -> bool {
        use NodeKind::*;
        matches!(
            self,
            DeclStmt { .. } | Block { .. } | ExprStmt { .. } | For { .. } | While { .. } |
            DoWhile { .. } | If { .. } | Return { .. } | Break | Continue | Empty
        )
    }

    pub fn is_expression(&self) -> bool {
        use NodeKind::*;
        matches!(
            self,
            IntLit(_) | FloatLit(_) | CharLit(_) | StrLit(_) | VarRef(_) | Subscript { .. } |
            Call { .. } | Unary { .. } | IncDec { .. } | Binary { .. } | Assign { .. } |
            Ternary { .. } | Cast { .. } | Comma { .. }
        )
    }

    /// Short label used by tree dumps and log messages.
    pub fn label(&self) -> &'static str {
        use NodeKind::*;
        match self {
            TranslationUnit { .. } => "TranslationUnit",
            Function { .. } => "Function",
            VarDecl { .. } => "VarDecl",
            DeclStmt { .. } => "DeclStmt",
            Block { .. } => "Block",
            ExprStmt { .. } => "ExprStmt",
            For { .. } => "For",
            While { .. } => "While",
            DoWhile { .. } => "DoWhile",
            If { .. } => "If",
            Return { .. } => "Return",
            Break => "Break",
            Continue => "Continue",
            Empty => "Empty",
            IntLit(_) => "IntLit",
            FloatLit(_) => "FloatLit",
            CharLit(_) => "CharLit",
            StrLit(_) => "StrLit",
            VarRef(_) => "VarRef",
            Subscript { .. } => "Subscript",
            Call { .. } => "Call",
            Unary { .. } => "Unary",
            IncDec { .. } => "IncDec",
            Binary { .. } => "Binary",
            Assign { .. } => "Assign",
            Ternary { .. } => "Ternary",
            Cast { .. } => "Cast",
            Comma { .. } => "Comma",
        }
    }
}

/// The syntax tree for one translation unit, with its symbol table.
#[derive(Debug, Clone)]
pub struct SyntaxTree {
    nodes: Vec<Node>,
    symbols: Vec<SymbolInfo>,
    names: NameInterner,
    root: Option<NodeId>,
}

impl SyntaxTree {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            symbols: Vec::new(),
            names: NameInterner::new(),
            root: None,
        }
    }

    /// Add a node whose children already exist, linking them to it.
    pub fn push(&mut self, kind: NodeKind, span: Span) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        for child in kind.children() {
            self.nodes[child.index()].parent = Some(id);
        }
        self.nodes.push(Node { kind, parent: None, span });
        id
    }

    pub fn set_root(&mut self, root: NodeId) {
        self.root = Some(root);
    }

    /// The translation unit node. Falls back to the last node pushed.
    pub fn root(&self) -> NodeId {
        self.root.unwrap_or(NodeId(self.nodes.len().saturating_sub(1) as u32))
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.index()].kind
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.index()].parent
    }

    pub fn span(&self, id: NodeId) -> Span {
        self.nodes[id.index()].span
    }

    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.kind(id).children()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn add_symbol(&mut self, info: SymbolInfo) -> SymbolId {
        let id = SymbolId(self.symbols.len() as u32);
        self.symbols.push(info);
        id
    }

    pub fn set_symbol_decl(&mut self, symbol: SymbolId, decl: NodeId) {
        self.symbols[symbol.index()].decl = Some(decl);
    }

    pub fn symbol(&self, id: SymbolId) -> &SymbolInfo {
        &self.symbols[id.index()]
    }

    pub fn symbols(&self) -> impl Iterator<Item = (SymbolId, &SymbolInfo)> {
        self.symbols.iter().enumerate().map(|(i, info)| (SymbolId(i as u32), info))
    }

    pub fn symbol_name(&self, id: SymbolId) -> &str {
        self.name_str(self.symbol(id).name)
    }

    pub fn intern(&mut self, s: &str) -> Name {
        self.names.intern(s)
    }

    pub fn name_str(&self, name: Name) -> &str {
        self.names.resolve(name).unwrap_or("<unknown>")
    }

    /// Function nodes (definitions and prototypes) in source order.
    pub fn functions(&self) -> Vec<NodeId> {
        if self.nodes.is_empty() {
            return Vec::new();
        }
        match self.kind(self.root()) {
            NodeKind::TranslationUnit { items } => items
                .iter()
                .copied()
                .filter(|&id| matches!(self.kind(id), NodeKind::Function { .. }))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Find a function by name, preferring its definition over any
    /// prototype. Falls back to the first prototype if there is no body.
    pub fn find_function(&self, name: &str) -> Option<NodeId> {
        let mut prototype = None;
        for id in self.functions() {
            if self.function_name(id) != Some(name) {
                continue;
            }
            if self.function_body(id).is_some() {
                return Some(id);
            }
            prototype.get_or_insert(id);
        }
        prototype
    }

    pub fn function_name(&self, id: NodeId) -> Option<&str> {
        match self.kind(id) {
            NodeKind::Function { name, .. } => Some(self.name_str(*name)),
            _ => None,
        }
    }

    pub fn function_body(&self, id: NodeId) -> Option<NodeId> {
        match self.kind(id) {
            NodeKind::Function { body, .. } => *body,
            _ => None,
        }
    }
}

impl Default for SyntaxTree {
    fn default() -> Self {
        Self::new()
    }
}
