//! Abstract Syntax Tree (AST) for the C subset.
//!
//! The AST mirrors the surface syntax. It carries no name resolution and
//! no parent links; `ir::lower_ast` turns it into the arena `SyntaxTree`
//! that the analysis walks.

use crate::utils::location::Span;
use serde::{Serialize, Deserialize};
use std::fmt;

/// A translation unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Program {
    /// Top-level items in source order
    pub items: Vec<Item>,
    /// Source span
    pub span: Span,
}

impl Program {
    /// Create a new empty program.
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            span: Span::dummy(),
        }
    }

    /// Iterate over function definitions and prototypes.
    pub fn functions(&self) -> impl Iterator<Item = &Function> {
        self.items.iter().filter_map(|item| match item {
            Item::Function(func) => Some(func),
            Item::Global(_) => None,
        })
    }

    /// Find a function by name.
    pub fn find_function(&self, name: &str) -> Option<&Function> {
        self.functions().find(|f| f.name == name)
    }
}

impl Default for Program {
    fn default() -> Self {
        Self::new()
    }
}

/// A top-level item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Item {
    /// Function definition or prototype
    Function(Function),
    /// File-scope variable declaration
    Global(Declaration),
}

/// A function definition or prototype.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Function {
    pub name: String,
    pub return_type: Type,
    pub params: Vec<Parameter>,
    /// `None` for a prototype
    pub body: Option<Block>,
    pub span: Span,
}

impl Function {
    pub fn is_definition(&self) -> bool {
        self.body.is_some()
    }
}

/// A function parameter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Parameter {
    /// Parameter name (`None` in unnamed prototype parameters)
    pub name: Option<String>,
    pub ty: Type,
    /// Array dimensions; `None` for `[]`
    pub dimensions: Vec<Option<Expr>>,
    pub span: Span,
}

/// A declaration statement: one type with one or more declarators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Declaration {
    pub declarators: Vec<Declarator>,
    pub span: Span,
}

/// A single declared name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Declarator {
    pub name: String,
    /// Type including pointer levels, without array dimensions
    pub ty: Type,
    /// Array dimensions; `None` for `[]`
    pub dimensions: Vec<Option<Expr>>,
    pub init: Option<Expr>,
    pub span: Span,
}

/// A scalar or derived C type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Type {
    Void,
    Char,
    Short,
    Int,
    Long,
    Float,
    Double,
    /// Pointer to the inner type
    Pointer(Box<Type>),
    /// Array of the element type; `None` dimensions are unsized or symbolic
    Array {
        element: Box<Type>,
        dimensions: Vec<Option<i64>>,
    },
    /// No type recorded (implicit declarations)
    Unknown,
}

impl Type {
    /// Integer types, the only ones a canonical loop index may have.
    pub fn is_integer(&self) -> bool {
        matches!(self, Type::Char | Type::Short | Type::Int | Type::Long)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Void => write!(f, "void"),
            Type::Char => write!(f, "char"),
            Type::Short => write!(f, "short"),
            Type::Int => write!(f, "int"),
            Type::Long => write!(f, "long"),
            Type::Float => write!(f, "float"),
            Type::Double => write!(f, "double"),
            Type::Pointer(inner) => write!(f, "{}*", inner),
            Type::Array { element, dimensions } => {
                write!(f, "{}", element)?;
                for dim in dimensions {
                    match dim {
                        Some(n) => write!(f, "[{}]", n)?,
                        None => write!(f, "[]")?,
                    }
                }
                Ok(())
            }
            Type::Unknown => write!(f, "?"),
        }
    }
}

/// A block of statements.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    pub statements: Vec<Stmt>,
    pub span: Span,
}

impl Block {
    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}

/// A statement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

/// The kind of a statement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StmtKind {
    /// `int i, a[10] = ...;`
    Declaration(Declaration),

    /// `expr;`
    Expression { expr: Expr },

    /// `for (init; condition; update) body`
    For {
        init: ForInit,
        condition: Option<Expr>,
        update: Option<Expr>,
        body: Box<Stmt>,
    },

    /// `while (condition) body`
    While { condition: Expr, body: Box<Stmt> },

    /// `do body while (condition);`
    DoWhile { body: Box<Stmt>, condition: Expr },

    /// `if (condition) then else otherwise`
    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },

    Return { value: Option<Expr> },

    Break,

    Continue,

    /// `{ stmts }`
    Block(Block),

    /// Just a semicolon
    Empty,
}

/// The initializer clause of a `for` header.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ForInit {
    Empty,
    Declaration(Declaration),
    Expression(Expr),
}

/// An expression.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }

    pub fn int_lit(value: i64, span: Span) -> Self {
        Self::new(ExprKind::IntLiteral(value), span)
    }

    pub fn var(name: impl Into<String>, span: Span) -> Self {
        Self::new(ExprKind::Variable(name.into()), span)
    }

    /// Strip redundant parentheses.
    pub fn ungrouped(&self) -> &Expr {
        match &self.kind {
            ExprKind::Grouped(inner) => inner.ungrouped(),
            _ => self,
        }
    }
}

/// The kind of an expression.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ExprKind {
    IntLiteral(i64),
    FloatLiteral(f64),
    CharLiteral(String),
    StringLiteral(String),

    Variable(String),

    /// Subscript: `base[index]`, with consecutive subscripts folded: `a[i][j]`
    ArrayAccess {
        array: Box<Expr>,
        indices: Vec<Expr>,
    },

    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },

    /// `++x`, `x++`, `--x`, `x--`
    IncDec {
        op: IncDecOp,
        operand: Box<Expr>,
    },

    /// `target op value`
    Assign {
        op: AssignOp,
        target: Box<Expr>,
        value: Box<Expr>,
    },

    Call {
        function: String,
        args: Vec<Expr>,
    },

    Ternary {
        condition: Box<Expr>,
        then_expr: Box<Expr>,
        else_expr: Box<Expr>,
    },

    Cast {
        target_type: Type,
        expr: Box<Expr>,
    },

    /// Comma operator: `a, b`
    Comma(Vec<Expr>),

    /// Parenthesized expression
    Grouped(Box<Expr>),
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

impl BinaryOp {
    /// Relational operators accepted in a canonical loop test.
    pub fn is_relational(&self) -> bool {
        matches!(self, BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge)
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        };
        write!(f, "{}", s)
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOp {
    /// `-x`
    Neg,
    /// `!x`
    Not,
    /// `*p`
    Deref,
    /// `&x`
    AddrOf,
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UnaryOp::Neg => "-",
            UnaryOp::Not => "!",
            UnaryOp::Deref => "*",
            UnaryOp::AddrOf => "&",
        };
        write!(f, "{}", s)
    }
}

/// Increment and decrement operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IncDecOp {
    PreInc,
    PostInc,
    PreDec,
    PostDec,
}

impl IncDecOp {
    /// The step this operator applies: `+1` or `-1`.
    pub fn delta(&self) -> i64 {
        match self {
            IncDecOp::PreInc | IncDecOp::PostInc => 1,
            IncDecOp::PreDec | IncDecOp::PostDec => -1,
        }
    }

    pub fn is_prefix(&self) -> bool {
        matches!(self, IncDecOp::PreInc | IncDecOp::PreDec)
    }

    pub fn symbol(&self) -> &'static str {
        if self.delta() > 0 { "++" } else { "--" }
    }
}

/// An assignment operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssignOp {
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    ModAssign,
}

impl AssignOp {
    /// Compound assignments read their target before writing it.
    pub fn is_compound(&self) -> bool {
        !matches!(self, AssignOp::Assign)
    }
}

impl fmt::Display for AssignOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AssignOp::Assign => "=",
            AssignOp::AddAssign => "+=",
            AssignOp::SubAssign => "-=",
            AssignOp::MulAssign => "*=",
            AssignOp::DivAssign => "/=",
            AssignOp::ModAssign => "%=",
        };
        write!(f, "{}", s)
    }
}
