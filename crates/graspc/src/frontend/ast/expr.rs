//! Expression AST nodes

use std::fmt;

use super::{Call, Ident, NodeId, join};

/// Expression node
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub id: NodeId,
    pub line: u32,
    pub kind: ExprKind,
}

impl Expr {
    /// The variable this expression consists of, if it is nothing more
    pub fn as_variable(&self) -> Option<&Variable> {
        match &self.kind {
            ExprKind::Variable(variable) => Some(variable),
            _ => None,
        }
    }
}

/// Expression kinds
#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },

    /// Variable, constant or parameterless function reference
    Variable(Variable),

    Integer(i64),

    Real(f64),

    Char(char),

    String(String),

    /// Function call with arguments
    Call(Call),

    /// `( expr )`
    Paren(Box<Expr>),
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    // Relational
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,

    // Additive
    Add,
    Sub,
    Or,

    // Multiplicative
    Mul,
    /// `/`, always real
    Divide,
    Div,
    Mod,
    And,
}

impl BinaryOp {
    pub fn is_relational(self) -> bool {
        matches!(
            self,
            BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge
        )
    }

    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Eq => "=",
            BinaryOp::Ne => "<>",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Or => "or",
            BinaryOp::Mul => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Div => "div",
            BinaryOp::Mod => "mod",
            BinaryOp::And => "and",
        }
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Plus,
    Minus,
    Not,
}

/// A variable reference with its subscript and field modifiers
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub id: NodeId,
    pub line: u32,
    pub name: Ident,
    /// Applied left to right
    pub modifiers: Vec<Modifier>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Modifier {
    pub id: NodeId,
    pub line: u32,
    pub kind: ModifierKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ModifierKind {
    /// `[i, j]`
    Index(Vec<Expr>),
    /// `.name`
    Field(Ident),
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        for modifier in &self.modifiers {
            match &modifier.kind {
                ModifierKind::Index(indices) => write!(f, "[{}]", join(indices, ", "))?,
                ModifierKind::Field(field) => write!(f, ".{field}")?,
            }
        }
        Ok(())
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ExprKind::Binary { op, left, right } => write!(f, "{left} {} {right}", op.symbol()),
            ExprKind::Unary { op, operand } => match op {
                UnaryOp::Plus => write!(f, "+{operand}"),
                UnaryOp::Minus => write!(f, "-{operand}"),
                UnaryOp::Not => write!(f, "not {operand}"),
            },
            ExprKind::Variable(variable) => write!(f, "{variable}"),
            ExprKind::Integer(value) => write!(f, "{value}"),
            ExprKind::Real(value) => write!(f, "{value:?}"),
            ExprKind::Char(value) => write!(f, "'{value}'"),
            ExprKind::String(value) => write!(f, "'{value}'"),
            ExprKind::Call(call) => write!(f, "{call}"),
            ExprKind::Paren(inner) => write!(f, "({inner})"),
        }
    }
}
