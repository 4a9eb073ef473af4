//! Statement AST nodes

use std::fmt;

use super::{Constant, Expr, Ident, NodeId, Variable, join};

/// Statement node
#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub id: NodeId,
    pub line: u32,
    pub kind: StmtKind,
}

/// Statement kinds
#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    /// `begin ... end`
    Compound(Vec<Stmt>),

    /// `target := value`
    Assign { target: Variable, value: Expr },

    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },

    Case {
        selector: Expr,
        branches: Vec<CaseBranch>,
    },

    While { condition: Expr, body: Box<Stmt> },

    /// `repeat ... until condition`
    Repeat { body: Vec<Stmt>, condition: Expr },

    For {
        control: Variable,
        start: Expr,
        end: Expr,
        direction: ForDirection,
        body: Box<Stmt>,
    },

    ProcedureCall(Call),

    Empty,
}

/// `c1, c2: statement`
#[derive(Debug, Clone, PartialEq)]
pub struct CaseBranch {
    pub id: NodeId,
    pub line: u32,
    pub constants: Vec<Constant>,
    pub body: Option<Box<Stmt>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForDirection {
    To,
    DownTo,
}

/// Procedure or function call with actual arguments
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub id: NodeId,
    pub line: u32,
    pub name: Ident,
    pub args: Vec<Expr>,
}

impl fmt::Display for Call {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.args.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}({})", self.name, join(&self.args, ", "))
        }
    }
}

impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            StmtKind::Compound(stmts) => write!(f, "begin {} end", join(stmts, "; ")),
            StmtKind::Assign { target, value } => write!(f, "{target} := {value}"),
            StmtKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                write!(f, "if {condition} then {then_branch}")?;
                if let Some(else_branch) = else_branch {
                    write!(f, " else {else_branch}")?;
                }
                Ok(())
            }
            StmtKind::Case { selector, .. } => write!(f, "case {selector} of ... end"),
            StmtKind::While { condition, body } => write!(f, "while {condition} do {body}"),
            StmtKind::Repeat { body, condition } => {
                write!(f, "repeat {} until {condition}", join(body, "; "))
            }
            StmtKind::For {
                control,
                start,
                end,
                direction,
                body,
            } => {
                let keyword = match direction {
                    ForDirection::To => "to",
                    ForDirection::DownTo => "downto",
                };
                write!(f, "for {control} := {start} {keyword} {end} do {body}")
            }
            StmtKind::ProcedureCall(call) => write!(f, "{call}"),
            StmtKind::Empty => Ok(()),
        }
    }
}
