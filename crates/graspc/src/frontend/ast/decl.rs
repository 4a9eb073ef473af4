//! Declaration AST nodes

use std::fmt;

use super::{Block, Ident, NodeId, TypeSpec, join};

/// `name = constant`
#[derive(Debug, Clone, PartialEq)]
pub struct ConstantDef {
    pub id: NodeId,
    pub line: u32,
    pub name: Ident,
    pub value: Constant,
}

impl fmt::Display for ConstantDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.name, self.value)
    }
}

/// Leading sign on a constant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sign {
    Plus,
    Minus,
}

impl fmt::Display for Sign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sign::Plus => f.write_str("+"),
            Sign::Minus => f.write_str("-"),
        }
    }
}

/// Constant kinds
#[derive(Debug, Clone, PartialEq)]
pub enum ConstantKind {
    /// Reference to a constant or enumeration constant
    Identifier(Ident),
    Integer(i64),
    Real(f64),
    Char(char),
    String(String),
}

/// A constant as written in a constant definition, subrange bound or case label
#[derive(Debug, Clone, PartialEq)]
pub struct Constant {
    pub id: NodeId,
    pub line: u32,
    pub sign: Option<Sign>,
    pub kind: ConstantKind,
}

impl Constant {
    pub fn with_sign(mut self, sign: Sign) -> Self {
        self.sign = Some(sign);
        self
    }
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(sign) = self.sign {
            write!(f, "{sign}")?;
        }
        match &self.kind {
            ConstantKind::Identifier(ident) => write!(f, "{ident}"),
            ConstantKind::Integer(value) => write!(f, "{value}"),
            ConstantKind::Real(value) => write!(f, "{value:?}"),
            ConstantKind::Char(value) => write!(f, "'{value}'"),
            ConstantKind::String(value) => write!(f, "'{value}'"),
        }
    }
}

/// `name = type-spec`
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDef {
    pub id: NodeId,
    pub line: u32,
    pub name: Ident,
    pub spec: TypeSpec,
}

impl fmt::Display for TypeDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.name, self.spec)
    }
}

/// `a, b, c: type-spec`; also used for record fields
#[derive(Debug, Clone, PartialEq)]
pub struct VarDecl {
    pub id: NodeId,
    pub line: u32,
    pub names: Vec<Ident>,
    pub ty: TypeSpec,
}

impl fmt::Display for VarDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", join(&self.names, ", "), self.ty)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutineKind {
    Procedure,
    Function,
}

impl fmt::Display for RoutineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoutineKind::Procedure => f.write_str("procedure"),
            RoutineKind::Function => f.write_str("function"),
        }
    }
}

/// Procedure or function definition
#[derive(Debug, Clone, PartialEq)]
pub struct RoutineDef {
    pub id: NodeId,
    pub line: u32,
    pub kind: RoutineKind,
    pub name: Ident,
    pub params: Vec<ParamDecl>,
    /// Declared result type; functions only
    pub return_type: Option<Ident>,
    /// May not assign variables declared at program level
    pub immutable: bool,
    pub block: Block,
}

impl RoutineDef {
    pub fn immutable(mut self) -> Self {
        self.immutable = true;
        self
    }

    pub fn is_function(&self) -> bool {
        self.kind == RoutineKind::Function
    }
}

impl fmt::Display for RoutineDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.immutable {
            f.write_str("immutable ")?;
        }
        write!(f, "{} {}", self.kind, self.name)?;
        if !self.params.is_empty() {
            write!(f, "({})", join(&self.params, "; "))?;
        }
        if let Some(return_type) = &self.return_type {
            write!(f, ": {return_type}")?;
        }
        Ok(())
    }
}

/// One formal parameter group
#[derive(Debug, Clone, PartialEq)]
pub struct ParamDecl {
    pub id: NodeId,
    pub line: u32,
    /// `var` parameters are passed by reference
    pub by_reference: bool,
    pub names: Vec<Ident>,
    pub ty: Ident,
}

impl fmt::Display for ParamDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.by_reference {
            f.write_str("var ")?;
        }
        write!(f, "{}: {}", join(&self.names, ", "), self.ty)
    }
}
