//! Type specification AST nodes

use std::fmt;

use super::{Constant, Ident, NodeId, VarDecl, join};

/// Type specification kinds
#[derive(Debug, Clone, PartialEq)]
pub enum TypeSpecKind {
    /// Reference to a declared type
    Named(Ident),
    /// `(red, green, blue)`
    Enumeration(Vec<Ident>),
    /// `min..max`
    Subrange { min: Constant, max: Constant },
    /// `array [d1, d2] of element`
    Array {
        dimensions: Vec<TypeSpec>,
        element: Box<TypeSpec>,
    },
    /// `record ... end`
    Record(Vec<VarDecl>),
}

/// A type specification
#[derive(Debug, Clone, PartialEq)]
pub struct TypeSpec {
    pub id: NodeId,
    pub line: u32,
    pub kind: TypeSpecKind,
}

impl fmt::Display for TypeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            TypeSpecKind::Named(ident) => write!(f, "{ident}"),
            TypeSpecKind::Enumeration(names) => write!(f, "({})", join(names, ", ")),
            TypeSpecKind::Subrange { min, max } => write!(f, "{min}..{max}"),
            TypeSpecKind::Array { dimensions, element } => {
                write!(f, "array [{}] of {element}", join(dimensions, ", "))
            }
            TypeSpecKind::Record(fields) => write!(f, "record {} end", join(fields, "; ")),
        }
    }
}
