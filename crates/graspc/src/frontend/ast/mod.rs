//! Syntax tree consumed by semantic analysis
//!
//! The tree is produced by an external parser (or by [`AstBuilder`] in
//! tests). Nodes are immutable; everything the analyzer learns about a node
//! is recorded in the [`Annotations`] side table under the node's [`NodeId`].

mod builder;
mod decl;
mod expr;
mod stmt;
mod types;

pub use builder::AstBuilder;
pub use decl::*;
pub use expr::*;
pub use stmt::*;
pub use types::*;

use std::collections::HashMap;
use std::fmt;

use crate::frontend::sema::{EntryId, Value};
use crate::types::TypeId;

/// Identity of a syntax tree node, unique within one tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

/// An identifier occurrence
#[derive(Debug, Clone, PartialEq)]
pub struct Ident {
    pub id: NodeId,
    pub line: u32,
    /// Name as spelled in the source
    pub name: String,
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// A complete program
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub id: NodeId,
    pub line: u32,
    pub name: Ident,
    /// Optional `(input, output)` style header parameters
    pub parameters: Vec<Ident>,
    pub block: Block,
}

/// Declarations followed by a compound statement
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub id: NodeId,
    pub declarations: Declarations,
    /// Always a [`StmtKind::Compound`]
    pub body: Stmt,
}

/// Declaration sections of a block, each in source order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Declarations {
    pub constants: Vec<ConstantDef>,
    pub types: Vec<TypeDef>,
    pub variables: Vec<VarDecl>,
    pub routines: Vec<RoutineDef>,
}

impl Declarations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn constant(mut self, def: ConstantDef) -> Self {
        self.constants.push(def);
        self
    }

    pub fn type_def(mut self, def: TypeDef) -> Self {
        self.types.push(def);
        self
    }

    pub fn variable(mut self, decl: VarDecl) -> Self {
        self.variables.push(decl);
        self
    }

    pub fn routine(mut self, def: RoutineDef) -> Self {
        self.routines.push(def);
        self
    }
}

/// What the analyzer recorded for one node
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Annotation {
    pub ty: Option<TypeId>,
    pub entry: Option<EntryId>,
    pub value: Option<Value>,
}

/// Side table of node annotations, written only by the analyzer
#[derive(Debug, Clone, Default)]
pub struct Annotations {
    slots: HashMap<NodeId, Annotation>,
}

impl Annotations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: NodeId) -> Option<&Annotation> {
        self.slots.get(&id)
    }

    pub fn type_of(&self, id: NodeId) -> Option<TypeId> {
        self.slots.get(&id).and_then(|a| a.ty)
    }

    pub fn entry_of(&self, id: NodeId) -> Option<EntryId> {
        self.slots.get(&id).and_then(|a| a.entry)
    }

    pub fn value_of(&self, id: NodeId) -> Option<&Value> {
        self.slots.get(&id).and_then(|a| a.value.as_ref())
    }

    pub fn set_type(&mut self, id: NodeId, ty: TypeId) {
        self.slots.entry(id).or_default().ty = Some(ty);
    }

    pub fn set_entry(&mut self, id: NodeId, entry: EntryId) {
        self.slots.entry(id).or_default().entry = Some(entry);
    }

    pub fn set_value(&mut self, id: NodeId, value: Value) {
        self.slots.entry(id).or_default().value = Some(value);
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// Join displayable items with a separator
pub(crate) fn join<T: fmt::Display>(items: &[T], separator: &str) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(separator)
}
