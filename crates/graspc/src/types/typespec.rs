//! Type descriptor arena
//!
//! A [`Typespec`] is one of five forms (plus `Unknown`), each carrying its
//! form-specific payload. Descriptors are allocated once and referenced by
//! index, so structural equality is never used to decide type identity.

use std::fmt;

use crate::frontend::sema::{EntryId, ScopeId};

/// Stable index of a type descriptor inside a [`TypeArena`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(u32);

impl TypeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Type form discriminant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Form {
    Scalar,
    Enumeration,
    Subrange,
    Array,
    Record,
    Unknown,
}

impl fmt::Display for Form {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Form::Scalar => "scalar",
            Form::Enumeration => "enumeration",
            Form::Subrange => "subrange",
            Form::Array => "array",
            Form::Record => "record",
            Form::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EnumerationInfo {
    /// Enumeration-constant entries in declaration order
    pub constants: Vec<EntryId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubrangeInfo {
    /// Scalar or enumeration type the subrange narrows
    pub base: TypeId,
    pub min: i64,
    pub max: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArrayInfo {
    pub index: TypeId,
    /// Element type; another array for each further dimension
    pub element: TypeId,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordInfo {
    /// Scope holding the record's field entries
    pub scope: ScopeId,
    /// Fully qualified `$`-joined type path
    pub path: String,
}

/// Form-specific payload of a type descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeKind {
    Scalar,
    Enumeration(EnumerationInfo),
    Subrange(SubrangeInfo),
    Array(ArrayInfo),
    Record(RecordInfo),
    Unknown,
}

/// A type descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Typespec {
    pub kind: TypeKind,
    /// Entry of the type identifier that named this type, if any
    pub identifier: Option<EntryId>,
}

impl Typespec {
    pub fn new(kind: TypeKind) -> Self {
        Self {
            kind,
            identifier: None,
        }
    }

    pub fn scalar() -> Self {
        Self::new(TypeKind::Scalar)
    }

    pub fn enumeration(constants: Vec<EntryId>) -> Self {
        Self::new(TypeKind::Enumeration(EnumerationInfo { constants }))
    }

    pub fn subrange(base: TypeId, min: i64, max: i64) -> Self {
        Self::new(TypeKind::Subrange(SubrangeInfo { base, min, max }))
    }

    pub fn array(index: TypeId, element: TypeId, count: i64) -> Self {
        Self::new(TypeKind::Array(ArrayInfo {
            index,
            element,
            count,
        }))
    }

    pub fn record(scope: ScopeId, path: impl Into<String>) -> Self {
        Self::new(TypeKind::Record(RecordInfo {
            scope,
            path: path.into(),
        }))
    }

    pub fn unknown() -> Self {
        Self::new(TypeKind::Unknown)
    }

    pub fn with_identifier(mut self, identifier: EntryId) -> Self {
        self.identifier = Some(identifier);
        self
    }

    pub fn form(&self) -> Form {
        match self.kind {
            TypeKind::Scalar => Form::Scalar,
            TypeKind::Enumeration(_) => Form::Enumeration,
            TypeKind::Subrange(_) => Form::Subrange,
            TypeKind::Array(_) => Form::Array,
            TypeKind::Record(_) => Form::Record,
            TypeKind::Unknown => Form::Unknown,
        }
    }

    /// Arrays and records are structured
    pub fn is_structured(&self) -> bool {
        matches!(self.kind, TypeKind::Array(_) | TypeKind::Record(_))
    }

    pub fn as_enumeration(&self) -> Option<&EnumerationInfo> {
        match &self.kind {
            TypeKind::Enumeration(info) => Some(info),
            _ => None,
        }
    }

    pub fn as_subrange(&self) -> Option<&SubrangeInfo> {
        match &self.kind {
            TypeKind::Subrange(info) => Some(info),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&ArrayInfo> {
        match &self.kind {
            TypeKind::Array(info) => Some(info),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&RecordInfo> {
        match &self.kind {
            TypeKind::Record(info) => Some(info),
            _ => None,
        }
    }
}

/// Owner of every type descriptor created during one analysis
#[derive(Debug, Default)]
pub struct TypeArena {
    types: Vec<Typespec>,
}

impl TypeArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self, spec: Typespec) -> TypeId {
        let id = TypeId(self.types.len() as u32);
        self.types.push(spec);
        id
    }

    pub fn get(&self, id: TypeId) -> &Typespec {
        &self.types[id.index()]
    }

    pub fn get_mut(&mut self, id: TypeId) -> &mut Typespec {
        &mut self.types[id.index()]
    }

    pub fn form(&self, id: TypeId) -> Form {
        self.get(id).form()
    }

    /// A subrange resolves to its base type; every other form to itself.
    pub fn base_type(&self, id: TypeId) -> TypeId {
        match &self.get(id).kind {
            TypeKind::Subrange(info) => info.base,
            _ => id,
        }
    }

    /// Base type of the innermost element of an array chain
    pub fn array_base_type(&self, id: TypeId) -> TypeId {
        let mut current = id;
        while let TypeKind::Array(info) = &self.get(current).kind {
            current = info.element;
        }
        self.base_type(current)
    }

    /// Number of values of an enumeration or subrange type.
    ///
    /// `None` for other forms and for subranges too wide to count in an `i64`.
    pub fn value_count(&self, id: TypeId) -> Option<i64> {
        match &self.get(id).kind {
            TypeKind::Enumeration(info) => Some(info.constants.len() as i64),
            TypeKind::Subrange(info) => info
                .max
                .checked_sub(info.min)
                .and_then(|span| span.checked_add(1)),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TypeId, &Typespec)> {
        self.types
            .iter()
            .enumerate()
            .map(|(i, spec)| (TypeId(i as u32), spec))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_is_by_slot() {
        let mut arena = TypeArena::new();
        let a = arena.alloc(Typespec::scalar());
        let b = arena.alloc(Typespec::scalar());

        assert_eq!(arena.get(a), arena.get(b));
        assert_ne!(a, b);
    }

    #[test]
    fn test_subrange_base_type() {
        let mut arena = TypeArena::new();
        let integer = arena.alloc(Typespec::scalar());
        let digits = arena.alloc(Typespec::subrange(integer, 0, 9));

        assert_eq!(arena.base_type(digits), integer);
        assert_eq!(arena.base_type(integer), integer);
        assert_eq!(arena.value_count(digits), Some(10));
        assert_eq!(arena.value_count(integer), None);
    }

    #[test]
    fn test_value_count_of_widest_subrange() {
        let mut arena = TypeArena::new();
        let integer = arena.alloc(Typespec::scalar());
        let widest = arena.alloc(Typespec::subrange(integer, -i64::MAX, i64::MAX));
        let upper_half = arena.alloc(Typespec::subrange(integer, 1, i64::MAX));

        assert_eq!(arena.value_count(widest), None);
        assert_eq!(arena.value_count(upper_half), Some(i64::MAX));
    }

    #[test]
    fn test_array_chain() {
        let mut arena = TypeArena::new();
        let integer = arena.alloc(Typespec::scalar());
        let rows = arena.alloc(Typespec::subrange(integer, 1, 3));
        let cols = arena.alloc(Typespec::subrange(integer, 1, 4));
        let inner = arena.alloc(Typespec::array(cols, integer, 4));
        let outer = arena.alloc(Typespec::array(rows, inner, 3));

        assert_eq!(arena.form(outer), Form::Array);
        assert!(arena.get(outer).is_structured());
        assert_eq!(arena.get(outer).as_array().map(|a| a.element), Some(inner));
        assert_eq!(arena.array_base_type(outer), integer);
    }
}
