//! Symbol table entries

use std::fmt;

use crate::frontend::ast::NodeId;
use crate::types::TypeId;

use super::ScopeId;

/// Names synthesized for anonymous record types start with this prefix
pub const UNNAMED_PREFIX: &str = "_unnamed_";

/// Stable index of an entry inside a [`SymTableStack`](super::SymTableStack)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryId(pub(super) u32);

impl EntryId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// What a declared name denotes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Constant,
    EnumerationConstant,
    Type,
    Variable,
    RecordField,
    ValueParameter,
    ReferenceParameter,
    ProgramParameter,
    Program,
    Procedure,
    Function,
    Undefined,
}

impl Kind {
    pub fn is_routine(self) -> bool {
        matches!(self, Kind::Program | Kind::Procedure | Kind::Function)
    }

    /// Kinds that denote storage an assignment or `var` argument can target
    pub fn is_storage(self) -> bool {
        matches!(
            self,
            Kind::Variable | Kind::RecordField | Kind::ValueParameter | Kind::ReferenceParameter
        )
    }

    /// Kinds that carry a literal value payload
    pub fn carries_value(self) -> bool {
        matches!(
            self,
            Kind::Constant
                | Kind::EnumerationConstant
                | Kind::Variable
                | Kind::RecordField
                | Kind::ValueParameter
        )
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Kind::Constant => "constant",
            Kind::EnumerationConstant => "enumeration constant",
            Kind::Type => "type",
            Kind::Variable => "variable",
            Kind::RecordField => "record field",
            Kind::ValueParameter => "value parameter",
            Kind::ReferenceParameter => "reference parameter",
            Kind::ProgramParameter => "program parameter",
            Kind::Program => "program",
            Kind::Procedure => "procedure",
            Kind::Function => "function",
            Kind::Undefined => "undefined",
        };
        f.write_str(name)
    }
}

/// How a routine is implemented
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoutineCode {
    Declared,
    Forward,
    Read,
    Readln,
    Write,
    Writeln,
    Abs,
    Arctan,
    Chr,
    Cos,
    Eof,
    Eoln,
    Exp,
    Ln,
    Odd,
    Ord,
    Pred,
    Round,
    Sin,
    Sqr,
    Sqrt,
    Succ,
    Trunc,
}

impl RoutineCode {
    pub fn is_standard(self) -> bool {
        !matches!(self, RoutineCode::Declared | RoutineCode::Forward)
    }
}

/// A folded literal value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Integer(i64),
    Real(f64),
    Char(char),
    String(String),
}

impl Value {
    /// Ordinal position for values of ordinal types
    pub fn ordinal(&self) -> Option<i64> {
        match self {
            Value::Integer(value) => Some(*value),
            Value::Char(value) => Some(i64::from(u32::from(*value))),
            Value::Real(_) | Value::String(_) => None,
        }
    }

    pub fn negated(self) -> Self {
        match self {
            Value::Integer(value) => Value::Integer(value.wrapping_neg()),
            Value::Real(value) => Value::Real(-value),
            other => other,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(value) => write!(f, "{value}"),
            Value::Real(value) => write!(f, "{value:?}"),
            Value::Char(value) => write!(f, "'{value}'"),
            Value::String(value) => write!(f, "'{value}'"),
        }
    }
}

/// Routine payload of program, procedure and function entries
#[derive(Debug, Clone, PartialEq)]
pub struct RoutineInfo {
    pub code: RoutineCode,
    /// Scope holding the routine's parameters and locals
    pub symtable: Option<ScopeId>,
    pub parameters: Vec<EntryId>,
    pub subroutines: Vec<EntryId>,
    /// Compound statement forming the routine body
    pub executable: Option<NodeId>,
    pub immutable: bool,
    pub nested: bool,
}

impl RoutineInfo {
    pub fn new(code: RoutineCode) -> Self {
        Self {
            code,
            symtable: None,
            parameters: Vec::new(),
            subroutines: Vec::new(),
            executable: None,
            immutable: false,
            nested: false,
        }
    }
}

/// Kind-specific payload
#[derive(Debug, Clone, PartialEq)]
pub enum EntryInfo {
    None,
    Value(Option<Value>),
    Routine(RoutineInfo),
}

/// One declared identifier
#[derive(Debug, Clone, PartialEq)]
pub struct SymTableEntry {
    /// Lower-cased lookup key
    pub name: String,
    /// Spelling at the declaration
    pub spelling: String,
    pub kind: Kind,
    /// Scope the entry was declared in
    pub scope: ScopeId,
    pub ty: Option<TypeId>,
    /// Source lines of the declaration and every reference, in visit order
    pub line_numbers: Vec<u32>,
    /// Local storage slot within the enclosing routine frame
    pub slot: Option<u32>,
    pub info: EntryInfo,
}

impl SymTableEntry {
    pub fn new(spelling: &str, kind: Kind, scope: ScopeId) -> Self {
        let mut entry = Self {
            name: spelling.to_lowercase(),
            spelling: spelling.to_string(),
            kind,
            scope,
            ty: None,
            line_numbers: Vec::new(),
            slot: None,
            info: EntryInfo::None,
        };
        entry.set_kind(kind);
        entry
    }

    /// Change the kind, resetting the payload when the new kind needs another shape.
    pub fn set_kind(&mut self, kind: Kind) {
        self.kind = kind;
        let compatible = match &self.info {
            EntryInfo::None => !kind.carries_value() && !kind.is_routine(),
            EntryInfo::Value(_) => kind.carries_value(),
            EntryInfo::Routine(_) => kind.is_routine(),
        };
        if !compatible {
            self.info = if kind.is_routine() {
                EntryInfo::Routine(RoutineInfo::new(RoutineCode::Declared))
            } else if kind.carries_value() {
                EntryInfo::Value(None)
            } else {
                EntryInfo::None
            };
        }
    }

    pub fn append_line(&mut self, line: u32) {
        self.line_numbers.push(line);
    }

    pub fn value(&self) -> Option<&Value> {
        match &self.info {
            EntryInfo::Value(value) => value.as_ref(),
            _ => None,
        }
    }

    /// Ignored for kinds without a value payload
    pub fn set_value(&mut self, value: Value) {
        if let EntryInfo::Value(slot) = &mut self.info {
            *slot = Some(value);
        }
    }

    pub fn routine(&self) -> Option<&RoutineInfo> {
        match &self.info {
            EntryInfo::Routine(info) => Some(info),
            _ => None,
        }
    }

    pub fn routine_mut(&mut self) -> Option<&mut RoutineInfo> {
        match &mut self.info {
            EntryInfo::Routine(info) => Some(info),
            _ => None,
        }
    }

    pub fn routine_code(&self) -> Option<RoutineCode> {
        self.routine().map(|info| info.code)
    }

    pub fn is_unnamed(&self) -> bool {
        self.name.starts_with(UNNAMED_PREFIX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_normalizes_name() {
        let entry = SymTableEntry::new("MyVar", Kind::Variable, ScopeId(1));
        assert_eq!(entry.name, "myvar");
        assert_eq!(entry.spelling, "MyVar");
        assert_eq!(entry.info, EntryInfo::Value(None));
    }

    #[test]
    fn test_payload_follows_kind() {
        let mut entry = SymTableEntry::new("f", Kind::Function, ScopeId(0));
        assert_eq!(entry.routine_code(), Some(RoutineCode::Declared));

        entry.set_kind(Kind::Type);
        assert_eq!(entry.info, EntryInfo::None);

        entry.set_value(Value::Integer(3));
        assert_eq!(entry.value(), None);
    }

    #[test]
    fn test_retag_keeps_value() {
        let mut entry = SymTableEntry::new("x", Kind::Variable, ScopeId(2));
        entry.set_value(Value::Integer(7));
        entry.set_kind(Kind::RecordField);
        assert_eq!(entry.value(), Some(&Value::Integer(7)));
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(Kind::EnumerationConstant.to_string(), "enumeration constant");
        assert_eq!(Kind::ReferenceParameter.to_string(), "reference parameter");
    }

    #[test]
    fn test_value_ordinal_and_negation() {
        assert_eq!(Value::Char('A').ordinal(), Some(65));
        assert_eq!(Value::Real(1.5).ordinal(), None);
        assert_eq!(Value::Integer(4).negated(), Value::Integer(-4));
        assert_eq!(Value::Real(2.0).negated(), Value::Real(-2.0));
    }

    #[test]
    fn test_unnamed_prefix() {
        let entry = SymTableEntry::new("_unnamed_3", Kind::Type, ScopeId(1));
        assert!(entry.is_unnamed());
    }
}
