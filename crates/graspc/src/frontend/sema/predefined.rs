//! Predefined types, constants and standard routines
//!
//! Every analyzer seeds its own global scope, so separate analyses never
//! share type identities.

use log::debug;

use crate::types::{TypeArena, TypeId, TypeKind, Typespec};

use super::scope::SymTableStack;
use super::symbol::{EntryId, Kind, RoutineCode, Value};

/// Standard routines with their kind and built-in behaviour
const STANDARD_ROUTINES: &[(&str, Kind, RoutineCode)] = &[
    ("read", Kind::Procedure, RoutineCode::Read),
    ("readln", Kind::Procedure, RoutineCode::Readln),
    ("write", Kind::Procedure, RoutineCode::Write),
    ("writeln", Kind::Procedure, RoutineCode::Writeln),
    ("abs", Kind::Function, RoutineCode::Abs),
    ("arctan", Kind::Function, RoutineCode::Arctan),
    ("chr", Kind::Function, RoutineCode::Chr),
    ("cos", Kind::Function, RoutineCode::Cos),
    ("eof", Kind::Function, RoutineCode::Eof),
    ("eoln", Kind::Function, RoutineCode::Eoln),
    ("exp", Kind::Function, RoutineCode::Exp),
    ("ln", Kind::Function, RoutineCode::Ln),
    ("odd", Kind::Function, RoutineCode::Odd),
    ("ord", Kind::Function, RoutineCode::Ord),
    ("pred", Kind::Function, RoutineCode::Pred),
    ("round", Kind::Function, RoutineCode::Round),
    ("sin", Kind::Function, RoutineCode::Sin),
    ("sqr", Kind::Function, RoutineCode::Sqr),
    ("sqrt", Kind::Function, RoutineCode::Sqrt),
    ("succ", Kind::Function, RoutineCode::Succ),
    ("trunc", Kind::Function, RoutineCode::Trunc),
];

/// Handles to the predefined environment of one analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Predefined {
    pub integer_type: TypeId,
    pub real_type: TypeId,
    pub boolean_type: TypeId,
    pub char_type: TypeId,
    pub string_type: TypeId,
    pub undefined_type: TypeId,

    pub integer_id: EntryId,
    pub real_id: EntryId,
    pub boolean_id: EntryId,
    pub char_id: EntryId,
    pub string_id: EntryId,
    pub false_id: EntryId,
    pub true_id: EntryId,
}

impl Predefined {
    /// Seed the global scope of `stack`
    pub fn initialize(stack: &mut SymTableStack, types: &mut TypeArena) -> Self {
        let (integer_id, integer_type) = scalar_type(stack, types, "integer");
        let (real_id, real_type) = scalar_type(stack, types, "real");
        let (char_id, char_type) = scalar_type(stack, types, "char");
        let (string_id, string_type) = scalar_type(stack, types, "string");

        let boolean_id = stack.enter_local("boolean", Kind::Type);
        let boolean_type = types.alloc(Typespec::enumeration(Vec::new()).with_identifier(boolean_id));
        stack.entry_mut(boolean_id).ty = Some(boolean_type);

        let false_id = enumeration_constant(stack, "false", boolean_type, 0);
        let true_id = enumeration_constant(stack, "true", boolean_type, 1);
        if let Some(info) = as_enumeration_mut(types, boolean_type) {
            info.extend([false_id, true_id]);
        }

        let undefined_type = types.alloc(Typespec::unknown());

        for (name, kind, code) in STANDARD_ROUTINES {
            let id = stack.enter_local(name, *kind);
            let entry = stack.entry_mut(id);
            // abs, sqr, pred and succ take their result type from the argument
            entry.ty = match code {
                RoutineCode::Arctan
                | RoutineCode::Cos
                | RoutineCode::Exp
                | RoutineCode::Ln
                | RoutineCode::Sin
                | RoutineCode::Sqrt => Some(real_type),
                RoutineCode::Chr => Some(char_type),
                RoutineCode::Odd | RoutineCode::Eof | RoutineCode::Eoln => Some(boolean_type),
                RoutineCode::Ord | RoutineCode::Round | RoutineCode::Trunc => Some(integer_type),
                _ => None,
            };
            if let Some(routine) = entry.routine_mut() {
                routine.code = *code;
            }
        }

        debug!(
            "predefined environment: {} global entries",
            stack.local_table().len()
        );

        Self {
            integer_type,
            real_type,
            boolean_type,
            char_type,
            string_type,
            undefined_type,
            integer_id,
            real_id,
            boolean_id,
            char_id,
            string_id,
            false_id,
            true_id,
        }
    }
}

fn scalar_type(stack: &mut SymTableStack, types: &mut TypeArena, name: &str) -> (EntryId, TypeId) {
    let id = stack.enter_local(name, Kind::Type);
    let ty = types.alloc(Typespec::scalar().with_identifier(id));
    stack.entry_mut(id).ty = Some(ty);
    (id, ty)
}

fn enumeration_constant(stack: &mut SymTableStack, name: &str, ty: TypeId, ordinal: i64) -> EntryId {
    let id = stack.enter_local(name, Kind::EnumerationConstant);
    let entry = stack.entry_mut(id);
    entry.ty = Some(ty);
    entry.set_value(Value::Integer(ordinal));
    id
}

fn as_enumeration_mut(types: &mut TypeArena, ty: TypeId) -> Option<&mut Vec<EntryId>> {
    match &mut types.get_mut(ty).kind {
        TypeKind::Enumeration(info) => Some(&mut info.constants),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Form;

    fn seeded() -> (SymTableStack, TypeArena, Predefined) {
        let mut stack = SymTableStack::new();
        let mut types = TypeArena::new();
        let predefined = Predefined::initialize(&mut stack, &mut types);
        (stack, types, predefined)
    }

    #[test]
    fn test_predefined_types() {
        let (stack, types, predefined) = seeded();

        assert_eq!(stack.lookup("integer"), Some(predefined.integer_id));
        assert_eq!(stack.entry(predefined.real_id).ty, Some(predefined.real_type));
        assert_eq!(types.form(predefined.char_type), Form::Scalar);
        assert_eq!(types.form(predefined.boolean_type), Form::Enumeration);
        assert_eq!(
            types.get(predefined.string_type).identifier,
            Some(predefined.string_id)
        );
    }

    #[test]
    fn test_boolean_constants() {
        let (stack, types, predefined) = seeded();

        let constants = &types.get(predefined.boolean_type).as_enumeration().unwrap().constants;
        assert_eq!(constants, &vec![predefined.false_id, predefined.true_id]);
        assert_eq!(stack.entry(predefined.false_id).value(), Some(&Value::Integer(0)));
        assert_eq!(stack.entry(predefined.true_id).value(), Some(&Value::Integer(1)));
    }

    #[test]
    fn test_standard_routines() {
        let (stack, _, predefined) = seeded();

        for (name, kind, code) in STANDARD_ROUTINES {
            let id = stack.lookup(name).unwrap();
            assert_eq!(stack.entry(id).kind, *kind);
            assert_eq!(stack.entry(id).routine_code(), Some(*code));
        }
        let eof = stack.lookup("eof").unwrap();
        assert_eq!(stack.entry(eof).ty, Some(predefined.boolean_type));
        let abs = stack.lookup("abs").unwrap();
        assert_eq!(stack.entry(abs).ty, None);
        assert_eq!(STANDARD_ROUTINES.len(), 21);
    }

    #[test]
    fn test_fresh_stack_is_unseeded() {
        let (seeded_stack, _, _) = seeded();
        let fresh = SymTableStack::new();

        assert!(seeded_stack.lookup("write").is_some());
        assert_eq!(fresh.lookup("write"), None);
    }
}
